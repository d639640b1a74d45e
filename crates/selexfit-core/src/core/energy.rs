use super::sequence::{BASES, Base, EncodedSite};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("Offset table length {0} is not a multiple of 3")]
    OffsetsNotTripletAligned(usize),

    #[error("An energy model must cover at least one motif position")]
    Empty,
}

/// Position-specific binding energy model.
///
/// `reference_energy` is the binding energy of the all-reference-base (all-A)
/// sequence; `offsets` holds, for every motif position, the ΔΔG of the three
/// non-reference bases relative to A, at index `position * 3 + (rank - 1)`.
/// A site's energy is `reference_energy` plus the sum of the offsets of its
/// active indicator bits.
///
/// Models constructed from a PWM are normalized so that the minimum
/// achievable energy over all sequences equals the configured consensus
/// baseline; the fitter mutates offsets freely afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyModel {
    reference_energy: f64,
    offsets: Vec<f64>,
}

impl EnergyModel {
    pub fn new(reference_energy: f64, offsets: Vec<f64>) -> Result<Self, ModelError> {
        if offsets.is_empty() {
            return Err(ModelError::Empty);
        }
        if offsets.len() % 3 != 0 {
            return Err(ModelError::OffsetsNotTripletAligned(offsets.len()));
        }
        Ok(Self {
            reference_energy,
            offsets,
        })
    }

    pub fn motif_len(&self) -> usize {
        self.offsets.len() / 3
    }

    pub fn reference_energy(&self) -> f64 {
        self.reference_energy
    }

    pub fn offsets(&self) -> &[f64] {
        &self.offsets
    }

    /// Binding energy of one encoded site: a sparse dot product between the
    /// offset table and the site's indicator bits, plus the reference energy.
    pub fn score(&self, site: &EncodedSite) -> f64 {
        self.reference_energy
            + site
                .indices()
                .iter()
                .map(|&i| self.offsets[i])
                .sum::<f64>()
    }

    /// Absolute per-position base energies (not deltas): the reference base
    /// contributes 0, the remaining three come from the offset table.
    pub fn base_contributions(&self) -> Vec<[f64; 4]> {
        self.offsets
            .chunks_exact(3)
            .map(|row| [0.0, row[0], row[1], row[2]])
            .collect()
    }

    /// Minimum achievable energy over all sequences of the motif length.
    pub fn min_energy(&self) -> f64 {
        self.reference_energy
            + self
                .offsets
                .chunks_exact(3)
                .map(|row| row.iter().copied().fold(0.0_f64, f64::min))
                .sum::<f64>()
    }

    /// Maximum achievable energy over all sequences of the motif length.
    pub fn max_energy(&self) -> f64 {
        self.reference_energy
            + self
                .offsets
                .chunks_exact(3)
                .map(|row| row.iter().copied().fold(0.0_f64, f64::max))
                .sum::<f64>()
    }

    /// Expected energy of a uniform random sequence.
    pub fn mean_energy(&self) -> f64 {
        self.reference_energy + self.offsets.iter().sum::<f64>() / 4.0
    }

    /// Base-energy spread at one position: the gap between the most and least
    /// favorable base, with the reference base pinned at 0.
    pub fn position_spread(&self, position: usize) -> f64 {
        let row = &self.offsets[position * 3..position * 3 + 3];
        let max = row.iter().copied().fold(0.0_f64, f64::max);
        let min = row.iter().copied().fold(0.0_f64, f64::min);
        max - min
    }

    /// The minimum-energy base at each position. Diagnostics only.
    pub fn consensus_sequence(&self) -> Vec<Base> {
        self.base_contributions()
            .iter()
            .map(|row| {
                let (rank, _) = row
                    .iter()
                    .enumerate()
                    .min_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
                    .unwrap();
                BASES[rank]
            })
            .collect()
    }

    pub(crate) fn nudge_reference(&mut self, delta: f64) {
        self.reference_energy += delta;
    }

    pub(crate) fn nudge_offset(&mut self, index: usize, delta: f64) {
        self.offsets[index] += delta;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sequence::{encode_read, parse_read};

    const TOLERANCE: f64 = 1e-12;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn model() -> EnergyModel {
        // Two positions; consensus is A at position 0 and G at position 1.
        EnergyModel::new(-5.0, vec![1.0, 2.0, 3.0, 0.5, -1.0, 2.5]).unwrap()
    }

    #[test]
    fn new_rejects_misaligned_offset_tables() {
        assert_eq!(
            EnergyModel::new(0.0, vec![1.0, 2.0]),
            Err(ModelError::OffsetsNotTripletAligned(2))
        );
        assert_eq!(EnergyModel::new(0.0, vec![]), Err(ModelError::Empty));
    }

    #[test]
    fn score_sums_reference_energy_and_active_offsets() {
        let m = model();
        let bases = parse_read("CG").unwrap();
        let read = encode_read(&bases, 2).unwrap();
        // Forward site: C at pos 0 (offset 1.0), G at pos 1 (offset -1.0).
        assert!(f64_approx_equal(m.score(&read.sites()[0]), -5.0));
    }

    #[test]
    fn score_of_all_reference_site_is_the_reference_energy() {
        let m = model();
        let bases = parse_read("AA").unwrap();
        let read = encode_read(&bases, 2).unwrap();
        assert!(f64_approx_equal(m.score(&read.sites()[0]), -5.0));
    }

    #[test]
    fn min_and_max_energy_bracket_every_site_score() {
        let m = model();
        assert!(f64_approx_equal(m.min_energy(), -5.0 - 1.0));
        assert!(f64_approx_equal(m.max_energy(), -5.0 + 3.0 + 2.5));
    }

    #[test]
    fn mean_energy_is_the_uniform_expectation() {
        let m = model();
        let expected = -5.0 + (1.0 + 2.0 + 3.0 + 0.5 - 1.0 + 2.5) / 4.0;
        assert!(f64_approx_equal(m.mean_energy(), expected));
    }

    #[test]
    fn consensus_sequence_picks_the_row_minimum() {
        let m = model();
        assert_eq!(m.consensus_sequence(), vec![Base::A, Base::G]);
    }

    #[test]
    fn position_spread_accounts_for_the_reference_base() {
        let m = model();
        assert!(f64_approx_equal(m.position_spread(0), 3.0));
        assert!(f64_approx_equal(m.position_spread(1), 3.5));
    }

    #[test]
    fn base_contributions_reconstruct_absolute_energies() {
        let m = model();
        let table = m.base_contributions();
        assert_eq!(table.len(), 2);
        assert_eq!(table[0], [0.0, 1.0, 2.0, 3.0]);
        assert_eq!(table[1], [0.0, 0.5, -1.0, 2.5]);
    }
}
