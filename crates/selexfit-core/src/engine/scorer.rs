use crate::core::energy::EnergyModel;
use crate::core::sequence::EncodedRead;

/// Scores encoded reads against an energy model. A read binds through its
/// strongest site, so the read energy is the minimum over all site scores on
/// both strands.
#[derive(Debug, Clone, Copy)]
pub struct SequenceScorer<'a> {
    model: &'a EnergyModel,
}

impl<'a> SequenceScorer<'a> {
    pub fn new(model: &'a EnergyModel) -> Self {
        Self { model }
    }

    /// Energies of every binding site in the read, in encoding order.
    pub fn site_energies(&self, read: &EncodedRead) -> Vec<f64> {
        read.sites().iter().map(|s| self.model.score(s)).collect()
    }

    /// Minimum site energy of the read.
    pub fn score_read(&self, read: &EncodedRead) -> f64 {
        read.sites()
            .iter()
            .map(|s| self.model.score(s))
            .fold(f64::INFINITY, f64::min)
    }

    pub fn score_reads(&self, reads: &[EncodedRead]) -> Vec<f64> {
        reads.iter().map(|r| self.score_read(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sequence::{encode_read, parse_read};

    fn model() -> EnergyModel {
        EnergyModel::new(-5.0, vec![1.0, 2.0, 3.0, 0.5, -1.0, 2.5]).unwrap()
    }

    fn encode(s: &str, motif_len: usize) -> EncodedRead {
        encode_read(&parse_read(s).unwrap(), motif_len).unwrap()
    }

    #[test]
    fn read_energy_is_the_minimum_over_all_sites() {
        let m = model();
        let scorer = SequenceScorer::new(&m);
        let read = encode("ACGTA", 2);
        let sites = scorer.site_energies(&read);
        let expected = sites.iter().copied().fold(f64::INFINITY, f64::min);
        assert_eq!(scorer.score_read(&read), expected);
        assert_eq!(sites.len(), read.n_sites());
    }

    #[test]
    fn motif_length_read_scores_the_better_strand() {
        let m = model();
        let scorer = SequenceScorer::new(&m);
        // Forward AG: A at 0 (0.0), G at 1 (-1.0) => -6.0.
        // Reverse complement CT: C at 0 (1.0), T at 1 (2.5) => -1.5.
        let read = encode("AG", 2);
        assert!((scorer.score_read(&read) - (-6.0)).abs() < 1e-12);
    }

    #[test]
    fn score_reads_preserves_input_order() {
        let m = model();
        let scorer = SequenceScorer::new(&m);
        let reads = vec![encode("AG", 2), encode("CT", 2)];
        let scores = scorer.score_reads(&reads);
        // CT is the reverse complement of AG; min-site scoring makes the
        // two reads equivalent.
        assert_eq!(scores.len(), 2);
        assert!((scores[0] - scores[1]).abs() < 1e-12);
    }
}
