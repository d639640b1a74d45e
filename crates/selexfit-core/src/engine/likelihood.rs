use super::chemical_potential;
use super::config::{BindingConditions, PartitionConfig};
use super::error::EngineError;
use super::partition::{self, EnergyGrid};
use super::scorer::SequenceScorer;
use crate::core::energy::EnergyModel;
use crate::core::occupancy::{log_occupancy, occupancy};
use crate::core::sequence::EncodedRead;

/// Guard added inside the normalizing-constant logarithm so fully depleted
/// pools stay finite.
const DENOMINATOR_GUARD: f64 = 1e-12;

/// Log-likelihood of a model together with the chemical potentials it
/// implies.
#[derive(Debug, Clone, PartialEq)]
pub struct Likelihood {
    pub total: f64,
    pub chem_potentials: Vec<f64>,
}

/// Inputs shared by every likelihood evaluation of one experiment: the
/// observed reads of each sequential round and the common read length.
#[derive(Debug, Clone)]
pub struct SelexData {
    rounds: Vec<Vec<EncodedRead>>,
    read_len: usize,
}

impl SelexData {
    pub fn new(rounds: Vec<Vec<EncodedRead>>, read_len: usize) -> Result<Self, EngineError> {
        if rounds.is_empty() || rounds.iter().any(|r| r.is_empty()) {
            return Err(EngineError::InvalidConfiguration(
                "every selection round must contain at least one read".into(),
            ));
        }
        Ok(Self { rounds, read_len })
    }

    pub fn n_rounds(&self) -> usize {
        self.rounds.len()
    }

    pub fn read_len(&self) -> usize {
        self.read_len
    }

    pub fn rounds(&self) -> &[Vec<EncodedRead>] {
        &self.rounds
    }

    pub fn round_sizes(&self) -> Vec<usize> {
        self.rounds.iter().map(Vec::len).collect()
    }
}

/// Evaluates the sequential-selection log-likelihood of an energy model.
///
/// A read observed in round `k` must have survived every selection step up to
/// and including `k`, so its numerator contribution is the sum of its log
/// occupancies at the chemical potentials of rounds `0..=k`. The normalizing
/// constant of round `k` is the expected number of surviving sequences,
/// integrated over the energy grid.
pub fn log_likelihood(
    model: &EnergyModel,
    data: &SelexData,
    conditions: &BindingConditions,
    partition: &PartitionConfig,
) -> Result<Likelihood, EngineError> {
    let grid = partition::estimate_partition_fn(model, partition)?;
    let chem_potentials = chemical_potential::solve_series(&grid, conditions, data.n_rounds())?;

    let scorer = SequenceScorer::new(model);
    let round_energies: Vec<Vec<f64>> = data
        .rounds()
        .iter()
        .map(|reads| scorer.score_reads(reads))
        .collect();

    let numerators = round_numerators(&round_energies, &chem_potentials);
    let denominators = round_denominators(&grid, &chem_potentials, model.motif_len());

    let total: f64 = numerators
        .iter()
        .zip(&denominators)
        .zip(data.round_sizes())
        .map(|((num, denom), n_reads)| num - n_reads as f64 * denom)
        .sum();
    if !total.is_finite() {
        return Err(EngineError::NumericDegenerate(
            "log-likelihood is not finite".into(),
        ));
    }

    Ok(Likelihood {
        total,
        chem_potentials,
    })
}

/// Per-round numerators: for each read of round `k`, the summed log occupancy
/// under the chemical potentials of rounds `0..=k`.
pub(crate) fn round_numerators(round_energies: &[Vec<f64>], chem_potentials: &[f64]) -> Vec<f64> {
    round_energies
        .iter()
        .enumerate()
        .map(|(k, energies)| {
            energies
                .iter()
                .map(|&e| {
                    chem_potentials[..=k]
                        .iter()
                        .map(|&u| log_occupancy(e, u))
                        .sum::<f64>()
                })
                .sum()
        })
        .collect()
}

/// Per-round log normalizing constants: the log expected count of binding
/// sites surviving selection through round `k`, integrated over the energy
/// grid. The grid describes one site, so the count is over the `4^motif_len`
/// possible site sequences.
pub(crate) fn round_denominators(
    grid: &EnergyGrid,
    chem_potentials: &[f64],
    motif_len: usize,
) -> Vec<f64> {
    let total_sites = 4f64.powi(motif_len as i32);
    let mut survival: Vec<f64> = vec![1.0; grid.len()];
    chem_potentials
        .iter()
        .map(|&u| {
            let mut expected = 0.0;
            for (k, s) in survival.iter_mut().enumerate() {
                *s *= occupancy(grid.energy_at(k), u);
                expected += total_sites * grid.mass()[k] * *s;
            }
            (expected + DENOMINATOR_GUARD).ln()
        })
        .collect()
}
