use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use super::config::{BootstrapConfig, PartitionConfig};
use super::error::EngineError;
use super::likelihood;
use super::partition;
use super::scorer::SequenceScorer;
use crate::core::energy::EnergyModel;
use crate::core::occupancy::log_occupancy;
use crate::core::sequence::{encode_read, random_read};

/// Samples the log-likelihood distribution a fitted model would produce if
/// the experiment were rerun with the same round sizes.
///
/// A fixed pool of uniform random reads stands in for the sequence library.
/// Each replicate reruns the selection on its own copy of the pool: every
/// round draws its observed reads with probability proportional to occupancy
/// at that round's chemical potential, then the whole pool is redrawn with
/// replacement under the same weights so depletion noise carries into the
/// next round. The replicate likelihood is the drawn numerator minus the
/// exact normalizing constant from the energy grid.
pub fn bootstrap_likelihoods(
    model: &EnergyModel,
    chem_potentials: &[f64],
    round_sizes: &[usize],
    read_len: usize,
    partition: &PartitionConfig,
    config: &BootstrapConfig,
    rng: &mut impl Rng,
) -> Result<Vec<f64>, EngineError> {
    if chem_potentials.len() != round_sizes.len() {
        return Err(EngineError::InvalidConfiguration(format!(
            "{} chemical potentials for {} rounds",
            chem_potentials.len(),
            round_sizes.len()
        )));
    }
    if config.pool_size == 0 || config.n_samples == 0 {
        return Err(EngineError::InvalidConfiguration(
            "bootstrap pool and sample counts must be positive".into(),
        ));
    }

    let grid = partition::estimate_partition_fn(model, partition)?;
    let denominators = likelihood::round_denominators(&grid, chem_potentials, model.motif_len());

    let scorer = SequenceScorer::new(model);
    let pool_energies: Result<Vec<f64>, EngineError> = (0..config.pool_size)
        .map(|_| {
            let read = encode_read(&random_read(read_len, rng), model.motif_len())?;
            Ok(scorer.score_read(&read))
        })
        .collect();
    let pool_energies = pool_energies?;

    // Per-round and cumulative log occupancy of every pool read. The
    // cumulative value is a read's numerator contribution when it is observed
    // in that round.
    let round_log_occs: Vec<Vec<f64>> = chem_potentials
        .iter()
        .map(|&u| pool_energies.iter().map(|&e| log_occupancy(e, u)).collect())
        .collect();
    let mut running = vec![0.0; config.pool_size];
    let cumulative_log_occs: Vec<Vec<f64>> = round_log_occs
        .iter()
        .map(|row| {
            for (c, lo) in running.iter_mut().zip(row) {
                *c += lo;
            }
            running.clone()
        })
        .collect();

    let mut samples = Vec::with_capacity(config.n_samples);
    for _ in 0..config.n_samples {
        let mut members: Vec<usize> = (0..config.pool_size).collect();
        let mut total = 0.0;
        for (round, &size) in round_sizes.iter().enumerate() {
            let log_occs = &round_log_occs[round];
            let max_lw = members
                .iter()
                .map(|&i| log_occs[i])
                .fold(f64::NEG_INFINITY, f64::max);
            let weights: Vec<f64> =
                members.iter().map(|&i| (log_occs[i] - max_lw).exp()).collect();
            let sampler = WeightedIndex::new(&weights).map_err(|_| {
                EngineError::NumericDegenerate(
                    "bootstrap pool has no sequences with positive occupancy".into(),
                )
            })?;

            let mut numerator = 0.0;
            for _ in 0..size {
                numerator += cumulative_log_occs[round][members[sampler.sample(rng)]];
            }
            total += numerator - size as f64 * denominators[round];

            // Survivors into the next round: the full pool redrawn with
            // replacement under the same occupancy weights.
            members = (0..config.pool_size)
                .map(|_| members[sampler.sample(rng)])
                .collect();
        }
        samples.push(total);
    }
    Ok(samples)
}
