use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use tracing::{info, instrument};

use crate::core::energy::EnergyModel;
use crate::core::occupancy::log_occupancy;
use crate::core::sequence::{encode_read, random_read, Base};
use crate::engine::chemical_potential;
use crate::engine::config::{BindingConditions, PartitionConfig};
use crate::engine::error::EngineError;
use crate::engine::partition;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::scorer::SequenceScorer;

#[derive(Debug, Clone)]
pub struct SimulationResult {
    /// Selected reads per round, as ACGT strings.
    pub rounds: Vec<Vec<String>>,
    pub chem_potentials: Vec<f64>,
}

/// Simulates sequential selection rounds from a known energy model.
///
/// A pool of uniform random reads stands in for the sequence library. The
/// chemical potential of each round is solved from the energy grid with
/// depletion between rounds; each round then draws its reads from the pool
/// with probability proportional to the cumulative occupancy through that
/// round.
#[instrument(skip_all, name = "simulate_workflow")]
pub fn run(
    model: &EnergyModel,
    conditions: &BindingConditions,
    partition: &PartitionConfig,
    read_len: usize,
    round_sizes: &[usize],
    pool_size: usize,
    rng: &mut impl Rng,
    reporter: &ProgressReporter,
) -> Result<SimulationResult, EngineError> {
    if round_sizes.is_empty() || round_sizes.contains(&0) {
        return Err(EngineError::InvalidConfiguration(
            "every simulated round must request at least one read".into(),
        ));
    }
    if pool_size == 0 {
        return Err(EngineError::InvalidConfiguration(
            "simulation pool must not be empty".into(),
        ));
    }

    reporter.report(Progress::PhaseStart {
        name: "Preparation",
    });
    let grid = partition::estimate_partition_fn(model, partition)?;
    let chem_potentials =
        chemical_potential::solve_series(&grid, conditions, round_sizes.len())?;
    info!(
        n_rounds = round_sizes.len(),
        pool_size, "Simulating selection rounds."
    );

    let scorer = SequenceScorer::new(model);
    let mut pool: Vec<(Vec<Base>, f64)> = Vec::with_capacity(pool_size);
    for _ in 0..pool_size {
        let bases = random_read(read_len, rng);
        let energy = scorer.score_read(&encode_read(&bases, model.motif_len())?);
        pool.push((bases, energy));
    }
    reporter.report(Progress::PhaseFinish);

    reporter.report(Progress::PhaseStart { name: "Selection" });
    let mut log_weights = vec![0.0; pool_size];
    let mut rounds = Vec::with_capacity(round_sizes.len());
    for (&u, &size) in chem_potentials.iter().zip(round_sizes) {
        for (lw, (_, energy)) in log_weights.iter_mut().zip(&pool) {
            *lw += log_occupancy(*energy, u);
        }
        let max_lw = log_weights.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let weights: Vec<f64> = log_weights.iter().map(|&lw| (lw - max_lw).exp()).collect();
        let sampler = WeightedIndex::new(&weights).map_err(|_| {
            EngineError::NumericDegenerate(
                "simulation pool has no sequences with positive occupancy".into(),
            )
        })?;

        let reads = (0..size)
            .map(|_| {
                pool[sampler.sample(rng)]
                    .0
                    .iter()
                    .map(|b| b.to_char())
                    .collect()
            })
            .collect();
        rounds.push(reads);
    }
    reporter.report(Progress::PhaseFinish);

    Ok(SimulationResult {
        rounds,
        chem_potentials,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::motif::{Pwm, PwmOptions};
    use crate::core::sequence::parse_read;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn example_model() -> EnergyModel {
        let pwm = Pwm::new(
            "m",
            "TF",
            vec![[0.8, 0.1, 0.05, 0.05], [0.1, 0.7, 0.1, 0.1]],
        )
        .unwrap();
        pwm.to_energy_model(&PwmOptions::default()).unwrap()
    }

    fn conditions() -> BindingConditions {
        BindingConditions {
            dna_concentration: 2e-8,
            protein_concentration: 5e-10,
        }
    }

    #[test]
    fn simulation_produces_the_requested_round_sizes() {
        let model = example_model();
        let partition = PartitionConfig {
            n_bins: 512,
            n_sites: 1,
        };
        let mut rng = StdRng::seed_from_u64(8);
        let reporter = ProgressReporter::new();
        let result = run(
            &model,
            &conditions(),
            &partition,
            6,
            &[30, 20],
            500,
            &mut rng,
            &reporter,
        )
        .unwrap();
        assert_eq!(result.rounds.len(), 2);
        assert_eq!(result.rounds[0].len(), 30);
        assert_eq!(result.rounds[1].len(), 20);
        for read in result.rounds.iter().flatten() {
            assert_eq!(read.len(), 6);
            assert!(parse_read(read).is_ok());
        }
    }

    #[test]
    fn later_rounds_are_enriched_for_low_energy_reads() {
        let model = example_model();
        let partition = PartitionConfig {
            n_bins: 512,
            n_sites: 1,
        };
        let mut rng = StdRng::seed_from_u64(13);
        let reporter = ProgressReporter::new();
        let result = run(
            &model,
            &conditions(),
            &partition,
            8,
            &[300, 300, 300],
            3000,
            &mut rng,
            &reporter,
        )
        .unwrap();

        let scorer = SequenceScorer::new(&model);
        let mean_energy = |reads: &[String]| {
            reads
                .iter()
                .map(|r| {
                    scorer
                        .score_read(&encode_read(&parse_read(r).unwrap(), model.motif_len()).unwrap())
                })
                .sum::<f64>()
                / reads.len() as f64
        };
        let first = mean_energy(&result.rounds[0]);
        let last = mean_energy(&result.rounds[2]);
        assert!(last <= first + 0.1);
    }

    #[test]
    fn empty_round_requests_are_rejected() {
        let model = example_model();
        let partition = PartitionConfig {
            n_bins: 512,
            n_sites: 1,
        };
        let mut rng = StdRng::seed_from_u64(1);
        let reporter = ProgressReporter::new();
        let err = run(
            &model,
            &conditions(),
            &partition,
            6,
            &[10, 0],
            100,
            &mut rng,
            &reporter,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfiguration(_)));
    }
}
