use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use super::config::FitConfig;
use super::error::EngineError;
use super::likelihood::{self, Likelihood, SelexData};
use super::progress::{Progress, ProgressReporter};
use crate::core::energy::EnergyModel;

/// Initial sampling weight of every coordinate; large enough that each
/// coordinate is visited before measured improvements dominate.
const INITIAL_WEIGHT: f64 = 1000.0;

/// Factor by which the line-search tolerance shrinks when no coordinate
/// promises an improvement above it.
const ANNEALING_FACTOR: f64 = 100.0;

/// Cyclic passes over the three offsets of a position block per step. Two
/// passes let an improvement found late in the first pass feed back into the
/// earlier offsets.
const BLOCK_SWEEPS: usize = 2;

/// Result of a completed fit.
#[derive(Debug, Clone)]
pub struct FitOutcome {
    pub model: EnergyModel,
    pub chem_potentials: Vec<f64>,
    pub log_likelihood: f64,
    pub iterations: usize,
    pub rejected_steps: usize,
    pub failed_evaluations: usize,
}

/// Coordinate-descent fitter for the energy model.
///
/// The coordinates are the reference energy and one block per motif position
/// holding that position's three ΔΔG offsets. Each iteration draws one
/// coordinate with probability proportional to its recent improvement,
/// optimizes it (a scalar line search for the reference, cyclic line-search
/// sweeps over the three offsets for a position block), and accepts the step
/// only if the unpenalized log-likelihood does not decrease. When no
/// coordinate promises an improvement above the current tolerance the
/// tolerance is annealed and the weights reset, until the tolerance floor or
/// the iteration cap is reached.
pub struct ModelFitter<'a> {
    config: &'a FitConfig,
    reporter: &'a ProgressReporter<'a>,
}

impl<'a> ModelFitter<'a> {
    pub fn new(config: &'a FitConfig, reporter: &'a ProgressReporter<'a>) -> Self {
        Self { config, reporter }
    }

    fn evaluate(&self, model: &EnergyModel, data: &SelexData) -> Result<Likelihood, EngineError> {
        likelihood::log_likelihood(
            model,
            data,
            &self.config.conditions,
            &self.config.partition,
        )
    }

    /// Penalty keeping the model inside the physically plausible region. The
    /// mean energy is pulled toward the configured target, and any position
    /// whose base-energy spread exceeds the cap is charged the square of the
    /// full spread.
    fn penalty(&self, model: &EnergyModel) -> f64 {
        let opt = &self.config.optimization;
        let mean_term = (model.mean_energy() - opt.target_mean_energy).powi(2);
        let spread_term: f64 = (0..model.motif_len())
            .map(|p| {
                let spread = model.position_spread(p);
                if spread > opt.max_base_energy_spread {
                    spread.powi(2)
                } else {
                    0.0
                }
            })
            .sum();
        mean_term + spread_term
    }

    /// Penalized objective for the inner line searches. Recoverable
    /// evaluation failures count as infinitely bad points; the first
    /// unrecoverable error is stashed in `abort` and stops the fit.
    fn penalized_objective(
        &self,
        model: &EnergyModel,
        data: &SelexData,
        abort: &mut Option<EngineError>,
        failures: &mut usize,
    ) -> f64 {
        match self.evaluate(model, data) {
            Ok(lhd) => -lhd.total + self.penalty(model),
            Err(e) if e.is_recoverable() => {
                *failures += 1;
                f64::INFINITY
            }
            Err(e) => {
                if abort.is_none() {
                    *abort = Some(e);
                }
                f64::INFINITY
            }
        }
    }

    pub fn fit(&self, initial: &EnergyModel, data: &SelexData) -> Result<FitOutcome, EngineError> {
        let opt = &self.config.optimization;
        // Coordinate 0 is the reference energy; coordinate p >= 1 is the
        // offset block of motif position p - 1.
        let n_coords = 1 + initial.motif_len();

        let mut rng = match opt.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut model = initial.clone();
        let mut current = self.evaluate(&model, data)?;

        let mut weights = vec![INITIAL_WEIGHT; n_coords];
        let mut tolerance = opt.initial_tolerance;
        let mut last_coordinate: Option<usize> = None;

        let mut iterations = 0;
        let mut rejected_steps = 0;
        let mut failed_evaluations = 0;

        self.reporter.report(Progress::TaskStart {
            total_steps: opt.max_iterations as u64,
        });

        while iterations < opt.max_iterations {
            iterations += 1;

            let coordinate = self.draw_coordinate(&weights, last_coordinate, &mut rng)?;

            let mut scratch = model.clone();
            let mut abort: Option<EngineError> = None;
            let mut local_failures = 0usize;
            if coordinate == 0 {
                let center = scratch.reference_energy();
                let (best, _) = crate::core::utils::roots::minimize_scalar_bounded(
                    |x| {
                        let delta = x - scratch.reference_energy();
                        scratch.nudge_reference(delta);
                        self.penalized_objective(&scratch, data, &mut abort, &mut local_failures)
                    },
                    center - opt.coordinate_bounds,
                    center + opt.coordinate_bounds,
                    tolerance,
                );
                let delta = best - scratch.reference_energy();
                scratch.nudge_reference(delta);
            } else {
                let position = coordinate - 1;
                for _ in 0..BLOCK_SWEEPS {
                    for slot in 0..3 {
                        let index = position * 3 + slot;
                        let center = scratch.offsets()[index];
                        let (best, _) = crate::core::utils::roots::minimize_scalar_bounded(
                            |x| {
                                let delta = x - scratch.offsets()[index];
                                scratch.nudge_offset(index, delta);
                                self.penalized_objective(
                                    &scratch,
                                    data,
                                    &mut abort,
                                    &mut local_failures,
                                )
                            },
                            center - opt.coordinate_bounds,
                            center + opt.coordinate_bounds,
                            tolerance,
                        );
                        let delta = best - scratch.offsets()[index];
                        scratch.nudge_offset(index, delta);
                    }
                }
            }
            if let Some(e) = abort {
                return Err(e);
            }
            failed_evaluations += local_failures;

            // Acceptance is judged on the raw likelihood, not the penalized
            // objective, and never moves downhill.
            let candidate = scratch;
            let improvement = match self.evaluate(&candidate, data) {
                Ok(lhd) if lhd.total >= current.total => {
                    let gain = lhd.total - current.total;
                    model = candidate;
                    current = lhd;
                    gain
                }
                Ok(_) => {
                    rejected_steps += 1;
                    0.0
                }
                Err(e) if e.is_recoverable() => {
                    warn!(iteration = iterations, coordinate, error = %e, "rejected step after failed evaluation");
                    rejected_steps += 1;
                    failed_evaluations += 1;
                    0.0
                }
                Err(e) => return Err(e),
            };

            weights[coordinate] = opt.momentum * weights[coordinate]
                + (1.0 - opt.momentum) * improvement
                + tolerance / 10.0;
            last_coordinate = Some(coordinate);

            debug!(
                iteration = iterations,
                coordinate,
                log_likelihood = current.total,
                improvement,
                tolerance,
                "coordinate step"
            );
            self.reporter.report(Progress::TaskIncrement);
            self.reporter.report(Progress::IterationUpdate {
                iteration: iterations,
                log_likelihood: current.total,
            });

            let max_weight = weights.iter().copied().fold(f64::MIN, f64::max);
            if max_weight < tolerance {
                tolerance /= ANNEALING_FACTOR;
                if tolerance < opt.tolerance_floor {
                    info!(iterations, "converged below the tolerance floor");
                    break;
                }
                info!(tolerance, iterations, "annealing line-search tolerance");
                weights.fill(INITIAL_WEIGHT);
                last_coordinate = None;
            }
        }

        self.reporter.report(Progress::TaskFinish);

        Ok(FitOutcome {
            model,
            chem_potentials: current.chem_potentials,
            log_likelihood: current.total,
            iterations,
            rejected_steps,
            failed_evaluations,
        })
    }

    /// Samples the next coordinate proportionally to its weight. The
    /// coordinate updated in the previous iteration is excluded so the fitter
    /// never line searches the same axis twice in a row.
    fn draw_coordinate(
        &self,
        weights: &[f64],
        last: Option<usize>,
        rng: &mut StdRng,
    ) -> Result<usize, EngineError> {
        let mut draw = weights.to_vec();
        if let Some(last) = last {
            draw[last] = 0.0;
        }
        let distribution = WeightedIndex::new(&draw).map_err(|_| {
            EngineError::NumericDegenerate("all coordinate sampling weights vanished".into())
        })?;
        Ok(distribution.sample(rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::motif::{Pwm, PwmOptions};
    use crate::core::sequence::{encode_read, parse_read, random_read};
    use crate::engine::config::FitConfigBuilder;
    use crate::workflows::simulate;

    fn config(seed: u64, max_iterations: usize) -> FitConfig {
        FitConfigBuilder::new()
            .dna_concentration(2e-8)
            .protein_concentration(5e-10)
            .n_bins(256)
            .max_iterations(max_iterations)
            .seed(seed)
            .build()
            .unwrap()
    }

    fn example_model() -> EnergyModel {
        let pwm = Pwm::new(
            "m",
            "TF",
            vec![[0.8, 0.1, 0.05, 0.05], [0.1, 0.7, 0.1, 0.1]],
        )
        .unwrap();
        pwm.to_energy_model(&PwmOptions::default()).unwrap()
    }

    fn example_data(motif_len: usize) -> SelexData {
        let mut rng = StdRng::seed_from_u64(3);
        let read_len = 6;
        let rounds = (0..2)
            .map(|_| {
                (0..15)
                    .map(|_| encode_read(&random_read(read_len, &mut rng), motif_len).unwrap())
                    .collect()
            })
            .collect();
        SelexData::new(rounds, read_len).unwrap()
    }

    #[test]
    fn fitting_never_decreases_the_log_likelihood() {
        let config = config(42, 12);
        let reporter = ProgressReporter::new();
        let fitter = ModelFitter::new(&config, &reporter);
        let initial = example_model();
        let data = example_data(initial.motif_len());

        let before = likelihood::log_likelihood(
            &initial,
            &data,
            &config.conditions,
            &config.partition,
        )
        .unwrap();
        let outcome = fitter.fit(&initial, &data).unwrap();
        assert!(outcome.log_likelihood >= before.total);
        assert!(outcome.iterations <= 12);
    }

    #[test]
    fn fitted_likelihood_is_reproducible_by_reevaluation() {
        let config = config(7, 8);
        let reporter = ProgressReporter::new();
        let fitter = ModelFitter::new(&config, &reporter);
        let initial = example_model();
        let data = example_data(initial.motif_len());

        let outcome = fitter.fit(&initial, &data).unwrap();
        let recomputed = likelihood::log_likelihood(
            &outcome.model,
            &data,
            &config.conditions,
            &config.partition,
        )
        .unwrap();
        assert!((outcome.log_likelihood - recomputed.total).abs() < 1e-9);
        assert_eq!(outcome.chem_potentials, recomputed.chem_potentials);
    }

    #[test]
    fn identical_seeds_produce_identical_fits() {
        let initial = example_model();
        let data = example_data(initial.motif_len());
        let reporter = ProgressReporter::new();

        let run = |seed| {
            let config = config(seed, 10);
            ModelFitter::new(&config, &reporter)
                .fit(&initial, &data)
                .unwrap()
        };
        let a = run(99);
        let b = run(99);
        assert_eq!(a.model, b.model);
        assert_eq!(a.log_likelihood, b.log_likelihood);
    }

    #[test]
    fn spread_penalty_charges_the_full_spread_past_the_cap() {
        let config = config(1, 1);
        let reporter = ProgressReporter::new();
        let fitter = ModelFitter::new(&config, &reporter);

        // Mean energy sits on the default target (-3.0), so only the spread
        // term contributes. Spread 10 exceeds the cap of 8 and is charged as
        // 10^2, not (10 - 8)^2.
        let wide = EnergyModel::new(-5.5, vec![10.0, 0.0, 0.0]).unwrap();
        assert!((fitter.penalty(&wide) - 100.0).abs() < 1e-9);

        // Below the cap the spread term vanishes entirely.
        let narrow = EnergyModel::new(-4.0, vec![4.0, 0.0, 0.0]).unwrap();
        assert!(fitter.penalty(&narrow).abs() < 1e-9);
    }

    #[test]
    fn an_accepted_position_step_moves_its_three_offsets_together() {
        let initial = example_model();
        let data = example_data(initial.motif_len());
        let reporter = ProgressReporter::new();

        let mut saw_position_step = false;
        for seed in 0..20 {
            let config = config(seed, 1);
            let outcome = ModelFitter::new(&config, &reporter)
                .fit(&initial, &data)
                .unwrap();
            let changed: Vec<usize> = outcome
                .model
                .offsets()
                .iter()
                .zip(initial.offsets())
                .enumerate()
                .filter(|(_, (a, b))| a != b)
                .map(|(i, _)| i)
                .collect();
            // A rejected step or a reference-energy step leaves every offset
            // untouched.
            if changed.is_empty() {
                continue;
            }
            let position = changed[0] / 3;
            assert!(changed.iter().all(|&i| i / 3 == position));
            assert_eq!(changed.len(), 3);
            saw_position_step = true;
        }
        assert!(saw_position_step);
    }

    #[test]
    fn fitting_recovers_the_likelihood_of_the_generating_model() {
        let generating = example_model();
        let config = config(21, 80);
        let reporter = ProgressReporter::new();

        let mut rng = StdRng::seed_from_u64(4);
        let sim = simulate::run(
            &generating,
            &config.conditions,
            &config.partition,
            6,
            &[60, 60],
            1500,
            &mut rng,
            &reporter,
        )
        .unwrap();
        let rounds = sim
            .rounds
            .iter()
            .map(|reads| {
                reads
                    .iter()
                    .map(|r| {
                        encode_read(&parse_read(r).unwrap(), generating.motif_len()).unwrap()
                    })
                    .collect()
            })
            .collect();
        let data = SelexData::new(rounds, 6).unwrap();

        let mut offsets = generating.offsets().to_vec();
        offsets[1] += 0.75;
        offsets[4] -= 0.75;
        let perturbed =
            EnergyModel::new(generating.reference_energy() + 0.4, offsets).unwrap();

        let target = likelihood::log_likelihood(
            &generating,
            &data,
            &config.conditions,
            &config.partition,
        )
        .unwrap();
        let start = likelihood::log_likelihood(
            &perturbed,
            &data,
            &config.conditions,
            &config.partition,
        )
        .unwrap();

        let outcome = ModelFitter::new(&config, &reporter)
            .fit(&perturbed, &data)
            .unwrap();
        assert!(outcome.log_likelihood >= start.total);
        // The fit should land close to the likelihood of the model the data
        // were simulated from.
        assert!(outcome.log_likelihood >= target.total - 0.02 * target.total.abs());
    }

    #[test]
    fn progress_events_cover_every_iteration() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let increments = AtomicUsize::new(0);
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if matches!(event, Progress::TaskIncrement) {
                increments.fetch_add(1, Ordering::Relaxed);
            }
        }));

        let config = config(1, 5);
        let fitter = ModelFitter::new(&config, &reporter);
        let initial = example_model();
        let data = example_data(initial.motif_len());
        let outcome = fitter.fit(&initial, &data).unwrap();
        assert_eq!(increments.load(Ordering::Relaxed), outcome.iterations);
    }
}
