use tracing::{info, instrument};

use crate::core::energy::EnergyModel;
use crate::engine::config::FitConfig;
use crate::engine::error::EngineError;
use crate::engine::fitter::ModelFitter;
use crate::engine::likelihood::SelexData;
use crate::engine::progress::{Progress, ProgressReporter};

#[derive(Debug, Clone)]
pub struct FitResult {
    pub model: EnergyModel,
    pub chem_potentials: Vec<f64>,
    pub log_likelihood: f64,
    pub iterations: usize,
    pub rejected_steps: usize,
    pub failed_evaluations: usize,
    /// Minimum-energy sequence of the fitted model, for reporting.
    pub consensus: String,
}

#[instrument(skip_all, name = "fit_workflow")]
pub fn run(
    initial: &EnergyModel,
    data: &SelexData,
    config: &FitConfig,
    reporter: &ProgressReporter,
) -> Result<FitResult, EngineError> {
    // === Phase 0: Validation ===
    reporter.report(Progress::PhaseStart {
        name: "Preparation",
    });
    if data.read_len() < initial.motif_len() {
        return Err(EngineError::InvalidConfiguration(format!(
            "read length {} is shorter than the motif length {}",
            data.read_len(),
            initial.motif_len()
        )));
    }
    info!(
        motif_len = initial.motif_len(),
        n_rounds = data.n_rounds(),
        n_reads = data.round_sizes().iter().sum::<usize>(),
        "Starting energy model fit."
    );
    reporter.report(Progress::PhaseFinish);

    // === Phase 1: Weighted coordinate descent ===
    reporter.report(Progress::PhaseStart {
        name: "Optimization",
    });
    let fitter = ModelFitter::new(config, reporter);
    let outcome = fitter.fit(initial, data)?;
    reporter.report(Progress::PhaseFinish);

    info!(
        log_likelihood = outcome.log_likelihood,
        iterations = outcome.iterations,
        rejected_steps = outcome.rejected_steps,
        "Fit complete."
    );

    let consensus = outcome
        .model
        .consensus_sequence()
        .iter()
        .map(|b| b.to_char())
        .collect();
    Ok(FitResult {
        model: outcome.model,
        chem_potentials: outcome.chem_potentials,
        log_likelihood: outcome.log_likelihood,
        iterations: outcome.iterations,
        rejected_steps: outcome.rejected_steps,
        failed_evaluations: outcome.failed_evaluations,
        consensus,
    })
}
