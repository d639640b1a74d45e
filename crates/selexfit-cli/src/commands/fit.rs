use crate::cli::FitArgs;
use crate::config::{ConfigFile, ModelFile};
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use crate::utils::reads::load_selex_rounds;
use selexfit::engine::progress::ProgressReporter;
use selexfit::workflows;
use tracing::info;

pub fn run(args: FitArgs) -> Result<()> {
    let config_file = ConfigFile::load(&args.config)?;
    let fit_config = config_file.fit_config(args.seed)?;
    let pwm = config_file.pwm()?;
    let initial = pwm.to_energy_model(&config_file.pwm_options()?)?;

    info!(
        motif = %pwm.name,
        motif_len = initial.motif_len(),
        n_rounds = args.rounds.len(),
        "Loaded configuration and initial model."
    );

    let data = load_selex_rounds(&args.rounds, initial.motif_len())?;

    let handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(handler.get_callback());
    let result = workflows::fit::run(&initial, &data, &fit_config, &reporter)?;

    println!("Fitted motif '{}' ({} rounds)", pwm.name, data.n_rounds());
    println!("  log-likelihood:   {:.4}", result.log_likelihood);
    println!("  consensus:        {}", result.consensus);
    println!(
        "  energies:         reference {:.3}, mean {:.3}, min {:.3} kcal/mol",
        result.model.reference_energy(),
        result.model.mean_energy(),
        result.model.min_energy()
    );
    for (round, u) in result.chem_potentials.iter().enumerate() {
        println!("  round {}:          chemical potential {:.4}", round, u);
    }
    println!(
        "  iterations:       {} ({} rejected, {} failed evaluations)",
        result.iterations, result.rejected_steps, result.failed_evaluations
    );

    let model_file = ModelFile {
        name: pwm.name.clone(),
        factor: pwm.factor.clone(),
        consensus: result.consensus,
        log_likelihood: result.log_likelihood,
        chem_potentials: result.chem_potentials,
        model: result.model,
    };
    model_file.save(&args.output)?;
    info!(path = %args.output.display(), "Wrote fitted model.");

    Ok(())
}
