use crate::cli::BootstrapArgs;
use crate::config::{ConfigFile, ModelFile};
use crate::error::Result;
use crate::utils::reads::load_selex_rounds;
use rand::rngs::StdRng;
use rand::SeedableRng;
use selexfit::engine::bootstrap::bootstrap_likelihoods;
use selexfit::engine::config::BootstrapConfig;
use selexfit::engine::likelihood;
use std::io::Write;
use tracing::info;

pub fn run(args: BootstrapArgs) -> Result<()> {
    let config_file = ConfigFile::load(&args.config)?;
    let fit_config = config_file.fit_config(args.seed)?;
    let model_file = ModelFile::load(&args.model)?;
    let data = load_selex_rounds(&args.rounds, model_file.model.motif_len())?;

    // Re-evaluate against the observed rounds so the chemical potentials
    // match the data at hand rather than whatever the model was fitted to.
    let observed = likelihood::log_likelihood(
        &model_file.model,
        &data,
        &fit_config.conditions,
        &fit_config.partition,
    )?;
    info!(
        observed = observed.total,
        n_rounds = data.n_rounds(),
        "Evaluated observed log-likelihood."
    );

    let bootstrap_config = BootstrapConfig {
        pool_size: args.pool_size,
        n_samples: args.samples,
    };
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let samples = bootstrap_likelihoods(
        &model_file.model,
        &observed.chem_potentials,
        &data.round_sizes(),
        data.read_len(),
        &fit_config.partition,
        &bootstrap_config,
        &mut rng,
    )?;

    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let variance = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;

    println!("Bootstrap for motif '{}'", model_file.name);
    println!("  observed log-likelihood:  {:.4}", observed.total);
    println!(
        "  replicates: {} (mean {:.4}, std {:.4})",
        samples.len(),
        mean,
        variance.sqrt()
    );

    if let Some(path) = &args.output {
        let mut file = std::fs::File::create(path)?;
        for sample in &samples {
            writeln!(file, "{}", sample)?;
        }
        info!(path = %path.display(), "Wrote replicate log-likelihoods.");
    }

    Ok(())
}
