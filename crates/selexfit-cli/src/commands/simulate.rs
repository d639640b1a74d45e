use crate::cli::SimulateArgs;
use crate::config::ConfigFile;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use rand::rngs::StdRng;
use rand::SeedableRng;
use selexfit::engine::progress::ProgressReporter;
use selexfit::workflows;
use std::io::Write;
use tracing::info;

pub fn run(args: SimulateArgs) -> Result<()> {
    let config_file = ConfigFile::load(&args.config)?;
    let fit_config = config_file.fit_config(args.seed)?;
    let pwm = config_file.pwm()?;
    let model = pwm.to_energy_model(&config_file.pwm_options()?)?;

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(handler.get_callback());
    let result = workflows::simulate::run(
        &model,
        &fit_config.conditions,
        &fit_config.partition,
        args.read_length,
        &args.round_sizes,
        args.pool_size,
        &mut rng,
        &reporter,
    )?;

    std::fs::create_dir_all(&args.output_dir)?;
    for (round, reads) in result.rounds.iter().enumerate() {
        let path = args.output_dir.join(format!("round_{}.txt", round));
        let mut file = std::fs::File::create(&path)?;
        for read in reads {
            writeln!(file, "{}", read)?;
        }
        info!(path = %path.display(), n_reads = reads.len(), "Wrote simulated round.");
    }

    println!(
        "Simulated {} rounds for motif '{}'",
        result.rounds.len(),
        pwm.name
    );
    for (round, u) in result.chem_potentials.iter().enumerate() {
        println!("  round {}: chemical potential {:.4}", round, u);
    }

    Ok(())
}
