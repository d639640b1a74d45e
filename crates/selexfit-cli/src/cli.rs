use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "selexfit CLI - Fit thermodynamic models of transcription factor DNA-binding affinity from SELEX sequencing rounds.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fit an energy model to the observed reads of sequential SELEX rounds.
    Fit(FitArgs),
    /// Simulate synthetic selection rounds from a known energy model.
    Simulate(SimulateArgs),
    /// Resample replicate log-likelihoods for a fitted model.
    Bootstrap(BootstrapArgs),
}

/// Arguments for the `fit` subcommand.
#[derive(Args, Debug)]
pub struct FitArgs {
    /// Path to the experiment configuration file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Path for the fitted model output file (TOML).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Per-round read files, one read per line, in round order.
    #[arg(required = true, value_name = "ROUND_FILE")]
    pub rounds: Vec<PathBuf>,

    /// Override the RNG seed from the config file.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,
}

/// Arguments for the `simulate` subcommand.
#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Path to the experiment configuration file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Directory for the per-round read files (round_0.txt, round_1.txt, ...).
    #[arg(short, long, required = true, value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Length of each simulated read.
    #[arg(long, required = true, value_name = "INT")]
    pub read_length: usize,

    /// Reads to draw per round, in round order.
    #[arg(long, required = true, value_name = "INT", value_delimiter = ',')]
    pub round_sizes: Vec<usize>,

    /// Size of the random sequence pool the rounds are drawn from.
    #[arg(long, value_name = "INT", default_value_t = 10_000)]
    pub pool_size: usize,

    /// RNG seed for reproducible simulations.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,
}

/// Arguments for the `bootstrap` subcommand.
#[derive(Args, Debug)]
pub struct BootstrapArgs {
    /// Path to the experiment configuration file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Path to a fitted model file produced by `fit`.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub model: PathBuf,

    /// Per-round read files the model was fitted to, in round order.
    #[arg(required = true, value_name = "ROUND_FILE")]
    pub rounds: Vec<PathBuf>,

    /// Number of bootstrap replicates.
    #[arg(long, value_name = "INT", default_value_t = 100)]
    pub samples: usize,

    /// Size of the random sequence pool the replicates resample from.
    #[arg(long, value_name = "INT", default_value_t = 10_000)]
    pub pool_size: usize,

    /// RNG seed for reproducible replicates.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Optional path for the replicate log-likelihoods, one per line.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}
