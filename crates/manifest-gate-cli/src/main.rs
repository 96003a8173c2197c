//! manifest-gate - validate cluster manifests and gate upgrades between them
//!
//! Commands:
//! - `validate` checks a manifest and its infrastructure
//! - `compare` lists static changes between two manifests
//! - `analyze` validates the target and rejects immutable changes
//! - `encrypt` seals a value for an `isEncrypted` parameter

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;

mod commands;
mod error;
mod output;

use error::{CliError, CliResult};
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "manifest-gate")]
#[command(about = "Cluster manifest validation and upgrade gating", long_about = None)]
#[command(version)]
struct Cli {
    /// Validator configuration file (JSON)
    #[arg(short, long, env = "MANIFEST_GATE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Output format for diffs
    #[arg(short, long, default_value = "text", global = true)]
    output: OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a manifest
    Validate { manifest: PathBuf },

    /// List static changes between two manifests
    #[command(alias = "diff")]
    Compare { current: PathBuf, target: PathBuf },

    /// Check whether an upgrade from CURRENT to TARGET is allowed
    Analyze { current: PathBuf, target: PathBuf },

    /// Encrypt a parameter value with a configured key
    Encrypt {
        /// Key id; optional when exactly one key is configured
        #[arg(short, long)]
        key_id: Option<String>,
        value: String,
    },
}

fn init_tracing(verbose: bool) -> CliResult<()> {
    let filter = if verbose { "debug" } else { "info" };
    let subscriber = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        );
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| CliError::Logging(e.to_string()))?;
    // Library code logs through both `log` and `tracing`.
    tracing_log::LogTracer::init().map_err(|e| CliError::Logging(e.to_string()))
}

fn run(cli: Cli) -> CliResult<()> {
    let config = commands::load_validator_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Validate { manifest } => {
            println!("{}", commands::validate(config, &manifest)?);
        }
        Commands::Compare { current, target } => {
            let diff = commands::compare(config, &current, &target)?;
            println!("{}", output::render_diff(&diff, cli.output)?);
        }
        Commands::Analyze { current, target } => {
            let diff = commands::analyze(config, &current, &target)?;
            println!("{}", output::render_diff(&diff, cli.output)?);
        }
        Commands::Encrypt { key_id, value } => {
            println!("{}", commands::encrypt(config, key_id.as_deref(), &value)?);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.verbose) {
        eprintln!("{}", e);
        return ExitCode::from(2);
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
