//! Binary entry point for mechstore.
//!
//! Inspects and converts persisted mechanism collections.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]

mod commands;

use clap::{Parser, Subcommand};
use mechstore::config::StoreConfig;
use mechstore::observability::{self, LoggingConfig};
use std::path::PathBuf;
use std::process::ExitCode;

/// Mechstore - persist and restore mechanism collections.
#[derive(Parser)]
#[command(name = "mechstore")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true, env = "MECHSTORE_CONFIG_PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Load a file and summarize each mechanism.
    Inspect {
        /// File to load (.npy, .npz, .bin, .json or no extension).
        path: PathBuf,

        /// Print the loaded document as JSON instead of a summary.
        #[arg(long)]
        json: bool,
    },

    /// Load a file and save it in another format.
    Convert {
        /// Source file.
        input: PathBuf,

        /// Destination file; its extension selects the format.
        output: PathBuf,

        /// Explicit output format: binary or text.
        #[arg(short, long)]
        format: Option<String>,

        /// Replace the destination if it exists.
        #[arg(long)]
        overwrite: bool,
    },

    /// Show the effective configuration.
    Config,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    let logging = LoggingConfig::from_settings(Some(&config.logging), cli.verbose);
    if let Err(e) = observability::init(&logging) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
fn run_command(command: Commands, config: &StoreConfig) -> mechstore::Result<()> {
    match command {
        Commands::Inspect { path, json } => commands::cmd_inspect(&path, json),
        Commands::Convert {
            input,
            output,
            format,
            overwrite,
        } => commands::cmd_convert(config, &input, &output, format.as_deref(), overwrite),
        Commands::Config => {
            commands::cmd_config(config);
            Ok(())
        },
    }
}

/// Loads configuration from an explicit path or the default location, then
/// applies environment overrides.
fn load_config(path: Option<&std::path::Path>) -> mechstore::Result<StoreConfig> {
    let config = match path {
        Some(path) => StoreConfig::load_from_file(path)?,
        None => StoreConfig::load_default(),
    };
    config.with_env_overrides()
}
