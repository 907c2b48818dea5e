//! ugcmount CLI - Command-line interface
//!
//! Scans UGC directories, checks descriptors against an engine version and
//! test-mounts packages through the local host services.

mod commands;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use ugcmount::logging::{init_logging, LoggingConfig};

use crate::commands::common::GlobalArgs;
use crate::error::CliError;

#[derive(Debug, Parser)]
#[command(name = "ugcmount", version, about = "Inspect and mount user generated content")]
struct Cli {
    /// Settings file (INI). Defaults to the user config directory.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Engine version to check descriptors against
    #[arg(long, global = true, value_name = "VER", default_value = "5.3.0")]
    engine_version: String,

    /// Behave like an editor session instead of a game build
    #[arg(long, global = true)]
    editor: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List descriptors below a directory with their compatibility verdict
    Scan {
        #[arg(value_name = "DIR")]
        dir: PathBuf,
    },
    /// Check one descriptor against the engine version
    Check {
        #[arg(value_name = "DESCRIPTOR")]
        descriptor: PathBuf,
    },
    /// Mount every package below a directory and list the live set
    Mount {
        #[arg(value_name = "DIR")]
        dir: PathBuf,
    },
}

fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let _guard = init_logging(&LoggingConfig::with_level(log_level(cli.verbose)))?;

    let globals = GlobalArgs {
        config: cli.config,
        engine_version: cli.engine_version,
        editor: cli.editor,
    };

    match cli.command {
        Commands::Scan { dir } => commands::scan::run(&globals, &dir),
        Commands::Check { descriptor } => commands::check::run(&globals, &descriptor),
        Commands::Mount { dir } => commands::mount::run(&globals, &dir),
    }
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
