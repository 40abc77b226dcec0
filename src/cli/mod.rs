//! Command-line interface for lintpass
//!
//! This module provides the main CLI structure and command handling for lintpass.
//! It uses clap for argument parsing and provides a clean, user-friendly interface.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

pub mod commands;
mod output;

pub use commands::check::{CheckArgs, OutputFormat};
pub use output::Output;

/// Exit status when no error-severity diagnostics were found
pub const EXIT_CLEAN: i32 = 0;
/// Exit status when error-severity diagnostics were found
pub const EXIT_DIAGNOSTICS: i32 = 1;
/// Exit status when the build pass itself failed
pub const EXIT_FAILURE: i32 = 2;

/// lintpass - parallel, incremental checking of project files
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable quiet output (minimal)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Check the files of a project
    Check(CheckArgs),
    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Configuration subcommands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the merged configuration for a project
    Show {
        /// Project root
        #[arg(value_name = "PATH", default_value = ".")]
        path: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl Cli {
    /// Execute the CLI command, returning the process exit status
    pub fn run(self) -> Result<i32> {
        // Initialize output handler with global verbose and quiet settings
        let output = Output::new(self.verbose, self.quiet);
        let config_path = self.config.as_deref();

        match self.command {
            Some(Commands::Check(args)) => commands::check::execute(args, config_path, &output),
            Some(Commands::Config(cmd)) => commands::config::execute(cmd, config_path, &output),
            None => {
                // Show help when no command is provided
                let mut cmd = Cli::command();
                cmd.print_help()?;
                Ok(EXIT_CLEAN)
            }
        }
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `--verbose` logs at debug level and
/// `--quiet` only logs errors.
pub fn init_tracing(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "lintpass=debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // A subscriber may already be installed when embedded
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
