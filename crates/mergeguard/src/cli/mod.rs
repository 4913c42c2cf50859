//! Command-line interface for mergeguard.
//!
//! This module provides the CLI structure for the `mergeguard` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    CheckCommand, ConfigCommand, OutputFormat, ResolveCommand, StrategyArg,
};

/// Exit status when the check finds conflict markers.
pub const EXIT_FINDINGS: u8 = 1;

/// Exit status for operational errors.
pub const EXIT_ERROR: u8 = 2;

/// mergeguard - Catch unresolved merge conflicts before they ship
///
/// Scans files for leftover `<<<<<<<`, `=======` and `>>>>>>>` conflict
/// markers and reports the file and line range of each unresolved block.
/// Exits non-zero when any are found, for use in pre-commit hooks and CI.
#[derive(Debug, Parser)]
#[command(name = "mergeguard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scan files for unresolved conflict markers
    Check(CheckCommand),

    /// Resolve the conflicts in a file by picking a side
    Resolve(ResolveCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
