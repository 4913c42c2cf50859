//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::config::Config;

/// Check command arguments.
#[derive(Debug, Args)]
pub struct CheckCommand {
    /// Files or directories to scan
    #[arg(value_name = "PATH", default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Output format (defaults to the configured format)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Also report lone `=======` lines outside a conflict
    #[arg(long)]
    pub strict: bool,

    /// Glob pattern to exclude (repeatable)
    #[arg(short, long, value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Descend into hidden files and directories
    #[arg(long)]
    pub hidden: bool,

    /// Conflict marker length
    #[arg(long, value_name = "N")]
    pub marker_size: Option<usize>,

    /// Number of files to read concurrently
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,
}

impl CheckCommand {
    /// Apply command-line overrides on top of loaded configuration.
    pub fn apply_to(&self, config: &mut Config) {
        config.scan.exclude.extend(self.exclude.iter().cloned());
        if self.hidden {
            config.scan.include_hidden = true;
        }
        if self.strict {
            config.markers.strict_separators = true;
        }
        if let Some(size) = self.marker_size {
            config.markers.marker_size = size;
        }
        if let Some(jobs) = self.jobs {
            config.scan.jobs = jobs;
        }
        if let Some(format) = self.format {
            config.report.format = format.into();
        }
    }
}

/// Resolve command arguments.
#[derive(Debug, Args)]
pub struct ResolveCommand {
    /// File containing conflicts
    pub file: PathBuf,

    /// Which side of each conflict to keep
    #[arg(short, long, value_enum)]
    pub strategy: StrategyArg,

    /// Report what would change without writing
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Conflict marker length
    #[arg(long, value_name = "N")]
    pub marker_size: Option<usize>,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Resolution strategy argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    /// Keep our side
    Ours,
    /// Keep their side
    Theirs,
    /// Keep both sides, ours first
    Union,
    /// Keep the common ancestor (diff3 conflicts)
    Base,
}

impl From<StrategyArg> for crate::resolve::Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Ours => Self::Ours,
            StrategyArg::Theirs => Self::Theirs,
            StrategyArg::Union => Self::Union,
            StrategyArg::Base => Self::Base,
        }
    }
}

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// JSON output
    Json,
    /// GitHub Actions annotations
    Github,
}

impl From<OutputFormat> for crate::report::ReportFormat {
    fn from(arg: OutputFormat) -> Self {
        match arg {
            OutputFormat::Plain => Self::Plain,
            OutputFormat::Json => Self::Json,
            OutputFormat::Github => Self::Github,
        }
    }
}
