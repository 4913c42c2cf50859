//! `mergeguard` - CLI for the conflict marker check
//!
//! Exit status is 0 when no conflict markers are found, 1 when some are,
//! and 2 on any operational error.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::Write;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use mergeguard::cli::{
    CheckCommand, Cli, Command, ConfigCommand, ResolveCommand, EXIT_ERROR, EXIT_FINDINGS,
};
use mergeguard::{init_logging, render, resolve_file, scan_paths, Config};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("mergeguard: {err:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    match cli.command {
        Command::Check(check_cmd) => handle_check(config, &check_cmd).await,
        Command::Resolve(resolve_cmd) => handle_resolve(config, &resolve_cmd),
        Command::Config(config_cmd) => {
            handle_config(&config, config_cmd)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn handle_check(mut config: Config, cmd: &CheckCommand) -> anyhow::Result<ExitCode> {
    cmd.apply_to(&mut config);
    config.validate().context("invalid command-line options")?;

    let report = scan_paths(&cmd.paths, &config).await?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    render(&report, config.report.format, &mut out)?;
    out.flush()?;

    if report.is_clean() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(EXIT_FINDINGS))
    }
}

fn handle_resolve(mut config: Config, cmd: &ResolveCommand) -> anyhow::Result<ExitCode> {
    if let Some(size) = cmd.marker_size {
        config.markers.marker_size = size;
    }
    config.validate().context("invalid command-line options")?;

    let resolution = resolve_file(
        &cmd.file,
        cmd.strategy.into(),
        config.scan_options(),
        cmd.dry_run,
    )
    .with_context(|| format!("resolving {}", cmd.file.display()))?;

    let path = resolution.path.display();
    if resolution.blocks_resolved == 0 {
        println!("{path}: no conflicts to resolve");
    } else if resolution.dry_run {
        println!(
            "{path}: would resolve {} conflict(s) using '{}'",
            resolution.blocks_resolved, resolution.strategy
        );
    } else {
        println!(
            "{path}: resolved {} conflict(s) using '{}'",
            resolution.blocks_resolved, resolution.strategy
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Scan]");
                println!("  Exclude:            {}", config.scan.exclude.join(", "));
                println!(
                    "  Extensions:         {}",
                    if config.scan.extensions.is_empty() {
                        "(all)".to_string()
                    } else {
                        config.scan.extensions.join(", ")
                    }
                );
                println!("  Include hidden:     {}", config.scan.include_hidden);
                println!("  Follow symlinks:    {}", config.scan.follow_symlinks);
                println!("  Max file size:      {}", config.scan.max_file_size);
                println!("  Jobs:               {}", config.scan.jobs);
                println!();
                println!("[Markers]");
                println!("  Marker size:        {}", config.markers.marker_size);
                println!("  Strict separators:  {}", config.markers.strict_separators);
                println!();
                println!("[Report]");
                println!("  Format:             {:?}", config.report.format);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.clone().unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match file {
                Some(explicit) => Config::load_file(explicit),
                None => Config::load_from(Some(path)),
            }
            .context("configuration is invalid")?;
            println!("Configuration is valid.");
        }
    }
    Ok(())
}
