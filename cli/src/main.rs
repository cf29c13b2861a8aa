// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Archetype CLI
//!
//! The `archetype` binary runs the discovery engine over source files.
//!
//! ## Commands
//!
//! - `archetype analyze <FILES..>` - Pattern discovery, optionally integrated with the sibling analyzers
//! - `archetype config show|validate|generate` - Configuration management
//!
//! Results are written to stdout as JSON; logs go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use archetype_core::domain::config::{ArchetypeConfigManifest, LoggingConfig};
use archetype_orchestrator::commands::{self, AnalyzeArgs, ConfigCommand};

const DEFAULT_LOG_LEVEL: &str = "warn";
const DEFAULT_LOG_FORMAT: &str = "compact";

/// Archetype - discover recurring design patterns in source code
#[derive(Parser)]
#[command(name = "archetype")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "ARCHETYPE_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); defaults to the configuration, then warn
    #[arg(long, global = true, env = "ARCHETYPE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format (compact, json); defaults to the configuration, then compact
    #[arg(long, global = true)]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze source files for known and emerging archetypes
    #[command(name = "analyze")]
    Analyze(AnalyzeArgs),

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Loaded before the subscriber exists; commands reload it and report errors.
    let configured = ArchetypeConfigManifest::load_or_default(cli.config.clone())
        .ok()
        .and_then(|config| config.spec.observability.and_then(|o| o.logging));
    let (level, format) = resolve_logging(cli.log_level, cli.log_format, configured);
    init_logging(&level, &format)?;

    match cli.command {
        Some(Commands::Analyze(args)) => commands::analyze::handle_command(args, cli.config).await,
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config).await
        }
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Command-line flags win over the configuration's `observability.logging`.
fn resolve_logging(
    level: Option<String>,
    format: Option<String>,
    configured: Option<LoggingConfig>,
) -> (String, String) {
    let level = level
        .or_else(|| configured.as_ref().map(|l| l.level.clone()))
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
    let format = format
        .or_else(|| configured.map(|l| l.format))
        .unwrap_or_else(|| DEFAULT_LOG_FORMAT.to_string());
    (level, format)
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str, format: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    match format {
        "json" => builder.json().init(),
        _ => builder.compact().init(),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured(level: &str, format: &str) -> Option<LoggingConfig> {
        Some(LoggingConfig {
            level: level.to_string(),
            format: format.to_string(),
        })
    }

    #[test]
    fn test_configuration_drives_logging_without_flags() {
        let (level, format) = resolve_logging(None, None, configured("debug", "json"));
        assert_eq!(level, "debug");
        assert_eq!(format, "json");
    }

    #[test]
    fn test_flags_override_configuration() {
        let (level, format) =
            resolve_logging(Some("trace".to_string()), Some("compact".to_string()), configured("debug", "json"));
        assert_eq!(level, "trace");
        assert_eq!(format, "compact");
    }

    #[test]
    fn test_defaults_without_logging_section() {
        let (level, format) = resolve_logging(None, None, None);
        assert_eq!(level, DEFAULT_LOG_LEVEL);
        assert_eq!(format, DEFAULT_LOG_FORMAT);
    }
}
