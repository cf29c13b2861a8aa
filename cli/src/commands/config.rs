// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use archetype_core::domain::config::ArchetypeConfigManifest;

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate a configuration file with every default spelled out
    Generate {
        /// Output path (default: ./archetype-config.yaml)
        #[arg(short, long, default_value = "./archetype-config.yaml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, force } => generate(output, force).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = ArchetypeConfigManifest::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. ARCHETYPE_CONFIG_PATH: {}",
            std::env::var("ARCHETYPE_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./archetype-config.yaml");
        println!("  4. ~/.archetype/config.yaml");
        println!("  5. /etc/archetype/config.yaml");
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!("  Name: {}", config.metadata.name);
    println!("  Log level: {}", config.log_level());
    println!();

    let discovery = &config.spec.discovery;
    println!("{}", "Discovery:".bold());
    println!("  Minimum fragment length: {}", discovery.min_fragment_length);
    println!(
        "  Reinforcement: fragment {} / pattern {} (cap {})",
        discovery.fragment_reinforcement, discovery.pattern_reinforcement, discovery.pattern_confidence_cap
    );
    println!(
        "  Candidates: cap {} / nudge {} / trigger {}",
        discovery.candidate_confidence_cap, discovery.candidate_nudge, discovery.trigger_confidence
    );
    println!("  Confidence floor: {}", discovery.confidence_floor);
    println!("  Retention window: {}", discovery.retention_window);
    println!();

    let bridge = &config.spec.bridge;
    println!("{}", "Bridge:".bold());
    println!("  History limit: {}", bridge.history_limit);
    println!("  Trend: window {} / epsilon {}", bridge.trend_window, bridge.trend_epsilon);
    println!("  Recommendation threshold: {}", bridge.recommendation_threshold);
    println!("  Collaborator timeout: {} ms", bridge.collaborator_timeout_ms);

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = ArchetypeConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: PathBuf, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", output.display());
    }

    ArchetypeConfigManifest::default()
        .to_yaml_file(&output)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}
