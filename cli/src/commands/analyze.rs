// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Analyze command
//!
//! Runs every file through one discovery engine so that repeated fragments
//! across files reinforce the catalog and surface emerging archetypes.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use archetype_core::application::{ArchetypeBridge, ArchetypeDiscoverer, DiscoveryHandle, DiscoveryService};
use archetype_core::domain::analysis::DiscoverySummary;
use archetype_core::domain::collaborators::Collaborators;
use archetype_core::domain::config::ArchetypeConfigManifest;
use archetype_core::infrastructure::{EventBus, EventBusError};
use archetype_cortex::{EmergingPattern, FragmentContext};

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Source files to analyze, in order
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,

    /// Also run the purpose, anomaly, prediction and holistic analyzers and correlate them
    #[arg(long)]
    pub integrated: bool,

    /// Extra context attached to every fragment
    #[arg(long = "context", value_name = "KEY=VALUE", value_parser = parse_context_pair)]
    pub context: Vec<(String, String)>,

    /// Print the cumulative summary after the last file
    #[arg(long)]
    pub summary: bool,
}

#[derive(Serialize)]
struct DiscoveryReport {
    summary: DiscoverySummary,
    emerging_patterns: Vec<EmergingPattern>,
}

pub async fn handle_command(args: AnalyzeArgs, config_override: Option<PathBuf>) -> Result<()> {
    let config = ArchetypeConfigManifest::load_or_default(config_override)
        .context("Failed to load configuration")?;
    config
        .validate()
        .context("Configuration validation failed")?;

    let event_bus = Arc::new(EventBus::with_default_capacity());
    let listener = spawn_event_logger(&event_bus);

    let discoverer = ArchetypeDiscoverer::new(config.spec.discovery.clone()).with_event_bus(event_bus.clone());
    let (handle, actor) = DiscoveryHandle::spawn(discoverer);
    let discovery: Arc<dyn DiscoveryService> = Arc::new(handle.clone());
    let bridge = ArchetypeBridge::new(discovery.clone(), Collaborators::lexical(), config.spec.bridge.clone())
        .with_event_bus(event_bus);

    info!(files = args.files.len(), integrated = args.integrated, "Starting analysis");

    let mut failures = 0usize;
    for path in &args.files {
        println!("{}", format!("==> {}", path.display()).bold().cyan());
        let code = match tokio::fs::read_to_string(path).await {
            Ok(code) => code,
            Err(e) => {
                failures += 1;
                warn!(path = %path.display(), error = %e, "Skipping unreadable file");
                eprintln!("{}", format!("⚠ {}: {}", path.display(), e).yellow());
                continue;
            }
        };
        let context = fragment_context(path, &args.context);

        if args.integrated {
            let result = bridge.comprehensive_analysis_with_discovery(&code, context).await;
            if !result.discovery.is_success() {
                failures += 1;
            }
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            let result = bridge.analyze(&code, context).await;
            if let Some(error) = result.error() {
                failures += 1;
                eprintln!("{}", format!("⚠ {}: {}", path.display(), error).yellow());
            }
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    if args.summary {
        println!("{}", "==> summary".bold().cyan());
        if args.integrated {
            println!("{}", serde_json::to_string_pretty(&bridge.integrated_summary().await)?);
        } else {
            let report = DiscoveryReport {
                summary: discovery.discovery_summary().await?,
                emerging_patterns: discovery.emerging_patterns().await?,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    handle.shutdown().await;
    actor.await.context("Discovery actor terminated abnormally")?;
    listener.abort();

    if failures > 0 {
        bail!("{} of {} files could not be analyzed", failures, args.files.len());
    }
    Ok(())
}

/// Fragment context for one file: its path plus the `--context` pairs.
fn fragment_context(path: &std::path::Path, extra: &[(String, String)]) -> FragmentContext {
    let mut context = FragmentContext::new().with("path", path.display().to_string());
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        context = context.with("extension", ext);
    }
    for (key, value) in extra {
        context = context.with(key.clone(), value.clone());
    }
    context
}

fn parse_context_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", raw)),
    }
}

fn spawn_event_logger(event_bus: &EventBus) -> tokio::task::JoinHandle<()> {
    let mut receiver = event_bus.subscribe();
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => debug!(event = event.event_type(), "Domain event"),
                Err(EventBusError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
    })
}
