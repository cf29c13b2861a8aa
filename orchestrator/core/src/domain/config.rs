// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Discovery Configuration Types
//
// Defines the configuration schema for the archetype engine:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Discovery tuning (fragment gate, reinforcement deltas, confidence caps)
// - Bridge tuning (history, trend window, collaborator timeout)
// - Observability settings

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use archetype_cortex::{
    CANDIDATE_CONFIDENCE_CAP, DEFAULT_MIN_FRAGMENT_LENGTH, DEFAULT_RETENTION_WINDOW,
    KNOWN_PATTERN_CONFIDENCE_CAP,
};

use super::novelty::DEFAULT_TRIGGER_CONFIDENCE;

pub const API_VERSION: &str = "archetype.dev/v1";
pub const KIND: &str = "DiscoveryConfig";

/// Top-level Kubernetes-style configuration manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeConfigManifest {
    /// API version (must be "archetype.dev/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "DiscoveryConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    #[serde(default)]
    pub spec: ArchetypeConfigSpec,
}

/// Manifest metadata (Kubernetes-style)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

/// Configuration specification (content under spec:)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeConfigSpec {
    #[serde(default)]
    pub discovery: DiscoverySettings,

    #[serde(default)]
    pub bridge: BridgeSettings,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub observability: Option<ObservabilityConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoverySettings {
    /// Minimum trimmed length of an accepted fragment
    pub min_fragment_length: usize,

    /// Added to a fragment's confidence per catalog match (cap 1.0)
    pub fragment_reinforcement: f64,

    /// Added to a known pattern's base confidence per match
    pub pattern_reinforcement: f64,

    pub pattern_confidence_cap: f64,

    pub candidate_confidence_cap: f64,

    /// Added to a candidate's confidence on each repeat detection
    pub candidate_nudge: f64,

    /// Confidence of trigger-tier novelty results
    pub trigger_confidence: f64,

    /// Lowest confidence a successful analysis reports
    pub confidence_floor: f64,

    /// Analysis records kept by the knowledge collective
    pub retention_window: usize,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            min_fragment_length: DEFAULT_MIN_FRAGMENT_LENGTH,
            fragment_reinforcement: 0.1,
            pattern_reinforcement: 0.01,
            pattern_confidence_cap: KNOWN_PATTERN_CONFIDENCE_CAP,
            candidate_confidence_cap: CANDIDATE_CONFIDENCE_CAP,
            candidate_nudge: 0.05,
            trigger_confidence: DEFAULT_TRIGGER_CONFIDENCE,
            confidence_floor: 0.1,
            retention_window: DEFAULT_RETENTION_WINDOW,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSettings {
    /// Integrated results retained for summaries
    pub history_limit: usize,

    /// Recent results considered for trend and health
    pub trend_window: usize,

    pub trend_epsilon: f64,

    /// Minimum match confidence for a pattern-specific recommendation
    pub recommendation_threshold: f64,

    /// Per-collaborator deadline in milliseconds
    pub collaborator_timeout_ms: u64,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            history_limit: 100,
            trend_window: 10,
            trend_epsilon: 0.05,
            recommendation_threshold: 0.6,
            collaborator_timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (compact, json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "compact".to_string()
}

impl Default for ArchetypeConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "archetype-engine".to_string(),
                version: Some("1.0.0".to_string()),
                labels: None,
            },
            spec: ArchetypeConfigSpec::default(),
        }
    }
}

impl ArchetypeConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. ARCHETYPE_CONFIG_PATH environment variable
    /// 2. ./archetype-config.yaml (working directory)
    /// 3. ~/.archetype/config.yaml (user home)
    /// 4. /etc/archetype/config.yaml (system, Unix) or C:\ProgramData\Archetype\config.yaml (Windows)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("ARCHETYPE_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./archetype-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".archetype").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        let system_config = PathBuf::from("/etc/archetype/config.yaml");
        #[cfg(windows)]
        let system_config = PathBuf::from("C:\\ProgramData\\Archetype\\config.yaml");

        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit CLI path fails if missing or invalid
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load config at {:?}: {}", path, e))?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::debug!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides read through `lookup`; unparseable values are ignored.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("ARCHETYPE_RETENTION_WINDOW") {
            match val.trim().parse::<usize>() {
                Ok(window) => {
                    tracing::info!("Environment override: ARCHETYPE_RETENTION_WINDOW={}", window);
                    self.spec.discovery.retention_window = window;
                }
                Err(_) => tracing::warn!(
                    "Invalid value for ARCHETYPE_RETENTION_WINDOW: '{}'. Expected a positive integer. Ignoring.",
                    val
                ),
            }
        }

        if let Some(val) = lookup("ARCHETYPE_COLLABORATOR_TIMEOUT_MS") {
            match val.trim().parse::<u64>() {
                Ok(timeout) => {
                    tracing::info!("Environment override: ARCHETYPE_COLLABORATOR_TIMEOUT_MS={}", timeout);
                    self.spec.bridge.collaborator_timeout_ms = timeout;
                }
                Err(_) => tracing::warn!(
                    "Invalid value for ARCHETYPE_COLLABORATOR_TIMEOUT_MS: '{}'. Expected milliseconds. Ignoring.",
                    val
                ),
            }
        }

        if let Some(val) = lookup("ARCHETYPE_LOG_LEVEL") {
            tracing::info!("Environment override: ARCHETYPE_LOG_LEVEL={}", val);
            let observability = self.spec.observability.get_or_insert_with(ObservabilityConfig::default);
            observability.logging.get_or_insert_with(LoggingConfig::default).level = val;
        }
    }

    /// Effective log level, "info" when unset
    pub fn log_level(&self) -> &str {
        self.spec
            .observability
            .as_ref()
            .and_then(|o| o.logging.as_ref())
            .map(|l| l.level.as_str())
            .unwrap_or("info")
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!("Invalid apiVersion: '{}'. Must be '{}'", self.api_version, API_VERSION);
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        let discovery = &self.spec.discovery;
        let unit_values = [
            ("fragment_reinforcement", discovery.fragment_reinforcement),
            ("pattern_reinforcement", discovery.pattern_reinforcement),
            ("pattern_confidence_cap", discovery.pattern_confidence_cap),
            ("candidate_confidence_cap", discovery.candidate_confidence_cap),
            ("candidate_nudge", discovery.candidate_nudge),
            ("trigger_confidence", discovery.trigger_confidence),
            ("confidence_floor", discovery.confidence_floor),
            ("recommendation_threshold", self.spec.bridge.recommendation_threshold),
            ("trend_epsilon", self.spec.bridge.trend_epsilon),
        ];
        for (field, value) in unit_values {
            if !(0.0..=1.0).contains(&value) {
                anyhow::bail!("{} must be within [0, 1], got {}", field, value);
            }
        }

        if discovery.candidate_confidence_cap >= discovery.pattern_confidence_cap {
            anyhow::bail!(
                "candidate_confidence_cap ({}) must be below pattern_confidence_cap ({})",
                discovery.candidate_confidence_cap,
                discovery.pattern_confidence_cap
            );
        }

        if discovery.min_fragment_length == 0 {
            anyhow::bail!("min_fragment_length must be positive");
        }
        if discovery.retention_window == 0 {
            anyhow::bail!("retention_window must be positive");
        }

        let bridge = &self.spec.bridge;
        if bridge.history_limit == 0 || bridge.trend_window == 0 {
            anyhow::bail!("history_limit and trend_window must be positive");
        }
        if bridge.collaborator_timeout_ms == 0 {
            anyhow::bail!("collaborator_timeout_ms must be positive");
        }

        Ok(())
    }
}
