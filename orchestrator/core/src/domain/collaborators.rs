// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Sibling Analyzer Contracts
//!
//! The bridge consults four independent analyzers alongside discovery. Only
//! their contracts live here; implementations are swappable (see
//! `infrastructure::lexical` for the built-in ones).
//!
//! Each report type has a `fallback()` constructor: the conservative value
//! substituted when a collaborator fails, times out or is cancelled.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CollaboratorError {
    #[error("{layer} analyzer failed: {message}")]
    Failed { layer: &'static str, message: String },

    #[error("{layer} analyzer timed out after {timeout_ms} ms")]
    TimedOut { layer: &'static str, timeout_ms: u64 },

    #[error("{layer} analyzer was cancelled")]
    Cancelled { layer: &'static str },

    #[error("{layer} analyzer panicked: {message}")]
    Panicked { layer: &'static str, message: String },
}

impl CollaboratorError {
    pub fn failed(layer: &'static str, message: impl Into<String>) -> Self {
        CollaboratorError::Failed { layer, message: message.into() }
    }

    pub fn layer(&self) -> &'static str {
        match self {
            CollaboratorError::Failed { layer, .. }
            | CollaboratorError::TimedOut { layer, .. }
            | CollaboratorError::Cancelled { layer }
            | CollaboratorError::Panicked { layer, .. } => layer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimaryPurpose {
    pub purpose: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurposeReport {
    pub primary_purpose: PrimaryPurpose,
    pub confidence: f64,
}

impl PurposeReport {
    pub fn fallback() -> Self {
        Self {
            primary_purpose: PrimaryPurpose {
                purpose: "unknown".to_string(),
                description: "Purpose analysis unavailable".to_string(),
            },
            confidence: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalySeverity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub kind: String,
    pub severity: AnomalySeverity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyReport {
    pub anomalies: Vec<Anomaly>,
    pub summary: String,
    pub confidence: f64,
}

impl AnomalyReport {
    pub fn fallback() -> Self {
        Self {
            anomalies: Vec::new(),
            summary: "Anomaly analysis unavailable".to_string(),
            confidence: 0.0,
        }
    }
}

/// Intuition score substituted when the anomaly analyzer cannot provide one.
pub const FALLBACK_INTUITION_SCORE: f64 = 0.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternPrediction {
    pub prediction: String,
    pub confidence: f64,
}

impl PatternPrediction {
    pub fn fallback() -> Self {
        Self {
            prediction: "unknown".to_string(),
            confidence: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HolisticReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub confidence: f64,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl HolisticReport {
    pub fn fallback() -> Self {
        Self::default()
    }
}

#[async_trait]
pub trait PurposeAnalyzer: Send + Sync {
    async fn identify(&self, code: &str) -> Result<PurposeReport, CollaboratorError>;
}

#[async_trait]
pub trait AnomalyAnalyzer: Send + Sync {
    async fn detect_anomalies(&self, code: &str) -> Result<AnomalyReport, CollaboratorError>;
    async fn intuition_score(&self, code: &str) -> Result<f64, CollaboratorError>;
}

#[async_trait]
pub trait PatternPredictor: Send + Sync {
    async fn predict(&self, code: &str) -> Result<PatternPrediction, CollaboratorError>;
}

#[async_trait]
pub trait HolisticAnalyzer: Send + Sync {
    async fn analyze(&self, code: &str) -> Result<HolisticReport, CollaboratorError>;
}

/// The sibling analyzers consulted by the bridge.
#[derive(Clone)]
pub struct Collaborators {
    pub purpose: Arc<dyn PurposeAnalyzer>,
    pub anomaly: Arc<dyn AnomalyAnalyzer>,
    pub predictor: Arc<dyn PatternPredictor>,
    pub holistic: Arc<dyn HolisticAnalyzer>,
}
