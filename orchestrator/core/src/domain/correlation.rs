// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Cross-Layer Correlation
//!
//! Types and pure functions the bridge uses to reconcile the discovery verdict
//! with the sibling analyzers:
//!
//! | Correlation | Emitted when |
//! |-------------|--------------|
//! | `PurposePatternAlignment` | the purpose text shares a token with a matched archetype name |
//! | `PatternMismatch` | anomalies were found but discovery matched nothing |
//! | `PredictionValidation` | the predicted label overlaps a matched archetype name |

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::analysis::{AnalysisResult, DiscoverySummary};
use super::collaborators::{AnomalyReport, HolisticReport, PatternPrediction, PurposeReport};

const STOPWORDS: &[&str] = &["pattern", "the", "and", "for", "with", "code"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LayerStatus {
    Ok,
    Fallback { reason: String },
}

impl LayerStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, LayerStatus::Ok)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerStatuses {
    pub discovery: LayerStatus,
    pub purpose: LayerStatus,
    pub anomaly: LayerStatus,
    pub intuition: LayerStatus,
    pub prediction: LayerStatus,
    pub holistic: LayerStatus,
}

impl LayerStatuses {
    /// Sibling layers that fell back. Discovery is not a collaborator.
    pub fn collaborator_fallbacks(&self) -> usize {
        [&self.purpose, &self.anomaly, &self.intuition, &self.prediction, &self.holistic]
            .iter()
            .filter(|s| !s.is_ok())
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub anomalies: AnomalyReport,
    pub intuition_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Correlation {
    PurposePatternAlignment {
        purpose: String,
        pattern: String,
        shared_token: String,
        confidence: f64,
    },
    PatternMismatch {
        anomaly_count: usize,
        message: String,
        confidence: f64,
    },
    PredictionValidation {
        prediction: String,
        pattern: String,
        confidence: f64,
    },
}

impl Correlation {
    pub fn confidence(&self) -> f64 {
        match self {
            Correlation::PurposePatternAlignment { confidence, .. }
            | Correlation::PatternMismatch { confidence, .. }
            | Correlation::PredictionValidation { confidence, .. } => *confidence,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Correlation::PurposePatternAlignment { .. } => "purpose_pattern_alignment",
            Correlation::PatternMismatch { .. } => "pattern_mismatch",
            Correlation::PredictionValidation { .. } => "prediction_validation",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegratedResult {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub discovery: AnalysisResult,
    pub purpose: PurposeReport,
    pub quality: QualityReport,
    pub prediction: PatternPrediction,
    pub holistic: HolisticReport,
    pub layers: LayerStatuses,
    pub correlations: Vec<Correlation>,
    pub recommendations: Vec<String>,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Stable,
    Declining,
    InsufficientData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationMetrics {
    pub total_integrated_analyses: u64,
    pub average_confidence: f64,
    pub trend: Trend,
    pub correlations_found: u64,
    pub total_collaborator_fallbacks: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Idle,
    Healthy,
    Degraded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemHealth {
    pub status: HealthStatus,
    /// Collaborator fallbacks within the trend window.
    pub collaborator_fallbacks: usize,
    pub reliability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegratedSummary {
    pub archetypal_discovery: DiscoverySummary,
    pub integration_metrics: IntegrationMetrics,
    pub system_health: SystemHealth,
}

fn tokens(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|t| t.len() >= 3 && !STOPWORDS.contains(&t.as_str()))
        .collect()
}

fn mean(a: f64, b: f64) -> f64 {
    (a + b) / 2.0
}

pub fn correlate(
    discovery: &AnalysisResult,
    purpose: &PurposeReport,
    anomalies: &AnomalyReport,
    prediction: &PatternPrediction,
) -> Vec<Correlation> {
    let mut correlations = Vec::new();
    let matches = discovery.matches();

    let purpose_tokens = tokens(&format!(
        "{} {}",
        purpose.primary_purpose.purpose, purpose.primary_purpose.description
    ));
    for m in matches {
        if let Some(shared) = tokens(&m.pattern).intersection(&purpose_tokens).next() {
            correlations.push(Correlation::PurposePatternAlignment {
                purpose: purpose.primary_purpose.purpose.clone(),
                pattern: m.pattern.clone(),
                shared_token: shared.clone(),
                confidence: mean(purpose.confidence, m.confidence),
            });
        }
    }

    if !anomalies.anomalies.is_empty() && discovery.is_success() && matches.is_empty() {
        correlations.push(Correlation::PatternMismatch {
            anomaly_count: anomalies.anomalies.len(),
            message: "Quality anomalies found with no recognised archetype; possible architectural pattern violation"
                .to_string(),
            confidence: anomalies.confidence,
        });
    }

    let predicted = prediction.prediction.to_lowercase();
    let prediction_tokens = tokens(&predicted);
    for m in matches {
        let name = m.pattern.to_lowercase();
        let overlaps = (!prediction_tokens.is_empty() && (name.contains(&predicted) || predicted.contains(&name)))
            || tokens(&name).intersection(&prediction_tokens).next().is_some();
        if overlaps {
            correlations.push(Correlation::PredictionValidation {
                prediction: prediction.prediction.clone(),
                pattern: m.pattern.clone(),
                confidence: mean(prediction.confidence, m.confidence),
            });
        }
    }

    correlations
}

fn pattern_suggestion(pattern: &str, confidence: f64) -> String {
    match pattern {
        "Builder Pattern" => "Builder Pattern: validate required fields inside build() so partially configured objects never escape".to_string(),
        "Factory Pattern" => "Factory Pattern: register product types in a lookup table instead of growing the switch".to_string(),
        "Observer Pattern" => "Observer Pattern: pair every subscribe with an unsubscribe to avoid leaked listeners".to_string(),
        "Singleton Pattern" => "Singleton Pattern: inject the shared instance where possible to keep callers testable".to_string(),
        "Strategy Pattern" => "Strategy Pattern: keep strategies stateless so they can be swapped freely".to_string(),
        "Decorator Pattern" => "Decorator Pattern: keep each wrapper focused on a single added behaviour".to_string(),
        "Repository Pattern" => "Repository Pattern: keep query logic inside the repository rather than its callers".to_string(),
        other => format!(
            "{}: matched with {:.0}% confidence, keep its responsibilities cohesive",
            other,
            confidence * 100.0
        ),
    }
}

/// Holistic recommendations first, then pattern-specific and novelty suggestions.
pub fn synthesize_recommendations(
    discovery: &AnalysisResult,
    holistic: &HolisticReport,
    threshold: f64,
) -> Vec<String> {
    let mut recommendations = holistic.recommendations.clone();

    for m in discovery.matches().iter().filter(|m| m.confidence >= threshold) {
        recommendations.push(pattern_suggestion(&m.pattern, m.confidence));
    }

    let mut novel_names: Vec<&str> = Vec::new();
    for candidate in discovery.novel_patterns() {
        if !novel_names.contains(&candidate.name.as_str()) {
            novel_names.push(&candidate.name);
        }
    }
    if !novel_names.is_empty() {
        recommendations.push(format!(
            "Novel pattern discovered: {}. Consider documenting it as a project archetype",
            novel_names.join(", ")
        ));
    }

    let mut seen = BTreeSet::new();
    recommendations.retain(|r| seen.insert(r.clone()));
    recommendations
}

/// Mean of the given confidences, 0.0 when empty.
pub fn integrated_confidence(confidences: &[f64]) -> f64 {
    if confidences.is_empty() {
        return 0.0;
    }
    confidences.iter().sum::<f64>() / confidences.len() as f64
}

/// Compares the oldest and newest of `confidences` (oldest first).
pub fn classify_trend(confidences: &[f64], epsilon: f64) -> Trend {
    match (confidences.first(), confidences.last()) {
        (Some(oldest), Some(newest)) if confidences.len() >= 2 => {
            let delta = newest - oldest;
            if delta > epsilon {
                Trend::Improving
            } else if delta < -epsilon {
                Trend::Declining
            } else {
                Trend::Stable
            }
        }
        _ => Trend::InsufficientData,
    }
}
