// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Integration events emitted by the bridge
//! Cortex events (catalog, candidates, collective) live in `archetype_cortex`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IntegrationEvent {
    /// A sibling analyzer failed, timed out or was cancelled
    CollaboratorFellBack {
        analysis_id: Uuid,
        layer: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// An integrated analysis finished and was appended to the bridge history
    IntegratedAnalysisCompleted {
        analysis_id: Uuid,
        confidence: f64,
        correlations: usize,
        fallbacks: usize,
        timestamp: DateTime<Utc>,
    },
}

impl IntegrationEvent {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            IntegrationEvent::CollaboratorFellBack { timestamp, .. } => *timestamp,
            IntegrationEvent::IntegratedAnalysisCompleted { timestamp, .. } => *timestamp,
        }
    }

    pub fn analysis_id(&self) -> Uuid {
        match self {
            IntegrationEvent::CollaboratorFellBack { analysis_id, .. }
            | IntegrationEvent::IntegratedAnalysisCompleted { analysis_id, .. } => *analysis_id,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            IntegrationEvent::CollaboratorFellBack { .. } => "collaborator_fell_back",
            IntegrationEvent::IntegratedAnalysisCompleted { .. } => "integrated_analysis_completed",
        }
    }
}
