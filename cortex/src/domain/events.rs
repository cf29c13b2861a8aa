// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Domain events for the archetype memory context
//! Every mutation of the catalog, candidate registry or collective emits one

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use super::fragment::FragmentId;

/// Cortex domain events
/// These events are published to the EventBus for observability and integration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CortexEvent {
    /// A known pattern matched and its base confidence was raised
    PatternReinforced {
        pattern: String,
        fragment_id: FragmentId,
        old_confidence: f64,
        new_confidence: f64,
        timestamp: DateTime<Utc>,
    },

    /// A novelty heuristic proposed a candidate name seen for the first time
    CandidateDiscovered {
        candidate: String,
        fragment_id: FragmentId,
        confidence: f64,
        timestamp: DateTime<Utc>,
    },

    /// An already tracked candidate was detected again
    CandidateObserved {
        candidate: String,
        fragment_id: FragmentId,
        occurrences: u64,
        confidence: f64,
        timestamp: DateTime<Utc>,
    },

    /// An analysis was committed to the collective history
    AnalysisRecorded {
        fragment_id: FragmentId,
        matches: usize,
        novel_patterns: usize,
        confidence: f64,
        timestamp: DateTime<Utc>,
    },

    /// Oldest records were dropped to honour the retention window
    HistoryTrimmed {
        removed: usize,
        retained: usize,
        timestamp: DateTime<Utc>,
    },

    /// Input was rejected before any state was touched
    FragmentRejected {
        reason: String,
        timestamp: DateTime<Utc>,
    },
}

impl CortexEvent {
    /// Get the timestamp of the event
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            CortexEvent::PatternReinforced { timestamp, .. } => *timestamp,
            CortexEvent::CandidateDiscovered { timestamp, .. } => *timestamp,
            CortexEvent::CandidateObserved { timestamp, .. } => *timestamp,
            CortexEvent::AnalysisRecorded { timestamp, .. } => *timestamp,
            CortexEvent::HistoryTrimmed { timestamp, .. } => *timestamp,
            CortexEvent::FragmentRejected { timestamp, .. } => *timestamp,
        }
    }

    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            CortexEvent::PatternReinforced { .. } => "pattern_reinforced",
            CortexEvent::CandidateDiscovered { .. } => "candidate_discovered",
            CortexEvent::CandidateObserved { .. } => "candidate_observed",
            CortexEvent::AnalysisRecorded { .. } => "analysis_recorded",
            CortexEvent::HistoryTrimmed { .. } => "history_trimmed",
            CortexEvent::FragmentRejected { .. } => "fragment_rejected",
        }
    }

    /// The fragment the event concerns, if any
    pub fn fragment_id(&self) -> Option<FragmentId> {
        match self {
            CortexEvent::PatternReinforced { fragment_id, .. }
            | CortexEvent::CandidateDiscovered { fragment_id, .. }
            | CortexEvent::CandidateObserved { fragment_id, .. }
            | CortexEvent::AnalysisRecorded { fragment_id, .. } => Some(*fragment_id),
            CortexEvent::HistoryTrimmed { .. } | CortexEvent::FragmentRejected { .. } => None,
        }
    }
}
