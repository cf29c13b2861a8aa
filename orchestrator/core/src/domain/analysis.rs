// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Analysis Results
//!
//! Tagged result types returned by the discovery engine. `analyze` never
//! returns an error: invalid input and an unavailable engine both surface as
//! [`AnalysisResult::Failure`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use archetype_cortex::{CandidateArchetype, CollectiveSnapshot, Fragment, FragmentError};

use super::matching::MatchResult;
use super::novelty::CandidateResult;

pub const INVALID_FRAGMENT_ERROR: &str = "Invalid code fragment";
pub const ENGINE_UNAVAILABLE_ERROR: &str = "Discovery engine unavailable";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DiscoveryError {
    #[error("Invalid code fragment: {0}")]
    InvalidFragment(#[from] FragmentError),

    #[error("Discovery engine unavailable")]
    Unavailable,
}

/// Output of the read-only half of an analysis, awaiting commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub fragment: Fragment,
    pub matches: Vec<MatchResult>,
    pub novel_patterns: Vec<CandidateResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    pub fragment: Fragment,
    pub matches: Vec<MatchResult>,
    pub novel_patterns: Vec<CandidateResult>,
    pub confidence: f64,
    pub observation_count: u64,
    pub collective_insights: CollectiveSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisResult {
    Success(Box<AnalysisOutcome>),
    Failure {
        error: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

impl AnalysisResult {
    pub fn invalid(reason: &FragmentError) -> Self {
        AnalysisResult::Failure {
            error: INVALID_FRAGMENT_ERROR.to_string(),
            reason: Some(reason.to_string()),
        }
    }

    pub fn unavailable() -> Self {
        AnalysisResult::Failure {
            error: ENGINE_UNAVAILABLE_ERROR.to_string(),
            reason: None,
        }
    }

    pub fn from_error(error: DiscoveryError) -> Self {
        match error {
            DiscoveryError::InvalidFragment(reason) => Self::invalid(&reason),
            DiscoveryError::Unavailable => Self::unavailable(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AnalysisResult::Success(_))
    }

    pub fn outcome(&self) -> Option<&AnalysisOutcome> {
        match self {
            AnalysisResult::Success(outcome) => Some(outcome),
            AnalysisResult::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            AnalysisResult::Success(_) => None,
            AnalysisResult::Failure { error, .. } => Some(error),
        }
    }

    /// 0.0 for failures.
    pub fn confidence(&self) -> f64 {
        self.outcome().map(|o| o.confidence).unwrap_or(0.0)
    }

    pub fn matches(&self) -> &[MatchResult] {
        self.outcome().map(|o| o.matches.as_slice()).unwrap_or(&[])
    }

    pub fn novel_patterns(&self) -> &[CandidateResult] {
        self.outcome().map(|o| o.novel_patterns.as_slice()).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscoverySummary {
    pub total_observations: u64,
    pub known_patterns: usize,
    pub candidate_archetypes: usize,
    pub top_candidates: Vec<CandidateArchetype>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_serialization() {
        let result = AnalysisResult::invalid(&FragmentError::Empty);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["error"], "Invalid code fragment");
        assert_eq!(json["reason"], "fragment is empty");
    }

    #[test]
    fn test_failure_accessors() {
        let result = AnalysisResult::unavailable();
        assert!(!result.is_success());
        assert_eq!(result.error(), Some(ENGINE_UNAVAILABLE_ERROR));
        assert_eq!(result.confidence(), 0.0);
        assert!(result.matches().is_empty());
        assert!(result.novel_patterns().is_empty());
    }

    #[test]
    fn test_from_error() {
        let result = AnalysisResult::from_error(DiscoveryError::InvalidFragment(FragmentError::TooShort {
            length: 3,
            minimum: 10,
        }));
        assert_eq!(result.error(), Some(INVALID_FRAGMENT_ERROR));
    }
}
