// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;

use crate::domain::collaborators::{CollaboratorError, PrimaryPurpose, PurposeAnalyzer, PurposeReport};

/// A purpose and the lowercase keywords that suggest it
#[derive(Debug, Clone)]
pub struct PurposeProfile {
    pub purpose: String,
    pub description: String,
    pub keywords: Vec<String>,
}

impl PurposeProfile {
    pub fn new(purpose: &str, description: &str, keywords: &[&str]) -> Self {
        Self {
            purpose: purpose.to_string(),
            description: description.to_string(),
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }
}

const GENERAL_PURPOSE: &str = "computation";
const GENERAL_CONFIDENCE: f64 = 0.2;

/// Picks the profile with the most keyword hits
pub struct LexicalPurposeAnalyzer {
    profiles: Vec<PurposeProfile>,
}

impl LexicalPurposeAnalyzer {
    pub fn with_profiles(profiles: Vec<PurposeProfile>) -> Self {
        Self { profiles }
    }

    fn classify(&self, code: &str) -> PurposeReport {
        let lowered = code.to_lowercase();
        let best = self
            .profiles
            .iter()
            .map(|p| (p, p.keywords.iter().filter(|k| lowered.contains(k.as_str())).count()))
            .filter(|(_, hits)| *hits > 0)
            // first profile wins ties
            .fold(None, |best: Option<(&PurposeProfile, usize)>, candidate| match best {
                Some(b) if b.1 >= candidate.1 => Some(b),
                _ => Some(candidate),
            });

        match best {
            Some((profile, hits)) => PurposeReport {
                primary_purpose: PrimaryPurpose {
                    purpose: profile.purpose.clone(),
                    description: profile.description.clone(),
                },
                confidence: (0.3 + 0.15 * hits as f64).min(0.9),
            },
            None => PurposeReport {
                primary_purpose: PrimaryPurpose {
                    purpose: GENERAL_PURPOSE.to_string(),
                    description: "General computation".to_string(),
                },
                confidence: GENERAL_CONFIDENCE,
            },
        }
    }
}

impl Default for LexicalPurposeAnalyzer {
    fn default() -> Self {
        Self::with_profiles(vec![
            PurposeProfile::new(
                "object-construction",
                "Object construction (builder, factory, singleton)",
                &["build", "create", "construct", "new ", "instance"],
            ),
            PurposeProfile::new(
                "data-access",
                "Data access and persistence (repository, query)",
                &["repository", "query", "save(", "find", "insert", "delete("],
            ),
            PurposeProfile::new(
                "event-handling",
                "Event handling (observer, listener, subscription)",
                &["subscribe", "emit", "listener", "notify", "event"],
            ),
            PurposeProfile::new(
                "resource-management",
                "Resource pooling and lifecycle (pool, acquire, release)",
                &["pool", "acquire", "release", "dispose", "close("],
            ),
            PurposeProfile::new(
                "request-processing",
                "Request processing pipeline (middleware, handler)",
                &["request", "response", "next(", "handler", "middleware"],
            ),
            PurposeProfile::new(
                "caching",
                "Result caching (memoization, lookup tables)",
                &["cache", "memo"],
            ),
        ])
    }
}

#[async_trait]
impl PurposeAnalyzer for LexicalPurposeAnalyzer {
    async fn identify(&self, code: &str) -> Result<PurposeReport, CollaboratorError> {
        Ok(self.classify(code))
    }
}
