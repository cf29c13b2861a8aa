// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;

use crate::domain::collaborators::{CollaboratorError, PatternPrediction, PatternPredictor};

const UNKNOWN: &str = "unknown";
const UNKNOWN_CONFIDENCE: f64 = 0.1;

/// Keyword vote over a label table. Labels are independent of the catalog.
pub struct LexicalPatternPredictor {
    labels: Vec<(String, Vec<String>)>,
}

impl LexicalPatternPredictor {
    pub fn with_labels(labels: Vec<(String, Vec<String>)>) -> Self {
        Self {
            labels: labels
                .into_iter()
                .map(|(label, keywords)| (label, keywords.into_iter().map(|k| k.to_lowercase()).collect()))
                .collect(),
        }
    }
}

impl Default for LexicalPatternPredictor {
    fn default() -> Self {
        let table: &[(&str, &[&str])] = &[
            ("builder", &["builder", "build()", "return this", "return self"]),
            ("factory", &["factory", "create", "switch", "case "]),
            ("observer", &["subscribe", "notify", "listener", "emit"]),
            ("singleton", &["singleton", "getinstance", "static instance"]),
            ("strategy", &["strategy", "algorithm", "setstrategy"]),
            ("decorator", &["decorator", "wrap"]),
            ("repository", &["repository", "findbyid", "save("]),
            ("object pool", &["pool", "acquire", "release"]),
            ("middleware", &["middleware", "next(", ".use("]),
            ("memoization", &["memo", "cache"]),
        ];
        Self::with_labels(
            table
                .iter()
                .map(|(label, keywords)| {
                    (label.to_string(), keywords.iter().map(|k| k.to_string()).collect())
                })
                .collect(),
        )
    }
}

#[async_trait]
impl PatternPredictor for LexicalPatternPredictor {
    async fn predict(&self, code: &str) -> Result<PatternPrediction, CollaboratorError> {
        let lowered = code.to_lowercase();
        let mut best: Option<(&str, usize, usize)> = None;
        for (label, keywords) in &self.labels {
            let hits = keywords.iter().filter(|k| lowered.contains(k.as_str())).count();
            if hits > 0 && best.map_or(true, |(_, b, _)| hits > b) {
                best = Some((label, hits, keywords.len()));
            }
        }

        Ok(match best {
            Some((label, hits, total)) => PatternPrediction {
                prediction: label.to_string(),
                confidence: (hits as f64 / total as f64).min(0.9),
            },
            None => PatternPrediction {
                prediction: UNKNOWN.to_string(),
                confidence: UNKNOWN_CONFIDENCE,
            },
        })
    }
}
