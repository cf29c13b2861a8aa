// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Catalog Matching
//!
//! Scores a fragment against every [`KnownPattern`] by indicator overlap.
//! An indicator counts when it occurs anywhere in the lowercased text
//! (substring, not whole word). For a pattern with `n` indicators of which
//! `k > 0` occur:
//!
//! ```text
//! confidence = min(cap, base_confidence × k / n)
//! ```
//!
//! Results are ordered by confidence, then indicator count, then name, so
//! identical text and catalog state always give the same list.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use archetype_cortex::{Fragment, KnownPattern, PatternCatalog, KNOWN_PATTERN_CONFIDENCE_CAP};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub pattern: String,
    pub confidence: f64,
    pub indicators_found: usize,
    pub indicators_total: usize,
    pub matched_indicators: Vec<String>,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct Matcher {
    fragment_reinforcement: f64,
    confidence_cap: f64,
}

impl Matcher {
    pub fn new(fragment_reinforcement: f64) -> Self {
        Self {
            fragment_reinforcement,
            confidence_cap: KNOWN_PATTERN_CONFIDENCE_CAP,
        }
    }

    pub fn with_confidence_cap(mut self, cap: f64) -> Self {
        self.confidence_cap = cap;
        self
    }

    /// Pure scoring of `code` against `catalog`.
    pub fn score(&self, catalog: &PatternCatalog, code: &str) -> Vec<MatchResult> {
        let haystack = code.to_lowercase();
        let mut matches: Vec<MatchResult> = catalog
            .iter()
            .filter_map(|pattern| self.score_pattern(pattern, &haystack))
            .collect();

        matches.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.indicators_found.cmp(&a.indicators_found))
                .then_with(|| a.pattern.cmp(&b.pattern))
        });
        matches
    }

    /// Scores the fragment and reinforces it once per match.
    pub fn match_fragment(&self, catalog: &PatternCatalog, fragment: &mut Fragment) -> Vec<MatchResult> {
        let matches = self.score(catalog, fragment.code());
        for _ in &matches {
            fragment.reinforce(self.fragment_reinforcement);
        }
        matches
    }

    fn score_pattern(&self, pattern: &KnownPattern, haystack: &str) -> Option<MatchResult> {
        let total = pattern.indicator_set().len();
        if total == 0 {
            return None;
        }

        let matched: Vec<String> = pattern
            .indicator_set()
            .iter()
            .filter(|indicator| haystack.contains(indicator.as_str()))
            .cloned()
            .collect();
        if matched.is_empty() {
            return None;
        }

        let ratio = matched.len() as f64 / total as f64;
        let confidence = (pattern.base_confidence() * ratio).min(self.confidence_cap);

        Some(MatchResult {
            pattern: pattern.name().to_string(),
            confidence,
            indicators_found: matched.len(),
            indicators_total: total,
            matched_indicators: matched,
            description: pattern.description().to_string(),
        })
    }
}
