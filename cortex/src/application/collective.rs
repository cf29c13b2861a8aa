// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Knowledge Collective
//!
//! Bounded history of analysed fragments and their outcomes. Each committed
//! analysis appends one [`AnalysisRecord`]; once the history exceeds the
//! retention window the oldest records and fragments are dropped.
//!
//! All statistics are computed on demand from the retained history:
//!
//! - `pattern_confidence(name)`: share of records mentioning `name`
//! - `emerging_patterns()`: candidate names seen in at least
//!   [`EMERGING_THRESHOLD`] records, confidence `min(0.8, n × 0.2)`
//! - `insights()`: a [`CollectiveSnapshot`] with averages and reliability

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Fragment, FragmentId};

/// Default number of records retained.
pub const DEFAULT_RETENTION_WINDOW: usize = 1000;

/// Minimum number of records a candidate must appear in to be emerging.
pub const EMERGING_THRESHOLD: usize = 2;

const EMERGING_CONFIDENCE_STEP: f64 = 0.2;
const EMERGING_CONFIDENCE_CAP: f64 = 0.8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub timestamp: DateTime<Utc>,
    pub fragment_id: FragmentId,
    /// Names of matched known patterns.
    pub matches: Vec<String>,
    /// Names of novel candidates, one entry per name.
    pub novel_patterns: Vec<String>,
    pub confidence: f64,
}

impl AnalysisRecord {
    pub fn new(
        fragment_id: FragmentId,
        matches: Vec<String>,
        novel_patterns: Vec<String>,
        confidence: f64,
    ) -> Self {
        let mut seen = BTreeSet::new();
        let novel_patterns = novel_patterns
            .into_iter()
            .filter(|name| seen.insert(name.clone()))
            .collect();

        Self {
            timestamp: Utc::now(),
            fragment_id,
            matches,
            novel_patterns,
            confidence,
        }
    }

    fn mentions(&self, name: &str) -> bool {
        self.matches.iter().any(|m| m == name) || self.novel_patterns.iter().any(|n| n == name)
    }

    fn is_productive(&self) -> bool {
        !self.matches.is_empty() || !self.novel_patterns.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergingPattern {
    pub pattern: String,
    pub occurrences: usize,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectiveSnapshot {
    /// Fragments currently retained.
    pub total_fragments: usize,
    /// Analyses committed over the collective's lifetime.
    pub total_analyses: u64,
    pub retained_records: usize,
    pub emerging_patterns: Vec<EmergingPattern>,
    pub average_confidence: f64,
    /// Share of retained analyses with at least one match or candidate.
    pub reliability: f64,
}

#[derive(Debug, Clone)]
pub struct KnowledgeCollective {
    fragments: VecDeque<Fragment>,
    history: VecDeque<AnalysisRecord>,
    retention_window: usize,
    total_analyses: u64,
}

impl KnowledgeCollective {
    /// A zero window is treated as one.
    pub fn new(retention_window: usize) -> Self {
        Self {
            fragments: VecDeque::new(),
            history: VecDeque::new(),
            retention_window: retention_window.max(1),
            total_analyses: 0,
        }
    }

    pub fn retention_window(&self) -> usize {
        self.retention_window
    }

    /// Takes ownership of `fragment`, appends `record` and trims the history.
    /// Returns how many records were evicted.
    pub fn add_fragment(&mut self, fragment: Fragment, record: AnalysisRecord) -> usize {
        self.fragments.push_back(fragment);
        self.history.push_back(record);
        self.total_analyses += 1;

        let mut removed = 0;
        while self.history.len() > self.retention_window {
            self.history.pop_front();
            removed += 1;
        }
        while self.fragments.len() > self.retention_window {
            self.fragments.pop_front();
        }

        if removed > 0 {
            debug!(removed, retained = self.history.len(), "Trimmed collective history");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &AnalysisRecord> {
        self.history.iter()
    }

    pub fn fragment(&self, id: FragmentId) -> Option<&Fragment> {
        self.fragments.iter().find(|f| f.id() == id)
    }

    pub fn pattern_confidence(&self, name: &str) -> f64 {
        if self.history.is_empty() {
            return 0.0;
        }
        let hits = self.history.iter().filter(|r| r.mentions(name)).count();
        hits as f64 / self.history.len() as f64
    }

    /// Sorted by occurrences (descending) then name.
    pub fn emerging_patterns(&self) -> Vec<EmergingPattern> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for record in &self.history {
            for name in &record.novel_patterns {
                *counts.entry(name.as_str()).or_default() += 1;
            }
        }

        let mut emerging: Vec<_> = counts
            .into_iter()
            .filter(|(_, occurrences)| *occurrences >= EMERGING_THRESHOLD)
            .map(|(pattern, occurrences)| EmergingPattern {
                pattern: pattern.to_string(),
                occurrences,
                confidence: (occurrences as f64 * EMERGING_CONFIDENCE_STEP).min(EMERGING_CONFIDENCE_CAP),
            })
            .collect();
        emerging.sort_by(|a, b| b.occurrences.cmp(&a.occurrences).then_with(|| a.pattern.cmp(&b.pattern)));
        emerging
    }

    pub fn insights(&self) -> CollectiveSnapshot {
        let retained = self.history.len();
        let (average_confidence, reliability) = if retained == 0 {
            (0.0, 0.0)
        } else {
            let total: f64 = self.history.iter().map(|r| r.confidence).sum();
            let productive = self.history.iter().filter(|r| r.is_productive()).count();
            (total / retained as f64, productive as f64 / retained as f64)
        };

        CollectiveSnapshot {
            total_fragments: self.fragments.len(),
            total_analyses: self.total_analyses,
            retained_records: retained,
            emerging_patterns: self.emerging_patterns(),
            average_confidence,
            reliability,
        }
    }
}

impl Default for KnowledgeCollective {
    fn default() -> Self {
        Self::new(DEFAULT_RETENTION_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FragmentContext, DEFAULT_MIN_FRAGMENT_LENGTH};

    fn fragment() -> Fragment {
        Fragment::new("function acquire() { return pool.pop(); }", FragmentContext::new(), DEFAULT_MIN_FRAGMENT_LENGTH)
            .unwrap()
    }

    fn commit(collective: &mut KnowledgeCollective, matches: &[&str], novel: &[&str], confidence: f64) -> usize {
        let fragment = fragment();
        let record = AnalysisRecord::new(
            fragment.id(),
            matches.iter().map(|s| s.to_string()).collect(),
            novel.iter().map(|s| s.to_string()).collect(),
            confidence,
        );
        collective.add_fragment(fragment, record)
    }

    #[test]
    fn test_default_window_exported_at_crate_root() {
        let collective = KnowledgeCollective::new(crate::DEFAULT_RETENTION_WINDOW);
        assert_eq!(crate::DEFAULT_RETENTION_WINDOW, 1000);
        assert_eq!(crate::EMERGING_THRESHOLD, 2);
        assert_eq!(collective.insights().retained_records, 0);
    }

    #[test]
    fn test_empty_collective() {
        let collective = KnowledgeCollective::default();
        let snapshot = collective.insights();
        assert_eq!(snapshot.total_analyses, 0);
        assert_eq!(snapshot.average_confidence, 0.0);
        assert_eq!(snapshot.reliability, 0.0);
        assert_eq!(collective.pattern_confidence("Builder Pattern"), 0.0);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut collective = KnowledgeCollective::new(5);
        let mut removed = 0;
        for _ in 0..12 {
            removed += commit(&mut collective, &[], &[], 0.1);
            assert!(collective.len() <= 5);
        }
        assert_eq!(removed, 7);
        assert_eq!(collective.insights().total_analyses, 12);
        assert_eq!(collective.insights().total_fragments, 5);
    }

    #[test]
    fn test_emerging_requires_two_occurrences() {
        let mut collective = KnowledgeCollective::default();
        commit(&mut collective, &[], &["Object Pool"], 0.4);
        assert!(collective.emerging_patterns().is_empty());

        commit(&mut collective, &[], &["Object Pool"], 0.4);
        let emerging = collective.emerging_patterns();
        assert_eq!(emerging.len(), 1);
        assert_eq!(emerging[0].pattern, "Object Pool");
        assert_eq!(emerging[0].occurrences, 2);
        assert!((emerging[0].confidence - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_duplicate_names_in_one_record_count_once() {
        let mut collective = KnowledgeCollective::default();
        commit(&mut collective, &[], &["Object Pool", "Object Pool"], 0.6);
        assert!(collective.emerging_patterns().is_empty());
    }

    #[test]
    fn test_emerging_confidence_capped() {
        let mut collective = KnowledgeCollective::default();
        for _ in 0..6 {
            commit(&mut collective, &[], &["Memoization"], 0.4);
        }
        assert_eq!(collective.emerging_patterns()[0].confidence, 0.8);
    }

    #[test]
    fn test_pattern_confidence_and_reliability() {
        let mut collective = KnowledgeCollective::default();
        commit(&mut collective, &["Builder Pattern"], &[], 0.8);
        commit(&mut collective, &[], &["Object Pool"], 0.4);
        commit(&mut collective, &[], &[], 0.1);
        commit(&mut collective, &["Builder Pattern"], &[], 0.7);

        assert!((collective.pattern_confidence("Builder Pattern") - 0.5).abs() < 1e-9);
        assert!((collective.pattern_confidence("Object Pool") - 0.25).abs() < 1e-9);

        let snapshot = collective.insights();
        assert!((snapshot.reliability - 0.75).abs() < 1e-9);
        assert!((snapshot.average_confidence - 0.5).abs() < 1e-9);
    }
}
