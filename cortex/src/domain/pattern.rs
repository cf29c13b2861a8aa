// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Archetype Patterns
//!
//! A [`KnownPattern`] is a cataloged archetype: a set of lowercase lexical
//! indicators plus a running base confidence that only ever climbs, in small
//! capped steps, each time the pattern is matched.
//!
//! A [`CandidateArchetype`] is something the novelty heuristics proposed that
//! the catalog does not know. Candidates are tracked by name and are never as
//! trusted as cataloged patterns: their confidence is capped at
//! [`CANDIDATE_CONFIDENCE_CAP`], strictly below [`KNOWN_PATTERN_CONFIDENCE_CAP`].
//!
//! Catalog contents are data. Anything implementing [`PatternProvider`] can
//! seed or extend a catalog; [`seed_patterns`] is the built-in set.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::fragment::FragmentId;

/// Upper bound for any known pattern's base confidence and any match confidence.
pub const KNOWN_PATTERN_CONFIDENCE_CAP: f64 = 0.95;

/// Upper bound for candidate archetype confidence.
pub const CANDIDATE_CONFIDENCE_CAP: f64 = 0.7;

/// Most recent fragment ids remembered per candidate.
pub const MAX_TRACKED_FRAGMENTS: usize = 64;

/// Source of catalog entries.
pub trait PatternProvider: Send + Sync {
    fn name(&self) -> &str;
    fn indicators(&self) -> Vec<String>;
    /// Initial base confidence in `[0, 1]`.
    fn weight(&self) -> f64;
    fn description(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnownPattern {
    name: String,
    indicators: BTreeSet<String>,
    base_confidence: f64,
    description: String,
}

impl KnownPattern {
    /// Indicators are lowercased and trimmed; blanks are dropped.
    pub fn new(
        name: impl Into<String>,
        indicators: impl IntoIterator<Item = impl AsRef<str>>,
        base_confidence: f64,
        description: impl Into<String>,
    ) -> Self {
        let indicators = indicators
            .into_iter()
            .map(|i| i.as_ref().trim().to_lowercase())
            .filter(|i| !i.is_empty())
            .collect();

        Self {
            name: name.into(),
            indicators,
            base_confidence: clamp_unit(base_confidence),
            description: description.into(),
        }
    }

    pub fn from_provider(provider: &dyn PatternProvider) -> Self {
        Self::new(
            provider.name(),
            provider.indicators(),
            provider.weight(),
            provider.description(),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn indicator_set(&self) -> &BTreeSet<String> {
        &self.indicators
    }

    pub fn base_confidence(&self) -> f64 {
        self.base_confidence
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Raise the base confidence by `delta`, never past `cap` and never down.
    /// Returns the confidence after the update.
    pub fn reinforce(&mut self, delta: f64, cap: f64) -> f64 {
        let raised = (self.base_confidence + delta.max(0.0)).min(cap);
        self.base_confidence = self.base_confidence.max(raised);
        self.base_confidence
    }

    /// Lower the base confidence to `cap` if it sits above it.
    pub fn limit_to(&mut self, cap: f64) {
        self.base_confidence = self.base_confidence.min(cap);
    }
}

impl PatternProvider for KnownPattern {
    fn name(&self) -> &str {
        &self.name
    }

    fn indicators(&self) -> Vec<String> {
        self.indicators.iter().cloned().collect()
    }

    fn weight(&self) -> f64 {
        self.base_confidence
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Compile-time catalog entry.
#[derive(Debug, Clone, Copy)]
pub struct SeedPattern {
    pub name: &'static str,
    pub indicators: &'static [&'static str],
    pub weight: f64,
    pub description: &'static str,
}

impl PatternProvider for SeedPattern {
    fn name(&self) -> &str {
        self.name
    }

    fn indicators(&self) -> Vec<String> {
        self.indicators.iter().map(|i| i.to_string()).collect()
    }

    fn weight(&self) -> f64 {
        self.weight
    }

    fn description(&self) -> &str {
        self.description
    }
}

const SEED_PATTERNS: &[SeedPattern] = &[
    SeedPattern {
        name: "Builder Pattern",
        indicators: &["builder", "build(", "return this", "return self", ".build()"],
        weight: 0.85,
        description: "Step-by-step construction through chained setters ending in a build call",
    },
    SeedPattern {
        name: "Factory Pattern",
        indicators: &["factory", "create", "switch", "case ", "return new"],
        weight: 0.8,
        description: "Centralised object creation selected by a type or kind argument",
    },
    SeedPattern {
        name: "Observer Pattern",
        indicators: &["observer", "subscribe", "unsubscribe", "notify", "listener", "emit("],
        weight: 0.8,
        description: "Subscribers register interest and are notified of state changes",
    },
    SeedPattern {
        name: "Singleton Pattern",
        indicators: &["singleton", "getinstance", "instance", "static "],
        weight: 0.75,
        description: "A single shared instance exposed through a static accessor",
    },
    SeedPattern {
        name: "Strategy Pattern",
        indicators: &["strategy", "algorithm", "setstrategy", "execute("],
        weight: 0.75,
        description: "Interchangeable algorithms selected behind a common interface",
    },
    SeedPattern {
        name: "Decorator Pattern",
        indicators: &["decorator", "wrap", "wrapped", "@"],
        weight: 0.7,
        description: "Behaviour layered onto an object by wrapping it",
    },
    SeedPattern {
        name: "Repository Pattern",
        indicators: &["repository", "findbyid", "findall", "save(", "delete("],
        weight: 0.75,
        description: "Collection-like access to persisted aggregates",
    },
];

/// Built-in catalog.
pub fn seed_patterns() -> &'static [SeedPattern] {
    SEED_PATTERNS
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateArchetype {
    pub name: String,
    pub description: String,
    pub confidence: f64,
    pub occurrences: u64,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub fragment_ids: Vec<FragmentId>,
}

impl CandidateArchetype {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        confidence: f64,
        fragment_id: FragmentId,
        cap: f64,
    ) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            description: description.into(),
            confidence: clamp_unit(confidence).min(cap),
            occurrences: 1,
            first_seen: now,
            last_seen: now,
            fragment_ids: vec![fragment_id],
        }
    }

    /// Record another sighting and nudge confidence toward `cap`.
    pub fn observe(&mut self, fragment_id: FragmentId, nudge: f64, cap: f64) {
        self.occurrences += 1;
        self.confidence = (self.confidence + nudge.max(0.0)).min(cap);
        self.last_seen = Utc::now();
        self.fragment_ids.push(fragment_id);
        if self.fragment_ids.len() > MAX_TRACKED_FRAGMENTS {
            let excess = self.fragment_ids.len() - MAX_TRACKED_FRAGMENTS;
            self.fragment_ids.drain(..excess);
        }
    }
}

pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
