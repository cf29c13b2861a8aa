// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Pattern Catalog & Candidate Registry
//!
//! [`PatternCatalog`] is the registry of known archetypes. Entries are added
//! at construction or through [`PatternCatalog::register`] and are never
//! removed; the only runtime mutation is [`PatternCatalog::reinforce`].
//!
//! [`CandidateRegistry`] tracks archetypes proposed by novelty detection.
//! Candidates are keyed by name and are not promoted into the catalog.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::domain::{
    seed_patterns, CandidateArchetype, FragmentId, KnownPattern, PatternProvider,
    CANDIDATE_CONFIDENCE_CAP, KNOWN_PATTERN_CONFIDENCE_CAP,
};

/// Before/after of one reinforcement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternReinforcement {
    pub pattern: String,
    pub old_confidence: f64,
    pub new_confidence: f64,
}

#[derive(Debug, Clone)]
pub struct PatternCatalog {
    patterns: Vec<KnownPattern>,
    confidence_cap: f64,
}

impl PatternCatalog {
    pub fn new() -> Self {
        Self {
            patterns: Vec::new(),
            confidence_cap: KNOWN_PATTERN_CONFIDENCE_CAP,
        }
    }

    /// Catalog holding the built-in archetypes.
    pub fn seeded() -> Self {
        Self::from_providers(seed_patterns().iter().map(|p| p as &dyn PatternProvider))
    }

    pub fn from_providers<'a>(providers: impl IntoIterator<Item = &'a dyn PatternProvider>) -> Self {
        let mut catalog = Self::new();
        for provider in providers {
            catalog.register(provider);
        }
        catalog
    }

    /// Sets the cap and lowers any registered pattern already above it.
    pub fn with_confidence_cap(mut self, cap: f64) -> Self {
        self.confidence_cap = cap.clamp(0.0, 1.0);
        for pattern in &mut self.patterns {
            pattern.limit_to(self.confidence_cap);
        }
        self
    }

    pub fn confidence_cap(&self) -> f64 {
        self.confidence_cap
    }

    /// Adds a pattern unless one with the same name exists. Returns whether it was added.
    pub fn register(&mut self, provider: &dyn PatternProvider) -> bool {
        if self.get(provider.name()).is_some() {
            debug!(pattern = provider.name(), "Pattern already cataloged, skipping");
            return false;
        }
        let mut pattern = KnownPattern::from_provider(provider);
        if pattern.base_confidence() > self.confidence_cap {
            pattern = KnownPattern::new(
                pattern.name(),
                pattern.indicator_set(),
                self.confidence_cap,
                pattern.description(),
            );
        }
        self.patterns.push(pattern);
        true
    }

    pub fn get(&self, name: &str) -> Option<&KnownPattern> {
        self.patterns.iter().find(|p| p.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &KnownPattern> {
        self.patterns.iter()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn reinforce(&mut self, name: &str, delta: f64) -> Option<PatternReinforcement> {
        let cap = self.confidence_cap;
        let pattern = self.patterns.iter_mut().find(|p| p.name() == name)?;
        let old_confidence = pattern.base_confidence();
        let new_confidence = pattern.reinforce(delta, cap);
        Some(PatternReinforcement {
            pattern: name.to_string(),
            old_confidence,
            new_confidence,
        })
    }
}

impl Default for PatternCatalog {
    fn default() -> Self {
        Self::seeded()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CandidateObservation {
    /// First sighting of this name.
    Discovered(CandidateArchetype),
    /// Name was already tracked; holds the updated record.
    Repeated(CandidateArchetype),
}

impl CandidateObservation {
    pub fn candidate(&self) -> &CandidateArchetype {
        match self {
            CandidateObservation::Discovered(c) | CandidateObservation::Repeated(c) => c,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CandidateRegistry {
    candidates: HashMap<String, CandidateArchetype>,
    confidence_cap: f64,
    nudge: f64,
}

impl CandidateRegistry {
    pub fn new(nudge: f64) -> Self {
        Self {
            candidates: HashMap::new(),
            confidence_cap: CANDIDATE_CONFIDENCE_CAP,
            nudge,
        }
    }

    pub fn with_confidence_cap(mut self, cap: f64) -> Self {
        self.confidence_cap = cap.clamp(0.0, 1.0);
        self
    }

    pub fn observe(
        &mut self,
        name: &str,
        description: &str,
        confidence: f64,
        fragment_id: FragmentId,
    ) -> CandidateObservation {
        match self.candidates.get_mut(name) {
            Some(existing) => {
                existing.observe(fragment_id, self.nudge, self.confidence_cap);
                CandidateObservation::Repeated(existing.clone())
            }
            None => {
                let candidate = CandidateArchetype::new(
                    name,
                    description,
                    confidence,
                    fragment_id,
                    self.confidence_cap,
                );
                self.candidates.insert(name.to_string(), candidate.clone());
                CandidateObservation::Discovered(candidate)
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&CandidateArchetype> {
        self.candidates.get(name)
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// All candidates ranked by occurrences, then confidence, then name.
    pub fn ranked(&self) -> Vec<CandidateArchetype> {
        let mut ranked: Vec<_> = self.candidates.values().cloned().collect();
        ranked.sort_by(|a, b| {
            b.occurrences
                .cmp(&a.occurrences)
                .then_with(|| b.confidence.partial_cmp(&a.confidence).unwrap_or(std::cmp::Ordering::Equal))
                .then_with(|| a.name.cmp(&b.name))
        });
        ranked
    }

    pub fn top(&self, limit: usize) -> Vec<CandidateArchetype> {
        self.ranked().into_iter().take(limit).collect()
    }
}
