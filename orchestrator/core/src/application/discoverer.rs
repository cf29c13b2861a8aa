// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Archetype Discoverer
//!
//! The stateful engine behind discovery. One call to [`ArchetypeDiscoverer::analyze`]:
//!
//! 1. builds a [`Fragment`] (rejecting empty or too-short input untouched),
//! 2. scores it against the catalog and runs novelty detection when nothing matched,
//! 3. reinforces every matched pattern and records every novel candidate,
//! 4. bumps the observation count and appends an [`AnalysisRecord`] to the collective.
//!
//! Steps 1–2 are [`evaluate`](ArchetypeDiscoverer::evaluate) and take `&self`;
//! steps 3–4 are [`commit`](ArchetypeDiscoverer::commit). The split lets the
//! bridge evaluate concurrently with its collaborators and still mutate state
//! at a single point.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use archetype_cortex::{
    AnalysisRecord, CandidateArchetype, CandidateObservation, CandidateRegistry, CollectiveSnapshot,
    CortexEvent, EmergingPattern, Fragment, FragmentContext, KnownPattern, KnowledgeCollective,
    PatternCatalog,
};

use crate::domain::analysis::{AnalysisOutcome, AnalysisResult, DiscoveryError, DiscoverySummary, Evaluation};
use crate::domain::config::DiscoverySettings;
use crate::domain::matching::Matcher;
use crate::domain::novelty::{CandidateResult, NoveltyDetector};
use crate::infrastructure::event_bus::EventBus;

/// Number of candidates reported by [`ArchetypeDiscoverer::discovery_summary`].
pub const TOP_CANDIDATES: usize = 5;

pub struct ArchetypeDiscoverer {
    settings: DiscoverySettings,
    catalog: PatternCatalog,
    candidates: CandidateRegistry,
    collective: KnowledgeCollective,
    matcher: Matcher,
    novelty: NoveltyDetector,
    observation_count: u64,
    event_bus: Option<Arc<EventBus>>,
}

impl ArchetypeDiscoverer {
    pub fn new(settings: DiscoverySettings) -> Self {
        let catalog = PatternCatalog::seeded().with_confidence_cap(settings.pattern_confidence_cap);
        let candidates =
            CandidateRegistry::new(settings.candidate_nudge).with_confidence_cap(settings.candidate_confidence_cap);
        let collective = KnowledgeCollective::new(settings.retention_window);
        let matcher =
            Matcher::new(settings.fragment_reinforcement).with_confidence_cap(settings.pattern_confidence_cap);
        let novelty = NoveltyDetector::default().with_trigger_confidence(settings.trigger_confidence);

        Self {
            settings,
            catalog,
            candidates,
            collective,
            matcher,
            novelty,
            observation_count: 0,
            event_bus: None,
        }
    }

    /// Replace the seeded catalog. The configured confidence cap still applies.
    pub fn with_catalog(mut self, catalog: PatternCatalog) -> Self {
        self.catalog = catalog.with_confidence_cap(self.settings.pattern_confidence_cap);
        self
    }

    pub fn with_novelty_detector(mut self, detector: NoveltyDetector) -> Self {
        self.novelty = detector.with_trigger_confidence(self.settings.trigger_confidence);
        self
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn settings(&self) -> &DiscoverySettings {
        &self.settings
    }

    /// Read-only half of an analysis: fragment construction, matching and novelty.
    pub fn evaluate(&self, code: &str, context: FragmentContext) -> Result<Evaluation, DiscoveryError> {
        let mut fragment = match Fragment::new(code, context, self.settings.min_fragment_length) {
            Ok(fragment) => fragment,
            Err(e) => {
                self.publish(CortexEvent::FragmentRejected {
                    reason: e.to_string(),
                    timestamp: Utc::now(),
                });
                return Err(e.into());
            }
        };

        let matches = self.matcher.match_fragment(&self.catalog, &mut fragment);
        let novel_patterns = self.novelty.detect_novel(&fragment, &matches);

        debug!(
            fragment_id = %fragment.id(),
            category = %fragment.structural_summary().category,
            matches = matches.len(),
            novel = novel_patterns.len(),
            "Evaluated fragment"
        );

        Ok(Evaluation {
            fragment,
            matches,
            novel_patterns,
        })
    }

    /// Applies an evaluation to the catalog, candidate registry and collective.
    pub fn commit(&mut self, evaluation: Evaluation) -> AnalysisOutcome {
        let Evaluation {
            fragment,
            matches,
            novel_patterns,
        } = evaluation;
        let fragment_id = fragment.id();

        for m in &matches {
            if let Some(reinforcement) = self.catalog.reinforce(&m.pattern, self.settings.pattern_reinforcement) {
                self.publish(CortexEvent::PatternReinforced {
                    pattern: reinforcement.pattern,
                    fragment_id,
                    old_confidence: reinforcement.old_confidence,
                    new_confidence: reinforcement.new_confidence,
                    timestamp: Utc::now(),
                });
            }
        }

        let distinct = distinct_candidates(&novel_patterns);
        for candidate in &distinct {
            let observation =
                self.candidates
                    .observe(&candidate.name, &candidate.description, candidate.confidence, fragment_id);
            let event = match &observation {
                CandidateObservation::Discovered(c) => {
                    info!(candidate = %c.name, confidence = c.confidence, "Discovered candidate archetype");
                    CortexEvent::CandidateDiscovered {
                        candidate: c.name.clone(),
                        fragment_id,
                        confidence: c.confidence,
                        timestamp: Utc::now(),
                    }
                }
                CandidateObservation::Repeated(c) => CortexEvent::CandidateObserved {
                    candidate: c.name.clone(),
                    fragment_id,
                    occurrences: c.occurrences,
                    confidence: c.confidence,
                    timestamp: Utc::now(),
                },
            };
            self.publish(event);
        }

        self.observation_count += 1;

        let confidence = call_confidence(&matches, &novel_patterns, self.settings.confidence_floor);
        let record = AnalysisRecord::new(
            fragment_id,
            matches.iter().map(|m| m.pattern.clone()).collect(),
            distinct.iter().map(|c| c.name.clone()).collect(),
            confidence,
        );
        let removed = self.collective.add_fragment(fragment.clone(), record);

        self.publish(CortexEvent::AnalysisRecorded {
            fragment_id,
            matches: matches.len(),
            novel_patterns: distinct.len(),
            confidence,
            timestamp: Utc::now(),
        });
        if removed > 0 {
            self.publish(CortexEvent::HistoryTrimmed {
                removed,
                retained: self.collective.len(),
                timestamp: Utc::now(),
            });
        }

        debug!(
            fragment_id = %fragment_id,
            observation_count = self.observation_count,
            confidence,
            "Committed analysis"
        );

        AnalysisOutcome {
            fragment,
            matches,
            novel_patterns,
            confidence,
            observation_count: self.observation_count,
            collective_insights: self.collective.insights(),
        }
    }

    /// Evaluate and commit in one step. Never fails; invalid input leaves state untouched.
    pub fn analyze(&mut self, code: &str, context: FragmentContext) -> AnalysisResult {
        match self.evaluate(code, context) {
            Ok(evaluation) => AnalysisResult::Success(Box::new(self.commit(evaluation))),
            Err(e) => {
                warn!(error = %e, "Rejected code fragment");
                AnalysisResult::from_error(e)
            }
        }
    }

    pub fn discovery_summary(&self) -> DiscoverySummary {
        DiscoverySummary {
            total_observations: self.observation_count,
            known_patterns: self.catalog.len(),
            candidate_archetypes: self.candidates.len(),
            top_candidates: self.candidates.top(TOP_CANDIDATES),
        }
    }

    pub fn collective_insights(&self) -> CollectiveSnapshot {
        self.collective.insights()
    }

    pub fn emerging_patterns(&self) -> Vec<EmergingPattern> {
        self.collective.emerging_patterns()
    }

    pub fn pattern_confidence(&self, name: &str) -> f64 {
        self.collective.pattern_confidence(name)
    }

    pub fn observation_count(&self) -> u64 {
        self.observation_count
    }

    pub fn candidate(&self, name: &str) -> Option<&CandidateArchetype> {
        self.candidates.get(name)
    }

    /// Every tracked candidate, most frequently seen first.
    pub fn candidates(&self) -> Vec<CandidateArchetype> {
        self.candidates.ranked()
    }

    pub fn known_pattern(&self, name: &str) -> Option<&KnownPattern> {
        self.catalog.get(name)
    }

    pub fn known_patterns(&self) -> Vec<KnownPattern> {
        self.catalog.iter().cloned().collect()
    }

    fn publish(&self, event: CortexEvent) {
        if let Some(bus) = &self.event_bus {
            bus.publish_cortex_event(event);
        }
    }
}

impl Default for ArchetypeDiscoverer {
    fn default() -> Self {
        Self::new(DiscoverySettings::default())
    }
}

/// One entry per candidate name, keeping the highest confidence, in first-seen order.
fn distinct_candidates(novel_patterns: &[CandidateResult]) -> Vec<CandidateResult> {
    let mut distinct: Vec<CandidateResult> = Vec::new();
    for candidate in novel_patterns {
        match distinct.iter_mut().find(|c| c.name == candidate.name) {
            Some(existing) if candidate.confidence > existing.confidence => *existing = candidate.clone(),
            Some(_) => {}
            None => distinct.push(candidate.clone()),
        }
    }
    distinct
}

/// Top match, else strongest novel candidate, else the floor.
fn call_confidence(
    matches: &[crate::domain::matching::MatchResult],
    novel_patterns: &[CandidateResult],
    floor: f64,
) -> f64 {
    let confidence = match matches.first() {
        Some(top) => top.confidence,
        None => novel_patterns
            .iter()
            .map(|c| c.confidence)
            .fold(None, |best: Option<f64>, c| Some(best.map_or(c, |b| b.max(c))))
            .unwrap_or(floor),
    };
    confidence.clamp(0.0, 1.0)
}
