// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod catalog;
pub mod collective;

pub use catalog::{CandidateObservation, CandidateRegistry, PatternCatalog, PatternReinforcement};
pub use collective::{
    AnalysisRecord, CollectiveSnapshot, EmergingPattern, KnowledgeCollective, DEFAULT_RETENTION_WINDOW,
    EMERGING_THRESHOLD,
};
