// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # `archetype-cortex` — Archetype Memory Crate
//!
//! Holds everything the discovery engine remembers between calls: the catalog
//! of known archetypes, provisional candidate archetypes, the fragment model
//! and the bounded collective history with its derived statistics.
//!
//! ## Crate Layout
//!
//! | Module | Layer | Contents |
//! |--------|-------|----------|
//! | [`domain`] | Domain | `KnownPattern`, `CandidateArchetype`, `Fragment`, `FeatureExtractor`, `CortexEvent` |
//! | [`application`] | Application | `PatternCatalog`, `CandidateRegistry`, `KnowledgeCollective` |
//!
//! Nothing in this crate is asynchronous or shared. The orchestrator owns one
//! instance of each store inside a single writer task.

pub mod domain;
pub mod application;

pub use domain::*;
pub use application::*;
