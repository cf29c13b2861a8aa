// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # `archetype-orchestrator-core`
//!
//! Archetype discovery and cross-layer correlation.
//!
//! | Module | Layer | Contents |
//! |--------|-------|----------|
//! | [`domain`] | Domain | matching, novelty heuristics, result types, collaborator contracts, correlation rules, configuration manifest |
//! | [`application`] | Application | `ArchetypeDiscoverer`, the single-writer discovery actor, `ArchetypeBridge` |
//! | [`infrastructure`] | Infrastructure | event bus, built-in lexical analyzers |
//!
//! ```no_run
//! use std::sync::Arc;
//! use archetype_core::application::{ArchetypeBridge, ArchetypeDiscoverer, DiscoveryHandle};
//! use archetype_core::domain::collaborators::Collaborators;
//! use archetype_core::domain::config::BridgeSettings;
//! use archetype_cortex::FragmentContext;
//!
//! # async fn run() {
//! let (handle, _task) = DiscoveryHandle::spawn(ArchetypeDiscoverer::default());
//! let bridge = ArchetypeBridge::new(Arc::new(handle), Collaborators::lexical(), BridgeSettings::default());
//! let result = bridge
//!     .comprehensive_analysis_with_discovery("class UserBuilder { build() { return this; } }", FragmentContext::new())
//!     .await;
//! println!("{}", result.confidence);
//! # }
//! ```

pub mod application;
pub mod domain;
pub mod infrastructure;
