// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain layer: pure types and scoring rules shared by the discoverer and the bridge.

pub mod analysis;
pub mod collaborators;
pub mod config;
pub mod correlation;
pub mod events;
pub mod matching;
pub mod novelty;
