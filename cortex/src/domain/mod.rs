// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain layer: archetypes, fragments and the events emitted when they change.

pub mod pattern;
pub mod fragment;
pub mod events;

pub use pattern::*;
pub use fragment::*;
pub use events::*;
