// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod bridge;
pub mod discoverer;
pub mod discovery_service;

pub use bridge::ArchetypeBridge;
pub use discoverer::ArchetypeDiscoverer;
pub use discovery_service::{DiscoveryHandle, DiscoveryService};
