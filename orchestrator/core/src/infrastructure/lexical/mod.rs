// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Built-in sibling analyzers.
//!
//! Single-pass keyword and line scanners that let the bridge run without any
//! external analyzer. Each keeps its word lists in data so they can be swapped.

pub mod anomaly;
pub mod holistic;
pub mod prediction;
pub mod purpose;

use std::sync::Arc;

pub use anomaly::{AnomalyLimits, LexicalAnomalyAnalyzer};
pub use holistic::LexicalHolisticAnalyzer;
pub use prediction::LexicalPatternPredictor;
pub use purpose::{LexicalPurposeAnalyzer, PurposeProfile};

use crate::domain::collaborators::Collaborators;

impl Collaborators {
    /// The built-in lexical analyzers
    pub fn lexical() -> Self {
        Self {
            purpose: Arc::new(LexicalPurposeAnalyzer::default()),
            anomaly: Arc::new(LexicalAnomalyAnalyzer::default()),
            predictor: Arc::new(LexicalPatternPredictor::default()),
            holistic: Arc::new(LexicalHolisticAnalyzer),
        }
    }
}
