// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Code Fragments
//!
//! A [`Fragment`] is one submitted code sample: the text, the
//! [`StructuralSummary`] derived from it by [`FeatureExtractor`], caller
//! supplied [`FragmentContext`] and a reinforcement confidence. Everything but
//! the confidence is fixed at construction.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::pattern::clamp_unit;

/// Shortest trimmed fragment accepted for analysis.
pub const DEFAULT_MIN_FRAGMENT_LENGTH: usize = 10;

/// Confidence a fragment starts with before any reinforcement.
pub const FRAGMENT_INITIAL_CONFIDENCE: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FragmentId(pub Uuid);

impl FragmentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FragmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for FragmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FragmentError {
    #[error("fragment is empty")]
    Empty,
    #[error("fragment has {length} characters, minimum is {minimum}")]
    TooShort { length: usize, minimum: usize },
}

/// Free-form metadata about where a fragment came from (file, language, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FragmentContext(pub BTreeMap<String, String>);

impl FragmentContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FragmentContext {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralSummary {
    pub has_declarations: bool,
    pub has_async: bool,
    pub has_chaining: bool,
    pub has_conditionals: bool,
    pub has_loops: bool,
    pub line_count: usize,
    pub non_blank_lines: usize,
    /// Coarse key such as `declaration|asynchronous|chained`, or `plain`.
    pub category: String,
}

static DECLARATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(class|struct|interface|trait|enum|impl|function|fn|def|type)\b")
        .expect("declaration regex")
});
static ASYNC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(async|await|Promise|Future)\b|\.then\s*\(").expect("async regex")
});
static CHAIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)\)\s*\.\s*[A-Za-z_]\w*\s*\(|^\s*\.[A-Za-z_]\w*\s*\(").expect("chain regex")
});
static CONDITIONAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(if|else|switch|match|case)\b").expect("conditional regex")
});
static LOOP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(for|while|loop)\b|\.forEach\s*\(").expect("loop regex")
});

/// Derives a [`StructuralSummary`] from raw text. Pure and deterministic.
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn extract(code: &str) -> StructuralSummary {
        let has_declarations = DECLARATION_RE.is_match(code);
        let has_async = ASYNC_RE.is_match(code);
        let has_chaining = CHAIN_RE.is_match(code);
        let has_conditionals = CONDITIONAL_RE.is_match(code);
        let has_loops = LOOP_RE.is_match(code);

        let tags: Vec<&str> = [
            (has_declarations, "declaration"),
            (has_async, "asynchronous"),
            (has_chaining, "chained"),
            (has_conditionals, "conditional"),
            (has_loops, "iterative"),
        ]
        .iter()
        .filter(|(present, _)| *present)
        .map(|(_, tag)| *tag)
        .collect();

        let category = if tags.is_empty() {
            "plain".to_string()
        } else {
            tags.join("|")
        };

        StructuralSummary {
            has_declarations,
            has_async,
            has_chaining,
            has_conditionals,
            has_loops,
            line_count: code.lines().count(),
            non_blank_lines: code.lines().filter(|l| !l.trim().is_empty()).count(),
            category,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    id: FragmentId,
    code: String,
    structural_summary: StructuralSummary,
    context: FragmentContext,
    confidence: f64,
    timestamp: DateTime<Utc>,
}

impl Fragment {
    pub fn new(
        code: impl Into<String>,
        context: FragmentContext,
        min_length: usize,
    ) -> Result<Self, FragmentError> {
        let code = code.into();
        let length = code.trim().chars().count();
        if length == 0 {
            return Err(FragmentError::Empty);
        }
        if length < min_length {
            return Err(FragmentError::TooShort { length, minimum: min_length });
        }

        let structural_summary = FeatureExtractor::extract(&code);
        Ok(Self {
            id: FragmentId::new(),
            code,
            structural_summary,
            context,
            confidence: FRAGMENT_INITIAL_CONFIDENCE,
            timestamp: Utc::now(),
        })
    }

    pub fn id(&self) -> FragmentId {
        self.id
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn structural_summary(&self) -> &StructuralSummary {
        &self.structural_summary
    }

    pub fn context(&self) -> &FragmentContext {
        &self.context
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Add `delta` to the confidence, capped at 1.0.
    pub fn reinforce(&mut self, delta: f64) -> f64 {
        self.confidence = clamp_unit(self.confidence + delta.max(0.0));
        self.confidence
    }
}
