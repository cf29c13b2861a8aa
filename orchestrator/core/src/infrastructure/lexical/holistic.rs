// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use archetype_cortex::FeatureExtractor;

use crate::domain::collaborators::{CollaboratorError, HolisticAnalyzer, HolisticReport};

static BRANCH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(if|case|elif)\b").expect("branch regex"));
static ERROR_HANDLING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(try|catch|except|Result|Err)\b|\.catch\s*\(|\?;").expect("error handling regex")
});

const LONG_FRAGMENT_LINES: usize = 50;
const BRANCH_LIMIT: usize = 5;

/// Whole-fragment review built on the structural summary
#[derive(Default)]
pub struct LexicalHolisticAnalyzer;

#[async_trait]
impl HolisticAnalyzer for LexicalHolisticAnalyzer {
    async fn analyze(&self, code: &str) -> Result<HolisticReport, CollaboratorError> {
        let summary = FeatureExtractor::extract(code);
        let mut recommendations = Vec::new();

        if summary.non_blank_lines > LONG_FRAGMENT_LINES {
            recommendations.push("Split this unit into smaller functions with a single responsibility".to_string());
        }
        if summary.has_async && !ERROR_HANDLING_RE.is_match(code) {
            recommendations.push("Handle failures on asynchronous paths explicitly".to_string());
        }
        let branches = BRANCH_RE.find_iter(code).count();
        if branches > BRANCH_LIMIT {
            recommendations.push(format!(
                "{} branches in one unit; consider a lookup table or polymorphic dispatch",
                branches
            ));
        }

        Ok(HolisticReport {
            summary: Some(format!(
                "{} non-blank lines, {} structure",
                summary.non_blank_lines, summary.category
            )),
            confidence: (0.5 + 0.1 * recommendations.len() as f64).min(0.8),
            recommendations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simple_code_has_no_recommendations() {
        let report = LexicalHolisticAnalyzer.analyze("function add(a, b) { return a + b; }").await.unwrap();
        assert!(report.recommendations.is_empty());
        assert_eq!(report.confidence, 0.5);
        assert!(report.summary.unwrap().starts_with("1 non-blank lines"));
    }

    #[tokio::test]
    async fn test_unguarded_async() {
        let report = LexicalHolisticAnalyzer
            .analyze("async function load() {\n  const r = await fetch(url);\n  return r.json();\n}")
            .await
            .unwrap();
        assert_eq!(report.recommendations, vec!["Handle failures on asynchronous paths explicitly".to_string()]);
    }
}
