// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::collaborators::{Anomaly, AnomalyAnalyzer, AnomalyReport, AnomalySeverity, CollaboratorError};

static EMPTY_CATCH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"catch\s*(\([^)]*\))?\s*\{\s*\}|except[^:\n]*:\s*pass\b").expect("empty catch regex")
});
static DEBUG_OUTPUT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"console\.log\s*\(|\bdbg!\s*\(|\bprintln!\s*\(|\bSystem\.out\.print").expect("debug output regex")
});
static MARKER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(TODO|FIXME|XXX|HACK)\b").expect("marker regex"));

/// Thresholds for the line-based checks
#[derive(Debug, Clone)]
pub struct AnomalyLimits {
    pub max_line_length: usize,
    pub max_nesting_depth: usize,
    pub max_fragment_lines: usize,
}

impl Default for AnomalyLimits {
    fn default() -> Self {
        Self {
            max_line_length: 120,
            max_nesting_depth: 4,
            max_fragment_lines: 80,
        }
    }
}

#[derive(Default)]
pub struct LexicalAnomalyAnalyzer {
    limits: AnomalyLimits,
}

impl LexicalAnomalyAnalyzer {
    pub fn with_limits(limits: AnomalyLimits) -> Self {
        Self { limits }
    }

    fn scan(&self, code: &str) -> Vec<Anomaly> {
        let mut anomalies = Vec::new();
        let mut depth: usize = 0;
        let mut deepest_reported = false;
        let mut non_blank = 0;

        for (index, line) in code.lines().enumerate() {
            let line_no = index + 1;
            if !line.trim().is_empty() {
                non_blank += 1;
            }

            if line.chars().count() > self.limits.max_line_length {
                anomalies.push(Anomaly {
                    kind: "long_line".to_string(),
                    severity: AnomalySeverity::Low,
                    message: format!("Line exceeds {} characters", self.limits.max_line_length),
                    line: Some(line_no),
                });
            }

            for c in line.chars() {
                match c {
                    '{' => depth += 1,
                    '}' => depth = depth.saturating_sub(1),
                    _ => {}
                }
            }
            if depth > self.limits.max_nesting_depth && !deepest_reported {
                deepest_reported = true;
                anomalies.push(Anomaly {
                    kind: "deep_nesting".to_string(),
                    severity: AnomalySeverity::Medium,
                    message: format!("Nesting deeper than {} levels", self.limits.max_nesting_depth),
                    line: Some(line_no),
                });
            }

            if DEBUG_OUTPUT_RE.is_match(line) {
                anomalies.push(Anomaly {
                    kind: "debug_output".to_string(),
                    severity: AnomalySeverity::Low,
                    message: "Debug output left in code".to_string(),
                    line: Some(line_no),
                });
            }

            if MARKER_RE.is_match(line) {
                anomalies.push(Anomaly {
                    kind: "unfinished_work".to_string(),
                    severity: AnomalySeverity::Low,
                    message: "Unresolved work marker".to_string(),
                    line: Some(line_no),
                });
            }
        }

        for m in EMPTY_CATCH_RE.find_iter(code) {
            let line_no = code[..m.start()].lines().count().max(1);
            anomalies.push(Anomaly {
                kind: "swallowed_error".to_string(),
                severity: AnomalySeverity::High,
                message: "Error is caught and silently ignored".to_string(),
                line: Some(line_no),
            });
        }

        if non_blank > self.limits.max_fragment_lines {
            anomalies.push(Anomaly {
                kind: "oversized_fragment".to_string(),
                severity: AnomalySeverity::Medium,
                message: format!("{} non-blank lines in one unit", non_blank),
                line: None,
            });
        }

        anomalies
    }

    fn penalty(anomalies: &[Anomaly]) -> f64 {
        anomalies
            .iter()
            .map(|a| match a.severity {
                AnomalySeverity::Low => 0.05,
                AnomalySeverity::Medium => 0.15,
                AnomalySeverity::High => 0.3,
            })
            .sum()
    }
}

#[async_trait]
impl AnomalyAnalyzer for LexicalAnomalyAnalyzer {
    async fn detect_anomalies(&self, code: &str) -> Result<AnomalyReport, CollaboratorError> {
        let anomalies = self.scan(code);
        let summary = match anomalies.len() {
            0 => "No anomalies found".to_string(),
            1 => "1 anomaly found".to_string(),
            n => format!("{} anomalies found", n),
        };
        let confidence = (0.5 + 0.1 * anomalies.len() as f64).min(0.9);
        Ok(AnomalyReport {
            anomalies,
            summary,
            confidence,
        })
    }

    /// 1.0 for clean code, reduced per anomaly by severity.
    async fn intuition_score(&self, code: &str) -> Result<f64, CollaboratorError> {
        Ok((1.0 - Self::penalty(&self.scan(code))).clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_clean_code() {
        let analyzer = LexicalAnomalyAnalyzer::default();
        let code = "function add(a, b) {\n  return a + b;\n}";
        let report = analyzer.detect_anomalies(code).await.unwrap();
        assert!(report.anomalies.is_empty());
        assert_eq!(report.summary, "No anomalies found");
        assert_eq!(analyzer.intuition_score(code).await.unwrap(), 1.0);
    }

    #[tokio::test]
    async fn test_swallowed_error_and_debug_output() {
        let analyzer = LexicalAnomalyAnalyzer::default();
        let code = "try {\n  run();\n} catch (e) {}\nconsole.log(result);";
        let report = analyzer.detect_anomalies(code).await.unwrap();

        let kinds: Vec<&str> = report.anomalies.iter().map(|a| a.kind.as_str()).collect();
        assert!(kinds.contains(&"swallowed_error"));
        assert!(kinds.contains(&"debug_output"));
        let score = analyzer.intuition_score(code).await.unwrap();
        assert!((score - 0.65).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_deep_nesting_reported_once() {
        let analyzer = LexicalAnomalyAnalyzer::with_limits(AnomalyLimits {
            max_nesting_depth: 2,
            ..AnomalyLimits::default()
        });
        let code = "a {\n b {\n  c {\n   d {\n   }\n  }\n }\n}";
        let report = analyzer.detect_anomalies(code).await.unwrap();
        let nesting = report.anomalies.iter().filter(|a| a.kind == "deep_nesting").count();
        assert_eq!(nesting, 1);
        assert_eq!(report.anomalies[0].line, Some(3));
    }
}
