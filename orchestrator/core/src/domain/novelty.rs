// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Novelty Detection
//!
//! Proposes candidate archetypes for fragments the catalog could not place.
//! Detection only runs when the catalog produced no match; a fragment is
//! never both a confirmed match and a novelty candidate in one analysis.
//!
//! Each [`NoveltyHeuristic`] works in two tiers:
//!
//! | Tier | Fires when | Confidence |
//! |------|------------|------------|
//! | [`DetectionTier::Trigger`] | enough trigger words occur | 0.4 (configurable) |
//! | [`DetectionTier::Structural`] | every structural condition holds | per heuristic, 0.5–0.7 |
//!
//! When both tiers fire for one name both results are returned, each tagged
//! with its tier. Candidate bookkeeping downstream counts the name once.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use archetype_cortex::{Fragment, StructuralSummary};

use super::matching::MatchResult;

/// Confidence of a trigger-tier result unless configured otherwise.
pub const DEFAULT_TRIGGER_CONFIDENCE: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionTier {
    Trigger,
    Structural,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateResult {
    pub name: String,
    pub description: String,
    pub confidence: f64,
    pub tier: DetectionTier,
    pub evidence: Vec<String>,
}

/// Read-only view of a fragment shared by all heuristics.
pub struct FragmentView<'a> {
    pub code: &'a str,
    pub lowered: String,
    pub summary: &'a StructuralSummary,
}

impl<'a> FragmentView<'a> {
    pub fn new(code: &'a str, summary: &'a StructuralSummary) -> Self {
        Self {
            code,
            lowered: code.to_lowercase(),
            summary,
        }
    }
}

pub trait NoveltyHeuristic: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    /// Trigger words present in the fragment, when they meet the threshold.
    fn triggered(&self, view: &FragmentView<'_>) -> Option<Vec<String>>;
    /// Structural evidence, when every condition holds.
    fn structural(&self, view: &FragmentView<'_>) -> Option<Vec<String>>;
    fn strong_confidence(&self) -> f64;
}

type StructuralCheck = fn(&FragmentView<'_>) -> Option<Vec<String>>;

/// Table-driven heuristic.
#[derive(Clone, Copy)]
pub struct NoveltyRule {
    pub name: &'static str,
    pub description: &'static str,
    pub triggers: &'static [&'static str],
    pub threshold: usize,
    pub strong_confidence: f64,
    pub check: StructuralCheck,
}

impl NoveltyHeuristic for NoveltyRule {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn triggered(&self, view: &FragmentView<'_>) -> Option<Vec<String>> {
        let found: Vec<String> = self
            .triggers
            .iter()
            .filter(|t| view.lowered.contains(*t))
            .map(|t| t.to_string())
            .collect();
        (self.threshold > 0 && found.len() >= self.threshold).then_some(found)
    }

    fn structural(&self, view: &FragmentView<'_>) -> Option<Vec<String>> {
        (self.check)(view)
    }

    fn strong_confidence(&self) -> f64 {
        self.strong_confidence
    }
}

static SELF_RETURN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"return\s+(this|self)\b|=>\s*this\b|->\s*Self\b").expect("self return regex")
});
static CHAINED_CALL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)\)\s*\.\s*[A-Za-z_]\w*\s*\(|^\s*\.[A-Za-z_]\w*\s*\(").expect("chained call regex")
});
static FINALIZER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\.(build|run|execute|collect|done|finish)\s*\(\s*\)").expect("finalizer regex")
});
static DISPATCH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(switch|match)\b").expect("dispatch regex"));
static ARM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bcase\b|=>").expect("arm regex"));
static INSTANTIATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bnew\s+[A-Z]\w*\s*\(|\b[A-Z]\w*::new\s*\(").expect("instantiation regex")
});
static ACQUIRE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(acquire|checkout|obtain)\w*\s*\(").expect("acquire regex")
});
static RELEASE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(release|checkin|recycle)\w*\s*\(").expect("release regex")
});
static REUSE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\.(pop|push|shift|unshift|pop_front|push_back|pop_back)\s*\(").expect("reuse regex")
});
static NEXT_PARAM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\([^()]*\bnext\s*\)").expect("next param regex"));
static NEXT_CALL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bnext\s*\(").expect("next call regex"));
static USE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.use\s*\(").expect("use regex"));
static CACHE_LOOKUP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(cache|memo)\w*\.(has|get|contains_key|containskey)\s*\(").expect("cache lookup regex")
});
static CACHE_STORE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(cache|memo)\w*\.(set|insert|put)\s*\(").expect("cache store regex")
});
static RETURN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\breturn\b").expect("return regex"));

fn fluent_builder(view: &FragmentView<'_>) -> Option<Vec<String>> {
    let chained = CHAINED_CALL_RE.find_iter(view.code).count();
    if !SELF_RETURN_RE.is_match(view.code) || chained < 2 {
        return None;
    }
    let finalizer = FINALIZER_RE.find(view.code)?;
    Some(vec![
        "self-returning method".to_string(),
        format!("{} chained calls", chained),
        format!("finalizing call {}", finalizer.as_str()),
    ])
}

fn switch_factory(view: &FragmentView<'_>) -> Option<Vec<String>> {
    let dispatch = DISPATCH_RE.find(view.code)?;
    let tail = &view.code[dispatch.start()..];
    let arms = ARM_RE.find_iter(tail).count();
    let instantiations = INSTANTIATION_RE.find_iter(tail).count();
    (arms >= 2 && instantiations >= 2).then(|| {
        vec![
            format!("{} dispatch", dispatch.as_str()),
            format!("{} arms", arms),
            format!("{} instantiating arms", instantiations),
        ]
    })
}

fn object_pool(view: &FragmentView<'_>) -> Option<Vec<String>> {
    let acquire = ACQUIRE_RE.find(view.code)?;
    let release = RELEASE_RE.find(view.code)?;
    let reuse = REUSE_RE.find(view.code)?;
    Some(vec![
        format!("acquire via {}", acquire.as_str().trim_end_matches('(').trim()),
        format!("release via {}", release.as_str().trim_end_matches('(').trim()),
        format!("reuse via {}", reuse.as_str().trim_end_matches('(')),
    ])
}

fn middleware_chain(view: &FragmentView<'_>) -> Option<Vec<String>> {
    let all = NEXT_PARAM_RE.is_match(view.code) && NEXT_CALL_RE.is_match(view.code) && USE_RE.is_match(view.code);
    all.then(|| {
        vec![
            "handler receives next".to_string(),
            "next() invoked".to_string(),
            ".use() registration".to_string(),
        ]
    })
}

fn memoization(view: &FragmentView<'_>) -> Option<Vec<String>> {
    let all = CACHE_LOOKUP_RE.is_match(&view.lowered)
        && CACHE_STORE_RE.is_match(&view.lowered)
        && RETURN_RE.is_match(&view.lowered);
    all.then(|| {
        vec![
            "cache lookup".to_string(),
            "cache store".to_string(),
            "cached return".to_string(),
        ]
    })
}

const DEFAULT_RULES: &[NoveltyRule] = &[
    NoveltyRule {
        name: "Fluent Builder",
        description: "Chained self-returning calls closed by a finalizing call",
        triggers: &["=> this", "return this", "return self", ".build()", ".run()", "chain", "fluent"],
        threshold: 2,
        strong_confidence: 0.65,
        check: fluent_builder,
    },
    NoveltyRule {
        name: "Switch Factory",
        description: "Type dispatch whose arms each construct a different implementation",
        triggers: &["switch", "match ", "case ", "::new(", "new ", "kind"],
        threshold: 3,
        strong_confidence: 0.6,
        check: switch_factory,
    },
    NoveltyRule {
        name: "Object Pool",
        description: "Instances handed out and returned for reuse instead of being recreated",
        triggers: &["pool", "acquire", "release", "idle", "reuse", "checkout"],
        threshold: 2,
        strong_confidence: 0.6,
        check: object_pool,
    },
    NoveltyRule {
        name: "Middleware Chain",
        description: "Handlers registered in order, each deciding whether to call the next",
        triggers: &["middleware", "next(", ".use(", "pipeline", "handler"],
        threshold: 2,
        strong_confidence: 0.55,
        check: middleware_chain,
    },
    NoveltyRule {
        name: "Memoization",
        description: "Results cached by input and returned on repeat calls",
        triggers: &["memo", "cache", ".has(", ".get(", ".set(", "contains_key", ".insert("],
        threshold: 3,
        strong_confidence: 0.55,
        check: memoization,
    },
];

/// Built-in heuristics.
pub fn default_rules() -> &'static [NoveltyRule] {
    DEFAULT_RULES
}

pub struct NoveltyDetector {
    heuristics: Vec<Box<dyn NoveltyHeuristic>>,
    trigger_confidence: f64,
}

impl NoveltyDetector {
    pub fn new(heuristics: Vec<Box<dyn NoveltyHeuristic>>) -> Self {
        Self {
            heuristics,
            trigger_confidence: DEFAULT_TRIGGER_CONFIDENCE,
        }
    }

    pub fn with_trigger_confidence(mut self, confidence: f64) -> Self {
        self.trigger_confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn heuristic_names(&self) -> Vec<&str> {
        self.heuristics.iter().map(|h| h.name()).collect()
    }

    pub fn detect_novel(&self, fragment: &Fragment, existing_matches: &[MatchResult]) -> Vec<CandidateResult> {
        if !existing_matches.is_empty() {
            return Vec::new();
        }

        let view = FragmentView::new(fragment.code(), fragment.structural_summary());
        let mut results = Vec::new();
        for heuristic in &self.heuristics {
            if let Some(evidence) = heuristic.triggered(&view) {
                results.push(CandidateResult {
                    name: heuristic.name().to_string(),
                    description: heuristic.description().to_string(),
                    confidence: self.trigger_confidence,
                    tier: DetectionTier::Trigger,
                    evidence,
                });
            }
            if let Some(evidence) = heuristic.structural(&view) {
                results.push(CandidateResult {
                    name: heuristic.name().to_string(),
                    description: format!("Strong candidate: {}", heuristic.description()),
                    confidence: heuristic.strong_confidence().clamp(0.0, 1.0),
                    tier: DetectionTier::Structural,
                    evidence,
                });
            }
        }
        results
    }
}

impl Default for NoveltyDetector {
    fn default() -> Self {
        Self::new(
            default_rules()
                .iter()
                .map(|rule| Box::new(*rule) as Box<dyn NoveltyHeuristic>)
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archetype_cortex::FragmentContext;

    fn fragment(code: &str) -> Fragment {
        Fragment::new(code, FragmentContext::new(), 10).unwrap()
    }

    fn names(results: &[CandidateResult], tier: DetectionTier) -> Vec<String> {
        results.iter().filter(|r| r.tier == tier).map(|r| r.name.clone()).collect()
    }

    const POOL: &str = "const pool = [];\nfunction acquire() { return pool.length ? pool.pop() : spawnConnection(); }\nfunction release(conn) { pool.push(conn); }";

    #[test]
    fn test_existing_match_suppresses_novelty() {
        let detector = NoveltyDetector::default();
        let existing = vec![MatchResult {
            pattern: "Builder Pattern".to_string(),
            confidence: 0.5,
            indicators_found: 3,
            indicators_total: 5,
            matched_indicators: vec![],
            description: String::new(),
        }];
        assert!(detector.detect_novel(&fragment(POOL), &existing).is_empty());
    }

    #[test]
    fn test_object_pool_fires_both_tiers() {
        let results = NoveltyDetector::default().detect_novel(&fragment(POOL), &[]);
        assert_eq!(names(&results, DetectionTier::Trigger), vec!["Object Pool".to_string()]);
        assert_eq!(names(&results, DetectionTier::Structural), vec!["Object Pool".to_string()]);

        let strong = results.iter().find(|r| r.tier == DetectionTier::Structural).unwrap();
        assert_eq!(strong.confidence, 0.6);
        let weak = results.iter().find(|r| r.tier == DetectionTier::Trigger).unwrap();
        assert_eq!(weak.confidence, DEFAULT_TRIGGER_CONFIDENCE);
    }

    #[test]
    fn test_rust_match_factory_is_structural() {
        let code = r#"
fn make_shape(kind: &str) -> Box<dyn Shape> {
    match kind {
        "circle" => Box::new(Circle::new(1.0)),
        "square" => Box::new(Square::new(2.0)),
        _ => Box::new(Point::new()),
    }
}
"#;
        let results = NoveltyDetector::default().detect_novel(&fragment(code), &[]);
        assert!(names(&results, DetectionTier::Structural).contains(&"Switch Factory".to_string()));
    }

    #[test]
    fn test_fluent_chain_with_finalizer() {
        let code = r#"
const job = (cfg) => ({
  retries: (n) => { cfg.retries = n; return this; },
});
scheduler.every(5).minutes().tag("sync").run();
"#;
        let results = NoveltyDetector::default().detect_novel(&fragment(code), &[]);
        assert!(names(&results, DetectionTier::Structural).contains(&"Fluent Builder".to_string()));
    }

    #[test]
    fn test_middleware_chain() {
        let code = "app.use((req, res, next) => { log(req); next(); });\napp.use(auth);";
        let results = NoveltyDetector::default().detect_novel(&fragment(code), &[]);
        assert!(names(&results, DetectionTier::Structural).contains(&"Middleware Chain".to_string()));
    }

    #[test]
    fn test_memoization() {
        let code = "function fib(n) {\n  if (cache.has(n)) return cache.get(n);\n  const v = fib(n - 1) + fib(n - 2);\n  cache.set(n, v);\n  return v;\n}";
        let results = NoveltyDetector::default().detect_novel(&fragment(code), &[]);
        assert!(names(&results, DetectionTier::Trigger).contains(&"Memoization".to_string()));
        assert!(names(&results, DetectionTier::Structural).contains(&"Memoization".to_string()));
    }

    #[test]
    fn test_trigger_tier_fires_at_threshold() {
        let results = NoveltyDetector::default().detect_novel(&fragment("let p = pool; p.release(x);"), &[]);
        assert_eq!(names(&results, DetectionTier::Trigger), vec!["Object Pool".to_string()]);
        assert!(names(&results, DetectionTier::Structural).is_empty());
    }

    #[test]
    fn test_trigger_tier_silent_below_threshold() {
        let results = NoveltyDetector::default().detect_novel(&fragment("let p = pool; p.drain(x);"), &[]);
        assert!(results.is_empty());
    }

    #[test]
    fn test_plain_code_yields_nothing() {
        let results = NoveltyDetector::default().detect_novel(&fragment("let total = a + b;\nprint(total);"), &[]);
        assert!(results.is_empty());
    }

    #[test]
    fn test_trigger_confidence_configurable() {
        let detector = NoveltyDetector::default().with_trigger_confidence(0.3);
        let results = detector.detect_novel(&fragment(POOL), &[]);
        let weak = results.iter().find(|r| r.tier == DetectionTier::Trigger).unwrap();
        assert_eq!(weak.confidence, 0.3);
    }
}
