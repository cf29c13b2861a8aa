// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! End-to-end discovery scenarios and engine-wide properties.
//!
//! Covers builder and switch-factory recognition, repeated novel fragments
//! becoming emerging patterns, invalid input, confidence bounds, matching
//! determinism, match/novelty exclusivity, reinforcement monotonicity and the
//! retention bound of the collective history.

use archetype_core::application::{ArchetypeDiscoverer, DiscoveryHandle, DiscoveryService};
use archetype_core::domain::analysis::INVALID_FRAGMENT_ERROR;
use archetype_core::domain::config::DiscoverySettings;
use archetype_core::domain::matching::Matcher;
use archetype_cortex::{FragmentContext, PatternCatalog};

const BUILDER: &str = r#"
class HttpRequestBuilder {
  constructor() { this.headers = {}; }
  method(m) { this.m = m; return this; }
  header(k, v) { this.headers[k] = v; return this; }
  build() { return new HttpRequest(this.m, this.headers); }
}
const req = new HttpRequestBuilder().method("GET").header("accept", "json").build();
"#;

const SWITCH_FACTORY: &str = r#"
function createShape(type) {
  switch (type) {
    case "circle": return new Circle();
    case "square": return new Square();
    default: return new Triangle();
  }
}
"#;

const OBJECT_POOL: &str = "const pool = [];\nfunction acquire() { return pool.length ? pool.pop() : spawnConnection(); }\nfunction release(conn) { pool.push(conn); }";

const PLAIN: &str = "let total = price * quantity;\nprint(total);";

const CORPUS: &[&str] = &[BUILDER, SWITCH_FACTORY, OBJECT_POOL, PLAIN,
    "class EventHub { subscribe(fn) { this.listeners.push(fn); } notify(e) { this.listeners.forEach(l => l(e)); } }",
    "app.use((req, res, next) => { audit(req); next(); });\napp.use(router);",
    "function fib(n) {\n  if (memo.has(n)) return memo.get(n);\n  const v = fib(n - 1) + fib(n - 2);\n  memo.set(n, v);\n  return v;\n}",
    "class Config { static getInstance() { return Config.instance ??= new Config(); } }",
];

#[test]
fn test_builder_scenario() {
    let mut discoverer = ArchetypeDiscoverer::default();
    let result = discoverer.analyze(BUILDER, FragmentContext::new().with("language", "javascript"));

    let outcome = result.outcome().expect("builder analysis succeeds");
    let builder = outcome
        .matches
        .iter()
        .find(|m| m.pattern == "Builder Pattern")
        .expect("builder match");
    assert!(builder.indicators_found >= 3);
    assert_eq!(outcome.matches[0].pattern, "Builder Pattern");
    assert_eq!(outcome.fragment.context().get("language"), Some("javascript"));
}

#[test]
fn test_switch_factory_scenario() {
    let mut discoverer = ArchetypeDiscoverer::default();
    let result = discoverer.analyze(SWITCH_FACTORY, FragmentContext::new());

    let outcome = result.outcome().expect("factory analysis succeeds");
    let surfaced = outcome.matches.iter().any(|m| m.pattern.contains("Factory"))
        || outcome.novel_patterns.iter().any(|c| c.name.contains("Factory"));
    assert!(surfaced);
    assert_eq!(outcome.matches[0].pattern, "Factory Pattern");
}

#[tokio::test]
async fn test_repeated_novel_fragment_emerges() {
    let (handle, _task) = DiscoveryHandle::spawn(ArchetypeDiscoverer::default());

    let first = handle.analyze(OBJECT_POOL, FragmentContext::new()).await;
    assert!(first.matches().is_empty());
    assert!(handle.emerging_patterns().await.unwrap().is_empty());

    handle.analyze(OBJECT_POOL, FragmentContext::new()).await;
    let emerging = handle.emerging_patterns().await.unwrap();
    let pool = emerging
        .iter()
        .find(|p| p.pattern == "Object Pool")
        .expect("object pool is emerging");
    assert_eq!(pool.occurrences, 2);

    let candidate = handle.candidate("Object Pool").await.unwrap().unwrap();
    assert_eq!(candidate.occurrences, 2);
    assert!(candidate.confidence <= 0.7);
}

#[tokio::test]
async fn test_empty_input_is_invalid() {
    let (handle, _task) = DiscoveryHandle::spawn(ArchetypeDiscoverer::default());

    let result = handle.analyze("", FragmentContext::new()).await;
    assert!(!result.is_success());
    assert_eq!(result.error(), Some(INVALID_FRAGMENT_ERROR));

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["status"], "failure");
    assert_eq!(json["error"], "Invalid code fragment");

    assert_eq!(handle.discovery_summary().await.unwrap().total_observations, 0);
}

#[test]
fn test_confidence_bounds_and_monotonicity() {
    let mut discoverer = ArchetypeDiscoverer::default();
    let mut previous = discoverer.known_pattern("Builder Pattern").unwrap().base_confidence();

    for _ in 0..50 {
        for code in CORPUS {
            let result = discoverer.analyze(code, FragmentContext::new());
            let outcome = result.outcome().unwrap();
            assert!((0.0..=1.0).contains(&outcome.confidence));
            assert!((0.0..=1.0).contains(&outcome.fragment.confidence()));
            for m in &outcome.matches {
                assert!((0.0..=0.95).contains(&m.confidence));
            }
            for c in &outcome.novel_patterns {
                assert!((0.0..=1.0).contains(&c.confidence));
            }
        }

        let current = discoverer.known_pattern("Builder Pattern").unwrap().base_confidence();
        assert!(current >= previous);
        assert!(current <= 0.95);
        previous = current;
    }

    for pattern in discoverer.known_patterns() {
        assert!((0.0..=0.95).contains(&pattern.base_confidence()));
    }
    for candidate in discoverer.candidates() {
        assert!(candidate.confidence <= 0.7);
    }
}

#[test]
fn test_matching_is_deterministic() {
    let catalog = PatternCatalog::seeded();
    let matcher = Matcher::new(0.1);
    for code in CORPUS {
        assert_eq!(matcher.score(&catalog, code), matcher.score(&catalog, code));
    }
}

#[test]
fn test_match_and_novelty_are_exclusive() {
    let mut discoverer = ArchetypeDiscoverer::default();
    for code in CORPUS {
        let result = discoverer.analyze(code, FragmentContext::new());
        if !result.matches().is_empty() {
            assert!(result.novel_patterns().is_empty(), "novelty reported alongside matches for {code}");
        }
    }
}

#[test]
fn test_history_respects_retention_window() {
    let settings = DiscoverySettings {
        retention_window: 5,
        ..DiscoverySettings::default()
    };
    let mut discoverer = ArchetypeDiscoverer::new(settings);

    for i in 0..12 {
        discoverer.analyze(CORPUS[i % CORPUS.len()], FragmentContext::new());
        assert!(discoverer.collective_insights().retained_records <= 5);
    }

    let insights = discoverer.collective_insights();
    assert_eq!(insights.retained_records, 5);
    assert_eq!(insights.total_analyses, 12);
    assert_eq!(discoverer.discovery_summary().total_observations, 12);
}

#[test]
fn test_reliability_counts_productive_analyses() {
    let mut discoverer = ArchetypeDiscoverer::default();
    discoverer.analyze(BUILDER, FragmentContext::new());
    discoverer.analyze(PLAIN, FragmentContext::new());

    let insights = discoverer.collective_insights();
    assert!((insights.reliability - 0.5).abs() < 1e-9);
    assert!((discoverer.pattern_confidence("Builder Pattern") - 0.5).abs() < 1e-9);
}
