// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Integration tests for the bridge: collaborator isolation, fallbacks,
//! timeouts, cancellation, correlation and the integrated summary.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use archetype_core::application::{ArchetypeBridge, ArchetypeDiscoverer, DiscoveryHandle, DiscoveryService};
use archetype_core::domain::analysis::ENGINE_UNAVAILABLE_ERROR;
use archetype_core::domain::collaborators::{
    AnomalyAnalyzer, AnomalyReport, CollaboratorError, Collaborators, HolisticAnalyzer, HolisticReport,
    PatternPrediction, PatternPredictor, PrimaryPurpose, PurposeAnalyzer, PurposeReport,
};
use archetype_core::domain::config::BridgeSettings;
use archetype_core::domain::correlation::{Correlation, HealthStatus, LayerStatus, Trend};
use archetype_core::domain::events::IntegrationEvent;
use archetype_core::infrastructure::event_bus::{DomainEvent, EventBus};
use archetype_cortex::FragmentContext;

const BUILDER: &str = r#"
class RequestBuilder {
  url(u) { this.u = u; return this; }
  header(k, v) { this.h[k] = v; return this; }
  build() { return new Request(this.u, this.h); }
}
const req = new RequestBuilder().url("/a").header("x", "y").build();
"#;

const UNMATCHED_WITH_ANOMALIES: &str = "let total = price * quantity;\nprint(total);";

struct RejectingPurpose;

#[async_trait]
impl PurposeAnalyzer for RejectingPurpose {
    async fn identify(&self, _code: &str) -> Result<PurposeReport, CollaboratorError> {
        Err(CollaboratorError::failed("purpose", "model offline"))
    }
}

struct FixedPurpose(&'static str, f64);

#[async_trait]
impl PurposeAnalyzer for FixedPurpose {
    async fn identify(&self, _code: &str) -> Result<PurposeReport, CollaboratorError> {
        Ok(PurposeReport {
            primary_purpose: PrimaryPurpose {
                purpose: self.0.to_string(),
                description: String::new(),
            },
            confidence: self.1,
        })
    }
}

struct PanickingAnomaly;

#[async_trait]
impl AnomalyAnalyzer for PanickingAnomaly {
    async fn detect_anomalies(&self, _code: &str) -> Result<AnomalyReport, CollaboratorError> {
        panic!("anomaly scanner crashed");
    }

    async fn intuition_score(&self, _code: &str) -> Result<f64, CollaboratorError> {
        Ok(0.8)
    }
}

struct FixedAnomalies(usize);

#[async_trait]
impl AnomalyAnalyzer for FixedAnomalies {
    async fn detect_anomalies(&self, _code: &str) -> Result<AnomalyReport, CollaboratorError> {
        Ok(AnomalyReport {
            anomalies: (0..self.0)
                .map(|i| archetype_core::domain::collaborators::Anomaly {
                    kind: "magic_number".to_string(),
                    severity: archetype_core::domain::collaborators::AnomalySeverity::Medium,
                    message: "unnamed constant".to_string(),
                    line: Some(i + 1),
                })
                .collect(),
            summary: format!("{} anomalies found", self.0),
            confidence: 0.7,
        })
    }

    async fn intuition_score(&self, _code: &str) -> Result<f64, CollaboratorError> {
        Ok(0.5)
    }
}

struct SlowPredictor;

#[async_trait]
impl PatternPredictor for SlowPredictor {
    async fn predict(&self, _code: &str) -> Result<PatternPrediction, CollaboratorError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(PatternPrediction {
            prediction: "builder".to_string(),
            confidence: 0.9,
        })
    }
}

struct CountingHolistic {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl HolisticAnalyzer for CountingHolistic {
    async fn analyze(&self, _code: &str) -> Result<HolisticReport, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(HolisticReport {
            summary: Some("reviewed".to_string()),
            confidence: 0.6,
            recommendations: vec!["Document the public surface".to_string()],
        })
    }
}

fn settings(timeout_ms: u64) -> BridgeSettings {
    BridgeSettings {
        collaborator_timeout_ms: timeout_ms,
        ..BridgeSettings::default()
    }
}

fn bridge_with(collaborators: Collaborators, timeout_ms: u64) -> (ArchetypeBridge, DiscoveryHandle) {
    let (handle, _task) = DiscoveryHandle::spawn(ArchetypeDiscoverer::default());
    let bridge = ArchetypeBridge::new(Arc::new(handle.clone()), collaborators, settings(timeout_ms));
    (bridge, handle)
}

#[tokio::test]
async fn test_rejecting_collaborator_falls_back() {
    let collaborators = Collaborators {
        purpose: Arc::new(RejectingPurpose),
        ..Collaborators::lexical()
    };
    let (bridge, _handle) = bridge_with(collaborators, 5000);

    let result = bridge
        .comprehensive_analysis_with_discovery(BUILDER, FragmentContext::new())
        .await;

    assert!(result.discovery.is_success());
    assert_eq!(result.purpose, PurposeReport::fallback());
    assert!(matches!(
        &result.layers.purpose,
        LayerStatus::Fallback { reason } if reason.contains("model offline")
    ));
    assert!(result.layers.discovery.is_ok());
    assert!(result.layers.anomaly.is_ok());
    assert!(result.layers.prediction.is_ok());
    assert!(result.layers.holistic.is_ok());
    assert!((0.0..=1.0).contains(&result.confidence));

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["purpose"]["primary_purpose"]["purpose"], "unknown");
}

#[tokio::test]
async fn test_panicking_collaborator_is_isolated() {
    let collaborators = Collaborators {
        anomaly: Arc::new(PanickingAnomaly),
        ..Collaborators::lexical()
    };
    let (bridge, _handle) = bridge_with(collaborators, 5000);

    let result = bridge
        .comprehensive_analysis_with_discovery(BUILDER, FragmentContext::new())
        .await;

    assert!(result.quality.anomalies.anomalies.is_empty());
    assert!(matches!(
        &result.layers.anomaly,
        LayerStatus::Fallback { reason } if reason.contains("anomaly scanner crashed")
    ));
    assert!(result.layers.intuition.is_ok());
    assert_eq!(result.quality.intuition_score, 0.8);
}

#[tokio::test]
async fn test_slow_collaborator_times_out() {
    let collaborators = Collaborators {
        predictor: Arc::new(SlowPredictor),
        ..Collaborators::lexical()
    };
    let (bridge, _handle) = bridge_with(collaborators, 50);

    let result = bridge
        .comprehensive_analysis_with_discovery(BUILDER, FragmentContext::new())
        .await;

    assert_eq!(result.prediction, PatternPrediction::fallback());
    assert!(matches!(
        &result.layers.prediction,
        LayerStatus::Fallback { reason } if reason.contains("timed out after 50 ms")
    ));
    assert!(result.discovery.is_success());
}

#[tokio::test]
async fn test_cancelled_call_leaves_discovery_state_untouched() {
    let collaborators = Collaborators {
        predictor: Arc::new(SlowPredictor),
        ..Collaborators::lexical()
    };
    let (bridge, handle) = bridge_with(collaborators, 60_000);
    let token = CancellationToken::new();

    let canceller = {
        let token = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            token.cancel();
        })
    };
    let result = bridge
        .comprehensive_analysis_with_discovery_cancellable(BUILDER, FragmentContext::new(), token)
        .await;
    canceller.await.unwrap();

    assert!(!result.discovery.is_success());
    assert!(!result.layers.discovery.is_ok());
    assert!(matches!(
        &result.layers.prediction,
        LayerStatus::Fallback { reason } if reason.contains("cancelled")
    ));
    assert_eq!(handle.discovery_summary().await.unwrap().total_observations, 0);
}

#[tokio::test]
async fn test_unavailable_discovery_still_returns_complete_result() {
    let (bridge, handle) = bridge_with(Collaborators::lexical(), 5000);
    handle.shutdown().await;

    let result = bridge
        .comprehensive_analysis_with_discovery(BUILDER, FragmentContext::new())
        .await;

    assert_eq!(result.discovery.error(), Some(ENGINE_UNAVAILABLE_ERROR));
    assert!(!result.layers.discovery.is_ok());
    assert!(result.layers.purpose.is_ok());

    let summary = bridge.integrated_summary().await;
    assert_eq!(summary.archetypal_discovery.total_observations, 0);
    assert_eq!(summary.integration_metrics.total_integrated_analyses, 1);
}

#[tokio::test]
async fn test_lexical_collaborators_correlate_with_discovery() {
    let (bridge, _handle) = bridge_with(Collaborators::lexical(), 5000);

    let result = bridge
        .comprehensive_analysis_with_discovery(BUILDER, FragmentContext::new())
        .await;

    assert!(result.correlations.iter().any(|c| matches!(
        c,
        Correlation::PurposePatternAlignment { pattern, shared_token, .. }
            if pattern == "Builder Pattern" && shared_token == "builder"
    )));
    assert!(result.correlations.iter().any(|c| matches!(
        c,
        Correlation::PredictionValidation { prediction, pattern, .. }
            if prediction == "builder" && pattern == "Builder Pattern"
    )));
    assert!(result
        .recommendations
        .iter()
        .any(|r| r.starts_with("Builder Pattern:")));
    for correlation in &result.correlations {
        assert!((0.0..=1.0).contains(&correlation.confidence()));
    }
}

#[tokio::test]
async fn test_mismatch_and_holistic_recommendations() {
    let calls = Arc::new(AtomicUsize::new(0));
    let collaborators = Collaborators {
        purpose: Arc::new(FixedPurpose("arithmetic", 0.4)),
        anomaly: Arc::new(FixedAnomalies(2)),
        predictor: Collaborators::lexical().predictor,
        holistic: Arc::new(CountingHolistic { calls: calls.clone() }),
    };
    let (bridge, _handle) = bridge_with(collaborators, 5000);

    let result = bridge
        .comprehensive_analysis_with_discovery(UNMATCHED_WITH_ANOMALIES, FragmentContext::new())
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(result.discovery.matches().is_empty());
    assert!(matches!(
        result.correlations.as_slice(),
        [Correlation::PatternMismatch { anomaly_count: 2, confidence, .. }] if (*confidence - 0.7).abs() < 1e-9
    ));
    assert_eq!(result.recommendations, vec!["Document the public surface".to_string()]);
}

#[tokio::test]
async fn test_integrated_summary_health_and_trend() {
    let (bridge, _handle) = bridge_with(Collaborators::lexical(), 5000);

    let idle = bridge.integrated_summary().await;
    assert_eq!(idle.system_health.status, HealthStatus::Idle);
    assert_eq!(idle.integration_metrics.trend, Trend::InsufficientData);

    bridge
        .comprehensive_analysis_with_discovery(UNMATCHED_WITH_ANOMALIES, FragmentContext::new())
        .await;
    bridge
        .comprehensive_analysis_with_discovery(BUILDER, FragmentContext::new())
        .await;

    let summary = bridge.integrated_summary().await;
    assert_eq!(summary.system_health.status, HealthStatus::Healthy);
    assert_eq!(summary.system_health.reliability, 1.0);
    assert_eq!(summary.integration_metrics.total_integrated_analyses, 2);
    assert_eq!(summary.archetypal_discovery.total_observations, 2);
    assert_ne!(summary.integration_metrics.trend, Trend::InsufficientData);
    assert_eq!(bridge.history().len(), 2);
}

#[tokio::test]
async fn test_fallbacks_degrade_health_and_publish_events() {
    let bus = Arc::new(EventBus::new(64));
    let mut receiver = bus.subscribe();
    let (handle, _task) = DiscoveryHandle::spawn(ArchetypeDiscoverer::default().with_event_bus(bus.clone()));
    let collaborators = Collaborators {
        purpose: Arc::new(RejectingPurpose),
        ..Collaborators::lexical()
    };
    let bridge = ArchetypeBridge::new(Arc::new(handle), collaborators, settings(5000)).with_event_bus(bus.clone());

    let result = bridge
        .comprehensive_analysis_with_discovery(BUILDER, FragmentContext::new())
        .await;

    let summary = bridge.integrated_summary().await;
    assert_eq!(summary.system_health.status, HealthStatus::Degraded);
    assert_eq!(summary.system_health.collaborator_fallbacks, 1);
    assert_eq!(summary.integration_metrics.total_collaborator_fallbacks, 1);

    let mut fell_back = false;
    let mut completed = false;
    while let Ok(event) = receiver.try_recv() {
        match event {
            DomainEvent::Integration(IntegrationEvent::CollaboratorFellBack { layer, analysis_id, .. }) => {
                assert_eq!(layer, "purpose");
                assert_eq!(analysis_id, result.id);
                fell_back = true;
            }
            DomainEvent::Integration(IntegrationEvent::IntegratedAnalysisCompleted { fallbacks, .. }) => {
                assert_eq!(fallbacks, 1);
                completed = true;
            }
            DomainEvent::Cortex(_) => {}
        }
    }
    assert!(fell_back && completed);
}

#[tokio::test]
async fn test_history_is_bounded() {
    let (handle, _task) = DiscoveryHandle::spawn(ArchetypeDiscoverer::default());
    let settings = BridgeSettings {
        history_limit: 3,
        ..BridgeSettings::default()
    };
    let bridge = ArchetypeBridge::new(Arc::new(handle), Collaborators::lexical(), settings);

    for _ in 0..5 {
        bridge
            .comprehensive_analysis_with_discovery(BUILDER, FragmentContext::new())
            .await;
    }

    assert_eq!(bridge.history().len(), 3);
    assert_eq!(bridge.integrated_summary().await.integration_metrics.total_integrated_analyses, 5);
}
