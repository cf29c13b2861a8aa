// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Archetype Bridge
//!
//! Runs discovery alongside the sibling analyzers and merges everything into
//! one [`IntegratedResult`].
//!
//! Per call:
//!
//! 1. discovery `evaluate` and the five collaborator calls are spawned as
//!    independent tasks, each raced against the call's [`CancellationToken`]
//!    and the configured timeout;
//! 2. any failed, panicked, timed-out or cancelled layer is replaced by its
//!    fallback and marked [`LayerStatus::Fallback`];
//! 3. the evaluation is committed (the only mutation of discovery state),
//!    unless the call was cancelled;
//! 4. correlations and recommendations are derived and the result is
//!    appended to a bounded history used by [`ArchetypeBridge::integrated_summary`].
//!
//! The entry points never return an error.

use std::any::Any;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use archetype_cortex::FragmentContext;

use crate::application::discovery_service::DiscoveryService;
use crate::domain::analysis::{AnalysisResult, DiscoveryError, DiscoverySummary, Evaluation};
use crate::domain::collaborators::{
    AnomalyReport, CollaboratorError, Collaborators, HolisticReport, PatternPrediction, PurposeReport,
    FALLBACK_INTUITION_SCORE,
};
use crate::domain::config::BridgeSettings;
use crate::domain::correlation::{
    classify_trend, correlate, integrated_confidence, synthesize_recommendations, HealthStatus,
    IntegratedResult, IntegratedSummary, IntegrationMetrics, LayerStatus, LayerStatuses, QualityReport,
    SystemHealth,
};
use crate::domain::events::IntegrationEvent;
use crate::infrastructure::event_bus::EventBus;

#[derive(Default)]
struct BridgeState {
    history: VecDeque<IntegratedResult>,
    total_analyses: u64,
    correlations_found: u64,
    collaborator_fallbacks: u64,
}

pub struct ArchetypeBridge {
    discovery: Arc<dyn DiscoveryService>,
    collaborators: Collaborators,
    settings: BridgeSettings,
    state: Mutex<BridgeState>,
    event_bus: Option<Arc<EventBus>>,
}

impl ArchetypeBridge {
    pub fn new(discovery: Arc<dyn DiscoveryService>, collaborators: Collaborators, settings: BridgeSettings) -> Self {
        Self {
            discovery,
            collaborators,
            settings,
            state: Mutex::new(BridgeState::default()),
            event_bus: None,
        }
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn settings(&self) -> &BridgeSettings {
        &self.settings
    }

    /// Discovery alone, without collaborators or bridge history.
    pub async fn analyze(&self, code: &str, context: FragmentContext) -> AnalysisResult {
        self.discovery.analyze(code, context).await
    }

    pub async fn comprehensive_analysis_with_discovery(&self, code: &str, context: FragmentContext) -> IntegratedResult {
        self.comprehensive_analysis_with_discovery_cancellable(code, context, CancellationToken::new())
            .await
    }

    /// Cancelling `token` turns every unfinished layer into its fallback and
    /// skips the commit, so a cancelled call leaves discovery state untouched.
    pub async fn comprehensive_analysis_with_discovery_cancellable(
        &self,
        code: &str,
        context: FragmentContext,
        token: CancellationToken,
    ) -> IntegratedResult {
        let id = Uuid::new_v4();
        let timeout = Duration::from_millis(self.settings.collaborator_timeout_ms);
        let code: Arc<str> = Arc::from(code);

        debug!(analysis_id = %id, timeout_ms = self.settings.collaborator_timeout_ms, "Starting integrated analysis");

        let evaluation = {
            let discovery = self.discovery.clone();
            let code = code.clone();
            guard("discovery", timeout, token.clone(), async move {
                Ok::<_, CollaboratorError>(discovery.evaluate(&code, context).await)
            })
        };
        let purpose = {
            let analyzer = self.collaborators.purpose.clone();
            let code = code.clone();
            guard("purpose", timeout, token.clone(), async move { analyzer.identify(&code).await })
        };
        let anomalies = {
            let analyzer = self.collaborators.anomaly.clone();
            let code = code.clone();
            guard("anomaly", timeout, token.clone(), async move { analyzer.detect_anomalies(&code).await })
        };
        let intuition = {
            let analyzer = self.collaborators.anomaly.clone();
            let code = code.clone();
            guard("intuition", timeout, token.clone(), async move { analyzer.intuition_score(&code).await })
        };
        let prediction = {
            let predictor = self.collaborators.predictor.clone();
            let code = code.clone();
            guard("prediction", timeout, token.clone(), async move { predictor.predict(&code).await })
        };
        let holistic = {
            let analyzer = self.collaborators.holistic.clone();
            let code = code.clone();
            guard("holistic", timeout, token.clone(), async move { analyzer.analyze(&code).await })
        };

        let (evaluation, purpose, anomalies, intuition, prediction, holistic) =
            tokio::join!(evaluation, purpose, anomalies, intuition, prediction, holistic);

        let (discovery, discovery_status) = self.commit_discovery(id, evaluation, &token).await;
        let (purpose, purpose_status) = self.settle(id, purpose, PurposeReport::fallback);
        let (anomalies, anomaly_status) = self.settle(id, anomalies, AnomalyReport::fallback);
        let (intuition_score, intuition_status) = self.settle(id, intuition, || FALLBACK_INTUITION_SCORE);
        let (prediction, prediction_status) = self.settle(id, prediction, PatternPrediction::fallback);
        let (holistic, holistic_status) = self.settle(id, holistic, HolisticReport::fallback);

        let layers = LayerStatuses {
            discovery: discovery_status,
            purpose: purpose_status,
            anomaly: anomaly_status,
            intuition: intuition_status,
            prediction: prediction_status,
            holistic: holistic_status,
        };

        let mut available = Vec::new();
        if discovery.is_success() {
            available.push(discovery.confidence());
        }
        if layers.purpose.is_ok() {
            available.push(purpose.confidence);
        }
        if layers.anomaly.is_ok() {
            available.push(anomalies.confidence);
        }
        if layers.prediction.is_ok() {
            available.push(prediction.confidence);
        }
        if layers.holistic.is_ok() {
            available.push(holistic.confidence);
        }
        let confidence = integrated_confidence(&available).clamp(0.0, 1.0);

        let correlations = correlate(&discovery, &purpose, &anomalies, &prediction);
        let recommendations =
            synthesize_recommendations(&discovery, &holistic, self.settings.recommendation_threshold);

        let result = IntegratedResult {
            id,
            timestamp: Utc::now(),
            discovery,
            purpose,
            quality: QualityReport {
                anomalies,
                intuition_score,
            },
            prediction,
            holistic,
            layers,
            correlations,
            recommendations,
            confidence,
        };

        self.record(&result);
        result
    }

    /// Cumulative discovery statistics plus the bridge's own running metrics.
    pub async fn integrated_summary(&self) -> IntegratedSummary {
        let archetypal_discovery = match self.discovery.discovery_summary().await {
            Ok(summary) => summary,
            Err(e) => {
                warn!(error = %e, "Discovery summary unavailable");
                DiscoverySummary::default()
            }
        };

        let state = self.state.lock();
        let average_confidence =
            integrated_confidence(&state.history.iter().map(|r| r.confidence).collect::<Vec<_>>());

        let window = self.settings.trend_window.max(1);
        let recent: Vec<&IntegratedResult> = state.history.iter().rev().take(window).rev().collect();
        let trend = classify_trend(
            &recent.iter().map(|r| r.confidence).collect::<Vec<_>>(),
            self.settings.trend_epsilon,
        );

        let recent_fallbacks: usize = recent.iter().map(|r| r.layers.collaborator_fallbacks()).sum();
        let system_health = if recent.is_empty() {
            SystemHealth {
                status: HealthStatus::Idle,
                collaborator_fallbacks: 0,
                reliability: 0.0,
            }
        } else {
            let clean = recent.iter().filter(|r| r.layers.collaborator_fallbacks() == 0).count();
            SystemHealth {
                status: if recent_fallbacks == 0 {
                    HealthStatus::Healthy
                } else {
                    HealthStatus::Degraded
                },
                collaborator_fallbacks: recent_fallbacks,
                reliability: clean as f64 / recent.len() as f64,
            }
        };

        IntegratedSummary {
            archetypal_discovery,
            integration_metrics: IntegrationMetrics {
                total_integrated_analyses: state.total_analyses,
                average_confidence,
                trend,
                correlations_found: state.correlations_found,
                total_collaborator_fallbacks: state.collaborator_fallbacks,
            },
            system_health,
        }
    }

    /// Retained integrated results, oldest first.
    pub fn history(&self) -> Vec<IntegratedResult> {
        self.state.lock().history.iter().cloned().collect()
    }

    async fn commit_discovery(
        &self,
        id: Uuid,
        evaluation: Result<Result<Evaluation, DiscoveryError>, CollaboratorError>,
        token: &CancellationToken,
    ) -> (AnalysisResult, LayerStatus) {
        let evaluation = match evaluation {
            Ok(Ok(evaluation)) => evaluation,
            Ok(Err(e)) => {
                let reason = e.to_string();
                debug!(analysis_id = %id, reason = %reason, "Discovery rejected fragment");
                return (AnalysisResult::from_error(e), LayerStatus::Fallback { reason });
            }
            Err(e) => {
                warn!(analysis_id = %id, error = %e, "Discovery layer fell back");
                return (
                    AnalysisResult::unavailable(),
                    LayerStatus::Fallback { reason: e.to_string() },
                );
            }
        };

        if token.is_cancelled() {
            let reason = CollaboratorError::Cancelled { layer: "discovery" }.to_string();
            return (AnalysisResult::unavailable(), LayerStatus::Fallback { reason });
        }

        match self.discovery.commit(evaluation).await {
            Ok(outcome) => (AnalysisResult::Success(Box::new(outcome)), LayerStatus::Ok),
            Err(e) => {
                warn!(analysis_id = %id, error = %e, "Discovery commit failed");
                (AnalysisResult::unavailable(), LayerStatus::Fallback { reason: e.to_string() })
            }
        }
    }

    fn settle<T>(
        &self,
        id: Uuid,
        result: Result<T, CollaboratorError>,
        fallback: impl FnOnce() -> T,
    ) -> (T, LayerStatus) {
        match result {
            Ok(value) => (value, LayerStatus::Ok),
            Err(e) => {
                warn!(analysis_id = %id, layer = e.layer(), error = %e, "Collaborator fell back");
                self.publish(IntegrationEvent::CollaboratorFellBack {
                    analysis_id: id,
                    layer: e.layer().to_string(),
                    reason: e.to_string(),
                    timestamp: Utc::now(),
                });
                (fallback(), LayerStatus::Fallback { reason: e.to_string() })
            }
        }
    }

    fn record(&self, result: &IntegratedResult) {
        let fallbacks = result.layers.collaborator_fallbacks();
        {
            let mut state = self.state.lock();
            state.history.push_back(result.clone());
            while state.history.len() > self.settings.history_limit.max(1) {
                state.history.pop_front();
            }
            state.total_analyses += 1;
            state.correlations_found += result.correlations.len() as u64;
            state.collaborator_fallbacks += fallbacks as u64;
        }

        info!(
            analysis_id = %result.id,
            confidence = result.confidence,
            correlations = result.correlations.len(),
            fallbacks,
            "Integrated analysis completed"
        );
        self.publish(IntegrationEvent::IntegratedAnalysisCompleted {
            analysis_id: result.id,
            confidence: result.confidence,
            correlations: result.correlations.len(),
            fallbacks,
            timestamp: result.timestamp,
        });
    }

    fn publish(&self, event: IntegrationEvent) {
        if let Some(bus) = &self.event_bus {
            bus.publish_integration_event(event);
        }
    }
}

/// Runs `work` as its own task, bounded by `timeout` and `token`.
async fn guard<T, F>(
    layer: &'static str,
    timeout: Duration,
    token: CancellationToken,
    work: F,
) -> Result<T, CollaboratorError>
where
    T: Send + 'static,
    F: Future<Output = Result<T, CollaboratorError>> + Send + 'static,
{
    let task = tokio::spawn(work);
    let abort = task.abort_handle();

    tokio::select! {
        joined = task => match joined {
            Ok(result) => result,
            Err(e) if e.is_panic() => Err(CollaboratorError::Panicked {
                layer,
                message: panic_message(e.into_panic()),
            }),
            Err(_) => Err(CollaboratorError::Cancelled { layer }),
        },
        _ = tokio::time::sleep(timeout) => {
            abort.abort();
            Err(CollaboratorError::TimedOut {
                layer,
                timeout_ms: timeout.as_millis() as u64,
            })
        }
        _ = token.cancelled() => {
            abort.abort();
            Err(CollaboratorError::Cancelled { layer })
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
