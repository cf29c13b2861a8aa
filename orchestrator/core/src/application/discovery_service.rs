// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Discovery Service - single-writer access to the discoverer
//!
//! The [`ArchetypeDiscoverer`] is owned by one background task
//! ([`DiscoveryActor`]). Callers hold a cloneable [`DiscoveryHandle`], send
//! commands over an `mpsc` queue and receive answers over `oneshot` channels,
//! so every mutation of the catalog, candidates and collective is serialized.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Serializes discovery state behind an async service boundary

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use archetype_cortex::{CandidateArchetype, CollectiveSnapshot, EmergingPattern, FragmentContext, KnownPattern};

use crate::application::discoverer::ArchetypeDiscoverer;
use crate::domain::analysis::{AnalysisOutcome, AnalysisResult, DiscoveryError, DiscoverySummary, Evaluation};

/// Queue depth between handles and the actor.
pub const DEFAULT_COMMAND_CAPACITY: usize = 256;

#[async_trait]
pub trait DiscoveryService: Send + Sync {
    /// Full analysis. Never fails; an unreachable engine yields a failure result.
    async fn analyze(&self, code: &str, context: FragmentContext) -> AnalysisResult;

    /// Read-only fragment, match and novelty evaluation.
    async fn evaluate(&self, code: &str, context: FragmentContext) -> Result<Evaluation, DiscoveryError>;

    /// Applies a prior evaluation to the shared state.
    async fn commit(&self, evaluation: Evaluation) -> Result<AnalysisOutcome, DiscoveryError>;

    async fn discovery_summary(&self) -> Result<DiscoverySummary, DiscoveryError>;

    async fn collective_insights(&self) -> Result<CollectiveSnapshot, DiscoveryError>;

    async fn emerging_patterns(&self) -> Result<Vec<EmergingPattern>, DiscoveryError>;

    async fn pattern_confidence(&self, name: &str) -> Result<f64, DiscoveryError>;

    async fn candidate(&self, name: &str) -> Result<Option<CandidateArchetype>, DiscoveryError>;

    async fn known_patterns(&self) -> Result<Vec<KnownPattern>, DiscoveryError>;

    /// Stops the engine. Later calls report it unavailable.
    async fn shutdown(&self);
}

enum DiscoveryCommand {
    Analyze {
        code: String,
        context: FragmentContext,
        reply: oneshot::Sender<AnalysisResult>,
    },
    Evaluate {
        code: String,
        context: FragmentContext,
        reply: oneshot::Sender<Result<Evaluation, DiscoveryError>>,
    },
    Commit {
        evaluation: Box<Evaluation>,
        reply: oneshot::Sender<AnalysisOutcome>,
    },
    Summary {
        reply: oneshot::Sender<DiscoverySummary>,
    },
    Insights {
        reply: oneshot::Sender<CollectiveSnapshot>,
    },
    Emerging {
        reply: oneshot::Sender<Vec<EmergingPattern>>,
    },
    PatternConfidence {
        name: String,
        reply: oneshot::Sender<f64>,
    },
    Candidate {
        name: String,
        reply: oneshot::Sender<Option<CandidateArchetype>>,
    },
    KnownPatterns {
        reply: oneshot::Sender<Vec<KnownPattern>>,
    },
}

/// Background task owning the discoverer
pub struct DiscoveryActor {
    discoverer: ArchetypeDiscoverer,
    receiver: mpsc::Receiver<DiscoveryCommand>,
    shutdown_token: CancellationToken,
}

impl DiscoveryActor {
    async fn run(mut self) {
        info!("Starting discovery actor");

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown_token.cancelled() => {
                    info!("Shutdown signal received, stopping discovery actor");
                    break;
                }
                command = self.receiver.recv() => match command {
                    Some(command) => self.handle(command),
                    None => {
                        debug!("All discovery handles dropped");
                        break;
                    }
                }
            }
        }

        info!(
            observations = self.discoverer.observation_count(),
            "Discovery actor stopped"
        );
    }

    // A dropped reply receiver means the caller gave up; the result is discarded.
    fn handle(&mut self, command: DiscoveryCommand) {
        match command {
            DiscoveryCommand::Analyze { code, context, reply } => {
                let _ = reply.send(self.discoverer.analyze(&code, context));
            }
            DiscoveryCommand::Evaluate { code, context, reply } => {
                let _ = reply.send(self.discoverer.evaluate(&code, context));
            }
            DiscoveryCommand::Commit { evaluation, reply } => {
                let _ = reply.send(self.discoverer.commit(*evaluation));
            }
            DiscoveryCommand::Summary { reply } => {
                let _ = reply.send(self.discoverer.discovery_summary());
            }
            DiscoveryCommand::Insights { reply } => {
                let _ = reply.send(self.discoverer.collective_insights());
            }
            DiscoveryCommand::Emerging { reply } => {
                let _ = reply.send(self.discoverer.emerging_patterns());
            }
            DiscoveryCommand::PatternConfidence { name, reply } => {
                let _ = reply.send(self.discoverer.pattern_confidence(&name));
            }
            DiscoveryCommand::Candidate { name, reply } => {
                let _ = reply.send(self.discoverer.candidate(&name).cloned());
            }
            DiscoveryCommand::KnownPatterns { reply } => {
                let _ = reply.send(self.discoverer.known_patterns());
            }
        }
    }
}

/// Cloneable client of a running [`DiscoveryActor`]
#[derive(Clone)]
pub struct DiscoveryHandle {
    sender: mpsc::Sender<DiscoveryCommand>,
    shutdown_token: CancellationToken,
}

impl DiscoveryHandle {
    /// Moves `discoverer` into a new actor task. Must be called inside a tokio runtime.
    pub fn spawn(discoverer: ArchetypeDiscoverer) -> (Self, JoinHandle<()>) {
        Self::spawn_with_capacity(discoverer, DEFAULT_COMMAND_CAPACITY)
    }

    pub fn spawn_with_capacity(discoverer: ArchetypeDiscoverer, capacity: usize) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let shutdown_token = CancellationToken::new();
        let actor = DiscoveryActor {
            discoverer,
            receiver,
            shutdown_token: shutdown_token.clone(),
        };
        let task = tokio::spawn(actor.run());
        (Self { sender, shutdown_token }, task)
    }

    /// Get a handle to trigger shutdown
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.shutdown_token.is_cancelled() && !self.sender.is_closed()
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> DiscoveryCommand,
    ) -> Result<T, DiscoveryError> {
        if self.shutdown_token.is_cancelled() {
            return Err(DiscoveryError::Unavailable);
        }
        let (reply, response) = oneshot::channel();
        self.sender
            .send(command(reply))
            .await
            .map_err(|_| DiscoveryError::Unavailable)?;
        response.await.map_err(|_| DiscoveryError::Unavailable)
    }
}

#[async_trait]
impl DiscoveryService for DiscoveryHandle {
    async fn analyze(&self, code: &str, context: FragmentContext) -> AnalysisResult {
        let code = code.to_string();
        self.request(|reply| DiscoveryCommand::Analyze { code, context, reply })
            .await
            .unwrap_or_else(AnalysisResult::from_error)
    }

    async fn evaluate(&self, code: &str, context: FragmentContext) -> Result<Evaluation, DiscoveryError> {
        let code = code.to_string();
        self.request(|reply| DiscoveryCommand::Evaluate { code, context, reply })
            .await?
    }

    async fn commit(&self, evaluation: Evaluation) -> Result<AnalysisOutcome, DiscoveryError> {
        self.request(|reply| DiscoveryCommand::Commit {
            evaluation: Box::new(evaluation),
            reply,
        })
        .await
    }

    async fn discovery_summary(&self) -> Result<DiscoverySummary, DiscoveryError> {
        self.request(|reply| DiscoveryCommand::Summary { reply }).await
    }

    async fn collective_insights(&self) -> Result<CollectiveSnapshot, DiscoveryError> {
        self.request(|reply| DiscoveryCommand::Insights { reply }).await
    }

    async fn emerging_patterns(&self) -> Result<Vec<EmergingPattern>, DiscoveryError> {
        self.request(|reply| DiscoveryCommand::Emerging { reply }).await
    }

    async fn pattern_confidence(&self, name: &str) -> Result<f64, DiscoveryError> {
        let name = name.to_string();
        self.request(|reply| DiscoveryCommand::PatternConfidence { name, reply })
            .await
    }

    async fn candidate(&self, name: &str) -> Result<Option<CandidateArchetype>, DiscoveryError> {
        let name = name.to_string();
        self.request(|reply| DiscoveryCommand::Candidate { name, reply }).await
    }

    async fn known_patterns(&self) -> Result<Vec<KnownPattern>, DiscoveryError> {
        self.request(|reply| DiscoveryCommand::KnownPatterns { reply }).await
    }

    async fn shutdown(&self) {
        self.shutdown_token.cancel();
    }
}
