// SPDX-FileCopyrightText: 2026 Squadron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fan-out coordination for coordinator-tier decisions.
//!
//! A coordination job moves through: Idle -> Dispatching -> AwaitingResponses
//! -> Synthesizing -> Complete, or Failed when the synthesis call fails.
//! Target failures never abort their siblings; they are reported to the
//! coordinator in the synthesis bundle and mark the response degraded.

use std::sync::Arc;
use std::time::Duration;

use squadron_config::model::FanOutConfig;
use squadron_config::SquadConfig;
use squadron_core::{
    InvocationContext, Request, ResponderAdapter, RoutingDecision, SessionContext,
    SpecialistInput, SquadronError, SynthesisBundle, TargetFailure, TargetOutcome, TargetStatus,
};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// States of a coordination job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    /// Spawning one invocation task per target.
    Dispatching,
    /// Collecting outcomes until all settle or the deadline passes.
    AwaitingResponses,
    /// The coordinator is combining the partial results.
    Synthesizing,
    Complete,
    Failed,
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobState::Idle => write!(f, "idle"),
            JobState::Dispatching => write!(f, "dispatching"),
            JobState::AwaitingResponses => write!(f, "awaiting_responses"),
            JobState::Synthesizing => write!(f, "synthesizing"),
            JobState::Complete => write!(f, "complete"),
            JobState::Failed => write!(f, "failed"),
        }
    }
}

/// Timeouts and limits for fan-out.
#[derive(Debug, Clone, PartialEq)]
pub struct FanOutSettings {
    pub target_timeout: Duration,
    /// Aggregate deadline across all targets.
    pub deadline: Duration,
    pub synthesis_timeout: Duration,
    pub max_concurrency: usize,
}

impl Default for FanOutSettings {
    fn default() -> Self {
        Self::from_config(&FanOutConfig::default())
    }
}

impl FanOutSettings {
    pub fn from_config(config: &FanOutConfig) -> Self {
        Self {
            target_timeout: config.target_timeout(),
            deadline: config.deadline(),
            synthesis_timeout: config.synthesis_timeout(),
            max_concurrency: config.max_concurrency.max(1),
        }
    }
}

/// Result of a completed coordination job.
#[derive(Debug, Clone)]
pub struct CoordinatedResponse {
    pub coordinator_id: String,
    /// The coordinator's synthesized text.
    pub text: String,
    /// One outcome per target, in target order.
    pub outcomes: Vec<TargetOutcome>,
    /// What the coordinator was given to synthesize from.
    pub synthesis: SynthesisBundle,
    /// True when at least one target did not succeed.
    pub degraded: bool,
    pub deadline_elapsed: bool,
    pub state: JobState,
}

/// Runs fan-out jobs against the squad's coordinator target lists.
pub struct FanOutCoordinator {
    squad: Arc<SquadConfig>,
    responders: Arc<dyn ResponderAdapter + Send + Sync>,
    settings: FanOutSettings,
}

struct Job<'a> {
    coordinator_id: &'a str,
    state: JobState,
}

impl Job<'_> {
    fn advance(&mut self, next: JobState) {
        debug!(
            coordinator = self.coordinator_id,
            from = %self.state,
            to = %next,
            "coordination state change"
        );
        self.state = next;
    }
}

impl FanOutCoordinator {
    pub fn new(
        squad: Arc<SquadConfig>,
        responders: Arc<dyn ResponderAdapter + Send + Sync>,
        settings: FanOutSettings,
    ) -> Self {
        Self {
            squad,
            responders,
            settings,
        }
    }

    pub fn settings(&self) -> &FanOutSettings {
        &self.settings
    }

    /// Fan a request out to the selected coordinator's targets and synthesize.
    ///
    /// Returns `SynthesisFailed` only when the coordinator's own synthesis
    /// call fails or times out. Zero successful targets still synthesize.
    pub async fn coordinate(
        &self,
        decision: &RoutingDecision,
        request: &Request,
        session: &SessionContext,
    ) -> Result<CoordinatedResponse, SquadronError> {
        let coordinator_id = decision.selected_responder_id.as_str();
        let targets = self
            .squad
            .fan_out_targets(coordinator_id)
            .ok_or_else(|| SquadronError::UnknownResponder(coordinator_id.to_string()))?;

        let mut job = Job {
            coordinator_id,
            state: JobState::Idle,
        };

        job.advance(JobState::Dispatching);
        let cancel = CancellationToken::new();
        let mut tasks = self.dispatch(targets, request, session, &cancel);

        job.advance(JobState::AwaitingResponses);
        let mut outcomes: Vec<TargetOutcome> =
            targets.iter().map(TargetOutcome::pending).collect();
        let deadline_elapsed = self.await_outcomes(&mut tasks, &mut outcomes, &cancel).await;

        for outcome in outcomes.iter_mut().filter(|o| o.status == TargetStatus::Pending) {
            if deadline_elapsed {
                outcome.status = TargetStatus::Timeout;
                outcome.detail = Some("aggregate deadline elapsed".to_string());
            } else {
                outcome.status = TargetStatus::Error;
                outcome.detail = Some("invocation task ended without a result".to_string());
            }
        }

        for outcome in outcomes.iter().filter(|o| !o.is_success()) {
            warn!(
                coordinator = coordinator_id,
                responder = %outcome.responder_id,
                status = %outcome.status,
                detail = outcome.detail.as_deref().unwrap_or(""),
                "fan-out target did not contribute"
            );
        }

        let synthesis = self.bundle(request, &outcomes);
        let degraded = !synthesis.failures.is_empty();
        info!(
            coordinator = coordinator_id,
            succeeded = synthesis.inputs.len(),
            failed = synthesis.failures.len(),
            deadline_elapsed,
            "fan-out settled"
        );

        job.advance(JobState::Synthesizing);
        let context = InvocationContext::new(session.clone(), request.response_mode)
            .with_synthesis(synthesis.clone());
        let call = self
            .responders
            .invoke(coordinator_id, &request.text, &context);
        let result = tokio::time::timeout(self.settings.synthesis_timeout, call).await;

        let failure = match result {
            Ok(Ok(text)) => {
                job.advance(JobState::Complete);
                if degraded {
                    warn!(
                        coordinator = coordinator_id,
                        failed = synthesis.failures.len(),
                        "coordinated response is degraded"
                    );
                }
                return Ok(CoordinatedResponse {
                    coordinator_id: coordinator_id.to_string(),
                    text,
                    outcomes,
                    synthesis,
                    degraded,
                    deadline_elapsed,
                    state: job.state,
                });
            }
            Ok(Err(e)) => e.to_string(),
            Err(_) => {
                context.cancel.cancel();
                format!(
                    "synthesis timed out after {}ms",
                    self.settings.synthesis_timeout.as_millis()
                )
            }
        };

        job.advance(JobState::Failed);
        error!(
            coordinator = coordinator_id,
            error = %failure,
            "coordinator synthesis failed"
        );
        Err(SquadronError::SynthesisFailed {
            coordinator_id: coordinator_id.to_string(),
            message: failure,
        })
    }

    /// Spawn one task per target. Tasks return their target index with the outcome.
    fn dispatch(
        &self,
        targets: &[String],
        request: &Request,
        session: &SessionContext,
        cancel: &CancellationToken,
    ) -> JoinSet<(usize, TargetOutcome)> {
        let permits = Arc::new(Semaphore::new(self.settings.max_concurrency));
        let mut tasks = JoinSet::new();

        for (index, target) in targets.iter().enumerate() {
            let responders = self.responders.clone();
            let permits = permits.clone();
            let target = target.clone();
            let text = request.text.clone();
            let timeout = self.settings.target_timeout;
            let context = InvocationContext::new(session.clone(), request.response_mode)
                .with_cancel(cancel.child_token());

            tasks.spawn(async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    return (index, errored(&target, "concurrency limiter closed"));
                };
                let result =
                    tokio::time::timeout(timeout, responders.invoke(&target, &text, &context))
                        .await;
                let outcome = match result {
                    Ok(Ok(payload)) => TargetOutcome {
                        responder_id: target,
                        status: TargetStatus::Success,
                        payload: Some(payload),
                        detail: None,
                    },
                    Ok(Err(e)) => errored(&target, &e.to_string()),
                    Err(_) => TargetOutcome {
                        detail: Some(format!("timed out after {}ms", timeout.as_millis())),
                        status: TargetStatus::Timeout,
                        ..TargetOutcome::pending(target)
                    },
                };
                (index, outcome)
            });
        }

        tasks
    }

    /// Collect outcomes until every task settles or the aggregate deadline
    /// passes. Returns whether the deadline cut collection short.
    async fn await_outcomes(
        &self,
        tasks: &mut JoinSet<(usize, TargetOutcome)>,
        outcomes: &mut [TargetOutcome],
        cancel: &CancellationToken,
    ) -> bool {
        let deadline = tokio::time::sleep(self.settings.deadline);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                biased;
                joined = tasks.join_next() => match joined {
                    Some(Ok((index, outcome))) => {
                        debug!(responder = %outcome.responder_id, status = %outcome.status, "fan-out target settled");
                        outcomes[index] = outcome;
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "fan-out task did not complete");
                    }
                    None => return false,
                },
                () = &mut deadline => {
                    let pending = outcomes.iter().filter(|o| o.status == TargetStatus::Pending).count();
                    info!(pending, "aggregate deadline elapsed, cancelling pending targets");
                    cancel.cancel();
                    tasks.abort_all();
                    return true;
                }
            }
        }
    }

    fn bundle(&self, request: &Request, outcomes: &[TargetOutcome]) -> SynthesisBundle {
        let mut inputs = Vec::new();
        let mut failures = Vec::new();

        for outcome in outcomes {
            match (&outcome.status, &outcome.payload) {
                (TargetStatus::Success, Some(payload)) => inputs.push(SpecialistInput {
                    responder_id: outcome.responder_id.clone(),
                    display_name: self.squad.display_name(&outcome.responder_id).to_string(),
                    text: payload.clone(),
                }),
                _ => failures.push(TargetFailure {
                    responder_id: outcome.responder_id.clone(),
                    status: outcome.status,
                    detail: outcome.detail.clone().unwrap_or_default(),
                }),
            }
        }

        SynthesisBundle {
            request_text: request.text.clone(),
            inputs,
            failures,
        }
    }
}

fn errored(target: &str, detail: &str) -> TargetOutcome {
    TargetOutcome {
        status: TargetStatus::Error,
        detail: Some(detail.to_string()),
        ..TargetOutcome::pending(target)
    }
}
