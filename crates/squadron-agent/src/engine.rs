// SPDX-FileCopyrightText: 2026 Squadron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The request-handling entry point.
//!
//! `SquadEngine::handle` serializes work per session, routes, invokes the
//! selected responder (or fans out through its coordinator) and records the
//! decision in the session's history.

use std::sync::Arc;
use std::time::Duration;

use squadron_config::{SquadConfig, SquadronConfig};
use squadron_core::{
    ClassifierAdapter, InvocationContext, PluginAdapter, Request, ResponderAdapter, RoutingDecision,
    SessionContext, SquadronError, TargetOutcome, TraceEntry,
};
use squadron_router::{RouterSettings, TierRouter};
use tracing::{info, warn};

use crate::coordinator::{FanOutCoordinator, FanOutSettings};
use crate::session::SessionTracker;

/// The answer to a request.
#[derive(Debug, Clone)]
pub struct FinalResponse {
    pub text: String,
    /// Responder that produced `text`. Differs from the decision when the
    /// selected responder failed and the fallback answered instead.
    pub responder_id: String,
    pub decision: RoutingDecision,
    /// Partial fan-out failure, or fallback after a failed invocation.
    pub degraded: bool,
    /// Per-target outcomes when a coordinator fanned out.
    pub fan_out: Option<Vec<TargetOutcome>>,
}

impl FinalResponse {
    pub fn tier_name(&self) -> &str {
        &self.decision.tier_name
    }

    pub fn trace(&self) -> &[TraceEntry] {
        &self.decision.trace
    }
}

/// Routing engine, fan-out coordinator and session tracker wired together.
pub struct SquadEngine {
    squad: Arc<SquadConfig>,
    router: TierRouter,
    coordinator: FanOutCoordinator,
    sessions: SessionTracker,
    responders: Arc<dyn ResponderAdapter + Send + Sync>,
    invocation_timeout: Duration,
}

impl SquadEngine {
    pub fn new(
        squad: Arc<SquadConfig>,
        settings: &SquadronConfig,
        classifier: Arc<dyn ClassifierAdapter + Send + Sync>,
        responders: Arc<dyn ResponderAdapter + Send + Sync>,
    ) -> Self {
        let classifier_name = classifier.name().to_string();
        let router = TierRouter::new(
            squad.clone(),
            classifier,
            RouterSettings::from_config(&settings.engine),
        );
        let coordinator = FanOutCoordinator::new(
            squad.clone(),
            responders.clone(),
            FanOutSettings::from_config(&settings.fanout),
        );

        info!(
            squad = squad.name(),
            tiers = squad.tiers().len(),
            responders = squad.responders().len(),
            hierarchical = settings.engine.hierarchical,
            classifier = %classifier_name,
            responders_adapter = responders.name(),
            "squad engine initialized"
        );

        Self {
            squad,
            router,
            coordinator,
            sessions: SessionTracker::new(settings.session.context_window),
            responders,
            invocation_timeout: settings.invocation.timeout(),
        }
    }

    pub fn squad(&self) -> &SquadConfig {
        &self.squad
    }

    pub fn router(&self) -> &TierRouter {
        &self.router
    }

    pub fn sessions(&self) -> &SessionTracker {
        &self.sessions
    }

    /// Handle one request for a session.
    ///
    /// Requests on the same session run one at a time in arrival order.
    /// The decision is recorded whether or not the invocation succeeds.
    pub async fn handle(
        &self,
        request: Request,
        session_id: &str,
    ) -> Result<FinalResponse, SquadronError> {
        let mut session = self.sessions.lock_session(session_id).await;
        let context = session.context();

        let decision = self.router.route(&request, &context).await;
        let result = if decision.is_coordinator() {
            self.coordinate(&decision, &request, &context).await
        } else {
            self.invoke_selected(&decision, &request, &context).await
        };

        session.record_decision(&decision);
        result
    }

    async fn coordinate(
        &self,
        decision: &RoutingDecision,
        request: &Request,
        context: &SessionContext,
    ) -> Result<FinalResponse, SquadronError> {
        let coordinated = self.coordinator.coordinate(decision, request, context).await?;
        Ok(FinalResponse {
            text: coordinated.text,
            responder_id: coordinated.coordinator_id,
            decision: decision.clone(),
            degraded: coordinated.degraded,
            fan_out: Some(coordinated.outcomes),
        })
    }

    /// Invoke a specialist or the fallback. A failed specialist is retried
    /// once on the fallback responder.
    async fn invoke_selected(
        &self,
        decision: &RoutingDecision,
        request: &Request,
        context: &SessionContext,
    ) -> Result<FinalResponse, SquadronError> {
        let selected = decision.selected_responder_id.as_str();
        let error = match self.invoke(selected, request, context).await {
            Ok(text) => {
                return Ok(FinalResponse {
                    text,
                    responder_id: selected.to_string(),
                    decision: decision.clone(),
                    degraded: false,
                    fan_out: None,
                });
            }
            Err(e) => e,
        };

        let fallback = self.squad.fallback_id();
        if selected == fallback {
            return Err(SquadronError::ResponderUnavailable {
                responder_id: fallback.to_string(),
                message: error.to_string(),
            });
        }

        warn!(
            session_id = %context.session_id,
            responder = selected,
            fallback,
            error = %error,
            "responder failed, retrying on fallback"
        );

        match self.invoke(fallback, request, context).await {
            Ok(text) => Ok(FinalResponse {
                text,
                responder_id: fallback.to_string(),
                decision: decision.clone(),
                degraded: true,
                fan_out: None,
            }),
            Err(e) => Err(SquadronError::ResponderUnavailable {
                responder_id: fallback.to_string(),
                message: format!("{selected}: {error}; {fallback}: {e}"),
            }),
        }
    }

    async fn invoke(
        &self,
        responder_id: &str,
        request: &Request,
        context: &SessionContext,
    ) -> Result<String, SquadronError> {
        let invocation = InvocationContext::new(context.clone(), request.response_mode);
        let call = self.responders.invoke(responder_id, &request.text, &invocation);
        match tokio::time::timeout(self.invocation_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                invocation.cancel.cancel();
                Err(SquadronError::InvocationTimeout {
                    responder_id: responder_id.to_string(),
                    duration: self.invocation_timeout,
                })
            }
        }
    }
}
