// SPDX-FileCopyrightText: 2026 Squadron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tiered routing: classification, tier walk and fallback.
//!
//! Orchestrates responder selection: classify (bounded retry) > sanitize
//! candidates > walk tiers in order > fallback.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use squadron_config::model::EngineConfig;
use squadron_config::SquadConfig;
use squadron_core::{
    ClassificationCandidate, ClassificationResult, ClassifierAdapter, Request, RouteReason,
    RoutingDecision, SessionContext, SquadronError, TraceEntry, FALLBACK_TIER,
};
use tracing::{debug, info, warn};

/// Startup settings for the router.
#[derive(Debug, Clone, PartialEq)]
pub struct RouterSettings {
    /// Walk tiers with thresholds. When false, the best tiered candidate wins.
    pub hierarchical: bool,
    pub classifier_timeout: Duration,
    /// Retry a failed classification once before falling back.
    pub classifier_retry: bool,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl RouterSettings {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            hierarchical: config.hierarchical,
            classifier_timeout: config.classifier_timeout(),
            classifier_retry: config.classifier_retry,
        }
    }
}

/// Selects a responder for each request by walking the squad's tiers.
pub struct TierRouter {
    squad: Arc<SquadConfig>,
    classifier: Arc<dyn ClassifierAdapter + Send + Sync>,
    settings: RouterSettings,
}

impl TierRouter {
    pub fn new(
        squad: Arc<SquadConfig>,
        classifier: Arc<dyn ClassifierAdapter + Send + Sync>,
        settings: RouterSettings,
    ) -> Self {
        Self {
            squad,
            classifier,
            settings,
        }
    }

    pub fn squad(&self) -> &SquadConfig {
        &self.squad
    }

    pub fn settings(&self) -> &RouterSettings {
        &self.settings
    }

    /// Route a request to a responder.
    ///
    /// Never fails: classifier failure after the bounded retry routes to the
    /// fallback with [`RouteReason::ClassifierUnavailable`].
    pub async fn route(&self, request: &Request, context: &SessionContext) -> RoutingDecision {
        match self.classify(request, context).await {
            Ok(result) => self.decide(&result),
            Err(e) => {
                warn!(
                    session_id = %context.session_id,
                    fallback = %self.squad.fallback_id(),
                    error = %e,
                    "classifier unavailable, routing to fallback"
                );
                self.fallback_decision(RouteReason::ClassifierUnavailable, Vec::new())
            }
        }
    }

    async fn classify(
        &self,
        request: &Request,
        context: &SessionContext,
    ) -> Result<ClassificationResult, SquadronError> {
        let attempts = if self.settings.classifier_retry { 2 } else { 1 };
        let timeout = self.settings.classifier_timeout;
        let mut last_error = None;

        for attempt in 1..=attempts {
            let call = self.classifier.classify(&request.text, context);
            match tokio::time::timeout(timeout, call).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => {
                    debug!(attempt, error = %e, "classification attempt failed");
                    last_error = Some(e);
                }
                Err(_) => {
                    debug!(attempt, timeout_ms = timeout.as_millis() as u64, "classification attempt timed out");
                    last_error = Some(SquadronError::Timeout { duration: timeout });
                }
            }
        }

        Err(SquadronError::ClassificationUnavailable {
            message: format!("classifier failed after {attempts} attempt(s)"),
            source: last_error.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
        })
    }

    /// Turn a classification result into a decision. Pure and total.
    pub fn decide(&self, result: &ClassificationResult) -> RoutingDecision {
        let scores = self.sanitize(result);
        if self.settings.hierarchical {
            self.walk_tiers(&scores)
        } else {
            self.flat_select(&scores)
        }
    }

    /// Keep only candidates for tiered responders, with confidences forced
    /// into [0, 1]. Duplicates keep their highest score.
    fn sanitize(&self, result: &ClassificationResult) -> HashMap<String, ClassificationCandidate> {
        let mut scores: HashMap<String, ClassificationCandidate> = HashMap::new();

        for candidate in result.candidates() {
            if self.squad.tier_of(&candidate.responder_id).is_none() {
                debug!(
                    responder = %candidate.responder_id,
                    "ignoring candidate for responder outside every tier"
                );
                continue;
            }

            let confidence = if candidate.confidence.is_finite() {
                candidate.confidence.clamp(0.0, 1.0)
            } else {
                0.0
            };
            let sanitized = ClassificationCandidate {
                confidence,
                ..candidate.clone()
            };

            match scores.get(&candidate.responder_id) {
                Some(existing) if existing.confidence >= confidence => {}
                _ => {
                    scores.insert(candidate.responder_id.clone(), sanitized);
                }
            }
        }

        scores
    }

    fn walk_tiers(&self, scores: &HashMap<String, ClassificationCandidate>) -> RoutingDecision {
        let mut trace = Vec::with_capacity(self.squad.tiers().len());

        for tier in self.squad.tiers() {
            let best = best_member(&tier.members, scores);
            let threshold_met = best.is_some_and(|c| c.confidence >= tier.confidence_threshold);

            debug!(
                tier = %tier.name,
                threshold = tier.confidence_threshold,
                candidate = best.map(|c| c.responder_id.as_str()).unwrap_or("-"),
                confidence = best.map(|c| c.confidence).unwrap_or(0.0),
                threshold_met,
                "tier evaluated"
            );

            trace.push(TraceEntry {
                tier_name: tier.name.clone(),
                candidate: best.cloned(),
                threshold: tier.confidence_threshold,
                threshold_met,
            });

            if let (true, Some(selected)) = (threshold_met, best) {
                info!(
                    responder = %selected.responder_id,
                    tier = %tier.name,
                    confidence = selected.confidence,
                    "routed to tier member"
                );
                return RoutingDecision {
                    selected_responder_id: selected.responder_id.clone(),
                    tier_name: tier.name.clone(),
                    tier_kind: Some(tier.kind),
                    confidence: selected.confidence,
                    reason: RouteReason::TierMatch,
                    trace,
                };
            }
        }

        info!(
            fallback = %self.squad.fallback_id(),
            tiers_evaluated = trace.len(),
            "no tier met its threshold, routing to fallback"
        );
        self.fallback_decision(RouteReason::NoMatchingTier, trace)
    }

    /// Best tiered candidate overall, thresholds ignored. Ties resolve by
    /// tier order, then member declaration order.
    fn flat_select(&self, scores: &HashMap<String, ClassificationCandidate>) -> RoutingDecision {
        let mut trace = Vec::with_capacity(self.squad.tiers().len());
        let mut selected: Option<(usize, &ClassificationCandidate)> = None;

        for (index, tier) in self.squad.tiers().iter().enumerate() {
            let best = best_member(&tier.members, scores);
            if let Some(candidate) = best {
                if selected.is_none_or(|(_, s)| candidate.confidence > s.confidence) {
                    selected = Some((index, candidate));
                }
            }
            trace.push(TraceEntry {
                tier_name: tier.name.clone(),
                candidate: best.cloned(),
                threshold: tier.confidence_threshold,
                threshold_met: false,
            });
        }

        let Some((index, candidate)) = selected else {
            info!(
                fallback = %self.squad.fallback_id(),
                "no tiered candidate, routing to fallback"
            );
            return self.fallback_decision(RouteReason::NoMatchingTier, trace);
        };

        trace[index].threshold_met = true;
        let tier = &self.squad.tiers()[index];
        info!(
            responder = %candidate.responder_id,
            tier = %tier.name,
            confidence = candidate.confidence,
            "flat routing selected best candidate"
        );

        RoutingDecision {
            selected_responder_id: candidate.responder_id.clone(),
            tier_name: tier.name.clone(),
            tier_kind: Some(tier.kind),
            confidence: candidate.confidence,
            reason: RouteReason::FlatSelection,
            trace,
        }
    }

    fn fallback_decision(&self, reason: RouteReason, trace: Vec<TraceEntry>) -> RoutingDecision {
        RoutingDecision {
            selected_responder_id: self.squad.fallback_id().to_string(),
            tier_name: FALLBACK_TIER.to_string(),
            tier_kind: None,
            confidence: 0.0,
            reason,
            trace,
        }
    }
}

/// Highest-scoring member, first declared wins ties.
fn best_member<'a>(
    members: &[String],
    scores: &'a HashMap<String, ClassificationCandidate>,
) -> Option<&'a ClassificationCandidate> {
    let mut best: Option<&ClassificationCandidate> = None;
    for member in members {
        if let Some(candidate) = scores.get(member) {
            if best.is_none_or(|b| candidate.confidence > b.confidence) {
                best = Some(candidate);
            }
        }
    }
    best
}
