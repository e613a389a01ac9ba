// SPDX-FileCopyrightText: 2026 Squadron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the routing engine, the coordinator and the ports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tokio_util::sync::CancellationToken;

/// Tier name reported when no tier produced a selection.
pub const FALLBACK_TIER: &str = "fallback";

/// Result of an adapter health probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    /// Answering, but slow or partially failing.
    Degraded(String),
    Unhealthy(String),
}

/// Identifies the kind of port an adapter implements.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Classifier,
    Responder,
}

/// The role a responder plays in the squad.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResponderKind {
    /// Answers directly.
    Specialist,
    /// Fans out to specialists and synthesizes their outputs.
    Coordinator,
    /// Always-eligible responder used when no tier matches.
    Fallback,
}

/// The kind of a routing tier. Fallback is never a tier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TierKind {
    Specialist,
    Coordinator,
}

impl TierKind {
    /// The responder kind every member of a tier of this kind must have.
    pub fn member_kind(self) -> ResponderKind {
        match self {
            TierKind::Specialist => ResponderKind::Specialist,
            TierKind::Coordinator => ResponderKind::Coordinator,
        }
    }
}

/// How the caller intends to present the response.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResponseMode {
    #[default]
    Text,
    /// Rendered on a screen; structured output is welcome.
    Display,
    /// Spoken aloud; responders should avoid markup.
    Voice,
}

/// An incoming request to be routed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub text: String,
    #[serde(default)]
    pub response_mode: ResponseMode,
}

impl Request {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            response_mode: ResponseMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: ResponseMode) -> Self {
        self.response_mode = mode;
        self
    }
}

/// One scored candidate returned by the classification port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationCandidate {
    pub responder_id: String,
    /// Normalized suitability score in `[0, 1]`.
    pub confidence: f64,
    /// Free text, advisory only.
    pub rationale: String,
}

impl ClassificationCandidate {
    pub fn new(responder_id: impl Into<String>, confidence: f64) -> Self {
        Self {
            responder_id: responder_id.into(),
            confidence,
            rationale: String::new(),
        }
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = rationale.into();
        self
    }
}

/// Ranked classification output, ordered by descending confidence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    candidates: Vec<ClassificationCandidate>,
}

impl ClassificationResult {
    /// Build a result from candidates in any order.
    ///
    /// The sort is stable, so candidates with equal confidence keep the
    /// order the classifier produced them in. Non-finite confidences sort last.
    pub fn from_candidates(mut candidates: Vec<ClassificationCandidate>) -> Self {
        candidates.sort_by(|a, b| {
            let a = if a.confidence.is_finite() { a.confidence } else { f64::NEG_INFINITY };
            let b = if b.confidence.is_finite() { b.confidence } else { f64::NEG_INFINITY };
            b.total_cmp(&a)
        });
        Self { candidates }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn candidates(&self) -> &[ClassificationCandidate] {
        &self.candidates
    }

    pub fn top(&self) -> Option<&ClassificationCandidate> {
        self.candidates.first()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Why the engine selected the responder it did.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RouteReason {
    /// A tier's best candidate met the tier threshold.
    TierMatch,
    /// Flat routing picked the overall best candidate.
    FlatSelection,
    /// No tier produced a selection.
    NoMatchingTier,
    /// The classifier failed after its bounded retry.
    ClassifierUnavailable,
}

/// Evaluation record for a single tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub tier_name: String,
    /// Best candidate considered in this tier, if any member was scored.
    pub candidate: Option<ClassificationCandidate>,
    pub threshold: f64,
    pub threshold_met: bool,
}

/// The outcome of routing a single request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub selected_responder_id: String,
    /// Name of the tier that produced the selection, or [`FALLBACK_TIER`].
    pub tier_name: String,
    /// Kind of the selecting tier; `None` for the fallback path.
    pub tier_kind: Option<TierKind>,
    pub confidence: f64,
    pub reason: RouteReason,
    pub trace: Vec<TraceEntry>,
}

impl RoutingDecision {
    pub fn is_fallback(&self) -> bool {
        self.tier_kind.is_none()
    }

    /// Whether the selection came from a coordinator tier and needs fan-out.
    pub fn is_coordinator(&self) -> bool {
        self.tier_kind == Some(TierKind::Coordinator)
    }

    /// Compact form persisted into session continuity.
    pub fn summary(&self, at: DateTime<Utc>) -> DecisionSummary {
        DecisionSummary {
            responder_id: self.selected_responder_id.clone(),
            tier_name: self.tier_name.clone(),
            confidence: self.confidence,
            reason: self.reason,
            timestamp: at,
        }
    }
}

/// A past routing decision as remembered by the session tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionSummary {
    pub responder_id: String,
    pub tier_name: String,
    pub confidence: f64,
    pub reason: RouteReason,
    pub timestamp: DateTime<Utc>,
}

/// A recorded transition of a session from one responder to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handoff {
    pub from: String,
    pub to: String,
    pub at: DateTime<Utc>,
}

/// Bounded session summary handed to the classifier and responders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    pub session_id: String,
    /// Most recent decisions, oldest first.
    pub recent: Vec<DecisionSummary>,
    pub handoff_count: usize,
}

impl SessionContext {
    pub fn empty(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            recent: Vec::new(),
            handoff_count: 0,
        }
    }

    pub fn last_decision(&self) -> Option<&DecisionSummary> {
        self.recent.last()
    }

    pub fn last_responder(&self) -> Option<&str> {
        self.last_decision().map(|d| d.responder_id.as_str())
    }
}

/// Settlement state of one fan-out target.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TargetStatus {
    Pending,
    Success,
    Timeout,
    Error,
}

/// Result of invoking one fan-out target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetOutcome {
    pub responder_id: String,
    pub status: TargetStatus,
    pub payload: Option<String>,
    pub detail: Option<String>,
}

impl TargetOutcome {
    pub fn pending(responder_id: impl Into<String>) -> Self {
        Self {
            responder_id: responder_id.into(),
            status: TargetStatus::Pending,
            payload: None,
            detail: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == TargetStatus::Success
    }
}

/// A successful specialist contribution passed to synthesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialistInput {
    pub responder_id: String,
    pub display_name: String,
    pub text: String,
}

/// A specialist that did not contribute, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetFailure {
    pub responder_id: String,
    pub status: TargetStatus,
    pub detail: String,
}

/// Structured partial-results bundle handed to the coordinator for synthesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisBundle {
    pub request_text: String,
    pub inputs: Vec<SpecialistInput>,
    pub failures: Vec<TargetFailure>,
}

impl SynthesisBundle {
    /// True when no specialist contributed; the coordinator must say so.
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Context bundle passed with every responder invocation.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    pub session: SessionContext,
    pub response_mode: ResponseMode,
    /// Present only on the coordinator's synthesis call.
    pub synthesis: Option<SynthesisBundle>,
    /// Cancelled when the caller stops waiting. Honoring it is best-effort.
    pub cancel: CancellationToken,
}

impl InvocationContext {
    pub fn new(session: SessionContext, response_mode: ResponseMode) -> Self {
        Self {
            session,
            response_mode,
            synthesis: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_synthesis(mut self, bundle: SynthesisBundle) -> Self {
        self.synthesis = Some(bundle);
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn classification_result_sorts_descending_and_stable() {
        let result = ClassificationResult::from_candidates(vec![
            ClassificationCandidate::new("a", 0.2),
            ClassificationCandidate::new("b", 0.9),
            ClassificationCandidate::new("c", 0.9),
            ClassificationCandidate::new("d", f64::NAN),
        ]);
        let ids: Vec<&str> = result
            .candidates()
            .iter()
            .map(|c| c.responder_id.as_str())
            .collect();
        assert_eq!(ids, vec!["b", "c", "a", "d"]);
        assert_eq!(result.top().unwrap().responder_id, "b");
    }

    #[test]
    fn kinds_parse_from_snake_case() {
        assert_eq!(
            ResponderKind::from_str("coordinator").unwrap(),
            ResponderKind::Coordinator
        );
        assert_eq!(TierKind::Specialist.to_string(), "specialist");
        assert_eq!(RouteReason::ClassifierUnavailable.to_string(), "classifier_unavailable");
        assert_eq!(TierKind::Coordinator.member_kind(), ResponderKind::Coordinator);
    }

    #[test]
    fn decision_kind_helpers() {
        let decision = RoutingDecision {
            selected_responder_id: "fb".into(),
            tier_name: FALLBACK_TIER.into(),
            tier_kind: None,
            confidence: 0.0,
            reason: RouteReason::NoMatchingTier,
            trace: vec![],
        };
        assert!(decision.is_fallback());
        assert!(!decision.is_coordinator());
    }

    #[test]
    fn session_context_last_responder() {
        let mut ctx = SessionContext::empty("s1");
        assert!(ctx.last_responder().is_none());
        ctx.recent.push(DecisionSummary {
            responder_id: "risk".into(),
            tier_name: "specialists".into(),
            confidence: 0.9,
            reason: RouteReason::TierMatch,
            timestamp: Utc::now(),
        });
        assert_eq!(ctx.last_responder(), Some("risk"));
    }

    #[test]
    fn synthesis_bundle_serializes_failures() {
        let bundle = SynthesisBundle {
            request_text: "q".into(),
            inputs: vec![],
            failures: vec![TargetFailure {
                responder_id: "c".into(),
                status: TargetStatus::Timeout,
                detail: "deadline".into(),
            }],
        };
        assert!(bundle.is_empty());
        let json = bundle.to_json();
        assert_eq!(json["failures"][0]["status"], "timeout");
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn from_candidates_is_non_increasing(scores in proptest::collection::vec(0.0f64..=1.0, 0..16)) {
                let result = ClassificationResult::from_candidates(
                    scores.iter().enumerate()
                        .map(|(i, s)| ClassificationCandidate::new(format!("r{i}"), *s))
                        .collect(),
                );
                for pair in result.candidates().windows(2) {
                    prop_assert!(pair[0].confidence >= pair[1].confidence);
                }
            }
        }
    }
}
