// SPDX-FileCopyrightText: 2026 Squadron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for request handling through the squad engine.

use std::sync::Arc;
use std::time::Duration;

use squadron_core::{
    Request, ResponseMode, RouteReason, SquadronError, TargetStatus, FALLBACK_TIER,
};
use squadron_test_utils::{
    ClassifierStep, MockClassifier, MockResponder, ResponderBehavior, TestHarness,
};

const SQUAD: &str = r#"
[fanout]
target_timeout_ms = 10000
deadline_ms = 5000
synthesis_timeout_ms = 3000

[invocation]
timeout_ms = 2000

[session]
context_window = 2

[squad]
name = "grc-squad"

[[squad.responders]]
id = "compliance_specialist"
kind = "specialist"

[[squad.responders]]
id = "risk_specialist"
kind = "specialist"

[[squad.responders]]
id = "privacy_specialist"
kind = "specialist"

[[squad.responders]]
id = "coordinator_default"
kind = "coordinator"

[[squad.responders]]
id = "general_fallback"
kind = "fallback"

[[squad.tiers]]
name = "specialists"
kind = "specialist"
confidence_threshold = 0.8
members = ["compliance_specialist", "risk_specialist", "privacy_specialist"]

[[squad.tiers]]
name = "coordinators"
kind = "coordinator"
confidence_threshold = 0.6
members = ["coordinator_default"]

[squad.fallback]
responder = "general_fallback"
"#;

fn harness(classifier: MockClassifier, responder: MockResponder) -> TestHarness {
    TestHarness::builder(SQUAD)
        .with_classifier(classifier)
        .with_responder(responder)
        .build()
        .expect("test squad builds")
}

#[tokio::test]
async fn specialist_answers_directly() {
    let h = harness(
        MockClassifier::returning(&[("compliance_specialist", 0.95)]),
        MockResponder::new(),
    );
    let response = h.send("Are we SOC 2 compliant?", "s1").await.unwrap();

    assert_eq!(response.responder_id, "compliance_specialist");
    assert_eq!(response.tier_name(), "specialists");
    assert_eq!(response.text, "compliance_specialist reply");
    assert!(!response.degraded);
    assert!(response.fan_out.is_none());
}

#[tokio::test(start_paused = true)]
async fn coordinator_fans_out_and_synthesizes() {
    let h = harness(
        MockClassifier::returning(&[("coordinator_default", 0.60)]),
        MockResponder::new(),
    );
    let response = h.send("Assess our vendor program", "s1").await.unwrap();

    assert_eq!(response.responder_id, "coordinator_default");
    assert_eq!(response.tier_name(), "coordinators");
    assert_eq!(
        response.text,
        "coordinator_default synthesized: compliance_specialist, risk_specialist, privacy_specialist"
    );
    assert_eq!(response.fan_out.as_ref().unwrap().len(), 3);
    assert_eq!(response.trace().len(), 2);
}

#[tokio::test]
async fn no_match_routes_to_fallback() {
    let h = harness(
        MockClassifier::returning(&[
            ("compliance_specialist", 0.3),
            ("risk_specialist", 0.3),
            ("coordinator_default", 0.3),
        ]),
        MockResponder::new(),
    );
    let response = h.send("what's for lunch", "s1").await.unwrap();

    assert_eq!(response.responder_id, "general_fallback");
    assert_eq!(response.tier_name(), FALLBACK_TIER);
    assert_eq!(response.decision.reason, RouteReason::NoMatchingTier);
    assert!(!response.degraded);
}

#[tokio::test(start_paused = true)]
async fn slow_target_past_deadline_degrades_response() {
    let h = harness(
        MockClassifier::returning(&[("coordinator_default", 0.7)]),
        MockResponder::new().with(
            "privacy_specialist",
            ResponderBehavior::Delay(Duration::from_secs(8), "too late".into()),
        ),
    );
    let response = h.send("full review please", "s1").await.unwrap();

    assert!(response.degraded);
    let outcomes = response.fan_out.unwrap();
    let privacy = outcomes
        .iter()
        .find(|o| o.responder_id == "privacy_specialist")
        .unwrap();
    assert_eq!(privacy.status, TargetStatus::Timeout);

    let bundle = h.responder.last_synthesis().await.unwrap();
    assert_eq!(bundle.inputs.len(), 2);
    assert_eq!(bundle.failures[0].responder_id, "privacy_specialist");
    assert_eq!(
        response.text,
        "coordinator_default synthesized: compliance_specialist, risk_specialist"
    );
}

#[tokio::test(start_paused = true)]
async fn all_targets_failing_is_degraded_but_complete() {
    let h = harness(
        MockClassifier::returning(&[("coordinator_default", 0.7)]),
        MockResponder::new()
            .with("compliance_specialist", ResponderBehavior::Fail("x".into()))
            .with("risk_specialist", ResponderBehavior::Fail("x".into()))
            .with("privacy_specialist", ResponderBehavior::Fail("x".into())),
    );
    let response = h.send("full review please", "s1").await.unwrap();

    assert!(response.degraded);
    assert_eq!(response.text, "coordinator_default: no expert input could be gathered");
}

#[tokio::test(start_paused = true)]
async fn synthesis_failure_surfaces_but_decision_is_recorded() {
    let h = harness(
        MockClassifier::returning(&[("coordinator_default", 0.7)]),
        MockResponder::new().with("coordinator_default", ResponderBehavior::Fail("boom".into())),
    );
    let err = h.send("full review please", "s1").await.unwrap_err();

    assert!(matches!(err, SquadronError::SynthesisFailed { .. }));
    let history = h.engine.sessions().history("s1").await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].responder_id, "coordinator_default");
}

#[tokio::test]
async fn failed_specialist_is_retried_on_fallback() {
    let h = harness(
        MockClassifier::returning(&[("risk_specialist", 0.9)]),
        MockResponder::new().with("risk_specialist", ResponderBehavior::Fail("down".into())),
    );
    let response = h.send("risk of X?", "s1").await.unwrap();

    assert_eq!(response.responder_id, "general_fallback");
    assert_eq!(response.decision.selected_responder_id, "risk_specialist");
    assert!(response.degraded);
}

#[tokio::test(start_paused = true)]
async fn timed_out_specialist_is_retried_on_fallback() {
    let h = harness(
        MockClassifier::returning(&[("risk_specialist", 0.9)]),
        MockResponder::new().with("risk_specialist", ResponderBehavior::Hang),
    );
    let response = h.send("risk of X?", "s1").await.unwrap();

    assert_eq!(response.responder_id, "general_fallback");
    let calls = h.responder.calls_for("risk_specialist").await;
    assert!(calls[0].cancel.is_cancelled());
}

#[tokio::test]
async fn failing_fallback_is_responder_unavailable() {
    let h = harness(
        MockClassifier::new(),
        MockResponder::new().with("general_fallback", ResponderBehavior::Fail("down".into())),
    );
    let err = h.send("hello", "s1").await.unwrap_err();
    assert!(matches!(
        err,
        SquadronError::ResponderUnavailable { ref responder_id, .. } if responder_id == "general_fallback"
    ));
}

#[tokio::test]
async fn classifier_outage_still_answers_via_fallback() {
    let h = harness(MockClassifier::failing(), MockResponder::new());
    let response = h.send("hello", "s1").await.unwrap();

    assert_eq!(response.responder_id, "general_fallback");
    assert_eq!(response.decision.reason, RouteReason::ClassifierUnavailable);
}

#[tokio::test]
async fn response_mode_is_forwarded_to_responders() {
    let h = harness(
        MockClassifier::returning(&[("compliance_specialist", 0.95)]),
        MockResponder::new(),
    );
    h.engine
        .handle(Request::new("read it to me").with_mode(ResponseMode::Voice), "s1")
        .await
        .unwrap();

    let calls = h.responder.calls().await;
    assert_eq!(calls[0].response_mode, ResponseMode::Voice);
}

#[tokio::test]
async fn classifier_sees_bounded_session_history() {
    let classifier = MockClassifier::new().with_script(vec![
        ClassifierStep::candidates(&[("compliance_specialist", 0.9)]),
        ClassifierStep::candidates(&[("risk_specialist", 0.9)]),
        ClassifierStep::candidates(&[("privacy_specialist", 0.9)]),
    ]);
    let h = harness(classifier, MockResponder::new());

    for text in ["one", "two", "three", "four"] {
        h.send(text, "s1").await.unwrap();
    }

    let requests = h.classifier.requests().await;
    assert!(requests[0].1.recent.is_empty());
    assert_eq!(requests[1].1.last_responder(), Some("compliance_specialist"));

    // Window of two: the fourth request sees decisions two and three.
    let fourth = &requests[3].1;
    let ids: Vec<&str> = fourth.recent.iter().map(|d| d.responder_id.as_str()).collect();
    assert_eq!(ids, vec!["risk_specialist", "privacy_specialist"]);
    assert_eq!(fourth.handoff_count, 2);

    let handoffs = h.engine.sessions().handoffs("s1").await;
    assert_eq!(handoffs.len(), 3);
    assert_eq!(handoffs[2].to, "general_fallback");
}

#[tokio::test(start_paused = true)]
async fn same_session_requests_are_serialized() {
    let h = Arc::new(harness(
        MockClassifier::returning(&[("compliance_specialist", 0.95)]),
        MockResponder::new().with(
            "compliance_specialist",
            ResponderBehavior::Delay(Duration::from_millis(500), "done".into()),
        ),
    ));

    let started = tokio::time::Instant::now();
    let a = tokio::spawn({
        let h = h.clone();
        async move { h.send("first", "shared").await }
    });
    let b = tokio::spawn({
        let h = h.clone();
        async move { h.send("second", "shared").await }
    });
    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    assert_eq!(started.elapsed(), Duration::from_millis(1000));
    assert_eq!(h.engine.sessions().history("shared").await.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn different_sessions_run_concurrently() {
    let h = Arc::new(harness(
        MockClassifier::returning(&[("compliance_specialist", 0.95)]),
        MockResponder::new().with(
            "compliance_specialist",
            ResponderBehavior::Delay(Duration::from_millis(500), "done".into()),
        ),
    ));

    let started = tokio::time::Instant::now();
    let a = tokio::spawn({
        let h = h.clone();
        async move { h.send("first", "s1").await }
    });
    let b = tokio::spawn({
        let h = h.clone();
        async move { h.send("second", "s2").await }
    });
    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    assert_eq!(started.elapsed(), Duration::from_millis(500));
}

#[test]
fn invalid_squad_fails_to_build() {
    let broken = SQUAD.replace("confidence_threshold = 0.6", "confidence_threshold = 0.95");
    let result = TestHarness::builder(&broken).build();
    assert!(matches!(result, Err(SquadronError::Config(_))));
}
