// SPDX-FileCopyrightText: 2026 Squadron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the `squadron` binary and the full routing pipeline.
//!
//! Each test writes its squad to a temp directory. Tests are independent and
//! order-insensitive.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::sync::Arc;

use squadron_agent::SquadEngine;
use squadron_core::{Request, RouteReason};
use squadron_router::TagClassifier;
use squadron_test_utils::MockResponder;

const SQUAD: &str = r#"
[engine]
log_level = "warn"

[squad]
name = "e2e-squad"

[[squad.responders]]
id = "risk_specialist"
kind = "specialist"
display_name = "Risk"
tags = ["risk", "vendor", "assessment"]

[[squad.responders]]
id = "privacy_specialist"
kind = "specialist"
tags = ["privacy", "gdpr", "personal data"]

[[squad.responders]]
id = "review_coordinator"
kind = "coordinator"
tags = ["review", "program"]

[[squad.responders]]
id = "general_fallback"
kind = "fallback"

[[squad.tiers]]
name = "specialists"
kind = "specialist"
confidence_threshold = 0.7
members = ["risk_specialist", "privacy_specialist"]

[[squad.tiers]]
name = "coordinators"
kind = "coordinator"
confidence_threshold = 0.4
members = ["review_coordinator"]

[squad.fallback]
responder = "general_fallback"
"#;

fn write_config(dir: &tempfile::TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("squadron.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

fn squadron(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_squadron"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .unwrap()
}

// ---- Binary: check ----

#[test]
fn check_prints_squad_summary() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, SQUAD);

    let output = squadron(&["check", "--plain", "--config", path.to_str().unwrap()]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("squad e2e-squad"));
    assert!(stdout.contains("[OK] valid"));
    assert!(stdout.contains("1. specialists [specialist] >= 0.70"));
    assert!(stdout.contains("Fallback:    general_fallback"));
}

#[test]
fn check_json_is_machine_readable() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, SQUAD);

    let output = squadron(&["check", "--json", "--config", path.to_str().unwrap()]);
    assert!(output.status.success());

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["name"], "e2e-squad");
    assert_eq!(summary["responder_count"], 4);
    assert_eq!(summary["tiers"][1]["name"], "coordinators");
}

#[test]
fn invalid_config_exits_with_code_one() {
    let dir = tempfile::tempdir().unwrap();
    let broken = SQUAD.replace("confidence_threshold = 0.4", "confidence_threshold = 0.9");
    let path = write_config(&dir, &broken);

    let output = squadron(&["check", "--config", path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(!output.stderr.is_empty());
}

// ---- Binary: route ----

#[test]
fn route_prints_one_decision_per_message() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, SQUAD);

    let output = squadron(&[
        "route",
        "--json",
        "--config",
        path.to_str().unwrap(),
        "vendor risk assessment please",
        "please review our program",
        "what's for lunch",
    ]);
    assert!(output.status.success());

    let lines: Vec<serde_json::Value> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 3);

    assert_eq!(lines[0]["decision"]["selected_responder_id"], "risk_specialist");
    assert_eq!(lines[0]["decision"]["tier_name"], "specialists");
    assert!(lines[0]["handoff"].is_null());

    assert_eq!(lines[1]["decision"]["selected_responder_id"], "review_coordinator");
    assert_eq!(lines[1]["handoff"], "risk_specialist");

    assert_eq!(lines[2]["decision"]["selected_responder_id"], "general_fallback");
    assert_eq!(lines[2]["decision"]["reason"], "no_matching_tier");
    assert_eq!(lines[2]["decision"]["trace"].as_array().unwrap().len(), 2);
}

#[test]
fn route_plain_output_shows_trace() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, SQUAD);

    let output = squadron(&[
        "route",
        "--plain",
        "--config",
        path.to_str().unwrap(),
        "gdpr and personal data privacy",
    ]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("> gdpr and personal data privacy"));
    assert!(stdout.contains("Routed to:  privacy_specialist"));
    assert!(stdout.contains("[MET] specialists >= 0.70"));
}

// ---- Library pipeline with the tag classifier ----

#[tokio::test(start_paused = true)]
async fn tag_classified_pipeline_answers_and_tracks_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, SQUAD);
    let config = squadron_config::load_and_validate_path(&path).unwrap();

    let squad = Arc::new(config.squad);
    let classifier = Arc::new(TagClassifier::new(&squad));
    let responder = Arc::new(MockResponder::new());
    let engine = SquadEngine::new(squad, &config.settings, classifier, responder.clone());

    let first = engine
        .handle(Request::new("vendor risk assessment"), "e2e")
        .await
        .unwrap();
    assert_eq!(first.text, "risk_specialist reply");

    let second = engine
        .handle(Request::new("review the whole program"), "e2e")
        .await
        .unwrap();
    assert_eq!(second.responder_id, "review_coordinator");
    assert_eq!(
        second.text,
        "review_coordinator synthesized: risk_specialist, privacy_specialist"
    );

    let third = engine.handle(Request::new("hello"), "e2e").await.unwrap();
    assert_eq!(third.decision.reason, RouteReason::NoMatchingTier);
    assert_eq!(third.text, "general_fallback reply");

    let handoffs = engine.sessions().handoffs("e2e").await;
    assert_eq!(handoffs.len(), 2);
    assert_eq!(engine.sessions().history("e2e").await.len(), 3);
}
