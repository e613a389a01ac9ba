// SPDX-FileCopyrightText: 2026 Squadron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Squadron configuration system.

use std::io::Write;
use std::path::Path;

use squadron_config::diagnostic::ConfigError;
use squadron_config::{
    load_and_validate_path, load_and_validate_str, load_config_from_path, load_config_from_str,
};
use squadron_core::{ResponderKind, TierKind};

const SQUAD: &str = r#"
[engine]
log_level = "debug"
classifier_timeout_ms = 1500

[invocation]
timeout_ms = 4000

[fanout]
target_timeout_ms = 2000
deadline_ms = 5000
synthesis_timeout_ms = 3000
max_concurrency = 4

[session]
context_window = 3

[squad]
name = "support"
description = "Customer support squad"

[[squad.responders]]
id = "billing"
kind = "specialist"
display_name = "Billing Expert"
tags = ["invoice", "refund"]

[[squad.responders]]
id = "network"
kind = "specialist"
tags = ["wifi", "router"]

[[squad.responders]]
id = "escalation"
kind = "coordinator"
targets = ["billing", "network"]

[[squad.responders]]
id = "general"
kind = "fallback"

[[squad.tiers]]
name = "experts"
kind = "specialist"
confidence_threshold = 0.75
members = ["billing", "network"]

[[squad.tiers]]
name = "coordination"
kind = "coordinator"
confidence_threshold = 0.4
members = ["escalation"]

[squad.fallback]
responder = "general"
"#;

#[test]
fn full_document_loads_and_validates() {
    let config = load_and_validate_str(SQUAD).expect("valid squad");

    assert_eq!(config.settings.engine.log_level, "debug");
    assert_eq!(config.settings.engine.classifier_timeout_ms, 1500);
    assert_eq!(config.settings.invocation.timeout_ms, 4000);
    assert_eq!(config.settings.fanout.max_concurrency, 4);
    assert_eq!(config.settings.session.context_window, 3);

    let squad = &config.squad;
    assert_eq!(squad.name(), "support");
    assert_eq!(squad.description(), "Customer support squad");
    assert_eq!(squad.responders().len(), 4);
    assert_eq!(squad.responder("general").unwrap().kind, ResponderKind::Fallback);
    assert_eq!(squad.tiers()[1].kind, TierKind::Coordinator);
    assert_eq!(squad.display_name("billing"), "Billing Expert");
    assert_eq!(
        squad.fan_out_targets("escalation").unwrap(),
        &["billing".to_string(), "network".to_string()]
    );
}

#[test]
fn missing_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");
    assert_eq!(config.engine.log_level, "info");
    assert!(config.engine.hierarchical);
    assert!(config.engine.classifier_retry);
    assert_eq!(config.invocation.timeout_ms, 30_000);
    assert_eq!(config.fanout.deadline_ms, 30_000);
    assert_eq!(config.session.context_window, 5);
    assert_eq!(config.squad.name, "squadron");
}

#[test]
fn empty_squad_fails_validation() {
    let errors = load_and_validate_str("").expect_err("no tiers, no fallback");
    assert!(errors.iter().any(|e| matches!(e, ConfigError::EmptyTiers)));
}

#[test]
fn unknown_key_produces_suggestion() {
    let toml = "[fanout]\ndedline_ms = 10\n";
    let errors = load_and_validate_str(toml).expect_err("unknown key");
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key,
            suggestion,
            valid_keys,
            ..
        } => {
            assert_eq!(key, "dedline_ms");
            assert_eq!(suggestion.as_deref(), Some("deadline_ms"));
            assert!(valid_keys.contains("max_concurrency"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn unknown_top_level_section_is_rejected() {
    let err = load_config_from_str("[logging]\nlevel = \"debug\"\n")
        .expect_err("unknown top-level section should be rejected");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("logging"),
        "error should mention unknown field, got: {err_str}"
    );
}

#[test]
fn unknown_responder_kind_is_an_invalid_type() {
    let toml = SQUAD.replace("kind = \"fallback\"", "kind = \"backup\"");
    let errors = load_and_validate_str(&toml).expect_err("bad kind");
    assert!(errors.iter().any(|e| e.to_string().contains("backup")));
}

#[test]
fn threshold_increase_is_reported_with_both_tiers() {
    let toml = SQUAD.replace("confidence_threshold = 0.4", "confidence_threshold = 0.9");
    let errors = load_and_validate_str(&toml).expect_err("non-monotonic thresholds");
    let message = errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n");
    assert!(message.contains("coordination"));
    assert!(message.contains("experts"));
}

#[test]
fn dangling_target_is_reported() {
    let toml = SQUAD.replace("targets = [\"billing\", \"network\"]", "targets = [\"biling\"]");
    let errors = load_and_validate_str(&toml).expect_err("dangling target");
    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::DanglingResponder { owner, responder, .. }
            if owner == "coordinator `escalation`" && responder == "biling"
    )));
}

#[test]
fn loads_from_file_path() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    file.write_all(SQUAD.as_bytes()).expect("write squad");

    let config = load_and_validate_path(file.path()).expect("file loads");
    assert_eq!(config.squad.tiers().len(), 2);
}

#[test]
fn missing_file_yields_defaults() {
    let config = load_config_from_path(Path::new("/nonexistent/path/squadron.toml"))
        .expect("missing file should be silently skipped");
    assert_eq!(config.engine.log_level, "info");
}

#[test]
fn env_vars_override_file_values() {
    figment::Jail::expect_with(|jail| {
        jail.create_file("squadron.toml", SQUAD)?;
        jail.set_env("SQUADRON_FANOUT_DEADLINE_MS", "1500");
        jail.set_env("SQUADRON_ENGINE_HIERARCHICAL", "false");
        jail.set_env("SQUADRON_SESSION_CONTEXT_WINDOW", "9");

        let config = load_config_from_path(Path::new("squadron.toml"))?;
        assert_eq!(config.fanout.deadline_ms, 1500);
        assert!(!config.engine.hierarchical);
        assert_eq!(config.session.context_window, 9);
        // Untouched values come from the file.
        assert_eq!(config.fanout.target_timeout_ms, 2000);
        Ok(())
    });
}

#[test]
fn rendered_diagnostics_carry_codes() {
    let toml = SQUAD.replace("responder = \"general\"", "responder = \"nobody\"");
    let errors = load_and_validate_str(&toml).expect_err("bad fallback");
    let codes: Vec<String> = errors
        .iter()
        .filter_map(|e| miette::Diagnostic::code(e).map(|c| c.to_string()))
        .collect();
    assert!(codes.contains(&"squadron::config::fallback_missing".to_string()));
}
