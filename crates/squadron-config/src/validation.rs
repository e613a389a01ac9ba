// SPDX-FileCopyrightText: 2026 Squadron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Engine settings are checked here; squad consistency is delegated to
//! [`SquadConfig::load`]. All errors are collected, never fail-fast.

use crate::diagnostic::ConfigError;
use crate::model::SquadronConfig;
use crate::squad::SquadConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate engine settings and the squad document.
///
/// Returns the loaded [`SquadConfig`] when everything passes.
pub fn validate_config(config: &SquadronConfig) -> Result<SquadConfig, Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.engine.log_level.as_str()) {
        errors.push(ConfigError::validation(format!(
            "engine.log_level must be one of {}, got `{}`",
            LOG_LEVELS.join(", "),
            config.engine.log_level
        )));
    }

    let positive = [
        ("engine.classifier_timeout_ms", config.engine.classifier_timeout_ms),
        ("invocation.timeout_ms", config.invocation.timeout_ms),
        ("fanout.target_timeout_ms", config.fanout.target_timeout_ms),
        ("fanout.deadline_ms", config.fanout.deadline_ms),
        ("fanout.synthesis_timeout_ms", config.fanout.synthesis_timeout_ms),
    ];
    for (key, value) in positive {
        if value == 0 {
            errors.push(ConfigError::validation(format!(
                "{key} must be greater than 0"
            )));
        }
    }

    if config.fanout.max_concurrency == 0 {
        errors.push(ConfigError::validation(
            "fanout.max_concurrency must be at least 1",
        ));
    }

    if config.session.context_window == 0 {
        errors.push(ConfigError::validation(
            "session.context_window must be at least 1",
        ));
    }

    match SquadConfig::load(&config.squad) {
        Ok(squad) if errors.is_empty() => Ok(squad),
        Ok(_) => Err(errors),
        Err(squad_errors) => {
            errors.extend(squad_errors);
            Err(errors)
        }
    }
}
