// SPDX-FileCopyrightText: 2026 Squadron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Squadron routing engine.

use std::time::Duration;

use thiserror::Error;

/// The primary error type used across all Squadron ports and core operations.
#[derive(Debug, Error)]
pub enum SquadronError {
    /// Configuration errors surfaced outside of startup validation.
    #[error("configuration error: {0}")]
    Config(String),

    /// The classification port failed or timed out.
    #[error("classification unavailable: {message}")]
    ClassificationUnavailable {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A responder invocation returned an error.
    #[error("responder `{responder_id}` failed: {message}")]
    Invocation {
        responder_id: String,
        message: String,
    },

    /// A responder invocation exceeded its timeout.
    #[error("responder `{responder_id}` timed out after {duration:?}")]
    InvocationTimeout {
        responder_id: String,
        duration: Duration,
    },

    /// The coordinator's synthesis call failed after fan-out.
    #[error("synthesis by coordinator `{coordinator_id}` failed: {message}")]
    SynthesisFailed {
        coordinator_id: String,
        message: String,
    },

    /// Neither the selected responder nor the fallback could answer.
    #[error("no responder could answer (last tried `{responder_id}`): {message}")]
    ResponderUnavailable {
        responder_id: String,
        message: String,
    },

    /// A responder id is not part of the loaded squad.
    #[error("unknown responder `{0}`")]
    UnknownResponder(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SquadronError {
    /// Whether this error came from an elapsed timeout rather than an explicit failure.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            SquadronError::Timeout { .. } | SquadronError::InvocationTimeout { .. }
        )
    }
}
