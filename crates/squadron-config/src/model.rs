// SPDX-FileCopyrightText: 2026 Squadron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Squadron routing engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use squadron_core::{ResponderKind, TierKind};

/// Top-level Squadron configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// Every section except `[squad]` defaults to sensible values; an empty squad
/// fails validation because routing needs at least one tier and a fallback.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SquadronConfig {
    /// Routing engine behavior.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Single-responder invocation settings.
    #[serde(default)]
    pub invocation: InvocationConfig,

    /// Coordinator fan-out settings.
    #[serde(default)]
    pub fanout: FanOutConfig,

    /// Session continuity settings.
    #[serde(default)]
    pub session: SessionConfig,

    /// The squad document: responders, tiers and fallback.
    #[serde(default)]
    pub squad: SquadDocument,
}

/// Routing engine configuration, passed once into the engine constructor.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Walk tiers with thresholds. When false, the best candidate overall wins.
    #[serde(default = "default_hierarchical")]
    pub hierarchical: bool,

    /// Timeout for a single classification call.
    #[serde(default = "default_classifier_timeout_ms")]
    pub classifier_timeout_ms: u64,

    /// Retry a failed classification call once before falling back.
    #[serde(default = "default_classifier_retry")]
    pub classifier_retry: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            hierarchical: default_hierarchical(),
            classifier_timeout_ms: default_classifier_timeout_ms(),
            classifier_retry: default_classifier_retry(),
        }
    }
}

impl EngineConfig {
    pub fn classifier_timeout(&self) -> Duration {
        Duration::from_millis(self.classifier_timeout_ms)
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_hierarchical() -> bool {
    true
}

fn default_classifier_timeout_ms() -> u64 {
    3_000
}

fn default_classifier_retry() -> bool {
    true
}

/// Settings for specialist and fallback invocations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct InvocationConfig {
    /// Timeout for a single specialist or fallback call.
    #[serde(default = "default_invocation_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for InvocationConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_invocation_timeout_ms(),
        }
    }
}

impl InvocationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_invocation_timeout_ms() -> u64 {
    30_000
}

/// Coordinator fan-out configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FanOutConfig {
    /// Independent timeout for each target invocation.
    #[serde(default = "default_target_timeout_ms")]
    pub target_timeout_ms: u64,

    /// Aggregate deadline for the whole fan-out; pending targets are cancelled after it.
    #[serde(default = "default_deadline_ms")]
    pub deadline_ms: u64,

    /// Timeout for the coordinator's synthesis call.
    #[serde(default = "default_synthesis_timeout_ms")]
    pub synthesis_timeout_ms: u64,

    /// Maximum number of target invocations in flight at once.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

impl Default for FanOutConfig {
    fn default() -> Self {
        Self {
            target_timeout_ms: default_target_timeout_ms(),
            deadline_ms: default_deadline_ms(),
            synthesis_timeout_ms: default_synthesis_timeout_ms(),
            max_concurrency: default_max_concurrency(),
        }
    }
}

impl FanOutConfig {
    pub fn target_timeout(&self) -> Duration {
        Duration::from_millis(self.target_timeout_ms)
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }

    pub fn synthesis_timeout(&self) -> Duration {
        Duration::from_millis(self.synthesis_timeout_ms)
    }
}

fn default_target_timeout_ms() -> u64 {
    20_000
}

fn default_deadline_ms() -> u64 {
    30_000
}

fn default_synthesis_timeout_ms() -> u64 {
    30_000
}

fn default_max_concurrency() -> usize {
    8
}

/// Session continuity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Number of most recent decisions exposed as classification context.
    #[serde(default = "default_context_window")]
    pub context_window: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            context_window: default_context_window(),
        }
    }
}

fn default_context_window() -> usize {
    5
}

/// The declarative squad document, as written by the operator.
///
/// This is the unvalidated shape; [`crate::squad::SquadConfig::load`] turns
/// it into the immutable routing model or reports every problem found.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SquadDocument {
    /// Squad name, used in logs and summaries.
    #[serde(default = "default_squad_name")]
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Global responder registry.
    #[serde(default)]
    pub responders: Vec<ResponderSpec>,

    /// Capability tiers in evaluation order.
    #[serde(default)]
    pub tiers: Vec<TierSpec>,

    #[serde(default)]
    pub fallback: FallbackSpec,
}

impl Default for SquadDocument {
    fn default() -> Self {
        Self {
            name: default_squad_name(),
            description: String::new(),
            responders: Vec::new(),
            tiers: Vec::new(),
            fallback: FallbackSpec::default(),
        }
    }
}

fn default_squad_name() -> String {
    "squadron".to_string()
}

/// One `[[squad.responders]]` entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ResponderSpec {
    pub id: String,

    pub kind: ResponderKind,

    /// Human-readable name. Defaults to the id.
    #[serde(default)]
    pub display_name: Option<String>,

    /// Capability labels. Informational for routing.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Fan-out target set, coordinators only. Empty means every specialist-tier member.
    #[serde(default)]
    pub targets: Vec<String>,
}

/// One `[[squad.tiers]]` entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TierSpec {
    pub name: String,

    pub kind: TierKind,

    pub confidence_threshold: f64,

    #[serde(default)]
    pub description: String,

    /// Responder ids in declaration order; earlier members win confidence ties.
    pub members: Vec<String>,
}

/// The `[squad.fallback]` section.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FallbackSpec {
    /// Id of the fallback responder.
    #[serde(default)]
    pub responder: String,
}
