// SPDX-FileCopyrightText: 2026 Squadron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Squadron routing engine.
//!
//! This crate provides the error type, the domain types shared by routing,
//! coordination and session continuity, and the two ports the engine calls
//! out through: [`ClassifierAdapter`] and [`ResponderAdapter`].

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::SquadronError;
pub use types::{
    AdapterType, ClassificationCandidate, ClassificationResult, DecisionSummary, Handoff,
    HealthStatus, InvocationContext, Request, ResponderKind, ResponseMode, RouteReason,
    RoutingDecision, SessionContext, SpecialistInput, SynthesisBundle, TargetFailure,
    TargetOutcome, TargetStatus, TierKind, TraceEntry, FALLBACK_TIER,
};

pub use traits::{ClassifierAdapter, PluginAdapter, ResponderAdapter};
