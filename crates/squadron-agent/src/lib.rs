// SPDX-FileCopyrightText: 2026 Squadron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request handling for the Squadron routing engine.
//!
//! - [`SquadEngine`]: per-session serialized request handling on top of
//!   the tier router
//! - [`FanOutCoordinator`]: concurrent fan-out to specialist targets with
//!   per-target timeouts, an aggregate deadline and degraded synthesis
//! - [`SessionTracker`]: append-only per-session decision history

pub mod coordinator;
pub mod engine;
pub mod session;

pub use coordinator::{CoordinatedResponse, FanOutCoordinator, FanOutSettings, JobState};
pub use engine::{FinalResponse, SquadEngine};
pub use session::{SessionGuard, SessionTracker};
