// SPDX-FileCopyrightText: 2026 Squadron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hierarchical confidence-based routing for the Squadron engine.
//!
//! This crate provides:
//! - [`TierRouter`]: classification with bounded retry, ordered tier walk
//!   with thresholds, deterministic tie-breaks and a total fallback path
//! - [`TagClassifier`]: heuristic tag-matching classifier usable without an
//!   external scoring service

pub mod classifier;
pub mod router;

pub use classifier::TagClassifier;
pub use router::{RouterSettings, TierRouter};
