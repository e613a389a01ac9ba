// SPDX-FileCopyrightText: 2026 Squadron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Squadron integration tests.
//!
//! Provides mock ports and a harness for fast, deterministic tests without
//! an external classification service or real responders.
//!
//! # Components
//!
//! - [`MockClassifier`] - scripted classification results, failures and hangs
//! - [`MockResponder`] - per-responder replies, failures, delays and call capture
//! - [`TestHarness`] - a full engine built from a TOML squad

pub mod harness;
pub mod mock_classifier;
pub mod mock_responder;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_classifier::{ClassifierStep, MockClassifier};
pub use mock_responder::{MockResponder, RecordedCall, ResponderBehavior};
