// SPDX-FileCopyrightText: 2026 Squadron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end engine tests.
//!
//! `TestHarness` loads a squad from TOML, wires a [`SquadEngine`] to a
//! [`MockClassifier`] and a [`MockResponder`], and keeps handles to both
//! mocks so tests can script and inspect them.

use std::sync::Arc;

use squadron_agent::{FinalResponse, SquadEngine};
use squadron_config::{load_and_validate_str, ConfigError};
use squadron_core::{Request, SquadronError};

use crate::mock_classifier::MockClassifier;
use crate::mock_responder::MockResponder;

/// Builder for test engines.
pub struct TestHarnessBuilder {
    toml: String,
    classifier: MockClassifier,
    responder: MockResponder,
}

impl TestHarnessBuilder {
    fn new(toml: &str) -> Self {
        Self {
            toml: toml.to_string(),
            classifier: MockClassifier::new(),
            responder: MockResponder::new(),
        }
    }

    pub fn with_classifier(mut self, classifier: MockClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_responder(mut self, responder: MockResponder) -> Self {
        self.responder = responder;
        self
    }

    /// Load and validate the squad, then build the engine.
    pub fn build(self) -> Result<TestHarness, SquadronError> {
        let config = load_and_validate_str(&self.toml).map_err(config_error)?;
        let classifier = Arc::new(self.classifier);
        let responder = Arc::new(self.responder);
        let engine = SquadEngine::new(
            Arc::new(config.squad),
            &config.settings,
            classifier.clone(),
            responder.clone(),
        );

        Ok(TestHarness {
            engine,
            classifier,
            responder,
        })
    }
}

fn config_error(errors: Vec<ConfigError>) -> SquadronError {
    let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    SquadronError::Config(messages.join("; "))
}

/// A fully wired engine with mock ports.
pub struct TestHarness {
    pub engine: SquadEngine,
    pub classifier: Arc<MockClassifier>,
    pub responder: Arc<MockResponder>,
}

impl TestHarness {
    pub fn builder(toml: &str) -> TestHarnessBuilder {
        TestHarnessBuilder::new(toml)
    }

    /// Send a text request on a session.
    pub async fn send(&self, text: &str, session_id: &str) -> Result<FinalResponse, SquadronError> {
        self.engine.handle(Request::new(text), session_id).await
    }
}
