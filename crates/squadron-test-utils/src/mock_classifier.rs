// SPDX-FileCopyrightText: 2026 Squadron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock classification adapter for deterministic routing tests.
//!
//! `MockClassifier` implements `ClassifierAdapter` with a FIFO script of
//! steps. When the script runs out, the default step is repeated.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use squadron_core::{
    AdapterType, ClassificationCandidate, ClassificationResult, ClassifierAdapter, HealthStatus,
    PluginAdapter, SessionContext, SquadronError,
};

/// One scripted classification outcome.
#[derive(Debug, Clone)]
pub enum ClassifierStep {
    /// Return these candidates.
    Respond(Vec<ClassificationCandidate>),
    /// Fail with a classification error.
    Fail(String),
    /// Never return. Only a caller-side timeout ends the call.
    Hang,
}

impl ClassifierStep {
    /// Candidates from `(responder_id, confidence)` pairs.
    pub fn candidates(pairs: &[(&str, f64)]) -> Self {
        ClassifierStep::Respond(
            pairs
                .iter()
                .map(|(id, confidence)| ClassificationCandidate::new(*id, *confidence))
                .collect(),
        )
    }
}

/// A classifier that plays back scripted results.
pub struct MockClassifier {
    script: Arc<Mutex<VecDeque<ClassifierStep>>>,
    default_step: ClassifierStep,
    delay: Option<Duration>,
    requests: Arc<Mutex<Vec<(String, SessionContext)>>>,
}

impl MockClassifier {
    /// A classifier that returns no candidates.
    pub fn new() -> Self {
        Self::with_default(ClassifierStep::Respond(Vec::new()))
    }

    /// A classifier that always returns the given `(responder_id, confidence)` pairs.
    pub fn returning(pairs: &[(&str, f64)]) -> Self {
        Self::with_default(ClassifierStep::candidates(pairs))
    }

    /// A classifier that always fails.
    pub fn failing() -> Self {
        Self::with_default(ClassifierStep::Fail("mock classifier failure".to_string()))
    }

    /// A classifier whose calls never complete.
    pub fn hanging() -> Self {
        Self::with_default(ClassifierStep::Hang)
    }

    pub fn with_default(default_step: ClassifierStep) -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            default_step,
            delay: None,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue steps to play before the default step.
    pub fn with_script(self, steps: Vec<ClassifierStep>) -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::from(steps))),
            ..self
        }
    }

    /// Delay every call by `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Append a step to the end of the script.
    pub async fn push(&self, step: ClassifierStep) {
        self.script.lock().await.push_back(step);
    }

    /// Number of `classify` calls received so far.
    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }

    /// Request texts and session contexts seen, in call order.
    pub async fn requests(&self) -> Vec<(String, SessionContext)> {
        self.requests.lock().await.clone()
    }

    async fn next_step(&self) -> ClassifierStep {
        self.script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| self.default_step.clone())
    }
}

impl Default for MockClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockClassifier {
    fn name(&self) -> &str {
        "mock-classifier"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Classifier
    }

    async fn health_check(&self) -> Result<HealthStatus, SquadronError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), SquadronError> {
        Ok(())
    }
}

#[async_trait]
impl ClassifierAdapter for MockClassifier {
    async fn classify(
        &self,
        request_text: &str,
        context: &SessionContext,
    ) -> Result<ClassificationResult, SquadronError> {
        self.requests
            .lock()
            .await
            .push((request_text.to_string(), context.clone()));

        let step = self.next_step().await;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match step {
            ClassifierStep::Respond(candidates) => {
                Ok(ClassificationResult::from_candidates(candidates))
            }
            ClassifierStep::Fail(message) => Err(SquadronError::ClassificationUnavailable {
                message,
                source: None,
            }),
            ClassifierStep::Hang => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn script_then_default() {
        let classifier = MockClassifier::returning(&[("b", 0.5)])
            .with_script(vec![ClassifierStep::Fail("boom".into())]);
        let ctx = SessionContext::empty("s");

        assert!(classifier.classify("one", &ctx).await.is_err());
        let result = classifier.classify("two", &ctx).await.unwrap();
        assert_eq!(result.top().unwrap().responder_id, "b");
        assert_eq!(classifier.call_count().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_classifier_never_answers() {
        let classifier = MockClassifier::hanging();
        let ctx = SessionContext::empty("s");
        let outcome =
            tokio::time::timeout(Duration::from_secs(1), classifier.classify("x", &ctx)).await;
        assert!(outcome.is_err());
    }
}
