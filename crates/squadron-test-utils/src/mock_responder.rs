// SPDX-FileCopyrightText: 2026 Squadron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock responder invocation adapter.
//!
//! One `MockResponder` stands in for every responder in a squad. Behaviour is
//! configured per responder id; unconfigured responders reply with
//! `"<id> reply"`, and synthesis calls reply with a line naming the
//! contributing specialists.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use squadron_core::{
    AdapterType, HealthStatus, InvocationContext, PluginAdapter, ResponderAdapter,
    ResponseMode, SquadronError, SynthesisBundle,
};

/// How a mocked responder behaves when invoked.
#[derive(Debug, Clone)]
pub enum ResponderBehavior {
    Reply(String),
    Fail(String),
    /// Sleep, then reply.
    Delay(Duration, String),
    /// Wait until the invocation's cancellation token fires, then fail.
    Hang,
}

/// A recorded invocation.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub responder_id: String,
    pub request_text: String,
    pub response_mode: ResponseMode,
    pub synthesis: Option<SynthesisBundle>,
    pub cancel: CancellationToken,
}

/// A responder adapter with per-responder scripted behaviour.
pub struct MockResponder {
    behaviors: Mutex<HashMap<String, ResponderBehavior>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockResponder {
    pub fn new() -> Self {
        Self {
            behaviors: Mutex::new(HashMap::new()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Builder form of [`MockResponder::set`].
    pub fn with(mut self, responder_id: &str, behavior: ResponderBehavior) -> Self {
        self.behaviors
            .get_mut()
            .insert(responder_id.to_string(), behavior);
        self
    }

    pub async fn set(&self, responder_id: &str, behavior: ResponderBehavior) {
        self.behaviors
            .lock()
            .await
            .insert(responder_id.to_string(), behavior);
    }

    /// All invocations received so far, in arrival order.
    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }

    /// Invocations of one responder.
    pub async fn calls_for(&self, responder_id: &str) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|c| c.responder_id == responder_id)
            .cloned()
            .collect()
    }

    /// The most recent synthesis bundle received by any coordinator.
    pub async fn last_synthesis(&self) -> Option<SynthesisBundle> {
        self.calls
            .lock()
            .await
            .iter()
            .rev()
            .find_map(|c| c.synthesis.clone())
    }

    fn default_reply(responder_id: &str, context: &InvocationContext) -> String {
        match &context.synthesis {
            Some(bundle) if bundle.is_empty() => {
                format!("{responder_id}: no expert input could be gathered")
            }
            Some(bundle) => {
                let names: Vec<&str> = bundle
                    .inputs
                    .iter()
                    .map(|i| i.responder_id.as_str())
                    .collect();
                format!("{responder_id} synthesized: {}", names.join(", "))
            }
            None => format!("{responder_id} reply"),
        }
    }
}

impl Default for MockResponder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockResponder {
    fn name(&self) -> &str {
        "mock-responder"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Responder
    }

    async fn health_check(&self) -> Result<HealthStatus, SquadronError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), SquadronError> {
        Ok(())
    }
}

#[async_trait]
impl ResponderAdapter for MockResponder {
    async fn invoke(
        &self,
        responder_id: &str,
        request_text: &str,
        context: &InvocationContext,
    ) -> Result<String, SquadronError> {
        self.calls.lock().await.push(RecordedCall {
            responder_id: responder_id.to_string(),
            request_text: request_text.to_string(),
            response_mode: context.response_mode,
            synthesis: context.synthesis.clone(),
            cancel: context.cancel.clone(),
        });

        let behavior = self.behaviors.lock().await.get(responder_id).cloned();
        match behavior {
            None => Ok(Self::default_reply(responder_id, context)),
            Some(ResponderBehavior::Reply(text)) => Ok(text),
            Some(ResponderBehavior::Fail(message)) => Err(SquadronError::Invocation {
                responder_id: responder_id.to_string(),
                message,
            }),
            Some(ResponderBehavior::Delay(delay, text)) => {
                tokio::time::sleep(delay).await;
                Ok(text)
            }
            Some(ResponderBehavior::Hang) => {
                context.cancel.cancelled().await;
                Err(SquadronError::Invocation {
                    responder_id: responder_id.to_string(),
                    message: "cancelled".to_string(),
                })
            }
        }
    }
}
