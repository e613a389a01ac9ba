// SPDX-FileCopyrightText: 2026 Squadron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Heuristic tag-based classification.
//!
//! Scores a request against each tiered responder's tags with plain
//! substring matching, so the binary can route offline in place of a real
//! classification service.

use async_trait::async_trait;
use squadron_config::SquadConfig;
use squadron_core::{
    AdapterType, ClassificationCandidate, ClassificationResult, ClassifierAdapter, HealthStatus,
    PluginAdapter, SessionContext, SquadronError,
};

/// Bonus added to the session's previous responder so conversations stick.
const DEFAULT_MOMENTUM: f64 = 0.1;

struct Profile {
    responder_id: String,
    keywords: Vec<String>,
}

/// Keyword classifier built from the squad's responder tags.
pub struct TagClassifier {
    profiles: Vec<Profile>,
    momentum: f64,
}

impl TagClassifier {
    /// Build profiles for every tiered responder.
    ///
    /// Responders without tags are matched on the segments of their id
    /// (`billing_specialist` matches "billing").
    pub fn new(squad: &SquadConfig) -> Self {
        let profiles = squad
            .responders()
            .iter()
            .filter(|r| squad.tier_of(&r.id).is_some())
            .map(|r| {
                let keywords = if r.tags.is_empty() {
                    r.id.split(['_', '-'])
                        .filter(|s| s.len() > 2)
                        .map(str::to_lowercase)
                        .collect()
                } else {
                    r.tags.iter().map(|t| t.to_lowercase()).collect()
                };
                Profile {
                    responder_id: r.id.clone(),
                    keywords,
                }
            })
            .collect();

        Self {
            profiles,
            momentum: DEFAULT_MOMENTUM,
        }
    }

    pub fn with_momentum(mut self, momentum: f64) -> Self {
        self.momentum = momentum;
        self
    }

    /// Score a message. Each distinct keyword hit halves the remaining
    /// distance to 1.0: one hit scores 0.5, two 0.75, three 0.875.
    pub fn score(&self, message: &str, context: &SessionContext) -> ClassificationResult {
        let lower = message.trim().to_lowercase();
        if lower.is_empty() {
            return ClassificationResult::empty();
        }

        let last = context.last_responder();
        let candidates = self
            .profiles
            .iter()
            .filter_map(|profile| {
                let hits: Vec<&str> = profile
                    .keywords
                    .iter()
                    .filter(|k| lower.contains(k.as_str()))
                    .map(String::as_str)
                    .collect();

                let mut confidence = 1.0 - 0.5f64.powi(hits.len() as i32);
                if last == Some(profile.responder_id.as_str()) {
                    confidence = (confidence + self.momentum).min(1.0);
                }
                if confidence <= 0.0 {
                    return None;
                }

                let rationale = if hits.is_empty() {
                    "conversation momentum".to_string()
                } else {
                    format!("matched tags: {}", hits.join(", "))
                };
                Some(
                    ClassificationCandidate::new(profile.responder_id.clone(), confidence)
                        .with_rationale(rationale),
                )
            })
            .collect();

        ClassificationResult::from_candidates(candidates)
    }
}

#[async_trait]
impl PluginAdapter for TagClassifier {
    fn name(&self) -> &str {
        "tag-classifier"
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
impl ClassifierAdapter for TagClassifier {
    async fn classify(
        &self,
        request_text: &str,
        context: &SessionContext,
    ) -> Result<ClassificationResult, SquadronError> {
        Ok(self.score(request_text, context))
    }
}
