// SPDX-FileCopyrightText: 2026 Squadron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classification port: scores a request against the squad's responders.

use async_trait::async_trait;

use crate::error::SquadronError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ClassificationResult, SessionContext};

/// Adapter for the external text-classification service.
///
/// Implementations return a ranked list of `(responder, confidence, rationale)`
/// and fail with [`SquadronError::ClassificationUnavailable`] on upstream errors.
/// Timeouts are enforced by the caller.
#[async_trait]
pub trait ClassifierAdapter: PluginAdapter {
    /// Classifies a request, using the session context as conversational hint.
    async fn classify(
        &self,
        request_text: &str,
        context: &SessionContext,
    ) -> Result<ClassificationResult, SquadronError>;
}
