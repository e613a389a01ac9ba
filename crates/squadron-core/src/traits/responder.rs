// SPDX-FileCopyrightText: 2026 Squadron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Responder invocation port: calls a specialist, coordinator or fallback.

use async_trait::async_trait;

use crate::error::SquadronError;
use crate::traits::adapter::PluginAdapter;
use crate::types::InvocationContext;

/// Adapter used to actually call a chosen responder.
///
/// A single adapter serves every responder in the squad and dispatches on
/// `responder_id`. The routing core never inspects persona content; that is
/// the adapter's concern.
#[async_trait]
pub trait ResponderAdapter: PluginAdapter {
    /// Invokes `responder_id` with the request text and context bundle.
    ///
    /// `context.cancel` is cancelled when the caller stops waiting. Honoring it
    /// is optional; results delivered after cancellation are discarded.
    async fn invoke(
        &self,
        responder_id: &str,
        request_text: &str,
        context: &InvocationContext,
    ) -> Result<String, SquadronError>;
}
