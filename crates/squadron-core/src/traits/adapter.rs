// SPDX-FileCopyrightText: 2026 Squadron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The base trait under both ports.

use async_trait::async_trait;

use crate::error::SquadronError;
use crate::types::{AdapterType, HealthStatus};

/// Identity and lifecycle shared by every port implementation.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Name used in logs.
    fn name(&self) -> &str;

    fn version(&self) -> semver::Version;

    /// Which port this adapter serves.
    fn adapter_type(&self) -> AdapterType;

    async fn health_check(&self) -> Result<HealthStatus, SquadronError>;

    /// Release held resources. Called once, after the last request.
    async fn shutdown(&self) -> Result<(), SquadronError>;
}
