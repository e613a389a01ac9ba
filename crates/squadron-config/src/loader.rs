// SPDX-FileCopyrightText: 2026 Squadron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./squadron.toml` > `~/.config/squadron/squadron.toml` >
//! `/etc/squadron/squadron.toml` with environment variable overrides via `SQUADRON_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::SquadronConfig;

/// System-wide configuration path.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/squadron/squadron.toml";

/// Local configuration file name, resolved against the working directory.
pub const LOCAL_CONFIG_FILE: &str = "squadron.toml";

/// The user-level config path under the XDG config directory, if one exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("squadron/squadron.toml"))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/squadron/squadron.toml` (system-wide)
/// 3. `~/.config/squadron/squadron.toml` (user XDG config)
/// 4. `./squadron.toml` (local directory)
/// 5. `SQUADRON_*` environment variables
pub fn load_config() -> Result<SquadronConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<SquadronConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SquadronConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<SquadronConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SquadronConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the layered Figment before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(SquadronConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Environment provider with explicit section mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `SQUADRON_FANOUT_DEADLINE_MS` must map to `fanout.deadline_ms`,
/// not `fanout.deadline.ms`. Only scalar engine settings are overridable; the
/// squad document itself comes from files.
fn env_provider() -> Env {
    Env::prefixed("SQUADRON_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("engine_", "engine.", 1)
            .replacen("invocation_", "invocation.", 1)
            .replacen("fanout_", "fanout.", 1)
            .replacen("session_", "session.", 1)
            .replacen("squad_", "squad.", 1);
        mapped.into()
    })
}
