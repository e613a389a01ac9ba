// SPDX-FileCopyrightText: 2026 Squadron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Squad and engine configuration for Squadron.
//!
//! Settings are layered with figment (defaults, system, user and local TOML
//! files, then `SQUADRON_*` variables), deserialized strictly, and checked
//! as a whole. The squad document becomes an immutable [`SquadConfig`];
//! every problem found along the way is reported as a miette diagnostic.
//!
//! ```no_run
//! let config = squadron_config::load_and_validate().unwrap_or_else(|errors| {
//!     squadron_config::render_errors(&errors);
//!     std::process::exit(1);
//! });
//! println!("{} tiers", config.squad.tiers().len());
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod squad;
pub mod validation;

use std::path::Path;

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::SquadronConfig;
pub use squad::{Responder, SquadConfig, SquadSummary, Tier, TierSummary};

/// Engine settings together with the squad they route over.
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub settings: SquadronConfig,
    pub squad: SquadConfig,
}

/// Load from the standard file hierarchy plus environment, then validate.
pub fn load_and_validate() -> Result<ValidatedConfig, Vec<ConfigError>> {
    finish(loader::load_config(), discovered_sources)
}

/// Load from a TOML string alone, then validate.
pub fn load_and_validate_str(toml_content: &str) -> Result<ValidatedConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

/// Load from one file plus environment, then validate.
pub fn load_and_validate_path(path: &Path) -> Result<ValidatedConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_path(path), || {
        std::fs::read_to_string(path)
            .map(|content| vec![(path.display().to_string(), content)])
            .unwrap_or_default()
    })
}

/// Validate extracted settings, or turn an extraction failure into
/// diagnostics. Sources are only read on failure, for span lookup.
fn finish(
    extracted: Result<SquadronConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<ValidatedConfig, Vec<ConfigError>> {
    match extracted {
        Ok(settings) => {
            let squad = validation::validate_config(&settings)?;
            Ok(ValidatedConfig { settings, squad })
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err, &sources())),
    }
}

/// Every config file in the lookup chain that exists, as `(path, content)`.
fn discovered_sources() -> Vec<(String, String)> {
    let local = std::env::current_dir()
        .map(|dir| dir.join(loader::LOCAL_CONFIG_FILE))
        .unwrap_or_else(|_| loader::LOCAL_CONFIG_FILE.into());

    [
        Some(local),
        loader::user_config_path(),
        Some(loader::SYSTEM_CONFIG_PATH.into()),
    ]
    .into_iter()
    .flatten()
    .filter_map(|path| {
        std::fs::read_to_string(&path)
            .ok()
            .map(|content| (path.display().to_string(), content))
    })
    .collect()
}
