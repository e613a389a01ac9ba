// SPDX-FileCopyrightText: 2026 Squadron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Figment-to-miette error bridge and squad validation diagnostics.
//!
//! Deserialization failures become rich miette diagnostics with source spans
//! and "did you mean?" suggestions (Jaro-Winkler). Squad consistency
//! failures get one variant each so operators see exactly which tier or
//! responder is at fault.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Minimum Jaro-Winkler similarity score to suggest a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration error with rich diagnostic information.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// An unknown key was found in the configuration.
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(squadron::config::unknown_key),
        help("{}", format_unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        /// Suggested correction via fuzzy matching, if any.
        suggestion: Option<String>,
        valid_keys: String,
        #[label("this key is not recognized")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A configuration value has the wrong type.
    #[error("invalid type for key `{key}`: {detail}")]
    #[diagnostic(code(squadron::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
    },

    /// A required configuration key is missing.
    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(squadron::config::missing_key),
        help("add `{key} = <value>` to your squadron.toml")
    )]
    MissingKey { key: String },

    /// The squad declares no tiers.
    #[error("squad declares no tiers")]
    #[diagnostic(
        code(squadron::config::empty_tiers),
        help("add at least one [[squad.tiers]] entry")
    )]
    EmptyTiers,

    /// A tier threshold is not a finite number in [0, 1].
    #[error("tier `{tier}` has confidence_threshold {value}, expected a value in [0, 1]")]
    #[diagnostic(code(squadron::config::threshold_out_of_range))]
    ThresholdOutOfRange { tier: String, value: f64 },

    /// A tier threshold exceeds the threshold of the tier before it.
    #[error(
        "tier `{tier}` threshold {threshold} is greater than tier `{previous_tier}` threshold {previous_threshold}"
    )]
    #[diagnostic(
        code(squadron::config::threshold_increase),
        help("tier thresholds must be non-increasing in declaration order")
    )]
    ThresholdIncrease {
        tier: String,
        threshold: f64,
        previous_tier: String,
        previous_threshold: f64,
    },

    /// A tier (or coordinator target list) references an undeclared responder.
    #[error("`{owner}` references unknown responder `{responder}`")]
    #[diagnostic(
        code(squadron::config::dangling_responder),
        help("{}", format_dangling_help(suggestion.as_deref()))
    )]
    DanglingResponder {
        owner: String,
        responder: String,
        suggestion: Option<String>,
    },

    /// A responder is a member of more than one tier.
    #[error("responder `{responder}` appears in both tier `{first}` and tier `{second}`")]
    #[diagnostic(
        code(squadron::config::duplicate_member),
        help("each responder belongs to exactly one tier")
    )]
    DuplicateMember {
        responder: String,
        first: String,
        second: String,
    },

    /// The fallback responder is missing or not declared with kind `fallback`.
    #[error("fallback responder `{responder}` is not declared with kind `fallback`")]
    #[diagnostic(
        code(squadron::config::fallback_missing),
        help("declare it under [[squad.responders]] with kind = \"fallback\" and name it in [squad.fallback]")
    )]
    FallbackMissing { responder: String },

    /// The fallback responder was listed as a tier member.
    #[error("fallback responder `{responder}` is listed in tier `{tier}`")]
    #[diagnostic(
        code(squadron::config::fallback_in_tier),
        help("the fallback is reached by exhaustion and must not be a tier member")
    )]
    FallbackInTier { tier: String, responder: String },

    /// Any other post-deserialization validation failure.
    #[error("validation error: {message}")]
    #[diagnostic(code(squadron::config::validation))]
    Validation { message: String },

    /// Catch-all for other configuration errors.
    #[error("configuration error: {0}")]
    #[diagnostic(code(squadron::config::other))]
    Other(String),
}

impl ConfigError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

fn format_unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? (allowed here: {valid_keys})"),
        None => format!("allowed here: {valid_keys}"),
    }
}

fn format_dangling_help(suggestion: Option<&str>) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`?"),
        None => "declare the responder under [[squad.responders]]".to_string(),
    }
}

/// Convert a `figment::Error` into a list of `ConfigError` diagnostics.
///
/// Figment may carry several errors; each becomes its own diagnostic.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| convert(&error, toml_sources))
        .collect()
}

fn convert(error: &figment::Error, toml_sources: &[(String, String)]) -> ConfigError {
    use figment::error::Kind;

    match &error.kind {
        Kind::UnknownField(field, expected) => {
            let (span, src) = find_source_span(error, field, toml_sources);
            ConfigError::UnknownKey {
                key: field.clone(),
                suggestion: suggest_key(field, expected),
                valid_keys: expected.join(", "),
                span,
                src,
            }
        }
        Kind::MissingField(field) => ConfigError::MissingKey {
            key: join_path(&error.path, field),
        },
        Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
            key: error.path.join("."),
            detail: format!("got {actual}"),
            expected: expected.to_string(),
        },
        Kind::UnknownVariant(variant, expected) => ConfigError::InvalidType {
            key: error.path.join("."),
            detail: format!("`{variant}` is not a recognized value"),
            expected: format!("one of: {}", expected.join(", ")),
        },
        _ => ConfigError::Other(error.to_string()),
    }
}

fn join_path(path: &[String], field: &str) -> String {
    if path.is_empty() {
        field.to_string()
    } else {
        format!("{}.{field}", path.join("."))
    }
}

/// Find source span for an error in the TOML source texts.
///
/// File sources are matched by path; inline string sources fall back to the
/// single `<inline>` entry when present.
fn find_source_span(
    error: &figment::error::Error,
    field: &str,
    toml_sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let source_path = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|s| match s {
            figment::Source::File(path) => Some(path.display().to_string()),
            _ => None,
        });

    let source = match source_path {
        Some(path) => toml_sources.iter().find(|(p, _)| *p == path),
        None => toml_sources.iter().find(|(p, _)| p == "<inline>"),
    };

    if let Some((path, content)) = source {
        if let Some(offset) = find_key_offset(content, &error.path, field) {
            let span = SourceSpan::new(offset.into(), field.len());
            let named = NamedSource::new(path, content.clone());
            return (Some(span), Some(named));
        }
    }

    (None, None)
}

/// Find the byte offset of a key in TOML content, relative to a section path.
///
/// For `path = ["fanout"]` and `field = "dedline_ms"`, finds the `[fanout]`
/// header then searches for `dedline_ms` after it. Array-of-table headers
/// like `[[squad.tiers]]` match on their dotted path. Top-level fields are
/// searched from the start.
pub fn find_key_offset(content: &str, path: &[String], field: &str) -> Option<usize> {
    let search_start = if path.is_empty() {
        0
    } else {
        let dotted: Vec<&str> = path
            .iter()
            .map(String::as_str)
            .filter(|segment| segment.parse::<usize>().is_err())
            .collect();
        let dotted = dotted.join(".");
        let table = format!("[{dotted}]");
        let array = format!("[[{dotted}]]");
        content
            .find(&array)
            .map(|pos| pos + array.len())
            .or_else(|| content.find(&table).map(|pos| pos + table.len()))?
    };

    content[search_start..]
        .split_inclusive('\n')
        .scan(search_start, |line_start, line| {
            let start = *line_start;
            *line_start += line.len();
            Some((start, line))
        })
        .find_map(|(start, line)| {
            let trimmed = line.trim_start();
            let rest = trimmed.strip_prefix(field)?;
            rest.starts_with([' ', '\t', '='])
                .then_some(start + line.len() - trimmed.len())
        })
}

/// Closest known name by Jaro-Winkler similarity, if any clears
/// [`SUGGESTION_THRESHOLD`]. The first of equally close names wins.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|&key| (key, strsim::jaro_winkler(unknown, key)))
        .filter(|&(_, score)| score > SUGGESTION_THRESHOLD)
        .fold(None, |best: Option<(&str, f64)>, (key, score)| match best {
            Some((_, top)) if top >= score => best,
            _ => Some((key, score)),
        })
        .map(|(key, _)| key.to_string())
}

/// Print every error to stderr as a graphical miette report.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut report = String::new();
        match handler.render_report(&mut report, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{report}"),
            Err(_) => eprintln!("error: {error}"),
        }
    }
    if errors.len() > 1 {
        eprintln!("squadron: {} configuration errors", errors.len());
    }
}
