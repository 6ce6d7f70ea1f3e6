// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! miette diagnostics for `courier.toml`.
//!
//! Deserialization failures from figment and semantic failures from
//! [`validate_config`](crate::validation::validate_config) both end up as a
//! [`ConfigError`]. Unknown keys carry a Jaro-Winkler suggestion and, when
//! the offending file is known, a span pointing at the key.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Minimum Jaro-Winkler similarity for a "did you mean" hint.
const SUGGESTION_THRESHOLD: f64 = 0.75;

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown key `{}`", dotted(.section, .key))]
    #[diagnostic(
        code(courier::config::unknown_key),
        help("{}", unknown_key_help(section, suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        /// Section holding the key, empty for a top-level entry.
        section: String,
        key: String,
        suggestion: Option<String>,
        /// Comma-separated keys accepted in `section`.
        valid_keys: String,
        #[label("not a courier setting")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value that does not deserialize into its field, such as a string
    /// cap or an unknown TLS mode.
    #[error("invalid value for `{key}`: {detail}")]
    #[diagnostic(code(courier::config::invalid_value))]
    InvalidValue { key: String, detail: String },

    #[error("`{key}` must be at least {min}")]
    #[diagnostic(
        code(courier::config::below_minimum),
        help("a value of 0 would stop the engine from sending")
    )]
    BelowMinimum { key: &'static str, min: u64 },

    #[error("`{key}` must not be empty")]
    #[diagnostic(code(courier::config::blank))]
    Blank { key: &'static str },

    #[error("`{key}` = `{value}` is not an http(s) URL")]
    #[diagnostic(
        code(courier::config::site_url),
        help("opt-out and tracking links are built on it, e.g. `https://crm.example.com/`")
    )]
    NotHttpUrl { key: &'static str, value: String },

    #[error("`smtp.from_address` = `{address}` is not an email address")]
    #[diagnostic(
        code(courier::config::sender),
        help("use a full mailbox such as `courier@example.com`")
    )]
    InvalidSender { address: String },

    #[error("`smtp.username` and `smtp.password` must be set together")]
    #[diagnostic(code(courier::config::smtp_credentials))]
    IncompleteCredentials,

    #[error("unknown log level `{level}`")]
    #[diagnostic(
        code(courier::config::log_level),
        help("use one of: trace, debug, info, warn, error")
    )]
    UnknownLogLevel { level: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(courier::config::other))]
    Other(String),
}

fn dotted(section: &str, key: &str) -> String {
    if section.is_empty() {
        key.to_string()
    } else {
        format!("{section}.{key}")
    }
}

fn unknown_key_help(section: &str, suggestion: Option<&str>, valid_keys: &str) -> String {
    let scope = if section.is_empty() {
        "sections".to_string()
    } else {
        format!("keys in [{section}]")
    };
    match suggestion {
        Some(s) => format!("did you mean `{}`? valid {scope}: {valid_keys}", dotted(section, s)),
        None => format!("valid {scope}: {valid_keys}"),
    }
}

/// Best match for `unknown` among `candidates`, if any is similar enough.
pub fn suggest_key(unknown: &str, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .map(|candidate| (strsim::jaro_winkler(unknown, candidate), *candidate))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, candidate)| candidate.to_string())
}

/// Byte offset of `key` inside `[section]` of a TOML document.
///
/// An empty `section` matches a `[key]` header or a bare top-level `key =`.
pub fn locate_key(content: &str, section: &str, key: &str) -> Option<usize> {
    let mut current = "";
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        let trimmed = line.trim_start();
        let indent = line.len() - trimmed.len();
        if let Some(header) = trimmed.strip_prefix('[') {
            let name = header.split(']').next().unwrap_or_default().trim();
            if section.is_empty() && name == key {
                return Some(offset + indent + 1);
            }
            current = name;
        } else if current == section
            && trimmed
                .strip_prefix(key)
                .is_some_and(|rest| rest.trim_start().starts_with('='))
        {
            return Some(offset + indent);
        }
        offset += line.len();
    }
    None
}

/// Convert figment's errors into diagnostics.
///
/// `sources` holds `(path, content)` pairs of the TOML files that were
/// merged, used to attach spans to unknown keys.
pub fn figment_to_config_errors(
    err: figment::Error,
    sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| {
            let path: Vec<String> = error.path.clone();
            match &error.kind {
                Kind::UnknownField(key, expected) => {
                    let section = path.first().cloned().unwrap_or_default();
                    let (span, src) = key_source(&error, &section, key, sources);
                    ConfigError::UnknownKey {
                        suggestion: suggest_key(key, expected),
                        valid_keys: expected.join(", "),
                        section,
                        key: key.clone(),
                        span,
                        src,
                    }
                }
                Kind::InvalidType(actual, expected) => ConfigError::InvalidValue {
                    key: path.join("."),
                    detail: format!("found {actual}, expected {expected}"),
                },
                Kind::InvalidValue(actual, expected) => ConfigError::InvalidValue {
                    key: path.join("."),
                    detail: format!("found {actual}, expected {expected}"),
                },
                Kind::UnknownVariant(found, allowed) => ConfigError::InvalidValue {
                    key: path.join("."),
                    detail: format!("`{found}` is not one of: {}", allowed.join(", ")),
                },
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

fn key_source(
    error: &figment::Error,
    section: &str,
    key: &str,
    sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let file = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|source| match source {
            figment::Source::File(path) => Some(path.display().to_string()),
            _ => None,
        });
    let found = sources
        .iter()
        .filter(|(path, _)| file.as_deref().is_none_or(|f| f == path.as_str()))
        .find_map(|(path, content)| {
            locate_key(content, section, key).map(|offset| (path, content, offset))
        });
    match found {
        Some((path, content, offset)) => (
            Some(SourceSpan::new(offset.into(), key.len())),
            Some(NamedSource::new(path, content.clone())),
        ),
        None => (None, None),
    }
}

/// Print every diagnostic to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut out = String::new();
        match handler.render_report(&mut out, error) {
            Ok(()) => eprint!("{out}"),
            Err(_) => eprintln!("error: {error}"),
        }
    }
}
