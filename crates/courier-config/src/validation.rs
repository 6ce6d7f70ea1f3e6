// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as positive caps, absolute site URLs, and non-empty paths.

use crate::diagnostic::ConfigError;
use crate::model::CourierConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &CourierConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mass_email = &config.mass_email;

    let minimums: [(&'static str, u64); 5] = [
        ("mass_email.max_per_hour", u64::from(mass_email.max_per_hour)),
        ("mass_email.max_attempts", u64::from(mass_email.max_attempts)),
        ("mass_email.max_concurrent_sends", mass_email.max_concurrent_sends as u64),
        ("mass_email.claim_lease_secs", mass_email.claim_lease_secs),
        ("mass_email.poll_interval_secs", mass_email.poll_interval_secs),
    ];
    for (key, value) in minimums {
        if value < 1 {
            errors.push(ConfigError::BelowMinimum { key, min: 1 });
        }
    }

    let url = config.site.url.trim();
    if url.is_empty() {
        errors.push(ConfigError::Blank { key: "site.url" });
    } else if !(url.starts_with("http://") || url.starts_with("https://")) {
        errors.push(ConfigError::NotHttpUrl {
            key: "site.url",
            value: url.to_string(),
        });
    }

    let required = [
        ("site.unsubscribe_path", &config.site.unsubscribe_path),
        ("site.tracking_path", &config.site.tracking_path),
        ("storage.database_path", &config.storage.database_path),
        ("smtp.host", &config.smtp.host),
    ];
    for (key, value) in required {
        if value.trim().is_empty() {
            errors.push(ConfigError::Blank { key });
        }
    }

    if !config.smtp.from_address.contains('@') {
        errors.push(ConfigError::InvalidSender {
            address: config.smtp.from_address.clone(),
        });
    }

    if config.smtp.username.is_some() != config.smtp.password.is_some() {
        errors.push(ConfigError::IncompleteCredentials);
    }

    if !LOG_LEVELS.contains(&config.logging.level.as_str()) {
        errors.push(ConfigError::UnknownLogLevel {
            level: config.logging.level.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
