// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Courier mass-email engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Courier configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CourierConfig {
    /// Queue draining, rate cap, and retry settings.
    #[serde(default)]
    pub mass_email: MassEmailConfig,

    /// Public site settings used to build opt-out and tracking links.
    #[serde(default)]
    pub site: SiteConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Outbound SMTP relay settings.
    #[serde(default)]
    pub smtp: SmtpConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Queue draining configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MassEmailConfig {
    /// Maximum messages sent across all mass emails in any trailing hour.
    #[serde(default = "default_max_per_hour")]
    pub max_per_hour: u32,

    /// Transport attempts before an entry is marked Failed.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Seconds a claimed entry stays reserved for its batch.
    #[serde(default = "default_claim_lease_secs")]
    pub claim_lease_secs: u64,

    /// Entries dispatched in parallel within one batch.
    #[serde(default = "default_max_concurrent_sends")]
    pub max_concurrent_sends: usize,

    /// Scheduler tick interval for `courier serve`.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl Default for MassEmailConfig {
    fn default() -> Self {
        Self {
            max_per_hour: default_max_per_hour(),
            max_attempts: default_max_attempts(),
            claim_lease_secs: default_claim_lease_secs(),
            max_concurrent_sends: default_max_concurrent_sends(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

fn default_max_per_hour() -> u32 {
    100
}

fn default_max_attempts() -> u32 {
    3
}

fn default_claim_lease_secs() -> u64 {
    300
}

fn default_max_concurrent_sends() -> usize {
    4
}

fn default_poll_interval_secs() -> u64 {
    60
}

/// Public site configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Base URL that serves the unsubscribe and tracking entry points.
    #[serde(default = "default_site_url")]
    pub url: String,

    /// Appended to `url`, followed by the queue entry id.
    #[serde(default = "default_unsubscribe_path")]
    pub unsubscribe_path: String,

    /// Appended to `url`, followed by the tracking link id.
    #[serde(default = "default_tracking_path")]
    pub tracking_path: String,

    /// Text of the generated opt-out hyperlink.
    #[serde(default = "default_opt_out_label")]
    pub opt_out_label: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            url: default_site_url(),
            unsubscribe_path: default_unsubscribe_path(),
            tracking_path: default_tracking_path(),
            opt_out_label: default_opt_out_label(),
        }
    }
}

fn default_site_url() -> String {
    "http://localhost".to_string()
}

fn default_unsubscribe_path() -> String {
    "?entryPoint=unsubscribe&id=".to_string()
}

fn default_tracking_path() -> String {
    "?entryPoint=campaignUrl&id=".to_string()
}

fn default_opt_out_label() -> String {
    "Unsubscribe".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("courier").join("courier.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("courier.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Connection security for the SMTP relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SmtpTls {
    /// Plain connection, no encryption.
    None,
    /// Upgrade with STARTTLS after connecting.
    Starttls,
    /// Implicit TLS from the first byte.
    Tls,
}

/// Outbound SMTP relay configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SmtpConfig {
    #[serde(default = "default_smtp_host")]
    pub host: String,

    #[serde(default = "default_smtp_port")]
    pub port: u16,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default = "default_smtp_tls")]
    pub tls: SmtpTls,

    /// Sender address used when a mass email has no override.
    #[serde(default = "default_from_address")]
    pub from_address: String,

    #[serde(default)]
    pub from_name: Option<String>,

    /// Per-message send timeout.
    #[serde(default = "default_smtp_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: default_smtp_host(),
            port: default_smtp_port(),
            username: None,
            password: None,
            tls: default_smtp_tls(),
            from_address: default_from_address(),
            from_name: None,
            timeout_secs: default_smtp_timeout_secs(),
        }
    }
}

fn default_smtp_host() -> String {
    "localhost".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_smtp_tls() -> SmtpTls {
    SmtpTls::Starttls
}

fn default_from_address() -> String {
    "courier@localhost".to_string()
}

fn default_smtp_timeout_secs() -> u64 {
    30
}

/// Log output configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
