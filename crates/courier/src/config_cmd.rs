// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `courier config` command implementation.

use courier_config::CourierConfig;
use courier_core::CourierError;

const REDACTED: &str = "********";

/// Render the effective configuration as TOML, with the SMTP password masked.
pub fn show(config: &CourierConfig) -> Result<String, CourierError> {
    let mut config = config.clone();
    if config.smtp.password.is_some() {
        config.smtp.password = Some(REDACTED.to_string());
    }
    toml::to_string_pretty(&config)
        .map_err(|e| CourierError::Config(format!("cannot render configuration: {e}")))
}
