// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Address redaction for log output.

/// Replace the local part of an address, keeping the domain.
pub fn redact_email(email: &str) -> String {
    match email.split_once('@') {
        Some((_, domain)) => format!("[REDACTED]@{domain}"),
        None => "[REDACTED]".to_string(),
    }
}
