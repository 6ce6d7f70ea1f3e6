// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Timestamp formatting shared by storage and the engine.
//!
//! Every persisted timestamp uses the same fixed-width RFC 3339 UTC layout,
//! so lexicographic comparison in SQL matches chronological order.

use chrono::{DateTime, Utc};

/// `2026-01-31T12:00:00.000Z`
pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Format an instant in the persisted layout.
pub fn format(at: DateTime<Utc>) -> String {
    at.format(FORMAT).to_string()
}

/// The current instant in the persisted layout.
pub fn now() -> String {
    format(Utc::now())
}
