// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fail a mass email whose prerequisites are gone.

use courier_core::types::MassEmailId;
use courier_core::{CourierError, MassEmailStore};
use tracing::warn;

/// Set the mass email Failed and fail every Pending entry, without touching
/// attempt counts. Returns the number of entries failed.
pub async fn set_failed(
    store: &dyn MassEmailStore,
    id: &MassEmailId,
    reason: &str,
) -> Result<u64, CourierError> {
    let failed = store.fail_mass_email(id).await?;
    warn!(mass_email_id = %id, entries_failed = failed, reason, "mass email failed");
    Ok(failed)
}
