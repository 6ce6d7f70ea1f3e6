// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Derive a mass email's terminal status from its queue.

use courier_core::types::{MassEmailId, MassEmailStatus};
use courier_core::{CourierError, MassEmailStore};
use tracing::info;

/// Remaining Pending entries after a batch, and whether the mass email completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub remaining: u64,
    pub completed: bool,
}

/// Move the mass email from InProcess to Complete once nothing is Pending.
///
/// The transition is guarded, so a mass email that was failed concurrently
/// stays Failed.
pub async fn aggregate_status(
    store: &dyn MassEmailStore,
    id: &MassEmailId,
) -> Result<Progress, CourierError> {
    let remaining = store.count_pending(id).await?;
    let completed = remaining == 0
        && store
            .transition_mass_email(id, MassEmailStatus::InProcess, MassEmailStatus::Complete)
            .await?;
    if completed {
        info!(mass_email_id = %id, "mass email complete");
    }
    Ok(Progress {
        remaining,
        completed,
    })
}
