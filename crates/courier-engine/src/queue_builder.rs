// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Build the send queue of a Pending mass email.

use courier_core::types::{MassEmailId, MassEmailStatus, RecipientRef};
use courier_core::{CourierError, MassEmailStore};
use serde::Serialize;
use tracing::{debug, info};

use crate::collector::collect_targets;
use crate::suppression::SuppressionFilter;

/// Counts reported by a queue build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueSummary {
    pub created: u64,
    /// Pending and Failed entries removed from a previous build.
    pub deleted: u64,
    pub skipped_no_address: u64,
    pub skipped_suppressed: u64,
    /// Recipients that already hold a Sent entry in this mass email.
    pub skipped_already_sent: u64,
    pub status: MassEmailStatus,
}

/// Turns target lists into persisted Pending queue entries.
pub struct QueueBuilder<'a> {
    store: &'a dyn MassEmailStore,
}

impl<'a> QueueBuilder<'a> {
    pub fn new(store: &'a dyn MassEmailStore) -> Self {
        Self { store }
    }

    /// Rebuild the queue and move the mass email to InProcess, or Complete
    /// when no entry was created.
    ///
    /// Fails with `InvalidState` unless the mass email is Pending, and with
    /// `NotFound` if it does not exist. Neither case writes anything.
    pub async fn build(&self, id: &MassEmailId) -> Result<QueueSummary, CourierError> {
        let mass_email =
            self.store
                .get_mass_email(id)
                .await?
                .ok_or_else(|| CourierError::NotFound {
                    entity: "mass email",
                    id: id.to_string(),
                })?;
        if mass_email.status != MassEmailStatus::Pending {
            return Err(CourierError::InvalidState {
                id: id.to_string(),
                expected: MassEmailStatus::Pending,
                actual: mass_email.status,
            });
        }

        let groups = self.store.target_groups(id).await?;
        let candidates = collect_targets(&groups);
        let suppression = SuppressionFilter::new(self.store);

        let mut targets: Vec<RecipientRef> = Vec::with_capacity(candidates.len());
        let mut skipped_no_address = 0u64;
        let mut skipped_suppressed = 0u64;
        for candidate in candidates {
            let recipient = self.store.get_recipient(&candidate).await?;
            let Some(address) = recipient.as_ref().and_then(|r| r.address()) else {
                debug!(mass_email_id = %id, target = %candidate, "skipping recipient without address");
                skipped_no_address += 1;
                continue;
            };
            if suppression.is_suppressed(address).await? {
                debug!(mass_email_id = %id, target = %candidate, "skipping suppressed address");
                skipped_suppressed += 1;
                continue;
            }
            targets.push(candidate);
        }

        let outcome = match self.store.rebuild_queue(id, &targets).await? {
            Some(outcome) => outcome,
            None => {
                // Status moved between the check above and the rebuild.
                let actual = self
                    .store
                    .get_mass_email(id)
                    .await?
                    .map(|m| m.status)
                    .ok_or_else(|| CourierError::NotFound {
                        entity: "mass email",
                        id: id.to_string(),
                    })?;
                return Err(CourierError::InvalidState {
                    id: id.to_string(),
                    expected: MassEmailStatus::Pending,
                    actual,
                });
            }
        };

        let summary = QueueSummary {
            created: outcome.inserted,
            deleted: outcome.deleted,
            skipped_no_address,
            skipped_suppressed,
            skipped_already_sent: targets.len() as u64 - outcome.inserted,
            status: outcome.status,
        };
        info!(
            mass_email_id = %id,
            created = summary.created,
            deleted = summary.deleted,
            skipped_no_address = summary.skipped_no_address,
            skipped_suppressed = summary.skipped_suppressed,
            skipped_already_sent = summary.skipped_already_sent,
            status = %summary.status,
            "queue built"
        );
        Ok(summary)
    }
}
