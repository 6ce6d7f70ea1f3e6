// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue operations for rate-limited, crash-safe mass email delivery.
//!
//! Every transition out of Pending is guarded by `status = 'Pending'` so a
//! terminal entry is never rewritten. Batches reserve entries with a
//! `claimed_until` lease instead of a separate status; an expired lease makes
//! the entry selectable again.

use courier_core::CourierError;
use courier_core::types::{
    ClaimRequest, ClaimedBatch, MassEmailId, MassEmailStatus, Pagination, QueueItem, QueueItemId,
    QueuePage, RebuildOutcome, RecipientId, RecipientRef,
};
use rusqlite::{OptionalExtension, Row, params};

use crate::database::{Database, map_tr_err, parse_column};

const QUEUE_COLUMNS: &str = "id, mass_email_id, target_type, target_id, status, attempt_count,
     sent_at, email_address, created_at";

fn row_to_queue_item(row: &Row<'_>) -> Result<QueueItem, rusqlite::Error> {
    Ok(QueueItem {
        id: QueueItemId(row.get(0)?),
        mass_email_id: MassEmailId(row.get(1)?),
        target: RecipientRef {
            kind: parse_column(2, row.get(2)?)?,
            id: RecipientId(row.get(3)?),
        },
        status: parse_column(4, row.get(4)?)?,
        attempt_count: row.get(5)?,
        sent_at: row.get(6)?,
        email_address: row.get(7)?,
        created_at: row.get(8)?,
    })
}

/// Rebuild the queue of a Pending mass email in one transaction.
///
/// Pending and Failed entries are deleted; Sent entries stay as history and,
/// through the unique target index, keep their recipient from being queued
/// again. Returns `None` without writing if the mass email is not Pending.
pub async fn rebuild_queue(
    db: &Database,
    id: &MassEmailId,
    targets: &[RecipientRef],
) -> Result<Option<RebuildOutcome>, CourierError> {
    let id = id.0.clone();
    let targets = targets.to_vec();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let status: Option<String> = tx
                .query_row(
                    "SELECT status FROM mass_emails WHERE id = ?1",
                    params![id],
                    |row| row.get(0),
                )
                .optional()?;
            let status: Option<MassEmailStatus> =
                status.map(|s| parse_column(0, s)).transpose()?;
            if status != Some(MassEmailStatus::Pending) {
                tx.commit()?;
                return Ok(None);
            }

            let deleted = tx.execute(
                "DELETE FROM email_queue_items
                 WHERE mass_email_id = ?1 AND status IN ('Pending', 'Failed')",
                params![id],
            )? as u64;

            let mut inserted = 0u64;
            {
                let mut insert = tx.prepare(
                    "INSERT OR IGNORE INTO email_queue_items (mass_email_id, target_type, target_id)
                     VALUES (?1, ?2, ?3)",
                )?;
                for target in &targets {
                    inserted +=
                        insert.execute(params![id, target.kind.to_string(), target.id.0])? as u64;
                }
            }

            let next = if inserted == 0 {
                MassEmailStatus::Complete
            } else {
                MassEmailStatus::InProcess
            };
            tx.execute(
                "UPDATE mass_emails SET status = ?2,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1",
                params![id, next.to_string()],
            )?;
            tx.commit()?;

            Ok(Some(RebuildOutcome {
                deleted,
                inserted,
                status: next,
            }))
        })
        .await
        .map_err(map_tr_err)
}

/// Compute the shared send budget and claim a batch in one transaction.
///
/// The budget is `cap` minus entries Sent since `window_start` minus live
/// claims held by other batches, all counted across every mass email. Calls
/// are serialized on the writer thread, so concurrent batches never claim
/// more than the cap between them.
pub async fn claim_batch(db: &Database, req: &ClaimRequest) -> Result<ClaimedBatch, CourierError> {
    let req = req.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let sent_in_window: i64 = tx.query_row(
                "SELECT COUNT(*) FROM email_queue_items
                 WHERE status = 'Sent' AND sent_at > ?1",
                params![req.window_start],
                |row| row.get(0),
            )?;
            let in_flight: i64 = tx.query_row(
                "SELECT COUNT(*) FROM email_queue_items
                 WHERE status = 'Pending' AND claimed_until IS NOT NULL AND claimed_until > ?1",
                params![req.now],
                |row| row.get(0),
            )?;

            let budget = i64::from(req.cap) - sent_in_window - in_flight;
            let mut entries = Vec::new();

            if budget > 0 {
                {
                    let mut stmt = tx.prepare(&format!(
                        "SELECT {QUEUE_COLUMNS} FROM email_queue_items
                         WHERE mass_email_id = ?1 AND status = 'Pending'
                           AND (claimed_until IS NULL OR claimed_until <= ?2)
                         ORDER BY id ASC
                         LIMIT ?3"
                    ))?;
                    let rows = stmt.query_map(
                        params![req.mass_email_id.0, req.now, budget],
                        row_to_queue_item,
                    )?;
                    for row in rows {
                        entries.push(row?);
                    }
                }

                let mut claim = tx.prepare(
                    "UPDATE email_queue_items SET claimed_until = ?2,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     WHERE id = ?1",
                )?;
                for entry in &entries {
                    claim.execute(params![entry.id.0, req.lease_until])?;
                }
            }

            tx.commit()?;
            Ok(ClaimedBatch {
                sent_in_window: sent_in_window as u64,
                in_flight: in_flight as u64,
                budget,
                entries,
            })
        })
        .await
        .map_err(map_tr_err)
}

/// Get a queue entry by ID.
pub async fn get_queue_item(
    db: &Database,
    id: QueueItemId,
) -> Result<Option<QueueItem>, CourierError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {QUEUE_COLUMNS} FROM email_queue_items WHERE id = ?1"),
                params![id.0],
                row_to_queue_item,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Persist the attempt count before a transport call.
pub async fn record_attempt(
    db: &Database,
    id: QueueItemId,
    attempt_count: u32,
) -> Result<(), CourierError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE email_queue_items SET attempt_count = ?2,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1 AND status = 'Pending'",
                params![id.0, attempt_count],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Mark a Pending entry Sent with its send time and resolved address.
pub async fn mark_sent(
    db: &Database,
    id: QueueItemId,
    sent_at: &str,
    address: &str,
) -> Result<bool, CourierError> {
    let sent_at = sent_at.to_string();
    let address = address.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE email_queue_items SET status = 'Sent', sent_at = ?2,
                 email_address = ?3, claimed_until = NULL,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1 AND status = 'Pending'",
                params![id.0, sent_at, address],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Mark a Pending entry Failed. The attempt count is left as is.
pub async fn mark_failed(db: &Database, id: QueueItemId) -> Result<bool, CourierError> {
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE email_queue_items SET status = 'Failed', claimed_until = NULL,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1 AND status = 'Pending'",
                params![id.0],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Drop the claim on a Pending entry so the next batch can select it.
pub async fn release_claim(db: &Database, id: QueueItemId) -> Result<(), CourierError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE email_queue_items SET claimed_until = NULL,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1 AND status = 'Pending'",
                params![id.0],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Push the lease of still-claimed Pending entries out to `lease_until`.
///
/// Entries that reached a terminal status or had their claim released are
/// left alone. Returns the number of leases extended.
pub async fn extend_claims(
    db: &Database,
    ids: &[QueueItemId],
    lease_until: &str,
) -> Result<u64, CourierError> {
    let ids: Vec<i64> = ids.iter().map(|id| id.0).collect();
    let lease_until = lease_until.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let mut extended = 0u64;
            {
                let mut stmt = tx.prepare(
                    "UPDATE email_queue_items SET claimed_until = ?2
                     WHERE id = ?1 AND status = 'Pending' AND claimed_until IS NOT NULL",
                )?;
                for id in &ids {
                    extended += stmt.execute(params![id, lease_until])? as u64;
                }
            }
            tx.commit()?;
            Ok(extended)
        })
        .await
        .map_err(map_tr_err)
}

/// Count Pending entries of a mass email.
pub async fn count_pending(db: &Database, id: &MassEmailId) -> Result<u64, CourierError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM email_queue_items
                 WHERE mass_email_id = ?1 AND status = 'Pending'",
                params![id],
                |row| row.get(0),
            )?;
            Ok(count as u64)
        })
        .await
        .map_err(map_tr_err)
}

/// Count Sent entries across all mass emails with `sent_at` after `since`.
pub async fn count_sent_since(db: &Database, since: &str) -> Result<u64, CourierError> {
    let since = since.to_string();
    db.connection()
        .call(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM email_queue_items WHERE status = 'Sent' AND sent_at > ?1",
                params![since],
                |row| row.get(0),
            )?;
            Ok(count as u64)
        })
        .await
        .map_err(map_tr_err)
}

/// One page of a mass email's queue in creation order, plus the total count.
pub async fn list_queue_items(
    db: &Database,
    id: &MassEmailId,
    pagination: Pagination,
) -> Result<QueuePage, CourierError> {
    let id = id.0.clone();
    let limit = pagination.effective_limit();
    let offset = pagination.offset;
    db.connection()
        .call(move |conn| {
            let total: i64 = conn.query_row(
                "SELECT COUNT(*) FROM email_queue_items WHERE mass_email_id = ?1",
                params![id],
                |row| row.get(0),
            )?;
            let mut stmt = conn.prepare(&format!(
                "SELECT {QUEUE_COLUMNS} FROM email_queue_items
                 WHERE mass_email_id = ?1
                 ORDER BY id ASC
                 LIMIT ?2 OFFSET ?3"
            ))?;
            let rows = stmt.query_map(params![id, limit, offset], row_to_queue_item)?;
            let entries = rows.collect::<Result<Vec<_>, _>>()?;
            Ok(QueuePage {
                total: total as u64,
                entries,
            })
        })
        .await
        .map_err(map_tr_err)
}
