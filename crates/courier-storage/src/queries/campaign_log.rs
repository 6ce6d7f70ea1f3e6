// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Campaign delivery log records.

use courier_core::CourierError;
use courier_core::types::{CampaignId, QueueItemId, Recipient, SentArtifact};
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::models::CampaignLogRecord;

/// Action recorded for every delivered campaign message.
pub const ACTION_SENT: &str = "Sent";

/// Append a "Sent" record for a delivered message.
pub async fn insert_log_record(
    db: &Database,
    campaign_id: &CampaignId,
    queue_item_id: QueueItemId,
    recipient: &Recipient,
    artifact: &SentArtifact,
    address: &str,
) -> Result<i64, CourierError> {
    let campaign_id = campaign_id.0.clone();
    let target_type = recipient.kind.to_string();
    let target_id = recipient.id.0.clone();
    let (object_type, object_id) = match artifact {
        SentArtifact::Template(id) => ("EmailTemplate", id.0.clone()),
        SentArtifact::Archived(id) => ("Email", id.clone()),
    };
    let address = address.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO campaign_log_records (campaign_id, queue_item_id, target_type,
                    target_id, action, object_type, object_id, email_address)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    campaign_id,
                    queue_item_id.0,
                    target_type,
                    target_id,
                    ACTION_SENT,
                    object_type,
                    object_id,
                    address,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

/// All log records of a campaign, oldest first.
pub async fn list_campaign_log(
    db: &Database,
    campaign_id: &CampaignId,
) -> Result<Vec<CampaignLogRecord>, CourierError> {
    let campaign_id = campaign_id.0.clone();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, campaign_id, queue_item_id, target_type, target_id, action,
                        object_type, object_id, email_address, created_at
                 FROM campaign_log_records
                 WHERE campaign_id = ?1
                 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![campaign_id], |row| {
                Ok(CampaignLogRecord {
                    id: row.get(0)?,
                    campaign_id: row.get(1)?,
                    queue_item_id: row.get(2)?,
                    target_type: row.get(3)?,
                    target_id: row.get(4)?,
                    action: row.get(5)?,
                    object_type: row.get(6)?,
                    object_id: row.get(7)?,
                    email_address: row.get(8)?,
                    created_at: row.get(9)?,
                })
            })?;
            let records = rows.collect::<Result<Vec<_>, _>>()?;
            Ok(records)
        })
        .await
        .map_err(map_tr_err)
}
