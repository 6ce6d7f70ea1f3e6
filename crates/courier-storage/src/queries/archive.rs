// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Archived copies of delivered messages.

use courier_core::CourierError;
use courier_core::types::{MassEmailId, QueueItemId, SentEmail};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};

/// Archive a delivered message.
pub async fn store_sent_email(db: &Database, email: &SentEmail) -> Result<(), CourierError> {
    let e = email.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO sent_emails (id, mass_email_id, queue_item_id, to_address,
                    from_address, subject, body, is_html, sent_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    e.id,
                    e.mass_email_id.0,
                    e.queue_item_id.0,
                    e.to,
                    e.from,
                    e.subject,
                    e.body,
                    e.is_html,
                    e.sent_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get an archived message by ID.
pub async fn get_sent_email(db: &Database, id: &str) -> Result<Option<SentEmail>, CourierError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT id, mass_email_id, queue_item_id, to_address, from_address,
                        subject, body, is_html, sent_at
                 FROM sent_emails WHERE id = ?1",
                params![id],
                |row| {
                    Ok(SentEmail {
                        id: row.get(0)?,
                        mass_email_id: MassEmailId(row.get(1)?),
                        queue_item_id: QueueItemId(row.get(2)?),
                        to: row.get(3)?,
                        from: row.get(4)?,
                        subject: row.get(5)?,
                        body: row.get(6)?,
                        is_html: row.get(7)?,
                        sent_at: row.get(8)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn store_and_get_sent_email() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();

        let email = SentEmail {
            id: "se-1".into(),
            mass_email_id: MassEmailId("m1".into()),
            queue_item_id: QueueItemId(7),
            to: "a@example.com".into(),
            from: Some("news@example.com".into()),
            subject: "Hello".into(),
            body: "<p>Hi</p>".into(),
            is_html: true,
            sent_at: "2026-01-01T10:00:00.000Z".into(),
        };
        store_sent_email(&db, &email).await.unwrap();

        let loaded = get_sent_email(&db, "se-1").await.unwrap().unwrap();
        assert_eq!(loaded, email);
        assert!(get_sent_email(&db, "se-2").await.unwrap().is_none());

        db.close().await.unwrap();
    }
}
