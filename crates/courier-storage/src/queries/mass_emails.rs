// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mass email records, their target lists, and status transitions.

use courier_core::CourierError;
use courier_core::types::{
    CampaignId, MassEmail, MassEmailId, MassEmailStatus, RecipientId, RecipientKind, TargetGroup,
    TemplateId,
};
use rusqlite::{OptionalExtension, Row, params};

use crate::database::{Database, map_tr_err, parse_column};

const MASS_EMAIL_COLUMNS: &str = "id, name, status, email_template_id, campaign_id,
     from_address, from_name, reply_to_address, reply_to_name, store_sent_emails";

fn row_to_mass_email(row: &Row<'_>) -> Result<MassEmail, rusqlite::Error> {
    Ok(MassEmail {
        id: MassEmailId(row.get(0)?),
        name: row.get(1)?,
        status: parse_column(2, row.get(2)?)?,
        email_template_id: row.get::<_, Option<String>>(3)?.map(TemplateId),
        campaign_id: row.get::<_, Option<String>>(4)?.map(CampaignId),
        from_address: row.get(5)?,
        from_name: row.get(6)?,
        reply_to_address: row.get(7)?,
        reply_to_name: row.get(8)?,
        store_sent_emails: row.get(9)?,
    })
}

/// Create a mass email attached to the given target lists, in order.
pub async fn insert_mass_email(
    db: &Database,
    mass_email: &MassEmail,
    target_list_ids: &[String],
) -> Result<(), CourierError> {
    let m = mass_email.clone();
    let target_list_ids = target_list_ids.to_vec();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO mass_emails (id, name, status, email_template_id, campaign_id,
                    from_address, from_name, reply_to_address, reply_to_name, store_sent_emails)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    m.id.0,
                    m.name,
                    m.status.to_string(),
                    m.email_template_id.map(|t| t.0),
                    m.campaign_id.map(|c| c.0),
                    m.from_address,
                    m.from_name,
                    m.reply_to_address,
                    m.reply_to_name,
                    m.store_sent_emails,
                ],
            )?;
            for (position, list_id) in target_list_ids.iter().enumerate() {
                tx.execute(
                    "INSERT INTO mass_email_target_lists (mass_email_id, target_list_id, position)
                     VALUES (?1, ?2, ?3)",
                    params![m.id.0, list_id, position as i64],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get a mass email by ID.
pub async fn get_mass_email(
    db: &Database,
    id: &MassEmailId,
) -> Result<Option<MassEmail>, CourierError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {MASS_EMAIL_COLUMNS} FROM mass_emails WHERE id = ?1"),
                params![id],
                row_to_mass_email,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// List mass emails in a given status, oldest first.
pub async fn list_mass_emails(
    db: &Database,
    status: MassEmailStatus,
) -> Result<Vec<MassEmail>, CourierError> {
    let status = status.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MASS_EMAIL_COLUMNS} FROM mass_emails
                 WHERE status = ?1 ORDER BY created_at ASC, id ASC"
            ))?;
            let rows = stmt.query_map(params![status], row_to_mass_email)?;
            let mass_emails = rows.collect::<Result<Vec<_>, _>>()?;
            Ok(mass_emails)
        })
        .await
        .map_err(map_tr_err)
}

/// Compare-and-set the status of a mass email.
///
/// Returns `false` if the current status was not `from`.
pub async fn transition_mass_email(
    db: &Database,
    id: &MassEmailId,
    from: MassEmailStatus,
    to: MassEmailStatus,
) -> Result<bool, CourierError> {
    let id = id.0.clone();
    let from = from.to_string();
    let to = to.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE mass_emails SET status = ?3,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1 AND status = ?2",
                params![id, from, to],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Target lists of a mass email, each split by category, without opted-out members.
pub async fn target_groups(
    db: &Database,
    id: &MassEmailId,
) -> Result<Vec<TargetGroup>, CourierError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| {
            let mut lists = conn.prepare(
                "SELECT target_list_id FROM mass_email_target_lists
                 WHERE mass_email_id = ?1 ORDER BY position ASC",
            )?;
            let list_ids = lists
                .query_map(params![id], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;

            let mut members = conn.prepare(
                "SELECT target_type, target_id FROM target_list_members
                 WHERE target_list_id = ?1 AND opted_out = 0
                 ORDER BY position ASC",
            )?;

            let mut groups = Vec::with_capacity(list_ids.len());
            for list_id in list_ids {
                let mut group = TargetGroup {
                    id: list_id.clone(),
                    ..TargetGroup::default()
                };
                let rows = members.query_map(params![list_id], |row| {
                    let kind: RecipientKind = parse_column(0, row.get(0)?)?;
                    let member: String = row.get(1)?;
                    Ok((kind, member))
                })?;
                for row in rows {
                    let (kind, member) = row?;
                    group.members_mut(kind).push(RecipientId(member));
                }
                groups.push(group);
            }
            Ok(groups)
        })
        .await
        .map_err(map_tr_err)
}

/// Fail a mass email and every Pending entry of it, in one transaction.
///
/// Attempt counts are not touched. Returns the number of entries failed.
pub async fn fail_mass_email(db: &Database, id: &MassEmailId) -> Result<u64, CourierError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "UPDATE mass_emails SET status = 'Failed',
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1",
                params![id],
            )?;
            let failed = tx.execute(
                "UPDATE email_queue_items SET status = 'Failed', claimed_until = NULL,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE mass_email_id = ?1 AND status = 'Pending'",
                params![id],
            )?;
            tx.commit()?;
            Ok(failed as u64)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::directory::{add_target_list_member, insert_target_list};
    use courier_core::types::RecipientRef;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn insert_and_get_mass_email() {
        let (db, _dir) = setup_db().await;

        let mut m = MassEmail::new("m1", "Spring sale");
        m.email_template_id = Some(TemplateId("t1".into()));
        m.from_name = Some("Sales".into());
        m.store_sent_emails = true;
        insert_mass_email(&db, &m, &[]).await.unwrap();

        let loaded = get_mass_email(&db, &MassEmailId("m1".into()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded, m);
        assert!(
            get_mass_email(&db, &MassEmailId("missing".into()))
                .await
                .unwrap()
                .is_none()
        );

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn transition_only_applies_from_expected_status() {
        let (db, _dir) = setup_db().await;
        let id = MassEmailId("m1".into());
        insert_mass_email(&db, &MassEmail::new("m1", "x"), &[])
            .await
            .unwrap();

        let applied = transition_mass_email(
            &db,
            &id,
            MassEmailStatus::InProcess,
            MassEmailStatus::Complete,
        )
        .await
        .unwrap();
        assert!(!applied);

        let applied = transition_mass_email(
            &db,
            &id,
            MassEmailStatus::Pending,
            MassEmailStatus::InProcess,
        )
        .await
        .unwrap();
        assert!(applied);

        let in_process = list_mass_emails(&db, MassEmailStatus::InProcess)
            .await
            .unwrap();
        assert_eq!(in_process.len(), 1);
        assert_eq!(in_process[0].status, MassEmailStatus::InProcess);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn target_groups_follow_attachment_order() {
        let (db, _dir) = setup_db().await;

        insert_target_list(&db, "tl-b", "B").await.unwrap();
        insert_target_list(&db, "tl-a", "A").await.unwrap();
        add_target_list_member(&db, "tl-b", &RecipientRef::new(RecipientKind::User, "u1"), false)
            .await
            .unwrap();
        add_target_list_member(&db, "tl-b", &RecipientRef::new(RecipientKind::Account, "a1"), false)
            .await
            .unwrap();
        add_target_list_member(&db, "tl-a", &RecipientRef::new(RecipientKind::Lead, "l1"), true)
            .await
            .unwrap();

        insert_mass_email(
            &db,
            &MassEmail::new("m1", "x"),
            &["tl-b".to_string(), "tl-a".to_string()],
        )
        .await
        .unwrap();

        let groups = target_groups(&db, &MassEmailId("m1".into())).await.unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].id, "tl-b");
        assert_eq!(groups[0].users, vec![RecipientId("u1".into())]);
        assert_eq!(groups[0].accounts, vec![RecipientId("a1".into())]);
        assert_eq!(groups[1].id, "tl-a");
        assert!(groups[1].leads.is_empty());

        db.close().await.unwrap();
    }
}
