// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recipients, suppression records, target lists, templates, and tracking campaigns.
//!
//! These records are owned by campaign setup. The engine only reads them;
//! the insert functions exist for importers and test fixtures.

use courier_core::CourierError;
use courier_core::types::{
    Attachment, Campaign, CampaignId, EmailAddressRecord, EmailTemplate, Recipient, RecipientId,
    RecipientKind, RecipientRef, TemplateId, TrackingUrl,
};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err, parse_column};

/// Insert or replace a recipient record.
pub async fn upsert_recipient(db: &Database, recipient: &Recipient) -> Result<(), CourierError> {
    let recipient = recipient.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO recipients (target_type, id, name, email_address)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (target_type, id) DO UPDATE
                 SET name = excluded.name, email_address = excluded.email_address",
                params![
                    recipient.kind.to_string(),
                    recipient.id.0,
                    recipient.name,
                    recipient.email_address,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Remove a recipient record. Queue entries pointing at it are left untouched.
pub async fn delete_recipient(db: &Database, target: &RecipientRef) -> Result<(), CourierError> {
    let kind = target.kind.to_string();
    let id = target.id.0.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "DELETE FROM recipients WHERE target_type = ?1 AND id = ?2",
                params![kind, id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get a recipient by category and id.
pub async fn get_recipient(
    db: &Database,
    target: &RecipientRef,
) -> Result<Option<Recipient>, CourierError> {
    let kind = target.kind.to_string();
    let id = target.id.0.clone();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT target_type, id, name, email_address
                 FROM recipients WHERE target_type = ?1 AND id = ?2",
                params![kind, id],
                |row| {
                    Ok(Recipient {
                        kind: parse_column(0, row.get(0)?)?,
                        id: RecipientId(row.get(1)?),
                        name: row.get(2)?,
                        email_address: row.get(3)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Insert or replace the suppression record for an address.
pub async fn upsert_email_address(
    db: &Database,
    record: &EmailAddressRecord,
) -> Result<(), CourierError> {
    let record = record.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO email_addresses (address, invalid, opt_out) VALUES (?1, ?2, ?3)
                 ON CONFLICT (address) DO UPDATE
                 SET invalid = excluded.invalid, opt_out = excluded.opt_out",
                params![record.address, record.invalid, record.opt_out],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Look up a suppression record. Addresses compare case-insensitively.
pub async fn find_email_address(
    db: &Database,
    address: &str,
) -> Result<Option<EmailAddressRecord>, CourierError> {
    let address = address.trim().to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT address, invalid, opt_out FROM email_addresses WHERE address = ?1",
                params![address],
                |row| {
                    Ok(EmailAddressRecord {
                        address: row.get(0)?,
                        invalid: row.get(1)?,
                        opt_out: row.get(2)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Create a target list.
pub async fn insert_target_list(db: &Database, id: &str, name: &str) -> Result<(), CourierError> {
    let id = id.to_string();
    let name = name.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO target_lists (id, name) VALUES (?1, ?2)",
                params![id, name],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Append a member to a target list. Position is the next free slot in the list.
pub async fn add_target_list_member(
    db: &Database,
    target_list_id: &str,
    member: &RecipientRef,
    opted_out: bool,
) -> Result<(), CourierError> {
    let list_id = target_list_id.to_string();
    let kind = member.kind.to_string();
    let member_id = member.id.0.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO target_list_members (target_list_id, target_type, target_id, opted_out, position)
                 VALUES (?1, ?2, ?3, ?4,
                         (SELECT COALESCE(MAX(position), -1) + 1
                          FROM target_list_members WHERE target_list_id = ?1))",
                params![list_id, kind, member_id, opted_out],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Change a member's list-local opt-out flag.
pub async fn set_member_opted_out(
    db: &Database,
    target_list_id: &str,
    member: &RecipientRef,
    opted_out: bool,
) -> Result<(), CourierError> {
    let list_id = target_list_id.to_string();
    let kind = member.kind.to_string();
    let member_id = member.id.0.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE target_list_members SET opted_out = ?4
                 WHERE target_list_id = ?1 AND target_type = ?2 AND target_id = ?3",
                params![list_id, kind, member_id, opted_out],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Members of a target list that have not opted out, in insertion order.
pub async fn list_active_members(
    db: &Database,
    target_list_id: &str,
) -> Result<Vec<RecipientRef>, CourierError> {
    let list_id = target_list_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT target_type, target_id FROM target_list_members
                 WHERE target_list_id = ?1 AND opted_out = 0
                 ORDER BY position ASC",
            )?;
            let rows = stmt.query_map(params![list_id], |row| {
                let kind: RecipientKind = parse_column(0, row.get(0)?)?;
                Ok(RecipientRef {
                    kind,
                    id: RecipientId(row.get(1)?),
                })
            })?;
            let members = rows.collect::<Result<Vec<_>, _>>()?;
            Ok(members)
        })
        .await
        .map_err(map_tr_err)
}

/// Insert a template together with its attachments.
pub async fn insert_email_template(
    db: &Database,
    template: &EmailTemplate,
) -> Result<(), CourierError> {
    let template = template.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO email_templates (id, name, subject, body, is_html)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    template.id.0,
                    template.name,
                    template.subject,
                    template.body,
                    template.is_html,
                ],
            )?;
            for attachment in &template.attachments {
                tx.execute(
                    "INSERT INTO template_attachments (template_id, name, content_type, contents)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![
                        template.id.0,
                        attachment.name,
                        attachment.content_type,
                        attachment.contents,
                    ],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get a template and its attachments.
pub async fn get_email_template(
    db: &Database,
    id: &TemplateId,
) -> Result<Option<EmailTemplate>, CourierError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| {
            let template = conn
                .query_row(
                    "SELECT id, name, subject, body, is_html FROM email_templates WHERE id = ?1",
                    params![id],
                    |row| {
                        Ok(EmailTemplate {
                            id: TemplateId(row.get(0)?),
                            name: row.get(1)?,
                            subject: row.get(2)?,
                            body: row.get(3)?,
                            is_html: row.get(4)?,
                            attachments: Vec::new(),
                        })
                    },
                )
                .optional()?;

            let Some(mut template) = template else {
                return Ok(None);
            };

            let mut stmt = conn.prepare(
                "SELECT name, content_type, contents FROM template_attachments
                 WHERE template_id = ?1 ORDER BY id ASC",
            )?;
            let attachments = stmt.query_map(params![id], |row| {
                Ok(Attachment {
                    name: row.get(0)?,
                    content_type: row.get(1)?,
                    contents: row.get(2)?,
                })
            })?;
            template.attachments = attachments.collect::<Result<Vec<_>, _>>()?;
            Ok(Some(template))
        })
        .await
        .map_err(map_tr_err)
}

/// Insert a tracking campaign with its tracking links.
pub async fn insert_campaign(db: &Database, campaign: &Campaign) -> Result<(), CourierError> {
    let campaign = campaign.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO campaigns (id, name) VALUES (?1, ?2)",
                params![campaign.id.0, campaign.name],
            )?;
            for url in &campaign.tracking_urls {
                tx.execute(
                    "INSERT INTO campaign_tracking_urls (id, campaign_id, name, url_to_use)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![url.id, campaign.id.0, url.name, url.url_to_use],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get a tracking campaign and its tracking links.
pub async fn get_campaign(db: &Database, id: &CampaignId) -> Result<Option<Campaign>, CourierError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| {
            let name: Option<String> = conn
                .query_row(
                    "SELECT name FROM campaigns WHERE id = ?1",
                    params![id],
                    |row| row.get(0),
                )
                .optional()?;

            let Some(name) = name else {
                return Ok(None);
            };

            let mut stmt = conn.prepare(
                "SELECT id, name, url_to_use FROM campaign_tracking_urls
                 WHERE campaign_id = ?1 ORDER BY rowid ASC",
            )?;
            let urls = stmt.query_map(params![id], |row| {
                Ok(TrackingUrl {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    url_to_use: row.get(2)?,
                })
            })?;
            Ok(Some(Campaign {
                id: CampaignId(id.clone()),
                name,
                tracking_urls: urls.collect::<Result<Vec<_>, _>>()?,
            }))
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn contact(id: &str, email: Option<&str>) -> Recipient {
        Recipient {
            kind: RecipientKind::Contact,
            id: RecipientId(id.into()),
            name: format!("Contact {id}"),
            email_address: email.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn recipient_upsert_and_get() {
        let (db, _dir) = setup_db().await;

        upsert_recipient(&db, &contact("c1", Some("a@example.com")))
            .await
            .unwrap();
        upsert_recipient(&db, &contact("c1", Some("b@example.com")))
            .await
            .unwrap();

        let found = get_recipient(&db, &RecipientRef::new(RecipientKind::Contact, "c1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.email_address.as_deref(), Some("b@example.com"));

        let missing = get_recipient(&db, &RecipientRef::new(RecipientKind::Lead, "c1"))
            .await
            .unwrap();
        assert!(missing.is_none());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn address_lookup_is_case_insensitive() {
        let (db, _dir) = setup_db().await;

        upsert_email_address(
            &db,
            &EmailAddressRecord {
                address: "Jane@Example.com".into(),
                invalid: false,
                opt_out: true,
            },
        )
        .await
        .unwrap();

        let record = find_email_address(&db, "jane@example.COM")
            .await
            .unwrap()
            .unwrap();
        assert!(record.opt_out);
        assert!(!record.invalid);
        assert!(find_email_address(&db, "other@example.com").await.unwrap().is_none());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn active_members_skip_opted_out_and_keep_order() {
        let (db, _dir) = setup_db().await;

        insert_target_list(&db, "tl1", "Newsletter").await.unwrap();
        let a = RecipientRef::new(RecipientKind::Lead, "l2");
        let b = RecipientRef::new(RecipientKind::Lead, "l1");
        let c = RecipientRef::new(RecipientKind::Contact, "c1");
        add_target_list_member(&db, "tl1", &a, false).await.unwrap();
        add_target_list_member(&db, "tl1", &b, true).await.unwrap();
        add_target_list_member(&db, "tl1", &c, false).await.unwrap();

        let members = list_active_members(&db, "tl1").await.unwrap();
        assert_eq!(members, vec![a.clone(), c.clone()]);

        set_member_opted_out(&db, "tl1", &b, false).await.unwrap();
        let members = list_active_members(&db, "tl1").await.unwrap();
        assert_eq!(members, vec![a, b, c]);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn template_round_trips_with_attachments() {
        let (db, _dir) = setup_db().await;

        let template = EmailTemplate {
            id: TemplateId("t1".into()),
            name: "Spring".into(),
            subject: "Hello {{name}}".into(),
            body: "<p>Hi</p>".into(),
            is_html: true,
            attachments: vec![Attachment {
                name: "terms.pdf".into(),
                content_type: "application/pdf".into(),
                contents: vec![1, 2, 3],
            }],
        };
        insert_email_template(&db, &template).await.unwrap();

        let loaded = get_email_template(&db, &TemplateId("t1".into()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded, template);
        assert!(
            get_email_template(&db, &TemplateId("nope".into()))
                .await
                .unwrap()
                .is_none()
        );

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn campaign_loads_tracking_urls() {
        let (db, _dir) = setup_db().await;

        let campaign = Campaign {
            id: CampaignId("cmp1".into()),
            name: "Spring".into(),
            tracking_urls: vec![TrackingUrl {
                id: "tu1".into(),
                name: "Pricing".into(),
                url_to_use: "{trackingUrl:tu1}".into(),
            }],
        };
        insert_campaign(&db, &campaign).await.unwrap();

        let loaded = get_campaign(&db, &CampaignId("cmp1".into()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded, campaign);

        db.close().await.unwrap();
    }
}
