// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests of queue building and batched sending against a temp
//! SQLite database and the mock transport.

use std::sync::Arc;
use std::time::Duration;

use courier_core::types::{
    Attachment, Campaign, CampaignId, EmailTemplate, MassEmail, MassEmailId, MassEmailStatus,
    Pagination, QueueItemStatus, RecipientKind, TemplateId, TrackingUrl,
};
use courier_core::CourierError;
use courier_engine::{MassEmailService, SendOutcome};
use courier_storage::queries;
use courier_test_utils::{FailingLogger, TestHarness};

fn service(harness: &TestHarness) -> MassEmailService {
    MassEmailService::new(
        harness.store(),
        harness.renderer(),
        harness.mail_transport(),
        harness.logger(),
        &harness.config,
    )
}

fn processed(outcome: SendOutcome) -> courier_engine::BatchReport {
    match outcome {
        SendOutcome::Processed(report) => report,
        other => panic!("expected a processed batch, got {other:?}"),
    }
}

/// One list of `n` contacts, a plain template, and a Pending mass email.
async fn simple_mass_email(harness: &TestHarness, id: &str, n: usize) -> MassEmailId {
    let contacts = harness.add_contacts(id, n).await.unwrap();
    let list = format!("{id}-list");
    harness.add_target_list(&list, &contacts).await.unwrap();
    let template = harness
        .add_template(&format!("{id}-tpl"), "Hi {{name}}", "Hello {{name}}", false)
        .await
        .unwrap();
    harness
        .add_pending_mass_email(id, &template, &[&list])
        .await
        .unwrap()
}

// --- create_queue ---

#[tokio::test]
async fn overlapping_lists_queue_each_recipient_once() {
    let harness = TestHarness::builder().build().await.unwrap();
    let a = harness
        .add_recipient(RecipientKind::Contact, "a", "A", Some("a@example.com"))
        .await
        .unwrap();
    let b = harness
        .add_recipient(RecipientKind::Lead, "b", "B", Some("b@example.com"))
        .await
        .unwrap();
    let c = harness
        .add_recipient(RecipientKind::Contact, "c", "C", Some("c@example.com"))
        .await
        .unwrap();
    harness
        .add_target_list("l1", &[a.clone(), b.clone()])
        .await
        .unwrap();
    harness
        .add_target_list("l2", &[b.clone(), c.clone()])
        .await
        .unwrap();
    let template = harness.add_template("t", "s", "b", false).await.unwrap();
    let id = harness
        .add_pending_mass_email("m1", &template, &["l1", "l2"])
        .await
        .unwrap();
    let service = service(&harness);

    let summary = service.create_queue(&id).await.unwrap();
    assert_eq!(summary.created, 3);
    assert_eq!(summary.status, MassEmailStatus::InProcess);

    let page = service
        .list_queue_entries(&id, Pagination::default())
        .await
        .unwrap();
    let targets: Vec<_> = page.entries.iter().map(|e| e.target.clone()).collect();
    // l1 contacts, l1 leads, then l2 contacts.
    assert_eq!(targets, vec![a, b, c]);
    assert!(
        page.entries
            .iter()
            .all(|e| e.status == QueueItemStatus::Pending && e.attempt_count == 0)
    );
}

#[tokio::test]
async fn suppressed_and_addressless_recipients_are_skipped() {
    let harness = TestHarness::builder().build().await.unwrap();
    let ok = harness
        .add_recipient(RecipientKind::Contact, "ok", "Ok", Some("ok@example.com"))
        .await
        .unwrap();
    let opted = harness
        .add_recipient(RecipientKind::Contact, "opt", "Opt", Some("Opt@Example.com"))
        .await
        .unwrap();
    let invalid = harness
        .add_recipient(RecipientKind::Account, "bad", "Bad", Some("bad@example.com"))
        .await
        .unwrap();
    let blank = harness
        .add_recipient(RecipientKind::User, "blank", "Blank", Some("  "))
        .await
        .unwrap();
    harness
        .suppress("opt@example.com", false, true)
        .await
        .unwrap();
    harness
        .suppress("bad@example.com", true, false)
        .await
        .unwrap();
    harness
        .add_target_list("l1", &[ok.clone(), opted, invalid, blank])
        .await
        .unwrap();
    let template = harness.add_template("t", "s", "b", false).await.unwrap();
    let id = harness
        .add_pending_mass_email("m1", &template, &["l1"])
        .await
        .unwrap();

    let summary = service(&harness).create_queue(&id).await.unwrap();
    assert_eq!(summary.created, 1);
    assert_eq!(summary.skipped_suppressed, 2);
    assert_eq!(summary.skipped_no_address, 1);

    let page = harness
        .store()
        .list_queue_items(&id, Pagination::default())
        .await
        .unwrap();
    assert_eq!(page.entries.len(), 1);
    assert_eq!(page.entries[0].target, ok);
}

#[tokio::test]
async fn list_opt_out_excludes_member() {
    let harness = TestHarness::builder().build().await.unwrap();
    let contacts = harness.add_contacts("c", 2).await.unwrap();
    harness.add_target_list("l1", &contacts).await.unwrap();
    queries::directory::set_member_opted_out(harness.database().unwrap(), "l1", &contacts[1], true)
        .await
        .unwrap();
    let template = harness.add_template("t", "s", "b", false).await.unwrap();
    let id = harness
        .add_pending_mass_email("m1", &template, &["l1"])
        .await
        .unwrap();

    let summary = service(&harness).create_queue(&id).await.unwrap();
    assert_eq!(summary.created, 1);
}

#[tokio::test]
async fn empty_queue_completes_immediately() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.add_target_list("empty", &[]).await.unwrap();
    let template = harness.add_template("t", "s", "b", false).await.unwrap();
    let id = harness
        .add_pending_mass_email("m1", &template, &["empty"])
        .await
        .unwrap();
    let service = service(&harness);

    let summary = service.create_queue(&id).await.unwrap();
    assert_eq!(summary.created, 0);
    assert_eq!(summary.status, MassEmailStatus::Complete);
    assert_eq!(
        harness.mass_email_status(&id).await.unwrap(),
        Some(MassEmailStatus::Complete)
    );

    let outcome = service.process_sending(&id).await.unwrap();
    assert_eq!(
        outcome,
        SendOutcome::Skipped {
            status: MassEmailStatus::Complete
        }
    );
    assert_eq!(harness.transport.attempts().await, 0);
}

#[tokio::test]
async fn create_queue_rejects_non_pending_mass_email() {
    let harness = TestHarness::builder().build().await.unwrap();
    let id = simple_mass_email(&harness, "m1", 2).await;
    let service = service(&harness);
    service.create_queue(&id).await.unwrap();

    let err = service.create_queue(&id).await.unwrap_err();
    assert!(matches!(
        err,
        CourierError::InvalidState {
            expected: MassEmailStatus::Pending,
            actual: MassEmailStatus::InProcess,
            ..
        }
    ));
    let page = service
        .list_queue_entries(&id, Pagination::default())
        .await
        .unwrap();
    assert_eq!(page.total, 2);
}

#[tokio::test]
async fn draft_mass_email_is_not_queued() {
    let harness = TestHarness::builder().build().await.unwrap();
    let mut draft = MassEmail::new("d1", "Draft");
    draft.status = MassEmailStatus::Draft;
    let id = harness.add_mass_email(&draft, &[]).await.unwrap();

    let err = service(&harness).create_queue(&id).await.unwrap_err();
    assert!(matches!(
        err,
        CourierError::InvalidState {
            actual: MassEmailStatus::Draft,
            ..
        }
    ));
}

#[tokio::test]
async fn unknown_mass_email_is_not_found() {
    let harness = TestHarness::builder().build().await.unwrap();
    let service = service(&harness);
    let missing = MassEmailId("nope".into());

    assert!(matches!(
        service.create_queue(&missing).await,
        Err(CourierError::NotFound { .. })
    ));
    assert!(matches!(
        service.process_sending(&missing).await,
        Err(CourierError::NotFound { .. })
    ));
    assert!(matches!(
        service
            .list_queue_entries(&missing, Pagination::default())
            .await,
        Err(CourierError::NotFound { .. })
    ));
}

#[tokio::test]
async fn rebuild_keeps_sent_history() {
    let harness = TestHarness::builder()
        .with_max_per_hour(1)
        .build()
        .await
        .unwrap();
    let id = simple_mass_email(&harness, "m1", 3).await;
    let service = service(&harness);
    service.create_queue(&id).await.unwrap();
    processed(service.process_sending(&id).await.unwrap());

    let moved = queries::mass_emails::transition_mass_email(
        harness.database().unwrap(),
        &id,
        MassEmailStatus::InProcess,
        MassEmailStatus::Pending,
    )
    .await
    .unwrap();
    assert!(moved);

    let summary = service.create_queue(&id).await.unwrap();
    assert_eq!(summary.deleted, 2);
    assert_eq!(summary.created, 2);
    assert_eq!(summary.skipped_already_sent, 1);

    let page = service
        .list_queue_entries(&id, Pagination::default())
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    let sent = page
        .entries
        .iter()
        .filter(|e| e.status == QueueItemStatus::Sent)
        .count();
    assert_eq!(sent, 1);
}

// --- process_sending ---

#[tokio::test]
async fn sends_every_entry_and_completes() {
    let harness = TestHarness::builder().build().await.unwrap();
    let id = simple_mass_email(&harness, "m1", 3).await;
    let service = service(&harness);
    service.create_queue(&id).await.unwrap();

    let report = processed(service.process_sending(&id).await.unwrap());
    assert_eq!(report.claimed, 3);
    assert_eq!(report.sent, 3);
    assert_eq!(report.remaining, 0);
    assert!(report.completed);
    assert_eq!(
        harness.mass_email_status(&id).await.unwrap(),
        Some(MassEmailStatus::Complete)
    );

    let sent = harness.transport.sent().await;
    assert_eq!(sent.len(), 3);
    assert_eq!(sent[0].message.to, "m1-0@example.com");
    assert_eq!(sent[0].message.subject, "Hi m1-0");

    let page = service
        .list_queue_entries(&id, Pagination::default())
        .await
        .unwrap();
    for entry in &page.entries {
        assert_eq!(entry.status, QueueItemStatus::Sent);
        assert_eq!(entry.attempt_count, 1);
        assert!(entry.sent_at.is_some());
        assert!(entry.email_address.is_some());
    }
    // Each message carries its own entry id.
    let ids: Vec<_> = sent.iter().map(|s| s.correlation_id).collect();
    let entry_ids: Vec<_> = page.entries.iter().map(|e| e.id).collect();
    assert_eq!(ids, entry_ids);
}

#[tokio::test]
async fn hourly_cap_is_shared_across_mass_emails() {
    let harness = TestHarness::builder()
        .with_max_per_hour(100)
        .build()
        .await
        .unwrap();
    let first = simple_mass_email(&harness, "first", 95).await;
    let second = simple_mass_email(&harness, "second", 10).await;
    let service = service(&harness);
    service.create_queue(&first).await.unwrap();
    service.create_queue(&second).await.unwrap();

    let report = processed(service.process_sending(&first).await.unwrap());
    assert_eq!(report.sent, 95);

    let report = processed(service.process_sending(&second).await.unwrap());
    assert_eq!(report.claimed, 5);
    assert_eq!(report.sent, 5);
    assert_eq!(report.remaining, 5);
    assert!(!report.completed);

    assert_eq!(
        service.process_sending(&second).await.unwrap(),
        SendOutcome::RateLimited
    );
    assert_eq!(harness.transport.sent().await.len(), 100);
    assert_eq!(
        harness.mass_email_status(&second).await.unwrap(),
        Some(MassEmailStatus::InProcess)
    );
}

#[tokio::test]
async fn exhausted_attempts_mark_entry_failed() {
    let harness = TestHarness::builder()
        .with_max_attempts(3)
        .build()
        .await
        .unwrap();
    let id = simple_mass_email(&harness, "m1", 1).await;
    let service = service(&harness);
    service.create_queue(&id).await.unwrap();
    harness.transport.fail_next(3).await;

    let report = processed(service.process_sending(&id).await.unwrap());
    assert_eq!(report.retrying, 1);
    assert!(!report.completed);
    let report = processed(service.process_sending(&id).await.unwrap());
    assert_eq!(report.retrying, 1);
    let report = processed(service.process_sending(&id).await.unwrap());
    assert_eq!(report.failed, 1);
    assert!(report.completed);

    let page = service
        .list_queue_entries(&id, Pagination::default())
        .await
        .unwrap();
    assert_eq!(page.entries[0].status, QueueItemStatus::Failed);
    assert_eq!(page.entries[0].attempt_count, 3);
    assert_eq!(harness.transport.attempts().await, 3);
    assert_eq!(
        harness.mass_email_status(&id).await.unwrap(),
        Some(MassEmailStatus::Complete)
    );
}

#[tokio::test]
async fn transient_failures_recover_before_the_limit() {
    let harness = TestHarness::builder().build().await.unwrap();
    let id = simple_mass_email(&harness, "m1", 1).await;
    let service = service(&harness);
    service.create_queue(&id).await.unwrap();
    harness.transport.fail_next(2).await;

    service.process_sending(&id).await.unwrap();
    service.process_sending(&id).await.unwrap();
    let report = processed(service.process_sending(&id).await.unwrap());
    assert_eq!(report.sent, 1);
    assert!(report.completed);

    let page = service
        .list_queue_entries(&id, Pagination::default())
        .await
        .unwrap();
    assert_eq!(page.entries[0].status, QueueItemStatus::Sent);
    assert_eq!(page.entries[0].attempt_count, 3);
}

#[tokio::test]
async fn one_failing_address_does_not_block_the_batch() {
    let harness = TestHarness::builder()
        .with_max_attempts(1)
        .build()
        .await
        .unwrap();
    let id = simple_mass_email(&harness, "m1", 3).await;
    let service = service(&harness);
    service.create_queue(&id).await.unwrap();
    harness.transport.fail_address("m1-1@example.com").await;

    let report = processed(service.process_sending(&id).await.unwrap());
    assert_eq!(report.sent, 2);
    assert_eq!(report.failed, 1);
    assert!(report.completed);
}

#[tokio::test]
async fn address_suppressed_after_queueing_fails_without_sending() {
    let harness = TestHarness::builder().build().await.unwrap();
    let id = simple_mass_email(&harness, "m1", 2).await;
    let service = service(&harness);
    service.create_queue(&id).await.unwrap();
    harness
        .suppress("m1-0@example.com", false, true)
        .await
        .unwrap();

    let report = processed(service.process_sending(&id).await.unwrap());
    assert_eq!(report.sent, 1);
    assert_eq!(report.failed, 1);

    let page = service
        .list_queue_entries(&id, Pagination::default())
        .await
        .unwrap();
    assert_eq!(page.entries[0].status, QueueItemStatus::Failed);
    assert_eq!(page.entries[0].attempt_count, 0);
    assert_eq!(harness.transport.attempts().await, 1);
}

#[tokio::test]
async fn deleted_recipient_entry_fails_without_sending() {
    let harness = TestHarness::builder().build().await.unwrap();
    let id = simple_mass_email(&harness, "m1", 2).await;
    let service = service(&harness);
    service.create_queue(&id).await.unwrap();
    let page = service
        .list_queue_entries(&id, Pagination::default())
        .await
        .unwrap();
    queries::directory::delete_recipient(harness.database().unwrap(), &page.entries[1].target)
        .await
        .unwrap();

    let report = processed(service.process_sending(&id).await.unwrap());
    assert_eq!(report.sent, 1);
    assert_eq!(report.failed, 1);
    assert!(report.completed);
}

#[tokio::test]
async fn opt_out_link_is_appended_to_html_body() {
    let harness = TestHarness::builder().build().await.unwrap();
    let contacts = harness.add_contacts("c", 1).await.unwrap();
    harness.add_target_list("l1", &contacts).await.unwrap();
    let template = harness
        .add_template("t", "s", "<p>Hi {{name}}</p>", true)
        .await
        .unwrap();
    let id = harness
        .add_pending_mass_email("m1", &template, &["l1"])
        .await
        .unwrap();
    let service = service(&harness);
    service.create_queue(&id).await.unwrap();
    service.process_sending(&id).await.unwrap();

    let sent = harness.transport.sent().await;
    let entry = sent[0].correlation_id;
    assert_eq!(
        sent[0].message.body,
        format!(
            "<p>Hi c-0</p><br><br><a href=\"https://crm.example.com/?entryPoint=unsubscribe&id={entry}\">Unsubscribe</a>"
        )
    );
    assert!(sent[0].message.is_html);
}

#[tokio::test]
async fn tracked_campaign_rewrites_links_and_logs_delivery() {
    let harness = TestHarness::builder().build().await.unwrap();
    let contacts = harness.add_contacts("c", 1).await.unwrap();
    harness.add_target_list("l1", &contacts).await.unwrap();
    let template = harness
        .add_template("t", "s", "Shop {promo} {optOutUrl}", false)
        .await
        .unwrap();
    let campaign = harness
        .add_campaign(&Campaign {
            id: CampaignId("camp".into()),
            name: "Spring".into(),
            tracking_urls: vec![TrackingUrl {
                id: "tu1".into(),
                name: "Promo".into(),
                url_to_use: "{promo}".into(),
            }],
        })
        .await
        .unwrap();
    let mut mass_email = MassEmail::new("m1", "m1");
    mass_email.email_template_id = Some(template.clone());
    mass_email.campaign_id = Some(campaign.clone());
    let id = harness.add_mass_email(&mass_email, &["l1"]).await.unwrap();
    let service = service(&harness);
    service.create_queue(&id).await.unwrap();
    service.process_sending(&id).await.unwrap();

    let sent = harness.transport.sent().await;
    let entry = sent[0].correlation_id;
    assert_eq!(
        sent[0].message.body,
        format!(
            "Shop https://crm.example.com/?entryPoint=campaignUrl&id=tu1&queueItemId={entry} \
             https://crm.example.com/?entryPoint=unsubscribe&id={entry}"
        )
    );

    let log = queries::campaign_log::list_campaign_log(harness.database().unwrap(), &campaign)
        .await
        .unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].action, "Sent");
    assert_eq!(log[0].object_type, "EmailTemplate");
    assert_eq!(log[0].object_id, template.0);
    assert_eq!(log[0].queue_item_id, entry.0);
    assert_eq!(log[0].email_address, "c-0@example.com");
}

#[tokio::test]
async fn archived_copy_is_linked_from_campaign_log() {
    let harness = TestHarness::builder().build().await.unwrap();
    let contacts = harness.add_contacts("c", 1).await.unwrap();
    harness.add_target_list("l1", &contacts).await.unwrap();
    let template = harness
        .add_template("t", "Hello {{name}}", "Body", false)
        .await
        .unwrap();
    let campaign = harness
        .add_campaign(&Campaign {
            id: CampaignId("camp".into()),
            name: "Spring".into(),
            tracking_urls: vec![],
        })
        .await
        .unwrap();
    let mut mass_email = MassEmail::new("m1", "m1");
    mass_email.email_template_id = Some(template);
    mass_email.campaign_id = Some(campaign.clone());
    mass_email.store_sent_emails = true;
    let id = harness.add_mass_email(&mass_email, &["l1"]).await.unwrap();
    let service = service(&harness);
    service.create_queue(&id).await.unwrap();
    service.process_sending(&id).await.unwrap();

    let db = harness.database().unwrap();
    let log = queries::campaign_log::list_campaign_log(db, &campaign)
        .await
        .unwrap();
    assert_eq!(log[0].object_type, "Email");
    let archived = queries::archive::get_sent_email(db, &log[0].object_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(archived.to, "c-0@example.com");
    assert_eq!(archived.subject, "Hello c-0");
    assert_eq!(archived.mass_email_id, id);
}

#[tokio::test]
async fn campaign_log_failure_does_not_undo_send() {
    let harness = TestHarness::builder().build().await.unwrap();
    let contacts = harness.add_contacts("c", 1).await.unwrap();
    harness.add_target_list("l1", &contacts).await.unwrap();
    let template = harness.add_template("t", "s", "b", false).await.unwrap();
    let campaign = harness
        .add_campaign(&Campaign {
            id: CampaignId("camp".into()),
            name: "Spring".into(),
            tracking_urls: vec![],
        })
        .await
        .unwrap();
    let mut mass_email = MassEmail::new("m1", "m1");
    mass_email.email_template_id = Some(template);
    mass_email.campaign_id = Some(campaign);
    let id = harness.add_mass_email(&mass_email, &["l1"]).await.unwrap();

    let logger = Arc::new(FailingLogger::new());
    let service = MassEmailService::new(
        harness.store(),
        harness.renderer(),
        harness.mail_transport(),
        logger.clone(),
        &harness.config,
    );
    service.create_queue(&id).await.unwrap();
    let report = processed(service.process_sending(&id).await.unwrap());
    assert_eq!(report.sent, 1);
    assert!(report.completed);
    assert_eq!(logger.calls(), 1);
}

#[tokio::test]
async fn missing_campaign_sends_untracked() {
    let harness = TestHarness::builder().build().await.unwrap();
    let contacts = harness.add_contacts("c", 1).await.unwrap();
    harness.add_target_list("l1", &contacts).await.unwrap();
    let template = harness
        .add_template("t", "s", "Shop {promo}", false)
        .await
        .unwrap();
    let mut mass_email = MassEmail::new("m1", "m1");
    mass_email.email_template_id = Some(template);
    mass_email.campaign_id = Some(CampaignId("gone".into()));
    let id = harness.add_mass_email(&mass_email, &["l1"]).await.unwrap();
    let service = service(&harness);
    service.create_queue(&id).await.unwrap();

    let report = processed(service.process_sending(&id).await.unwrap());
    assert_eq!(report.sent, 1);
    let sent = harness.transport.sent().await;
    assert!(sent[0].message.body.starts_with("Shop {promo}\n\n"));
}

#[tokio::test]
async fn missing_template_fails_mass_email_and_entries() {
    let harness = TestHarness::builder().build().await.unwrap();
    let contacts = harness.add_contacts("c", 3).await.unwrap();
    harness.add_target_list("l1", &contacts).await.unwrap();
    let id = harness
        .add_pending_mass_email("m1", &TemplateId("gone".into()), &["l1"])
        .await
        .unwrap();
    let service = service(&harness);
    service.create_queue(&id).await.unwrap();

    let outcome = service.process_sending(&id).await.unwrap();
    assert_eq!(outcome, SendOutcome::CampaignFailed { entries_failed: 3 });
    assert_eq!(
        harness.mass_email_status(&id).await.unwrap(),
        Some(MassEmailStatus::Failed)
    );
    let page = service
        .list_queue_entries(&id, Pagination::default())
        .await
        .unwrap();
    assert!(
        page.entries
            .iter()
            .all(|e| e.status == QueueItemStatus::Failed)
    );
    assert_eq!(harness.transport.attempts().await, 0);

    assert_eq!(
        service.process_sending(&id).await.unwrap(),
        SendOutcome::Skipped {
            status: MassEmailStatus::Failed
        }
    );
}

#[tokio::test]
async fn sender_overrides_and_attachments_reach_transport() {
    let harness = TestHarness::builder().build().await.unwrap();
    let contacts = harness.add_contacts("c", 1).await.unwrap();
    harness.add_target_list("l1", &contacts).await.unwrap();
    let template = EmailTemplate {
        id: TemplateId("t".into()),
        name: "t".into(),
        subject: "s".into(),
        body: "b".into(),
        is_html: false,
        attachments: vec![Attachment {
            name: "terms.txt".into(),
            content_type: "text/plain".into(),
            contents: b"terms".to_vec(),
        }],
    };
    harness.add_full_template(&template).await.unwrap();
    let mut mass_email = MassEmail::new("m1", "m1");
    mass_email.email_template_id = Some(template.id.clone());
    mass_email.from_address = Some("sales@example.com".into());
    mass_email.from_name = Some("Sales".into());
    mass_email.reply_to_address = Some("help@example.com".into());
    mass_email.reply_to_name = Some("Help".into());
    let id = harness.add_mass_email(&mass_email, &["l1"]).await.unwrap();
    let service = service(&harness);
    service.create_queue(&id).await.unwrap();
    service.process_sending(&id).await.unwrap();

    let sent = harness.transport.sent().await;
    assert_eq!(
        sent[0].message.from_address.as_deref(),
        Some("sales@example.com")
    );
    assert_eq!(
        sent[0].message.reply_to_address.as_deref(),
        Some("help@example.com")
    );
    assert_eq!(sent[0].overrides.from_name.as_deref(), Some("Sales"));
    assert_eq!(sent[0].overrides.reply_to_name.as_deref(), Some("Help"));
    assert_eq!(sent[0].attachments, template.attachments);
}

#[tokio::test]
async fn terminal_mass_email_is_skipped() {
    let harness = TestHarness::builder().build().await.unwrap();
    let id = simple_mass_email(&harness, "m1", 1).await;
    let service = service(&harness);
    service.create_queue(&id).await.unwrap();
    processed(service.process_sending(&id).await.unwrap());

    let outcome = service.process_sending(&id).await.unwrap();
    assert_eq!(
        outcome,
        SendOutcome::Skipped {
            status: MassEmailStatus::Complete
        }
    );
    assert_eq!(harness.transport.attempts().await, 1);
}

#[tokio::test]
async fn pending_mass_email_is_skipped_by_sending() {
    let harness = TestHarness::builder().build().await.unwrap();
    let id = simple_mass_email(&harness, "m1", 1).await;

    let outcome = service(&harness).process_sending(&id).await.unwrap();
    assert_eq!(
        outcome,
        SendOutcome::Skipped {
            status: MassEmailStatus::Pending
        }
    );
}

#[tokio::test]
async fn concurrent_batches_respect_the_cap() {
    let harness = TestHarness::builder()
        .with_max_per_hour(7)
        .with_max_concurrent_sends(4)
        .build()
        .await
        .unwrap();
    let first = simple_mass_email(&harness, "a", 5).await;
    let second = simple_mass_email(&harness, "b", 5).await;
    let service = Arc::new(service(&harness));
    service.create_queue(&first).await.unwrap();
    service.create_queue(&second).await.unwrap();

    let (a, b) = tokio::join!(
        service.process_sending(&first),
        service.process_sending(&second)
    );
    a.unwrap();
    b.unwrap();

    assert_eq!(harness.transport.sent().await.len(), 7);
}

#[tokio::test]
async fn batch_outliving_its_lease_keeps_the_claim() {
    let harness = TestHarness::builder()
        .with_max_per_hour(1)
        .with_claim_lease_secs(1)
        .build()
        .await
        .unwrap();
    let id = simple_mass_email(&harness, "slow", 2).await;
    let service = service(&harness);
    service.create_queue(&id).await.unwrap();
    harness.transport.set_delay(Duration::from_millis(2500)).await;

    // The second batch starts after the first one's original lease ran out.
    let (first, second) = tokio::join!(service.process_sending(&id), async {
        tokio::time::sleep(Duration::from_millis(1300)).await;
        service.process_sending(&id).await
    });

    assert_eq!(second.unwrap(), SendOutcome::RateLimited);
    let report = processed(first.unwrap());
    assert_eq!(report.claimed, 1);
    assert_eq!(report.sent, 1);
    let sent = harness.transport.sent().await;
    assert_eq!(sent.len(), 1);

    let page = service
        .list_queue_entries(&id, Pagination::default())
        .await
        .unwrap();
    assert_eq!(page.entries[0].status, QueueItemStatus::Sent);
    assert_eq!(page.entries[1].status, QueueItemStatus::Pending);
}

// --- list_queue_entries ---

#[tokio::test]
async fn listing_pages_through_the_queue_in_order() {
    let harness = TestHarness::builder().build().await.unwrap();
    let id = simple_mass_email(&harness, "m1", 5).await;
    let service = service(&harness);
    service.create_queue(&id).await.unwrap();

    let first = service
        .list_queue_entries(&id, Pagination::new(0, 2))
        .await
        .unwrap();
    let second = service
        .list_queue_entries(&id, Pagination::new(2, 2))
        .await
        .unwrap();
    let past_end = service
        .list_queue_entries(&id, Pagination::new(10, 2))
        .await
        .unwrap();

    assert_eq!(first.total, 5);
    assert_eq!(first.entries.len(), 2);
    assert_eq!(second.entries.len(), 2);
    assert!(first.entries[1].id < second.entries[0].id);
    assert!(past_end.entries.is_empty());
    assert_eq!(past_end.total, 5);
}
