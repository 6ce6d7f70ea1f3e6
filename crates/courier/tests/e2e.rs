// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the scheduler-driven send pipeline.
//!
//! Each test creates an isolated TestHarness with temp SQLite and the mock
//! transport. Tests are independent and order-insensitive.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use courier_core::types::{MassEmailId, MassEmailStatus, Pagination, QueueItemStatus};
use courier_engine::{MassEmailService, Scheduler, SendOutcome};
use courier_test_utils::TestHarness;
use tokio_util::sync::CancellationToken;

fn service(harness: &TestHarness) -> Arc<MassEmailService> {
    Arc::new(MassEmailService::new(
        harness.store(),
        harness.renderer(),
        harness.mail_transport(),
        harness.logger(),
        &harness.config,
    ))
}

async fn queued_mass_email(
    harness: &TestHarness,
    service: &MassEmailService,
    id: &str,
    n: usize,
) -> MassEmailId {
    let contacts = harness.add_contacts(id, n).await.unwrap();
    let list = format!("{id}-list");
    harness.add_target_list(&list, &contacts).await.unwrap();
    let template = harness
        .add_template(&format!("{id}-tpl"), "Hello {{name}}", "Hi {{name}}", false)
        .await
        .unwrap();
    let id = harness
        .add_pending_mass_email(id, &template, &[&list])
        .await
        .unwrap();
    service.create_queue(&id).await.unwrap();
    id
}

// ---- Test 1: one tick drains every in-process mass email ----

#[tokio::test]
async fn tick_processes_every_in_process_mass_email() {
    let harness = TestHarness::builder().build().await.unwrap();
    let service = service(&harness);
    let a = queued_mass_email(&harness, &service, "a", 2).await;
    let b = queued_mass_email(&harness, &service, "b", 3).await;

    let scheduler = Scheduler::new(service.clone(), Duration::from_secs(60));
    let mut outcomes = scheduler.tick().await.unwrap();
    outcomes.sort_by(|x, y| x.0.0.cmp(&y.0.0));

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].0, a);
    assert_eq!(outcomes[1].0, b);
    for (_, outcome) in &outcomes {
        match outcome {
            SendOutcome::Processed(report) => assert!(report.completed),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    assert_eq!(harness.transport.sent().await.len(), 5);
    assert_eq!(
        harness.mass_email_status(&a).await.unwrap(),
        Some(MassEmailStatus::Complete)
    );
    assert!(scheduler.tick().await.unwrap().is_empty());
}

// ---- Test 2: the cap spreads a large queue over several windows ----

#[tokio::test]
async fn capped_queue_resumes_when_the_window_rolls() {
    let harness = TestHarness::builder()
        .with_max_per_hour(4)
        .build()
        .await
        .unwrap();
    let service = service(&harness);
    let id = queued_mass_email(&harness, &service, "big", 10).await;
    let scheduler = Scheduler::new(service.clone(), Duration::from_secs(60));

    scheduler.tick().await.unwrap();
    let outcomes = scheduler.tick().await.unwrap();
    assert_eq!(outcomes, vec![(id.clone(), SendOutcome::RateLimited)]);

    let page = service
        .list_queue_entries(&id, Pagination::default())
        .await
        .unwrap();
    let sent = page
        .entries
        .iter()
        .filter(|e| e.status == QueueItemStatus::Sent)
        .count();
    assert_eq!(sent, 4);
    assert_eq!(
        harness.mass_email_status(&id).await.unwrap(),
        Some(MassEmailStatus::InProcess)
    );

    // An hour on, the first four sends have left the window.
    let later = Utc::now() + TimeDelta::minutes(61);
    match service.process_sending_at(&id, later).await.unwrap() {
        SendOutcome::Processed(report) => {
            assert_eq!(report.sent, 4);
            assert_eq!(report.remaining, 2);
            assert!(!report.completed);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(
        service.process_sending_at(&id, later).await.unwrap(),
        SendOutcome::RateLimited
    );
    assert_eq!(harness.transport.sent().await.len(), 8);
}

// ---- Test 3: retries across ticks ----

#[tokio::test]
async fn failed_sends_are_retried_on_later_ticks() {
    let harness = TestHarness::builder()
        .with_max_attempts(2)
        .build()
        .await
        .unwrap();
    let service = service(&harness);
    let id = queued_mass_email(&harness, &service, "r", 2).await;
    harness.transport.fail_address("r-1@example.com").await;
    let scheduler = Scheduler::new(service.clone(), Duration::from_secs(60));

    scheduler.tick().await.unwrap();
    assert_eq!(
        harness.mass_email_status(&id).await.unwrap(),
        Some(MassEmailStatus::InProcess)
    );
    scheduler.tick().await.unwrap();
    assert_eq!(
        harness.mass_email_status(&id).await.unwrap(),
        Some(MassEmailStatus::Complete)
    );

    let page = service
        .list_queue_entries(&id, Pagination::default())
        .await
        .unwrap();
    assert_eq!(page.entries[0].status, QueueItemStatus::Sent);
    assert_eq!(page.entries[1].status, QueueItemStatus::Failed);
    assert_eq!(page.entries[1].attempt_count, 2);
}

// ---- Test 4: run loop stops on cancellation ----

#[tokio::test]
async fn run_ticks_until_cancelled() {
    let harness = TestHarness::builder().build().await.unwrap();
    let service = service(&harness);
    let id = queued_mass_email(&harness, &service, "loop", 3).await;

    let scheduler = Scheduler::new(service.clone(), Duration::from_millis(10));
    let cancel = CancellationToken::new();
    let handle = {
        let cancel = cancel.clone();
        tokio::spawn(async move { scheduler.run(cancel).await })
    };

    for _ in 0..200 {
        if harness.mass_email_status(&id).await.unwrap() == Some(MassEmailStatus::Complete) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("scheduler should stop after cancellation")
        .unwrap();

    assert_eq!(
        harness.mass_email_status(&id).await.unwrap(),
        Some(MassEmailStatus::Complete)
    );
    assert_eq!(harness.transport.sent().await.len(), 3);
}
