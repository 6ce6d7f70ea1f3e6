// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `courier queue` command implementation.
//!
//! One-shot build, send, and list operations against a single mass email.
//! With `--json`, results are printed as structured JSON for scripting.

use std::fmt::Write as _;

use courier_config::CourierConfig;
use courier_core::CourierError;
use courier_core::types::{MassEmailId, Pagination, QueuePage};
use courier_engine::{QueueSummary, SendOutcome};
use serde::Serialize;

use crate::app::App;

/// Run `courier queue build <id>`.
pub async fn run_build(
    config: &CourierConfig,
    id: &MassEmailId,
    json: bool,
) -> Result<(), CourierError> {
    let app = App::open(config).await?;
    let result = app.service.create_queue(id).await;
    app.close().await?;
    let summary = result?;
    print_output(&summary, json, || format_summary(id, &summary))
}

/// Run `courier queue send <id>`: one batch under the hourly cap.
pub async fn run_send(
    config: &CourierConfig,
    id: &MassEmailId,
    json: bool,
) -> Result<(), CourierError> {
    let app = App::open(config).await?;
    let result = app.service.process_sending(id).await;
    app.close().await?;
    let outcome = result?;
    print_output(&outcome, json, || format_outcome(id, &outcome))
}

/// Run `courier queue list <id>`.
pub async fn run_list(
    config: &CourierConfig,
    id: &MassEmailId,
    pagination: Pagination,
    json: bool,
) -> Result<(), CourierError> {
    let app = App::open(config).await?;
    let result = app.service.list_queue_entries(id, pagination).await;
    app.close().await?;
    let page = result?;
    print_output(&page, json, || format_page(&page, pagination))
}

fn print_output<T: Serialize>(
    value: &T,
    json: bool,
    plain: impl FnOnce() -> String,
) -> Result<(), CourierError> {
    if json {
        let out = serde_json::to_string_pretty(value)
            .map_err(|e| CourierError::Internal(format!("JSON serialization failed: {e}")))?;
        println!("{out}");
    } else {
        print!("{}", plain());
    }
    Ok(())
}

fn format_summary(id: &MassEmailId, summary: &QueueSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "queue built for {id}: {}", summary.status);
    let _ = writeln!(out, "  created:          {}", summary.created);
    let _ = writeln!(out, "  deleted:          {}", summary.deleted);
    let _ = writeln!(out, "  no address:       {}", summary.skipped_no_address);
    let _ = writeln!(out, "  suppressed:       {}", summary.skipped_suppressed);
    let _ = writeln!(out, "  already sent:     {}", summary.skipped_already_sent);
    out
}

fn format_outcome(id: &MassEmailId, outcome: &SendOutcome) -> String {
    match outcome {
        SendOutcome::Skipped { status } => format!("{id}: skipped ({status})\n"),
        SendOutcome::RateLimited => format!("{id}: hourly cap reached, nothing sent\n"),
        SendOutcome::CampaignFailed { entries_failed } => {
            format!("{id}: template missing, mass email failed ({entries_failed} entries)\n")
        }
        SendOutcome::Processed(report) => {
            let state = if report.completed {
                "complete"
            } else {
                "in process"
            };
            format!(
                "{id}: sent {} of {} claimed ({} failed, {} retrying, {} errored), {} remaining, {state}\n",
                report.sent,
                report.claimed,
                report.failed,
                report.retrying,
                report.errored,
                report.remaining,
            )
        }
    }
}

fn format_page(page: &QueuePage, pagination: Pagination) -> String {
    let mut out = String::new();
    if page.entries.is_empty() {
        let _ = writeln!(
            out,
            "no entries at offset {} (total {})",
            pagination.offset, page.total
        );
        return out;
    }
    let first = u64::from(pagination.offset) + 1;
    let last = u64::from(pagination.offset) + page.entries.len() as u64;
    let _ = writeln!(out, "entries {first}-{last} of {}", page.total);
    for entry in &page.entries {
        let _ = writeln!(
            out,
            "  {:>8}  {:<8} {:<24} attempts={} sent_at={}",
            entry.id,
            entry.status.to_string(),
            entry.target.to_string(),
            entry.attempt_count,
            entry.sent_at.as_deref().unwrap_or("-"),
        );
    }
    out
}
