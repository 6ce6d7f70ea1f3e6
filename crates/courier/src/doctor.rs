// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `courier doctor` command implementation.
//!
//! Runs diagnostic checks against the Courier environment to identify
//! configuration issues, database problems, and an unreachable SMTP relay.

use std::io::IsTerminal;
use std::path::Path;
use std::time::{Duration, Instant};

use courier_config::CourierConfig;
use courier_config::model::SmtpConfig;
use courier_core::{CourierError, HealthStatus, PluginAdapter};
use courier_mail::SmtpMailer;

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    /// Check passed successfully.
    Pass,
    /// Check passed with a warning.
    Warn,
    /// Check failed.
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Name of the check.
    pub name: String,
    /// Check status.
    pub status: CheckStatus,
    /// Human-readable message.
    pub message: String,
    /// Duration the check took.
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Run the `courier doctor` command.
///
/// Runs quick diagnostic checks. With `--deep`, runs additional database checks.
/// With `--plain`, disables colored output.
pub async fn run_doctor(
    config: &CourierConfig,
    config_path: Option<&Path>,
    deep: bool,
    plain: bool,
) -> Result<(), CourierError> {
    let use_color = !plain && std::io::stdout().is_terminal();
    let mut results = Vec::new();

    // Quick checks (always run)
    results.push(check_config(config_path).await);
    results.push(check_database(&config.storage.database_path).await);
    results.push(check_smtp(&config.smtp).await);

    // Deep checks (only with --deep)
    if deep {
        results.push(check_db_integrity(&config.storage.database_path).await);
        results.push(check_hourly_budget(config).await);
    }

    println!();
    println!("  courier doctor");
    println!("  {}", "-".repeat(50));

    let mut fail_count = 0;
    let mut warn_count = 0;

    for result in &results {
        match result.status {
            CheckStatus::Warn => warn_count += 1,
            CheckStatus::Fail => fail_count += 1,
            CheckStatus::Pass => {}
        }
        println!("{}", format_line(result, use_color));
    }

    println!();

    if fail_count > 0 || warn_count > 0 {
        let issues = fail_count + warn_count;
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
        if !deep {
            println!("  Run with --deep for detailed diagnostics.");
        }
    } else {
        println!("  All checks passed.");
    }

    println!();

    Ok(())
}

fn format_line(result: &CheckResult, use_color: bool) -> String {
    let duration_ms = result.duration.as_millis();
    if use_color {
        use colored::Colorize;
        let (symbol, message) = match result.status {
            CheckStatus::Pass => ("✓".green().to_string(), result.message.normal().to_string()),
            CheckStatus::Warn => ("!".yellow().to_string(), result.message.yellow().to_string()),
            CheckStatus::Fail => ("✗".red().to_string(), result.message.red().to_string()),
        };
        format!(
            "    {symbol} {:<20} {message} ({duration_ms}ms)",
            result.name
        )
    } else {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        format!(
            "    {tag} {:<20} {} ({duration_ms}ms)",
            result.name, result.message
        )
    }
}

/// Check configuration loads without errors.
async fn check_config(path: Option<&Path>) -> CheckResult {
    let start = Instant::now();
    let loaded = match path {
        Some(path) => courier_config::load_and_validate_path(path),
        None => courier_config::load_and_validate(),
    };
    match loaded {
        Ok(_) => CheckResult::new("Configuration", CheckStatus::Pass, "valid", start),
        Err(errors) => CheckResult::new(
            "Configuration",
            CheckStatus::Fail,
            format!("{} error(s)", errors.len()),
            start,
        ),
    }
}

/// Check database file exists and can be opened.
async fn check_database(db_path: &str) -> CheckResult {
    let start = Instant::now();

    if !Path::new(db_path).exists() {
        return CheckResult::new(
            "Database",
            CheckStatus::Warn,
            format!("not found: {db_path} (will be created on first run)"),
            start,
        );
    }

    match tokio_rusqlite::Connection::open(db_path).await {
        Ok(conn) => {
            let query_result: Result<i64, tokio_rusqlite::Error> = conn
                .call(|conn| {
                    let pending = conn
                        .query_row(
                            "SELECT COUNT(*) FROM mass_emails WHERE status = 'In Process'",
                            [],
                            |row| row.get(0),
                        )
                        .unwrap_or(0);
                    Ok(pending)
                })
                .await;

            match query_result {
                Ok(in_process) => CheckResult::new(
                    "Database",
                    CheckStatus::Pass,
                    format!("connected ({in_process} mass email(s) in process)"),
                    start,
                ),
                Err(e) => CheckResult::new(
                    "Database",
                    CheckStatus::Fail,
                    format!("query failed: {e}"),
                    start,
                ),
            }
        }
        Err(e) => CheckResult::new(
            "Database",
            CheckStatus::Fail,
            format!("open failed: {e}"),
            start,
        ),
    }
}

/// Check the SMTP relay accepts a connection.
async fn check_smtp(smtp: &SmtpConfig) -> CheckResult {
    let start = Instant::now();
    let mailer = match SmtpMailer::new(smtp.clone()) {
        Ok(mailer) => mailer,
        Err(e) => {
            return CheckResult::new(
                "SMTP relay",
                CheckStatus::Fail,
                format!("invalid settings: {e}"),
                start,
            );
        }
    };

    let target = format!("{}:{}", smtp.host, smtp.port);
    match mailer.health_check().await {
        Ok(HealthStatus::Healthy) => CheckResult::new(
            "SMTP relay",
            CheckStatus::Pass,
            format!("reachable at {target}"),
            start,
        ),
        Ok(HealthStatus::Degraded(msg)) => {
            CheckResult::new("SMTP relay", CheckStatus::Warn, msg, start)
        }
        Ok(HealthStatus::Unhealthy(msg)) => {
            CheckResult::new("SMTP relay", CheckStatus::Fail, msg, start)
        }
        Err(e) => CheckResult::new(
            "SMTP relay",
            CheckStatus::Fail,
            format!("not reachable at {target}: {e}"),
            start,
        ),
    }
}

/// Deep check: SQLite integrity check.
async fn check_db_integrity(db_path: &str) -> CheckResult {
    let start = Instant::now();

    if !Path::new(db_path).exists() {
        return CheckResult::new(
            "DB integrity",
            CheckStatus::Warn,
            "database not found (skipped)",
            start,
        );
    }

    match tokio_rusqlite::Connection::open(db_path).await {
        Ok(conn) => {
            let result: Result<Vec<String>, tokio_rusqlite::Error> = conn
                .call(|conn| {
                    let mut stmt = conn.prepare("PRAGMA integrity_check")?;
                    let rows: Vec<String> = stmt
                        .query_map([], |row| row.get(0))?
                        .filter_map(|r| r.ok())
                        .collect();
                    Ok(rows)
                })
                .await;

            match result {
                Ok(rows) if rows.len() == 1 && rows[0] == "ok" => {
                    CheckResult::new("DB integrity", CheckStatus::Pass, "ok", start)
                }
                Ok(rows) => CheckResult::new(
                    "DB integrity",
                    CheckStatus::Fail,
                    format!("{} issue(s) found", rows.len()),
                    start,
                ),
                Err(e) => CheckResult::new(
                    "DB integrity",
                    CheckStatus::Fail,
                    format!("check failed: {e}"),
                    start,
                ),
            }
        }
        Err(e) => CheckResult::new(
            "DB integrity",
            CheckStatus::Fail,
            format!("open failed: {e}"),
            start,
        ),
    }
}

/// Deep check: messages sent in the trailing hour against the cap.
async fn check_hourly_budget(config: &CourierConfig) -> CheckResult {
    let start = Instant::now();
    let db_path = &config.storage.database_path;
    let cap = config.mass_email.max_per_hour;

    if !Path::new(db_path).exists() {
        return CheckResult::new(
            "Hourly budget",
            CheckStatus::Warn,
            "database not found (skipped)",
            start,
        );
    }

    let conn = match tokio_rusqlite::Connection::open(db_path).await {
        Ok(conn) => conn,
        Err(e) => {
            return CheckResult::new(
                "Hourly budget",
                CheckStatus::Fail,
                format!("open failed: {e}"),
                start,
            );
        }
    };
    let sent: Result<i64, tokio_rusqlite::Error> = conn
        .call(|conn| {
            let sent = conn.query_row(
                "SELECT COUNT(*) FROM email_queue_items
                 WHERE status = 'Sent'
                   AND sent_at > strftime('%Y-%m-%dT%H:%M:%fZ', 'now', '-1 hour')",
                [],
                |row| row.get(0),
            )?;
            Ok(sent)
        })
        .await;

    match sent {
        Ok(sent) => budget_result(sent.max(0) as u64, cap, start),
        Err(e) => CheckResult::new(
            "Hourly budget",
            CheckStatus::Fail,
            format!("query failed: {e}"),
            start,
        ),
    }
}

fn budget_result(sent: u64, cap: u32, start: Instant) -> CheckResult {
    let message = format!("{sent} of {cap} sent in the last hour");
    let status = if sent >= u64::from(cap) {
        CheckStatus::Warn
    } else {
        CheckStatus::Pass
    };
    CheckResult::new("Hourly budget", status, message, start)
}
