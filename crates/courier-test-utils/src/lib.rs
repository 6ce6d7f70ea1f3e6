// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Courier integration tests.
//!
//! Provides mock collaborators and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without an SMTP relay.
//!
//! # Components
//!
//! - [`MockTransport`] - Mail transport that captures messages and fails on script
//! - [`FailingLogger`] - Campaign logger that rejects every record
//! - [`TestHarness`] - Temp SQLite storage, test config, and seeding helpers

pub mod harness;
pub mod mock_logger;
pub mod mock_transport;

pub use harness::{TEST_SITE_URL, TestHarness};
pub use mock_logger::FailingLogger;
pub use mock_transport::{MockTransport, SentMessage};
