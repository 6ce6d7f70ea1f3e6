// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mass-email campaign engine.
//!
//! `create_queue` collects and filters a mass email's recipients into
//! Pending queue entries. `process_sending` sends one batch under the shared
//! hourly cap, retrying transient transport failures within an attempt
//! limit, and completes the mass email once its queue drains.

pub mod cascade;
pub mod collector;
pub mod composer;
pub mod pipeline;
pub mod queue_builder;
pub mod rate_limiter;
pub mod scheduler;
pub mod service;
pub mod status;
pub mod suppression;

pub use composer::{ComposedEmail, EmailComposer};
pub use queue_builder::QueueSummary;
pub use rate_limiter::RateLimiter;
pub use scheduler::Scheduler;
pub use service::{BatchReport, MassEmailService, SendOutcome};
