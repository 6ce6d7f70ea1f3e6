// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message assembly and delivery for the Courier mass-email engine.
//!
//! - [`PlaceholderRenderer`]: the default `{{field}}` template renderer.
//! - [`SlotBody`]: a rendered body split into literal text and named slots.
//! - [`SmtpMailer`]: the lettre-backed SMTP transport.

pub mod renderer;
pub mod slots;
pub mod smtp;

pub use renderer::PlaceholderRenderer;
pub use slots::{Segment, Slot, SlotBody, SlotMarker, SlotValues};
pub use smtp::{QueueItemIdHeader, SmtpMailer};
