// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Courier mass-email engine.
//!
//! This crate provides the collaborator trait definitions, the error type,
//! and the typed records used throughout the Courier workspace. Storage
//! backends, mail transports, and renderers implement traits defined here.

pub mod error;
pub mod redact;
pub mod timestamp;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::CourierError;
pub use redact::redact_email;
pub use types::{
    AdapterType, HealthStatus, MassEmailId, MassEmailStatus, QueueItemId, QueueItemStatus,
    RecipientKind,
};

pub use traits::{
    CampaignLogger, MailTransport, MassEmailStore, PluginAdapter, StorageAdapter,
    TemplateRenderer,
};
