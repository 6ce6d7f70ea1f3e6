// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.
//!
//! Adapters that own external resources extend the [`PluginAdapter`] base
//! trait and use `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod campaign_log;
pub mod renderer;
pub mod storage;
pub mod transport;

pub use adapter::PluginAdapter;
pub use campaign_log::CampaignLogger;
pub use renderer::TemplateRenderer;
pub use storage::{MassEmailStore, StorageAdapter};
pub use transport::MailTransport;
