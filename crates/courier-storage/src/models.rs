// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.
//!
//! The canonical types are defined in `courier-core::types` for use across
//! collaborator trait boundaries. This module re-exports them for convenience
//! within the storage crate, alongside the storage-only log record.

pub use courier_core::types::{
    Attachment, Campaign, EmailAddressRecord, EmailTemplate, MassEmail, QueueItem, Recipient,
    SentEmail, TargetGroup, TrackingUrl,
};

/// A row of the campaign delivery log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignLogRecord {
    pub id: i64,
    pub campaign_id: String,
    pub queue_item_id: i64,
    pub target_type: String,
    pub target_id: String,
    pub action: String,
    pub object_type: String,
    pub object_id: String,
    pub email_address: String,
    pub created_at: String,
}
