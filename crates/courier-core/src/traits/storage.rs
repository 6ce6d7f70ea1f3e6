// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter traits for persistence backends (SQLite, etc.).

use async_trait::async_trait;

use crate::error::CourierError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    Campaign, CampaignId, ClaimRequest, ClaimedBatch, EmailAddressRecord, EmailTemplate,
    MassEmail, MassEmailId, MassEmailStatus, Pagination, QueueItem, QueueItemId, QueuePage,
    RebuildOutcome, Recipient, RecipientRef, SentEmail, TargetGroup, TemplateId,
};

/// Adapter for storage and persistence backends.
///
/// Storage adapters manage the lifecycle of database connections.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), CourierError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), CourierError>;
}

/// Persistence operations required by the mass-email engine.
///
/// Every state transition on a queue entry is guarded by `status = Pending`,
/// so terminal entries are never rewritten. Methods returning `bool` report
/// whether the guarded update applied.
#[async_trait]
pub trait MassEmailStore: StorageAdapter {
    // --- Mass emails ---

    async fn get_mass_email(&self, id: &MassEmailId) -> Result<Option<MassEmail>, CourierError>;

    async fn list_mass_emails(
        &self,
        status: MassEmailStatus,
    ) -> Result<Vec<MassEmail>, CourierError>;

    /// Move a mass email from `from` to `to`. No-op unless the current status is `from`.
    async fn transition_mass_email(
        &self,
        id: &MassEmailId,
        from: MassEmailStatus,
        to: MassEmailStatus,
    ) -> Result<bool, CourierError>;

    /// Target lists attached to a mass email in attachment order, with
    /// list-local opt-outs already removed.
    async fn target_groups(&self, id: &MassEmailId) -> Result<Vec<TargetGroup>, CourierError>;

    // --- Directory ---

    async fn get_recipient(&self, target: &RecipientRef)
    -> Result<Option<Recipient>, CourierError>;

    /// Case-insensitive lookup of an address suppression record.
    async fn find_email_address(
        &self,
        address: &str,
    ) -> Result<Option<EmailAddressRecord>, CourierError>;

    async fn get_email_template(
        &self,
        id: &TemplateId,
    ) -> Result<Option<EmailTemplate>, CourierError>;

    async fn get_campaign(&self, id: &CampaignId) -> Result<Option<Campaign>, CourierError>;

    // --- Queue ---

    /// Atomically rebuild the queue of a Pending mass email.
    ///
    /// Deletes Pending and Failed entries, inserts a Pending entry for each
    /// target without a Sent entry, then sets the status to `InProcess`, or
    /// `Complete` when nothing was inserted. Returns `None` without mutating
    /// anything if the mass email is no longer Pending.
    async fn rebuild_queue(
        &self,
        id: &MassEmailId,
        targets: &[RecipientRef],
    ) -> Result<Option<RebuildOutcome>, CourierError>;

    /// Atomically compute the shared send budget and claim up to that many
    /// Pending, unclaimed entries of one mass email in creation order.
    async fn claim_batch(&self, request: &ClaimRequest) -> Result<ClaimedBatch, CourierError>;

    async fn get_queue_item(&self, id: QueueItemId) -> Result<Option<QueueItem>, CourierError>;

    /// Persist a new attempt count ahead of a transport call.
    async fn record_attempt(&self, id: QueueItemId, attempt_count: u32)
    -> Result<(), CourierError>;

    async fn mark_sent(
        &self,
        id: QueueItemId,
        sent_at: &str,
        address: &str,
    ) -> Result<bool, CourierError>;

    async fn mark_failed(&self, id: QueueItemId) -> Result<bool, CourierError>;

    /// Drop the claim lease so the entry is selectable by the next batch.
    async fn release_claim(&self, id: QueueItemId) -> Result<(), CourierError>;

    /// Renew the leases of a running batch's entries that are still claimed
    /// and Pending. Returns how many were renewed.
    async fn extend_claims(
        &self,
        ids: &[QueueItemId],
        lease_until: &str,
    ) -> Result<u64, CourierError>;

    /// Set the mass email Failed and fail all its Pending entries in one step.
    /// Returns the number of entries failed.
    async fn fail_mass_email(&self, id: &MassEmailId) -> Result<u64, CourierError>;

    async fn count_pending(&self, id: &MassEmailId) -> Result<u64, CourierError>;

    /// Sent entries across all mass emails with `sent_at` after `since`.
    async fn count_sent_since(&self, since: &str) -> Result<u64, CourierError>;

    async fn list_queue_items(
        &self,
        id: &MassEmailId,
        pagination: Pagination,
    ) -> Result<QueuePage, CourierError>;

    // --- Archive ---

    async fn store_sent_email(&self, email: &SentEmail) -> Result<(), CourierError>;
}
