// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the MassEmailStore and CampaignLogger traits.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use courier_config::model::StorageConfig;
use courier_core::types::{
    Campaign, CampaignId, ClaimRequest, ClaimedBatch, EmailAddressRecord, EmailTemplate,
    MassEmail, MassEmailId, MassEmailStatus, Pagination, QueueItem, QueueItemId, QueuePage,
    RebuildOutcome, Recipient, RecipientRef, SentArtifact, SentEmail, TargetGroup, TemplateId,
};
use courier_core::{
    AdapterType, CampaignLogger, CourierError, HealthStatus, MassEmailStore, PluginAdapter,
    StorageAdapter,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is lazily initialized on the first
/// call to [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until [`initialize`] is called.
    ///
    /// [`initialize`]: StorageAdapter::initialize
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// The underlying Database, for setup code that writes directory records.
    pub fn database(&self) -> Result<&Database, CourierError> {
        self.db.get().ok_or_else(|| CourierError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    async fn checkpoint(db: &Database) -> Result<(), CourierError> {
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, CourierError> {
        let db = self.database()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CourierError> {
        if let Some(db) = self.db.get() {
            Self::checkpoint(db).await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), CourierError> {
        let db = Database::open_with_options(&self.config.database_path, self.config.wal_mode)
            .await?;
        self.db.set(db).map_err(|_| CourierError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), CourierError> {
        let db = self.database()?;
        Self::checkpoint(db).await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

#[async_trait]
impl MassEmailStore for SqliteStorage {
    // --- Mass emails ---

    async fn get_mass_email(&self, id: &MassEmailId) -> Result<Option<MassEmail>, CourierError> {
        queries::mass_emails::get_mass_email(self.database()?, id).await
    }

    async fn list_mass_emails(
        &self,
        status: MassEmailStatus,
    ) -> Result<Vec<MassEmail>, CourierError> {
        queries::mass_emails::list_mass_emails(self.database()?, status).await
    }

    async fn transition_mass_email(
        &self,
        id: &MassEmailId,
        from: MassEmailStatus,
        to: MassEmailStatus,
    ) -> Result<bool, CourierError> {
        queries::mass_emails::transition_mass_email(self.database()?, id, from, to).await
    }

    async fn target_groups(&self, id: &MassEmailId) -> Result<Vec<TargetGroup>, CourierError> {
        queries::mass_emails::target_groups(self.database()?, id).await
    }

    // --- Directory ---

    async fn get_recipient(
        &self,
        target: &RecipientRef,
    ) -> Result<Option<Recipient>, CourierError> {
        queries::directory::get_recipient(self.database()?, target).await
    }

    async fn find_email_address(
        &self,
        address: &str,
    ) -> Result<Option<EmailAddressRecord>, CourierError> {
        queries::directory::find_email_address(self.database()?, address).await
    }

    async fn get_email_template(
        &self,
        id: &TemplateId,
    ) -> Result<Option<EmailTemplate>, CourierError> {
        queries::directory::get_email_template(self.database()?, id).await
    }

    async fn get_campaign(&self, id: &CampaignId) -> Result<Option<Campaign>, CourierError> {
        queries::directory::get_campaign(self.database()?, id).await
    }

    // --- Queue ---

    async fn rebuild_queue(
        &self,
        id: &MassEmailId,
        targets: &[RecipientRef],
    ) -> Result<Option<RebuildOutcome>, CourierError> {
        queries::queue::rebuild_queue(self.database()?, id, targets).await
    }

    async fn claim_batch(&self, request: &ClaimRequest) -> Result<ClaimedBatch, CourierError> {
        queries::queue::claim_batch(self.database()?, request).await
    }

    async fn get_queue_item(&self, id: QueueItemId) -> Result<Option<QueueItem>, CourierError> {
        queries::queue::get_queue_item(self.database()?, id).await
    }

    async fn record_attempt(
        &self,
        id: QueueItemId,
        attempt_count: u32,
    ) -> Result<(), CourierError> {
        queries::queue::record_attempt(self.database()?, id, attempt_count).await
    }

    async fn mark_sent(
        &self,
        id: QueueItemId,
        sent_at: &str,
        address: &str,
    ) -> Result<bool, CourierError> {
        queries::queue::mark_sent(self.database()?, id, sent_at, address).await
    }

    async fn mark_failed(&self, id: QueueItemId) -> Result<bool, CourierError> {
        queries::queue::mark_failed(self.database()?, id).await
    }

    async fn release_claim(&self, id: QueueItemId) -> Result<(), CourierError> {
        queries::queue::release_claim(self.database()?, id).await
    }

    async fn extend_claims(
        &self,
        ids: &[QueueItemId],
        lease_until: &str,
    ) -> Result<u64, CourierError> {
        queries::queue::extend_claims(self.database()?, ids, lease_until).await
    }

    async fn fail_mass_email(&self, id: &MassEmailId) -> Result<u64, CourierError> {
        queries::mass_emails::fail_mass_email(self.database()?, id).await
    }

    async fn count_pending(&self, id: &MassEmailId) -> Result<u64, CourierError> {
        queries::queue::count_pending(self.database()?, id).await
    }

    async fn count_sent_since(&self, since: &str) -> Result<u64, CourierError> {
        queries::queue::count_sent_since(self.database()?, since).await
    }

    async fn list_queue_items(
        &self,
        id: &MassEmailId,
        pagination: Pagination,
    ) -> Result<QueuePage, CourierError> {
        queries::queue::list_queue_items(self.database()?, id, pagination).await
    }

    // --- Archive ---

    async fn store_sent_email(&self, email: &SentEmail) -> Result<(), CourierError> {
        queries::archive::store_sent_email(self.database()?, email).await
    }
}

#[async_trait]
impl CampaignLogger for SqliteStorage {
    async fn log_delivery(
        &self,
        campaign_id: &CampaignId,
        queue_item_id: QueueItemId,
        recipient: &Recipient,
        artifact: &SentArtifact,
        address: &str,
    ) -> Result<(), CourierError> {
        queries::campaign_log::insert_log_record(
            self.database()?,
            campaign_id,
            queue_item_id,
            recipient,
            artifact,
            address,
        )
        .await?;
        Ok(())
    }
}
