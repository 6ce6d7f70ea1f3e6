// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` owns a temp SQLite database, a mock transport, and a
//! config tuned for tests. Seeding helpers write the directory records a
//! mass email needs (recipients, lists, templates, campaigns).

use std::sync::Arc;

use courier_config::CourierConfig;
use courier_config::model::{MassEmailConfig, SiteConfig, StorageConfig};
use courier_core::types::{
    Campaign, CampaignId, EmailAddressRecord, EmailTemplate, MassEmail, MassEmailId,
    MassEmailStatus, QueueItem, QueueItemId, Recipient, RecipientId, RecipientKind,
    RecipientRef, TemplateId,
};
use courier_core::{
    CampaignLogger, CourierError, MailTransport, MassEmailStore, StorageAdapter, TemplateRenderer,
};
use courier_mail::PlaceholderRenderer;
use courier_storage::{Database, SqliteStorage, queries};

use crate::mock_transport::MockTransport;

/// Site URL used by harness configs, so tests can assert on generated links.
pub const TEST_SITE_URL: &str = "https://crm.example.com/";

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    max_per_hour: u32,
    max_attempts: u32,
    max_concurrent_sends: usize,
    claim_lease_secs: u64,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            max_per_hour: 100,
            max_attempts: 3,
            max_concurrent_sends: 1,
            claim_lease_secs: 300,
        }
    }

    /// Set the hourly send cap shared by all mass emails.
    pub fn with_max_per_hour(mut self, cap: u32) -> Self {
        self.max_per_hour = cap;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Defaults to 1 so send order is deterministic.
    pub fn with_max_concurrent_sends(mut self, sends: usize) -> Self {
        self.max_concurrent_sends = sends;
        self
    }

    pub fn with_claim_lease_secs(mut self, secs: u64) -> Self {
        self.claim_lease_secs = secs;
        self
    }

    /// Build the test harness, creating the temp database.
    pub async fn build(self) -> Result<TestHarness, CourierError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| CourierError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let storage_config = StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        };
        let storage = SqliteStorage::new(storage_config.clone());
        storage.initialize().await?;

        let config = CourierConfig {
            mass_email: MassEmailConfig {
                max_per_hour: self.max_per_hour,
                max_attempts: self.max_attempts,
                max_concurrent_sends: self.max_concurrent_sends,
                claim_lease_secs: self.claim_lease_secs,
                ..MassEmailConfig::default()
            },
            site: SiteConfig {
                url: TEST_SITE_URL.to_string(),
                ..SiteConfig::default()
            },
            storage: storage_config,
            ..CourierConfig::default()
        };

        Ok(TestHarness {
            storage: Arc::new(storage),
            transport: Arc::new(MockTransport::new()),
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A test environment with a temp database and a mock transport.
pub struct TestHarness {
    /// SQLite storage adapter (temp DB, cleaned up on drop).
    pub storage: Arc<SqliteStorage>,
    /// Captures every message the engine sends.
    pub transport: Arc<MockTransport>,
    pub config: CourierConfig,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    pub fn store(&self) -> Arc<dyn MassEmailStore> {
        self.storage.clone()
    }

    pub fn logger(&self) -> Arc<dyn CampaignLogger> {
        self.storage.clone()
    }

    pub fn mail_transport(&self) -> Arc<dyn MailTransport> {
        self.transport.clone()
    }

    pub fn renderer(&self) -> Arc<dyn TemplateRenderer> {
        Arc::new(PlaceholderRenderer::new())
    }

    pub fn database(&self) -> Result<&Database, CourierError> {
        self.storage.database()
    }

    /// Insert a recipient and return its reference.
    pub async fn add_recipient(
        &self,
        kind: RecipientKind,
        id: &str,
        name: &str,
        address: Option<&str>,
    ) -> Result<RecipientRef, CourierError> {
        let recipient = Recipient {
            kind,
            id: RecipientId(id.to_string()),
            name: name.to_string(),
            email_address: address.map(str::to_string),
        };
        queries::directory::upsert_recipient(self.database()?, &recipient).await?;
        Ok(recipient.to_ref())
    }

    /// Contacts `{prefix}-0..n` with addresses `{prefix}-{i}@example.com`.
    pub async fn add_contacts(
        &self,
        prefix: &str,
        n: usize,
    ) -> Result<Vec<RecipientRef>, CourierError> {
        let mut refs = Vec::with_capacity(n);
        for i in 0..n {
            let id = format!("{prefix}-{i}");
            let address = format!("{id}@example.com");
            refs.push(
                self.add_recipient(RecipientKind::Contact, &id, &id, Some(&address))
                    .await?,
            );
        }
        Ok(refs)
    }

    /// Record a global suppression flag for an address.
    pub async fn suppress(
        &self,
        address: &str,
        invalid: bool,
        opt_out: bool,
    ) -> Result<(), CourierError> {
        let record = EmailAddressRecord {
            address: address.to_string(),
            invalid,
            opt_out,
        };
        queries::directory::upsert_email_address(self.database()?, &record).await
    }

    /// Create a target list with the given members, none opted out.
    pub async fn add_target_list(
        &self,
        id: &str,
        members: &[RecipientRef],
    ) -> Result<(), CourierError> {
        let db = self.database()?;
        queries::directory::insert_target_list(db, id, id).await?;
        for member in members {
            queries::directory::add_target_list_member(db, id, member, false).await?;
        }
        Ok(())
    }

    pub async fn add_template(
        &self,
        id: &str,
        subject: &str,
        body: &str,
        is_html: bool,
    ) -> Result<TemplateId, CourierError> {
        let template = EmailTemplate {
            id: TemplateId(id.to_string()),
            name: id.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
            is_html,
            attachments: Vec::new(),
        };
        self.add_full_template(&template).await?;
        Ok(template.id)
    }

    pub async fn add_full_template(&self, template: &EmailTemplate) -> Result<(), CourierError> {
        queries::directory::insert_email_template(self.database()?, template).await
    }

    pub async fn add_campaign(&self, campaign: &Campaign) -> Result<CampaignId, CourierError> {
        queries::directory::insert_campaign(self.database()?, campaign).await?;
        Ok(campaign.id.clone())
    }

    /// Insert a mass email targeting `lists` in order.
    pub async fn add_mass_email(
        &self,
        mass_email: &MassEmail,
        lists: &[&str],
    ) -> Result<MassEmailId, CourierError> {
        let lists: Vec<String> = lists.iter().map(|l| l.to_string()).collect();
        queries::mass_emails::insert_mass_email(self.database()?, mass_email, &lists).await?;
        Ok(mass_email.id.clone())
    }

    /// A Pending mass email using `template`, with no campaign or overrides.
    pub async fn add_pending_mass_email(
        &self,
        id: &str,
        template: &TemplateId,
        lists: &[&str],
    ) -> Result<MassEmailId, CourierError> {
        let mut mass_email = MassEmail::new(id, id);
        mass_email.email_template_id = Some(template.clone());
        self.add_mass_email(&mass_email, lists).await
    }

    pub async fn mass_email_status(
        &self,
        id: &MassEmailId,
    ) -> Result<Option<MassEmailStatus>, CourierError> {
        Ok(queries::mass_emails::get_mass_email(self.database()?, id)
            .await?
            .map(|m| m.status))
    }

    pub async fn queue_item(&self, id: QueueItemId) -> Result<Option<QueueItem>, CourierError> {
        queries::queue::get_queue_item(self.database()?, id).await
    }
}
