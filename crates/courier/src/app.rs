// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wires storage, transport, and renderer into a `MassEmailService`.

use std::path::Path;
use std::sync::Arc;

use courier_config::CourierConfig;
use courier_core::{CourierError, PluginAdapter, StorageAdapter};
use courier_engine::MassEmailService;
use courier_mail::{PlaceholderRenderer, SmtpMailer};
use courier_storage::SqliteStorage;
use tracing::{debug, warn};

/// The collaborators behind one running service.
pub struct App {
    pub storage: Arc<SqliteStorage>,
    pub mailer: Arc<SmtpMailer>,
    pub service: Arc<MassEmailService>,
}

impl App {
    /// Open the database and build the service from `config`.
    pub async fn open(config: &CourierConfig) -> Result<Self, CourierError> {
        if let Some(parent) = Path::new(&config.storage.database_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| CourierError::Storage { source: e.into() })?;
            }
        }

        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await?;
        let storage = Arc::new(storage);

        let mailer = Arc::new(SmtpMailer::new(config.smtp.clone())?);
        debug!(
            host = %config.smtp.host,
            port = config.smtp.port,
            "SMTP transport configured"
        );

        let service = Arc::new(MassEmailService::new(
            storage.clone(),
            Arc::new(PlaceholderRenderer::new()),
            mailer.clone(),
            storage.clone(),
            config,
        ));

        Ok(Self {
            storage,
            mailer,
            service,
        })
    }

    /// Checkpoint the database. Transport shutdown failures are logged only.
    pub async fn close(&self) -> Result<(), CourierError> {
        if let Err(e) = self.mailer.shutdown().await {
            warn!(error = %e, "SMTP transport shutdown failed");
        }
        self.storage.close().await
    }
}
