// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Periodic draining of every InProcess mass email.

use std::sync::Arc;
use std::time::Duration;

use courier_core::CourierError;
use courier_core::types::MassEmailId;
use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::service::{MassEmailService, SendOutcome};

/// Ticks on a fixed interval and runs one batch per InProcess mass email.
pub struct Scheduler {
    service: Arc<MassEmailService>,
    interval: Duration,
}

impl Scheduler {
    pub fn new(service: Arc<MassEmailService>, interval: Duration) -> Self {
        Self { service, interval }
    }

    /// Run one batch for every InProcess mass email, concurrently.
    pub async fn tick(&self) -> Result<Vec<(MassEmailId, SendOutcome)>, CourierError> {
        let ids = self.service.in_process().await?;
        if ids.is_empty() {
            debug!("no mass emails in process");
            return Ok(Vec::new());
        }

        let results = join_all(ids.iter().map(|id| self.service.process_sending(id))).await;

        let mut outcomes = Vec::with_capacity(ids.len());
        for (id, result) in ids.into_iter().zip(results) {
            match result {
                Ok(outcome) => {
                    debug!(mass_email_id = %id, ?outcome, "batch finished");
                    outcomes.push((id, outcome));
                }
                Err(e) => {
                    warn!(mass_email_id = %id, error = %e, "batch failed (non-fatal)");
                }
            }
        }
        Ok(outcomes)
    }

    /// Tick until `cancel` fires. The first tick runs immediately.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        info!(interval_secs = self.interval.as_secs(), "scheduler started");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.tick().await {
                        warn!(error = %e, "scheduler tick failed (non-fatal)");
                    }
                }
                _ = cancel.cancelled() => {
                    info!("scheduler shutting down");
                    break;
                }
            }
        }
    }
}
