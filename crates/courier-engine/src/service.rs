// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The mass-email service: queue building, batched sending, and listing.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use courier_config::CourierConfig;
use courier_core::types::{
    MassEmail, MassEmailId, MassEmailStatus, Pagination, QueueItemId, QueuePage,
};
use courier_core::{CampaignLogger, CourierError, MailTransport, MassEmailStore, TemplateRenderer};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::cascade;
use crate::composer::EmailComposer;
use crate::pipeline::{BatchClock, BatchContext, EntryOutcome, SendPipeline};
use crate::queue_builder::{QueueBuilder, QueueSummary};
use crate::rate_limiter::RateLimiter;
use crate::status::aggregate_status;

/// Counts from one processed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub claimed: usize,
    pub sent: usize,
    pub failed: usize,
    pub retrying: usize,
    /// Entries interrupted by a storage error.
    pub errored: usize,
    /// Pending entries left after the batch.
    pub remaining: u64,
    /// Whether the batch moved the mass email to Complete.
    pub completed: bool,
}

/// Result of one `process_sending` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SendOutcome {
    /// The mass email is not InProcess; nothing was done.
    Skipped { status: MassEmailStatus },
    /// The hourly cap is used up; nothing was done.
    RateLimited,
    /// The template is missing; the mass email and its Pending entries were failed.
    CampaignFailed { entries_failed: u64 },
    Processed(BatchReport),
}

pub struct MassEmailService {
    store: Arc<dyn MassEmailStore>,
    pipeline: SendPipeline,
    limiter: RateLimiter,
    max_concurrent_sends: usize,
}

impl MassEmailService {
    pub fn new(
        store: Arc<dyn MassEmailStore>,
        renderer: Arc<dyn TemplateRenderer>,
        transport: Arc<dyn MailTransport>,
        logger: Arc<dyn CampaignLogger>,
        config: &CourierConfig,
    ) -> Self {
        let composer = EmailComposer::new(config.site.clone(), renderer);
        let pipeline = SendPipeline::new(
            store.clone(),
            transport,
            logger,
            composer,
            config.mass_email.max_attempts,
        );
        Self {
            store,
            pipeline,
            limiter: RateLimiter::new(&config.mass_email),
            max_concurrent_sends: config.mass_email.max_concurrent_sends.max(1),
        }
    }

    pub fn store(&self) -> &Arc<dyn MassEmailStore> {
        &self.store
    }

    async fn require(&self, id: &MassEmailId) -> Result<MassEmail, CourierError> {
        self.store
            .get_mass_email(id)
            .await?
            .ok_or_else(|| CourierError::NotFound {
                entity: "mass email",
                id: id.to_string(),
            })
    }

    /// Build the queue of a Pending mass email.
    pub async fn create_queue(&self, id: &MassEmailId) -> Result<QueueSummary, CourierError> {
        QueueBuilder::new(self.store.as_ref()).build(id).await
    }

    /// Send one rate-limited batch of an InProcess mass email.
    pub async fn process_sending(&self, id: &MassEmailId) -> Result<SendOutcome, CourierError> {
        self.process_sending_at(id, Utc::now()).await
    }

    /// [`process_sending`](Self::process_sending) with an explicit clock.
    pub async fn process_sending_at(
        &self,
        id: &MassEmailId,
        now: DateTime<Utc>,
    ) -> Result<SendOutcome, CourierError> {
        let mass_email = self.require(id).await?;
        if mass_email.status != MassEmailStatus::InProcess {
            debug!(mass_email_id = %id, status = %mass_email.status, "not in process, skipping");
            return Ok(SendOutcome::Skipped {
                status: mass_email.status,
            });
        }

        let store = self.store.as_ref();
        let clock = BatchClock::starting_at(now);
        let Some(batch) = self.limiter.claim(store, id, now).await? else {
            return Ok(SendOutcome::RateLimited);
        };

        let template = match &mass_email.email_template_id {
            Some(template_id) => store.get_email_template(template_id).await?,
            None => None,
        };
        let Some(template) = template else {
            let entries_failed = cascade::set_failed(store, id, "email template missing").await?;
            return Ok(SendOutcome::CampaignFailed { entries_failed });
        };

        let campaign = match &mass_email.campaign_id {
            Some(campaign_id) => {
                let campaign = store.get_campaign(campaign_id).await?;
                if campaign.is_none() {
                    debug!(mass_email_id = %id, campaign_id = %campaign_id, "tracking campaign not found, sending untracked");
                }
                campaign
            }
            None => None,
        };

        let ctx = BatchContext {
            mass_email,
            template,
            campaign,
            clock,
        };
        let claimed: Vec<QueueItemId> = batch.entries.iter().map(|e| e.id).collect();
        // Futures are lazy; collecting them first sidesteps a higher-ranked
        // lifetime inference limitation when this future must be `Send`.
        let pending: Vec<_> = batch
            .entries
            .iter()
            .map(|entry| self.pipeline.process(&ctx, entry))
            .collect();
        let sends = stream::iter(pending)
            .buffer_unordered(self.max_concurrent_sends)
            .collect::<Vec<EntryOutcome>>();
        let outcomes = self.holding_claims(id, &claimed, &clock, sends).await;

        let mut report = BatchReport {
            claimed: batch.entries.len(),
            ..BatchReport::default()
        };
        for outcome in outcomes {
            match outcome {
                EntryOutcome::Sent => report.sent += 1,
                EntryOutcome::Failed => report.failed += 1,
                EntryOutcome::Retrying => report.retrying += 1,
                EntryOutcome::Errored => report.errored += 1,
            }
        }

        let progress = aggregate_status(store, id).await?;
        report.remaining = progress.remaining;
        report.completed = progress.completed;

        info!(
            mass_email_id = %id,
            claimed = report.claimed,
            sent = report.sent,
            failed = report.failed,
            retrying = report.retrying,
            errored = report.errored,
            remaining = report.remaining,
            "batch processed"
        );
        Ok(SendOutcome::Processed(report))
    }

    /// Drive `work` to completion while renewing the leases on `claimed`.
    ///
    /// Renewal stops with the batch, so a crashed process leaves its entries
    /// to expire and be reclaimed.
    async fn holding_claims<T>(
        &self,
        id: &MassEmailId,
        claimed: &[QueueItemId],
        clock: &BatchClock,
        work: impl Future<Output = T>,
    ) -> T {
        tokio::pin!(work);
        let mut renew = tokio::time::interval(self.limiter.renew_interval());
        renew.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires at once; the claim itself is still fresh.
        renew.tick().await;

        loop {
            tokio::select! {
                out = &mut work => return out,
                _ = renew.tick() => {
                    let lease_until = self.limiter.lease_until(clock.now());
                    match self.store.extend_claims(claimed, &lease_until).await {
                        Ok(renewed) => debug!(mass_email_id = %id, renewed, "claim leases renewed"),
                        Err(e) => warn!(mass_email_id = %id, error = %e, "failed to renew claim leases"),
                    }
                }
            }
        }
    }

    /// One page of the mass email's queue in creation order.
    pub async fn list_queue_entries(
        &self,
        id: &MassEmailId,
        pagination: Pagination,
    ) -> Result<QueuePage, CourierError> {
        self.require(id).await?;
        self.store.list_queue_items(id, pagination).await
    }

    /// Mass emails the scheduler should drain.
    pub async fn in_process(&self) -> Result<Vec<MassEmailId>, CourierError> {
        let mass_emails = self
            .store
            .list_mass_emails(MassEmailStatus::InProcess)
            .await?;
        Ok(mass_emails.into_iter().map(|m| m.id).collect())
    }
}
