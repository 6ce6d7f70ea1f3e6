// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deliver one claimed queue entry and record its outcome.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, TimeDelta, Utc};
use courier_core::types::{
    Campaign, EmailTemplate, MassEmail, QueueItem, Recipient, SentArtifact, SentEmail,
    TrackingUrl,
};
use courier_core::{
    CampaignLogger, CourierError, MailTransport, MassEmailStore, redact_email, timestamp,
};
use tracing::{error, info, warn};

use crate::composer::{ComposedEmail, EmailComposer};
use crate::suppression::SuppressionFilter;

/// Wall time of one batch, anchored at the instant its budget was claimed.
///
/// Send times and lease renewals read this clock so they stay on the same
/// timeline as the send window, including when a caller supplies the start.
#[derive(Debug, Clone, Copy)]
pub struct BatchClock {
    start: DateTime<Utc>,
    started: Instant,
}

impl BatchClock {
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            start,
            started: Instant::now(),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        let elapsed = TimeDelta::from_std(self.started.elapsed()).unwrap_or_default();
        self.start.checked_add_signed(elapsed).unwrap_or(self.start)
    }
}

/// Prerequisites resolved once per batch.
#[derive(Debug, Clone)]
pub struct BatchContext {
    pub mass_email: MassEmail,
    pub template: EmailTemplate,
    /// Tracking campaign, if the mass email references one that exists.
    pub campaign: Option<Campaign>,
    pub clock: BatchClock,
}

impl BatchContext {
    pub fn tracking_urls(&self) -> &[TrackingUrl] {
        self.campaign
            .as_ref()
            .map(|c| c.tracking_urls.as_slice())
            .unwrap_or_default()
    }
}

/// What happened to one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOutcome {
    Sent,
    /// Marked Failed: unresolvable, suppressed, or out of attempts.
    Failed,
    /// Transport failed with attempts left; the entry stays Pending.
    Retrying,
    /// A storage error interrupted processing; the claim is left to expire.
    Errored,
}

pub struct SendPipeline {
    store: Arc<dyn MassEmailStore>,
    transport: Arc<dyn MailTransport>,
    logger: Arc<dyn CampaignLogger>,
    composer: EmailComposer,
    max_attempts: u32,
}

impl SendPipeline {
    pub fn new(
        store: Arc<dyn MassEmailStore>,
        transport: Arc<dyn MailTransport>,
        logger: Arc<dyn CampaignLogger>,
        composer: EmailComposer,
        max_attempts: u32,
    ) -> Self {
        Self {
            store,
            transport,
            logger,
            composer,
            max_attempts,
        }
    }

    /// Process one entry. Never fails; errors are logged and reported as an outcome.
    pub async fn process(&self, ctx: &BatchContext, entry: &QueueItem) -> EntryOutcome {
        match self.try_process(ctx, entry).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(
                    queue_item_id = %entry.id,
                    mass_email_id = %entry.mass_email_id,
                    error = %e,
                    "queue entry processing failed, claim left to expire"
                );
                EntryOutcome::Errored
            }
        }
    }

    async fn try_process(
        &self,
        ctx: &BatchContext,
        entry: &QueueItem,
    ) -> Result<EntryOutcome, CourierError> {
        let recipient = self
            .store
            .get_recipient(&entry.target)
            .await?
            .filter(|r| r.address().is_some());
        let Some(recipient) = recipient else {
            return self
                .fail_unattempted(entry, "recipient missing or without address")
                .await;
        };

        let address = recipient.address().unwrap_or_default();
        if SuppressionFilter::new(self.store.as_ref())
            .is_suppressed(address)
            .await?
        {
            return self.fail_unattempted(entry, "address suppressed").await;
        }

        let attempt = entry.attempt_count + 1;
        let composed = match self.composer.compose(
            entry,
            &ctx.mass_email,
            &ctx.template,
            &recipient,
            ctx.tracking_urls(),
        ) {
            Ok(Some(composed)) => composed,
            Ok(None) => {
                return self
                    .fail_unattempted(entry, "recipient missing or without address")
                    .await;
            }
            Err(e) => {
                self.store.record_attempt(entry.id, attempt).await?;
                return self.handle_failure(entry, attempt, &e).await;
            }
        };

        self.store.record_attempt(entry.id, attempt).await?;

        match self
            .transport
            .send(
                &composed.message,
                &composed.overrides,
                entry.id,
                &ctx.template.attachments,
            )
            .await
        {
            Ok(()) => self.handle_success(ctx, entry, &recipient, composed).await,
            Err(CourierError::InvalidAddress { .. }) => {
                // The attempt was persisted ahead of the call; give it back.
                self.store
                    .record_attempt(entry.id, entry.attempt_count)
                    .await?;
                self.fail_unattempted(entry, "recipient address rejected")
                    .await
            }
            Err(e) => self.handle_failure(entry, attempt, &e).await,
        }
    }

    async fn fail_unattempted(
        &self,
        entry: &QueueItem,
        reason: &'static str,
    ) -> Result<EntryOutcome, CourierError> {
        self.store.mark_failed(entry.id).await?;
        info!(
            queue_item_id = %entry.id,
            mass_email_id = %entry.mass_email_id,
            target = %entry.target,
            reason,
            "queue entry failed without sending"
        );
        Ok(EntryOutcome::Failed)
    }

    async fn handle_failure(
        &self,
        entry: &QueueItem,
        attempt: u32,
        e: &CourierError,
    ) -> Result<EntryOutcome, CourierError> {
        if attempt >= self.max_attempts {
            self.store.mark_failed(entry.id).await?;
            warn!(
                queue_item_id = %entry.id,
                mass_email_id = %entry.mass_email_id,
                attempt_count = attempt,
                max_attempts = self.max_attempts,
                error = %e,
                "send failed, attempts exhausted"
            );
            Ok(EntryOutcome::Failed)
        } else {
            self.store.release_claim(entry.id).await?;
            warn!(
                queue_item_id = %entry.id,
                mass_email_id = %entry.mass_email_id,
                attempt_count = attempt,
                max_attempts = self.max_attempts,
                error = %e,
                "send failed, will retry"
            );
            Ok(EntryOutcome::Retrying)
        }
    }

    async fn handle_success(
        &self,
        ctx: &BatchContext,
        entry: &QueueItem,
        recipient: &Recipient,
        composed: ComposedEmail,
    ) -> Result<EntryOutcome, CourierError> {
        let sent_at = timestamp::format(ctx.clock.now());
        let ComposedEmail { message, .. } = composed;
        let address = message.to.clone();

        let mut archived = None;
        if ctx.mass_email.store_sent_emails {
            let sent = SentEmail {
                id: uuid::Uuid::new_v4().to_string(),
                mass_email_id: entry.mass_email_id.clone(),
                queue_item_id: entry.id,
                to: message.to,
                from: message.from_address,
                subject: message.subject,
                body: message.body,
                is_html: message.is_html,
                sent_at: sent_at.clone(),
            };
            match self.store.store_sent_email(&sent).await {
                Ok(()) => archived = Some(sent.id),
                Err(e) => warn!(
                    queue_item_id = %entry.id,
                    error = %e,
                    "failed to archive sent message"
                ),
            }
        }

        if !self.store.mark_sent(entry.id, &sent_at, &address).await? {
            warn!(
                queue_item_id = %entry.id,
                mass_email_id = %entry.mass_email_id,
                to = %redact_email(&address),
                "message sent but entry already left Pending, campaign log skipped"
            );
            return Ok(EntryOutcome::Failed);
        }
        info!(
            queue_item_id = %entry.id,
            mass_email_id = %entry.mass_email_id,
            to = %redact_email(&address),
            "message sent"
        );

        if let Some(campaign) = &ctx.campaign {
            let artifact = match archived {
                Some(id) => SentArtifact::Archived(id),
                None => SentArtifact::Template(ctx.template.id.clone()),
            };
            if let Err(e) = self
                .logger
                .log_delivery(&campaign.id, entry.id, recipient, &artifact, &address)
                .await
            {
                warn!(
                    queue_item_id = %entry.id,
                    campaign_id = %campaign.id,
                    error = %e,
                    "failed to write campaign log record"
                );
            }
        }

        Ok(EntryOutcome::Sent)
    }
}
