// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hourly send cap shared by every mass email.
//!
//! The limiter holds no counters of its own. Each batch asks the store to
//! count Sent entries in the trailing hour plus live claims, and to claim up
//! to the remainder, in one atomic step. The cap therefore holds across
//! concurrent batches and process restarts. A `tracing::warn` is emitted once
//! usage reaches 80% of the cap.
//!
//! A claim lease only holds while its batch renews it, every third of the
//! lease, so a batch that outlives one lease still counts against the cap.

use chrono::{DateTime, Duration, Utc};
use courier_config::model::MassEmailConfig;
use courier_core::types::{ClaimRequest, ClaimedBatch, MassEmailId};
use courier_core::{CourierError, MassEmailStore, timestamp};
use tracing::{debug, warn};

/// Length of the trailing send window, in seconds.
pub const WINDOW_SECS: i64 = 3600;

const MIN_RENEW_INTERVAL: std::time::Duration = std::time::Duration::from_millis(50);

/// Computes claim windows and reserves send budget.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    max_per_hour: u32,
    lease: Duration,
    renew_every: std::time::Duration,
}

impl RateLimiter {
    pub fn new(config: &MassEmailConfig) -> Self {
        Self {
            max_per_hour: config.max_per_hour,
            lease: i64::try_from(config.claim_lease_secs)
                .ok()
                .and_then(Duration::try_seconds)
                .unwrap_or(Duration::MAX),
            renew_every: std::time::Duration::from_millis(
                config.claim_lease_secs.saturating_mul(1000) / 3,
            )
            .max(MIN_RENEW_INTERVAL),
        }
    }

    /// When a claim taken or renewed at `now` expires.
    pub fn lease_until(&self, now: DateTime<Utc>) -> String {
        timestamp::format(
            now.checked_add_signed(self.lease)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        )
    }

    /// How often a running batch renews its leases.
    pub fn renew_interval(&self) -> std::time::Duration {
        self.renew_every
    }

    /// The claim request for a batch of `id` starting at `now`.
    pub fn claim_request(&self, id: &MassEmailId, now: DateTime<Utc>) -> ClaimRequest {
        ClaimRequest {
            mass_email_id: id.clone(),
            cap: self.max_per_hour,
            window_start: timestamp::format(now - Duration::seconds(WINDOW_SECS)),
            now: timestamp::format(now),
            lease_until: self.lease_until(now),
        }
    }

    /// Reserve up to the remaining budget of Pending entries of `id`.
    ///
    /// Returns `None` when the budget is exhausted. That is not an error and
    /// nothing is written.
    pub async fn claim(
        &self,
        store: &dyn MassEmailStore,
        id: &MassEmailId,
        now: DateTime<Utc>,
    ) -> Result<Option<ClaimedBatch>, CourierError> {
        let batch = store.claim_batch(&self.claim_request(id, now)).await?;
        let used = batch.sent_in_window + batch.in_flight;

        if batch.budget <= 0 {
            debug!(
                mass_email_id = %id,
                sent_last_hour = batch.sent_in_window,
                in_flight = batch.in_flight,
                max_per_hour = self.max_per_hour,
                "hourly send cap reached"
            );
            return Ok(None);
        }

        if used * 5 >= u64::from(self.max_per_hour) * 4 {
            warn!(
                sent_last_hour = batch.sent_in_window,
                in_flight = batch.in_flight,
                max_per_hour = self.max_per_hour,
                "approaching hourly send cap (80%+)"
            );
        }

        debug!(
            mass_email_id = %id,
            budget = batch.budget,
            claimed = batch.entries.len(),
            "claimed batch"
        );
        Ok(Some(batch))
    }
}
