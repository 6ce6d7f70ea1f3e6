// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Campaign logger that always fails.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use courier_core::types::{CampaignId, QueueItemId, Recipient, SentArtifact};
use courier_core::{CampaignLogger, CourierError};

/// Rejects every delivery record and counts the calls.
#[derive(Default)]
pub struct FailingLogger {
    calls: AtomicU32,
}

impl FailingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CampaignLogger for FailingLogger {
    async fn log_delivery(
        &self,
        _campaign_id: &CampaignId,
        _queue_item_id: QueueItemId,
        _recipient: &Recipient,
        _artifact: &SentArtifact,
        _address: &str,
    ) -> Result<(), CourierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CourierError::Internal("campaign log unavailable".into()))
    }
}
