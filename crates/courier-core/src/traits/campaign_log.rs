// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Campaign delivery log trait.

use async_trait::async_trait;

use crate::error::CourierError;
use crate::types::{CampaignId, QueueItemId, Recipient, SentArtifact};

/// Receives a record for every message delivered on behalf of a tracking campaign.
#[async_trait]
pub trait CampaignLogger: Send + Sync {
    async fn log_delivery(
        &self,
        campaign_id: &CampaignId,
        queue_item_id: QueueItemId,
        recipient: &Recipient,
        artifact: &SentArtifact,
        address: &str,
    ) -> Result<(), CourierError>;
}
