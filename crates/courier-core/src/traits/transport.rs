// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mail transport trait for outbound delivery (SMTP, test doubles).

use async_trait::async_trait;

use crate::error::CourierError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Attachment, OutboundEmail, QueueItemId, SenderOverrides};

/// Adapter that hands a composed message to a mail system.
#[async_trait]
pub trait MailTransport: PluginAdapter {
    /// Sends one message.
    ///
    /// `correlation_id` is attached to the message (as `X-Queue-Item-Id`) so
    /// asynchronous bounces can be matched back to the queue entry. An `Err`
    /// is treated as a transient failure and retried within the attempt limit.
    async fn send(
        &self,
        message: &OutboundEmail,
        overrides: &SenderOverrides,
        correlation_id: QueueItemId,
        attachments: &[Attachment],
    ) -> Result<(), CourierError>;
}
