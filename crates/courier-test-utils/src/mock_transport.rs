// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock mail transport for deterministic testing.
//!
//! `MockTransport` implements `MailTransport` by capturing every accepted
//! message. Failures are scripted up front, either for the next N sends or
//! permanently for given addresses. A delay can be set to keep sends in
//! flight across lease renewals.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use courier_core::traits::adapter::PluginAdapter;
use courier_core::traits::transport::MailTransport;
use courier_core::types::{
    AdapterType, Attachment, HealthStatus, OutboundEmail, QueueItemId, SenderOverrides,
};
use courier_core::CourierError;

/// A message accepted by the mock transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub message: OutboundEmail,
    pub overrides: SenderOverrides,
    pub correlation_id: QueueItemId,
    pub attachments: Vec<Attachment>,
}

#[derive(Default)]
struct State {
    fail_next: u32,
    failing_addresses: HashSet<String>,
    rejected_addresses: HashSet<String>,
    delay: Option<Duration>,
    attempts: u32,
    sent: Vec<SentMessage>,
}

/// A mail transport that records instead of delivering.
pub struct MockTransport {
    state: Arc<Mutex<State>>,
}

impl MockTransport {
    /// Create a transport that accepts every message.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// Fail the next `count` sends, whatever their recipient.
    pub async fn fail_next(&self, count: u32) {
        self.state.lock().await.fail_next += count;
    }

    /// Fail every send to `address` until cleared.
    pub async fn fail_address(&self, address: &str) {
        self.state
            .lock()
            .await
            .failing_addresses
            .insert(address.to_lowercase());
    }

    /// Refuse `address` as unparseable, the way a real transport reports a
    /// recipient it can never deliver to.
    pub async fn reject_address(&self, address: &str) {
        self.state
            .lock()
            .await
            .rejected_addresses
            .insert(address.to_lowercase());
    }

    /// Hold every send for `delay` before it resolves.
    pub async fn set_delay(&self, delay: Duration) {
        self.state.lock().await.delay = Some(delay);
    }

    pub async fn clear_failures(&self) {
        let mut state = self.state.lock().await;
        state.fail_next = 0;
        state.failing_addresses.clear();
        state.rejected_addresses.clear();
    }

    /// Messages accepted so far, in send order.
    pub async fn sent(&self) -> Vec<SentMessage> {
        self.state.lock().await.sent.clone()
    }

    /// Every call to `send`, successful or not.
    pub async fn attempts(&self) -> u32 {
        self.state.lock().await.attempts
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockTransport {
    fn name(&self) -> &str {
        "mock-transport"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transport
    }

    async fn health_check(&self) -> Result<HealthStatus, CourierError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CourierError> {
        Ok(())
    }
}

#[async_trait]
impl MailTransport for MockTransport {
    async fn send(
        &self,
        message: &OutboundEmail,
        overrides: &SenderOverrides,
        correlation_id: QueueItemId,
        attachments: &[Attachment],
    ) -> Result<(), CourierError> {
        let delay = self.state.lock().await.delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().await;
        state.attempts += 1;

        let to = message.to.to_lowercase();
        if state.rejected_addresses.contains(&to) {
            return Err(CourierError::InvalidAddress {
                address: message.to.clone(),
            });
        }

        if state.fail_next > 0 {
            state.fail_next -= 1;
            return Err(CourierError::transport("scripted failure"));
        }
        if state.failing_addresses.contains(&to) {
            return Err(CourierError::transport(format!(
                "scripted failure for {}",
                message.to
            )));
        }

        state.sent.push(SentMessage {
            message: message.clone(),
            overrides: overrides.clone(),
            correlation_id,
            attachments: attachments.to_vec(),
        });
        Ok(())
    }
}
