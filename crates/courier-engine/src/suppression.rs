// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Global address suppression: invalid or opted-out addresses are never mailed.

use courier_core::types::EmailAddressRecord;
use courier_core::{CourierError, MassEmailStore};

/// Whether a suppression record blocks delivery. A missing record does not.
pub fn is_suppressed(record: Option<&EmailAddressRecord>) -> bool {
    record.is_some_and(|r| r.invalid || r.opt_out)
}

/// Looks up suppression records through the store.
///
/// The same check runs when the queue is built and again right before each send.
pub struct SuppressionFilter<'a> {
    store: &'a dyn MassEmailStore,
}

impl<'a> SuppressionFilter<'a> {
    pub fn new(store: &'a dyn MassEmailStore) -> Self {
        Self { store }
    }

    pub async fn is_suppressed(&self, address: &str) -> Result<bool, CourierError> {
        let record = self.store.find_email_address(address).await?;
        Ok(is_suppressed(record.as_ref()))
    }
}
