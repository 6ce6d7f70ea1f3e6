// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed records shared by the engine, storage, and transport crates.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier for a mass email (one campaign-send job).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MassEmailId(pub String);

/// Unique identifier for a tracking campaign.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CampaignId(pub String);

/// Unique identifier for an email template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemplateId(pub String);

/// Unique identifier for a recipient record (account, contact, lead, or user).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecipientId(pub String);

/// Identifier of a queue entry.
///
/// Integer ids are assigned in creation order, so ordering by id is the
/// stable selection order for batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QueueItemId(pub i64);

macro_rules! display_newtype {
    ($($name:ident),*) => {
        $(impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        })*
    };
}

display_newtype!(MassEmailId, CampaignId, TemplateId, RecipientId, QueueItemId);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a collaborator trait.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Transport,
}

/// Lifecycle of a mass email.
///
/// `Draft -> Pending -> InProcess -> {Complete, Failed}`. The persisted
/// string for `InProcess` is `In Process`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum MassEmailStatus {
    Draft,
    Pending,
    #[strum(serialize = "In Process")]
    #[serde(rename = "In Process")]
    InProcess,
    Complete,
    Failed,
}

impl MassEmailStatus {
    /// Complete and Failed accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, MassEmailStatus::Complete | MassEmailStatus::Failed)
    }
}

/// Delivery state of a single queue entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum QueueItemStatus {
    Pending,
    Sent,
    Failed,
}

impl QueueItemStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, QueueItemStatus::Pending)
    }
}

/// Recipient category. Declaration order is the collection order within a target group.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
pub enum RecipientKind {
    Account,
    Contact,
    Lead,
    User,
}

impl RecipientKind {
    /// Categories in the order they are traversed within each target group.
    pub const COLLECTION_ORDER: [RecipientKind; 4] = [
        RecipientKind::Account,
        RecipientKind::Contact,
        RecipientKind::Lead,
        RecipientKind::User,
    ];
}

/// A (category, identity) reference to a recipient record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecipientRef {
    pub kind: RecipientKind,
    pub id: RecipientId,
}

impl RecipientRef {
    pub fn new(kind: RecipientKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: RecipientId(id.into()),
        }
    }
}

impl fmt::Display for RecipientRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind, self.id)
    }
}

/// A resolved recipient record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub kind: RecipientKind,
    pub id: RecipientId,
    pub name: String,
    pub email_address: Option<String>,
}

impl Recipient {
    /// The recipient's address, if present and non-blank.
    pub fn address(&self) -> Option<&str> {
        self.email_address
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
    }

    pub fn to_ref(&self) -> RecipientRef {
        RecipientRef {
            kind: self.kind,
            id: self.id.clone(),
        }
    }
}

/// Members of one target list, split by category.
///
/// Members flagged as opted out of the list are excluded by the loader.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetGroup {
    pub id: String,
    pub accounts: Vec<RecipientId>,
    pub contacts: Vec<RecipientId>,
    pub leads: Vec<RecipientId>,
    pub users: Vec<RecipientId>,
}

impl TargetGroup {
    pub fn members(&self, kind: RecipientKind) -> &[RecipientId] {
        match kind {
            RecipientKind::Account => &self.accounts,
            RecipientKind::Contact => &self.contacts,
            RecipientKind::Lead => &self.leads,
            RecipientKind::User => &self.users,
        }
    }

    pub fn members_mut(&mut self, kind: RecipientKind) -> &mut Vec<RecipientId> {
        match kind {
            RecipientKind::Account => &mut self.accounts,
            RecipientKind::Contact => &mut self.contacts,
            RecipientKind::Lead => &mut self.leads,
            RecipientKind::User => &mut self.users,
        }
    }
}

/// Global suppression record for an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailAddressRecord {
    pub address: String,
    pub invalid: bool,
    pub opt_out: bool,
}

/// One campaign-send job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MassEmail {
    pub id: MassEmailId,
    pub name: String,
    pub status: MassEmailStatus,
    pub email_template_id: Option<TemplateId>,
    pub campaign_id: Option<CampaignId>,
    pub from_address: Option<String>,
    pub from_name: Option<String>,
    pub reply_to_address: Option<String>,
    pub reply_to_name: Option<String>,
    pub store_sent_emails: bool,
}

impl MassEmail {
    /// A Pending mass email with no template, campaign, or overrides.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: MassEmailId(id.into()),
            name: name.into(),
            status: MassEmailStatus::Pending,
            email_template_id: None,
            campaign_id: None,
            from_address: None,
            from_name: None,
            reply_to_address: None,
            reply_to_name: None,
            store_sent_emails: false,
        }
    }

    pub fn sender_overrides(&self) -> SenderOverrides {
        SenderOverrides {
            from_name: self.from_name.clone(),
            reply_to_name: self.reply_to_name.clone(),
        }
    }
}

/// One recipient's delivery record within a mass email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItem {
    pub id: QueueItemId,
    pub mass_email_id: MassEmailId,
    pub target: RecipientRef,
    pub status: QueueItemStatus,
    pub attempt_count: u32,
    pub sent_at: Option<String>,
    pub email_address: Option<String>,
    pub created_at: String,
}

/// A file attached to every message sent from a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub content_type: String,
    pub contents: Vec<u8>,
}

/// Email template with subject, body, and attachments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailTemplate {
    pub id: TemplateId,
    pub name: String,
    pub subject: String,
    pub body: String,
    pub is_html: bool,
    pub attachments: Vec<Attachment>,
}

/// A link whose marker text is replaced by a per-entry tracking URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingUrl {
    pub id: String,
    pub name: String,
    /// Source marker text as it appears in template bodies.
    pub url_to_use: String,
}

/// Tracking campaign attached to a mass email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub name: String,
    pub tracking_urls: Vec<TrackingUrl>,
}

/// Output of the template rendering collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTemplate {
    pub subject: String,
    pub body: String,
    pub is_html: bool,
}

/// A fully composed message ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub is_html: bool,
    pub from_address: Option<String>,
    pub reply_to_address: Option<String>,
}

/// Display names that accompany the message's address overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SenderOverrides {
    pub from_name: Option<String>,
    pub reply_to_name: Option<String>,
}

/// Archived copy of a delivered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub id: String,
    pub mass_email_id: MassEmailId,
    pub queue_item_id: QueueItemId,
    pub to: String,
    pub from: Option<String>,
    pub subject: String,
    pub body: String,
    pub is_html: bool,
    pub sent_at: String,
}

/// What the campaign log points at for a delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentArtifact {
    /// The template the message was rendered from.
    Template(TemplateId),
    /// The archived copy of the message.
    Archived(String),
}

/// Offset/limit pagination for queue listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub offset: u32,
    pub limit: u32,
}

impl Pagination {
    pub const DEFAULT_LIMIT: u32 = 20;
    pub const MAX_LIMIT: u32 = 200;

    pub fn new(offset: u32, limit: u32) -> Self {
        Self { offset, limit }
    }

    /// Limit clamped to `1..=MAX_LIMIT`.
    pub fn effective_limit(&self) -> u32 {
        self.limit.clamp(1, Self::MAX_LIMIT)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

/// One page of queue entries plus the total entry count for the mass email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueuePage {
    pub total: u64,
    pub entries: Vec<QueueItem>,
}

/// Parameters of an atomic budgeted claim.
///
/// All timestamps are RFC 3339 UTC strings as produced by [`crate::timestamp`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimRequest {
    pub mass_email_id: MassEmailId,
    /// Maximum sends allowed within the window across all mass emails.
    pub cap: u32,
    /// Start of the trailing send window.
    pub window_start: String,
    pub now: String,
    /// Claims taken by this request expire at this instant.
    pub lease_until: String,
}

/// Result of an atomic budgeted claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimedBatch {
    /// Entries sent within the window, across all mass emails.
    pub sent_in_window: u64,
    /// Live claims held by other batches, across all mass emails.
    pub in_flight: u64,
    /// Remaining budget before this claim. Zero or negative means nothing was claimed.
    pub budget: i64,
    pub entries: Vec<QueueItem>,
}

/// Outcome of rebuilding a mass email's queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebuildOutcome {
    pub deleted: u64,
    pub inserted: u64,
    pub status: MassEmailStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn in_process_uses_spaced_name() {
        assert_eq!(MassEmailStatus::InProcess.to_string(), "In Process");
        assert_eq!(
            MassEmailStatus::from_str("In Process").unwrap(),
            MassEmailStatus::InProcess
        );
    }

    #[test]
    fn recipient_address_ignores_blank() {
        let mut r = Recipient {
            kind: RecipientKind::Lead,
            id: RecipientId("l1".into()),
            name: "Lee".into(),
            email_address: Some("   ".into()),
        };
        assert_eq!(r.address(), None);
        r.email_address = Some(" lee@example.com ".into());
        assert_eq!(r.address(), Some("lee@example.com"));
    }

    #[test]
    fn pagination_clamps_limit() {
        assert_eq!(Pagination::new(0, 0).effective_limit(), 1);
        assert_eq!(Pagination::new(0, 10_000).effective_limit(), 200);
        assert_eq!(Pagination::default().effective_limit(), 20);
    }

    #[test]
    fn terminal_statuses() {
        assert!(QueueItemStatus::Sent.is_terminal());
        assert!(QueueItemStatus::Failed.is_terminal());
        assert!(!QueueItemStatus::Pending.is_terminal());
        assert!(MassEmailStatus::Complete.is_terminal());
        assert!(!MassEmailStatus::InProcess.is_terminal());
    }
}
