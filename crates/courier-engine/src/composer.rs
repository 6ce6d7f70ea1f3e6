// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Render one queue entry's message and fill its opt-out and tracking slots.

use std::sync::Arc;

use courier_config::model::SiteConfig;
use courier_core::types::{
    EmailTemplate, MassEmail, OutboundEmail, QueueItem, QueueItemId, Recipient, SenderOverrides,
    TrackingUrl,
};
use courier_core::{CourierError, TemplateRenderer};
use courier_mail::{Slot, SlotBody, SlotMarker, SlotValues};

/// A message ready for the transport, with the display names that travel beside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedEmail {
    pub message: OutboundEmail,
    pub overrides: SenderOverrides,
}

pub struct EmailComposer {
    site: SiteConfig,
    renderer: Arc<dyn TemplateRenderer>,
}

impl EmailComposer {
    pub fn new(site: SiteConfig, renderer: Arc<dyn TemplateRenderer>) -> Self {
        Self { site, renderer }
    }

    /// `site.url + unsubscribe_path + entry id`
    pub fn opt_out_url(&self, entry: QueueItemId) -> String {
        format!("{}{}{}", self.site.url, self.site.unsubscribe_path, entry)
    }

    pub fn opt_out_link(&self, entry: QueueItemId) -> String {
        format!(
            "<a href=\"{}\">{}</a>",
            self.opt_out_url(entry),
            self.site.opt_out_label
        )
    }

    /// `site.url + tracking_path + tracking url id + "&queueItemId=" + entry id`
    pub fn tracking_url(&self, tracking: &TrackingUrl, entry: QueueItemId) -> String {
        format!(
            "{}{}{}&queueItemId={}",
            self.site.url, self.site.tracking_path, tracking.id, entry
        )
    }

    /// Compose the message for `entry`. Returns `None` if the recipient has no address.
    pub fn compose(
        &self,
        entry: &QueueItem,
        mass_email: &MassEmail,
        template: &EmailTemplate,
        recipient: &Recipient,
        tracking_urls: &[TrackingUrl],
    ) -> Result<Option<ComposedEmail>, CourierError> {
        let Some(address) = recipient.address() else {
            return Ok(None);
        };

        let rendered = self.renderer.render(template, recipient)?;

        let mut markers = SlotMarker::opt_out().to_vec();
        let mut values = SlotValues::new();
        values
            .set(Slot::OptOutUrl, self.opt_out_url(entry.id))
            .set(Slot::OptOutLink, self.opt_out_link(entry.id));
        for tracking in tracking_urls {
            let slot = Slot::TrackingUrl(tracking.id.clone());
            markers.push(SlotMarker::new(tracking.url_to_use.clone(), slot.clone()));
            values.set(slot, self.tracking_url(tracking, entry.id));
        }

        let mut body = SlotBody::parse(&rendered.body, &markers).fill(&values);
        if !contains_ignore_case(&body, &self.site.unsubscribe_path) {
            if rendered.is_html {
                body.push_str("<br><br>");
                body.push_str(&self.opt_out_link(entry.id));
            } else {
                body.push_str("\n\n");
                body.push_str(&self.opt_out_url(entry.id));
            }
        }

        Ok(Some(ComposedEmail {
            message: OutboundEmail {
                to: address.to_string(),
                subject: rendered.subject,
                body,
                is_html: rendered.is_html,
                from_address: mass_email.from_address.clone(),
                reply_to_address: mass_email.reply_to_address.clone(),
            },
            overrides: mass_email.sender_overrides(),
        }))
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
