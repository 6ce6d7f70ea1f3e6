// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Default template renderer: `{{field}}` placeholders filled from the recipient.

use std::sync::LazyLock;

use courier_core::types::{EmailTemplate, Recipient, RenderedTemplate};
use courier_core::{CourierError, TemplateRenderer};
use regex::{Captures, Regex};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("placeholder pattern is valid")
});

/// Replaces `{{name}}`, `{{emailAddress}}`, `{{entityType}}` and `{{id}}`.
///
/// Unknown fields render as the empty string. Values are inserted verbatim;
/// the renderer does not HTML-escape.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderRenderer;

impl PlaceholderRenderer {
    pub fn new() -> Self {
        Self
    }

    fn field<'a>(recipient: &'a Recipient, name: &str) -> std::borrow::Cow<'a, str> {
        match name {
            "name" => recipient.name.as_str().into(),
            "emailAddress" => recipient.address().unwrap_or_default().into(),
            "entityType" => recipient.kind.to_string().into(),
            "id" => recipient.id.0.as_str().into(),
            _ => "".into(),
        }
    }

    fn fill(text: &str, recipient: &Recipient) -> String {
        PLACEHOLDER
            .replace_all(text, |caps: &Captures<'_>| {
                Self::field(recipient, &caps[1]).into_owned()
            })
            .into_owned()
    }
}

impl TemplateRenderer for PlaceholderRenderer {
    fn render(
        &self,
        template: &EmailTemplate,
        recipient: &Recipient,
    ) -> Result<RenderedTemplate, CourierError> {
        Ok(RenderedTemplate {
            subject: Self::fill(&template.subject, recipient),
            body: Self::fill(&template.body, recipient),
            is_html: template.is_html,
        })
    }
}
