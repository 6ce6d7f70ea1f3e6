// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Template rendering trait.

use crate::error::CourierError;
use crate::types::{EmailTemplate, Recipient, RenderedTemplate};

/// Renders a template with a recipient as context.
pub trait TemplateRenderer: Send + Sync {
    fn render(
        &self,
        template: &EmailTemplate,
        recipient: &Recipient,
    ) -> Result<RenderedTemplate, CourierError>;
}
