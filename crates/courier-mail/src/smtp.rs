// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SMTP transport backed by lettre's async Tokio client.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::{ContentType, Header, HeaderName, HeaderValue};
use lettre::message::{Attachment as MailAttachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

use courier_config::model::{SmtpConfig, SmtpTls};
use courier_core::types::{Attachment, OutboundEmail, QueueItemId, SenderOverrides};
use courier_core::{
    AdapterType, CourierError, HealthStatus, MailTransport, PluginAdapter, redact_email,
};

/// Line width for the plain-text alternative of HTML messages.
const PLAIN_TEXT_WIDTH: usize = 80;

/// `X-Queue-Item-Id` header carrying the queue entry id, for bounce correlation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueItemIdHeader(pub String);

impl Header for QueueItemIdHeader {
    fn name() -> HeaderName {
        HeaderName::new_from_ascii_str("X-Queue-Item-Id")
    }

    fn parse(s: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Self(s.trim().to_string()))
    }

    fn display(&self) -> HeaderValue {
        HeaderValue::new(Self::name(), self.0.clone())
    }
}

fn transport_err(
    message: impl Into<String>,
    e: impl std::error::Error + Send + Sync + 'static,
) -> CourierError {
    CourierError::Transport {
        message: message.into(),
        source: Some(Box::new(e)),
    }
}

/// Sends mass email messages through one SMTP relay.
pub struct SmtpMailer {
    config: SmtpConfig,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    /// Build the relay client. No connection is made until the first send.
    pub fn new(config: SmtpConfig) -> Result<Self, CourierError> {
        let builder = match config.tls {
            SmtpTls::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| transport_err(format!("invalid SMTP relay `{}`", config.host), e))?,
            SmtpTls::Starttls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host).map_err(
                    |e| transport_err(format!("invalid SMTP relay `{}`", config.host), e),
                )?
            }
            SmtpTls::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host),
        };

        let mut builder = builder
            .port(config.port)
            .timeout(Some(Duration::from_secs(config.timeout_secs)));
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            config,
        })
    }

    fn mailbox(name: Option<&str>, address: &str) -> Result<Mailbox, CourierError> {
        let parsed: Address = address.trim().parse().map_err(|e| {
            transport_err(format!("invalid address `{}`", redact_email(address)), e)
        })?;
        Ok(Mailbox::new(name.map(str::to_string), parsed))
    }

    /// The `To` mailbox. Unlike sender addresses, which come from config, a
    /// bad recipient is a property of the record and is reported as permanent.
    fn recipient(address: &str) -> Result<Mailbox, CourierError> {
        let parsed: Address = address.trim().parse().map_err(|_| CourierError::InvalidAddress {
            address: redact_email(address),
        })?;
        Ok(Mailbox::new(None, parsed))
    }

    fn html_alternative(html: &str) -> Result<MultiPart, CourierError> {
        let plain = html2text::from_read(html.as_bytes(), PLAIN_TEXT_WIDTH)
            .map_err(|e| transport_err("failed to derive plain-text part", e))?;
        Ok(MultiPart::alternative_plain_html(plain, html.to_string()))
    }

    fn attachment(attachment: &Attachment) -> Result<SinglePart, CourierError> {
        let content_type = ContentType::parse(&attachment.content_type)
            .or_else(|_| ContentType::parse("application/octet-stream"))
            .map_err(|e| transport_err("invalid attachment content type", e))?;
        Ok(MailAttachment::new(attachment.name.clone())
            .body(attachment.contents.clone(), content_type))
    }

    /// Assemble the MIME message for one queue entry.
    ///
    /// HTML bodies are sent as multipart/alternative with a derived plain-text
    /// part. Attachments wrap the body in multipart/mixed.
    pub fn build_message(
        &self,
        message: &OutboundEmail,
        overrides: &SenderOverrides,
        correlation_id: QueueItemId,
        attachments: &[Attachment],
    ) -> Result<Message, CourierError> {
        let from_address = message
            .from_address
            .as_deref()
            .unwrap_or(&self.config.from_address);
        let from_name = overrides
            .from_name
            .as_deref()
            .or(self.config.from_name.as_deref());

        let mut builder = Message::builder()
            .from(Self::mailbox(from_name, from_address)?)
            .to(Self::recipient(&message.to)?)
            .subject(message.subject.clone())
            .header(QueueItemIdHeader(correlation_id.to_string()));
        if let Some(reply_to) = message.reply_to_address.as_deref() {
            builder = builder.reply_to(Self::mailbox(overrides.reply_to_name.as_deref(), reply_to)?);
        }

        let built = if attachments.is_empty() {
            if message.is_html {
                builder.multipart(Self::html_alternative(&message.body)?)
            } else {
                builder.singlepart(SinglePart::plain(message.body.clone()))
            }
        } else {
            let mut mixed = if message.is_html {
                MultiPart::mixed().multipart(Self::html_alternative(&message.body)?)
            } else {
                MultiPart::mixed().singlepart(SinglePart::plain(message.body.clone()))
            };
            for attachment in attachments {
                mixed = mixed.singlepart(Self::attachment(attachment)?);
            }
            builder.multipart(mixed)
        };

        built.map_err(|e| transport_err("failed to build message", e))
    }
}

#[async_trait]
impl PluginAdapter for SmtpMailer {
    fn name(&self) -> &str {
        "smtp"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transport
    }

    async fn health_check(&self) -> Result<HealthStatus, CourierError> {
        match self.transport.test_connection().await {
            Ok(true) => Ok(HealthStatus::Healthy),
            Ok(false) => Ok(HealthStatus::Unhealthy(format!(
                "SMTP relay {}:{} did not accept the connection",
                self.config.host, self.config.port
            ))),
            Err(e) => Err(CourierError::HealthCheckFailed {
                name: "smtp".to_string(),
                source: Box::new(e),
            }),
        }
    }

    async fn shutdown(&self) -> Result<(), CourierError> {
        Ok(())
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(
        &self,
        message: &OutboundEmail,
        overrides: &SenderOverrides,
        correlation_id: QueueItemId,
        attachments: &[Attachment],
    ) -> Result<(), CourierError> {
        let email = self.build_message(message, overrides, correlation_id, attachments)?;
        let response = self
            .transport
            .send(email)
            .await
            .map_err(|e| transport_err("SMTP send failed", e))?;
        debug!(
            queue_item_id = %correlation_id,
            to = %redact_email(&message.to),
            code = %response.code(),
            "message accepted by relay"
        );
        Ok(())
    }
}
