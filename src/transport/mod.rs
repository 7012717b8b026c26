//! Outbound mail transport.
//!
//! The delivery queue talks to a [`MailTransport`] trait object so tests can
//! inject a recording stub and hosts can swap the wire implementation.
//! [`SmtpMailTransport`] is the production implementation over an
//! authenticated SMTP relay.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;

use crate::config::SmtpConfig;
use crate::queue::DeliveryOptions;
use crate::template::EmailTemplate;

/// Transport-specific error type
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("Invalid attachment content type: {0}")]
    ContentType(#[from] lettre::message::header::ContentTypeErr),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("Send failed: {0}")]
    Send(String),
}

/// Abstract mail transport invoked by the delivery queue.
///
/// The queue may invoke `send` more than once for the same logical
/// notification across retries; implementations must tolerate that.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(
        &self,
        recipient: &str,
        template: &EmailTemplate,
        options: &DeliveryOptions,
    ) -> Result<(), TransportError>;
}

/// SMTP transport over an authenticated relay.
pub struct SmtpMailTransport {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailTransport {
    /// Build the transport from SMTP settings.
    ///
    /// Credentials are attached only when both username and password are
    /// configured.
    pub fn new(config: &SmtpConfig) -> Result<Self, TransportError> {
        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?.port(config.port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            mailer: builder.build(),
            from: config.from_address.parse()?,
        })
    }

    fn build_message(
        &self,
        recipient: &str,
        template: &EmailTemplate,
        options: &DeliveryOptions,
    ) -> Result<Message, TransportError> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .to(recipient.parse()?)
            .subject(template.subject.clone());

        for cc in &options.cc {
            builder = builder.cc(cc.parse()?);
        }
        for bcc in &options.bcc {
            builder = builder.bcc(bcc.parse()?);
        }
        if let Some(reply_to) = &options.reply_to {
            builder = builder.reply_to(reply_to.parse()?);
        }

        let body = match &template.html {
            Some(html) => MultiPart::alternative_plain_html(template.body.clone(), html.clone()),
            None => MultiPart::alternative().singlepart(SinglePart::plain(template.body.clone())),
        };

        let message = if options.attachments.is_empty() {
            builder.multipart(body)?
        } else {
            let mut mixed = MultiPart::mixed().multipart(body);
            for attachment in &options.attachments {
                let content_type = ContentType::parse(&attachment.content_type)?;
                mixed = mixed.singlepart(
                    Attachment::new(attachment.filename.clone())
                        .body(attachment.content.clone(), content_type),
                );
            }
            builder.multipart(mixed)?
        };

        Ok(message)
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(
        &self,
        recipient: &str,
        template: &EmailTemplate,
        options: &DeliveryOptions,
    ) -> Result<(), TransportError> {
        let message = self.build_message(recipient, template, options)?;

        self.mailer.send(message).await?;

        tracing::debug!(
            recipient = %recipient,
            subject = %template.subject,
            priority = ?options.priority,
            "Message handed to SMTP relay"
        );

        Ok(())
    }
}
