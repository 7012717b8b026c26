//! Caller-facing notification API.
//!
//! [`NotificationMailer`] composes the template builders with the delivery
//! queue: each `enqueue_*` method renders the content for its notification
//! kind, appends it to the queue and returns the item id immediately.
//! Delivery outcome is observed by polling [`NotificationMailer::get_status`].

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::config::{MailerSettings, QueueSettings};
use crate::error::Result;
use crate::queue::{DeliveryOptions, DeliveryQueue, QueueItem};
use crate::template::{self, VisaApplication};
use crate::transport::{MailTransport, SmtpMailTransport};

/// Notification mailer for the administration portal.
///
/// One instance per composing service; no global state. Clones share the
/// same underlying queue.
#[derive(Clone)]
pub struct NotificationMailer {
    queue: DeliveryQueue,
}

impl NotificationMailer {
    /// Build a mailer dispatching through an SMTP relay per the settings.
    pub fn new(settings: &MailerSettings) -> Result<Self> {
        let transport = Arc::new(SmtpMailTransport::new(&settings.smtp)?);
        Ok(Self::with_transport(settings.queue.clone(), transport))
    }

    /// Build a mailer over an injected transport.
    pub fn with_transport(queue_settings: QueueSettings, transport: Arc<dyn MailTransport>) -> Self {
        Self {
            queue: DeliveryQueue::new(queue_settings, transport),
        }
    }

    /// Queue a visa expiry reminder for an application.
    pub fn enqueue_visa_expiry_reminder(
        &self,
        application: &VisaApplication,
        recipient: &str,
    ) -> Uuid {
        let template = template::visa_expiry_reminder(application, Utc::now());
        self.queue
            .enqueue(recipient, template, DeliveryOptions::default())
    }

    /// Queue a notice that a document was uploaded to an employee's file.
    pub fn enqueue_document_upload_notice(
        &self,
        document_name: &str,
        document_type: &str,
        uploaded_by: &str,
        recipient: &str,
    ) -> Uuid {
        let template = template::document_uploaded(
            document_name,
            Some(document_type),
            Some(uploaded_by),
            Utc::now(),
        );
        self.queue
            .enqueue(recipient, template, DeliveryOptions::default())
    }

    /// Queue a welcome message for a newly registered employee.
    pub fn enqueue_welcome_message(&self, recipient: &str, name: &str) -> Uuid {
        let template = template::welcome(Some(name));
        self.queue
            .enqueue(recipient, template, DeliveryOptions::default())
    }

    /// Last known record for a previously issued id.
    pub fn get_status(&self, id: Uuid) -> Option<QueueItem> {
        self.queue.get_status(id)
    }

    /// Pending items in dispatch order.
    pub fn queue_snapshot(&self) -> Vec<QueueItem> {
        self.queue.queue_snapshot()
    }

    /// The underlying queue, for enqueueing pre-built templates with
    /// explicit delivery options.
    pub fn queue(&self) -> &DeliveryQueue {
        &self.queue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::EmailTemplate;
    use crate::transport::TransportError;
    use async_trait::async_trait;
    use chrono::Duration;

    struct NullTransport;

    #[async_trait]
    impl MailTransport for NullTransport {
        async fn send(
            &self,
            _recipient: &str,
            _template: &EmailTemplate,
            _options: &DeliveryOptions,
        ) -> std::result::Result<(), TransportError> {
            Ok(())
        }
    }

    fn mailer() -> NotificationMailer {
        NotificationMailer::with_transport(QueueSettings::default(), Arc::new(NullTransport))
    }

    #[tokio::test]
    async fn test_enqueue_returns_resolvable_ids() {
        let mailer = mailer();

        let application = VisaApplication {
            applicant_name: "Jordan Lee".to_string(),
            visa_type: "H-1B".to_string(),
            visa_number: None,
            expiry_date: Utc::now() + Duration::days(30),
        };

        let a = mailer.enqueue_visa_expiry_reminder(&application, "jordan@example.com");
        let b = mailer.enqueue_document_upload_notice(
            "passport.pdf",
            "passport",
            "hr-admin",
            "jordan@example.com",
        );
        let c = mailer.enqueue_welcome_message("jordan@example.com", "Jordan");

        for id in [a, b, c] {
            assert!(mailer.get_status(id).is_some());
        }
    }

    #[tokio::test]
    async fn test_enqueued_templates_carry_rendered_content() {
        let mailer = mailer();

        let id = mailer.enqueue_welcome_message("new-hire@example.com", "Sam");
        let item = mailer.get_status(id).unwrap();

        assert_eq!(item.recipient, "new-hire@example.com");
        assert_eq!(item.template.subject, "Welcome to VisaHub");
        assert!(item.template.body.contains("Sam"));
        assert!(item.template.html.is_some());
    }
}
