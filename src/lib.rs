// Supporting infrastructure
pub mod config;
pub mod error;
pub mod telemetry;

// Domain layer
pub mod queue;
pub mod ratelimit;
pub mod template;
pub mod transport;

// Caller-facing API
pub mod mailer;

pub use config::{MailerSettings, QueueSettings, SmtpConfig};
pub use error::{NotifierError, Result};
pub use mailer::NotificationMailer;
pub use queue::{
    DeliveryOptions, DeliveryQueue, DeliveryStatus, EmailAttachment, Priority, QueueItem,
};
pub use template::{EmailTemplate, NotificationKind, VisaApplication};
pub use transport::{MailTransport, SmtpMailTransport, TransportError};
