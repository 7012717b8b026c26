pub mod settings;

pub use settings::{MailerSettings, QueueSettings, SmtpConfig};
