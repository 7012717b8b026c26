use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct MailerSettings {
    pub smtp: SmtpConfig,
    #[serde(default)]
    pub queue: QueueSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueSettings {
    /// Maximum failed attempts before an item is marked failed
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Delay in milliseconds before the queue resumes after a failed attempt
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Dispatch ceiling in sends per minute
    #[serde(default = "default_rate_limit_per_minute")]
    pub rate_limit_per_minute: u32,
}

fn default_smtp_port() -> u16 {
    587
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    5000 // 5 seconds
}

fn default_rate_limit_per_minute() -> u32 {
    100
}

impl MailerSettings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            // Start with default values
            .set_default("smtp.port", 587)?
            .set_default("queue.max_retries", 3)?
            .set_default("queue.retry_delay_ms", 5000)?
            .set_default("queue.rate_limit_per_minute", 100)?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Load from environment variables
            // SMTP_HOST, SMTP_PORT, SMTP_USERNAME, SMTP_FROM_ADDRESS, etc.
            .add_source(
                Environment::default()
                    .separator("_")
                    .try_parsing(true)
                    .list_separator(","),
            );

        builder.build()?.try_deserialize()
    }

    pub fn smtp_addr(&self) -> String {
        format!("{}:{}", self.smtp.host, self.smtp.port)
    }
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            rate_limit_per_minute: default_rate_limit_per_minute(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let queue = QueueSettings::default();
        assert_eq!(queue.max_retries, 3);
        assert_eq!(queue.retry_delay_ms, 5000);
        assert_eq!(queue.rate_limit_per_minute, 100);
    }

    #[test]
    fn test_smtp_addr() {
        let settings = MailerSettings {
            smtp: SmtpConfig {
                host: "smtp.example.com".to_string(),
                port: 2525,
                username: None,
                password: None,
                from_address: "noreply@example.com".to_string(),
            },
            queue: QueueSettings::default(),
        };
        assert_eq!(settings.smtp_addr(), "smtp.example.com:2525");
    }
}
