use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::MailConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
}

/// Outbound mail capability.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Builds the mailer described by the config: the HTTP relay when enabled,
/// otherwise a mailer that only logs.
pub fn from_config(config: &MailConfig) -> Result<Arc<dyn Mailer>> {
    if config.enabled {
        Ok(Arc::new(HttpMailer::new(config)?))
    } else {
        Ok(Arc::new(LogMailer))
    }
}

#[derive(Debug, Serialize)]
struct RelayRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// Posts messages as JSON to an HTTP mail relay.
#[derive(Clone)]
pub struct HttpMailer {
    client: Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl HttpMailer {
    pub fn new(config: &MailConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent("StockPlus/1.0")
            .build()
            .context("Failed to build mail HTTP client")?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            from: config.from.clone(),
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let body = RelayRequest {
            from: &self.from,
            to: &message.to,
            subject: &message.subject,
            text: &message.text,
        };

        let mut request = self.client.post(&self.api_url).json(&body);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request
            .send()
            .await
            .context("Failed to reach mail relay")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            bail!("Mail relay rejected message ({status}): {detail}");
        }

        debug!(to = %message.to, "Mail relay accepted message");
        Ok(())
    }
}

/// Writes the message to the log instead of sending it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(
            to = %message.to,
            subject = %message.subject,
            "Mail delivery disabled, message follows:\n{}",
            message.text
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_mailer_always_succeeds() {
        let message = EmailMessage {
            to: "owner@example.com".to_string(),
            subject: "Test".to_string(),
            text: "body".to_string(),
        };
        assert!(LogMailer.send(&message).await.is_ok());
    }

    #[test]
    fn test_from_config_builds_relay_when_enabled() {
        let config = MailConfig {
            enabled: true,
            api_url: "http://127.0.0.1:9/send".to_string(),
            ..MailConfig::default()
        };
        assert!(from_config(&config).is_ok());
    }
}
