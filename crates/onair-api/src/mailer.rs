use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize)]
pub struct MailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
}

/// Outbound mail. Delivery itself is somebody else's job; implementations
/// only hand the message over.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &MailMessage) -> anyhow::Result<()>;
}

/// Posts messages as JSON to an HTTP mail relay.
pub struct RelayMailer {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl RelayMailer {
    pub fn new(url: String, api_key: Option<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("building mail relay client")?;
        Ok(Self { client, url, api_key })
    }
}

#[async_trait]
impl Mailer for RelayMailer {
    async fn send(&self, message: &MailMessage) -> anyhow::Result<()> {
        let mut req = self.client.post(&self.url).json(message);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req.send().await.context("mail relay unreachable")?;
        resp.error_for_status().context("mail relay refused message")?;

        info!("Mail sent to {} via relay", message.to);
        Ok(())
    }
}

/// Used when no relay is configured. Writes the message to the log instead,
/// which is only useful on a developer machine.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &MailMessage) -> anyhow::Result<()> {
        info!("No mail relay configured; dropping mail to {}", message.to);
        debug!("Subject: {}\n{}", message.subject, message.text);
        Ok(())
    }
}
