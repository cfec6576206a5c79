//! Chat notifications, sent best-effort after match results and party code changes.

use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("webhook request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Sends a message to a chat channel, optionally pinging a role.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, channel: &str, message: &str, role: Option<&str>) -> Result<(), NotifyError>;
}

/// Notifier that only logs; used when no webhook is configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, channel: &str, message: &str, role: Option<&str>) -> Result<(), NotifyError> {
        log::info!("[notify #{}{}] {}", channel, role.map(|r| format!(" @{r}")).unwrap_or_default(), message);
        Ok(())
    }
}

#[derive(Serialize)]
struct WebhookBody<'a> {
    channel: &'a str,
    content: String,
}

/// Posts `{ channel, content }` JSON to a chat webhook. Role pings use the `<@&role>` mention form.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, channel: &str, message: &str, role: Option<&str>) -> Result<(), NotifyError> {
        let content = match role {
            Some(role) => format!("<@&{role}> {message}"),
            None => message.to_string(),
        };
        self.client
            .post(&self.url)
            .json(&WebhookBody { channel, content })
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
