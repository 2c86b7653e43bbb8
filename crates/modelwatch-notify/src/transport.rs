//! Outbound message transport.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{NotifyError, Result};

/// Telegram Bot API endpoint.
pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Request timeout for a single send.
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Sends one text message to one chat. Implementations make a single
/// attempt and never retry.
pub trait Transport: Send + Sync {
    fn send_message(
        &self,
        token: &str,
        chat_id: &str,
        text: &str,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Transport posting to the Telegram Bot API `sendMessage` method.
#[derive(Debug, Clone)]
pub struct TelegramTransport {
    client: reqwest::Client,
    base_url: String,
}

impl Default for TelegramTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl TelegramTransport {
    /// Create a transport against the public Bot API.
    pub fn new() -> Self {
        Self::with_base_url(TELEGRAM_API_URL)
    }

    /// Create a transport against a different Bot API server.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = build_client(reqwest::Client::builder().timeout(SEND_TIMEOUT));

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, token: &str) -> String {
        format!("{}/bot{}/sendMessage", self.base_url, token)
    }
}

/// Build `builder`, falling back to a default client with a warning.
fn build_client(builder: reqwest::ClientBuilder) -> reqwest::Client {
    match builder.build() {
        Ok(client) => client,
        Err(e) => {
            warn!(error = %e, "Failed to build HTTP client, sending without a timeout");
            reqwest::Client::new()
        }
    }
}

impl Transport for TelegramTransport {
    async fn send_message(&self, token: &str, chat_id: &str, text: &str) -> Result<()> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "disable_web_page_preview": true,
        });

        let response = self
            .client
            .post(self.endpoint(token))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(chat_id = %chat_id, "Telegram message delivered");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(NotifyError::Status {
            status: status.as_u16(),
            body,
        })
    }
}
