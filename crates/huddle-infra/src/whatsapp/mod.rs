//! WhatsApp Cloud API transport.
//!
//! Outbound text delivery (`WhatsAppClient`, the production
//! [`NotificationSink`]), inbound payload parsing, and webhook signature
//! verification.

pub mod payload;
pub mod signature;

use std::time::Duration;

use huddle_core::notify::NotificationSink;
use huddle_types::config::WhatsAppConfig;
use huddle_types::error::NotifyError;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

pub use payload::parse_webhook_payload;
pub use signature::{SIGNATURE_HEADER, SignatureError, sign, verify_signature};

const GRAPH_BASE_URL: &str = "https://graph.facebook.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct SendTextRequest<'a> {
    messaging_product: &'static str,
    to: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    text: TextBody<'a>,
}

#[derive(Debug, Serialize)]
struct TextBody<'a> {
    body: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendTextResponse {
    #[serde(default)]
    messages: Vec<SentMessage>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    id: String,
}

impl<'a> SendTextRequest<'a> {
    fn new(to: &'a str, body: &'a str) -> Self {
        Self {
            messaging_product: "whatsapp",
            to,
            kind: "text",
            text: TextBody { body },
        }
    }
}

/// Sends text messages through the WhatsApp Cloud API.
///
/// Without an access token or phone number id every send fails with
/// [`NotifyError::NotConfigured`].
pub struct WhatsAppClient {
    client: reqwest::Client,
    access_token: Option<SecretString>,
    phone_number_id: Option<String>,
    api_version: String,
    base_url: String,
}

impl WhatsAppClient {
    pub fn from_config(config: &WhatsAppConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            access_token: config
                .access_token
                .as_ref()
                .map(|t| SecretString::from(t.expose_secret().to_string())),
            phone_number_id: config.phone_number_id.clone(),
            api_version: config.api_version.clone(),
            base_url: GRAPH_BASE_URL.to_string(),
        })
    }

    /// Override the Graph API base URL (proxies, local stubs).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn messages_url(&self, phone_number_id: &str) -> String {
        format!(
            "{}/{}/{}/messages",
            self.base_url.trim_end_matches('/'),
            self.api_version,
            phone_number_id
        )
    }
}

impl NotificationSink for WhatsAppClient {
    async fn send(&self, recipient: &str, text: &str) -> Result<(), NotifyError> {
        let (Some(token), Some(phone_number_id)) = (&self.access_token, &self.phone_number_id)
        else {
            return Err(NotifyError::NotConfigured(
                "WhatsApp access token or phone number id".to_string(),
            ));
        };

        let delivery_err = |message: String| NotifyError::Delivery {
            recipient: recipient.to_string(),
            message,
        };

        let response = self
            .client
            .post(self.messages_url(phone_number_id))
            .bearer_auth(token.expose_secret())
            .json(&SendTextRequest::new(recipient, text))
            .send()
            .await
            .map_err(|e| delivery_err(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            tracing::error!(to = recipient, %status, body = %error_body, "WhatsApp send failed");
            return Err(delivery_err(format!("HTTP {status}: {error_body}")));
        }

        let sent: SendTextResponse = response
            .json()
            .await
            .map_err(|e| delivery_err(format!("failed to parse response: {e}")))?;
        let message_id = sent.messages.first().map(|m| m.id.as_str()).unwrap_or("");
        tracing::info!(to = recipient, message_id, "message sent");

        Ok(())
    }
}
