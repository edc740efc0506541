//! Facebook Messenger API client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info, warn};

use relay_core::FacebookConfig;

use crate::error::{FacebookError, Result};

/// Delivers a text message to a Messenger user
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Send `text` to `recipient_id`, returning the platform's raw response
    async fn send_message(&self, recipient_id: &str, text: &str) -> Result<serde_json::Value>;
}

/// Facebook Graph API client
#[derive(Clone)]
pub struct FacebookApi {
    client: Client,
    graph_api_url: String,
    access_token: String,
}

impl FacebookApi {
    /// Create a new Facebook API client; `timeout` bounds each request
    pub fn new(config: &FacebookConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            graph_api_url: config.graph_api_url.trim_end_matches('/').to_string(),
            access_token: config.page_access_token.clone(),
        })
    }
}

#[async_trait]
impl MessageSender for FacebookApi {
    async fn send_message(&self, recipient_id: &str, text: &str) -> Result<serde_json::Value> {
        let url = format!("{}/me/messages", self.graph_api_url);

        let payload = SendMessagePayload {
            recipient: Recipient {
                id: recipient_id.to_string(),
            },
            message: MessageText {
                text: text.to_string(),
            },
        };

        debug!("Sending message to {} ({} chars)", recipient_id, text.chars().count());

        let response = self
            .client
            .post(&url)
            .query(&[("access_token", &self.access_token)])
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let body: serde_json::Value = serde_json::from_str(&body)?;

        if status.is_success() {
            info!(
                "Message sent to {}: message_id={}",
                recipient_id,
                body.get("message_id").and_then(|v| v.as_str()).unwrap_or("-")
            );
        } else {
            warn!("Facebook Send API returned {} for {}: {}", status, recipient_id, body);
        }

        Ok(body)
    }
}

/// Check a webhook subscription handshake
///
/// Returns the challenge to echo back on success.
pub fn verify_subscription(verify_token: &str, params: &VerifyParams) -> Result<String> {
    let mode = params.mode.as_deref().filter(|m| !m.is_empty());
    let token = params.verify_token.as_deref().filter(|t| !t.is_empty());

    let (Some(mode), Some(token)) = (mode, token) else {
        warn!("Webhook verification request without mode or token");
        return Err(FacebookError::MissingVerifyParams);
    };

    if mode == "subscribe" && token == verify_token {
        info!("Webhook verified successfully");
        Ok(params.challenge.clone().unwrap_or_default())
    } else {
        warn!("Webhook verification failed: invalid mode or token");
        Err(FacebookError::WebhookVerificationFailed)
    }
}

/// Decode a webhook request body as JSON
pub fn parse_webhook(body: &[u8]) -> Result<serde_json::Value> {
    serde_json::from_slice(body).map_err(|e| FacebookError::InvalidPayload(e.to_string()))
}

/// Whether a decoded webhook body comes from a Page subscription
pub fn is_page_event(body: &serde_json::Value) -> bool {
    body.get("object").and_then(serde_json::Value::as_str) == Some("page")
}

/// Deserialize a list item by item, dropping the items that do not fit `T`
fn skip_malformed<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?.unwrap_or_default();

    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!("Skipping malformed webhook item: {}", e);
                None
            }
        })
        .collect())
}

// =============================================================================
// Data structures for Facebook Messenger API
// =============================================================================

/// Query parameters of the verification handshake
#[derive(Debug, Default, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

#[derive(Debug, Serialize)]
struct SendMessagePayload {
    recipient: Recipient,
    message: MessageText,
}

#[derive(Debug, Serialize)]
struct Recipient {
    id: String,
}

#[derive(Debug, Serialize)]
struct MessageText {
    text: String,
}

/// A Page webhook delivery
///
/// Entries and events that do not have the expected shape are dropped
/// individually so one bad event never costs its siblings their reply.
#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    #[serde(default, deserialize_with = "skip_malformed")]
    pub entry: Vec<WebhookEntry>,
}

impl WebhookPayload {
    /// Build a payload from an already decoded body
    pub fn from_value(body: serde_json::Value) -> Result<Self> {
        serde_json::from_value(body).map_err(|e| FacebookError::InvalidPayload(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
pub struct WebhookEntry {
    #[serde(default, deserialize_with = "skip_malformed")]
    pub messaging: Vec<WebhookMessaging>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookMessaging {
    pub sender: Option<WebhookSender>,
    pub message: Option<WebhookMessage>,
}

impl WebhookMessaging {
    pub fn sender_id(&self) -> Option<&str> {
        self.sender.as_ref().map(|s| s.id.as_str())
    }

    /// Message text, if the event carries a non-empty one
    pub fn text(&self) -> Option<&str> {
        self.message
            .as_ref()
            .and_then(|m| m.text.as_deref())
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct WebhookSender {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct WebhookMessage {
    pub text: Option<String>,
}
