//! Generic webhook notification channel.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, header::HeaderMap};
use serde_json::json;
use tracing::{debug, warn};

use super::NotificationChannel;
use crate::notification::message::OutboundMessage;
use crate::utils::http_client;
use crate::{Error, Result};

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Webhook channel configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookConfig {
    /// Whether the channel is enabled.
    pub enabled: bool,
    /// Webhook URL.
    pub url: String,
    /// HTTP method, `POST` or `PUT`.
    pub method: String,
    /// Custom headers.
    pub headers: Vec<(String, String)>,
    /// Authentication type.
    pub auth: Option<WebhookAuth>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

/// Webhook authentication configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookAuth {
    /// Bearer token authentication.
    Bearer { token: String },
    /// Basic authentication.
    Basic { username: String, password: String },
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: String::new(),
            method: "POST".to_string(),
            headers: Vec::new(),
            auth: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl WebhookConfig {
    /// Enabled POST webhook for `url`.
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            enabled: true,
            url: url.into(),
            ..Default::default()
        }
    }
}

/// Generic webhook notification channel.
pub struct WebhookChannel {
    config: WebhookConfig,
    client: Client,
}

impl WebhookChannel {
    /// Create a new Webhook channel.
    pub fn new(config: WebhookConfig) -> Self {
        let client = http_client::build_client(Duration::from_secs(config.timeout_secs));
        Self { config, client }
    }

    /// Build the request headers.
    fn build_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        for (name, value) in &self.config.headers {
            if let (Ok(name), Ok(value)) = (
                name.parse::<reqwest::header::HeaderName>(),
                value.parse::<reqwest::header::HeaderValue>(),
            ) {
                headers.insert(name, value);
            } else {
                warn!(header = %name, "Skipping invalid webhook header");
            }
        }

        // Basic auth is applied on the request builder
        if let Some(WebhookAuth::Bearer { token }) = &self.config.auth {
            if let Ok(value) = format!("Bearer {}", token).parse() {
                headers.insert(reqwest::header::AUTHORIZATION, value);
            }
        }

        headers
    }

    /// Build the request for `message`.
    fn build_request(&self, message: &OutboundMessage) -> RequestBuilder {
        let method = match self.config.method.to_uppercase().as_str() {
            "PUT" => Method::PUT,
            _ => Method::POST,
        };

        let mut request = self
            .client
            .request(method, &self.config.url)
            .headers(self.build_headers())
            .json(&self.build_payload(message));

        if let Some(WebhookAuth::Basic { username, password }) = &self.config.auth {
            request = request.basic_auth(username, Some(password));
        }

        request
    }

    /// Build the JSON payload.
    fn build_payload(&self, message: &OutboundMessage) -> serde_json::Value {
        json!({
            "kind": message.kind.as_str(),
            "title": message.title,
            "text": message.text,
            "image": message.image,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })
    }
}

#[async_trait]
impl NotificationChannel for WebhookChannel {
    fn channel_type(&self) -> &'static str {
        "webhook"
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled && !self.config.url.is_empty()
    }

    async fn send(&self, message: &OutboundMessage) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }

        let response = self
            .build_request(message)
            .send()
            .await
            .map_err(|e| Error::notification(format!("Webhook request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Webhook failed: {} - {}", status, body);
            return Err(Error::notification(format!(
                "Webhook failed: {} - {}",
                status, body
            )));
        }

        debug!(kind = %message.kind, "Webhook notification sent");
        Ok(())
    }
}
