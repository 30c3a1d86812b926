// src/services/messaging_service.rs
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Mutex;
use thiserror::Error;

use crate::models::order::{OrderNotification, Target};
use crate::services::credentials::{ServiceAccountKey, TokenProvider};

pub const DEFAULT_FCM_BASE_URL: &str = "https://fcm.googleapis.com";

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("FCM authentication failed: {0}")]
    Auth(String),

    #[error("FCM request failed: {0}")]
    Transport(String),

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Unreadable FCM response: {0}")]
    InvalidResponse(String),
}

/// A data-only push message. There is no title or body: the receiving app
/// decides how to present it. Always sent with high delivery priority.
#[derive(Debug, Clone, PartialEq)]
pub struct PushMessage {
    pub target: Target,
    pub data: BTreeMap<String, String>,
}

impl PushMessage {
    pub fn new(target: Target, data: BTreeMap<String, String>) -> Self {
        Self { target, data }
    }
}

impl From<OrderNotification> for PushMessage {
    fn from(order: OrderNotification) -> Self {
        let (target, data) = order.into_parts();
        PushMessage::new(target, data)
    }
}

#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Deliver one message and return the provider-assigned message id.
    async fn send(&self, message: &PushMessage) -> Result<String, NotificationError>;
}

#[derive(Debug, Clone)]
pub struct FcmConfig {
    pub base_url: String,
}

impl Default for FcmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_FCM_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct FcmRequest<'a> {
    message: FcmMessage<'a>,
}

#[derive(Debug, Serialize)]
struct FcmMessage<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    topic: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<&'a str>,
    data: &'a BTreeMap<String, String>,
    android: serde_json::Value,
    apns: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct FcmSendResponse {
    name: String,
}

#[derive(Debug, Deserialize)]
struct FcmErrorEnvelope {
    error: FcmErrorBody,
}

#[derive(Debug, Deserialize)]
struct FcmErrorBody {
    #[serde(default)]
    message: String,
}

pub struct FcmNotificationService {
    project_id: String,
    config: FcmConfig,
    client: reqwest::Client,
    tokens: TokenProvider,
}

impl FcmNotificationService {
    pub fn new(key: &ServiceAccountKey, config: FcmConfig) -> Result<Self, String> {
        // No request timeout: a send waits for the provider to answer
        let client = reqwest::Client::new();
        let tokens = TokenProvider::new(key, client.clone())?;

        Ok(Self {
            project_id: key.project_id.clone(),
            config,
            client,
            tokens,
        })
    }

    /// Build the client straight from the configured credential blob.
    pub fn from_credentials_json(raw: &str, config: FcmConfig) -> Result<Self, String> {
        let key = ServiceAccountKey::from_json(raw)?;
        Self::new(&key, config)
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    fn send_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/messages:send",
            self.config.base_url.trim_end_matches('/'),
            self.project_id
        )
    }
}

fn build_request(message: &PushMessage) -> FcmRequest<'_> {
    let (topic, token) = match &message.target {
        Target::Topic(topic) => (Some(topic.as_str()), None),
        Target::Token(token) => (None, Some(token.as_str())),
    };

    FcmRequest {
        message: FcmMessage {
            topic,
            token,
            data: &message.data,
            // Wakes sleeping devices on both platforms
            android: json!({ "priority": "HIGH" }),
            apns: json!({ "headers": { "apns-priority": "10" } }),
        },
    }
}

#[async_trait]
impl NotificationService for FcmNotificationService {
    async fn send(&self, message: &PushMessage) -> Result<String, NotificationError> {
        let access_token = self.tokens.access_token().await?;

        tracing::info!(
            target_kind = %message.target.describe(),
            fields = message.data.len(),
            "Sending FCM data message"
        );

        let response = self
            .client
            .post(self.send_url())
            .bearer_auth(access_token)
            .json(&build_request(message))
            .send()
            .await
            .map_err(|e| NotificationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(%status, "FCM request failed: {}", error_text);

            let message = serde_json::from_str::<FcmErrorEnvelope>(&error_text)
                .map(|envelope| envelope.error.message)
                .unwrap_or(error_text);
            return Err(NotificationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: FcmSendResponse = response
            .json()
            .await
            .map_err(|e| NotificationError::InvalidResponse(e.to_string()))?;

        tracing::debug!(message_id = %body.name, "FCM message accepted");
        Ok(body.name)
    }
}

// Mock service for development and testing
#[derive(Debug, Default)]
pub struct MockNotificationService {
    sent: Mutex<Vec<PushMessage>>,
    failure: Option<String>,
}

impl MockNotificationService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every send fails with this provider message.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failure: Some(message.into()),
        }
    }

    pub fn sent(&self) -> Vec<PushMessage> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }

    pub fn send_count(&self) -> usize {
        self.sent.lock().map(|sent| sent.len()).unwrap_or_default()
    }
}

#[async_trait]
impl NotificationService for MockNotificationService {
    async fn send(&self, message: &PushMessage) -> Result<String, NotificationError> {
        let count = match self.sent.lock() {
            Ok(mut sent) => {
                sent.push(message.clone());
                sent.len()
            }
            Err(_) => return Err(NotificationError::Transport("mock state poisoned".into())),
        };

        tracing::info!("[MOCK] Would send FCM to {}", message.target.describe());

        match &self.failure {
            Some(msg) => Err(NotificationError::Api {
                status: 500,
                message: msg.clone(),
            }),
            None => Ok(format!("projects/mock/messages/{}", count)),
        }
    }
}
