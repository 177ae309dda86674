use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DeliveryError;
use crate::templates::Notification;

/// Permission state of a system notification capability. The engine observes
/// it but never sets it directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Default,
    Granted,
    Denied,
}

#[async_trait]
pub trait NotificationSystem: Send + Sync {
    fn permission(&self) -> Permission;

    /// Ask for permission. Resolves to the resulting state.
    async fn request_permission(&self) -> Result<Permission, DeliveryError>;

    async fn show(&self, notification: &Notification, target: &Value) -> Result<(), DeliveryError>;
}

/// Native channel that POSTs each notification as JSON to a fixed URL.
pub struct WebhookPush {
    client: reqwest::Client,
    url: String,
}

impl WebhookPush {
    pub fn new(url: impl Into<String>) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| format!("Failed to build push client: {e}"))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl NotificationSystem for WebhookPush {
    fn permission(&self) -> Permission {
        if self.url.is_empty() {
            Permission::Denied
        } else {
            Permission::Granted
        }
    }

    async fn request_permission(&self) -> Result<Permission, DeliveryError> {
        Ok(self.permission())
    }

    async fn show(&self, notification: &Notification, target: &Value) -> Result<(), DeliveryError> {
        let mut body = serde_json::to_value(notification)
            .map_err(|e| DeliveryError::from(format!("Failed to encode notification: {e}")))?;
        body["target"] = target.clone();

        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| DeliveryError::from(format!("Push request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DeliveryError::from(format!(
                "Push endpoint returned {}",
                status.as_u16()
            )));
        }

        Ok(())
    }
}
