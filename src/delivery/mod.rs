pub mod native;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::error::DeliveryError;
use crate::templates::{Notification, TemplateRegistry};

pub use native::{NotificationSystem, Permission, WebhookPush};

/// Name of the in-app notification event.
pub const NOTIFICATION_EVENT: &str = "notification";

const EVENT_CAPACITY: usize = 256;

/// Detail of the in-app event emitted on every `send_notification`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub title: String,
    pub body: Option<String>,
    pub data: Value,
    pub target: Value,
}

/// What the scheduler calls to deliver a due reminder. An `Err` counts as a
/// failed attempt.
#[async_trait]
pub trait Delivery: Send + Sync {
    async fn deliver(&self, target: &Value, payload: &Value) -> Result<(), DeliveryError>;
}

/// Fans a notification out to the native channel, the in-app event and the
/// diagnostic log. Channels are independent; one failing never stops another.
pub struct Dispatcher {
    templates: Arc<TemplateRegistry>,
    native: Option<Arc<dyn NotificationSystem>>,
    events: broadcast::Sender<NotificationEvent>,
    permission_requested: AtomicBool,
}

impl Dispatcher {
    pub fn new(templates: Arc<TemplateRegistry>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            templates,
            native: None,
            events,
            permission_requested: AtomicBool::new(false),
        }
    }

    pub fn with_native(mut self, native: Arc<dyn NotificationSystem>) -> Self {
        self.native = Some(native);
        self
    }

    pub fn templates(&self) -> &Arc<TemplateRegistry> {
        &self.templates
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.events.subscribe()
    }

    /// Render and dispatch. Never fails.
    pub async fn send_notification(&self, target: &Value, payload: &Value) {
        let notification = self.templates.render(target, payload);

        match self.show_native(&notification, target).await {
            Ok(true) => tracing::debug!("Native notification shown: {}", notification.title),
            Ok(false) => {}
            Err(e) => tracing::warn!("Native notification failed: {e}"),
        }

        let event = NotificationEvent {
            title: notification.title.clone(),
            body: notification.body.clone(),
            data: notification.data.clone(),
            target: target.clone(),
        };
        if self.events.send(event).is_err() {
            tracing::trace!("No in-app listeners for notification");
        }

        tracing::info!(
            target: "reminders::notify",
            title = %notification.title,
            body = notification.body.as_deref().unwrap_or(""),
            destination = %target,
            "Notification dispatched"
        );
    }

    /// Returns whether the native channel actually showed the notification.
    async fn show_native(
        &self,
        notification: &Notification,
        target: &Value,
    ) -> Result<bool, DeliveryError> {
        let Some(native) = &self.native else {
            return Ok(false);
        };

        let permission = match native.permission() {
            Permission::Default if !self.permission_requested.swap(true, Ordering::SeqCst) => {
                native.request_permission().await?
            }
            permission => permission,
        };

        if permission != Permission::Granted {
            return Ok(false);
        }

        native.show(notification, target).await?;
        Ok(true)
    }
}

#[async_trait]
impl Delivery for Dispatcher {
    async fn deliver(&self, target: &Value, payload: &Value) -> Result<(), DeliveryError> {
        self.send_notification(target, payload).await;
        Ok(())
    }
}
