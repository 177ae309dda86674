//! Scheduling entry points and the due-reminder runner.
//!
//! Each reminder moves `pending -> sending -> sent | pending | failed`.
//! `sent` and `failed` are terminal. A reminder still marked `sending` when a
//! run starts was abandoned mid-attempt and is retried like `pending`. Every
//! transition is written back to the
//! store before the next step, including the `sending` mark that precedes a
//! delivery attempt, so another engine over the same backend observes work in
//! flight. This narrows but does not close the window where two engines both
//! load a reminder as due and both deliver it: delivery is at-least-once.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::delivery::{Delivery, Dispatcher, NotificationEvent};
use crate::error::ReminderError;
use crate::ids;
use crate::models::{MAX_ATTEMPTS, NewReminder, Reminder, ReminderStatus, StoredReminder};
use crate::store::ReminderStore;
use crate::templates::Renderer;
use crate::timestamp;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

pub struct ReminderEngine {
    store: ReminderStore,
    dispatcher: Arc<Dispatcher>,
    delivery: Arc<dyn Delivery>,
    clock: Arc<dyn Clock>,
}

impl ReminderEngine {
    /// Engine that delivers through `dispatcher` and stamps with the system clock.
    pub fn new(store: ReminderStore, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            store,
            delivery: dispatcher.clone(),
            dispatcher,
            clock: Arc::new(SystemClock),
        }
    }

    /// Route due-reminder attempts through a different delivery path.
    pub fn with_delivery(mut self, delivery: Arc<dyn Delivery>) -> Self {
        self.delivery = delivery;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &ReminderStore {
        &self.store
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<NotificationEvent> {
        self.dispatcher.subscribe()
    }

    /// Merge renderers into the template registry.
    pub fn configure_templates<I, K>(&self, templates: I)
    where
        I: IntoIterator<Item = (K, Renderer)>,
        K: Into<String>,
    {
        self.dispatcher.templates().configure(templates);
    }

    /// Insert a reminder, or update `at`/`payload` of the one with the same id.
    /// Retry history (`attempts`, `status`, `createdAt`) is kept on update.
    pub async fn schedule_reminder(&self, input: NewReminder) -> Result<String, ReminderError> {
        let at = input
            .at
            .filter(|at| !at.trim().is_empty())
            .ok_or_else(|| ReminderError::InvalidInput("at is required".to_string()))?;
        if timestamp::parse(&at).is_none() {
            return Err(ReminderError::InvalidInput(format!(
                "at is not a valid timestamp: {at}"
            )));
        }

        let mut records = self.store.load().await;

        let id = match input.id.filter(|id| !id.is_empty()) {
            Some(id) => id,
            None => ids::generate_id(),
        };

        let existing = records
            .iter_mut()
            .filter_map(StoredReminder::as_reminder_mut)
            .find(|r| r.id == id);

        match existing {
            Some(existing) => {
                existing.at = at;
                existing.payload = input.payload;
                tracing::debug!("Rescheduled reminder {id} (status={})", existing.status);
            }
            None => {
                records.push(StoredReminder::Known(Reminder {
                    id: id.clone(),
                    at,
                    payload: input.payload,
                    attempts: 0,
                    status: ReminderStatus::Pending,
                    created_at: timestamp::format(self.clock.now()),
                    last_attempt_at: None,
                    sent_at: None,
                }));
                tracing::debug!("Scheduled reminder {id}");
            }
        }

        self.store.save(&records).await;
        Ok(id)
    }

    /// Drive every due `pending` (or abandoned `sending`) reminder through one
    /// delivery attempt, in stored order. Faults become reminder state;
    /// nothing is returned.
    pub async fn run_due_reminders(&self, now: Option<DateTime<Utc>>) {
        let now = now.unwrap_or_else(|| self.clock.now());
        let mut records = self.store.load().await;

        for i in 0..records.len() {
            let Some(reminder) = records[i].as_reminder_mut() else {
                continue;
            };
            if matches!(reminder.status, ReminderStatus::Sent | ReminderStatus::Failed) {
                continue;
            }

            let Some(at) = timestamp::parse(&reminder.at) else {
                reminder.attempts = reminder.attempts.saturating_add(1);
                reminder.last_attempt_at = Some(timestamp::format(self.clock.now()));
                reminder.status = ReminderStatus::Failed;
                tracing::warn!(
                    "Reminder {} has an unparsable due time '{}', marking failed",
                    reminder.id,
                    reminder.at
                );
                self.store.save(&records).await;
                continue;
            };

            if at > now {
                continue;
            }

            reminder.status = ReminderStatus::Sending;
            let target = reminder.target();
            let payload = reminder.payload.clone();
            self.store.save(&records).await;

            let outcome = self.delivery.deliver(&target, &payload).await;

            let Some(reminder) = records[i].as_reminder_mut() else {
                continue;
            };
            let stamp = timestamp::format(self.clock.now());
            match outcome {
                Ok(()) => {
                    reminder.status = ReminderStatus::Sent;
                    reminder.last_attempt_at = Some(stamp.clone());
                    reminder.sent_at = Some(stamp);
                    tracing::debug!("Reminder {} sent", reminder.id);
                }
                Err(e) => {
                    reminder.attempts = reminder.attempts.saturating_add(1).min(MAX_ATTEMPTS);
                    reminder.last_attempt_at = Some(stamp);
                    reminder.status = if reminder.attempts >= MAX_ATTEMPTS {
                        ReminderStatus::Failed
                    } else {
                        ReminderStatus::Pending
                    };
                    tracing::debug!(
                        "Reminder {} delivery failed (attempt={}, status={}): {e}",
                        reminder.id,
                        reminder.attempts,
                        reminder.status
                    );
                }
            }
            self.store.save(&records).await;
        }
    }

    /// Render and dispatch a notification immediately. Never fails.
    pub async fn send_notification(&self, target: &Value, payload: &Value) {
        self.dispatcher.send_notification(target, payload).await;
    }

    pub async fn reminders(&self) -> Vec<Reminder> {
        self.store.reminders().await
    }

    pub async fn reminder(&self, id: &str) -> Option<Reminder> {
        self.store.reminders().await.into_iter().find(|r| r.id == id)
    }
}
