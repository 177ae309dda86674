use serde::{Deserialize, Serialize};

/// Retry ceiling. Reaching it while non-terminal forces `Failed`.
pub const MAX_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReminderStatus {
    #[default]
    Pending,
    Sending,
    Sent,
    Failed,
}

impl ReminderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderStatus::Pending => "pending",
            ReminderStatus::Sending => "sending",
            ReminderStatus::Sent => "sent",
            ReminderStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ReminderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted unit of work. Timestamps are kept as the stored text so that a
/// record with an unparsable `at` survives a load/save cycle unchanged.
///
/// Fields are read leniently: a missing or non-string `at` becomes text the
/// timestamp parser rejects, and an out-of-range `attempts` is clamped, so a
/// damaged record still flows through the run loop instead of vanishing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub at: String,
    #[serde(default)]
    pub payload: serde_json::Value,
    #[serde(default, deserialize_with = "lenient::count")]
    pub attempts: u32,
    #[serde(default)]
    pub status: ReminderStatus,
    #[serde(default, deserialize_with = "lenient::text")]
    pub created_at: String,
    #[serde(
        default,
        deserialize_with = "lenient::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_attempt_at: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub sent_at: Option<String>,
}

/// One entry of the stored collection. Entries that cannot be read as a
/// reminder at all (no string `id`, unknown `status`, not an object) are kept
/// verbatim and written back unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum StoredReminder {
    Known(Reminder),
    Unreadable(serde_json::Value),
}

impl StoredReminder {
    pub fn as_reminder(&self) -> Option<&Reminder> {
        match self {
            StoredReminder::Known(reminder) => Some(reminder),
            StoredReminder::Unreadable(_) => None,
        }
    }

    pub fn as_reminder_mut(&mut self) -> Option<&mut Reminder> {
        match self {
            StoredReminder::Known(reminder) => Some(reminder),
            StoredReminder::Unreadable(_) => None,
        }
    }
}

impl From<Reminder> for StoredReminder {
    fn from(reminder: Reminder) -> Self {
        StoredReminder::Known(reminder)
    }
}

mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        })
    }

    pub fn optional_text<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => Some(s),
            _ => None,
        })
    }

    pub fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let count = match &value {
            Value::Number(n) => match (n.as_u64(), n.as_f64()) {
                (Some(n), _) => n.min(u32::MAX as u64) as u32,
                (None, Some(f)) if f > 0.0 => f.min(u32::MAX as f64) as u32,
                _ => 0,
            },
            _ => 0,
        };
        Ok(count)
    }
}

impl Reminder {
    /// Delivery target carried inside the payload, if any.
    pub fn target(&self) -> serde_json::Value {
        self.payload
            .get("target")
            .cloned()
            .unwrap_or(serde_json::Value::Null)
    }
}

/// Input to `schedule_reminder`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewReminder {
    pub id: Option<String>,
    pub at: Option<String>,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl NewReminder {
    pub fn new(at: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: None,
            at: Some(at.into()),
            payload,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}
