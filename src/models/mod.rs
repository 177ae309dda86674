pub mod reminder;

pub use reminder::{MAX_ATTEMPTS, NewReminder, Reminder, ReminderStatus, StoredReminder};
