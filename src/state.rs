use std::sync::Arc;

use crate::config::Config;
use crate::scheduler::ReminderEngine;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub engine: Arc<ReminderEngine>,
    pub config: Config,
}
