use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::scheduler::ReminderEngine;

/// Periodically run due reminders until shutdown is signaled. A run that has
/// started always finishes before the loop checks for shutdown again.
pub fn spawn_ticker(
    engine: Arc<ReminderEngine>,
    shutdown: watch::Receiver<bool>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(run(engine, shutdown, interval))
}

async fn run(engine: Arc<ReminderEngine>, mut shutdown: watch::Receiver<bool>, interval: Duration) {
    tracing::info!("Reminder ticker started (every {}s)", interval.as_secs());

    loop {
        if *shutdown.borrow() {
            break;
        }

        engine.run_due_reminders(None).await;

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    tracing::info!("Reminder ticker stopped");
}
