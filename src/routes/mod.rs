pub mod events;
pub mod notify;
pub mod reminders;
pub mod templates;

use axum::Router;
use axum::routing::{get, post};

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Reminders
        .route(
            "/api/v1/reminders",
            get(reminders::list).post(reminders::create),
        )
        .route("/api/v1/reminders/run", post(reminders::run))
        .route("/api/v1/reminders/{id}", get(reminders::get))
        // Templates
        .route(
            "/api/v1/templates",
            get(templates::list).put(templates::configure),
        )
        // Delivery
        .route("/api/v1/notify", post(notify::send))
        .route("/api/v1/events", get(events::stream))
}
