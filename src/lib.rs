pub mod config;
pub mod delivery;
pub mod error;
pub mod ids;
pub mod models;
pub mod routes;
pub mod scheduler;
pub mod state;
pub mod store;
pub mod templates;
pub mod timestamp;
pub mod worker;

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderName, HeaderValue};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::delivery::{Dispatcher, WebhookPush};
use crate::scheduler::ReminderEngine;
use crate::state::{AppState, SharedState};
use crate::store::{FileBackend, ReminderStore};
use crate::templates::TemplateRegistry;

/// Wire the engine from configuration: file-backed store, template registry,
/// and the push channel when a URL is configured.
pub fn build_engine(config: &Config) -> ReminderEngine {
    let backend = Arc::new(FileBackend::new(config.data_dir.clone()));
    let store = ReminderStore::with_key(backend, config.storage_key.clone());
    let templates = Arc::new(TemplateRegistry::new());

    let mut dispatcher = Dispatcher::new(templates);
    if let Some(url) = &config.push_url {
        match WebhookPush::new(url.clone()) {
            Ok(push) => {
                tracing::info!("Push notifications enabled ({})", push.url());
                dispatcher = dispatcher.with_native(Arc::new(push));
            }
            Err(e) => tracing::warn!("Push notifications not available: {e}"),
        }
    }

    ReminderEngine::new(store, Arc::new(dispatcher))
}

pub fn build_app(engine: Arc<ReminderEngine>, config: Config) -> Router {
    let max_body_size = config.max_body_size;
    let state: SharedState = Arc::new(AppState { engine, config });

    Router::new()
        .merge(routes::api_routes())
        .route("/health", axum::routing::get(health))
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
