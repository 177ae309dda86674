use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::Value;

use crate::state::SharedState;

#[derive(Deserialize)]
pub struct NotifyRequest {
    #[serde(default)]
    pub target: Value,
    #[serde(default)]
    pub payload: Value,
}

pub async fn send(State(state): State<SharedState>, Json(req): Json<NotifyRequest>) -> StatusCode {
    state
        .engine
        .send_notification(&req.target, &req.payload)
        .await;
    StatusCode::NO_CONTENT
}
