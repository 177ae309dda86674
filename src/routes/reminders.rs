use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::AppError;
use crate::models::{NewReminder, Reminder};
use crate::state::SharedState;
use crate::timestamp;

#[derive(Deserialize, Default)]
pub struct RunRequest {
    pub now: Option<String>,
}

pub async fn list(State(state): State<SharedState>) -> Json<Vec<Reminder>> {
    Json(state.engine.reminders().await)
}

pub async fn get(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Reminder>, AppError> {
    state
        .engine
        .reminder(&id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Reminder not found".to_string()))
}

pub async fn create(
    State(state): State<SharedState>,
    Json(req): Json<NewReminder>,
) -> Result<Json<Value>, AppError> {
    let id = state.engine.schedule_reminder(req).await?;
    Ok(Json(json!({ "id": id })))
}

pub async fn run(
    State(state): State<SharedState>,
    req: Option<Json<RunRequest>>,
) -> Result<StatusCode, AppError> {
    let req = req.map(|Json(req)| req).unwrap_or_default();

    let now = match req.now {
        Some(now) => Some(
            timestamp::parse(&now)
                .ok_or_else(|| AppError::BadRequest(format!("now is not a valid timestamp: {now}")))?,
        ),
        None => None,
    };

    state.engine.run_due_reminders(now).await;
    Ok(StatusCode::NO_CONTENT)
}
