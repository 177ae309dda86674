use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::state::SharedState;
use crate::templates::Renderer;

pub async fn list(State(state): State<SharedState>) -> Json<Vec<String>> {
    Json(state.engine.dispatcher().templates().keys())
}

/// Merge templates. Strings are body templates; objects carry optional
/// `title`/`body` templates.
pub async fn configure(
    State(state): State<SharedState>,
    Json(req): Json<Map<String, Value>>,
) -> Result<StatusCode, AppError> {
    let renderers = req
        .iter()
        .map(|(key, value)| {
            Renderer::from_json(value)
                .map(|renderer| (key.clone(), renderer))
                .ok_or_else(|| {
                    AppError::BadRequest(format!(
                        "Template '{key}' must be a string or an object"
                    ))
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    state.engine.configure_templates(renderers);
    Ok(StatusCode::NO_CONTENT)
}
