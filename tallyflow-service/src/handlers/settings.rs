use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::{json, Value};
use service_core::error::AppError;

use crate::models::AppSettings;
use crate::startup::AppState;

/// Current settings with credentials removed.
pub async fn get_settings(State(state): State<AppState>) -> Json<AppSettings> {
    Json(state.settings.load().await.redacted())
}

#[tracing::instrument(skip_all)]
pub async fn update_settings(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(patch) = payload?;
    state.settings.save(&patch).await.map_err(|e| {
        tracing::warn!(error = %e, "Rejected settings update");
        AppError::BadRequest(anyhow::Error::new(e))
    })?;

    tracing::info!("Settings saved");
    Ok(Json(json!({
        "success": true,
        "message": "Settings saved."
    })))
}
