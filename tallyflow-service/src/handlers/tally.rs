use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use service_core::error::AppError;
use validator::Validate;

use crate::services::SyncOutcome;
use crate::startup::AppState;
use crate::tally::TallyConnection;

pub const CONNECTION_OK_MESSAGE: &str = "Connection to Tally server is successful!";
pub const CONNECTION_FAILED_MESSAGE: &str = "Could not reach Tally server.";

#[derive(Debug, Serialize)]
pub struct ConnectionCheckResponse {
    pub success: bool,
    pub message: String,
}

/// Pull sales vouchers from Tally and return them as aged invoices.
#[tracing::instrument(skip_all)]
pub async fn sync(
    State(state): State<AppState>,
    payload: Result<Json<TallyConnection>, JsonRejection>,
) -> Result<(StatusCode, Json<SyncOutcome>), AppError> {
    let Json(connection) = payload?;
    connection.validate()?;
    tracing::debug!(server = %connection.server, "Sync requested");

    let outcome = state.sync.sync(&connection).await;
    let status = if outcome.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    Ok((status, Json(outcome)))
}

#[tracing::instrument(skip_all)]
pub async fn test_connection(
    State(state): State<AppState>,
    payload: Result<Json<TallyConnection>, JsonRejection>,
) -> Result<(StatusCode, Json<ConnectionCheckResponse>), AppError> {
    let Json(connection) = payload?;
    connection.validate()?;

    match state.sync.test_connection(&connection).await {
        Ok(()) => {
            tracing::info!(address = %connection.address(), "Tally reachable");
            Ok((
                StatusCode::OK,
                Json(ConnectionCheckResponse {
                    success: true,
                    message: CONNECTION_OK_MESSAGE.to_string(),
                }),
            ))
        }
        Err(err) => {
            tracing::warn!(
                address = %connection.address(),
                kind = err.kind(),
                detail = err.detail(),
                "Tally connection test failed"
            );
            Ok((
                StatusCode::BAD_GATEWAY,
                Json(ConnectionCheckResponse {
                    success: false,
                    message: CONNECTION_FAILED_MESSAGE.to_string(),
                }),
            ))
        }
    }
}
