use crate::services::get_metrics;
use axum::{http::StatusCode, response::IntoResponse};

pub async fn metrics_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        get_metrics(),
    )
}
