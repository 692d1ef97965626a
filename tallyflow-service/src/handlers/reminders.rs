use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use service_core::error::AppError;
use validator::Validate;

use crate::models::ReminderRequest;
use crate::services::{Reminder, ReminderError};
use crate::startup::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendReminderResponse {
    pub success: bool,
    pub message: String,
    pub reminder_id: String,
    pub sent_at: DateTime<Utc>,
    pub simulated: bool,
}

impl From<ReminderError> for AppError {
    fn from(err: ReminderError) -> Self {
        match err {
            ReminderError::NotEnabled => AppError::ServiceUnavailable,
            ReminderError::InvalidRecipient(_) => AppError::BadRequest(anyhow::Error::new(err)),
        }
    }
}

#[tracing::instrument(skip_all)]
pub async fn send_reminder(
    State(state): State<AppState>,
    payload: Result<Json<ReminderRequest>, JsonRejection>,
) -> Result<Json<SendReminderResponse>, AppError> {
    let Json(request) = payload?;
    request.validate()?;

    let reminder = Reminder::from_request(&request)?;
    let receipt = state.reminders.send(&reminder).await?;

    tracing::info!(
        reminder_id = %receipt.reminder_id,
        invoice_id = %request.invoice_id,
        channel = %request.channel,
        "Reminder dispatched"
    );

    Ok(Json(SendReminderResponse {
        success: true,
        message: format!("Reminder sent via {} to {}.", reminder.channel, reminder.to),
        reminder_id: receipt.reminder_id,
        sent_at: receipt.sent_at,
        simulated: receipt.simulated,
    }))
}
