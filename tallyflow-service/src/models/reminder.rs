use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderChannel {
    Email,
    Sms,
    WhatsApp,
}

impl std::fmt::Display for ReminderChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReminderChannel::Email => write!(f, "email"),
            ReminderChannel::Sms => write!(f, "sms"),
            ReminderChannel::WhatsApp => write!(f, "whatsapp"),
        }
    }
}

/// Reminder requested from the dashboard for one invoice.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReminderRequest {
    #[validate(length(min = 1, message = "Invoice id is required"))]
    pub invoice_id: String,
    #[serde(rename = "type")]
    pub channel: ReminderChannel,
    #[validate(length(min = 1, message = "Recipient is required"))]
    pub recipient: String,
    #[serde(default)]
    pub invoice_no: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    /// Free-form text; a standard reminder is rendered when absent.
    #[serde(default)]
    pub message: Option<String>,
}
