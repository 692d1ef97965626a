use crate::models::{ReminderChannel, ReminderRequest};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use uuid::Uuid;
use validator::ValidateEmail;

#[derive(Debug, Error)]
pub enum ReminderError {
    #[error("Reminder delivery is not enabled")]
    NotEnabled,

    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),
}

/// A reminder ready to hand to a delivery channel.
#[derive(Debug, Clone)]
pub struct Reminder {
    pub channel: ReminderChannel,
    pub to: String,
    pub body: String,
}

impl Reminder {
    pub fn from_request(request: &ReminderRequest) -> Result<Self, ReminderError> {
        let to = normalize_recipient(request.channel, &request.recipient)?;

        let body = match request.message.as_deref().map(str::trim) {
            Some(message) if !message.is_empty() => message.to_string(),
            _ => default_body(request),
        };

        Ok(Self {
            channel: request.channel,
            to,
            body,
        })
    }
}

fn default_body(request: &ReminderRequest) -> String {
    let greeting = match request.customer_name.as_deref() {
        Some(name) if !name.trim().is_empty() => format!("Dear {},", name.trim()),
        _ => "Dear customer,".to_string(),
    };
    let invoice = request.invoice_no.as_deref().unwrap_or(&request.invoice_id);

    format!(
        "{} this is a friendly reminder that payment for invoice {} is pending. Please ignore this message if it has already been paid.",
        greeting, invoice
    )
}

/// Email recipients must look like addresses; phone numbers keep digits and a leading `+`.
fn normalize_recipient(channel: ReminderChannel, recipient: &str) -> Result<String, ReminderError> {
    let recipient = recipient.trim();

    match channel {
        ReminderChannel::Email => {
            let address = recipient.to_string();
            if address.validate_email() {
                Ok(address)
            } else {
                Err(ReminderError::InvalidRecipient(format!(
                    "'{}' is not an email address",
                    recipient
                )))
            }
        }
        ReminderChannel::Sms | ReminderChannel::WhatsApp => {
            let normalized: String = recipient
                .chars()
                .enumerate()
                .filter(|(i, c)| c.is_ascii_digit() || (*i == 0 && *c == '+'))
                .map(|(_, c)| c)
                .collect();

            if normalized.chars().filter(char::is_ascii_digit).count() < 6 {
                return Err(ReminderError::InvalidRecipient(format!(
                    "'{}' is not a phone number",
                    recipient
                )));
            }
            Ok(normalized)
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReminderReceipt {
    pub reminder_id: String,
    pub sent_at: DateTime<Utc>,
    pub simulated: bool,
}

#[async_trait]
pub trait ReminderSender: Send + Sync {
    async fn send(&self, reminder: &Reminder) -> Result<ReminderReceipt, ReminderError>;
}

/// Logs reminders instead of delivering them.
pub struct SimulatedReminderSender {
    enabled: bool,
    send_count: AtomicU64,
}

impl SimulatedReminderSender {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            send_count: AtomicU64::new(0),
        }
    }

    pub fn send_count(&self) -> u64 {
        self.send_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReminderSender for SimulatedReminderSender {
    async fn send(&self, reminder: &Reminder) -> Result<ReminderReceipt, ReminderError> {
        if !self.enabled {
            return Err(ReminderError::NotEnabled);
        }

        self.send_count.fetch_add(1, Ordering::SeqCst);
        let reminder_id = Uuid::new_v4().to_string();

        tracing::info!(
            reminder_id = %reminder_id,
            channel = %reminder.channel,
            to = %reminder.to,
            body_length = reminder.body.len(),
            "[SIMULATED] Reminder would be sent"
        );

        Ok(ReminderReceipt {
            reminder_id,
            sent_at: Utc::now(),
            simulated: true,
        })
    }
}
