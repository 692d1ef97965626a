//! Dashboard settings as edited from the UI.

use crate::tally::connection::string_or_number;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    pub tally: TallySettings,
    pub email: EmailSettings,
    pub sms: MessagingSettings,
    pub whatsapp: MessagingSettings,
}

impl AppSettings {
    pub fn new(tally: TallySettings) -> Self {
        Self {
            tally,
            email: EmailSettings::default(),
            sms: MessagingSettings::default(),
            whatsapp: MessagingSettings::default(),
        }
    }

    /// Copy safe to hand back to the browser: credentials removed.
    pub fn redacted(&self) -> Self {
        let mut settings = self.clone();
        settings.email.password = None;
        settings.sms.auth_token = None;
        settings.whatsapp.auth_token = None;
        settings
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TallySettings {
    pub server: String,
    #[serde(deserialize_with = "string_or_number")]
    pub port: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub last_sync: Option<DateTime<Utc>>,
    #[serde(default)]
    pub auto_sync: bool,
    /// Minutes between automatic syncs.
    #[serde(default = "default_sync_interval")]
    pub sync_interval: u32,
}

fn default_sync_interval() -> u32 {
    15
}

impl TallySettings {
    pub fn new(server: impl Into<String>, port: impl Into<String>, company: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            port: port.into(),
            company: company.into(),
            last_sync: None,
            auto_sync: false,
            sync_interval: default_sync_interval(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailSettings {
    pub enabled: bool,
    pub smtp_host: String,
    #[serde(deserialize_with = "string_or_number")]
    pub smtp_port: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub from_name: String,
    pub from_email: String,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: "587".to_string(),
            username: "user@example.com".to_string(),
            password: None,
            from_name: "Your Company".to_string(),
            from_email: "noreply@yourcompany.com".to_string(),
        }
    }
}

pub const DEFAULT_MESSAGING_PROVIDER: &str = "twilio";

/// SMS and WhatsApp share one shape. `provider` is stored as given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagingSettings {
    pub enabled: bool,
    pub provider: String,
    pub account_sid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    pub from_number: String,
}

impl Default for MessagingSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: DEFAULT_MESSAGING_PROVIDER.to_string(),
            account_sid: String::new(),
            auth_token: None,
            from_number: String::new(),
        }
    }
}
