//! Settings persistence behind a small async interface.

use crate::models::AppSettings;
use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::RwLock;

const SECTIONS: [&str; 4] = ["tally", "email", "sms", "whatsapp"];

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Settings update must be a JSON object")]
    NotAnObject,

    #[error("Settings section '{0}' must be a JSON object")]
    SectionNotAnObject(String),

    #[error("Invalid settings: {0}")]
    Invalid(#[from] serde_json::Error),
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn load(&self) -> AppSettings;

    /// Shallow-merge `patch` into each named section and persist the result.
    async fn save(&self, patch: &Value) -> Result<AppSettings, SettingsError>;
}

pub struct InMemorySettingsStore {
    settings: RwLock<AppSettings>,
}

impl InMemorySettingsStore {
    pub fn new(initial: AppSettings) -> Self {
        Self {
            settings: RwLock::new(initial),
        }
    }
}

#[async_trait]
impl SettingsStore for InMemorySettingsStore {
    async fn load(&self) -> AppSettings {
        self.settings.read().await.clone()
    }

    async fn save(&self, patch: &Value) -> Result<AppSettings, SettingsError> {
        let mut guard = self.settings.write().await;
        let merged = merge(&guard, patch)?;
        *guard = merged.clone();

        tracing::debug!("Settings updated");
        Ok(merged)
    }
}

/// Fields present in a section replace the stored ones; the rest are kept.
/// Unknown top-level keys are ignored.
pub fn merge(current: &AppSettings, patch: &Value) -> Result<AppSettings, SettingsError> {
    let patch = patch.as_object().ok_or(SettingsError::NotAnObject)?;

    let mut document = match serde_json::to_value(current)? {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    for section in SECTIONS {
        let Some(update) = patch.get(section) else {
            continue;
        };
        let update = update
            .as_object()
            .ok_or_else(|| SettingsError::SectionNotAnObject(section.to_string()))?;

        let target = document
            .entry(section)
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(fields) = target {
            for (key, value) in update {
                fields.insert(key.clone(), value.clone());
            }
        }
    }

    Ok(serde_json::from_value(Value::Object(document))?)
}
