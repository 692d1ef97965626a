use crate::models::TallySettings;
use crate::tally::connection::string_or_number;
use config::builder::DefaultState;
use config::ConfigBuilder;
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::time::Duration;

pub const SERVICE_NAME: &str = "tallyflow-service";
const DEFAULT_PORT: i64 = 3001;

#[derive(Debug, Clone, Deserialize)]
pub struct TallyFlowConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    #[serde(default)]
    pub tally: TallyConfig,
    #[serde(default)]
    pub reminders: ReminderConfig,
}

/// Tally endpoint used to seed the settings store, plus outbound timeouts.
#[derive(Debug, Clone, Deserialize)]
pub struct TallyConfig {
    #[serde(default = "default_server")]
    pub server: String,
    #[serde(default = "default_tally_port", deserialize_with = "string_or_number")]
    pub port: String,
    #[serde(default)]
    pub company: String,
    #[serde(default = "default_sync_timeout_secs")]
    pub sync_timeout_secs: u64,
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
}

impl Default for TallyConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            port: default_tally_port(),
            company: String::new(),
            sync_timeout_secs: default_sync_timeout_secs(),
            probe_timeout_secs: default_probe_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReminderConfig {
    /// Reminders are only ever simulated; `false` refuses them outright.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_true() -> bool {
    true
}

fn default_server() -> String {
    "127.0.0.1".to_string()
}

fn default_tally_port() -> String {
    "9000".to_string()
}

fn default_sync_timeout_secs() -> u64 {
    20
}

fn default_probe_timeout_secs() -> u64 {
    5
}

impl TallyConfig {
    pub fn sync_timeout(&self) -> Duration {
        Duration::from_secs(self.sync_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn initial_settings(&self) -> TallySettings {
        TallySettings::new(self.server.clone(), self.port.clone(), self.company.clone())
    }
}

impl TallyFlowConfig {
    /// `configuration.{yaml,toml,json}` (optional) overlaid with `APP__*` variables,
    /// e.g. `APP__PORT=3001` or `APP__TALLY__SERVER=10.0.0.5`.
    pub fn load() -> Result<Self, AppError> {
        Self::from_builder(core_config::layered_sources("configuration"))
    }

    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, AppError> {
        let config = builder.set_default("port", DEFAULT_PORT)?.build()?;
        Ok(config.try_deserialize()?)
    }
}
