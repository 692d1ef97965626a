use config::builder::DefaultState;
use config::{Config as Cfg, ConfigBuilder, Environment, File};
use serde::Deserialize;

/// Settings every service shares. Services embed this with `#[serde(flatten)]`.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// OTLP collector endpoint. Tracing export is disabled when unset.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            log_level: default_log_level(),
            otlp_endpoint: None,
        }
    }
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Sources shared by every service: an optional `<file_stem>.{yaml,toml,json}`
/// file overlaid with `APP__SECTION__KEY` environment variables. Callers may add
/// their own defaults before building.
pub fn layered_sources(file_stem: &str) -> ConfigBuilder<DefaultState> {
    dotenvy::dotenv().ok();

    Cfg::builder()
        .add_source(File::with_name(file_stem).required(false))
        .add_source(
            Environment::with_prefix("APP")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
}
