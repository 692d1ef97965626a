//! HTTP handlers for tallyflow-service.

pub mod health;
pub mod metrics;
pub mod reminders;
pub mod settings;
pub mod tally;

pub use health::health_check;
pub use metrics::metrics_handler;
