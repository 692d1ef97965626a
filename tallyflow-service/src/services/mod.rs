pub mod metrics;
pub mod reminders;
pub mod settings;
pub mod sync;

pub use metrics::{get_metrics, init_metrics, record_sync};
pub use reminders::{
    Reminder, ReminderError, ReminderReceipt, ReminderSender, SimulatedReminderSender,
};
pub use settings::{InMemorySettingsStore, SettingsError, SettingsStore};
pub use sync::{SyncOrchestrator, SyncOutcome};
