pub mod invoice;
pub mod reminder;
pub mod settings;

pub use invoice::{CustomerContact, Invoice, InvoiceStatus};
pub use reminder::{ReminderChannel, ReminderRequest};
pub use settings::{AppSettings, EmailSettings, MessagingSettings, TallySettings};
