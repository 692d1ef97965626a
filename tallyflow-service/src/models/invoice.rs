//! Invoice model derived from Tally sales vouchers.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Aging status of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceStatus {
    /// Never produced by the Tally sync; reserved for payment tracking.
    Paid,
    Overdue,
    #[serde(rename = "Due Soon")]
    DueSoon,
    Pending,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Paid => "Paid",
            InvoiceStatus::Overdue => "Overdue",
            InvoiceStatus::DueSoon => "Due Soon",
            InvoiceStatus::Pending => "Pending",
        }
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CustomerContact {
    pub email: String,
    pub phone: String,
    pub whatsapp: String,
}

impl CustomerContact {
    /// WhatsApp falls back to the phone number.
    pub fn new(email: Option<&str>, phone: Option<&str>, whatsapp: Option<&str>) -> Self {
        let phone = phone.unwrap_or_default().to_string();
        Self {
            email: email.unwrap_or_default().to_string(),
            whatsapp: whatsapp.map(str::to_string).unwrap_or_else(|| phone.clone()),
            phone,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    /// Fresh for every sync; use `source_key` to match invoices across syncs.
    pub id: Uuid,
    pub source_key: String,
    pub customer_name: String,
    pub customer_contact: CustomerContact,
    pub invoice_no: String,
    /// Date exactly as Tally sent it.
    pub invoice_date: String,
    pub due_date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub outstanding: Decimal,
    pub status: InvoiceStatus,
    pub days_overdue: i64,
    pub last_reminder_sent: Option<DateTime<Utc>>,
}

impl Invoice {
    /// Stable identity of a voucher: its date and number.
    pub fn source_key(invoice_date: &str, invoice_no: &str) -> String {
        format!("{}/{}", invoice_date, invoice_no)
    }
}
