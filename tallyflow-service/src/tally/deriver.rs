//! Voucher → invoice derivation.
//!
//! Pure with respect to `today`: the same document and date always produce
//! the same invoices, apart from the freshly generated ids.

use super::parser::{XmlElement, XmlNode};
use crate::models::{CustomerContact, Invoice, InvoiceStatus};
use chrono::{NaiveDate, TimeDelta};
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

const MESSAGE_PATH: [&str; 4] = ["ENVELOPE", "BODY", "DATA", "TALLYMESSAGE"];
const BILL_ALLOCATIONS: &str = "BILLALLOCATIONS.LIST";
static LEDGER_ENTRIES: [&str; 2] = ["ALLLEDGERENTRIES.LIST", "LEDGERENTRIES.LIST"];

/// Invoices due within this many days are flagged as due soon.
pub const DUE_SOON_WINDOW_DAYS: i64 = 7;

const DATE_FORMATS: [&str; 3] = ["%Y%m%d", "%Y-%m-%d", "%d-%b-%Y"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aging {
    pub status: InvoiceStatus,
    pub days_overdue: i64,
}

/// Classify a due date against today. Both are calendar dates, so the day
/// difference is exact.
pub fn aging(due_date: NaiveDate, today: NaiveDate) -> Aging {
    let diff_days = (today - due_date).num_days();

    if diff_days > 0 {
        Aging {
            status: InvoiceStatus::Overdue,
            days_overdue: diff_days,
        }
    } else if diff_days >= -DUE_SOON_WINDOW_DAYS {
        Aging {
            status: InvoiceStatus::DueSoon,
            days_overdue: 0,
        }
    } else {
        Aging {
            status: InvoiceStatus::Pending,
            days_overdue: 0,
        }
    }
}

/// Derive invoices from a parsed Voucher Register export, in document order.
/// A document without the voucher path yields no invoices.
pub fn derive(document: &XmlElement, today: NaiveDate) -> Vec<Invoice> {
    vouchers(document)
        .filter_map(|voucher| derive_invoice(voucher, today))
        .collect()
}

fn vouchers(document: &XmlElement) -> impl Iterator<Item = &XmlElement> {
    document
        .path(&MESSAGE_PATH)
        .into_iter()
        .flat_map(XmlNode::items)
        .filter_map(|message| message.field("VOUCHER"))
        .flat_map(XmlNode::items)
        .filter_map(XmlNode::as_element)
}

fn derive_invoice(voucher: &XmlElement, today: NaiveDate) -> Option<Invoice> {
    let (Some(raw_date), Some(invoice_no)) =
        (voucher.text_of("DATE"), voucher.text_of("VOUCHERNUMBER"))
    else {
        tracing::debug!("Skipping voucher without DATE or VOUCHERNUMBER");
        return None;
    };

    let Some(invoice_date) = parse_tally_date(raw_date) else {
        tracing::warn!(invoice_no, date = raw_date, "Skipping voucher with unreadable DATE");
        return None;
    };

    let credit_days = credit_period(voucher).map(parse_credit_days).unwrap_or(0);
    let Some(due_date) = TimeDelta::try_days(credit_days)
        .and_then(|offset| invoice_date.checked_add_signed(offset))
    else {
        tracing::warn!(invoice_no, credit_days, "Skipping voucher with out-of-range credit period");
        return None;
    };

    let Aging {
        status,
        days_overdue,
    } = aging(due_date, today);
    let amount = ledger_amount(voucher).unwrap_or(Decimal::ZERO).abs();

    Some(Invoice {
        id: Uuid::new_v4(),
        source_key: Invoice::source_key(raw_date, invoice_no),
        customer_name: voucher
            .text_of("BASICBUYERNAME")
            .unwrap_or_default()
            .to_string(),
        customer_contact: CustomerContact::new(
            voucher.text_of("BUYEREMAIL"),
            voucher.text_of("BUYERPHONE"),
            None,
        ),
        invoice_no: invoice_no.to_string(),
        invoice_date: raw_date.to_string(),
        due_date,
        amount,
        outstanding: amount,
        status,
        days_overdue,
        last_reminder_sent: None,
    })
}

fn parse_tally_date(raw: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
}

fn ledger_entries(voucher: &XmlElement) -> impl Iterator<Item = &XmlNode> {
    LEDGER_ENTRIES
        .iter()
        .filter_map(|tag| voucher.field(tag))
        .flat_map(XmlNode::items)
}

/// First credit period among the voucher's bill allocations, falling back to
/// allocations nested under its ledger entries.
fn credit_period(voucher: &XmlElement) -> Option<&str> {
    let nested = ledger_entries(voucher).filter_map(|entry| entry.field(BILL_ALLOCATIONS));

    voucher
        .field(BILL_ALLOCATIONS)
        .into_iter()
        .chain(nested)
        .flat_map(XmlNode::items)
        .filter_map(|allocation| allocation.field("BILLCREDITPERIOD"))
        .find_map(period_text)
}

/// Tally writes the period as text and sometimes also as a `P` attribute.
fn period_text(node: &XmlNode) -> Option<&str> {
    node.text()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .or_else(|| node.as_element().and_then(|e| e.attribute("P")))
}

/// `"30 Days"` → 30. Reads the leading integer of the first word; anything
/// unreadable counts as zero.
fn parse_credit_days(period: &str) -> i64 {
    let Some(word) = period.split_whitespace().next() else {
        return 0;
    };
    let end = word
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
        .map(|(i, _)| i)
        .unwrap_or(word.len());

    word[..end].parse().unwrap_or(0)
}

/// Amount of the first ledger entry that carries one; the party ledger comes
/// first in Tally exports.
fn ledger_amount(voucher: &XmlElement) -> Option<Decimal> {
    ledger_entries(voucher)
        .filter_map(XmlNode::as_element)
        .find_map(|entry| entry.text_of("AMOUNT"))
        .and_then(|amount| Decimal::from_str(amount).ok())
}
