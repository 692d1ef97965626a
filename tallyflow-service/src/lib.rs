//! TallyFlow receivables service: mirrors Tally sales vouchers as aged invoices.

pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
pub mod tally;
