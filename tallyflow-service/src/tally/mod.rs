//! Tally integration: export request, XML parsing and invoice derivation.
//!
//! The pipeline is strictly sequential. [`TallyClient`] fetches the Voucher
//! Register export, [`parser`] turns it into an [`XmlNode`] tree and
//! [`deriver`] walks that tree into aged [`Invoice`](crate::models::Invoice)s.

pub mod client;
pub mod connection;
pub mod deriver;
pub mod error;
pub mod parser;

pub use client::{export_request_body, TallyClient};
pub use connection::TallyConnection;
pub use deriver::{aging, derive, Aging};
pub use error::TallyError;
pub use parser::{parse, parse_payload, TallyPayload, XmlElement, XmlNode, NO_RESPONSE_MARKER};
