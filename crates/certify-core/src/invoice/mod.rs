//! Invoice field extraction module.

mod parser;
pub mod rules;

pub use parser::{parse_invoice, InvoiceParser, LayoutInvoiceParser, ParseOutcome};
pub use rules::{Field, MalformedFieldWarning};
