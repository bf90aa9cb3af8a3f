//! Rule-based extractors for the supported invoice layout.

pub mod fields;
pub mod line_items;
pub mod patterns;

pub use fields::HeaderFieldExtractor;
pub use line_items::{parse_row, LineItemExtractor, TableState};

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::models::invoice::{InvoiceRecord, RawText};

/// Trait for extractors that fill part of an [`InvoiceRecord`].
///
/// Extractors never fail: anything they cannot find stays at its default
/// and is reported as a [`MalformedFieldWarning`].
pub trait RecordExtractor {
    /// Populate the fields this extractor owns.
    fn extract_into(
        &self,
        text: &RawText,
        record: &mut InvoiceRecord,
        warnings: &mut Vec<MalformedFieldWarning>,
    );
}

/// Scalar fields of an invoice record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    InvoiceNumber,
    PoNumber,
    Date,
    DueDate,
    VendorName,
    TotalAmount,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::InvoiceNumber,
        Field::PoNumber,
        Field::Date,
        Field::DueDate,
        Field::VendorName,
        Field::TotalAmount,
    ];

    /// Key used for this field in the serialized record.
    pub fn key(&self) -> &'static str {
        match self {
            Field::InvoiceNumber => "invoice_number",
            Field::PoNumber => "po_number",
            Field::Date => "date",
            Field::DueDate => "due_date",
            Field::VendorName => "vendor_name",
            Field::TotalAmount => "total_amount",
        }
    }

    pub(crate) fn slot(self, record: &mut InvoiceRecord) -> &mut String {
        match self {
            Field::InvoiceNumber => &mut record.invoice_number,
            Field::PoNumber => &mut record.po_number,
            Field::Date => &mut record.date,
            Field::DueDate => &mut record.due_date,
            Field::VendorName => &mut record.vendor_name,
            Field::TotalAmount => &mut record.total_amount,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Non-fatal extraction problem. The affected field keeps its default.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MalformedFieldWarning {
    /// No line carried the label for this field.
    #[error("no label found for {field}")]
    LabelNotFound { field: Field },

    /// The label was found but nothing followed it.
    #[error("label for {field} on line {line} has no value")]
    EmptyValue { field: Field, line: usize },

    /// The items table header never appeared.
    #[error("line item table header not found")]
    TableHeaderNotFound,

    /// The items table was found but held no recognizable rows.
    #[error("line item table has no rows")]
    NoLineItems,
}
