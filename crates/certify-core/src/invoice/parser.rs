//! Invoice parser combining the header and line item extractors.

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};

use crate::models::invoice::{InvoiceRecord, RawText};

use super::rules::{
    HeaderFieldExtractor, LineItemExtractor, MalformedFieldWarning, RecordExtractor,
};

/// Result of parsing one document.
#[derive(Debug, Clone, Serialize)]
pub struct ParseOutcome {
    /// Parsed record; every field is present even if empty.
    pub record: InvoiceRecord,
    /// Fields that could not be extracted.
    pub warnings: Vec<MalformedFieldWarning>,
    /// Parse time in milliseconds.
    pub processing_time_ms: u64,
}

/// Trait for invoice parsing.
pub trait InvoiceParser {
    /// Parse an invoice from extracted text. Never fails.
    fn parse(&self, text: &RawText) -> ParseOutcome;
}

/// Parser for the single supported invoice layout.
///
/// Holds no state between calls, so one instance can parse any number of
/// documents, including from several threads.
#[derive(Debug, Clone, Default)]
pub struct LayoutInvoiceParser {
    header: HeaderFieldExtractor,
    line_items: LineItemExtractor,
}

impl LayoutInvoiceParser {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InvoiceParser for LayoutInvoiceParser {
    fn parse(&self, text: &RawText) -> ParseOutcome {
        let start = Instant::now();
        info!("Parsing invoice from {} lines of text", text.lines().len());

        let mut record = InvoiceRecord::with_raw_text(text.as_str());
        let mut warnings = Vec::new();

        self.header.extract_into(text, &mut record, &mut warnings);
        self.line_items.extract_into(text, &mut record, &mut warnings);

        for warning in &warnings {
            debug!("{}", warning);
        }
        debug!(
            "Extracted invoice {:?} with {} line items",
            record.invoice_number,
            record.line_items.len()
        );

        ParseOutcome {
            record,
            warnings,
            processing_time_ms: start.elapsed().as_millis() as u64,
        }
    }
}

/// Parse raw text with the default parser and return only the record.
pub fn parse_invoice(text: &str) -> InvoiceRecord {
    LayoutInvoiceParser::new().parse(&RawText::new(text)).record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::rules::Field;
    use crate::models::invoice::LineItem;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "\
Amid Technologies Inc
PO Box 118
INVOICE
Bill to Ship to
Orbital Systems, Inc. Orbital Systems, Inc.
Invoice details PO number: 77120
Invoice no.: 1187
Terms: Net 30
Invoice date: 05/02/2024
Due date: 06/01/2024
# Product or service Qty Rate Amount
1. AT-2210 Harness assembly, 3 ft 1,000 4.25 4,250.00
per drawing 88-100 rev C
2. AT-0042 Connector kit 50 12.00 600.00
Total $4,850.00
Thank you for your business.
";

    #[test]
    fn test_parse_full_invoice() {
        let outcome = LayoutInvoiceParser::new().parse(&RawText::new(SAMPLE));
        let record = outcome.record;

        assert_eq!(record.vendor_name, "Orbital Systems, Inc.");
        assert_eq!(record.po_number, "77120");
        assert_eq!(record.invoice_number, "1187");
        assert_eq!(record.date, "05/02/2024");
        assert_eq!(record.due_date, "06/01/2024");
        assert_eq!(record.total_amount, "$4,850.00");
        assert_eq!(
            record.line_items,
            vec![
                LineItem {
                    product_code: "AT-2210".to_string(),
                    description: "Harness assembly, 3 ft per drawing 88-100 rev C".to_string(),
                    quantity: "1,000".to_string(),
                    rate: "4.25".to_string(),
                    amount: "4,250.00".to_string(),
                },
                LineItem {
                    product_code: "AT-0042".to_string(),
                    description: "Connector kit".to_string(),
                    quantity: "50".to_string(),
                    rate: "12.00".to_string(),
                    amount: "600.00".to_string(),
                },
            ]
        );
        assert_eq!(record.raw_text, SAMPLE);
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_widget_scenario() {
        let text = RawText::from_lines([
            "Bill to Ship to",
            "Acme, Inc. Acme Corp",
            "Product or Service Qty Rate",
            "1. WID-100 Widget Assembly 10 2.50 25.00",
            "Total 25.00",
        ]);
        let record = LayoutInvoiceParser::new().parse(&text).record;

        assert_eq!(record.vendor_name, "Acme, Inc.");
        assert_eq!(record.total_amount, "25.00");
        assert_eq!(
            record.line_items,
            vec![LineItem {
                product_code: "WID-100".to_string(),
                description: "Widget Assembly".to_string(),
                quantity: "10".to_string(),
                rate: "2.50".to_string(),
                amount: "25.00".to_string(),
            }]
        );
    }

    #[test]
    fn test_empty_text_gives_blank_record() {
        let outcome = LayoutInvoiceParser::new().parse(&RawText::new(""));
        assert!(outcome.record.is_blank());
        assert!(outcome.record.line_items.is_empty());
        assert!(outcome
            .warnings
            .contains(&MalformedFieldWarning::TableHeaderNotFound));
        assert!(outcome.warnings.contains(&MalformedFieldWarning::LabelNotFound {
            field: Field::InvoiceNumber
        }));
    }

    #[test]
    fn test_parse_is_idempotent() {
        let parser = LayoutInvoiceParser::new();
        let text = RawText::new(SAMPLE);
        let first = parser.parse(&text);
        let second = parser.parse(&text);
        assert_eq!(first.record, second.record);
        assert_eq!(first.warnings, second.warnings);
    }

    #[test]
    fn test_header_without_rows_warns() {
        let outcome = LayoutInvoiceParser::new()
            .parse(&RawText::new("Product or Service Qty\nShipping 1 5.00"));
        assert!(outcome.record.line_items.is_empty());
        assert!(outcome.warnings.contains(&MalformedFieldWarning::NoLineItems));
    }

    #[test]
    fn test_parse_invoice_helper() {
        let record = parse_invoice("Invoice No.: INV-2024-001");
        assert_eq!(record.invoice_number, "INV-2024-001");
        assert_eq!(record.raw_text, "Invoice No.: INV-2024-001");
    }
}
