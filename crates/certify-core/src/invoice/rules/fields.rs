//! Header field extraction by literal labels.

use std::collections::HashSet;

use tracing::trace;

use super::patterns::*;
use super::{Field, MalformedFieldWarning, RecordExtractor};
use crate::models::invoice::{InvoiceRecord, RawText};

/// Labels whose value is the text after the last colon of the line.
const COLON_LABELS: [(&str, Field); 4] = [
    (PO_NUMBER_LABEL, Field::PoNumber),
    (INVOICE_NUMBER_LABEL, Field::InvoiceNumber),
    (INVOICE_DATE_LABEL, Field::Date),
    (DUE_DATE_LABEL, Field::DueDate),
];

/// Extracts the scalar fields of an invoice in a single pass.
///
/// Every check runs on every line; a later match for the same field
/// overwrites an earlier one.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderFieldExtractor;

impl HeaderFieldExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl RecordExtractor for HeaderFieldExtractor {
    fn extract_into(
        &self,
        text: &RawText,
        record: &mut InvoiceRecord,
        warnings: &mut Vec<MalformedFieldWarning>,
    ) {
        let lines = text.lines();
        let mut found: HashSet<Field> = HashSet::new();

        for (i, line) in lines.iter().enumerate() {
            let lower = line.to_lowercase();

            if lower.contains(BILL_TO_LABEL) {
                if let Some(next) = lines.get(i + 1) {
                    record.vendor_name = vendor_name(next);
                    found.insert(Field::VendorName);
                    trace!("vendor name from line {}: {:?}", i + 1, record.vendor_name);
                }
            }

            for (label, field) in COLON_LABELS {
                if lower.contains(label) {
                    let value = value_after_last_colon(line);
                    if value.is_empty() {
                        warnings.push(MalformedFieldWarning::EmptyValue { field, line: i });
                    }
                    *field.slot(record) = value.to_string();
                    found.insert(field);
                    trace!("{} from line {}: {:?}", field, i, value);
                }
            }

            if lower.starts_with(TOTAL_PREFIX) {
                if let Some(last) = line.split_whitespace().last() {
                    record.total_amount = last.to_string();
                    found.insert(Field::TotalAmount);
                }
            }
        }

        warnings.extend(
            Field::ALL
                .into_iter()
                .filter(|f| !found.contains(f))
                .map(|field| MalformedFieldWarning::LabelNotFound { field }),
        );
    }
}

/// Customer name from the line after the bill-to header.
///
/// OCR tends to repeat the name ("Acme, Inc. Acme Corp"), so anything past
/// the first ", Inc." is dropped.
pub fn vendor_name(candidate: &str) -> String {
    match candidate.find(INC_SUFFIX) {
        Some(idx) => format!("{}{}", &candidate[..idx], INC_SUFFIX),
        None => candidate.to_string(),
    }
}

fn value_after_last_colon(line: &str) -> &str {
    line.rsplit(':').next().unwrap_or(line).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn extract(lines: &[&str]) -> (InvoiceRecord, Vec<MalformedFieldWarning>) {
        let text = RawText::from_lines(lines);
        let mut record = InvoiceRecord::default();
        let mut warnings = Vec::new();
        HeaderFieldExtractor::new().extract_into(&text, &mut record, &mut warnings);
        (record, warnings)
    }

    #[test]
    fn test_no_labels_leaves_defaults() {
        let (record, warnings) = extract(&["Lorem ipsum", "dolor sit amet 42"]);
        assert_eq!(record, InvoiceRecord::default());
        assert_eq!(warnings.len(), Field::ALL.len());
    }

    #[test]
    fn test_colon_labels() {
        let (record, _) = extract(&[
            "Invoice details PO number: 4410-A",
            "Invoice no.: 1042",
            "Invoice date: 03/14/2024",
            "Due date: 04/13/2024",
        ]);
        assert_eq!(record.po_number, "4410-A");
        assert_eq!(record.invoice_number, "1042");
        assert_eq!(record.date, "03/14/2024");
        assert_eq!(record.due_date, "04/13/2024");
    }

    #[test]
    fn test_value_is_after_last_colon() {
        let (record, _) = extract(&["INVOICE NO.: ref: INV-9"]);
        assert_eq!(record.invoice_number, "INV-9");
    }

    #[test]
    fn test_invoice_number_anywhere() {
        let (record, _) = extract(&[
            "Total 10.00",
            "Due date: 01/01/2025",
            "Invoice No.: INV-2024-001",
            "Bill to Ship to",
        ]);
        assert_eq!(record.invoice_number, "INV-2024-001");
    }

    #[test]
    fn test_vendor_name_truncated_after_inc() {
        let (record, _) = extract(&["Bill to Ship to", "Acme, Inc. Acme Corp"]);
        assert_eq!(record.vendor_name, "Acme, Inc.");
    }

    #[test]
    fn test_vendor_name_verbatim_without_inc() {
        let (record, _) = extract(&["BILL TO SHIP TO", "Globex LLC Globex LLC"]);
        assert_eq!(record.vendor_name, "Globex LLC Globex LLC");
    }

    #[test]
    fn test_vendor_name_last_section_wins() {
        let (record, _) = extract(&[
            "Bill to Ship to",
            "First Co",
            "Bill to Ship to",
            "Second, Inc. Second",
        ]);
        assert_eq!(record.vendor_name, "Second, Inc.");
    }

    #[test]
    fn test_bill_to_on_last_line_is_ignored() {
        let (record, warnings) = extract(&["Invoice no.: 5", "Bill to Ship to"]);
        assert_eq!(record.vendor_name, "");
        assert!(warnings.contains(&MalformedFieldWarning::LabelNotFound {
            field: Field::VendorName
        }));
    }

    #[test]
    fn test_total_takes_last_token_and_last_line() {
        let (record, _) = extract(&["Total due $ 10.00", "TOTAL $1,234.56"]);
        assert_eq!(record.total_amount, "$1,234.56");
    }

    #[test]
    fn test_empty_value_warns() {
        let (record, warnings) = extract(&["Due date:"]);
        assert_eq!(record.due_date, "");
        assert!(warnings.contains(&MalformedFieldWarning::EmptyValue {
            field: Field::DueDate,
            line: 0
        }));
    }

    #[test]
    fn test_vendor_name_helper() {
        assert_eq!(vendor_name("Initech, Inc."), "Initech, Inc.");
        assert_eq!(vendor_name("Initech, Inc. Initech, Inc."), "Initech, Inc.");
        assert_eq!(vendor_name("Initech Inc"), "Initech Inc");
    }
}
