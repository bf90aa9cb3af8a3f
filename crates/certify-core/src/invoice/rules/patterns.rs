//! Label literals and regex patterns for the supported invoice layout.
//!
//! Labels are matched against a lowercased copy of each line.

use lazy_static::lazy_static;
use regex::Regex;

/// Line preceding the customer name.
pub const BILL_TO_LABEL: &str = "bill to ship to";

/// Suffix that ends the customer name when OCR repeats it.
pub const INC_SUFFIX: &str = ", Inc.";

pub const PO_NUMBER_LABEL: &str = "invoice details po number:";
pub const INVOICE_NUMBER_LABEL: &str = "invoice no.:";
pub const INVOICE_DATE_LABEL: &str = "invoice date:";
pub const DUE_DATE_LABEL: &str = "due date:";

/// Prefix of the total line, also skipped inside the items table.
pub const TOTAL_PREFIX: &str = "total";

/// Prefix of the closing courtesy line inside the items table.
pub const THANK_PREFIX: &str = "thank";

/// Both must appear on the items table header line.
pub const TABLE_HEADER_LABELS: [&str; 2] = ["product or service", "qty"];

lazy_static! {
    // Numeric literal with optional thousands separators and decimals
    pub static ref NUMBER_TOKEN: Regex = Regex::new(
        r"[\d.,]+"
    ).unwrap();

    // Row numbering such as "1. " or "12."
    pub static ref ROW_NUMBER_PREFIX: Regex = Regex::new(
        r"^\d+\.\s*"
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_token_keeps_separators() {
        let found: Vec<&str> = NUMBER_TOKEN
            .find_iter("WID-100 x 1,250 2.50 $3,125.00")
            .map(|m| m.as_str())
            .collect();
        assert_eq!(found, vec!["100", "1,250", "2.50", "3,125.00"]);
    }

    #[test]
    fn test_row_number_prefix() {
        assert_eq!(ROW_NUMBER_PREFIX.replace("12.  ABC", ""), "ABC");
        assert_eq!(ROW_NUMBER_PREFIX.replace("ABC 1. x", ""), "ABC 1. x");
    }
}
