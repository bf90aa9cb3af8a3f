//! Line item extraction from the product/service table.
//!
//! Rows are recognized by their trailing numbers: the last three numeric
//! tokens of a line are quantity, rate and amount. Lines inside the table
//! with fewer numbers continue the previous row's description.

use tracing::{debug, trace};

use super::patterns::*;
use super::{MalformedFieldWarning, RecordExtractor};
use crate::models::invoice::{InvoiceRecord, LineItem, RawText};

/// Position of the scanner relative to the items table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableState {
    /// Header line not seen yet; every line is ignored.
    #[default]
    BeforeTable,
    /// Inside the table; lines are rows or continuations.
    InTable,
}

/// Extracts line items from the section after the table header.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineItemExtractor;

impl LineItemExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Scan lines and return the recognized items with the final state.
    pub fn scan(&self, lines: &[String]) -> (Vec<LineItem>, TableState) {
        let mut state = TableState::BeforeTable;
        let mut items: Vec<LineItem> = Vec::new();

        for (i, line) in lines.iter().enumerate() {
            let lower = line.to_lowercase();

            match state {
                TableState::BeforeTable => {
                    if is_table_header(&lower) {
                        debug!("line item table starts after line {}", i);
                        state = TableState::InTable;
                    }
                    continue;
                }
                TableState::InTable => {}
            }

            if lower.starts_with(TOTAL_PREFIX) || lower.starts_with(THANK_PREFIX) {
                trace!("skipping line {} inside table", i);
                continue;
            }

            if let Some(item) = parse_row(line) {
                trace!("row on line {}: {:?}", i, item);
                items.push(item);
            } else if let Some(last) = items.last_mut() {
                last.description.push(' ');
                last.description.push_str(line.trim());
            } else {
                trace!("dropping line {} before first row", i);
            }
        }

        (items, state)
    }
}

impl RecordExtractor for LineItemExtractor {
    fn extract_into(
        &self,
        text: &RawText,
        record: &mut InvoiceRecord,
        warnings: &mut Vec<MalformedFieldWarning>,
    ) {
        let (items, state) = self.scan(text.lines());

        match state {
            TableState::BeforeTable => warnings.push(MalformedFieldWarning::TableHeaderNotFound),
            TableState::InTable if items.is_empty() => {
                warnings.push(MalformedFieldWarning::NoLineItems)
            }
            TableState::InTable => {}
        }

        record.line_items = items;
    }
}

fn is_table_header(lower: &str) -> bool {
    TABLE_HEADER_LABELS.iter().all(|label| lower.contains(label))
}

/// Parse a table line as a row, if it carries at least three numbers.
///
/// The description region ends at the rightmost occurrence of the quantity
/// text anywhere in the line. When that text reappears inside the rate or
/// amount, the region runs up to that later position.
pub fn parse_row(line: &str) -> Option<LineItem> {
    let numbers: Vec<regex::Match<'_>> = NUMBER_TOKEN.find_iter(line).collect();
    if numbers.len() < 3 {
        return None;
    }

    let [quantity, rate, amount] = &numbers[numbers.len() - 3..] else {
        return None;
    };

    let end = line.rfind(quantity.as_str()).unwrap_or(quantity.start());
    let region = line[..end].trim();
    let region = ROW_NUMBER_PREFIX.replace(region, "");

    let (product_code, description) = match region.split_once(char::is_whitespace) {
        Some((code, rest)) => (code.to_string(), rest.trim().to_string()),
        None => (region.to_string(), String::new()),
    };

    Some(LineItem {
        product_code,
        description,
        quantity: quantity.as_str().to_string(),
        rate: rate.as_str().to_string(),
        amount: amount.as_str().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scan(lines: &[&str]) -> (Vec<LineItem>, TableState) {
        let lines: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
        LineItemExtractor::new().scan(&lines)
    }

    fn item(code: &str, desc: &str, qty: &str, rate: &str, amount: &str) -> LineItem {
        LineItem {
            product_code: code.to_string(),
            description: desc.to_string(),
            quantity: qty.to_string(),
            rate: rate.to_string(),
            amount: amount.to_string(),
        }
    }

    #[test]
    fn test_zero_lines_stays_before_table() {
        let (items, state) = scan(&[]);
        assert!(items.is_empty());
        assert_eq!(state, TableState::BeforeTable);
    }

    #[test]
    fn test_rows_before_header_are_ignored() {
        let (items, state) = scan(&["1. ABC Thing 1 2.00 2.00", "Qty only here"]);
        assert!(items.is_empty());
        assert_eq!(state, TableState::BeforeTable);
    }

    #[test]
    fn test_basic_row() {
        let (items, state) = scan(&[
            "# Product or Service Qty Rate Amount",
            "1. WID-100 Widget Assembly 10 2.50 25.00",
        ]);
        assert_eq!(state, TableState::InTable);
        assert_eq!(items, vec![item("WID-100", "Widget Assembly", "10", "2.50", "25.00")]);
    }

    #[test]
    fn test_continuation_appends_with_single_space() {
        let (items, _) = scan(&[
            "PRODUCT OR SERVICE QTY RATE AMOUNT",
            "1. CBL-7 Shielded cable 4 1,250.00 5,000.00",
            "  Lot A  ",
            "rev 2",
        ]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].description, "Shielded cable Lot A rev 2");
        assert_eq!(items[0].quantity, "4");
        assert_eq!(items[0].rate, "1,250.00");
        assert_eq!(items[0].amount, "5,000.00");
    }

    #[test]
    fn test_repeated_quantity_digits_split_at_rightmost() {
        let (items, _) = scan(&[
            "Product or service Qty",
            "2. M-5 Model 5 Gadget 5 3.00 15.00",
        ]);
        assert_eq!(
            items,
            vec![item("M-5", "Model 5 Gadget 5 3.00 1", "5", "3.00", "15.00")]
        );
    }

    #[test]
    fn test_two_numbers_without_items_is_dropped() {
        let (items, state) = scan(&["Product or Service Qty", "Freight 2 10.00"]);
        assert!(items.is_empty());
        assert_eq!(state, TableState::InTable);
    }

    #[test]
    fn test_total_and_thank_lines_skipped_without_leaving_table() {
        let (items, _) = scan(&[
            "Product or Service Qty",
            "1. A-1 First 1 1.00 1.00",
            "Total 1.00",
            "Thank you for your business",
            "2. B-2 Second 2 2.00 4.00",
        ]);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].description, "First 1 1.00");
        assert_eq!(items[1].product_code, "B-2");
    }

    #[test]
    fn test_earlier_numbers_stay_in_description() {
        let item = parse_row("3. PN-42 Bracket 12mm x 40 5 1.20 6.00").unwrap();
        assert_eq!(item.product_code, "PN-42");
        assert_eq!(item.description, "Bracket 12mm x 40");
        assert_eq!(item.quantity, "5");
    }

    #[test]
    fn test_quantity_text_inside_amount_extends_description() {
        let item = parse_row("1. BX-1 Box 3 1.00 3.00").unwrap();
        assert_eq!(item, self::item("BX-1", "Box 3 1.00", "3", "1.00", "3.00"));
    }

    #[test]
    fn test_quantity_text_inside_rate_and_amount() {
        let item = parse_row("1. P-2 Pin 25 0.25 6.25").unwrap();
        assert_eq!(item, self::item("P-2", "Pin 25 0.25 6.", "25", "0.25", "6.25"));
    }

    #[test]
    fn test_row_with_code_only() {
        let item = parse_row("SKU9 1 2 3").unwrap();
        assert_eq!(item, self::item("SKU9", "", "1", "2", "3"));
    }

    #[test]
    fn test_row_without_description_region() {
        let item = parse_row("1 2 3").unwrap();
        assert_eq!(item.product_code, "");
        assert_eq!(item.description, "");
    }
}
