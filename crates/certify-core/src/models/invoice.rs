//! Invoice data models shared by the parser and the certificate renderers.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Text of one document as produced by a text source.
///
/// Keeps the original text alongside its non-empty, trimmed lines in
/// document order. Never modified after construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawText {
    source: String,
    lines: Vec<String>,
}

impl RawText {
    /// Build from the text returned by a text source.
    pub fn new(text: impl Into<String>) -> Self {
        let source = text.into();
        let lines = source
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        Self { source, lines }
    }

    /// Build from lines that are already split.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = lines
            .into_iter()
            .map(|l| l.as_ref().to_string())
            .collect::<Vec<_>>()
            .join("\n");
        Self::new(joined)
    }

    /// Text exactly as received.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Non-empty trimmed lines.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// True when the document has no non-blank line.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl From<&str> for RawText {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for RawText {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

/// Structured fields parsed from one invoice.
///
/// The serialized field set is the contract consumed by certificate
/// renderers, so names and nesting must stay as they are. Every key is
/// always present; missing values are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoiceRecord {
    pub invoice_number: String,
    pub po_number: String,
    pub date: String,
    pub due_date: String,
    pub vendor_name: String,
    pub total_amount: String,
    pub line_items: Vec<LineItem>,
    pub raw_text: String,
}

impl InvoiceRecord {
    /// An empty record carrying the text it will be parsed from.
    pub fn with_raw_text(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            ..Self::default()
        }
    }

    /// Whether none of the scalar fields and no line items were found.
    pub fn is_blank(&self) -> bool {
        self.invoice_number.is_empty()
            && self.po_number.is_empty()
            && self.date.is_empty()
            && self.due_date.is_empty()
            && self.vendor_name.is_empty()
            && self.total_amount.is_empty()
            && self.line_items.is_empty()
    }

    /// Load a record from JSON, e.g. one that was reviewed and edited by hand.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// One row of the product/service table.
///
/// Numeric columns keep the literal text found in the document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineItem {
    pub product_code: String,
    pub description: String,
    pub quantity: String,
    pub rate: String,
    pub amount: String,
}

impl LineItem {
    /// Quantity as a number, ignoring thousands separators.
    pub fn quantity_value(&self) -> Option<Decimal> {
        parse_literal(&self.quantity)
    }

    /// Rate as a number, ignoring thousands separators.
    pub fn rate_value(&self) -> Option<Decimal> {
        parse_literal(&self.rate)
    }

    /// Amount as a number, ignoring thousands separators.
    pub fn amount_value(&self) -> Option<Decimal> {
        parse_literal(&self.amount)
    }
}

fn parse_literal(literal: &str) -> Option<Decimal> {
    let cleaned: String = literal.chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned).ok()
}
