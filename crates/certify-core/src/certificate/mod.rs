//! Certificate of compliance rendering.
//!
//! A [`Certificate`] is the content derived from an [`InvoiceRecord`];
//! renderers only decide how it looks. Any record renders, including a
//! completely empty one.

mod pdf;
mod text;

pub use pdf::PdfCertificateRenderer;
pub use text::TextCertificateRenderer;

use rust_decimal::Decimal;

use crate::error::RenderError;
use crate::models::config::CertificateConfig;
use crate::models::invoice::{InvoiceRecord, LineItem};

pub const TITLE: &str = "Certificate of Compliance";

pub const STATEMENT: &str = "We certify that all materials, and products listed below have been \
assembled, produced, inspected, and tested in full accordance with all applicable specifications, \
drawings, and other purchase requirements. Test reports and/or suitable evidence of compliance are \
on file and are available from the manufacturer.";

pub const ITEM_HEADERS: [&str; 3] = ["Product Code", "Description", "Quantity"];

pub const SIGNATURE_RULE: &str = "____________________________";

pub const SIGNATURE_ROLE: &str = "Manufacturer's Representative";

const MISSING: &str = "N/A";

/// Trait for certificate renderers.
pub trait CertificateRenderer {
    /// Render a certificate for `record` into document bytes.
    fn render(&self, record: &InvoiceRecord) -> Result<Vec<u8>, RenderError>;

    /// Conventional file extension of the output.
    fn extension(&self) -> &'static str;
}

/// One row of the certificate's items table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateRow {
    pub product_code: String,
    pub description: String,
    pub quantity: String,
}

impl From<&LineItem> for CertificateRow {
    fn from(item: &LineItem) -> Self {
        Self {
            product_code: item.product_code.clone(),
            description: item.description.clone(),
            quantity: format_quantity(item),
        }
    }
}

/// Content of a certificate, independent of output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    pub date: String,
    pub customer: String,
    pub purchase_order: String,
    pub rows: Vec<CertificateRow>,
    pub custody_statement: String,
    pub signatory: String,
    pub company_name: String,
}

impl Certificate {
    pub fn from_record(record: &InvoiceRecord, config: &CertificateConfig) -> Self {
        Self {
            date: or_missing(&record.date),
            customer: or_missing(&record.vendor_name),
            purchase_order: or_missing(&record.po_number),
            rows: record.line_items.iter().map(CertificateRow::from).collect(),
            custody_statement: format!(
                "{} has established a known chain of custody for the material originating from the OEM.",
                config.company_name
            ),
            signatory: config.signatory.clone(),
            company_name: config.company_name.clone(),
        }
    }

    pub fn date_line(&self) -> String {
        format!("Date: {}", self.date)
    }

    pub fn customer_line(&self) -> String {
        format!("Customer: {}", self.customer)
    }

    pub fn purchase_order_line(&self) -> String {
        format!("Customer Purchase Order No: {}", self.purchase_order)
    }
}

fn or_missing(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        MISSING.to_string()
    } else {
        value.to_string()
    }
}

/// Quantity with thousands separators when it is numeric, else verbatim.
pub fn format_quantity(item: &LineItem) -> String {
    match item.quantity_value() {
        Some(value) => group_thousands(value),
        None => item.quantity.clone(),
    }
}

fn group_thousands(value: Decimal) -> String {
    let plain = value.normalize().to_string();
    let (sign, digits) = match plain.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", plain.as_str()),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((int_part, frac)) => (int_part, Some(frac)),
        None => (digits, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}

/// Greedy word wrap to at most `width` characters per line.
///
/// Words longer than `width` are split.
pub(crate) fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word = word;
        while word.chars().count() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let split = word
                .char_indices()
                .nth(width)
                .map(|(i, _)| i)
                .unwrap_or(word.len());
            lines.push(word[..split].to_string());
            word = &word[split..];
        }
        if word.is_empty() {
            continue;
        }
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
