//! Plain text certificate, used for previews.

use super::*;

const WIDTH: usize = 78;

/// Renders a certificate as plain UTF-8 text.
#[derive(Debug, Clone, Default)]
pub struct TextCertificateRenderer {
    config: CertificateConfig,
}

impl TextCertificateRenderer {
    pub fn new(config: CertificateConfig) -> Self {
        Self { config }
    }

    pub fn render_string(&self, record: &InvoiceRecord) -> String {
        let cert = Certificate::from_record(record, &self.config);
        let mut out = String::new();

        push_centered(&mut out, TITLE);
        push_centered(&mut out, &cert.date_line());
        out.push('\n');

        out.push_str(&cert.customer_line());
        out.push('\n');
        out.push_str(&cert.purchase_order_line());
        out.push_str("\n\n");

        for line in wrap(STATEMENT, WIDTH) {
            out.push_str(&line);
            out.push('\n');
        }
        out.push('\n');

        if !cert.rows.is_empty() {
            let code_width = cert
                .rows
                .iter()
                .map(|r| r.product_code.chars().count())
                .chain([ITEM_HEADERS[0].len()])
                .max()
                .unwrap_or(0);
            let qty_width = cert
                .rows
                .iter()
                .map(|r| r.quantity.chars().count())
                .chain([ITEM_HEADERS[2].len()])
                .max()
                .unwrap_or(0);

            out.push_str(&format!(
                "{:<cw$}  {}  {:>qw$}\n",
                ITEM_HEADERS[0],
                ITEM_HEADERS[1],
                ITEM_HEADERS[2],
                cw = code_width,
                qw = qty_width
            ));
            for row in &cert.rows {
                out.push_str(&format!(
                    "{:<cw$}  {}  {:>qw$}\n",
                    row.product_code,
                    row.description,
                    row.quantity,
                    cw = code_width,
                    qw = qty_width
                ));
            }
            out.push('\n');
        }

        for line in wrap(&cert.custody_statement, WIDTH) {
            out.push_str(&line);
            out.push('\n');
        }
        out.push('\n');

        push_centered(&mut out, &cert.signatory);
        push_centered(&mut out, SIGNATURE_RULE);
        push_centered(&mut out, &cert.company_name);
        push_centered(&mut out, SIGNATURE_ROLE);
        out
    }
}

impl CertificateRenderer for TextCertificateRenderer {
    fn render(&self, record: &InvoiceRecord) -> Result<Vec<u8>, RenderError> {
        Ok(self.render_string(record).into_bytes())
    }

    fn extension(&self) -> &'static str {
        "txt"
    }
}

fn push_centered(out: &mut String, text: &str) {
    let pad = WIDTH.saturating_sub(text.chars().count()) / 2;
    out.push_str(&" ".repeat(pad));
    out.push_str(text);
    out.push('\n');
}
