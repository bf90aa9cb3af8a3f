//! PDF certificate rendering using lopdf.
//!
//! Letter pages with the standard Type1 Helvetica fonts, so no font files
//! need to be embedded. Text is encoded as Latin-1; characters outside it
//! are replaced with `?`.

use chrono::Local;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, StringFormat, Stream, dictionary};
use tracing::debug;

use super::*;

const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const SIDE_MARGIN: f32 = 54.0;
const VERTICAL_MARGIN: f32 = 36.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * SIDE_MARGIN;

const COLUMN_WIDTHS: [f32; 3] = [144.0, 288.0, 72.0];
const CELL_PADDING: f32 = 4.0;
const HEADER_FILL: f32 = 0.83;

const TITLE_SIZE: f32 = 18.0;
const BODY_SIZE: f32 = 11.0;
const TABLE_SIZE: f32 = 10.0;
const LEADING: f32 = 1.25;

const REGULAR: &str = "F1";
const BOLD: &str = "F2";

/// Renders a certificate as a PDF document.
#[derive(Debug, Clone, Default)]
pub struct PdfCertificateRenderer {
    config: CertificateConfig,
}

impl PdfCertificateRenderer {
    pub fn new(config: CertificateConfig) -> Self {
        Self { config }
    }

    fn layout(&self, cert: &Certificate) -> Vec<Vec<Operation>> {
        let mut page = PageWriter::new();

        page.centered(BOLD, TITLE_SIZE, TITLE);
        page.skip(6.0);
        page.centered(REGULAR, BODY_SIZE, &cert.date_line());
        page.skip(18.0);

        page.line(REGULAR, BODY_SIZE, SIDE_MARGIN, &cert.customer_line());
        page.line(REGULAR, BODY_SIZE, SIDE_MARGIN, &cert.purchase_order_line());
        page.skip(12.0);

        page.paragraph(REGULAR, BODY_SIZE, STATEMENT);
        page.skip(12.0);

        if !cert.rows.is_empty() {
            page.table(&cert.rows);
            page.skip(12.0);
        }

        page.paragraph(REGULAR, BODY_SIZE, &cert.custody_statement);
        page.skip(36.0);

        page.keep_together(4.0 * BODY_SIZE * LEADING);
        page.centered(REGULAR, BODY_SIZE, &cert.signatory);
        page.centered(REGULAR, BODY_SIZE, SIGNATURE_RULE);
        page.centered(BOLD, BODY_SIZE, &cert.company_name);
        page.centered(REGULAR, BODY_SIZE, SIGNATURE_ROLE);

        page.finish()
    }
}

impl CertificateRenderer for PdfCertificateRenderer {
    fn render(&self, record: &InvoiceRecord) -> Result<Vec<u8>, RenderError> {
        let cert = Certificate::from_record(record, &self.config);
        let pages = self.layout(&cert);

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let regular_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let bold_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                REGULAR => regular_id,
                BOLD => bold_id,
            },
        });

        let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
        for operations in pages {
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }
        let page_count = kids.len() as i64;

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count,
                "Resources" => resources_id,
                "MediaBox" => vec![Object::Integer(0), Object::Integer(0), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(TITLE),
            "Producer" => Object::string_literal("certify"),
            "CreationDate" => Object::string_literal(Local::now().format("D:%Y%m%d%H%M%S").to_string()),
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);
        doc.compress();

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)?;
        debug!("Rendered certificate: {} pages, {} bytes", page_count, bytes.len());
        Ok(bytes)
    }

    fn extension(&self) -> &'static str {
        "pdf"
    }
}

/// Writes operations top to bottom, starting a new page when the cursor
/// reaches the bottom margin.
struct PageWriter {
    done: Vec<Vec<Operation>>,
    current: Vec<Operation>,
    y: f32,
}

impl PageWriter {
    fn new() -> Self {
        Self {
            done: Vec::new(),
            current: Vec::new(),
            y: PAGE_HEIGHT - VERTICAL_MARGIN,
        }
    }

    fn new_page(&mut self) {
        self.done.push(std::mem::take(&mut self.current));
        self.y = PAGE_HEIGHT - VERTICAL_MARGIN;
    }

    /// Break the page unless `height` still fits.
    fn keep_together(&mut self, height: f32) {
        if self.y - height < VERTICAL_MARGIN && !self.current.is_empty() {
            self.new_page();
        }
    }

    fn skip(&mut self, height: f32) {
        self.y -= height;
    }

    fn line(&mut self, font: &str, size: f32, x: f32, text: &str) {
        self.keep_together(size * LEADING);
        let baseline = self.y - size;
        self.text_at(font, size, x, baseline, text);
        self.y -= size * LEADING;
    }

    fn centered(&mut self, font: &str, size: f32, text: &str) {
        let x = (PAGE_WIDTH - text_width(text, size)) / 2.0;
        self.line(font, size, x.max(SIDE_MARGIN), text);
    }

    fn paragraph(&mut self, font: &str, size: f32, text: &str) {
        for line in wrap(text, chars_per_width(CONTENT_WIDTH, size)) {
            self.line(font, size, SIDE_MARGIN, &line);
        }
    }

    fn text_at(&mut self, font: &str, size: f32, x: f32, y: f32, text: &str) {
        self.current.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![Object::Name(font.as_bytes().to_vec()), size.into()]),
            Operation::new("Td", vec![x.into(), y.into()]),
            Operation::new("Tj", vec![Object::String(latin1(text), StringFormat::Literal)]),
            Operation::new("ET", vec![]),
        ]);
    }

    fn rect(&mut self, x: f32, y: f32, width: f32, height: f32, paint: &str) {
        self.current.extend([
            Operation::new("re", vec![x.into(), y.into(), width.into(), height.into()]),
            Operation::new(paint, vec![]),
        ]);
    }

    fn table(&mut self, rows: &[CertificateRow]) {
        self.table_header();
        for row in rows {
            let description = wrap(
                &row.description,
                chars_per_width(COLUMN_WIDTHS[1] - 2.0 * CELL_PADDING, TABLE_SIZE),
            );
            let height = row_height(description.len());
            if self.y - height < VERTICAL_MARGIN {
                self.new_page();
                self.table_header();
            }
            self.table_row(
                [
                    std::slice::from_ref(&row.product_code),
                    description.as_slice(),
                    std::slice::from_ref(&row.quantity),
                ],
                height,
                REGULAR,
            );
        }
    }

    fn table_header(&mut self) {
        let height = row_height(1);
        self.keep_together(2.0 * height);
        self.current.push(Operation::new("g", vec![HEADER_FILL.into()]));
        self.rect(SIDE_MARGIN, self.y - height, CONTENT_WIDTH, height, "f");
        self.current.push(Operation::new("g", vec![Object::Integer(0)]));
        let headers = ITEM_HEADERS.map(str::to_string);
        self.table_row(
            [
                std::slice::from_ref(&headers[0]),
                std::slice::from_ref(&headers[1]),
                std::slice::from_ref(&headers[2]),
            ],
            height,
            BOLD,
        );
    }

    /// Cells are drawn left to right; the last column is right aligned.
    fn table_row(&mut self, cells: [&[String]; 3], height: f32, font: &str) {
        let top = self.y;
        let mut x = SIDE_MARGIN;
        for (column, lines) in cells.iter().enumerate() {
            let width = COLUMN_WIDTHS[column];
            self.rect(x, top - height, width, height, "S");
            for (i, text) in lines.iter().enumerate() {
                let baseline = top - CELL_PADDING - TABLE_SIZE - i as f32 * TABLE_SIZE * LEADING;
                let text_x = if column == 2 {
                    x + width - CELL_PADDING - text_width(text, TABLE_SIZE)
                } else {
                    x + CELL_PADDING
                };
                self.text_at(font, TABLE_SIZE, text_x, baseline, text);
            }
            x += width;
        }
        self.y -= height;
    }

    fn finish(mut self) -> Vec<Vec<Operation>> {
        if !self.current.is_empty() || self.done.is_empty() {
            self.done.push(self.current);
        }
        self.done
    }
}

fn row_height(lines: usize) -> f32 {
    lines.max(1) as f32 * TABLE_SIZE * LEADING + 2.0 * CELL_PADDING
}

/// Approximate Helvetica advance: half the font size per character.
fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.5
}

fn chars_per_width(width: f32, size: f32) -> usize {
    (width / (size * 0.5)) as usize
}

fn latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}
