//! Core library for invoice field extraction and compliance certificates.
//!
//! This crate provides:
//! - Text sources for plain text, PDF (text layer with OCR fallback) and images
//! - Layout-based invoice parsing into an [`InvoiceRecord`]
//! - Certificate of compliance rendering (PDF and plain text)

pub mod certificate;
pub mod error;
pub mod invoice;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod source;

pub use certificate::{
    Certificate, CertificateRenderer, PdfCertificateRenderer, TextCertificateRenderer,
};
pub use error::{CertifyError, ConfigError, ExtractionError, RenderError, Result};
pub use invoice::{
    parse_invoice, Field, InvoiceParser, LayoutInvoiceParser, MalformedFieldWarning, ParseOutcome,
};
pub use models::config::CertifyConfig;
pub use models::invoice::{InvoiceRecord, LineItem, RawText};
pub use ocr::{create_backend, OcrBackend, OcrResult, TextBox};
pub use source::{AutoTextSource, DocumentKind, SourceDocument, TextSource};
