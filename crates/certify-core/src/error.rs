//! Error types for the certify-core library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the certify library.
#[derive(Error, Debug)]
pub enum CertifyError {
    /// The text source could not produce any text.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Certificate rendering error.
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Record (de)serialization error.
    #[error("record error: {0}")]
    Record(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of a text source to produce text for a document.
///
/// An empty but successful extraction is not an error.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// Reading the document failed.
    #[error("failed to read document: {0}")]
    Io(#[from] std::io::Error),

    /// The PDF could not be opened or its text layer could not be read.
    #[error("PDF error: {0}")]
    Pdf(String),

    /// The OCR engine failed.
    #[error("OCR error: {0}")]
    Ocr(String),

    /// The image could not be decoded.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// No adapter handles this kind of document.
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    /// Every page of a scanned document failed OCR.
    #[error("no text could be extracted from {0}")]
    NoText(String),
}

/// Errors produced while rendering a certificate.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Building or writing the PDF failed.
    #[error("failed to build PDF: {0}")]
    Pdf(String),

    /// Writing the rendered document failed.
    #[error("failed to write certificate: {0}")]
    Io(#[from] std::io::Error),
}

impl From<lopdf::Error> for RenderError {
    fn from(err: lopdf::Error) -> Self {
        Self::Pdf(err.to_string())
    }
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read or written.
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for this schema.
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// A configured value is out of range or refers to something missing.
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

/// Result type for the certify library.
pub type Result<T> = std::result::Result<T, CertifyError>;
