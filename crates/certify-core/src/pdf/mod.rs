//! PDF processing module.

mod extractor;

pub use extractor::PdfExtractor;
