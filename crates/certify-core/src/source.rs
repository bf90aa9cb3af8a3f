//! Text sources: turn an invoice file into [`RawText`].
//!
//! Text comes from a plain text file, a PDF text layer, or OCR. Only a
//! failure to read the document at all is an error; an empty result is a
//! valid, empty [`RawText`].

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::ExtractionError;
use crate::models::config::{CertifyConfig, PdfConfig};
use crate::models::invoice::RawText;
use crate::ocr::{ImagePreprocessor, OcrBackend};
use crate::pdf::PdfExtractor;

/// Kind of input document, decided by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Image,
    PlainText,
}

impl DocumentKind {
    /// Detect the kind from a file name.
    pub fn from_name(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "png" | "jpg" | "jpeg" | "tif" | "tiff" | "bmp" => Some(Self::Image),
            "txt" | "text" => Some(Self::PlainText),
            _ => None,
        }
    }
}

/// An input file held in memory.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// File name, used for kind detection and messages.
    pub name: String,
    pub kind: DocumentKind,
    pub bytes: Vec<u8>,
}

impl SourceDocument {
    /// Build from bytes; fails for unsupported file names.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, ExtractionError> {
        let name = name.into();
        let kind = DocumentKind::from_name(&name)
            .ok_or_else(|| ExtractionError::UnsupportedFormat(name.clone()))?;
        Ok(Self { name, kind, bytes })
    }

    /// Read a file from disk.
    pub fn open(path: &Path) -> Result<Self, ExtractionError> {
        let name = path.display().to_string();
        // Reject before reading so a wrong extension is reported as such.
        if DocumentKind::from_name(&name).is_none() {
            return Err(ExtractionError::UnsupportedFormat(name));
        }
        let bytes = fs::read(path)?;
        Self::from_bytes(name, bytes)
    }
}

/// Trait for text source adapters.
pub trait TextSource {
    /// Produce the raw text of a document.
    fn extract_text(&self, document: &SourceDocument) -> Result<RawText, ExtractionError>;
}

/// Reads plain text files (lossy UTF-8).
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextSource;

impl TextSource for PlainTextSource {
    fn extract_text(&self, document: &SourceDocument) -> Result<RawText, ExtractionError> {
        Ok(RawText::new(String::from_utf8_lossy(&document.bytes)))
    }
}

/// Runs OCR over image files.
pub struct OcrTextSource {
    backend: Arc<dyn OcrBackend>,
    preprocessor: ImagePreprocessor,
}

impl OcrTextSource {
    pub fn new(backend: Arc<dyn OcrBackend>, preprocessor: ImagePreprocessor) -> Self {
        Self {
            backend,
            preprocessor,
        }
    }

    /// Recognize the text of one decoded image.
    pub fn recognize(&self, image: &image::DynamicImage) -> Result<String, ExtractionError> {
        let prepared = self.preprocessor.process(image);
        Ok(self.backend.process(&prepared)?.text)
    }
}

impl TextSource for OcrTextSource {
    fn extract_text(&self, document: &SourceDocument) -> Result<RawText, ExtractionError> {
        let image = image::load_from_memory(&document.bytes)?;
        Ok(RawText::new(self.recognize(&image)?))
    }
}

/// Reads the PDF text layer, falling back to OCR of page images when the
/// text layer is blank.
pub struct PdfTextSource {
    ocr: Option<OcrTextSource>,
    config: PdfConfig,
}

impl PdfTextSource {
    pub fn new(ocr: Option<OcrTextSource>, config: PdfConfig) -> Self {
        Self { ocr, config }
    }

    /// Pages to OCR; a `max_pages` of 0 means no limit.
    fn page_limit(&self, page_count: u32) -> u32 {
        match self.config.max_pages {
            0 => page_count,
            max => page_count.min(u32::try_from(max).unwrap_or(u32::MAX)),
        }
    }

    fn ocr_pages(
        &self,
        ocr: &OcrTextSource,
        pdf: &PdfExtractor,
        name: &str,
    ) -> Result<String, ExtractionError> {
        let pages = self.page_limit(pdf.page_count());

        let mut texts = Vec::new();
        let mut attempts = 0usize;
        let mut failures = 0usize;
        for page in 1..=pages {
            for image in pdf.page_images(page) {
                attempts += 1;
                match ocr.recognize(&image) {
                    Ok(text) if !text.trim().is_empty() => texts.push(text),
                    Ok(_) => debug!("No text recognized on page {}", page),
                    Err(e) => {
                        warn!("OCR failed on page {}: {}", page, e);
                        failures += 1;
                    }
                }
            }
        }

        if attempts > 0 && failures == attempts {
            return Err(ExtractionError::NoText(name.to_string()));
        }
        if attempts == 0 {
            warn!("{} has no text layer and no page images", name);
        }
        Ok(texts.join("\n"))
    }
}

impl TextSource for PdfTextSource {
    fn extract_text(&self, document: &SourceDocument) -> Result<RawText, ExtractionError> {
        let pdf = PdfExtractor::load(&document.bytes)?;
        let text = pdf.extract_text()?;
        if !text.trim().is_empty() {
            return Ok(RawText::new(text));
        }

        match &self.ocr {
            Some(ocr) if self.config.ocr_fallback => {
                info!("{} has no text layer, running OCR", document.name);
                Ok(RawText::new(self.ocr_pages(ocr, &pdf, &document.name)?))
            }
            _ => {
                warn!("{} has no text layer and OCR is unavailable", document.name);
                Ok(RawText::default())
            }
        }
    }
}

/// Dispatches to the right adapter by document kind.
pub struct AutoTextSource {
    pdf: PdfTextSource,
    image: Option<OcrTextSource>,
}

impl AutoTextSource {
    /// Build from configuration and an optional, already constructed OCR
    /// engine.
    pub fn new(config: &CertifyConfig, backend: Option<Arc<dyn OcrBackend>>) -> Self {
        let make_ocr = |backend: &Arc<dyn OcrBackend>| {
            OcrTextSource::new(
                Arc::clone(backend),
                ImagePreprocessor::from_config(&config.ocr.preprocess),
            )
        };
        Self {
            pdf: PdfTextSource::new(backend.as_ref().map(make_ocr), config.pdf.clone()),
            image: backend.as_ref().map(make_ocr),
        }
    }

    /// Whether image documents can be read.
    pub fn has_ocr(&self) -> bool {
        self.image.is_some()
    }
}

impl TextSource for AutoTextSource {
    fn extract_text(&self, document: &SourceDocument) -> Result<RawText, ExtractionError> {
        debug!("Extracting text from {} ({:?})", document.name, document.kind);
        match document.kind {
            DocumentKind::PlainText => PlainTextSource.extract_text(document),
            DocumentKind::Pdf => self.pdf.extract_text(document),
            DocumentKind::Image => match &self.image {
                Some(ocr) => ocr.extract_text(document),
                None => Err(ExtractionError::Ocr(format!(
                    "{} is an image but no OCR models are configured",
                    document.name
                ))),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::OcrResult;
    use image::{DynamicImage, ImageFormat};
    use std::io::Cursor;

    struct FixedOcr(&'static str);

    impl OcrBackend for FixedOcr {
        fn process(&self, _image: &DynamicImage) -> Result<OcrResult, ExtractionError> {
            Ok(OcrResult {
                text: self.0.to_string(),
                ..OcrResult::default()
            })
        }
    }

    struct FailingOcr;

    impl OcrBackend for FailingOcr {
        fn process(&self, _image: &DynamicImage) -> Result<OcrResult, ExtractionError> {
            Err(ExtractionError::Ocr("engine crashed".to_string()))
        }
    }

    fn png_bytes() -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::new_luma8(8, 8)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_kind_detection() {
        assert_eq!(DocumentKind::from_name("a/B.PDF"), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::from_name("scan.jpeg"), Some(DocumentKind::Image));
        assert_eq!(DocumentKind::from_name("x.txt"), Some(DocumentKind::PlainText));
        assert_eq!(DocumentKind::from_name("x.docx"), None);
        assert_eq!(DocumentKind::from_name("noext"), None);
    }

    #[test]
    fn test_unsupported_format() {
        assert!(matches!(
            SourceDocument::from_bytes("invoice.docx", vec![]),
            Err(ExtractionError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_plain_text_source() {
        let doc = SourceDocument::from_bytes("i.txt", b"Invoice no.: 9\n\nTotal 1".to_vec()).unwrap();
        let text = PlainTextSource.extract_text(&doc).unwrap();
        assert_eq!(text.lines().len(), 2);
    }

    #[test]
    fn test_empty_text_is_not_an_error() {
        let doc = SourceDocument::from_bytes("i.txt", Vec::new()).unwrap();
        let source = AutoTextSource::new(&CertifyConfig::default(), None);
        assert!(source.extract_text(&doc).unwrap().is_empty());
    }

    #[test]
    fn test_image_without_ocr_fails() {
        let doc = SourceDocument::from_bytes("scan.png", png_bytes()).unwrap();
        let source = AutoTextSource::new(&CertifyConfig::default(), None);
        assert!(!source.has_ocr());
        assert!(matches!(source.extract_text(&doc), Err(ExtractionError::Ocr(_))));
    }

    #[test]
    fn test_image_with_ocr() {
        let doc = SourceDocument::from_bytes("scan.png", png_bytes()).unwrap();
        let source = AutoTextSource::new(
            &CertifyConfig::default(),
            Some(Arc::new(FixedOcr("Invoice no.: 31\n\nTotal 4.00")) as Arc<dyn OcrBackend>),
        );
        let text = source.extract_text(&doc).unwrap();
        assert_eq!(text.lines(), &["Invoice no.: 31".to_string(), "Total 4.00".to_string()]);
    }

    #[test]
    fn test_ocr_failure_propagates() {
        let doc = SourceDocument::from_bytes("scan.png", png_bytes()).unwrap();
        let source = AutoTextSource::new(&CertifyConfig::default(), Some(Arc::new(FailingOcr) as Arc<dyn OcrBackend>));
        assert!(matches!(source.extract_text(&doc), Err(ExtractionError::Ocr(_))));
    }

    #[test]
    fn test_corrupt_image_is_an_error() {
        let doc = SourceDocument::from_bytes("scan.png", b"garbage".to_vec()).unwrap();
        let source = AutoTextSource::new(&CertifyConfig::default(), Some(Arc::new(FixedOcr("")) as Arc<dyn OcrBackend>));
        assert!(matches!(source.extract_text(&doc), Err(ExtractionError::Image(_))));
    }

    #[test]
    fn test_page_limit() {
        let limited = |max_pages| {
            PdfTextSource::new(None, PdfConfig { max_pages, ..PdfConfig::default() })
        };
        assert_eq!(limited(0).page_limit(12), 12);
        assert_eq!(limited(3).page_limit(12), 3);
        assert_eq!(limited(30).page_limit(12), 12);
        assert_eq!(limited(usize::MAX).page_limit(12), 12);
    }

    #[test]
    fn test_corrupt_pdf_is_an_error() {
        let doc = SourceDocument::from_bytes("broken.pdf", b"%PDF-1.4 nope".to_vec()).unwrap();
        let source = AutoTextSource::new(&CertifyConfig::default(), None);
        assert!(matches!(source.extract_text(&doc), Err(ExtractionError::Pdf(_))));
    }
}
