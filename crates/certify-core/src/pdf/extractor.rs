//! PDF text layer and page image extraction using lopdf and pdf-extract.

use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, trace};

use crate::error::ExtractionError;

/// A loaded PDF document.
pub struct PdfExtractor {
    document: Document,
    raw_data: Vec<u8>,
}

impl PdfExtractor {
    /// Parse a PDF from bytes.
    ///
    /// Documents encrypted with an empty user password are decrypted so
    /// their text layer can be read.
    pub fn load(data: &[u8]) -> Result<Self, ExtractionError> {
        let mut document = Document::load_mem(data).map_err(|e| ExtractionError::Pdf(e.to_string()))?;

        let raw_data = if document.is_encrypted() {
            document
                .decrypt("")
                .map_err(|_| ExtractionError::Pdf("document is encrypted".to_string()))?;
            debug!("Decrypted PDF with empty password");
            let mut decrypted = Vec::new();
            document
                .save_to(&mut decrypted)
                .map_err(|e| ExtractionError::Pdf(format!("failed to save decrypted PDF: {}", e)))?;
            decrypted
        } else {
            data.to_vec()
        };

        debug!("Loaded PDF with {} pages", document.get_pages().len());
        Ok(Self { document, raw_data })
    }

    /// Number of pages.
    pub fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    /// Text of the whole document's text layer.
    pub fn extract_text(&self) -> Result<String, ExtractionError> {
        pdf_extract::extract_text_from_mem(&self.raw_data)
            .map_err(|e| ExtractionError::Pdf(format!("failed to extract text: {}", e)))
    }

    /// Images drawn on a page (1-indexed), as found in its XObject resources.
    pub fn page_images(&self, page: u32) -> Vec<DynamicImage> {
        let pages = self.document.get_pages();
        let Some(page_id) = pages.get(&page) else {
            return Vec::new();
        };
        let Some(resources) = self.page_resources(*page_id) else {
            trace!("page {} has no resources", page);
            return Vec::new();
        };
        let Some(xobjects) = resources
            .get(b"XObject")
            .ok()
            .and_then(|o| self.resolve(o))
            .and_then(|o| o.as_dict().ok())
        else {
            return Vec::new();
        };

        let images: Vec<DynamicImage> = xobjects
            .iter()
            .filter_map(|(_, obj)| self.resolve(obj))
            .filter_map(|obj| obj.as_stream().ok())
            .filter_map(decode_image)
            .collect();

        debug!("Found {} images on page {}", images.len(), page);
        images
    }

    fn resolve<'a>(&'a self, object: &'a Object) -> Option<&'a Object> {
        self.document.dereference(object).ok().map(|(_, obj)| obj)
    }

    /// Resources of a page, inherited from the page tree when absent.
    fn page_resources(&self, page_id: ObjectId) -> Option<&Dictionary> {
        let mut node = self.document.get_dictionary(page_id).ok()?;
        loop {
            if let Some(resources) = node
                .get(b"Resources")
                .ok()
                .and_then(|o| self.resolve(o))
                .and_then(|o| o.as_dict().ok())
            {
                return Some(resources);
            }
            let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
            node = self.document.get_dictionary(parent).ok()?;
        }
    }
}

/// Decode an image XObject. JPEG and 8-bit RGB/gray raw data are supported.
fn decode_image(stream: &Stream) -> Option<DynamicImage> {
    let dict = &stream.dict;
    if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
        return None;
    }
    let width = dict.get(b"Width").ok()?.as_i64().ok()? as u32;
    let height = dict.get(b"Height").ok()?.as_i64().ok()? as u32;

    let filter = dict.get(b"Filter").ok().and_then(|f| match f {
        Object::Name(name) => Some(name.as_slice()),
        Object::Array(filters) => filters.first().and_then(|o| o.as_name().ok()),
        _ => None,
    });
    if filter == Some(b"DCTDecode".as_slice()) {
        return image::load_from_memory_with_format(&stream.content, image::ImageFormat::Jpeg).ok();
    }

    let bits = dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(8);
    if bits != 8 {
        trace!("skipping {}-bit image", bits);
        return None;
    }

    let data = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());
    let color_space = dict.get(b"ColorSpace").ok().and_then(|o| o.as_name().ok());
    let pixels = (width as usize) * (height as usize);

    match color_space {
        Some(b"DeviceGray") if data.len() >= pixels => {
            GrayImage::from_raw(width, height, data[..pixels].to_vec()).map(DynamicImage::ImageLuma8)
        }
        Some(b"DeviceRGB") | None if data.len() >= pixels * 3 => {
            RgbImage::from_raw(width, height, data[..pixels * 3].to_vec()).map(DynamicImage::ImageRgb8)
        }
        _ => {
            trace!("unsupported image encoding {}x{}", width, height);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    fn gray_image_stream(width: i64, height: i64, fill: u8) -> Stream {
        Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width,
                "Height" => height,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            vec![fill; (width * height) as usize],
        )
    }

    #[test]
    fn test_decode_raw_gray_image() {
        let image = decode_image(&gray_image_stream(3, 2, 77)).unwrap();
        assert_eq!((image.width(), image.height()), (3, 2));
        assert_eq!(image.to_luma8().get_pixel(2, 1).0, [77]);
    }

    #[test]
    fn test_decode_rejects_non_images() {
        let stream = Stream::new(dictionary! { "Subtype" => "Form" }, vec![]);
        assert!(decode_image(&stream).is_none());
    }

    #[test]
    fn test_load_rejects_garbage() {
        assert!(matches!(
            PdfExtractor::load(b"not a pdf"),
            Err(ExtractionError::Pdf(_))
        ));
    }
}
