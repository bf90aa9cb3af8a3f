//! OCR for scanned invoices.
//!
//! The engine itself is an external collaborator behind [`OcrBackend`];
//! this module only prepares images and orders the recognized text.

mod preprocessing;
#[cfg(feature = "ocr")]
mod pure_engine;

pub use preprocessing::{otsu_threshold, ImagePreprocessor};
#[cfg(feature = "ocr")]
pub use pure_engine::PureOcrEngine;

use std::path::Path;
use std::sync::Arc;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::ExtractionError;
use crate::models::config::OcrConfig;

/// A recognized text region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBox {
    /// Axis-aligned bounds (min_x, min_y, max_x, max_y).
    pub rect: [f32; 4],

    /// Recognized text content.
    pub text: String,

    /// Recognition confidence (0.0 - 1.0).
    pub confidence: f32,
}

/// Result of OCR on one image.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrResult {
    /// Recognized text boxes.
    pub boxes: Vec<TextBox>,

    /// Box texts in reading order, one per line.
    pub text: String,

    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

impl OcrResult {
    /// Build a result from unordered boxes.
    pub fn from_boxes(mut boxes: Vec<TextBox>, processing_time_ms: u64) -> Self {
        sort_by_reading_order(&mut boxes);
        let text = boxes
            .iter()
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        Self {
            boxes,
            text,
            processing_time_ms,
        }
    }
}

/// Sort boxes top-to-bottom, then left-to-right within a 20px band.
pub fn sort_by_reading_order(boxes: &mut [TextBox]) {
    boxes.sort_by(|a, b| {
        let row_a = (a.rect[1] / 20.0) as i32;
        let row_b = (b.rect[1] / 20.0) as i32;
        row_a.cmp(&row_b).then_with(|| {
            a.rect[0]
                .partial_cmp(&b.rect[0])
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    });
}

/// An OCR engine.
pub trait OcrBackend {
    /// Recognize text in an already preprocessed image.
    fn process(&self, image: &DynamicImage) -> Result<OcrResult, ExtractionError>;
}

/// Build the OCR engine once at startup from explicit configuration.
///
/// Returns `None` when OCR is disabled or no model directory is known.
#[cfg(feature = "ocr")]
pub fn create_backend(
    config: &OcrConfig,
    model_dir: Option<&Path>,
) -> Result<Option<Arc<dyn OcrBackend>>, ExtractionError> {
    if !config.enabled {
        return Ok(None);
    }
    let Some(dir) = model_dir.or(config.model_dir.as_deref()) else {
        tracing::debug!("No OCR model directory configured");
        return Ok(None);
    };
    let engine = PureOcrEngine::from_dir(dir, config)?;
    Ok(Some(Arc::new(engine)))
}

/// Without the `ocr` feature there is never an engine.
#[cfg(not(feature = "ocr"))]
pub fn create_backend(
    _config: &OcrConfig,
    _model_dir: Option<&Path>,
) -> Result<Option<Arc<dyn OcrBackend>>, ExtractionError> {
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_box(x: f32, y: f32, text: &str) -> TextBox {
        TextBox {
            rect: [x, y, x + 50.0, y + 12.0],
            text: text.to_string(),
            confidence: 0.9,
        }
    }

    #[test]
    fn test_reading_order() {
        let result = OcrResult::from_boxes(
            vec![
                text_box(300.0, 105.0, "2.50"),
                text_box(10.0, 40.0, "Invoice no.: 12"),
                text_box(10.0, 101.0, "WID-100"),
            ],
            0,
        );
        assert_eq!(result.text, "Invoice no.: 12\nWID-100\n2.50");
    }

    #[test]
    fn test_disabled_ocr_has_no_backend() {
        let config = OcrConfig {
            enabled: false,
            ..OcrConfig::default()
        };
        assert!(create_backend(&config, None).unwrap().is_none());
    }
}
