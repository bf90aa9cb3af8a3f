//! Configuration structures for text extraction and certificate rendering.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Main configuration for the certify pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CertifyConfig {
    /// OCR configuration.
    pub ocr: OcrConfig,

    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// Certificate content configuration.
    pub certificate: CertificateConfig,
}

/// OCR engine configuration.
///
/// The model directory is resolved once at startup and handed to the OCR
/// text source; nothing probes for models while parsing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Run OCR on images and scanned PDFs.
    pub enabled: bool,

    /// Directory containing the OCR model files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_dir: Option<PathBuf>,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,

    /// Image cleanup applied before recognition.
    pub preprocess: PreprocessConfig,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model_dir: None,
            detection_model: "det.onnx".to_string(),
            recognition_model: "latin_rec.onnx".to_string(),
            dictionary: "latin_dict.txt".to_string(),
            preprocess: PreprocessConfig::default(),
        }
    }
}

impl OcrConfig {
    /// Full paths of the detection model, recognition model and dictionary.
    pub fn model_paths(&self, model_dir: &Path) -> (PathBuf, PathBuf, PathBuf) {
        (
            model_dir.join(&self.detection_model),
            model_dir.join(&self.recognition_model),
            model_dir.join(&self.dictionary),
        )
    }

    /// Whether every model file exists under `model_dir`.
    pub fn models_present(&self, model_dir: &Path) -> bool {
        let (det, rec, dict) = self.model_paths(model_dir);
        det.exists() && rec.exists() && dict.exists()
    }
}

/// Image cleanup steps run before OCR.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Convert to grayscale.
    pub grayscale: bool,

    /// Gaussian blur sigma (0 disables blurring).
    pub blur_sigma: f32,

    /// Binarize with Otsu's threshold.
    pub binarize: bool,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            grayscale: true,
            // Roughly a 5x5 kernel.
            blur_sigma: 1.1,
            binarize: true,
        }
    }
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// OCR embedded page images when the text layer is blank.
    pub ocr_fallback: bool,

    /// Maximum pages to OCR (0 = unlimited).
    pub max_pages: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            ocr_fallback: true,
            max_pages: 10,
        }
    }
}

/// Fixed content printed on every certificate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CertificateConfig {
    /// Company issuing the certificate.
    pub company_name: String,

    /// Person signing on behalf of the company.
    pub signatory: String,
}

impl Default for CertificateConfig {
    fn default() -> Self {
        Self {
            company_name: "Amid Technologies Inc".to_string(),
            signatory: "Dima Minin".to_string(),
        }
    }
}

impl CertifyConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(dir) = &self.ocr.model_dir {
            if !dir.is_dir() {
                return Err(ConfigError::Invalid {
                    key: "ocr.model_dir".to_string(),
                    reason: format!("{} is not a directory", dir.display()),
                });
            }
        }
        let sigma = self.ocr.preprocess.blur_sigma;
        if !sigma.is_finite() || sigma < 0.0 {
            return Err(ConfigError::Invalid {
                key: "ocr.preprocess.blur_sigma".to_string(),
                reason: format!("must be a non-negative number, got {}", sigma),
            });
        }
        Ok(())
    }
}
