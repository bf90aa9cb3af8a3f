//! Image cleanup before OCR: grayscale, blur, Otsu binarization.

use image::{DynamicImage, GrayImage, Luma};
use tracing::debug;

use crate::models::config::PreprocessConfig;

/// Image preprocessor for the OCR text source.
#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    grayscale: bool,
    blur_sigma: f32,
    binarize: bool,
}

impl ImagePreprocessor {
    /// Create a preprocessor with default settings.
    pub fn new() -> Self {
        Self::from_config(&PreprocessConfig::default())
    }

    pub fn from_config(config: &PreprocessConfig) -> Self {
        Self {
            grayscale: config.grayscale,
            blur_sigma: config.blur_sigma,
            binarize: config.binarize,
        }
    }

    /// Preprocessor that returns images untouched.
    pub fn passthrough() -> Self {
        Self {
            grayscale: false,
            blur_sigma: 0.0,
            binarize: false,
        }
    }

    /// Apply the enabled steps. Binarizing implies grayscale.
    pub fn process(&self, image: &DynamicImage) -> DynamicImage {
        if !self.grayscale && !self.binarize && self.blur_sigma <= 0.0 {
            return image.clone();
        }

        if !self.grayscale && !self.binarize {
            return image.blur(self.blur_sigma);
        }

        let mut gray = image.to_luma8();
        if self.blur_sigma > 0.0 {
            gray = image::imageops::blur(&gray, self.blur_sigma);
        }
        if self.binarize {
            let threshold = otsu_threshold(&gray);
            debug!("Otsu threshold: {}", threshold);
            binarize(&mut gray, threshold);
        }
        DynamicImage::ImageLuma8(gray)
    }
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Threshold that maximizes between-class variance of the histogram.
pub fn otsu_threshold(image: &GrayImage) -> u8 {
    let mut histogram = [0u64; 256];
    for Luma([value]) in image.pixels() {
        histogram[*value as usize] += 1;
    }

    let total: u64 = histogram.iter().sum();
    if total == 0 {
        return 0;
    }
    let weighted_sum: f64 = histogram
        .iter()
        .enumerate()
        .map(|(level, count)| level as f64 * *count as f64)
        .sum();

    let mut background_weight = 0u64;
    let mut background_sum = 0f64;
    let mut best_variance = 0f64;
    let mut best_threshold = 0u8;

    for (level, count) in histogram.iter().enumerate() {
        background_weight += count;
        if background_weight == 0 {
            continue;
        }
        let foreground_weight = total - background_weight;
        if foreground_weight == 0 {
            break;
        }

        background_sum += level as f64 * *count as f64;
        let background_mean = background_sum / background_weight as f64;
        let foreground_mean = (weighted_sum - background_sum) / foreground_weight as f64;
        let diff = background_mean - foreground_mean;
        let variance = background_weight as f64 * foreground_weight as f64 * diff * diff;

        if variance > best_variance {
            best_variance = variance;
            best_threshold = level as u8;
        }
    }

    best_threshold
}

fn binarize(image: &mut GrayImage, threshold: u8) {
    for Luma([value]) in image.pixels_mut() {
        *value = if *value > threshold { 255 } else { 0 };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_tone(dark: u8, light: u8) -> GrayImage {
        GrayImage::from_fn(20, 10, |x, _| if x < 10 { Luma([dark]) } else { Luma([light]) })
    }

    #[test]
    fn test_otsu_separates_two_levels() {
        let threshold = otsu_threshold(&two_tone(30, 220));
        assert!((30..220).contains(&threshold));
    }

    #[test]
    fn test_otsu_uniform_image() {
        assert_eq!(otsu_threshold(&GrayImage::from_pixel(4, 4, Luma([128]))), 0);
    }

    #[test]
    fn test_process_binarizes() {
        let image = DynamicImage::ImageLuma8(two_tone(40, 200));
        let processed = ImagePreprocessor::from_config(&PreprocessConfig {
            grayscale: true,
            blur_sigma: 0.0,
            binarize: true,
        })
        .process(&image)
        .to_luma8();

        assert_eq!(processed.get_pixel(0, 0), &Luma([0]));
        assert_eq!(processed.get_pixel(19, 0), &Luma([255]));
    }

    #[test]
    fn test_passthrough_keeps_image() {
        let image = DynamicImage::ImageLuma8(two_tone(40, 200));
        let processed = ImagePreprocessor::passthrough().process(&image);
        assert_eq!(processed.to_luma8(), image.to_luma8());
    }
}
