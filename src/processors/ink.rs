//! Ink/background classification of a greyscale page.
//!
//! The classifier equalizes illumination, combines an adaptive-mean threshold with
//! a global Otsu threshold, forces ink to be the minority class, and cleans the
//! result with morphological passes plus area filters for specks and stray-light
//! holes.

use image::{GrayImage, Luma};
use imageproc::contrast::{equalize_histogram, otsu_level};
use imageproc::distance_transform::Norm;
use imageproc::filter::{box_filter, gaussian_blur_f32, median_filter};
use imageproc::morphology;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::config::{ConfigError, ConfigValidator};
use crate::processors::regions::Regions;

/// Parameters of the ink classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InkClassifierConfig {
    /// Pages whose intensity range is below this are treated as blank.
    pub min_contrast: u8,
    /// Gaussian smoothing sigma applied after equalization; 0 disables it.
    pub blur_sigma: f32,
    /// Radius of the local-mean window of the adaptive threshold.
    pub adaptive_radius: u32,
    /// A pixel is ink when it is this much darker than its local mean.
    pub adaptive_offset: i16,
    /// Whether to run the close/open/close/dilate cleanup passes.
    pub morphology: bool,
    /// Ink regions smaller than this many pixels are removed as noise.
    pub min_ink_area: usize,
    /// Enclosed background holes up to this many pixels are filled.
    pub max_hole_area: usize,
    /// Radius of the final median smoothing; 0 disables it.
    pub median_radius: u32,
}

impl Default for InkClassifierConfig {
    fn default() -> Self {
        Self {
            min_contrast: 16,
            blur_sigma: 1.0,
            adaptive_radius: 15,
            adaptive_offset: 9,
            morphology: true,
            min_ink_area: 40,
            max_hole_area: 800,
            median_radius: 1,
        }
    }
}

impl ConfigValidator for InkClassifierConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.blur_sigma < 0.0 || !self.blur_sigma.is_finite() {
            return Err(ConfigError::invalid("ink.blur_sigma must be >= 0"));
        }
        if self.adaptive_radius == 0 {
            return Err(ConfigError::invalid("ink.adaptive_radius must be > 0"));
        }
        Ok(())
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}

/// Binary ink mask: 255 = ink, 0 = background.
#[derive(Debug, Clone, PartialEq)]
pub struct InkMask {
    mask: GrayImage,
}

impl InkMask {
    /// Wraps an existing mask; any non-zero pixel counts as ink.
    pub fn from_image(mut mask: GrayImage) -> Self {
        for p in mask.pixels_mut() {
            if p[0] != 0 {
                p[0] = 255;
            }
        }
        Self { mask }
    }

    /// A mask with no ink.
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            mask: GrayImage::new(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.mask.width()
    }

    pub fn height(&self) -> u32 {
        self.mask.height()
    }

    #[inline]
    pub fn is_ink(&self, x: u32, y: u32) -> bool {
        self.mask.get_pixel(x, y)[0] != 0
    }

    /// Number of ink pixels.
    pub fn ink_count(&self) -> usize {
        self.mask.pixels().filter(|p| p[0] != 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.mask.pixels().all(|p| p[0] == 0)
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.mask
    }
}

/// Converts greyscale pages into [`InkMask`]s.
#[derive(Debug, Clone, Default)]
pub struct InkClassifier {
    config: InkClassifierConfig,
}

impl InkClassifier {
    pub fn new(config: InkClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &InkClassifierConfig {
        &self.config
    }

    /// Classifies every pixel of `page` as ink or background.
    pub fn classify(&self, page: &GrayImage) -> InkMask {
        let (width, height) = page.dimensions();
        if width == 0 || height == 0 {
            return InkMask::empty(width, height);
        }

        let (lo, hi) = page
            .pixels()
            .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));
        if hi.saturating_sub(lo) < self.config.min_contrast {
            debug!(lo, hi, "page has no usable contrast, treating it as blank");
            return InkMask::empty(width, height);
        }

        let equalized = equalize_histogram(page);
        let smoothed = if self.config.blur_sigma > 0.0 {
            gaussian_blur_f32(&equalized, self.config.blur_sigma)
        } else {
            equalized
        };

        let mut mask = self.threshold(&smoothed);
        let ink = mask.pixels().filter(|p| p[0] != 0).count();
        if ink * 2 > (width as usize * height as usize) {
            debug!(ink, "ink is the majority class, inverting polarity");
            for p in mask.pixels_mut() {
                p[0] = 255 - p[0];
            }
        }

        if self.config.morphology {
            mask = morphology::close(&mask, Norm::LInf, 1);
            mask = morphology::close(&mask, Norm::LInf, 1);
            mask = morphology::open(&mask, Norm::LInf, 1);
            mask = morphology::close(&mask, Norm::LInf, 2);
            mask = morphology::dilate(&mask, Norm::LInf, 1);
        }

        remove_small_regions(&mut mask, self.config.min_ink_area);
        fill_small_holes(&mut mask, self.config.max_hole_area);

        if self.config.median_radius > 0 {
            mask = median_filter(&mask, self.config.median_radius, self.config.median_radius);
        }

        let result = InkMask::from_image(mask);
        debug!(
            width,
            height,
            ink_pixels = result.ink_count(),
            "ink classification complete"
        );
        result
    }

    /// Union of the inverted adaptive-mean and inverted Otsu thresholds.
    fn threshold(&self, image: &GrayImage) -> GrayImage {
        let radius = self.config.adaptive_radius;
        let local_mean = box_filter(image, radius, radius);
        let level = otsu_level(image);
        let offset = self.config.adaptive_offset;

        let mut mask = GrayImage::new(image.width(), image.height());
        for (x, y, p) in image.enumerate_pixels() {
            let value = p[0] as i16;
            let adaptive = value < local_mean.get_pixel(x, y)[0] as i16 - offset;
            let global = p[0] <= level;
            if adaptive || global {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        mask
    }
}

/// Clears ink regions smaller than `min_area` pixels.
fn remove_small_regions(mask: &mut GrayImage, min_area: usize) {
    if min_area <= 1 {
        return;
    }
    let regions = Regions::label(mask);
    for (x, y, p) in mask.enumerate_pixels_mut() {
        let label = regions.label_at(x, y);
        if label != 0 && regions.area(label) < min_area {
            p[0] = 0;
        }
    }
}

/// Fills enclosed background regions of at most `max_area` pixels.
fn fill_small_holes(mask: &mut GrayImage, max_area: usize) {
    if max_area == 0 {
        return;
    }
    let mut background = mask.clone();
    for p in background.pixels_mut() {
        p[0] = 255 - p[0];
    }
    let holes = Regions::label(&background);
    for (x, y, p) in mask.enumerate_pixels_mut() {
        let label = holes.label_at(x, y);
        if label != 0 && !holes.touches_border(label) && holes.area(label) <= max_area {
            p[0] = 255;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    fn page_with_rect(fg: u8, bg: u8) -> GrayImage {
        let mut page = GrayImage::from_pixel(200, 160, Luma([bg]));
        draw_filled_rect_mut(&mut page, Rect::at(60, 40).of_size(50, 70), Luma([fg]));
        page
    }

    #[test]
    fn test_dark_ink_on_light_paper() {
        let mask = InkClassifier::default().classify(&page_with_rect(10, 245));
        assert!(mask.is_ink(85, 75));
        assert!(!mask.is_ink(5, 5));
        assert!(!mask.is_ink(150, 140));
        let ink = mask.ink_count();
        assert!(ink > 3000 && ink < 4500, "ink pixels: {}", ink);
    }

    #[test]
    fn test_polarity_is_resolved() {
        let mask = InkClassifier::default().classify(&page_with_rect(245, 10));
        assert!(mask.is_ink(85, 75));
        assert!(!mask.is_ink(5, 5));
        assert!(mask.ink_count() * 2 < 200 * 160);
    }

    #[test]
    fn test_blank_page_has_no_ink() {
        let page = GrayImage::from_pixel(64, 64, Luma([250]));
        assert!(InkClassifier::default().classify(&page).is_empty());
    }

    #[test]
    fn test_specks_are_removed() {
        let mut page = page_with_rect(10, 245);
        draw_filled_rect_mut(&mut page, Rect::at(170, 20).of_size(3, 3), Luma([10]));
        let mask = InkClassifier::default().classify(&page);
        assert!(!mask.is_ink(171, 21));
        assert!(mask.is_ink(85, 75));
    }

    #[test]
    fn test_small_holes_are_filled() {
        let mut page = page_with_rect(10, 245);
        draw_filled_rect_mut(&mut page, Rect::at(80, 70).of_size(8, 8), Luma([245]));
        let mask = InkClassifier::default().classify(&page);
        assert!(mask.is_ink(84, 74));
    }

    #[test]
    fn test_large_holes_survive() {
        let mut page = GrayImage::from_pixel(240, 240, Luma([245]));
        draw_filled_rect_mut(&mut page, Rect::at(40, 40).of_size(160, 160), Luma([10]));
        draw_filled_rect_mut(&mut page, Rect::at(80, 80).of_size(80, 80), Luma([245]));
        let mask = InkClassifier::default().classify(&page);
        assert!(!mask.is_ink(120, 120));
        assert!(mask.is_ink(60, 120));
    }

    #[test]
    fn test_from_image_normalizes_values() {
        let mut image = GrayImage::new(2, 1);
        image.put_pixel(0, 0, Luma([7]));
        let mask = InkMask::from_image(image);
        assert_eq!(mask.as_image().get_pixel(0, 0)[0], 255);
        assert_eq!(mask.ink_count(), 1);
    }
}
