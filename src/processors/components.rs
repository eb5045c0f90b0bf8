//! Connected-component extraction from an ink mask.
//!
//! Characters written as several disconnected strokes are merged by labelling a
//! morphologically closed copy of the mask, with a closing radius proportional to
//! the typical character height. The boxes still carry only the original ink
//! pixels, so the closing never adds ink to a glyph.

use imageproc::distance_transform::Norm;
use imageproc::morphology;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::config::{ConfigError, ConfigValidator};
use crate::processors::geometry::{BoundingBox, median};
use crate::processors::ink::InkMask;
use crate::processors::regions::Regions;

/// Parameters of the component extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentConfig {
    /// Regions shorter than this are ignored when estimating the median height.
    pub min_estimate_height: u32,
    /// Closing radius as a fraction of the median region height.
    pub merge_radius_factor: f32,
    /// Regions with fewer pixels than `min_area_factor × median_height²` are dropped.
    pub min_area_factor: f32,
}

impl Default for ComponentConfig {
    fn default() -> Self {
        Self {
            min_estimate_height: 3,
            merge_radius_factor: 0.08,
            min_area_factor: 0.02,
        }
    }
}

impl ConfigValidator for ComponentConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.validate_range_f32(self.merge_radius_factor, 0.0, 1.0, "extraction.merge_radius_factor")?;
        self.validate_range_f32(self.min_area_factor, 0.0, 1.0, "extraction.min_area_factor")?;
        Ok(())
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}

/// Result of component extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct Components {
    /// Boxes in raster-scan order of their first pixel.
    pub boxes: Vec<BoundingBox>,
    /// Median height of the raw regions, in pixels.
    pub median_height: f64,
}

impl Components {
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

/// Splits an [`InkMask`] into per-character bounding boxes.
#[derive(Debug, Clone, Default)]
pub struct ComponentExtractor {
    config: ComponentConfig,
}

impl ComponentExtractor {
    pub fn new(config: ComponentConfig) -> Self {
        Self { config }
    }

    /// Extracts the character regions of `mask`.
    ///
    /// An empty result means the mask has no usable ink; the caller decides whether
    /// that is fatal.
    pub fn extract(&self, mask: &InkMask) -> Components {
        let raw = Regions::label(mask.as_image());
        let raw_regions = raw.count();
        if raw_regions == 0 {
            return Components {
                boxes: Vec::new(),
                median_height: 0.0,
            };
        }

        let mut heights: Vec<f64> = raw
            .heights()
            .into_iter()
            .skip(1)
            .filter(|&h| h >= self.config.min_estimate_height)
            .map(f64::from)
            .collect();
        if heights.is_empty() {
            heights = raw.heights().into_iter().skip(1).map(f64::from).collect();
        }
        let median_height = median(&mut heights).unwrap_or(0.0);

        let radius = (self.config.merge_radius_factor as f64 * median_height)
            .round()
            .clamp(0.0, 255.0) as u8;
        let merged = if radius > 0 {
            let closed = morphology::close(mask.as_image(), Norm::LInf, radius);
            Regions::label(&closed)
        } else {
            raw
        };

        // Collect only the original ink under each merged label.
        let mut buckets: Vec<Vec<(u32, u32)>> = vec![Vec::new(); merged.count() + 1];
        for (x, y, p) in mask.as_image().enumerate_pixels() {
            if p[0] == 0 {
                continue;
            }
            let label = merged.label_at(x, y) as usize;
            if label != 0 {
                buckets[label].push((x, y));
            }
        }

        let (width, height) = mask.as_image().dimensions();
        let min_area = self.config.min_area_factor as f64 * median_height * median_height;
        let mut boxes: Vec<BoundingBox> = buckets
            .into_iter()
            .filter(|pixels| pixels.len() as f64 >= min_area)
            .filter_map(BoundingBox::from_pixels)
            .filter(|b| b.fits_within(width, height))
            .collect();
        boxes.sort_by_key(|b| b.pixels().first().map(|&(x, y)| (y, x)));

        debug!(
            raw_regions,
            median_height,
            merge_radius = radius,
            boxes = boxes.len(),
            "component extraction complete"
        );

        Components {
            boxes,
            median_height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    fn mask_with(rects: &[(i32, i32, u32, u32)]) -> InkMask {
        let mut image = GrayImage::new(300, 200);
        for &(x, y, w, h) in rects {
            draw_filled_rect_mut(&mut image, Rect::at(x, y).of_size(w, h), Luma([255]));
        }
        InkMask::from_image(image)
    }

    #[test]
    fn test_separate_letters_give_separate_boxes() {
        let mask = mask_with(&[(20, 20, 30, 50), (120, 20, 30, 50), (220, 30, 30, 40)]);
        let components = ComponentExtractor::default().extract(&mask);
        assert_eq!(components.boxes.len(), 3);
        assert_eq!(components.median_height, 50.0);
        let first = &components.boxes[0];
        assert_eq!((first.x, first.y, first.width, first.height), (20, 20, 30, 50));
        assert_eq!(first.pixel_count(), 1500);
    }

    #[test]
    fn test_nearby_strokes_are_merged() {
        // Two strokes 3 px apart; median height 50 gives a closing radius of 4.
        let mask = mask_with(&[(20, 20, 10, 50), (33, 20, 10, 50), (150, 20, 30, 50)]);
        let components = ComponentExtractor::default().extract(&mask);
        assert_eq!(components.boxes.len(), 2);
        let merged = &components.boxes[0];
        assert_eq!((merged.x, merged.width), (20, 23));
        // The gap between the strokes is not turned into ink.
        assert_eq!(merged.pixel_count(), 1000);
    }

    #[test]
    fn test_small_regions_are_dropped() {
        // Median height 60 gives an area floor of 72 pixels.
        let mask = mask_with(&[(20, 20, 30, 60), (120, 20, 30, 60), (250, 150, 8, 8)]);
        let components = ComponentExtractor::default().extract(&mask);
        assert_eq!(components.boxes.len(), 2);
    }

    #[test]
    fn test_boxes_stay_on_the_page() {
        // Ink touching the right and bottom edges.
        let mask = mask_with(&[(270, 150, 30, 50), (20, 20, 30, 50)]);
        let components = ComponentExtractor::default().extract(&mask);
        assert_eq!(components.boxes.len(), 2);
        for b in &components.boxes {
            assert!(b.fits_within(300, 200));
        }
        let edge = components.boxes.iter().find(|b| b.x == 270).unwrap();
        assert_eq!((edge.x_max(), edge.y_max()), (299, 199));
    }

    #[test]
    fn test_empty_mask() {
        let components = ComponentExtractor::default().extract(&InkMask::empty(50, 50));
        assert!(components.is_empty());
    }

    #[test]
    fn test_raster_scan_order() {
        let mask = mask_with(&[(200, 10, 30, 40), (20, 100, 30, 40), (100, 12, 30, 40)]);
        let boxes = ComponentExtractor::default().extract(&mask).boxes;
        let origins: Vec<(u32, u32)> = boxes.iter().map(|b| (b.x, b.y)).collect();
        assert_eq!(origins, vec![(200, 10), (100, 12), (20, 100)]);
    }
}
