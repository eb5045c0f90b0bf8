//! Connected-region labelling over binary masks.

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::region_labelling::{Connectivity, connected_components};

/// 8-connected labelling of the non-zero pixels of a binary mask.
///
/// Label 0 is the background; labels `1..=count` are regions.
pub(crate) struct Regions {
    labels: ImageBuffer<Luma<u32>, Vec<u32>>,
    areas: Vec<usize>,
    touches_border: Vec<bool>,
}

impl Regions {
    /// Labels every non-zero pixel of `mask`.
    pub(crate) fn label(mask: &GrayImage) -> Self {
        let labels = connected_components(mask, Connectivity::Eight, Luma([0u8]));
        let count = labels.pixels().map(|p| p[0]).max().unwrap_or(0) as usize;
        let (width, height) = mask.dimensions();

        let mut areas = vec![0usize; count + 1];
        let mut touches_border = vec![false; count + 1];
        for (x, y, p) in labels.enumerate_pixels() {
            let label = p[0] as usize;
            if label == 0 {
                continue;
            }
            areas[label] += 1;
            if x == 0 || y == 0 || x + 1 == width || y + 1 == height {
                touches_border[label] = true;
            }
        }

        Self {
            labels,
            areas,
            touches_border,
        }
    }

    /// Number of labelled regions.
    pub(crate) fn count(&self) -> usize {
        self.areas.len().saturating_sub(1)
    }

    /// Label at a pixel; 0 for background.
    #[inline]
    pub(crate) fn label_at(&self, x: u32, y: u32) -> u32 {
        self.labels.get_pixel(x, y)[0]
    }

    /// Pixel area of a region.
    pub(crate) fn area(&self, label: u32) -> usize {
        self.areas.get(label as usize).copied().unwrap_or(0)
    }

    /// Whether a region reaches the mask border.
    pub(crate) fn touches_border(&self, label: u32) -> bool {
        self.touches_border.get(label as usize).copied().unwrap_or(false)
    }

    /// Bounding height of every region, indexed by label.
    pub(crate) fn heights(&self) -> Vec<u32> {
        let n = self.areas.len();
        let mut top = vec![u32::MAX; n];
        let mut bottom = vec![0u32; n];
        for (_, y, p) in self.labels.enumerate_pixels() {
            let label = p[0] as usize;
            if label != 0 {
                top[label] = top[label].min(y);
                bottom[label] = bottom[label].max(y);
            }
        }
        top.iter()
            .zip(&bottom)
            .map(|(&t, &b)| if t == u32::MAX { 0 } else { b - t + 1 })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_from(rows: &[&str]) -> GrayImage {
        let mut mask = GrayImage::new(rows[0].len() as u32, rows.len() as u32);
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                if c == '#' {
                    mask.put_pixel(x as u32, y as u32, Luma([255]));
                }
            }
        }
        mask
    }

    #[test]
    fn test_diagonal_pixels_are_connected() {
        let mask = mask_from(&["#....", ".#...", "....#", "....#"]);
        let regions = Regions::label(&mask);
        assert_eq!(regions.count(), 2);
        let first = regions.label_at(0, 0);
        assert_eq!(regions.label_at(1, 1), first);
        assert_eq!(regions.area(first), 2);
    }

    #[test]
    fn test_border_and_heights() {
        let mask = mask_from(&[".....", ".##..", ".##..", "....#"]);
        let regions = Regions::label(&mask);
        let inner = regions.label_at(1, 1);
        let corner = regions.label_at(4, 3);
        assert!(!regions.touches_border(inner));
        assert!(regions.touches_border(corner));
        let heights = regions.heights();
        assert_eq!(heights[inner as usize], 2);
        assert_eq!(regions.area(inner), 4);
    }
}
