//! Geometric primitives shared by the page-analysis stages.
//!
//! [`BoundingBox`] is the unit passed from component extraction through row
//! clustering and slot assignment to the normalizer. It keeps the list of ink
//! pixels it encloses, so later stages never need the page image again.

use image::{GrayImage, Luma};
use serde::{Deserialize, Serialize};

/// A 2D point with floating-point coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X-coordinate of the point.
    pub x: f64,
    /// Y-coordinate of the point.
    pub y: f64,
}

impl Point {
    /// Creates a new point with the given coordinates.
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[inline]
    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// An axis-aligned region of ink on the page plus the ink pixels it encloses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge in page pixels.
    pub x: u32,
    /// Top edge in page pixels.
    pub y: u32,
    /// Width in pixels, always > 0.
    pub width: u32,
    /// Height in pixels, always > 0.
    pub height: u32,
    /// Page coordinates of the ink pixels, in row-major order.
    #[serde(skip)]
    pixels: Vec<(u32, u32)>,
}

impl BoundingBox {
    /// Builds a box from the ink pixels of one region.
    ///
    /// Returns `None` when `pixels` is empty. Pixels are sorted into row-major order
    /// and duplicates are dropped.
    pub fn from_pixels(mut pixels: Vec<(u32, u32)>) -> Option<Self> {
        let first = *pixels.first()?;
        let (mut x_min, mut y_min, mut x_max, mut y_max) = (first.0, first.1, first.0, first.1);
        for &(x, y) in &pixels {
            x_min = x_min.min(x);
            x_max = x_max.max(x);
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }
        pixels.sort_unstable_by_key(|&(x, y)| (y, x));
        pixels.dedup();
        Some(Self {
            x: x_min,
            y: y_min,
            width: x_max - x_min + 1,
            height: y_max - y_min + 1,
            pixels,
        })
    }

    /// Creates a solid rectangular box; every pixel inside is ink.
    pub fn solid(x: u32, y: u32, width: u32, height: u32) -> Self {
        let mut pixels = Vec::with_capacity((width * height) as usize);
        for py in y..y + height {
            for px in x..x + width {
                pixels.push((px, py));
            }
        }
        Self {
            x,
            y,
            width: width.max(1),
            height: height.max(1),
            pixels,
        }
    }

    /// Rightmost covered column (inclusive).
    pub fn x_max(&self) -> u32 {
        self.x + self.width - 1
    }

    /// Bottom covered row (inclusive).
    pub fn y_max(&self) -> u32 {
        self.y + self.height - 1
    }

    /// Centre of the box.
    pub fn center(&self) -> Point {
        Point::new(
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }

    /// Area of the box rectangle.
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Number of ink pixels enclosed.
    pub fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    /// Ink pixels in page coordinates.
    pub fn pixels(&self) -> &[(u32, u32)] {
        &self.pixels
    }

    /// Height divided by width.
    pub fn aspect_ratio(&self) -> f64 {
        self.height as f64 / self.width as f64
    }

    /// Whether the box lies entirely inside a `width × height` page.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x_max() < width && self.y_max() < height
    }

    /// Renders the enclosed ink into a fresh mask (ink = 255) with `padding` pixels
    /// of background on every side.
    pub fn render_mask(&self, padding: u32) -> GrayImage {
        let mut mask = GrayImage::new(self.width + 2 * padding, self.height + 2 * padding);
        for &(px, py) in &self.pixels {
            mask.put_pixel(px - self.x + padding, py - self.y + padding, Luma([255]));
        }
        mask
    }
}

/// Median of a list of values; `None` for an empty list.
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Median box height; `None` for no boxes.
pub fn median_height(boxes: &[BoundingBox]) -> Option<f64> {
    let mut heights: Vec<f64> = boxes.iter().map(|b| b.height as f64).collect();
    median(&mut heights)
}

/// Simplifies an open polyline with the Douglas-Peucker algorithm.
///
/// The first and last points are always kept.
pub fn douglas_peucker(points: &[Point], epsilon: f64) -> Vec<Point> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let mut stack = vec![(0, points.len() - 1)];
    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[points.len() - 1] = true;

    while let Some((start, end)) = stack.pop() {
        if end - start <= 1 {
            continue;
        }

        let mut max_dist = 0.0;
        let mut max_index = start;
        for i in (start + 1)..end {
            let dist = point_to_line_distance(&points[i], &points[start], &points[end]);
            if dist > max_dist {
                max_dist = dist;
                max_index = i;
            }
        }

        if max_dist > epsilon {
            keep[max_index] = true;
            if max_index - start > 1 {
                stack.push((start, max_index));
            }
            if end - max_index > 1 {
                stack.push((max_index, end));
            }
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}

/// Perpendicular distance from `point` to the line through `line_start` and `line_end`.
///
/// Degenerates to the point distance when the line has zero length.
pub fn point_to_line_distance(point: &Point, line_start: &Point, line_end: &Point) -> f64 {
    let a = line_end.y - line_start.y;
    let b = line_start.x - line_end.x;
    let c = line_end.x * line_start.y - line_start.x * line_end.y;

    let denominator = (a * a + b * b).sqrt();
    if denominator == 0.0 {
        return point.distance(line_start);
    }

    (a * point.x + b * point.y + c).abs() / denominator
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pixels_extent() {
        let bbox = BoundingBox::from_pixels(vec![(5, 9), (3, 4), (7, 6)]).unwrap();
        assert_eq!((bbox.x, bbox.y, bbox.width, bbox.height), (3, 4, 5, 6));
        assert_eq!(bbox.pixels()[0], (3, 4));
        assert_eq!(bbox.pixel_count(), 3);
        assert!(BoundingBox::from_pixels(Vec::new()).is_none());
    }

    #[test]
    fn test_center_and_aspect() {
        let bbox = BoundingBox::solid(10, 20, 4, 12);
        assert_eq!(bbox.center(), Point::new(12.0, 26.0));
        assert_eq!(bbox.aspect_ratio(), 3.0);
        assert_eq!(bbox.pixel_count(), 48);
        assert!(bbox.fits_within(14, 32));
        assert!(!bbox.fits_within(13, 32));
    }

    #[test]
    fn test_render_mask_with_padding() {
        let bbox = BoundingBox::from_pixels(vec![(10, 10), (11, 10)]).unwrap();
        let mask = bbox.render_mask(2);
        assert_eq!(mask.dimensions(), (6, 5));
        assert_eq!(mask.get_pixel(2, 2)[0], 255);
        assert_eq!(mask.get_pixel(3, 2)[0], 255);
        assert_eq!(mask.get_pixel(0, 0)[0], 0);
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&mut [4.0, 1.0, 2.0, 3.0]), Some(2.5));
        assert_eq!(median(&mut []), None);
    }

    #[test]
    fn test_douglas_peucker_drops_collinear() {
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.1),
            Point::new(2.0, 0.0),
            Point::new(3.0, 5.0),
        ];
        let simplified = douglas_peucker(&points, 0.5);
        assert_eq!(
            simplified,
            vec![Point::new(0.0, 0.0), Point::new(2.0, 0.0), Point::new(3.0, 5.0)]
        );
    }
}
