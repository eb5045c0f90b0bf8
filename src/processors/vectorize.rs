//! Raster-to-outline tracing.
//!
//! Boundaries are followed on the pixel-corner grid rather than through pixel
//! centres, so a filled rectangle of `w × h` pixels traces to a contour of area
//! exactly `w·h`. Nested boundaries are separated by XOR-filling the interior of
//! every traced path before the scan continues. Traced polygons are simplified
//! with Douglas-Peucker and gentle vertices are turned into quadratic control
//! points.

use image::GrayImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::config::{ConfigError, ConfigValidator};
use crate::core::errors::GlyphError;
use crate::domain::alphabet::AlphabetSlot;
use crate::domain::outline::{Contour, Outline, OutlinePoint};
use crate::processors::geometry::{Point, douglas_peucker};

/// Parameters of the outline tracer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    /// Pixels darker than this are ink.
    pub ink_threshold: u8,
    /// Contours enclosing less than this many square pixels are dropped.
    pub min_contour_area: f64,
    /// Douglas-Peucker tolerance in pixels.
    pub simplify_epsilon: f64,
    /// Vertices turning by less than this many degrees become curve control points.
    pub corner_angle: f64,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            ink_threshold: 128,
            min_contour_area: 4.0,
            simplify_epsilon: 1.0,
            corner_angle: 60.0,
        }
    }
}

impl ConfigValidator for TraceConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.min_contour_area.is_nan() || self.min_contour_area < 0.0 {
            return Err(ConfigError::invalid("trace.min_contour_area must be >= 0"));
        }
        if self.simplify_epsilon.is_nan() || self.simplify_epsilon < 0.0 {
            return Err(ConfigError::invalid("trace.simplify_epsilon must be >= 0"));
        }
        self.validate_range_f32(self.corner_angle as f32, 0.0, 180.0, "trace.corner_angle")
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}

/// A closed boundary on the pixel-corner grid, y-up.
#[derive(Debug, Clone, PartialEq)]
struct CornerPath {
    points: Vec<(i32, i32)>,
    /// `true` for an outer boundary, `false` for a hole.
    outer: bool,
}

/// Binary bitmap with y-up rows: row 0 is the bottom of the image.
struct Bitmap {
    bits: Vec<bool>,
    width: i32,
    height: i32,
}

impl Bitmap {
    fn from_raster(raster: &GrayImage, threshold: u8) -> Self {
        let (w, h) = raster.dimensions();
        let mut bitmap = Self {
            bits: vec![false; (w as usize) * (h as usize)],
            width: w as i32,
            height: h as i32,
        };
        for (x, y, p) in raster.enumerate_pixels() {
            if p[0] < threshold {
                let row = bitmap.height - 1 - y as i32;
                let i = bitmap.index(x as i32, row);
                bitmap.bits[i] = true;
            }
        }
        bitmap
    }

    /// Offset of an in-bounds pixel.
    #[inline]
    fn index(&self, x: i32, y: i32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    #[inline]
    fn get(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height && self.bits[self.index(x, y)]
    }

    fn flip_row_from(&mut self, x: i32, y: i32) {
        if y < 0 || y >= self.height {
            return;
        }
        let start = self.index(x.max(0), y);
        let end = self.index(0, y + 1);
        for bit in &mut self.bits[start..end] {
            *bit = !*bit;
        }
    }
}

/// Traces normalized glyph rasters into outlines.
#[derive(Debug, Clone, Default)]
pub struct OutlineVectorizer {
    config: TraceConfig,
}

impl OutlineVectorizer {
    pub fn new(config: TraceConfig) -> Self {
        Self { config }
    }

    /// Traces the ink of `raster` (dark on light) into an outline in raster pixel
    /// units, y-up, origin at the bottom-left corner.
    pub fn trace(&self, slot: &AlphabetSlot, raster: &GrayImage) -> Result<Outline, GlyphError> {
        let paths = decompose(raster, self.config.ink_threshold, self.config.min_contour_area);
        if paths.is_empty() {
            return Err(GlyphError::TraceFailed {
                slot: slot.name.clone(),
                reason: format!(
                    "no contour encloses at least {} square pixels",
                    self.config.min_contour_area
                ),
            });
        }

        let contours: Vec<Contour> = paths
            .iter()
            .filter_map(|path| self.smooth(path))
            .collect();
        if contours.is_empty() {
            return Err(GlyphError::TraceFailed {
                slot: slot.name.clone(),
                reason: "every contour collapsed during simplification".to_string(),
            });
        }

        let outline = Outline::new(contours);
        debug!(
            slot = %slot.name,
            contours = outline.contours.len(),
            points = outline.point_count(),
            "outline traced"
        );
        Ok(outline)
    }

    /// Simplifies a corner path and classifies its vertices as corners or curve
    /// control points. `None` when fewer than three vertices survive.
    fn smooth(&self, path: &CornerPath) -> Option<Contour> {
        let corners = drop_collinear(&path.points);
        let simplified = simplify_closed(&corners, self.config.simplify_epsilon);
        if simplified.len() < 3 {
            return None;
        }

        let n = simplified.len();
        let points = (0..n)
            .map(|i| {
                let prev = simplified[(i + n - 1) % n];
                let cur = simplified[i];
                let next = simplified[(i + 1) % n];
                if turn_angle(prev, cur, next) < self.config.corner_angle {
                    OutlinePoint::off(cur.x, cur.y)
                } else {
                    OutlinePoint::on(cur.x, cur.y)
                }
            })
            .collect();

        let mut contour = Contour::new(points);
        let area = contour.signed_area();
        if (path.outer && area < 0.0) || (!path.outer && area > 0.0) {
            contour = contour.reversed();
        }
        Some(contour)
    }
}

/// Extracts every boundary of the ink in `raster`.
fn decompose(raster: &GrayImage, threshold: u8, min_area: f64) -> Vec<CornerPath> {
    let mut bitmap = Bitmap::from_raster(raster, threshold);
    let original = bitmap.bits.clone();
    let mut paths = Vec::new();

    // Scan from the top row down, left to right.
    for y in (0..bitmap.height).rev() {
        for x in 0..bitmap.width {
            if !bitmap.get(x, y) {
                continue;
            }
            let outer = original[bitmap.index(x, y)];
            let path = find_path(&bitmap, x, y + 1, outer);
            xor_path(&mut bitmap, &path);
            if shoelace(&path.points).abs() >= min_area {
                paths.push(path);
            }
        }
    }
    paths
}

/// Follows one boundary starting at the top-left corner of a set pixel, keeping
/// set pixels on the left. Diagonal ambiguities join ink pixels on outer
/// boundaries and split them on holes, so ink is 8-connected.
fn find_path(bitmap: &Bitmap, x0: i32, y0: i32, outer: bool) -> CornerPath {
    let (mut x, mut y) = (x0, y0);
    let (mut dx, mut dy) = (0i32, -1i32);
    let mut points = Vec::new();

    loop {
        points.push((x, y));
        x += dx;
        y += dy;
        if x == x0 && y == y0 {
            break;
        }

        let ahead_right = bitmap.get(x + (dx + dy - 1) / 2, y + (dy - dx - 1) / 2);
        let ahead_left = bitmap.get(x + (dx - dy - 1) / 2, y + (dy + dx - 1) / 2);
        let turn_right = match (ahead_right, ahead_left) {
            (true, false) => Some(outer),
            (true, true) => Some(true),
            (false, false) => Some(false),
            (false, true) => None,
        };
        if let Some(right) = turn_right {
            (dx, dy) = if right { (dy, -dx) } else { (-dy, dx) };
        }
    }

    CornerPath { points, outer }
}

/// Inverts every pixel enclosed by `path`.
fn xor_path(bitmap: &mut Bitmap, path: &CornerPath) {
    let n = path.points.len();
    let mut y_prev = path.points[n - 1].1;
    for &(x, y) in &path.points {
        if y != y_prev {
            bitmap.flip_row_from(x, y.min(y_prev));
        }
        y_prev = y;
    }
}

fn shoelace(points: &[(i32, i32)]) -> f64 {
    let n = points.len();
    let twice: i64 = (0..n)
        .map(|i| {
            let (x0, y0) = points[i];
            let (x1, y1) = points[(i + 1) % n];
            x0 as i64 * y1 as i64 - x1 as i64 * y0 as i64
        })
        .sum();
    twice as f64 / 2.0
}

/// Keeps only the vertices where the path changes direction.
fn drop_collinear(points: &[(i32, i32)]) -> Vec<Point> {
    let n = points.len();
    (0..n)
        .filter(|&i| {
            let (px, py) = points[(i + n - 1) % n];
            let (cx, cy) = points[i];
            let (nx, ny) = points[(i + 1) % n];
            (cx - px) * (ny - cy) - (cy - py) * (nx - cx) != 0
        })
        .map(|i| Point::new(points[i].0 as f64, points[i].1 as f64))
        .collect()
}

/// Douglas-Peucker on a closed polygon, split at the vertex farthest from the
/// first one.
fn simplify_closed(points: &[Point], epsilon: f64) -> Vec<Point> {
    if points.len() <= 3 || epsilon <= 0.0 {
        return points.to_vec();
    }
    let far = (1..points.len())
        .max_by(|&a, &b| {
            points[0]
                .distance(&points[a])
                .total_cmp(&points[0].distance(&points[b]))
        })
        .unwrap_or(points.len() / 2);

    let mut first = douglas_peucker(&points[..=far], epsilon);
    let mut second_half: Vec<Point> = points[far..].to_vec();
    second_half.push(points[0]);
    let second = douglas_peucker(&second_half, epsilon);

    // Both halves share their end points.
    first.pop();
    first.extend_from_slice(&second[..second.len() - 1]);
    first
}

/// Turning angle at `cur` in degrees; 0 for a straight continuation.
fn turn_angle(prev: Point, cur: Point, next: Point) -> f64 {
    let (ux, uy) = (cur.x - prev.x, cur.y - prev.y);
    let (vx, vy) = (next.x - cur.x, next.y - cur.y);
    let norm = (ux * ux + uy * uy).sqrt() * (vx * vx + vy * vy).sqrt();
    if norm == 0.0 {
        return 0.0;
    }
    ((ux * vx + uy * vy) / norm).clamp(-1.0, 1.0).acos().to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::alphabet::{Alphabet, SlotSpec};
    use image::Luma;
    use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
    use imageproc::rect::Rect;

    fn slot() -> AlphabetSlot {
        Alphabet::from_specs(&[SlotSpec::new("bet", 'ב')]).unwrap().slots()[0].clone()
    }

    fn canvas() -> GrayImage {
        GrayImage::from_pixel(200, 200, Luma([255]))
    }

    #[test]
    fn test_square_round_trips_with_exact_area() {
        let mut raster = canvas();
        draw_filled_rect_mut(&mut raster, Rect::at(50, 60).of_size(40, 30), Luma([0]));
        let outline = OutlineVectorizer::default().trace(&slot(), &raster).unwrap();
        assert_eq!(outline.contours.len(), 1);
        assert_eq!(outline.contours[0].points.len(), 4);
        assert!(outline.contours[0].points.iter().all(|p| p.on_curve));
        assert!((outline.area() - 1200.0).abs() < 12.0);

        // y-up: image rows 60..90 sit 110..140 above the bottom edge.
        let bounds = outline.bounds().unwrap();
        assert_eq!((bounds.x0, bounds.y0, bounds.x1, bounds.y1), (50.0, 110.0, 90.0, 140.0));
    }

    #[test]
    fn test_ring_has_opposite_orientations() {
        let mut raster = canvas();
        draw_filled_rect_mut(&mut raster, Rect::at(40, 40).of_size(100, 100), Luma([0]));
        draw_filled_rect_mut(&mut raster, Rect::at(70, 70).of_size(40, 40), Luma([255]));
        let outline = OutlineVectorizer::default().trace(&slot(), &raster).unwrap();
        assert_eq!(outline.contours.len(), 2);
        let areas: Vec<f64> = outline.contours.iter().map(|c| c.signed_area()).collect();
        assert!(areas.iter().any(|&a| (a - 10000.0).abs() < 1e-6));
        assert!(areas.iter().any(|&a| (a + 1600.0).abs() < 1e-6));
        assert!((outline.area() - 8400.0).abs() < 1e-6);
    }

    #[test]
    fn test_separate_blobs_and_diagonal_join() {
        let mut raster = canvas();
        draw_filled_rect_mut(&mut raster, Rect::at(10, 10).of_size(20, 20), Luma([0]));
        draw_filled_rect_mut(&mut raster, Rect::at(30, 30).of_size(20, 20), Luma([0]));
        draw_filled_rect_mut(&mut raster, Rect::at(120, 120).of_size(30, 30), Luma([0]));
        let outline = OutlineVectorizer::default().trace(&slot(), &raster).unwrap();
        // The first two squares touch at a corner and trace as one boundary.
        assert_eq!(outline.contours.len(), 2);
        assert!((outline.area() - 1700.0).abs() < 1e-6);
    }

    #[test]
    fn test_disc_is_smoothed() {
        let mut raster = canvas();
        draw_filled_circle_mut(&mut raster, (100, 100), 60, Luma([0]));
        let outline = OutlineVectorizer::default().trace(&slot(), &raster).unwrap();
        assert_eq!(outline.contours.len(), 1);
        let contour = &outline.contours[0];
        assert!(contour.points.iter().any(|p| !p.on_curve));
        let expected = std::f64::consts::PI * 60.0 * 60.0;
        assert!((outline.area() - expected).abs() / expected < 0.05, "area {}", outline.area());
        assert!(contour.signed_area() > 0.0);
    }

    #[test]
    fn test_blank_raster_fails() {
        let err = OutlineVectorizer::default().trace(&slot(), &canvas()).unwrap_err();
        assert!(matches!(err, GlyphError::TraceFailed { .. }));
    }

    #[test]
    fn test_specks_below_min_area_are_dropped() {
        let mut raster = canvas();
        raster.put_pixel(5, 5, Luma([0]));
        draw_filled_rect_mut(&mut raster, Rect::at(50, 50).of_size(10, 10), Luma([0]));
        let outline = OutlineVectorizer::default().trace(&slot(), &raster).unwrap();
        assert_eq!(outline.contours.len(), 1);
    }

    #[test]
    fn test_turn_angle() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(1.0, 0.0);
        assert!((turn_angle(a, b, Point::new(2.0, 0.0))).abs() < 1e-9);
        assert!((turn_angle(a, b, Point::new(1.0, 1.0)) - 90.0).abs() < 1e-9);
    }
}
