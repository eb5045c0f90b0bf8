//! Duplicate detection for character boxes.
//!
//! A page scan sometimes yields the same letter twice: an exact re-detection, a box
//! found twice at one position, or a letter the writer redrew. [`DedupIndex`] keeps
//! the shapes accepted so far in one assignment run and rejects later boxes that
//! match one of them.

use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::core::config::{ConfigError, ConfigValidator};
use crate::processors::geometry::{BoundingBox, Point};

/// Hu moments below this magnitude are treated as zero before log scaling.
const HU_EPSILON: f64 = 1e-12;

/// Parameters of duplicate detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Boxes whose centres are closer than `reject_radius_factor × median_height`
    /// are re-detections.
    pub reject_radius_factor: f32,
    /// Maximum relative width and height difference for the shape comparison.
    pub size_tolerance: f32,
    /// Maximum L1 distance between log-scaled Hu moments for the shape comparison.
    pub moment_threshold: f32,
    /// Boxes at least this many times taller than wide count as thin letterforms.
    pub thin_aspect_ratio: f32,
    /// Apply the shape comparison to thin letterforms too.
    pub dedup_thin_glyphs: bool,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            reject_radius_factor: 0.25,
            size_tolerance: 0.05,
            moment_threshold: 0.1,
            thin_aspect_ratio: 3.0,
            dedup_thin_glyphs: false,
        }
    }
}

impl ConfigValidator for DedupConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.validate_range_f32(self.reject_radius_factor, 0.0, 10.0, "assignment.dedup.reject_radius_factor")?;
        self.validate_range_f32(self.size_tolerance, 0.0, 1.0, "assignment.dedup.size_tolerance")?;
        self.validate_range_f32(self.moment_threshold, 0.0, f32::MAX, "assignment.dedup.moment_threshold")?;
        self.validate_positive_f32(self.thin_aspect_ratio, "assignment.dedup.thin_aspect_ratio")
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}

/// Position-independent description of a box's ink.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeDescriptor {
    pub width: u32,
    pub height: u32,
    pub center: Point,
    /// Hash of the size and the ink pattern relative to the box origin.
    pub content_hash: u64,
    /// Log-scaled Hu moment invariants.
    pub hu: [f64; 7],
}

impl ShapeDescriptor {
    pub fn of(bbox: &BoundingBox) -> Self {
        let mut hasher = DefaultHasher::new();
        (bbox.width, bbox.height).hash(&mut hasher);
        for &(x, y) in bbox.pixels() {
            (x - bbox.x, y - bbox.y).hash(&mut hasher);
        }

        Self {
            width: bbox.width,
            height: bbox.height,
            center: bbox.center(),
            content_hash: hasher.finish(),
            hu: log_scaled(hu_moments(bbox)),
        }
    }

    fn aspect_ratio(&self) -> f64 {
        self.height as f64 / self.width as f64
    }
}

/// Why a box was rejected as a duplicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicateReason {
    /// Identical size and ink pattern.
    IdenticalContent,
    /// Centre coincides with an accepted box.
    SamePosition,
    /// Similar size and shape moments.
    SimilarShape,
}

impl std::fmt::Display for DuplicateReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DuplicateReason::IdenticalContent => "identical content",
            DuplicateReason::SamePosition => "same position",
            DuplicateReason::SimilarShape => "similar shape",
        };
        f.write_str(s)
    }
}

/// Outcome of offering a box to the index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DedupDecision {
    Accepted,
    Duplicate {
        reason: DuplicateReason,
        /// Index of the accepted entry it matched.
        of: usize,
    },
}

/// Accepted shapes of one assignment run.
#[derive(Debug)]
pub struct DedupIndex {
    config: DedupConfig,
    reject_radius: f64,
    accepted: Vec<ShapeDescriptor>,
    by_hash: HashMap<u64, usize>,
}

impl DedupIndex {
    /// Creates an empty index for a page whose median glyph height is `median_height`.
    pub fn new(config: DedupConfig, median_height: f64) -> Self {
        let reject_radius = config.reject_radius_factor as f64 * median_height;
        Self {
            config,
            reject_radius,
            accepted: Vec::new(),
            by_hash: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.accepted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }

    /// The `i`-th accepted shape.
    pub fn accepted(&self, i: usize) -> Option<&ShapeDescriptor> {
        self.accepted.get(i)
    }

    /// Checks `bbox` against every accepted shape and records it when it is new.
    pub fn offer(&mut self, bbox: &BoundingBox) -> DedupDecision {
        let shape = ShapeDescriptor::of(bbox);
        if let Some((reason, of)) = self.find_duplicate(&shape) {
            return DedupDecision::Duplicate { reason, of };
        }
        self.by_hash.insert(shape.content_hash, self.accepted.len());
        self.accepted.push(shape);
        DedupDecision::Accepted
    }

    fn find_duplicate(&self, shape: &ShapeDescriptor) -> Option<(DuplicateReason, usize)> {
        if let Some(&i) = self.by_hash.get(&shape.content_hash)
            && self.accepted[i].width == shape.width
            && self.accepted[i].height == shape.height
        {
            return Some((DuplicateReason::IdenticalContent, i));
        }

        if let Some(i) = self
            .accepted
            .iter()
            .position(|a| a.center.distance(&shape.center) < self.reject_radius)
        {
            return Some((DuplicateReason::SamePosition, i));
        }

        let thin = shape.aspect_ratio() >= self.config.thin_aspect_ratio as f64;
        if thin && !self.config.dedup_thin_glyphs {
            return None;
        }
        self.accepted
            .iter()
            .position(|a| self.similar_shape(a, shape))
            .map(|i| (DuplicateReason::SimilarShape, i))
    }

    fn similar_shape(&self, a: &ShapeDescriptor, b: &ShapeDescriptor) -> bool {
        let tol = self.config.size_tolerance as f64;
        let close = |p: u32, q: u32| {
            let (p, q) = (p as f64, q as f64);
            (p - q).abs() <= tol * p.max(q)
        };
        if !close(a.width, b.width) || !close(a.height, b.height) {
            return false;
        }
        let distance: f64 = a.hu.iter().zip(&b.hu).map(|(x, y)| (x - y).abs()).sum();
        distance < self.config.moment_threshold as f64
    }
}

/// The seven Hu moment invariants of the box's ink.
fn hu_moments(bbox: &BoundingBox) -> [f64; 7] {
    let pixels = bbox.pixels();
    let m00 = pixels.len() as f64;
    if m00 == 0.0 {
        return [0.0; 7];
    }
    let (mut sx, mut sy) = (0.0, 0.0);
    for &(x, y) in pixels {
        sx += (x - bbox.x) as f64;
        sy += (y - bbox.y) as f64;
    }
    let (cx, cy) = (sx / m00, sy / m00);

    let (mut mu20, mut mu02, mut mu11) = (0.0, 0.0, 0.0);
    let (mut mu30, mut mu03, mut mu21, mut mu12) = (0.0, 0.0, 0.0, 0.0);
    for &(x, y) in pixels {
        let dx = (x - bbox.x) as f64 - cx;
        let dy = (y - bbox.y) as f64 - cy;
        mu20 += dx * dx;
        mu02 += dy * dy;
        mu11 += dx * dy;
        mu30 += dx * dx * dx;
        mu03 += dy * dy * dy;
        mu21 += dx * dx * dy;
        mu12 += dx * dy * dy;
    }

    let n2 = m00.powi(2);
    let n3 = m00.powf(2.5);
    let (n20, n02, n11) = (mu20 / n2, mu02 / n2, mu11 / n2);
    let (n30, n03, n21, n12) = (mu30 / n3, mu03 / n3, mu21 / n3, mu12 / n3);

    let a = n30 + n12;
    let b = n21 + n03;
    [
        n20 + n02,
        (n20 - n02).powi(2) + 4.0 * n11 * n11,
        (n30 - 3.0 * n12).powi(2) + (3.0 * n21 - n03).powi(2),
        a * a + b * b,
        (n30 - 3.0 * n12) * a * (a * a - 3.0 * b * b)
            + (3.0 * n21 - n03) * b * (3.0 * a * a - b * b),
        (n20 - n02) * (a * a - b * b) + 4.0 * n11 * a * b,
        (3.0 * n21 - n03) * a * (a * a - 3.0 * b * b) - (n30 - 3.0 * n12) * b * (3.0 * a * a - b * b),
    ]
}

/// `sign(h) · log10(|h| / ε)`, with magnitudes below ε mapped to zero.
fn log_scaled(hu: [f64; 7]) -> [f64; 7] {
    hu.map(|h| {
        if h.abs() < HU_EPSILON {
            0.0
        } else {
            h.signum() * (h.abs() / HU_EPSILON).log10()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn l_shape(x: u32, y: u32, w: u32, h: u32) -> BoundingBox {
        let mut pixels = Vec::new();
        for py in y..y + h {
            for px in x..x + w {
                if px < x + 6 || py >= y + h - 6 {
                    pixels.push((px, py));
                }
            }
        }
        BoundingBox::from_pixels(pixels).unwrap()
    }

    #[test]
    fn test_identical_content_is_rejected() {
        let mut index = DedupIndex::new(DedupConfig::default(), 50.0);
        assert_eq!(index.offer(&l_shape(10, 10, 30, 50)), DedupDecision::Accepted);
        assert_eq!(
            index.offer(&l_shape(400, 300, 30, 50)),
            DedupDecision::Duplicate {
                reason: DuplicateReason::IdenticalContent,
                of: 0
            }
        );
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_same_position_is_rejected() {
        let mut index = DedupIndex::new(DedupConfig::default(), 50.0);
        index.offer(&BoundingBox::solid(100, 100, 30, 50));
        let decision = index.offer(&l_shape(102, 98, 40, 52));
        assert_eq!(
            decision,
            DedupDecision::Duplicate {
                reason: DuplicateReason::SamePosition,
                of: 0
            }
        );
    }

    #[test]
    fn test_similar_shape_is_rejected() {
        let mut index = DedupIndex::new(DedupConfig::default(), 50.0);
        index.offer(&l_shape(10, 10, 40, 60));
        // The same letter redrawn elsewhere with one pixel missing.
        let mut pixels = l_shape(300, 10, 40, 60).pixels().to_vec();
        pixels.retain(|&p| p != (302, 12));
        let redrawn = BoundingBox::from_pixels(pixels).unwrap();
        let decision = index.offer(&redrawn);
        assert!(matches!(
            decision,
            DedupDecision::Duplicate {
                reason: DuplicateReason::SimilarShape,
                ..
            }
        ));
    }

    #[test]
    fn test_different_sizes_are_kept() {
        let mut index = DedupIndex::new(DedupConfig::default(), 50.0);
        index.offer(&BoundingBox::solid(10, 10, 30, 40));
        assert_eq!(index.offer(&BoundingBox::solid(200, 10, 44, 40)), DedupDecision::Accepted);
        assert_eq!(index.offer(&BoundingBox::solid(400, 10, 30, 50)), DedupDecision::Accepted);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_thin_glyphs_skip_shape_check() {
        let mut index = DedupIndex::new(DedupConfig::default(), 60.0);
        index.offer(&BoundingBox::solid(10, 10, 10, 60));
        assert_eq!(index.offer(&BoundingBox::solid(200, 10, 10, 61)), DedupDecision::Accepted);

        let config = DedupConfig {
            dedup_thin_glyphs: true,
            ..DedupConfig::default()
        };
        let mut strict = DedupIndex::new(config, 60.0);
        strict.offer(&BoundingBox::solid(10, 10, 10, 60));
        assert!(matches!(
            strict.offer(&BoundingBox::solid(200, 10, 10, 61)),
            DedupDecision::Duplicate { .. }
        ));
    }

    #[test]
    fn test_hu_moments_are_translation_invariant() {
        let a = ShapeDescriptor::of(&l_shape(0, 0, 30, 40));
        let b = ShapeDescriptor::of(&l_shape(77, 13, 30, 40));
        assert_eq!(a.hu, b.hu);
        assert_eq!(a.content_hash, b.content_hash);
    }
}
