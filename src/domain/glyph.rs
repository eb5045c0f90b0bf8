//! Per-slot glyph records carried from assignment to font assembly.

use image::GrayImage;
use serde::Serialize;

use crate::domain::alphabet::AlphabetSlot;
use crate::domain::outline::Outline;
use crate::processors::geometry::BoundingBox;
use crate::processors::normalize::Placement;

/// Horizontal metrics of a compiled glyph, in font units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GlyphMetrics {
    pub advance_width: u16,
    pub left_bearing: i16,
    pub right_bearing: i16,
}

/// A filled slot: the source box, its normalized raster and traced outline.
///
/// Created when a box is assigned; the normalizer, the vectorizer and the font
/// assembler each fill in their part.
#[derive(Debug, Clone)]
pub struct GlyphRecord {
    pub slot: AlphabetSlot,
    /// The page region the glyph came from.
    pub source: BoundingBox,
    /// Normalized canvas, black ink on white.
    pub raster: GrayImage,
    /// Where the ink landed on the canvas.
    pub placement: Placement,
    /// Outline in canvas pixels, y-up.
    pub outline: Outline,
    /// Set by the font assembler.
    pub metrics: Option<GlyphMetrics>,
}

impl GlyphRecord {
    pub fn new(
        slot: AlphabetSlot,
        source: BoundingBox,
        raster: GrayImage,
        placement: Placement,
        outline: Outline,
    ) -> Self {
        Self {
            slot,
            source,
            raster,
            placement,
            outline,
            metrics: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.slot.name
    }

    pub fn codepoint(&self) -> char {
        self.slot.codepoint
    }
}
