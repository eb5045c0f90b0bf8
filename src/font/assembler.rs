//! Conversion of traced glyph records into a compiled TrueType font.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::core::errors::GlyphError;
use crate::core::{FontError, FontResult};
use crate::domain::glyph::{GlyphMetrics, GlyphRecord};
use crate::domain::outline::Outline;
use crate::font::FontMetricsConfig;
use crate::font::glyf::{FontGlyph, GlyphPoint};
use crate::font::tables;

/// Maps canvas outlines to font units and lays out horizontal metrics.
#[derive(Debug, Clone)]
pub struct FontAssembler {
    metrics: FontMetricsConfig,
    canvas_size: u32,
}

/// The ordered glyph set of a font, ready to compile.
#[derive(Debug, Clone)]
pub struct FontAssembly {
    /// `.notdef`, `space`, then the slot glyphs in alphabet order.
    pub glyphs: Vec<FontGlyph>,
    pub metrics: FontMetricsConfig,
    /// Records that made it into the font, with metrics filled in.
    pub records: Vec<GlyphRecord>,
    /// Records left out because a coordinate or metric does not fit in 16 bits.
    pub excluded: Vec<(GlyphRecord, GlyphError)>,
}

/// A compiled font binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledFont {
    pub data: Vec<u8>,
    pub glyph_count: usize,
    pub family_name: String,
}

impl FontAssembler {
    pub fn new(metrics: FontMetricsConfig, canvas_size: u32) -> Self {
        Self {
            metrics,
            canvas_size,
        }
    }

    /// Pixel to font unit scale.
    pub fn scale(&self) -> f64 {
        self.metrics.em_height() as f64 / self.canvas_size.max(1) as f64
    }

    /// Builds the glyph set and records each glyph's metrics on its record.
    ///
    /// A record whose outline leaves the 16-bit font coordinate space is moved to
    /// [`FontAssembly::excluded`]; the others still make up the font.
    pub fn assemble(&self, mut records: Vec<GlyphRecord>) -> FontResult<FontAssembly> {
        records.sort_by_key(|r| r.slot.index);

        let default_advance = self.metrics.default_advance;
        let mut glyphs = Vec::with_capacity(records.len() + 2);
        glyphs.push(FontGlyph::empty(".notdef", None, default_advance));
        glyphs.push(FontGlyph::empty("space", Some(' '), default_advance));

        let mut included = Vec::with_capacity(records.len());
        let mut excluded = Vec::new();
        for mut record in records {
            let (glyph, metrics) = match self.convert(&record) {
                Ok(converted) => converted,
                Err(error) => {
                    warn!(slot = %error.slot(), %error, "glyph left out of the font");
                    excluded.push((record, error));
                    continue;
                }
            };
            debug!(
                slot = %record.slot.name,
                codepoint = %format!("U+{:04X}", record.codepoint() as u32),
                contours = glyph.contours.len(),
                points = glyph.point_count(),
                advance = metrics.advance_width,
                lsb = metrics.left_bearing,
                rsb = metrics.right_bearing,
                "glyph assembled"
            );
            record.metrics = Some(metrics);
            glyphs.push(glyph);
            included.push(record);
        }

        if included.is_empty() {
            return Err(FontError::NoGlyphsProduced);
        }

        Ok(FontAssembly {
            glyphs,
            metrics: self.metrics.clone(),
            records: included,
            excluded,
        })
    }

    fn convert(&self, record: &GlyphRecord) -> Result<(FontGlyph, GlyphMetrics), GlyphError> {
        let slot = record.slot.name.as_str();
        let s = self.scale();
        let descender = self.metrics.descender as f64;
        // Tracer outlines are counter-clockwise; TrueType wants outer contours clockwise.
        let outline = record
            .outline
            .map_points(|x, y| (x * s, y * s + descender))
            .reversed();
        let mut contours = round_contours(&outline, slot)?;

        let Some((x_min, x_max)) = horizontal_extent(&contours) else {
            let glyph = FontGlyph {
                name: slot.to_string(),
                codepoint: Some(record.codepoint()),
                contours,
                advance_width: self.metrics.default_advance,
            };
            let metrics = GlyphMetrics {
                advance_width: glyph.advance_width,
                left_bearing: 0,
                right_bearing: 0,
            };
            return Ok((glyph, metrics));
        };

        let shift = self.metrics.left_bearing as i64 - x_min as i64;
        for p in contours.iter_mut().flatten() {
            p.x = font_unit(p.x as i64 + shift, slot, "x coordinate")?;
        }

        let extent = x_max as i64 - x_min as i64;
        let advance_width = if extent == 0 {
            self.metrics.default_advance
        } else {
            let advance =
                extent + self.metrics.left_bearing as i64 + self.metrics.right_bearing as i64;
            u16::try_from(advance).map_err(|_| GlyphError::OutOfRange {
                slot: slot.to_string(),
                reason: format!("advance width {advance} does not fit in 16 bits"),
            })?
        };

        let glyph = FontGlyph {
            name: slot.to_string(),
            codepoint: Some(record.codepoint()),
            contours,
            advance_width,
        };
        let x_max = glyph.bounds().map_or(0, |b| b.x_max);
        let metrics = GlyphMetrics {
            advance_width,
            left_bearing: glyph.left_side_bearing(),
            right_bearing: font_unit(advance_width as i64 - x_max as i64, slot, "right side bearing")?,
        };
        Ok((glyph, metrics))
    }
}

/// Narrows `value` to a signed 16-bit font unit.
fn font_unit(value: i64, slot: &str, what: &str) -> Result<i16, GlyphError> {
    i16::try_from(value).map_err(|_| GlyphError::OutOfRange {
        slot: slot.to_string(),
        reason: format!("{what} {value} does not fit in 16 bits"),
    })
}

/// Rounds every point to integer font units, dropping repeated points and contours
/// that collapse.
fn round_contours(outline: &Outline, slot: &str) -> Result<Vec<Vec<GlyphPoint>>, GlyphError> {
    let mut contours = Vec::with_capacity(outline.contours.len());
    for contour in &outline.contours {
        let mut points: Vec<GlyphPoint> = Vec::with_capacity(contour.points.len());
        for p in &contour.points {
            let point = GlyphPoint {
                x: font_unit(p.x.round() as i64, slot, "x coordinate")?,
                y: font_unit(p.y.round() as i64, slot, "y coordinate")?,
                on_curve: p.on_curve,
            };
            if points.last() != Some(&point) {
                points.push(point);
            }
        }
        while points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        if points.len() >= 3 {
            contours.push(points);
        }
    }
    Ok(contours)
}

fn horizontal_extent(contours: &[Vec<GlyphPoint>]) -> Option<(i16, i16)> {
    let mut xs = contours.iter().flatten().map(|p| p.x);
    let first = xs.next()?;
    Some(xs.fold((first, first), |(lo, hi), x| (lo.min(x), hi.max(x))))
}

impl FontAssembly {
    /// Compiles the glyph set into a TrueType binary.
    pub fn compile(&self) -> FontResult<CompiledFont> {
        let data = tables::compile(&self.metrics, &self.glyphs)?;

        info!(
            family = %self.metrics.family_name,
            glyphs = self.glyphs.len(),
            excluded = self.excluded.len(),
            bytes = data.len(),
            "font compiled"
        );

        Ok(CompiledFont {
            data,
            glyph_count: self.glyphs.len(),
            family_name: self.metrics.family_name.clone(),
        })
    }
}

impl CompiledFont {
    /// Writes the font binary to `path`.
    pub fn write_to(&self, path: impl AsRef<Path>) -> FontResult<()> {
        let path = path.as_ref();
        std::fs::write(path, &self.data)?;
        info!(path = %path.display(), bytes = self.data.len(), "font written");
        Ok(())
    }
}
