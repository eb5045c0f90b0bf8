//! Font-unit glyphs and their `glyf` representation.

use kurbo::BezPath;
use write_fonts::tables::glyf::{Glyph, MalformedPath, SimpleGlyph};

use crate::domain::outline::{Contour, OutlinePoint};

/// A point in font units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphPoint {
    pub x: i16,
    pub y: i16,
    pub on_curve: bool,
}

/// Control-box of a glyph in font units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GlyphBounds {
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
}

impl GlyphBounds {
    /// Smallest box covering both.
    pub fn union(&self, other: &GlyphBounds) -> GlyphBounds {
        GlyphBounds {
            x_min: self.x_min.min(other.x_min),
            y_min: self.y_min.min(other.y_min),
            x_max: self.x_max.max(other.x_max),
            y_max: self.y_max.max(other.y_max),
        }
    }
}

/// A glyph ready for the font tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontGlyph {
    pub name: String,
    pub codepoint: Option<char>,
    /// Closed contours, outer ones clockwise.
    pub contours: Vec<Vec<GlyphPoint>>,
    pub advance_width: u16,
}

impl FontGlyph {
    /// A glyph with no outline.
    pub fn empty(name: impl Into<String>, codepoint: Option<char>, advance_width: u16) -> Self {
        Self {
            name: name.into(),
            codepoint,
            contours: Vec::new(),
            advance_width,
        }
    }

    pub fn point_count(&self) -> usize {
        self.contours.iter().map(Vec::len).sum()
    }

    /// Upper bound on the points stored in `glyf`, where the implied on-curve
    /// point between two off-curve points is written out.
    pub fn stored_point_bound(&self) -> usize {
        self.contours
            .iter()
            .map(|c| {
                let implied = (0..c.len())
                    .filter(|&i| !c[i].on_curve && !c[(i + 1) % c.len()].on_curve)
                    .count();
                c.len() + implied + 1
            })
            .sum()
    }

    /// Control-box over every point; `None` for an empty glyph.
    pub fn bounds(&self) -> Option<GlyphBounds> {
        let mut points = self.contours.iter().flatten();
        let first = points.next()?;
        let mut b = GlyphBounds {
            x_min: first.x,
            y_min: first.y,
            x_max: first.x,
            y_max: first.y,
        };
        for p in points {
            b.x_min = b.x_min.min(p.x);
            b.y_min = b.y_min.min(p.y);
            b.x_max = b.x_max.max(p.x);
            b.y_max = b.y_max.max(p.y);
        }
        Some(b)
    }

    /// Left side bearing as stored in `hmtx`.
    pub fn left_side_bearing(&self) -> i16 {
        self.bounds().map(|b| b.x_min).unwrap_or(0)
    }

    /// The outline as a closed quadratic path.
    pub fn to_bezpath(&self) -> BezPath {
        let mut path = BezPath::new();
        for points in &self.contours {
            let contour = Contour::new(
                points
                    .iter()
                    .map(|p| OutlinePoint {
                        x: p.x as f64,
                        y: p.y as f64,
                        on_curve: p.on_curve,
                    })
                    .collect(),
            );
            path.extend(contour.to_bezpath().elements().iter().copied());
        }
        path
    }

    /// Converts to a `glyf` entry; glyphs without contours are empty.
    pub fn to_glyph(&self) -> Result<Glyph, MalformedPath> {
        if self.contours.is_empty() {
            return Ok(Glyph::Empty);
        }
        SimpleGlyph::from_bezpath(&self.to_bezpath()).map(Glyph::Simple)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: i16, y: i16) -> GlyphPoint {
        GlyphPoint { x, y, on_curve: true }
    }

    fn square() -> FontGlyph {
        FontGlyph {
            name: "sq".to_string(),
            codepoint: Some('A'),
            contours: vec![vec![pt(100, 0), pt(100, 500), pt(400, 500), pt(400, 0)]],
            advance_width: 600,
        }
    }

    #[test]
    fn test_empty_glyph_has_no_outline() {
        let glyph = FontGlyph::empty("space", Some(' '), 600).to_glyph().unwrap();
        assert!(matches!(glyph, Glyph::Empty));
    }

    #[test]
    fn test_square_outline() {
        let glyph = square();
        assert_eq!(glyph.left_side_bearing(), 100);
        let Glyph::Simple(simple) = glyph.to_glyph().unwrap() else {
            panic!("expected a simple glyph");
        };
        assert_eq!(
            (simple.bbox.x_min, simple.bbox.y_min, simple.bbox.x_max, simple.bbox.y_max),
            (100, 0, 400, 500)
        );
    }

    #[test]
    fn test_quadratic_contour_keeps_its_bounds() {
        let off = |x, y| GlyphPoint { x, y, on_curve: false };
        let glyph = FontGlyph {
            name: "o".to_string(),
            codepoint: None,
            contours: vec![vec![pt(0, 0), off(0, 400), off(400, 400), pt(400, 0)]],
            advance_width: 500,
        };
        assert_eq!(glyph.stored_point_bound(), 6);
        let path = glyph.to_bezpath();
        assert_eq!(path.segments().count(), 3);
        assert!(matches!(glyph.to_glyph().unwrap(), Glyph::Simple(_)));
    }

    #[test]
    fn test_bounds_union() {
        let a = GlyphBounds { x_min: 0, y_min: -10, x_max: 5, y_max: 5 };
        let b = GlyphBounds { x_min: -3, y_min: 0, x_max: 9, y_max: 2 };
        assert_eq!(a.union(&b), GlyphBounds { x_min: -3, y_min: -10, x_max: 9, y_max: 5 });
    }
}
