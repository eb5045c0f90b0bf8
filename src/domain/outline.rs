//! Vector outlines produced by the tracer and consumed by the font assembler.
//!
//! Contours use TrueType quadratic point semantics: each point is either on or off
//! the curve, and two consecutive off-curve points imply an on-curve point at their
//! midpoint. Coordinates are y-up.

use kurbo::{BezPath, Point, Rect, Shape};
use serde::Serialize;

/// A contour point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OutlinePoint {
    pub x: f64,
    pub y: f64,
    pub on_curve: bool,
}

impl OutlinePoint {
    pub fn on(x: f64, y: f64) -> Self {
        Self { x, y, on_curve: true }
    }

    pub fn off(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            on_curve: false,
        }
    }

    fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// A closed contour.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Contour {
    pub points: Vec<OutlinePoint>,
}

impl Contour {
    pub fn new(points: Vec<OutlinePoint>) -> Self {
        Self { points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The same contour traversed in the opposite direction.
    pub fn reversed(&self) -> Self {
        let mut points = self.points.clone();
        points.reverse();
        Self { points }
    }

    /// Converts the point list into a closed bezier path.
    pub fn to_bezpath(&self) -> BezPath {
        let mut path = BezPath::new();
        let pts = &self.points;
        let n = pts.len();
        if n == 0 {
            return path;
        }

        // Rotate so the walk starts on an on-curve point; an all-off contour starts
        // at the implied midpoint between its last and first points.
        let (start, order): (Point, Vec<OutlinePoint>) = match pts.iter().position(|p| p.on_curve) {
            Some(s) => (
                pts[s].point(),
                pts[s + 1..].iter().chain(pts[..s].iter()).copied().collect(),
            ),
            None => (pts[n - 1].point().midpoint(pts[0].point()), pts.to_vec()),
        };

        path.move_to(start);
        let mut pending: Option<Point> = None;
        for p in order {
            let q = p.point();
            if p.on_curve {
                match pending.take() {
                    Some(c) => path.quad_to(c, q),
                    None => path.line_to(q),
                }
            } else {
                if let Some(c) = pending {
                    path.quad_to(c, c.midpoint(q));
                }
                pending = Some(q);
            }
        }
        if let Some(c) = pending {
            path.quad_to(c, start);
        }
        path.close_path();
        path
    }

    /// Signed area; positive for counter-clockwise contours in y-up space.
    pub fn signed_area(&self) -> f64 {
        self.to_bezpath().area()
    }
}

/// A glyph outline: an ordered list of closed contours filled with the non-zero rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Outline {
    pub contours: Vec<Contour>,
}

impl Outline {
    pub fn new(contours: Vec<Contour>) -> Self {
        Self { contours }
    }

    pub fn is_empty(&self) -> bool {
        self.contours.iter().all(Contour::is_empty)
    }

    pub fn point_count(&self) -> usize {
        self.contours.iter().map(|c| c.points.len()).sum()
    }

    /// All contours as a single path.
    pub fn to_bezpath(&self) -> BezPath {
        let mut path = BezPath::new();
        for contour in &self.contours {
            path.extend(contour.to_bezpath());
        }
        path
    }

    /// Net filled area (outer contours minus holes).
    pub fn area(&self) -> f64 {
        self.contours.iter().map(Contour::signed_area).sum()
    }

    /// Bounding box of the drawn shape, `None` for an empty outline.
    pub fn bounds(&self) -> Option<Rect> {
        if self.is_empty() {
            return None;
        }
        Some(self.to_bezpath().bounding_box())
    }

    /// Applies `f` to every point.
    pub fn map_points(&self, f: impl Fn(f64, f64) -> (f64, f64)) -> Self {
        Self {
            contours: self
                .contours
                .iter()
                .map(|c| Contour {
                    points: c
                        .points
                        .iter()
                        .map(|p| {
                            let (x, y) = f(p.x, p.y);
                            OutlinePoint {
                                x,
                                y,
                                on_curve: p.on_curve,
                            }
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    /// Every contour reversed.
    pub fn reversed(&self) -> Self {
        Self {
            contours: self.contours.iter().map(Contour::reversed).collect(),
        }
    }

    /// Standalone SVG document for an outline drawn on a `width × height` canvas.
    pub fn to_svg_document(&self, id: &str, width: u32, height: u32) -> String {
        format!(
            concat!(
                "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n",
                "  <path id=\"{id}\" fill=\"black\" fill-rule=\"nonzero\" ",
                "transform=\"matrix(1 0 0 -1 0 {h})\" d=\"{d}\"/>\n",
                "</svg>\n"
            ),
            w = width,
            h = height,
            id = id,
            d = self.to_bezpath().to_svg()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: f64) -> Contour {
        Contour::new(vec![
            OutlinePoint::on(0.0, 0.0),
            OutlinePoint::on(size, 0.0),
            OutlinePoint::on(size, size),
            OutlinePoint::on(0.0, size),
        ])
    }

    #[test]
    fn test_square_area_and_orientation() {
        let contour = square(10.0);
        assert!((contour.signed_area() - 100.0).abs() < 1e-9);
        assert!((contour.reversed().signed_area() + 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_hole_subtracts_area() {
        let outer = square(10.0);
        let hole = Contour::new(vec![
            OutlinePoint::on(2.0, 2.0),
            OutlinePoint::on(2.0, 8.0),
            OutlinePoint::on(8.0, 8.0),
            OutlinePoint::on(8.0, 2.0),
        ]);
        let outline = Outline::new(vec![outer, hole]);
        assert!((outline.area() - 64.0).abs() < 1e-9);
    }

    #[test]
    fn test_all_off_curve_contour_is_closed_curve() {
        // Four off-curve points describe a rounded shape through the edge midpoints.
        let contour = Contour::new(vec![
            OutlinePoint::off(0.0, 0.0),
            OutlinePoint::off(10.0, 0.0),
            OutlinePoint::off(10.0, 10.0),
            OutlinePoint::off(0.0, 10.0),
        ]);
        let path = contour.to_bezpath();
        let area = path.area();
        assert!(area > 50.0 && area < 100.0, "area {}", area);
        let bounds = path.bounding_box();
        assert!((bounds.x0 - 0.0).abs() < 2.0 && (bounds.x1 - 10.0).abs() < 2.0);
    }

    #[test]
    fn test_bounds_and_map_points() {
        let outline = Outline::new(vec![square(4.0)]);
        let moved = outline.map_points(|x, y| (x * 2.0 + 1.0, y));
        let b = moved.bounds().unwrap();
        assert_eq!((b.x0, b.x1, b.y1), (1.0, 9.0, 4.0));
        assert!(Outline::default().bounds().is_none());
    }

    #[test]
    fn test_svg_document_contains_id() {
        let svg = Outline::new(vec![square(4.0)]).to_svg_document("alef", 600, 600);
        assert!(svg.contains("id=\"alef\""));
        assert!(svg.contains("viewBox=\"0 0 600 600\""));
    }
}
