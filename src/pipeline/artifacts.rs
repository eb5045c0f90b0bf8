//! Intermediate artifacts of a run.
//!
//! For every compiled glyph the writer stores the normalized raster as
//! `NN_name.png` and the traced outline as `NN_name.svg`, plus a `manifest.json`
//! describing the slots and the run report.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::core::{FontError, FontResult};
use crate::domain::glyph::{GlyphMetrics, GlyphRecord};
use crate::pipeline::report::RunReport;
use crate::processors::normalize::Placement;

/// Name of the manifest file inside the artifact directory.
pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Serialize)]
struct ManifestEntry<'a> {
    index: usize,
    name: &'a str,
    codepoint: String,
    png: String,
    svg: String,
    placement: Placement,
    metrics: Option<GlyphMetrics>,
}

#[derive(Debug, Serialize)]
struct Manifest<'a> {
    family_name: &'a str,
    canvas_size: u32,
    glyphs: Vec<ManifestEntry<'a>>,
    report: &'a RunReport,
}

/// Writes per-glyph PNG/SVG files and the manifest into one directory.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    dir: PathBuf,
}

impl ArtifactWriter {
    /// Creates the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> FontResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes the raster and outline of one glyph and returns their file names.
    pub fn write_glyph(&self, record: &GlyphRecord) -> FontResult<(String, String)> {
        let stem = record.slot.file_stem();
        let png = format!("{stem}.png");
        let svg = format!("{stem}.svg");

        record
            .raster
            .save(self.dir.join(&png))
            .map_err(|e| FontError::artifacts(&format!("writing {png}"), e))?;

        let (width, height) = record.raster.dimensions();
        let document = record.outline.to_svg_document(&stem, width, height);
        fs::write(self.dir.join(&svg), document)?;
        Ok((png, svg))
    }

    /// Writes every glyph plus the manifest.
    pub fn write_all(
        &self,
        family_name: &str,
        records: &[GlyphRecord],
        report: &RunReport,
    ) -> FontResult<PathBuf> {
        let mut glyphs = Vec::with_capacity(records.len());
        for record in records {
            let (png, svg) = self.write_glyph(record)?;
            glyphs.push(ManifestEntry {
                index: record.slot.index,
                name: record.name(),
                codepoint: format!("U+{:04X}", record.codepoint() as u32),
                png,
                svg,
                placement: record.placement,
                metrics: record.metrics,
            });
        }

        let canvas_size = records.first().map(|r| r.raster.width()).unwrap_or(0);
        let manifest = Manifest {
            family_name,
            canvas_size,
            glyphs,
            report,
        };
        let path = self.dir.join(MANIFEST_FILE);
        fs::write(&path, serde_json::to_string_pretty(&manifest)?)?;

        info!(
            dir = %self.dir.display(),
            glyphs = records.len(),
            "artifacts written"
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::alphabet::Alphabet;
    use crate::domain::outline::{Contour, Outline, OutlinePoint};
    use crate::processors::geometry::BoundingBox;
    use image::{GrayImage, Luma};

    fn record() -> GlyphRecord {
        let slot = Alphabet::hebrew().get(3).cloned().unwrap();
        let outline = Outline::new(vec![Contour::new(vec![
            OutlinePoint::on(10.0, 10.0),
            OutlinePoint::on(30.0, 10.0),
            OutlinePoint::on(30.0, 30.0),
            OutlinePoint::on(10.0, 30.0),
        ])]);
        GlyphRecord::new(
            slot,
            BoundingBox::solid(0, 0, 20, 20),
            GrayImage::from_pixel(40, 40, Luma([255])),
            Placement {
                scale: 1.0,
                x: 10,
                y: 10,
                width: 20,
                height: 20,
            },
            outline,
        )
    }

    #[test]
    fn test_write_all() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(dir.path().join("out")).unwrap();
        let manifest = writer
            .write_all("Test", &[record()], &RunReport::new(100, 100))
            .unwrap();

        assert!(dir.path().join("out/03_dalet.png").is_file());
        let svg = std::fs::read_to_string(dir.path().join("out/03_dalet.svg")).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("id=\"03_dalet\""));

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(manifest).unwrap()).unwrap();
        assert_eq!(json["family_name"], "Test");
        assert_eq!(json["canvas_size"], 40);
        assert_eq!(json["glyphs"][0]["png"], "03_dalet.png");
        assert_eq!(json["glyphs"][0]["codepoint"], "U+05D3");
    }
}
