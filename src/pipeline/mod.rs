//! The page-to-font pipeline.
//!
//! [`FontPipeline`] runs the stages in order: ink classification, component
//! extraction, row clustering and slot assignment run sequentially on the page;
//! normalization and tracing then run per glyph, in parallel when the
//! [`ParallelPolicy`](crate::core::ParallelPolicy) allows; font assembly joins the
//! results.
//!
//! Per-slot failures never abort a run. They end up in the [`RunReport`] next to
//! the compiled font.

pub mod artifacts;
mod config;
pub mod report;

pub use artifacts::{ArtifactWriter, MANIFEST_FILE};
pub use config::PipelineConfig;
pub use report::{RejectedBox, RunReport, SlotOutcome, SlotReport};

use std::path::{Path, PathBuf};
use std::time::Instant;

use image::GrayImage;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::core::config::ConfigValidator;
use crate::core::validation::validate_page_dimensions;
use crate::core::{FontError, FontResult, GlyphError, ProcessingStage};
use crate::domain::alphabet::Alphabet;
use crate::domain::glyph::GlyphRecord;
use crate::font::{CompiledFont, FontAssembler};
use crate::processors::{
    AlphabetAssigner, ComponentExtractor, GlyphNormalizer, InkClassifier, OutlineVectorizer,
    RowClusterer, SlotAssignment,
};
use crate::utils::{load_page, load_page_from_bytes};

/// Everything a successful run produces.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub font: CompiledFont,
    pub report: RunReport,
    /// Compiled glyphs in alphabet order.
    pub glyphs: Vec<GlyphRecord>,
}

impl PipelineOutput {
    /// Writes per-glyph artifacts and the manifest into `dir`.
    pub fn write_artifacts(&self, dir: impl Into<PathBuf>) -> FontResult<PathBuf> {
        ArtifactWriter::new(dir)?.write_all(&self.font.family_name, &self.glyphs, &self.report)
    }
}

/// Converts letter-grid pages into fonts.
#[derive(Debug, Clone)]
pub struct FontPipeline {
    config: PipelineConfig,
    alphabet: Alphabet,
}

impl FontPipeline {
    /// Validates `config` and prepares the alphabet.
    pub fn new(config: PipelineConfig) -> FontResult<Self> {
        config.validate()?;
        let alphabet = config.build_alphabet()?;
        Ok(Self { config, alphabet })
    }

    /// A pipeline for the default Hebrew sheet.
    pub fn with_defaults() -> FontResult<Self> {
        Self::new(PipelineConfig::default())
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    /// Runs the pipeline on an image file.
    pub fn run_path(&self, path: impl AsRef<Path>) -> FontResult<PipelineOutput> {
        let page = load_page(path.as_ref())?;
        self.run_image(&page)
    }

    /// Runs the pipeline on encoded image bytes.
    pub fn run_bytes(&self, bytes: &[u8]) -> FontResult<PipelineOutput> {
        let page = load_page_from_bytes(bytes)?;
        self.run_image(&page)
    }

    /// Runs the pipeline on a decoded grayscale page.
    pub fn run_image(&self, page: &GrayImage) -> FontResult<PipelineOutput> {
        let start = Instant::now();
        let (width, height) = page.dimensions();
        validate_page_dimensions(width, height)?;
        let mut report = RunReport::new(width, height);

        let mask = InkClassifier::new(self.config.ink.clone()).classify(page);
        info!(width, height, ink_pixels = mask.ink_count(), "ink classified");

        let components = ComponentExtractor::new(self.config.extraction.clone()).extract(&mask);
        drop(mask);
        if components.is_empty() {
            return Err(FontError::NoComponentsFound);
        }
        report.components = components.boxes.len();
        report.median_height = components.median_height;
        info!(
            components = components.boxes.len(),
            median_height = components.median_height,
            "components extracted"
        );

        let clustering = RowClusterer::new(self.config.rows.clone())
            .cluster(components.boxes, self.config.grid.rows);
        report.rows_found = clustering.rows.len();
        report.warnings = clustering.warnings.clone();
        info!(rows = clustering.rows.len(), "rows clustered");

        let assignment = AlphabetAssigner::new(self.config.assignment.clone(), self.config.grid.clone())
            .assign(&self.alphabet, clustering, components.median_height)?;
        info!(
            assigned = assignment.assigned.len(),
            unfilled = assignment.unfilled.len(),
            duplicates = assignment.duplicates.len(),
            surplus = assignment.surplus.len(),
            "slots assigned"
        );
        report.rejected = assignment
            .duplicates
            .into_iter()
            .map(|d| RejectedBox::DuplicateRejected {
                bbox: d.bbox,
                reason: d.reason,
                original: d.original,
            })
            .collect();
        report.surplus = assignment.surplus;

        let results = self.process_glyphs(assignment.assigned)?;

        let mut outcomes: Vec<Option<SlotOutcome>> = vec![None; self.alphabet.len()];
        let mut distances = vec![0.0; self.alphabet.len()];
        let mut records = Vec::with_capacity(results.len());
        for (assigned, result) in results {
            match result {
                Ok(record) => {
                    distances[assigned.slot] = assigned.distance;
                    records.push(record);
                }
                Err(error) => {
                    outcomes[assigned.slot] = Some(SlotOutcome::from_glyph_error(assigned.bbox, &error));
                }
            }
        }
        if records.is_empty() {
            return Err(FontError::NoGlyphsProduced);
        }

        let assembler = FontAssembler::new(self.config.font.clone(), self.config.canvas.canvas_size);
        let assembly = assembler.assemble(records)?;
        let font = assembly.compile()?;

        for (record, error) in &assembly.excluded {
            outcomes[record.slot.index] = Some(SlotOutcome::from_glyph_error(record.source.clone(), error));
        }
        let records = assembly.records;
        for record in &records {
            outcomes[record.slot.index] = Some(SlotOutcome::Assigned {
                bbox: record.source.clone(),
                distance: distances[record.slot.index],
                placement: record.placement,
                contours: record.outline.contours.len(),
                points: record.outline.point_count(),
                metrics: record.metrics,
            });
        }
        report.slots = self
            .alphabet
            .slots()
            .iter()
            .zip(outcomes)
            .map(|(slot, outcome)| SlotReport::new(slot, outcome.unwrap_or(SlotOutcome::SlotUnfilled)))
            .collect();
        report.glyph_count = font.glyph_count;
        report.elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        report.emit();

        Ok(PipelineOutput {
            font,
            report,
            glyphs: records,
        })
    }

    /// Normalizes and traces every assigned box.
    fn process_glyphs(
        &self,
        assigned: Vec<SlotAssignment>,
    ) -> FontResult<Vec<(SlotAssignment, Result<GlyphRecord, GlyphError>)>> {
        let normalizer = GlyphNormalizer::new(self.config.canvas.clone());
        let vectorizer = OutlineVectorizer::new(self.config.trace.clone());
        let process = |assigned: SlotAssignment| {
            let result = self.process_glyph(&normalizer, &vectorizer, &assigned);
            (assigned, result)
        };

        let policy = &self.config.parallel;
        if !policy.should_parallelize(assigned.len()) {
            debug!("Using sequential processing for {} glyphs", assigned.len());
            return Ok(assigned.into_iter().map(process).collect());
        }

        debug!("Using parallel processing for {} glyphs", assigned.len());
        match policy.max_threads {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| {
                        FontError::processing(ProcessingStage::Generic, "building glyph thread pool", e)
                    })?;
                Ok(pool.install(|| assigned.into_par_iter().map(process).collect()))
            }
            None => Ok(assigned.into_par_iter().map(process).collect()),
        }
    }

    fn process_glyph(
        &self,
        normalizer: &GlyphNormalizer,
        vectorizer: &OutlineVectorizer,
        assigned: &SlotAssignment,
    ) -> Result<GlyphRecord, GlyphError> {
        let slot = self
            .alphabet
            .get(assigned.slot)
            .ok_or_else(|| GlyphError::Empty {
                slot: format!("#{}", assigned.slot),
            })?;

        let normalized = normalizer.normalize(slot, &assigned.bbox);
        let Some(placement) = normalized.placement else {
            return Err(GlyphError::Empty {
                slot: slot.name.clone(),
            });
        };
        let outline = vectorizer.trace(slot, &normalized.raster)?;
        debug!(
            slot = %slot.name,
            contours = outline.contours.len(),
            points = outline.point_count(),
            "glyph traced"
        );

        Ok(GlyphRecord::new(
            slot.clone(),
            assigned.bbox.clone(),
            normalized.raster,
            placement,
            outline,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = PipelineConfig::default();
        config.grid.rows = 1;
        assert!(matches!(
            FontPipeline::new(config),
            Err(FontError::Config(_))
        ));
    }

    #[test]
    fn test_blank_page_has_no_components() {
        let pipeline = FontPipeline::with_defaults().unwrap();
        let page = GrayImage::from_pixel(200, 300, Luma([255]));
        assert!(matches!(
            pipeline.run_image(&page),
            Err(FontError::NoComponentsFound)
        ));
    }

    #[test]
    fn test_tiny_page_is_invalid_input() {
        let pipeline = FontPipeline::with_defaults().unwrap();
        let page = GrayImage::from_pixel(3, 3, Luma([255]));
        assert!(matches!(
            pipeline.run_image(&page),
            Err(FontError::InvalidInput { .. })
        ));
    }
}
