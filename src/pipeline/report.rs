//! Run report: what happened to every slot and every box of a page.
//!
//! The report is the non-fatal half of error handling. Slots that could not be
//! filled, rasters that came out empty, outlines that failed to trace and boxes
//! rejected as duplicates are all recorded here instead of aborting the run.

use std::fmt;

use serde::Serialize;
use tracing::{info, warn};

use crate::core::GlyphError;
use crate::domain::alphabet::AlphabetSlot;
use crate::domain::glyph::GlyphMetrics;
use crate::processors::dedup::DuplicateReason;
use crate::processors::geometry::{BoundingBox, Point};
use crate::processors::normalize::Placement;
use crate::processors::rows::LayoutWarning;

/// Final state of one alphabet slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum SlotOutcome {
    /// The slot was filled and compiled into the font.
    Assigned {
        bbox: BoundingBox,
        /// Distance from the slot anchor, in page pixels.
        distance: f64,
        placement: Placement,
        contours: usize,
        points: usize,
        metrics: Option<GlyphMetrics>,
    },
    /// No box was found for the slot.
    SlotUnfilled,
    /// A box was assigned but normalization left no ink.
    Empty { bbox: BoundingBox },
    /// A box was assigned but tracing failed.
    TraceFailed { bbox: BoundingBox, reason: String },
    /// The outline traced but its font coordinates overflow 16 bits.
    OutOfRange { bbox: BoundingBox, reason: String },
}

impl SlotOutcome {
    /// Outcome for a glyph that was excluded after assignment.
    pub fn from_glyph_error(bbox: BoundingBox, error: &GlyphError) -> Self {
        match error {
            GlyphError::Empty { .. } => Self::Empty { bbox },
            GlyphError::TraceFailed { reason, .. } => Self::TraceFailed {
                bbox,
                reason: reason.clone(),
            },
            GlyphError::OutOfRange { reason, .. } => Self::OutOfRange {
                bbox,
                reason: reason.clone(),
            },
        }
    }

    pub fn is_assigned(&self) -> bool {
        matches!(self, Self::Assigned { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Assigned { .. } => "assigned",
            Self::SlotUnfilled => "slot-unfilled",
            Self::Empty { .. } => "empty",
            Self::TraceFailed { .. } => "trace-failed",
            Self::OutOfRange { .. } => "out-of-range",
        }
    }
}

/// Report entry of one slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotReport {
    pub index: usize,
    pub name: String,
    /// `U+05D0` style codepoint.
    pub codepoint: String,
    #[serde(flatten)]
    pub outcome: SlotOutcome,
}

impl SlotReport {
    pub fn new(slot: &AlphabetSlot, outcome: SlotOutcome) -> Self {
        Self {
            index: slot.index,
            name: slot.name.clone(),
            codepoint: format!("U+{:04X}", slot.codepoint as u32),
            outcome,
        }
    }
}

/// A box that was found on the page but not used.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum RejectedBox {
    /// The box repeats one that was already accepted.
    DuplicateRejected {
        bbox: BoundingBox,
        reason: DuplicateReason,
        /// Centre of the accepted box it repeats.
        original: Point,
    },
}

/// Summary of one page-to-font run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    pub page_width: u32,
    pub page_height: u32,
    /// Character regions found on the page.
    pub components: usize,
    pub median_height: f64,
    pub rows_found: usize,
    /// One entry per alphabet slot, in alphabet order.
    pub slots: Vec<SlotReport>,
    pub rejected: Vec<RejectedBox>,
    /// Boxes that matched no slot.
    pub surplus: Vec<BoundingBox>,
    pub warnings: Vec<LayoutWarning>,
    pub glyph_count: usize,
    pub elapsed_ms: f64,
}

impl RunReport {
    pub fn new(page_width: u32, page_height: u32) -> Self {
        Self {
            page_width,
            page_height,
            ..Self::default()
        }
    }

    /// Number of slots compiled into the font.
    pub fn filled_count(&self) -> usize {
        self.slots.iter().filter(|s| s.outcome.is_assigned()).count()
    }

    pub fn unfilled_count(&self) -> usize {
        self.count(|o| matches!(o, SlotOutcome::SlotUnfilled))
    }

    /// Slots that had a box but produced no glyph.
    pub fn failed_count(&self) -> usize {
        self.count(|o| {
            matches!(
                o,
                SlotOutcome::Empty { .. } | SlotOutcome::TraceFailed { .. } | SlotOutcome::OutOfRange { .. }
            )
        })
    }

    pub fn duplicate_count(&self) -> usize {
        self.rejected.len()
    }

    /// True when every slot made it into the font.
    pub fn is_complete(&self) -> bool {
        !self.slots.is_empty() && self.filled_count() == self.slots.len()
    }

    pub fn slot(&self, name: &str) -> Option<&SlotReport> {
        self.slots.iter().find(|s| s.name == name)
    }

    fn count(&self, pred: impl Fn(&SlotOutcome) -> bool) -> usize {
        self.slots.iter().filter(|s| pred(&s.outcome)).count()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Emits one structured event per non-assigned slot, rejected box and warning,
    /// followed by a summary.
    pub fn emit(&self) {
        for slot in &self.slots {
            match &slot.outcome {
                SlotOutcome::Assigned { .. } => {}
                SlotOutcome::SlotUnfilled => {
                    warn!(slot = %slot.name, codepoint = %slot.codepoint, "slot unfilled")
                }
                SlotOutcome::Empty { bbox } => warn!(
                    slot = %slot.name,
                    x = bbox.x,
                    y = bbox.y,
                    "glyph raster empty after normalization"
                ),
                SlotOutcome::TraceFailed { reason, .. } => {
                    warn!(slot = %slot.name, %reason, "glyph tracing failed")
                }
                SlotOutcome::OutOfRange { reason, .. } => {
                    warn!(slot = %slot.name, %reason, "glyph exceeds font coordinate range")
                }
            }
        }
        for rejected in &self.rejected {
            match rejected {
                RejectedBox::DuplicateRejected {
                    bbox,
                    reason,
                    original,
                } => warn!(
                    x = bbox.x,
                    y = bbox.y,
                    %reason,
                    original_x = original.x,
                    original_y = original.y,
                    "duplicate box rejected"
                ),
            }
        }
        for bbox in &self.surplus {
            warn!(x = bbox.x, y = bbox.y, "box matched no slot");
        }
        for warning in &self.warnings {
            warn!(%warning, "layout warning");
        }
        info!(
            filled = self.filled_count(),
            unfilled = self.unfilled_count(),
            failed = self.failed_count(),
            duplicates = self.duplicate_count(),
            surplus = self.surplus.len(),
            glyphs = self.glyph_count,
            elapsed_ms = self.elapsed_ms,
            "run finished"
        );
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Run Report:")?;
        writeln!(f, "  Page: {}x{}", self.page_width, self.page_height)?;
        writeln!(
            f,
            "  Components: {} in {} rows (median height {:.1} px)",
            self.components, self.rows_found, self.median_height
        )?;
        writeln!(f, "  Slots filled: {}/{}", self.filled_count(), self.slots.len())?;
        for slot in self.slots.iter().filter(|s| !s.outcome.is_assigned()) {
            writeln!(f, "    {} ({}): {}", slot.name, slot.codepoint, slot.outcome.label())?;
        }
        writeln!(f, "  Duplicates rejected: {}", self.duplicate_count())?;
        writeln!(f, "  Surplus boxes: {}", self.surplus.len())?;
        for warning in &self.warnings {
            writeln!(f, "  Warning: {warning}")?;
        }
        writeln!(f, "  Font glyphs: {}", self.glyph_count)?;
        writeln!(f, "  Elapsed: {:.2} ms", self.elapsed_ms)?;
        Ok(())
    }
}
