//! Page-analysis and glyph-processing stages.
//!
//! Each stage is a small struct built from its configuration section and exposes
//! one operation. The stages run in this order:
//!
//! * `ink` - Ink/background classification of the page
//! * `components` - Character regions from the ink mask
//! * `rows` - Grouping of regions into text rows
//! * `assign` - Matching of regions to alphabet slots, with `dedup` rejecting repeats
//! * `normalize` - Redrawing each region on the glyph canvas
//! * `vectorize` - Tracing each canvas into an outline
//!
//! `geometry` holds the bounding box and the polyline helpers shared by the stages.

pub mod assign;
pub mod components;
pub mod dedup;
pub mod geometry;
pub mod ink;
pub mod normalize;
mod regions;
pub mod rows;
pub mod vectorize;

pub use assign::{AlphabetAssigner, AssignerConfig, Assignment, DuplicateBox, SlotAssignment};
pub use components::{ComponentConfig, ComponentExtractor, Components};
pub use dedup::{DedupConfig, DedupDecision, DedupIndex, DuplicateReason, ShapeDescriptor};
pub use geometry::{BoundingBox, Point};
pub use ink::{InkClassifier, InkClassifierConfig, InkMask};
pub use normalize::{CanvasConfig, GlyphNormalizer, NormalizedGlyph, Placement};
pub use rows::{LayoutWarning, RowCluster, RowClusterConfig, RowClusterer, RowClustering};
pub use vectorize::{OutlineVectorizer, TraceConfig};
