//! # handfont
//!
//! A Rust library that turns a scanned page of handwritten letters, written in a
//! fixed grid, into a TrueType font.
//!
//! ## Features
//!
//! - Ink/background classification that copes with uneven lighting
//! - Character region extraction with broken-stroke merging
//! - Row clustering and grid-aware alphabet assignment with duplicate rejection
//! - Glyph normalization onto a fixed canvas with per-slot overrides
//! - Outline tracing with corner detection and quadratic smoothing
//! - TrueType compilation with no external font tooling
//! - A per-run report of every slot and every rejected box
//!
//! ## Modules
//!
//! * [`core`] - Error types, configuration validation and parallelism policy
//! * [`domain`] - Alphabet table, glyph records and outlines
//! * [`processors`] - The page analysis and glyph processing stages
//! * [`font`] - Font assembly and the TrueType writer
//! * [`pipeline`] - Orchestration, configuration, reports and artifacts
//! * [`utils`] - Page loading and logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use handfont::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = FontPipeline::with_defaults()?;
//! let output = pipeline.run_path("letters.png")?;
//!
//! output.font.write_to("handwriting.ttf")?;
//! println!("{}", output.report);
//! # Ok(())
//! # }
//! ```
//!
//! ### JSON Configuration
//!
//! Every section is optional; missing values fall back to the defaults for the
//! Hebrew letter sheet.
//!
//! ```rust,no_run
//! use handfont::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PipelineConfig::from_json(r#"
//! {
//!   "grid": { "rows": 7, "max_columns": 4, "direction": "right_to_left" },
//!   "canvas": { "canvas_size": 600, "margin": 50 },
//!   "font": { "family_name": "MyHand", "units_per_em": 1000 }
//! }
//! "#)?;
//!
//! let pipeline = FontPipeline::new(config)?;
//! # Ok(())
//! # }
//! ```

// Core modules
pub mod core;
pub mod domain;
pub mod font;

pub mod pipeline;
pub mod processors;
pub mod utils;

/// Prelude module for convenient imports.
///
/// ```rust
/// use handfont::prelude::*;
/// ```
///
/// Included items focus on running the pipeline and inspecting its result. Stage
/// types and configuration sections live in their own modules.
pub mod prelude {
    pub use crate::pipeline::{
        FontPipeline, PipelineConfig, PipelineOutput, RunReport, SlotOutcome,
    };

    pub use crate::font::CompiledFont;

    pub use crate::core::{FontError, FontResult};

    pub use crate::utils::{load_page, load_page_from_bytes};
}
