//! The core module of the glyph pipeline.
//!
//! This module contains the pieces every stage relies on:
//! - Error types for fatal and per-glyph failures
//! - Configuration errors, validation and the parallelism policy
//! - Input validation helpers

pub mod config;
pub mod errors;
pub mod validation;

pub use config::{ConfigError, ConfigValidator, ParallelPolicy};
pub use errors::{FontError, FontResult, GlyphError, ProcessingStage};
