//! Domain-level structures shared across the glyph pipeline.
//!
//! This module groups the alphabet table, the glyph records that flow from
//! assignment to font assembly, and the vector outline types.

pub mod alphabet;
pub mod glyph;
pub mod outline;

pub use alphabet::{
    Alphabet, AlphabetSlot, AnchorRule, GridLayout, ReadingDirection, SlotOverride, SlotSpec,
    hebrew_slot_specs,
};
pub use glyph::{GlyphMetrics, GlyphRecord};
pub use outline::{Contour, Outline, OutlinePoint};
