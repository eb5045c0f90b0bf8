//! TrueType font assembly.
//!
//! * `assembler` - Converts traced glyph records into font glyphs with metrics
//! * `glyf` - Font-unit glyphs and their `glyf` entries
//! * `tables` - The remaining TrueType tables and the font binary

pub mod assembler;
pub mod glyf;
mod tables;

pub use assembler::{CompiledFont, FontAssembler, FontAssembly};
pub use glyf::{FontGlyph, GlyphBounds, GlyphPoint};

use serde::{Deserialize, Serialize};

use crate::core::config::{ConfigError, ConfigValidator};

/// Family-wide font metrics and naming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontMetricsConfig {
    pub family_name: String,
    pub style_name: String,
    /// Version string for the `name` table, e.g. `Version 1.000`.
    pub version: String,
    pub units_per_em: u16,
    pub ascender: i16,
    /// Negative for a baseline above the canvas bottom.
    pub descender: i16,
    pub line_gap: i16,
    /// Space kept left of every glyph, in font units.
    pub left_bearing: i16,
    /// Space kept right of every glyph, in font units.
    pub right_bearing: i16,
    /// Advance of the space glyph and of glyphs without horizontal extent.
    pub default_advance: u16,
}

impl Default for FontMetricsConfig {
    fn default() -> Self {
        Self {
            family_name: "HebrewFont".to_string(),
            style_name: "Regular".to_string(),
            version: "Version 1.000".to_string(),
            units_per_em: 1000,
            ascender: 800,
            descender: -200,
            line_gap: 0,
            left_bearing: 50,
            right_bearing: 50,
            default_advance: 600,
        }
    }
}

impl ConfigValidator for FontMetricsConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.family_name.trim().is_empty() {
            return Err(ConfigError::invalid("font.family_name cannot be empty"));
        }
        if self.style_name.trim().is_empty() {
            return Err(ConfigError::invalid("font.style_name cannot be empty"));
        }
        if !(16..=16384).contains(&self.units_per_em) {
            return Err(ConfigError::invalid(format!(
                "font.units_per_em must be in range [16, 16384], got {}",
                self.units_per_em
            )));
        }
        if self.ascender <= 0 || self.descender > 0 {
            return Err(ConfigError::invalid(format!(
                "font.ascender must be positive and font.descender not positive, got {} / {}",
                self.ascender, self.descender
            )));
        }
        if self.line_gap < 0 || self.left_bearing < 0 || self.right_bearing < 0 {
            return Err(ConfigError::invalid(
                "font.line_gap and the side bearings cannot be negative",
            ));
        }
        if self.default_advance == 0 {
            return Err(ConfigError::invalid("font.default_advance must be positive"));
        }
        Ok(())
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}

impl FontMetricsConfig {
    /// Distance from descender to ascender in font units.
    pub fn em_height(&self) -> i32 {
        self.ascender as i32 - self.descender as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_metrics_are_valid() {
        let metrics = FontMetricsConfig::get_defaults();
        assert!(metrics.validate().is_ok());
        assert_eq!(metrics.em_height(), 1000);
    }

    #[test]
    fn test_rejects_bad_metrics() {
        let metrics = FontMetricsConfig {
            descender: 100,
            ..Default::default()
        };
        assert!(metrics.validate().is_err());

        let metrics = FontMetricsConfig {
            family_name: " ".to_string(),
            ..Default::default()
        };
        assert!(metrics.validate().is_err());
    }
}
