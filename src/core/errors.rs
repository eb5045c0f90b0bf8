//! Error types for the font pipeline.
//!
//! Page-level failures (unreadable input, no ink, nothing to compile) are fatal and
//! surface as [`FontError`]. Failures that only affect one slot are modelled by
//! [`GlyphError`] and end up in the run report instead of aborting the run.

use thiserror::Error;

use crate::core::config::ConfigError;

/// Enum representing the stages of the pipeline an infrastructure error can come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    /// Font table compilation.
    FontAssembly,
    /// Writing intermediate artifacts.
    Artifacts,
    /// Generic processing error.
    Generic,
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingStage::FontAssembly => write!(f, "font assembly"),
            ProcessingStage::Artifacts => write!(f, "artifact output"),
            ProcessingStage::Generic => write!(f, "processing"),
        }
    }
}

/// Fatal errors of a pipeline run.
#[derive(Error, Debug)]
pub enum FontError {
    /// The page image could not be read or decoded.
    #[error("invalid image")]
    InvalidImage(#[source] image::ImageError),

    /// The ink mask contains no usable ink regions.
    #[error("no ink components found on the page")]
    NoComponentsFound,

    /// No slot survived normalization and tracing, so there is nothing to compile.
    #[error("no glyphs produced")]
    NoGlyphsProduced,

    /// Error occurred during processing.
    #[error("{kind} failed: {context}")]
    Processing {
        /// The stage of processing where the error occurred.
        kind: ProcessingStage,
        /// Additional context about the error.
        context: String,
        /// The underlying error that caused this error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Error indicating invalid input.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// A message describing the invalid input.
        message: String,
    },

    /// Error indicating a configuration problem.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Error (de)serializing configuration or reports.
    #[error("serialization")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),
}

impl FontError {
    /// Creates a processing error for the given stage.
    pub fn processing(
        kind: ProcessingStage,
        context: &str,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Processing {
            kind,
            context: context.to_string(),
            source: Box::new(error),
        }
    }

    /// Creates an error for font table compilation problems.
    pub fn font_assembly(context: &str, error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::processing(ProcessingStage::FontAssembly, context, error)
    }

    /// Creates an error for failures while writing intermediate artifacts.
    pub fn artifacts(context: &str, error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::processing(ProcessingStage::Artifacts, context, error)
    }

    /// Creates an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Returns true for the page-level precondition failures of a run.
    pub fn is_page_level(&self) -> bool {
        matches!(
            self,
            Self::InvalidImage(_) | Self::NoComponentsFound | Self::NoGlyphsProduced
        )
    }
}

/// Per-glyph failures. These never abort a run; the slot is excluded and reported.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GlyphError {
    /// The normalized raster contains no ink.
    #[error("glyph raster for slot '{slot}' is empty")]
    Empty {
        /// Slot name.
        slot: String,
    },

    /// Tracing the raster produced no usable contour.
    #[error("tracing slot '{slot}' failed: {reason}")]
    TraceFailed {
        /// Slot name.
        slot: String,
        /// Why the tracer gave up.
        reason: String,
    },

    /// The glyph does not fit the 16-bit coordinate space of the font.
    #[error("glyph for slot '{slot}' is out of font range: {reason}")]
    OutOfRange {
        /// Slot name.
        slot: String,
        /// Which value overflowed.
        reason: String,
    },
}

impl GlyphError {
    /// Name of the slot the error belongs to.
    pub fn slot(&self) -> &str {
        match self {
            Self::Empty { slot } | Self::TraceFailed { slot, .. } | Self::OutOfRange { slot, .. } => slot,
        }
    }
}

/// Convenient result alias for pipeline operations.
pub type FontResult<T> = Result<T, FontError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_level_classification() {
        assert!(FontError::NoComponentsFound.is_page_level());
        assert!(FontError::NoGlyphsProduced.is_page_level());
        assert!(!FontError::invalid_input("bad").is_page_level());
    }

    #[test]
    fn test_processing_error_message() {
        let err = FontError::font_assembly(
            "glyf",
            std::io::Error::new(std::io::ErrorKind::InvalidData, "too many points"),
        );
        assert_eq!(err.to_string(), "font assembly failed: glyf");
    }

    #[test]
    fn test_glyph_error_message() {
        let err = GlyphError::TraceFailed {
            slot: "alef".to_string(),
            reason: "no contours".to_string(),
        };
        assert_eq!(err.to_string(), "tracing slot 'alef' failed: no contours");
    }
}
