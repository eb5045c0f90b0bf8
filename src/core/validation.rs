//! Input Validation Utilities
//!
//! This module provides validation utilities that reject bad input before it
//! reaches a stage that would otherwise panic on it.

use crate::core::FontError;

/// Smallest page side the ink classifier can work with.
pub const MIN_PAGE_SIDE: u32 = 8;

/// Largest page side accepted, to bound memory use of the labelling passes.
pub const MAX_PAGE_SIDE: u32 = 20_000;

/// Validates that a value is within a specified range (inclusive).
#[inline]
pub fn validate_range<T: PartialOrd + std::fmt::Display>(
    value: T,
    min: T,
    max: T,
    param_name: &str,
) -> Result<(), FontError> {
    if value < min || value > max {
        return Err(FontError::InvalidInput {
            message: format!(
                "Parameter '{}' must be in range [{}, {}], got: {}",
                param_name, min, max, value
            ),
        });
    }
    Ok(())
}

/// Validates page dimensions.
pub fn validate_page_dimensions(width: u32, height: u32) -> Result<(), FontError> {
    validate_range(width, MIN_PAGE_SIDE, MAX_PAGE_SIDE, "page width")?;
    validate_range(height, MIN_PAGE_SIDE, MAX_PAGE_SIDE, "page height")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_range() {
        assert!(validate_range(5, 0, 10, "x").is_ok());
        assert!(validate_range(0, 0, 10, "x").is_ok());
        assert!(validate_range(11, 0, 10, "x").is_err());
    }

    #[test]
    fn test_validate_page_dimensions() {
        assert!(validate_page_dimensions(800, 1200).is_ok());
        assert!(validate_page_dimensions(4, 1200).is_err());
        assert!(validate_page_dimensions(800, 30_000).is_err());
    }
}
