//! Utility functions for loading page images.
//!
//! Pages may be in any format the `image` crate decodes. They are converted to
//! 8-bit grayscale and checked against the supported dimensions before any stage
//! sees them.

use image::error::{DecodingError, ImageFormatHint};
use image::{DynamicImage, GrayImage, ImageError};
use tracing::debug;

use crate::core::validation::validate_page_dimensions;
use crate::core::{FontError, FontResult};

/// Converts a DynamicImage to a GrayImage.
///
/// Alpha is composited onto white first so transparent backgrounds read as paper.
pub fn dynamic_to_gray(img: DynamicImage) -> GrayImage {
    if !img.color().has_alpha() {
        return img.to_luma8();
    }
    let rgba = img.to_rgba8();
    GrayImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let luma = (299 * r as u32 + 587 * g as u32 + 114 * b as u32) / 1000;
        let alpha = a as u32;
        image::Luma([((luma * alpha + 255 * (255 - alpha)) / 255) as u8])
    })
}

/// Loads a page image from a file.
pub fn load_page(path: &std::path::Path) -> FontResult<GrayImage> {
    let img = image::open(path).map_err(FontError::InvalidImage)?;
    debug!(path = %path.display(), "page loaded");
    checked(dynamic_to_gray(img))
}

/// Decodes a page image from in-memory bytes.
pub fn load_page_from_bytes(bytes: &[u8]) -> FontResult<GrayImage> {
    if bytes.is_empty() {
        return Err(FontError::InvalidImage(ImageError::Decoding(DecodingError::new(
            ImageFormatHint::Unknown,
            "empty image data",
        ))));
    }
    let img = image::load_from_memory(bytes).map_err(FontError::InvalidImage)?;
    checked(dynamic_to_gray(img))
}

fn checked(page: GrayImage) -> FontResult<GrayImage> {
    validate_page_dimensions(page.width(), page.height())?;
    Ok(page)
}
