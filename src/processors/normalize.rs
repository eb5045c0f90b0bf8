//! Glyph normalization onto a fixed-size canvas.
//!
//! Each assigned box is redrawn from its own ink pixels, scaled to fit the canvas
//! margin, centred, shifted by the slot's vertical offset and clamped inside the
//! canvas. The result is black ink on a white background.

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::config::{ConfigError, ConfigValidator};
use crate::domain::alphabet::AlphabetSlot;
use crate::processors::geometry::BoundingBox;

/// Canvas background value.
pub const BACKGROUND: u8 = 255;
/// Canvas ink value.
pub const INK: u8 = 0;
/// Largest canvas side accepted.
pub const MAX_CANVAS_SIZE: u32 = 8192;

/// Canvas parameters shared by every glyph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Side of the square canvas in pixels.
    pub canvas_size: u32,
    /// Empty border kept around the glyph, unless the slot overrides it.
    pub margin: u32,
    /// Background added around the box before resampling.
    pub crop_padding: u32,
    /// Allow glyphs smaller than the canvas to be enlarged.
    pub allow_upscale: bool,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            canvas_size: 600,
            margin: 50,
            crop_padding: 15,
            allow_upscale: false,
        }
    }
}

impl ConfigValidator for CanvasConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(16..=MAX_CANVAS_SIZE).contains(&self.canvas_size) {
            return Err(ConfigError::invalid(format!(
                "canvas.canvas_size must be in range [16, {}], got {}",
                MAX_CANVAS_SIZE, self.canvas_size
            )));
        }
        if self.margin * 2 >= self.canvas_size {
            return Err(ConfigError::invalid(format!(
                "canvas.margin {} leaves no room on a {} px canvas",
                self.margin, self.canvas_size
            )));
        }
        Ok(())
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}

/// Where the glyph ended up on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Placement {
    /// Uniform scale applied to the source box.
    pub scale: f64,
    /// Left edge of the ink on the canvas.
    pub x: u32,
    /// Top edge of the ink on the canvas.
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// A glyph raster on the normalized canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedGlyph {
    /// `canvas_size × canvas_size`, black ink on white.
    pub raster: GrayImage,
    /// `None` when no ink survived resampling.
    pub placement: Option<Placement>,
}

impl NormalizedGlyph {
    pub fn is_blank(&self) -> bool {
        self.placement.is_none()
    }
}

/// Normalizes assigned boxes onto the glyph canvas.
#[derive(Debug, Clone, Default)]
pub struct GlyphNormalizer {
    config: CanvasConfig,
}

impl GlyphNormalizer {
    pub fn new(config: CanvasConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    /// Draws the ink of `bbox` onto a fresh canvas using the overrides of `slot`.
    pub fn normalize(&self, slot: &AlphabetSlot, bbox: &BoundingBox) -> NormalizedGlyph {
        let size = self.config.canvas_size;
        let mut raster = GrayImage::from_pixel(size, size, Luma([BACKGROUND]));
        if bbox.pixel_count() == 0 {
            return NormalizedGlyph {
                raster,
                placement: None,
            };
        }

        let margin = slot.overrides.margin.unwrap_or(self.config.margin);
        let available = size.saturating_sub(2 * margin).max(1) as f64;
        let mut scale = (available / bbox.width as f64).min(available / bbox.height as f64);
        if !self.config.allow_upscale {
            scale = scale.min(1.0);
        }
        scale *= slot.overrides.scale as f64;

        let crop = bbox.render_mask(self.config.crop_padding);
        let resized = if (scale - 1.0).abs() < f64::EPSILON {
            crop
        } else {
            let w = ((crop.width() as f64 * scale).round() as u32).max(1);
            let h = ((crop.height() as f64 * scale).round() as u32).max(1);
            imageops::resize(&crop, w, h, FilterType::Triangle)
        };

        let Some((ex, ey, ew, eh)) = ink_extent(&resized) else {
            debug!(slot = %slot.name, scale, "no ink left after resampling");
            return NormalizedGlyph {
                raster,
                placement: None,
            };
        };

        let x = place(size, ew, 0);
        let y = place(size, eh, slot.overrides.vertical_offset as i64);
        for (px, py, p) in resized.enumerate_pixels() {
            if p[0] < 128 || px < ex || py < ey {
                continue;
            }
            let cx = x as i64 + (px - ex) as i64;
            let cy = y as i64 + (py - ey) as i64;
            if (0..size as i64).contains(&cx) && (0..size as i64).contains(&cy) {
                raster.put_pixel(cx as u32, cy as u32, Luma([INK]));
            }
        }

        let placement = Placement {
            scale,
            x,
            y,
            width: ew.min(size),
            height: eh.min(size),
        };
        debug!(
            slot = %slot.name,
            scale,
            x,
            y,
            width = placement.width,
            height = placement.height,
            "glyph normalized"
        );
        NormalizedGlyph {
            raster,
            placement: Some(placement),
        }
    }
}

/// Centred start of an extent of `length` on a canvas of `size`, shifted by
/// `offset` and clamped so the extent stays inside.
fn place(size: u32, length: u32, offset: i64) -> u32 {
    if length >= size {
        return 0;
    }
    let free = (size - length) as i64;
    (free / 2 + offset).clamp(0, free) as u32
}

/// Bounding rectangle of the pixels >= 128, as `(x, y, width, height)`.
fn ink_extent(image: &GrayImage) -> Option<(u32, u32, u32, u32)> {
    let mut extent: Option<(u32, u32, u32, u32)> = None;
    for (x, y, p) in image.enumerate_pixels() {
        if p[0] < 128 {
            continue;
        }
        extent = Some(match extent {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }
    extent.map(|(x0, y0, x1, y1)| (x0, y0, x1 - x0 + 1, y1 - y0 + 1))
}
