//! fontdue-backed glyph rasterizer
//!
//! Renders each glyph into a cell-sized surface with the coverage
//! bitmap sitting on the font baseline, so glyph-relative pixel
//! offsets line up when drawn at a shared row origin.

use fontdue::{Font, FontSettings};
use log::info;
use std::path::Path;

use super::atlas::{AtlasError, GlyphRasterizer, RasterMode, RasterSurface};
use crate::utils::Rgba;

/// Coverage at or above this counts as ink in solid mode
const SOLID_COVERAGE: u8 = 128;

/// Glyph source backed by a parsed TTF/OTF font
pub struct FontdueRasterizer {
    font: Font,
    /// Pixel size used for rasterization
    size: f32,
    /// Baseline distance from the cell top (pixels, rounded up)
    ascent: i32,
    /// Cell height (pixels, rounded up)
    line_height: i32,
}

impl FontdueRasterizer {
    /// Open a font file at the given pixel size
    pub fn open(path: &Path, size: f32) -> Result<Self, AtlasError> {
        let data = std::fs::read(path).map_err(|e| AtlasError::FontLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let raster = Self::from_bytes(&data, size).map_err(|e| match e {
            AtlasError::FontLoad { reason, .. } => AtlasError::FontLoad {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })?;
        info!("Font loaded: {}, size {}px", path.display(), size);
        Ok(raster)
    }

    /// Parse font data already in memory
    pub fn from_bytes(data: &[u8], size: f32) -> Result<Self, AtlasError> {
        let font_load = |reason: String| AtlasError::FontLoad {
            path: "<memory>".to_string(),
            reason,
        };

        let font = Font::from_bytes(data, FontSettings::default())
            .map_err(|e| font_load(e.to_string()))?;

        let metrics = font
            .horizontal_line_metrics(size)
            .ok_or_else(|| font_load("font has no horizontal line metrics".to_string()))?;

        let ascent = metrics.ascent.ceil() as i32;
        let line_height = ((metrics.ascent - metrics.descent).ceil() as i32).max(1);

        Ok(Self {
            font,
            size,
            ascent,
            line_height,
        })
    }
}

impl GlyphRasterizer for FontdueRasterizer {
    fn rasterize(&self, ch: char, mode: RasterMode) -> Option<RasterSurface> {
        if self.font.lookup_glyph_index(ch) == 0 {
            return None;
        }

        let (m, bitmap) = self.font.rasterize(ch, self.size);
        if m.width == 0 || m.height == 0 {
            return None;
        }

        let bw = m.width as i32;
        let bh = m.height as i32;
        // Place bitmap relative to the cell: xmin from the pen position,
        // bottom edge at baseline - ymin
        let x0 = m.xmin.max(0);
        let y0 = (self.ascent - (bh + m.ymin)).max(0);

        let width = (m.advance_width.round() as i32).max(x0 + bw);
        let height = self.line_height.max(y0 + bh);

        let mut pixels = vec![Rgba::new(255, 255, 255, 0); (width * height) as usize];
        for y in 0..bh {
            for x in 0..bw {
                let coverage = bitmap[(y * bw + x) as usize];
                let alpha = match mode {
                    RasterMode::Blended => coverage,
                    RasterMode::Solid if coverage >= SOLID_COVERAGE => 255,
                    RasterMode::Solid => 0,
                };
                let dst = ((y0 + y) * width + (x0 + x)) as usize;
                pixels[dst].a = alpha;
            }
        }

        Some(RasterSurface {
            width: width as u32,
            height: height as u32,
            pixels,
        })
    }

    fn advance(&self, ch: char) -> i32 {
        self.font.metrics(ch, self.size).advance_width.round() as i32
    }
}
