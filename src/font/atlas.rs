//! Glyph atlas
//!
//! Rasterizes the printable ASCII range once at startup and keeps,
//! for every glyph, only the pixels that are visibly covered.
//! The renderer draws those pixels one point at a time,
//! so the atlas never needs to be a texture.

use log::{debug, info};
use thiserror::Error;

use crate::constants::{
    is_glyph_code, ALPHA_THRESHOLD, FALLBACK_ADVANCE, FIRST_GLYPH, LAST_GLYPH, SPACE_ADVANCE,
};
use crate::utils::Rgba;

/// Fatal atlas build errors
#[derive(Debug, Error)]
pub enum AtlasError {
    /// Font file could not be read or parsed
    #[error("failed to load font {path}: {reason}")]
    FontLoad { path: String, reason: String },
    /// Every glyph came back blank (wrong font or broken backend)
    #[error("font produced no usable glyphs for ASCII 0x20-0x7E")]
    NoUsableGlyphs,
}

/// Rasterization quality requested from the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterMode {
    /// Anti-aliased coverage as alpha
    Blended,
    /// Hard-edged, alpha is either 0 or 255
    Solid,
}

/// A rasterized glyph surface, row-major RGBA
#[derive(Debug, Clone, Default)]
pub struct RasterSurface {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Rgba>,
}

impl RasterSurface {
    /// Zero-sized or missing pixel data
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }

    /// Pixel at (x, y), None if outside the surface
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get((y * self.width + x) as usize).copied()
    }
}

/// Font backend used to build the atlas
pub trait GlyphRasterizer {
    /// Render one glyph, None when the backend has nothing to show
    fn rasterize(&self, ch: char, mode: RasterMode) -> Option<RasterSurface>;

    /// Horizontal advance to the next glyph (pixels)
    fn advance(&self, ch: char) -> i32;
}

/// One retained pixel of a glyph mask
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisiblePixel {
    /// Offset from the glyph's top-left corner
    pub x: i32,
    pub y: i32,
    /// Sampled source color
    pub color: Rgba,
}

/// Sparse glyph mask plus metrics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Glyph {
    /// Rasterized surface width (pixels)
    pub width: i32,
    /// Rasterized surface height (pixels)
    pub height: i32,
    /// Advance reported by the font backend (0 for blank glyphs)
    pub advance: i32,
    /// Pixels with alpha above ALPHA_THRESHOLD
    pub pixels: Vec<VisiblePixel>,
}

impl Glyph {
    /// Space never goes through the rasterizer
    fn space() -> Self {
        Self {
            advance: SPACE_ADVANCE,
            ..Self::default()
        }
    }

    /// Glyph that failed to rasterize or has no visible pixels
    fn blank(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Nothing to draw
    pub fn is_blank(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Cursor step after drawing this glyph.
    ///
    /// Centers the ink between its box and the font advance
    /// instead of using the raw advance.
    pub fn draw_advance(&self) -> i32 {
        self.width + (self.advance - self.width) / 2
    }
}

/// Immutable per-character glyph table for ASCII 0x20-0x7E
#[derive(Debug, Clone)]
pub struct GlyphAtlas {
    glyphs: Vec<Glyph>,
}

impl GlyphAtlas {
    /// Build the atlas from a font backend.
    ///
    /// The backend is consumed: once every glyph and advance has been
    /// extracted the font handle is no longer needed.
    pub fn build<R: GlyphRasterizer>(backend: R) -> Result<Self, AtlasError> {
        let mut glyphs = Vec::with_capacity((LAST_GLYPH - FIRST_GLYPH + 1) as usize);
        let mut loaded = 0usize;
        let mut empty = 0usize;

        for code in FIRST_GLYPH..=LAST_GLYPH {
            let ch = code as char;
            if ch == ' ' {
                glyphs.push(Glyph::space());
                continue;
            }

            let surface = backend
                .rasterize(ch, RasterMode::Blended)
                .filter(|s| !s.is_empty())
                .or_else(|| {
                    debug!("Blended render empty for '{}' (trying solid)", ch);
                    backend
                        .rasterize(ch, RasterMode::Solid)
                        .filter(|s| !s.is_empty())
                });

            let Some(surface) = surface else {
                debug!("No surface for '{}', recorded as blank", ch);
                empty += 1;
                glyphs.push(Glyph::blank(0, 0));
                continue;
            };

            let width = surface.width as i32;
            let height = surface.height as i32;
            let pixels = extract_visible(&surface);
            if pixels.is_empty() {
                debug!("No visible pixels for '{}', recorded as blank", ch);
                empty += 1;
                glyphs.push(Glyph::blank(width, height));
                continue;
            }

            let advance = backend.advance(ch);
            debug!(
                "Glyph '{}': w={}, h={}, visible_pixels={}, advance={}",
                ch,
                width,
                height,
                pixels.len(),
                advance
            );
            glyphs.push(Glyph {
                width,
                height,
                advance,
                pixels,
            });
            loaded += 1;
        }

        drop(backend);

        if loaded == 0 {
            return Err(AtlasError::NoUsableGlyphs);
        }

        info!("Glyph atlas built: {} glyphs ({} blank)", loaded, empty);
        Ok(Self { glyphs })
    }

    /// Get glyph for a character (None outside ASCII 0x20-0x7E)
    pub fn get(&self, ch: char) -> Option<&Glyph> {
        let code = ch as u32;
        if !is_glyph_code(code) {
            return None;
        }
        self.glyphs.get((code - FIRST_GLYPH as u32) as usize)
    }

    /// Layout advance for a character.
    ///
    /// Space uses the fixed space advance; glyphs without a measured
    /// advance (blank or out of range) use the fallback advance.
    pub fn advance_of(&self, ch: char) -> i32 {
        if ch == ' ' {
            return SPACE_ADVANCE;
        }
        match self.get(ch) {
            Some(g) if g.advance > 0 => g.advance,
            _ => FALLBACK_ADVANCE,
        }
    }

    /// Number of glyphs with visible pixels
    pub fn loaded_count(&self) -> usize {
        self.glyphs.iter().filter(|g| !g.is_blank()).count()
    }
}

/// Scan a surface and keep every pixel whose alpha exceeds the threshold
fn extract_visible(surface: &RasterSurface) -> Vec<VisiblePixel> {
    let mut visible = Vec::new();
    for y in 0..surface.height {
        for x in 0..surface.width {
            let Some(color) = surface.pixel(x, y) else {
                continue;
            };
            if color.a > ALPHA_THRESHOLD {
                visible.push(VisiblePixel {
                    x: x as i32,
                    y: y as i32,
                    color,
                });
            }
        }
    }
    visible
}
