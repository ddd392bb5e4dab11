//! Color parsing utilities
//!
//! Hex parsing for config values and packed-pixel helpers
//! shared by the software framebuffer.

use rand::Rng;

/// 8-bit RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from RGB components
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xFF }
    }

    /// Same RGB with a different alpha
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Random opaque color (components in 0..255, as the F1/F2 keys produce)
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::rgb(rng.gen_range(0..255), rng.gen_range(0..255), rng.gen_range(0..255))
    }

    /// Pack into 0x00RRGGBB (softbuffer pixel layout)
    pub const fn to_xrgb(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// Format as RRGGBB
    pub fn to_hex(self) -> String {
        format!("{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Parse 6-digit hex color (e.g., "ff0000" -> (255, 0, 0))
/// Also supports 3-digit short format (e.g., "f00" -> (255, 0, 0))
/// Returns None on invalid input.
pub fn parse_hex_color(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim_start_matches('#');
    if !hex.is_ascii() {
        return None;
    }
    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some((r, g, b))
        }
        3 => {
            // Short format: expand F -> FF
            let r = u8::from_str_radix(&hex[0..1], 16).ok()? * 17;
            let g = u8::from_str_radix(&hex[1..2], 16).ok()? * 17;
            let b = u8::from_str_radix(&hex[2..3], 16).ok()? * 17;
            Some((r, g, b))
        }
        _ => None,
    }
}

/// Parse hex color to opaque Rgba, falling back on invalid input
pub fn parse_hex_rgba(hex: &str, fallback: Rgba) -> Rgba {
    match parse_hex_color(hex) {
        Some((r, g, b)) => Rgba::rgb(r, g, b),
        None => fallback,
    }
}

/// Blend `src` over an opaque 0x00RRGGBB pixel using src alpha.
///
/// Standard "source over" with the destination treated as opaque,
/// so the result is opaque as well.
#[inline]
pub fn blend_over(dst: u32, src: Rgba) -> u32 {
    let a = src.a as u32;
    let inv = 255 - a;
    let dr = (dst >> 16) & 0xFF;
    let dg = (dst >> 8) & 0xFF;
    let db = dst & 0xFF;
    let r = (src.r as u32 * a + dr * inv + 127) / 255;
    let g = (src.g as u32 * a + dg * inv + 127) / 255;
    let b = (src.b as u32 * a + db * inv + 127) / 255;
    (r << 16) | (g << 8) | b
}
