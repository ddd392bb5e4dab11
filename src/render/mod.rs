//! Point rendering
//!
//! Handles:
//! - The minimal drawing surface the renderer needs (`Canvas`)
//! - A software framebuffer implementing it
//! - Jitter amplitude / noise source
//! - Drawing chat entries as jittered glyph pixels

pub mod framebuffer;
pub mod jitter;
pub mod renderer;

use anyhow::Result;

use crate::utils::Rgba;

pub use framebuffer::FrameBuffer;
pub use jitter::{JitterSource, JitterState, RngJitter};
pub use renderer::{JitterRenderer, Palette};

/// Drawing surface: the whole graphics backend surface the renderer uses
pub trait Canvas {
    /// Color (and alpha) for subsequent points
    fn set_draw_color(&mut self, color: Rgba);

    /// Plot one point; points outside the target are ignored
    fn draw_point(&mut self, x: i32, y: i32);

    /// Fill the whole target with an opaque color
    fn clear(&mut self, color: Rgba);

    /// Show the finished frame
    fn present(&mut self) -> Result<()>;
}
