//! Font loading and glyph atlas management
//!
//! Handles:
//! - Font file discovery
//! - TTF/OTF rasterization (fontdue)
//! - Sparse per-glyph pixel masks and advances

pub mod atlas;
pub mod discovery;
pub mod raster;

pub use atlas::{Glyph, GlyphAtlas};
pub use discovery::resolve_font_path;
pub use raster::FontdueRasterizer;
