//! Global constants for glitchtail
//!
//! Consolidates layout, timing, and glyph constants
//! to eliminate magic numbers throughout the codebase.

// ============================================================================
// Window Defaults
// ============================================================================

/// Default window width in pixels
pub const DEFAULT_WINDOW_WIDTH: u32 = 751;

/// Default window height in pixels
pub const DEFAULT_WINDOW_HEIGHT: u32 = 822;

/// Default window X position
pub const DEFAULT_WINDOW_X: i32 = 1794;

/// Default window Y position
pub const DEFAULT_WINDOW_Y: i32 = 850;

// ============================================================================
// Timing Constants
// ============================================================================

/// Delay between frames in milliseconds
pub const FRAME_DELAY_MS: u64 = 10;

// ============================================================================
// Layout Constants
// ============================================================================

/// Maximum number of chat entries kept on screen
pub const MAX_ENTRIES: usize = 50;

/// Horizontal margin on both sides of the log (pixels)
pub const MARGIN_X: i32 = 7;

/// Vertical margin above and below the log (pixels)
pub const MARGIN_Y: i32 = 5;

/// Height of one wrapped row (pixels)
pub const LINE_HEIGHT: i32 = 20;

/// Fixed advance used for the space character
pub const SPACE_ADVANCE: i32 = 7;

/// Advance used for glyphs that failed to rasterize
pub const FALLBACK_ADVANCE: i32 = 20;

/// Scroll step for one key press (pixels)
pub const SCROLL_STEP: i32 = 50;

/// Entries this far outside the viewport are skipped (pixels)
pub const OFFSCREEN_SLACK: i32 = 100;

// ============================================================================
// Glyph Constants
// ============================================================================

/// First printable ASCII code kept in the atlas (space)
pub const FIRST_GLYPH: u8 = 0x20;

/// Last printable ASCII code kept in the atlas (tilde)
pub const LAST_GLYPH: u8 = 0x7E;

/// Pixels with alpha at or below this are dropped from glyph masks
pub const ALPHA_THRESHOLD: u8 = 50;

// ============================================================================
// Jitter Constants
// ============================================================================

/// Jitter amplitude restored whenever the log grows
pub const RATE_RESET: f32 = 20.0;

/// Jitter amplitude never decays below this
pub const RATE_FLOOR: f32 = 1.1;

/// Jitter decrement applied per drawn point
pub const RATE_DECAY: f32 = 0.0002;

/// Check if a byte is a printable ASCII glyph code
#[inline]
pub const fn is_glyph_code(code: u32) -> bool {
    code >= FIRST_GLYPH as u32 && code <= LAST_GLYPH as u32
}
