//! Scroll state for the chat log

use crate::constants::MARGIN_Y;

/// Vertical scroll position over the laid-out log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewport {
    /// Pixels scrolled from the top of the log
    offset: i32,
    /// Window height
    height: i32,
    /// Snap to the bottom whenever content changes
    following: bool,
}

impl Viewport {
    pub fn new(window_height: i32) -> Self {
        Self {
            offset: 0,
            height: window_height,
            following: true,
        }
    }

    /// Height available for rows (window minus top/bottom margins)
    pub fn visible_height(&self) -> i32 {
        self.height - 2 * MARGIN_Y
    }

    /// Largest valid offset for a log of `total_height`
    pub fn max_offset(&self, total_height: i32) -> i32 {
        (total_height - self.visible_height()).max(0)
    }

    pub fn offset(&self) -> i32 {
        self.offset
    }

    pub fn is_following(&self) -> bool {
        self.following
    }

    /// Set the offset, clamped to [0, max_offset]
    pub fn set_scroll_offset(&mut self, offset: i32, total_height: i32) {
        let max = self.max_offset(total_height);
        self.offset = offset.clamp(0, max);
        self.following = self.offset == max;
    }

    /// Jump to the bottom and keep following
    pub fn scroll_to_bottom(&mut self, total_height: i32) {
        self.offset = self.max_offset(total_height);
        self.following = true;
    }

    /// Re-clamp after content changed; follows the bottom if it was
    /// already there or if `new_content` arrived.
    pub fn refresh(&mut self, total_height: i32, new_content: bool) {
        if self.following || new_content {
            self.scroll_to_bottom(total_height);
        } else {
            self.set_scroll_offset(self.offset, total_height);
        }
    }

    /// Window was resized
    pub fn resize(&mut self, window_height: i32, total_height: i32) {
        self.height = window_height;
        self.refresh(total_height, false);
    }
}
