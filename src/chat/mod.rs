//! Chat log store
//!
//! Bounded, arrival-ordered list of wrapped log lines.
//! The oldest entry is evicted one at a time once the capacity is exceeded.

pub mod viewport;

use log::debug;
use std::collections::VecDeque;

use crate::constants::{LINE_HEIGHT, MARGIN_X, MAX_ENTRIES};
use crate::layout::{wrap, WrappedLine};

pub use viewport::Viewport;

/// Per-row width budget for a window of the given width
pub fn wrap_width_for(window_width: i32) -> i32 {
    window_width - 2 * MARGIN_X
}

/// One log line, laid out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    original: String,
    lines: Vec<WrappedLine>,
    rendered_height: i32,
}

impl ChatEntry {
    fn new(original: &str, wrap_width: i32, advance_of: impl Fn(char) -> i32) -> Self {
        let lines = wrap(original, wrap_width, advance_of);
        let rendered_height = lines.len() as i32 * LINE_HEIGHT;
        Self {
            original: original.to_string(),
            lines,
            rendered_height,
        }
    }

    /// Text as it arrived from the log
    #[cfg(test)]
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Wrapped rows, top to bottom
    pub fn lines(&self) -> &[WrappedLine] {
        &self.lines
    }

    /// rows * LINE_HEIGHT
    pub fn rendered_height(&self) -> i32 {
        self.rendered_height
    }
}

/// Bounded FIFO of chat entries
#[derive(Debug, Clone)]
pub struct ChatLog {
    entries: VecDeque<ChatEntry>,
    capacity: usize,
    wrap_width: i32,
    /// Sum of rendered heights, kept in step with every push/evict
    total_height: i32,
}

impl ChatLog {
    /// Store holding MAX_ENTRIES entries
    pub fn new(wrap_width: i32) -> Self {
        Self::with_capacity(MAX_ENTRIES, wrap_width)
    }

    pub fn with_capacity(capacity: usize, wrap_width: i32) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity: capacity.max(1),
            wrap_width,
            total_height: 0,
        }
    }

    /// Append one raw log line.
    ///
    /// Blank lines are ignored. Returns true if an entry was added.
    pub fn append(&mut self, raw_line: &str, advance_of: impl Fn(char) -> i32) -> bool {
        if raw_line.trim().is_empty() {
            return false;
        }

        let entry = ChatEntry::new(raw_line, self.wrap_width, advance_of);
        self.total_height += entry.rendered_height;
        let rows = entry.lines.len();
        let widest = entry.lines.iter().map(|l| l.width()).max().unwrap_or(0);
        self.entries.push_back(entry);

        if self.entries.len() > self.capacity {
            if let Some(old) = self.entries.pop_front() {
                self.total_height -= old.rendered_height;
            }
        }

        debug!(
            "Added entry {}: '{}' (wrapped to {} lines, widest {}px)",
            self.entries.len(),
            raw_line,
            rows,
            widest
        );
        true
    }

    /// Change the row budget and re-lay out every entry from its original text
    pub fn set_wrap_width(&mut self, wrap_width: i32, advance_of: impl Fn(char) -> i32) {
        if wrap_width == self.wrap_width {
            return;
        }
        self.wrap_width = wrap_width;
        let reflowed: VecDeque<ChatEntry> = self
            .entries
            .iter()
            .map(|e| ChatEntry::new(&e.original, wrap_width, &advance_of))
            .collect();
        self.total_height = reflowed.iter().map(|e| e.rendered_height).sum();
        self.entries = reflowed;
        debug!("Reflowed {} entries at width {}", self.entries.len(), wrap_width);
    }

    /// Sum of rendered heights of all entries
    pub fn total_height(&self) -> i32 {
        self.total_height
    }

    /// Entries, oldest first
    pub fn entries(&self) -> impl Iterator<Item = &ChatEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub fn wrap_width(&self) -> i32 {
        self.wrap_width
    }
}
