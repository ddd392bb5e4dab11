//! Greedy word wrap
//!
//! Splits a log line into rows that fit a pixel budget, measuring words
//! with per-glyph advances. Layout only: no colors, no drawing.

use crate::constants::SPACE_ADVANCE;

/// Word delimiters: consecutive delimiters collapse
const DELIMITERS: [char; 3] = [' ', '\t', '\n'];

/// One visually laid-out row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedLine {
    text: String,
    /// Measured width in pixels
    width: i32,
}

impl WrappedLine {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn width(&self) -> i32 {
        self.width
    }
}

/// Pixel width of a single word
pub fn word_width(word: &str, advance_of: impl Fn(char) -> i32) -> i32 {
    word.chars().map(advance_of).sum()
}

/// Wrap `text` into rows no wider than `max_width` pixels.
///
/// Words are never split: a word wider than the budget gets a row
/// of its own and overflows. Empty or delimiter-only input yields no rows.
pub fn wrap(text: &str, max_width: i32, advance_of: impl Fn(char) -> i32) -> Vec<WrappedLine> {
    let mut rows = Vec::new();
    let mut line = String::new();
    let mut line_width = 0;

    for word in text.split(DELIMITERS).filter(|w| !w.is_empty()) {
        let width = word_width(word, &advance_of);

        if !line.is_empty() && line_width + SPACE_ADVANCE + width > max_width {
            rows.push(WrappedLine {
                text: std::mem::take(&mut line),
                width: line_width,
            });
            line_width = 0;
        }

        if !line.is_empty() {
            line.push(' ');
            line_width += SPACE_ADVANCE;
        }
        line.push_str(word);
        line_width += width;
    }

    if !line.is_empty() {
        rows.push(WrappedLine {
            text: line,
            width: line_width,
        });
    }

    rows
}
