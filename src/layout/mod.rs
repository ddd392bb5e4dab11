//! Text layout
//!
//! Greedy word wrapping driven by per-glyph pixel advances.

pub mod wrap;

pub use wrap::{wrap, WrappedLine};
