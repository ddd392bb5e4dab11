//! Jitter amplitude and noise source
//!
//! The amplitude ("rate") shrinks by a fixed step for every point drawn,
//! so text settles the longer it stays on screen, and jumps back up
//! whenever the log grows.

use rand::rngs::ThreadRng;
use rand::Rng;

use crate::constants::{RATE_DECAY, RATE_FLOOR, RATE_RESET};

/// Decaying jitter amplitude
#[derive(Debug, Clone, PartialEq)]
pub struct JitterState {
    rate: f32,
    rate_reset: f32,
    floor: f32,
    decay: f32,
}

impl Default for JitterState {
    fn default() -> Self {
        Self::new(RATE_RESET, RATE_FLOOR, RATE_DECAY)
    }
}

impl JitterState {
    /// Start at `rate_reset`
    pub fn new(rate_reset: f32, floor: f32, decay: f32) -> Self {
        Self {
            rate: rate_reset,
            rate_reset,
            floor,
            decay,
        }
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn rate_reset(&self) -> f32 {
        self.rate_reset
    }

    /// Restore full amplitude (new log content)
    pub fn reset(&mut self) {
        self.rate = self.rate_reset;
    }

    /// Add to the current amplitude (manual glitch key)
    pub fn bump(&mut self, delta: f32) {
        self.rate = (self.rate + delta).max(self.floor);
    }

    /// One point drawn: step toward the floor
    pub fn decay_step(&mut self) {
        if self.rate > self.floor {
            self.rate -= self.decay;
        }
    }

    /// Replace tuning values, keeping the current amplitude
    pub fn retune(&mut self, rate_reset: f32, floor: f32, decay: f32) {
        self.rate_reset = rate_reset;
        self.floor = floor;
        self.decay = decay;
    }

    /// Width of the integer offset range, at least 1
    pub fn span(&self) -> i32 {
        (self.rate as i32).max(1)
    }
}

/// Source of per-pixel noise
pub trait JitterSource {
    /// Uniform integer in [0, span)
    fn sample(&mut self, span: i32) -> i32;

    /// Offset in [-span/2, span - span/2), i.e. within [-rate/2, rate/2)
    fn offset(&mut self, span: i32) -> i32 {
        self.sample(span) - span / 2
    }
}

/// JitterSource backed by a `rand` generator
#[derive(Debug, Clone)]
pub struct RngJitter<R> {
    rng: R,
}

impl RngJitter<ThreadRng> {
    /// Unseeded thread-local generator
    pub fn thread() -> Self {
        Self::new(rand::thread_rng())
    }
}

impl<R: Rng> RngJitter<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> JitterSource for RngJitter<R> {
    fn sample(&mut self, span: i32) -> i32 {
        if span <= 1 {
            return 0;
        }
        self.rng.gen_range(0..span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_decay_stops_at_floor() {
        let mut state = JitterState::new(2.0, 1.1, 0.25);
        for _ in 0..100 {
            state.decay_step();
        }
        assert!(state.rate() <= 1.1);
        assert!(state.rate() > 1.1 - 0.25);
        let settled = state.rate();
        state.decay_step();
        assert_eq!(state.rate(), settled);
    }

    #[test]
    fn test_reset_and_bump() {
        let mut state = JitterState::default();
        for _ in 0..1000 {
            state.decay_step();
        }
        assert!(state.rate() < RATE_RESET);
        state.reset();
        assert_eq!(state.rate(), RATE_RESET);
        state.bump(RATE_RESET);
        assert_eq!(state.rate(), 2.0 * RATE_RESET);
    }

    #[test]
    fn test_span_truncates() {
        assert_eq!(JitterState::new(20.0, 1.1, 0.0).span(), 20);
        assert_eq!(JitterState::new(7.9, 1.1, 0.0).span(), 7);
        assert_eq!(JitterState::new(1.1, 1.1, 0.0).span(), 1);
    }

    #[test]
    fn test_rng_offsets_within_half_rate() {
        let mut source = RngJitter::new(StdRng::seed_from_u64(7));
        for span in [1, 2, 3, 7, 20] {
            let half = span as f32 / 2.0;
            for _ in 0..500 {
                let off = source.offset(span) as f32;
                assert!(off >= -half && off < half, "{} outside span {}", off, span);
            }
        }
        // Span 1 means no movement at all
        assert_eq!(source.offset(1), 0);
    }
}
