//! Indeterminate progress animation
//!
//! While total progress is unknown the splash bar sweeps back and forth:
//! the fill ramps 0 to 100 and reverses at the rails, advancing a fixed
//! step on every tick.

use std::time::Duration;

pub const BOUNCE_STEP: i64 = 2;
pub const BOUNCE_INTERVAL: Duration = Duration::from_millis(15);

/// Pure tick logic for the bouncing fill. The caller drives it from a
/// periodic timer and applies the returned position to the bar.
#[derive(Debug)]
pub struct BounceRamp {
    position: i64,
    direction: i64,
}

impl Default for BounceRamp {
    fn default() -> Self {
        Self::new()
    }
}

impl BounceRamp {
    pub fn new() -> Self {
        Self {
            position: 0,
            direction: 1,
        }
    }

    /// Advance one tick and return the new position in `0..=100`.
    pub fn tick(&mut self) -> u64 {
        self.position += BOUNCE_STEP * self.direction;
        if self.position >= 100 {
            self.position = 100;
            self.direction = -1;
        } else if self.position <= 0 {
            self.position = 0;
            self.direction = 1;
        }
        self.position as u64
    }
}
