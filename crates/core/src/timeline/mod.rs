use serde::{Deserialize, Serialize};

/// Monotonic scene-time cursor in seconds.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackClock {
    pub time_seconds: f64,
}

impl PlaybackClock {
    /// Moves the cursor forward. Negative or non-finite deltas are ignored.
    pub fn advance(&mut self, delta: f64) {
        if delta.is_finite() && delta > 0.0 {
            self.time_seconds += delta;
        }
    }

    pub fn elapsed(&self) -> f64 {
        self.time_seconds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_by_positive_deltas() {
        let mut clock = PlaybackClock::default();
        clock.advance(1.5);
        clock.advance(0.25);
        assert_eq!(clock.elapsed(), 1.75);
    }

    #[test]
    fn ignores_negative_and_nan() {
        let mut clock = PlaybackClock::default();
        clock.advance(-2.0);
        clock.advance(f64::NAN);
        assert_eq!(clock.elapsed(), 0.0);
    }
}
