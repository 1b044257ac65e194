//! Running glucose total.

/// Per-tick normalization applied to the glucose rate before accumulation.
///
/// Decouples the accumulated total from the scheduler's wall-clock period.
pub const TICK_RATE_DIVISOR: f64 = 10.0;

/// Monotonic running total of glucose produced since the last reset.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GlucoseAccumulator {
    total: f64,
}

impl GlucoseAccumulator {
    pub fn new() -> Self {
        Self { total: 0.0 }
    }

    /// Add a non-negative amount. Negative or non-finite deltas are ignored
    /// so the total never decreases.
    pub fn add(&mut self, delta: f64) {
        if delta.is_finite() && delta > 0.0 {
            self.total += delta;
        }
    }

    /// Accumulate one tick's worth of production at `glucose_rate`.
    pub fn add_tick(&mut self, glucose_rate: f64) -> f64 {
        let delta = glucose_rate / TICK_RATE_DIVISOR;
        self.add(delta);
        delta
    }

    pub fn value(&self) -> f64 {
        self.total
    }

    /// Total rounded down to whole grams, as shown in readouts.
    pub fn whole_grams(&self) -> u64 {
        self.total.floor() as u64
    }

    pub fn reset(&mut self) {
        self.total = 0.0;
    }
}
