//! Soft-start slew limiter on the commanded target.

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Ramp {
    rate_per_s: f32,
    smoothed: f32,
}

impl Ramp {
    pub fn new(rate_per_s: f32) -> Self {
        Self {
            rate_per_s,
            smoothed: 0.0,
        }
    }

    /// Move toward `target` by at most `rate * dt_s`, never past it.
    /// Returns the new effective target.
    pub fn step(&mut self, target: f32, dt_s: f32) -> f32 {
        let max_change = self.rate_per_s * dt_s;
        if target > self.smoothed {
            self.smoothed += max_change.min(target - self.smoothed);
        } else if target < self.smoothed {
            self.smoothed -= max_change.min(self.smoothed - target);
        }
        self.smoothed
    }

    pub fn value(&self) -> f32 {
        self.smoothed
    }

    pub fn reset(&mut self) {
        self.smoothed = 0.0;
    }
}
