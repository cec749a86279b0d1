/// Ramp length used by every smoothed control in the engine.
pub const SMOOTHING_TIME_SECONDS: f64 = 0.02;

/// Linear parameter ramp.
///
/// A new target starts a straight line from the last returned value that lands
/// exactly on the target after [`SMOOTHING_TIME_SECONDS`] worth of samples.
/// Retargeting mid-ramp restarts the line from wherever the ramp currently is,
/// so the produced sequence never jumps.
#[derive(Clone, Debug)]
pub struct SmoothedParameter {
    current: f32,
    target: f32,
    step: f32,
    countdown: usize,
    steps_to_target: usize,
}

impl SmoothedParameter {
    pub const fn new(initial: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            step: 0.0,
            countdown: 0,
            steps_to_target: 0,
        }
    }

    /// Number of samples a full ramp takes at `sample_rate`.
    pub fn ramp_length(sample_rate: f64) -> usize {
        (sample_rate.max(0.0) * SMOOTHING_TIME_SECONDS).floor() as usize
    }

    /// Reconfigure the ramp length and jump straight to the current target.
    pub fn reset(&mut self, sample_rate: f64) {
        self.steps_to_target = Self::ramp_length(sample_rate);
        self.set_current_and_target(self.target);
    }

    /// Jump to `value` with no ramp.
    pub const fn set_current_and_target(&mut self, value: f32) {
        self.current = value;
        self.target = value;
        self.step = 0.0;
        self.countdown = 0;
    }

    pub fn set_target(&mut self, value: f32) {
        if value == self.target {
            return;
        }

        if self.steps_to_target == 0 {
            self.set_current_and_target(value);
            return;
        }

        self.target = value;
        self.countdown = self.steps_to_target;
        self.step = (self.target - self.current) / self.countdown as f32;
    }

    #[inline]
    pub fn next_value(&mut self) -> f32 {
        if self.countdown == 0 {
            return self.target;
        }

        self.countdown -= 1;
        if self.countdown > 0 {
            self.current += self.step;
        } else {
            self.current = self.target;
        }

        self.current
    }

    pub const fn current(&self) -> f32 {
        if self.countdown == 0 {
            self.target
        } else {
            self.current
        }
    }

    pub const fn target(&self) -> f32 {
        self.target
    }

    pub const fn is_smoothing(&self) -> bool {
        self.countdown > 0
    }
}

impl Default for SmoothedParameter {
    fn default() -> Self {
        Self::new(0.0)
    }
}
