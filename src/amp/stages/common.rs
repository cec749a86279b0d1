use std::f32::consts::PI;

/// Magnitude ceiling applied to driven signals before polynomial shaping.
///
/// Far above anything a real input produces, but keeps `x^5` finite in `f32`.
pub const DRIVEN_LIMIT: f32 = 64.0;

/// Convert decibels to linear amplitude.
#[inline]
pub fn db_to_lin(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

/// Calculate a one-pole smoothing coefficient from a time constant in milliseconds.
///
/// Returns `exp(-1 / (sample_rate * time_ms * 0.001))`.
#[inline]
pub fn calculate_coefficient(time_ms: f32, sample_rate: f32) -> f32 {
    (-1.0 / (sample_rate * 0.001 * time_ms.max(0.001))).exp()
}

/// Replace NaN and infinities with silence.
#[inline]
pub fn sanitize(sample: f32) -> f32 {
    if sample.is_finite() { sample } else { 0.0 }
}

/// Sign helper matching the saturation curves: zero counts as negative.
#[inline]
pub fn polarity(sample: f32) -> f32 {
    if sample > 0.0 { 1.0 } else { -1.0 }
}

/// First-order DC blocker.
///
/// `y[n] = x[n] - x[n-1] + R * y[n-1]`
///
/// Reference: <https://ccrma.stanford.edu/~jos/fp/DC_Blocker.html>
#[derive(Clone, Debug)]
pub struct DcBlocker {
    x_prev: f32,
    y_prev: f32,
    coeff: f32,
}

impl DcBlocker {
    pub fn new(cutoff_hz: f32, sample_rate: f32) -> Self {
        let coeff = (-2.0 * PI * cutoff_hz / sample_rate.max(1.0)).exp();
        Self {
            x_prev: 0.0,
            y_prev: 0.0,
            coeff,
        }
    }

    pub const fn reset(&mut self) {
        self.x_prev = 0.0;
        self.y_prev = 0.0;
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.coeff.mul_add(self.y_prev, input - self.x_prev);
        self.x_prev = input;
        self.y_prev = output;
        output
    }
}

/// One-pole envelope follower with configurable attack and release coefficients.
#[derive(Clone, Debug)]
pub struct EnvelopeFollower {
    envelope: f32,
    attack_coeff: f32,
    release_coeff: f32,
}

impl EnvelopeFollower {
    pub const fn new(attack_coeff: f32, release_coeff: f32) -> Self {
        Self {
            envelope: 0.0,
            attack_coeff,
            release_coeff,
        }
    }

    /// Create from attack/release times in milliseconds.
    pub fn from_ms(attack_ms: f32, release_ms: f32, sample_rate: f32) -> Self {
        Self::new(
            calculate_coefficient(attack_ms, sample_rate),
            calculate_coefficient(release_ms, sample_rate),
        )
    }

    pub const fn value(&self) -> f32 {
        self.envelope
    }

    pub const fn reset(&mut self) {
        self.envelope = 0.0;
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let abs_input = input.abs();
        let coeff = if abs_input > self.envelope {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.envelope = coeff.mul_add(self.envelope, (1.0 - coeff) * abs_input);
        self.envelope
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_conversion_matches_output_gain_mapping() {
        assert!((db_to_lin(0.0) - 1.0).abs() < 1e-6);
        assert!((db_to_lin(-3.0) - 0.707_945_8).abs() < 1e-5);
        assert!((db_to_lin(6.0) - 1.995_262_3).abs() < 1e-5);
    }

    #[test]
    fn sanitize_replaces_non_finite_samples() {
        assert_eq!(sanitize(0.25), 0.25);
        assert_eq!(sanitize(f32::NAN), 0.0);
        assert_eq!(sanitize(f32::INFINITY), 0.0);
        assert_eq!(sanitize(f32::NEG_INFINITY), 0.0);
    }

    #[test]
    fn dc_blocker_removes_offset() {
        let mut blocker = DcBlocker::new(15.0, 48_000.0);
        let mut last = 1.0;
        for _ in 0..48_000 {
            last = blocker.process(0.5);
        }
        assert!(last.abs() < 1e-3, "residual DC {last}");
    }

    #[test]
    fn envelope_follows_attack_and_release() {
        let mut env = EnvelopeFollower::from_ms(1.0, 50.0, 48_000.0);
        for _ in 0..480 {
            env.process(1.0);
        }
        assert!(env.value() > 0.99);
        for _ in 0..480 {
            env.process(0.0);
        }
        assert!(env.value() < 0.9 && env.value() > 0.5);
        env.reset();
        assert_eq!(env.value(), 0.0);
    }
}
