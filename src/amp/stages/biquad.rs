use std::f64::consts::PI;

/// Normalised second-order coefficients (`a0` already divided out).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Coefficients {
    pub b0: f32,
    pub b1: f32,
    pub b2: f32,
    pub a1: f32,
    pub a2: f32,
}

/// Response shape of a second-order section.
///
/// Shelf and peak gains are linear factors, `1.0` meaning flat.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum FilterShape {
    LowPass { q: f32 },
    HighPass { q: f32 },
    BandPass { q: f32 },
    LowShelf { q: f32, gain: f32 },
    HighShelf { q: f32, gain: f32 },
    Peak { q: f32, gain: f32 },
}

const MIN_Q: f64 = 0.01;
const MIN_GAIN: f64 = 1e-6;
const MIN_FREQUENCY_HZ: f64 = 1.0;
const MAX_NYQUIST_RATIO: f64 = 0.49;

impl Coefficients {
    /// Pass-through section.
    pub const IDENTITY: Self = Self {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    /// Design a section for `shape` at `frequency` Hz.
    ///
    /// Frequency is clamped below Nyquist, Q and gain away from zero, so the
    /// result is always a finite, stable filter.
    pub fn design(shape: FilterShape, frequency: f32, sample_rate: f64) -> Self {
        let sample_rate = if sample_rate.is_finite() && sample_rate > 0.0 {
            sample_rate
        } else {
            44_100.0
        };
        let frequency =
            f64::from(frequency).clamp(MIN_FREQUENCY_HZ, sample_rate * MAX_NYQUIST_RATIO);

        match shape {
            FilterShape::LowPass { q } => {
                let n = 1.0 / (PI * frequency / sample_rate).tan();
                let n2 = n * n;
                let inv_q = 1.0 / f64::from(q).max(MIN_Q);
                let c1 = 1.0 / (1.0 + inv_q * n + n2);
                Self::from_f64(
                    [c1, c1 * 2.0, c1],
                    [1.0, c1 * 2.0 * (1.0 - n2), c1 * (1.0 - inv_q * n + n2)],
                )
            }
            FilterShape::HighPass { q } => {
                let n = (PI * frequency / sample_rate).tan();
                let n2 = n * n;
                let inv_q = 1.0 / f64::from(q).max(MIN_Q);
                let c1 = 1.0 / (1.0 + inv_q * n + n2);
                Self::from_f64(
                    [c1, c1 * -2.0, c1],
                    [1.0, c1 * 2.0 * (n2 - 1.0), c1 * (1.0 - inv_q * n + n2)],
                )
            }
            FilterShape::BandPass { q } => {
                let n = 1.0 / (PI * frequency / sample_rate).tan();
                let n2 = n * n;
                let inv_q = 1.0 / f64::from(q).max(MIN_Q);
                let c1 = 1.0 / (1.0 + inv_q * n + n2);
                Self::from_f64(
                    [c1 * n * inv_q, 0.0, -c1 * n * inv_q],
                    [1.0, c1 * 2.0 * (1.0 - n2), c1 * (1.0 - inv_q * n + n2)],
                )
            }
            FilterShape::LowShelf { q, gain } => {
                let (a, omega, beta) = shelf_terms(frequency, sample_rate, q, gain);
                let cos = omega.cos();
                let am1 = a - 1.0;
                let ap1 = a + 1.0;
                let am1_cos = am1 * cos;
                Self::from_f64(
                    [
                        a * (ap1 - am1_cos + beta),
                        a * 2.0 * (am1 - ap1 * cos),
                        a * (ap1 - am1_cos - beta),
                    ],
                    [
                        ap1 + am1_cos + beta,
                        -2.0 * (am1 + ap1 * cos),
                        ap1 + am1_cos - beta,
                    ],
                )
            }
            FilterShape::HighShelf { q, gain } => {
                let (a, omega, beta) = shelf_terms(frequency, sample_rate, q, gain);
                let cos = omega.cos();
                let am1 = a - 1.0;
                let ap1 = a + 1.0;
                let am1_cos = am1 * cos;
                Self::from_f64(
                    [
                        a * (ap1 + am1_cos + beta),
                        a * -2.0 * (am1 + ap1 * cos),
                        a * (ap1 + am1_cos - beta),
                    ],
                    [
                        ap1 - am1_cos + beta,
                        2.0 * (am1 - ap1 * cos),
                        ap1 - am1_cos - beta,
                    ],
                )
            }
            FilterShape::Peak { q, gain } => {
                let a = f64::from(gain).max(MIN_GAIN).sqrt();
                let omega = 2.0 * PI * frequency / sample_rate;
                let alpha = omega.sin() / (f64::from(q).max(MIN_Q) * 2.0);
                let c2 = -2.0 * omega.cos();
                Self::from_f64(
                    [1.0 + alpha * a, c2, 1.0 - alpha * a],
                    [1.0 + alpha / a, c2, 1.0 - alpha / a],
                )
            }
        }
    }

    fn from_f64(b: [f64; 3], a: [f64; 3]) -> Self {
        let inv_a0 = 1.0 / a[0];
        Self {
            b0: (b[0] * inv_a0) as f32,
            b1: (b[1] * inv_a0) as f32,
            b2: (b[2] * inv_a0) as f32,
            a1: (a[1] * inv_a0) as f32,
            a2: (a[2] * inv_a0) as f32,
        }
    }

    /// Magnitude response at `frequency` Hz.
    pub fn magnitude_at(&self, frequency: f32, sample_rate: f64) -> f32 {
        let w = 2.0 * PI * f64::from(frequency) / sample_rate;
        let (c1, s1) = (w.cos(), w.sin());
        let (c2, s2) = ((2.0 * w).cos(), (2.0 * w).sin());

        let num_re = f64::from(self.b0) + f64::from(self.b1) * c1 + f64::from(self.b2) * c2;
        let num_im = -(f64::from(self.b1) * s1 + f64::from(self.b2) * s2);
        let den_re = 1.0 + f64::from(self.a1) * c1 + f64::from(self.a2) * c2;
        let den_im = -(f64::from(self.a1) * s1 + f64::from(self.a2) * s2);

        (num_re.hypot(num_im) / den_re.hypot(den_im)) as f32
    }
}

fn shelf_terms(frequency: f64, sample_rate: f64, q: f32, gain: f32) -> (f64, f64, f64) {
    let a = f64::from(gain).max(MIN_GAIN).sqrt();
    let omega = 2.0 * PI * frequency / sample_rate;
    let beta = omega.sin() * a.sqrt() / f64::from(q).max(MIN_Q);
    (a, omega, beta)
}

/// Transposed direct form II delay state.
///
/// Holds no coefficients of its own, so a section can be fed a different
/// [`Coefficients`] every sample without disturbing its memory.
#[derive(Copy, Clone, Debug, Default)]
pub struct BiquadState {
    s1: f32,
    s2: f32,
}

impl BiquadState {
    pub const fn new() -> Self {
        Self { s1: 0.0, s2: 0.0 }
    }

    pub const fn reset(&mut self) {
        self.s1 = 0.0;
        self.s2 = 0.0;
    }

    #[inline]
    pub fn process(&mut self, c: &Coefficients, input: f32) -> f32 {
        let output = c.b0.mul_add(input, self.s1);
        self.s1 = c.b1.mul_add(input, (-c.a1).mul_add(output, self.s2));
        self.s2 = c.b2 * input - c.a2 * output;
        output
    }
}

/// A section with fixed coefficients and its own state.
#[derive(Copy, Clone, Debug)]
pub struct Biquad {
    coefficients: Coefficients,
    state: BiquadState,
}

impl Biquad {
    pub fn new(shape: FilterShape, frequency: f32, sample_rate: f64) -> Self {
        Self::with_coefficients(Coefficients::design(shape, frequency, sample_rate))
    }

    pub const fn with_coefficients(coefficients: Coefficients) -> Self {
        Self {
            coefficients,
            state: BiquadState::new(),
        }
    }

    pub const fn coefficients(&self) -> &Coefficients {
        &self.coefficients
    }

    pub const fn reset(&mut self) {
        self.state.reset();
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        self.state.process(&self.coefficients, input)
    }
}

impl Default for Biquad {
    fn default() -> Self {
        Self::with_coefficients(Coefficients::IDENTITY)
    }
}
