use crate::amp::stages::biquad::{Biquad, BiquadState, Coefficients, FilterShape};
use crate::amp::stages::preamp::PreampType;
use std::f32::consts::FRAC_1_SQRT_2;

/// Corner of the high-pass that removes saturation bias.
pub const DC_BLOCKER_HZ: f32 = 10.0;

const MAX_FIXED_STAGES: usize = 2;

/// Coefficients of the swept tone stage for `preamp` at normalised `tone`.
///
/// * Cathode: low shelf, 600 Hz - 3.6 kHz, gain 0.6 - 1.4
/// * Filament: high shelf, 1 kHz - 7 kHz, gain 0.7 - 1.3
/// * Steel Plate: peak, 800 Hz - 4.8 kHz, gain 0.5 - 1.5
pub fn tone_coefficients(preamp: PreampType, tone: f32, sample_rate: f64) -> Coefficients {
    let tone = if tone.is_finite() {
        tone.clamp(0.0, 1.0)
    } else {
        0.5
    };

    match preamp {
        PreampType::Cathode => Coefficients::design(
            FilterShape::LowShelf {
                q: 0.6,
                gain: tone.mul_add(0.8, 0.6),
            },
            tone.mul_add(3000.0, 600.0),
            sample_rate,
        ),
        PreampType::Filament => Coefficients::design(
            FilterShape::HighShelf {
                q: 0.707,
                gain: tone.mul_add(0.6, 0.7),
            },
            tone.mul_add(6000.0, 1000.0),
            sample_rate,
        ),
        PreampType::SteelPlate => Coefficients::design(
            FilterShape::Peak {
                q: 1.5,
                gain: 0.5 + tone,
            },
            tone.mul_add(4000.0, 800.0),
            sample_rate,
        ),
    }
}

/// Fixed voicing stages that follow the tone stage, as `(shape, frequency)`.
fn voicing(preamp: PreampType) -> &'static [(FilterShape, f32)] {
    match preamp {
        // Low-end body, then a dark top.
        PreampType::Cathode => &[
            (FilterShape::LowShelf { q: 0.7, gain: 1.4 }, 120.0),
            (FilterShape::LowPass { q: 0.5 }, 8000.0),
        ],
        // Air.
        PreampType::Filament => &[(
            FilterShape::HighShelf {
                q: 0.707,
                gain: 1.3,
            },
            10_000.0,
        )],
        // Mid scoop, then a harsh presence spike.
        PreampType::SteelPlate => &[
            (FilterShape::Peak { q: 1.2, gain: 0.6 }, 400.0),
            (FilterShape::Peak { q: 2.0, gain: 1.8 }, 3500.0),
        ],
    }
}

/// One channel of one character's tone cascade:
/// swept tone stage, fixed voicing stages, DC blocker.
#[derive(Clone, Debug)]
pub struct ToneStack {
    preamp: PreampType,
    tone: BiquadState,
    fixed: [Biquad; MAX_FIXED_STAGES],
    fixed_count: usize,
    dc_blocker: Biquad,
}

impl ToneStack {
    pub fn new(preamp: PreampType, sample_rate: f64) -> Self {
        let mut fixed = [Biquad::default(); MAX_FIXED_STAGES];
        let stages = voicing(preamp);
        for (slot, &(shape, frequency)) in fixed.iter_mut().zip(stages) {
            *slot = Biquad::new(shape, frequency, sample_rate);
        }

        Self {
            preamp,
            tone: BiquadState::new(),
            fixed,
            fixed_count: stages.len().min(MAX_FIXED_STAGES),
            dc_blocker: Biquad::new(
                FilterShape::HighPass { q: FRAC_1_SQRT_2 },
                DC_BLOCKER_HZ,
                sample_rate,
            ),
        }
    }

    pub const fn preamp(&self) -> PreampType {
        self.preamp
    }

    pub fn reset(&mut self) {
        self.tone.reset();
        for stage in &mut self.fixed {
            stage.reset();
        }
        self.dc_blocker.reset();
    }

    /// Filter one sample. `tone` comes from [`ToneControl::coefficients`] and
    /// may change every call.
    #[inline]
    pub fn process(&mut self, tone: &Coefficients, input: f32) -> f32 {
        let mut y = self.tone.process(tone, input);
        for stage in &mut self.fixed[..self.fixed_count] {
            y = stage.process(y);
        }
        self.dc_blocker.process(y)
    }
}

/// Per-character cache of the swept tone coefficients.
///
/// The tone stage follows the smoothed tone control sample by sample; while
/// the control is parked the last design is reused.
#[derive(Clone, Debug)]
pub struct ToneControl {
    preamp: PreampType,
    sample_rate: f64,
    last_tone: Option<f32>,
    coefficients: Coefficients,
}

impl ToneControl {
    pub const fn new(preamp: PreampType, sample_rate: f64) -> Self {
        Self {
            preamp,
            sample_rate,
            last_tone: None,
            coefficients: Coefficients::IDENTITY,
        }
    }

    #[inline]
    pub fn coefficients(&mut self, tone: f32) -> &Coefficients {
        if self.last_tone != Some(tone) {
            self.coefficients = tone_coefficients(self.preamp, tone, self.sample_rate);
            self.last_tone = Some(tone);
        }
        &self.coefficients
    }
}
