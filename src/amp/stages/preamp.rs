use crate::amp::stages::common::{DRIVEN_LIMIT, polarity, sanitize};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// The three preamp characters. Each one owns a saturation curve, a tone
/// filter cascade and a chain of five effects.
#[derive(
    ValueEnum, Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash,
)]
pub enum PreampType {
    /// Warm tube: asymmetric, even harmonics, slow and squishy.
    #[default]
    Cathode,
    /// Cold digital: symmetric, odd harmonics, instant transients.
    Filament,
    /// Industrial: rectified, gritty, scooped mids.
    SteelPlate,
}

impl std::fmt::Display for PreampType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cathode => write!(f, "Cathode"),
            Self::Filament => write!(f, "Filament"),
            Self::SteelPlate => write!(f, "Steel Plate"),
        }
    }
}

impl PreampType {
    pub const ALL: [Self; 3] = [Self::Cathode, Self::Filament, Self::SteelPlate];

    /// Map a host index to a character. Out-of-range values are clamped.
    pub const fn from_index(index: usize) -> Self {
        match index {
            0 => Self::Cathode,
            1 => Self::Filament,
            _ => Self::SteelPlate,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Run one sample through this character's waveshaper.
    ///
    /// `drive` is the smoothed, normalised drive control. Only the fields of
    /// `state` belonging to this character are read or written.
    #[inline]
    pub fn saturate(self, state: &mut SaturationState, input: f32, drive: f32) -> f32 {
        let input = sanitize(input);
        let drive = sanitize(drive).clamp(0.0, 1.0);

        match self {
            Self::Cathode => cathode(state, input, drive),
            Self::Filament => filament(input, drive),
            Self::SteelPlate => steel_plate(state, input, drive),
        }
    }
}

/// Per-channel memory of the saturation curves.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct SaturationState {
    /// Previous Cathode output, for slew limiting.
    pub last_sample: f32,
    /// Slow bias drift accumulator (Cathode).
    pub bias: f32,
    /// Slow rectification envelope (Steel Plate).
    pub rectify: f32,
}

impl SaturationState {
    pub const fn new() -> Self {
        Self {
            last_sample: 0.0,
            bias: 0.0,
            rectify: 0.0,
        }
    }

    pub const fn reset(&mut self) {
        *self = Self::new();
    }
}

#[inline]
fn cathode(state: &mut SaturationState, input: f32, drive: f32) -> f32 {
    const BIAS_RETAIN: f32 = 0.9995;
    const BIAS_TRACK: f32 = 0.0005;
    const OUTPUT_SCALE: f32 = 0.8;

    let gained = (input * drive.mul_add(2.5, 1.0)).clamp(-DRIVEN_LIMIT, DRIVEN_LIMIT);

    // Bias creeps toward a tenth of the signal, shifting the operating point.
    state.bias = state.bias.mul_add(BIAS_RETAIN, gained * 0.1 * BIAS_TRACK);
    let biased = state.bias.mul_add(drive, gained);

    let mut saturated = if biased > 0.0 {
        let soft = biased - biased * biased * biased / 3.0;
        (soft * 0.8).tanh() * 1.1
    } else {
        (biased * 1.1).tanh()
    };

    saturated += saturated * saturated * 0.15 * drive;

    // Heavier drive means a tighter slew limit.
    let slew_limit = (1.0 - drive).mul_add(0.7, 0.3);
    let delta = saturated - state.last_sample;
    if delta.abs() > slew_limit {
        saturated = state.last_sample + slew_limit.copysign(delta);
    }
    state.last_sample = saturated;

    saturated * OUTPUT_SCALE
}

#[inline]
fn filament(input: f32, drive: f32) -> f32 {
    const KNEE_RATIO: f32 = 0.3;
    const OUTPUT_SCALE: f32 = 0.85;

    let x = (input * drive.mul_add(3.0, 1.0)).clamp(-DRIVEN_LIMIT, DRIVEN_LIMIT);
    let x2 = x * x;
    let x3 = x2 * x;
    let x5 = x3 * x2;

    let mut shaped = x - x3 * 0.2 * drive + x5 * 0.05 * drive;

    // Never below 0.7, so the knee never divides down to nothing.
    let threshold = drive.mul_add(-0.3, 1.0);
    let magnitude = shaped.abs();
    if magnitude > threshold {
        let knee = (magnitude - threshold).mul_add(KNEE_RATIO, threshold);
        shaped = polarity(shaped) * knee.min(1.0);
    }

    shaped * OUTPUT_SCALE
}

#[inline]
fn steel_plate(state: &mut SaturationState, input: f32, drive: f32) -> f32 {
    const RECTIFY_RETAIN: f32 = 0.95;
    const RECTIFY_TRACK: f32 = 0.05;
    const PEAK_KNEE: f32 = 0.8;
    const OUTPUT_SCALE: f32 = 0.75;

    let gained = (input * drive.mul_add(4.0, 1.0)).clamp(-DRIVEN_LIMIT, DRIVEN_LIMIT);

    let rectified = gained.abs();
    let rect_mix = drive * 0.25;
    let blended = gained.mul_add(1.0 - rect_mix, rectified * rect_mix);

    let mut clipped = if blended > 0.0 {
        let mut x = blended;
        if x > 1.0 {
            let over = x - 1.0;
            x = 1.0 - over * 0.3 * drive;
        }
        (x * 1.5).tanh()
    } else {
        (blended * 2.0).tanh() * 0.9
    };

    // Crossover dead zone; zero width at zero drive.
    let crossover = 0.02 * drive;
    if crossover > 0.0 && clipped.abs() < crossover {
        clipped *= clipped.abs() / crossover;
    }

    state.rectify = state
        .rectify
        .mul_add(RECTIFY_RETAIN, rectified * RECTIFY_TRACK);
    let grit = state.rectify * drive * 0.1;
    clipped += grit * polarity(clipped);

    let magnitude = clipped.abs();
    if magnitude > PEAK_KNEE {
        clipped = polarity(clipped) * (magnitude - PEAK_KNEE).mul_add(0.5, PEAK_KNEE);
    }

    clipped * OUTPUT_SCALE
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Inputs up to +6 dBFS.
    const STRESS_AMPLITUDE: f32 = 2.0;
    const BOUND: f32 = 1.2;

    fn sweep(preamp: PreampType, drive: f32) -> f32 {
        let mut state = SaturationState::new();
        let mut peak = 0.0f32;
        let steps = 4000;
        for i in 0..steps {
            let phase = i as f32 / steps as f32;
            let x = STRESS_AMPLITUDE * (std::f32::consts::TAU * phase * 7.0).sin();
            peak = peak.max(preamp.saturate(&mut state, x, drive).abs());
        }
        // Sustained extremes charge the slow trackers fully.
        for &x in &[STRESS_AMPLITUDE, -STRESS_AMPLITUDE] {
            for _ in 0..20_000 {
                peak = peak.max(preamp.saturate(&mut state, x, drive).abs());
            }
        }
        peak
    }

    #[test]
    fn output_stays_bounded_for_all_drives() {
        for preamp in PreampType::ALL {
            for step in 0..=10 {
                let drive = step as f32 / 10.0;
                let peak = sweep(preamp, drive);
                assert!(
                    peak <= BOUND,
                    "{preamp} at drive {drive} peaked at {peak}"
                );
            }
        }
    }

    #[test]
    fn silence_in_silence_out() {
        for preamp in PreampType::ALL {
            let mut state = SaturationState::new();
            for _ in 0..1000 {
                assert_eq!(preamp.saturate(&mut state, 0.0, 0.7).abs(), 0.0);
            }
        }
    }

    #[test]
    fn filament_impulse_value_is_deterministic() {
        let mut state = SaturationState::new();
        // 2.5 - 1.5625 + 2.44140625 exceeds the 0.85 threshold and clamps to 1.
        let out = PreampType::Filament.saturate(&mut state, 1.0, 0.5);
        assert!((out - 0.85).abs() < 1e-6);
        assert_eq!(state, SaturationState::new(), "Filament is stateless");

        let small = PreampType::Filament.saturate(&mut state, 0.1, 0.5);
        let x = 0.25f32;
        let expected = (x - x.powi(3) * 0.1 + x.powi(5) * 0.025) * 0.85;
        assert!((small - expected).abs() < 1e-6);
    }

    #[test]
    fn cathode_is_asymmetric() {
        let mut pos_state = SaturationState::new();
        let mut neg_state = SaturationState::new();
        let pos = PreampType::Cathode.saturate(&mut pos_state, 0.5, 0.6);
        let neg = PreampType::Cathode.saturate(&mut neg_state, -0.5, 0.6);
        assert!((pos + neg).abs() > 1e-3, "expected asymmetry: {pos} vs {neg}");
    }

    #[test]
    fn cathode_slew_limit_caps_step() {
        let mut state = SaturationState::new();
        let out = PreampType::Cathode.saturate(&mut state, 0.25, 1.0);
        // Slew limit is 0.3 at full drive, then the 0.8 output scale.
        assert!((out - 0.3 * 0.8).abs() < 1e-6);
        assert!((state.last_sample - 0.3).abs() < 1e-6);
    }

    #[test]
    fn cathode_bias_drifts_slowly() {
        let mut state = SaturationState::new();
        PreampType::Cathode.saturate(&mut state, 1.0, 1.0);
        assert!((state.bias - 3.5 * 0.1 * 0.0005).abs() < 1e-7);
        assert_eq!(state.rectify, 0.0);
    }

    #[test]
    fn steel_plate_tracks_rectification() {
        let mut state = SaturationState::new();
        PreampType::SteelPlate.saturate(&mut state, -0.5, 0.5);
        assert!((state.rectify - 1.5 * 0.05).abs() < 1e-6);
        assert_eq!(state.bias, 0.0);
        assert_eq!(state.last_sample, 0.0);
    }

    #[test]
    fn steel_plate_dead_zone_pulls_small_values_to_zero() {
        let mut state = SaturationState::new();
        let tiny = PreampType::SteelPlate.saturate(&mut state, 0.001, 1.0);
        // Without the dead zone the clipped value would be tanh(0.005 * 1.5).
        let undamped = (0.005f32 * 1.5).tanh() * 0.75;
        assert!(tiny > 0.0);
        assert!(tiny < undamped * 0.5, "{tiny} vs {undamped}");
    }

    #[test]
    fn non_finite_input_is_absorbed() {
        for preamp in PreampType::ALL {
            let mut state = SaturationState::new();
            for x in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY, 1e30, -1e30] {
                let out = preamp.saturate(&mut state, x, 0.8);
                assert!(out.is_finite(), "{preamp} produced {out} from {x}");
            }
            assert!(state.bias.is_finite() && state.rectify.is_finite());
        }
    }

    #[test]
    fn index_mapping_clamps() {
        assert_eq!(PreampType::from_index(0), PreampType::Cathode);
        assert_eq!(PreampType::from_index(1), PreampType::Filament);
        assert_eq!(PreampType::from_index(2), PreampType::SteelPlate);
        assert_eq!(PreampType::from_index(99), PreampType::SteelPlate);
        for preamp in PreampType::ALL {
            assert_eq!(PreampType::from_index(preamp.index()), preamp);
        }
    }
}
