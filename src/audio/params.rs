use crossbeam::atomic::AtomicCell;
use std::sync::Arc;

use crate::amp::effects::EffectId;
use crate::amp::stages::common::db_to_lin;
use crate::amp::stages::preamp::PreampType;

pub const PREAMP_TYPE_ID: &str = "preampType";
pub const DRIVE_ID: &str = "drive";
pub const TONE_ID: &str = "tone";
pub const OUTPUT_ID: &str = "output";
pub const BYPASS_ID: &str = "bypass";

pub const DEFAULT_DRIVE: f32 = 0.5;
pub const DEFAULT_TONE: f32 = 0.5;
pub const DEFAULT_OUTPUT: f32 = 0.5;

const OUTPUT_MIN_DB: f32 = -12.0;
const OUTPUT_RANGE_DB: f32 = 18.0;

/// Map the normalised output control onto -12 dB .. +6 dB, as a linear factor.
pub fn output_gain(value: f32) -> f32 {
    db_to_lin(value.mul_add(OUTPUT_RANGE_DB, OUTPUT_MIN_DB))
}

/// Clamp a normalised control into [0, 1]; `None` for NaN.
fn normalized(value: f32) -> Option<f32> {
    if value.is_nan() {
        None
    } else {
        Some(value.clamp(0.0, 1.0))
    }
}

/// Control values written by the host thread and latched by the audio thread
/// once per block.
#[derive(Debug)]
pub struct SharedParams {
    preamp: AtomicCell<usize>,
    drive: AtomicCell<f32>,
    tone: AtomicCell<f32>,
    output: AtomicCell<f32>,
    bypass: AtomicCell<bool>,
    mixes: [AtomicCell<f32>; EffectId::COUNT],
}

impl Default for SharedParams {
    fn default() -> Self {
        Self {
            preamp: AtomicCell::new(PreampType::default().index()),
            drive: AtomicCell::new(DEFAULT_DRIVE),
            tone: AtomicCell::new(DEFAULT_TONE),
            output: AtomicCell::new(DEFAULT_OUTPUT),
            bypass: AtomicCell::new(false),
            mixes: std::array::from_fn(|_| AtomicCell::new(0.0)),
        }
    }
}

/// One block's worth of control values, read without blocking.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ParamSnapshot {
    pub preamp: PreampType,
    pub drive: f32,
    pub tone: f32,
    /// Linear output gain.
    pub output_gain: f32,
    pub mixes: [f32; EffectId::COUNT],
}

impl SharedParams {
    pub fn snapshot(&self) -> ParamSnapshot {
        ParamSnapshot {
            preamp: PreampType::from_index(self.preamp.load()),
            drive: self.drive.load(),
            tone: self.tone.load(),
            output_gain: output_gain(self.output.load()),
            mixes: std::array::from_fn(|i| self.mixes[i].load()),
        }
    }
}

/// Cloneable control surface for the engine, safe to use from any thread.
///
/// Every setter is a single atomic store. The audio thread picks the values
/// up at the start of its next block, then the smoothers take it from there.
#[derive(Clone, Debug, Default)]
pub struct EngineHandle {
    params: Arc<SharedParams>,
}

macro_rules! effect_setters {
    ($($name:ident => $effect:ident),* $(,)?) => {
        $(
            pub fn $name(&self, mix: f32) {
                self.set_effect_mix(EffectId::$effect, mix);
            }
        )*
    };
}

impl EngineHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn shared(&self) -> &SharedParams {
        &self.params
    }

    /// Select a character by index; out-of-range indices clamp to Steel Plate.
    pub fn set_preamp_type(&self, index: usize) {
        self.params
            .preamp
            .store(PreampType::from_index(index).index());
    }

    pub fn preamp_type(&self) -> PreampType {
        PreampType::from_index(self.params.preamp.load())
    }

    pub fn set_drive(&self, drive: f32) {
        if let Some(drive) = normalized(drive) {
            self.params.drive.store(drive);
        }
    }

    pub fn drive(&self) -> f32 {
        self.params.drive.load()
    }

    pub fn set_tone(&self, tone: f32) {
        if let Some(tone) = normalized(tone) {
            self.params.tone.store(tone);
        }
    }

    pub fn tone(&self) -> f32 {
        self.params.tone.load()
    }

    /// Normalised output level; 0 is -12 dB, 1 is +6 dB.
    pub fn set_output_gain(&self, output: f32) {
        if let Some(output) = normalized(output) {
            self.params.output.store(output);
        }
    }

    pub fn output_gain(&self) -> f32 {
        self.params.output.load()
    }

    /// Bypass is advisory: the host reads it back and passes it to `process`.
    pub fn set_bypass(&self, bypass: bool) {
        self.params.bypass.store(bypass);
    }

    pub fn bypassed(&self) -> bool {
        self.params.bypass.load()
    }

    pub fn set_effect_mix(&self, effect: EffectId, mix: f32) {
        if let Some(mix) = normalized(mix) {
            self.params.mixes[effect.index()].store(mix);
        }
    }

    pub fn effect_mix(&self, effect: EffectId) -> f32 {
        self.params.mixes[effect.index()].load()
    }

    effect_setters! {
        set_cath_ember => CathEmber,
        set_cath_velvet => CathVelvet,
        set_cath_drift => CathDrift,
        set_cath_echo => CathEcho,
        set_cath_haze => CathHaze,
        set_fil_fracture => FilFracture,
        set_fil_prism => FilPrism,
        set_fil_phase => FilPhase,
        set_fil_cascade => FilCascade,
        set_fil_glisten => FilGlisten,
        set_steel_scorch => SteelScorch,
        set_steel_snarl => SteelSnarl,
        set_steel_shred => SteelShred,
        set_steel_grind => SteelGrind,
        set_steel_rust => SteelRust,
    }

    pub fn set_parameter(&self, name: &str, value: f32) -> Result<(), &'static str> {
        if !value.is_finite() {
            return Err("Parameter value must be finite");
        }

        match name {
            PREAMP_TYPE_ID => {
                self.set_preamp_type(value.round().clamp(0.0, 2.0) as usize);
                Ok(())
            }
            DRIVE_ID => {
                self.set_drive(value);
                Ok(())
            }
            TONE_ID => {
                self.set_tone(value);
                Ok(())
            }
            OUTPUT_ID => {
                self.set_output_gain(value);
                Ok(())
            }
            BYPASS_ID => {
                self.set_bypass(value >= 0.5);
                Ok(())
            }
            _ => match EffectId::from_param_id(name) {
                Some(effect) => {
                    self.set_effect_mix(effect, value);
                    Ok(())
                }
                None => Err("Unknown parameter name"),
            },
        }
    }

    pub fn get_parameter(&self, name: &str) -> Result<f32, &'static str> {
        match name {
            PREAMP_TYPE_ID => Ok(self.preamp_type().index() as f32),
            DRIVE_ID => Ok(self.drive()),
            TONE_ID => Ok(self.tone()),
            OUTPUT_ID => Ok(self.output_gain()),
            BYPASS_ID => Ok(if self.bypassed() { 1.0 } else { 0.0 }),
            _ => EffectId::from_param_id(name)
                .map(|effect| self.effect_mix(effect))
                .ok_or("Unknown parameter name"),
        }
    }

    /// Every parameter id, in host registration order.
    pub fn parameter_ids() -> impl Iterator<Item = &'static str> {
        [PREAMP_TYPE_ID, DRIVE_ID, TONE_ID, OUTPUT_ID, BYPASS_ID]
            .into_iter()
            .chain(EffectId::ALL.into_iter().map(EffectId::param_id))
    }
}
