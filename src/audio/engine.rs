use log::{debug, warn};

use crate::amp::chain::EffectChain;
use crate::amp::effects::EffectId;
use crate::amp::stages::preamp::{PreampType, SaturationState};
use crate::amp::stages::smoother::SmoothedParameter;
use crate::amp::stages::tonestack::{ToneControl, ToneStack};
use crate::audio::params::{
    DEFAULT_DRIVE, DEFAULT_OUTPUT, DEFAULT_TONE, EngineHandle, ParamSnapshot, output_gain,
};

const FALLBACK_SAMPLE_RATE: f64 = 44_100.0;

/// Everything one character owns: per-channel saturation and tone state, the
/// swept tone design and its five effects.
struct PreampSection {
    preamp: PreampType,
    saturation: [SaturationState; 2],
    tone_stacks: [ToneStack; 2],
    tone_control: ToneControl,
    chain: EffectChain,
}

impl PreampSection {
    fn new(preamp: PreampType, sample_rate: f64) -> Self {
        Self {
            preamp,
            saturation: [SaturationState::new(); 2],
            tone_stacks: std::array::from_fn(|_| ToneStack::new(preamp, sample_rate)),
            tone_control: ToneControl::new(preamp, sample_rate),
            chain: EffectChain::new(preamp),
        }
    }

    fn prepare(&mut self, sample_rate: f64, max_block_size: usize) {
        self.saturation = [SaturationState::new(); 2];
        self.tone_stacks = std::array::from_fn(|_| ToneStack::new(self.preamp, sample_rate));
        self.tone_control = ToneControl::new(self.preamp, sample_rate);
        self.chain.prepare(sample_rate as f32, max_block_size);
    }

    fn reset(&mut self) {
        for state in &mut self.saturation {
            state.reset();
        }
        for stack in &mut self.tone_stacks {
            stack.reset();
        }
        self.chain.reset();
    }
}

/// The real-time preamp.
///
/// Owns all three characters and runs only the active one. Control values
/// arrive through the [`EngineHandle`] returned by [`PreampEngine::new`] and
/// are latched at the start of every processed block.
pub struct PreampEngine {
    handle: EngineHandle,
    sections: [PreampSection; 3],
    active: PreampType,
    drive: SmoothedParameter,
    tone: SmoothedParameter,
    output: SmoothedParameter,
    /// Right-channel stand-in for mono buffers.
    mono_scratch: Vec<f32>,
    sample_rate: f64,
    prepared: bool,
}

macro_rules! effect_setters {
    ($($name:ident),* $(,)?) => {
        $(
            pub fn $name(&self, mix: f32) {
                self.handle.$name(mix);
            }
        )*
    };
}

impl PreampEngine {
    pub fn new() -> (Self, EngineHandle) {
        let handle = EngineHandle::new();
        let engine = Self {
            handle: handle.clone(),
            sections: PreampType::ALL.map(|preamp| PreampSection::new(preamp, FALLBACK_SAMPLE_RATE)),
            active: PreampType::default(),
            drive: SmoothedParameter::new(DEFAULT_DRIVE),
            tone: SmoothedParameter::new(DEFAULT_TONE),
            output: SmoothedParameter::new(output_gain(DEFAULT_OUTPUT)),
            mono_scratch: Vec::new(),
            sample_rate: FALLBACK_SAMPLE_RATE,
            prepared: false,
        };
        (engine, handle)
    }

    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    /// Configure for a sample rate and maximum block size, then clear all
    /// state. Every effect of every character is prepared here.
    pub fn prepare(&mut self, sample_rate: f64, max_block_size: usize) {
        let sample_rate = if sample_rate.is_finite() && sample_rate > 0.0 {
            sample_rate
        } else {
            warn!("Invalid sample rate {sample_rate}, falling back to {FALLBACK_SAMPLE_RATE} Hz");
            FALLBACK_SAMPLE_RATE
        };
        let max_block_size = max_block_size.max(1);

        // Latch first so every smoother and mix starts settled on its value.
        let snapshot = self.handle.shared().snapshot();
        self.apply(&snapshot);

        self.sample_rate = sample_rate;
        for section in &mut self.sections {
            section.prepare(sample_rate, max_block_size);
        }
        self.mono_scratch = vec![0.0; max_block_size];
        self.reset_smoothers();
        self.prepared = true;

        debug!(
            "Preamp engine prepared: {sample_rate} Hz, {max_block_size} samples, {}",
            self.active
        );
    }

    /// Clear filter, saturation, effect and smoother state. Configuration
    /// from [`PreampEngine::prepare`] is kept.
    pub fn reset(&mut self) {
        for section in &mut self.sections {
            section.reset();
        }
        self.reset_smoothers();
    }

    fn reset_smoothers(&mut self) {
        self.drive.reset(self.sample_rate);
        self.tone.reset(self.sample_rate);
        self.output.reset(self.sample_rate);
    }

    pub const fn is_prepared(&self) -> bool {
        self.prepared
    }

    pub const fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// The character used by the most recently processed block.
    pub const fn active_preamp_type(&self) -> PreampType {
        self.active
    }

    pub fn set_preamp_type(&self, index: usize) {
        self.handle.set_preamp_type(index);
    }

    pub fn set_drive(&self, drive: f32) {
        self.handle.set_drive(drive);
    }

    pub fn set_tone(&self, tone: f32) {
        self.handle.set_tone(tone);
    }

    pub fn set_output_gain(&self, output: f32) {
        self.handle.set_output_gain(output);
    }

    pub fn set_effect_mix(&self, effect: EffectId, mix: f32) {
        self.handle.set_effect_mix(effect, mix);
    }

    effect_setters! {
        set_cath_ember,
        set_cath_velvet,
        set_cath_drift,
        set_cath_echo,
        set_cath_haze,
        set_fil_fracture,
        set_fil_prism,
        set_fil_phase,
        set_fil_cascade,
        set_fil_glisten,
        set_steel_scorch,
        set_steel_snarl,
        set_steel_shred,
        set_steel_grind,
        set_steel_rust,
    }

    /// Process a block in place.
    ///
    /// One channel is treated as mono, two as stereo; further channels are
    /// left untouched. A bypassed block is left exactly as it came in and no
    /// state moves, smoothers included.
    pub fn process(&mut self, channels: &mut [&mut [f32]], bypassed: bool) {
        match channels {
            [] => {}
            [mono] => self.process_mono(mono, bypassed),
            [left, right, ..] => self.process_stereo(left, right, bypassed),
        }
    }

    pub fn process_stereo(&mut self, left: &mut [f32], right: &mut [f32], bypassed: bool) {
        if bypassed || !self.prepared {
            return;
        }

        self.latch();
        self.render(left, right);
    }

    /// Mono input runs through both channels of the stereo path and is folded
    /// back down, so stereo effects collapse rather than drop a side.
    ///
    /// With a decorrelating effect active (Drift, Prism, Cascade) the result
    /// is not the same as aliasing one buffer as both left and right: the two
    /// sides diverge and are averaged, instead of the right side's writes
    /// overwriting the left's in place.
    pub fn process_mono(&mut self, buffer: &mut [f32], bypassed: bool) {
        if bypassed || !self.prepared {
            return;
        }

        self.latch();

        let mut scratch = std::mem::take(&mut self.mono_scratch);
        let chunk_len = scratch.len().max(1);
        for chunk in buffer.chunks_mut(chunk_len) {
            let right = &mut scratch[..chunk.len()];
            right.copy_from_slice(chunk);
            self.render(chunk, right);
            for (l, r) in chunk.iter_mut().zip(right.iter()) {
                *l = 0.5 * (*l + *r);
            }
        }
        self.mono_scratch = scratch;
    }

    fn latch(&mut self) {
        let snapshot = self.handle.shared().snapshot();
        self.apply(&snapshot);
    }

    fn apply(&mut self, snapshot: &ParamSnapshot) {
        self.active = snapshot.preamp;
        self.drive.set_target(snapshot.drive);
        self.tone.set_target(snapshot.tone);
        self.output.set_target(snapshot.output_gain);
        for effect in EffectId::ALL {
            self.sections[effect.preamp().index()]
                .chain
                .set_effect_mix(effect, snapshot.mixes[effect.index()]);
        }
    }

    fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
        let len = left.len().min(right.len());
        let (left, right) = (&mut left[..len], &mut right[..len]);

        let section = &mut self.sections[self.active.index()];
        let preamp = section.preamp;
        let [sat_l, sat_r] = &mut section.saturation;
        let [stack_l, stack_r] = &mut section.tone_stacks;

        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let drive = self.drive.next_value();
            let tone = self.tone.next_value();
            let gain = self.output.next_value();
            let coefficients = section.tone_control.coefficients(tone);

            *l = stack_l.process(coefficients, preamp.saturate(sat_l, *l, drive)) * gain;
            *r = stack_r.process(coefficients, preamp.saturate(sat_r, *r, drive)) * gain;
        }

        section.chain.process(left, right);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f64 = 48_000.0;
    const BLOCK: usize = 512;

    fn prepared() -> (PreampEngine, EngineHandle) {
        let (mut engine, handle) = PreampEngine::new();
        engine.prepare(SR, BLOCK);
        (engine, handle)
    }

    fn sine(len: usize, offset: usize) -> Vec<f32> {
        (offset..offset + len)
            .map(|i| 0.6 * (i as f32 * 0.031).sin())
            .collect()
    }

    #[test]
    fn unprepared_engine_leaves_buffer_alone() {
        let (mut engine, _) = PreampEngine::new();
        assert!(!engine.is_prepared());
        let input = sine(64, 0);
        let mut left = input.clone();
        let mut right = input.clone();
        engine.process_stereo(&mut left, &mut right, false);
        assert_eq!(left, input);
        assert_eq!(right, input);
    }

    #[test]
    fn invalid_sample_rate_falls_back() {
        let (mut engine, _) = PreampEngine::new();
        engine.prepare(f64::NAN, BLOCK);
        assert!(engine.is_prepared());
        assert_eq!(engine.sample_rate(), FALLBACK_SAMPLE_RATE);
        engine.prepare(0.0, BLOCK);
        assert_eq!(engine.sample_rate(), FALLBACK_SAMPLE_RATE);
    }

    #[test]
    fn preamp_selection_is_latched_per_block() {
        let (mut engine, handle) = prepared();
        handle.set_preamp_type(2);
        assert_eq!(engine.active_preamp_type(), PreampType::Cathode);
        let mut left = vec![0.0; 16];
        let mut right = vec![0.0; 16];
        engine.process_stereo(&mut left, &mut right, false);
        assert_eq!(engine.active_preamp_type(), PreampType::SteelPlate);
    }

    #[test]
    fn bypass_does_not_latch() {
        let (mut engine, handle) = prepared();
        handle.set_preamp_type(1);
        let mut left = vec![0.3; 16];
        let mut right = vec![0.3; 16];
        engine.process_stereo(&mut left, &mut right, true);
        assert_eq!(engine.active_preamp_type(), PreampType::Cathode);
        assert_eq!(left, vec![0.3; 16]);
    }

    #[test]
    fn prepare_starts_smoothers_at_their_targets() {
        let (mut engine, handle) = PreampEngine::new();
        handle.set_drive(0.9);
        handle.set_output_gain(1.0);
        engine.prepare(SR, BLOCK);
        assert!(!engine.drive.is_smoothing());
        assert_eq!(engine.drive.current(), 0.9);
        assert_eq!(engine.output.current(), output_gain(1.0));
    }

    #[test]
    fn mono_matches_stereo_with_identical_channels() {
        let (mut mono, mono_handle) = prepared();
        let (mut stereo, stereo_handle) = prepared();
        for handle in [&mono_handle, &stereo_handle] {
            handle.set_preamp_type(0);
            handle.set_drive(0.8);
        }

        let input = sine(BLOCK * 3, 0);
        let mut mono_buffer = input.clone();
        mono.process_mono(&mut mono_buffer, false);

        let mut left = input.clone();
        let mut right = input;
        stereo.process_stereo(&mut left, &mut right, false);

        assert_eq!(left, right);
        assert_eq!(mono_buffer, left);
    }

    #[test]
    fn mono_longer_than_block_size_is_processed_in_chunks() {
        let (mut engine, _) = prepared();
        let mut buffer = sine(BLOCK * 2 + 100, 0);
        engine.process_mono(&mut buffer, false);
        assert!(buffer.iter().all(|s| s.is_finite()));
        assert_eq!(engine.mono_scratch.len(), BLOCK);
    }

    #[test]
    fn channel_slice_api_handles_counts() {
        let (mut engine, _) = prepared();
        let input = sine(128, 0);

        let mut a = input.clone();
        let mut b = input.clone();
        let mut c = input.clone();
        {
            let mut channels = vec![a.as_mut_slice(), b.as_mut_slice(), c.as_mut_slice()];
            engine.process(&mut channels, false);
        }
        assert_ne!(a, input);
        assert_eq!(c, input, "third channel is untouched");

        let mut empty: Vec<&mut [f32]> = Vec::new();
        engine.process(&mut empty, false);
    }

    #[test]
    fn reset_restores_fresh_output() {
        let (mut engine, handle) = prepared();
        handle.set_preamp_type(2);
        handle.set_steel_grind(0.5);

        let run = |engine: &mut PreampEngine| {
            let mut left = sine(BLOCK, 0);
            let mut right = sine(BLOCK, 7);
            engine.process_stereo(&mut left, &mut right, false);
            (left, right)
        };

        // Latch the mix, then start from a clean slate.
        run(&mut engine);
        engine.reset();
        let first = run(&mut engine);
        for _ in 0..5 {
            run(&mut engine);
        }
        engine.reset();
        assert_eq!(run(&mut engine), first);
    }
}
