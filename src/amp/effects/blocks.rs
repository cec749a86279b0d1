//! Building blocks shared by the effect units: wet/dry mix, delay line, LFO,
//! one-pole filter, reverb tank and bit quantiser.

use crate::amp::stages::smoother::SmoothedParameter;
use std::f32::consts::{PI, TAU};

/// What a unit should do with the block it is about to process.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MixState {
    /// Mix settled at zero: leave the block alone and skip the wet path.
    Parked,
    /// First block after a parked stretch: tails are stale and must be cleared.
    Resumed,
    Active,
}

/// Smoothed wet/dry control.
#[derive(Clone, Debug)]
pub struct WetDry {
    mix: SmoothedParameter,
    sample_rate: f32,
    parked: bool,
}

impl WetDry {
    pub const fn new() -> Self {
        Self {
            mix: SmoothedParameter::new(0.0),
            sample_rate: 0.0,
            parked: true,
        }
    }

    pub fn prepare(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.mix.reset(f64::from(sample_rate));
        self.parked = true;
    }

    pub fn reset(&mut self) {
        self.mix.reset(f64::from(self.sample_rate));
        self.parked = true;
    }

    pub fn set(&mut self, mix: f32) {
        let mix = if mix.is_finite() { mix.clamp(0.0, 1.0) } else { 0.0 };
        self.mix.set_target(mix);
    }

    pub const fn target(&self) -> f32 {
        self.mix.target()
    }

    /// True while the mix is parked at zero; the unit can skip its block.
    pub fn is_silent(&self) -> bool {
        !self.mix.is_smoothing() && self.mix.target() == 0.0
    }

    /// Call once at the top of every block.
    pub fn begin_block(&mut self) -> MixState {
        let silent = self.is_silent();
        let was_parked = std::mem::replace(&mut self.parked, silent);
        match (silent, was_parked) {
            (true, _) => MixState::Parked,
            (false, true) => MixState::Resumed,
            (false, false) => MixState::Active,
        }
    }

    #[inline]
    pub fn next(&mut self) -> f32 {
        self.mix.next_value()
    }
}

impl Default for WetDry {
    fn default() -> Self {
        Self::new()
    }
}

/// `dry * (1 - mix) + wet * mix`, exact at both ends of the range.
#[inline]
pub fn blend(dry: f32, wet: f32, mix: f32) -> f32 {
    wet.mul_add(mix, dry * (1.0 - mix))
}

#[inline]
pub fn ms_to_samples(ms: f32, sample_rate: f32) -> f32 {
    ms * 0.001 * sample_rate
}

/// Circular delay line with linear-interpolated fractional reads.
///
/// Sized once in [`DelayLine::allocate`]; an unallocated line reads silence.
#[derive(Clone, Debug, Default)]
pub struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl DelayLine {
    pub const fn new() -> Self {
        Self {
            buffer: Vec::new(),
            write_pos: 0,
        }
    }

    pub fn allocate(&mut self, max_delay_samples: usize) {
        self.buffer = vec![0.0; max_delay_samples.max(1) + 2];
        self.write_pos = 0;
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }

    /// Read `delay` samples back; `1.0` is the most recent write.
    #[inline]
    pub fn read(&self, delay: f32) -> f32 {
        let len = self.buffer.len();
        if len < 2 {
            return 0.0;
        }

        let delay = delay.clamp(1.0, (len - 1) as f32);
        let pos = (self.write_pos + len) as f32 - delay;
        let idx = pos as usize;
        let frac = pos - idx as f32;
        let a = self.buffer[idx % len];
        let b = self.buffer[(idx + 1) % len];
        frac.mul_add(b - a, a)
    }

    #[inline]
    pub fn write(&mut self, sample: f32) {
        let len = self.buffer.len();
        if len == 0 {
            return;
        }
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % len;
    }
}

/// Sine LFO with phase in cycles.
#[derive(Clone, Debug)]
pub struct Lfo {
    phase: f32,
    start_phase: f32,
    increment: f32,
}

impl Lfo {
    pub const fn new(start_phase: f32) -> Self {
        Self {
            phase: start_phase,
            start_phase,
            increment: 0.0,
        }
    }

    pub fn set_rate(&mut self, rate_hz: f32, sample_rate: f32) {
        self.increment = rate_hz / sample_rate.max(1.0);
    }

    pub const fn reset(&mut self) {
        self.phase = self.start_phase;
    }

    #[inline]
    pub fn next(&mut self) -> f32 {
        let value = (TAU * self.phase).sin();
        self.phase = (self.phase + self.increment).fract();
        value
    }
}

/// One-pole low-pass, `y += a * (x - y)`.
#[derive(Clone, Debug, Default)]
pub struct OnePoleLowPass {
    a: f32,
    y: f32,
}

impl OnePoleLowPass {
    pub fn new(cutoff_hz: f32, sample_rate: f32) -> Self {
        Self {
            a: 1.0 - (-2.0 * PI * cutoff_hz / sample_rate.max(1.0)).exp(),
            y: 0.0,
        }
    }

    pub const fn reset(&mut self) {
        self.y = 0.0;
    }

    #[inline]
    pub fn process(&mut self, x: f32) -> f32 {
        self.y = self.a.mul_add(x - self.y, self.y);
        self.y
    }
}

/// Quantise to `bits` of resolution.
#[inline]
pub fn quantize(x: f32, bits: u32) -> f32 {
    let half = (1u32 << (bits.clamp(2, 24) - 1)) as f32;
    ((x * half).round() / half).clamp(-1.0, 1.0)
}

const COMB_TUNING: [usize; 4] = [1116, 1188, 1277, 1356];
const ALLPASS_TUNING: [usize; 2] = [556, 441];
const TUNING_RATE: f32 = 44_100.0;
const TANK_INPUT_GAIN: f32 = 0.1;

#[derive(Clone, Debug, Default)]
struct Comb {
    line: Vec<f32>,
    pos: usize,
    store: f32,
}

impl Comb {
    #[inline]
    fn process(&mut self, x: f32, feedback: f32, damp: f32) -> f32 {
        let out = self.line[self.pos];
        self.store = out.mul_add(1.0 - damp, self.store * damp);
        self.line[self.pos] = self.store.mul_add(feedback, x);
        self.pos = (self.pos + 1) % self.line.len();
        out
    }
}

#[derive(Clone, Debug, Default)]
struct Allpass {
    line: Vec<f32>,
    pos: usize,
}

impl Allpass {
    #[inline]
    fn process(&mut self, x: f32) -> f32 {
        let buffered = self.line[self.pos];
        self.line[self.pos] = buffered.mul_add(0.5, x);
        self.pos = (self.pos + 1) % self.line.len();
        buffered - x
    }
}

/// Mono Schroeder-style tank: four damped combs into two all-passes.
#[derive(Clone, Debug, Default)]
pub struct ReverbTank {
    combs: [Comb; 4],
    allpasses: [Allpass; 2],
    feedback: f32,
    damp: f32,
    prepared: bool,
}

impl ReverbTank {
    pub fn new(feedback: f32, damp: f32) -> Self {
        Self {
            feedback: feedback.clamp(0.0, 0.98),
            damp: damp.clamp(0.0, 1.0),
            ..Self::default()
        }
    }

    /// `spread` offsets every line length so left and right decorrelate.
    pub fn prepare(&mut self, sample_rate: f32, spread: usize) {
        let scale = sample_rate / TUNING_RATE;
        for (comb, &len) in self.combs.iter_mut().zip(&COMB_TUNING) {
            comb.line = vec![0.0; (((len + spread) as f32 * scale) as usize).max(1)];
            comb.pos = 0;
            comb.store = 0.0;
        }
        for (allpass, &len) in self.allpasses.iter_mut().zip(&ALLPASS_TUNING) {
            allpass.line = vec![0.0; (((len + spread) as f32 * scale) as usize).max(1)];
            allpass.pos = 0;
        }
        self.prepared = true;
    }

    pub fn reset(&mut self) {
        for comb in &mut self.combs {
            comb.line.fill(0.0);
            comb.pos = 0;
            comb.store = 0.0;
        }
        for allpass in &mut self.allpasses {
            allpass.line.fill(0.0);
            allpass.pos = 0;
        }
    }

    #[inline]
    pub fn process(&mut self, x: f32) -> f32 {
        if !self.prepared {
            return 0.0;
        }

        let input = x * TANK_INPUT_GAIN;
        let mut out = 0.0;
        for comb in &mut self.combs {
            out += comb.process(input, self.feedback, self.damp);
        }
        for allpass in &mut self.allpasses {
            out = allpass.process(out);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_line_returns_impulse_after_delay() {
        let mut line = DelayLine::new();
        line.allocate(100);
        line.write(1.0);
        for _ in 0..9 {
            line.write(0.0);
        }
        assert_eq!(line.read(10.0), 1.0);
        assert_eq!(line.read(9.0), 0.0);
        assert!((line.read(9.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn unallocated_delay_line_is_silent() {
        let mut line = DelayLine::new();
        line.write(1.0);
        assert_eq!(line.read(1.0), 0.0);
    }

    #[test]
    fn delay_line_reset_clears() {
        let mut line = DelayLine::new();
        line.allocate(16);
        line.write(1.0);
        line.reset();
        assert_eq!(line.read(1.0), 0.0);
    }

    #[test]
    fn lfo_completes_cycle() {
        let mut lfo = Lfo::new(0.0);
        lfo.set_rate(1.0, 100.0);
        assert!(lfo.next().abs() < 1e-6);
        for _ in 0..24 {
            lfo.next();
        }
        assert!((lfo.next() - 1.0).abs() < 1e-3);
        lfo.reset();
        assert!(lfo.next().abs() < 1e-6);
    }

    #[test]
    fn quantize_steps() {
        assert_eq!(quantize(0.0, 4), 0.0);
        assert_eq!(quantize(0.3, 2), 0.5);
        assert_eq!(quantize(2.0, 8), 1.0);
    }

    #[test]
    fn reverb_tail_decays_and_stays_finite() {
        let mut tank = ReverbTank::new(0.84, 0.5);
        tank.prepare(48_000.0, 0);
        let mut energy_early = 0.0;
        let mut energy_late = 0.0;
        for i in 0..96_000 {
            let y = tank.process(if i == 0 { 1.0 } else { 0.0 });
            assert!(y.is_finite());
            if (2_000..12_000).contains(&i) {
                energy_early += y * y;
            }
            if i >= 86_000 {
                energy_late += y * y;
            }
        }
        assert!(energy_early > 0.0);
        assert!(energy_late < energy_early * 0.01);
    }

    #[test]
    fn wet_dry_silent_only_when_parked_at_zero() {
        let mut mix = WetDry::new();
        mix.prepare(48_000.0);
        assert!(mix.is_silent());
        mix.set(0.5);
        assert!(!mix.is_silent());
        mix.set(0.0);
        assert!(!mix.is_silent(), "still ramping back down");
        for _ in 0..960 {
            mix.next();
        }
        assert!(mix.is_silent());
        mix.set(f32::NAN);
        assert!(mix.is_silent());
    }

    #[test]
    fn begin_block_reports_the_first_block_after_parking() {
        let mut mix = WetDry::new();
        mix.prepare(48_000.0);
        assert_eq!(mix.begin_block(), MixState::Parked);
        mix.set(1.0);
        assert_eq!(mix.begin_block(), MixState::Resumed);
        assert_eq!(mix.begin_block(), MixState::Active);
        mix.set(0.0);
        assert_eq!(mix.begin_block(), MixState::Active, "ramping down");
        for _ in 0..960 {
            mix.next();
        }
        assert_eq!(mix.begin_block(), MixState::Parked);
        assert_eq!(mix.begin_block(), MixState::Parked);
        mix.set(0.3);
        assert_eq!(mix.begin_block(), MixState::Resumed);
    }
}
