//! Filament's cold chain: Fracture, Prism, Phase, Cascade, Glisten.

use crate::amp::effects::EffectUnit;
use crate::amp::effects::blocks::{
    DelayLine, Lfo, MixState, ReverbTank, WetDry, blend, ms_to_samples,
};
use crate::amp::stages::common::{DcBlocker, sanitize};

/// Hard digital clip over a decimated signal.
pub struct Fracture {
    mix: WetDry,
    held: [f32; 2],
    counter: usize,
}

impl Fracture {
    const HOLD_SAMPLES: usize = 3;
    const GAIN: f32 = 4.0;
    const CEILING: f32 = 0.7;

    pub const fn new() -> Self {
        Self {
            mix: WetDry::new(),
            held: [0.0; 2],
            counter: 0,
        }
    }
}

impl Default for Fracture {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectUnit for Fracture {
    fn prepare(&mut self, sample_rate: f32, _max_block_size: usize) {
        self.mix.prepare(sample_rate);
        self.held = [0.0; 2];
        self.counter = 0;
    }

    fn reset(&mut self) {
        self.mix.reset();
        self.clear();
    }

    fn clear(&mut self) {
        self.held = [0.0; 2];
        self.counter = 0;
    }

    fn set_mix(&mut self, mix: f32) {
        self.mix.set(mix);
    }

    fn mix(&self) -> f32 {
        self.mix.target()
    }

    fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        match self.mix.begin_block() {
            MixState::Parked => return,
            MixState::Resumed => self.clear(),
            MixState::Active => {}
        }

        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let mix = self.mix.next();
            if self.counter == 0 {
                self.held = [sanitize(*l), sanitize(*r)];
            }
            self.counter = (self.counter + 1) % Self::HOLD_SAMPLES;

            let [held_l, held_r] = self.held;
            let wet_l = (held_l * Self::GAIN).clamp(-Self::CEILING, Self::CEILING);
            let wet_r = (held_r * Self::GAIN).clamp(-Self::CEILING, Self::CEILING);
            *l = blend(*l, wet_l, mix);
            *r = blend(*r, wet_r, mix);
        }
    }
}

/// Feedback comb filters with different lengths per side.
pub struct Prism {
    mix: WetDry,
    lines: [DelayLine; 2],
    delays: [f32; 2],
}

impl Prism {
    const DELAY_MS: [f32; 2] = [3.1, 4.3];
    const FEEDBACK: f32 = 0.65;
    const MAX_MS: f32 = 10.0;

    pub const fn new() -> Self {
        Self {
            mix: WetDry::new(),
            lines: [DelayLine::new(), DelayLine::new()],
            delays: [1.0; 2],
        }
    }
}

impl Default for Prism {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectUnit for Prism {
    fn prepare(&mut self, sample_rate: f32, _max_block_size: usize) {
        self.mix.prepare(sample_rate);
        let max = ms_to_samples(Self::MAX_MS, sample_rate) as usize;
        for line in &mut self.lines {
            line.allocate(max);
        }
        self.delays = Self::DELAY_MS.map(|ms| ms_to_samples(ms, sample_rate));
    }

    fn reset(&mut self) {
        self.mix.reset();
        self.clear();
    }

    fn clear(&mut self) {
        for line in &mut self.lines {
            line.reset();
        }
    }

    fn set_mix(&mut self, mix: f32) {
        self.mix.set(mix);
    }

    fn mix(&self) -> f32 {
        self.mix.target()
    }

    fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        match self.mix.begin_block() {
            MixState::Parked => return,
            MixState::Resumed => self.clear(),
            MixState::Active => {}
        }

        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let mix = self.mix.next();
            for ((sample, line), &delay) in [&mut *l, &mut *r]
                .into_iter()
                .zip(&mut self.lines)
                .zip(&self.delays)
            {
                let dry = *sample;
                let resonant = line.read(delay).mul_add(Self::FEEDBACK, sanitize(dry));
                line.write(resonant);
                // Unity gain at the comb peaks.
                *sample = blend(dry, resonant * (1.0 - Self::FEEDBACK), mix);
            }
        }
    }
}

/// Through-zero flanger: a fixed tap plus a tap swept across it.
pub struct Phase {
    mix: WetDry,
    lines: [DelayLine; 2],
    lfo: Lfo,
    sample_rate: f32,
}

impl Phase {
    const CENTER_MS: f32 = 5.0;
    const DEPTH_MS: f32 = 4.5;
    const RATE_HZ: f32 = 0.25;
    const MAX_MS: f32 = 20.0;

    pub const fn new() -> Self {
        Self {
            mix: WetDry::new(),
            lines: [DelayLine::new(), DelayLine::new()],
            lfo: Lfo::new(0.0),
            sample_rate: 0.0,
        }
    }
}

impl Default for Phase {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectUnit for Phase {
    fn prepare(&mut self, sample_rate: f32, _max_block_size: usize) {
        self.sample_rate = sample_rate;
        self.mix.prepare(sample_rate);
        let max = ms_to_samples(Self::MAX_MS, sample_rate) as usize;
        for line in &mut self.lines {
            line.allocate(max);
        }
        self.lfo.set_rate(Self::RATE_HZ, sample_rate);
        self.lfo.reset();
    }

    fn reset(&mut self) {
        self.mix.reset();
        self.clear();
    }

    fn clear(&mut self) {
        for line in &mut self.lines {
            line.reset();
        }
        self.lfo.reset();
    }

    fn set_mix(&mut self, mix: f32) {
        self.mix.set(mix);
    }

    fn mix(&self) -> f32 {
        self.mix.target()
    }

    fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        match self.mix.begin_block() {
            MixState::Parked => return,
            MixState::Resumed => self.clear(),
            MixState::Active => {}
        }

        let center = ms_to_samples(Self::CENTER_MS, self.sample_rate);
        let depth = ms_to_samples(Self::DEPTH_MS, self.sample_rate);
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let mix = self.mix.next();
            let swept = self.lfo.next().mul_add(depth, center);
            for (sample, line) in [&mut *l, &mut *r].into_iter().zip(&mut self.lines) {
                let dry = *sample;
                line.write(sanitize(dry));
                let wet = 0.5 * (line.read(center) + line.read(swept));
                *sample = blend(dry, wet, mix);
            }
        }
    }
}

/// Three-tap ping-pong delay.
pub struct Cascade {
    mix: WetDry,
    lines: [DelayLine; 2],
    taps: [f32; 3],
}

impl Cascade {
    const TAP_MS: [f32; 3] = [125.0, 250.0, 375.0];
    const TAP_GAINS: [f32; 3] = [0.6, 0.4, 0.25];
    const FEEDBACK: f32 = 0.3;
    const MAX_MS: f32 = 500.0;

    pub const fn new() -> Self {
        Self {
            mix: WetDry::new(),
            lines: [DelayLine::new(), DelayLine::new()],
            taps: [1.0; 3],
        }
    }
}

impl Default for Cascade {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectUnit for Cascade {
    fn prepare(&mut self, sample_rate: f32, _max_block_size: usize) {
        self.mix.prepare(sample_rate);
        let max = ms_to_samples(Self::MAX_MS, sample_rate) as usize;
        for line in &mut self.lines {
            line.allocate(max);
        }
        self.taps = Self::TAP_MS.map(|ms| ms_to_samples(ms, sample_rate));
    }

    fn reset(&mut self) {
        self.mix.reset();
        self.clear();
    }

    fn clear(&mut self) {
        for line in &mut self.lines {
            line.reset();
        }
    }

    fn set_mix(&mut self, mix: f32) {
        self.mix.set(mix);
    }

    fn mix(&self) -> f32 {
        self.mix.target()
    }

    fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        match self.mix.begin_block() {
            MixState::Parked => return,
            MixState::Resumed => self.clear(),
            MixState::Active => {}
        }

        let [first, second, third] = self.taps;
        let [g1, g2, g3] = Self::TAP_GAINS;
        let [line_l, line_r] = &mut self.lines;
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let mix = self.mix.next();

            // The middle tap comes from the opposite side so repeats bounce.
            let last_l = line_l.read(third);
            let last_r = line_r.read(third);
            let wet_l = g3.mul_add(last_l, g1.mul_add(line_l.read(first), g2 * line_r.read(second)));
            let wet_r = g3.mul_add(last_r, g1.mul_add(line_r.read(first), g2 * line_l.read(second)));

            line_l.write(last_r.mul_add(Self::FEEDBACK, sanitize(*l)));
            line_r.write(last_l.mul_add(Self::FEEDBACK, sanitize(*r)));

            *l = blend(*l, wet_l, mix);
            *r = blend(*r, wet_r, mix);
        }
    }
}

/// Bright reverb fed back with a rectified (octave-up) copy of its own tail.
pub struct Glisten {
    mix: WetDry,
    tanks: [ReverbTank; 2],
    shimmer_hp: [DcBlocker; 2],
    last_wet: [f32; 2],
}

impl Glisten {
    const FEEDBACK: f32 = 0.88;
    const DAMP: f32 = 0.1;
    const SHIMMER: f32 = 0.1;
    const SHIMMER_HP_HZ: f32 = 200.0;
    const STEREO_SPREAD: usize = 23;

    pub fn new() -> Self {
        Self {
            mix: WetDry::new(),
            tanks: std::array::from_fn(|_| ReverbTank::new(Self::FEEDBACK, Self::DAMP)),
            shimmer_hp: std::array::from_fn(|_| DcBlocker::new(Self::SHIMMER_HP_HZ, 44_100.0)),
            last_wet: [0.0; 2],
        }
    }
}

impl Default for Glisten {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectUnit for Glisten {
    fn prepare(&mut self, sample_rate: f32, _max_block_size: usize) {
        self.mix.prepare(sample_rate);
        let [tank_l, tank_r] = &mut self.tanks;
        tank_l.prepare(sample_rate, 0);
        tank_r.prepare(sample_rate, Self::STEREO_SPREAD);
        self.shimmer_hp =
            std::array::from_fn(|_| DcBlocker::new(Self::SHIMMER_HP_HZ, sample_rate));
        self.last_wet = [0.0; 2];
    }

    fn reset(&mut self) {
        self.mix.reset();
        self.clear();
    }

    fn clear(&mut self) {
        for tank in &mut self.tanks {
            tank.reset();
        }
        for hp in &mut self.shimmer_hp {
            hp.reset();
        }
        self.last_wet = [0.0; 2];
    }

    fn set_mix(&mut self, mix: f32) {
        self.mix.set(mix);
    }

    fn mix(&self) -> f32 {
        self.mix.target()
    }

    fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        match self.mix.begin_block() {
            MixState::Parked => return,
            MixState::Resumed => self.clear(),
            MixState::Active => {}
        }

        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let mix = self.mix.next();
            let mono = 0.5 * (sanitize(*l) + sanitize(*r));
            for (((sample, tank), hp), last) in [&mut *l, &mut *r]
                .into_iter()
                .zip(&mut self.tanks)
                .zip(&mut self.shimmer_hp)
                .zip(&mut self.last_wet)
            {
                let shimmer = (Self::SHIMMER * hp.process(last.abs())).tanh();
                let wet = tank.process(mono + shimmer);
                *last = wet;
                *sample = blend(*sample, wet, mix);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48_000.0;

    fn impulse_response<E: EffectUnit>(unit: &mut E, len: usize) -> (Vec<f32>, Vec<f32>) {
        unit.prepare(SR, 512);
        unit.set_mix(1.0);
        unit.reset();
        let mut left = vec![0.0; len];
        let mut right = vec![0.0; len];
        left[0] = 1.0;
        right[0] = 1.0;
        unit.process(&mut left, &mut right);
        (left, right)
    }

    #[test]
    fn fracture_holds_and_clips() {
        let mut fracture = Fracture::new();
        fracture.prepare(SR, 64);
        fracture.set_mix(1.0);
        fracture.reset();
        let mut left = vec![0.01, 0.5, 0.5, -0.02, 0.9, 0.9];
        let mut right = left.clone();
        fracture.process(&mut left, &mut right);
        assert_eq!(left, vec![0.04, 0.04, 0.04, -0.08, -0.08, -0.08]);

        let mut loud = vec![1.0; 3];
        let mut loud_r = vec![-1.0; 3];
        fracture.process(&mut loud, &mut loud_r);
        assert_eq!(loud, vec![0.7; 3]);
        assert_eq!(loud_r, vec![-0.7; 3]);
    }

    #[test]
    fn prism_sides_resonate_at_different_periods() {
        let (left, right) = impulse_response(&mut Prism::new(), 1024);
        let first_echo = |channel: &[f32]| {
            channel[1..]
                .iter()
                .position(|s| s.abs() > 0.05)
                .map(|i| i + 1)
        };
        let l = first_echo(&left).unwrap_or(0);
        let r = first_echo(&right).unwrap_or(0);
        assert!(l > 0 && r > l, "left {l} right {r}");
    }

    #[test]
    fn cascade_bounces_between_sides() {
        let mut cascade = Cascade::new();
        cascade.prepare(SR, 512);
        cascade.set_mix(1.0);
        cascade.reset();

        let len = 20_000;
        let mut left = vec![0.0; len];
        let mut right = vec![0.0; len];
        left[0] = 1.0;
        cascade.process(&mut left, &mut right);

        let first = ms_to_samples(125.0, SR) as usize;
        let second = ms_to_samples(250.0, SR) as usize;
        let near = |channel: &[f32], at: usize| {
            channel[at.saturating_sub(2)..at + 3]
                .iter()
                .fold(0.0f32, |peak, s| peak.max(s.abs()))
        };
        assert!((near(&left, first) - 0.6).abs() < 0.05);
        assert!(near(&right, first) < 1e-6);
        assert!((near(&right, second) - 0.4).abs() < 0.05);
    }

    #[test]
    fn glisten_rings_longer_than_input() {
        let (left, _) = impulse_response(&mut Glisten::new(), 24_000);
        let tail: f32 = left[12_000..].iter().map(|s| s * s).sum();
        assert!(tail > 0.0);
        assert!(left.iter().all(|s| s.is_finite()));
    }
}
