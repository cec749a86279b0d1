//! Cathode's warm chain: Ember, Velvet, Drift, Echo, Haze.

use crate::amp::effects::EffectUnit;
use crate::amp::effects::blocks::{
    DelayLine, Lfo, MixState, OnePoleLowPass, ReverbTank, WetDry, blend, ms_to_samples,
};
use crate::amp::stages::biquad::{Biquad, FilterShape};
use crate::amp::stages::common::{DcBlocker, sanitize};

const DEFAULT_SAMPLE_RATE: f32 = 44_100.0;

/// Biased tanh tube stage.
pub struct Ember {
    mix: WetDry,
    dc: [DcBlocker; 2],
}

impl Ember {
    const DRIVE: f32 = 3.0;
    const BIAS: f32 = 0.2;
    const LEVEL: f32 = 0.7;
    const DC_HZ: f32 = 10.0;

    pub fn new() -> Self {
        Self {
            mix: WetDry::new(),
            dc: std::array::from_fn(|_| DcBlocker::new(Self::DC_HZ, DEFAULT_SAMPLE_RATE)),
        }
    }

    #[inline]
    fn shape(x: f32) -> f32 {
        (Self::DRIVE.mul_add(x, Self::BIAS).tanh() - Self::BIAS.tanh()) * Self::LEVEL
    }
}

impl Default for Ember {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectUnit for Ember {
    fn prepare(&mut self, sample_rate: f32, _max_block_size: usize) {
        self.mix.prepare(sample_rate);
        self.dc = std::array::from_fn(|_| DcBlocker::new(Self::DC_HZ, sample_rate));
    }

    fn reset(&mut self) {
        self.mix.reset();
        self.clear();
    }

    fn clear(&mut self) {
        for dc in &mut self.dc {
            dc.reset();
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

        let [dc_l, dc_r] = &mut self.dc;
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let mix = self.mix.next();
            let wet_l = dc_l.process(Self::shape(sanitize(*l)));
            let wet_r = dc_r.process(Self::shape(sanitize(*r)));
            *l = blend(*l, wet_l, mix);
            *r = blend(*r, wet_r, mix);
        }
    }
}

/// Warm low-pass.
pub struct Velvet {
    mix: WetDry,
    filters: [Biquad; 2],
}

impl Velvet {
    const CUTOFF_HZ: f32 = 1600.0;
    const Q: f32 = 0.6;

    pub fn new() -> Self {
        Self {
            mix: WetDry::new(),
            filters: Self::design(DEFAULT_SAMPLE_RATE),
        }
    }

    fn design(sample_rate: f32) -> [Biquad; 2] {
        let filter = Biquad::new(
            FilterShape::LowPass { q: Self::Q },
            Self::CUTOFF_HZ,
            f64::from(sample_rate),
        );
        [filter; 2]
    }
}

impl Default for Velvet {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectUnit for Velvet {
    fn prepare(&mut self, sample_rate: f32, _max_block_size: usize) {
        self.mix.prepare(sample_rate);
        self.filters = Self::design(sample_rate);
    }

    fn reset(&mut self) {
        self.mix.reset();
        self.clear();
    }

    fn clear(&mut self) {
        for filter in &mut self.filters {
            filter.reset();
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

        let [filter_l, filter_r] = &mut self.filters;
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let mix = self.mix.next();
            let wet_l = filter_l.process(sanitize(*l));
            let wet_r = filter_r.process(sanitize(*r));
            *l = blend(*l, wet_l, mix);
            *r = blend(*r, wet_r, mix);
        }
    }
}

/// Tape chorus; the right LFO runs a quarter cycle ahead.
pub struct Drift {
    mix: WetDry,
    lines: [DelayLine; 2],
    lfos: [Lfo; 2],
    sample_rate: f32,
}

impl Drift {
    const BASE_MS: f32 = 12.0;
    const DEPTH_MS: f32 = 3.0;
    const RATE_HZ: f32 = 0.7;
    const MAX_MS: f32 = 40.0;

    pub const fn new() -> Self {
        Self {
            mix: WetDry::new(),
            lines: [DelayLine::new(), DelayLine::new()],
            lfos: [Lfo::new(0.0), Lfo::new(0.25)],
            sample_rate: 0.0,
        }
    }
}

impl Default for Drift {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectUnit for Drift {
    fn prepare(&mut self, sample_rate: f32, _max_block_size: usize) {
        self.sample_rate = sample_rate;
        self.mix.prepare(sample_rate);
        let max = ms_to_samples(Self::MAX_MS, sample_rate) as usize;
        for line in &mut self.lines {
            line.allocate(max);
        }
        for lfo in &mut self.lfos {
            lfo.set_rate(Self::RATE_HZ, sample_rate);
            lfo.reset();
        }
    }

    fn reset(&mut self) {
        self.mix.reset();
        self.clear();
    }

    fn clear(&mut self) {
        for line in &mut self.lines {
            line.reset();
        }
        for lfo in &mut self.lfos {
            lfo.reset();
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

        let base = ms_to_samples(Self::BASE_MS, self.sample_rate);
        let depth = ms_to_samples(Self::DEPTH_MS, self.sample_rate);
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let mix = self.mix.next();
            for ((sample, line), lfo) in [&mut *l, &mut *r]
                .into_iter()
                .zip(&mut self.lines)
                .zip(&mut self.lfos)
            {
                let dry = *sample;
                line.write(sanitize(dry));
                let wet = line.read(lfo.next().mul_add(depth, base));
                *sample = blend(dry, wet, mix);
            }
        }
    }
}

/// Tape echo with a darkening feedback loop.
pub struct Echo {
    mix: WetDry,
    lines: [DelayLine; 2],
    tone: [OnePoleLowPass; 2],
    sample_rate: f32,
}

impl Echo {
    const TIME_MS: f32 = 380.0;
    const FEEDBACK: f32 = 0.45;
    const DARKEN_HZ: f32 = 2500.0;
    const MAX_MS: f32 = 1000.0;

    pub fn new() -> Self {
        Self {
            mix: WetDry::new(),
            lines: [DelayLine::new(), DelayLine::new()],
            tone: std::array::from_fn(|_| {
                OnePoleLowPass::new(Self::DARKEN_HZ, DEFAULT_SAMPLE_RATE)
            }),
            sample_rate: 0.0,
        }
    }
}

impl Default for Echo {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectUnit for Echo {
    fn prepare(&mut self, sample_rate: f32, _max_block_size: usize) {
        self.sample_rate = sample_rate;
        self.mix.prepare(sample_rate);
        let max = ms_to_samples(Self::MAX_MS, sample_rate) as usize;
        for line in &mut self.lines {
            line.allocate(max);
        }
        self.tone = std::array::from_fn(|_| OnePoleLowPass::new(Self::DARKEN_HZ, sample_rate));
    }

    fn reset(&mut self) {
        self.mix.reset();
        self.clear();
    }

    fn clear(&mut self) {
        for line in &mut self.lines {
            line.reset();
        }
        for tone in &mut self.tone {
            tone.reset();
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

        let delay = ms_to_samples(Self::TIME_MS, self.sample_rate);
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let mix = self.mix.next();
            for ((sample, line), tone) in [&mut *l, &mut *r]
                .into_iter()
                .zip(&mut self.lines)
                .zip(&mut self.tone)
            {
                let dry = *sample;
                let wet = line.read(delay);
                let feedback = tone.process(wet) * Self::FEEDBACK;
                // Tape saturation on the way back in keeps repeats bounded.
                line.write((sanitize(dry) + feedback).tanh());
                *sample = blend(dry, wet, mix);
            }
        }
    }
}

/// Dark, heavily damped reverb.
pub struct Haze {
    mix: WetDry,
    tanks: [ReverbTank; 2],
    tone: [OnePoleLowPass; 2],
}

impl Haze {
    const FEEDBACK: f32 = 0.84;
    const DAMP: f32 = 0.7;
    const DARKEN_HZ: f32 = 4000.0;
    const STEREO_SPREAD: usize = 23;

    pub fn new() -> Self {
        Self {
            mix: WetDry::new(),
            tanks: std::array::from_fn(|_| ReverbTank::new(Self::FEEDBACK, Self::DAMP)),
            tone: std::array::from_fn(|_| {
                OnePoleLowPass::new(Self::DARKEN_HZ, DEFAULT_SAMPLE_RATE)
            }),
        }
    }
}

impl Default for Haze {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectUnit for Haze {
    fn prepare(&mut self, sample_rate: f32, _max_block_size: usize) {
        self.mix.prepare(sample_rate);
        let [tank_l, tank_r] = &mut self.tanks;
        tank_l.prepare(sample_rate, 0);
        tank_r.prepare(sample_rate, Self::STEREO_SPREAD);
        self.tone = std::array::from_fn(|_| OnePoleLowPass::new(Self::DARKEN_HZ, sample_rate));
    }

    fn reset(&mut self) {
        self.mix.reset();
        self.clear();
    }

    fn clear(&mut self) {
        for tank in &mut self.tanks {
            tank.reset();
        }
        for tone in &mut self.tone {
            tone.reset();
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
            let mono = 0.5 * (sanitize(*l) + sanitize(*r));
            for ((sample, tank), tone) in [&mut *l, &mut *r]
                .into_iter()
                .zip(&mut self.tanks)
                .zip(&mut self.tone)
            {
                let wet = tone.process(tank.process(mono));
                *sample = blend(*sample, wet, mix);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48_000.0;

    #[test]
    fn ember_is_zero_at_rest_and_asymmetric() {
        assert!(Ember::shape(0.0).abs() < 1e-7);
        assert!((Ember::shape(0.3) + Ember::shape(-0.3)).abs() > 1e-3);
    }

    #[test]
    fn echo_repeats_after_delay_time() {
        let mut echo = Echo::new();
        echo.prepare(SR, 512);
        echo.set_mix(1.0);
        echo.reset();

        let delay = ms_to_samples(Echo::TIME_MS, SR) as usize;
        let len = delay + 64;
        let mut left = vec![0.0; len];
        let mut right = vec![0.0; len];
        left[0] = 0.5;
        right[0] = 0.5;
        echo.process(&mut left, &mut right);

        assert!(left[..delay - 1].iter().all(|s| s.abs() < 1e-9));
        assert!((left[delay] - 0.5f32.tanh()).abs() < 1e-2);
        assert_eq!(left, right);
    }

    #[test]
    fn drift_channels_are_decorrelated() {
        let mut drift = Drift::new();
        drift.prepare(SR, 512);
        drift.set_mix(1.0);
        drift.reset();

        let mut left: Vec<f32> = (0..4096).map(|i| (i as f32 * 0.05).sin()).collect();
        let mut right = left.clone();
        drift.process(&mut left, &mut right);
        assert!(left.iter().zip(&right).any(|(l, r)| (l - r).abs() > 1e-3));
    }

    #[test]
    fn haze_tail_rings_after_input_stops() {
        let mut haze = Haze::new();
        haze.prepare(SR, 512);
        haze.set_mix(1.0);
        haze.reset();

        let mut left = vec![0.0; 8192];
        let mut right = vec![0.0; 8192];
        left[..256].fill(0.5);
        right[..256].fill(0.5);
        haze.process(&mut left, &mut right);
        let tail: f32 = left[4096..].iter().map(|s| s * s).sum();
        assert!(tail > 0.0);
    }
}
