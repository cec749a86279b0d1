//! Steel Plate's industrial chain: Scorch, Snarl, Shred, Grind, Rust.

use crate::amp::effects::EffectUnit;
use crate::amp::effects::blocks::{
    DelayLine, Lfo, MixState, ReverbTank, WetDry, blend, ms_to_samples, quantize,
};
use crate::amp::stages::biquad::{Biquad, FilterShape};
use crate::amp::stages::common::{EnvelopeFollower, calculate_coefficient, sanitize};

/// Asymmetric hard clip.
pub struct Scorch {
    mix: WetDry,
}

impl Scorch {
    const GAIN: f32 = 6.0;
    const FLOOR: f32 = -0.55;
    const CEILING: f32 = 0.75;
    const LEVEL: f32 = 1.1;

    pub const fn new() -> Self {
        Self { mix: WetDry::new() }
    }

    #[inline]
    fn clip(x: f32) -> f32 {
        (x * Self::GAIN).clamp(Self::FLOOR, Self::CEILING) * Self::LEVEL
    }
}

impl Default for Scorch {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectUnit for Scorch {
    fn prepare(&mut self, sample_rate: f32, _max_block_size: usize) {
        self.mix.prepare(sample_rate);
    }

    fn reset(&mut self) {
        self.mix.reset();
    }

    fn clear(&mut self) {}

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
            *l = blend(*l, Self::clip(sanitize(*l)), mix);
            *r = blend(*r, Self::clip(sanitize(*r)), mix);
        }
    }
}

/// Resonant band-pass into a tanh stage.
pub struct Snarl {
    mix: WetDry,
    filters: [Biquad; 2],
}

impl Snarl {
    const CENTER_HZ: f32 = 1200.0;
    const Q: f32 = 2.5;
    const DRIVE: f32 = 3.0;
    const LEVEL: f32 = 0.8;

    pub fn new() -> Self {
        Self {
            mix: WetDry::new(),
            filters: Self::design(44_100.0),
        }
    }

    fn design(sample_rate: f32) -> [Biquad; 2] {
        let filter = Biquad::new(
            FilterShape::BandPass { q: Self::Q },
            Self::CENTER_HZ,
            f64::from(sample_rate),
        );
        [filter; 2]
    }
}

impl Default for Snarl {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectUnit for Snarl {
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
            let wet_l = (filter_l.process(sanitize(*l)) * Self::DRIVE).tanh() * Self::LEVEL;
            let wet_r = (filter_r.process(sanitize(*r)) * Self::DRIVE).tanh() * Self::LEVEL;
            *l = blend(*l, wet_l, mix);
            *r = blend(*r, wet_r, mix);
        }
    }
}

/// Ring modulator with slightly detuned carriers per side.
pub struct Shred {
    mix: WetDry,
    carriers: [Lfo; 2],
}

impl Shred {
    const CARRIER_HZ: [f32; 2] = [220.0, 223.5];

    pub const fn new() -> Self {
        Self {
            mix: WetDry::new(),
            carriers: [Lfo::new(0.0), Lfo::new(0.0)],
        }
    }
}

impl Default for Shred {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectUnit for Shred {
    fn prepare(&mut self, sample_rate: f32, _max_block_size: usize) {
        self.mix.prepare(sample_rate);
        for (carrier, &hz) in self.carriers.iter_mut().zip(&Self::CARRIER_HZ) {
            carrier.set_rate(hz, sample_rate);
            carrier.reset();
        }
    }

    fn reset(&mut self) {
        self.mix.reset();
        self.clear();
    }

    fn clear(&mut self) {
        for carrier in &mut self.carriers {
            carrier.reset();
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

        let [carrier_l, carrier_r] = &mut self.carriers;
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let mix = self.mix.next();
            let wet_l = sanitize(*l) * carrier_l.next();
            let wet_r = sanitize(*r) * carrier_r.next();
            *l = blend(*l, wet_l, mix);
            *r = blend(*r, wet_r, mix);
        }
    }
}

/// Delay whose repeats are decimated and bit-crushed on every pass.
pub struct Grind {
    mix: WetDry,
    lines: [DelayLine; 2],
    held: [f32; 2],
    counter: usize,
    delay: f32,
}

impl Grind {
    const TIME_MS: f32 = 220.0;
    const FEEDBACK: f32 = 0.5;
    const BITS: u32 = 6;
    const HOLD_SAMPLES: usize = 4;
    const MAX_MS: f32 = 500.0;

    pub const fn new() -> Self {
        Self {
            mix: WetDry::new(),
            lines: [DelayLine::new(), DelayLine::new()],
            held: [0.0; 2],
            counter: 0,
            delay: 1.0,
        }
    }
}

impl Default for Grind {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectUnit for Grind {
    fn prepare(&mut self, sample_rate: f32, _max_block_size: usize) {
        self.mix.prepare(sample_rate);
        let max = ms_to_samples(Self::MAX_MS, sample_rate) as usize;
        for line in &mut self.lines {
            line.allocate(max);
        }
        self.delay = ms_to_samples(Self::TIME_MS, sample_rate);
        self.held = [0.0; 2];
        self.counter = 0;
    }

    fn reset(&mut self) {
        self.mix.reset();
        self.clear();
    }

    fn clear(&mut self) {
        for line in &mut self.lines {
            line.reset();
        }
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
            let refresh = self.counter == 0;
            self.counter = (self.counter + 1) % Self::HOLD_SAMPLES;

            for ((sample, line), held) in [&mut *l, &mut *r]
                .into_iter()
                .zip(&mut self.lines)
                .zip(&mut self.held)
            {
                let dry = *sample;
                let wet = line.read(self.delay);
                if refresh {
                    *held = quantize(wet, Self::BITS);
                }
                line.write(held.mul_add(Self::FEEDBACK, sanitize(dry)).clamp(-1.0, 1.0));
                *sample = blend(dry, wet, mix);
            }
        }
    }
}

/// Reverb that only speaks while the input is playing.
pub struct Rust {
    mix: WetDry,
    tanks: [ReverbTank; 2],
    envelope: EnvelopeFollower,
    hold_samples: usize,
    hold_remaining: usize,
    gate_coeff: f32,
    gate_gain: f32,
}

impl Rust {
    const FEEDBACK: f32 = 0.86;
    const DAMP: f32 = 0.4;
    const STEREO_SPREAD: usize = 23;
    // Roughly -36 dBFS.
    const THRESHOLD: f32 = 0.016;
    const ATTACK_MS: f32 = 1.0;
    const RELEASE_MS: f32 = 60.0;
    const HOLD_MS: f32 = 150.0;
    const GATE_SMOOTH_MS: f32 = 5.0;

    pub fn new() -> Self {
        Self {
            mix: WetDry::new(),
            tanks: std::array::from_fn(|_| ReverbTank::new(Self::FEEDBACK, Self::DAMP)),
            envelope: EnvelopeFollower::from_ms(Self::ATTACK_MS, Self::RELEASE_MS, 44_100.0),
            hold_samples: 0,
            hold_remaining: 0,
            gate_coeff: calculate_coefficient(Self::GATE_SMOOTH_MS, 44_100.0),
            gate_gain: 0.0,
        }
    }

    #[inline]
    fn gate(&mut self, input: f32) -> f32 {
        if self.envelope.process(input) > Self::THRESHOLD {
            self.hold_remaining = self.hold_samples;
        } else {
            self.hold_remaining = self.hold_remaining.saturating_sub(1);
        }
        let target = if self.hold_remaining > 0 { 1.0 } else { 0.0 };
        self.gate_gain = self
            .gate_coeff
            .mul_add(self.gate_gain, (1.0 - self.gate_coeff) * target);
        self.gate_gain
    }
}

impl Default for Rust {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectUnit for Rust {
    fn prepare(&mut self, sample_rate: f32, _max_block_size: usize) {
        self.mix.prepare(sample_rate);
        let [tank_l, tank_r] = &mut self.tanks;
        tank_l.prepare(sample_rate, 0);
        tank_r.prepare(sample_rate, Self::STEREO_SPREAD);
        self.envelope = EnvelopeFollower::from_ms(Self::ATTACK_MS, Self::RELEASE_MS, sample_rate);
        self.hold_samples = ms_to_samples(Self::HOLD_MS, sample_rate) as usize;
        self.hold_remaining = 0;
        self.gate_coeff = calculate_coefficient(Self::GATE_SMOOTH_MS, sample_rate);
        self.gate_gain = 0.0;
    }

    fn reset(&mut self) {
        self.mix.reset();
        self.clear();
    }

    fn clear(&mut self) {
        for tank in &mut self.tanks {
            tank.reset();
        }
        self.envelope.reset();
        self.hold_remaining = 0;
        self.gate_gain = 0.0;
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
            let gain = self.gate(mono);
            let [tank_l, tank_r] = &mut self.tanks;
            let wet_l = tank_l.process(mono) * gain;
            let wet_r = tank_r.process(mono) * gain;
            *l = blend(*l, wet_l, mix);
            *r = blend(*r, wet_r, mix);
        }
    }
}
