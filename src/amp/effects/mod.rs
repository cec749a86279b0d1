pub mod blocks;
pub mod cathode;
pub mod filament;
pub mod steel_plate;

use crate::amp::stages::preamp::PreampType;

// The contract every effect slot in a chain implements
pub trait EffectUnit: Send + 'static {
    // Size internal buffers for a sample rate and block size.
    // The only call allowed to allocate.
    fn prepare(&mut self, sample_rate: f32, max_block_size: usize);

    // Clear tails, envelopes and modulation phase; snap the mix to its target
    fn reset(&mut self);

    // Clear tails, envelopes and modulation phase; leave the mix ramp alone.
    // Runs on the first block after the mix leaves zero.
    fn clear(&mut self);

    // Blend amount, 0 = bypassed, 1 = fully wet
    fn set_mix(&mut self, mix: f32);

    fn mix(&self) -> f32;

    // Process a stereo block in place
    fn process(&mut self, left: &mut [f32], right: &mut [f32]);
}

/// Position of an effect within a character's chain.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EffectSlot {
    Distortion,
    Filter,
    Modulation,
    Delay,
    Reverb,
}

impl EffectSlot {
    /// Processing order.
    pub const CHAIN: [Self; 5] = [
        Self::Distortion,
        Self::Filter,
        Self::Modulation,
        Self::Delay,
        Self::Reverb,
    ];
}

impl std::fmt::Display for EffectSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Distortion => write!(f, "Distortion"),
            Self::Filter => write!(f, "Filter"),
            Self::Modulation => write!(f, "Modulation"),
            Self::Delay => write!(f, "Delay"),
            Self::Reverb => write!(f, "Reverb"),
        }
    }
}

/// The fifteen named effects, five per character.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EffectId {
    CathEmber,
    CathVelvet,
    CathDrift,
    CathEcho,
    CathHaze,
    FilFracture,
    FilPrism,
    FilPhase,
    FilCascade,
    FilGlisten,
    SteelScorch,
    SteelSnarl,
    SteelShred,
    SteelGrind,
    SteelRust,
}

impl EffectId {
    /// Grouped by character, each group in chain order.
    pub const ALL: [Self; 15] = [
        Self::CathEmber,
        Self::CathVelvet,
        Self::CathDrift,
        Self::CathEcho,
        Self::CathHaze,
        Self::FilFracture,
        Self::FilPrism,
        Self::FilPhase,
        Self::FilCascade,
        Self::FilGlisten,
        Self::SteelScorch,
        Self::SteelSnarl,
        Self::SteelShred,
        Self::SteelGrind,
        Self::SteelRust,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// Dense index into [`EffectId::ALL`].
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn preamp(self) -> PreampType {
        PreampType::from_index(self.index() / EffectSlot::CHAIN.len())
    }

    pub const fn slot(self) -> EffectSlot {
        EffectSlot::CHAIN[self.index() % EffectSlot::CHAIN.len()]
    }

    /// The effect occupying `slot` in `preamp`'s chain.
    pub const fn for_slot(preamp: PreampType, slot: EffectSlot) -> Self {
        Self::ALL[preamp.index() * EffectSlot::CHAIN.len() + slot as usize]
    }

    /// `preamp`'s five effects in processing order.
    pub fn chain(preamp: PreampType) -> [Self; 5] {
        EffectSlot::CHAIN.map(|slot| Self::for_slot(preamp, slot))
    }

    /// Host parameter identifier.
    pub const fn param_id(self) -> &'static str {
        match self {
            Self::CathEmber => "cath_ember",
            Self::CathVelvet => "cath_velvet",
            Self::CathDrift => "cath_drift",
            Self::CathEcho => "cath_echo",
            Self::CathHaze => "cath_haze",
            Self::FilFracture => "fil_fracture",
            Self::FilPrism => "fil_prism",
            Self::FilPhase => "fil_phase",
            Self::FilCascade => "fil_cascade",
            Self::FilGlisten => "fil_glisten",
            Self::SteelScorch => "steel_scorch",
            Self::SteelSnarl => "steel_snarl",
            Self::SteelShred => "steel_shred",
            Self::SteelGrind => "steel_grind",
            Self::SteelRust => "steel_rust",
        }
    }

    pub fn from_param_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|effect| effect.param_id() == id)
    }

    /// Construct an unprepared instance of this effect.
    pub fn build(self) -> Box<dyn EffectUnit> {
        match self {
            Self::CathEmber => Box::new(cathode::Ember::new()),
            Self::CathVelvet => Box::new(cathode::Velvet::new()),
            Self::CathDrift => Box::new(cathode::Drift::new()),
            Self::CathEcho => Box::new(cathode::Echo::new()),
            Self::CathHaze => Box::new(cathode::Haze::new()),
            Self::FilFracture => Box::new(filament::Fracture::new()),
            Self::FilPrism => Box::new(filament::Prism::new()),
            Self::FilPhase => Box::new(filament::Phase::new()),
            Self::FilCascade => Box::new(filament::Cascade::new()),
            Self::FilGlisten => Box::new(filament::Glisten::new()),
            Self::SteelScorch => Box::new(steel_plate::Scorch::new()),
            Self::SteelSnarl => Box::new(steel_plate::Snarl::new()),
            Self::SteelShred => Box::new(steel_plate::Shred::new()),
            Self::SteelGrind => Box::new(steel_plate::Grind::new()),
            Self::SteelRust => Box::new(steel_plate::Rust::new()),
        }
    }
}

impl std::fmt::Display for EffectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::CathEmber => "Ember",
            Self::CathVelvet => "Velvet",
            Self::CathDrift => "Drift",
            Self::CathEcho => "Echo",
            Self::CathHaze => "Haze",
            Self::FilFracture => "Fracture",
            Self::FilPrism => "Prism",
            Self::FilPhase => "Phase",
            Self::FilCascade => "Cascade",
            Self::FilGlisten => "Glisten",
            Self::SteelScorch => "Scorch",
            Self::SteelSnarl => "Snarl",
            Self::SteelShred => "Shred",
            Self::SteelGrind => "Grind",
            Self::SteelRust => "Rust",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48_000.0;
    const BLOCK: usize = 256;

    fn noise(len: usize, seed: u32) -> Vec<f32> {
        let mut state = seed.max(1);
        (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state as f32 / u32::MAX as f32) * 2.0 - 1.0
            })
            .collect()
    }

    #[test]
    fn ids_are_consistent() {
        for (i, effect) in EffectId::ALL.iter().enumerate() {
            assert_eq!(effect.index(), i);
            assert_eq!(EffectId::from_param_id(effect.param_id()), Some(*effect));
            assert_eq!(EffectId::for_slot(effect.preamp(), effect.slot()), *effect);
        }
        assert_eq!(EffectId::from_param_id("cath_nope"), None);
        assert_eq!(
            EffectId::chain(PreampType::Filament),
            [
                EffectId::FilFracture,
                EffectId::FilPrism,
                EffectId::FilPhase,
                EffectId::FilCascade,
                EffectId::FilGlisten,
            ]
        );
        assert_eq!(EffectId::SteelRust.slot(), EffectSlot::Reverb);
        assert_eq!(EffectId::SteelRust.preamp(), PreampType::SteelPlate);
    }

    #[test]
    fn zero_mix_is_exact_passthrough() {
        for effect in EffectId::ALL {
            let mut unit = effect.build();
            unit.prepare(SR, BLOCK);
            let input_l = noise(BLOCK, 7);
            let input_r = noise(BLOCK, 11);
            let mut left = input_l.clone();
            let mut right = input_r.clone();
            unit.process(&mut left, &mut right);
            assert_eq!(left, input_l, "{effect} altered the left channel");
            assert_eq!(right, input_r, "{effect} altered the right channel");
        }
    }

    #[test]
    fn full_mix_is_finite_and_bounded() {
        for effect in EffectId::ALL {
            let mut unit = effect.build();
            unit.prepare(SR, BLOCK);
            unit.set_mix(1.0);
            assert_eq!(unit.mix(), 1.0);
            for block in 0..200 {
                let mut left = noise(BLOCK, block + 1);
                let mut right = noise(BLOCK, block + 1000);
                unit.process(&mut left, &mut right);
                for s in left.iter().chain(right.iter()) {
                    assert!(s.is_finite(), "{effect} produced {s}");
                    assert!(s.abs() < 8.0, "{effect} ran away: {s}");
                }
            }
        }
    }

    #[test]
    fn full_mix_changes_the_signal() {
        for effect in EffectId::ALL {
            let mut unit = effect.build();
            unit.prepare(SR, BLOCK);
            unit.set_mix(1.0);
            let mut changed = false;
            for block in 0..40 {
                let input = noise(BLOCK, block + 3);
                let mut left = input.clone();
                let mut right = input.clone();
                unit.process(&mut left, &mut right);
                changed |= left
                    .iter()
                    .zip(&input)
                    .any(|(a, b)| (a - b).abs() > 1e-4);
            }
            assert!(changed, "{effect} had no audible effect");
        }
    }

    #[test]
    fn reset_makes_processing_repeatable() {
        for effect in EffectId::ALL {
            let mut unit = effect.build();
            unit.prepare(SR, BLOCK);
            unit.set_mix(0.7);

            let run = |unit: &mut Box<dyn EffectUnit>| {
                let mut out = Vec::new();
                for block in 0..8 {
                    let mut left = noise(BLOCK, block + 5);
                    let mut right = noise(BLOCK, block + 50);
                    unit.process(&mut left, &mut right);
                    out.extend(left);
                    out.extend(right);
                }
                out
            };

            unit.reset();
            let first = run(&mut unit);
            unit.reset();
            let second = run(&mut unit);
            assert_eq!(first, second, "{effect} kept state across reset");
        }
    }

    #[test]
    fn reenabled_unit_does_not_replay_old_audio() {
        for effect in EffectId::ALL {
            let mut unit = effect.build();
            unit.prepare(SR, BLOCK);
            unit.set_mix(1.0);
            for _ in 0..20 {
                let mut left = vec![0.8; BLOCK];
                let mut right = vec![-0.8; BLOCK];
                unit.process(&mut left, &mut right);
            }

            // Parked over silence for longer than any tail.
            unit.set_mix(0.0);
            for _ in 0..(10.0 * SR) as usize / BLOCK {
                let mut left = vec![0.0; BLOCK];
                let mut right = vec![0.0; BLOCK];
                unit.process(&mut left, &mut right);
            }

            unit.set_mix(1.0);
            for _ in 0..20 {
                let mut left = vec![0.0; BLOCK];
                let mut right = vec![0.0; BLOCK];
                unit.process(&mut left, &mut right);
                let peak = left.iter().chain(&right).fold(0.0f32, |p, s| p.max(s.abs()));
                assert!(peak < 1e-6, "{effect} replayed a stale tail at {peak}");
            }
        }
    }

    #[test]
    fn unprepared_units_do_not_panic() {
        for effect in EffectId::ALL {
            let mut unit = effect.build();
            unit.set_mix(1.0);
            let mut left = vec![0.5; 64];
            let mut right = vec![-0.5; 64];
            unit.process(&mut left, &mut right);
            assert!(left.iter().chain(&right).all(|s| s.is_finite()));
        }
    }
}
