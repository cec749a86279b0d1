use crate::amp::effects::{EffectId, EffectSlot, EffectUnit};
use crate::amp::stages::preamp::PreampType;

// EffectChain holds one character's five effects in slot order.
pub struct EffectChain {
    preamp: PreampType,
    units: [Box<dyn EffectUnit>; 5],
}

impl EffectChain {
    pub fn new(preamp: PreampType) -> Self {
        Self {
            preamp,
            units: EffectId::chain(preamp).map(EffectId::build),
        }
    }

    pub const fn preamp(&self) -> PreampType {
        self.preamp
    }

    // Every unit is sized here, whatever its current mix.
    pub fn prepare(&mut self, sample_rate: f32, max_block_size: usize) {
        for unit in &mut self.units {
            unit.prepare(sample_rate, max_block_size);
        }
    }

    pub fn reset(&mut self) {
        for unit in &mut self.units {
            unit.reset();
        }
    }

    pub fn set_mix(&mut self, slot: EffectSlot, mix: f32) {
        self.units[slot as usize].set_mix(mix);
    }

    pub fn mix(&self, slot: EffectSlot) -> f32 {
        self.units[slot as usize].mix()
    }

    // Effects that belong to another character are ignored.
    pub fn set_effect_mix(&mut self, effect: EffectId, mix: f32) {
        if effect.preamp() == self.preamp {
            self.set_mix(effect.slot(), mix);
        }
    }

    // process runs the block through Distortion, Filter, Modulation, Delay
    // and Reverb, in that order.
    pub fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        let len = left.len().min(right.len());
        let (left, right) = (&mut left[..len], &mut right[..len]);
        for unit in &mut self.units {
            unit.process(left, right);
        }
    }
}
