use serde::Serialize;

use crate::amp::effects::{EffectId, EffectSlot};
use crate::amp::stages::preamp::PreampType;
use crate::audio::params::EngineHandle;

mod factory;

/// A read-only factory setting for one character.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Preset {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub preamp: PreampType,
    pub drive: f32,
    pub tone: f32,
    pub output: f32,
    /// Mixes in chain order: distortion, filter, modulation, delay, reverb.
    pub effects: [f32; 5],
}

impl Preset {
    /// Push every value of this preset to the engine.
    ///
    /// Only the preset's own character has its mixes touched; the other
    /// characters keep whatever they had.
    pub fn apply(&self, handle: &EngineHandle) {
        handle.set_preamp_type(self.preamp.index());
        handle.set_drive(self.drive);
        handle.set_tone(self.tone);
        handle.set_output_gain(self.output);
        for (slot, &mix) in EffectSlot::CHAIN.iter().zip(&self.effects) {
            handle.set_effect_mix(EffectId::for_slot(self.preamp, *slot), mix);
        }
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.name, self.id, self.description)
    }
}

/// The ten factory presets of `preamp`.
pub const fn presets_for(preamp: PreampType) -> &'static [Preset] {
    match preamp {
        PreampType::Cathode => &factory::CATHODE,
        PreampType::Filament => &factory::FILAMENT,
        PreampType::SteelPlate => &factory::STEEL_PLATE,
    }
}

/// All thirty factory presets, grouped by character.
pub fn all() -> impl Iterator<Item = &'static Preset> {
    PreampType::ALL
        .into_iter()
        .flat_map(|preamp| presets_for(preamp).iter())
}

pub fn find(id: &str) -> Option<&'static Preset> {
    all().find(|preset| preset.id == id)
}

/// First preset of `preamp`, loaded when the character is picked fresh.
pub const fn default_for(preamp: PreampType) -> &'static Preset {
    &presets_for(preamp)[0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ten_presets_per_character() {
        for preamp in PreampType::ALL {
            let presets = presets_for(preamp);
            assert_eq!(presets.len(), 10);
            assert!(presets.iter().all(|p| p.preamp == preamp));
        }
        assert_eq!(all().count(), 30);
    }

    #[test]
    fn ids_are_unique_and_prefixed() {
        let mut seen = HashSet::new();
        for preset in all() {
            assert!(seen.insert(preset.id), "duplicate {}", preset.id);
            let prefix = match preset.preamp {
                PreampType::Cathode => "cath_",
                PreampType::Filament => "fil_",
                PreampType::SteelPlate => "steel_",
            };
            assert!(preset.id.starts_with(prefix), "{}", preset.id);
        }
    }

    #[test]
    fn values_are_normalized() {
        for preset in all() {
            for value in [preset.drive, preset.tone, preset.output]
                .iter()
                .chain(&preset.effects)
            {
                assert!((0.0..=1.0).contains(value), "{}", preset.id);
            }
        }
    }

    #[test]
    fn lookup() {
        assert_eq!(find("fil_hologram").map(|p| p.name), Some("Hologram"));
        assert!(find("nope").is_none());
        assert_eq!(default_for(PreampType::Cathode).id, "cath_whiskey_glow");
        assert_eq!(default_for(PreampType::Filament).id, "fil_zero_kelvin");
        assert_eq!(default_for(PreampType::SteelPlate).id, "steel_iron_fist");
    }

    #[test]
    fn apply_sets_character_controls_and_mixes() {
        let handle = EngineHandle::new();
        handle.set_cath_haze(0.9);

        let preset = find("steel_demolition").unwrap();
        preset.apply(&handle);

        assert_eq!(handle.preamp_type(), PreampType::SteelPlate);
        assert_eq!(handle.drive(), 0.85);
        assert_eq!(handle.tone(), 0.35);
        assert_eq!(handle.output_gain(), 0.55);
        assert_eq!(handle.effect_mix(EffectId::SteelScorch), 0.75);
        assert_eq!(handle.effect_mix(EffectId::SteelRust), 0.6);
        assert_eq!(handle.effect_mix(EffectId::CathHaze), 0.9);
    }
}
