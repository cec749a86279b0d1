use assert_no_alloc::{AllocDisabler, assert_no_alloc};
use dimura::amp::effects::EffectId;
use dimura::amp::stages::preamp::PreampType;
use dimura::audio::engine::PreampEngine;

#[global_allocator]
static ALLOCATOR: AllocDisabler = AllocDisabler;

const SAMPLE_RATE: f64 = 44_100.0;
const BLOCK_SIZE: usize = 256;

#[test]
fn processing_never_allocates() {
    let (mut engine, handle) = PreampEngine::new();
    for effect in EffectId::ALL {
        handle.set_effect_mix(effect, 0.6);
    }
    engine.prepare(SAMPLE_RATE, BLOCK_SIZE);

    let mut left: Vec<f32> = (0..BLOCK_SIZE).map(|i| (i as f32 * 0.05).sin()).collect();
    let mut right = left.clone();
    let mut mono = left.clone();
    // Longer than the prepared block size, so the mono path has to chunk.
    let mut long_mono = vec![0.25f32; BLOCK_SIZE * 3 + 17];

    assert_no_alloc(|| {
        for block in 0..60 {
            handle.set_preamp_type(block % PreampType::ALL.len());
            handle.set_drive((block % 10) as f32 / 10.0);
            handle.set_tone(1.0 - (block % 7) as f32 / 7.0);
            handle.set_output_gain(0.4);

            engine.process_stereo(&mut left, &mut right, false);
            engine.process_mono(&mut mono, false);
            engine.process_mono(&mut long_mono, false);
            {
                let mut channels = [left.as_mut_slice(), right.as_mut_slice()];
                engine.process(&mut channels, block % 5 == 0);
            }
        }
        engine.reset();
    });

    #[cfg(debug_assertions)]
    assert_eq!(assert_no_alloc::violation_count(), 0);

    assert!(left.iter().chain(&right).chain(&mono).all(|s| s.is_finite()));
}
