use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use dimura::amp::effects::EffectId;
use dimura::amp::stages::preamp::PreampType;
use dimura::audio::engine::PreampEngine;
use dimura::audio::params::EngineHandle;
use dimura::preset;
use dimura::settings::{SETTINGS_ENV, Settings};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[cfg(debug_assertions)]
#[global_allocator]
static ALLOCATOR: assert_no_alloc::AllocDisabler = assert_no_alloc::AllocDisabler;

#[derive(Parser, Debug)]
#[command(name = "dimura")]
#[command(version)]
#[command(about = "Three-character preamp with per-character effect chains, rendered offline.")]
struct Args {
    #[arg(long, env = SETTINGS_ENV, help = "Settings file to read")]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a WAV file through the preamp.
    Render(RenderArgs),
    /// List factory presets.
    Presets {
        #[arg(long, value_enum)]
        preamp: Option<PreampType>,
    },
}

#[derive(clap::Args, Debug)]
struct RenderArgs {
    input: PathBuf,
    output: PathBuf,

    #[arg(long, help = "Factory preset id, applied before the other options")]
    preset: Option<String>,

    #[arg(long, value_enum)]
    preamp: Option<PreampType>,

    #[arg(long, value_parser = parse_unit)]
    drive: Option<f32>,

    #[arg(long, value_parser = parse_unit)]
    tone: Option<f32>,

    #[arg(
        long = "output",
        value_parser = parse_unit,
        help = "Output level, 0 is -12 dB and 1 is +6 dB"
    )]
    output_level: Option<f32>,

    #[arg(
        long = "mix",
        value_parser = parse_mix,
        help = "Effect mix as <id>=<value>, e.g. cath_haze=0.4; repeatable"
    )]
    mixes: Vec<(EffectId, f32)>,

    #[arg(long, help = "Samples per processed block [default: from settings]")]
    block_size: Option<usize>,

    #[arg(long, help = "Pass the audio through untouched")]
    bypass: bool,
}

fn parse_unit(s: &str) -> Result<f32, String> {
    let value: f32 = s.parse().map_err(|e| format!("{e}"))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is outside 0.0..=1.0"))
    }
}

fn parse_mix(s: &str) -> Result<(EffectId, f32), String> {
    let (id, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected <id>=<value>, got '{s}'"))?;
    let effect =
        EffectId::from_param_id(id.trim()).ok_or_else(|| format!("unknown effect '{id}'"))?;
    Ok((effect, parse_unit(value.trim())?))
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    debug!("Args: {args:?}");

    match args.command {
        Command::Presets { preamp } => {
            list_presets(preamp);
            Ok(())
        }
        Command::Render(render_args) => {
            let settings_path = args.settings.unwrap_or_else(Settings::default_path);
            let settings = Settings::load(&settings_path)?;
            debug!("{settings}");
            render(&render_args, &settings)
        }
    }
}

fn list_presets(preamp: Option<PreampType>) {
    let characters = preamp.map_or_else(|| PreampType::ALL.to_vec(), |p| vec![p]);
    for character in characters {
        println!("{character}");
        for preset in preset::presets_for(character) {
            println!("  {preset}");
        }
    }
}

fn configure(handle: &EngineHandle, args: &RenderArgs, settings: &Settings) -> Result<()> {
    if let Some(id) = args.preset.as_deref().or(settings.default_preset.as_deref()) {
        let Some(preset) = preset::find(id) else {
            bail!("Unknown preset '{id}', see `dimura presets`");
        };
        info!("Preset: {}", preset.name);
        preset.apply(handle);
    }

    if let Some(preamp) = args.preamp {
        handle.set_preamp_type(preamp.index());
    }
    if let Some(drive) = args.drive {
        handle.set_drive(drive);
    }
    if let Some(tone) = args.tone {
        handle.set_tone(tone);
    }
    if let Some(output) = args.output_level {
        handle.set_output_gain(output);
    }
    for &(effect, mix) in &args.mixes {
        handle.set_effect_mix(effect, mix);
    }
    handle.set_bypass(args.bypass);
    Ok(())
}

fn read_channels(path: &Path) -> Result<(WavSpec, Vec<Vec<f32>>)> {
    let reader = WavReader::open(path)
        .with_context(|| format!("Failed to open WAV file {}", path.display()))?;
    let spec = reader.spec();
    if spec.channels == 0 {
        bail!("{} has no channels", path.display());
    }

    let samples: Vec<f32> = if spec.sample_format == SampleFormat::Float {
        reader
            .into_samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read float samples")?
    } else {
        let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
        reader
            .into_samples::<i32>()
            .map(|s| s.map(|v| v as f32 / max_val))
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read integer samples")?
    };

    let count = spec.channels as usize;
    let mut channels = vec![Vec::with_capacity(samples.len() / count); count];
    for frame in samples.chunks_exact(count) {
        for (channel, &sample) in channels.iter_mut().zip(frame) {
            channel.push(sample);
        }
    }
    Ok((spec, channels))
}

fn write_channels(path: &Path, sample_rate: u32, channels: &[Vec<f32>]) -> Result<()> {
    let spec = WavSpec {
        channels: channels.len() as u16,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create WAV file {}", path.display()))?;

    let frames = channels.first().map_or(0, Vec::len);
    for i in 0..frames {
        for channel in channels {
            writer
                .write_sample(channel[i])
                .context("Failed to write sample")?;
        }
    }
    writer.finalize().context("Failed to finalize WAV file")?;
    Ok(())
}

fn render_blocks(
    engine: &mut PreampEngine,
    channels: &mut [Vec<f32>],
    block_size: usize,
    bypassed: bool,
) {
    match channels {
        [] => {}
        [mono] => {
            for block in mono.chunks_mut(block_size) {
                engine.process_mono(block, bypassed);
            }
        }
        [left, right, ..] => {
            for (l, r) in left
                .chunks_mut(block_size)
                .zip(right.chunks_mut(block_size))
            {
                engine.process_stereo(l, r, bypassed);
            }
        }
    }
}

/// Run `f` with allocation forbidden. Debug builds fail if it allocated.
#[cfg(debug_assertions)]
fn without_allocation(f: impl FnOnce()) -> Result<()> {
    let before = assert_no_alloc::violation_count();
    assert_no_alloc::assert_no_alloc(f);
    let violations = assert_no_alloc::violation_count() - before;
    if violations > 0 {
        bail!("Render loop allocated {violations} time(s) on the audio path");
    }
    Ok(())
}

#[cfg(not(debug_assertions))]
fn without_allocation(f: impl FnOnce()) -> Result<()> {
    f();
    Ok(())
}

fn render(args: &RenderArgs, settings: &Settings) -> Result<()> {
    let (spec, mut channels) = read_channels(&args.input)?;
    let sample_rate = settings
        .audio
        .sample_rate_override
        .unwrap_or(spec.sample_rate);
    let block_size = args.block_size.unwrap_or(settings.audio.block_size).max(1);

    let (mut engine, handle) = PreampEngine::new();
    configure(&handle, args, settings)?;
    engine.prepare(f64::from(sample_rate), block_size);

    info!(
        "Rendering {} ({} ch, {} Hz) with {}, block size {}",
        args.input.display(),
        spec.channels,
        sample_rate,
        handle.preamp_type(),
        block_size
    );

    let started = Instant::now();
    let bypassed = handle.bypassed();

    without_allocation(|| {
        render_blocks(&mut engine, &mut channels, block_size, bypassed);
    })?;

    info!("Processed in {:?}", started.elapsed());

    write_channels(&args.output, spec.sample_rate, &channels)?;
    info!("Wrote {}", args.output.display());
    Ok(())
}
