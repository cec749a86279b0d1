use anyhow::Result;
use dimura::settings::{AudioSettings, Settings};
use std::fs;

#[test]
fn missing_file_yields_defaults() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let settings = Settings::load(&dir.path().join("absent.json"))?;
    assert_eq!(settings, Settings::default());
    Ok(())
}

#[test]
fn save_then_load_round_trips() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("nested").join("config").join("settings.json");

    let settings = Settings {
        audio: AudioSettings {
            block_size: 128,
            sample_rate_override: Some(96_000),
        },
        default_preset: Some("steel_forge_fire".to_string()),
    };
    settings.save(&path)?;
    assert!(path.exists(), "parent directories are created");

    let loaded = Settings::load(&path)?;
    assert_eq!(loaded, settings);

    let text = fs::read_to_string(&path)?;
    assert!(text.contains("\"block_size\": 128"), "pretty JSON: {text}");
    Ok(())
}

#[test]
fn malformed_file_is_an_error() -> Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    std::io::Write::write_all(&mut file, b"{ not json")?;

    let err = Settings::load(file.path()).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to parse settings"));
    Ok(())
}
