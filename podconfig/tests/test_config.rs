use podconfig::Config;
use serde_yaml::Value;

#[test]
fn load_config_writes_merged_defaults() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let config = Config::load_config(dir.path().to_str().unwrap())?;

    assert_eq!(config.get_http_port(), 6000);
    assert_eq!(config.get_log_cache_size()?, 1000);
    assert!(config.get_log_enable_console()?);
    assert!(dir.path().join("config.yaml").exists());

    Ok(())
}

#[test]
fn external_file_overrides_embedded_defaults() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    std::fs::write(
        dir.path().join("config.yaml"),
        "host:\n  http_port: 7100\n  logger:\n    min_level: debug\n",
    )?;

    let config = Config::load_config(dir.path().to_str().unwrap())?;

    assert_eq!(config.get_http_port(), 7100);
    assert_eq!(config.get_log_min_level()?, "debug");
    // Untouched defaults survive the merge
    assert_eq!(config.get_cors_origin(), "http://localhost:5173");

    Ok(())
}

#[test]
fn setters_persist_to_disk() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().to_str().unwrap().to_string();

    let config = Config::load_config(&path)?;
    config.set_http_port(9123)?;
    config.set_value(&["vendors", "llm", "model"], Value::String("test-model".into()))?;

    let reloaded = Config::load_config(&path)?;
    assert_eq!(reloaded.get_http_port(), 9123);
    assert_eq!(reloaded.get_string_or(&["vendors", "llm", "model"], "x"), "test-model");

    Ok(())
}

#[test]
fn typed_helpers_fall_back_to_defaults() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let config = Config::load_config(dir.path().to_str().unwrap())?;

    assert_eq!(config.get_u64_or(&["missing", "key"], 17), 17);
    assert_eq!(config.get_f64_or(&["vendors", "image", "guidance_scale"], 0.0), 7.5);
    assert!(!config.get_bool_or(&["missing"], false));

    config.set_value(&["generation", "default_speakers"], Value::String("3".into()))?;
    assert_eq!(config.get_usize_or(&["generation", "default_speakers"], 2), 3);

    Ok(())
}

#[test]
fn managed_dirs_resolve_against_config_dir() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let config = Config::load_config(dir.path().to_str().unwrap())?;

    let audio = config.get_managed_dir(&["storage", "audio_dir"], "static/audio")?;
    assert!(audio.starts_with(dir.path().to_str().unwrap()));
    assert!(std::path::Path::new(&audio).is_dir());

    let other = config.get_managed_dir(&["storage", "scratch_dir"], "scratch")?;
    assert!(other.ends_with("scratch"));
    assert_eq!(
        config.get_value(&["storage", "scratch_dir"])?,
        Value::String("scratch".into())
    );

    Ok(())
}
