//! Loading real files from disk in layers.

use std::fs;

use bridgeconf::{loader, BridgeConfig, ConfigError};

#[test]
fn later_files_override_only_the_keys_they_set() {
    let dir = tempfile::tempdir().unwrap();
    let system = dir.path().join("system.toml");
    let local = dir.path().join("local.toml");

    fs::write(
        &system,
        r#"
[mixer]
card = "hw:PCH"
left_control = "IEC958"
right_control = "IEC958_"

[poll]
interval_ms = 250
"#,
    )
    .unwrap();
    fs::write(
        &local,
        r#"
[mixer]
card = "hw:MOD-Duo"
"#,
    )
    .unwrap();

    let config = loader::load_layered(&[system, local]).unwrap();

    assert_eq!(config.mixer.card, "hw:MOD-Duo");
    assert_eq!(config.mixer.left_control, "IEC958");
    assert_eq!(config.mixer.right_control, "IEC958_");
    assert_eq!(config.poll.interval_ms, 250);
    assert_eq!(config.server, BridgeConfig::default().server);
}

#[test]
fn cli_path_is_loaded_after_user_config() {
    let dir = tempfile::tempdir().unwrap();
    let cli = dir.path().join("override.toml");
    fs::write(&cli, "[server]\nclient_name = \"from-cli\"\n").unwrap();

    let files = loader::discover_config_files_with_override(Some(&cli));
    assert_eq!(files.last(), Some(&cli));

    let config = BridgeConfig::load_from(Some(&cli)).unwrap();
    assert_eq!(config.server.client_name, "from-cli");
}

#[test]
fn missing_file_reports_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");

    let err = loader::load_layered(&[missing.clone()]).unwrap_err();
    match err {
        ConfigError::FileRead { path, .. } => assert_eq!(path, missing),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn empty_layer_list_yields_defaults() {
    let config = loader::load_layered(&[]).unwrap();
    assert_eq!(config, BridgeConfig::default());
}
