//! Config file discovery, layered loading, and environment variable overlay.

use crate::{BridgeConfig, ConfigError};
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files in standard locations.
///
/// Returns paths in load order (system, user, local).
/// Only returns files that exist.
pub fn discover_config_files() -> Vec<PathBuf> {
    discover_config_files_with_override(None)
}

/// Discover config files, optionally with a CLI override path.
///
/// If `cli_path` is provided and exists, it replaces the local override.
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/jackbridge/config.toml");
    if system.exists() {
        files.push(system);
    }

    // XDG_CONFIG_HOME or ~/.config
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("jackbridge/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        if path.exists() {
            files.push(path.to_path_buf());
            return files;
        }
    }

    let local = PathBuf::from("jackbridge.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Read and validate one config file, returning its raw table.
pub fn load_table(path: &Path) -> Result<toml::Table, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_table(&contents, path)
}

fn parse_table(contents: &str, path: &Path) -> Result<toml::Table, ConfigError> {
    let table: toml::Table = contents.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    // Reject type errors per file so the message names the offending file
    let _: BridgeConfig = toml::Value::Table(table.clone())
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    Ok(table)
}

/// Load files in order, merging later tables over earlier ones key by key.
pub fn load_layered(files: &[PathBuf]) -> Result<BridgeConfig, ConfigError> {
    let mut merged = toml::Table::new();
    for path in files {
        let table = load_table(path)?;
        merge_tables(&mut merged, table);
    }

    toml::Value::Table(merged)
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::Parse {
            path: files.last().cloned().unwrap_or_default(),
            message: e.to_string(),
        })
}

/// Deep-merge `overlay` into `base`. Nested tables merge; other values replace.
pub fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Apply environment variable overrides from the process environment.
pub fn apply_env_overrides(config: &mut BridgeConfig, sources: &mut ConfigSources) {
    apply_overrides_with(config, sources, |key| env::var(key).ok());
}

/// Apply overrides from an arbitrary lookup. Unparseable values are ignored.
pub fn apply_overrides_with<F>(config: &mut BridgeConfig, sources: &mut ConfigSources, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("JACKBRIDGE_CLIENT_NAME") {
        config.server.client_name = v;
        sources.env_overrides.push("JACKBRIDGE_CLIENT_NAME".to_string());
    }

    if let Some(v) = lookup("JACKBRIDGE_MIXER_CARD") {
        config.mixer.card = v;
        sources.env_overrides.push("JACKBRIDGE_MIXER_CARD".to_string());
    }
    if let Some(v) = lookup("JACKBRIDGE_MIXER_ENABLED") {
        if let Some(enabled) = parse_bool(&v) {
            config.mixer.enabled = enabled;
            sources.env_overrides.push("JACKBRIDGE_MIXER_ENABLED".to_string());
        }
    }

    if let Some(v) = lookup("JACKBRIDGE_POLL_INTERVAL_MS") {
        if let Ok(ms) = v.parse() {
            config.poll.interval_ms = ms;
            sources.env_overrides.push("JACKBRIDGE_POLL_INTERVAL_MS".to_string());
        }
    }

    if let Some(v) = lookup("JACKBRIDGE_LOG_LEVEL") {
        config.telemetry.log_level = v;
        sources.env_overrides.push("JACKBRIDGE_LOG_LEVEL".to_string());
    }
    // Also support RUST_LOG
    if let Some(v) = lookup("RUST_LOG") {
        config.telemetry.log_level = v;
        sources.env_overrides.push("RUST_LOG".to_string());
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_discover_config_files() {
        // Just verify it doesn't panic
        let _files = discover_config_files();
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml = r#"
[mixer]
card = "hw:PCH"
"#;
        let table = parse_table(toml, Path::new("test.toml")).unwrap();
        let config: BridgeConfig = toml::Value::Table(table).try_into().unwrap();
        assert_eq!(config.mixer.card, "hw:PCH");
        // Other values should be defaults
        assert_eq!(config.mixer.left_control, "Left True-Bypass");
        assert_eq!(config.server.client_name, "mod-ui");
    }

    #[test]
    fn test_parse_rejects_wrong_types() {
        let toml = r#"
[poll]
interval_ms = "fast"
"#;
        let err = parse_table(toml, Path::new("bad.toml")).unwrap_err();
        match err {
            ConfigError::Parse { path, .. } => assert_eq!(path, PathBuf::from("bad.toml")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_merge_tables_is_key_by_key() {
        let mut base: toml::Table = r#"
[mixer]
card = "hw:A"
left_control = "L"
"#
        .parse()
        .unwrap();
        let overlay: toml::Table = r#"
[mixer]
card = "hw:B"
"#
        .parse()
        .unwrap();

        merge_tables(&mut base, overlay);

        let mixer = base["mixer"].as_table().unwrap();
        assert_eq!(mixer["card"].as_str(), Some("hw:B"));
        assert_eq!(mixer["left_control"].as_str(), Some("L"));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("JACKBRIDGE_CLIENT_NAME", "ui-test"),
            ("JACKBRIDGE_MIXER_ENABLED", "off"),
            ("JACKBRIDGE_POLL_INTERVAL_MS", "not-a-number"),
            ("RUST_LOG", "jackbridge=trace"),
        ]
        .into_iter()
        .collect();

        let mut config = BridgeConfig::default();
        let mut sources = ConfigSources::default();
        apply_overrides_with(&mut config, &mut sources, |k| {
            vars.get(k).map(|v| v.to_string())
        });

        assert_eq!(config.server.client_name, "ui-test");
        assert!(!config.mixer.enabled);
        assert_eq!(config.poll.interval_ms, 500);
        assert_eq!(config.telemetry.log_level, "jackbridge=trace");
        assert_eq!(
            sources.env_overrides,
            vec!["JACKBRIDGE_CLIENT_NAME", "JACKBRIDGE_MIXER_ENABLED", "RUST_LOG"]
        );
    }
}
