// Configuration source loading
//
// Priority order:
// 1. Environment variables (CANARY_* prefix)
// 2. Config file path from CANARY_CONFIG
// 3. Inline config content from CANARY_CONFIG_CONTENT
// 4. Default config files (./canary.toml, ./.canary.toml)
// 5. Built-in defaults

use crate::env_overrides::{self, EnvSource, ENV_PREFIX};
use crate::RuntimeConfig;
use anyhow::{Context, Result};
use std::env;
use std::path::Path;

const DEFAULT_CONFIG_FILES: [&str; 2] = ["./canary.toml", "./.canary.toml"];

/// Load configuration using process environment and file access.
pub fn load_config() -> Result<RuntimeConfig> {
    let mut config = RuntimeConfig::default();

    // A missing file falls back to defaults; an unreadable one is an error
    if let Some(file_config) = load_from_file()? {
        config.merge(file_config);
    }

    env_overrides::apply_env_overrides(&mut config, &StdEnvSource)?;
    config.validate()?;
    Ok(config)
}

fn load_from_file() -> Result<Option<RuntimeConfig>> {
    if let Ok(path) = env::var("CANARY_CONFIG") {
        return read_config_file(Path::new(&path)).map(Some);
    }

    if let Ok(content) = env::var("CANARY_CONFIG_CONTENT") {
        let config: RuntimeConfig = toml::from_str(&content)
            .context("Failed to parse inline config from CANARY_CONFIG_CONTENT")?;
        return Ok(Some(config));
    }

    for path in DEFAULT_CONFIG_FILES {
        let path = Path::new(path);
        if path.exists() {
            return read_config_file(path).map(Some);
        }
    }

    Ok(None)
}

fn read_config_file(path: &Path) -> Result<RuntimeConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Load configuration from a specific file path (for CLI --config flag).
/// Returns error if file doesn't exist or can't be parsed.
/// Environment overrides still apply on top of the file.
pub fn load_from_file_path(path: impl AsRef<Path>) -> Result<RuntimeConfig> {
    let file_config = read_config_file(path.as_ref())?;

    let mut config = RuntimeConfig::default();
    config.merge(file_config);

    env_overrides::apply_env_overrides(&mut config, &StdEnvSource)?;
    config.validate()?;
    Ok(config)
}

/// Load configuration with graceful fallback to defaults.
/// Tries standard config file locations, returns defaults if none found.
/// A config file that exists but fails to parse is reported, not skipped.
pub fn load_or_default() -> Result<RuntimeConfig> {
    load_config()
}

struct StdEnvSource;

impl EnvSource for StdEnvSource {
    fn get(&self, key: &str) -> Option<String> {
        env::var(format!("{}{}", ENV_PREFIX, key)).ok()
    }
}
