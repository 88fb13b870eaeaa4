// canary-config - Configuration for the canary deployment tool
//
// Supports configuration from multiple sources:
// 1. Environment variables (highest priority)
// 2. Config file path from CANARY_CONFIG env var
// 3. Config file contents from CANARY_CONFIG_CONTENT env var
// 4. Default config file locations (./canary.toml, ./.canary.toml)
// 5. Built-in defaults (lowest priority)
//
// CLI flags are applied on top by the binary.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

mod env_overrides;
mod sources;
mod validation;

pub use env_overrides::{EnvSource, ENV_PREFIX};
pub use sources::{load_from_file_path, load_or_default};

/// Stage used when neither config nor the service descriptor names one
pub const DEFAULT_STAGE: &str = "dev";

/// Main runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub log: LogConfig,

    #[serde(default)]
    pub naming: NamingConfig,

    #[serde(default)]
    pub orchestration: OrchestrationConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => anyhow::bail!("Unsupported log format: {}. Supported: text, json", s),
        }
    }
}

/// Stack naming inputs
///
/// Both values are optional here; the binary falls back to the service
/// descriptor and finally to [`DEFAULT_STAGE`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
}

impl NamingConfig {
    /// Service name, preferring configuration over the descriptor value.
    pub fn resolve_service<'a>(&'a self, descriptor: Option<&'a str>) -> Option<&'a str> {
        self.service.as_deref().or(descriptor)
    }

    /// Stage, preferring configuration over the descriptor value.
    pub fn resolve_stage<'a>(&'a self, descriptor: Option<&'a str>) -> &'a str {
        self.stage.as_deref().or(descriptor).unwrap_or(DEFAULT_STAGE)
    }
}

/// Orchestration policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestrationConfig {
    #[serde(default = "default_require_integration")]
    pub require_integration: bool,
}

fn default_require_integration() -> bool {
    true
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self {
            require_integration: true,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from all sources with priority
    pub fn load() -> Result<Self> {
        sources::load_config()
    }

    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config content")
    }

    /// Merge a file-sourced config over this one.
    ///
    /// Sections are taken from `other`; naming values only when `other` sets them.
    pub fn merge(&mut self, other: RuntimeConfig) {
        self.log = other.log;
        self.orchestration = other.orchestration;

        if other.naming.service.is_some() {
            self.naming.service = other.naming.service;
        }
        if other.naming.stage.is_some() {
            self.naming.stage = other.naming.stage;
        }
    }

    /// Apply environment overrides from a custom source.
    pub fn apply_env_overrides_from<E: EnvSource>(&mut self, env: &E) -> Result<()> {
        env_overrides::apply_env_overrides(self, env)
    }

    /// Build a configuration from optional inline TOML plus overrides supplied
    /// by an `EnvSource`. Reads neither files nor the process environment.
    pub fn load_with_env<E: EnvSource>(inline_config: Option<&str>, env: &E) -> Result<Self> {
        let mut config = RuntimeConfig::default();

        if let Some(inline) = inline_config {
            let file_config: RuntimeConfig =
                toml::from_str(inline).context("Failed to parse inline config content")?;
            config.merge(file_config);
        }

        config.apply_env_overrides_from(env)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}


#[cfg(test)]
mod tests {
    use super::test_env::MapEnv;
    use super::*;

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("yaml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_default_config() {
        let config = RuntimeConfig::default();
        assert_eq!(config.log.level, "info");
        assert_eq!(config.log.format, LogFormat::Text);
        assert!(config.orchestration.require_integration);
        assert_eq!(config.naming.resolve_stage(None), "dev");
        assert_eq!(config.naming.resolve_service(Some("svc")), Some("svc"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = RuntimeConfig::from_toml_str(
            r#"
            [log]
            format = "json"

            [naming]
            stage = "prod"
            "#,
        )
        .unwrap();
        assert_eq!(config.log.level, "info");
        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(config.naming.stage.as_deref(), Some("prod"));
        assert!(config.orchestration.require_integration);
    }

    #[test]
    fn test_merge_keeps_unset_naming() {
        let mut base = RuntimeConfig::default();
        base.naming.service = Some("from-base".to_string());
        let mut file = RuntimeConfig::default();
        file.naming.stage = Some("qa".to_string());
        file.orchestration.require_integration = false;

        base.merge(file);
        assert_eq!(base.naming.service.as_deref(), Some("from-base"));
        assert_eq!(base.naming.stage.as_deref(), Some("qa"));
        assert!(!base.orchestration.require_integration);
    }

    #[test]
    fn test_env_wins_over_inline() {
        let env = MapEnv::with(&[("STAGE", "staging"), ("LOG_LEVEL", "debug")]);
        let config = RuntimeConfig::load_with_env(
            Some("[naming]\nstage = \"prod\"\nservice = \"orders\"\n"),
            &env,
        )
        .unwrap();
        assert_eq!(config.naming.stage.as_deref(), Some("staging"));
        assert_eq!(config.naming.service.as_deref(), Some("orders"));
        assert_eq!(config.log.level, "debug");
    }

    #[test]
    fn test_descriptor_stage_used_when_unset() {
        let config = RuntimeConfig::load_with_env(None, &MapEnv::default()).unwrap();
        assert_eq!(config.naming.resolve_stage(Some("beta")), "beta");
    }
}
