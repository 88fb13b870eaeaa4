use super::{LogFormat, RuntimeConfig};
use anyhow::{anyhow, Context, Result};

pub const ENV_PREFIX: &str = "CANARY_";

/// Abstraction over environment-variable lookups so tests and embedding hosts
/// can supply their own source of overrides.
pub trait EnvSource {
    /// Look up `key` with the `CANARY_` prefix applied.
    fn get(&self, key: &str) -> Option<String>;
}

/// Apply environment-variable overrides (highest priority below CLI flags).
pub fn apply_env_overrides<E: EnvSource>(config: &mut RuntimeConfig, env: &E) -> Result<()> {
    // Logging
    if let Some(level) = get_env_string(env, "LOG_LEVEL") {
        config.log.level = level;
    }
    if let Some(format) = get_env_string(env, "LOG_FORMAT") {
        config.log.format = format
            .parse::<LogFormat>()
            .context("Invalid CANARY_LOG_FORMAT value")?;
    }

    // Naming
    if let Some(service) = get_env_string(env, "SERVICE") {
        config.naming.service = Some(service);
    }
    if let Some(stage) = get_env_string(env, "STAGE") {
        config.naming.stage = Some(stage);
    }

    // Orchestration
    if let Some(val) = get_env_bool(env, "REQUIRE_INTEGRATION")? {
        config.orchestration.require_integration = val;
    }

    Ok(())
}

fn get_env_string<E: EnvSource>(env: &E, key: &str) -> Option<String> {
    env.get(key)
}

fn get_env_bool<E: EnvSource>(env: &E, key: &str) -> Result<Option<bool>> {
    match get_env_string(env, key) {
        Some(val) => {
            let parsed = match val.to_lowercase().as_str() {
                "1" | "yes" | "on" => true,
                "0" | "no" | "off" => false,
                other => other.parse::<bool>().map_err(|e| {
                    anyhow!(
                        "Failed to parse {}{} (expected bool): {}",
                        ENV_PREFIX,
                        key,
                        e
                    )
                })?,
            };
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_env::MapEnv;

    #[test]
    fn overrides_every_section() {
        let env = MapEnv::with(&[
            ("LOG_LEVEL", "warn"),
            ("LOG_FORMAT", "json"),
            ("SERVICE", "orders"),
            ("STAGE", "prod"),
            ("REQUIRE_INTEGRATION", "false"),
        ]);
        let mut config = RuntimeConfig::default();
        apply_env_overrides(&mut config, &env).unwrap();

        assert_eq!(config.log.level, "warn");
        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(config.naming.service.as_deref(), Some("orders"));
        assert_eq!(config.naming.stage.as_deref(), Some("prod"));
        assert!(!config.orchestration.require_integration);
    }

    #[test]
    fn bool_accepts_common_spellings() {
        for (raw, expected) in [("1", true), ("OFF", false), ("True", true)] {
            let env = MapEnv::with(&[("REQUIRE_INTEGRATION", raw)]);
            assert_eq!(get_env_bool(&env, "REQUIRE_INTEGRATION").unwrap(), Some(expected));
        }
    }

    #[test]
    fn invalid_values_are_errors() {
        let mut config = RuntimeConfig::default();
        let err = apply_env_overrides(&mut config, &MapEnv::with(&[("REQUIRE_INTEGRATION", "maybe")]))
            .unwrap_err();
        assert!(err.to_string().contains("CANARY_REQUIRE_INTEGRATION"));

        let err = apply_env_overrides(&mut config, &MapEnv::with(&[("LOG_FORMAT", "xml")]))
            .unwrap_err();
        assert!(err.to_string().contains("CANARY_LOG_FORMAT"));
    }
}
