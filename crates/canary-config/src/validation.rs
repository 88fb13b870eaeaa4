// Configuration validation
//
// Validates that required fields are present and values are sensible

use super::*;
use anyhow::{bail, Result};
use tracing::warn;

pub fn validate_config(config: &RuntimeConfig) -> Result<()> {
    validate_log_config(&config.log)?;
    validate_naming_config(&config.naming)?;
    Ok(())
}

fn validate_log_config(config: &LogConfig) -> Result<()> {
    if config.level.trim().is_empty() {
        bail!("log.level must not be empty");
    }
    Ok(())
}

fn validate_naming_config(config: &NamingConfig) -> Result<()> {
    if let Some(ref service) = config.service {
        if service.trim().is_empty() {
            bail!("naming.service must not be empty when set");
        }
        warn_on_stack_characters("naming.service", service);
    }

    if let Some(ref stage) = config.stage {
        if stage.trim().is_empty() {
            bail!("naming.stage must not be empty when set");
        }
        warn_on_stack_characters("naming.stage", stage);
    }

    Ok(())
}

/// Stack names allow `[A-Za-z0-9-]` only.
fn warn_on_stack_characters(field: &str, value: &str) {
    if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        warn!(
            field = field,
            value = value,
            "Value contains characters CloudFormation stack names reject"
        );
    }
}
