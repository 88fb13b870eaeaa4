// Service descriptor: the function registry read from serverless.yml
//
// Only the keys the wiring needs are modelled (`service`, `provider.stage`,
// `functions.<name>.deploymentPreference`); everything else is ignored.

use anyhow::{Context, Result};
use canary_core::{DeploymentPreference, FunctionDescriptor, FunctionRegistry};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceDefinition {
    #[serde(default)]
    service: Option<ServiceName>,

    #[serde(default)]
    provider: Option<ProviderSection>,

    /// Declaration order is discovery order
    #[serde(default)]
    functions: IndexMap<String, Option<FunctionSection>>,
}

/// `service: name` or `service: { name: ... }`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ServiceName {
    Plain(String),
    Detailed { name: String },
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ProviderSection {
    #[serde(default)]
    stage: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FunctionSection {
    #[serde(default)]
    deployment_preference: Option<DeploymentPreference>,
}

impl ServiceDefinition {
    /// Parse a YAML (or JSON) descriptor.
    pub fn parse(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse service descriptor")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read service descriptor: {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse service descriptor: {}", path.display()))
    }

    pub fn service_name(&self) -> Option<&str> {
        match self.service.as_ref()? {
            ServiceName::Plain(name) => Some(name),
            ServiceName::Detailed { name } => Some(name),
        }
    }

    pub fn stage(&self) -> Option<&str> {
        self.provider.as_ref()?.stage.as_deref()
    }

    /// Number of functions declaring a deployment preference
    pub fn canary_function_count(&self) -> usize {
        self.functions
            .values()
            .flatten()
            .filter(|f| f.deployment_preference.is_some())
            .count()
    }
}

impl FunctionRegistry for ServiceDefinition {
    fn function_names(&self) -> Vec<String> {
        self.functions.keys().cloned().collect()
    }

    fn function(&self, name: &str) -> Option<FunctionDescriptor> {
        let section = self.functions.get(name)?;
        let descriptor = FunctionDescriptor::new(name);
        Some(
            match section
                .as_ref()
                .and_then(|s| s.deployment_preference.clone())
            {
                Some(preference) => descriptor.with_preference(preference),
                None => descriptor,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESCRIPTOR: &str = r#"
service: my-service
provider:
  name: aws
  stage: qa
functions:
  hello:
    handler: handler.hello
    deploymentPreference:
      type: Linear10PercentEvery1Minute
      alias: live
      alarms: [HelloErrorsAlarm]
      preTrafficHook: preHook
  preHook:
    handler: hooks.pre
  bare:
"#;

    #[test]
    fn reads_functions_in_declaration_order() {
        let service = ServiceDefinition::parse(DESCRIPTOR).unwrap();
        assert_eq!(service.service_name(), Some("my-service"));
        assert_eq!(service.stage(), Some("qa"));
        assert_eq!(service.function_names(), vec!["hello", "preHook", "bare"]);
        assert_eq!(service.canary_function_count(), 1);

        let hello = service.function("hello").unwrap();
        let preference = hello.preference.unwrap();
        assert_eq!(preference.deployment_type(), "Linear10PercentEvery1Minute");
        assert_eq!(preference.alarms, vec!["HelloErrorsAlarm"]);
        assert_eq!(preference.pre_traffic_hook.as_deref(), Some("preHook"));

        assert!(service.function("bare").unwrap().preference.is_none());
        assert!(service.function("missing").is_none());
    }

    #[test]
    fn accepts_detailed_service_name_and_json() {
        let service = ServiceDefinition::parse(
            r#"{"service": {"name": "orders"}, "functions": {"a": {}}}"#,
        )
        .unwrap();
        assert_eq!(service.service_name(), Some("orders"));
        assert_eq!(service.stage(), None);
        assert_eq!(service.canary_function_count(), 0);
    }
}
