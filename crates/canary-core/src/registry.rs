// Function registry and deployment preferences
//
// Function discovery belongs to the host. The registry trait is the only way
// the orchestrator learns which functions exist and which opt into canary
// releases.

use serde::{Deserialize, Serialize};

use crate::error::{CanaryError, Result};

/// Per-function `deploymentPreference` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentPreference {
    /// Traffic-shifting strategy, e.g. `Canary10Percent5Minutes`
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub deployment_type: Option<String>,

    /// CloudWatch alarm logical ids that stop the rollout
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alarms: Vec<String>,

    /// Name of the live alias
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_traffic_hook: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_traffic_hook: Option<String>,
}

impl DeploymentPreference {
    pub fn new(deployment_type: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            deployment_type: Some(deployment_type.into()),
            alias: Some(alias.into()),
            ..Default::default()
        }
    }

    pub fn with_alarms<I, S>(mut self, alarms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alarms = alarms.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_hooks(mut self, pre: Option<&str>, post: Option<&str>) -> Self {
        self.pre_traffic_hook = pre.map(str::to_string);
        self.post_traffic_hook = post.map(str::to_string);
        self
    }

    /// Strategy name, empty when absent. Callers validate first.
    pub fn deployment_type(&self) -> &str {
        self.deployment_type.as_deref().unwrap_or_default()
    }

    /// Alias name, empty when absent. Callers validate first.
    pub fn alias_name(&self) -> &str {
        self.alias.as_deref().unwrap_or_default()
    }

    /// Check the fields the generated declarations depend on.
    pub fn validate(&self, function: &str) -> Result<()> {
        require(function, "type", self.deployment_type.as_deref())?;
        require(function, "alias", self.alias.as_deref())?;

        if self.alarms.iter().any(|alarm| alarm.trim().is_empty()) {
            return Err(CanaryError::configuration(
                function,
                "alarms",
                "must not contain empty entries",
            ));
        }
        for (field, hook) in [
            ("preTrafficHook", &self.pre_traffic_hook),
            ("postTrafficHook", &self.post_traffic_hook),
        ] {
            if hook.as_deref().is_some_and(|h| h.trim().is_empty()) {
                return Err(CanaryError::configuration(
                    function,
                    field,
                    "must name a function",
                ));
            }
        }
        Ok(())
    }
}

fn require(function: &str, field: &'static str, value: Option<&str>) -> Result<()> {
    match value {
        None => Err(CanaryError::configuration(function, field, "is required")),
        Some(v) if v.trim().is_empty() => Err(CanaryError::configuration(
            function,
            field,
            "must not be empty",
        )),
        Some(_) => Ok(()),
    }
}

/// A function as declared in the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDescriptor {
    pub name: String,
    pub preference: Option<DeploymentPreference>,
}

impl FunctionDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            preference: None,
        }
    }

    pub fn with_preference(mut self, preference: DeploymentPreference) -> Self {
        self.preference = Some(preference);
        self
    }
}

/// Function discovery supplied by the host platform.
pub trait FunctionRegistry {
    /// All function names, in discovery order.
    fn function_names(&self) -> Vec<String>;

    /// Descriptor for one function.
    fn function(&self, name: &str) -> Option<FunctionDescriptor>;
}

/// Registry over an explicit list of descriptors.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistry {
    functions: Vec<FunctionDescriptor>,
}

impl InMemoryRegistry {
    pub fn new(functions: Vec<FunctionDescriptor>) -> Self {
        Self { functions }
    }
}

impl FunctionRegistry for InMemoryRegistry {
    fn function_names(&self) -> Vec<String> {
        self.functions.iter().map(|f| f.name.clone()).collect()
    }

    fn function(&self, name: &str) -> Option<FunctionDescriptor> {
        self.functions.iter().find(|f| f.name == name).cloned()
    }
}
