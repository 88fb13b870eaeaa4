// Orchestration: wiring every opted-in function into the resource graph
//
// States: Idle -> Preparing -> PerFunction(1..=N) -> Done
//
// All work happens on a staged copy of the graph. The caller's graph is only
// replaced once every function has been wired, so a failure on function k leaves
// the template exactly as it was handed in.

use std::fmt;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::builders::{
    build_application, build_deployment_group, build_function_alias, build_service_role,
};
use crate::error::{CanaryError, ResolutionError, Result};
use crate::naming::Naming;
use crate::registry::{DeploymentPreference, FunctionDescriptor, FunctionRegistry};
use crate::resolver::ResourceIndex;
use crate::splice::MergeOutcome;
use crate::template::ResourceGraph;

/// Orchestration progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    Idle,
    Preparing,
    PerFunction(usize),
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Idle => write!(f, "idle"),
            Stage::Preparing => write!(f, "preparing"),
            Stage::PerFunction(i) => write!(f, "function {}", i),
            Stage::Done => write!(f, "done"),
        }
    }
}

/// Orchestration policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorOptions {
    /// Fail when an opted-in function has no API Gateway integration. When
    /// false the redirect step is skipped for such functions.
    pub require_integration: bool,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            require_integration: true,
        }
    }
}

/// What one function was wired to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionWiring {
    pub function: String,
    pub function_id: String,
    pub version_id: String,
    pub deployment_group_id: String,
    pub alias_id: String,
    pub redirected_integrations: Vec<String>,
}

/// Summary of an orchestration run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CanaryReport {
    /// Shared resources newly added (application, service role)
    pub shared_resources: Vec<String>,
    pub functions: Vec<FunctionWiring>,
}

impl CanaryReport {
    /// True when no function opted in and the graph was not touched.
    pub fn is_noop(&self) -> bool {
        self.shared_resources.is_empty() && self.functions.is_empty()
    }
}

/// Entry point invoked once per packaging run.
pub struct CanaryDeployments<'a> {
    registry: &'a dyn FunctionRegistry,
    naming: &'a dyn Naming,
    options: OrchestratorOptions,
}

impl<'a> CanaryDeployments<'a> {
    pub fn new(registry: &'a dyn FunctionRegistry, naming: &'a dyn Naming) -> Self {
        Self {
            registry,
            naming,
            options: OrchestratorOptions::default(),
        }
    }

    pub fn with_options(mut self, options: OrchestratorOptions) -> Self {
        self.options = options;
        self
    }

    /// Functions that declare a preference, in discovery order, validated.
    pub fn eligible_functions(&self) -> Result<Vec<(FunctionDescriptor, DeploymentPreference)>> {
        let mut eligible = Vec::new();
        for name in self.registry.function_names() {
            let Some(descriptor) = self.registry.function(&name) else {
                warn!(function = %name, "Function listed by registry has no descriptor; skipping");
                continue;
            };
            if let Some(preference) = descriptor.preference.clone() {
                preference.validate(&descriptor.name)?;
                eligible.push((descriptor, preference));
            }
        }
        Ok(eligible)
    }

    /// Wire canary deployments for every opted-in function into `graph`.
    ///
    /// On error `graph` is left unchanged.
    pub fn apply(&self, graph: &mut ResourceGraph) -> Result<CanaryReport> {
        let mut stage = Stage::Idle;
        let functions = self.eligible_functions()?;

        if functions.is_empty() {
            advance(&mut stage, Stage::Done);
            info!("No functions declare a deploymentPreference; template unchanged");
            return Ok(CanaryReport::default());
        }

        advance(&mut stage, Stage::Preparing);
        let index = ResourceIndex::build(graph);
        let mut staged = graph.clone();
        let mut report = CanaryReport::default();

        let application_id = self.naming.deployment_application_id();
        for fragment in [build_application(&application_id), build_service_role()] {
            let logical_id = fragment.logical_id().to_string();
            if staged.merge(fragment)? == MergeOutcome::Inserted {
                report.shared_resources.push(logical_id);
            }
        }

        for (position, (descriptor, preference)) in functions.iter().enumerate() {
            advance(&mut stage, Stage::PerFunction(position + 1));
            let wiring = self
                .wire_function(&mut staged, &index, &application_id, descriptor, preference)
                .map_err(|e| e.in_function(&descriptor.name))?;
            report.functions.push(wiring);
        }

        advance(&mut stage, Stage::Done);
        *graph = staged;

        info!(
            functions = report.functions.len(),
            shared_resources = report.shared_resources.len(),
            "Canary deployments wired"
        );
        Ok(report)
    }

    fn wire_function(
        &self,
        graph: &mut ResourceGraph,
        index: &ResourceIndex,
        application_id: &str,
        descriptor: &FunctionDescriptor,
        preference: &DeploymentPreference,
    ) -> Result<FunctionWiring> {
        let function_id = self.naming.lambda_logical_id(&descriptor.name);

        let version_id = index
            .find_version_resource(&function_id)
            .map_err(|e| CanaryError::resolution(&descriptor.name, e))?
            .to_string();

        let group = build_deployment_group(application_id, &function_id, preference);
        let deployment_group_id = group.logical_id().to_string();
        graph.merge(group)?;

        let alias = build_function_alias(
            &function_id,
            preference,
            application_id,
            &deployment_group_id,
            &version_id,
            self.naming,
        );
        let alias_id = alias.logical_id().to_string();
        if !alias_id.chars().all(|c| c.is_ascii_alphanumeric()) {
            warn!(
                function = %descriptor.name,
                alias_id = %alias_id,
                "Alias logical id contains characters CloudFormation rejects"
            );
        }
        graph.merge(alias)?;

        let integrations: Vec<String> = match index.find_integration_resource(&function_id) {
            Ok(id) => vec![id.to_string()],
            Err(ResolutionError::IntegrationNotFound { .. })
                if !self.options.require_integration =>
            {
                debug!(
                    function = %descriptor.name,
                    "No API Gateway integration; alias created without redirect"
                );
                Vec::new()
            }
            Err(e) => return Err(CanaryError::resolution(&descriptor.name, e)),
        };

        for integration_id in &integrations {
            graph.redirect_integration(integration_id, &function_id, &alias_id)?;
        }

        debug!(
            function = %descriptor.name,
            version = %version_id,
            deployment_group = %deployment_group_id,
            alias = %alias_id,
            "Function wired"
        );

        Ok(FunctionWiring {
            function: descriptor.name.clone(),
            function_id,
            version_id,
            deployment_group_id,
            alias_id,
            redirected_integrations: integrations,
        })
    }
}

fn advance(stage: &mut Stage, next: Stage) {
    debug!(from = %stage, to = %next, "Orchestrator transition");
    *stage = next;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::ServerlessNaming;
    use crate::registry::InMemoryRegistry;

    #[test]
    fn invalid_preference_fails_before_touching_graph() {
        let registry = InMemoryRegistry::new(vec![FunctionDescriptor::new("hello")
            .with_preference(DeploymentPreference {
                alias: Some("live".to_string()),
                ..Default::default()
            })]);
        let naming = ServerlessNaming::new("svc", "dev");
        let mut graph = ResourceGraph::new();

        let err = CanaryDeployments::new(&registry, &naming)
            .apply(&mut graph)
            .unwrap_err();
        assert!(matches!(err, CanaryError::Configuration { field: "type", .. }));
        assert!(graph.is_empty());
    }

    #[test]
    fn stage_display() {
        assert_eq!(Stage::PerFunction(2).to_string(), "function 2");
        assert_eq!(Stage::Done.to_string(), "done");
    }
}
