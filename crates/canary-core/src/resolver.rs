// Reference resolution: locating existing resources that belong to a function
//
// The index is built from the compiled template before any mutation happens.
// Function ids are collected first so bare references can be told apart from
// references to other resources. Lookups match on resource kind and on what the resource
// actually references, never on "first entry wins".

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::error::ResolutionError;
use crate::intrinsic::{self, Intrinsic};
use crate::splice::API_GATEWAY_METHOD;
use crate::template::{Resource, ResourceGraph};

pub const LAMBDA_FUNCTION: &str = "AWS::Lambda::Function";
pub const LAMBDA_VERSION: &str = "AWS::Lambda::Version";

/// Naming convention for version resources that do not declare `FunctionName`
/// in a readable form: `<FunctionLogicalId>Version<suffix>`.
pub const VERSION_SUFFIX: &str = "Version";

/// Function logical id -> related resources, built once per run.
#[derive(Debug, Clone, Default)]
pub struct ResourceIndex {
    versions: HashMap<String, Vec<String>>,
    unattributed_versions: Vec<String>,
    integrations: HashMap<String, Vec<String>>,
}

impl ResourceIndex {
    pub fn build(graph: &ResourceGraph) -> Self {
        let mut index = ResourceIndex::default();
        let functions: HashSet<&str> = graph
            .iter()
            .filter(|(_, resource)| resource.is_kind(LAMBDA_FUNCTION))
            .map(|(logical_id, _)| logical_id)
            .collect();

        for (logical_id, resource) in graph.iter() {
            if resource.is_kind(LAMBDA_VERSION) {
                match version_target(resource) {
                    Some(function_id) => index
                        .versions
                        .entry(function_id)
                        .or_default()
                        .push(logical_id.to_string()),
                    None => index.unattributed_versions.push(logical_id.to_string()),
                }
            } else if resource.is_kind(API_GATEWAY_METHOD) {
                for function_id in integration_targets(resource, &functions) {
                    let entries = index.integrations.entry(function_id).or_default();
                    if !entries.iter().any(|id| id == logical_id) {
                        entries.push(logical_id.to_string());
                    }
                }
            }
        }

        index
    }

    /// The single version resource published for `function_id`.
    pub fn find_version_resource(&self, function_id: &str) -> Result<&str, ResolutionError> {
        let prefix = format!("{}{}", function_id, VERSION_SUFFIX);
        let candidates: Vec<&String> = self
            .versions
            .get(function_id)
            .into_iter()
            .flatten()
            .chain(
                self.unattributed_versions
                    .iter()
                    .filter(|id| id.starts_with(&prefix)),
            )
            .collect();

        match candidates.as_slice() {
            [] => Err(ResolutionError::VersionNotFound {
                function_id: function_id.to_string(),
            }),
            [only] => Ok(only.as_str()),
            many => Err(ResolutionError::AmbiguousVersion {
                function_id: function_id.to_string(),
                candidates: many.iter().map(|id| id.to_string()).collect(),
            }),
        }
    }

    /// Every API Gateway method whose integration invokes `function_id`.
    pub fn find_integration_resources(&self, function_id: &str) -> &[String] {
        self.integrations
            .get(function_id)
            .map(|ids| ids.as_slice())
            .unwrap_or(&[])
    }

    /// The single API Gateway method whose integration invokes `function_id`.
    pub fn find_integration_resource(&self, function_id: &str) -> Result<&str, ResolutionError> {
        match self.find_integration_resources(function_id) {
            [] => Err(ResolutionError::IntegrationNotFound {
                function_id: function_id.to_string(),
            }),
            [only] => Ok(only.as_str()),
            many => Err(ResolutionError::AmbiguousIntegration {
                function_id: function_id.to_string(),
                candidates: many.to_vec(),
            }),
        }
    }
}

/// `Properties.FunctionName` of a version: `Ref Fn` or `Fn::GetAtt [Fn, Arn]`.
fn version_target(resource: &Resource) -> Option<String> {
    let function_name = resource.property("FunctionName")?;
    Intrinsic::parse(function_name)?
        .target()
        .map(str::to_string)
}

/// Resources referenced by a method's `Integration.Uri`.
///
/// Handles a `Fn::Join` whose parts carry `Fn::GetAtt [Fn, Arn]` (or `Ref`), a
/// `Fn::Sub` string with `${Fn.Arn}`, and a `Fn::Sub` whose variables bind to a
/// function reference. Bare `Ref Fn` and `${Fn}` only count when `Fn` is a
/// declared `AWS::Lambda::Function`.
fn integration_targets(resource: &Resource, functions: &HashSet<&str>) -> Vec<String> {
    let Some(uri) = resource
        .property("Integration")
        .and_then(|integration| integration.get("Uri"))
    else {
        return Vec::new();
    };

    let mut targets = Vec::new();
    match Intrinsic::parse(uri) {
        Some(Intrinsic::Join { parts, .. }) => {
            targets.extend(parts.iter().filter_map(|part| function_reference(part, functions)));
        }
        Some(Intrinsic::Sub {
            template,
            variables,
        }) => {
            let variables = variables.unwrap_or_default();
            for placeholder in intrinsic::sub_placeholders(&template) {
                if let Some(bound) = variables.get(placeholder) {
                    targets.extend(function_reference(bound, functions));
                } else if let Some(function_id) = placeholder.strip_suffix(".Arn") {
                    targets.push(function_id.to_string());
                } else if functions.contains(placeholder) {
                    targets.push(placeholder.to_string());
                }
            }
        }
        _ => {}
    }
    targets.dedup();
    targets
}

/// Function targeted by a part. `Ref` must name a declared function, which
/// also rules out pseudo parameters such as `AWS::Region`.
fn function_reference(value: &Value, functions: &HashSet<&str>) -> Option<String> {
    match Intrinsic::parse(value)? {
        Intrinsic::Ref(id) if functions.contains(id.as_str()) => Some(id),
        Intrinsic::GetAtt {
            logical_id,
            attribute,
        } if attribute == "Arn" => Some(logical_id),
        _ => None,
    }
}
