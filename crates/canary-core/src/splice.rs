// Graph splicing: merging generated fragments and retargeting integrations

use serde_json::Value;
use tracing::debug;

use crate::error::{CanaryError, ResolutionError, Result};
use crate::intrinsic::{self, Intrinsic};
use crate::template::{Fragment, ResourceGraph};

pub const API_GATEWAY_METHOD: &str = "AWS::ApiGateway::Method";

/// Outcome of merging a fragment into the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The declaration was added under a new logical id
    Inserted,
    /// An identical declaration already existed; nothing changed
    Unchanged,
}

impl ResourceGraph {
    /// Insert a generated fragment.
    ///
    /// Re-merging an identical declaration is a no-op. A different declaration
    /// under the same logical id is a [`CanaryError::NameCollision`] and leaves the
    /// graph untouched.
    pub fn merge(&mut self, fragment: Fragment) -> Result<MergeOutcome> {
        if let Some(existing) = self.resources.get(fragment.logical_id()) {
            if existing == fragment.resource() {
                debug!(logical_id = fragment.logical_id(), "Resource already present");
                return Ok(MergeOutcome::Unchanged);
            }
            return Err(CanaryError::name_collision(fragment.logical_id()));
        }

        let (logical_id, resource) = fragment.into_parts();
        debug!(logical_id = %logical_id, kind = %resource.kind, "Merged resource");
        self.resources.insert(logical_id, resource);
        Ok(MergeOutcome::Inserted)
    }

    /// Point an API Gateway method integration at `alias_id` instead of the
    /// bare function.
    ///
    /// Only `Properties.Integration.Uri` is rewritten; the rest of the method is
    /// left as it was. The alias must already be part of the graph.
    pub fn redirect_integration(
        &mut self,
        integration_id: &str,
        function_id: &str,
        alias_id: &str,
    ) -> Result<()> {
        if !self.resources.contains_key(alias_id) {
            return Err(CanaryError::resolution(
                function_id,
                ResolutionError::AliasMissing {
                    alias_id: alias_id.to_string(),
                },
            ));
        }

        let resource = self.resources.get_mut(integration_id).ok_or_else(|| {
            CanaryError::resolution(
                function_id,
                ResolutionError::ResourceMissing {
                    logical_id: integration_id.to_string(),
                },
            )
        })?;

        if !resource.is_kind(API_GATEWAY_METHOD) {
            return Err(CanaryError::malformed(
                integration_id,
                format!("expected {}, found {}", API_GATEWAY_METHOD, resource.kind),
            ));
        }

        let uri = resource
            .properties
            .as_mut()
            .and_then(|props| props.get_mut("Integration"))
            .and_then(|integration| integration.get_mut("Uri"))
            .ok_or_else(|| CanaryError::malformed(integration_id, "missing Integration.Uri"))?;

        let rewritten = retarget_uri(uri, function_id, alias_id).ok_or_else(|| {
            CanaryError::malformed(
                integration_id,
                format!("Integration.Uri does not reference '{}'", function_id),
            )
        })?;
        *uri = rewritten;

        debug!(
            integration = integration_id,
            function = function_id,
            alias = alias_id,
            "Redirected integration to alias"
        );
        Ok(())
    }
}

/// Whether `value` is `Ref function_id` or `Fn::GetAtt [function_id, Arn]`.
pub(crate) fn targets_function(value: &Value, function_id: &str) -> bool {
    match Intrinsic::parse(value) {
        Some(Intrinsic::Ref(id)) => id == function_id,
        Some(Intrinsic::GetAtt {
            logical_id,
            attribute,
        }) => logical_id == function_id && attribute == "Arn",
        _ => false,
    }
}

/// Build the replacement URI, or `None` if nothing in it points at the function.
fn retarget_uri(uri: &Value, function_id: &str, alias_id: &str) -> Option<Value> {
    let alias_ref = intrinsic::reference(alias_id);
    let arn_placeholder = format!("{}.Arn", function_id);

    let rewritten = match Intrinsic::parse(uri)? {
        Intrinsic::Join { delimiter, parts } => {
            let mut changed = false;
            let parts = parts
                .into_iter()
                .map(|part| {
                    if targets_function(&part, function_id) {
                        changed = true;
                        alias_ref.clone()
                    } else {
                        part
                    }
                })
                .collect();
            changed.then_some(Intrinsic::Join { delimiter, parts })
        }
        Intrinsic::Sub {
            template,
            variables,
        } => {
            let mut changed = false;
            let mut template_out = template.clone();
            let bound = |name: &str| variables.as_ref().is_some_and(|v| v.contains_key(name));
            for placeholder in [arn_placeholder.as_str(), function_id] {
                if !bound(placeholder)
                    && intrinsic::sub_placeholders(&template).contains(&placeholder)
                {
                    changed = true;
                    template_out =
                        intrinsic::replace_placeholder(&template_out, placeholder, alias_id);
                }
            }
            let variables = variables.map(|vars| {
                vars.into_iter()
                    .map(|(name, value)| {
                        if targets_function(&value, function_id) {
                            changed = true;
                            (name, alias_ref.clone())
                        } else {
                            (name, value)
                        }
                    })
                    .collect()
            });
            changed.then_some(Intrinsic::Sub {
                template: template_out,
                variables,
            })
        }
        _ => None,
    }?;

    Some(rewritten.into())
}
