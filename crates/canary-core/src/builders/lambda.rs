// Lambda alias with the CodeDeploy update policy

use serde_json::{json, Map};

use crate::intrinsic::{self, reference};
use crate::naming::Naming;
use crate::registry::DeploymentPreference;
use crate::template::{Fragment, Resource};

pub const LAMBDA_ALIAS: &str = "AWS::Lambda::Alias";

pub fn alias_id(function_id: &str, alias: &str) -> String {
    format!("{}Alias{}", function_id, alias)
}

/// Alias whose updates are handed to CodeDeploy.
///
/// Hook function names are turned into logical ids through `naming`; hooks the
/// preference leaves out are omitted from the update policy. `version_id` must
/// be the logical id of an existing `AWS::Lambda::Version`.
pub fn build_function_alias(
    function_id: &str,
    preference: &DeploymentPreference,
    application_id: &str,
    deployment_group_id: &str,
    version_id: &str,
    naming: &dyn Naming,
) -> Fragment {
    let mut alias_update = Map::new();
    alias_update.insert("ApplicationName".to_string(), reference(application_id));
    alias_update.insert(
        "DeploymentGroupName".to_string(),
        reference(deployment_group_id),
    );
    if let Some(hook) = &preference.pre_traffic_hook {
        alias_update.insert(
            "BeforeAllowTrafficHook".to_string(),
            reference(&naming.lambda_logical_id(hook)),
        );
    }
    if let Some(hook) = &preference.post_traffic_hook {
        alias_update.insert(
            "AfterAllowTrafficHook".to_string(),
            reference(&naming.lambda_logical_id(hook)),
        );
    }

    let mut update_policy = Map::new();
    update_policy.insert(
        "CodeDeployLambdaAliasUpdate".to_string(),
        serde_json::Value::Object(alias_update),
    );

    let mut properties = Map::new();
    properties.insert("Name".to_string(), json!(preference.alias_name()));
    properties.insert("FunctionName".to_string(), reference(function_id));
    properties.insert(
        "FunctionVersion".to_string(),
        intrinsic::get_att(version_id, "Version"),
    );

    Fragment::new(
        alias_id(function_id, preference.alias_name()),
        Resource::new(LAMBDA_ALIAS)
            .with_properties(properties)
            .with_update_policy(update_policy),
    )
}
