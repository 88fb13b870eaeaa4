// CodeDeploy application and deployment group declarations

use serde_json::{json, Map, Value};

use super::iam::SERVICE_ROLE_ID;
use crate::intrinsic::{self, reference};
use crate::registry::DeploymentPreference;
use crate::template::{Fragment, Resource};

pub const CODEDEPLOY_APPLICATION: &str = "AWS::CodeDeploy::Application";
pub const CODEDEPLOY_DEPLOYMENT_GROUP: &str = "AWS::CodeDeploy::DeploymentGroup";

/// `Fn::Sub` template for the predefined Lambda deployment configurations.
pub const DEPLOYMENT_CONFIG_TEMPLATE: &str = "CodeDeployDefault.Lambda${ConfigName}";
pub const DEPLOYMENT_CONFIG_TOKEN: &str = "ConfigName";

const ROLLBACK_EVENTS: [&str; 3] = [
    "DEPLOYMENT_FAILURE",
    "DEPLOYMENT_STOP_ON_ALARM",
    "DEPLOYMENT_STOP_ON_REQUEST",
];

/// CodeDeploy application on the Lambda compute platform.
pub fn build_application(name: &str) -> Fragment {
    let mut properties = Map::new();
    properties.insert("ComputePlatform".to_string(), json!("Lambda"));
    Fragment::new(
        name,
        Resource::new(CODEDEPLOY_APPLICATION).with_properties(properties),
    )
}

pub fn deployment_group_id(function_id: &str) -> String {
    format!("{}DeploymentGroup", function_id)
}

/// Deployment group driving the traffic shift for one function.
///
/// `AlarmConfiguration` is only emitted when the preference lists alarms.
pub fn build_deployment_group(
    application_id: &str,
    function_id: &str,
    preference: &DeploymentPreference,
) -> Fragment {
    let mut config_name = Map::new();
    config_name.insert(
        DEPLOYMENT_CONFIG_TOKEN.to_string(),
        json!(preference.deployment_type()),
    );

    let mut properties = Map::new();
    properties.insert("ApplicationName".to_string(), reference(application_id));
    properties.insert(
        "AutoRollbackConfiguration".to_string(),
        json!({
            "Enabled": true,
            "Events": ROLLBACK_EVENTS,
        }),
    );
    properties.insert(
        "ServiceRoleArn".to_string(),
        intrinsic::get_att(SERVICE_ROLE_ID, "Arn"),
    );
    properties.insert(
        "DeploymentConfigName".to_string(),
        intrinsic::sub(DEPLOYMENT_CONFIG_TEMPLATE, config_name),
    );
    properties.insert(
        "DeploymentStyle".to_string(),
        json!({
            "DeploymentType": "BLUE_GREEN",
            "DeploymentOption": "WITH_TRAFFIC_CONTROL",
        }),
    );

    if !preference.alarms.is_empty() {
        let alarms: Vec<Value> = preference
            .alarms
            .iter()
            .map(|alarm| json!({ "Name": reference(alarm) }))
            .collect();
        properties.insert(
            "AlarmConfiguration".to_string(),
            json!({
                "Alarms": alarms,
                "Enabled": true,
            }),
        );
    }

    Fragment::new(
        deployment_group_id(function_id),
        Resource::new(CODEDEPLOY_DEPLOYMENT_GROUP).with_properties(properties),
    )
}
