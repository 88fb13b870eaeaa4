// IAM role assumed by CodeDeploy

use serde_json::{json, Map};

use crate::template::{Fragment, Resource};

pub const IAM_ROLE: &str = "AWS::IAM::Role";
pub const SERVICE_ROLE_ID: &str = "CodeDeployServiceRole";

const MANAGED_POLICIES: [&str; 2] = [
    // Shift alias traffic and read alarms
    "arn:aws:iam::aws:policy/service-role/AWSCodeDeployRoleForLambda",
    // Invoke the traffic hooks
    "arn:aws:iam::aws:policy/AWSLambdaFullAccess",
];

/// Role CodeDeploy assumes while running a Lambda deployment.
pub fn build_service_role() -> Fragment {
    let mut properties = Map::new();
    properties.insert("ManagedPolicyArns".to_string(), json!(MANAGED_POLICIES));
    properties.insert(
        "AssumeRolePolicyDocument".to_string(),
        json!({
            "Version": "2012-10-17",
            "Statement": [
                {
                    "Action": ["sts:AssumeRole"],
                    "Effect": "Allow",
                    "Principal": { "Service": ["codedeploy.amazonaws.com"] }
                }
            ]
        }),
    );
    Fragment::new(
        SERVICE_ROLE_ID,
        Resource::new(IAM_ROLE).with_properties(properties),
    )
}
