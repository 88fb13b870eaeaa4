// Resource template builders
//
// Every builder is pure: identifiers and a preference in, one fragment out.
// None of them read or write the resource graph.

mod codedeploy;
mod iam;
mod lambda;

pub use codedeploy::{
    build_application, build_deployment_group, deployment_group_id, CODEDEPLOY_APPLICATION,
    CODEDEPLOY_DEPLOYMENT_GROUP, DEPLOYMENT_CONFIG_TEMPLATE, DEPLOYMENT_CONFIG_TOKEN,
};
pub use iam::{build_service_role, IAM_ROLE, SERVICE_ROLE_ID};
pub use lambda::{alias_id, build_function_alias, LAMBDA_ALIAS};
