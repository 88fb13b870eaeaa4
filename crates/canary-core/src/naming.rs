// Logical id naming conventions
//
// Naming is owned by the packaging platform. The wiring only ever asks the
// questions below, so hosts plug in whatever convention their compiler uses.

/// Naming collaborator supplied by the host platform.
pub trait Naming {
    /// Logical id of the compiled function resource for a service function name.
    fn lambda_logical_id(&self, function_name: &str) -> String;

    /// Canonical CloudFormation stack name.
    fn stack_name(&self) -> String;

    /// Strip everything but `[A-Za-z0-9]` so the result can be embedded in a logical id.
    fn normalize_alphanumeric(&self, name: &str) -> String;

    /// Logical id of the CodeDeploy application shared by every function in the stack.
    fn deployment_application_id(&self) -> String {
        format!(
            "{}DeploymentApplication",
            self.normalize_alphanumeric(&self.stack_name())
        )
    }
}

/// The Serverless Framework's AWS naming rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerlessNaming {
    service: String,
    stage: String,
}

impl ServerlessNaming {
    pub fn new(service: impl Into<String>, stage: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            stage: stage.into(),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn stage(&self) -> &str {
        &self.stage
    }

    fn normalized_function_name(function_name: &str) -> String {
        upper_first(
            &function_name
                .replace('-', "Dash")
                .replace('_', "Underscore"),
        )
    }
}

impl Naming for ServerlessNaming {
    fn lambda_logical_id(&self, function_name: &str) -> String {
        format!(
            "{}LambdaFunction",
            Self::normalized_function_name(function_name)
        )
    }

    fn stack_name(&self) -> String {
        format!("{}-{}", self.service, self.stage)
    }

    fn normalize_alphanumeric(&self, name: &str) -> String {
        let stripped: String = name.chars().filter(char::is_ascii_alphanumeric).collect();
        upper_first(&stripped)
    }
}

fn upper_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
