//! Error types for canary wiring

use thiserror::Error;

/// Error codes for programmatic handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// E001: Deployment preference is missing a required field
    E001InvalidPreference,
    /// E002: Existing resource could not be located or is ambiguous
    E002UnresolvedResource,
    /// E003: Merge would overwrite an unrelated resource
    E003NameCollision,
    /// E004: Existing resource does not have the expected shape
    E004MalformedResource,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::E001InvalidPreference => "E001",
            Self::E002UnresolvedResource => "E002",
            Self::E003NameCollision => "E003",
            Self::E004MalformedResource => "E004",
        }
    }
}

/// Failure to locate a resource the wiring depends on
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("no AWS::Lambda::Version resource found for '{function_id}'")]
    VersionNotFound { function_id: String },

    #[error(
        "multiple AWS::Lambda::Version resources found for '{function_id}': {}",
        .candidates.join(", ")
    )]
    AmbiguousVersion {
        function_id: String,
        candidates: Vec<String>,
    },

    #[error("no AWS::ApiGateway::Method integration targets '{function_id}'")]
    IntegrationNotFound { function_id: String },

    #[error(
        "multiple AWS::ApiGateway::Method integrations target '{function_id}': {}",
        .candidates.join(", ")
    )]
    AmbiguousIntegration {
        function_id: String,
        candidates: Vec<String>,
    },

    #[error("alias '{alias_id}' must be in the template before integrations can target it")]
    AliasMissing { alias_id: String },

    #[error("resource '{logical_id}' does not exist in the template")]
    ResourceMissing { logical_id: String },
}

/// Errors raised while wiring canary deployments into a template
#[derive(Debug, Error)]
pub enum CanaryError {
    /// A deployment preference cannot produce a valid declaration
    #[error("[{code}] Invalid deploymentPreference for function '{function}': {field} {reason}")]
    Configuration {
        code: &'static str,
        function: String,
        field: &'static str,
        reason: String,
    },

    /// A resource the function's wiring depends on was not found, or more than one matched
    #[error("[{code}] Cannot wire canary deployment for function '{function}': {source}")]
    Resolution {
        code: &'static str,
        function: String,
        #[source]
        source: ResolutionError,
    },

    /// A generated resource would replace a different existing declaration
    #[error("[{code}] Resource '{logical_id}' already exists in the template with a different declaration")]
    NameCollision {
        code: &'static str,
        logical_id: String,
    },

    /// An existing resource could not be read or rewritten
    #[error("[{code}] Resource '{logical_id}' is malformed: {reason}")]
    MalformedResource {
        code: &'static str,
        logical_id: String,
        reason: String,
    },
}

impl CanaryError {
    /// Create a configuration error with error code
    pub fn configuration(
        function: impl Into<String>,
        field: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        Self::Configuration {
            code: ErrorCode::E001InvalidPreference.as_str(),
            function: function.into(),
            field,
            reason: reason.into(),
        }
    }

    /// Create a resolution error with error code
    pub fn resolution(function: impl Into<String>, source: ResolutionError) -> Self {
        Self::Resolution {
            code: ErrorCode::E002UnresolvedResource.as_str(),
            function: function.into(),
            source,
        }
    }

    /// Create a name collision error with error code
    pub fn name_collision(logical_id: impl Into<String>) -> Self {
        Self::NameCollision {
            code: ErrorCode::E003NameCollision.as_str(),
            logical_id: logical_id.into(),
        }
    }

    /// Create a malformed resource error with error code
    pub fn malformed(logical_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedResource {
            code: ErrorCode::E004MalformedResource.as_str(),
            logical_id: logical_id.into(),
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration { code, .. }
            | Self::Resolution { code, .. }
            | Self::NameCollision { code, .. }
            | Self::MalformedResource { code, .. } => *code,
        }
    }

    /// Attribute function-scoped errors to the function's service name.
    ///
    /// Graph operations only know logical ids; the orchestrator re-labels their
    /// errors so the message names the function the user declared.
    pub fn in_function(self, function: &str) -> Self {
        match self {
            Self::Resolution { code, source, .. } => Self::Resolution {
                code,
                function: function.to_string(),
                source,
            },
            Self::Configuration {
                code, field, reason, ..
            } => Self::Configuration {
                code,
                function: function.to_string(),
                field,
                reason,
            },
            other => other,
        }
    }
}

/// Result type alias for CanaryError
pub type Result<T> = std::result::Result<T, CanaryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_error_names_function_and_cause() {
        let err = CanaryError::resolution(
            "hello",
            ResolutionError::VersionNotFound {
                function_id: "HelloLambdaFunction".to_string(),
            },
        );
        let message = err.to_string();
        assert!(message.starts_with("[E002]"));
        assert!(message.contains("'hello'"));
        assert!(message.contains("HelloLambdaFunction"));
    }

    #[test]
    fn in_function_relabels_function_scoped_errors() {
        let err = CanaryError::resolution(
            "HelloLambdaFunction",
            ResolutionError::AliasMissing {
                alias_id: "HelloLambdaFunctionAliaslive".to_string(),
            },
        )
        .in_function("hello");
        assert!(matches!(err, CanaryError::Resolution { ref function, .. } if function == "hello"));

        let collision = CanaryError::name_collision("CodeDeployServiceRole").in_function("hello");
        assert!(matches!(collision, CanaryError::NameCollision { ref logical_id, .. } if logical_id == "CodeDeployServiceRole"));
        assert_eq!(collision.code(), "E003");
    }

    #[test]
    fn ambiguity_lists_candidates() {
        let err = ResolutionError::AmbiguousIntegration {
            function_id: "Fn1".to_string(),
            candidates: vec!["GetMethod".to_string(), "PostMethod".to_string()],
        };
        assert!(err.to_string().ends_with("GetMethod, PostMethod"));
    }
}
