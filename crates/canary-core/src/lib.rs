// canary-core - Canary deployment wiring for compiled CloudFormation templates
//
// This crate contains the PURE template transformation: a compiled resource
// graph plus per-function deployment preferences in, the same graph with
// CodeDeploy resources, Lambda aliases and retargeted API Gateway integrations
// out. No I/O, no file formats beyond JSON values, no process state.
//
// Host concerns (function discovery, logical id naming) come in through the
// `FunctionRegistry` and `Naming` traits.

pub mod builders;
pub mod error;
pub mod intrinsic;
pub mod naming;
pub mod orchestrator;
pub mod registry;
pub mod resolver;
pub mod splice;
pub mod template;

// Re-export commonly used types
pub use error::{CanaryError, ErrorCode, ResolutionError, Result};
pub use naming::{Naming, ServerlessNaming};
pub use orchestrator::{
    CanaryDeployments, CanaryReport, FunctionWiring, OrchestratorOptions, Stage,
};
pub use registry::{DeploymentPreference, FunctionDescriptor, FunctionRegistry, InMemoryRegistry};
pub use resolver::ResourceIndex;
pub use splice::MergeOutcome;
pub use template::{Fragment, Resource, ResourceGraph, Template};
