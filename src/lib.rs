// canary-deployments - Command-line host for canary deployment wiring
//
// Reads a compiled CloudFormation template and the service descriptor, runs
// the canary-core orchestrator and renders the augmented template.
//
// Configuration precedence for naming:
// CLI flags > CANARY_* env > config file > service descriptor > "dev"

use anyhow::{Context, Result};
use canary_config::RuntimeConfig;
use canary_core::{
    CanaryDeployments, CanaryReport, OrchestratorOptions, ServerlessNaming, Template,
};
use std::io::Write;
use std::path::Path;
use tracing::info;

mod init;
pub mod service;

pub use init::init_tracing;
pub use service::ServiceDefinition;

/// Read a compiled template (JSON).
pub fn load_template(path: impl AsRef<Path>) -> Result<Template> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read template: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse template: {}", path.display()))
}

/// Naming convention for this run, resolved from config and descriptor.
pub fn resolve_naming(config: &RuntimeConfig, service: &ServiceDefinition) -> Result<ServerlessNaming> {
    let service_name = config
        .naming
        .resolve_service(service.service_name())
        .context("Service name is not set; add `service:` to the descriptor or pass --service-name")?;
    let stage = config.naming.resolve_stage(service.stage());
    Ok(ServerlessNaming::new(service_name, stage))
}

/// Wire canary deployments into `template`.
///
/// On error the template is left as it was loaded.
pub fn augment(
    template: &mut Template,
    service: &ServiceDefinition,
    config: &RuntimeConfig,
) -> Result<CanaryReport> {
    let naming = resolve_naming(config, service)?;
    let options = OrchestratorOptions {
        require_integration: config.orchestration.require_integration,
    };

    info!(
        service = naming.service(),
        stage = naming.stage(),
        functions = service.canary_function_count(),
        "Wiring canary deployments"
    );

    let report = CanaryDeployments::new(service, &naming)
        .with_options(options)
        .apply(&mut template.resources)
        .context("Failed to wire canary deployments")?;
    Ok(report)
}

/// Pretty JSON rendering of the template.
pub fn render_template(template: &Template) -> Result<String> {
    let mut rendered =
        serde_json::to_string_pretty(template).context("Failed to serialize template")?;
    rendered.push('\n');
    Ok(rendered)
}

/// Write the template to `output`, or stdout when no path is given.
pub fn write_template(template: &Template, output: Option<&Path>) -> Result<()> {
    let rendered = render_template(template)?;
    match output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write template: {}", path.display()))?;
            info!(path = %path.display(), "Template written");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(rendered.as_bytes())
                .context("Failed to write template to stdout")?;
        }
    }
    Ok(())
}

/// Human-readable summary of a run, one line per change.
pub fn summarize(report: &CanaryReport) -> String {
    if report.is_noop() {
        return "No functions declare a deploymentPreference; template unchanged\n".to_string();
    }

    let mut out = String::new();
    for id in &report.shared_resources {
        out.push_str(&format!("+ {}\n", id));
    }
    for wiring in &report.functions {
        out.push_str(&format!(
            "{} ({})\n  version: {}\n  + {}\n  + {}\n",
            wiring.function,
            wiring.function_id,
            wiring.version_id,
            wiring.deployment_group_id,
            wiring.alias_id
        ));
        if wiring.redirected_integrations.is_empty() {
            out.push_str("  ~ no API Gateway integration\n");
        }
        for integration in &wiring.redirected_integrations {
            out.push_str(&format!("  ~ {} -> {}\n", integration, wiring.alias_id));
        }
    }
    out
}
