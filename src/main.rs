use anyhow::{Context, Result};
use canary_config::RuntimeConfig;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

/// Wire CodeDeploy canary releases into compiled CloudFormation templates
#[derive(Parser)]
#[command(name = "canary-deployments")]
#[command(version)]
#[command(about = "Wire CodeDeploy canary releases into compiled CloudFormation templates", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short = 'v', long, value_name = "LEVEL", global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Augment the template and write it out
    Apply {
        #[command(flatten)]
        input: InputArgs,

        /// Output file for the augmented template (stdout if omitted)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Show what would be added without writing the template
    Plan {
        #[command(flatten)]
        input: InputArgs,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Compiled CloudFormation template (JSON)
    #[arg(short, long, value_name = "FILE")]
    template: PathBuf,

    /// Service descriptor (serverless.yml)
    #[arg(short, long, value_name = "FILE")]
    service: PathBuf,

    /// Service name (overrides descriptor and config)
    #[arg(long, value_name = "NAME")]
    service_name: Option<String>,

    /// Deployment stage (overrides descriptor and config)
    #[arg(long, value_name = "STAGE")]
    stage: Option<String>,

    /// Create aliases for functions without an API Gateway integration
    #[arg(long)]
    allow_missing_integration: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Step 1: Load base configuration
    let mut config = if let Some(config_path) = &cli.config {
        canary_config::load_from_file_path(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else {
        canary_config::load_or_default().context("Failed to load configuration")?
    };

    // Step 2: Apply CLI overrides (highest priority)
    let input = match &cli.command {
        Commands::Apply { input, .. } | Commands::Plan { input } => input,
    };
    apply_cli_overrides(&mut config, &cli, input)?;

    // Step 3: Initialize tracing
    canary_deployments::init_tracing(&config);

    // Step 4: Load inputs
    let mut template = canary_deployments::load_template(&input.template)?;
    let service = canary_deployments::ServiceDefinition::load(&input.service)?;

    // Step 5: Wire and emit
    let report = canary_deployments::augment(&mut template, &service, &config)?;
    info!(
        functions = report.functions.len(),
        shared_resources = report.shared_resources.len(),
        "Run complete"
    );

    match &cli.command {
        Commands::Apply { output, .. } => {
            canary_deployments::write_template(&template, output.as_deref())
        }
        Commands::Plan { .. } => {
            print!("{}", canary_deployments::summarize(&report));
            Ok(())
        }
    }
}

fn apply_cli_overrides(config: &mut RuntimeConfig, cli: &Cli, input: &InputArgs) -> Result<()> {
    if let Some(level) = &cli.log_level {
        config.log.level = level.clone();
    }
    if let Some(service) = &input.service_name {
        config.naming.service = Some(service.clone());
    }
    if let Some(stage) = &input.stage {
        config.naming.stage = Some(stage.clone());
    }
    if input.allow_missing_integration {
        config.orchestration.require_integration = false;
    }

    // Re-validate after overrides
    config.validate().context("Invalid command-line options")
}
