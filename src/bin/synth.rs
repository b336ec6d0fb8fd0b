use anyhow::Context;
use clap::Parser;
use pipeline_forge::{app, forge::config, forge::guardrail, service};
use std::path;
use tracing_subscriber::EnvFilter;

/// Synthesize one guarded service stack per deployment target.
///
/// Targets come from `CDK_DEPLOY_STAGES`, `CDK_DEPLOY_<stage>_ACCOUNTS`,
/// `CDK_DEPLOY_<stage>_<account>_REGIONS`, `CDK_DEFAULT_ACCOUNT` and `CDK_DEFAULT_REGION`.
#[derive(Debug, Parser)]
#[command(name = "pipeline-forge", version)]
struct Cli {
    /// Prefix of every stack id.
    #[arg(long, env = "PROJECT_NAME")]
    project_name: String,

    /// Path segment and name prefix of the API.
    #[arg(long, env = "API_DOMAIN")]
    api_domain: String,

    /// Department tag.
    #[arg(long, env = "DEPARTMENT")]
    department: String,

    /// Product tag.
    #[arg(long, env = "PRODUCT")]
    product: String,

    /// ProductDetail tag.
    #[arg(long, env = "PRODUCT_DETAIL")]
    product_detail: String,

    /// Directory the templates are written to.
    #[arg(long, default_value = "cdk.out")]
    output: path::PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let project = app::ProjectConfig {
        project_name: cli.project_name,
        service: service::ServiceProps {
            api_domain: cli.api_domain,
        },
        guardrails: guardrail::GuardrailConfig {
            department: cli.department,
            product: cli.product,
            product_detail: cli.product_detail,
        },
    };

    let stacks = app::build(&project, &config::DeployConfig::from_env())
        .context("failed to build stacks")?;
    let templates = app::synth(&stacks).context("failed to synthesize stacks")?;
    let paths = app::write(&cli.output, &templates)
        .with_context(|| format!("failed to write templates to {}", cli.output.display()))?;
    for path in paths {
        println!("{}", path.display());
    }
    Ok(())
}
