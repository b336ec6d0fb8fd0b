//! App driver: one guarded service stack per deployment target, synthesized to template files.

use crate::common::error::Result;
use crate::construct::{stack, template};
use crate::forge::{config, guardrail, target};
use crate::service;

use indexmap::IndexMap;
use std::{fs, path};

/// Suffix of synthesized template files.
pub const TEMPLATE_SUFFIX: &str = ".template.json";

/// Project settings shared by every stack of the app.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ProjectConfig {
    /// Prefix of every stack id.
    pub project_name: String,
    /// The generated service.
    pub service: service::ServiceProps,
    /// Organizational tags.
    pub guardrails: guardrail::GuardrailConfig,
}

/// Build one service stack per deployment target, with guardrails applied.
///
/// Targets are fully expanded before any stack is built, so a malformed variable yields
/// no stacks at all.
///
/// ```rust
/// use pipeline_forge::{app, common::variables, forge::config, service};
///
/// let deploy = config::DeployConfig::new(
///     variables::Variables::default()
///         .with("CDK_DEPLOY_STAGES", "dev prod")
///         .with("CDK_DEFAULT_ACCOUNT", "123")
///         .with("CDK_DEFAULT_REGION", "us-east-1"),
/// );
/// let project = app::ProjectConfig {
///     project_name: "acct".to_string(),
///     service: service::ServiceProps { api_domain: "acct".to_string() },
///     ..Default::default()
/// };
/// let stacks = app::build(&project, &deploy).unwrap();
/// let ids: Vec<_> = stacks.iter().map(|stack| stack.id()).collect();
/// assert_eq!(ids, vec!["acct-dev-123-us-east-1", "acct-prod-123-us-east-1"]);
/// ```
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(name = "pipeline_forge.build", skip_all, fields(project = %project.project_name), err)
)]
pub fn build(project: &ProjectConfig, deploy: &config::DeployConfig) -> Result<Vec<stack::Stack>> {
    let targets = target::expand(deploy)?;
    let mut stacks = Vec::with_capacity(targets.len());
    for target in targets {
        let mut stack = stack::Stack::new(
            target.stack_id(&project.project_name),
            target.environment.clone(),
        )?;
        stack.set_description(format!(
            "{} API for {} ({})",
            project.service.api_domain, project.project_name, target.stage
        ));
        service::build(&mut stack, &project.service)?;
        guardrail::apply(&mut stack, &target.stage, &project.guardrails)?;
        stacks.push(stack);
    }
    Ok(stacks)
}

/// Synthesize every stack, keyed by stack id.
pub fn synth(stacks: &[stack::Stack]) -> Result<IndexMap<String, template::Template>> {
    stacks
        .iter()
        .map(|stack| Ok((stack.id().to_string(), stack.synth()?)))
        .collect()
}

/// Write each template to `<dir>/<stack id>.template.json`, creating `dir` if needed.
///
/// Returns the written paths.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(name = "pipeline_forge.write", skip_all, fields(dir = %dir.display()), err)
)]
pub fn write(
    dir: &path::Path,
    templates: &IndexMap<String, template::Template>,
) -> Result<Vec<path::PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut paths = Vec::with_capacity(templates.len());
    for (id, template) in templates {
        let path = dir.join(format!("{id}{TEMPLATE_SUFFIX}"));
        fs::write(&path, template.to_json()?)?;
        paths.push(path);
    }
    Ok(paths)
}
