use crate::common::environment::Environment;
use crate::common::error::{Error, Result};
use crate::forge::{config, stack_id};

const DEPLOYMENT_SEPARATOR: char = ':';

/// One stack to create: a stage deployed into an environment, optionally under a deployment label.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct DeploymentTarget {
    /// The stage, e.g. `dev` or `prod`.
    pub stage: String,
    /// Account and region.
    pub environment: Environment,
    /// Label distinguishing parallel deployments within one region.
    pub deployment: Option<String>,
}

impl DeploymentTarget {
    /// Id of the stack deploying this target.
    pub fn stack_id(&self, project_name: &str) -> String {
        stack_id::format_id(
            project_name,
            &self.stage,
            &self.environment,
            self.deployment.as_deref(),
        )
    }
}

/// Split a region token into its region and optional deployment label.
///
/// ```rust
/// use pipeline_forge::forge::target;
///
/// assert_eq!(target::parse_region("us-east-1").unwrap(), ("us-east-1", None));
/// assert_eq!(target::parse_region("us-east-1:blue").unwrap(), ("us-east-1", Some("blue")));
/// assert!(target::parse_region("us-east-1:blue:extra").is_err());
/// ```
pub fn parse_region(token: &str) -> Result<(&str, Option<&str>)> {
    let malformed = || Error::MalformedInput {
        token: token.to_string(),
    };
    let mut parts = token.split(DEPLOYMENT_SEPARATOR);
    let region = parts.next().filter(|region| !region.is_empty()).ok_or_else(malformed)?;
    let deployment = parts.next();
    if parts.next().is_some() || deployment.is_some_and(str::is_empty) {
        return Err(malformed());
    }
    Ok((region, deployment))
}

/// Expand the deployment variables into every stage × account × region target.
///
/// Targets are ordered stage first, then account, then region. Expansion is all or nothing:
/// any malformed region token or missing default aborts it.
///
/// ```rust
/// use pipeline_forge::common::variables;
/// use pipeline_forge::forge::{config, target};
///
/// let deploy = config::DeployConfig::new(
///     variables::Variables::default()
///         .with("CDK_DEPLOY_STAGES", "dev prod")
///         .with("CDK_DEFAULT_ACCOUNT", "111")
///         .with("CDK_DEFAULT_REGION", "us-east-1")
///         .with("CDK_DEPLOY_prod_111_REGIONS", "us-east-1:blue us-east-1:green"),
/// );
/// let targets = target::expand(&deploy).unwrap();
/// let ids: Vec<_> = targets.iter().map(|target| target.stack_id("svc")).collect();
/// assert_eq!(
///     ids,
///     vec![
///         "svc-dev-111-us-east-1",
///         "svc-prod-111-us-east-1-blue",
///         "svc-prod-111-us-east-1-green",
///     ],
/// );
/// ```
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(name = "pipeline_forge.expand", skip_all, err)
)]
pub fn expand(deploy: &config::DeployConfig) -> Result<Vec<DeploymentTarget>> {
    let mut targets = Vec::new();
    for stage in deploy.stages() {
        for account in deploy.accounts(stage)? {
            for token in deploy.regions(stage, account)? {
                let (region, deployment) = parse_region(token)?;
                targets.push(DeploymentTarget {
                    stage: stage.to_string(),
                    environment: Environment::new(account, region),
                    deployment: deployment.map(str::to_string),
                });
            }
        }
    }
    #[cfg(feature = "tracing")]
    tracing::debug!(targets = targets.len(), "expanded deployment targets");
    Ok(targets)
}
