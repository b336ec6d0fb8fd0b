use crate::common::error::{Error, Result};
use crate::common::{self, variables};

/// Variable listing the stages to deploy.
pub const STAGES_VARIABLE: &str = "CDK_DEPLOY_STAGES";

/// Variable holding the account used when a stage lists none.
pub const DEFAULT_ACCOUNT_VARIABLE: &str = "CDK_DEFAULT_ACCOUNT";

/// Variable holding the region used when a stage and account list none.
pub const DEFAULT_REGION_VARIABLE: &str = "CDK_DEFAULT_REGION";

/// Stage deployed when no stage list is set.
pub const DEFAULT_STAGE: &str = "dev";

/// Variable listing the accounts of a stage.
pub fn accounts_variable(stage: &str) -> String {
    format!("CDK_DEPLOY_{stage}_ACCOUNTS")
}

/// Variable listing the regions of a stage and account.
pub fn regions_variable(stage: &str, account: &str) -> String {
    format!("CDK_DEPLOY_{stage}_{account}_REGIONS")
}

/// Deployment variables, captured once by the caller.
///
/// Lists are space delimited. A list variable that is absent or blank falls back to its
/// default; defaults are only required when something falls back to them.
///
/// ```rust
/// use pipeline_forge::common::variables;
/// use pipeline_forge::forge::config;
///
/// let deploy = config::DeployConfig::new(
///     variables::Variables::default()
///         .with("CDK_DEPLOY_STAGES", "dev prod")
///         .with("CDK_DEPLOY_prod_ACCOUNTS", "111 222")
///         .with("CDK_DEFAULT_ACCOUNT", "000"),
/// );
/// assert_eq!(deploy.stages(), vec!["dev", "prod"]);
/// assert_eq!(deploy.accounts("prod").unwrap(), vec!["111", "222"]);
/// assert_eq!(deploy.accounts("dev").unwrap(), vec!["000"]);
/// assert!(deploy.regions("dev", "000").is_err());
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DeployConfig {
    variables: variables::Variables,
}

impl DeployConfig {
    /// Read deployment settings from a variable snapshot.
    pub fn new(variables: variables::Variables) -> Self {
        Self { variables }
    }

    /// Read deployment settings from the process environment.
    pub fn from_env() -> Self {
        Self::new(variables::Variables::from_env())
    }

    /// Stages to deploy.
    pub fn stages(&self) -> Vec<&str> {
        match self.list(STAGES_VARIABLE) {
            Some(stages) => stages,
            None => vec![DEFAULT_STAGE],
        }
    }

    /// Accounts a stage deploys to.
    pub fn accounts(&self, stage: &str) -> Result<Vec<&str>> {
        self.list_or_default(&accounts_variable(stage), DEFAULT_ACCOUNT_VARIABLE)
    }

    /// Region tokens (`region` or `region:deployment`) a stage deploys to in an account.
    pub fn regions(&self, stage: &str, account: &str) -> Result<Vec<&str>> {
        self.list_or_default(&regions_variable(stage, account), DEFAULT_REGION_VARIABLE)
    }

    fn list(&self, name: &str) -> Option<Vec<&str>> {
        let values = common::split_list(self.variables.get(name)?);
        (!values.is_empty()).then_some(values)
    }

    fn list_or_default(&self, name: &str, default: &str) -> Result<Vec<&str>> {
        if let Some(values) = self.list(name) {
            return Ok(values);
        }
        let values = common::split_list(self.variables.required(default)?);
        if values.is_empty() {
            return Err(Error::MissingConfiguration {
                variable: default.to_string(),
            });
        }
        Ok(values)
    }
}
