use serde::Serialize;
use std::fmt;

/// Account and region a stack deploys into.
///
/// ```rust
/// use pipeline_forge::common::environment;
///
/// let environment = environment::Environment::new("123456789012", "us-east-1");
/// assert_eq!(environment.to_string(), "aws://123456789012/us-east-1");
/// ```
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    /// The AWS account identifier.
    pub account: String,
    /// The AWS region identifier.
    pub region: String,
}

impl Environment {
    /// Create an environment from an account and a region.
    pub fn new(account: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            region: region.into(),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "aws://{}/{}", self.account, self.region)
    }
}
