use crate::common::error::{Error, Result};

use std::collections;

/// Snapshot of environment-style variables.
///
/// Configuration entry points read from a `Variables` value instead of the live process
/// environment, so callers capture the environment once and tests inject fixed values.
///
/// ```rust
/// use pipeline_forge::common::variables;
///
/// let variables: variables::Variables = [("CDK_DEFAULT_REGION", "eu-west-1")]
///     .into_iter()
///     .collect();
/// assert_eq!(variables.get("CDK_DEFAULT_REGION"), Some("eu-west-1"));
/// assert_eq!(variables.get("CDK_DEFAULT_ACCOUNT"), None);
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Variables {
    values: collections::HashMap<String, String>,
}

impl Variables {
    /// Capture the current process environment.
    pub fn from_env() -> Self {
        std::env::vars().collect()
    }

    /// Set a variable, replacing any previous value.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Get a variable by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Get a variable that must be present.
    pub fn required(&self, name: &str) -> Result<&str> {
        self.get(name).ok_or_else(|| Error::MissingConfiguration {
            variable: name.to_string(),
        })
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Variables {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let values = iter
            .into_iter()
            .map(|(name, value)| (name.into(), value.into()))
            .collect();
        Self { values }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_missing() {
        let variables = Variables::default().with("A", "1");
        assert_eq!(variables.required("A").unwrap(), "1");
        let error = variables.required("B").unwrap_err();
        assert!(matches!(
            error,
            Error::MissingConfiguration { variable } if variable == "B"
        ));
    }

    #[test]
    fn test_with_overwrites() {
        let variables = Variables::default().with("A", "1").with("A", "2");
        assert_eq!(variables.get("A"), Some("2"));
    }
}
