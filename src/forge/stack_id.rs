use crate::common::environment::Environment;

const SEPARATOR: &str = "-";

/// Id of the stack deploying a project stage into an environment.
///
/// The deployment segment is left out entirely when there is no deployment label.
///
/// ```rust
/// use pipeline_forge::common::environment;
/// use pipeline_forge::forge::stack_id;
///
/// let environment = environment::Environment::new("123", "us-east-1");
/// assert_eq!(stack_id::format_id("svc", "dev", &environment, None), "svc-dev-123-us-east-1");
/// assert_eq!(
///     stack_id::format_id("svc", "dev", &environment, Some("blue")),
///     "svc-dev-123-us-east-1-blue",
/// );
/// ```
pub fn format_id(
    project_name: &str,
    stage: &str,
    environment: &Environment,
    deployment: Option<&str>,
) -> String {
    let mut segments = vec![
        project_name,
        stage,
        environment.account.as_str(),
        environment.region.as_str(),
    ];
    segments.extend(deployment);
    segments.join(SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case::without_deployment("svc", "dev", None, "svc-dev-123-us-east-1")]
    #[case::with_deployment("svc", "dev", Some("blue"), "svc-dev-123-us-east-1-blue")]
    #[case::hyphenated_name("acct-svc", "prod", None, "acct-svc-prod-123-us-east-1")]
    fn test_format_id(
        #[case] project_name: &str,
        #[case] stage: &str,
        #[case] deployment: Option<&str>,
        #[case] expected: &str,
    ) {
        let environment = Environment::new("123", "us-east-1");
        assert_eq!(
            format_id(project_name, stage, &environment, deployment),
            expected
        );
    }
}
