use crate::common::error::Result;
use crate::construct::{self, stack, token};

use std::ops;

/// Id of the parameter carrying the permission boundary ARN.
pub const BOUNDARY_PARAMETER_ID: &str = "BoundaryPolicyArn";

/// Description of the permission boundary parameter.
pub const BOUNDARY_PARAMETER_DESCRIPTION: &str = "Permission boundary for all roles";

/// Stages classified as production.
pub const PRODUCTION_STAGES: [&str; 2] = ["prod", "tp"];

/// Organizational tag values a stack must carry.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct GuardrailConfig {
    /// Department code.
    pub department: String,
    /// Product name.
    pub product: String,
    /// Product detail.
    pub product_detail: String,
}

/// Environment classification of a stage.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EnvironmentClass {
    /// Production stages.
    Production,
    /// Every other stage.
    Development,
}

impl EnvironmentClass {
    /// Classify a stage.
    pub fn of_stage(stage: &str) -> Self {
        if PRODUCTION_STAGES.contains(&stage) {
            Self::Production
        } else {
            Self::Development
        }
    }
}

impl ops::Deref for EnvironmentClass {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        match self {
            Self::Production => "Production",
            Self::Development => "Development",
        }
    }
}

/// Sets the permission boundary of every role it visits.
#[derive(Clone, Debug)]
pub struct PermissionBoundaryVisitor {
    policy_arn: token::Token,
    roles: usize,
}

impl PermissionBoundaryVisitor {
    /// Visitor applying the given boundary ARN.
    pub fn new(policy_arn: token::Token) -> Self {
        Self {
            policy_arn,
            roles: 0,
        }
    }

    /// Number of roles bounded so far.
    pub fn roles(&self) -> usize {
        self.roles
    }
}

impl construct::Visitor for PermissionBoundaryVisitor {
    fn visit(&mut self, node: &mut construct::Construct) {
        if let Some(role) = node.as_role_mut() {
            role.permissions_boundary = Some(self.policy_arn.clone());
            self.roles += 1;
        }
    }
}

/// Apply every guardrail: permission boundary first, then tags.
///
/// Call it once all resources are declared: roles added afterwards are not bounded.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(name = "pipeline_forge.guardrail", skip_all, fields(stack = stack.id(), stage = %stage), err)
)]
pub fn apply(stack: &mut stack::Stack, stage: &str, guardrails: &GuardrailConfig) -> Result<()> {
    apply_boundary(stack)?;
    apply_tags(stack, stage, guardrails);
    Ok(())
}

/// Declare the boundary parameter and set it as the boundary of every role in the stack.
///
/// Returns the number of roles bounded.
pub fn apply_boundary(stack: &mut stack::Stack) -> Result<usize> {
    let policy_arn = stack.parameter(
        BOUNDARY_PARAMETER_ID,
        construct::Parameter::string(BOUNDARY_PARAMETER_DESCRIPTION),
    )?;
    let mut visitor = PermissionBoundaryVisitor::new(policy_arn);
    stack.accept(&mut visitor);
    #[cfg(feature = "tracing")]
    tracing::debug!(roles = visitor.roles(), "applied permission boundary");
    Ok(visitor.roles())
}

/// Tag the stack with its department, environment class, product and product detail.
pub fn apply_tags(stack: &mut stack::Stack, stage: &str, guardrails: &GuardrailConfig) {
    let environment = EnvironmentClass::of_stage(stage);
    stack.set_tag("Department", guardrails.department.as_str());
    stack.set_tag("Environment", &*environment);
    stack.set_tag("Product", guardrails.product.as_str());
    stack.set_tag("ProductDetail", guardrails.product_detail.as_str());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::environment;
    use crate::construct::resource;

    use rstest::rstest;

    fn guardrails(product: &str) -> GuardrailConfig {
        GuardrailConfig {
            department: "fnds".to_string(),
            product: product.to_string(),
            product_detail: "account service".to_string(),
        }
    }

    fn role(id: &str) -> construct::Construct {
        construct::Construct::resource(
            id,
            resource::Role::for_service(resource::LAMBDA_SERVICE_PRINCIPAL),
        )
        .unwrap()
    }

    fn stack() -> stack::Stack {
        let mut stack =
            stack::Stack::new("svc", environment::Environment::new("123", "us-east-1")).unwrap();
        stack.add(role("TopRole")).unwrap();
        stack
            .add(
                construct::Construct::group("Fn")
                    .unwrap()
                    .with_child(
                        construct::Construct::group("Nested")
                            .unwrap()
                            .with_child(role("ServiceRole"))
                            .unwrap(),
                    )
                    .unwrap(),
            )
            .unwrap();
        stack
    }

    fn boundary<'a>(stack: &'a stack::Stack, path: &str) -> Option<&'a token::Token> {
        stack
            .node()
            .find(path)
            .and_then(construct::Construct::as_role)
            .and_then(|role| role.permissions_boundary.as_ref())
    }

    #[rstest]
    #[case::prod("prod", EnvironmentClass::Production)]
    #[case::tp("tp", EnvironmentClass::Production)]
    #[case::dev("dev", EnvironmentClass::Development)]
    #[case::staging("staging", EnvironmentClass::Development)]
    #[case::case_sensitive("Prod", EnvironmentClass::Development)]
    fn test_environment_class(#[case] stage: &str, #[case] expected: EnvironmentClass) {
        assert_eq!(EnvironmentClass::of_stage(stage), expected);
    }

    #[test]
    fn test_apply_boundary_reaches_nested_roles() {
        let mut stack = stack();
        let roles = apply_boundary(&mut stack).unwrap();
        assert_eq!(roles, 2);
        let expected = token::Token::Ref(BOUNDARY_PARAMETER_ID.to_string());
        assert_eq!(boundary(&stack, "TopRole"), Some(&expected));
        assert_eq!(boundary(&stack, "Fn/Nested/ServiceRole"), Some(&expected));
        assert!(!expected.is_resolved());
    }

    #[test]
    fn test_roles_added_after_boundary_are_not_bounded() {
        let mut stack = stack();
        apply_boundary(&mut stack).unwrap();
        stack.add(role("LateRole")).unwrap();
        assert!(boundary(&stack, "TopRole").is_some());
        assert!(boundary(&stack, "LateRole").is_none());
    }

    #[test]
    fn test_apply_twice_is_idempotent() {
        let mut stack = stack();
        apply(&mut stack, "dev", &guardrails("first")).unwrap();
        apply(&mut stack, "prod", &guardrails("second")).unwrap();
        assert_eq!(stack.tags().len(), 4);
        assert_eq!(stack.tag("Department"), Some("fnds"));
        assert_eq!(stack.tag("Environment"), Some("Production"));
        assert_eq!(stack.tag("Product"), Some("second"));
        assert_eq!(stack.tag("ProductDetail"), Some("account service"));
        let parameters = stack
            .node()
            .children()
            .filter(|node| matches!(node.kind(), construct::ConstructKind::Parameter(_)))
            .count();
        assert_eq!(parameters, 1);
    }

    #[test]
    fn test_apply_synthesizes_boundary_and_tags() {
        let mut stack = stack();
        apply(&mut stack, "dev", &guardrails("accounts")).unwrap();
        let template = stack.synth().unwrap();
        assert_eq!(
            serde_json::to_value(&template.parameters[BOUNDARY_PARAMETER_ID]).unwrap(),
            serde_json::json!({"Type": "String", "Description": "Permission boundary for all roles"})
        );
        for (_, definition) in template.resources_of_type("AWS::IAM::Role") {
            assert_eq!(
                definition.properties["PermissionsBoundary"],
                serde_json::json!({"Ref": "BoundaryPolicyArn"})
            );
            assert_eq!(
                definition.properties["Tags"],
                serde_json::json!([
                    {"Key": "Department", "Value": "fnds"},
                    {"Key": "Environment", "Value": "Development"},
                    {"Key": "Product", "Value": "accounts"},
                    {"Key": "ProductDetail", "Value": "account service"}
                ])
            );
        }
    }

    #[cfg(feature = "cli")]
    #[rstest]
    #[case::production("prod")]
    #[case::development("dev")]
    fn test_apply_span_records_stage(#[case] stage: &str) {
        use std::sync::{Arc, Mutex};
        use tracing_subscriber::layer::SubscriberExt;

        #[derive(Clone, Default)]
        struct SpanFields(Arc<Mutex<Vec<(String, String)>>>);

        impl tracing::field::Visit for SpanFields {
            fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
                if let Ok(mut fields) = self.0.lock() {
                    fields.push((field.name().to_string(), format!("{value:?}")));
                }
            }
        }

        impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for SpanFields {
            fn on_new_span(
                &self,
                attributes: &tracing::span::Attributes<'_>,
                _: &tracing::span::Id,
                _: tracing_subscriber::layer::Context<'_, S>,
            ) {
                if attributes.metadata().name() == "pipeline_forge.guardrail" {
                    attributes.record(&mut self.clone());
                }
            }
        }

        let fields = SpanFields::default();
        let subscriber = tracing_subscriber::registry().with(fields.clone());
        let mut stack = stack();
        tracing::subscriber::with_default(subscriber, || {
            apply(&mut stack, stage, &guardrails("accounts")).unwrap();
        });
        let recorded = fields.0.lock().unwrap().clone();
        assert!(recorded.contains(&("stage".to_string(), stage.to_string())));
    }
}
