use crate::common::environment::Environment;
use crate::common::error::{Error, Result};
use crate::construct::{self, template, token};

use indexmap::IndexMap;

/// Root of a construct tree, deployed as one template into one environment.
///
/// ```rust
/// use pipeline_forge::common::environment;
/// use pipeline_forge::construct::{self, stack};
///
/// let mut stack = stack::Stack::new(
///     "svc-dev-123456789012-us-east-1",
///     environment::Environment::new("123456789012", "us-east-1"),
/// )
/// .unwrap();
/// let arn = stack
///     .parameter("BoundaryPolicyArn", construct::Parameter::string("Permission boundary for all roles"))
///     .unwrap();
/// assert_eq!(arn.to_string(), "${Token[BoundaryPolicyArn]}");
/// stack.set_tag("Product", "accounts");
/// assert_eq!(stack.tag("Product"), Some("accounts"));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Stack {
    environment: Environment,
    description: Option<String>,
    tags: IndexMap<String, String>,
    root: construct::Construct,
}

impl Stack {
    /// Create an empty stack.
    pub fn new(id: impl Into<String>, environment: Environment) -> Result<Self> {
        Ok(Self {
            environment,
            description: None,
            tags: IndexMap::new(),
            root: construct::Construct::group(id)?,
        })
    }

    /// The stack id, also the name of the deployed stack.
    pub fn id(&self) -> &str {
        self.root.id()
    }

    /// Where the stack deploys.
    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Template description.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Set the template description.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
    }

    /// Tags applied to every taggable resource, in insertion order.
    pub fn tags(&self) -> &IndexMap<String, String> {
        &self.tags
    }

    /// Tag value by key.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Set a tag, replacing any previous value for the key.
    pub fn set_tag(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.tags.insert(key.into(), value.into());
    }

    /// The root construct.
    pub fn node(&self) -> &construct::Construct {
        &self.root
    }

    /// Add a top level construct.
    pub fn add(&mut self, child: construct::Construct) -> Result<&mut construct::Construct> {
        self.root.add(child)
    }

    /// Declare a top level parameter and return a reference to its value.
    ///
    /// Declaring the same parameter again returns the existing reference; declaring a different
    /// construct under the same id fails.
    pub fn parameter(
        &mut self,
        id: &str,
        parameter: construct::Parameter,
    ) -> Result<token::Token> {
        let reference = token::Token::Ref(construct::logical_id(&[id]));
        if let Some(existing) = self.root.child(id) {
            return match existing.kind() {
                construct::ConstructKind::Parameter(declared) if *declared == parameter => {
                    Ok(reference)
                }
                _ => Err(Error::DuplicateConstructId {
                    parent: self.id().to_string(),
                    id: id.to_string(),
                }),
            };
        }
        self.root.add(construct::Construct::new(
            id,
            construct::ConstructKind::Parameter(parameter),
        )?)?;
        Ok(reference)
    }

    /// Visit every construct of the stack, the root included.
    pub fn accept<V: construct::Visitor + ?Sized>(&mut self, visitor: &mut V) {
        self.root.accept(visitor);
    }

    /// Render the stack as a template.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "pipeline_forge.synth", skip_all, fields(stack = self.id()), err)
    )]
    pub fn synth(&self) -> Result<template::Template> {
        template::synthesize(self)
    }
}
