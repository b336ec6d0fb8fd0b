//! In-memory construct tree of a stack.
//!
//! A stack is a tree of [`Construct`] nodes. Groups only scope their children, while
//! parameters, resources and outputs become entries of the synthesized template under a
//! logical id derived from their path (see [`logical_id`]).

/// Typed and raw CloudFormation resources.
pub mod resource;

/// Stack root, tags and deploy-time parameters.
pub mod stack;

/// Template synthesis.
pub mod template;

/// Literal and deferred property values.
pub mod token;

use crate::common::error::{Error, Result};

use indexmap::IndexMap;
use serde::Serialize;

const PATH_SEPARATOR: char = '/';

/// Path components left out of logical ids, so a construct's main resource keeps the
/// logical id of the construct itself.
const HIDDEN_IDS: [&str; 2] = ["Resource", "Default"];

/// Type of a deploy-time parameter.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub enum ParameterType {
    /// A string value.
    String,
}

/// Value supplied when the template is deployed.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Parameter {
    /// The parameter type.
    #[serde(rename = "Type")]
    pub parameter_type: ParameterType,
    /// Human readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Value used when the deployment does not supply one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl Parameter {
    /// A string parameter with a description and no default.
    pub fn string(description: impl Into<String>) -> Self {
        Self {
            parameter_type: ParameterType::String,
            description: Some(description.into()),
            default: None,
        }
    }
}

/// Value exported by the stack once deployed.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Output {
    /// The exported value.
    pub value: token::Token,
    /// Human readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// What a construct declares.
#[derive(Clone, Debug, PartialEq)]
pub enum ConstructKind {
    /// Scope for child constructs, declares nothing itself.
    Group,
    /// Deploy-time parameter.
    Parameter(Parameter),
    /// Stack output.
    Output(Output),
    /// CloudFormation resource.
    Resource(resource::Resource),
}

/// Node of the construct tree.
///
/// ```rust
/// use pipeline_forge::construct::{self, resource};
///
/// let mut function = construct::Construct::group("ApiCreate").unwrap();
/// function
///     .add(construct::Construct::resource(
///         "ServiceRole",
///         resource::Role::for_service(resource::LAMBDA_SERVICE_PRINCIPAL),
///     ).unwrap())
///     .unwrap();
/// assert!(function.child("ServiceRole").unwrap().as_role().is_some());
/// assert!(function.add(construct::Construct::group("ServiceRole").unwrap()).is_err());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Construct {
    id: String,
    kind: ConstructKind,
    children: IndexMap<String, Construct>,
}

impl Construct {
    /// Create a construct without children.
    pub fn new(id: impl Into<String>, kind: ConstructKind) -> Result<Self> {
        let id = id.into();
        if id.is_empty() || id.contains(PATH_SEPARATOR) {
            return Err(Error::InvalidConstructId { id });
        }
        Ok(Self {
            id,
            kind,
            children: IndexMap::new(),
        })
    }

    /// Create a group construct.
    pub fn group(id: impl Into<String>) -> Result<Self> {
        Self::new(id, ConstructKind::Group)
    }

    /// Create a resource construct.
    pub fn resource(id: impl Into<String>, resource: impl Into<resource::Resource>) -> Result<Self> {
        Self::new(id, ConstructKind::Resource(resource.into()))
    }

    /// Create an output construct.
    pub fn output(id: impl Into<String>, value: token::Token, description: &str) -> Result<Self> {
        let output = Output {
            value,
            description: Some(description.to_string()),
        };
        Self::new(id, ConstructKind::Output(output))
    }

    /// The construct id, unique among its siblings.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// What the construct declares.
    pub fn kind(&self) -> &ConstructKind {
        &self.kind
    }

    /// The resource declared by the construct, if any.
    pub fn as_resource(&self) -> Option<&resource::Resource> {
        match &self.kind {
            ConstructKind::Resource(resource) => Some(resource),
            _ => None,
        }
    }

    /// The role declared by the construct, if it declares one.
    pub fn as_role(&self) -> Option<&resource::Role> {
        match &self.kind {
            ConstructKind::Resource(resource::Resource::Role(role)) => Some(role),
            _ => None,
        }
    }

    /// Mutable access to the role declared by the construct, if it declares one.
    pub fn as_role_mut(&mut self) -> Option<&mut resource::Role> {
        match &mut self.kind {
            ConstructKind::Resource(resource::Resource::Role(role)) => Some(role),
            _ => None,
        }
    }

    /// Children in declaration order.
    pub fn children(&self) -> impl Iterator<Item = &Construct> {
        self.children.values()
    }

    /// Child by id.
    pub fn child(&self, id: &str) -> Option<&Construct> {
        self.children.get(id)
    }

    /// Descendant by `/` separated path relative to this construct.
    pub fn find(&self, path: &str) -> Option<&Construct> {
        path.split(PATH_SEPARATOR)
            .try_fold(self, |node, id| node.child(id))
    }

    /// Add a child, failing if a sibling already uses its id.
    pub fn add(&mut self, child: Construct) -> Result<&mut Construct> {
        if self.children.contains_key(&child.id) {
            return Err(Error::DuplicateConstructId {
                parent: self.id.clone(),
                id: child.id,
            });
        }
        let id = child.id.clone();
        Ok(self.children.entry(id).or_insert(child))
    }

    /// Add a child and return the construct, for building subtrees inline.
    pub fn with_child(mut self, child: Construct) -> Result<Self> {
        self.add(child)?;
        Ok(self)
    }

    /// Visit this construct and every descendant, parents before children.
    pub fn accept<V: Visitor + ?Sized>(&mut self, visitor: &mut V) {
        visitor.visit(self);
        for child in self.children.values_mut() {
            child.accept(visitor);
        }
    }

    /// This construct and every descendant, parents before children.
    pub fn descendants(&self) -> Vec<&Construct> {
        let mut nodes = vec![self];
        for child in self.children.values() {
            nodes.extend(child.descendants());
        }
        nodes
    }
}

/// Operation applied to every node of a construct tree.
pub trait Visitor {
    /// Called once per node.
    fn visit(&mut self, node: &mut Construct);
}

/// Logical id of the construct at `path`, relative to its stack.
///
/// ```rust
/// use pipeline_forge::construct;
///
/// assert_eq!(construct::logical_id(&["acct-api-create", "ServiceRole"]), "acctapicreateServiceRole");
/// assert_eq!(construct::logical_id(&["acct-api-create", "Resource"]), "acctapicreate");
/// ```
pub fn logical_id(path: &[&str]) -> String {
    path.iter()
        .filter(|component| !HIDDEN_IDS.contains(*component))
        .flat_map(|component| component.chars().filter(char::is_ascii_alphanumeric))
        .collect()
}
