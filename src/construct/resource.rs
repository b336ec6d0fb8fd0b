use crate::common::error::Result;
use crate::construct::token::Token;

use aws_sdk_dynamodb::types;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Value, json};

/// Principal of the Lambda service.
pub const LAMBDA_SERVICE_PRINCIPAL: &str = "lambda.amazonaws.com";

/// Version of the IAM policy language.
pub const POLICY_VERSION: &str = "2012-10-17";

/// Effect of a statement.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub enum Effect {
    /// Grant the actions.
    Allow,
}

/// Principal a trust policy statement applies to.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Principal {
    /// Service principal, e.g. `lambda.amazonaws.com`.
    pub service: String,
}

/// Statement of an IAM policy document.
///
/// ```rust
/// use pipeline_forge::construct::{resource, token};
///
/// let statement = resource::PolicyStatement::allow(&["events:PutEvents"], vec![token::Token::from("*")]);
/// assert_eq!(
///     serde_json::to_value(&statement).unwrap(),
///     serde_json::json!({"Effect": "Allow", "Action": ["events:PutEvents"], "Resource": ["*"]}),
/// );
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    /// Grant or deny.
    pub effect: Effect,
    /// Principal, only set in trust policies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal: Option<Principal>,
    /// Actions covered by the statement.
    pub action: Vec<String>,
    /// Resources covered by the statement, empty in trust policies.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub resource: Vec<Token>,
}

impl PolicyStatement {
    /// Allow actions on resources.
    pub fn allow(actions: &[&str], resources: Vec<Token>) -> Self {
        Self {
            effect: Effect::Allow,
            principal: None,
            action: actions.iter().map(|action| action.to_string()).collect(),
            resource: resources,
        }
    }

    /// Allow a service to assume the role.
    pub fn assume_role(service: &str) -> Self {
        Self {
            effect: Effect::Allow,
            principal: Some(Principal {
                service: service.to_string(),
            }),
            action: vec!["sts:AssumeRole".to_string()],
            resource: Vec::new(),
        }
    }
}

/// IAM policy document.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    /// Policy language version.
    pub version: String,
    /// The statements.
    pub statement: Vec<PolicyStatement>,
}

impl PolicyDocument {
    /// Document holding the given statements.
    pub fn new(statement: Vec<PolicyStatement>) -> Self {
        Self {
            version: POLICY_VERSION.to_string(),
            statement,
        }
    }
}

/// `AWS::IAM::Role`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Role {
    /// Who may assume the role.
    pub assume_role_policy_document: PolicyDocument,
    /// Managed policies attached to the role.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub managed_policy_arns: Vec<Token>,
    /// Maximum permissions the role can be granted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions_boundary: Option<Token>,
}

impl Role {
    /// Role assumable by a service principal.
    pub fn for_service(service: &str) -> Self {
        Self {
            assume_role_policy_document: PolicyDocument::new(vec![
                PolicyStatement::assume_role(service),
            ]),
            managed_policy_arns: Vec::new(),
            permissions_boundary: None,
        }
    }

    /// Attach an AWS managed policy by name, e.g. `service-role/AWSLambdaBasicExecutionRole`.
    pub fn with_aws_managed_policy(mut self, name: &str) -> Self {
        self.managed_policy_arns.push(Token::concat(vec![
            Token::from("arn:"),
            Token::Ref("AWS::Partition".to_string()),
            Token::from(format!(":iam::aws:policy/{name}")),
        ]));
        self
    }
}

/// `AWS::IAM::Policy` attached to roles.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Policy {
    /// Name of the inline policy.
    pub policy_name: String,
    /// The permissions.
    pub policy_document: PolicyDocument,
    /// Roles the policy is attached to.
    pub roles: Vec<Token>,
}

/// Location of a function's deployment package.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Code {
    /// Bucket holding the package.
    #[serde(rename = "S3Bucket")]
    pub bucket: Token,
    /// Key of the package within the bucket.
    #[serde(rename = "S3Key")]
    pub key: Token,
}

/// Environment variables of a function.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FunctionEnvironment {
    /// Variables by name.
    pub variables: IndexMap<String, Token>,
}

/// `AWS::Lambda::Function`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Function {
    /// Deployment package.
    pub code: Code,
    /// Entry point within the package.
    pub handler: String,
    /// Runtime identifier, e.g. `provided.al2023`.
    pub runtime: String,
    /// Execution role ARN.
    pub role: Token,
    /// Timeout in seconds.
    pub timeout: u32,
    /// Environment variables.
    #[serde(skip_serializing_if = "is_empty_environment")]
    pub environment: FunctionEnvironment,
    /// Logical ids that must be created before the function.
    #[serde(skip)]
    pub depends_on: Vec<String>,
}

fn is_empty_environment(environment: &FunctionEnvironment) -> bool {
    environment.variables.is_empty()
}

/// `AWS::DynamoDB::Table`, keyed with the DynamoDB model types.
///
/// ```rust
/// use aws_sdk_dynamodb::types;
/// use pipeline_forge::construct::resource;
///
/// let table = resource::Table::new("id", types::ScalarAttributeType::N).unwrap();
/// assert_eq!(table.key_schema[0].attribute_name(), "id");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    /// Key schema, partition key first.
    pub key_schema: Vec<types::KeySchemaElement>,
    /// Types of the key attributes.
    pub attribute_definitions: Vec<types::AttributeDefinition>,
    /// Capacity mode.
    pub billing_mode: types::BillingMode,
}

impl Table {
    /// Table with a single partition key, billed per request.
    pub fn new(partition_key: &str, attribute_type: types::ScalarAttributeType) -> Result<Self> {
        let key_schema = types::KeySchemaElement::builder()
            .attribute_name(partition_key)
            .key_type(types::KeyType::Hash)
            .build()?;
        let attribute_definition = types::AttributeDefinition::builder()
            .attribute_name(partition_key)
            .attribute_type(attribute_type)
            .build()?;
        Ok(Self {
            key_schema: vec![key_schema],
            attribute_definitions: vec![attribute_definition],
            billing_mode: types::BillingMode::PayPerRequest,
        })
    }

    fn properties(&self) -> Value {
        let key_schema: Vec<_> = self
            .key_schema
            .iter()
            .map(|key| {
                json!({
                    "AttributeName": key.attribute_name(),
                    "KeyType": key.key_type().as_str(),
                })
            })
            .collect();
        let attribute_definitions: Vec<_> = self
            .attribute_definitions
            .iter()
            .map(|attribute| {
                json!({
                    "AttributeName": attribute.attribute_name(),
                    "AttributeType": attribute.attribute_type().as_str(),
                })
            })
            .collect();
        json!({
            "KeySchema": key_schema,
            "AttributeDefinitions": attribute_definitions,
            "BillingMode": self.billing_mode.as_str(),
        })
    }
}

/// How a resource type accepts tags.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum TagFormat {
    /// Not taggable.
    #[default]
    None,
    /// `[{"Key": .., "Value": ..}]`.
    List,
    /// `{"key": "value"}`.
    Map,
}

/// Resource declared with its CloudFormation type and raw properties.
#[derive(Clone, Debug, PartialEq)]
pub struct RawResource {
    /// CloudFormation type, e.g. `AWS::ApiGatewayV2::Api`.
    pub resource_type: String,
    /// Properties object.
    pub properties: Value,
    /// How the type accepts tags.
    pub tag_format: TagFormat,
    /// Logical ids that must be created before this resource.
    pub depends_on: Vec<String>,
}

impl RawResource {
    /// Untaggable resource without dependencies.
    pub fn new(resource_type: impl Into<String>, properties: Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            properties,
            tag_format: TagFormat::None,
            depends_on: Vec::new(),
        }
    }

    /// Declare how the type accepts tags.
    pub fn with_tag_format(mut self, tag_format: TagFormat) -> Self {
        self.tag_format = tag_format;
        self
    }
}

/// What happens to a resource's physical counterpart when it leaves the stack or is replaced.
///
/// Resources without a policy are deleted.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum DeletionPolicy {
    /// Keep it.
    Retain,
}

/// CloudFormation resource.
#[derive(Clone, Debug, PartialEq)]
pub enum Resource {
    /// `AWS::IAM::Role`.
    Role(Role),
    /// `AWS::IAM::Policy`.
    Policy(Policy),
    /// `AWS::Lambda::Function`.
    Function(Function),
    /// `AWS::DynamoDB::Table`.
    Table(Table),
    /// Any other resource type.
    Raw(RawResource),
}

impl Resource {
    /// CloudFormation resource type.
    pub fn resource_type(&self) -> &str {
        match self {
            Self::Role(_) => "AWS::IAM::Role",
            Self::Policy(_) => "AWS::IAM::Policy",
            Self::Function(_) => "AWS::Lambda::Function",
            Self::Table(_) => "AWS::DynamoDB::Table",
            Self::Raw(raw) => &raw.resource_type,
        }
    }

    /// How the resource accepts tags.
    pub fn tag_format(&self) -> TagFormat {
        match self {
            Self::Role(_) | Self::Function(_) | Self::Table(_) => TagFormat::List,
            Self::Policy(_) => TagFormat::None,
            Self::Raw(raw) => raw.tag_format,
        }
    }

    /// Deletion policy, tables are retained.
    pub fn deletion_policy(&self) -> Option<DeletionPolicy> {
        match self {
            Self::Table(_) => Some(DeletionPolicy::Retain),
            _ => None,
        }
    }

    /// Logical ids that must be created first.
    pub fn depends_on(&self) -> &[String] {
        match self {
            Self::Function(function) => &function.depends_on,
            Self::Raw(raw) => &raw.depends_on,
            _ => &[],
        }
    }

    /// Properties object as it appears in the template, without tags.
    pub fn properties(&self) -> Result<Value> {
        let properties = match self {
            Self::Role(role) => serde_json::to_value(role)?,
            Self::Policy(policy) => serde_json::to_value(policy)?,
            Self::Function(function) => serde_json::to_value(function)?,
            Self::Table(table) => table.properties(),
            Self::Raw(raw) => raw.properties.clone(),
        };
        Ok(properties)
    }
}

impl From<Role> for Resource {
    fn from(role: Role) -> Self {
        Self::Role(role)
    }
}

impl From<Policy> for Resource {
    fn from(policy: Policy) -> Self {
        Self::Policy(policy)
    }
}

impl From<Function> for Resource {
    fn from(function: Function) -> Self {
        Self::Function(function)
    }
}

impl From<Table> for Resource {
    fn from(table: Table) -> Self {
        Self::Table(table)
    }
}

impl From<RawResource> for Resource {
    fn from(raw: RawResource) -> Self {
        Self::Raw(raw)
    }
}
