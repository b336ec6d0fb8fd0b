use crate::common::error::{Error, Result};
use crate::construct::{self, resource, stack};

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value, json};

/// Template format version.
pub const FORMAT_VERSION: &str = "2010-09-09";

const PSEUDO_PARAMETER_PREFIX: &str = "AWS::";

/// Resource entry of a template.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceDefinition {
    /// CloudFormation type.
    #[serde(rename = "Type")]
    pub resource_type: String,
    /// Properties, tags included.
    pub properties: Value,
    /// Logical ids created first.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    /// Behavior on removal from the stack.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deletion_policy: Option<resource::DeletionPolicy>,
    /// Behavior on replacement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_replace_policy: Option<resource::DeletionPolicy>,
}

/// Synthesized CloudFormation template.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Template {
    /// Format version.
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: String,
    /// Stack description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Deploy-time parameters by logical id.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: IndexMap<String, construct::Parameter>,
    /// Resources by logical id.
    pub resources: IndexMap<String, ResourceDefinition>,
    /// Outputs by logical id.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub outputs: IndexMap<String, construct::Output>,
}

impl Template {
    fn new(description: Option<String>) -> Self {
        Self {
            format_version: FORMAT_VERSION.to_string(),
            description,
            parameters: IndexMap::new(),
            resources: IndexMap::new(),
            outputs: IndexMap::new(),
        }
    }

    /// Whether a parameter, resource or output uses the logical id.
    pub fn declares(&self, logical_id: &str) -> bool {
        self.parameters.contains_key(logical_id)
            || self.resources.contains_key(logical_id)
            || self.outputs.contains_key(logical_id)
    }

    /// Resources of a given type.
    pub fn resources_of_type<'a>(
        &'a self,
        resource_type: &'a str,
    ) -> impl Iterator<Item = (&'a String, &'a ResourceDefinition)> {
        self.resources
            .iter()
            .filter(move |(_, definition)| definition.resource_type == resource_type)
    }

    /// Pretty printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub(crate) fn synthesize(stack: &stack::Stack) -> Result<Template> {
    let mut template = Template::new(stack.description().map(str::to_string));
    let mut path = Vec::new();
    for child in stack.node().children() {
        collect(stack, child, &mut path, &mut template)?;
    }
    validate_references(&template)?;
    Ok(template)
}

fn collect<'a>(
    stack: &stack::Stack,
    node: &'a construct::Construct,
    path: &mut Vec<&'a str>,
    template: &mut Template,
) -> Result<()> {
    path.push(node.id());
    if !matches!(node.kind(), construct::ConstructKind::Group) {
        let logical_id = construct::logical_id(path);
        if logical_id.is_empty() {
            return Err(Error::InvalidLogicalId {
                path: path.join("/"),
            });
        }
        if template.declares(&logical_id) {
            return Err(Error::DuplicateLogicalId { logical_id });
        }
        match node.kind() {
            construct::ConstructKind::Group => {}
            construct::ConstructKind::Parameter(parameter) => {
                template.parameters.insert(logical_id, parameter.clone());
            }
            construct::ConstructKind::Output(output) => {
                template.outputs.insert(logical_id, output.clone());
            }
            construct::ConstructKind::Resource(resource) => {
                let definition = define(stack, resource)?;
                template.resources.insert(logical_id, definition);
            }
        }
    }
    for child in node.children() {
        collect(stack, child, path, template)?;
    }
    path.pop();
    Ok(())
}

fn define(stack: &stack::Stack, resource: &resource::Resource) -> Result<ResourceDefinition> {
    let mut properties = resource.properties()?;
    if let Value::Object(map) = &mut properties {
        if let Some(tags) = render_tags(stack, resource.tag_format()) {
            map.insert("Tags".to_string(), tags);
        }
    }
    let deletion_policy = resource.deletion_policy();
    Ok(ResourceDefinition {
        resource_type: resource.resource_type().to_string(),
        properties,
        depends_on: resource.depends_on().to_vec(),
        deletion_policy,
        update_replace_policy: deletion_policy,
    })
}

fn render_tags(stack: &stack::Stack, tag_format: resource::TagFormat) -> Option<Value> {
    if stack.tags().is_empty() {
        return None;
    }
    match tag_format {
        resource::TagFormat::None => None,
        resource::TagFormat::List => {
            let tags = stack
                .tags()
                .iter()
                .map(|(key, value)| json!({"Key": key, "Value": value}))
                .collect();
            Some(Value::Array(tags))
        }
        resource::TagFormat::Map => {
            let tags: Map<String, Value> = stack
                .tags()
                .iter()
                .map(|(key, value)| (key.clone(), Value::String(value.clone())))
                .collect();
            Some(Value::Object(tags))
        }
    }
}

fn validate_references(template: &Template) -> Result<()> {
    let mut references = Vec::new();
    for definition in template.resources.values() {
        find_references(&definition.properties, &mut references);
        for dependency in &definition.depends_on {
            if !template.resources.contains_key(dependency) {
                return Err(Error::UnresolvedReference {
                    logical_id: dependency.clone(),
                });
            }
        }
    }
    for output in template.outputs.values() {
        references.extend(output.value.references().into_iter().map(str::to_string));
    }
    match references.into_iter().find(|logical_id| {
        !logical_id.starts_with(PSEUDO_PARAMETER_PREFIX)
            && !template.parameters.contains_key(logical_id)
            && !template.resources.contains_key(logical_id)
    }) {
        Some(logical_id) => Err(Error::UnresolvedReference { logical_id }),
        None => Ok(()),
    }
}

fn find_references(value: &Value, references: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(logical_id)) = map.get("Ref") {
                references.push(logical_id.clone());
            }
            if let Some(Value::String(logical_id)) = map
                .get("Fn::GetAtt")
                .and_then(Value::as_array)
                .and_then(|attribute| attribute.first())
            {
                references.push(logical_id.clone());
            }
            map.values()
                .for_each(|value| find_references(value, references));
        }
        Value::Array(items) => items
            .iter()
            .for_each(|value| find_references(value, references)),
        _ => {}
    }
}
