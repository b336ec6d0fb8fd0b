//! The serverless CRUD service the scaffold generates.
//!
//! [`build`] declares the service stack: a DynamoDB table keyed on a numeric `id`, an HTTP
//! API, and one function per CRUD [`operation::Operation`] with its execution role, policy,
//! integration and routes. The functions run the [`handler`] passthrough.

/// API function handlers.
pub mod handler;

/// CRUD operations and their routes.
pub mod operation;

use crate::common::error::Result;
use crate::construct::{self, resource, stack, token::Token};

use aws_sdk_dynamodb::types;
use indexmap::IndexMap;
use serde_json::json;

/// Id of the parameter naming the bucket that holds the handler package.
pub const ASSET_BUCKET_PARAMETER_ID: &str = "AssetBucket";

/// Key of the handler package within the asset bucket.
pub const HANDLER_PACKAGE: &str = "api-handler.zip";

/// Runtime of the API functions.
pub const HANDLER_RUNTIME: &str = "provided.al2023";

/// Entry point of the API functions.
pub const HANDLER_ENTRY_POINT: &str = "bootstrap";

/// Timeout of the API functions, in seconds.
pub const HANDLER_TIMEOUT: u32 = 30;

/// Partition key of the service table.
pub const PARTITION_KEY: &str = "id";

const TABLE_READ_ACTIONS: [&str; 8] = [
    "dynamodb:BatchGetItem",
    "dynamodb:GetRecords",
    "dynamodb:GetShardIterator",
    "dynamodb:Query",
    "dynamodb:GetItem",
    "dynamodb:Scan",
    "dynamodb:ConditionCheckItem",
    "dynamodb:DescribeTable",
];

const TABLE_WRITE_ACTIONS: [&str; 4] = [
    "dynamodb:BatchWriteItem",
    "dynamodb:PutItem",
    "dynamodb:UpdateItem",
    "dynamodb:DeleteItem",
];

/// Settings of the generated service.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ServiceProps {
    /// Path segment and name prefix of the API, e.g. `acct`.
    pub api_domain: String,
}

/// Name of the service table for an API domain.
pub fn table_name(api_domain: &str) -> String {
    format!("{api_domain}-api-ddb-table")
}

fn http_api_name(api_domain: &str) -> String {
    format!("{api_domain}-http-api-gw")
}

fn function_name(api_domain: &str, operation: operation::Operation) -> String {
    format!("{api_domain}-api-{}", &*operation)
}

struct Shared {
    api: String,
    table: String,
    asset_bucket: Token,
}

/// Declare the service resources in a stack.
///
/// ```rust
/// use pipeline_forge::common::environment;
/// use pipeline_forge::construct::stack;
/// use pipeline_forge::service;
///
/// let mut stack = stack::Stack::new("acct-dev-123-us-east-1", environment::Environment::new("123", "us-east-1")).unwrap();
/// service::build(&mut stack, &service::ServiceProps { api_domain: "acct".to_string() }).unwrap();
/// let template = stack.synth().unwrap();
/// assert_eq!(template.resources_of_type("AWS::Lambda::Function").count(), 4);
/// assert_eq!(template.resources_of_type("AWS::ApiGatewayV2::Route").count(), 6);
/// ```
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(name = "pipeline_forge.service", skip_all, fields(stack = stack.id()), err)
)]
pub fn build(stack: &mut stack::Stack, props: &ServiceProps) -> Result<()> {
    let domain = props.api_domain.as_str();
    let asset_bucket = stack.parameter(
        ASSET_BUCKET_PARAMETER_ID,
        construct::Parameter::string("Bucket holding the API handler package"),
    )?;

    let table_id = table_name(domain);
    stack.add(construct::Construct::resource(
        table_id.as_str(),
        resource::Table::new(PARTITION_KEY, types::ScalarAttributeType::N)?,
    )?)?;

    let api_id = http_api_name(domain);
    let api = resource::RawResource::new(
        "AWS::ApiGatewayV2::Api",
        json!({
            "Name": api_id,
            "ProtocolType": "HTTP",
        }),
    )
    .with_tag_format(resource::TagFormat::Map);
    let shared = Shared {
        api: construct::logical_id(&[&api_id]),
        table: construct::logical_id(&[&table_id]),
        asset_bucket,
    };
    let stage = resource::RawResource::new(
        "AWS::ApiGatewayV2::Stage",
        json!({
            "ApiId": Token::Ref(shared.api.clone()),
            "StageName": "$default",
            "AutoDeploy": true,
        }),
    )
    .with_tag_format(resource::TagFormat::Map);
    stack.add(
        construct::Construct::group(api_id.as_str())?
            .with_child(construct::Construct::resource("Resource", api)?)?
            .with_child(construct::Construct::resource("DefaultStage", stage)?)?,
    )?;

    for operation in operation::Operation::ALL {
        stack.add(api_function(domain, operation, &shared)?)?;
    }

    let url = Token::concat(vec![
        Token::from("https://"),
        Token::Ref(shared.api.clone()),
        Token::from(".execute-api."),
        Token::Ref("AWS::Region".to_string()),
        Token::from("."),
        Token::Ref("AWS::URLSuffix".to_string()),
        Token::from("/"),
    ]);
    stack.add(construct::Construct::output("Api", url, "URL of the API Gateway")?)?;
    stack.add(construct::Construct::output(
        "DynamoDB_Name",
        Token::Ref(shared.table.clone()),
        "DynamoDB Table Name",
    )?)?;
    stack.add(construct::Construct::output(
        "DynamoDB_ARN",
        Token::arn_of(&shared.table),
        "DynamoDB Table ARN",
    )?)?;
    Ok(())
}

fn api_function(
    domain: &str,
    operation: operation::Operation,
    shared: &Shared,
) -> Result<construct::Construct> {
    let id = function_name(domain, operation);
    let role_id = construct::logical_id(&[&id, "ServiceRole"]);
    let policy_id = construct::logical_id(&[&id, "ServiceRole", "DefaultPolicy"]);
    let function_id = construct::logical_id(&[&id, "Resource"]);
    let integration_id = construct::logical_id(&[&id, "Integration"]);

    let mut statements = Vec::new();
    let mut table_actions = TABLE_READ_ACTIONS.to_vec();
    if operation.writes() {
        statements.push(resource::PolicyStatement::allow(
            &["events:PutEvents"],
            vec![Token::from("*")],
        ));
        table_actions.extend(TABLE_WRITE_ACTIONS);
    }
    statements.push(resource::PolicyStatement::allow(
        &table_actions,
        vec![Token::arn_of(&shared.table)],
    ));
    let policy = resource::Policy {
        policy_name: policy_id.clone(),
        policy_document: resource::PolicyDocument::new(statements),
        roles: vec![Token::Ref(role_id.clone())],
    };
    let role = resource::Role::for_service(resource::LAMBDA_SERVICE_PRINCIPAL)
        .with_aws_managed_policy("service-role/AWSLambdaBasicExecutionRole");

    let function = resource::Function {
        code: resource::Code {
            bucket: shared.asset_bucket.clone(),
            key: Token::from(HANDLER_PACKAGE),
        },
        handler: HANDLER_ENTRY_POINT.to_string(),
        runtime: HANDLER_RUNTIME.to_string(),
        role: Token::arn_of(&role_id),
        timeout: HANDLER_TIMEOUT,
        environment: resource::FunctionEnvironment {
            variables: IndexMap::from([
                (
                    handler::TABLE_NAME_VARIABLE.to_string(),
                    Token::Ref(shared.table.clone()),
                ),
                (handler::API_DOMAIN_VARIABLE.to_string(), Token::from(domain)),
                (
                    handler::OPERATION_VARIABLE.to_string(),
                    Token::from(&*operation),
                ),
            ]),
        },
        depends_on: vec![policy_id, role_id.clone()],
    };
    let integration = resource::RawResource::new(
        "AWS::ApiGatewayV2::Integration",
        json!({
            "ApiId": Token::Ref(shared.api.clone()),
            "IntegrationType": "AWS_PROXY",
            "IntegrationUri": Token::arn_of(&function_id),
            "PayloadFormatVersion": "2.0",
        }),
    );

    let mut node = construct::Construct::group(id.as_str())?
        .with_child(
            construct::Construct::resource("ServiceRole", role)?
                .with_child(construct::Construct::resource("DefaultPolicy", policy)?)?,
        )?
        .with_child(construct::Construct::resource("Resource", function)?)?
        .with_child(construct::Construct::resource("Integration", integration)?)?;
    for route in operation.routes(domain) {
        node.add(api_route(&route, &function_id, &integration_id, shared)?)?;
    }
    Ok(node)
}

fn api_route(
    route: &operation::Route,
    function_id: &str,
    integration_id: &str,
    shared: &Shared,
) -> Result<construct::Construct> {
    let id = format!("Route{}{}", &*route.method, route.path.replace('/', "-"));
    let api_route = resource::RawResource::new(
        "AWS::ApiGatewayV2::Route",
        json!({
            "ApiId": Token::Ref(shared.api.clone()),
            "RouteKey": route.key(),
            "Target": Token::concat(vec![
                Token::from("integrations/"),
                Token::Ref(integration_id.to_string()),
            ]),
        }),
    );
    let permission = resource::RawResource::new(
        "AWS::Lambda::Permission",
        json!({
            "Action": "lambda:InvokeFunction",
            "FunctionName": Token::arn_of(function_id),
            "Principal": "apigateway.amazonaws.com",
            "SourceArn": Token::concat(vec![
                Token::from("arn:"),
                Token::Ref("AWS::Partition".to_string()),
                Token::from(":execute-api:"),
                Token::Ref("AWS::Region".to_string()),
                Token::from(":"),
                Token::Ref("AWS::AccountId".to_string()),
                Token::from(":"),
                Token::Ref(shared.api.clone()),
                Token::from(format!("/*/*{}", route.path)),
            ]),
        }),
    );
    construct::Construct::group(id)?
        .with_child(construct::Construct::resource("Resource", api_route)?)?
        .with_child(construct::Construct::resource("Permission", permission)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::environment;
    use crate::forge::guardrail;

    use serde_json::Value;

    fn service_stack() -> stack::Stack {
        let mut stack = stack::Stack::new(
            "acct-dev-123-us-east-1",
            environment::Environment::new("123", "us-east-1"),
        )
        .unwrap();
        build(
            &mut stack,
            &ServiceProps {
                api_domain: "acct".to_string(),
            },
        )
        .unwrap();
        stack
    }

    #[test]
    fn test_service_resources() {
        let template = service_stack().synth().unwrap();
        let count = |resource_type: &str| template.resources_of_type(resource_type).count();
        assert_eq!(count("AWS::DynamoDB::Table"), 1);
        assert_eq!(count("AWS::ApiGatewayV2::Api"), 1);
        assert_eq!(count("AWS::ApiGatewayV2::Stage"), 1);
        assert_eq!(count("AWS::IAM::Role"), 4);
        assert_eq!(count("AWS::IAM::Policy"), 4);
        assert_eq!(count("AWS::Lambda::Function"), 4);
        assert_eq!(count("AWS::ApiGatewayV2::Integration"), 4);
        assert_eq!(count("AWS::ApiGatewayV2::Route"), 6);
        assert_eq!(count("AWS::Lambda::Permission"), 6);
        assert_eq!(
            template.outputs.keys().collect::<Vec<_>>(),
            vec!["Api", "DynamoDBName", "DynamoDBARN"]
        );
        assert_eq!(
            template.parameters.keys().collect::<Vec<_>>(),
            vec![ASSET_BUCKET_PARAMETER_ID]
        );
    }

    #[test]
    fn test_service_route_keys() {
        let template = service_stack().synth().unwrap();
        let keys: Vec<_> = template
            .resources_of_type("AWS::ApiGatewayV2::Route")
            .map(|(_, definition)| definition.properties["RouteKey"].clone())
            .collect();
        assert_eq!(
            keys,
            vec![
                Value::from("POST /acct"),
                Value::from("GET /acct"),
                Value::from("GET /acct/{id}"),
                Value::from("PUT /acct/{id}"),
                Value::from("PATCH /acct/{id}"),
                Value::from("DELETE /acct/{id}"),
            ]
        );
    }

    #[test]
    fn test_service_function() {
        let template = service_stack().synth().unwrap();
        let function = &template.resources["acctapicreate"];
        assert_eq!(
            function.depends_on,
            vec!["acctapicreateServiceRoleDefaultPolicy", "acctapicreateServiceRole"]
        );
        assert_eq!(
            function.properties["Environment"],
            json!({
                "Variables": {
                    "DDB_TABLE_NAME": {"Ref": "acctapiddbtable"},
                    "API_DOMAIN": "acct",
                    "API_OPERATION": "create"
                }
            })
        );
        assert_eq!(function.properties["Timeout"], json!(30));
    }

    #[test]
    fn test_service_policies() {
        let template = service_stack().synth().unwrap();
        let statements = |logical_id: &str| {
            template.resources[logical_id].properties["PolicyDocument"]["Statement"]
                .as_array()
                .unwrap()
                .len()
        };
        assert_eq!(statements("acctapicreateServiceRoleDefaultPolicy"), 2);
        assert_eq!(statements("acctapireadServiceRoleDefaultPolicy"), 1);
        let read = &template.resources["acctapireadServiceRoleDefaultPolicy"].properties;
        assert_eq!(
            read["PolicyDocument"]["Statement"][0]["Action"]
                .as_array()
                .unwrap()
                .len(),
            TABLE_READ_ACTIONS.len()
        );
    }

    #[test]
    fn test_service_with_guardrails() {
        let mut stack = service_stack();
        let roles = guardrail::apply_boundary(&mut stack).unwrap();
        assert_eq!(roles, 4);
        guardrail::apply_tags(
            &mut stack,
            "prod",
            &guardrail::GuardrailConfig {
                department: "fnds".to_string(),
                product: "accounts".to_string(),
                product_detail: "account service".to_string(),
            },
        );
        let template = stack.synth().unwrap();
        for (_, definition) in template.resources_of_type("AWS::IAM::Role") {
            assert_eq!(
                definition.properties["PermissionsBoundary"],
                json!({"Ref": "BoundaryPolicyArn"})
            );
        }
        assert_eq!(
            template.resources["accthttpapigw"].properties["Tags"]["Environment"],
            json!("Production")
        );
        assert!(
            template.resources["acctapiddbtable"].properties["Tags"]
                .as_array()
                .unwrap()
                .contains(&json!({"Key": "Department", "Value": "fnds"}))
        );
        assert!(
            template.resources["acctapicreateServiceRoleDefaultPolicy"]
                .properties
                .get("Tags")
                .is_none()
        );
    }
}
