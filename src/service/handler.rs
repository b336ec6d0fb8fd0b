use crate::common::error::Result;
use crate::common::variables;
use crate::service::{self, operation};

use serde::{Deserialize, Serialize};
use std::collections;

/// Variable naming the operation a function serves.
pub const OPERATION_VARIABLE: &str = "API_OPERATION";

/// Variable naming the API domain.
pub const API_DOMAIN_VARIABLE: &str = "API_DOMAIN";

/// Variable naming the service table.
pub const TABLE_NAME_VARIABLE: &str = "DDB_TABLE_NAME";

/// Payload format version of REST-style events.
pub const PAYLOAD_FORMAT_V1: &str = "1.0";

/// Method and path of an HTTP request.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct HttpDescription {
    /// The request method.
    #[serde(default)]
    pub method: String,
    /// The request path.
    #[serde(default)]
    pub path: String,
}

/// Request context of an API event.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct RequestContext {
    /// HTTP details, present in payload format 2.0.
    pub http: Option<HttpDescription>,
}

/// API Gateway proxy event, payload format 1.0 or 2.0.
///
/// ```rust
/// use pipeline_forge::service::handler;
///
/// let event: handler::ApiEvent = serde_json::from_value(serde_json::json!({
///     "version": "2.0",
///     "requestContext": {"http": {"method": "POST", "path": "/acct"}},
///     "body": "{\"message\": \"Hello World\"}"
/// }))
/// .unwrap();
/// assert!(handler::validate_method(&event, "POST"));
/// assert!(handler::validate_path(&event, "/acct"));
/// ```
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiEvent {
    /// Payload format version.
    pub version: Option<String>,
    /// Request method, payload format 1.0.
    pub http_method: Option<String>,
    /// Request path, payload format 1.0.
    pub path: Option<String>,
    /// Request context.
    pub request_context: Option<RequestContext>,
    /// HTTP details at the top level of the event.
    pub http: Option<HttpDescription>,
    /// Path parameters, e.g. `id`.
    pub path_parameters: Option<collections::HashMap<String, String>>,
    /// Raw request body.
    pub body: Option<String>,
    /// Whether the body is base64 encoded.
    #[serde(default)]
    pub is_base64_encoded: bool,
}

impl ApiEvent {
    /// Whether the event uses payload format 1.0.
    pub fn is_v1(&self) -> bool {
        self.version.as_deref() == Some(PAYLOAD_FORMAT_V1)
    }

    fn http_description(&self) -> Option<&HttpDescription> {
        self.request_context
            .as_ref()
            .and_then(|context| context.http.as_ref())
            .or(self.http.as_ref())
    }

    /// Request method.
    pub fn method(&self) -> Option<&str> {
        if self.is_v1() {
            self.http_method.as_deref()
        } else {
            self.http_description()
                .map(|description| description.method.as_str())
        }
    }

    /// Request path.
    pub fn request_path(&self) -> Option<&str> {
        if self.is_v1() {
            self.path.as_deref()
        } else {
            self.http_description()
                .map(|description| description.path.as_str())
        }
    }

    /// Path parameter by name.
    pub fn path_parameter(&self, name: &str) -> Option<&str> {
        self.path_parameters
            .as_ref()?
            .get(name)
            .map(String::as_str)
    }
}

/// Whether the event uses the given method.
pub fn validate_method(event: &ApiEvent, method: &str) -> bool {
    event.method() == Some(method)
}

/// Whether the event targets exactly the given path.
pub fn validate_path(event: &ApiEvent, path: &str) -> bool {
    event.request_path() == Some(path)
}

/// Proxy response returned to the API.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    /// HTTP status code.
    pub status_code: u16,
    /// Response body.
    pub body: Option<String>,
}

/// Settings of an API function, read from its environment.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HandlerConfig {
    /// The operation served.
    pub operation: operation::Operation,
    /// The API domain, e.g. `acct`.
    pub api_domain: String,
    /// Name of the service table.
    pub table_name: String,
}

impl HandlerConfig {
    /// Read the settings from a variable snapshot.
    ///
    /// The table name defaults to the name the service stack gives its table.
    pub fn from_variables(variables: &variables::Variables) -> Result<Self> {
        let operation = variables.required(OPERATION_VARIABLE)?.parse()?;
        let api_domain = variables.required(API_DOMAIN_VARIABLE)?.to_string();
        let table_name = match variables.get(TABLE_NAME_VARIABLE) {
            Some(table_name) => table_name.to_string(),
            None => service::table_name(&api_domain),
        };
        Ok(Self {
            operation,
            api_domain,
            table_name,
        })
    }

    /// Read the settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_variables(&variables::Variables::from_env())
    }

    /// Whether the event hits one of the operation's routes.
    pub fn accepts(&self, event: &ApiEvent) -> bool {
        match (event.method(), event.request_path()) {
            (Some(method), Some(path)) => self
                .operation
                .routes(&self.api_domain)
                .iter()
                .any(|route| route.matches(method, path)),
            _ => false,
        }
    }
}

/// Handle an API event: the body is echoed back with status 200.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(
        name = "pipeline_forge.handle",
        skip_all,
        fields(operation = &*config.operation, table = %config.table_name)
    )
)]
pub fn handle(config: &HandlerConfig, event: &ApiEvent) -> ApiResponse {
    #[cfg(feature = "tracing")]
    if !config.accepts(event) {
        tracing::warn!(
            method = event.method(),
            path = event.request_path(),
            "event does not match the operation's routes"
        );
    }
    ApiResponse {
        status_code: 200,
        body: event.body.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::Error;

    use rstest::rstest;
    use serde_json::{Value, json};

    fn config(operation: operation::Operation) -> HandlerConfig {
        HandlerConfig {
            operation,
            api_domain: "acct".to_string(),
            table_name: "acct-api-ddb-table".to_string(),
        }
    }

    #[rstest]
    #[case::v1(
        json!({
            "version": "1.0",
            "httpMethod": "GET",
            "path": "/acct/42",
            "pathParameters": {"id": "42"},
            "requestContext": {"stage": "$default"}
        }),
        Some("GET"),
        Some("/acct/42")
    )]
    #[case::v2_request_context(
        json!({
            "version": "2.0",
            "rawPath": "/acct",
            "requestContext": {"http": {"method": "POST", "path": "/acct", "sourceIp": "1.2.3.4"}}
        }),
        Some("POST"),
        Some("/acct")
    )]
    #[case::v2_top_level_http(
        json!({
            "http": {"method": "DELETE", "path": "/acct/1"}
        }),
        Some("DELETE"),
        Some("/acct/1")
    )]
    #[case::v1_without_method(json!({"version": "1.0"}), None, None)]
    fn test_event_method_and_path(
        #[case] event: Value,
        #[case] method: Option<&str>,
        #[case] path: Option<&str>,
    ) {
        let event: ApiEvent = serde_json::from_value(event).unwrap();
        assert_eq!(event.method(), method);
        assert_eq!(event.request_path(), path);
    }

    #[rstest]
    #[case::matching("GET", "/acct", true, true)]
    #[case::other_method("POST", "/acct", false, true)]
    #[case::other_path("GET", "/acct/1", true, false)]
    fn test_validate(
        #[case] method: &str,
        #[case] path: &str,
        #[case] method_ok: bool,
        #[case] path_ok: bool,
    ) {
        let event = ApiEvent {
            version: Some("1.0".to_string()),
            http_method: Some(method.to_string()),
            path: Some(path.to_string()),
            ..Default::default()
        };
        assert_eq!(validate_method(&event, "GET"), method_ok);
        assert_eq!(validate_path(&event, "/acct"), path_ok);
    }

    #[rstest]
    #[case::create(operation::Operation::Create, Some("{\"message\": \"Hello World\"}"))]
    #[case::read(operation::Operation::Read, None)]
    #[case::delete(operation::Operation::Delete, Some("x"))]
    fn test_handle_echoes_body(#[case] operation: operation::Operation, #[case] body: Option<&str>) {
        let event = ApiEvent {
            body: body.map(str::to_string),
            ..Default::default()
        };
        let response = handle(&config(operation), &event);
        assert_eq!(
            response,
            ApiResponse {
                status_code: 200,
                body: body.map(str::to_string),
            }
        );
    }

    #[test]
    fn test_response_serialize() {
        let response = ApiResponse {
            status_code: 200,
            body: Some("{}".to_string()),
        };
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"statusCode": 200, "body": "{}"})
        );
    }

    #[test]
    fn test_accepts() {
        let event: ApiEvent = serde_json::from_value(json!({
            "version": "1.0",
            "httpMethod": "PATCH",
            "path": "/acct/7",
            "pathParameters": {"id": "7"}
        }))
        .unwrap();
        assert!(config(operation::Operation::Update).accepts(&event));
        assert!(!config(operation::Operation::Delete).accepts(&event));
        assert_eq!(event.path_parameter("id"), Some("7"));
    }

    #[test]
    fn test_config_from_variables() {
        let variables = variables::Variables::default()
            .with(OPERATION_VARIABLE, "update")
            .with(API_DOMAIN_VARIABLE, "acct");
        let actual = HandlerConfig::from_variables(&variables).unwrap();
        assert_eq!(actual, config(operation::Operation::Update));

        let variables = variables.with(TABLE_NAME_VARIABLE, "custom");
        let actual = HandlerConfig::from_variables(&variables).unwrap();
        assert_eq!(actual.table_name, "custom");
    }

    #[rstest]
    #[case::missing_operation(
        variables::Variables::default().with(API_DOMAIN_VARIABLE, "acct")
    )]
    #[case::unknown_operation(
        variables::Variables::default()
            .with(API_DOMAIN_VARIABLE, "acct")
            .with(OPERATION_VARIABLE, "list")
    )]
    #[case::missing_domain(
        variables::Variables::default().with(OPERATION_VARIABLE, "read")
    )]
    fn test_config_from_variables_fails(#[case] variables: variables::Variables) {
        let error = HandlerConfig::from_variables(&variables).unwrap_err();
        assert!(matches!(
            error,
            Error::MissingConfiguration { .. } | Error::UnknownOperation(_)
        ));
    }
}
