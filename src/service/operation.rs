use crate::common::error::Error;

use std::{ops, str};

const PATH_SEPARATOR: char = '/';

/// HTTP method of a route.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum HttpMethod {
    /// `GET`.
    Get,
    /// `POST`.
    Post,
    /// `PUT`.
    Put,
    /// `PATCH`.
    Patch,
    /// `DELETE`.
    Delete,
}

impl ops::Deref for HttpMethod {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

/// Method and path template served by an operation.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Route {
    /// The HTTP method.
    pub method: HttpMethod,
    /// Path template, `{name}` segments match any value.
    pub path: String,
}

impl Route {
    /// Route key as understood by HTTP APIs, e.g. `GET /acct/{id}`.
    pub fn key(&self) -> String {
        format!("{} {}", &*self.method, self.path)
    }

    /// Whether a request method and path hit this route.
    pub fn matches(&self, method: &str, path: &str) -> bool {
        if *self.method != *method {
            return false;
        }
        let mut expected = self.path.split(PATH_SEPARATOR);
        let mut actual = path.split(PATH_SEPARATOR);
        loop {
            match (expected.next(), actual.next()) {
                (None, None) => return true,
                (Some(template), Some(segment)) if is_variable(template) => {
                    if segment.is_empty() {
                        return false;
                    }
                }
                (Some(template), Some(segment)) if template == segment => {}
                _ => return false,
            }
        }
    }
}

fn is_variable(segment: &str) -> bool {
    segment.len() > 2 && segment.starts_with('{') && segment.ends_with('}')
}

/// CRUD operation served by one API function.
///
/// ```rust
/// use pipeline_forge::service::operation;
///
/// let routes: Vec<_> = operation::Operation::Update
///     .routes("acct")
///     .iter()
///     .map(operation::Route::key)
///     .collect();
/// assert_eq!(routes, vec!["PUT /acct/{id}", "PATCH /acct/{id}"]);
/// assert_eq!("read".parse::<operation::Operation>().unwrap(), operation::Operation::Read);
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Operation {
    /// `POST /{domain}`.
    Create,
    /// `GET /{domain}` and `GET /{domain}/{id}`.
    Read,
    /// `PUT|PATCH /{domain}/{id}`.
    Update,
    /// `DELETE /{domain}/{id}`.
    Delete,
}

impl Operation {
    /// Every operation, in declaration order.
    pub const ALL: [Self; 4] = [Self::Create, Self::Read, Self::Update, Self::Delete];

    /// Routes served by the operation under an API domain.
    pub fn routes(&self, api_domain: &str) -> Vec<Route> {
        let collection = format!("/{api_domain}");
        let item = format!("/{api_domain}/{{id}}");
        let route = |method, path: &String| Route {
            method,
            path: path.clone(),
        };
        match self {
            Self::Create => vec![route(HttpMethod::Post, &collection)],
            Self::Read => vec![
                route(HttpMethod::Get, &collection),
                route(HttpMethod::Get, &item),
            ],
            Self::Update => vec![
                route(HttpMethod::Put, &item),
                route(HttpMethod::Patch, &item),
            ],
            Self::Delete => vec![route(HttpMethod::Delete, &item)],
        }
    }

    /// Whether the operation modifies items and publishes change events.
    pub fn writes(&self) -> bool {
        !matches!(self, Self::Read)
    }
}

impl ops::Deref for Operation {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl str::FromStr for Operation {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|operation| **operation == *value)
            .ok_or_else(|| Error::UnknownOperation(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case::create(Operation::Create, vec!["POST /acct"])]
    #[case::read(Operation::Read, vec!["GET /acct", "GET /acct/{id}"])]
    #[case::update(Operation::Update, vec!["PUT /acct/{id}", "PATCH /acct/{id}"])]
    #[case::delete(Operation::Delete, vec!["DELETE /acct/{id}"])]
    fn test_routes(#[case] operation: Operation, #[case] expected: Vec<&str>) {
        let actual: Vec<_> = operation.routes("acct").iter().map(Route::key).collect();
        assert_eq!(actual, expected);
    }

    #[rstest]
    #[case::collection("GET", "/acct", true)]
    #[case::item("GET", "/acct/42", true)]
    #[case::wrong_method("POST", "/acct/42", false)]
    #[case::empty_id("GET", "/acct/", false)]
    #[case::too_deep("GET", "/acct/42/x", false)]
    #[case::other_domain("GET", "/users/42", false)]
    fn test_route_matches(#[case] method: &str, #[case] path: &str, #[case] expected: bool) {
        let matched = Operation::Read
            .routes("acct")
            .iter()
            .any(|route| route.matches(method, path));
        assert_eq!(matched, expected);
    }

    #[rstest]
    #[case::create("create", Operation::Create)]
    #[case::delete("delete", Operation::Delete)]
    fn test_from_str(#[case] value: &str, #[case] expected: Operation) {
        assert_eq!(value.parse::<Operation>().unwrap(), expected);
    }

    #[test]
    fn test_from_str_unknown() {
        let error = "list".parse::<Operation>().unwrap_err();
        assert!(matches!(error, Error::UnknownOperation(value) if value == "list"));
    }

    #[test]
    fn test_writes() {
        let writers: Vec<_> = Operation::ALL
            .into_iter()
            .filter(Operation::writes)
            .collect();
        assert_eq!(
            writers,
            vec![Operation::Create, Operation::Update, Operation::Delete]
        );
    }
}
