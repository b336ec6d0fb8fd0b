use serde::ser::{self, Serialize, SerializeMap};
use std::fmt;

/// Property value that is either known at build time or resolved by CloudFormation at deploy time.
///
/// ```rust
/// use pipeline_forge::construct::token;
///
/// let arn = token::Token::Ref("BoundaryPolicyArn".to_string());
/// assert!(!arn.is_resolved());
/// assert_eq!(
///     serde_json::to_value(&arn).unwrap(),
///     serde_json::json!({"Ref": "BoundaryPolicyArn"}),
/// );
/// ```
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Token {
    /// A literal string.
    Literal(String),
    /// Value of a parameter, physical id of a resource, or a pseudo parameter.
    Ref(String),
    /// Attribute of a resource.
    GetAtt(String, String),
    /// Concatenation of tokens with a separator.
    Join(String, Vec<Token>),
}

impl Token {
    /// Reference the `Arn` attribute of a resource.
    pub fn arn_of(logical_id: &str) -> Self {
        Self::GetAtt(logical_id.to_string(), "Arn".to_string())
    }

    /// Concatenate tokens without a separator.
    pub fn concat(parts: Vec<Token>) -> Self {
        Self::Join(String::new(), parts)
    }

    /// Whether the value is known without deploying.
    pub fn is_resolved(&self) -> bool {
        match self {
            Self::Literal(_) => true,
            Self::Ref(_) | Self::GetAtt(..) => false,
            Self::Join(_, parts) => parts.iter().all(Self::is_resolved),
        }
    }

    /// Logical ids this token refers to, pseudo parameters included.
    pub fn references(&self) -> Vec<&str> {
        match self {
            Self::Literal(_) => Vec::new(),
            Self::Ref(logical_id) | Self::GetAtt(logical_id, _) => vec![logical_id.as_str()],
            Self::Join(_, parts) => parts.iter().flat_map(Self::references).collect(),
        }
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self::Literal(value.to_string())
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Self::Literal(value)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f.write_str(value),
            Self::Ref(logical_id) => write!(f, "${{Token[{logical_id}]}}"),
            Self::GetAtt(logical_id, attribute) => {
                write!(f, "${{Token[{logical_id}.{attribute}]}}")
            }
            Self::Join(separator, parts) => {
                for (index, part) in parts.iter().enumerate() {
                    if index > 0 {
                        f.write_str(separator)?;
                    }
                    write!(f, "{part}")?;
                }
                Ok(())
            }
        }
    }
}

impl Serialize for Token {
    fn serialize<S: ser::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Literal(value) => serializer.serialize_str(value),
            Self::Ref(logical_id) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Ref", logical_id)?;
                map.end()
            }
            Self::GetAtt(logical_id, attribute) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Fn::GetAtt", &[logical_id, attribute])?;
                map.end()
            }
            Self::Join(separator, parts) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Fn::Join", &(separator, parts))?;
                map.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;
    use serde_json::{Value, json};

    #[rstest]
    #[case::literal(Token::from("a"), json!("a"))]
    #[case::reference(Token::Ref("A".to_string()), json!({"Ref": "A"}))]
    #[case::attribute(Token::arn_of("A"), json!({"Fn::GetAtt": ["A", "Arn"]}))]
    #[case::join(
        Token::Join(
            ":".to_string(),
            vec![
                Token::from("arn"),
                Token::Ref("AWS::Partition".to_string()),
            ]
        ),
        json!({"Fn::Join": [":", ["arn", {"Ref": "AWS::Partition"}]]})
    )]
    fn test_token_serialize(#[case] token: Token, #[case] expected: Value) {
        assert_eq!(serde_json::to_value(&token).unwrap(), expected);
    }

    #[rstest]
    #[case::literal(Token::from("a"), true)]
    #[case::reference(Token::Ref("A".to_string()), false)]
    #[case::literal_join(Token::concat(vec![Token::from("a"), Token::from("b")]), true)]
    #[case::mixed_join(Token::concat(vec![Token::from("a"), Token::arn_of("B")]), false)]
    fn test_token_is_resolved(#[case] token: Token, #[case] expected: bool) {
        assert_eq!(token.is_resolved(), expected);
    }

    #[test]
    fn test_token_references() {
        let token = Token::concat(vec![
            Token::Ref("A".to_string()),
            Token::from("/"),
            Token::arn_of("B"),
        ]);
        assert_eq!(token.references(), vec!["A", "B"]);
    }

    #[test]
    fn test_token_display() {
        let token = Token::concat(vec![Token::from("https://"), Token::Ref("Api".to_string())]);
        assert_eq!(token.to_string(), "https://${Token[Api]}");
    }
}
