use aws_sdk_dynamodb::error::BuildError;

/// Errors raised while expanding targets, building construct trees or synthesizing templates.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A region entry carries more than one deployment label separator.
    #[error("invalid region format on '{token}'")]
    MalformedInput {
        /// The offending region token.
        token: String,
    },
    /// A required variable is absent and nothing overrides it.
    #[error("missing required configuration variable {variable}")]
    MissingConfiguration {
        /// Name of the missing variable.
        variable: String,
    },
    /// A construct id is empty or contains a path separator.
    #[error("invalid construct id '{id}'")]
    InvalidConstructId {
        /// The rejected id.
        id: String,
    },
    /// A sibling construct with the same id already exists.
    #[error("construct '{parent}' already has a child named '{id}'")]
    DuplicateConstructId {
        /// Id of the parent construct.
        parent: String,
        /// The duplicated child id.
        id: String,
    },
    /// A construct path does not produce a usable logical id.
    #[error("construct path '{path}' does not produce a logical id")]
    InvalidLogicalId {
        /// The construct path, `/` separated.
        path: String,
    },
    /// Two constructs map to the same logical id.
    #[error("logical id '{logical_id}' is declared more than once")]
    DuplicateLogicalId {
        /// The duplicated logical id.
        logical_id: String,
    },
    /// A reference names a logical id that the template does not declare.
    #[error("reference to undeclared logical id '{logical_id}'")]
    UnresolvedReference {
        /// The referenced logical id.
        logical_id: String,
    },
    /// An API operation name that is not one of create, read, update or delete.
    #[error("unknown API operation '{0}'")]
    UnknownOperation(String),
    /// A DynamoDB model value is missing a required field.
    #[error(transparent)]
    Build(#[from] BuildError),
    /// A template could not be serialized.
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    /// A template could not be written.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type returned by the crate's fallible operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
