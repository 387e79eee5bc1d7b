use std::fmt;

use runtime::fetch::FetchError;

use crate::QueryPath;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Operation preparation phases
    SyntaxError,
    ValidationError,
    // Field resolution
    UnresolvableField,
    FetchError,
    ResolverError,
    // Result completion
    NonNullViolation,
    InvalidValue,
}

/// An error returned by a resolver.
///
/// Resolver errors never abort an operation: the executor attaches them to the response
/// with the path of the failing field and sets that field to `null`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub message: String,
    pub code: ErrorCode,
}

impl Error {
    pub fn new(message: impl Into<String>) -> Self {
        Error {
            message: message.into(),
            code: ErrorCode::ResolverError,
        }
    }

    /// The parent value has no attribute to read for an unbound field.
    pub fn unresolvable(type_name: &str, field_name: &str) -> Self {
        Error {
            message: format!("Cannot resolve field `{field_name}` of type `{type_name}`: the parent value has no such attribute"),
            code: ErrorCode::UnresolvableField,
        }
    }

    #[must_use]
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = code;
        self
    }

    pub fn into_server_error(self, path: QueryPath, location: Option<Location>) -> ServerError {
        ServerError {
            message: self.message,
            locations: location.into_iter().collect(),
            path,
            extensions: ErrorExtensions { code: self.code },
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<FetchError> for Error {
    fn from(err: FetchError) -> Self {
        Error::new(err.to_string()).with_code(ErrorCode::FetchError)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::new(err.to_string()).with_code(ErrorCode::InvalidValue)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl From<async_graphql_parser::Pos> for Location {
    fn from(pos: async_graphql_parser::Pos) -> Self {
        Location {
            line: pos.line,
            column: pos.column,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ErrorExtensions {
    pub code: ErrorCode,
}

/// An entry of the `errors` list of a [`Response`](crate::Response).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ServerError {
    pub message: String,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    pub locations: Vec<Location>,
    pub path: QueryPath,
    pub extensions: ErrorExtensions,
}

impl ServerError {
    pub fn new(message: impl Into<String>, code: ErrorCode) -> Self {
        ServerError {
            message: message.into(),
            locations: Vec::new(),
            path: QueryPath::default(),
            extensions: ErrorExtensions { code },
        }
    }

    #[must_use]
    pub fn with_location(mut self, location: impl Into<Location>) -> Self {
        self.locations.push(location.into());
        self
    }

    #[must_use]
    pub fn with_path(mut self, path: QueryPath) -> Self {
        self.path = path;
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.extensions.code
    }
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
