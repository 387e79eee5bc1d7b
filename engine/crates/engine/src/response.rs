use serde_json::Value;

use crate::ServerError;

/// The outcome of an operation: `data` mirrors the shape of the operation and is `null` when
/// the operation failed before execution. Field errors leave `data` partially populated.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Response {
    pub data: Value,
    pub errors: Vec<ServerError>,
}

impl Response {
    pub fn new(data: Value) -> Self {
        Response {
            data,
            errors: Vec::new(),
        }
    }

    pub fn from_errors(errors: Vec<ServerError>) -> Self {
        Response {
            data: Value::Null,
            errors,
        }
    }

    #[must_use]
    pub fn with_errors(self, errors: Vec<ServerError>) -> Self {
        Response { errors, ..self }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn is_err(&self) -> bool {
        !self.is_ok()
    }

    pub fn into_result(self) -> Result<Value, Vec<ServerError>> {
        if self.is_ok() {
            Ok(self.data)
        } else {
            Err(self.errors)
        }
    }
}
