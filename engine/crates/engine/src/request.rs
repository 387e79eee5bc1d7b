use std::any::Any;

use serde_json::Value;

use crate::Data;

pub type Variables = serde_json::Map<String, Value>;

/// One operation submission: the operation text, variable bindings and an optional shared
/// context override.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub operation_name: Option<String>,
    #[serde(default)]
    pub variables: Variables,
    #[serde(skip)]
    pub data: Data,
}

impl Request {
    pub fn new(query: impl Into<String>) -> Self {
        Request {
            query: query.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn operation_name(self, name: impl Into<String>) -> Self {
        Request {
            operation_name: Some(name.into()),
            ..self
        }
    }

    #[must_use]
    pub fn variables(self, variables: Variables) -> Self {
        Request { variables, ..self }
    }

    /// Adds context data for this request only. It shadows schema data of the same type.
    #[must_use]
    pub fn data<D: Any + Send + Sync>(mut self, data: D) -> Self {
        self.data.insert(data);
        self
    }
}

impl From<&str> for Request {
    fn from(query: &str) -> Self {
        Request::new(query)
    }
}

impl From<String> for Request {
    fn from(query: String) -> Self {
        Request::new(query)
    }
}
