use async_graphql_value::ConstValue;
use indexmap::IndexMap;

use crate::field_types::MetaFieldType;

#[derive(Clone, Default, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct MetaField {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub args: IndexMap<String, MetaInputValue>,
    pub ty: MetaFieldType,
}

impl MetaField {
    pub fn new(name: impl Into<String>, ty: impl Into<MetaFieldType>) -> MetaField {
        MetaField {
            name: name.into(),
            ty: ty.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_argument(mut self, argument: MetaInputValue) -> Self {
        self.args.insert(argument.name.clone(), argument);
        self
    }

    #[must_use]
    pub fn with_description(self, description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..self
        }
    }
}

#[derive(Clone, Default, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct MetaInputValue {
    pub name: String,
    pub ty: MetaFieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<ConstValue>,
}

impl MetaInputValue {
    pub fn new(name: impl Into<String>, ty: impl Into<MetaFieldType>) -> MetaInputValue {
        MetaInputValue {
            name: name.into(),
            ty: ty.into(),
            default_value: None,
        }
    }

    #[must_use]
    pub fn with_default(self, default_value: ConstValue) -> Self {
        Self {
            default_value: Some(default_value),
            ..self
        }
    }

    /// Whether the argument must be supplied by the operation.
    pub fn is_required(&self) -> bool {
        self.ty.is_non_null() && self.default_value.is_none()
    }
}
