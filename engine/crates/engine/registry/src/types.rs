use indexmap::{IndexMap, IndexSet};

use crate::MetaField;

#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum MetaType {
    Scalar(ScalarType),
    Object(ObjectType),
    Enum(EnumType),
}

impl MetaType {
    pub fn name(&self) -> &str {
        match self {
            MetaType::Scalar(scalar) => &scalar.name,
            MetaType::Object(object) => &object.name,
            MetaType::Enum(enum_type) => &enum_type.name,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            MetaType::Scalar(_) => "scalar",
            MetaType::Object(_) => "object",
            MetaType::Enum(_) => "enum",
        }
    }

    pub fn field_by_name(&self, name: &str) -> Option<&MetaField> {
        match self {
            MetaType::Object(object) => object.fields.get(name),
            MetaType::Scalar(_) | MetaType::Enum(_) => None,
        }
    }

    /// Leaf types are the ones that can't have a selection set.
    pub fn is_leaf(&self) -> bool {
        matches!(self, MetaType::Scalar(_) | MetaType::Enum(_))
    }

    pub fn as_object(&self) -> Option<&ObjectType> {
        match self {
            MetaType::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumType> {
        match self {
            MetaType::Enum(enum_type) => Some(enum_type),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ScalarType {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ScalarType {
    pub fn new(name: impl Into<String>) -> Self {
        ScalarType {
            name: name.into(),
            description: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ObjectType {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub fields: IndexMap<String, MetaField>,
}

impl ObjectType {
    pub fn new(name: impl Into<String>) -> Self {
        ObjectType {
            name: name.into(),
            description: None,
            fields: IndexMap::new(),
        }
    }

    pub fn field_by_name(&self, name: &str) -> Option<&MetaField> {
        self.fields.get(name)
    }
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct EnumType {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub values: IndexSet<String>,
}

impl EnumType {
    pub fn new(name: impl Into<String>) -> Self {
        EnumType {
            name: name.into(),
            description: None,
            values: IndexSet::new(),
        }
    }

    pub fn is_allowed(&self, value: &str) -> bool {
        self.values.contains(value)
    }
}
