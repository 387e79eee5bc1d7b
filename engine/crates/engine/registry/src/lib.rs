//! The typed contract an operation is checked against.
//!
//! A [`Registry`] owns every type an engine knows about: the built-in scalars, enums and
//! object types along with their field signatures. Registries are built once, either
//! programmatically with [`Registry::define_type`]/[`Registry::define_enum`] or from SDL
//! with [`Registry::from_sdl`], and can be combined with [`Registry::merge`].

use std::collections::BTreeMap;

mod error;
mod export_sdl;
mod field_types;
mod fields;
mod merge;
mod sdl;
mod types;

pub use async_graphql_parser::types::OperationType;

pub use error::*;
pub use field_types::*;
pub use fields::*;
pub use types::*;

pub const BUILTIN_SCALARS: [&str; 5] = ["Boolean", "Float", "ID", "Int", "String"];

const QUERY: &str = "Query";
const MUTATION: &str = "Mutation";
const SUBSCRIPTION: &str = "Subscription";

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Registry {
    pub types: BTreeMap<String, MetaType>,
    pub query_type: String,
    pub mutation_type: Option<String>,
    pub subscription_type: Option<String>,
}

impl Default for Registry {
    fn default() -> Self {
        let types = BUILTIN_SCALARS
            .iter()
            .map(|name| (name.to_string(), MetaType::Scalar(ScalarType::new(*name))))
            .collect();

        Self {
            types,
            query_type: QUERY.to_string(),
            mutation_type: None,
            subscription_type: None,
        }
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an object type.
    ///
    /// Types named `Query`, `Mutation` or `Subscription` become the matching root type.
    pub fn define_type(
        &mut self,
        name: impl Into<String>,
        fields: impl IntoIterator<Item = MetaField>,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        let mut object = ObjectType::new(name.clone());
        for field in fields {
            insert_field(&mut object, field)?;
        }

        self.insert_type(MetaType::Object(object))?;

        match name.as_str() {
            MUTATION if self.mutation_type.is_none() => self.mutation_type = Some(name),
            SUBSCRIPTION if self.subscription_type.is_none() => self.subscription_type = Some(name),
            _ => {}
        }

        Ok(())
    }

    /// Registers a closed set of allowed values.
    pub fn define_enum<V: Into<String>>(
        &mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Result<(), RegistryError> {
        let mut enum_type = EnumType::new(name);
        for value in values {
            let value = value.into();
            if enum_type.values.contains(&value) {
                return Err(RegistryError::DuplicateEnumValue {
                    enum_name: enum_type.name,
                    value,
                });
            }
            enum_type.values.insert(value);
        }

        self.insert_type(MetaType::Enum(enum_type))
    }

    /// Registers a custom scalar. Values of custom scalars are passed through untouched.
    pub fn define_scalar(&mut self, name: impl Into<String>) -> Result<(), RegistryError> {
        self.insert_type(MetaType::Scalar(ScalarType::new(name)))
    }

    /// Adds fields to an already registered object type, the way `extend type` does in SDL.
    pub fn extend_type(
        &mut self,
        name: &str,
        fields: impl IntoIterator<Item = MetaField>,
    ) -> Result<(), RegistryError> {
        let Some(MetaType::Object(object)) = self.types.get_mut(name) else {
            return Err(RegistryError::UnknownType(name.to_string()));
        };

        for field in fields {
            insert_field(object, field)?;
        }

        Ok(())
    }

    /// The declared result type of `type_name.field_name`.
    pub fn resolve_field_type(&self, type_name: &str, field_name: &str) -> Result<&MetaFieldType, RegistryError> {
        self.field(type_name, field_name).map(|field| &field.ty)
    }

    pub fn field(&self, type_name: &str, field_name: &str) -> Result<&MetaField, RegistryError> {
        let ty = self
            .types
            .get(type_name)
            .ok_or_else(|| RegistryError::UnknownType(type_name.to_string()))?;

        ty.field_by_name(field_name).ok_or_else(|| RegistryError::UnknownField {
            type_name: type_name.to_string(),
            field_name: field_name.to_string(),
        })
    }

    pub fn lookup_type(&self, name: &str) -> Option<&MetaType> {
        self.types.get(name)
    }

    pub fn object(&self, name: &str) -> Option<&ObjectType> {
        self.types.get(name).and_then(MetaType::as_object)
    }

    /// The name of the root type serving operations of the given kind, if the registry
    /// declares one.
    pub fn root_type_name(&self, operation_type: OperationType) -> Option<&str> {
        let name = match operation_type {
            OperationType::Query => Some(self.query_type.as_str()),
            OperationType::Mutation => self.mutation_type.as_deref(),
            OperationType::Subscription => self.subscription_type.as_deref(),
        }?;

        self.object(name).map(|object| object.name.as_str())
    }

    pub fn is_root_type(&self, name: &str) -> bool {
        self.query_type == name
            || self.mutation_type.as_deref() == Some(name)
            || self.subscription_type.as_deref() == Some(name)
    }

    /// Checks that every field and argument refers to a declared type.
    pub fn check_references(&self) -> Result<(), RegistryError> {
        let objects = self.types.values().filter_map(MetaType::as_object);

        for object in objects {
            for field in object.fields.values() {
                let referenced = std::iter::once(&field.ty).chain(field.args.values().map(|arg| &arg.ty));
                for ty in referenced {
                    if !self.types.contains_key(ty.base_type_name()) {
                        return Err(RegistryError::UnknownType(ty.base_type_name().to_string()));
                    }
                }
            }
        }

        Ok(())
    }

    fn insert_type(&mut self, ty: MetaType) -> Result<(), RegistryError> {
        if self.types.contains_key(ty.name()) {
            return Err(RegistryError::DuplicateType(ty.name().to_string()));
        }

        self.types.insert(ty.name().to_string(), ty);
        Ok(())
    }
}

fn insert_field(object: &mut ObjectType, field: MetaField) -> Result<(), RegistryError> {
    if object.fields.contains_key(&field.name) {
        return Err(RegistryError::DuplicateField {
            type_name: object.name.clone(),
            field_name: field.name,
        });
    }

    object.fields.insert(field.name.clone(), field);
    Ok(())
}
