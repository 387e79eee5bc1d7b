use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt,
    sync::Arc,
};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{Error, ErrorCode, QueryPath};

/// Shared context handed to every resolver of an operation, keyed by Rust type.
///
/// A schema carries one and each request can bring its own: on a lookup the request
/// entries win.
#[derive(Default, Clone)]
pub struct Data(HashMap<TypeId, Arc<dyn Any + Send + Sync>>);

impl Data {
    pub fn insert<D: Any + Send + Sync>(&mut self, data: D) {
        self.0.insert(TypeId::of::<D>(), Arc::new(data));
    }

    pub fn get<D: Any + Send + Sync>(&self) -> Option<&D> {
        self.0.get(&TypeId::of::<D>()).and_then(|data| data.downcast_ref::<D>())
    }

    pub fn contains<D: Any + Send + Sync>(&self) -> bool {
        self.0.contains_key(&TypeId::of::<D>())
    }

    /// Adds every entry of `other`, replacing entries of the same type.
    pub fn merge(&mut self, other: Data) {
        self.0.extend(other.0);
    }

    /// Adds the entries of `other` whose type is not present yet.
    pub(crate) fn merge_missing(&mut self, other: &Data) {
        for (type_id, data) in &other.0 {
            self.0.entry(*type_id).or_insert_with(|| Arc::clone(data));
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Data").field(&self.0.len()).finish()
    }
}

/// Everything a resolver gets to produce the value of one field.
pub struct ResolverContext {
    pub parent_type: String,
    pub field_name: String,
    /// The already resolved value of the enclosing object, `null` for root fields.
    pub parent: Value,
    /// Argument values after variable substitution and defaults.
    pub args: serde_json::Map<String, Value>,
    pub path: QueryPath,
    pub(crate) data: Arc<Data>,
}

impl ResolverContext {
    /// Fetches shared context data, failing the field when it was never provided.
    pub fn data<D: Any + Send + Sync>(&self) -> Result<&D, Error> {
        self.data.get::<D>().ok_or_else(|| {
            Error::new(format!("Data `{}` does not exist.", std::any::type_name::<D>()))
        })
    }

    pub fn data_opt<D: Any + Send + Sync>(&self) -> Option<&D> {
        self.data.get::<D>()
    }

    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }

    /// Deserializes a single argument.
    pub fn arg_as<T: DeserializeOwned>(&self, name: &str) -> Result<T, Error> {
        let value = self.args.get(name).cloned().unwrap_or(Value::Null);
        serde_json::from_value(value).map_err(|err| {
            Error::new(format!("Invalid value for argument \"{name}\": {err}")).with_code(ErrorCode::InvalidValue)
        })
    }

    /// Deserializes all arguments at once into a struct with one field per argument.
    pub fn args_as<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_value(Value::Object(self.args.clone())).map_err(|err| {
            Error::new(format!("Invalid arguments for field \"{}\": {err}", self.field_name))
                .with_code(ErrorCode::InvalidValue)
        })
    }

    /// Reads a same-named attribute off the parent value.
    pub fn parent_attribute(&self, name: &str) -> Option<&Value> {
        self.parent.as_object().and_then(|parent| parent.get(name))
    }
}

impl fmt::Debug for ResolverContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverContext")
            .field("parent_type", &self.parent_type)
            .field("field_name", &self.field_name)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
