//! Checking of values against declared types, in both directions: inputs (arguments and
//! variables) and resolver results.

use engine_registry::{MetaFieldType, MetaType, Registry};
use serde_json::Value;

const BOOLEAN: &str = "Boolean";
const FLOAT: &str = "Float";
const ID: &str = "ID";
const INT: &str = "Int";
const STRING: &str = "String";

/// Coerces an argument or variable value. The error is a human readable reason.
pub(crate) fn coerce_input(registry: &Registry, ty: &MetaFieldType, value: Value) -> Result<Value, String> {
    if value.is_null() {
        return if ty.is_non_null() {
            Err(format!("expected type \"{ty}\", found null"))
        } else {
            Ok(Value::Null)
        };
    }

    if let Some(item_ty) = ty.list_item_type() {
        return match value {
            Value::Array(items) => items
                .into_iter()
                .map(|item| coerce_input(registry, &item_ty, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            // A single item stands for a list of one.
            value => coerce_input(registry, &item_ty, value).map(|item| Value::Array(vec![item])),
        };
    }

    let name = ty.base_type_name();
    match registry.lookup_type(name) {
        Some(MetaType::Scalar(_)) => coerce_scalar_input(name, value),
        Some(MetaType::Enum(enum_type)) => match &value {
            Value::String(item) if enum_type.is_allowed(item) => Ok(value),
            _ => Err(format!("enumeration type \"{name}\" does not contain the value {value}")),
        },
        Some(MetaType::Object(_)) => Err(format!("\"{name}\" is not an input type")),
        None => Err(format!("unknown type \"{name}\"")),
    }
}

fn coerce_scalar_input(name: &str, value: Value) -> Result<Value, String> {
    match (name, &value) {
        (INT, Value::Number(number)) if number.as_i64().is_some_and(|n| i32::try_from(n).is_ok()) => Ok(value),
        (FLOAT, Value::Number(_)) | (STRING, Value::String(_)) | (BOOLEAN, Value::Bool(_)) | (ID, Value::String(_)) => {
            Ok(value)
        }
        (ID, Value::Number(number)) if number.is_i64() || number.is_u64() => Ok(Value::String(number.to_string())),
        (INT | FLOAT | STRING | BOOLEAN | ID, _) => Err(format!("expected type \"{name}\", found {value}")),
        // Custom scalars accept anything.
        _ => Ok(value),
    }
}

/// Coerces a resolved leaf value to the scalar it is declared as.
pub(crate) fn coerce_scalar_output(name: &str, value: Value) -> Result<Value, String> {
    match (name, &value) {
        (INT, Value::Number(number)) if number.as_i64().is_some_and(|n| i32::try_from(n).is_ok()) => Ok(value),
        (INT, Value::Number(number)) if number.is_i64() || number.is_u64() => {
            Err(format!("Int cannot represent non 32-bit signed integer value: {number}"))
        }
        (FLOAT, Value::Number(_)) | (STRING, Value::String(_)) | (BOOLEAN, Value::Bool(_)) | (ID, Value::String(_)) => {
            Ok(value)
        }
        (ID, Value::Number(number)) if number.is_i64() || number.is_u64() => Ok(Value::String(number.to_string())),
        (INT | FLOAT | STRING | BOOLEAN | ID, _) => Err(format!("{name} cannot represent value: {value}")),
        _ => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry.define_enum("CarTypes", ["Sedan", "SUV"]).unwrap();
        registry.define_scalar("JSON").unwrap();
        registry
    }

    #[test]
    fn inputs() {
        let registry = registry();
        let coerce = |ty: &str, value: Value| coerce_input(&registry, &MetaFieldType::from(ty), value);

        assert_eq!(coerce("CarTypes!", json!("SUV")), Ok(json!("SUV")));
        assert_eq!(
            coerce("CarTypes!", json!("Truck")),
            Err("enumeration type \"CarTypes\" does not contain the value \"Truck\"".into())
        );
        assert_eq!(coerce("ID!", json!(7)), Ok(json!("7")));
        assert_eq!(coerce("Int", json!(null)), Ok(json!(null)));
        assert!(coerce("Int!", json!(null)).is_err());
        assert!(coerce("Int", json!(3_000_000_000u64)).is_err());
        assert!(coerce("String", json!(4)).is_err());
        assert_eq!(coerce("[CarTypes!]", json!("Sedan")), Ok(json!(["Sedan"])));
        assert!(coerce("[CarTypes!]", json!(["Sedan", null])).is_err());
        assert_eq!(coerce("JSON", json!({"any": "thing"})), Ok(json!({"any": "thing"})));
    }

    #[test]
    fn outputs() {
        assert_eq!(coerce_scalar_output("Int", json!(5)), Ok(json!(5)));
        assert_eq!(coerce_scalar_output("Float", json!(5)), Ok(json!(5)));
        assert_eq!(coerce_scalar_output("ID", json!(5)), Ok(json!("5")));
        assert_eq!(
            coerce_scalar_output("Int", json!(1u64 << 40)),
            Err("Int cannot represent non 32-bit signed integer value: 1099511627776".into())
        );
        assert_eq!(
            coerce_scalar_output("Boolean", json!("yes")),
            Err("Boolean cannot represent value: \"yes\"".into())
        );
    }
}
