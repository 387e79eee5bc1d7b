/// Errors raised while a registry is being built or combined.
///
/// None of these can happen while an operation executes: a registry that was built
/// successfully stays valid for its whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("type `{0}` is already defined")]
    DuplicateType(String),
    #[error("field `{field_name}` is declared more than once on type `{type_name}`")]
    DuplicateField { type_name: String, field_name: String },
    #[error("value `{value}` is declared more than once on enum `{enum_name}`")]
    DuplicateEnumValue { enum_name: String, value: String },
    #[error("type `{0}` is defined by both schemas")]
    SchemaConflict(String),
    #[error("root field `{type_name}.{field_name}` is defined by both schemas")]
    FieldConflict { type_name: String, field_name: String },
    #[error("type `{type_name}` has no field named `{field_name}`")]
    UnknownField { type_name: String, field_name: String },
    #[error("unknown type `{0}`")]
    UnknownType(String),
    #[error("schema syntax error: {0}")]
    Syntax(String),
    #[error("unsupported definition: {0}")]
    UnsupportedDefinition(String),
}
