//! Ingestion of SDL documents into a [`Registry`].

use async_graphql_parser::types as ast;

use crate::{MetaField, MetaInputValue, Registry, RegistryError};

impl Registry {
    /// Builds a registry from an SDL document.
    ///
    /// Object types, enums and custom scalars are supported, as well as `extend type` and a
    /// `schema { ... }` definition renaming the root types.
    pub fn from_sdl(sdl: &str) -> Result<Registry, RegistryError> {
        let document = async_graphql_parser::parse_schema(sdl).map_err(|err| RegistryError::Syntax(err.to_string()))?;

        let mut registry = Registry::new();
        let mut extensions = Vec::new();

        for definition in &document.definitions {
            match definition {
                ast::TypeSystemDefinition::Type(definition) if definition.node.extend => {
                    extensions.push(&definition.node);
                }
                ast::TypeSystemDefinition::Type(definition) => ingest_type(&mut registry, &definition.node)?,
                ast::TypeSystemDefinition::Schema(schema) => ingest_schema_definition(&mut registry, &schema.node),
                ast::TypeSystemDefinition::Directive(directive) => {
                    return Err(RegistryError::UnsupportedDefinition(format!(
                        "directive `@{}`",
                        directive.node.name.node
                    )));
                }
            }
        }

        // Extensions may come before the type they extend.
        for definition in extensions {
            let ast::TypeKind::Object(object) = &definition.kind else {
                return Err(unsupported(definition));
            };
            let fields = object.fields.iter().map(|field| ingest_field(&field.node));
            let fields = fields.collect::<Result<Vec<_>, _>>()?;
            registry.extend_type(&definition.name.node, fields)?;
        }

        registry.check_references()?;

        Ok(registry)
    }
}

fn ingest_schema_definition(registry: &mut Registry, schema: &ast::SchemaDefinition) {
    if let Some(query) = &schema.query {
        registry.query_type = query.node.to_string();
    }

    if let Some(mutation) = &schema.mutation {
        registry.mutation_type = Some(mutation.node.to_string());
    }

    if let Some(subscription) = &schema.subscription {
        registry.subscription_type = Some(subscription.node.to_string());
    }
}

fn ingest_type(registry: &mut Registry, definition: &ast::TypeDefinition) -> Result<(), RegistryError> {
    let name = definition.name.node.as_str();

    match &definition.kind {
        ast::TypeKind::Scalar => registry.define_scalar(name)?,
        ast::TypeKind::Enum(enum_type) => {
            let values = enum_type.values.iter().map(|value| value.node.value.node.to_string());
            registry.define_enum(name, values)?;
        }
        ast::TypeKind::Object(object) => {
            let fields = object.fields.iter().map(|field| ingest_field(&field.node));
            registry.define_type(name, fields.collect::<Result<Vec<_>, _>>()?)?;
        }
        ast::TypeKind::Interface(_) | ast::TypeKind::Union(_) | ast::TypeKind::InputObject(_) => {
            return Err(unsupported(definition));
        }
    }

    if let Some(description) = &definition.description {
        set_description(registry, name, &description.node);
    }

    Ok(())
}

fn set_description(registry: &mut Registry, name: &str, description: &str) {
    let slot = match registry.types.get_mut(name) {
        Some(crate::MetaType::Scalar(scalar)) => &mut scalar.description,
        Some(crate::MetaType::Object(object)) => &mut object.description,
        Some(crate::MetaType::Enum(enum_type)) => &mut enum_type.description,
        None => return,
    };
    *slot = Some(description.to_string());
}

fn ingest_field(field: &ast::FieldDefinition) -> Result<MetaField, RegistryError> {
    let mut meta_field = MetaField::new(field.name.node.as_str(), &field.ty.node);
    meta_field.description = field.description.as_ref().map(|description| description.node.clone());

    for argument in &field.arguments {
        let argument = &argument.node;
        let mut input_value = MetaInputValue::new(argument.name.node.as_str(), &argument.ty.node);
        input_value.default_value = argument.default_value.as_ref().map(|value| value.node.clone());

        if meta_field.args.contains_key(&input_value.name) {
            return Err(RegistryError::DuplicateField {
                type_name: format!("{}(...)", meta_field.name),
                field_name: input_value.name,
            });
        }
        meta_field = meta_field.with_argument(input_value);
    }

    Ok(meta_field)
}

fn unsupported(definition: &ast::TypeDefinition) -> RegistryError {
    let kind = match definition.kind {
        ast::TypeKind::Scalar => "scalar",
        ast::TypeKind::Object(_) => "object",
        ast::TypeKind::Interface(_) => "interface",
        ast::TypeKind::Union(_) => "union",
        ast::TypeKind::Enum(_) => "enum",
        ast::TypeKind::InputObject(_) => "input object",
    };
    let verb = if definition.extend { "extension of " } else { "" };

    RegistryError::UnsupportedDefinition(format!("{verb}{kind} `{}`", definition.name.node))
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use crate::{MetaType, OperationType, Registry, RegistryError};

    #[test]
    fn car_schema() {
        let registry = Registry::from_sdl(indoc! {r#"
            enum CarTypes {
                Sedan
                SUV
                Coupe
                Hatchback
            }

            "A car on the lot"
            type Car {
                id: ID!
                brand: String!
                color: String!
                doors: Int!
                type: CarTypes!
            }

            type Query {
                carByType(type: CarTypes!): [Car]
                carById(id: ID!): Car
            }

            type Mutation {
                insertCar(brand: String!, color: String!, doors: Int! = 4, type: CarTypes!): [Car]!
            }
        "#})
        .unwrap();

        let Some(MetaType::Enum(car_types)) = registry.lookup_type("CarTypes") else {
            unreachable!("CarTypes is an enum")
        };
        assert_eq!(
            car_types.values.iter().collect::<Vec<_>>(),
            ["Sedan", "SUV", "Coupe", "Hatchback"]
        );

        let car = registry.object("Car").unwrap();
        assert_eq!(car.description.as_deref(), Some("A car on the lot"));
        assert_eq!(car.fields.keys().collect::<Vec<_>>(), ["id", "brand", "color", "doors", "type"]);

        let insert_car = registry.field("Mutation", "insertCar").unwrap();
        assert_eq!(insert_car.ty.as_str(), "[Car]!");
        assert!(insert_car.args["brand"].is_required());
        assert!(!insert_car.args["doors"].is_required());
        assert_eq!(registry.root_type_name(OperationType::Mutation), Some("Mutation"));
        assert_eq!(registry.root_type_name(OperationType::Subscription), None);
    }

    #[test]
    fn extensions_are_applied_after_definitions() {
        let registry = Registry::from_sdl(indoc! {r#"
            extend type Query {
                dealership: Dealership
            }

            type Dealership {
                name: String
            }

            type Query {
                dealerships: [Dealership]
            }
        "#})
        .unwrap();

        let fields = registry.object("Query").unwrap().fields.keys().collect::<Vec<_>>();
        assert_eq!(fields, ["dealerships", "dealership"]);
    }

    #[test]
    fn schema_definition_renames_roots() {
        let registry = Registry::from_sdl(indoc! {r#"
            schema {
                query: Root
                mutation: Writes
            }

            type Root {
                ping: String
            }

            type Writes {
                pong: String
            }
        "#})
        .unwrap();

        assert_eq!(registry.root_type_name(OperationType::Query), Some("Root"));
        assert_eq!(registry.root_type_name(OperationType::Mutation), Some("Writes"));
    }

    #[test]
    fn syntax_errors() {
        let error = Registry::from_sdl("type Car {").unwrap_err();
        assert!(matches!(error, RegistryError::Syntax(_)), "{error:?}");
    }

    #[test]
    fn unsupported_definitions() {
        let error = Registry::from_sdl("union Vehicle = Car | Truck").unwrap_err();
        assert_eq!(error, RegistryError::UnsupportedDefinition("union `Vehicle`".into()));

        let error = Registry::from_sdl("input NewCar { brand: String }").unwrap_err();
        assert_eq!(error, RegistryError::UnsupportedDefinition("input object `NewCar`".into()));
    }

    #[test]
    fn unknown_types() {
        let error = Registry::from_sdl("type Query { truck: Truck }").unwrap_err();
        assert_eq!(error, RegistryError::UnknownType("Truck".into()));

        let error = Registry::from_sdl("type Query { car(kind: Kind): String }").unwrap_err();
        assert_eq!(error, RegistryError::UnknownType("Kind".into()));
    }

    #[test]
    fn duplicate_types() {
        let error = Registry::from_sdl("type Car { id: ID } enum Car { A }").unwrap_err();
        assert_eq!(error, RegistryError::DuplicateType("Car".into()));
    }
}
