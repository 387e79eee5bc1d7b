use std::collections::{HashMap, HashSet};

use async_graphql_parser::{
    types::{Directive, Field, FragmentDefinition, FragmentSpread, OperationType, Selection, SelectionSet, VariableDefinition},
    Pos, Positioned,
};
use async_graphql_value::{ConstValue, Name, Value as AstValue};
use engine_registry::{MetaField, MetaFieldType, Registry};

use super::{coercion::coerce_input, parse::ParsedOperation, PreparedOperation};
use crate::{ErrorCode, ServerError, Variables};

#[derive(thiserror::Error, Debug)]
pub(crate) enum ValidationError {
    #[error("Schema is not configured for {0}s.")]
    UnsupportedOperationType(OperationType),
    #[error("Cannot query field \"{name}\" on type \"{container}\".")]
    UnknownField { container: String, name: String },
    #[error("Unknown argument \"{name}\" on field \"{field}\".")]
    UnknownArgument { field: String, name: String },
    #[error("Field \"{field}\" argument \"{name}\" of type \"{ty}\" is required but not provided.")]
    MissingArgument { field: String, name: String, ty: String },
    #[error("Invalid value for argument \"{name}\" of field \"{field}\": {reason}.")]
    InvalidArgument { field: String, name: String, reason: String },
    #[error("Field \"{name}\" must not have a selection since type \"{ty}\" has no subfields.")]
    CannotHaveSelectionSet { name: String, ty: String },
    #[error("Field \"{name}\" of type \"{ty}\" must have a selection of subfields.")]
    MissingSelectionSet { name: String, ty: String },
    #[error("Unknown fragment \"{0}\".")]
    UnknownFragment(String),
    #[error("Cannot spread fragment \"{0}\" within itself.")]
    FragmentCycle(String),
    #[error("Unknown type \"{0}\".")]
    UnknownType(String),
    #[error("Fragment cannot be spread here as objects of type \"{parent}\" can never be of type \"{condition}\".")]
    InvalidTypeCondition { parent: String, condition: String },
    #[error("Variable \"${0}\" is not defined.")]
    UndefinedVariable(String),
    #[error("Variable \"${name}\" cannot be of non-input type \"{ty}\".")]
    NonInputVariable { name: String, ty: String },
    #[error("Variable \"${name}\" of required type \"{ty}\" was not provided.")]
    MissingVariable { name: String, ty: String },
    #[error("Variable \"${name}\" got invalid value: {reason}.")]
    InvalidVariable { name: String, reason: String },
    #[error("Unknown directive \"@{0}\".")]
    UnknownDirective(String),
    #[error("Directive \"@{0}\" argument \"if\" of type \"Boolean!\" is required but not provided.")]
    MissingDirectiveArgument(String),
    #[error("Invalid value for argument \"if\" of directive \"@{name}\": {reason}.")]
    InvalidDirectiveArgument { name: String, reason: String },
    #[error("Subscription must select exactly one top level field, found {0}.")]
    SubscriptionRootFields(usize),
}

impl ValidationError {
    fn at(self, pos: Pos) -> ServerError {
        ServerError::new(self.to_string(), ErrorCode::ValidationError).with_location(pos)
    }
}

/// Checks the parsed operation against the registry and coerces the variables.
///
/// Every violation is reported, not only the first one.
pub(crate) fn validate(
    registry: &Registry,
    operation: ParsedOperation,
    variables: &Variables,
) -> Result<PreparedOperation, Vec<ServerError>> {
    let ty = operation.definition.ty;
    let Some(root_type) = registry.root_type_name(ty) else {
        return Err(vec![
            ValidationError::UnsupportedOperationType(ty).at(operation.definition.selection_set.pos)
        ]);
    };

    let mut visitor = Visitor {
        registry,
        fragments: &operation.fragments,
        defined_variables: HashSet::new(),
        invalid_variables: HashSet::new(),
        variables: Variables::new(),
        fragments_stack: Vec::new(),
        visited_fragments: HashSet::new(),
        errors: Vec::new(),
    };

    visitor.visit_variable_definitions(&operation.definition.variable_definitions, variables);

    if ty == OperationType::Subscription {
        let count = visitor.count_root_fields(&operation.definition.selection_set.node, &mut Vec::new());
        if count != 1 {
            visitor
                .errors
                .push(ValidationError::SubscriptionRootFields(count).at(operation.definition.selection_set.pos));
        }
    }

    visitor.visit_selection_set(root_type, &operation.definition.selection_set);

    let Visitor { errors, variables, .. } = visitor;
    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(PreparedOperation {
        name: operation.name,
        ty,
        root_type: root_type.to_string(),
        definition: operation.definition,
        fragments: operation.fragments,
        variables,
    })
}

struct Visitor<'a> {
    registry: &'a Registry,
    fragments: &'a HashMap<Name, Positioned<FragmentDefinition>>,
    defined_variables: HashSet<&'a str>,
    invalid_variables: HashSet<&'a str>,
    variables: Variables,
    fragments_stack: Vec<&'a str>,
    visited_fragments: HashSet<&'a str>,
    errors: Vec<ServerError>,
}

impl<'a> Visitor<'a> {
    fn visit_variable_definitions(&mut self, definitions: &'a [Positioned<VariableDefinition>], values: &Variables) {
        for definition in definitions {
            let name = definition.node.name.node.as_str();
            let ty = MetaFieldType::from(&definition.node.var_type.node);
            self.defined_variables.insert(name);

            let is_input = match self.registry.lookup_type(ty.base_type_name()) {
                Some(input_type) => input_type.is_leaf(),
                None => {
                    self.invalid_variables.insert(name);
                    let error = ValidationError::UnknownType(ty.base_type_name().to_string());
                    self.errors.push(error.at(definition.node.var_type.pos));
                    continue;
                }
            };

            if !is_input {
                self.invalid_variables.insert(name);
                let error = ValidationError::NonInputVariable {
                    name: name.to_string(),
                    ty: ty.to_string(),
                };
                self.errors.push(error.at(definition.pos));
                continue;
            }

            let value = match (values.get(name), &definition.node.default_value) {
                (Some(value), _) => value.clone(),
                (None, Some(default_value)) => match default_value.node.clone().into_json() {
                    Ok(value) => value,
                    Err(err) => {
                        self.reject_variable(name, err.to_string(), definition.pos);
                        continue;
                    }
                },
                (None, None) if ty.is_non_null() => {
                    self.invalid_variables.insert(name);
                    let error = ValidationError::MissingVariable {
                        name: name.to_string(),
                        ty: ty.to_string(),
                    };
                    self.errors.push(error.at(definition.pos));
                    continue;
                }
                // Absent nullable variables stay undefined.
                (None, None) => continue,
            };

            match coerce_input(self.registry, &ty, value) {
                Ok(value) => {
                    self.variables.insert(name.to_string(), value);
                }
                Err(reason) => self.reject_variable(name, reason, definition.pos),
            }
        }
    }

    fn reject_variable(&mut self, name: &'a str, reason: String, pos: Pos) {
        self.invalid_variables.insert(name);
        let error = ValidationError::InvalidVariable {
            name: name.to_string(),
            reason,
        };
        self.errors.push(error.at(pos));
    }

    fn count_root_fields(&self, selection_set: &'a SelectionSet, stack: &mut Vec<&'a str>) -> usize {
        selection_set
            .items
            .iter()
            .map(|selection| match &selection.node {
                Selection::Field(_) => 1,
                Selection::InlineFragment(fragment) => self.count_root_fields(&fragment.node.selection_set.node, stack),
                Selection::FragmentSpread(spread) => {
                    let name = spread.node.fragment_name.node.as_str();
                    match self.fragments.get(name) {
                        Some(fragment) if !stack.contains(&name) => {
                            stack.push(name);
                            let count = self.count_root_fields(&fragment.node.selection_set.node, stack);
                            stack.pop();
                            count
                        }
                        _ => 0,
                    }
                }
            })
            .sum()
    }

    fn visit_selection_set(&mut self, type_name: &'a str, selection_set: &'a Positioned<SelectionSet>) {
        for selection in &selection_set.node.items {
            match &selection.node {
                Selection::Field(field) => {
                    self.visit_directives(&field.node.directives);
                    self.visit_field(type_name, field);
                }
                Selection::FragmentSpread(spread) => {
                    self.visit_directives(&spread.node.directives);
                    self.visit_fragment_spread(type_name, spread);
                }
                Selection::InlineFragment(fragment) => {
                    self.visit_directives(&fragment.node.directives);
                    if let Some(type_condition) = &fragment.node.type_condition {
                        if !self.check_type_condition(type_name, &type_condition.node.on) {
                            continue;
                        }
                    }
                    self.visit_selection_set(type_name, &fragment.node.selection_set);
                }
            }
        }
    }

    fn visit_fragment_spread(&mut self, type_name: &'a str, spread: &'a Positioned<FragmentSpread>) {
        let name = spread.node.fragment_name.node.as_str();
        let Some(fragment) = self.fragments.get(name) else {
            self.errors
                .push(ValidationError::UnknownFragment(name.to_string()).at(spread.pos));
            return;
        };

        if self.fragments_stack.contains(&name) {
            self.errors
                .push(ValidationError::FragmentCycle(name.to_string()).at(spread.pos));
            return;
        }

        if !self.check_type_condition(type_name, &fragment.node.type_condition.node.on) {
            return;
        }

        // Every spread that got here selects on the same object type, so the content needs
        // to be checked once.
        if !self.visited_fragments.insert(name) {
            return;
        }

        self.fragments_stack.push(name);
        self.visit_selection_set(type_name, &fragment.node.selection_set);
        self.fragments_stack.pop();
    }

    fn check_type_condition(&mut self, type_name: &str, condition: &Positioned<Name>) -> bool {
        if self.registry.lookup_type(&condition.node).is_none() {
            self.errors
                .push(ValidationError::UnknownType(condition.node.to_string()).at(condition.pos));
            return false;
        }

        if condition.node.as_str() != type_name {
            let error = ValidationError::InvalidTypeCondition {
                parent: type_name.to_string(),
                condition: condition.node.to_string(),
            };
            self.errors.push(error.at(condition.pos));
            return false;
        }

        true
    }

    fn visit_field(&mut self, type_name: &'a str, field: &'a Positioned<Field>) {
        let name = field.node.name.node.as_str();
        let has_selection_set = !field.node.selection_set.node.items.is_empty();

        if name == "__typename" {
            if has_selection_set {
                let error = ValidationError::CannotHaveSelectionSet {
                    name: name.to_string(),
                    ty: "String!".to_string(),
                };
                self.errors.push(error.at(field.pos));
            }
            return;
        }

        let Ok(meta_field) = self.registry.field(type_name, name) else {
            let error = ValidationError::UnknownField {
                container: type_name.to_string(),
                name: name.to_string(),
            };
            self.errors.push(error.at(field.node.name.pos));
            return;
        };

        self.visit_arguments(type_name, meta_field, field);

        let base_type = meta_field.ty.base_type_name();
        match self.registry.lookup_type(base_type) {
            Some(ty) if ty.is_leaf() && has_selection_set => {
                let error = ValidationError::CannotHaveSelectionSet {
                    name: name.to_string(),
                    ty: meta_field.ty.to_string(),
                };
                self.errors.push(error.at(field.pos));
            }
            Some(ty) if !ty.is_leaf() && !has_selection_set => {
                let error = ValidationError::MissingSelectionSet {
                    name: name.to_string(),
                    ty: meta_field.ty.to_string(),
                };
                self.errors.push(error.at(field.pos));
            }
            Some(ty) if !ty.is_leaf() => self.visit_selection_set(base_type, &field.node.selection_set),
            // Registries never reference undeclared types.
            _ => {}
        }
    }

    fn visit_arguments(&mut self, type_name: &str, meta_field: &'a MetaField, field: &'a Positioned<Field>) {
        let field_coordinate = format!("{type_name}.{}", meta_field.name);

        for (name, value) in &field.node.arguments {
            let Some(argument) = meta_field.args.get(name.node.as_str()) else {
                let error = ValidationError::UnknownArgument {
                    field: field_coordinate.clone(),
                    name: name.node.to_string(),
                };
                self.errors.push(error.at(name.pos));
                continue;
            };

            if let Some(reason) = self.check_input_value(&argument.ty, value) {
                let error = ValidationError::InvalidArgument {
                    field: field_coordinate.clone(),
                    name: name.node.to_string(),
                    reason,
                };
                self.errors.push(error.at(value.pos));
            }
        }

        let missing = meta_field.args.values().filter(|argument| {
            argument.is_required()
                && !field
                    .node
                    .arguments
                    .iter()
                    .any(|(name, _)| name.node.as_str() == argument.name)
        });

        for argument in missing {
            let error = ValidationError::MissingArgument {
                field: field_coordinate.clone(),
                name: argument.name.clone(),
                ty: argument.ty.to_string(),
            };
            self.errors.push(error.at(field.pos));
        }
    }

    fn visit_directives(&mut self, directives: &'a [Positioned<Directive>]) {
        for directive in directives {
            let name = directive.node.name.node.as_str();
            if name != "skip" && name != "include" {
                self.errors
                    .push(ValidationError::UnknownDirective(name.to_string()).at(directive.pos));
                continue;
            }

            let condition = directive
                .node
                .arguments
                .iter()
                .find(|(argument, _)| argument.node.as_str() == "if");

            let Some((_, value)) = condition else {
                self.errors
                    .push(ValidationError::MissingDirectiveArgument(name.to_string()).at(directive.pos));
                continue;
            };

            if let Some(reason) = self.check_input_value(&MetaFieldType::from("Boolean!"), value) {
                let error = ValidationError::InvalidDirectiveArgument {
                    name: name.to_string(),
                    reason,
                };
                self.errors.push(error.at(value.pos));
            }
        }
    }

    /// Returns why `value` doesn't fit `ty`, if it doesn't. Undefined variables are reported on
    /// the way, values depending on a variable that was already rejected are not checked again.
    fn check_input_value(&mut self, ty: &MetaFieldType, value: &Positioned<AstValue>) -> Option<String> {
        let mut undefined = Vec::new();
        let mut depends_on_invalid = false;

        let resolved = value.node.clone().into_const_with(|name| {
            if let Some(value) = self.variables.get(name.as_str()) {
                return ConstValue::from_json(value.clone());
            }
            if self.invalid_variables.contains(name.as_str()) {
                depends_on_invalid = true;
            } else if !self.defined_variables.contains(name.as_str()) {
                undefined.push(name);
            }
            Ok(ConstValue::Null)
        });

        let has_undefined = !undefined.is_empty();
        for name in undefined {
            self.errors
                .push(ValidationError::UndefinedVariable(name.to_string()).at(value.pos));
        }

        if depends_on_invalid || has_undefined {
            return None;
        }

        let value = match resolved.and_then(ConstValue::into_json) {
            Ok(value) => value,
            Err(err) => return Some(err.to_string()),
        };

        coerce_input(self.registry, ty, value).err()
    }
}
