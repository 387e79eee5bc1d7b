use std::sync::Arc;

use async_graphql_parser::{
    types::{Directive, Field, Selection, SelectionSet},
    Positioned,
};
use async_graphql_value::{ConstValue, Value as AstValue};
use async_recursion::async_recursion;
use engine_registry::{MetaField, MetaFieldType, MetaType, Registry};
use indexmap::IndexMap;
use serde_json::Value;

use super::{coercion, PreparedOperation};
use crate::{
    resolver::EventStream, Data, Error, ErrorCode, Location, QueryPath, ResolverContext, ResolverTable, Response,
    ServerError,
};

/// Fields of one selection set grouped by response key, in request order.
type GroupedFields<'a> = IndexMap<&'a str, Vec<&'a Positioned<Field>>>;

pub(crate) struct ExecutionContext<'a> {
    pub registry: &'a Registry,
    pub resolvers: &'a ResolverTable,
    pub operation: &'a PreparedOperation,
    pub data: &'a Arc<Data>,
}

impl<'a> ExecutionContext<'a> {
    /// Resolves the root selection set, serially, depth-first and left to right.
    pub async fn execute(&self) -> Response {
        let mut errors = Vec::new();
        let root_type = self.operation.root_type.as_str();

        let data = self
            .resolve_selection_set(
                root_type,
                &Value::Null,
                &[&self.operation.definition.selection_set.node],
                &QueryPath::default(),
                &mut errors,
            )
            .await;

        Response { data, errors }
    }

    /// Starts the event stream of the subscription root field.
    pub fn subscribe(&self) -> Result<EventStream, ServerError> {
        let root_type = self.operation.root_type.as_str();
        let (response_key, field, meta_field) = self.subscription_root()?;
        let path = QueryPath::default().child(response_key);
        let location = Some(Location::from(field.pos));

        let args = self
            .arguments(meta_field, &field.node)
            .map_err(|error| error.into_server_error(path.clone(), location))?;

        let Some(resolver) = self.resolvers.lookup_subscription(root_type, &meta_field.name) else {
            let error = Error::new(format!("No subscription resolver is bound to `{root_type}.{}`", meta_field.name))
                .with_code(ErrorCode::UnresolvableField);
            return Err(error.into_server_error(path, location));
        };

        let ctx = ResolverContext {
            parent_type: root_type.to_string(),
            field_name: meta_field.name.clone(),
            parent: Value::Null,
            args,
            path: path.clone(),
            data: Arc::clone(self.data),
        };

        resolver.subscribe(&ctx).map_err(|error| error.into_server_error(path, location))
    }

    /// Completes one subscription event against the root field's selection set.
    pub async fn complete_event(&self, event: Value) -> Response {
        let (response_key, meta_field, fields) = match self.subscription_root() {
            Ok((response_key, _, meta_field)) => {
                let grouped = self.collect_root_fields();
                let fields = grouped.get(response_key).cloned().unwrap_or_default();
                (response_key, meta_field, fields)
            }
            Err(error) => return Response::from_errors(vec![error]),
        };

        let mut errors = Vec::new();
        let path = QueryPath::default().child(response_key);
        let value = self.complete_value(&meta_field.ty, event, &fields, &path, &mut errors).await;

        let mut data = serde_json::Map::new();
        data.insert(response_key.to_string(), value);

        Response {
            data: Value::Object(data),
            errors,
        }
    }

    fn collect_root_fields(&self) -> GroupedFields<'a> {
        let mut grouped = GroupedFields::new();
        self.collect_fields(
            &self.operation.root_type,
            &self.operation.definition.selection_set.node,
            &mut grouped,
            &mut Vec::new(),
        );
        grouped
    }

    fn subscription_root(&self) -> Result<(&'a str, &'a Positioned<Field>, &'a MetaField), ServerError> {
        let grouped = self.collect_root_fields();
        let root_type = self.operation.root_type.as_str();

        let Some((response_key, field)) = grouped
            .iter()
            .find_map(|(response_key, fields)| fields.first().map(|field| (*response_key, *field)))
        else {
            return Err(ServerError::new(
                "Subscription must select exactly one top level field.",
                ErrorCode::ValidationError,
            ));
        };

        let meta_field = self
            .registry
            .field(root_type, &field.node.name.node)
            .map_err(|err| ServerError::new(err.to_string(), ErrorCode::UnresolvableField))?;

        Ok((response_key, field, meta_field))
    }

    async fn resolve_selection_set(
        &self,
        type_name: &str,
        parent: &Value,
        selection_sets: &[&'a SelectionSet],
        path: &QueryPath,
        errors: &mut Vec<ServerError>,
    ) -> Value {
        let mut grouped = GroupedFields::new();
        for selection_set in selection_sets {
            self.collect_fields(type_name, selection_set, &mut grouped, &mut Vec::new());
        }

        let mut object = serde_json::Map::with_capacity(grouped.len());
        for (response_key, fields) in grouped {
            let value = self
                .resolve_field(type_name, parent, &fields, path.child(response_key), errors)
                .await;
            object.insert(response_key.to_string(), value);
        }

        Value::Object(object)
    }

    async fn resolve_field(
        &self,
        type_name: &str,
        parent: &Value,
        fields: &[&'a Positioned<Field>],
        path: QueryPath,
        errors: &mut Vec<ServerError>,
    ) -> Value {
        let Some(field) = fields.first() else {
            return Value::Null;
        };
        let field_name = field.node.name.node.as_str();
        let location = Some(Location::from(field.pos));

        if field_name == "__typename" {
            return Value::String(type_name.to_string());
        }

        let meta_field = match self.registry.field(type_name, field_name) {
            Ok(meta_field) => meta_field,
            Err(err) => {
                let error = Error::new(err.to_string()).with_code(ErrorCode::UnresolvableField);
                errors.push(error.into_server_error(path, location));
                return Value::Null;
            }
        };

        let args = match self.arguments(meta_field, &field.node) {
            Ok(args) => args,
            Err(error) => {
                errors.push(error.into_server_error(path, location));
                return Value::Null;
            }
        };

        tracing::trace!(%path, "resolving {type_name}.{field_name}");

        let ctx = ResolverContext {
            parent_type: type_name.to_string(),
            field_name: field_name.to_string(),
            parent: parent.clone(),
            args,
            path: path.clone(),
            data: Arc::clone(self.data),
        };

        match self.resolvers.lookup(type_name, field_name).resolve(ctx).await {
            Ok(value) => self.complete_value(&meta_field.ty, value, fields, &path, errors).await,
            Err(error) => {
                tracing::warn!(%path, code = %error.code, "field resolution failed: {}", error.message);
                errors.push(error.into_server_error(path, location));
                Value::Null
            }
        }
    }

    /// Shapes a resolved value after its declared type. Failures are local: the value becomes
    /// `null` and an error is recorded, siblings and other list elements are unaffected.
    #[async_recursion]
    async fn complete_value(
        &self,
        ty: &MetaFieldType,
        value: Value,
        fields: &[&'a Positioned<Field>],
        path: &QueryPath,
        errors: &mut Vec<ServerError>,
    ) -> Value {
        let location = fields.first().map(|field| Location::from(field.pos));

        if value.is_null() {
            if ty.is_non_null() {
                let error = Error::new(format!(
                    "An error occurred while fetching `{path}`, a non-nullable value was expected but no value was found."
                ))
                .with_code(ErrorCode::NonNullViolation);
                errors.push(error.into_server_error(path.clone(), location));
            }
            return Value::Null;
        }

        if let Some(item_ty) = ty.list_item_type() {
            let Value::Array(items) = value else {
                let error = Error::new(format!("Expected a list for `{path}`, found {value}"))
                    .with_code(ErrorCode::InvalidValue);
                errors.push(error.into_server_error(path.clone(), location));
                return Value::Null;
            };

            let mut completed = Vec::with_capacity(items.len());
            for (index, item) in items.into_iter().enumerate() {
                let item_path = path.child(index);
                completed.push(self.complete_value(&item_ty, item, fields, &item_path, errors).await);
            }
            return Value::Array(completed);
        }

        let type_name = ty.base_type_name();
        let result = match self.registry.lookup_type(type_name) {
            Some(MetaType::Scalar(_)) => coercion::coerce_scalar_output(type_name, value),
            Some(MetaType::Enum(enum_type)) => match value {
                Value::String(item) if enum_type.is_allowed(&item) => Ok(Value::String(item)),
                value => Err(format!("Enum \"{type_name}\" cannot represent value: {value}")),
            },
            Some(MetaType::Object(_)) => {
                let selection_sets = fields
                    .iter()
                    .map(|field| &field.node.selection_set.node)
                    .collect::<Vec<_>>();
                Ok(self
                    .resolve_selection_set(type_name, &value, &selection_sets, path, errors)
                    .await)
            }
            None => Err(format!("Unknown type \"{type_name}\"")),
        };

        result.unwrap_or_else(|message| {
            let error = Error::new(message).with_code(ErrorCode::InvalidValue);
            errors.push(error.into_server_error(path.clone(), location));
            Value::Null
        })
    }

    /// Expands fragments and applies `@skip`/`@include`, grouping fields by response key.
    fn collect_fields(
        &self,
        type_name: &str,
        selection_set: &'a SelectionSet,
        grouped: &mut GroupedFields<'a>,
        fragments_stack: &mut Vec<&'a str>,
    ) {
        for selection in &selection_set.items {
            match &selection.node {
                Selection::Field(field) => {
                    if self.is_included(&field.node.directives) {
                        let response_key = field.node.response_key().node.as_str();
                        grouped.entry(response_key).or_default().push(field);
                    }
                }
                Selection::FragmentSpread(spread) => {
                    let name = spread.node.fragment_name.node.as_str();
                    if !self.is_included(&spread.node.directives) || fragments_stack.contains(&name) {
                        continue;
                    }
                    let Some(fragment) = self.operation.fragments.get(name) else {
                        continue;
                    };
                    if fragment.node.type_condition.node.on.node.as_str() != type_name {
                        continue;
                    }
                    fragments_stack.push(name);
                    self.collect_fields(type_name, &fragment.node.selection_set.node, grouped, fragments_stack);
                    fragments_stack.pop();
                }
                Selection::InlineFragment(fragment) => {
                    let applies = fragment
                        .node
                        .type_condition
                        .as_ref()
                        .is_none_or(|condition| condition.node.on.node.as_str() == type_name);
                    if applies && self.is_included(&fragment.node.directives) {
                        self.collect_fields(type_name, &fragment.node.selection_set.node, grouped, fragments_stack);
                    }
                }
            }
        }
    }

    fn is_included(&self, directives: &[Positioned<Directive>]) -> bool {
        directives.iter().all(|directive| {
            let condition = directive
                .node
                .arguments
                .iter()
                .find(|(name, _)| name.node.as_str() == "if")
                .map(|(_, value)| self.evaluate_condition(&value.node))
                .unwrap_or_default();

            match directive.node.name.node.as_str() {
                "skip" => !condition,
                "include" => condition,
                _ => true,
            }
        })
    }

    fn evaluate_condition(&self, value: &AstValue) -> bool {
        match value {
            AstValue::Boolean(condition) => *condition,
            AstValue::Variable(name) => self
                .operation
                .variables
                .get(name.as_str())
                .and_then(Value::as_bool)
                .unwrap_or_default(),
            _ => false,
        }
    }

    /// Argument values of a field: variables substituted, defaults applied and coerced to their
    /// declared types. Absent optional arguments are left out.
    pub fn arguments(&self, meta_field: &MetaField, field: &Field) -> Result<serde_json::Map<String, Value>, Error> {
        let mut args = serde_json::Map::new();

        for argument in meta_field.args.values() {
            let supplied = field
                .arguments
                .iter()
                .find(|(name, _)| name.node.as_str() == argument.name)
                .map(|(_, value)| &value.node)
                .filter(|value| match value {
                    // A variable that wasn't provided counts as an absent argument.
                    AstValue::Variable(name) => self.operation.variables.contains_key(name.as_str()),
                    _ => true,
                });

            let value = match (supplied, &argument.default_value) {
                (Some(value), _) => self.evaluate(value)?,
                (None, Some(default_value)) => default_value.clone().into_json()?,
                (None, None) => continue,
            };

            let value = coercion::coerce_input(self.registry, &argument.ty, value).map_err(|reason| {
                Error::new(format!("Invalid value for argument \"{}\": {reason}", argument.name))
                    .with_code(ErrorCode::InvalidValue)
            })?;

            args.insert(argument.name.clone(), value);
        }

        Ok(args)
    }

    fn evaluate(&self, value: &AstValue) -> Result<Value, Error> {
        let value = value.clone().into_const_with(|name| match self.operation.variables.get(name.as_str()) {
            Some(value) => ConstValue::from_json(value.clone()),
            None => Ok(ConstValue::Null),
        })?;

        Ok(value.into_json()?)
    }
}
