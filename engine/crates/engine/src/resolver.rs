//! The dispatch table from `(type, field)` to the function producing the field's value.

use std::{collections::HashMap, future::Future, sync::Arc};

use futures_util::{
    future::{self, BoxFuture},
    stream::BoxStream,
    FutureExt, Stream, StreamExt,
};
use serde_json::Value;

use crate::{Error, ResolverContext};

pub type ResolverResult = Result<Value, Error>;

/// Produces the value of one field.
#[derive(Clone)]
pub struct FieldResolver(Arc<dyn Fn(ResolverContext) -> BoxFuture<'static, ResolverResult> + Send + Sync>);

impl FieldResolver {
    pub fn new<F, Fut>(resolver: F) -> Self
    where
        F: Fn(ResolverContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ResolverResult> + Send + 'static,
    {
        FieldResolver(Arc::new(move |ctx| resolver(ctx).boxed()))
    }

    /// A resolver that doesn't need to await anything.
    pub fn from_fn<F>(resolver: F) -> Self
    where
        F: Fn(&ResolverContext) -> ResolverResult + Send + Sync + 'static,
    {
        FieldResolver(Arc::new(move |ctx| future::ready(resolver(&ctx)).boxed()))
    }

    /// Reads `parent[field_name]`. Used for every field without an explicit binding.
    pub fn parent_attribute() -> Self {
        Self::from_fn(|ctx| {
            ctx.parent_attribute(&ctx.field_name)
                .cloned()
                .ok_or_else(|| Error::unresolvable(&ctx.parent_type, &ctx.field_name))
        })
    }

    pub async fn resolve(&self, ctx: ResolverContext) -> ResolverResult {
        (self.0)(ctx).await
    }
}

impl std::fmt::Debug for FieldResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FieldResolver")
    }
}

pub type EventStream = BoxStream<'static, Value>;

/// Produces the events of a subscription root field. Every event is completed against the
/// subscription's selection set like a query result.
#[derive(Clone)]
pub struct SubscriptionResolver(Arc<dyn Fn(&ResolverContext) -> Result<EventStream, Error> + Send + Sync>);

impl SubscriptionResolver {
    pub fn new<F, S>(resolver: F) -> Self
    where
        F: Fn(&ResolverContext) -> Result<S, Error> + Send + Sync + 'static,
        S: Stream<Item = Value> + Send + 'static,
    {
        SubscriptionResolver(Arc::new(move |ctx| resolver(ctx).map(|stream| stream.boxed())))
    }

    pub fn subscribe(&self, ctx: &ResolverContext) -> Result<EventStream, Error> {
        (self.0)(ctx)
    }
}

impl std::fmt::Debug for SubscriptionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SubscriptionResolver")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolverTableError {
    #[error("a resolver is already bound to `{type_name}.{field_name}`")]
    DuplicateResolver { type_name: String, field_name: String },
    #[error("a resolver is bound to `{type_name}.{field_name}` which the schema doesn't declare")]
    UnknownField { type_name: String, field_name: String },
}

#[derive(Debug, Clone)]
enum Binding {
    Field(FieldResolver),
    Subscription(SubscriptionResolver),
}

/// At most one resolver per `(type, field)` pair.
#[derive(Debug, Clone)]
pub struct ResolverTable {
    bindings: HashMap<String, HashMap<String, Binding>>,
    fallback: FieldResolver,
}

impl Default for ResolverTable {
    fn default() -> Self {
        ResolverTable {
            bindings: HashMap::new(),
            fallback: FieldResolver::parent_attribute(),
        }
    }
}

impl ResolverTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, type_name: &str, field_name: &str, resolver: FieldResolver) -> Result<(), ResolverTableError> {
        self.insert(type_name, field_name, Binding::Field(resolver))
    }

    pub fn bind_subscription(
        &mut self,
        type_name: &str,
        field_name: &str,
        resolver: SubscriptionResolver,
    ) -> Result<(), ResolverTableError> {
        self.insert(type_name, field_name, Binding::Subscription(resolver))
    }

    /// The resolver bound to `type_name.field_name`, or the parent attribute reader when the
    /// field is unbound.
    pub fn lookup(&self, type_name: &str, field_name: &str) -> &FieldResolver {
        match self.binding(type_name, field_name) {
            Some(Binding::Field(resolver)) => resolver,
            _ => &self.fallback,
        }
    }

    pub fn lookup_subscription(&self, type_name: &str, field_name: &str) -> Option<&SubscriptionResolver> {
        match self.binding(type_name, field_name) {
            Some(Binding::Subscription(resolver)) => Some(resolver),
            _ => None,
        }
    }

    pub fn is_bound(&self, type_name: &str, field_name: &str) -> bool {
        self.binding(type_name, field_name).is_some()
    }

    /// Every bound `(type, field)` pair.
    pub fn bindings(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.bindings.iter().flat_map(|(type_name, fields)| {
            fields
                .keys()
                .map(move |field_name| (type_name.as_str(), field_name.as_str()))
        })
    }

    /// Unions two tables. Both binding the same pair is a [`ResolverTableError::DuplicateResolver`].
    pub fn merge(&self, other: &ResolverTable) -> Result<ResolverTable, ResolverTableError> {
        let mut merged = self.clone();

        for (type_name, fields) in &other.bindings {
            for (field_name, binding) in fields {
                merged.insert(type_name, field_name, binding.clone())?;
            }
        }

        Ok(merged)
    }

    fn binding(&self, type_name: &str, field_name: &str) -> Option<&Binding> {
        self.bindings.get(type_name).and_then(|fields| fields.get(field_name))
    }

    fn insert(&mut self, type_name: &str, field_name: &str, binding: Binding) -> Result<(), ResolverTableError> {
        let fields = self.bindings.entry(type_name.to_string()).or_default();

        if fields.contains_key(field_name) {
            return Err(ResolverTableError::DuplicateResolver {
                type_name: type_name.to_string(),
                field_name: field_name.to_string(),
            });
        }

        fields.insert(field_name.to_string(), binding);
        Ok(())
    }
}
