use std::{any::Any, sync::Arc};

use engine_registry::{OperationType, Registry, RegistryError};
use futures_util::{
    future,
    stream::{self, BoxStream},
    StreamExt,
};
use tracing::Instrument;

use crate::{
    executor::{self, ExecutionContext, Phase, PreparedOperation},
    Data, ErrorCode, FieldResolver, Request, ResolverTable, ResolverTableError, Response, ServerError,
    SubscriptionResolver,
};

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Resolvers(#[from] ResolverTableError),
}

struct SchemaInner {
    registry: Registry,
    resolvers: ResolverTable,
    data: Data,
}

/// A registry bound to its resolvers and shared context. Cheap to clone.
#[derive(Clone)]
pub struct Schema(Arc<SchemaInner>);

impl std::fmt::Debug for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field("query_type", &self.0.registry.query_type)
            .field("types", &self.0.registry.types.len())
            .finish_non_exhaustive()
    }
}

impl Schema {
    pub fn build(registry: Registry) -> SchemaBuilder {
        SchemaBuilder {
            registry,
            resolvers: ResolverTable::new(),
            data: Data::default(),
            error: None,
        }
    }

    pub fn build_from_sdl(sdl: &str) -> Result<SchemaBuilder, SchemaError> {
        Ok(Self::build(Registry::from_sdl(sdl)?))
    }

    pub fn registry(&self) -> &Registry {
        &self.0.registry
    }

    pub fn sdl(&self) -> String {
        self.0.registry.export_sdl()
    }

    /// Combines two schemas into one addressable namespace.
    ///
    /// Registries and resolver tables are merged with their own conflict rules. When both
    /// schemas carry data of the same type, `self` wins.
    pub fn merge(&self, other: &Schema) -> Result<Schema, SchemaError> {
        let registry = self.0.registry.merge(&other.0.registry)?;
        let resolvers = self.0.resolvers.merge(&other.0.resolvers)?;
        let mut data = self.0.data.clone();
        data.merge_missing(&other.0.data);

        Ok(Schema(Arc::new(SchemaInner {
            registry,
            resolvers,
            data,
        })))
    }

    /// Runs a query or a mutation to completion.
    pub async fn execute(&self, request: impl Into<Request>) -> Response {
        let request = request.into();
        let span = operation_span(&request);

        async move {
            let operation = match executor::prepare(&self.0.registry, &request) {
                Ok(operation) => operation,
                Err(response) => return response,
            };

            if operation.ty == OperationType::Subscription {
                executor::enter(Phase::Failed);
                return Response::from_errors(vec![ServerError::new(
                    "Subscriptions must be executed as a stream.",
                    ErrorCode::ValidationError,
                )]);
            }

            let data = self.operation_data(request.data);
            self.execute_prepared(&operation, &data).await
        }
        .instrument(span)
        .await
    }

    /// Runs any operation, yielding one response per subscription event, or a single response
    /// for queries and mutations.
    ///
    /// Subscriptions start listening before this returns. Dropping the stream releases them.
    pub fn execute_stream(&self, request: impl Into<Request>) -> BoxStream<'static, Response> {
        let request = request.into();
        let span = operation_span(&request);
        let _guard = span.enter();

        let operation = match executor::prepare(&self.0.registry, &request) {
            Ok(operation) => operation,
            Err(response) => return stream::once(future::ready(response)).boxed(),
        };
        let data = Arc::new(self.operation_data(request.data));
        let schema = self.clone();

        if operation.ty != OperationType::Subscription {
            let execution = async move { schema.execute_prepared(&operation, &data).await };
            return stream::once(execution.instrument(span.clone())).boxed();
        }

        let ctx = ExecutionContext {
            registry: &self.0.registry,
            resolvers: &self.0.resolvers,
            operation: &operation,
            data: &data,
        };

        let events = match ctx.subscribe() {
            Ok(events) => events,
            Err(error) => {
                executor::enter(Phase::Failed);
                return stream::once(future::ready(Response::from_errors(vec![error]))).boxed();
            }
        };
        executor::enter(Phase::Executing);

        let operation = Arc::new(operation);
        let event_span = span.clone();
        events
            .then(move |event| {
                let schema = schema.clone();
                let operation = Arc::clone(&operation);
                let data = Arc::clone(&data);
                async move {
                    let ctx = ExecutionContext {
                        registry: &schema.0.registry,
                        resolvers: &schema.0.resolvers,
                        operation: &operation,
                        data: &data,
                    };
                    ctx.complete_event(event).await
                }
                .instrument(event_span.clone())
            })
            .boxed()
    }

    async fn execute_prepared(&self, operation: &PreparedOperation, data: &Arc<Data>) -> Response {
        executor::enter(Phase::Executing);

        let response = ExecutionContext {
            registry: &self.0.registry,
            resolvers: &self.0.resolvers,
            operation,
            data,
        }
        .execute()
        .await;

        tracing::debug!(errors = response.errors.len(), "operation executed");
        executor::enter(Phase::Completed);

        response
    }

    /// Schema data overridden by request data.
    fn operation_data(&self, request_data: Data) -> Arc<Data> {
        let mut data = self.0.data.clone();
        data.merge(request_data);
        Arc::new(data)
    }
}

fn operation_span(request: &Request) -> tracing::Span {
    tracing::info_span!(
        "operation",
        name = request.operation_name.as_deref().unwrap_or_default()
    )
}

/// Binds resolvers and shared context to a registry.
pub struct SchemaBuilder {
    registry: Registry,
    resolvers: ResolverTable,
    data: Data,
    error: Option<ResolverTableError>,
}

impl SchemaBuilder {
    /// Binds the resolver of `type_name.field_name`.
    #[must_use]
    pub fn resolver(mut self, type_name: &str, field_name: &str, resolver: FieldResolver) -> Self {
        if self.error.is_none() {
            self.error = self.resolvers.bind(type_name, field_name, resolver).err();
        }
        self
    }

    /// Binds the event source of a subscription root field.
    #[must_use]
    pub fn subscription(mut self, type_name: &str, field_name: &str, resolver: SubscriptionResolver) -> Self {
        if self.error.is_none() {
            self.error = self.resolvers.bind_subscription(type_name, field_name, resolver).err();
        }
        self
    }

    /// Adds shared context data available to every resolver.
    #[must_use]
    pub fn data<D: Any + Send + Sync>(mut self, data: D) -> Self {
        self.data.insert(data);
        self
    }

    /// Checks every binding refers to a declared field.
    pub fn finish(self) -> Result<Schema, SchemaError> {
        if let Some(error) = self.error {
            return Err(error.into());
        }

        if let Some((type_name, field_name)) = self
            .resolvers
            .bindings()
            .find(|(type_name, field_name)| self.registry.field(type_name, field_name).is_err())
        {
            return Err(ResolverTableError::UnknownField {
                type_name: type_name.to_string(),
                field_name: field_name.to_string(),
            }
            .into());
        }

        Ok(Schema(Arc::new(SchemaInner {
            registry: self.registry,
            resolvers: self.resolvers,
            data: self.data,
        })))
    }
}
