//! Schema bound execution of operations.
//!
//! A [`Schema`] couples a [`Registry`] with a [`ResolverTable`] and shared [`Data`]. Operations
//! are parsed, validated against the registry and then executed by dispatching every requested
//! field to its resolver. Responses always have the `{data, errors}` shape.

mod context;
mod error;
mod executor;
mod path;
mod request;
mod resolver;
mod response;
mod schema;

pub use context::{Data, ResolverContext};
pub use engine_registry::{self as registry, Registry};
pub use error::{Error, ErrorCode, ErrorExtensions, Location, ServerError};
pub use path::{PathSegment, QueryPath};
pub use request::{Request, Variables};
pub use resolver::{EventStream, FieldResolver, ResolverResult, ResolverTable, ResolverTableError, SubscriptionResolver};
pub use response::Response;
pub use schema::{Schema, SchemaBuilder, SchemaError};
