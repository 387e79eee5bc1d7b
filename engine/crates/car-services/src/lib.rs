//! The garage: a car service and a dealership service sharing one schema.
//!
//! [`garage_schema`] wires a [`Store`], an [`EventBroker`] and an optional data source
//! [`Fetcher`] into the car schema and merges the dealership schema into it.

pub mod cars;
pub mod dealership;
mod store;

use engine::{Schema, SchemaError};
use runtime::{fetch::Fetcher, pubsub::EventBroker};

pub use store::{Car, CarType, NewCar, Part, Reference, Seed, Store, StoreError};

/// The schema served by the garage. The dealership schema is merged in when `dealership` is
/// set.
pub fn garage_schema(
    store: Store,
    broker: EventBroker,
    fetcher: Option<Fetcher>,
    dealership: bool,
) -> Result<Schema, SchemaError> {
    let schema = cars::schema(store, broker, fetcher)?;

    if !dealership {
        return Ok(schema);
    }

    let merged = schema.merge(&dealership::schema()?)?;
    tracing::debug!(types = merged.registry().types.len(), "merged the dealership schema");

    Ok(merged)
}
