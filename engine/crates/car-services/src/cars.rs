//! The car service: cars, the parts they're built from and a feed of inserted cars.
//!
//! Root fields hand out store records. `Car` and `Part` fields then look their parent up in
//! the [`Store`] again by identifier, so a record coming from elsewhere (the `carAPI` data
//! source for instance) is completed from the store when the store knows it.

use engine::{
    Error, ErrorCode, FieldResolver, ResolverContext, ResolverResult, Schema, SchemaError, SubscriptionResolver,
};
use runtime::{fetch::Fetcher, pubsub::EventBroker};
use serde_json::Value;

use crate::store::{CarType, NewCar, Store};

pub const CARS_SDL: &str = r#"
enum CarTypes {
  Sedan
  SUV
  Coupe
  Hatchback
}

type Car {
  id: ID!
  brand: String!
  color: String!
  doors: Int!
  type: CarTypes!
  parts: [Part]
}

type Part {
  id: ID!
  name: String
  cars: [Car]
}

type Query {
  carsByType(type: CarTypes!): [Car]
  carById(id: ID!): Car
  partById(id: ID!): Part
  carAPI: Car
}

type Mutation {
  insertCar(brand: String!, color: String!, doors: Int!, type: CarTypes!): [Car]!
}

type Subscription {
  carInserted: Car
}
"#;

/// Topic every inserted car is published on.
pub const CAR_INSERTED: &str = "CAR_INSERTED";

/// Resource key of the record served by `carAPI`.
pub const CAR_DATA: &str = "carData";

const CAR_ATTRIBUTES: [&str; 5] = ["brand", "color", "doors", "type", "parts"];

/// Builds the car schema. Without a `fetcher`, `carAPI` fails with a field error.
pub fn schema(store: Store, broker: EventBroker, fetcher: Option<Fetcher>) -> Result<Schema, SchemaError> {
    let mut builder = Schema::build_from_sdl(CARS_SDL)?
        .resolver("Query", "carsByType", FieldResolver::from_fn(cars_by_type))
        .resolver("Query", "carById", FieldResolver::from_fn(car_by_id))
        .resolver("Query", "partById", FieldResolver::from_fn(part_by_id))
        .resolver("Query", "carAPI", FieldResolver::new(car_api))
        .resolver("Mutation", "insertCar", FieldResolver::from_fn(insert_car))
        .subscription("Subscription", "carInserted", SubscriptionResolver::new(car_inserted))
        .resolver("Part", "name", FieldResolver::from_fn(part_name))
        .resolver("Part", "cars", FieldResolver::from_fn(part_cars));

    for attribute in CAR_ATTRIBUTES {
        builder = builder.resolver("Car", attribute, FieldResolver::from_fn(car_attribute));
    }

    builder = builder.data(store).data(broker);
    if let Some(fetcher) = fetcher {
        builder = builder.data(fetcher);
    }

    builder.finish()
}

fn parent_id(ctx: &ResolverContext) -> Option<&str> {
    ctx.parent_attribute("id").and_then(Value::as_str)
}

fn cars_by_type(ctx: &ResolverContext) -> ResolverResult {
    let car_type = ctx.arg_as::<CarType>("type")?;
    let cars = ctx.data::<Store>()?.cars_by_type(car_type);

    Ok(serde_json::to_value(cars)?)
}

fn car_by_id(ctx: &ResolverContext) -> ResolverResult {
    let id = ctx.arg_as::<String>("id")?;

    Ok(serde_json::to_value(ctx.data::<Store>()?.car(&id))?)
}

fn part_by_id(ctx: &ResolverContext) -> ResolverResult {
    let id = ctx.arg_as::<String>("id")?;

    Ok(serde_json::to_value(ctx.data::<Store>()?.part(&id))?)
}

async fn car_api(ctx: ResolverContext) -> ResolverResult {
    let fetcher = ctx
        .data_opt::<Fetcher>()
        .ok_or_else(|| Error::new("No data source is configured").with_code(ErrorCode::FetchError))?;

    Ok(fetcher.fetch(CAR_DATA).await?)
}

fn insert_car(ctx: &ResolverContext) -> ResolverResult {
    let new_car = ctx.args_as::<NewCar>()?;
    let store = ctx.data::<Store>()?;
    let broker = ctx.data::<EventBroker>()?;

    let car = store.insert_car(new_car)?;

    // Listeners may query the store as soon as they see the event.
    let listeners = broker.publish(CAR_INSERTED, serde_json::to_value(&car)?);
    tracing::info!(id = %car.id, listeners, "published inserted car");

    Ok(serde_json::to_value(store.cars())?)
}

fn car_inserted(ctx: &ResolverContext) -> Result<runtime::pubsub::Listener<Value>, Error> {
    Ok(ctx.data::<EventBroker>()?.subscribe(CAR_INSERTED))
}

/// Re-derives a car attribute from the store. Cars the store doesn't know keep their own.
fn car_attribute(ctx: &ResolverContext) -> ResolverResult {
    let store = ctx.data::<Store>()?;

    match parent_id(ctx).and_then(|id| store.car(id)) {
        Some(car) => {
            let mut car = serde_json::to_value(car)?;
            Ok(car[ctx.field_name.as_str()].take())
        }
        None => ctx
            .parent_attribute(&ctx.field_name)
            .cloned()
            .ok_or_else(|| Error::unresolvable(&ctx.parent_type, &ctx.field_name)),
    }
}

/// `null` for parts the store doesn't know.
fn part_name(ctx: &ResolverContext) -> ResolverResult {
    let store = ctx.data::<Store>()?;
    let name = parent_id(ctx).and_then(|id| store.part(id)).and_then(|part| part.name);

    Ok(name.map(Value::String).unwrap_or_default())
}

/// The cars listing this part, `null` when none does.
fn part_cars(ctx: &ResolverContext) -> ResolverResult {
    let store = ctx.data::<Store>()?;
    let cars = parent_id(ctx).map(|id| store.cars_with_part(id)).unwrap_or_default();

    if cars.is_empty() {
        return Ok(Value::Null);
    }

    Ok(serde_json::to_value(cars)?)
}
