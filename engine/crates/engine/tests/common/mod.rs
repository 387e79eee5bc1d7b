#![allow(dead_code)]

use engine::{Error, FieldResolver, Schema};
use indoc::indoc;
use serde_json::{json, Value};

pub const SDL: &str = indoc! {r#"
    enum Fuel {
        PETROL
        ELECTRIC
    }

    type Car {
        id: ID!
        brand: String!
        fuel: Fuel
        doors: Int
        owner: String!
        tags: [String!]
    }

    type Query {
        car(id: ID!): Car
        cars(fuel: Fuel, first: Int = 10): [Car]
        dealer: String
        failing: String
        version: String!
    }

    type Mutation {
        rename(id: ID!, brand: String!): Car
    }
"#};

#[derive(Debug, Clone, PartialEq)]
pub struct Dealer(pub &'static str);

pub fn cars() -> Vec<Value> {
    vec![
        json!({"id": "1", "brand": "Ford", "fuel": "PETROL", "doors": 4, "owner": "Ann", "tags": ["blue"]}),
        json!({"id": "2", "brand": "Tesla", "fuel": "ELECTRIC", "doors": 4, "owner": null, "tags": []}),
        json!({"id": "3", "brand": "Toyota", "fuel": "DIESEL", "doors": 5, "owner": "Bob"}),
    ]
}

fn find_car(id: &str) -> Value {
    cars().into_iter().find(|car| car["id"] == id).unwrap_or(Value::Null)
}

pub fn schema() -> Schema {
    Schema::build_from_sdl(SDL)
        .unwrap()
        .resolver(
            "Query",
            "car",
            FieldResolver::from_fn(|ctx| Ok(find_car(&ctx.arg_as::<String>("id")?))),
        )
        .resolver(
            "Query",
            "cars",
            FieldResolver::new(|ctx| async move {
                let fuel = ctx.arg_as::<Option<String>>("fuel")?;
                let first = ctx.arg_as::<usize>("first")?;
                let cars = cars()
                    .into_iter()
                    .filter(|car| fuel.as_ref().is_none_or(|fuel| car["fuel"] == fuel.as_str()))
                    .take(first)
                    .collect();
                Ok(Value::Array(cars))
            }),
        )
        .resolver(
            "Query",
            "dealer",
            FieldResolver::from_fn(|ctx| Ok(json!(ctx.data::<Dealer>()?.0))),
        )
        .resolver(
            "Query",
            "failing",
            FieldResolver::from_fn(|_| Err(Error::new("resolver failed"))),
        )
        .resolver("Query", "version", FieldResolver::from_fn(|_| Ok(Value::Null)))
        .resolver(
            "Mutation",
            "rename",
            FieldResolver::from_fn(|ctx| {
                let mut car = find_car(&ctx.arg_as::<String>("id")?);
                if let Some(car) = car.as_object_mut() {
                    car.insert("brand".into(), ctx.arg("brand").cloned().unwrap_or_default());
                }
                Ok(car)
            }),
        )
        .data(Dealer("Honda"))
        .finish()
        .unwrap()
}
