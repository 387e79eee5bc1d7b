#![allow(dead_code)]

use car_services::{cars, Store};
use engine::Schema;
use runtime::{fetch::Fetcher, pubsub::EventBroker};

pub struct Garage {
    pub schema: Schema,
    pub store: Store,
    pub broker: EventBroker,
}

pub fn garage() -> Garage {
    garage_with_fetcher(None)
}

pub fn garage_with_fetcher(fetcher: Option<Fetcher>) -> Garage {
    let store = Store::reference();
    let broker = EventBroker::new();
    let schema = cars::schema(store.clone(), broker.clone(), fetcher).unwrap();

    Garage { schema, store, broker }
}

pub const INSERT_HONDA: &str = r#"
    mutation {
        insertCar(brand: "Honda", color: "Black", doors: 4, type: SUV) { id brand }
    }
"#;
