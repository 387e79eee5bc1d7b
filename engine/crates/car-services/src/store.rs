//! The in-memory car and part collections.
//!
//! A [`Store`] is a shared handle: clones see the same records. Cars and parts reference each
//! other by identifier, and a part referenced by a car lists that car back whenever both are
//! known to the store.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid seed: {0}")]
    InvalidSeed(#[from] serde_json::Error),
    #[error("car `{0}` is declared more than once")]
    DuplicateCar(String),
    #[error("part `{0}` is declared more than once")]
    DuplicatePart(String),
    #[error("car `{car}` and part `{part}` don't reference each other")]
    InconsistentRelationship { car: String, part: String },
    #[error("no car identifier left for the current millisecond")]
    IdentifiersExhausted(#[from] ulid::MonotonicError),
}

impl From<StoreError> for engine::Error {
    fn from(error: StoreError) -> Self {
        engine::Error::new(error.to_string())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::AsRefStr,
)]
pub enum CarType {
    Sedan,
    #[serde(rename = "SUV")]
    #[strum(serialize = "SUV")]
    Suv,
    Coupe,
    Hatchback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Reference {
    pub id: String,
}

impl From<&str> for Reference {
    fn from(id: &str) -> Self {
        Reference { id: id.to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Car {
    pub id: String,
    pub brand: String,
    pub color: String,
    pub doors: u32,
    #[serde(rename = "type")]
    pub car_type: CarType,
    #[serde(default)]
    pub parts: Vec<Reference>,
}

impl Car {
    fn has_part(&self, part_id: &str) -> bool {
        self.parts.iter().any(|part| part.id == part_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Part {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub cars: Vec<Reference>,
}

impl Part {
    fn has_car(&self, car_id: &str) -> bool {
        self.cars.iter().any(|car| car.id == car_id)
    }
}

/// The attributes of a car to insert. The store assigns the identifier.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewCar {
    pub brand: String,
    pub color: String,
    pub doors: u32,
    #[serde(rename = "type")]
    pub car_type: CarType,
}

/// Initial contents of a store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Seed {
    pub cars: Vec<Car>,
    pub parts: Vec<Part>,
}

impl Seed {
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The records every garage starts with unless told otherwise. Car `b` references part
    /// `3`, which the seed doesn't declare.
    pub fn reference() -> Self {
        let car = |id: &str, brand: &str, color: &str, doors, car_type, parts: &[&str]| Car {
            id: id.into(),
            brand: brand.into(),
            color: color.into(),
            doors,
            car_type,
            parts: parts.iter().copied().map(Reference::from).collect(),
        };
        let part = |id: &str, name: &str, cars: &[&str]| Part {
            id: id.into(),
            name: Some(name.into()),
            cars: cars.iter().copied().map(Reference::from).collect(),
        };

        Seed {
            cars: vec![
                car("a", "Ford", "Blue", 4, CarType::Sedan, &["1", "2"]),
                car("b", "Tesla", "Red", 4, CarType::Suv, &["1", "3"]),
                car("c", "Toyota", "White", 4, CarType::Coupe, &[]),
                car("d", "Toyota", "Red", 5, CarType::Coupe, &[]),
            ],
            parts: vec![
                part("1", "Transmission", &["a", "b"]),
                part("2", "Suspension", &["a"]),
            ],
        }
    }

    fn check(&self) -> Result<(), StoreError> {
        for (position, car) in self.cars.iter().enumerate() {
            if self.cars[..position].iter().any(|other| other.id == car.id) {
                return Err(StoreError::DuplicateCar(car.id.clone()));
            }
        }

        for (position, part) in self.parts.iter().enumerate() {
            if self.parts[..position].iter().any(|other| other.id == part.id) {
                return Err(StoreError::DuplicatePart(part.id.clone()));
            }
        }

        for car in &self.cars {
            for part in &self.parts {
                if car.has_part(&part.id) != part.has_car(&car.id) {
                    return Err(StoreError::InconsistentRelationship {
                        car: car.id.clone(),
                        part: part.id.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}

struct Inventory {
    cars: Vec<Car>,
    parts: Vec<Part>,
    ids: ulid::Generator,
}

/// Shared handle to the car and part collections. Cheap to clone.
#[derive(Clone)]
pub struct Store {
    inner: Arc<RwLock<Inventory>>,
}

impl Store {
    /// Bulk loads a store, checking identifiers are unique and relationships symmetric.
    pub fn from_seed(seed: Seed) -> Result<Self, StoreError> {
        seed.check()?;
        Ok(Self::new(seed))
    }

    /// A store holding the [reference seed](Seed::reference).
    pub fn reference() -> Self {
        Self::new(Seed::reference())
    }

    fn new(Seed { cars, parts }: Seed) -> Self {
        Store {
            inner: Arc::new(RwLock::new(Inventory {
                cars,
                parts,
                ids: ulid::Generator::new(),
            })),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Inventory> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inventory> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every car, in insertion order.
    pub fn cars(&self) -> Vec<Car> {
        self.read().cars.clone()
    }

    pub fn car(&self, id: &str) -> Option<Car> {
        self.read().cars.iter().find(|car| car.id == id).cloned()
    }

    pub fn cars_by_type(&self, car_type: CarType) -> Vec<Car> {
        self.read()
            .cars
            .iter()
            .filter(|car| car.car_type == car_type)
            .cloned()
            .collect()
    }

    /// The cars referencing part `part_id`, whether or not the part itself is known.
    pub fn cars_with_part(&self, part_id: &str) -> Vec<Car> {
        self.read()
            .cars
            .iter()
            .filter(|car| car.has_part(part_id))
            .cloned()
            .collect()
    }

    pub fn part(&self, id: &str) -> Option<Part> {
        self.read().parts.iter().find(|part| part.id == id).cloned()
    }

    pub fn parts(&self) -> Vec<Part> {
        self.read().parts.clone()
    }

    /// Assigns a fresh identifier to `new_car` and appends it, as one step.
    pub fn insert_car(&self, new_car: NewCar) -> Result<Car, StoreError> {
        let mut inventory = self.write();
        let id = inventory.ids.generate()?.to_string();

        let NewCar {
            brand,
            color,
            doors,
            car_type,
        } = new_car;
        let car = Car {
            id,
            brand,
            color,
            doors,
            car_type,
            parts: Vec::new(),
        };
        inventory.cars.push(car.clone());
        let count = inventory.cars.len();
        drop(inventory);

        tracing::info!(id = %car.id, brand = %car.brand, %car_type, count, "car inserted");

        Ok(car)
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inventory = self.read();
        f.debug_struct("Store")
            .field("cars", &inventory.cars.len())
            .field("parts", &inventory.parts.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use indoc::indoc;

    use super::*;

    fn honda() -> NewCar {
        NewCar {
            brand: "Honda".into(),
            color: "Black".into(),
            doors: 4,
            car_type: CarType::Suv,
        }
    }

    #[test]
    fn the_reference_seed_is_consistent() {
        let store = Store::from_seed(Seed::reference()).unwrap();

        let coupes = store.cars_by_type(CarType::Coupe);
        assert_eq!(coupes.iter().map(|car| car.id.as_str()).collect::<Vec<_>>(), ["c", "d"]);
        assert_eq!(store.car("b").unwrap().brand, "Tesla");
        assert_eq!(store.part("2").unwrap().name.as_deref(), Some("Suspension"));
        assert_eq!(store.part("3"), None);
    }

    #[test]
    fn cars_with_part_searches_the_inverse_collection() {
        let store = Store::reference();
        let ids = |part| {
            store
                .cars_with_part(part)
                .into_iter()
                .map(|car| car.id)
                .collect::<Vec<_>>()
        };

        assert_eq!(ids("1"), ["a", "b"]);
        assert_eq!(ids("2"), ["a"]);
        assert_eq!(ids("3"), ["b"]);
        assert!(ids("4").is_empty());
    }

    #[test]
    fn inserted_cars_come_last() {
        let store = Store::reference();
        let car = store.insert_car(honda()).unwrap();

        assert_eq!(car.car_type, CarType::Suv);
        assert!(car.parts.is_empty());
        assert_eq!(store.cars().last(), Some(&car));
        assert_eq!(store.car(&car.id), Some(car.clone()));

        let suvs = store.cars_by_type(CarType::Suv);
        assert_eq!(suvs.iter().map(|car| car.brand.as_str()).collect::<Vec<_>>(), ["Tesla", "Honda"]);
    }

    #[test]
    fn clones_share_records() {
        let store = Store::reference();
        let clone = store.clone();
        let car = clone.insert_car(honda()).unwrap();

        assert_eq!(store.car(&car.id), Some(car));
        assert_eq!(format!("{store:?}"), "Store { cars: 5, parts: 2 }");
    }

    #[test]
    fn concurrent_inserts_get_distinct_identifiers() {
        let store = Store::from_seed(Seed::default()).unwrap();

        let handles = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    (0..50)
                        .map(|_| store.insert_car(honda()).unwrap().id)
                        .collect::<Vec<_>>()
                })
            })
            .collect::<Vec<_>>();

        let ids = handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect::<HashSet<_>>();

        assert_eq!(ids.len(), 400);
        assert_eq!(store.cars().len(), 400);
    }

    #[test]
    fn seeds_are_read_from_json() {
        let seed = Seed::from_json(indoc! {r#"
            {
                "cars": [
                    {"id": "x", "brand": "Honda", "color": "Black", "doors": 4, "type": "SUV", "parts": [{"id": "p"}]}
                ],
                "parts": [
                    {"id": "p", "name": "Brakes", "cars": [{"id": "x"}]}
                ]
            }
        "#})
        .unwrap();

        let store = Store::from_seed(seed).unwrap();
        assert_eq!(store.car("x").unwrap().car_type, CarType::Suv);
        assert_eq!(store.parts().len(), 1);

        assert_eq!(Seed::from_json("{}").unwrap(), Seed::default());
    }

    #[test]
    fn invalid_seeds_are_rejected() {
        let error = Seed::from_json(r#"{"cars": [{"id": "x", "brand": "Honda", "color": "Black", "doors": 4, "type": "Truck"}]}"#)
            .unwrap_err();
        assert!(matches!(error, StoreError::InvalidSeed(_)), "{error}");

        assert!(Seed::from_json(r#"{"trucks": []}"#).is_err());

        let mut seed = Seed::reference();
        seed.cars.push(seed.cars[0].clone());
        assert_eq!(Store::from_seed(seed).unwrap_err().to_string(), "car `a` is declared more than once");

        let mut seed = Seed::reference();
        seed.parts[1].cars.push(Reference::from("b"));
        assert_eq!(
            Store::from_seed(seed).unwrap_err().to_string(),
            "car `b` and part `2` don't reference each other"
        );
    }

    #[test]
    fn car_types_print_like_the_schema_enum() {
        assert_eq!(CarType::Suv.to_string(), "SUV");
        assert_eq!(CarType::Hatchback.as_ref(), "Hatchback");
        assert_eq!(serde_json::to_value(CarType::Suv).unwrap(), "SUV");
    }
}
