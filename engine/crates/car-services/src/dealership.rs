//! The dealership service, served next to the car service.

use engine::{FieldResolver, Schema, SchemaError};
use serde_json::json;

pub const DEALERSHIP_SDL: &str = r#"
type Dealership {
  name: String
  city: String
}

type Query {
  dealership: Dealership
}
"#;

pub fn schema() -> Result<Schema, SchemaError> {
    Schema::build_from_sdl(DEALERSHIP_SDL)?
        .resolver(
            "Query",
            "dealership",
            FieldResolver::from_fn(|_| Ok(json!({"name": "Honda", "city": "Calgary"}))),
        )
        .finish()
}
