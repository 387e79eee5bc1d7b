mod common;

use common::{schema, Dealer};
use engine::{ErrorCode, Request};
use indoc::indoc;
use serde_json::json;

#[tokio::test]
async fn nested_fields_with_arguments() {
    let response = schema().execute(r#"{ car(id: "2") { id brand fuel doors } }"#).await;

    insta::assert_json_snapshot!(response, @r###"
    {
      "data": {
        "car": {
          "id": "2",
          "brand": "Tesla",
          "fuel": "ELECTRIC",
          "doors": 4
        }
      },
      "errors": []
    }
    "###);
}

#[tokio::test]
async fn list_elements_fail_independently() {
    let response = schema().execute("{ cars { id fuel owner } }").await;

    insta::assert_json_snapshot!(response, { ".errors[].locations" => "[locations]" }, @r###"
    {
      "data": {
        "cars": [
          {
            "id": "1",
            "fuel": "PETROL",
            "owner": "Ann"
          },
          {
            "id": "2",
            "fuel": "ELECTRIC",
            "owner": null
          },
          {
            "id": "3",
            "fuel": null,
            "owner": "Bob"
          }
        ]
      },
      "errors": [
        {
          "message": "An error occurred while fetching `cars.1.owner`, a non-nullable value was expected but no value was found.",
          "locations": "[locations]",
          "path": [
            "cars",
            1,
            "owner"
          ],
          "extensions": {
            "code": "NON_NULL_VIOLATION"
          }
        },
        {
          "message": "Enum \"Fuel\" cannot represent value: \"DIESEL\"",
          "locations": "[locations]",
          "path": [
            "cars",
            2,
            "fuel"
          ],
          "extensions": {
            "code": "INVALID_VALUE"
          }
        }
      ]
    }
    "###);
}

#[tokio::test]
async fn failing_fields_leave_their_siblings_alone() {
    let response = schema()
        .execute(r#"{ failing version car(id: "1") { brand } }"#)
        .await;

    assert_eq!(
        response.data,
        json!({"failing": null, "version": null, "car": {"brand": "Ford"}})
    );

    let errors = response
        .errors
        .iter()
        .map(|error| (error.code(), error.path.to_string()))
        .collect::<Vec<_>>();
    assert_eq!(
        errors,
        [
            (ErrorCode::ResolverError, "failing".to_string()),
            (ErrorCode::NonNullViolation, "version".to_string())
        ]
    );
    assert_eq!(response.errors[0].message, "resolver failed");
}

#[tokio::test]
async fn unbound_fields_without_attribute_are_unresolvable() {
    let response = schema().execute(r#"{ car(id: "3") { brand tags } }"#).await;

    assert_eq!(response.data, json!({"car": {"brand": "Toyota", "tags": null}}));
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].code(), ErrorCode::UnresolvableField);
    assert_eq!(response.errors[0].path.to_string(), "car.tags");
}

#[tokio::test]
async fn aliases_fragments_and_directives() {
    let request = Request::new(indoc! {r#"
        query Garage($withDoors: Boolean = false, $fuel: Fuel) {
            electric: cars(fuel: $fuel) {
                ...CarFields
                doors @include(if: $withDoors)
            }
            first: car(id: 1) {
                __typename
                ... on Car {
                    brand
                }
                owner @skip(if: true)
            }
        }

        fragment CarFields on Car {
            id
            brand
        }
    "#})
    .variables(serde_json::from_value(json!({"fuel": "ELECTRIC"})).unwrap());

    let response = schema().execute(request).await;

    insta::assert_json_snapshot!(response, @r###"
    {
      "data": {
        "electric": [
          {
            "id": "2",
            "brand": "Tesla"
          }
        ],
        "first": {
          "__typename": "Car",
          "brand": "Ford"
        }
      },
      "errors": []
    }
    "###);
}

#[tokio::test]
async fn default_argument_values_apply() {
    let response = schema()
        .execute("query Cars($first: Int) { cars(first: $first) { id } }")
        .await;

    assert_eq!(
        response.data,
        json!({"cars": [{"id": "1"}, {"id": "2"}, {"id": "3"}]})
    );

    let request = Request::new("query Cars($first: Int) { cars(first: $first) { id } }")
        .variables(serde_json::from_value(json!({"first": 1})).unwrap());
    let response = schema().execute(request).await;
    assert_eq!(response.data, json!({"cars": [{"id": "1"}]}));
}

#[tokio::test]
async fn request_data_overrides_schema_data() {
    let response = schema().execute("{ dealer }").await;
    assert_eq!(response.data, json!({"dealer": "Honda"}));

    let response = schema()
        .execute(Request::new("{ dealer }").data(Dealer("Toyota")))
        .await;
    assert_eq!(response.data, json!({"dealer": "Toyota"}));
}

#[tokio::test]
async fn mutations() {
    let response = schema()
        .execute(r#"mutation { rename(id: "1", brand: "Lincoln") { id brand } }"#)
        .await;

    assert!(response.is_ok(), "{:?}", response.errors);
    assert_eq!(response.data, json!({"rename": {"id": "1", "brand": "Lincoln"}}));
}

#[tokio::test]
async fn fields_are_resolved_in_request_order() {
    let response = schema()
        .execute(r#"{ version: car(id: "2") { brand id } car(id: "1") { id } }"#)
        .await;

    let keys = response.data.as_object().unwrap().keys().collect::<Vec<_>>();
    assert_eq!(keys, ["version", "car"]);
    let keys = response.data["version"].as_object().unwrap().keys().collect::<Vec<_>>();
    assert_eq!(keys, ["brand", "id"]);
}
