mod common;

use std::time::Duration;

use car_services::cars::CAR_INSERTED;
use common::{garage, INSERT_HONDA};
use futures_util::StreamExt;

#[tokio::test]
async fn inserted_cars_are_pushed_to_subscribers() {
    let garage = garage();

    let first = garage.schema.execute_stream("subscription { carInserted { brand type } }");
    let second = garage.schema.execute_stream("subscription { carInserted { color doors } }");
    assert_eq!(garage.broker.listener_count(CAR_INSERTED), 2);

    let response = garage.schema.execute(INSERT_HONDA).await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);

    let event = tokio::time::timeout(Duration::from_secs(5), first.take(1).collect::<Vec<_>>())
        .await
        .unwrap();
    insta::assert_json_snapshot!(event, @r###"
    [
      {
        "data": {
          "carInserted": {
            "brand": "Honda",
            "type": "SUV"
          }
        },
        "errors": []
      }
    ]
    "###);

    let event = tokio::time::timeout(Duration::from_secs(5), second.take(1).collect::<Vec<_>>())
        .await
        .unwrap();
    insta::assert_json_snapshot!(event, @r###"
    [
      {
        "data": {
          "carInserted": {
            "color": "Black",
            "doors": 4
          }
        },
        "errors": []
      }
    ]
    "###);
}

#[tokio::test]
async fn subscribers_see_the_inserted_car_in_the_store() {
    let garage = garage();
    let mut events = garage.schema.execute_stream("subscription { carInserted { id } }");

    garage.schema.execute(INSERT_HONDA).await;

    let event = tokio::time::timeout(Duration::from_secs(5), events.next())
        .await
        .unwrap()
        .unwrap();
    let id = event.data["carInserted"]["id"].as_str().unwrap();

    assert_eq!(garage.store.car(id).unwrap().brand, "Honda");
}

#[tokio::test]
async fn late_subscribers_miss_earlier_inserts() {
    let garage = garage();

    garage.schema.execute(INSERT_HONDA).await;
    let events = garage.schema.execute_stream("subscription { carInserted { brand } }");
    garage
        .schema
        .execute(r#"mutation { insertCar(brand: "Mazda", color: "Grey", doors: 2, type: Coupe) { id } }"#)
        .await;
    garage.broker.close_all();

    let brands = events
        .map(|response| response.data["carInserted"]["brand"].clone())
        .collect::<Vec<_>>()
        .await;

    assert_eq!(brands, ["Mazda"]);
}

#[tokio::test]
async fn inserting_without_subscribers_is_fine() {
    let garage = garage();

    let response = garage.schema.execute(INSERT_HONDA).await;

    assert!(response.errors.is_empty());
    assert_eq!(garage.broker.listener_count(CAR_INSERTED), 0);
}

#[tokio::test]
async fn dropping_the_stream_unsubscribes() {
    let garage = garage();

    let events = garage.schema.execute_stream("subscription { carInserted { id } }");
    assert_eq!(garage.broker.listener_count(CAR_INSERTED), 1);

    drop(events);
    assert_eq!(garage.broker.listener_count(CAR_INSERTED), 0);
}
