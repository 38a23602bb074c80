//! Tests for the SQLite store: whole-table save semantics and
//! bounding-box query behavior.

use geoip_heatmap::{BoundingBox, Location};

#[path = "helpers.rs"]
mod helpers;

use helpers::{create_test_store, table_of};

const WORLD: BoundingBox = BoundingBox {
    north: 90.0,
    south: -90.0,
    east: 180.0,
    west: -180.0,
};

fn location(latitude: f64, longitude: f64) -> Location {
    Location { latitude, longitude }
}

#[tokio::test]
async fn save_then_query_round_trips_exact_quantities() {
    let (_dir, store) = create_test_store().await;

    store
        .save(&table_of(&[(40.0, -74.0, 128.0), (50.0, -80.0, 10.0)]))
        .await
        .expect("save failed");

    let result = store.query(&WORLD).await.expect("query failed");
    assert_eq!(result.len(), 2);
    assert_eq!(result.get(&location(40.0, -74.0)), Some(128.0));
    assert_eq!(result.get(&location(50.0, -80.0)), Some(10.0));
}

#[tokio::test]
async fn save_replaces_the_previous_table_wholesale() {
    let (_dir, store) = create_test_store().await;

    store
        .save(&table_of(&[(40.0, -74.0, 128.0), (50.0, -80.0, 10.0)]))
        .await
        .expect("first save failed");
    store
        .save(&table_of(&[(10.0, 10.0, 1.0)]))
        .await
        .expect("second save failed");

    let result = store.query(&WORLD).await.expect("query failed");
    assert_eq!(result.len(), 1);
    assert_eq!(result.get(&location(10.0, 10.0)), Some(1.0));
}

#[tokio::test]
async fn saving_an_empty_table_clears_the_store() {
    let (_dir, store) = create_test_store().await;

    store
        .save(&table_of(&[(40.0, -74.0, 128.0)]))
        .await
        .expect("save failed");
    store.save(&table_of(&[])).await.expect("clearing save failed");

    let result = store.query(&WORLD).await.expect("query failed");
    assert!(result.is_empty());
}

#[tokio::test]
async fn query_filters_latitude_inclusively_on_both_ends() {
    let (_dir, store) = create_test_store().await;

    store
        .save(&table_of(&[
            (39.0, -74.0, 1.0),
            (41.0, -74.0, 2.0),
            (41.5, -74.0, 4.0),
            (38.5, -74.0, 8.0),
        ]))
        .await
        .expect("save failed");

    let bounds = BoundingBox {
        north: 41.0,
        south: 39.0,
        east: -73.0,
        west: -75.0,
    };
    let result = store.query(&bounds).await.expect("query failed");
    assert_eq!(result.len(), 2);
    assert_eq!(result.get(&location(39.0, -74.0)), Some(1.0));
    assert_eq!(result.get(&location(41.0, -74.0)), Some(2.0));
}

#[tokio::test]
async fn query_longitude_interval_is_half_open() {
    let (_dir, store) = create_test_store().await;

    store
        .save(&table_of(&[
            (40.0, -75.0, 1.0), // on the west edge: excluded
            (40.0, -73.0, 2.0), // on the east edge: included
            (40.0, -74.0, 4.0),
        ]))
        .await
        .expect("save failed");

    let bounds = BoundingBox {
        north: 41.0,
        south: 39.0,
        east: -73.0,
        west: -75.0,
    };
    let result = store.query(&bounds).await.expect("query failed");
    assert_eq!(result.len(), 2);
    assert_eq!(result.get(&location(40.0, -73.0)), Some(2.0));
    assert_eq!(result.get(&location(40.0, -74.0)), Some(4.0));
    assert_eq!(result.get(&location(40.0, -75.0)), None);
}

#[tokio::test]
async fn no_wraparound_across_the_antimeridian() {
    let (_dir, store) = create_test_store().await;

    store
        .save(&table_of(&[(0.0, 175.0, 1.0), (0.0, -175.0, 2.0)]))
        .await
        .expect("save failed");

    // A box "crossing" the seam (west > east) matches nothing; the caller
    // must split it into two queries.
    let crossing = BoundingBox {
        north: 10.0,
        south: -10.0,
        east: -170.0,
        west: 170.0,
    };
    let result = store.query(&crossing).await.expect("query failed");
    assert!(result.is_empty());

    let eastern_half = BoundingBox {
        north: 10.0,
        south: -10.0,
        east: 180.0,
        west: 170.0,
    };
    let result = store.query(&eastern_half).await.expect("query failed");
    assert_eq!(result.len(), 1);
    assert_eq!(result.get(&location(0.0, 175.0)), Some(1.0));
}

#[tokio::test]
async fn store_survives_reconnect_with_data_intact() {
    let (dir, store) = create_test_store().await;

    store
        .save(&table_of(&[(40.0, -74.0, 128.0)]))
        .await
        .expect("save failed");
    drop(store);

    let db_path = dir.path().join("geoip.db");
    let reopened = geoip_heatmap::SqliteStore::connect(db_path.to_str().unwrap())
        .await
        .expect("reconnect failed");
    let result = reopened.query(&WORLD).await.expect("query failed");
    assert_eq!(result.get(&location(40.0, -74.0)), Some(128.0));
}
