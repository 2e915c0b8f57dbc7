//! Concurrent identical reads share one network request; distinct
//! arguments do not.

use std::time::Duration;

use serde_json::json;

use parcelflow_client::api::parcels::{ListParcels, ParcelListFilter};
use parcelflow_client::{QueryEndpoint, Verb};

use parcelflow_integration_tests::{list_envelope, parcel_json, test_client};

fn page(n: u32) -> ParcelListFilter {
    ParcelListFilter {
        page: n,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_identical_concurrent_reads_coalesce_to_one_call() {
    let (client, transport) = test_client();
    let path = ListParcels::path(&page(1));
    transport.respond(
        Verb::Get,
        &path,
        200,
        list_envelope(json!([parcel_json("p1", "PF-1", "pending")]), 1),
    );

    // Hold the response so the second read arrives while the first is still
    // in flight.
    transport.hold();

    let first = tokio::spawn({
        let client = client.clone();
        async move { client.list_parcels(&page(1)).await }
    });
    tokio::time::sleep(Duration::from_millis(20)).await;

    let second = tokio::spawn({
        let client = client.clone();
        async move { client.list_parcels(&page(1)).await }
    });
    tokio::time::sleep(Duration::from_millis(20)).await;

    transport.release();

    let first = first.await.expect("join").expect("first read");
    let second = second.await.expect("join").expect("second read");

    assert_eq!(first.data.len(), 1);
    assert_eq!(second.data.len(), 1);
    assert_eq!(first.data[0].id, second.data[0].id);
    assert_eq!(transport.count(Verb::Get, &path), 1);
}

#[tokio::test]
async fn test_distinct_arguments_fetch_separately() {
    let (client, transport) = test_client();
    let page1_path = ListParcels::path(&page(1));
    let page2_path = ListParcels::path(&page(2));

    transport.respond(
        Verb::Get,
        &page1_path,
        200,
        list_envelope(json!([parcel_json("p1", "PF-1", "pending")]), 2),
    );
    transport.respond(
        Verb::Get,
        &page2_path,
        200,
        list_envelope(json!([parcel_json("p2", "PF-2", "delivered")]), 2),
    );

    let first = client.list_parcels(&page(1)).await.expect("page 1");
    let second = client.list_parcels(&page(2)).await.expect("page 2");

    assert_ne!(first.data[0].id, second.data[0].id);
    assert_eq!(transport.count(Verb::Get, &page1_path), 1);
    assert_eq!(transport.count(Verb::Get, &page2_path), 1);
}

#[tokio::test]
async fn test_repeat_read_is_served_from_cache() {
    let (client, transport) = test_client();
    let path = ListParcels::path(&page(1));
    transport.respond(
        Verb::Get,
        &path,
        200,
        list_envelope(json!([parcel_json("p1", "PF-1", "pending")]), 1),
    );

    let _sub = client.subscribe::<ListParcels>(&page(1));
    client.list_parcels(&page(1)).await.expect("first");
    client.list_parcels(&page(1)).await.expect("second");
    client.list_parcels(&page(1)).await.expect("third");

    assert_eq!(transport.count(Verb::Get, &path), 1);
}
