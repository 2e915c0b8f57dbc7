//! Tag invalidation across the full client stack: a confirmed mutation
//! refetches every subscribed query providing the invalidated tag exactly
//! once, and a failed mutation refetches nothing.

use serde_json::json;

use parcelflow_core::{ParcelDetails, Dimensions, Recipient};
use parcelflow_client::api::parcels::{
    CreateParcelPayload, ListParcels, ParcelListFilter, ShippingSelection,
};
use parcelflow_client::api::users::{ListUsers, UserListFilter};
use parcelflow_client::{QueryEndpoint, Verb};

use parcelflow_integration_tests::{list_envelope, parcel_json, test_client, user_json};

fn page(n: u32) -> ParcelListFilter {
    ParcelListFilter {
        page: n,
        ..Default::default()
    }
}

fn sample_payload() -> CreateParcelPayload {
    CreateParcelPayload {
        recipient: Recipient::default(),
        parcel_details: ParcelDetails {
            weight: rust_decimal::Decimal::new(25, 1),
            dimensions: Dimensions::default(),
            description: "Books".to_string(),
            value: rust_decimal::Decimal::new(4500, 2),
            category: "books".to_string(),
        },
        shipping: ShippingSelection::default(),
    }
}

#[tokio::test]
async fn test_successful_mutation_refetches_each_subscribed_list_once() {
    let (client, transport) = test_client();
    let page1_path = ListParcels::path(&page(1));
    let page2_path = ListParcels::path(&page(2));

    transport.respond(
        Verb::Get,
        &page1_path,
        200,
        list_envelope(json!([parcel_json("p1", "PF-1", "pending")]), 11),
    );
    transport.respond(
        Verb::Get,
        &page2_path,
        200,
        list_envelope(json!([parcel_json("p2", "PF-2", "delivered")]), 11),
    );
    transport.respond(
        Verb::Post,
        "/parcels",
        201,
        json!({ "success": true, "data": parcel_json("p3", "PF-3", "pending") }),
    );

    let _page1 = client.subscribe::<ListParcels>(&page(1));
    let _page2 = client.subscribe::<ListParcels>(&page(2));
    client.list_parcels(&page(1)).await.expect("page 1");
    client.list_parcels(&page(2)).await.expect("page 2");
    assert_eq!(transport.count(Verb::Get, &page1_path), 1);
    assert_eq!(transport.count(Verb::Get, &page2_path), 1);

    client.create_parcel(&sample_payload()).await.expect("create");

    // Exactly one refetch per subscribed key, no more.
    assert_eq!(transport.count(Verb::Get, &page1_path), 2);
    assert_eq!(transport.count(Verb::Get, &page2_path), 2);
}

#[tokio::test]
async fn test_failed_mutation_refetches_nothing() {
    let (client, transport) = test_client();
    let path = ListParcels::path(&page(1));

    transport.respond(
        Verb::Get,
        &path,
        200,
        list_envelope(json!([parcel_json("p1", "PF-1", "pending")]), 1),
    );
    transport.respond(
        Verb::Post,
        "/parcels",
        422,
        json!({ "success": false, "message": "invalid recipient" }),
    );

    let _sub = client.subscribe::<ListParcels>(&page(1));
    client.list_parcels(&page(1)).await.expect("seed list");

    client
        .create_parcel(&sample_payload())
        .await
        .expect_err("must fail");

    assert_eq!(transport.count(Verb::Get, &path), 1);
}

#[tokio::test]
async fn test_unsubscribed_entries_are_dropped_not_refetched() {
    let (client, transport) = test_client();
    let path = ListParcels::path(&page(1));

    transport.respond(
        Verb::Get,
        &path,
        200,
        list_envelope(json!([parcel_json("p1", "PF-1", "pending")]), 1),
    );
    transport.respond(
        Verb::Post,
        "/parcels",
        201,
        json!({ "success": true, "data": parcel_json("p2", "PF-2", "pending") }),
    );

    // No subscription; the result is only parked for reuse.
    client.list_parcels(&page(1)).await.expect("list");
    assert_eq!(transport.count(Verb::Get, &path), 1);

    client.create_parcel(&sample_payload()).await.expect("create");

    // No proactive refetch for an unsubscribed key; the stale parked copy
    // is gone, so the next read goes to the network.
    assert_eq!(transport.count(Verb::Get, &path), 1);
    client.list_parcels(&page(1)).await.expect("fresh list");
    assert_eq!(transport.count(Verb::Get, &path), 2);
}

#[tokio::test]
async fn test_parcel_mutation_leaves_user_lists_alone() {
    let (client, transport) = test_client();
    let users_path = ListUsers::path(&UserListFilter::default());

    transport.respond(
        Verb::Get,
        &users_path,
        200,
        list_envelope(json!([user_json("u1", "Sam", "sam@parcelflow.test", "agent")]), 1),
    );
    transport.respond(
        Verb::Post,
        "/parcels",
        201,
        json!({ "success": true, "data": parcel_json("p1", "PF-1", "pending") }),
    );

    let _sub = client.subscribe::<ListUsers>(&UserListFilter::default());
    client.list_users(&UserListFilter::default()).await.expect("users");

    client.create_parcel(&sample_payload()).await.expect("create");

    assert_eq!(transport.count(Verb::Get, &users_path), 1);
}
