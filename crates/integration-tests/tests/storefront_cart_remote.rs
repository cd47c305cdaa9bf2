//! Cart persistence against a mocked table API.
//!
//! Checks the exact query shapes sent for each cart operation, and that the
//! cart store refetches after mutations and keeps its snapshot on failure.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shophub_core::ProductId;
use shophub_integration_tests::{ANON_KEY, cart_row, session_for, supabase_config};
use shophub_storefront::cart::CartStore;
use shophub_storefront::remote::{CART_SELECT, CartRemote, RemoteError, RestCartRemote, RestClient};

const CART_PATH: &str = "/rest/v1/cart_items";

async fn remote_for(server: &MockServer, user_id: &str) -> RestCartRemote {
    let client = RestClient::new(&supabase_config(server)).unwrap();
    RestCartRemote::new(client, &session_for(user_id))
}

// ============================================================================
// Query Shapes
// ============================================================================

#[tokio::test]
async fn test_select_lines_is_user_scoped_and_ordered() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CART_PATH))
        .and(query_param("select", CART_SELECT))
        .and(query_param("user_id", "eq.u-1"))
        .and(query_param("order", "created_at.asc"))
        .and(header("apikey", ANON_KEY))
        .and(header("authorization", "Bearer u-1-jwt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            cart_row("c-1", "p-1", 2, "Headphones", 99.99),
            cart_row("c-2", "p-2", 1, "Sneakers", 59.5),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let lines = remote_for(&server, "u-1").await.select_lines().await.unwrap();

    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].product_id.as_str(), "p-1");
    assert_eq!(lines[0].quantity, 2);
    assert_eq!(lines[0].product.name, "Headphones");
    assert_eq!(lines[1].product.price.display(), "$59.50");
}

#[tokio::test]
async fn test_upsert_merges_on_user_and_product() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CART_PATH))
        .and(query_param("on_conflict", "user_id,product_id"))
        .and(header("authorization", "Bearer u-1-jwt"))
        .and(body_json(json!({
            "user_id": "u-1",
            "product_id": "p-7",
            "quantity": 3,
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    remote_for(&server, "u-1")
        .await
        .upsert_line(&ProductId::new("p-7"), 3)
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(
        requests[0].headers.get("prefer").unwrap(),
        "resolution=merge-duplicates,return=minimal"
    );
}

#[tokio::test]
async fn test_update_and_delete_target_one_line() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path(CART_PATH))
        .and(query_param("user_id", "eq.u-1"))
        .and(query_param("product_id", "eq.p-1"))
        .and(body_json(json!({ "quantity": 5 })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(CART_PATH))
        .and(query_param("user_id", "eq.u-1"))
        .and(query_param("product_id", "eq.p-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let remote = remote_for(&server, "u-1").await;
    remote
        .update_quantity(&ProductId::new("p-1"), 5)
        .await
        .unwrap();
    remote.delete_line(&ProductId::new("p-1")).await.unwrap();
}

#[tokio::test]
async fn test_delete_all_only_filters_on_user() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(CART_PATH))
        .and(query_param("user_id", "eq.u-2"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    remote_for(&server, "u-2").await.delete_all().await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].url.query(), Some("user_id=eq.u-2"));
}

// ============================================================================
// Error Mapping
// ============================================================================

#[tokio::test]
async fn test_expired_token_maps_to_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CART_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": "PGRST301",
            "message": "JWT expired",
        })))
        .mount(&server)
        .await;

    let err = remote_for(&server, "u-1").await.select_lines().await.unwrap_err();
    assert!(matches!(err, RemoteError::Unauthorized));
}

#[tokio::test]
async fn test_constraint_violation_keeps_backend_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CART_PATH))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23503",
            "details": "Key (product_id)=(p-404) is not present in table \"products\".",
            "hint": null,
            "message": "insert or update on table \"cart_items\" violates foreign key constraint",
        })))
        .mount(&server)
        .await;

    let err = remote_for(&server, "u-1")
        .await
        .upsert_line(&ProductId::new("p-404"), 1)
        .await
        .unwrap_err();

    assert!(matches!(err, RemoteError::Api { status: 409, .. }));
    assert!(err.to_string().contains("violates foreign key constraint"));
}

// ============================================================================
// Cart Store Over HTTP
// ============================================================================

#[tokio::test]
async fn test_store_add_refetches_backend_view() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CART_PATH))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    // The backend merged the add into an existing line.
    Mock::given(method("GET"))
        .and(path(CART_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([cart_row("c-1", "p-1", 4, "Headphones", 10.0)])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = CartStore::new(Arc::new(remote_for(&server, "u-1").await));
    store.add(&ProductId::new("p-1"), 4).await;

    let state = store.snapshot();
    assert!(!state.loading);
    assert_eq!(state.error, None);
    assert_eq!(state.item_count(), 1);
    assert_eq!(state.items[0].quantity, 4);
    assert_eq!(state.subtotal().display(), "$40.00");
    assert!(state.last_synced.is_some());
}

#[tokio::test]
async fn test_store_failure_keeps_previous_items() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CART_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([cart_row("c-1", "p-1", 1, "Headphones", 10.0)])),
        )
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(CART_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string(""))
        .mount(&server)
        .await;

    let store = CartStore::new(Arc::new(remote_for(&server, "u-1").await));
    store.fetch().await;
    assert_eq!(store.snapshot().item_count(), 1);

    store.clear().await;

    let state = store.snapshot();
    assert!(!state.loading);
    assert_eq!(state.item_count(), 1);
    assert_eq!(
        state.error.as_deref(),
        Some("request failed with HTTP 503 Service Unavailable")
    );
}
