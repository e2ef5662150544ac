//! Integration tests for the basic HTTP client against a mock server.

use std::sync::Arc;

use argus::model::Item;
use chrysom::auth::StaticBearerAcquirer;
use chrysom::client::{BasicClient, ClientConfig, PushResult};
use chrysom::error::ClientError;
use mockito::{Matcher, Server};
use pretty_assertions::assert_eq;
use serde_json::json;

const ALICE: &str = "alice-is-the-owner";
const ITEM_ID: &str = "4c94485e0c21ae6c41ce1dfe7b6bfaceea5ab68e40a2476f50208e526f506080";

fn client_for(server: &Server) -> BasicClient {
    BasicClient::new(ClientConfig {
        address: server.url(),
        bucket: "bucket01".to_string(),
        ..ClientConfig::default()
    })
    .unwrap()
}

fn sample_item(ttl: Option<i64>) -> Item {
    Item {
        id: ITEM_ID.to_string(),
        data: serde_json::from_value(json!({ "k": "v" })).unwrap(),
        ttl,
    }
}

#[tokio::test]
async fn get_items_parses_the_array_and_sends_the_owner() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/store/bucket01")
        .match_header("x-midt-owner", ALICE)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([{ "id": ITEM_ID, "data": { "k": "v" }, "ttl": 100 }]).to_string())
        .create_async()
        .await;

    let items = client_for(&server).get_items(ALICE).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, ITEM_ID);
    assert_eq!(items[0].ttl, Some(100));
    mock.assert_async().await;
}

#[tokio::test]
async fn empty_owner_omits_the_owner_header() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/store/bucket01")
        .match_header("x-midt-owner", Matcher::Missing)
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let items = client_for(&server).get_items("").await.unwrap();
    assert!(items.is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn push_item_distinguishes_created_from_updated() {
    let mut server = Server::new_async().await;
    let path = format!("/api/v1/store/bucket01/{ITEM_ID}");

    let created = server
        .mock("PUT", path.as_str())
        .with_status(201)
        .create_async()
        .await;
    let result = client_for(&server)
        .push_item(ALICE, &sample_item(Some(60)))
        .await
        .unwrap();
    assert_eq!(result, PushResult::Created);
    created.assert_async().await;

    let updated = server
        .mock("PUT", path.as_str())
        .with_status(200)
        .create_async()
        .await;
    let result = client_for(&server)
        .push_item(ALICE, &sample_item(Some(60)))
        .await
        .unwrap();
    assert_eq!(result, PushResult::Updated);
    updated.assert_async().await;
}

#[tokio::test]
async fn push_item_validates_locally_before_sending() {
    let server = Server::new_async().await;
    let client = client_for(&server);

    let mut empty_id = sample_item(None);
    empty_id.id = String::new();
    assert!(matches!(
        client.push_item(ALICE, &empty_id).await,
        Err(ClientError::MissingItemId)
    ));

    let mut empty_data = sample_item(None);
    empty_data.data = serde_json::Map::new();
    assert!(matches!(
        client.push_item(ALICE, &empty_data).await,
        Err(ClientError::MissingItemData)
    ));
}

#[tokio::test]
async fn remove_item_returns_the_deleted_item() {
    let mut server = Server::new_async().await;
    let path = format!("/api/v1/store/bucket01/{ITEM_ID}");
    let mock = server
        .mock("DELETE", path.as_str())
        .with_status(200)
        .with_body(json!({ "id": ITEM_ID, "data": { "k": "v" } }).to_string())
        .create_async()
        .await;

    let item = client_for(&server).remove_item(ITEM_ID, ALICE).await.unwrap();
    assert_eq!(item.id, ITEM_ID);
    mock.assert_async().await;
}

#[tokio::test]
async fn bad_request_carries_the_sanitized_message() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/v1/store/bucket01")
        .with_status(400)
        .with_header("x-midt-error", "Invalid owner format")
        .create_async()
        .await;

    let err = client_for(&server).get_items(ALICE).await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::BadRequest { ref message } if message == "Invalid owner format"
    ));
}

#[tokio::test]
async fn auth_rejections_translate_to_failed_authentication() {
    for status in [401, 403] {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/v1/store/bucket01")
            .with_status(status)
            .create_async()
            .await;

        let err = client_for(&server).get_items(ALICE).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::FailedAuthentication { status: s } if s == status as u16
        ));
    }
}

#[tokio::test]
async fn other_failures_translate_to_non_success() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/v1/store/bucket01")
        .with_status(503)
        .create_async()
        .await;

    let err = client_for(&server).get_items(ALICE).await.unwrap_err();
    assert!(matches!(err, ClientError::NonSuccess { status: 503 }));
}

#[tokio::test]
async fn the_acquirer_supplies_the_authorization_header() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/store/bucket01")
        .match_header("authorization", "Bearer secret-token")
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let client = BasicClient::new(ClientConfig {
        address: server.url(),
        bucket: "bucket01".to_string(),
        auth: Some(Arc::new(StaticBearerAcquirer::new("secret-token"))),
        ..ClientConfig::default()
    })
    .unwrap();

    client.get_items(ALICE).await.unwrap();
    mock.assert_async().await;
}
