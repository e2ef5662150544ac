//! End-to-end tests for the HTTP transport over the in-memory backend.
//!
//! Drives the router with in-process requests and covers the create/read/
//! list scenarios, owner isolation and admin override, upsert ownership
//! preservation, validation rejections, TTL behavior, and error
//! sanitization. Organized into module blocks per concern.

use std::collections::HashMap;
use std::sync::Arc;

use argus::auth::{AuthAttributes, DEFAULT_ACCESS_ATTRIBUTE_KEY, ELEVATED_ACCESS_LEVEL};
use argus::clock::ManualClock;
use argus::error::StoreError;
use argus::model::{Key, OwnableItem};
use argus::service::{router, StoreHandler, ERROR_HEADER, OWNER_HEADER};
use argus::store::memory::InMemoryDao;
use argus::store::Dao;
use argus::validation::DEFAULT_ITEM_MAX_TTL_SECS;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

const ALICE: &str = "alice-is-the-owner";
const BOB: &str = "bob-has-no-access";
const ITEM_ID: &str = "4c94485e0c21ae6c41ce1dfe7b6bfaceea5ab68e40a2476f50208e526f506080";

fn fixture() -> (Router, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(1_700_000_000));
    let dao = Arc::new(InMemoryDao::with_clock(clock.clone()));
    (router(Arc::new(StoreHandler::new(dao))), clock)
}

fn admin_attributes() -> AuthAttributes {
    let mut attrs = AuthAttributes::new();
    attrs.insert(DEFAULT_ACCESS_ATTRIBUTE_KEY, json!(ELEVATED_ACCESS_LEVEL));
    attrs
}

fn request(
    method: &str,
    path: &str,
    owner: Option<&str>,
    admin: bool,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(owner) = owner {
        builder = builder.header(OWNER_HEADER, owner);
    }
    if admin {
        builder = builder.extension(admin_attributes());
    }
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    builder.body(body).unwrap()
}

async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

fn error_header(response: &Response<Body>) -> String {
    response
        .headers()
        .get(ERROR_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn sample_body(ttl: Option<i64>) -> Value {
    let mut body = json!({ "id": ITEM_ID, "data": { "k": "v" } });
    if let Some(ttl) = ttl {
        body["ttl"] = json!(ttl);
    }
    body
}

fn item_path() -> String {
    format!("/api/v1/store/bucket01/{ITEM_ID}")
}

// ─── Create / read / list ───────────────────────────────────────────────────

mod crud {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn create_then_read_then_list() {
        let (app, _) = fixture();

        let response = app
            .clone()
            .oneshot(request(
                "PUT",
                &item_path(),
                Some(ALICE),
                false,
                Some(sample_body(Some(3600))),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .clone()
            .oneshot(request("GET", &item_path(), Some(ALICE), false, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/json"
        );
        let body = body_json(response).await;
        assert_eq!(body["id"], ITEM_ID);
        assert_eq!(body["data"], json!({ "k": "v" }));
        assert!(body["ttl"].as_i64().unwrap() <= 3600);

        let response = app
            .clone()
            .oneshot(request(
                "GET",
                "/api/v1/store/bucket01",
                Some(ALICE),
                false,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let list = body_json(response).await;
        assert_eq!(list.as_array().unwrap().len(), 1);
        assert_eq!(list[0]["id"], ITEM_ID);
    }

    #[tokio::test]
    async fn updating_an_existing_item_responds_ok_not_created() {
        let (app, _) = fixture();

        let response = app
            .clone()
            .oneshot(request(
                "PUT",
                &item_path(),
                Some(ALICE),
                false,
                Some(sample_body(None)),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .clone()
            .oneshot(request(
                "PUT",
                &item_path(),
                Some(ALICE),
                false,
                Some(sample_body(None)),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn delete_returns_the_deleted_item() {
        let (app, _) = fixture();

        app.clone()
            .oneshot(request(
                "PUT",
                &item_path(),
                Some(ALICE),
                false,
                Some(sample_body(None)),
            ))
            .await
            .unwrap();

        let response = app
            .clone()
            .oneshot(request("DELETE", &item_path(), Some(ALICE), false, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["id"], ITEM_ID);

        let response = app
            .clone()
            .oneshot(request("GET", &item_path(), Some(ALICE), false, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn uppercase_url_ids_are_lowercased() {
        let (app, _) = fixture();

        app.clone()
            .oneshot(request(
                "PUT",
                &item_path(),
                Some(ALICE),
                false,
                Some(sample_body(None)),
            ))
            .await
            .unwrap();

        let upper_path = format!("/api/v1/store/bucket01/{}", ITEM_ID.to_uppercase());
        let response = app
            .clone()
            .oneshot(request("GET", &upper_path, Some(ALICE), false, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn list_is_sorted_ascending_by_id() {
        let (app, _) = fixture();

        for fill in ['c', 'a', 'b'] {
            let id: String = std::iter::repeat(fill).take(64).collect();
            let path = format!("/api/v1/store/bucket01/{id}");
            let body = json!({ "id": id, "data": { "k": "v" } });
            app.clone()
                .oneshot(request("PUT", &path, Some(ALICE), false, Some(body)))
                .await
                .unwrap();
        }

        let response = app
            .clone()
            .oneshot(request(
                "GET",
                "/api/v1/store/bucket01",
                Some(ALICE),
                false,
                None,
            ))
            .await
            .unwrap();
        let list = body_json(response).await;
        let ids: Vec<&str> = list
            .as_array()
            .unwrap()
            .iter()
            .map(|item| item["id"].as_str().unwrap())
            .collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }
}

// ─── Owner isolation and admin override ─────────────────────────────────────

mod ownership {
    use super::*;

    async fn seed_alice_item(app: &Router) {
        app.clone()
            .oneshot(request(
                "PUT",
                &item_path(),
                Some(ALICE),
                false,
                Some(sample_body(Some(3600))),
            ))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn owner_mismatch_is_forbidden_with_the_exact_message() {
        let (app, _) = fixture();
        seed_alice_item(&app).await;

        let response = app
            .clone()
            .oneshot(request("GET", &item_path(), Some(BOB), false, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(error_header(&response), "resource owner mismatch");

        let response = app
            .clone()
            .oneshot(request("DELETE", &item_path(), Some(BOB), false, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn list_by_another_owner_omits_the_item() {
        let (app, _) = fixture();
        seed_alice_item(&app).await;

        let response = app
            .clone()
            .oneshot(request(
                "GET",
                "/api/v1/store/bucket01",
                Some(BOB),
                false,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_json(response).await.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn admin_reads_and_deletes_bypass_owner_checks() {
        let (app, _) = fixture();
        seed_alice_item(&app).await;

        let response = app
            .clone()
            .oneshot(request("GET", &item_path(), Some(BOB), true, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(request("DELETE", &item_path(), Some(BOB), true, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn admin_list_without_owner_sees_everything() {
        let (app, _) = fixture();
        seed_alice_item(&app).await;

        let bob_id: String = std::iter::repeat('b').take(64).collect();
        let bob_path = format!("/api/v1/store/bucket01/{bob_id}");
        app.clone()
            .oneshot(request(
                "PUT",
                &bob_path,
                Some(BOB),
                false,
                Some(json!({ "id": bob_id, "data": { "k": "v" } })),
            ))
            .await
            .unwrap();

        let response = app
            .clone()
            .oneshot(request("GET", "/api/v1/store/bucket01", None, true, None))
            .await
            .unwrap();
        assert_eq!(body_json(response).await.as_array().unwrap().len(), 2);

        // With an owner claim the admin sees only that owner's items.
        let response = app
            .clone()
            .oneshot(request(
                "GET",
                "/api/v1/store/bucket01",
                Some(ALICE),
                true,
                None,
            ))
            .await
            .unwrap();
        let list = body_json(response).await;
        assert_eq!(list.as_array().unwrap().len(), 1);
        assert_eq!(list[0]["id"], ITEM_ID);
    }

    #[tokio::test]
    async fn non_admin_without_owner_sees_only_public_items() {
        let (app, _) = fixture();
        seed_alice_item(&app).await;

        let public_id: String = std::iter::repeat('0').take(64).collect();
        let public_path = format!("/api/v1/store/bucket01/{public_id}");
        app.clone()
            .oneshot(request(
                "PUT",
                &public_path,
                None,
                false,
                Some(json!({ "id": public_id, "data": { "k": "v" } })),
            ))
            .await
            .unwrap();

        let response = app
            .clone()
            .oneshot(request("GET", "/api/v1/store/bucket01", None, false, None))
            .await
            .unwrap();
        let list = body_json(response).await;
        assert_eq!(list.as_array().unwrap().len(), 1);
        assert_eq!(list[0]["id"], public_id);
    }

    #[tokio::test]
    async fn non_owner_upsert_of_an_existing_item_is_forbidden() {
        let (app, _) = fixture();
        seed_alice_item(&app).await;

        let response = app
            .clone()
            .oneshot(request(
                "PUT",
                &item_path(),
                Some(BOB),
                false,
                Some(sample_body(None)),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn admin_upsert_preserves_the_stored_owner() {
        let (app, _) = fixture();
        seed_alice_item(&app).await;

        // Admin overwrites with Bob's owner claim; ownership must stay
        // with Alice.
        let response = app
            .clone()
            .oneshot(request(
                "PUT",
                &item_path(),
                Some(BOB),
                true,
                Some(sample_body(None)),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(request("GET", &item_path(), Some(ALICE), false, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(request("GET", &item_path(), Some(BOB), false, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}

// ─── Validation ─────────────────────────────────────────────────────────────

mod validation {
    use super::*;

    #[tokio::test]
    async fn invalid_url_id_is_a_bad_request() {
        let (app, _) = fixture();

        let response = app
            .clone()
            .oneshot(request(
                "PUT",
                "/api/v1/store/bucket01/not-a-hex",
                Some(ALICE),
                false,
                Some(json!({ "id": "not-a-hex", "data": { "k": "v" } })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(error_header(&response).contains("Invalid ID format"));
    }

    #[tokio::test]
    async fn invalid_bucket_is_a_bad_request() {
        let (app, _) = fixture();

        let response = app
            .clone()
            .oneshot(request("GET", "/api/v1/store/NOPE", Some(ALICE), false, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(error_header(&response).contains("Invalid bucket format"));
    }

    #[tokio::test]
    async fn invalid_owner_is_a_bad_request() {
        let (app, _) = fixture();

        let response = app
            .clone()
            .oneshot(request("GET", &item_path(), Some("short"), false, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(error_header(&response).contains("Invalid owner format"));
    }

    #[tokio::test]
    async fn body_id_mismatch_is_a_bad_request() {
        let (app, _) = fixture();

        let other_id: String = std::iter::repeat('f').take(64).collect();
        let response = app
            .clone()
            .oneshot(request(
                "PUT",
                &item_path(),
                Some(ALICE),
                false,
                Some(json!({ "id": other_id, "data": { "k": "v" } })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn empty_data_is_a_bad_request() {
        let (app, _) = fixture();

        let response = app
            .clone()
            .oneshot(request(
                "PUT",
                &item_path(),
                Some(ALICE),
                false,
                Some(json!({ "id": ITEM_ID, "data": {} })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn excessive_depth_is_a_bad_request() {
        let (app, _) = fixture();

        // Build data nested beyond the default depth cap of 30.
        let mut data = json!({ "leaf": 1 });
        for _ in 0..31 {
            data = json!({ "level": data });
        }
        let response = app
            .clone()
            .oneshot(request(
                "PUT",
                &item_path(),
                Some(ALICE),
                false,
                Some(json!({ "id": ITEM_ID, "data": data })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(error_header(&response).contains("nesting depth"));
    }

    #[tokio::test]
    async fn negative_ttl_is_a_bad_request() {
        let (app, _) = fixture();

        let response = app
            .clone()
            .oneshot(request(
                "PUT",
                &item_path(),
                Some(ALICE),
                false,
                Some(sample_body(Some(-5))),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

// ─── TTL behavior ───────────────────────────────────────────────────────────

mod ttl {
    use super::*;

    #[tokio::test]
    async fn requested_ttl_is_clamped_to_the_maximum() {
        let (app, _) = fixture();

        app.clone()
            .oneshot(request(
                "PUT",
                &item_path(),
                Some(ALICE),
                false,
                Some(sample_body(Some(999_999_999))),
            ))
            .await
            .unwrap();

        let response = app
            .clone()
            .oneshot(request("GET", &item_path(), Some(ALICE), false, None))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert!(body["ttl"].as_i64().unwrap() <= DEFAULT_ITEM_MAX_TTL_SECS);
    }

    #[tokio::test]
    async fn absent_ttl_is_treated_as_the_maximum() {
        let (app, _) = fixture();

        app.clone()
            .oneshot(request(
                "PUT",
                &item_path(),
                Some(ALICE),
                false,
                Some(sample_body(None)),
            ))
            .await
            .unwrap();

        let response = app
            .clone()
            .oneshot(request("GET", &item_path(), Some(ALICE), false, None))
            .await
            .unwrap();
        let body = body_json(response).await;
        let ttl = body["ttl"].as_i64().unwrap();
        assert!(ttl > 0 && ttl <= DEFAULT_ITEM_MAX_TTL_SECS);
    }

    #[tokio::test]
    async fn expired_items_read_as_absent_everywhere() {
        let (app, clock) = fixture();

        app.clone()
            .oneshot(request(
                "PUT",
                &item_path(),
                Some(ALICE),
                false,
                Some(sample_body(Some(1))),
            ))
            .await
            .unwrap();

        clock.advance(2);
        let response = app
            .clone()
            .oneshot(request("GET", &item_path(), Some(ALICE), false, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .clone()
            .oneshot(request("GET", "/api/v1/store/bucket01", None, true, None))
            .await
            .unwrap();
        assert!(body_json(response).await.as_array().unwrap().is_empty());
    }
}

// ─── Error sanitization ─────────────────────────────────────────────────────

mod sanitization {
    use super::*;

    /// DAO whose every operation fails with raw backend text.
    struct FailingDao;

    #[async_trait]
    impl Dao for FailingDao {
        async fn push(&self, _key: &Key, _item: &OwnableItem) -> Result<(), StoreError> {
            Err(StoreError::internal("raw backend text: endpoint 10.0.0.7"))
        }

        async fn get(&self, _key: &Key) -> Result<OwnableItem, StoreError> {
            Err(StoreError::retryable("raw backend text: endpoint 10.0.0.7"))
        }

        async fn delete(&self, _key: &Key) -> Result<OwnableItem, StoreError> {
            Err(StoreError::internal("raw backend text: endpoint 10.0.0.7"))
        }

        async fn get_all(
            &self,
            _bucket: &str,
        ) -> Result<HashMap<String, OwnableItem>, StoreError> {
            Err(StoreError::internal("raw backend text: endpoint 10.0.0.7"))
        }
    }

    #[tokio::test]
    async fn backend_failures_surface_sanitized_with_empty_bodies() {
        let app = router(Arc::new(StoreHandler::new(Arc::new(FailingDao))));

        for (method, path, body) in [
            ("GET", item_path(), None),
            ("DELETE", item_path(), None),
            ("GET", "/api/v1/store/bucket01".to_string(), None),
            ("PUT", item_path(), Some(sample_body(None))),
        ] {
            let response = app
                .clone()
                .oneshot(request(method, &path, Some(ALICE), false, body))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(error_header(&response), "store operation failed");
            assert!(body_bytes(response).await.is_empty());
        }
    }
}
