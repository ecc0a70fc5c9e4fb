//! HTTP routes driven through the router without a running server.
//!
//! The pool connects lazily to an address nothing listens on, so these
//! tests cover everything decided before the database is reached, plus the
//! error mapping when it cannot be reached.

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use fridgechef::api::{router, AppState};
use fridgechef::config::{AppConfig, GeminiConfig, RecoveryConfig, UploadLimits};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use tower::ServiceExt;

const UNREACHABLE_DB: &str = "postgres://fridgechef@127.0.0.1:1/fridgechef";

fn test_config(gemini: Option<GeminiConfig>) -> AppConfig {
    AppConfig {
        database_url: UNREACHABLE_DB.to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        gemini,
        openfoodfacts_base_url: "http://127.0.0.1:1".to_string(),
        suggestion_limit: 10,
        upload: UploadLimits::default(),
        recovery: RecoveryConfig::default(),
    }
}

fn app_with(config: AppConfig) -> Router {
    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(500))
        .connect_lazy(&config.database_url)
        .expect("Lazy pool should accept a well-formed URL");

    router(AppState::new(pool, config).expect("State should build"))
}

fn app() -> Router {
    app_with(test_config(None))
}

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(app(), Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_invalid_username_is_rejected() {
    let (status, body) = send(
        app(),
        Method::POST,
        "/api/users",
        Some(json!({ "username": "ab" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_error");
}

#[tokio::test]
async fn test_suggestion_limit_bounds() {
    for uri in [
        "/api/users/1/suggestions?limit=0",
        "/api/users/1/suggestions?limit=51",
    ] {
        let (status, body) = send(app(), Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["error"]["code"], "validation_error");
    }
}

#[tokio::test]
async fn test_expiring_window_bounds() {
    let (status, _) = send(
        app(),
        Method::GET,
        "/api/users/1/inventory/expiring?days=400",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_recipe_without_ingredients_is_rejected() {
    let payload = json!({
        "title": "Nothing soup",
        "instructions": "Boil nothing.",
        "ingredients": []
    });

    let (status, body) = send(app(), Method::POST, "/api/users/1/recipes", Some(payload)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("at least one ingredient"));
}

#[tokio::test]
async fn test_bulk_inventory_rejects_invalid_item() {
    let payload = json!({
        "items": [
            { "ingredientName": "milk", "quantity": 1.0 },
            { "ingredientName": "eggs", "quantity": -2.0 }
        ]
    });

    let (status, _) = send(
        app(),
        Method::POST,
        "/api/users/1/inventory/bulk",
        Some(payload),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_barcode_is_rejected() {
    let (status, body) = send(app(), Method::GET, "/api/products/12ab", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_error");
}

#[tokio::test]
async fn test_ai_routes_unavailable_without_api_key() {
    let (status, body) = send(
        app(),
        Method::POST,
        "/api/users/1/recipes/generate",
        Some(json!({ "ingredients": ["rice"] })),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "service_unavailable");

    let boundary = "fridgechef-boundary";
    let multipart = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"receipt\"; filename=\"r.png\"\r\n\
         Content-Type: image/png\r\n\r\nnot really a png\r\n--{boundary}--\r\n"
    );
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/users/1/receipts")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(multipart))
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_receipt_upload_is_validated_before_ai_call() {
    let config = test_config(Some(GeminiConfig {
        api_key: "test-key".to_string(),
        model: "gemini-2.0-flash".to_string(),
        base_url: "http://127.0.0.1:1".to_string(),
    }));

    let boundary = "fridgechef-boundary";
    let multipart = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"receipt\"; filename=\"r.txt\"\r\n\
         Content-Type: text/plain\r\n\r\nthis is not an image at all\r\n--{boundary}--\r\n"
    );
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/users/1/receipts")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(multipart))
        .unwrap();

    let response = app_with(config).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_database_failure_is_hidden() {
    let (status, body) = send(app(), Method::GET, "/api/users/1/inventory", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "internal_error");
    assert_eq!(body["error"]["message"], "Internal server error");
}

#[tokio::test]
async fn test_unknown_route() {
    let (status, _) = send(app(), Method::GET, "/api/nowhere", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
