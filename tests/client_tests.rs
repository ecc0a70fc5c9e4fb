//! Outbound clients against local mock servers.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use fridgechef::ai::GeminiClient;
use fridgechef::config::{GeminiConfig, RecoveryConfig};
use fridgechef::errors::AppError;
use fridgechef::openfoodfacts::OpenFoodFactsClient;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Fast retries so failure paths finish quickly
fn quick_recovery() -> RecoveryConfig {
    RecoveryConfig {
        max_retries: 2,
        base_retry_delay_ms: 1,
        max_retry_delay_ms: 5,
        operation_timeout_secs: 5,
        circuit_breaker_threshold: 10,
        circuit_breaker_reset_secs: 60,
    }
}

async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn gemini_reply(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}

/// Mock Gemini that fails `failures` times with `failure_status`, then answers `reply`
async fn mock_gemini(failures: u32, failure_status: StatusCode, reply: Value) -> (GeminiClient, Arc<AtomicU32>) {
    let hits = Arc::new(AtomicU32::new(0));
    let state = (hits.clone(), failures, failure_status, reply);

    let app = Router::new()
        .route(
            "/v1beta/models/:model",
            post(
                |State((hits, failures, status, reply)): State<(Arc<AtomicU32>, u32, StatusCode, Value)>,
                 Path(model): Path<String>,
                 headers: HeaderMap,
                 Json(request): Json<Value>| async move {
                    assert_eq!(model, "test-model:generateContent");
                    assert_eq!(headers["x-goog-api-key"], "test-key");
                    assert!(request["contents"][0]["parts"].is_array());

                    if hits.fetch_add(1, Ordering::SeqCst) < failures {
                        (status, Json(json!({ "error": { "message": "mock failure" } })))
                    } else {
                        (StatusCode::OK, Json(reply))
                    }
                },
            ),
        )
        .with_state(state);

    let base = serve(app).await;
    let client = GeminiClient::new(
        GeminiConfig {
            api_key: "test-key".to_string(),
            model: "test-model".to_string(),
            base_url: format!("{base}/v1beta"),
        },
        quick_recovery(),
    );
    (client, hits)
}

#[tokio::test]
async fn test_receipt_extraction() {
    let reply = gemini_reply(
        "```json\n{\"items\": [{\"name\": \"2 x Milk\", \"quantity\": 2, \"unit\": \"l\"}, {\"name\": \"Apples\"}]}\n```",
    );
    let (client, hits) = mock_gemini(0, StatusCode::OK, reply).await;

    let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    let items = client.extract_receipt_items(&png, "image/png").await.unwrap();

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].name, "milk");
    assert_eq!(items[0].quantity, Some(2.0));
    assert_eq!(items[1].name, "apples");
}

#[tokio::test]
async fn test_recipe_generation_retries_server_errors() {
    let reply = gemini_reply(
        r#"{"title": "Fried Rice", "instructions": "Fry the rice.", "servings": 2, "ingredients": [{"name": "rice"}, {"name": "egg"}]}"#,
    );
    let (client, hits) = mock_gemini(2, StatusCode::SERVICE_UNAVAILABLE, reply).await;

    let recipe = client
        .generate_recipe(&["rice".to_string(), "egg".to_string()], Some("quick"))
        .await
        .unwrap();

    assert_eq!(hits.load(Ordering::SeqCst), 3);
    assert_eq!(recipe.title, "Fried Rice");
    assert_eq!(recipe.ingredients.len(), 2);
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let (client, hits) = mock_gemini(5, StatusCode::BAD_REQUEST, gemini_reply("{}")).await;

    let err = client
        .generate_recipe(&["rice".to_string()], None)
        .await
        .unwrap_err();

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert!(matches!(err, AppError::Internal(_)));
}

#[tokio::test]
async fn test_rate_limit_gives_up_after_retries() {
    let (client, hits) = mock_gemini(10, StatusCode::TOO_MANY_REQUESTS, gemini_reply("{}")).await;

    let err = client
        .generate_recipe(&["rice".to_string()], None)
        .await
        .unwrap_err();

    assert_eq!(hits.load(Ordering::SeqCst), 3);
    assert!(matches!(err, AppError::Upstream(ref m) if m.contains("mock failure")));
}

#[tokio::test]
async fn test_unparseable_model_output() {
    let (client, _) = mock_gemini(0, StatusCode::OK, gemini_reply("Sorry, I cannot help.")).await;

    let err = client
        .extract_receipt_items(b"\xFF\xD8\xFF\xE0", "image/jpeg")
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Upstream(_)));
}

#[tokio::test]
async fn test_connection_failure_hides_api_key() {
    let client = GeminiClient::new(
        GeminiConfig {
            api_key: "do-not-echo-this-key".to_string(),
            model: "test-model".to_string(),
            base_url: "http://127.0.0.1:1/v1beta".to_string(),
        },
        RecoveryConfig {
            max_retries: 0,
            ..quick_recovery()
        },
    );

    let err = client
        .generate_recipe(&["rice".to_string()], None)
        .await
        .unwrap_err();

    assert!(err.is_transient());
    assert!(!err.to_string().contains("do-not-echo-this-key"));
    assert!(!err.public_message().contains("do-not-echo-this-key"));
}

async fn mock_openfoodfacts() -> OpenFoodFactsClient {
    let app = Router::new().route(
        "/api/v2/product/:file",
        get(|Path(file): Path<String>| async move {
            match file.as_str() {
                "3017620422003.json" => (
                    StatusCode::OK,
                    Json(json!({
                        "status": 1,
                        "product": {
                            "product_name": "Nutella",
                            "brands": "Ferrero",
                            "categories": "Spreads",
                            "nutriments": { "energy-kcal_100g": 539 }
                        }
                    })),
                ),
                "12345678.json" => (
                    StatusCode::OK,
                    Json(json!({ "status": 0, "status_verbose": "product not found" })),
                ),
                _ => (StatusCode::NOT_FOUND, Json(json!({ "status": 0 }))),
            }
        }),
    );

    let base = serve(app).await;
    OpenFoodFactsClient::new(base, quick_recovery()).unwrap()
}

#[tokio::test]
async fn test_product_lookup() {
    let client = mock_openfoodfacts().await;

    let product = client.lookup_product("3017620422003").await.unwrap().unwrap();
    assert_eq!(product.name.as_deref(), Some("Nutella"));
    assert_eq!(product.brand.as_deref(), Some("Ferrero"));
    assert_eq!(product.energy_kcal_100g, Some(539.0));

    assert_eq!(client.lookup_product("12345678").await.unwrap(), None);
    assert_eq!(client.lookup_product("87654321").await.unwrap(), None);
}
