//! [`OllamaClient`] against an in-process stand-in for the Ollama API.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use methodscope_core::{ModelCallError, ModelClient, ModelSettings, OllamaClient};
use serde_json::{Value, json};

type Captured = Arc<Mutex<Vec<Value>>>;

async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn client_for(endpoint: String) -> OllamaClient {
    OllamaClient::new(ModelSettings {
        endpoint,
        model: "test-model".into(),
        num_ctx: 4096,
        seed: 123,
        timeout: Duration::from_secs(5),
        ..ModelSettings::default()
    })
    .unwrap()
}

async fn echo_generate(State(captured): State<Captured>, Json(body): Json<Value>) -> Json<Value> {
    let prompt = body["prompt"].as_str().unwrap_or_default().to_string();
    captured.lock().unwrap().push(body);
    Json(json!({ "model": "test-model", "response": format!("echo: {prompt}"), "done": true }))
}

#[tokio::test]
async fn generate_sends_pinned_decoding_settings() {
    let captured: Captured = Arc::default();
    let app = Router::new()
        .route("/api/generate", post(echo_generate))
        .with_state(captured.clone());
    let client = client_for(spawn_server(app).await);

    let text = client.generate("Assess the sampling.").await.unwrap();
    assert_eq!(text, "echo: Assess the sampling.");

    let bodies = captured.lock().unwrap();
    assert_eq!(bodies.len(), 1);
    let body = &bodies[0];
    assert_eq!(body["model"], "test-model");
    assert_eq!(body["stream"], false);
    assert_eq!(body["temperature"], 0.0);
    assert_eq!(body["num_ctx"], 4096);
    assert_eq!(body["seed"], 123);
    assert_eq!(body["options"]["num_ctx"], 4096);
}

#[tokio::test]
async fn non_success_status_is_typed_error() {
    let app = Router::new().route(
        "/api/generate",
        post(|| async { (StatusCode::NOT_FOUND, "model \"test-model\" not found") }),
    );
    let client = client_for(spawn_server(app).await);

    let err = client.generate("prompt").await.unwrap_err();
    match err {
        ModelCallError::Status { status, body } => {
            assert_eq!(status, 404);
            assert!(body.contains("not found"));
        }
        other => panic!("expected Status error, got {other:?}"),
    }
}

#[tokio::test]
async fn body_without_response_field_is_decode_error() {
    let app = Router::new().route(
        "/api/generate",
        post(|| async { Json(json!({ "error": "oops" })) }),
    );
    let client = client_for(spawn_server(app).await);

    let err = client.generate("prompt").await.unwrap_err();
    assert!(matches!(err, ModelCallError::Decode(_)));
}

#[tokio::test]
async fn unreachable_endpoint_is_transport_error() {
    // Bind and drop to get a port nothing listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_for(format!("http://{addr}"));
    let err = client.generate("prompt").await.unwrap_err();
    assert!(matches!(err, ModelCallError::Transport(_)));
    assert!(client.health_check().await.is_err());
}

#[tokio::test]
async fn health_check_hits_tags() {
    let app = Router::new().route("/api/tags", get(|| async { Json(json!({ "models": [] })) }));
    let client = client_for(spawn_server(app).await);
    client.health_check().await.unwrap();
}
