#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;
use tripit_agents::GenerationConfig;
use tripit_api::build_app;
use tripit_api::config::{AuthSettings, Settings};

pub const ALICE: &str = "tok-alice";
pub const BOB: &str = "tok-bob";

pub fn catalog_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data/destinations.json")
}

pub fn settings() -> Settings {
    Settings {
        catalog_path: catalog_path(),
        generation: GenerationConfig {
            attempt_timeout: Duration::from_secs(5),
            retry_backoff: Duration::ZERO,
            ..GenerationConfig::default()
        },
        auth: AuthSettings {
            dev_tokens: HashMap::from([
                (ALICE.to_string(), "alice".to_string()),
                (BOB.to_string(), "bob".to_string()),
            ]),
            ..AuthSettings::default()
        },
        ..Settings::default()
    }
}

pub async fn app_with(settings: Settings) -> Router {
    build_app(&settings).await.expect("app should build")
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn authed(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, parsed)
}
