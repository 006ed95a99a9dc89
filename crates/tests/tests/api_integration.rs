mod common;

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use tripit_api::config::RateLimitSettings;
use tripit_core::EMPTY_CONTEXT_SUGGESTION;

use common::*;

#[tokio::test]
async fn root_and_health_describe_the_service() {
    let app = app_with(settings()).await;

    let (status, body) = send(&app, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Welcome to TripIT AI API");
    assert_eq!(body["status"], "running");

    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["capabilities"]["model_provider"], false);
    assert_eq!(body["capabilities"]["storage"], "memory");
    assert_eq!(body["capabilities"]["destinations_loaded"], 16);
    assert!(body["metrics"]["requests_total"].is_u64());
}

#[tokio::test]
async fn recommendations_use_template_reasons_without_a_model() {
    let app = app_with(settings()).await;

    let request = json_request(
        "POST",
        "/api/v1/recommendations",
        None,
        json!({
            "budget": 60000,
            "days": 5,
            "travel_type": "adventure",
            "interest": "mountains"
        }),
    );
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);

    let destinations = body["destinations"].as_array().expect("destinations array");
    assert_eq!(destinations.len(), 3);
    for entry in destinations {
        let reason = entry["reason"].as_str().unwrap();
        assert!(reason.contains("is perfect for your 5-day adventure trip"), "{reason}");
        assert!(entry["estimated_cost"].as_u64().unwrap() > 0);
    }
    let scores = destinations
        .iter()
        .map(|entry| entry["score"].as_f64().unwrap())
        .collect::<Vec<_>>();
    assert!(scores.windows(2).all(|pair| pair[0] >= pair[1]));
    assert_eq!(body["query"]["travelers"], 2);
}

#[tokio::test]
async fn invalid_input_is_rejected_with_json_errors() {
    let app = app_with(settings()).await;

    let out_of_range = json_request(
        "POST",
        "/api/recommendations",
        None,
        json!({ "budget": 60000, "days": 0, "travel_type": "adventure", "interest": "mountains" }),
    );
    let (status, body) = send(&app, out_of_range).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");

    let malformed = Request::builder()
        .method("POST")
        .uri("/api/v1/chat")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, malformed).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");

    let blank_chat = json_request("POST", "/api/v1/chat", None, json!({ "message": "   " }));
    let (status, _) = send(&app, blank_chat).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn destinations_are_served_under_both_prefixes() {
    let app = app_with(settings()).await;

    let (status, v1) = send(&app, get("/api/v1/destinations")).await;
    assert_eq!(status, StatusCode::OK);
    let (_, legacy) = send(&app, get("/api/destinations")).await;
    assert_eq!(v1, legacy);

    let list = v1.as_array().unwrap();
    assert_eq!(list.len(), 16);
    assert!(list.iter().any(|entry| entry["id"] == "goa"));
    assert!(list[0]["base_cost_per_day"].is_u64());

    let (status, goa) = send(&app, get("/api/v1/destinations/goa")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(goa["name"], "Goa");

    let (status, body) = send(&app, get("/api/destinations/atlantis")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Destination not found");
}

#[tokio::test]
async fn catalog_reload_requires_auth() {
    let app = app_with(settings()).await;

    let anonymous = json_request("POST", "/api/v1/destinations/reload", None, json!({}));
    let (status, _) = send(&app, anonymous).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, authed("POST", "/api/v1/destinations/reload", ALICE)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["destinations_loaded"], 16);
}

#[tokio::test]
async fn missing_catalog_reports_unavailable() {
    let mut settings = settings();
    settings.catalog_path = catalog_path().with_file_name("does-not-exist.json");
    let app = app_with(settings).await;

    let request = json_request(
        "POST",
        "/api/v1/recommendations",
        None,
        json!({ "budget": 20000, "days": 3, "travel_type": "relaxation", "interest": "beaches" }),
    );
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "catalog_unavailable");
}

#[tokio::test]
async fn itinerary_routes_require_a_bearer_token() {
    let app = app_with(settings()).await;

    let request = json_request(
        "POST",
        "/api/v1/itinerary/generate",
        None,
        json!({
            "destination": "Goa",
            "days": 3,
            "budget": 30000,
            "travel_type": "relaxation",
            "interest": "beaches"
        }),
    );
    let response = tower::ServiceExt::oneshot(app.clone(), request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");

    let (status, _) = send(&app, authed("GET", "/api/v1/itinerary/user/all", "stranger")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn itinerary_lifecycle_with_ownership() {
    let app = app_with(settings()).await;

    let generate = json_request(
        "POST",
        "/api/v1/itinerary/generate",
        Some(ALICE),
        json!({
            "destination": "Jaipur",
            "days": 3,
            "budget": 45000,
            "travel_type": "culture",
            "interest": "heritage"
        }),
    );
    let (status, itinerary) = send(&app, generate).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(itinerary["days"], 3);
    assert_eq!(itinerary["total_cost"], 45000);
    assert_eq!(itinerary["day_plans"].as_array().unwrap().len(), 3);
    let id = itinerary["id"].as_str().unwrap().to_string();

    let save = json_request(
        "POST",
        "/api/v1/itinerary/save",
        Some(ALICE),
        json!({ "itinerary": itinerary.clone() }),
    );
    let (status, body) = send(&app, save).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "id": id }));

    let (status, fetched) = send(&app, get(&format!("/api/v1/itinerary/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, itinerary);

    let (_, mine) = send(&app, authed("GET", "/api/v1/itinerary/user/all", ALICE)).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);
    let (_, theirs) = send(&app, authed("GET", "/api/itinerary/user/all", BOB)).await;
    assert!(theirs.as_array().unwrap().is_empty());

    let hijack = json_request(
        "POST",
        "/api/v1/itinerary/save",
        Some(BOB),
        json!({ "itinerary": itinerary.clone() }),
    );
    let (status, body) = send(&app, hijack).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let uri = format!("/api/v1/itinerary/{}", id);
    let (status, body) = send(&app, authed("DELETE", &uri, BOB)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Itinerary not found or unauthorized");

    let (status, body) = send(&app, authed("DELETE", &uri, ALICE)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));

    let (status, _) = send(&app, get(&uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn chat_and_suggestions_fall_back_without_a_model() {
    let app = app_with(settings()).await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/v1/chat",
            None,
            json!({ "message": "Best beach for December?" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["response"].as_str().unwrap().contains("Goa"));

    let empty = json_request("POST", "/api/v1/suggestions", None, json!({}));
    let (status, body) = send(&app, empty).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["suggestions"], json!([EMPTY_CONTEXT_SUGGESTION]));

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/v1/suggestions",
            None,
            json!({ "tripType": "beach", "budget": "budget", "locationPref": "domestic" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let tips = body["suggestions"].as_array().unwrap();
    assert!(!tips.is_empty() && tips.len() <= 3);
}

#[tokio::test]
async fn rate_limit_is_per_client_and_skips_health() {
    let mut settings = settings();
    settings.rate_limit = RateLimitSettings {
        enabled: true,
        max_requests: 2,
        window: Duration::from_secs(60),
    };
    let app = app_with(settings).await;

    let from = |ip: &str| {
        Request::builder()
            .uri("/api/v1/destinations")
            .header("x-forwarded-for", ip)
            .body(Body::empty())
            .unwrap()
    };

    assert_eq!(send(&app, from("198.51.100.7")).await.0, StatusCode::OK);
    assert_eq!(send(&app, from("198.51.100.7")).await.0, StatusCode::OK);
    let (status, body) = send(&app, from("198.51.100.7")).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "rate_limited");

    assert_eq!(send(&app, from("198.51.100.8")).await.0, StatusCode::OK);
    assert_eq!(send(&app, get("/health")).await.0, StatusCode::OK);

    let (_, health) = send(&app, get("/health")).await;
    assert_eq!(health["metrics"]["rate_limited_total"], 1);
}
