mod common;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use tripit_agents::ProviderConfig;
use tripit_core::prompts::{CHAT_SYSTEM, EXPLANATION_SYSTEM, ITINERARY_SYSTEM, SUGGESTIONS_SYSTEM};
use tripit_core::CHAT_FAILURE_REPLY;

use common::*;

#[derive(Clone, Copy, PartialEq)]
enum Behaviour {
    Helpful,
    Garbage,
    Down,
}

#[derive(Clone)]
struct FakeModel {
    behaviour: Behaviour,
    calls: Arc<AtomicUsize>,
}

const MODEL_ITINERARY: &str = r#"```json
{
  "day_plans": [
    {
      "day": 1,
      "title": "Forts of the Pink City",
      "activities": ["Amber Fort at sunrise", "Jal Mahal photo stop"],
      "meals": ["Pyaaz kachori", "Laal maas"],
      "accommodation": "Heritage haveli",
      "estimated_cost": 9000,
      "tips": "Hire a licensed guide at the fort gate"
    },
    {
      "day": 2,
      "title": "Bazaars and Observatories",
      "activities": ["Jantar Mantar", "Johari Bazaar"],
      "meals": [],
      "accommodation": "Heritage haveli",
      "estimated_cost": "7000"
    }
  ],
  "travel_tips": ["Carry cash for bazaars"],
  "cost_breakdown": { "accommodation": 8000, "food": 4000, "activities": 3000, "transport": 1000 }
}
```"#;

async fn completions(
    State(model): State<FakeModel>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    model.calls.fetch_add(1, Ordering::SeqCst);
    if model.behaviour == Behaviour::Down {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": { "message": "overloaded" } })),
        );
    }

    let system = body["messages"][0]["content"].as_str().unwrap_or_default();
    let text = if model.behaviour == Behaviour::Garbage {
        "Sorry, I cannot produce JSON today.".to_string()
    } else if system == ITINERARY_SYSTEM {
        MODEL_ITINERARY.to_string()
    } else if system == SUGGESTIONS_SYSTEM {
        r#"Here you go: ["🏖️ Goa in December: budget ₹3000/day", "", "💡 Book trains 60 days ahead", "🌅 Sunset at Vagator", "extra"]"#.to_string()
    } else if system == CHAT_SYSTEM {
        "  Try Kerala's backwaters in monsoon!  ".to_string()
    } else if system == EXPLANATION_SYSTEM {
        "Snow, passes and monasteries within budget.".to_string()
    } else {
        String::new()
    };

    (
        StatusCode::OK,
        Json(json!({
            "choices": [{ "message": { "role": "assistant", "content": text } }],
            "usage": { "total_tokens": 42 }
        })),
    )
}

async fn spawn_fake_model(behaviour: Behaviour) -> (String, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route("/v1/chat/completions", post(completions))
        .with_state(FakeModel {
            behaviour,
            calls: Arc::clone(&calls),
        });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/v1", addr), calls)
}

async fn app_backed_by(behaviour: Behaviour) -> (Router, Arc<AtomicUsize>) {
    let (base_url, calls) = spawn_fake_model(behaviour).await;
    let mut settings = settings();
    settings.provider = Some(ProviderConfig {
        api_key: "test-key".to_string(),
        base_url,
        model: "fake-llama".to_string(),
    });
    (app_with(settings).await, calls)
}

fn jaipur_request() -> Value {
    json!({
        "destination": "Jaipur",
        "days": 2,
        "budget": 30000,
        "travel_type": "culture",
        "interest": "heritage",
        "travelers": 2
    })
}

#[tokio::test]
async fn model_output_drives_every_operation() {
    let (app, calls) = app_backed_by(Behaviour::Helpful).await;

    let (status, itinerary) = send(
        &app,
        json_request("POST", "/api/v1/itinerary/generate", Some(ALICE), jaipur_request()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(itinerary["day_plans"][0]["title"], "Forts of the Pink City");
    assert_eq!(itinerary["day_plans"][1]["estimated_cost"], 7000);
    assert_eq!(itinerary["total_cost"], 16000);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let (_, chat) = send(
        &app,
        json_request("POST", "/api/v1/chat", None, json!({ "message": "Where in July?" })),
    )
    .await;
    assert_eq!(chat["response"], "Try Kerala's backwaters in monsoon!");

    let (_, suggestions) = send(
        &app,
        json_request("POST", "/api/v1/suggestions", None, json!({ "tripType": "beach" })),
    )
    .await;
    assert_eq!(
        suggestions["suggestions"],
        json!([
            "🏖️ Goa in December: budget ₹3000/day",
            "💡 Book trains 60 days ahead",
            "🌅 Sunset at Vagator"
        ])
    );

    let (_, recommendations) = send(
        &app,
        json_request(
            "POST",
            "/api/v1/recommendations",
            None,
            json!({
                "budget": 80000,
                "days": 6,
                "travel_type": "adventure",
                "interest": "mountains"
            }),
        ),
    )
    .await;
    for entry in recommendations["destinations"].as_array().unwrap() {
        assert_eq!(entry["reason"], "Snow, passes and monasteries within budget.");
    }

    let (_, health) = send(&app, get("/health")).await;
    assert_eq!(health["capabilities"]["model"], "fake-llama");
    assert_eq!(health["metrics"]["model_calls_total"], 6);
    assert_eq!(health["metrics"]["model_tokens_total"], 252);
    assert_eq!(health["metrics"]["fallback_total"], 0);
}

#[tokio::test]
async fn unusable_output_exhausts_retries_then_falls_back() {
    let (app, calls) = app_backed_by(Behaviour::Garbage).await;

    let (status, itinerary) = send(
        &app,
        json_request("POST", "/api/v1/itinerary/generate", Some(ALICE), jaipur_request()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(itinerary["total_cost"], 30000);
    assert_eq!(itinerary["day_plans"][0]["title"], "Day 1 - Arrival & Exploration");

    let (_, health) = send(&app, get("/health")).await;
    assert_eq!(health["metrics"]["itinerary_retries_total"], 2);
    assert_eq!(health["metrics"]["fallback_total"], 1);
}

#[tokio::test]
async fn provider_outage_never_surfaces_as_an_error() {
    let (app, _) = app_backed_by(Behaviour::Down).await;

    let (status, chat) = send(
        &app,
        json_request("POST", "/api/v1/chat", None, json!({ "message": "Goa or Gokarna?" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(chat["response"], CHAT_FAILURE_REPLY);

    let (status, recommendations) = send(
        &app,
        json_request(
            "POST",
            "/api/v1/recommendations",
            None,
            json!({
                "budget": 25000,
                "days": 4,
                "travel_type": "relaxation",
                "interest": "beaches"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    for entry in recommendations["destinations"].as_array().unwrap() {
        assert!(entry["reason"].as_str().unwrap().contains("4-day relaxation trip"));
    }

    let (_, health) = send(&app, get("/health")).await;
    assert_eq!(health["metrics"]["model_failures_total"], 4);
}
