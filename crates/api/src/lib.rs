pub mod auth;
pub mod config;
pub mod rate_limit;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, Path, State};
use axum::http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{body::Body, Router};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tripit_agents::{ModelAccess, OpenAiCompatClient, TripPlanner};
use tripit_catalog::DestinationCatalog;
use tripit_core::{
    DestinationRecord, Itinerary, ItineraryRequest, PlanningError, RecommendationResponse,
    SuggestionContext, UserPreferences,
};
use tripit_observability::{AppMetrics, MetricsSnapshot};
use tripit_storage::{SaveOutcome, Store};

use crate::auth::{AuthError, AuthenticatedUser, TokenResolver};
use crate::config::Settings;
use crate::rate_limit::ClientRateLimiter;

pub const SERVICE_NAME: &str = "tripit-api";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub type Planner = TripPlanner<Store, OpenAiCompatClient>;

#[derive(Clone)]
pub struct ApiState {
    pub planner: Arc<Planner>,
    pub metrics: Arc<AppMetrics>,
    pub limiter: Option<ClientRateLimiter>,
    pub auth: TokenResolver,
    pub storage_backend: &'static str,
    pub allowed_origins: Arc<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct ServiceInfo {
    message: &'static str,
    version: &'static str,
    status: &'static str,
    docs: &'static str,
}

#[derive(Debug, Serialize)]
struct HealthCapabilities {
    model_provider: bool,
    model: Option<String>,
    storage: &'static str,
    destinations_loaded: usize,
    auth: bool,
    rate_limit: bool,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    timestamp_utc: String,
    metrics: MetricsSnapshot,
    capabilities: HealthCapabilities,
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    response: String,
}

#[derive(Debug, Serialize)]
struct SuggestionResponse {
    suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tip: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SaveItineraryRequest {
    itinerary: Itinerary,
}

#[derive(Debug, Serialize)]
struct SaveItineraryResponse {
    success: bool,
    id: String,
}

#[derive(Debug, Serialize)]
struct DeleteResponse {
    success: bool,
}

#[derive(Debug, Serialize)]
struct ReloadResponse {
    success: bool,
    destinations_loaded: usize,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Unauthorized(#[from] AuthError),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("itinerary belongs to another user")]
    Conflict,
    #[error("no destinations available")]
    CatalogUnavailable,
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl From<PlanningError> for ApiError {
    fn from(value: PlanningError) -> Self {
        match value {
            PlanningError::CatalogUnavailable => ApiError::CatalogUnavailable,
            PlanningError::InvalidPreferences(reason) => ApiError::InvalidRequest(reason),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        ApiError::InvalidRequest(value.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Conflict => (StatusCode::CONFLICT, "conflict"),
            ApiError::CatalogUnavailable => {
                (StatusCode::SERVICE_UNAVAILABLE, "catalog_unavailable")
            }
            ApiError::Internal(err) => {
                tracing::error!(error = ?err, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };

        let message = match &self {
            ApiError::Unauthorized(AuthError::Backend(_)) => {
                "could not validate credentials".to_string()
            }
            other => other.to_string(),
        };

        let mut response = (
            status,
            Json(serde_json::json!({
                "error": code,
                "message": message
            })),
        )
            .into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

pub async fn build_state(settings: &Settings) -> Result<ApiState> {
    let metrics = AppMetrics::shared();
    let catalog = DestinationCatalog::open(&settings.catalog_path);

    let store = match &settings.database_url {
        Some(database_url) => Store::sqlite(database_url)
            .await
            .context("failed to open itinerary database")?,
        None => Store::memory(),
    };
    let storage_backend = store.backend_name();

    let access = match settings.provider.clone() {
        Some(config) => ModelAccess::Available(Arc::new(
            OpenAiCompatClient::new(config).context("failed to initialize model provider")?,
        )),
        None => ModelAccess::NotConfigured,
    };

    let planner = Arc::new(TripPlanner::new(
        catalog,
        Arc::new(store),
        access,
        settings.generation.clone(),
        Arc::clone(&metrics),
    ));

    let limiter = settings.rate_limit.enabled.then(|| {
        ClientRateLimiter::new(settings.rate_limit.window, settings.rate_limit.max_requests)
    });
    let auth = TokenResolver::new(&settings.auth)?;
    if !auth.is_configured() {
        tracing::warn!("no token resolver configured, authenticated routes will reject requests");
    }

    Ok(ApiState {
        planner,
        metrics,
        limiter,
        auth,
        storage_backend,
        allowed_origins: Arc::new(settings.allowed_origins.clone()),
    })
}

pub async fn build_app(settings: &Settings) -> Result<Router> {
    Ok(build_router(build_state(settings).await?))
}

fn api_routes() -> Router<ApiState> {
    Router::new()
        .route("/recommendations", post(recommendations))
        .route("/destinations", get(list_destinations))
        .route("/destinations/reload", post(reload_destinations))
        .route("/destinations/:id", get(get_destination))
        .route("/itinerary/generate", post(generate_itinerary))
        .route("/itinerary/save", post(save_itinerary))
        .route("/itinerary/user/all", get(list_user_itineraries))
        .route(
            "/itinerary/:id",
            get(get_itinerary).delete(delete_itinerary),
        )
        .route("/chat", post(chat))
        .route("/suggestions", post(suggestions))
}

pub fn build_router(state: ApiState) -> Router {
    let api = api_routes();

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api/v1", api.clone())
        .nest("/api", api)
        .layer(build_cors_layer(&state.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(RequestBodyLimitLayer::new(64 * 1024))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .with_state(state)
}

async fn root() -> impl IntoResponse {
    Json(ServiceInfo {
        message: "Welcome to TripIT AI API",
        version: VERSION,
        status: "running",
        docs: "/health",
    })
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let stats = state.planner.catalog_stats();
    let payload = HealthResponse {
        status: "healthy",
        service: SERVICE_NAME,
        version: VERSION,
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        metrics: state.metrics.snapshot(),
        capabilities: HealthCapabilities {
            model_provider: state.planner.model_available(),
            model: state.planner.model_name().map(str::to_string),
            storage: state.storage_backend,
            destinations_loaded: stats.destinations_loaded,
            auth: state.auth.is_configured(),
            rate_limit: state.limiter.is_some(),
        },
    };
    (StatusCode::OK, Json(payload))
}

async fn recommendations(
    State(state): State<ApiState>,
    payload: Result<Json<UserPreferences>, JsonRejection>,
) -> Result<Json<RecommendationResponse>, ApiError> {
    let Json(preferences) = payload?;
    tracing::info!(
        travel_type = %preferences.travel_type,
        interest = %preferences.interest,
        budget = preferences.budget,
        days = preferences.days,
        "recommendations request"
    );
    let response = state.planner.recommend(preferences).await?;
    Ok(Json(response))
}

async fn list_destinations(State(state): State<ApiState>) -> Json<Vec<DestinationRecord>> {
    Json(state.planner.destinations().as_ref().clone())
}

async fn get_destination(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<DestinationRecord>, ApiError> {
    state
        .planner
        .destination(&id)
        .map(Json)
        .ok_or(ApiError::NotFound("Destination not found"))
}

async fn reload_destinations(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> Result<Json<ReloadResponse>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let destinations_loaded = state.planner.reload_catalog()?;
    tracing::info!(user_id = %user.id, destinations_loaded, "destination catalog reloaded");
    Ok(Json(ReloadResponse {
        success: true,
        destinations_loaded,
    }))
}

async fn generate_itinerary(
    State(state): State<ApiState>,
    headers: HeaderMap,
    payload: Result<Json<ItineraryRequest>, JsonRejection>,
) -> Result<Json<Itinerary>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let Json(request) = payload?;
    tracing::info!(
        user_id = %user.id,
        destination = %request.destination,
        days = request.days,
        "itinerary generation request"
    );
    let itinerary = state.planner.generate_itinerary(request).await?;
    Ok(Json(itinerary))
}

async fn save_itinerary(
    State(state): State<ApiState>,
    headers: HeaderMap,
    payload: Result<Json<SaveItineraryRequest>, JsonRejection>,
) -> Result<Json<SaveItineraryResponse>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let Json(SaveItineraryRequest { itinerary }) = payload?;
    if itinerary.id.trim().is_empty() {
        return Err(ApiError::InvalidRequest(
            "itinerary id must not be empty".to_string(),
        ));
    }

    match state.planner.save_itinerary(&itinerary, &user.id).await? {
        SaveOutcome::Created | SaveOutcome::Updated => Ok(Json(SaveItineraryResponse {
            success: true,
            id: itinerary.id,
        })),
        SaveOutcome::OwnedByAnother => Err(ApiError::Conflict),
    }
}

async fn get_itinerary(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<Itinerary>, ApiError> {
    state
        .planner
        .get_itinerary(&id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("Itinerary not found"))
}

async fn list_user_itineraries(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Itinerary>>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let itineraries = state.planner.list_itineraries(&user.id).await?;
    Ok(Json(itineraries))
}

async fn delete_itinerary(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    if state.planner.delete_itinerary(&id, &user.id).await? {
        Ok(Json(DeleteResponse { success: true }))
    } else {
        Err(ApiError::NotFound("Itinerary not found or unauthorized"))
    }
}

async fn chat(
    State(state): State<ApiState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload?;
    let response = state.planner.chat(&request.message).await?;
    Ok(Json(ChatResponse { response }))
}

async fn suggestions(
    State(state): State<ApiState>,
    payload: Result<Json<SuggestionContext>, JsonRejection>,
) -> Result<Json<SuggestionResponse>, ApiError> {
    let Json(context) = payload?;
    let suggestions = state.planner.suggestions(context).await?;
    Ok(Json(SuggestionResponse {
        suggestions,
        tip: None,
    }))
}

async fn authenticate(
    state: &ApiState,
    headers: &HeaderMap,
) -> Result<AuthenticatedUser, ApiError> {
    state.auth.authenticate(headers).await.map_err(|err| {
        tracing::warn!(error = %err, "authentication failed");
        ApiError::Unauthorized(err)
    })
}

fn build_cors_layer(allowed_origins: &Arc<Vec<String>>) -> CorsLayer {
    let origins = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect::<Vec<_>>();
    let origins = if origins.is_empty() {
        vec![HeaderValue::from_static("http://localhost:5173")]
    } else {
        origins
    };

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

async fn rate_limit_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS || is_public_endpoint(request.uri().path()) {
        return next.run(request).await;
    }

    if let Some(limiter) = state.limiter.as_ref() {
        let client = request_ip(&request);
        if !limiter.allow(&client) {
            state.metrics.inc_rate_limited();
            tracing::warn!(client = %client, path = %request.uri().path(), "rate limit exceeded");
            let retry_after = limiter.window().as_secs().max(1);
            let mut response = (
                StatusCode::TOO_MANY_REQUESTS,
                Json(serde_json::json!({
                    "error": "rate_limited",
                    "message": "Too many requests. Please slow down.",
                    "retry_after_seconds": retry_after
                })),
            )
                .into_response();
            if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
            return response;
        }
    }

    next.run(request).await
}

fn is_public_endpoint(path: &str) -> bool {
    matches!(path, "/" | "/health")
}

fn request_ip(request: &Request<Body>) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            value
                .split(',')
                .next()
                .unwrap_or("unknown")
                .trim()
                .to_string()
        })
        .unwrap_or_else(|| "local".to_string())
}
