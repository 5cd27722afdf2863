pub mod rate_limit;

use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::{Json, State};
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{body::Body, Router};
use serde::{Deserialize, Serialize};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;
use wander_agents::{Capabilities, DefaultGuide, GuideConfig, GuideError};
use wander_core::{Location, Message, PointOfInterest, StoryResponse};
use wander_observability::{AppMetrics, MetricsSnapshot};

use crate::rate_limit::IpRateLimiter;

const MAX_BODY_BYTES: usize = 64 * 1024;
const MAX_HISTORY_TURNS: usize = 40;
const DEFAULT_API_KEY: &str = "dev-wander-key";

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub api_key: String,
    pub rate_limit_window: Duration,
    pub rate_limit_max: usize,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            api_key: DEFAULT_API_KEY.to_string(),
            rate_limit_window: Duration::from_secs(60),
            rate_limit_max: 60,
        }
    }
}

impl ApiSettings {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: env::var("WANDER_API_KEY")
                .ok()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or(defaults.api_key),
            rate_limit_window: env::var("WANDER_RATE_LIMIT_WINDOW_SECONDS")
                .ok()
                .and_then(|value| value.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.rate_limit_window),
            rate_limit_max: env::var("WANDER_RATE_LIMIT_MAX")
                .ok()
                .and_then(|value| value.parse::<usize>().ok())
                .unwrap_or(defaults.rate_limit_max),
        }
    }
}

#[derive(Clone)]
pub struct ApiState {
    pub guide: Arc<DefaultGuide>,
    pub metrics: Arc<AppMetrics>,
    pub api_key: String,
    pub limiter: IpRateLimiter,
}

pub fn build_state(config: &GuideConfig, settings: ApiSettings) -> Result<ApiState> {
    let metrics = AppMetrics::shared();
    let guide = DefaultGuide::from_config(config, metrics.clone())
        .context("failed to initialize guide")?;

    if settings.api_key == DEFAULT_API_KEY {
        warn!("WANDER_API_KEY not set, using the development key");
    }

    Ok(ApiState {
        guide: Arc::new(guide),
        metrics,
        api_key: settings.api_key,
        limiter: IpRateLimiter::new(settings.rate_limit_window, settings.rate_limit_max),
    })
}

pub fn build_app(config: &GuideConfig, settings: ApiSettings) -> Result<Router> {
    Ok(build_router(build_state(config, settings)?))
}

pub fn build_app_from_env() -> Result<Router> {
    let config = GuideConfig::from_env().context("invalid guide configuration")?;
    build_app(&config, ApiSettings::from_env())
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/poi", post(discover_pois))
        .route("/v1/story", post(tell_story))
        .route("/v1/arrival", post(arrival))
        .route("/v1/explore", post(explore))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api_key_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp_utc: String,
    metrics: MetricsSnapshot,
    capabilities: Capabilities,
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let payload = HealthResponse {
        status: "ok",
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        metrics: state.metrics.snapshot(),
        capabilities: state.guide.capabilities().clone(),
    };
    (StatusCode::OK, Json(payload))
}

#[derive(Debug, Deserialize)]
struct PoiRequest {
    location: Location,
    initial_radius: Option<u32>,
}

#[derive(Debug, Serialize)]
struct PoiResponse {
    pois: Vec<PointOfInterest>,
}

async fn discover_pois(
    State(state): State<ApiState>,
    Json(input): Json<PoiRequest>,
) -> Response {
    let location = match input.location.validated() {
        Ok(location) => location,
        Err(error) => return error_response(StatusCode::BAD_REQUEST, "invalid_location", error),
    };
    let discovery_config = state.guide.discovery_config();
    if let Some(radius) = input.initial_radius {
        if !discovery_config.accepts_initial_radius(radius) {
            return error_response(
                StatusCode::BAD_REQUEST,
                "invalid_radius",
                format!(
                    "initial_radius must be between 1 and {} meters",
                    discovery_config.max_radius_m
                ),
            );
        }
    }

    let discovery = state.guide.discover(location, input.initial_radius).await;
    (StatusCode::OK, Json(PoiResponse { pois: discovery.pois })).into_response()
}

#[derive(Debug, Deserialize)]
struct StoryRequest {
    pois: Vec<PointOfInterest>,
    #[serde(default)]
    messages: Vec<Message>,
}

async fn tell_story(State(state): State<ApiState>, Json(input): Json<StoryRequest>) -> Response {
    let pois = usable_pois(input.pois);
    if pois.is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "no_points_of_interest",
            "pois must contain at least one valid point of interest",
        );
    }

    let history = recent_history(input.messages);
    match state.guide.story(&pois, &history).await {
        Ok(narrative) => (StatusCode::OK, Json(narrative.story)).into_response(),
        Err(GuideError::NoCandidates) => error_response(
            StatusCode::BAD_REQUEST,
            "no_points_of_interest",
            GuideError::NoCandidates,
        ),
    }
}

#[derive(Debug, Deserialize)]
struct ArrivalRequest {
    poi: PointOfInterest,
}

async fn arrival(State(state): State<ApiState>, Json(input): Json<ArrivalRequest>) -> Response {
    if !input.poi.is_well_formed() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "invalid_poi",
            "poi needs an id, a name and valid coordinates",
        );
    }

    let report = state.guide.arrive(&input.poi).await;
    (StatusCode::OK, Json(report)).into_response()
}

#[derive(Debug, Deserialize)]
struct ExploreRequest {
    location: Location,
    #[serde(default)]
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct ExploreResponse {
    pois: Vec<PointOfInterest>,
    story: Option<StoryResponse>,
}

async fn explore(State(state): State<ApiState>, Json(input): Json<ExploreRequest>) -> Response {
    let location = match input.location.validated() {
        Ok(location) => location,
        Err(error) => return error_response(StatusCode::BAD_REQUEST, "invalid_location", error),
    };

    let history = recent_history(input.messages);
    let exploration = state.guide.explore(location, &history).await;
    let payload = ExploreResponse {
        pois: exploration.discovery.pois,
        story: exploration.narrative.map(|narrative| narrative.story),
    };
    (StatusCode::OK, Json(payload)).into_response()
}

fn usable_pois(pois: Vec<PointOfInterest>) -> Vec<PointOfInterest> {
    let total = pois.len();
    let usable = pois
        .into_iter()
        .filter(PointOfInterest::is_well_formed)
        .collect::<Vec<_>>();
    if usable.len() < total {
        warn!(dropped = total - usable.len(), "ignoring malformed points of interest");
    }
    usable
}

fn recent_history(mut messages: Vec<Message>) -> Vec<Message> {
    if messages.len() > MAX_HISTORY_TURNS {
        messages = messages.split_off(messages.len() - MAX_HISTORY_TURNS);
    }
    messages
}

fn error_response(status: StatusCode, code: &str, message: impl ToString) -> Response {
    (
        status,
        Json(serde_json::json!({
            "error": code,
            "message": message.to_string()
        })),
    )
        .into_response()
}

fn is_public_endpoint(path: &str) -> bool {
    matches!(path, "/health")
}

async fn api_key_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS || is_public_endpoint(request.uri().path()) {
        return next.run(request).await;
    }

    let header_key = request
        .headers()
        .get("x-api-key")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if header_key != state.api_key {
        return error_response(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "missing or invalid x-api-key",
        );
    }

    next.run(request).await
}

async fn rate_limit_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS || is_public_endpoint(request.uri().path()) {
        return next.run(request).await;
    }

    let ip = request_ip(&request);
    if let Err(retry_after) = state.limiter.check(&ip) {
        let mut response = error_response(
            StatusCode::TOO_MANY_REQUESTS,
            "rate_limited",
            "rate limit exceeded for this IP",
        );
        let seconds = retry_after.as_secs().max(1).to_string();
        if let Ok(value) = HeaderValue::from_str(&seconds) {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
        return response;
    }

    next.run(request).await
}

fn request_ip(request: &Request<Body>) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "local".to_string())
}
