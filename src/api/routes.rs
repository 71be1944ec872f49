use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::error;

use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::config::CORS_ALLOW_HEADERS;
use crate::error::AppError;
use crate::normalizer::Normalizer;
use crate::types::{ActionRequest, DataSource};
use crate::upstream::DomaUpstream;

pub const DATA_SOURCE_HEADER: &str = "x-data-source";

pub struct ApiState<U> {
    pub normalizer: Arc<Normalizer<U>>,
    pub health: Arc<HealthState>,
    pub latency: Arc<LatencyStats>,
}

impl<U> Clone for ApiState<U> {
    fn clone(&self) -> Self {
        Self {
            normalizer: Arc::clone(&self.normalizer),
            health: Arc::clone(&self.health),
            latency: Arc::clone(&self.latency),
        }
    }
}

/// `/` and `/doma-auctions` are the same function; the second matches the
/// path browsers used when this ran as a hosted edge function.
pub fn router<U: DomaUpstream>(state: ApiState<U>) -> Router {
    Router::new()
        .route("/", post(invoke::<U>).options(preflight))
        .route("/doma-auctions", post(invoke::<U>).options(preflight))
        .route("/health", get(get_health::<U>))
        .with_state(state)
}

fn cors_headers() -> [(HeaderName, HeaderValue); 2] {
    [
        (header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*")),
        (
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(CORS_ALLOW_HEADERS),
        ),
    ]
}

async fn preflight() -> Response {
    (StatusCode::NO_CONTENT, cors_headers()).into_response()
}

/// The body is parsed here rather than by the `Json` extractor so that a
/// malformed body takes the same `{error}` path as every other failure.
async fn invoke<U: DomaUpstream>(State(state): State<ApiState<U>>, body: Bytes) -> Response {
    let started = Instant::now();
    state.health.inc_requests();

    let result = match serde_json::from_slice::<ActionRequest>(&body) {
        Ok(req) => state.normalizer.handle(req).await,
        Err(e) => Err(AppError::from(e)),
    };
    state.latency.record(started.elapsed());

    match result {
        Ok(envelope) => {
            if envelope.source == DataSource::Synthetic {
                state.health.inc_fallbacks();
            }
            let source = HeaderValue::from_static(envelope.source.as_str());
            (
                StatusCode::OK,
                cors_headers(),
                [(HeaderName::from_static(DATA_SOURCE_HEADER), source)],
                Json(envelope.body),
            )
                .into_response()
        }
        Err(e) => {
            if e.status().is_server_error() {
                state.health.inc_upstream_failures();
                error!("Error in doma-auctions handler: {e}");
            }
            e.into_response()
        }
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub fallback_mode: String,
    pub requests_total: u64,
    pub fallbacks_served: u64,
    pub upstream_failures: u64,
    pub latency_p50_us: Option<u64>,
    pub latency_p95_us: Option<u64>,
    pub latency_p99_us: Option<u64>,
    pub sample_count: u64,
}

async fn get_health<U: DomaUpstream>(State(state): State<ApiState<U>>) -> Json<HealthResponse> {
    let (p50, p95, p99) = state.latency.percentiles();
    Json(HealthResponse {
        status: "ok",
        fallback_mode: state.normalizer.fallback_mode().to_string(),
        requests_total: state.health.requests_total(),
        fallbacks_served: state.health.fallbacks_served(),
        upstream_failures: state.health.upstream_failures(),
        latency_p50_us: p50,
        latency_p95_us: p95,
        latency_p99_us: p99,
        sample_count: state.latency.len(),
    })
}
