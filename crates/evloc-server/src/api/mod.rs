mod document;
mod locate;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use evloc_core::QueryError;
use evloc_render::{LocateError, StationLocator};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{request_id, RequestId, REQUEST_ID_HEADER};

#[derive(Clone)]
pub struct AppState {
    pub locator: StationLocator,
    /// Upper bound on a single select-render-save or export call.
    pub render_timeout: Duration,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    stations: usize,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "catalog_empty" => StatusCode::SERVICE_UNAVAILABLE,
            "timeout" => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_locate_error(request_id: String, error: &LocateError) -> ApiError {
    match error {
        LocateError::Query(QueryError::EmptyCatalog) => {
            tracing::error!("query against empty station catalog");
            ApiError::new(request_id, "catalog_empty", error.to_string())
        }
        LocateError::Query(
            QueryError::InvalidRadius(_) | QueryError::NonFiniteCoordinate { .. },
        ) => ApiError::new(request_id, "validation_error", error.to_string()),
        LocateError::Cancelled => ApiError::new(request_id, "timeout", "request timed out"),
        LocateError::Render(e) => {
            tracing::error!(error = %e, "rendering failed");
            ApiError::new(request_id, "internal_error", "failed to render result")
        }
    }
}

/// Run CPU-bound rendering off the async workers, bounded by `timeout`.
///
/// A blocking task cannot be aborted, so on timeout the flag handed to `f` is
/// raised instead; locate calls check it before writing the artifact slot.
pub(super) async fn run_blocking<T, F>(
    timeout: Duration,
    request_id: &str,
    f: F,
) -> Result<T, ApiError>
where
    F: FnOnce(&AtomicBool) -> T + Send + 'static,
    T: Send + 'static,
{
    let cancelled = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancelled);
    let task = tokio::task::spawn_blocking(move || f(&flag));
    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(join_error)) => {
            tracing::error!(error = %join_error, "blocking task failed");
            Err(ApiError::new(
                request_id,
                "internal_error",
                "background task failed",
            ))
        }
        Err(_) => {
            cancelled.store(true, Ordering::Release);
            tracing::warn!(timeout_secs = timeout.as_secs(), "blocking task timed out");
            Err(ApiError::new(request_id, "timeout", "request timed out"))
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(REQUEST_ID_HEADER)])
}

/// Route names used by the legacy web front end, which reads a bare
/// `{station, plot_url}` body. Each pair shares one handler.
fn legacy_router() -> Router<AppState> {
    Router::new()
        .route("/find_nearest_nsga", post(locate::legacy_nearest))
        .route("/find_nearest_dijkstra", post(locate::legacy_nearest))
        .route("/find_nearest_power_nsga", post(locate::legacy_best_in_range))
        .route("/find_nearest_power_dijkstra", post(locate::legacy_best_in_range))
        .route("/download_pdf", get(document::download))
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/stations/nearest", post(locate::nearest))
        .route("/api/v1/stations/best-in-range", post(locate::best_in_range))
        .route("/api/v1/document", get(document::download))
        .merge(legacy_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);
    let stations = state.locator.catalog().len();

    if stations > 0 {
        (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    stations,
                },
                meta,
            }),
        )
    } else {
        tracing::warn!("health check: station catalog is empty");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse {
                data: HealthData {
                    status: "degraded",
                    stations,
                },
                meta,
            }),
        )
    }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
