use axum::{extract::State, Extension, Json};
use evloc_core::{Point, SelectionKind, Station};
use evloc_render::{LocateOutcome, StationResult};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_locate_error, run_blocking, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct NearestRequest {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Deserialize)]
pub(super) struct BestInRangeRequest {
    pub lat: f64,
    pub lng: f64,
    /// Search radius in the same planar degree units as the distance metric.
    pub range: f64,
}

#[derive(Debug, Serialize)]
pub(super) struct LocateData {
    pub station: Station,
    pub selection: SelectionKind,
    pub plot_url: String,
}

/// Unwrapped body served on the legacy routes.
#[derive(Debug, Serialize)]
pub(super) struct LegacyLocateData {
    pub station: Station,
    pub plot_url: String,
}

impl From<StationResult> for LocateData {
    fn from(result: StationResult) -> Self {
        Self {
            plot_url: result.plot.data_uri(),
            station: result.station,
            selection: result.kind,
        }
    }
}

impl From<StationResult> for LegacyLocateData {
    fn from(result: StationResult) -> Self {
        Self {
            plot_url: result.plot.data_uri(),
            station: result.station,
        }
    }
}

async fn run_nearest(
    state: &AppState,
    req_id: &RequestId,
    body: &NearestRequest,
) -> Result<StationResult, ApiError> {
    let point = Point::new(body.lat, body.lng);
    let locator = state.locator.clone();
    run_blocking(state.render_timeout, &req_id.0, move |cancelled| {
        locator.locate_nearest_cancellable(point, cancelled)
    })
    .await?
    .map_err(|e| map_locate_error(req_id.0.clone(), &e))
}

async fn run_best_in_range(
    state: &AppState,
    req_id: &RequestId,
    body: &BestInRangeRequest,
) -> Result<StationResult, ApiError> {
    let point = Point::new(body.lat, body.lng);
    let radius = body.range;
    let locator = state.locator.clone();
    let outcome = run_blocking(state.render_timeout, &req_id.0, move |cancelled| {
        locator.locate_best_in_range_cancellable(point, radius, cancelled)
    })
    .await?
    .map_err(|e| map_locate_error(req_id.0.clone(), &e))?;

    match outcome {
        LocateOutcome::Found(result) => Ok(result),
        LocateOutcome::NotFound => Err(ApiError::new(
            req_id.0.clone(),
            "not_found",
            format!("no charging station within range {radius}"),
        )),
    }
}

pub(super) async fn nearest(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<NearestRequest>,
) -> Result<Json<ApiResponse<LocateData>>, ApiError> {
    let result = run_nearest(&state, &req_id, &body).await?;
    Ok(Json(ApiResponse {
        data: LocateData::from(result),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn best_in_range(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<BestInRangeRequest>,
) -> Result<Json<ApiResponse<LocateData>>, ApiError> {
    let result = run_best_in_range(&state, &req_id, &body).await?;
    Ok(Json(ApiResponse {
        data: LocateData::from(result),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn legacy_nearest(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<NearestRequest>,
) -> Result<Json<LegacyLocateData>, ApiError> {
    let result = run_nearest(&state, &req_id, &body).await?;
    Ok(Json(LegacyLocateData::from(result)))
}

pub(super) async fn legacy_best_in_range(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<BestInRangeRequest>,
) -> Result<Json<LegacyLocateData>, ApiError> {
    let result = run_best_in_range(&state, &req_id, &body).await?;
    Ok(Json(LegacyLocateData::from(result)))
}
