//! Session API endpoints.
//!
//! Creating, importing and inspecting hosted flights, plus the derived
//! timeline, chart and map views.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use flightdeck_core::{
    path_length_m, prepare_chart_series, simplify_path, ChartOptions, FlightSession, GapFill, Metric,
    PlaybackSnapshot, TelemetryPoint, TimelineEvent, Timecode, TrackPoint, DEFAULT_MAX_POINTS,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::state::{AppState, SessionListing, SessionRuntime};

const DEFAULT_TRACK_TOLERANCE_M: f64 = 5.0;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateSessionRequest {
    pub seed: Option<u64>,
    pub duration: Option<Timecode>,
}

#[derive(Debug, Serialize)]
pub struct SessionCreated {
    pub session_id: String,
    pub flight_id: String,
    pub drone_id: String,
    pub duration: Timecode,
}

impl SessionCreated {
    fn from_runtime(runtime: &SessionRuntime) -> Self {
        let session = runtime.session();
        Self {
            session_id: runtime.id().to_string(),
            flight_id: session.flight_id.clone(),
            drone_id: session.drone_id.clone(),
            duration: session.duration,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionDetail {
    pub session_id: String,
    pub session: FlightSession,
    pub playback: PlaybackSnapshot,
}

pub(crate) fn lookup(state: &AppState, id: &str) -> Result<Arc<SessionRuntime>, ApiError> {
    state
        .get_session(id)
        .ok_or_else(|| ApiError::SessionNotFound(id.to_string()))
}

/// Create a session from the mock flight generator.
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SessionCreated>), ApiError> {
    let runtime = state.create_mock_session(req.seed, req.duration)?;
    tracing::info!(
        "Created mock session {} ({}, {})",
        runtime.id(),
        runtime.session().flight_id,
        runtime.session().duration
    );
    Ok((StatusCode::CREATED, Json(SessionCreated::from_runtime(&runtime))))
}

/// Host a flight log supplied by the caller.
pub async fn import_session(
    State(state): State<Arc<AppState>>,
    Json(session): Json<FlightSession>,
) -> Result<(StatusCode, Json<SessionCreated>), ApiError> {
    let runtime = state.import_session(session)?;
    tracing::info!(
        "Imported session {} ({})",
        runtime.id(),
        runtime.session().flight_id
    );
    Ok((StatusCode::CREATED, Json(SessionCreated::from_runtime(&runtime))))
}

pub async fn list_sessions(State(state): State<Arc<AppState>>) -> Json<Vec<SessionListing>> {
    Json(state.list_sessions())
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionDetail>, ApiError> {
    let runtime = lookup(&state, &id)?;
    Ok(Json(SessionDetail {
        session_id: runtime.id().to_string(),
        session: runtime.session().clone(),
        playback: runtime.snapshot(),
    }))
}

/// Tear down a session; its timers stop with it.
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> StatusCode {
    if state.remove_session(&id) {
        tracing::info!("Deleted session {}", id);
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

#[derive(Debug, Deserialize)]
pub struct ClusterQuery {
    pub threshold: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct ClusterView {
    /// Mean member time in seconds.
    pub position: f64,
    /// `position` rounded to the nearest second.
    pub timestamp: Timecode,
    pub is_cluster: bool,
    pub count: usize,
    pub events: Vec<TimelineEvent>,
}

pub async fn get_clusters(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<ClusterQuery>,
) -> Result<Json<Vec<ClusterView>>, ApiError> {
    let runtime = lookup(&state, &id)?;
    let threshold = query.threshold.unwrap_or(state.config().cluster_threshold_secs);

    let clusters = runtime
        .session()
        .clusters(threshold)
        .into_iter()
        .map(|cluster| ClusterView {
            position: cluster.position,
            timestamp: Timecode::from_secs(cluster.position.round() as u64),
            is_cluster: cluster.is_cluster(),
            count: cluster.len(),
            events: cluster.events,
        })
        .collect();
    Ok(Json(clusters))
}

#[derive(Debug, Deserialize)]
pub struct SeriesQuery {
    pub fill_gaps: Option<bool>,
    pub max_points: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SeriesView {
    pub metric: Metric,
    pub unit: &'static str,
    pub original_points: usize,
    pub points: Vec<TelemetryPoint>,
}

/// Telemetry series prepared for a chart: gap-filled, then decimated.
pub async fn get_telemetry(
    State(state): State<Arc<AppState>>,
    Path((id, metric)): Path<(String, String)>,
    Query(query): Query<SeriesQuery>,
) -> Result<Json<SeriesView>, ApiError> {
    let runtime = lookup(&state, &id)?;
    let metric: Metric = metric.parse()?;
    let series = runtime
        .session()
        .series(metric)
        .ok_or_else(|| ApiError::SeriesNotFound(metric.to_string()))?;

    let options = ChartOptions {
        gap_fill: query.fill_gaps.unwrap_or(true).then(GapFill::default),
        max_points: query.max_points.unwrap_or(DEFAULT_MAX_POINTS),
    };
    let prepared = prepare_chart_series(series, &options);

    Ok(Json(SeriesView {
        metric,
        unit: metric.unit(),
        original_points: series.points.len(),
        points: prepared.points,
    }))
}

#[derive(Debug, Deserialize)]
pub struct TrackQuery {
    pub tolerance_m: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct TrackView {
    pub original_points: usize,
    pub length_m: f64,
    pub points: Vec<TrackPoint>,
}

/// Flight path reduced for the map.
pub async fn get_simplified_track(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<TrackQuery>,
) -> Result<Json<TrackView>, ApiError> {
    let runtime = lookup(&state, &id)?;
    let track = &runtime.session().track;
    let tolerance = query.tolerance_m.unwrap_or(DEFAULT_TRACK_TOLERANCE_M);

    Ok(Json(TrackView {
        original_points: track.len(),
        length_m: path_length_m(track),
        points: simplify_path(track, tolerance),
    }))
}
