//! Playback control endpoints.
//!
//! Every mutating route funnels into [`SessionRuntime::apply`], so HTTP,
//! WebSocket and CLI clients share one transition path.

use axum::{
    extract::{Path, State},
    Json,
};
use flightdeck_core::{CoreError, PlaybackSnapshot, PlaybackSpeed};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::api::sessions::lookup;
use crate::state::{AppState, PlaybackCommand, SessionRuntime};

fn apply(state: &AppState, id: &str, command: PlaybackCommand) -> Result<Json<PlaybackSnapshot>, ApiError> {
    let runtime: Arc<SessionRuntime> = lookup(state, id)?;
    Ok(Json(runtime.apply(command)?))
}

pub async fn get_playback(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PlaybackSnapshot>, ApiError> {
    Ok(Json(lookup(&state, &id)?.snapshot()))
}

/// Generic command endpoint taking a tagged [`PlaybackCommand`].
pub async fn post_command(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(command): Json<PlaybackCommand>,
) -> Result<Json<PlaybackSnapshot>, ApiError> {
    apply(&state, &id, command)
}

pub async fn toggle(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PlaybackSnapshot>, ApiError> {
    apply(&state, &id, PlaybackCommand::Toggle)
}

/// Either `position` (`HH:MM:SS`) or `seconds`; `position` wins when both are set.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SeekRequest {
    pub position: Option<String>,
    pub seconds: Option<i64>,
}

pub async fn seek(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<SeekRequest>,
) -> Result<Json<PlaybackSnapshot>, ApiError> {
    let command = match (req.position, req.seconds) {
        (Some(position), _) => PlaybackCommand::Seek { position },
        (None, Some(seconds)) => PlaybackCommand::SeekSeconds { seconds },
        (None, None) => {
            return Err(CoreError::InvalidTimestamp("seek needs a position or seconds".into()).into())
        }
    };
    apply(&state, &id, command)
}

pub async fn skip_forward(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PlaybackSnapshot>, ApiError> {
    apply(&state, &id, PlaybackCommand::SkipForward)
}

pub async fn skip_backward(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PlaybackSnapshot>, ApiError> {
    apply(&state, &id, PlaybackCommand::SkipBackward)
}

pub async fn next_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PlaybackSnapshot>, ApiError> {
    apply(&state, &id, PlaybackCommand::NextEvent)
}

pub async fn previous_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PlaybackSnapshot>, ApiError> {
    apply(&state, &id, PlaybackCommand::PreviousEvent)
}

#[derive(Debug, Deserialize)]
pub struct SpeedRequest {
    pub speed: f64,
}

pub async fn set_speed(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<SpeedRequest>,
) -> Result<Json<PlaybackSnapshot>, ApiError> {
    let speed = PlaybackSpeed::try_from(req.speed)?;
    apply(&state, &id, PlaybackCommand::SetSpeed { speed })
}

pub async fn drag_start(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PlaybackSnapshot>, ApiError> {
    apply(&state, &id, PlaybackCommand::BeginDrag)
}

#[derive(Debug, Deserialize)]
pub struct DragRequest {
    pub seconds: i64,
}

pub async fn drag_move(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<DragRequest>,
) -> Result<Json<PlaybackSnapshot>, ApiError> {
    apply(&state, &id, PlaybackCommand::DragTo { seconds: req.seconds })
}

pub async fn drag_end(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PlaybackSnapshot>, ApiError> {
    apply(&state, &id, PlaybackCommand::EndDrag)
}
