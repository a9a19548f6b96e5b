//! REST API routes.

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::api::{playback, sessions, ws};
use crate::state::AppState;

/// Create the API router.
pub fn create_router() -> Router<Arc<AppState>> {
    let session_routes = Router::new()
        .route("/v1/sessions", get(sessions::list_sessions).post(sessions::create_session))
        .route("/v1/sessions/import", post(sessions::import_session))
        .route(
            "/v1/sessions/:id",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        .route("/v1/sessions/:id/clusters", get(sessions::get_clusters))
        .route("/v1/sessions/:id/telemetry/:metric", get(sessions::get_telemetry))
        .route("/v1/sessions/:id/simplified-track", get(sessions::get_simplified_track));

    let playback_routes = Router::new()
        .route(
            "/v1/sessions/:id/playback",
            get(playback::get_playback).post(playback::post_command),
        )
        .route("/v1/sessions/:id/playback/toggle", post(playback::toggle))
        .route("/v1/sessions/:id/playback/seek", post(playback::seek))
        .route("/v1/sessions/:id/playback/skip-forward", post(playback::skip_forward))
        .route("/v1/sessions/:id/playback/skip-backward", post(playback::skip_backward))
        .route("/v1/sessions/:id/playback/next-event", post(playback::next_event))
        .route("/v1/sessions/:id/playback/previous-event", post(playback::previous_event))
        .route("/v1/sessions/:id/playback/speed", post(playback::set_speed))
        .route("/v1/sessions/:id/playback/drag/start", post(playback::drag_start))
        .route("/v1/sessions/:id/playback/drag/move", post(playback::drag_move))
        .route("/v1/sessions/:id/playback/drag/end", post(playback::drag_end))
        // WebSocket streaming
        .route("/v1/sessions/:id/stream", get(ws::ws_handler));

    session_routes.merge(playback_routes)
}
