//! HTTP and WebSocket API for hosted flight sessions.

pub mod error;
pub mod playback;
mod routes;
pub mod sessions;
pub mod ws;

use axum::Router;
use std::sync::Arc;

use crate::state::AppState;

pub use error::ApiError;

pub fn routes() -> Router<Arc<AppState>> {
    routes::create_router()
}
