//! Error type shared by the timeline engine.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// Input was not `HH:MM:SS` with three numeric fields.
    #[error("invalid timestamp {0:?}, expected HH:MM:SS")]
    InvalidTimestamp(String),

    #[error("unsupported playback speed {0}, expected 1, 1.5 or 2")]
    UnsupportedSpeed(f64),

    #[error("unknown telemetry metric {0:?}")]
    UnknownMetric(String),

    #[error("invalid flight session: {0}")]
    InvalidSession(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
