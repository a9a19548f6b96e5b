//! Server configuration from environment.

use flightdeck_core::{DEFAULT_CLUSTER_THRESHOLD_SECS, JUMP_FEEDBACK};
use std::env;
use std::time::Duration;

const JUMP_FEEDBACK_MIN_MS: u64 = 300;
const JUMP_FEEDBACK_MAX_MS: u64 = 500;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    /// How long `is_jumping` stays set after a seek.
    pub jump_feedback: Duration,
    pub cluster_threshold_secs: u64,
    /// Seed for mock sessions created without one.
    pub mock_seed: Option<u64>,
    pub broadcast_capacity: usize,
}

impl Config {
    pub fn from_env() -> Self {
        let jump_feedback_ms = env::var("FLIGHTDECK_JUMP_FEEDBACK_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok());

        Self {
            server_port: env::var("FLIGHTDECK_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3000),
            jump_feedback: jump_feedback(jump_feedback_ms),
            cluster_threshold_secs: env::var("FLIGHTDECK_CLUSTER_THRESHOLD_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_CLUSTER_THRESHOLD_SECS),
            mock_seed: env::var("FLIGHTDECK_MOCK_SEED")
                .ok()
                .and_then(|s| s.parse().ok()),
            broadcast_capacity: env::var("FLIGHTDECK_BROADCAST_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|&n: &usize| n > 0)
                .unwrap_or(256),
        }
    }
}

/// Jump feedback window, kept within 300..=500 ms.
fn jump_feedback(ms: Option<u64>) -> Duration {
    let ms = ms
        .unwrap_or(JUMP_FEEDBACK.as_millis() as u64)
        .clamp(JUMP_FEEDBACK_MIN_MS, JUMP_FEEDBACK_MAX_MS);
    Duration::from_millis(ms)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            jump_feedback: JUMP_FEEDBACK,
            cluster_threshold_secs: DEFAULT_CLUSTER_THRESHOLD_SECS,
            mock_seed: None,
            broadcast_capacity: 256,
        }
    }
}
