//! Timers behind a playing session.
//!
//! Both tasks hold only a weak reference, so dropping the session ends them.

use std::sync::Weak;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};

use crate::state::SessionRuntime;
use flightdeck_core::TICK_INTERVAL;

/// Tick the session every [`TICK_INTERVAL`] until it pauses or finishes.
pub fn spawn_ticker(runtime: Weak<SessionRuntime>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + TICK_INTERVAL, TICK_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let Some(runtime) = runtime.upgrade() else {
                break;
            };
            if !runtime.on_tick() {
                tracing::debug!(session = %runtime.id(), "Playback ticker stopped");
                break;
            }
        }
    })
}

/// Clear the jump flag after `delay`.
pub fn spawn_jump_reset(runtime: Weak<SessionRuntime>, delay: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        sleep(delay).await;
        if let Some(runtime) = runtime.upgrade() {
            runtime.settle_jump();
        }
    })
}
