//! Local terminal replay, driving a [`Playback`] cursor off a tokio interval.

use flightdeck_core::{
    FlightSession, Playback, PlaybackSpeed, TickOutcome, TimelineEvent, Timecode, Timestamped, TrackPosition,
    TICK_INTERVAL,
};
use tokio::time::{interval_at, Instant, MissedTickBehavior};

#[derive(Debug, Clone, Copy)]
pub struct ReplayOptions {
    pub from: Timecode,
    /// Stop early once the cursor reaches this position.
    pub until: Option<Timecode>,
    pub speed: PlaybackSpeed,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            from: Timecode::ZERO,
            until: None,
            speed: PlaybackSpeed::X1,
        }
    }
}

/// State after one tick.
#[derive(Debug, Clone)]
pub struct ReplayFrame {
    pub position: Timecode,
    pub progress: f64,
    pub phase: Option<String>,
    pub location: Option<TrackPosition>,
    /// Events passed since the previous frame.
    pub events: Vec<TimelineEvent>,
    pub finished: bool,
}

/// Play `session` from `options.from`, calling `on_frame` after every tick.
/// Returns the final position.
pub async fn replay(
    session: &FlightSession,
    options: ReplayOptions,
    mut on_frame: impl FnMut(&ReplayFrame),
) -> Timecode {
    let mut events = session.events();
    events.sort_by_key(|e| e.timestamp());

    let mut playback = Playback::new(session.duration);
    playback.seek(options.from.as_secs() as i64);
    playback.clear_jumping();
    playback.set_speed(options.speed);
    if !playback.toggle_playback() {
        return playback.position();
    }

    let mut last = playback.position();
    let mut ticker = interval_at(Instant::now() + TICK_INTERVAL, TICK_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let (position, finished) = match playback.tick() {
            TickOutcome::Idle => break,
            TickOutcome::Advanced(position) => (position, false),
            TickOutcome::Finished(position) => (position, true),
        };

        let passed = events
            .iter()
            .filter(|e| e.timestamp() > last && e.timestamp() <= position)
            .cloned()
            .collect();
        last = position;

        let frame = ReplayFrame {
            position,
            progress: playback.progress(),
            phase: session.phase_at(position).map(|p| p.name.clone()),
            location: session.position_at(playback.position_ms() as f64 / 1000.0),
            events: passed,
            finished,
        };
        on_frame(&frame);

        if finished || options.until.is_some_and(|until| position >= until) {
            break;
        }
    }

    playback.pause();
    playback.position()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flightdeck_core::MockFlight;

    fn session() -> FlightSession {
        MockFlight::new(8).duration(Timecode::from_secs(120)).generate()
    }

    #[tokio::test(start_paused = true)]
    async fn replays_to_end_at_double_speed() {
        let session = session();
        let mut frames = Vec::new();
        let options = ReplayOptions {
            from: Timecode::from_secs(100),
            speed: PlaybackSpeed::X2,
            ..ReplayOptions::default()
        };

        let end = replay(&session, options, |f| frames.push(f.clone())).await;
        assert_eq!(end, Timecode::from_secs(120));
        assert_eq!(frames.len(), 20);
        assert!(frames.windows(2).all(|w| w[0].position < w[1].position));
        assert!(frames.last().unwrap().finished);
        assert_eq!(frames.iter().filter(|f| f.finished).count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_at_until() {
        let session = session();
        let options = ReplayOptions {
            from: Timecode::from_secs(10),
            until: Some(Timecode::from_secs(15)),
            speed: PlaybackSpeed::X1,
        };
        let mut count = 0;
        let end = replay(&session, options, |_| count += 1).await;
        assert_eq!(end, Timecode::from_secs(15));
        assert_eq!(count, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn reports_each_event_once() {
        let session = session();
        let mut seen = 0;
        replay(&session, ReplayOptions::default(), |f| seen += f.events.len()).await;
        let after_start = session
            .events()
            .iter()
            .filter(|e| e.timestamp() > Timecode::ZERO)
            .count();
        assert_eq!(seen, after_start);
    }

    #[tokio::test(start_paused = true)]
    async fn starting_at_end_does_nothing() {
        let session = session();
        let options = ReplayOptions {
            from: Timecode::from_secs(500),
            ..ReplayOptions::default()
        };
        let mut count = 0;
        let end = replay(&session, options, |_| count += 1).await;
        assert_eq!(end, Timecode::from_secs(120));
        assert_eq!(count, 0);
    }
}
