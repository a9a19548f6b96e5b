//! Playback cursor over a fixed flight duration.
//!
//! [`Playback`] is a plain state object; every user action is a method that
//! returns the resulting position so the caller can notify its views. Time
//! only moves through [`Playback::tick`], which the owner calls every
//! [`TICK_INTERVAL`] while playing. Nothing in here touches a clock.

use crate::error::{CoreError, Result};
use crate::timecode::{is_well_formed, time_to_seconds, Timecode};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::time::Duration;

/// Cadence of the playback tick.
pub const TICK_INTERVAL: Duration = Duration::from_millis(500);
/// How long the jump animation flag stays up after a seek.
pub const JUMP_FEEDBACK: Duration = Duration::from_millis(400);
pub const SKIP_SECS: i64 = 30;

/// Longest flight the cursor can address in signed milliseconds.
pub const MAX_DURATION_SECS: u64 = i64::MAX as u64 / MS_PER_SEC;

const MS_PER_SEC: u64 = 1000;

fn secs_to_ms(secs: u64) -> i64 {
    (secs.min(MAX_DURATION_SECS) * MS_PER_SEC) as i64
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PlaybackSpeed {
    #[default]
    X1,
    X1_5,
    X2,
}

impl PlaybackSpeed {
    pub const ALL: [PlaybackSpeed; 3] = [PlaybackSpeed::X1, PlaybackSpeed::X1_5, PlaybackSpeed::X2];

    pub fn factor(self) -> f64 {
        match self {
            PlaybackSpeed::X1 => 1.0,
            PlaybackSpeed::X1_5 => 1.5,
            PlaybackSpeed::X2 => 2.0,
        }
    }

    /// Flight time covered by one tick, `0.5 * speed` seconds.
    pub fn tick_advance_ms(self) -> u64 {
        match self {
            PlaybackSpeed::X1 => 500,
            PlaybackSpeed::X1_5 => 750,
            PlaybackSpeed::X2 => 1000,
        }
    }
}

impl TryFrom<f64> for PlaybackSpeed {
    type Error = CoreError;

    fn try_from(value: f64) -> Result<Self> {
        PlaybackSpeed::ALL
            .into_iter()
            .find(|speed| speed.factor() == value)
            .ok_or(CoreError::UnsupportedSpeed(value))
    }
}

impl Serialize for PlaybackSpeed {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.factor())
    }
}

impl<'de> Deserialize<'de> for PlaybackSpeed {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = f64::deserialize(deserializer)?;
        PlaybackSpeed::try_from(raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    Paused,
    Playing,
}

/// Result of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Paused; nothing moved.
    Idle,
    Advanced(Timecode),
    /// Reached the end of the flight and paused.
    Finished(Timecode),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSnapshot {
    pub position: Timecode,
    pub duration: Timecode,
    pub status: PlaybackStatus,
    pub is_playing: bool,
    pub speed: PlaybackSpeed,
    pub is_dragging: bool,
    pub is_jumping: bool,
    /// Position as a fraction of the duration, `0.0..=1.0`.
    pub progress: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Playback {
    duration_ms: u64,
    position_ms: u64,
    is_playing: bool,
    speed: PlaybackSpeed,
    is_dragging: bool,
    is_jumping: bool,
}

impl Playback {
    /// Durations past [`MAX_DURATION_SECS`] are clamped to it.
    pub fn new(duration: Timecode) -> Self {
        Self {
            duration_ms: secs_to_ms(duration.as_secs()) as u64,
            position_ms: 0,
            is_playing: false,
            speed: PlaybackSpeed::X1,
            is_dragging: false,
            is_jumping: false,
        }
    }

    /// Cursor floored to whole seconds.
    pub fn position(&self) -> Timecode {
        Timecode::from_secs(self.position_ms / MS_PER_SEC)
    }

    pub fn position_ms(&self) -> u64 {
        self.position_ms
    }

    pub fn duration(&self) -> Timecode {
        Timecode::from_secs(self.duration_ms / MS_PER_SEC)
    }

    pub fn status(&self) -> PlaybackStatus {
        if self.is_playing {
            PlaybackStatus::Playing
        } else {
            PlaybackStatus::Paused
        }
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn is_dragging(&self) -> bool {
        self.is_dragging
    }

    pub fn is_jumping(&self) -> bool {
        self.is_jumping
    }

    pub fn speed(&self) -> PlaybackSpeed {
        self.speed
    }

    pub fn is_finished(&self) -> bool {
        self.position_ms >= self.duration_ms
    }

    /// Flip between playing and paused. Returns whether playback is now running.
    ///
    /// The end of the flight is terminal: starting from there is refused until
    /// the cursor is moved back.
    pub fn toggle_playback(&mut self) -> bool {
        if self.is_playing {
            self.is_playing = false;
        } else if !self.is_finished() {
            self.is_playing = true;
        }
        self.is_playing
    }

    pub fn pause(&mut self) {
        self.is_playing = false;
    }

    pub fn tick(&mut self) -> TickOutcome {
        if !self.is_playing {
            return TickOutcome::Idle;
        }

        let next = self.position_ms.saturating_add(self.speed.tick_advance_ms());
        if next >= self.duration_ms {
            self.position_ms = self.duration_ms;
            self.is_playing = false;
            TickOutcome::Finished(self.position())
        } else {
            self.position_ms = next;
            TickOutcome::Advanced(self.position())
        }
    }

    /// Move the cursor to `target_secs`, clamped to the flight.
    pub fn seek(&mut self, target_secs: i64) -> Timecode {
        self.seek_ms(target_secs.saturating_mul(MS_PER_SEC as i64))
    }

    /// Seek to an `HH:MM:SS` string. Malformed input leaves the state untouched.
    pub fn seek_timestamp(&mut self, target: &str) -> Result<Timecode> {
        if !is_well_formed(target) {
            return Err(CoreError::InvalidTimestamp(target.to_string()));
        }
        let secs = time_to_seconds(target)?;
        Ok(self.seek(i64::try_from(secs).unwrap_or(i64::MAX)))
    }

    fn seek_ms(&mut self, target_ms: i64) -> Timecode {
        // Any user-driven move of the cursor stops playback.
        self.is_playing = false;
        self.position_ms = (target_ms.max(0) as u64).min(self.duration_ms);
        self.is_jumping = true;
        self.position()
    }

    pub fn skip_forward(&mut self) -> Timecode {
        self.seek_ms((self.position_ms as i64).saturating_add(SKIP_SECS * MS_PER_SEC as i64))
    }

    pub fn skip_backward(&mut self) -> Timecode {
        self.seek_ms((self.position_ms as i64).saturating_sub(SKIP_SECS * MS_PER_SEC as i64))
    }

    /// Jump to the first target strictly after the cursor.
    ///
    /// `targets` must be sorted ascending.
    pub fn jump_to_next_event(&mut self, targets: &[Timecode]) -> Option<Timecode> {
        let position = self.position();
        let idx = targets.partition_point(|t| *t <= position);
        let target = *targets.get(idx)?;
        Some(self.seek_ms(secs_to_ms(target.as_secs())))
    }

    /// Jump to the last target strictly before the cursor.
    pub fn jump_to_previous_event(&mut self, targets: &[Timecode]) -> Option<Timecode> {
        let position = self.position();
        let idx = targets.partition_point(|t| *t < position);
        let target = *targets.get(idx.checked_sub(1)?)?;
        Some(self.seek_ms(secs_to_ms(target.as_secs())))
    }

    pub fn set_speed(&mut self, speed: PlaybackSpeed) {
        self.speed = speed;
    }

    /// Start scrubbing. Always pauses.
    pub fn begin_drag(&mut self) {
        self.is_dragging = true;
        self.is_playing = false;
    }

    pub fn drag_to(&mut self, target_secs: i64) -> Timecode {
        if !self.is_dragging {
            self.begin_drag();
        }
        self.seek(target_secs)
    }

    pub fn end_drag(&mut self) {
        self.is_dragging = false;
    }

    pub fn clear_jumping(&mut self) {
        self.is_jumping = false;
    }

    pub fn progress(&self) -> f64 {
        if self.duration_ms == 0 {
            return 1.0;
        }
        self.position_ms as f64 / self.duration_ms as f64
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            position: self.position(),
            duration: self.duration(),
            status: self.status(),
            is_playing: self.is_playing,
            speed: self.speed,
            is_dragging: self.is_dragging,
            is_jumping: self.is_jumping,
            progress: self.progress(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tc(secs: u64) -> Timecode {
        Timecode::from_secs(secs)
    }

    #[test]
    fn ten_ticks_at_normal_speed_cover_five_seconds() {
        let mut playback = Playback::new(tc(600));
        assert!(playback.toggle_playback());
        for _ in 0..10 {
            playback.tick();
        }
        assert_eq!(playback.position().to_string(), "00:00:05");
        assert!(playback.is_playing());
    }

    #[test]
    fn fractional_speed_accumulates_exactly() {
        let mut playback = Playback::new(tc(600));
        playback.set_speed(PlaybackSpeed::X1_5);
        playback.toggle_playback();
        for _ in 0..4 {
            playback.tick();
        }
        assert_eq!(playback.position_ms(), 3000);

        playback.set_speed(PlaybackSpeed::X2);
        assert_eq!(playback.position_ms(), 3000);
        playback.tick();
        assert_eq!(playback.position(), tc(4));
    }

    #[test]
    fn clamps_at_end_and_pauses_once() {
        let mut playback = Playback::new(tc(2));
        playback.set_speed(PlaybackSpeed::X1_5);
        playback.toggle_playback();

        assert_eq!(playback.tick(), TickOutcome::Advanced(tc(0)));
        assert_eq!(playback.tick(), TickOutcome::Advanced(tc(1)));
        assert_eq!(playback.tick(), TickOutcome::Finished(tc(2)));
        assert!(!playback.is_playing());
        assert_eq!(playback.tick(), TickOutcome::Idle);
        assert_eq!(playback.position_ms(), 2000);
    }

    #[test]
    fn no_looping_after_finish() {
        let mut playback = Playback::new(tc(1));
        playback.toggle_playback();
        playback.tick();
        playback.tick();
        assert!(playback.is_finished());
        assert!(!playback.toggle_playback());

        playback.seek(0);
        assert!(playback.toggle_playback());
    }

    #[test]
    fn seek_clamps_and_pauses() {
        let mut playback = Playback::new(tc(100));
        playback.toggle_playback();

        assert_eq!(playback.seek(250), tc(100));
        assert!(!playback.is_playing());
        assert!(playback.is_jumping());

        assert_eq!(playback.seek(-5), tc(0));
        playback.clear_jumping();
        assert!(!playback.is_jumping());
    }

    #[test]
    fn malformed_seek_is_rejected_without_transition() {
        let mut playback = Playback::new(tc(100));
        playback.toggle_playback();
        playback.tick();
        let before = playback.clone();

        for bad in ["1:2", "00:61:00", "abc", "00:00:5"] {
            assert!(playback.seek_timestamp(bad).is_err());
            assert_eq!(playback, before);
        }

        assert_eq!(playback.seek_timestamp("00:01:00").unwrap(), tc(60));
        assert!(!playback.is_playing());
    }

    #[test]
    fn skips_thirty_seconds_within_bounds() {
        let mut playback = Playback::new(tc(70));
        assert_eq!(playback.skip_forward(), tc(30));
        assert_eq!(playback.skip_forward(), tc(60));
        assert_eq!(playback.skip_forward(), tc(70));
        assert_eq!(playback.skip_backward(), tc(40));
        playback.seek(10);
        assert_eq!(playback.skip_backward(), tc(0));
    }

    #[test]
    fn jumps_between_events() {
        let targets = [tc(10), tc(20), tc(45)];
        let mut playback = Playback::new(tc(60));

        assert_eq!(playback.jump_to_next_event(&targets), Some(tc(10)));
        assert_eq!(playback.jump_to_next_event(&targets), Some(tc(20)));
        assert_eq!(playback.jump_to_previous_event(&targets), Some(tc(10)));
        assert_eq!(playback.jump_to_previous_event(&targets), None);
        assert_eq!(playback.position(), tc(10));
    }

    #[test]
    fn next_event_after_last_is_noop() {
        let targets = [tc(10), tc(20)];
        let mut playback = Playback::new(tc(60));
        playback.seek(30);
        playback.clear_jumping();

        assert_eq!(playback.jump_to_next_event(&targets), None);
        assert_eq!(playback.position(), tc(30));
        assert!(!playback.is_jumping());
    }

    #[test]
    fn event_jumps_compare_displayed_position() {
        let targets = [tc(0), tc(1), tc(2)];
        let mut playback = Playback::new(tc(60));
        playback.seek(1);
        playback.toggle_playback();
        playback.tick();
        assert_eq!(playback.position_ms(), 1500);
        assert_eq!(playback.position(), tc(1));

        // 00:00:01 is on screen, so the target at 1 s is neither before nor after.
        let mut back = playback.clone();
        assert_eq!(back.jump_to_previous_event(&targets), Some(tc(0)));
        assert_eq!(playback.jump_to_next_event(&targets), Some(tc(2)));
    }

    #[test]
    fn long_durations_do_not_overflow() {
        let huge = Timecode::parse_strict("9999999999999:00:00").unwrap();
        let mut playback = Playback::new(huge);
        assert_eq!(playback.duration(), tc(MAX_DURATION_SECS));

        assert_eq!(playback.seek(i64::MAX), tc(MAX_DURATION_SECS));
        assert_eq!(playback.skip_forward(), tc(MAX_DURATION_SECS));
        assert_eq!(playback.jump_to_previous_event(&[tc(10), huge]), Some(tc(10)));
        assert_eq!(playback.jump_to_next_event(&[huge]), Some(tc(MAX_DURATION_SECS)));

        let at_limit = Playback::new(tc(MAX_DURATION_SECS));
        assert_eq!(at_limit.duration(), tc(MAX_DURATION_SECS));
    }

    #[test]
    fn dragging_pauses_playback() {
        let mut playback = Playback::new(tc(60));
        playback.toggle_playback();
        playback.begin_drag();
        assert!(!playback.is_playing());
        assert!(playback.is_dragging());

        assert_eq!(playback.drag_to(42), tc(42));
        playback.end_drag();
        assert!(!playback.is_dragging());
    }

    #[test]
    fn speed_parsing() {
        assert_eq!(PlaybackSpeed::try_from(1.5).unwrap(), PlaybackSpeed::X1_5);
        assert_eq!(PlaybackSpeed::try_from(3.0), Err(CoreError::UnsupportedSpeed(3.0)));
        let parsed: PlaybackSpeed = serde_json::from_str("2").unwrap();
        assert_eq!(parsed, PlaybackSpeed::X2);
        assert_eq!(serde_json::to_string(&PlaybackSpeed::X1_5).unwrap(), "1.5");
    }

    #[test]
    fn snapshot_reports_progress() {
        let mut playback = Playback::new(tc(200));
        playback.seek(50);
        let snapshot = playback.snapshot();
        assert_eq!(snapshot.position, tc(50));
        assert_eq!(snapshot.status, PlaybackStatus::Paused);
        assert!((snapshot.progress - 0.25).abs() < 1e-9);
    }
}
