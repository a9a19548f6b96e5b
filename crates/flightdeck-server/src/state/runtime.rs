//! One hosted flight session: the playback cursor plus the timers driving it.

use flightdeck_core::{
    CoreError, FlightSession, Playback, PlaybackSnapshot, PlaybackSpeed, TickOutcome, Timecode, TrackPosition,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::loops::playback_loop::{spawn_jump_reset, spawn_ticker};

/// A user action against the playback cursor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlaybackCommand {
    Toggle,
    /// `HH:MM:SS`; malformed values are rejected.
    Seek { position: String },
    SeekSeconds { seconds: i64 },
    SkipForward,
    SkipBackward,
    NextEvent,
    PreviousEvent,
    SetSpeed { speed: PlaybackSpeed },
    BeginDrag,
    DragTo { seconds: i64 },
    EndDrag,
}

/// Why a position update was published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateCause {
    /// Current state sent to a new subscriber.
    Snapshot,
    Tick,
    Finished,
    Play,
    Pause,
    Seek,
    Skip,
    Jump,
    Drag,
    Speed,
}

/// Pushed to every subscriber on each seek, tick or jump.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionUpdate {
    pub session_id: String,
    pub cause: UpdateCause,
    pub position: Timecode,
    pub playback: PlaybackSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<TrackPosition>,
}

#[derive(Default)]
struct Timers {
    ticker: Option<JoinHandle<()>>,
    jump_reset: Option<JoinHandle<()>>,
}

impl Timers {
    fn abort_all(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
        if let Some(handle) = self.jump_reset.take() {
            handle.abort();
        }
    }
}

pub struct SessionRuntime {
    id: String,
    session: FlightSession,
    jump_targets: Vec<Timecode>,
    playback: Mutex<Playback>,
    timers: Mutex<Timers>,
    tx: broadcast::Sender<PositionUpdate>,
    jump_feedback: Duration,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SessionRuntime {
    pub fn new(id: String, session: FlightSession, jump_feedback: Duration, capacity: usize) -> Arc<Self> {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Arc::new(Self {
            id,
            jump_targets: session.jump_targets(),
            playback: Mutex::new(Playback::new(session.duration)),
            session,
            timers: Mutex::new(Timers::default()),
            tx,
            jump_feedback,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn session(&self) -> &FlightSession {
        &self.session
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        lock(&self.playback).snapshot()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PositionUpdate> {
        self.tx.subscribe()
    }

    pub fn is_ticking(&self) -> bool {
        lock(&self.timers)
            .ticker
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Apply a command, reschedule timers and notify subscribers.
    ///
    /// Commands that don't move the cursor (a jump with no target in that
    /// direction) are not published. The playback lock is held until the
    /// timers and subscribers have seen the new state; lock order is
    /// `playback` then `timers`.
    pub fn apply(self: &Arc<Self>, command: PlaybackCommand) -> Result<PlaybackSnapshot, CoreError> {
        let mut playback = lock(&self.playback);
        let cause = match &command {
            PlaybackCommand::Toggle => {
                if playback.toggle_playback() {
                    Some(UpdateCause::Play)
                } else {
                    Some(UpdateCause::Pause)
                }
            }
            PlaybackCommand::Seek { position } => {
                playback.seek_timestamp(position)?;
                Some(UpdateCause::Seek)
            }
            PlaybackCommand::SeekSeconds { seconds } => {
                playback.seek(*seconds);
                Some(UpdateCause::Seek)
            }
            PlaybackCommand::SkipForward => {
                playback.skip_forward();
                Some(UpdateCause::Skip)
            }
            PlaybackCommand::SkipBackward => {
                playback.skip_backward();
                Some(UpdateCause::Skip)
            }
            PlaybackCommand::NextEvent => playback
                .jump_to_next_event(&self.jump_targets)
                .map(|_| UpdateCause::Jump),
            PlaybackCommand::PreviousEvent => playback
                .jump_to_previous_event(&self.jump_targets)
                .map(|_| UpdateCause::Jump),
            PlaybackCommand::SetSpeed { speed } => {
                playback.set_speed(*speed);
                Some(UpdateCause::Speed)
            }
            PlaybackCommand::BeginDrag => {
                playback.begin_drag();
                Some(UpdateCause::Pause)
            }
            PlaybackCommand::DragTo { seconds } => {
                playback.drag_to(*seconds);
                Some(UpdateCause::Drag)
            }
            PlaybackCommand::EndDrag => {
                playback.end_drag();
                None
            }
        };
        let snapshot = playback.snapshot();

        let Some(cause) = cause else {
            tracing::debug!(session = %self.id, ?command, "Playback command left cursor unchanged");
            return Ok(snapshot);
        };

        tracing::debug!(
            session = %self.id,
            ?command,
            position = %snapshot.position,
            playing = snapshot.is_playing,
            "Playback transition"
        );

        self.reschedule(cause, &snapshot);
        self.publish(cause, snapshot.clone());
        drop(playback);
        Ok(snapshot)
    }

    /// Callers hold the playback lock, so `snapshot` is current.
    fn reschedule(self: &Arc<Self>, cause: UpdateCause, snapshot: &PlaybackSnapshot) {
        let mut timers = lock(&self.timers);

        // Speed changes restart the cadence.
        let restart = matches!(cause, UpdateCause::Speed);
        if snapshot.is_playing {
            let running = timers.ticker.as_ref().is_some_and(|handle| !handle.is_finished());
            if restart || !running {
                if let Some(handle) = timers.ticker.take() {
                    handle.abort();
                }
                timers.ticker = Some(spawn_ticker(Arc::downgrade(self)));
            }
        } else if let Some(handle) = timers.ticker.take() {
            handle.abort();
        }

        let moved = matches!(
            cause,
            UpdateCause::Seek | UpdateCause::Skip | UpdateCause::Jump | UpdateCause::Drag
        );
        if moved && snapshot.is_jumping {
            if let Some(handle) = timers.jump_reset.take() {
                handle.abort();
            }
            timers.jump_reset = Some(spawn_jump_reset(Arc::downgrade(self), self.jump_feedback));
        }
    }

    /// Advance one tick. Returns false once the ticker should stop.
    pub fn on_tick(&self) -> bool {
        // Published under the lock so subscribers see updates in state order.
        let mut playback = lock(&self.playback);
        let outcome = playback.tick();
        let snapshot = playback.snapshot();

        match outcome {
            TickOutcome::Idle => false,
            TickOutcome::Advanced(_) => {
                self.publish(UpdateCause::Tick, snapshot);
                true
            }
            TickOutcome::Finished(position) => {
                tracing::info!(session = %self.id, %position, "Playback reached end of flight");
                self.publish(UpdateCause::Finished, snapshot);
                false
            }
        }
    }

    /// Clear the transient jump flag once its feedback window has elapsed.
    pub fn settle_jump(&self) {
        lock(&self.playback).clear_jumping();
    }

    pub fn current_update(&self) -> PositionUpdate {
        self.update(UpdateCause::Snapshot, self.snapshot())
    }

    fn update(&self, cause: UpdateCause, playback: PlaybackSnapshot) -> PositionUpdate {
        PositionUpdate {
            session_id: self.id.clone(),
            cause,
            position: playback.position,
            location: self.session.position_at(playback.position.as_secs_f64()),
            playback,
        }
    }

    fn publish(&self, cause: UpdateCause, playback: PlaybackSnapshot) {
        // No subscribers is fine.
        let _ = self.tx.send(self.update(cause, playback));
    }
}

impl Drop for SessionRuntime {
    fn drop(&mut self) {
        self.timers
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .abort_all();
    }
}
