//! In-memory session store using DashMap.

use dashmap::DashMap;
use flightdeck_core::{CoreError, FlightSession, MockFlight, SessionSummary, Timecode, MAX_MOCK_DURATION_SECS};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::Config;
use crate::state::SessionRuntime;

#[derive(Debug, Clone, Serialize)]
pub struct SessionListing {
    pub session_id: String,
    #[serde(flatten)]
    pub summary: SessionSummary,
    pub position: Timecode,
    pub is_playing: bool,
}

/// Application state - hosted sessions keyed by session id.
pub struct AppState {
    sessions: DashMap<String, Arc<SessionRuntime>>,
    config: Config,
    seed_counter: AtomicU64,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            sessions: DashMap::new(),
            config,
            seed_counter: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Seed for a mock session created without one.
    fn next_seed(&self) -> u64 {
        let offset = self.seed_counter.fetch_add(1, Ordering::SeqCst);
        self.config.mock_seed.unwrap_or(1).wrapping_add(offset)
    }

    /// Generate and host a mock flight. Durations over a day are refused.
    pub fn create_mock_session(
        &self,
        seed: Option<u64>,
        duration: Option<Timecode>,
    ) -> Result<Arc<SessionRuntime>, CoreError> {
        if let Some(duration) = duration.filter(|d| d.as_secs() > MAX_MOCK_DURATION_SECS) {
            return Err(CoreError::InvalidSession(format!(
                "mock duration {} exceeds {}",
                duration,
                Timecode::from_secs(MAX_MOCK_DURATION_SECS)
            )));
        }
        let seed = seed.unwrap_or_else(|| self.next_seed());
        let mut flight = MockFlight::new(seed);
        if let Some(duration) = duration {
            flight = flight.duration(duration);
        }
        Ok(self.insert(flight.generate()))
    }

    pub fn import_session(&self, session: FlightSession) -> Result<Arc<SessionRuntime>, CoreError> {
        session.validate()?;
        Ok(self.insert(session))
    }

    fn insert(&self, session: FlightSession) -> Arc<SessionRuntime> {
        let id = Uuid::new_v4().to_string();
        let runtime = SessionRuntime::new(
            id.clone(),
            session,
            self.config.jump_feedback,
            self.config.broadcast_capacity,
        );
        self.sessions.insert(id, runtime.clone());
        runtime
    }

    pub fn get_session(&self, id: &str) -> Option<Arc<SessionRuntime>> {
        self.sessions.get(id).map(|r| r.value().clone())
    }

    pub fn list_sessions(&self) -> Vec<SessionListing> {
        let mut listings: Vec<SessionListing> = self
            .sessions
            .iter()
            .map(|r| {
                let runtime = r.value();
                let snapshot = runtime.snapshot();
                SessionListing {
                    session_id: runtime.id().to_string(),
                    summary: runtime.session().summary(),
                    position: snapshot.position,
                    is_playing: snapshot.is_playing,
                }
            })
            .collect();
        listings.sort_by(|a, b| a.summary.started_at.cmp(&b.summary.started_at));
        listings
    }

    /// Remove a session. Its timers stop once the last handle is dropped.
    pub fn remove_session(&self, id: &str) -> bool {
        self.sessions.remove(id).is_some()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn clear(&self) {
        self.sessions.clear();
    }
}
