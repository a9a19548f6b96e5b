//! A loaded flight log: duration, timeline events, telemetry and track.

use crate::cluster::{cluster_events, EventCluster};
use crate::error::{CoreError, Result};
use crate::events::{MediaAction, MissionPhase, SystemEvent, TimelineEvent, Timestamped, WarningEvent};
use crate::geo::{position_at, TrackPoint, TrackPosition};
use crate::playback::MAX_DURATION_SECS;
use crate::series::{Metric, TelemetrySeries};
use crate::timecode::Timecode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightSession {
    pub flight_id: String,
    pub drone_id: String,
    pub started_at: DateTime<Utc>,
    pub duration: Timecode,
    #[serde(default)]
    pub mission_phases: Vec<MissionPhase>,
    #[serde(default)]
    pub system_events: Vec<SystemEvent>,
    #[serde(default)]
    pub warnings: Vec<WarningEvent>,
    #[serde(default)]
    pub media_actions: Vec<MediaAction>,
    #[serde(default)]
    pub telemetry: Vec<TelemetrySeries>,
    #[serde(default)]
    pub track: Vec<TrackPoint>,
}

/// Compact listing entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub flight_id: String,
    pub drone_id: String,
    pub started_at: DateTime<Utc>,
    pub duration: Timecode,
    pub event_count: usize,
    pub warning_count: usize,
}

impl FlightSession {
    /// Every event of all four kinds, in no particular order.
    pub fn events(&self) -> Vec<TimelineEvent> {
        let phases = self.mission_phases.iter().cloned().map(TimelineEvent::MissionPhase);
        let system = self.system_events.iter().cloned().map(TimelineEvent::System);
        let warnings = self.warnings.iter().cloned().map(TimelineEvent::Warning);
        let media = self.media_actions.iter().cloned().map(TimelineEvent::Media);
        phases.chain(system).chain(warnings).chain(media).collect()
    }

    pub fn event_count(&self) -> usize {
        self.mission_phases.len() + self.system_events.len() + self.warnings.len() + self.media_actions.len()
    }

    /// Sorted, deduplicated timestamps the cursor can jump between.
    pub fn jump_targets(&self) -> Vec<Timecode> {
        let mut targets: Vec<Timecode> = self
            .mission_phases
            .iter()
            .map(Timestamped::timestamp)
            .chain(self.system_events.iter().map(Timestamped::timestamp))
            .chain(self.warnings.iter().map(Timestamped::timestamp))
            .chain(self.media_actions.iter().map(Timestamped::timestamp))
            .collect();
        targets.sort_unstable();
        targets.dedup();
        targets
    }

    pub fn clusters(&self, threshold_secs: u64) -> Vec<EventCluster<TimelineEvent>> {
        cluster_events(self.events(), threshold_secs)
    }

    pub fn series(&self, metric: Metric) -> Option<&TelemetrySeries> {
        self.telemetry.iter().find(|s| s.metric == metric)
    }

    /// Phase the cursor is currently in, if any.
    pub fn phase_at(&self, at: Timecode) -> Option<&MissionPhase> {
        self.mission_phases.iter().find(|phase| phase.contains(at))
    }

    pub fn position_at(&self, at_secs: f64) -> Option<TrackPosition> {
        position_at(&self.track, at_secs)
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            flight_id: self.flight_id.clone(),
            drone_id: self.drone_id.clone(),
            started_at: self.started_at,
            duration: self.duration,
            event_count: self.event_count(),
            warning_count: self.warnings.len(),
        }
    }

    /// Check that everything fits inside the flight and series are ordered.
    pub fn validate(&self) -> Result<()> {
        if self.flight_id.trim().is_empty() {
            return Err(CoreError::InvalidSession("flight_id is empty".into()));
        }

        if self.duration.as_secs() > MAX_DURATION_SECS {
            return Err(CoreError::InvalidSession(format!(
                "duration {} is longer than playback supports",
                self.duration
            )));
        }

        for phase in &self.mission_phases {
            if phase.start_time > phase.end_time {
                return Err(CoreError::InvalidSession(format!(
                    "phase {:?} ends at {} before it starts at {}",
                    phase.name, phase.end_time, phase.start_time
                )));
            }
            if phase.end_time > self.duration {
                return Err(CoreError::InvalidSession(format!(
                    "phase {:?} ends at {} after the flight ({})",
                    phase.name, phase.end_time, self.duration
                )));
            }
        }

        if let Some(event) = self.events().iter().find(|e| e.timestamp() > self.duration) {
            return Err(CoreError::InvalidSession(format!(
                "event {:?} at {} is after the flight ({})",
                event.label(),
                event.timestamp(),
                self.duration
            )));
        }

        if let Some(series) = self.telemetry.iter().find(|s| !s.is_sorted()) {
            return Err(CoreError::InvalidSession(format!(
                "{} series is not sorted by timestamp",
                series.metric
            )));
        }

        if self.track.windows(2).any(|w| w[0].timestamp > w[1].timestamp) {
            return Err(CoreError::InvalidSession("track is not sorted by timestamp".into()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{MediaActionKind, PhaseKind, SystemEventKind, WarningSeverity};

    fn tc(secs: u64) -> Timecode {
        Timecode::from_secs(secs)
    }

    fn session() -> FlightSession {
        FlightSession {
            flight_id: "FL-1".into(),
            drone_id: "DRONE-7".into(),
            started_at: Utc::now(),
            duration: tc(300),
            mission_phases: vec![MissionPhase {
                name: "Takeoff".into(),
                kind: PhaseKind::Takeoff,
                start_time: tc(0),
                end_time: tc(30),
            }],
            system_events: vec![
                SystemEvent {
                    timestamp: tc(1),
                    kind: SystemEventKind::Takeoff,
                    details: String::new(),
                },
                SystemEvent {
                    timestamp: tc(120),
                    kind: SystemEventKind::WaypointReached,
                    details: "WP2".into(),
                },
            ],
            warnings: vec![WarningEvent {
                timestamp: tc(121),
                severity: WarningSeverity::Warning,
                details: "Wind gust".into(),
            }],
            media_actions: vec![MediaAction {
                timestamp: tc(120),
                kind: MediaActionKind::Photo,
                details: String::new(),
            }],
            telemetry: Vec::new(),
            track: Vec::new(),
        }
    }

    #[test]
    fn jump_targets_merge_all_kinds() {
        let targets = session().jump_targets();
        assert_eq!(targets, vec![tc(0), tc(1), tc(120), tc(121)]);
    }

    #[test]
    fn clusters_span_all_kinds() {
        let clusters = session().clusters(2);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].len(), 2);
        assert_eq!(clusters[1].len(), 3);
        let total: usize = clusters.iter().map(|c| c.len()).sum();
        assert_eq!(total, session().event_count());
    }

    #[test]
    fn validate_rejects_events_after_end() {
        let mut s = session();
        assert!(s.validate().is_ok());
        s.warnings[0].timestamp = tc(301);
        assert!(matches!(s.validate(), Err(CoreError::InvalidSession(_))));
    }

    #[test]
    fn validate_rejects_unplayable_duration() {
        let mut s = session();
        s.duration = tc(MAX_DURATION_SECS);
        assert!(s.validate().is_ok());
        s.duration = Timecode::parse_strict("9999999999999:00:00").unwrap();
        assert!(matches!(s.validate(), Err(CoreError::InvalidSession(_))));
    }

    #[test]
    fn validate_rejects_inverted_phase() {
        let mut s = session();
        s.mission_phases[0].end_time = tc(0);
        s.mission_phases[0].start_time = tc(10);
        assert!(s.validate().is_err());
    }

    #[test]
    fn phase_lookup() {
        let s = session();
        assert_eq!(s.phase_at(tc(10)).map(|p| p.kind), Some(PhaseKind::Takeoff));
        assert!(s.phase_at(tc(200)).is_none());
    }
}
