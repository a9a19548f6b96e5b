//! Timeline events recorded during a flight.

use crate::timecode::Timecode;
use serde::{Deserialize, Serialize};

/// Anything that can be placed on the timeline at a single instant.
pub trait Timestamped {
    fn timestamp(&self) -> Timecode;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    Preflight,
    Takeoff,
    Transit,
    Survey,
    Return,
    Landing,
}

/// A span of the mission, e.g. the survey leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionPhase {
    pub name: String,
    pub kind: PhaseKind,
    pub start_time: Timecode,
    pub end_time: Timecode,
}

impl MissionPhase {
    pub fn duration_secs(&self) -> u64 {
        self.end_time.as_secs().saturating_sub(self.start_time.as_secs())
    }

    pub fn contains(&self, at: Timecode) -> bool {
        self.start_time <= at && at <= self.end_time
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemEventKind {
    Arming,
    Takeoff,
    ModeChange,
    WaypointReached,
    ReturnToHome,
    Landing,
    Disarming,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemEvent {
    pub timestamp: Timecode,
    pub kind: SystemEventKind,
    #[serde(default)]
    pub details: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningSeverity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarningEvent {
    pub timestamp: Timecode,
    pub severity: WarningSeverity,
    #[serde(default)]
    pub details: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaActionKind {
    Photo,
    VideoStart,
    VideoStop,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaAction {
    pub timestamp: Timecode,
    pub kind: MediaActionKind,
    #[serde(default)]
    pub details: String,
}

/// One entry on the flight timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum TimelineEvent {
    MissionPhase(MissionPhase),
    System(SystemEvent),
    Warning(WarningEvent),
    Media(MediaAction),
}

impl TimelineEvent {
    /// Short human-readable label for markers and tooltips.
    pub fn label(&self) -> String {
        match self {
            TimelineEvent::MissionPhase(phase) => phase.name.clone(),
            TimelineEvent::System(event) => describe(&format!("{:?}", event.kind), &event.details),
            TimelineEvent::Warning(event) => {
                describe(&format!("{:?}", event.severity), &event.details)
            }
            TimelineEvent::Media(action) => describe(&format!("{:?}", action.kind), &action.details),
        }
    }
}

fn describe(kind: &str, details: &str) -> String {
    if details.is_empty() {
        kind.to_string()
    } else {
        format!("{kind}: {details}")
    }
}

impl Timestamped for MissionPhase {
    fn timestamp(&self) -> Timecode {
        self.start_time
    }
}

impl Timestamped for SystemEvent {
    fn timestamp(&self) -> Timecode {
        self.timestamp
    }
}

impl Timestamped for WarningEvent {
    fn timestamp(&self) -> Timecode {
        self.timestamp
    }
}

impl Timestamped for MediaAction {
    fn timestamp(&self) -> Timecode {
        self.timestamp
    }
}

impl Timestamped for TimelineEvent {
    fn timestamp(&self) -> Timecode {
        match self {
            TimelineEvent::MissionPhase(phase) => phase.timestamp(),
            TimelineEvent::System(event) => event.timestamp(),
            TimelineEvent::Warning(event) => event.timestamp(),
            TimelineEvent::Media(action) => action.timestamp(),
        }
    }
}

impl<T: Timestamped + ?Sized> Timestamped for &T {
    fn timestamp(&self) -> Timecode {
        (**self).timestamp()
    }
}

impl Timestamped for Timecode {
    fn timestamp(&self) -> Timecode {
        *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_projects_to_start_time() {
        let phase = TimelineEvent::MissionPhase(MissionPhase {
            name: "Survey".into(),
            kind: PhaseKind::Survey,
            start_time: Timecode::from_secs(120),
            end_time: Timecode::from_secs(600),
        });
        assert_eq!(phase.timestamp(), Timecode::from_secs(120));
    }

    #[test]
    fn tagged_json_shape() {
        let event = TimelineEvent::Warning(WarningEvent {
            timestamp: Timecode::from_secs(65),
            severity: WarningSeverity::Error,
            details: "GPS signal lost".into(),
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_type"], "warning");
        assert_eq!(json["timestamp"], "00:01:05");
        assert_eq!(json["severity"], "error");

        let back: TimelineEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn label_includes_details() {
        let event = TimelineEvent::Media(MediaAction {
            timestamp: Timecode::ZERO,
            kind: MediaActionKind::Photo,
            details: String::new(),
        });
        assert_eq!(event.label(), "Photo");

        let event = TimelineEvent::System(SystemEvent {
            timestamp: Timecode::ZERO,
            kind: SystemEventKind::ModeChange,
            details: "Loiter".into(),
        });
        assert_eq!(event.label(), "ModeChange: Loiter");
    }
}
