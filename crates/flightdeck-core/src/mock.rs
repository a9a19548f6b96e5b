//! Deterministic mock flight logs for demos and tests.
//!
//! The same seed always produces the same session, so dashboards and tests
//! can refer to a flight by seed alone.

use crate::events::{
    MediaAction, MediaActionKind, MissionPhase, PhaseKind, SystemEvent, SystemEventKind, WarningEvent,
    WarningSeverity,
};
use crate::geo::{TrackPoint, EARTH_RADIUS_M};
use crate::series::{Metric, TelemetryPoint, TelemetrySeries};
use crate::session::FlightSession;
use crate::timecode::Timecode;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Shortest flight that still fits every phase.
pub const MIN_MOCK_DURATION_SECS: u64 = 60;
/// Longest flight the generator will produce.
pub const MAX_MOCK_DURATION_SECS: u64 = 24 * 3600;

const SAMPLE_INTERVAL_SECS: u64 = 5;
const CRUISE_ALTITUDE_M: f64 = 80.0;
const TRANSIT_SPEED_MPS: f64 = 12.0;
const SURVEY_SPEED_MPS: f64 = 6.0;
const SURVEY_RADIUS_M: f64 = 150.0;

/// Phase boundaries as fractions of the flight.
const PHASE_PLAN: [(PhaseKind, &str, f64, f64); 6] = [
    (PhaseKind::Preflight, "Preflight checks", 0.0, 0.02),
    (PhaseKind::Takeoff, "Takeoff", 0.02, 0.08),
    (PhaseKind::Transit, "Transit to survey area", 0.08, 0.25),
    (PhaseKind::Survey, "Survey", 0.25, 0.75),
    (PhaseKind::Return, "Return to home", 0.75, 0.92),
    (PhaseKind::Landing, "Landing", 0.92, 1.0),
];

const WARNING_DETAILS: [&str; 5] = [
    "Wind gust above 12 m/s",
    "GPS HDOP degraded",
    "Battery below 30%",
    "Signal strength low",
    "Approaching geofence boundary",
];

/// Builder for a synthetic flight.
#[derive(Debug, Clone)]
pub struct MockFlight {
    seed: u64,
    duration: Timecode,
    home: (f64, f64),
    started_at: DateTime<Utc>,
}

impl MockFlight {
    pub fn new(seed: u64) -> Self {
        let epoch = Utc
            .with_ymd_and_hms(2024, 6, 1, 9, 0, 0)
            .single()
            .unwrap_or_default();
        Self {
            seed,
            duration: Timecode::from_secs(1800),
            // Irvine, CA
            home: (33.6846, -117.8265),
            started_at: epoch + Duration::hours((seed % 240) as i64),
        }
    }

    /// Clamped to `MIN_MOCK_DURATION_SECS..=MAX_MOCK_DURATION_SECS`.
    pub fn duration(mut self, duration: Timecode) -> Self {
        let secs = duration
            .as_secs()
            .clamp(MIN_MOCK_DURATION_SECS, MAX_MOCK_DURATION_SECS);
        self.duration = Timecode::from_secs(secs);
        self
    }

    pub fn home(mut self, lat: f64, lon: f64) -> Self {
        self.home = (lat, lon);
        self
    }

    pub fn started_at(mut self, started_at: DateTime<Utc>) -> Self {
        self.started_at = started_at;
        self
    }

    pub fn generate(&self) -> FlightSession {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let total = self.duration.as_secs();
        let phases = self.phases();
        let profile = Profile::new(&phases, self.home, rng.random_range(0.0..360.0));

        let system_events = self.system_events(&phases, &mut rng);
        let warnings = self.warnings(&phases, &mut rng);
        let media_actions = self.media_actions(&phases, &mut rng);
        let telemetry = self.telemetry(&profile, &mut rng);
        let track = (0..=total)
            .step_by(SAMPLE_INTERVAL_SECS as usize)
            .map(|t| profile.track_point(t as f64))
            .collect();

        FlightSession {
            flight_id: format!("FL-{:06}", self.seed % 1_000_000),
            drone_id: format!("DRONE-{:03}", self.seed % 1000),
            started_at: self.started_at,
            duration: self.duration,
            mission_phases: phases,
            system_events,
            warnings,
            media_actions,
            telemetry,
            track,
        }
    }

    fn at_fraction(&self, fraction: f64) -> Timecode {
        Timecode::from_secs((self.duration.as_secs() as f64 * fraction).round() as u64)
    }

    fn phases(&self) -> Vec<MissionPhase> {
        PHASE_PLAN
            .iter()
            .map(|(kind, name, start, end)| MissionPhase {
                name: (*name).to_string(),
                kind: *kind,
                start_time: self.at_fraction(*start),
                end_time: self.at_fraction(*end),
            })
            .collect()
    }

    fn system_events(&self, phases: &[MissionPhase], rng: &mut StdRng) -> Vec<SystemEvent> {
        let event = |timestamp: Timecode, kind, details: &str| SystemEvent {
            timestamp,
            kind,
            details: details.to_string(),
        };

        let survey = &phases[3];
        let mut events = vec![
            event(Timecode::ZERO, SystemEventKind::Arming, "Motors armed"),
            event(phases[1].start_time, SystemEventKind::Takeoff, ""),
            event(phases[2].start_time, SystemEventKind::ModeChange, "Auto mission"),
        ];

        let waypoints = rng.random_range(3..=5);
        let span = survey.duration_secs().max(1);
        for i in 0..waypoints {
            let offset = span * (i + 1) / (waypoints + 1);
            events.push(event(
                survey.start_time.saturating_add_secs(offset),
                SystemEventKind::WaypointReached,
                &format!("WP{}", i + 1),
            ));
        }

        events.push(event(phases[4].start_time, SystemEventKind::ReturnToHome, "Mission complete"));
        events.push(event(phases[5].start_time, SystemEventKind::Landing, ""));
        events.push(event(self.duration, SystemEventKind::Disarming, "Motors disarmed"));
        events
    }

    fn warnings(&self, phases: &[MissionPhase], rng: &mut StdRng) -> Vec<WarningEvent> {
        let (from, to) = (phases[2].start_time.as_secs(), phases[4].end_time.as_secs());
        let count = rng.random_range(1..=3);
        let mut warnings: Vec<WarningEvent> = (0..count)
            .map(|_| WarningEvent {
                timestamp: Timecode::from_secs(rng.random_range(from..to.max(from + 1))),
                severity: if rng.random_bool(0.2) {
                    WarningSeverity::Error
                } else {
                    WarningSeverity::Warning
                },
                details: WARNING_DETAILS[rng.random_range(0..WARNING_DETAILS.len())].to_string(),
            })
            .collect();
        warnings.sort_by_key(|w| w.timestamp);
        warnings
    }

    fn media_actions(&self, phases: &[MissionPhase], rng: &mut StdRng) -> Vec<MediaAction> {
        let survey = &phases[3];
        let (start, end) = (survey.start_time.as_secs(), survey.end_time.as_secs());
        let margin = (survey.duration_secs() / 20).max(1);

        let mut actions = vec![MediaAction {
            timestamp: Timecode::from_secs(start + margin),
            kind: MediaActionKind::VideoStart,
            details: "4K survey recording".into(),
        }];

        let photo_window = start + margin..end.saturating_sub(margin).max(start + margin + 1);
        let photos = rng.random_range(4..=10);
        for n in 0..photos {
            actions.push(MediaAction {
                timestamp: Timecode::from_secs(rng.random_range(photo_window.clone())),
                kind: MediaActionKind::Photo,
                details: format!("IMG_{:04}", n + 1),
            });
        }

        actions.push(MediaAction {
            timestamp: Timecode::from_secs(end.saturating_sub(margin)),
            kind: MediaActionKind::VideoStop,
            details: String::new(),
        });
        actions.sort_by_key(|a| a.timestamp);
        actions
    }

    fn telemetry(&self, profile: &Profile, rng: &mut StdRng) -> Vec<TelemetrySeries> {
        let total = self.duration.as_secs();
        let samples: Vec<f64> = (0..=total)
            .step_by(SAMPLE_INTERVAL_SECS as usize)
            .map(|t| t as f64)
            .collect();

        // Link dropout: the signal series has a hole somewhere mid-flight.
        let dropout_len = rng.random_range(40.0..90.0);
        let dropout_start = rng.random_range(0.3..0.6) * total as f64;
        let dropout = dropout_start..dropout_start + dropout_len;

        let mut noise = |scale: f64| rng.random_range(-scale..scale);
        let series = |metric: Metric, f: &mut dyn FnMut(f64) -> Option<f64>| {
            let points = samples
                .iter()
                .filter_map(|&t| f(t).map(|v| TelemetryPoint::new(t, v)))
                .collect();
            TelemetrySeries::new(metric, points)
        };

        let mut out = Vec::with_capacity(Metric::ALL.len());
        let duration = total as f64;
        out.push(series(Metric::Battery, &mut |t| {
            Some((100.0 - 78.0 * t / duration + noise(0.4)).clamp(0.0, 100.0))
        }));
        out.push(series(Metric::Altitude, &mut |t| {
            let alt = profile.altitude(t);
            Some(if alt > 0.0 { (alt + noise(1.5)).max(0.0) } else { 0.0 })
        }));
        out.push(series(Metric::HorizontalSpeed, &mut |t| {
            let speed = profile.ground_speed(t);
            Some(if speed > 0.0 { (speed + noise(0.8)).max(0.0) } else { 0.0 })
        }));
        out.push(series(Metric::VerticalSpeed, &mut |t| {
            let dt = SAMPLE_INTERVAL_SECS as f64;
            Some((profile.altitude(t + dt) - profile.altitude(t)) / dt)
        }));
        out.push(series(Metric::Signal, &mut |t| {
            if dropout.contains(&t) {
                return None;
            }
            let distance = profile.distance_from_home(t);
            Some((98.0 - distance / 60.0 + noise(2.0)).clamp(0.0, 100.0))
        }));
        out
    }
}

/// Kinematic outline of the mission: out along a bearing, loop the survey
/// circle, fly straight back.
struct Profile {
    home: (f64, f64),
    bearing_rad: f64,
    takeoff: (f64, f64),
    transit: (f64, f64),
    survey: (f64, f64),
    ret: (f64, f64),
    landing: (f64, f64),
}

impl Profile {
    fn new(phases: &[MissionPhase], home: (f64, f64), bearing_deg: f64) -> Self {
        let span = |i: usize| (phases[i].start_time.as_secs_f64(), phases[i].end_time.as_secs_f64());
        Self {
            home,
            bearing_rad: bearing_deg.to_radians(),
            takeoff: span(1),
            transit: span(2),
            survey: span(3),
            ret: span(4),
            landing: span(5),
        }
    }

    fn entry_distance(&self) -> f64 {
        TRANSIT_SPEED_MPS * (self.transit.1 - self.transit.0)
    }

    fn altitude(&self, t: f64) -> f64 {
        let ramp = |(from, to): (f64, f64)| ((t - from) / (to - from).max(1.0)).clamp(0.0, 1.0);
        if t < self.takeoff.0 || t >= self.landing.1 {
            0.0
        } else if t < self.takeoff.1 {
            CRUISE_ALTITUDE_M * ramp(self.takeoff)
        } else if t < self.landing.0 {
            CRUISE_ALTITUDE_M
        } else {
            CRUISE_ALTITUDE_M * (1.0 - ramp(self.landing))
        }
    }

    fn ground_speed(&self, t: f64) -> f64 {
        if (self.transit.0..self.transit.1).contains(&t) {
            TRANSIT_SPEED_MPS
        } else if (self.survey.0..self.survey.1).contains(&t) {
            SURVEY_SPEED_MPS
        } else if (self.ret.0..self.ret.1).contains(&t) {
            self.return_speed()
        } else {
            0.0
        }
    }

    fn return_speed(&self) -> f64 {
        let (north, east) = self.survey_offset(self.survey.1);
        north.hypot(east) / (self.ret.1 - self.ret.0).max(1.0)
    }

    /// North/east offset from home in meters.
    fn offset_at(&self, t: f64) -> (f64, f64) {
        let (dir_n, dir_e) = (self.bearing_rad.cos(), self.bearing_rad.sin());
        if t < self.transit.0 || t >= self.landing.0 {
            (0.0, 0.0)
        } else if t < self.transit.1 {
            let d = TRANSIT_SPEED_MPS * (t - self.transit.0);
            (dir_n * d, dir_e * d)
        } else if t < self.survey.1 {
            self.survey_offset(t)
        } else {
            let (north, east) = self.survey_offset(self.survey.1);
            let f = ((t - self.ret.0) / (self.ret.1 - self.ret.0).max(1.0)).clamp(0.0, 1.0);
            (north * (1.0 - f), east * (1.0 - f))
        }
    }

    fn survey_offset(&self, t: f64) -> (f64, f64) {
        let (dir_n, dir_e) = (self.bearing_rad.cos(), self.bearing_rad.sin());
        let center = self.entry_distance() + SURVEY_RADIUS_M;
        let angle = SURVEY_SPEED_MPS * (t - self.survey.0) / SURVEY_RADIUS_M;
        // Start the loop on the point closest to home.
        let start = self.bearing_rad + std::f64::consts::PI;
        (
            dir_n * center + SURVEY_RADIUS_M * (start + angle).cos(),
            dir_e * center + SURVEY_RADIUS_M * (start + angle).sin(),
        )
    }

    fn distance_from_home(&self, t: f64) -> f64 {
        let (north, east) = self.offset_at(t);
        north.hypot(east)
    }

    fn track_point(&self, t: f64) -> TrackPoint {
        let (north, east) = self.offset_at(t);
        let lat = self.home.0 + (north / EARTH_RADIUS_M).to_degrees();
        let lon = self.home.1 + (east / (EARTH_RADIUS_M * self.home.0.to_radians().cos())).to_degrees();
        TrackPoint {
            timestamp: t,
            lat,
            lon,
            altitude_m: self.altitude(t),
        }
    }
}
