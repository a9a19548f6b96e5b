pub mod cluster;
pub mod error;
pub mod events;
pub mod geo;
pub mod mock;
pub mod playback;
pub mod series;
pub mod session;
pub mod timecode;

pub use cluster::{cluster_events, EventCluster, DEFAULT_CLUSTER_THRESHOLD_SECS};
pub use error::CoreError;
pub use events::{
    MediaAction, MediaActionKind, MissionPhase, PhaseKind, SystemEvent, SystemEventKind, TimelineEvent,
    Timestamped, WarningEvent, WarningSeverity,
};
pub use geo::{haversine_distance, path_length_m, position_at, simplify_path, TrackPoint, TrackPosition};
pub use mock::{MockFlight, MAX_MOCK_DURATION_SECS, MIN_MOCK_DURATION_SECS};
pub use playback::{
    Playback, PlaybackSnapshot, PlaybackSpeed, PlaybackStatus, TickOutcome, JUMP_FEEDBACK, MAX_DURATION_SECS,
    SKIP_SECS, TICK_INTERVAL,
};
pub use series::{
    decimate, fill_gaps, prepare_chart_series, ChartOptions, GapFill, Metric, TelemetryPoint, TelemetrySeries,
    DEFAULT_MAX_POINTS,
};
pub use session::{FlightSession, SessionSummary};
pub use timecode::{is_well_formed, seconds_to_time, time_to_seconds, Timecode};
