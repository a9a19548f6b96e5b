//! Telemetry series preparation for charts.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_MAX_POINTS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetryPoint {
    /// Seconds since takeoff.
    pub timestamp: f64,
    pub value: f64,
}

impl TelemetryPoint {
    pub fn new(timestamp: f64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Battery,
    Altitude,
    HorizontalSpeed,
    VerticalSpeed,
    Signal,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::Battery,
        Metric::Altitude,
        Metric::HorizontalSpeed,
        Metric::VerticalSpeed,
        Metric::Signal,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Battery => "battery",
            Metric::Altitude => "altitude",
            Metric::HorizontalSpeed => "horizontal_speed",
            Metric::VerticalSpeed => "vertical_speed",
            Metric::Signal => "signal",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Metric::Battery | Metric::Signal => "%",
            Metric::Altitude => "m",
            Metric::HorizontalSpeed | Metric::VerticalSpeed => "m/s",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| CoreError::UnknownMetric(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySeries {
    pub metric: Metric,
    pub points: Vec<TelemetryPoint>,
}

impl TelemetrySeries {
    pub fn new(metric: Metric, points: Vec<TelemetryPoint>) -> Self {
        Self { metric, points }
    }

    pub fn is_sorted(&self) -> bool {
        self.points.windows(2).all(|w| w[0].timestamp <= w[1].timestamp)
    }

    /// Value at `secs`, linearly interpolated between samples.
    pub fn value_at(&self, secs: f64) -> Option<f64> {
        let first = self.points.first()?;
        let last = self.points.last()?;
        if secs <= first.timestamp {
            return Some(first.value);
        }
        if secs >= last.timestamp {
            return Some(last.value);
        }
        let idx = self.points.partition_point(|p| p.timestamp <= secs);
        let (a, b) = (self.points[idx - 1], self.points[idx]);
        let span = b.timestamp - a.timestamp;
        if span <= 0.0 {
            return Some(a.value);
        }
        Some(a.value + (b.value - a.value) * (secs - a.timestamp) / span)
    }
}

/// Parameters for [`fill_gaps`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GapFill {
    /// Gaps strictly wider than this are filled.
    pub max_gap_secs: f64,
    /// One synthetic point per this many seconds of gap.
    pub step_secs: f64,
    pub max_steps: usize,
}

impl Default for GapFill {
    fn default() -> Self {
        Self {
            max_gap_secs: 30.0,
            step_secs: 10.0,
            max_steps: 5,
        }
    }
}

/// Insert linearly interpolated points across wide gaps.
///
/// Each gap wider than `max_gap_secs` gets `min(max_steps, floor(gap / step_secs))`
/// evenly spaced points between its endpoints.
pub fn fill_gaps(points: &[TelemetryPoint], options: &GapFill) -> Vec<TelemetryPoint> {
    let mut filled = Vec::with_capacity(points.len());

    for (i, point) in points.iter().enumerate() {
        filled.push(*point);
        let Some(next) = points.get(i + 1) else {
            break;
        };

        let gap = next.timestamp - point.timestamp;
        if gap <= options.max_gap_secs || options.step_secs <= 0.0 {
            continue;
        }

        let steps = ((gap / options.step_secs).floor() as usize).min(options.max_steps);
        let divisions = (steps + 1) as f64;
        for step in 1..=steps {
            let fraction = step as f64 / divisions;
            filled.push(TelemetryPoint::new(
                point.timestamp + gap * fraction,
                point.value + (next.value - point.value) * fraction,
            ));
        }
    }

    filled
}

/// Reduce a series to roughly `max_points` runs, keeping each run's first,
/// minimum and maximum sample. The final sample is always kept.
pub fn decimate(points: &[TelemetryPoint], max_points: usize) -> Vec<TelemetryPoint> {
    let n = points.len();
    if n <= max_points || max_points == 0 {
        return points.to_vec();
    }

    let factor = n.div_ceil(max_points);
    let mut keep = BTreeSet::new();

    for (run_idx, run) in points.chunks(factor).enumerate() {
        let offset = run_idx * factor;
        keep.insert(offset);
        if let Some((i, _)) = run.iter().enumerate().min_by(by_value) {
            keep.insert(offset + i);
        }
        if let Some((i, _)) = run.iter().enumerate().max_by(by_value) {
            keep.insert(offset + i);
        }
    }
    keep.insert(n - 1);

    let mut reduced: Vec<TelemetryPoint> = keep.into_iter().map(|i| points[i]).collect();
    reduced.sort_by(|a, b| a.timestamp.partial_cmp(&b.timestamp).unwrap_or(Ordering::Equal));
    reduced
}

fn by_value(a: &(usize, &TelemetryPoint), b: &(usize, &TelemetryPoint)) -> Ordering {
    a.1.value.partial_cmp(&b.1.value).unwrap_or(Ordering::Equal)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartOptions {
    /// `None` skips gap filling.
    pub gap_fill: Option<GapFill>,
    pub max_points: usize,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            gap_fill: Some(GapFill::default()),
            max_points: DEFAULT_MAX_POINTS,
        }
    }
}

/// Gap-fill then decimate a series for rendering.
pub fn prepare_chart_series(series: &TelemetrySeries, options: &ChartOptions) -> TelemetrySeries {
    let filled = match &options.gap_fill {
        Some(gap_fill) => fill_gaps(&series.points, gap_fill),
        None => series.points.clone(),
    };
    TelemetrySeries::new(series.metric, decimate(&filled, options.max_points))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> Vec<TelemetryPoint> {
        (0..n).map(|i| TelemetryPoint::new(i as f64, (i % 37) as f64)).collect()
    }

    #[test]
    fn fills_wide_gap_linearly() {
        let points = [TelemetryPoint::new(0.0, 0.0), TelemetryPoint::new(60.0, 60.0)];
        let filled = fill_gaps(&points, &GapFill::default());

        assert_eq!(filled.len(), 7);
        assert!(filled.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        let mid = filled
            .iter()
            .find(|p| (p.timestamp - 30.0).abs() < 1e-9)
            .expect("point at t=30");
        assert!((mid.value - 30.0).abs() < 1e-9);
        for p in &filled {
            assert!((p.value - p.timestamp).abs() < 1e-9);
        }
    }

    #[test]
    fn leaves_narrow_gaps_alone() {
        let points = [
            TelemetryPoint::new(0.0, 1.0),
            TelemetryPoint::new(30.0, 2.0),
            TelemetryPoint::new(45.0, 3.0),
        ];
        assert_eq!(fill_gaps(&points, &GapFill::default()), points.to_vec());
    }

    #[test]
    fn caps_inserted_points() {
        let points = [TelemetryPoint::new(0.0, 10.0), TelemetryPoint::new(600.0, 0.0)];
        let filled = fill_gaps(&points, &GapFill::default());
        assert_eq!(filled.len(), 2 + 5);

        let points = [TelemetryPoint::new(0.0, 10.0), TelemetryPoint::new(35.0, 0.0)];
        let filled = fill_gaps(&points, &GapFill::default());
        assert_eq!(filled.len(), 2 + 3);
    }

    #[test]
    fn short_series_is_not_decimated() {
        let points = ramp(80);
        assert_eq!(decimate(&points, 100), points);
    }

    #[test]
    fn decimation_keeps_endpoints_and_bounds_size() {
        let points = ramp(1000);
        let reduced = decimate(&points, 100);
        let factor = 1000usize.div_ceil(100);

        assert_eq!(reduced.first(), points.first());
        assert_eq!(reduced.last(), points.last());
        assert!(reduced.len() <= 100 + 2 * 1000usize.div_ceil(factor) + 1);
        assert!(reduced.len() < points.len());
        assert!(reduced.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn decimation_keeps_extremes() {
        let mut points: Vec<TelemetryPoint> =
            (0..300).map(|i| TelemetryPoint::new(i as f64, 50.0)).collect();
        points[157].value = 99.0;
        points[233].value = -4.0;

        let reduced = decimate(&points, 100);
        assert!(reduced.iter().any(|p| p.value == 99.0 && p.timestamp == 157.0));
        assert!(reduced.iter().any(|p| p.value == -4.0 && p.timestamp == 233.0));
    }

    #[test]
    fn prepare_composes_passes() {
        let mut points = ramp(400);
        points.push(TelemetryPoint::new(1000.0, 0.0));
        let series = TelemetrySeries::new(Metric::Altitude, points);

        let prepared = prepare_chart_series(&series, &ChartOptions::default());
        assert_eq!(prepared.metric, Metric::Altitude);
        assert!(prepared.is_sorted());
        assert_eq!(prepared.points.last().map(|p| p.timestamp), Some(1000.0));
        assert!(prepared.points.len() < 406);
        assert!(prepared.points.iter().any(|p| p.timestamp > 399.0 && p.timestamp < 1000.0));
    }

    #[test]
    fn value_at_interpolates() {
        let series = TelemetrySeries::new(
            Metric::Battery,
            vec![TelemetryPoint::new(0.0, 100.0), TelemetryPoint::new(10.0, 90.0)],
        );
        assert_eq!(series.value_at(5.0), Some(95.0));
        assert_eq!(series.value_at(-1.0), Some(100.0));
        assert_eq!(series.value_at(99.0), Some(90.0));
    }

    #[test]
    fn metric_names() {
        assert_eq!("vertical_speed".parse::<Metric>().unwrap(), Metric::VerticalSpeed);
        assert!("voltage".parse::<Metric>().is_err());
        assert_eq!(Metric::HorizontalSpeed.to_string(), "horizontal_speed");
    }
}
