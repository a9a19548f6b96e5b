//! Flight track geometry for the map view.

use serde::{Deserialize, Serialize};

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A recorded GPS fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    /// Seconds since takeoff.
    pub timestamp: f64,
    pub lat: f64,
    pub lon: f64,
    pub altitude_m: f64,
}

/// Interpolated drone position at a playback instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackPosition {
    pub lat: f64,
    pub lon: f64,
    pub altitude_m: f64,
    /// Degrees clockwise from north, from the surrounding segment.
    pub heading_deg: f64,
}

/// Great-circle distance between two fixes in meters.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let hav = |delta_deg: f64| (delta_deg.to_radians() / 2.0).sin().powi(2);
    let h = hav(lat2 - lat1) + lat1.to_radians().cos() * lat2.to_radians().cos() * hav(lon2 - lon1);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Initial bearing from the first point to the second, `0.0..360.0`.
pub fn bearing_deg(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let y = dlambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * dlambda.cos();
    (y.atan2(x).to_degrees() + 360.0) % 360.0
}

/// Total ground distance along the track in meters.
pub fn path_length_m(track: &[TrackPoint]) -> f64 {
    track
        .windows(2)
        .map(|w| haversine_distance(w[0].lat, w[0].lon, w[1].lat, w[1].lon))
        .sum()
}

/// Position along the track at `secs`, clamped to the recorded range.
pub fn position_at(track: &[TrackPoint], secs: f64) -> Option<TrackPosition> {
    let first = track.first()?;
    let last = track.last()?;

    if track.len() == 1 {
        return Some(TrackPosition {
            lat: first.lat,
            lon: first.lon,
            altitude_m: first.altitude_m,
            heading_deg: 0.0,
        });
    }

    let t = secs.clamp(first.timestamp, last.timestamp);
    let idx = track
        .partition_point(|p| p.timestamp <= t)
        .clamp(1, track.len() - 1);
    let (a, b) = (&track[idx - 1], &track[idx]);

    let span = b.timestamp - a.timestamp;
    let f = if span > 0.0 { (t - a.timestamp) / span } else { 0.0 };

    Some(TrackPosition {
        lat: a.lat + (b.lat - a.lat) * f,
        lon: a.lon + (b.lon - a.lon) * f,
        altitude_m: a.altitude_m + (b.altitude_m - a.altitude_m) * f,
        heading_deg: bearing_deg(a.lat, a.lon, b.lat, b.lon),
    })
}

/// Ramer-Douglas-Peucker simplification with a tolerance in meters.
///
/// Endpoints are always kept. Distances use a local equirectangular
/// projection around the first point, which is accurate at flight scale.
pub fn simplify_path(track: &[TrackPoint], tolerance_m: f64) -> Vec<TrackPoint> {
    if track.len() < 3 || tolerance_m <= 0.0 {
        return track.to_vec();
    }

    let ref_lat = track[0].lat.to_radians();
    let project = |p: &TrackPoint| {
        (
            p.lon.to_radians() * ref_lat.cos() * EARTH_RADIUS_M,
            p.lat.to_radians() * EARTH_RADIUS_M,
        )
    };
    let xy: Vec<(f64, f64)> = track.iter().map(project).collect();

    let mut keep = vec![false; track.len()];
    keep[0] = true;
    keep[track.len() - 1] = true;

    let mut stack = vec![(0usize, track.len() - 1)];
    while let Some((start, end)) = stack.pop() {
        if end <= start + 1 {
            continue;
        }

        let mut farthest = start;
        let mut max_dist = 0.0;
        for i in start + 1..end {
            let d = point_segment_distance(xy[i], xy[start], xy[end]);
            if d > max_dist {
                max_dist = d;
                farthest = i;
            }
        }

        if max_dist > tolerance_m {
            keep[farthest] = true;
            stack.push((start, farthest));
            stack.push((farthest, end));
        }
    }

    track
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}

fn point_segment_distance(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return ((p.0 - a.0).powi(2) + (p.1 - a.1).powi(2)).sqrt();
    }
    let t = (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len_sq).clamp(0.0, 1.0);
    let (cx, cy) = (a.0 + t * dx, a.1 + t * dy);
    ((p.0 - cx).powi(2) + (p.1 - cy).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix(timestamp: f64, lat: f64, lon: f64) -> TrackPoint {
        TrackPoint {
            timestamp,
            lat,
            lon,
            altitude_m: 50.0,
        }
    }

    #[test]
    fn northward_leg_matches_meridian_arc() {
        let track = [fix(0.0, 33.0, -117.0), fix(10.0, 33.001, -117.0), fix(20.0, 33.002, -117.0)];
        let expected = EARTH_RADIUS_M * 0.002_f64.to_radians();
        assert!((path_length_m(&track) - expected).abs() < 0.01);

        let there = haversine_distance(33.0, -117.0, 33.002, -117.0);
        let back = haversine_distance(33.002, -117.0, 33.0, -117.0);
        assert!((there - back).abs() < 1e-9);
    }

    #[test]
    fn eastward_leg_shrinks_with_latitude() {
        let equator = haversine_distance(0.0, 0.0, 0.0, 0.001);
        let north = haversine_distance(33.68, -117.83, 33.68, -117.829);
        assert!((north / equator - 33.68_f64.to_radians().cos()).abs() < 1e-6);
    }

    #[test]
    fn hovering_track_has_no_length() {
        let track = [fix(0.0, 33.68, -117.83), fix(1.0, 33.68, -117.83), fix(2.0, 33.68, -117.83)];
        assert_eq!(path_length_m(&track), 0.0);
        assert_eq!(path_length_m(&track[..1]), 0.0);
    }

    #[test]
    fn bearing_cardinal_directions() {
        assert!((bearing_deg(0.0, 0.0, 1.0, 0.0) - 0.0).abs() < 1e-6);
        assert!((bearing_deg(0.0, 0.0, 0.0, 1.0) - 90.0).abs() < 1e-6);
        assert!((bearing_deg(0.0, 0.0, -1.0, 0.0) - 180.0).abs() < 1e-6);
    }

    #[test]
    fn position_interpolates_between_fixes() {
        let track = [fix(0.0, 33.0, -117.0), fix(10.0, 33.001, -117.0)];
        let pos = position_at(&track, 5.0).unwrap();
        assert!((pos.lat - 33.0005).abs() < 1e-9);
        assert!(pos.heading_deg.abs() < 1e-6);

        let before = position_at(&track, -3.0).unwrap();
        assert_eq!(before.lat, 33.0);
        let after = position_at(&track, 99.0).unwrap();
        assert_eq!(after.lat, 33.001);
        assert!(position_at(&[], 0.0).is_none());
    }

    #[test]
    fn simplify_drops_collinear_points() {
        let track: Vec<TrackPoint> = (0..20)
            .map(|i| fix(i as f64, 33.0 + i as f64 * 0.0001, -117.0))
            .collect();
        let simplified = simplify_path(&track, 1.0);
        assert_eq!(simplified.len(), 2);
        assert_eq!(simplified[0], track[0]);
        assert_eq!(simplified[1], track[19]);
    }

    #[test]
    fn simplify_keeps_corners() {
        let track = [
            fix(0.0, 33.0, -117.0),
            fix(1.0, 33.0005, -117.0),
            fix(2.0, 33.001, -117.0),
            fix(3.0, 33.001, -116.999),
            fix(4.0, 33.001, -116.998),
        ];
        let simplified = simplify_path(&track, 5.0);
        assert_eq!(simplified.len(), 3);
        assert_eq!(simplified[1], track[2]);
        assert!((path_length_m(&simplified) - path_length_m(&track)).abs() < 1.0);
    }
}
