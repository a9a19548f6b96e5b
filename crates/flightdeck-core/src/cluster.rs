//! Grouping of nearby timeline events into single markers.
//!
//! The sweep is greedy and left-to-right: each event joins the open cluster
//! when it lies within `threshold` seconds of the previous event, so a long
//! run of closely spaced events chains into one cluster. The grouping is not
//! globally optimal and callers must not rely on exact membership beyond
//! that rule.

use crate::events::Timestamped;
use serde::Serialize;

/// Default distance between neighbours that still share a marker.
pub const DEFAULT_CLUSTER_THRESHOLD_SECS: u64 = 2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventCluster<T> {
    pub events: Vec<T>,
    /// Mean member timestamp in seconds.
    pub position: f64,
}

impl<T: Timestamped> EventCluster<T> {
    fn from_members(events: Vec<T>) -> Self {
        let sum: f64 = events.iter().map(|e| e.timestamp().as_secs_f64()).sum();
        let position = sum / events.len() as f64;
        Self { events, position }
    }

    pub fn is_cluster(&self) -> bool {
        self.events.len() > 1
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Earliest and latest member timestamps in seconds.
    pub fn span(&self) -> (u64, u64) {
        let mut times = self.events.iter().map(|e| e.timestamp().as_secs());
        let first = times.next().unwrap_or(0);
        times.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t)))
    }
}

/// Cluster events whose sorted timestamps are at most `threshold_secs` apart.
pub fn cluster_events<T>(events: impl IntoIterator<Item = T>, threshold_secs: u64) -> Vec<EventCluster<T>>
where
    T: Timestamped,
{
    let mut sorted: Vec<T> = events.into_iter().collect();
    // Stable, so equal timestamps keep their input order.
    sorted.sort_by_key(|e| e.timestamp());

    let mut clusters = Vec::new();
    let mut current: Vec<T> = Vec::new();
    // `None` until the first event, which always opens a cluster.
    let mut prev_timestamp: Option<u64> = None;

    for event in sorted {
        let event_time = event.timestamp().as_secs();
        let joins = prev_timestamp.is_some_and(|prev| event_time - prev <= threshold_secs);
        if !joins && !current.is_empty() {
            clusters.push(EventCluster::from_members(std::mem::take(&mut current)));
        }
        current.push(event);
        prev_timestamp = Some(event_time);
    }

    if !current.is_empty() {
        clusters.push(EventCluster::from_members(current));
    }

    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timecode::Timecode;

    fn at(secs: &[u64]) -> Vec<Timecode> {
        secs.iter().copied().map(Timecode::from_secs).collect()
    }

    fn members(cluster: &EventCluster<Timecode>) -> Vec<u64> {
        cluster.events.iter().map(|t| t.as_secs()).collect()
    }

    #[test]
    fn groups_neighbours_within_threshold() {
        let clusters = cluster_events(at(&[0, 1, 10, 11, 12, 50]), 2);
        assert_eq!(clusters.len(), 3);
        assert_eq!(members(&clusters[0]), vec![0, 1]);
        assert_eq!(members(&clusters[1]), vec![10, 11, 12]);
        assert_eq!(members(&clusters[2]), vec![50]);
        assert!(clusters[0].is_cluster());
        assert!(clusters[1].is_cluster());
        assert!(!clusters[2].is_cluster());
        assert_eq!(clusters[1].position, 11.0);
    }

    #[test]
    fn sorts_unordered_input() {
        let clusters = cluster_events(at(&[50, 11, 0, 12, 1, 10]), 2);
        let positions: Vec<f64> = clusters.iter().map(|c| c.position).collect();
        assert_eq!(positions, vec![0.5, 11.0, 50.0]);
    }

    #[test]
    fn never_drops_or_duplicates() {
        let input = at(&[3, 3, 4, 9, 20, 21, 22, 23, 24, 40, 41, 90]);
        let clusters = cluster_events(input.clone(), 2);
        let total: usize = clusters.iter().map(EventCluster::len).sum();
        assert_eq!(total, input.len());

        for cluster in &clusters {
            let (lo, hi) = cluster.span();
            assert!(cluster.position >= lo as f64 && cluster.position <= hi as f64);
        }
        for pair in clusters.windows(2) {
            assert!(pair[0].span().1 < pair[1].span().0);
        }
    }

    #[test]
    fn chains_evenly_spaced_runs() {
        // Each neighbour is within the threshold, so the whole run joins.
        let clusters = cluster_events(at(&[0, 2, 4, 6, 8]), 2);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].position, 4.0);
    }

    #[test]
    fn first_event_at_zero_opens_cluster() {
        let clusters = cluster_events(at(&[0]), 2);
        assert_eq!(clusters.len(), 1);
        assert!(!clusters[0].is_cluster());
    }

    #[test]
    fn empty_input() {
        let clusters = cluster_events(Vec::<Timecode>::new(), 2);
        assert!(clusters.is_empty());
    }

    #[test]
    fn zero_threshold_only_merges_identical_times() {
        let clusters = cluster_events(at(&[5, 5, 6]), 0);
        assert_eq!(clusters.len(), 2);
        assert_eq!(members(&clusters[0]), vec![5, 5]);
    }

    #[test]
    fn huge_thresholds_merge_everything() {
        let clusters = cluster_events(at(&[0, 1]), u64::MAX);
        assert_eq!(clusters.len(), 1);

        let clusters = cluster_events(at(&[0, 100, u64::MAX / 2]), 1 << 63);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].len(), 3);
    }
}
