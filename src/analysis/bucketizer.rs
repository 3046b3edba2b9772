use std::collections::{BTreeMap, HashMap, HashSet};

use crate::domain::{InsightEvent, SeriesPoint, TimeKey};
use crate::models::MarkerGroup;
use crate::utils::TimeUtils;

#[cfg(debug_assertions)]
use crate::config::DF;

/// Group insight events onto the series points they belong to.
///
/// Each event goes to the point sharing its bucket start (first such point in series
/// order). If no point shares the bucket, the nearest point in time takes it instead, so
/// no event is dropped while the series is non-empty. A repeated id counts as the same
/// event and is placed once. Groups come back in ascending time order.
///
/// `highlighted` selects the representative of a group when it names one of its events;
/// otherwise the first arrival represents the group.
pub fn bucketize(
    events: &[InsightEvent],
    points: &[SeriesPoint],
    bucket_seconds: i64,
    highlighted: Option<&str>,
) -> Vec<MarkerGroup> {
    if points.is_empty() || events.is_empty() {
        return Vec::new();
    }

    crate::trace_time!("Bucketize Insights", 2_000, {
        let bucket_index = build_bucket_index(points, bucket_seconds);

        let mut seen_ids: HashSet<&str> = HashSet::with_capacity(events.len());
        let mut grouped: BTreeMap<usize, Vec<InsightEvent>> = BTreeMap::new();
        let mut _nearest_fallbacks = 0usize;

        for event in events {
            if !seen_ids.insert(event.id.as_str()) {
                continue;
            }
            let event_bucket = TimeUtils::bucket_start(event.created_at, bucket_seconds);
            let idx = match bucket_index.get(&event_bucket) {
                Some(&idx) => idx,
                None => {
                    _nearest_fallbacks += 1;
                    nearest_index(points, event.created_at)
                }
            };
            grouped.entry(idx).or_default().push(event.clone());
        }

        #[cfg(debug_assertions)]
        if DF.log_bucketizer {
            log::info!(
                "🧲 BUCKETIZE: {} events -> {} groups ({} via nearest point)",
                seen_ids.len(),
                grouped.len(),
                _nearest_fallbacks
            );
        }

        grouped
            .into_iter()
            .map(|(idx, events)| {
                let representative = highlighted
                    .and_then(|id| events.iter().position(|e| e.id == id))
                    .unwrap_or(0);
                MarkerGroup {
                    bucket_time: points[idx].time,
                    value: points[idx].value,
                    events,
                    representative,
                }
            })
            .collect::<Vec<_>>()
    })
}

/// Bucket start -> index of the first point in that bucket. Built once per recomputation.
fn build_bucket_index(points: &[SeriesPoint], bucket_seconds: i64) -> HashMap<TimeKey, usize> {
    let mut index = HashMap::with_capacity(points.len());
    for (i, point) in points.iter().enumerate() {
        index
            .entry(TimeUtils::bucket_start(point.time, bucket_seconds))
            .or_insert(i);
    }
    index
}

/// Point with the smallest absolute time distance. Ties go to the earlier point.
/// `points` must be non-empty and ascending.
fn nearest_index(points: &[SeriesPoint], time: TimeKey) -> usize {
    let after = points.partition_point(|p| p.time < time);
    if after == 0 {
        return 0;
    }
    if after == points.len() {
        return points.len() - 1;
    }
    let before = after - 1;
    let gap_before = time - points[before].time;
    let gap_after = points[after].time - time;
    if gap_before <= gap_after { before } else { after }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(times: &[i64]) -> Vec<SeriesPoint> {
        times
            .iter()
            .map(|&t| SeriesPoint::new(t, t as f64))
            .collect()
    }

    fn ids(group: &MarkerGroup) -> Vec<&str> {
        group.events.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn event_lands_on_point_sharing_its_bucket() {
        let points = vec![SeriesPoint::new(100, 10.0), SeriesPoint::new(200, 12.0)];
        let events = vec![InsightEvent::new("e1", 150)];

        let groups = bucketize(&events, &points, 100, None);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].bucket_time, 100);
        assert_eq!(groups[0].value, 10.0);
        assert_eq!(ids(&groups[0]), vec!["e1"]);
    }

    #[test]
    fn exact_bucket_beats_a_closer_neighbour() {
        // 199 is 1s from point 200 but shares bucket 100 with point 100
        let points = series(&[100, 200]);
        let groups = bucketize(&[InsightEvent::new("e", 199)], &points, 100, None);
        assert_eq!(groups[0].bucket_time, 100);
    }

    #[test]
    fn first_point_in_a_bucket_wins_when_points_are_denser_than_buckets() {
        let points = series(&[100, 130, 160]);
        let groups = bucketize(&[InsightEvent::new("e", 170)], &points, 100, None);
        assert_eq!(groups[0].bucket_time, 100);
    }

    #[test]
    fn missing_bucket_falls_back_to_nearest_point() {
        // gap in the series: no point in buckets 300..=600
        let points = series(&[100, 200, 700, 800]);
        let events = vec![
            InsightEvent::new("near-200", 320),
            InsightEvent::new("near-700", 590),
            InsightEvent::new("before-all", -5_000),
            InsightEvent::new("after-all", 99_000),
        ];

        let groups = bucketize(&events, &points, 100, None);
        let placed: Vec<(i64, Vec<&str>)> = groups.iter().map(|g| (g.bucket_time, ids(g))).collect();

        assert_eq!(
            placed,
            vec![
                (100, vec!["before-all"]),
                (200, vec!["near-200"]),
                (700, vec!["near-700"]),
                (800, vec!["after-all"]),
            ]
        );
    }

    #[test]
    fn nearest_tie_goes_to_the_earlier_point() {
        let points = series(&[100, 300]);
        // bucket 200 has no point; 250 is 150 from 100 and 50 from 300
        assert_eq!(nearest_index(&points, 250), 1);
        // 200 is exactly between them
        assert_eq!(nearest_index(&points, 200), 0);
    }

    #[test]
    fn every_event_is_placed_exactly_once() {
        let points = series(&[0, 86_400, 259_200, 345_600]);
        let events: Vec<InsightEvent> = (0..200)
            .map(|i| InsightEvent::new(format!("e{}", i), i * 2_011 - 30_000))
            .collect();

        let groups = bucketize(&events, &points, 86_400, None);

        let mut placed: Vec<&str> = groups.iter().flat_map(|g| ids(g)).collect();
        assert_eq!(placed.len(), events.len());
        placed.sort_unstable();
        placed.dedup();
        assert_eq!(placed.len(), events.len());
        assert!(groups.iter().all(|g| !g.is_empty()));
        assert!(groups.windows(2).all(|w| w[0].bucket_time < w[1].bucket_time));
    }

    #[test]
    fn repeated_ids_are_grouped_once() {
        let points = series(&[100, 200]);
        let events = vec![
            InsightEvent::new("dup", 110),
            InsightEvent::new("dup", 210),
            InsightEvent::new("other", 120),
        ];
        let groups = bucketize(&events, &points, 100, None);
        assert_eq!(groups.len(), 1);
        assert_eq!(ids(&groups[0]), vec!["dup", "other"]);
    }

    #[test]
    fn highlighted_event_represents_its_group() {
        use crate::domain::TradeDirection;

        let points = series(&[100]);
        let events = vec![
            InsightEvent::new("a", 100).with_direction(TradeDirection::Long),
            InsightEvent::new("b", 150).with_direction(TradeDirection::Short),
        ];

        let plain = bucketize(&events, &points, 100, None);
        assert_eq!(plain[0].representative, 0);
        assert_eq!(plain[0].direction(), Some(TradeDirection::Long));

        let picked = bucketize(&events, &points, 100, Some("b"));
        assert_eq!(picked[0].representative().map(|e| e.id.as_str()), Some("b"));
        assert_eq!(picked[0].direction(), Some(TradeDirection::Short));

        let unknown = bucketize(&events, &points, 100, Some("zzz"));
        assert_eq!(unknown[0].representative, 0);
    }

    #[test]
    fn empty_series_yields_no_groups() {
        let groups = bucketize(&[InsightEvent::new("x", 1)], &[], 60, None);
        assert!(groups.is_empty());
    }
}
