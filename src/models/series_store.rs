use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::domain::{SeriesPoint, TimeKey};

/// What a live tick did to the tail of the series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickEffect {
    /// Same bucket as the last point: value replaced in place.
    Updated,
    /// A newer bucket opened.
    Appended,
    /// Older than the last stored point. Dropped so the middle of the series is never touched.
    Stale,
}

// ============================================================================
// SeriesStore: strictly ascending, unique-key points for one symbol+period
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeriesStore {
    points: Vec<SeriesPoint>,
}

impl SeriesStore {
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Install a whole new series (symbol/period switch or initial load).
    /// Input order is not trusted: points are sorted and a repeated key keeps its last value.
    pub fn replace(&mut self, mut points: Vec<SeriesPoint>) {
        points.sort_by_key(|p| p.time);

        let mut deduped: Vec<SeriesPoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.time == point.time => *last = point,
                _ => deduped.push(point),
            }
        }
        self.points = deduped;
    }

    /// Prepend an older page. Points whose key is already stored are skipped.
    /// `older` must be ascending and strictly older than the current head; that is not checked.
    /// Returns how many points were genuinely new (0 means the source had nothing older).
    pub fn merge_prepend(&mut self, older: Vec<SeriesPoint>) -> usize {
        let mut seen: HashSet<TimeKey> = self.points.iter().map(|p| p.time).collect();

        let unique_older: Vec<SeriesPoint> = older
            .into_iter()
            .filter(|p| seen.insert(p.time))
            .collect();

        let added = unique_older.len();
        if added == 0 {
            return 0;
        }

        let mut merged = Vec::with_capacity(added + self.points.len());
        merged.extend(unique_older);
        merged.append(&mut self.points);
        self.points = merged;
        added
    }

    /// Fold a live point into the tail.
    pub fn apply_tick(&mut self, point: SeriesPoint) -> TickEffect {
        match self.points.last_mut() {
            Some(last) if last.time == point.time => {
                last.value = point.value;
                TickEffect::Updated
            }
            Some(last) if point.time < last.time => TickEffect::Stale,
            _ => {
                self.points.push(point);
                TickEffect::Appended
            }
        }
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_time(&self) -> Option<TimeKey> {
        self.points.first().map(|p| p.time)
    }

    pub fn last(&self) -> Option<&SeriesPoint> {
        self.points.last()
    }

    /// Index of the point stored exactly at `time`.
    pub fn index_of(&self, time: TimeKey) -> Option<usize> {
        self.points.binary_search_by_key(&time, |p| p.time).ok()
    }
}
