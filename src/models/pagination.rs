use serde::{Deserialize, Serialize};

use crate::config::PaginationConfig;
use crate::data::FetchError;
use crate::domain::TimeKey;

#[cfg(debug_assertions)]
use crate::config::DF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaginationState {
    Idle,
    Fetching,
    /// Terminal for the current symbol+period. Only `reset` leaves it.
    BoundaryReached,
}

/// Status snapshot for loading indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PaginationCursor {
    pub earliest_loaded_time: Option<TimeKey>,
    pub reached_boundary: bool,
    pub in_flight: bool,
}

/// Visible window in logical bar units: 0.0 is the first loaded point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogicalRange {
    pub from: f64,
    pub to: f64,
}

impl LogicalRange {
    pub fn new(from: f64, to: f64) -> Self {
        Self { from, to }
    }
}

/// Drives backward-in-time loading as the viewport approaches the oldest loaded bar.
#[derive(Debug, Clone)]
pub struct PaginationController {
    state: PaginationState,
    earliest_loaded_time: Option<TimeKey>,
    page_size: usize,
    edge_lookahead_bars: f64,
}

impl PaginationController {
    pub fn new(config: &PaginationConfig) -> Self {
        Self {
            state: PaginationState::Idle,
            earliest_loaded_time: None,
            page_size: config.page_size.max(1),
            edge_lookahead_bars: config.edge_lookahead_bars,
        }
    }

    pub fn state(&self) -> PaginationState {
        self.state
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn cursor(&self) -> PaginationCursor {
        PaginationCursor {
            earliest_loaded_time: self.earliest_loaded_time,
            reached_boundary: self.state == PaginationState::BoundaryReached,
            in_flight: self.state == PaginationState::Fetching,
        }
    }

    /// Called whenever the head of the series moves (replace or merge).
    pub fn set_earliest_loaded(&mut self, time: Option<TimeKey>) {
        self.earliest_loaded_time = time;
    }

    pub fn is_near_left_edge(&self, range: &LogicalRange) -> bool {
        range.from < self.edge_lookahead_bars
    }

    pub fn should_fetch(&self, range: &LogicalRange) -> bool {
        self.state == PaginationState::Idle
            && self.earliest_loaded_time.is_some()
            && self.is_near_left_edge(range)
    }

    /// `Idle -> Fetching` when the edge condition holds.
    /// Returns the inclusive end time for the older page.
    pub fn begin_fetch(&mut self, range: &LogicalRange) -> Option<TimeKey> {
        if !self.should_fetch(range) {
            return None;
        }
        let end_time = self.earliest_loaded_time? - 1;
        self.state = PaginationState::Fetching;

        #[cfg(debug_assertions)]
        if DF.log_pagination {
            log::info!(
                "📜 PAGINATION: left edge at {:.1} bars, requesting {} bars ending {}",
                range.from,
                self.page_size,
                end_time
            );
        }
        Some(end_time)
    }

    /// `Fetching -> Idle | BoundaryReached` after the page has been merged into the store.
    /// A page adding nothing, or shorter than requested, means the source is exhausted.
    pub fn on_page_merged(&mut self, new_points: usize, returned: usize) -> PaginationState {
        if self.state != PaginationState::Fetching {
            log::warn!(
                "Pagination result arrived in state {:?}; ignoring transition",
                self.state
            );
            return self.state;
        }

        self.state = if new_points == 0 || returned < self.page_size {
            PaginationState::BoundaryReached
        } else {
            PaginationState::Idle
        };

        #[cfg(debug_assertions)]
        if DF.log_pagination {
            log::info!(
                "📜 PAGINATION: page returned {} ({} new) -> {:?}",
                returned,
                new_points,
                self.state
            );
        }
        self.state
    }

    /// Retry policy: a failed fetch goes back to `Idle` with the boundary untouched,
    /// so the next edge-proximity notification tries again. Nothing reaches the UI.
    pub fn on_fetch_failed(&mut self, err: &FetchError) {
        if self.state == PaginationState::Fetching {
            self.state = PaginationState::Idle;
        }
        log::warn!("Older page fetch failed, will retry on next edge trigger: {}", err);
    }

    /// Symbol or period switch.
    pub fn reset(&mut self) {
        self.state = PaginationState::Idle;
        self.earliest_loaded_time = None;
    }
}
