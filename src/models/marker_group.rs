use serde::Serialize;

use crate::domain::{InsightEvent, TimeKey, TradeDirection};

/// Insights resolved onto the same chart bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerGroup {
    /// Time of the series point the group is anchored to.
    pub bucket_time: TimeKey,
    /// Series value at `bucket_time`, used for the vertical position.
    pub value: f64,
    /// Arrival order, unique by id.
    pub events: Vec<InsightEvent>,
    /// Index into `events` of the event that decides direction and styling.
    pub representative: usize,
}

impl MarkerGroup {
    pub fn representative(&self) -> Option<&InsightEvent> {
        self.events.get(self.representative)
    }

    pub fn direction(&self) -> Option<TradeDirection> {
        self.representative().and_then(InsightEvent::direction)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.events.iter().any(|e| e.id == id)
    }
}

/// Screen placement of one group for the current trigger only.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ViewportProjection {
    pub pixel_x: f32,
    pub pixel_y: f32,
    pub visible: bool,
}

impl ViewportProjection {
    pub const HIDDEN: Self = Self {
        pixel_x: 0.0,
        pixel_y: 0.0,
        visible: false,
    };
}

/// A group paired with where it lands on screen this frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectedMarker {
    pub group: MarkerGroup,
    pub projection: ViewportProjection,
}
