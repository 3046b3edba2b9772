mod marker_group;
mod pagination;
mod series_store;

pub use {
    marker_group::{MarkerGroup, ProjectedMarker, ViewportProjection},
    pagination::{LogicalRange, PaginationController, PaginationCursor, PaginationState},
    series_store::{SeriesStore, TickEffect},
};
