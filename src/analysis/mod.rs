mod bucketizer;
mod overlay;

pub use bucketizer::bucketize;
pub use overlay::{
    ChartProjector, OverlayPositioner, ViewportTrigger, plot_area, project_group, project_groups,
};
