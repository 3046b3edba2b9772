use eframe::egui::Rect;
use egui_plot::{PlotBounds, PlotPoint, PlotTransform};

use crate::analysis::ChartProjector;
use crate::domain::TimeKey;
use crate::models::LogicalRange;

/// `ChartProjector` over the transform egui_plot reported for this frame.
///
/// The plot's x axis is the logical bar index, so a time resolves to a pixel only
/// when it is the key of a loaded point. Pane coordinates are relative to the
/// plot frame's top-left corner; the pane extends right over the price axis.
pub struct PlotProjector {
    transform: PlotTransform,
    times: Vec<TimeKey>,
    widget_rect: Rect,
}

impl PlotProjector {
    pub fn new(transform: PlotTransform, times: Vec<TimeKey>, widget_rect: Rect) -> Self {
        Self {
            transform,
            times,
            widget_rect,
        }
    }

    pub fn plot_frame(&self) -> Rect {
        *self.transform.frame()
    }

    /// Both axes. The y fit can move on a frame where the x window did not.
    pub fn plot_bounds(&self) -> PlotBounds {
        *self.transform.bounds()
    }
}

impl ChartProjector for PlotProjector {
    fn time_to_pixel_x(&self, time: TimeKey) -> Option<f32> {
        let idx = self.times.binary_search(&time).ok()?;
        let pos = self
            .transform
            .position_from_point(&PlotPoint::new(idx as f64, 0.0));
        Some(pos.x - self.plot_frame().min.x)
    }

    fn value_to_pixel_y(&self, value: f64) -> Option<f32> {
        if !value.is_finite() {
            return None;
        }
        let pos = self.transform.position_from_point(&PlotPoint::new(0.0, value));
        Some(pos.y - self.plot_frame().min.y)
    }

    fn visible_logical_range(&self) -> Option<LogicalRange> {
        let bounds = self.transform.bounds();
        if !bounds.is_valid() {
            return None;
        }
        Some(LogicalRange::new(bounds.min()[0], bounds.max()[0]))
    }

    fn price_axis_width(&self) -> Option<f32> {
        let width = self.widget_rect.right() - self.plot_frame().right();
        (width > 0.0).then_some(width)
    }

    fn pane_size(&self) -> Option<(f32, f32)> {
        let frame = self.plot_frame();
        let width = self.widget_rect.right() - frame.left();
        (width > 0.0 && frame.height() > 0.0).then_some((width, frame.height()))
    }
}
