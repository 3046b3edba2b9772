use crate::config::OverlayConfig;
use crate::domain::TimeKey;
use crate::models::{LogicalRange, MarkerGroup, ProjectedMarker, ViewportProjection};

#[cfg(debug_assertions)]
use crate::config::DF;

/// Coordinate and viewport primitives supplied by the chart engine.
/// Every query may come back empty while the chart is not yet renderable.
pub trait ChartProjector {
    /// Horizontal pixel of a series time, relative to the pane's left edge.
    fn time_to_pixel_x(&self, time: TimeKey) -> Option<f32>;
    /// Vertical pixel of a value, relative to the pane's top edge.
    fn value_to_pixel_y(&self, value: f64) -> Option<f32>;
    fn visible_logical_range(&self) -> Option<LogicalRange>;
    /// Width of the price-axis gutter.
    fn price_axis_width(&self) -> Option<f32>;
    /// Full pane size (width, height), gutter included.
    fn pane_size(&self) -> Option<(f32, f32)>;
}

/// Notifications that invalidate marker positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportTrigger {
    TimeRangeChanged,
    CrosshairMoved,
    Resized,
    DataChanged,
}

/// Recomputes every marker position on every trigger. Only the latest frame is kept.
#[derive(Debug, Default)]
pub struct OverlayPositioner {
    markers: Vec<ProjectedMarker>,
}

impl OverlayPositioner {
    pub fn new() -> Self {
        Self {
            markers: Vec::new(),
        }
    }

    pub fn on_trigger(
        &mut self,
        _trigger: ViewportTrigger,
        groups: &[MarkerGroup],
        projector: &dyn ChartProjector,
        config: &OverlayConfig,
    ) -> &[ProjectedMarker] {
        self.markers = crate::trace_time!("Project Markers", 1_000, {
            project_groups(groups, projector, config)
        });

        #[cfg(debug_assertions)]
        if DF.log_overlay {
            let shown = self.markers.iter().filter(|m| m.projection.visible).count();
            log::info!(
                "📍 OVERLAY [{:?}]: {}/{} markers visible",
                _trigger,
                shown,
                self.markers.len()
            );
        }
        &self.markers
    }

    pub fn markers(&self) -> &[ProjectedMarker] {
        &self.markers
    }

    pub fn clear(&mut self) {
        self.markers.clear();
    }
}

pub fn project_groups(
    groups: &[MarkerGroup],
    projector: &dyn ChartProjector,
    config: &OverlayConfig,
) -> Vec<ProjectedMarker> {
    let plot_area = plot_area(projector, config);
    groups
        .iter()
        .map(|group| ProjectedMarker {
            group: group.clone(),
            projection: match plot_area {
                Some(area) => project_group(group, projector, area),
                None => ViewportProjection::HIDDEN,
            },
        })
        .collect()
}

/// Plotting region (width, height) with the price-axis gutter taken off the width.
pub fn plot_area(projector: &dyn ChartProjector, config: &OverlayConfig) -> Option<(f32, f32)> {
    let (pane_width, pane_height) = projector.pane_size()?;
    let gutter = projector
        .price_axis_width()
        .filter(|w| *w > 0.0 && w.is_finite())
        .unwrap_or(config.fallback_price_axis_width);
    let plot_width = pane_width - gutter;
    if plot_width <= 0.0 || pane_height <= 0.0 {
        return None;
    }
    Some((plot_width, pane_height))
}

pub fn project_group(
    group: &MarkerGroup,
    projector: &dyn ChartProjector,
    (plot_width, plot_height): (f32, f32),
) -> ViewportProjection {
    let (Some(pixel_x), Some(pixel_y)) = (
        projector.time_to_pixel_x(group.bucket_time),
        projector.value_to_pixel_y(group.value),
    ) else {
        return ViewportProjection::HIDDEN;
    };
    if !pixel_x.is_finite() || !pixel_y.is_finite() {
        return ViewportProjection::HIDDEN;
    }

    let visible =
        (0.0..=plot_width).contains(&pixel_x) && (0.0..=plot_height).contains(&pixel_y);
    ViewportProjection {
        pixel_x,
        pixel_y,
        visible,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::InsightEvent;

    const CONFIG: OverlayConfig = OverlayConfig {
        fallback_price_axis_width: 60.0,
        marker_radius: 6.0,
        highlighted_marker_radius: 9.0,
    };

    /// Linear chart: 1px per second from `origin`, value v at y = 500 - v.
    struct FakeChart {
        origin: TimeKey,
        pane: Option<(f32, f32)>,
        gutter: Option<f32>,
        renderable: bool,
    }

    impl ChartProjector for FakeChart {
        fn time_to_pixel_x(&self, time: TimeKey) -> Option<f32> {
            self.renderable.then(|| (time - self.origin) as f32)
        }
        fn value_to_pixel_y(&self, value: f64) -> Option<f32> {
            self.renderable.then(|| 500.0 - value as f32)
        }
        fn visible_logical_range(&self) -> Option<LogicalRange> {
            None
        }
        fn price_axis_width(&self) -> Option<f32> {
            self.gutter
        }
        fn pane_size(&self) -> Option<(f32, f32)> {
            self.pane
        }
    }

    fn group(time: TimeKey, value: f64) -> MarkerGroup {
        MarkerGroup {
            bucket_time: time,
            value,
            events: vec![InsightEvent::new(format!("g{}", time), time)],
            representative: 0,
        }
    }

    fn chart() -> FakeChart {
        FakeChart {
            origin: 0,
            pane: Some((800.0, 500.0)),
            gutter: Some(100.0),
            renderable: true,
        }
    }

    #[test]
    fn marker_inside_plot_area_is_visible() {
        let p = project_group(&group(300, 200.0), &chart(), (700.0, 500.0));
        assert_eq!((p.pixel_x, p.pixel_y, p.visible), (300.0, 300.0, true));
    }

    #[test]
    fn marker_under_the_price_axis_is_clipped() {
        let markers = project_groups(&[group(750, 100.0)], &chart(), &CONFIG);
        assert_eq!(markers[0].projection.pixel_x, 750.0);
        assert!(!markers[0].projection.visible);
    }

    #[test]
    fn marker_scrolled_off_left_or_above_is_clipped() {
        let mut fc = chart();
        fc.origin = 1_000;
        let markers = project_groups(&[group(900, 100.0), group(1_100, 900.0)], &fc, &CONFIG);
        assert!(markers.iter().all(|m| !m.projection.visible));
    }

    #[test]
    fn missing_or_non_positive_gutter_uses_fallback() {
        let mut fc = chart();
        fc.gutter = Some(0.0);
        assert_eq!(plot_area(&fc, &CONFIG), Some((740.0, 500.0)));
        fc.gutter = None;
        assert_eq!(plot_area(&fc, &CONFIG), Some((740.0, 500.0)));
        fc.gutter = Some(-3.0);
        // 745 would be visible with a 50px gutter but not with the 60px fallback
        let markers = project_groups(&[group(745, 100.0)], &fc, &CONFIG);
        assert!(!markers[0].projection.visible);
    }

    #[test]
    fn unrenderable_chart_hides_markers() {
        let mut fc = chart();
        fc.renderable = false;
        let markers = project_groups(&[group(10, 10.0)], &fc, &CONFIG);
        assert_eq!(markers[0].projection, ViewportProjection::HIDDEN);

        let mut no_pane = chart();
        no_pane.pane = None;
        let markers = project_groups(&[group(10, 10.0)], &no_pane, &CONFIG);
        assert!(!markers[0].projection.visible);
    }

    #[test]
    fn every_trigger_recomputes_from_scratch() {
        let groups = vec![group(100, 100.0)];
        let mut positioner = OverlayPositioner::new();
        let mut fc = chart();

        let first = positioner.on_trigger(ViewportTrigger::DataChanged, &groups, &fc, &CONFIG)[0]
            .projection;
        assert_eq!(first.pixel_x, 100.0);

        // pan: same groups, chart moved
        fc.origin = 50;
        let panned = positioner.on_trigger(ViewportTrigger::TimeRangeChanged, &groups, &fc, &CONFIG)
            [0]
        .projection;
        assert_eq!(panned.pixel_x, 50.0);

        // shrink pane so the marker falls under the axis gutter
        fc.pane = Some((120.0, 500.0));
        let resized =
            positioner.on_trigger(ViewportTrigger::Resized, &groups, &fc, &CONFIG)[0].projection;
        assert!(!resized.visible);
        assert_eq!(positioner.markers().len(), 1);
    }
}
