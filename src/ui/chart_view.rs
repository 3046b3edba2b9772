use eframe::egui::{
    Align2, FontId, Id, LayerId, Order::Tooltip, Pos2, Rect, RichText, Stroke, Ui, Vec2, Vec2b,
};

#[allow(deprecated)]
use eframe::egui::show_tooltip_at_pointer;

use egui_plot::{AxisHints, HPlacement, Plot, PlotBounds, VPlacement};

use crate::analysis::{ChartProjector, ViewportTrigger};
use crate::config::CHART;
use crate::config::plot::PLOT_CONFIG;
use crate::domain::{SeriesPoint, TimeKey};
use crate::engine::ChartSync;
use crate::models::{LogicalRange, ProjectedMarker};
use crate::ui::plot_layers::{
    HistoryStartLayer, LastPriceLayer, LayerContext, PlotLayer, PriceSeriesLayer,
};
use crate::ui::projector::PlotProjector;
use crate::ui::styles::{DirectionColor, direction_icon};
use crate::ui::ui_text::UI_TEXT;
use crate::ui::utils::format_price;
use crate::utils::TimeUtils;

/// What the chart reports back to the app after a frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChartViewOutput {
    pub visible_range: Option<LogicalRange>,
    /// Bucket time of the marker group clicked this frame.
    pub clicked_group: Option<TimeKey>,
}

/// Identifies the series the current x window was laid out for.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SeriesAnchor {
    generation: u64,
    first_time: TimeKey,
}

/// Line chart with insight markers painted over it.
#[derive(Default)]
pub struct ChartView {
    anchor: Option<SeriesAnchor>,
    /// X window of the previous frame, used to keep bars in place across prepends.
    last_x_bounds: Option<(f64, f64)>,
    /// Full plot bounds the current marker positions were projected with.
    last_bounds: Option<PlotBounds>,
    last_revision: Option<u64>,
    last_pane: Option<(f32, f32)>,
    last_pointer: Option<Pos2>,
}

impl ChartView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, ui: &mut Ui, chart: &mut ChartSync) -> ChartViewOutput {
        let forced_x = self.resolve_x_window(chart);
        let x_window = forced_x.or(self.last_x_bounds);
        let y_range = x_window
            .and_then(|(from, to)| visible_value_range(chart.series(), from, to))
            .map(|(lo, hi)| padded(lo, hi));

        let widget_rect = ui.available_rect_before_wrap();
        let times: Vec<TimeKey> = chart.series().iter().map(|p| p.time).collect();
        let intraday = chart.market().bucket_seconds() < TimeUtils::S_IN_D;
        let y_label = format!("{}  {}", chart.market().symbol, UI_TEXT.plot_y_axis);

        let response = crate::trace_time!("Chart Plot", 2_000, {
            let ctx = LayerContext {
                points: chart.series(),
                reached_boundary: chart.pagination_status().reached_boundary,
            };

            Plot::new("insight_chart")
                .custom_x_axes(vec![create_time_axis(times.clone(), intraday)])
                .custom_y_axes(vec![create_y_axis(y_label)])
                .label_formatter(|_, _| String::new())
                .allow_double_click_reset(false)
                .allow_scroll(Vec2b { x: true, y: false })
                .allow_drag(Vec2b { x: true, y: false })
                .allow_zoom(Vec2b { x: true, y: false })
                .show(ui, |plot_ui| {
                    if let Some((from, to)) = forced_x {
                        plot_ui.set_plot_bounds_x(from..=to);
                    }
                    if let Some((lo, hi)) = y_range {
                        plot_ui.set_plot_bounds_y(lo..=hi);
                    }

                    let layers: [Box<dyn PlotLayer>; 3] = [
                        Box::new(PriceSeriesLayer),
                        Box::new(LastPriceLayer),
                        Box::new(HistoryStartLayer),
                    ];
                    for layer in layers {
                        layer.render(plot_ui, &ctx);
                    }
                })
        });

        let projector = PlotProjector::new(response.transform, times, widget_rect);
        let visible_range = projector.visible_logical_range();
        let pointer = ui.input(|i| i.pointer.hover_pos());

        if let Some(trigger) = self.detect_trigger(chart.revision(), &projector, pointer) {
            chart.project_markers(trigger, &projector);
        }
        self.last_x_bounds = visible_range.map(|r| (r.from, r.to));

        let frame = projector.plot_frame();
        let pane = Rect::from_min_max(frame.min, Pos2::new(widget_rect.right(), frame.bottom()));
        let hovered = paint_markers(ui, chart, pane, pointer);

        let mut clicked_group = None;
        if let Some(marker) = hovered {
            show_marker_tooltip(ui, marker);
            if response.response.clicked() {
                clicked_group = Some(marker.group.bucket_time);
            }
        }

        ChartViewOutput {
            visible_range,
            clicked_group,
        }
    }

    /// X bounds to force this frame, if the series moved under the current window.
    fn resolve_x_window(&mut self, chart: &ChartSync) -> Option<(f64, f64)> {
        let Some(first_time) = chart.store().first_time() else {
            self.anchor = None;
            return None;
        };
        let current = SeriesAnchor {
            generation: chart.generation(),
            first_time,
        };

        let forced = match self.anchor {
            Some(prev) if prev == current => None,
            Some(prev) if prev.generation == current.generation => {
                // Older bars were prepended: keep the same bars under the cursor.
                let shift = chart.store().index_of(prev.first_time).unwrap_or(0) as f64;
                self.last_x_bounds
                    .map(|(from, to)| (from + shift, to + shift))
                    .or_else(|| Some(initial_window(chart.store().len())))
            }
            _ => Some(initial_window(chart.store().len())),
        };
        self.anchor = Some(current);
        forced
    }

    fn detect_trigger(
        &mut self,
        revision: u64,
        projector: &PlotProjector,
        pointer: Option<Pos2>,
    ) -> Option<ViewportTrigger> {
        let pane = projector.pane_size();
        let bounds = Some(projector.plot_bounds());

        let trigger = if self.last_revision != Some(revision) {
            Some(ViewportTrigger::DataChanged)
        } else if self.last_pane != pane {
            Some(ViewportTrigger::Resized)
        } else if self.last_bounds != bounds {
            // x pan or zoom, or the price axis refitting to it
            Some(ViewportTrigger::TimeRangeChanged)
        } else if self.last_pointer != pointer {
            Some(ViewportTrigger::CrosshairMoved)
        } else {
            None
        };

        self.last_revision = Some(revision);
        self.last_pane = pane;
        self.last_bounds = bounds;
        self.last_pointer = pointer;
        trigger
    }
}

/// The newest `initial_visible_bars` with a little room on the right.
fn initial_window(len: usize) -> (f64, f64) {
    let len = len as f64;
    let from = (len - PLOT_CONFIG.initial_visible_bars).max(0.0);
    (from, len + 1.0)
}

/// Min and max value over the bars whose index falls in `from..=to`.
fn visible_value_range(points: &[SeriesPoint], from: f64, to: f64) -> Option<(f64, f64)> {
    if points.is_empty() || !from.is_finite() || !to.is_finite() || to < from {
        return None;
    }
    let last = points.len() - 1;
    let start = (from.floor().max(0.0) as usize).min(last);
    let end = (to.ceil().max(0.0) as usize).min(last);

    points[start..=end]
        .iter()
        .map(|p| p.value)
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

fn padded(lo: f64, hi: f64) -> (f64, f64) {
    let range = hi - lo;
    let pad = if range > 0.0 {
        range * PLOT_CONFIG.plot_y_padding_pct
    } else {
        // flat series
        (hi.abs() * PLOT_CONFIG.plot_y_padding_pct).max(1e-8)
    };
    (lo - pad, hi + pad)
}

fn create_time_axis(times: Vec<TimeKey>, intraday: bool) -> AxisHints<'static> {
    let format = if intraday {
        TimeUtils::CROSSHAIR_TIME_FORMAT
    } else {
        TimeUtils::STANDARD_TIME_FORMAT
    };
    AxisHints::new_x()
        .formatter(move |grid_mark, _range| {
            let value = grid_mark.value;
            if value < 0.0 || (value - value.round()).abs() > 1e-6 {
                return String::new();
            }
            times
                .get(value.round() as usize)
                .map(|&t| TimeUtils::epoch_sec_to_string(t, format))
                .unwrap_or_default()
        })
        .placement(VPlacement::Bottom)
}

fn create_y_axis(label: String) -> AxisHints<'static> {
    AxisHints::new_y()
        .label(label)
        .formatter(|grid_mark, _range| format_price(grid_mark.value))
        .placement(HPlacement::Right)
}

/// Paints the visible markers and returns the one under the pointer.
fn paint_markers<'a>(
    ui: &Ui,
    chart: &'a ChartSync,
    pane: Rect,
    pointer: Option<Pos2>,
) -> Option<&'a ProjectedMarker> {
    let painter = ui.painter_at(pane);
    let overlay = &CHART.overlay;
    let highlighted = chart.highlighted();
    let mut hovered = None;

    for marker in chart.projected_markers() {
        if !marker.projection.visible {
            continue;
        }
        let center = pane.min + Vec2::new(marker.projection.pixel_x, marker.projection.pixel_y);
        let is_highlighted = highlighted.is_some_and(|id| marker.group.contains(id));
        let radius = if is_highlighted {
            overlay.highlighted_marker_radius
        } else {
            overlay.marker_radius
        };

        painter.circle_filled(center, radius, marker.group.color());
        if is_highlighted {
            painter.circle_stroke(
                center,
                radius,
                Stroke::new(
                    PLOT_CONFIG.highlight_stroke_width,
                    PLOT_CONFIG.highlight_stroke_color,
                ),
            );
        }
        if marker.group.len() > 1 {
            painter.text(
                center + Vec2::new(radius + 2.0, -radius),
                Align2::LEFT_BOTTOM,
                marker.group.len().to_string(),
                FontId::proportional(11.0),
                PLOT_CONFIG.group_count_color,
            );
        }

        if pointer.is_some_and(|p| p.distance(center) <= radius + 2.0) {
            hovered = Some(marker);
        }
    }
    hovered
}

fn show_marker_tooltip(ui: &Ui, marker: &ProjectedMarker) {
    let tooltip_layer = LayerId::new(Tooltip, Id::new("insight_tooltips"));

    #[allow(deprecated)]
    show_tooltip_at_pointer(
        ui.ctx(),
        tooltip_layer,
        Id::new(format!("insight_{}", marker.group.bucket_time)),
        |ui: &mut Ui| {
            ui.label(
                RichText::new(TimeUtils::epoch_sec_to_string(
                    marker.group.bucket_time,
                    TimeUtils::CROSSHAIR_TIME_FORMAT,
                ))
                .strong(),
            );
            ui.label(format_price(marker.group.value));
            ui.separator();
            for event in &marker.group.events {
                let text = event.alert_options.label.as_deref().unwrap_or(&event.id);
                ui.label(
                    RichText::new(format!("{} {}", direction_icon(event.direction()), text))
                        .color(event.direction().color()),
                );
            }
            if marker.group.len() > 1 {
                ui.separator();
                ui.label(RichText::new(UI_TEXT.marker_hint).small());
            }
        },
    );
}
