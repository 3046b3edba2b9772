use egui_plot::{HLine, Line, LineStyle, PlotPoints, PlotUi, VLine};

use crate::config::plot::PLOT_CONFIG;
use crate::domain::SeriesPoint;
use crate::ui::utils::format_price;

/// Shared per-frame inputs for every layer. X is the logical bar index.
pub struct LayerContext<'a> {
    pub points: &'a [SeriesPoint],
    pub reached_boundary: bool,
}

pub trait PlotLayer {
    fn render(&self, plot_ui: &mut PlotUi, ctx: &LayerContext);
}

pub struct PriceSeriesLayer;

impl PlotLayer for PriceSeriesLayer {
    fn render(&self, plot_ui: &mut PlotUi, ctx: &LayerContext) {
        if ctx.points.is_empty() {
            return;
        }
        let line_points: Vec<[f64; 2]> = ctx
            .points
            .iter()
            .enumerate()
            .map(|(i, p)| [i as f64, p.value])
            .collect();

        plot_ui.line(
            Line::new("", PlotPoints::new(line_points))
                .color(PLOT_CONFIG.line_color)
                .width(PLOT_CONFIG.line_width),
        );
    }
}

pub struct LastPriceLayer;

impl PlotLayer for LastPriceLayer {
    fn render(&self, plot_ui: &mut PlotUi, ctx: &LayerContext) {
        if let Some(last) = ctx.points.last() {
            plot_ui.hline(
                HLine::new(format_price(last.value), last.value)
                    .color(PLOT_CONFIG.last_price_color)
                    .width(1.0)
                    .style(LineStyle::Dashed { length: 6.0 }),
            );
        }
    }
}

/// Vertical rule at index 0 once the source has nothing older.
pub struct HistoryStartLayer;

impl PlotLayer for HistoryStartLayer {
    fn render(&self, plot_ui: &mut PlotUi, ctx: &LayerContext) {
        if ctx.reached_boundary && !ctx.points.is_empty() {
            plot_ui.vline(
                VLine::new("", 0.0)
                    .color(PLOT_CONFIG.color_text_subdued)
                    .width(1.0)
                    .style(LineStyle::Dotted { spacing: 4.0 }),
            );
        }
    }
}
