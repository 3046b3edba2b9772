mod app;
mod chart_view;
mod plot_layers;
mod projector;
mod styles;
mod ui_config;
mod ui_render;
mod ui_text;
mod utils;

pub use app::ChartApp;
pub use chart_view::{ChartView, ChartViewOutput};
pub use projector::PlotProjector;
pub use ui_config::UI_TEXT;
pub use utils::format_price;
