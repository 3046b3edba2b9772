pub const ICON_TREND_UP: &str = "▲";
pub const ICON_TREND_DOWN: &str = "▼";
pub const ICON_DOT: &str = "●";

pub struct UiText {
    pub app_title: &'static str,
    pub window_title: &'static str,
    pub label_symbol: &'static str,
    pub label_period: &'static str,
    pub button_load: &'static str,
    pub button_clear_highlight: &'static str,
    pub source_demo: &'static str,
    pub source_binance: &'static str,
    pub status_loading: &'static str,
    pub status_load_failed: &'static str,
    pub status_fetching_older: &'static str,
    pub status_history_start: &'static str,
    pub status_idle: &'static str,
    pub plot_y_axis: &'static str,
    pub insights_heading: &'static str,
    pub insights_none: &'static str,
    pub marker_hint: &'static str,
}

pub const UI_TEXT: UiText = UiText {
    app_title: "Insight Chart",
    window_title: "Insight Chart - live series with insight overlays",
    label_symbol: "Symbol:",
    label_period: "Period:",
    button_load: "Load",
    button_clear_highlight: "Clear highlight",
    source_demo: "DEMO",
    source_binance: "BINANCE",
    status_loading: "Loading history...",
    status_load_failed: "History load failed. Press Load to retry.",
    status_fetching_older: "Fetching older bars...",
    status_history_start: "Start of history",
    status_idle: "Scroll left for more history",
    plot_y_axis: "Price",
    insights_heading: "Insights",
    insights_none: "No insights for this market",
    marker_hint: "Click a marker to cycle its highlighted insight",
};
