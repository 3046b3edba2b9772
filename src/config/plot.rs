//! Plot visualization configuration

use eframe::egui::Color32;

pub struct PlotConfig {
    pub line_color: Color32,
    pub line_width: f32,
    pub last_price_color: Color32,

    // Insight markers
    pub color_long: Color32,
    pub color_short: Color32,
    pub color_neutral: Color32,
    pub highlight_stroke_color: Color32,
    pub highlight_stroke_width: f32,
    /// Text drawn next to a marker when the group holds more than one insight
    pub group_count_color: Color32,

    pub plot_y_padding_pct: f64, // Y-Axis Padding factor (e.g. 0.05 = 5% padding top and bottom)
    pub initial_visible_bars: f64,

    pub color_text_subdued: Color32,
    pub color_warning: Color32,
}

pub const PLOT_CONFIG: PlotConfig = PlotConfig {
    line_color: Color32::from_rgb(120, 170, 240),
    line_width: 1.5,
    last_price_color: Color32::from_rgb(255, 215, 0), // Gold

    color_long: Color32::from_rgb(38, 166, 154),  // TradingView Green
    color_short: Color32::from_rgb(239, 83, 80),  // TradingView Red
    color_neutral: Color32::from_rgb(173, 216, 230),
    highlight_stroke_color: Color32::WHITE,
    highlight_stroke_width: 2.0,
    group_count_color: Color32::LIGHT_GRAY,

    plot_y_padding_pct: 0.05,
    initial_visible_bars: 120.0,

    color_text_subdued: Color32::GRAY,
    color_warning: Color32::from_rgb(255, 215, 0),
};
