/// How far back (in logical bars) the visible window may come to the loaded
/// data start before an older page is requested.
pub struct PaginationConfig {
    pub page_size: usize,
    pub edge_lookahead_bars: f64,
}

pub struct OverlayConfig {
    /// Used when the chart cannot report its price-axis width (or reports <= 0).
    pub fallback_price_axis_width: f32,
    pub marker_radius: f32,
    pub highlighted_marker_radius: f32,
}

pub struct ChartConfig {
    pub pagination: PaginationConfig,
    pub overlay: OverlayConfig,
    pub default_symbol: &'static str,
    pub default_period: &'static str,
    /// Cool-down after a failed older-page fetch before the viewport may ask again.
    pub older_page_retry_ms: u64,
    /// Demo insights generated per market when no insights file is given.
    pub demo_insight_count: usize,
}

pub const CHART: ChartConfig = ChartConfig {
    pagination: PaginationConfig {
        page_size: 500,
        edge_lookahead_bars: 10.0,
    },
    overlay: OverlayConfig {
        fallback_price_axis_width: 60.0,
        marker_radius: 6.0,
        highlighted_marker_radius: 9.0,
    },
    default_symbol: "BTCUSDT",
    default_period: "1d",
    older_page_retry_ms: 2_000,
    demo_insight_count: 40,
};

pub mod demo {
    /// Total bars the demo source pretends to hold. Paging past this hits the boundary.
    pub const HISTORY_DEPTH: usize = 1_800;
    pub const START_PRICE: f64 = 42_000.0;
    pub const SEED: u64 = 0x5EED_CAFE;
    pub const TICK_INTERVAL_MS: u64 = 1_000;
}
