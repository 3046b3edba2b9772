#![allow(clippy::collapsible_if)]
#![allow(clippy::type_complexity)]
#![allow(clippy::too_many_arguments)]

// Core modules
pub mod analysis;
pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod models;
pub mod ui;
pub mod utils;

// Re-export commonly used types outside of crate
pub use data::{DemoSource, FetchError, HistoricalSource};
pub use domain::{InsightEvent, MarketKey, Period, RawTick, SeriesPoint, TimeKey};
pub use engine::{ChartSync, PageOutcome, PageRequest, PageResponse};
pub use ui::ChartApp;

use std::path::PathBuf;

// CLI argument parsing
use clap::Parser;

use crate::config::CHART;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Market symbol shown at startup
    #[arg(long, default_value = CHART.default_symbol)]
    pub symbol: String,

    /// Chart period label: 15m, 1h, 4h, 1d, 1w or 1M
    #[arg(long, default_value = CHART.default_period)]
    pub period: String,

    /// JSON file of insight events (an array, or an object with an `insights` array)
    #[arg(long)]
    pub insights: Option<PathBuf>,

    /// Offline synthetic history, ticks and insights instead of Binance
    #[arg(long, default_value_t = false)]
    pub demo: bool,

    /// Bars per historical page
    #[arg(long, default_value_t = CHART.pagination.page_size)]
    pub page_size: usize,
}

/// Main application entry point - creates the GUI app
pub fn run_app(cc: &eframe::CreationContext<'_>, args: Cli) -> anyhow::Result<ChartApp> {
    ChartApp::new(cc, args)
}
