use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use eframe::egui::Context;
use eframe::Frame;
use tokio::runtime::Runtime;

use crate::Cli;

use crate::config::{BINANCE, CHART};

#[cfg(debug_assertions)]
use crate::config::DF;

use crate::data::{
    BinanceSource, ConnectionStatus, DemoFeed, DemoSource, GlobalRateLimiter, HistoricalSource,
    LiveFeed, demo_insights, load_insights,
};
use crate::domain::{InsightEvent, MarketKey, Period, RawTick, TimeKey};
use crate::engine::{ChartSync, PageKind, PageOutcome, PageRequest, PageResponse};
use crate::models::LogicalRange;

use crate::ui::chart_view::ChartView;
use crate::ui::utils::setup_custom_visuals;

use crate::utils::AppInstant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoadStatus {
    Loading,
    Failed,
    Ready,
}

/// Where live ticks come from for the active market.
enum TickFeed {
    Live(LiveFeed),
    Demo(DemoFeed),
}

pub struct ChartApp {
    pub(super) chart: ChartSync,
    pub(super) chart_view: ChartView,
    pub(super) symbol_input: String,
    pub(super) selected_period: Period,
    pub(super) load_status: LoadStatus,

    source: Arc<dyn HistoricalSource>,
    demo: Option<DemoSource>,
    /// Insights loaded from file. Empty in demo mode, which generates them per market.
    insight_file: Vec<InsightEvent>,

    runtime: Runtime,
    ctx: Context,
    page_tx: Sender<PageResponse>,
    page_rx: Receiver<PageResponse>,
    tick_tx: Sender<RawTick>,
    tick_rx: Receiver<RawTick>,
    feed: Option<TickFeed>,
    older_retry_at: Option<AppInstant>,
}

impl ChartApp {
    pub(crate) fn new(cc: &eframe::CreationContext<'_>, args: Cli) -> anyhow::Result<Self> {
        let runtime = Runtime::new()?;

        let demo = args.demo.then(DemoSource::new);
        let source: Arc<dyn HistoricalSource> = match &demo {
            Some(demo) => Arc::new(demo.clone()) as Arc<dyn HistoricalSource>,
            None => {
                let limiter = GlobalRateLimiter::new(BINANCE.limits.weight_limit_minute);
                Arc::new(BinanceSource::new(limiter)?) as Arc<dyn HistoricalSource>
            }
        };

        let insight_file = match &args.insights {
            Some(path) => load_insights(path)?,
            None => Vec::new(),
        };

        let market = MarketKey::new(args.symbol.to_uppercase(), Period::from_label(&args.period));
        let (page_tx, page_rx) = mpsc::channel();
        let (tick_tx, tick_rx) = mpsc::channel();

        log::info!(
            "Starting on {} with {} source ({} insights from file)",
            market,
            source.name(),
            insight_file.len()
        );

        let mut app = Self {
            chart: ChartSync::for_source(market.clone(), args.page_size, source.as_ref()),
            chart_view: ChartView::new(),
            symbol_input: market.symbol.clone(),
            selected_period: market.period,
            load_status: LoadStatus::Loading,
            source,
            demo,
            insight_file,
            runtime,
            ctx: cc.egui_ctx.clone(),
            page_tx,
            page_rx,
            tick_tx,
            tick_rx,
            feed: None,
            older_retry_at: None,
        };
        app.load_market();
        Ok(app)
    }

    pub(super) fn source_name(&self) -> &'static str {
        self.source.name()
    }

    pub(super) fn is_demo(&self) -> bool {
        self.demo.is_some()
    }

    pub(super) fn connection_status(&self) -> ConnectionStatus {
        match &self.feed {
            Some(TickFeed::Live(feed)) => feed.status(),
            Some(TickFeed::Demo(_)) => ConnectionStatus::Connected,
            None => ConnectionStatus::Disconnected,
        }
    }

    /// (Re)loads whatever the toolbar currently names. Also the retry path after a failed load.
    pub(super) fn load_market(&mut self) {
        let symbol = self.symbol_input.trim().to_uppercase();
        if symbol.is_empty() {
            return;
        }
        let market = MarketKey::new(symbol, self.selected_period);

        let request = self.chart.switch_market(market.clone());
        self.chart.set_highlighted(None);
        let insights = self.insights_for(&market);
        self.chart.set_insights(insights);
        self.load_status = LoadStatus::Loading;
        self.older_retry_at = None;
        self.spawn_fetch(request);
        self.subscribe_ticks(&market);
    }

    fn insights_for(&self, market: &MarketKey) -> Vec<InsightEvent> {
        if let Some(demo) = &self.demo {
            if self.insight_file.is_empty() {
                return demo_insights(demo, market, CHART.demo_insight_count);
            }
        }
        self.insight_file
            .iter()
            .filter(|event| insight_matches(event, market))
            .cloned()
            .collect()
    }

    fn subscribe_ticks(&mut self, market: &MarketKey) {
        // Old feed stops before the new one starts (Drop on both variants).
        self.feed = None;
        self.feed = Some(match &self.demo {
            Some(demo) => TickFeed::Demo(DemoFeed::start(demo, market, self.tick_tx.clone())),
            None => {
                let mut feed = LiveFeed::new(self.tick_tx.clone());
                feed.subscribe(market);
                TickFeed::Live(feed)
            }
        });
    }

    fn spawn_fetch(&self, request: PageRequest) {
        #[cfg(debug_assertions)]
        if DF.log_pagination {
            log::info!(
                "📜 FETCH {:?} {} end={:?} limit={} (generation {})",
                request.kind,
                request.market,
                request.end_time,
                request.limit,
                request.generation
            );
        }

        let source = self.source.clone();
        let tx = self.page_tx.clone();
        let ctx = self.ctx.clone();
        self.runtime.spawn(async move {
            let response = request.execute(source.as_ref()).await;
            if tx.send(response).is_ok() {
                ctx.request_repaint();
            }
        });
    }

    fn drain_pages(&mut self) {
        while let Ok(response) = self.page_rx.try_recv() {
            let kind = response.request.kind;
            match self.chart.on_page(response) {
                PageOutcome::Loaded { .. } => self.load_status = LoadStatus::Ready,
                PageOutcome::Failed if kind == PageKind::Initial => {
                    self.load_status = LoadStatus::Failed;
                }
                PageOutcome::Failed => {
                    self.older_retry_at = Some(
                        AppInstant::now() + Duration::from_millis(CHART.older_page_retry_ms),
                    );
                }
                PageOutcome::Merged { .. } | PageOutcome::Stale => {}
            }
        }
    }

    fn drain_ticks(&mut self) {
        while let Ok(tick) = self.tick_rx.try_recv() {
            self.chart.on_tick(&tick);
        }
    }

    pub(super) fn on_chart_scrolled(&mut self, range: LogicalRange) {
        if let Some(retry_at) = self.older_retry_at {
            if AppInstant::now() < retry_at {
                return;
            }
            self.older_retry_at = None;
        }
        if let Some(request) = self.chart.on_visible_range(range) {
            self.spawn_fetch(request);
        }
    }

    /// First click highlights the group's first insight, further clicks step through the rest.
    pub(super) fn cycle_highlight(&mut self, bucket_time: TimeKey) {
        let Some(group) = self
            .chart
            .marker_groups()
            .iter()
            .find(|g| g.bucket_time == bucket_time)
        else {
            return;
        };
        let next = match self
            .chart
            .highlighted()
            .and_then(|id| group.events.iter().position(|e| e.id == id))
        {
            Some(pos) => (pos + 1) % group.len(),
            None => 0,
        };
        let id = group.events.get(next).map(|e| e.id.clone());
        self.chart.set_highlighted(id);
    }
}

/// Insights may name their market in `symbol`; those without one show on every chart.
fn insight_matches(event: &InsightEvent, market: &MarketKey) -> bool {
    match event.extra.get("symbol").and_then(|v| v.as_str()) {
        Some(symbol) => symbol.eq_ignore_ascii_case(&market.symbol),
        None => true,
    }
}

impl eframe::App for ChartApp {
    fn update(&mut self, ctx: &Context, _frame: &mut Frame) {
        setup_custom_visuals(ctx);
        ctx.style_mut(|s| s.interaction.selectable_labels = false);

        self.drain_pages();
        self.drain_ticks();

        self.render_top_panel(ctx);
        self.render_status_panel(ctx);
        self.render_insight_panel(ctx);
        self.render_central_panel(ctx);

        // live ticks arrive without an input event
        ctx.request_repaint_after(Duration::from_millis(250));
    }
}
