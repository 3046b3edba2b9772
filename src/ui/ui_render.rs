use eframe::egui::{
    Align, CentralPanel, ComboBox, Context, Key, Layout, RichText, ScrollArea, SidePanel,
    TextEdit, TopBottomPanel, Ui,
};
use strum::IntoEnumIterator;

use crate::config::plot::PLOT_CONFIG;
use crate::data::ConnectionStatus;
use crate::domain::Period;
use crate::models::PaginationCursor;

use crate::ui::styles::{DirectionColor, UiStyleExt, direction_icon};
use crate::ui::ui_config::{UI_CONFIG, UI_TEXT};

use crate::utils::TimeUtils;

use super::app::{ChartApp, LoadStatus};

impl ChartApp {
    pub(super) fn render_top_panel(&mut self, ctx: &Context) {
        let frame = UI_CONFIG.top_panel_frame();

        TopBottomPanel::top("top_toolbar")
            .frame(frame)
            .min_height(30.0)
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    let mut reload = false;

                    ui.label(UI_TEXT.label_symbol);
                    let symbol = ui.add(
                        TextEdit::singleline(&mut self.symbol_input)
                            .desired_width(110.0)
                            .char_limit(20),
                    );
                    if symbol.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter)) {
                        reload = true;
                    }

                    ui.separator();

                    ui.label(UI_TEXT.label_period);
                    let before = self.selected_period;
                    ComboBox::from_id_salt("period_selector")
                        .selected_text(self.selected_period.label())
                        .show_ui(ui, |ui| {
                            for period in Period::iter() {
                                ui.selectable_value(
                                    &mut self.selected_period,
                                    period,
                                    period.label(),
                                );
                            }
                        });
                    if self.selected_period != before {
                        reload = true;
                    }

                    if ui.button(UI_TEXT.button_load).clicked() {
                        reload = true;
                    }

                    ui.separator();

                    let source_label = if self.is_demo() {
                        UI_TEXT.source_demo
                    } else {
                        UI_TEXT.source_binance
                    };
                    ui.label(
                        RichText::new(source_label)
                            .small()
                            .strong()
                            .color(PLOT_CONFIG.color_warning),
                    );

                    if reload {
                        self.load_market();
                    }
                });
            });
    }

    pub(super) fn render_status_panel(&mut self, ctx: &Context) {
        let frame = UI_CONFIG.bottom_panel_frame();
        TopBottomPanel::bottom("status_panel")
            .frame(frame)
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    self.render_status_network(ui);
                    ui.separator();
                    self.render_status_series(ui);
                    ui.separator();
                    self.render_status_pagination(ui);
                    ui.separator();
                    ui.metric(
                        UI_TEXT.insights_heading,
                        &format!(
                            "{} in {} groups",
                            self.chart.insights().len(),
                            self.chart.marker_groups().len()
                        ),
                        PLOT_CONFIG.color_neutral,
                    );
                });
            });
    }

    fn render_status_network(&self, ui: &mut Ui) {
        let (text, color) = match self.connection_status() {
            ConnectionStatus::Connected => ("LIVE", UI_CONFIG.colors.connected),
            ConnectionStatus::Connecting => ("CONNECTING", PLOT_CONFIG.color_warning),
            ConnectionStatus::Disconnected => ("OFFLINE", UI_CONFIG.colors.disconnected),
        };
        ui.metric(self.source_name(), text, color);
    }

    fn render_status_series(&self, ui: &mut Ui) {
        let market = self.chart.market();
        ui.metric(
            &market.symbol,
            &format!(
                "{} bars {}",
                self.chart.series().len(),
                TimeUtils::interval_to_string(market.bucket_seconds())
            ),
            PLOT_CONFIG.line_color,
        );
    }

    fn render_status_pagination(&self, ui: &mut Ui) {
        let cursor = self.chart.pagination_status();
        if let Some(earliest) = cursor.earliest_loaded_time {
            ui.metric(
                "From",
                &TimeUtils::epoch_sec_to_date_string(earliest),
                PLOT_CONFIG.color_text_subdued,
            );
        }
        let text = pagination_text(self.load_status, &cursor);
        ui.label_subdued(text);
    }

    pub(super) fn render_insight_panel(&mut self, ctx: &Context) {
        let frame = UI_CONFIG.side_panel_frame();

        SidePanel::right("insight_panel")
            .frame(frame)
            .default_width(UI_CONFIG.insight_panel_width)
            .resizable(true)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        RichText::new(UI_TEXT.insights_heading)
                            .strong()
                            .color(UI_CONFIG.colors.heading),
                    );
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if self.chart.highlighted().is_some()
                            && ui.small_button(UI_TEXT.button_clear_highlight).clicked()
                        {
                            self.chart.set_highlighted(None);
                        }
                    });
                });
                ui.separator();

                if self.chart.insights().is_empty() {
                    ui.label_subdued(UI_TEXT.insights_none);
                    return;
                }

                let mut clicked = None;
                ScrollArea::vertical().show(ui, |ui| {
                    let highlighted = self.chart.highlighted();
                    for event in self.chart.insights() {
                        let selected = highlighted == Some(event.id.as_str());
                        let title = event.alert_options.label.as_deref().unwrap_or(&event.id);
                        let text = RichText::new(format!(
                            "{} {}  {}",
                            direction_icon(event.direction()),
                            title,
                            TimeUtils::epoch_sec_to_string(
                                event.created_at,
                                TimeUtils::CROSSHAIR_TIME_FORMAT
                            )
                        ))
                        .color(event.direction().color());

                        if ui.selectable_label(selected, text).clicked() {
                            clicked = Some((event.id.clone(), selected));
                        }
                    }
                });

                if let Some((id, was_selected)) = clicked {
                    self.chart
                        .set_highlighted(if was_selected { None } else { Some(id) });
                }
            });
    }

    pub(super) fn render_central_panel(&mut self, ctx: &Context) {
        let central_panel_frame = UI_CONFIG.central_panel_frame();

        let output = CentralPanel::default()
            .frame(central_panel_frame)
            .show(ctx, |ui| {
                if self.chart.series().is_empty() {
                    match self.load_status {
                        LoadStatus::Failed => render_fullscreen_message(
                            ui,
                            &self.chart.market().to_string(),
                            UI_TEXT.status_load_failed,
                            true,
                        ),
                        _ => render_fullscreen_message(
                            ui,
                            &self.chart.market().to_string(),
                            UI_TEXT.status_loading,
                            false,
                        ),
                    }
                    return None;
                }
                Some(self.chart_view.show(ui, &mut self.chart))
            })
            .inner;

        let Some(output) = output else {
            return;
        };
        if let Some(range) = output.visible_range {
            self.on_chart_scrolled(range);
        }
        if let Some(bucket_time) = output.clicked_group {
            self.cycle_highlight(bucket_time);
        }
    }
}

fn pagination_text(status: LoadStatus, cursor: &PaginationCursor) -> &'static str {
    match status {
        LoadStatus::Loading => UI_TEXT.status_loading,
        LoadStatus::Failed => UI_TEXT.status_load_failed,
        LoadStatus::Ready if cursor.in_flight => UI_TEXT.status_fetching_older,
        LoadStatus::Ready if cursor.reached_boundary => UI_TEXT.status_history_start,
        LoadStatus::Ready => UI_TEXT.status_idle,
    }
}

fn render_fullscreen_message(ui: &mut Ui, title: &str, subtitle: &str, is_error: bool) {
    ui.vertical_centered(|ui| {
        ui.add_space(40.0);

        if is_error {
            ui.heading(format!("⚠ {}", title));
        } else {
            ui.spinner();
            ui.add_space(12.0);
            ui.heading(title);
        }

        ui.add_space(6.0);

        let color = if is_error {
            UI_CONFIG.colors.disconnected
        } else {
            PLOT_CONFIG.color_text_subdued
        };
        ui.label(RichText::new(subtitle).color(color));
    });
}
