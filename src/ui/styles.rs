use eframe::egui::{Color32, RichText, Ui};

use crate::config::plot::PLOT_CONFIG;
use crate::domain::TradeDirection;
use crate::models::MarkerGroup;
use crate::ui::ui_text::{ICON_DOT, ICON_TREND_DOWN, ICON_TREND_UP};

pub trait DirectionColor {
    fn color(&self) -> Color32;
}

impl DirectionColor for TradeDirection {
    fn color(&self) -> Color32 {
        match self {
            Self::Long => PLOT_CONFIG.color_long,
            Self::Short => PLOT_CONFIG.color_short,
        }
    }
}

impl DirectionColor for Option<TradeDirection> {
    fn color(&self) -> Color32 {
        self.as_ref()
            .map_or(PLOT_CONFIG.color_neutral, DirectionColor::color)
    }
}

impl DirectionColor for MarkerGroup {
    fn color(&self) -> Color32 {
        self.direction().color()
    }
}

pub fn direction_icon(direction: Option<TradeDirection>) -> &'static str {
    match direction {
        Some(TradeDirection::Long) => ICON_TREND_UP,
        Some(TradeDirection::Short) => ICON_TREND_DOWN,
        None => ICON_DOT,
    }
}

pub(crate) trait UiStyleExt {
    fn label_subdued(&mut self, text: impl Into<String>);
    fn metric(&mut self, label: &str, value: &str, color: Color32);
}

impl UiStyleExt for Ui {
    fn label_subdued(&mut self, text: impl Into<String>) {
        self.label(RichText::new(text).small().color(PLOT_CONFIG.color_text_subdued));
    }

    fn metric(&mut self, label: &str, value: &str, color: Color32) {
        self.horizontal(|ui| {
            ui.spacing_mut().item_spacing.x = 2.0;
            ui.label_subdued(format!("{}:", label));
            ui.label(RichText::new(value).small().color(color));
        });
    }
}
