use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::TimeKey;
use crate::utils::TimeUtils;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeDirection {
    #[serde(alias = "buy", alias = "up")]
    Long,
    #[serde(alias = "sell", alias = "down")]
    Short,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AlertOptions {
    pub direction: Option<TradeDirection>,
    pub label: Option<String>,
    pub price: Option<f64>,
}

/// An externally created annotation. The engine groups these but never edits them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightEvent {
    pub id: String,
    #[serde(deserialize_with = "deserialize_time_key")]
    pub created_at: TimeKey,
    #[serde(default)]
    pub alert_options: AlertOptions,
    /// Whatever else the producer attached, preserved as-is.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl InsightEvent {
    pub fn new(id: impl Into<String>, created_at: TimeKey) -> Self {
        Self {
            id: id.into(),
            created_at,
            alert_options: AlertOptions::default(),
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_direction(mut self, direction: TradeDirection) -> Self {
        self.alert_options.direction = Some(direction);
        self
    }

    pub fn direction(&self) -> Option<TradeDirection> {
        self.alert_options.direction
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTime {
    Seconds(i64),
    Text(String),
}

fn deserialize_time_key<'de, D>(deserializer: D) -> Result<TimeKey, D::Error>
where
    D: Deserializer<'de>,
{
    match RawTime::deserialize(deserializer)? {
        RawTime::Seconds(raw) => TimeUtils::parse_time_key(&raw.to_string())
            .ok_or_else(|| serde::de::Error::custom(format!("invalid epoch: {}", raw))),
        RawTime::Text(text) => TimeUtils::parse_time_key(&text)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid createdAt: {}", text))),
    }
}
