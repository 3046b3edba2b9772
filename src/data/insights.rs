use std::path::Path;

use anyhow::{Context, Result};

use crate::domain::InsightEvent;

/// Reads a JSON array of insight events.
pub fn load_insights(path: impl AsRef<Path>) -> Result<Vec<InsightEvent>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read insights file {}", path.display()))?;
    let events = parse_insights(&text)
        .with_context(|| format!("Failed to parse insights file {}", path.display()))?;
    log::info!("📥 Loaded {} insights from {}", events.len(), path.display());
    Ok(events)
}

/// Accepts either a bare array or an `{"insights": [...]}` envelope.
pub fn parse_insights(text: &str) -> Result<Vec<InsightEvent>> {
    let value: serde_json::Value = serde_json::from_str(text).context("Invalid JSON")?;
    let list = match value {
        serde_json::Value::Object(mut obj) if obj.contains_key("insights") => {
            obj.remove("insights").unwrap_or_default()
        }
        other => other,
    };
    serde_json::from_value(list).context("Expected an array of insight events")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_array_and_envelope() {
        let bare = r#"[{"id":"a","createdAt":"2024-03-01"},{"id":"b","createdAt":1709251200}]"#;
        let events = parse_insights(bare).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].created_at, events[1].created_at);

        let wrapped = format!(r#"{{"insights": {}}}"#, bare);
        assert_eq!(parse_insights(&wrapped).unwrap(), events);
    }

    #[test]
    fn bad_time_fails_with_context() {
        let err = parse_insights(r#"[{"id":"a","createdAt":"yesterday"}]"#).unwrap_err();
        assert!(format!("{:#}", err).contains("array of insight events"));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_insights("/definitely/not/here.json").is_err());
    }
}
