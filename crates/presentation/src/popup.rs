use formats::geojson::Feature;
use serde::Serialize;
use serde_json::Value;

use crate::gis::{TAGS_KEY, TIMESTAMP_KEY, feature_tags, format_date_time, parse_timestamp};

const DESCRIPTION_KEY: &str = "description";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopupRow {
    pub label: String,
    pub value: String,
}

/// Detail rows shown when a feature is clicked on the map.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Popup {
    pub rows: Vec<PopupRow>,
}

impl Popup {
    fn push(&mut self, label: impl Into<String>, value: impl Into<String>) {
        self.rows.push(PopupRow {
            label: label.into(),
            value: value.into(),
        });
    }

    pub fn to_html(&self) -> String {
        let mut out = String::from(r#"<div class="popup-content">"#);
        for row in &self.rows {
            out.push_str(&format!(
                "<p><strong>{}:</strong> {}</p>",
                escape_html(&row.label),
                escape_html(&row.value)
            ));
        }
        out.push_str("</div>");
        out
    }
}

/// Coordinates, tags, description and time first, then every other property
/// in file order.
pub fn feature_popup(feature: &Feature) -> Popup {
    let mut popup = Popup::default();

    if let Some(geometry) = &feature.geometry {
        let coords: Vec<String> = geometry
            .flat_coordinates()
            .iter()
            .map(|c| c.to_string())
            .collect();
        popup.push("Coordinates", coords.join(", "));
    }

    let tags = feature_tags(feature);
    if !tags.is_empty() {
        popup.push("Tags", tags.join(", "));
    }

    if let Some(desc) = feature.property(DESCRIPTION_KEY) {
        popup.push("Description", display_value(desc));
    }

    if let Some(ts) = feature.property(TIMESTAMP_KEY) {
        let text = parse_timestamp(ts)
            .map(format_date_time)
            .unwrap_or_else(|| display_value(ts));
        popup.push("Time", text);
    }

    for (key, value) in &feature.properties {
        if matches!(key.as_str(), TAGS_KEY | DESCRIPTION_KEY | TIMESTAMP_KEY) {
            continue;
        }
        popup.push(key.clone(), display_value(value));
    }

    popup
}

fn display_value(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
