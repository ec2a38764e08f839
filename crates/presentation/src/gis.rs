use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use formats::geojson::Feature;
use foundation::time::{EpochMillis, TimeRange};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Distinct tag values, kept sorted for stable display.
pub type TagSet = BTreeSet<String>;

pub const TAGS_KEY: &str = "tags";
pub const TIMESTAMP_KEY: &str = "timestamp";

/// Animation cursor over a feature collection's time range.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationState {
    pub current_time: EpochMillis,
    pub is_playing: bool,
}

impl AnimationState {
    pub fn stopped_at(t: EpochMillis) -> Self {
        Self {
            current_time: t,
            is_playing: false,
        }
    }
}

/// The feature's `tags` property as a list. A scalar becomes a singleton;
/// non-string scalars are stringified and `null`s are ignored.
pub fn feature_tags(feature: &Feature) -> Vec<String> {
    fn push(v: &Value, out: &mut Vec<String>) {
        match v {
            Value::Null => {}
            Value::String(s) => out.push(s.clone()),
            Value::Array(items) => {
                for item in items {
                    if !item.is_array() {
                        push(item, out);
                    }
                }
            }
            other => out.push(other.to_string()),
        }
    }

    let mut out = Vec::new();
    if let Some(v) = feature.property(TAGS_KEY) {
        push(v, &mut out);
    }
    out
}

pub fn extract_tags(features: &[Feature]) -> TagSet {
    features.iter().flat_map(feature_tags).collect()
}

/// Epoch milliseconds for a timestamp value.
///
/// Strings are tried as RFC 3339 first, then as naive date-times and plain
/// dates (both read as UTC). Numbers are taken as epoch milliseconds.
pub fn parse_timestamp(value: &Value) -> Option<EpochMillis> {
    match value {
        Value::String(s) => parse_timestamp_str(s),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64))
            .map(EpochMillis),
        _ => None,
    }
}

const NAIVE_FORMATS: [&str; 5] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

fn parse_timestamp_str(s: &str) -> Option<EpochMillis> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(EpochMillis(dt.timestamp_millis()));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(EpochMillis(naive.and_utc().timestamp_millis()));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| EpochMillis(naive.and_utc().timestamp_millis()))
}

pub fn feature_time(feature: &Feature) -> Option<EpochMillis> {
    feature.property(TIMESTAMP_KEY).and_then(parse_timestamp)
}

/// Extremes of every parseable timestamp; `None` when there are none.
pub fn extract_time_range(features: &[Feature]) -> Option<TimeRange> {
    TimeRange::covering(features.iter().filter_map(feature_time))
}

/// `YYYY-MM-DD` label for slider and popup text.
pub fn format_date(t: EpochMillis) -> String {
    DateTime::from_timestamp_millis(t.0)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| t.0.to_string())
}

pub fn format_date_time(t: EpochMillis) -> String {
    DateTime::from_timestamp_millis(t.0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| t.0.to_string())
}

/// Tag filter AND time filter.
///
/// - With a non-empty selection the feature needs at least one selected tag.
/// - While playing, a feature with a parseable timestamp strictly after the
///   cursor is hidden. Features exactly at the cursor stay visible.
pub fn passes_filter(feature: &Feature, selected: &TagSet, state: &AnimationState) -> bool {
    if !selected.is_empty() {
        let tags = feature_tags(feature);
        if !tags.iter().any(|t| selected.contains(t)) {
            return false;
        }
    }

    if state.is_playing {
        if let Some(t) = feature_time(feature) {
            if t > state.current_time {
                return false;
            }
        }
    }

    true
}

/// Indices of passing features in collection order.
pub fn filter_features(
    features: &[Feature],
    selected: &TagSet,
    state: &AnimationState,
) -> Vec<usize> {
    features
        .iter()
        .enumerate()
        .filter(|(_, f)| passes_filter(f, selected, state))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{
        AnimationState, TagSet, extract_tags, extract_time_range, feature_tags, filter_features,
        format_date, parse_timestamp, passes_filter,
    };
    use formats::geojson::Feature;
    use foundation::time::{DAY_MS, EpochMillis};
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    fn feature(props: Value) -> Feature {
        Feature {
            properties: props.as_object().cloned().unwrap_or_default(),
            ..Feature::default()
        }
    }

    fn tags(list: &[&str]) -> TagSet {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn tags_normalize_scalars_and_lists() {
        assert_eq!(feature_tags(&feature(json!({"tags": "a"}))), vec!["a"]);
        assert_eq!(
            feature_tags(&feature(json!({"tags": ["a", 3, null, true]}))),
            vec!["a", "3", "true"]
        );
        assert!(feature_tags(&feature(json!({"tags": null}))).is_empty());
        assert!(feature_tags(&feature(json!({}))).is_empty());
    }

    #[test]
    fn extract_tags_is_a_set() {
        let fs = vec![
            feature(json!({"tags": ["b", "a"]})),
            feature(json!({"tags": "a"})),
            feature(json!({"name": "untagged"})),
        ];
        assert_eq!(extract_tags(&fs), tags(&["a", "b"]));
    }

    #[test]
    fn timestamps_parse_in_common_shapes() {
        let day0 = EpochMillis(1_704_067_200_000); // 2024-01-01T00:00:00Z
        assert_eq!(parse_timestamp(&json!("2024-01-01")), Some(day0));
        assert_eq!(parse_timestamp(&json!("2024-01-01T00:00:00Z")), Some(day0));
        assert_eq!(parse_timestamp(&json!("2024-01-01T01:00:00+01:00")), Some(day0));
        assert_eq!(parse_timestamp(&json!("2024-01-01T00:00:00")), Some(day0));
        assert_eq!(parse_timestamp(&json!("2024-01-01 00:00:00.000")), Some(day0));
        assert_eq!(parse_timestamp(&json!(1_704_067_200_000i64)), Some(day0));
        assert_eq!(parse_timestamp(&json!("yesterday")), None);
        assert_eq!(parse_timestamp(&json!(true)), None);
        assert_eq!(format_date(day0), "2024-01-01");
    }

    #[test]
    fn time_range_is_absent_without_timestamps() {
        let fs = vec![feature(json!({"timestamp": "garbage"})), feature(json!({}))];
        assert_eq!(extract_time_range(&fs), None);

        let fs = vec![
            feature(json!({"timestamp": "2024-01-03"})),
            feature(json!({"timestamp": "2024-01-01"})),
            feature(json!({})),
        ];
        let range = extract_time_range(&fs).unwrap();
        assert_eq!(range.max.0 - range.min.0, 2 * DAY_MS);
    }

    #[test]
    fn no_selection_and_stopped_accepts_everything() {
        let fs = vec![
            feature(json!({"tags": "x", "timestamp": "2099-01-01"})),
            feature(json!({})),
            feature(json!({"timestamp": "not a date"})),
        ];
        let state = AnimationState::stopped_at(EpochMillis(0));
        assert_eq!(filter_features(&fs, &TagSet::new(), &state), vec![0, 1, 2]);
    }

    #[test]
    fn tag_filter_requires_intersection() {
        let selected = tags(&["park"]);
        let state = AnimationState::stopped_at(EpochMillis(0));
        assert!(passes_filter(&feature(json!({"tags": ["park", "x"]})), &selected, &state));
        assert!(!passes_filter(&feature(json!({"tags": "road"})), &selected, &state));
        assert!(!passes_filter(&feature(json!({})), &selected, &state));
    }

    #[test]
    fn time_filter_only_while_playing() {
        let f = feature(json!({"timestamp": "2024-01-02"}));
        let at = parse_timestamp(&json!("2024-01-02")).unwrap();
        let before = EpochMillis(at.0 - 1);

        let playing = |t| AnimationState {
            current_time: t,
            is_playing: true,
        };
        assert!(passes_filter(&f, &TagSet::new(), &playing(at)));
        assert!(!passes_filter(&f, &TagSet::new(), &playing(before)));
        assert!(passes_filter(&f, &TagSet::new(), &AnimationState::stopped_at(before)));

        let undated = feature(json!({"timestamp": "??"}));
        assert!(passes_filter(&undated, &TagSet::new(), &playing(before)));
    }

    #[test]
    fn selecting_every_tag_matches_no_selection_when_all_tagged() {
        let fs = vec![
            feature(json!({"tags": "a"})),
            feature(json!({"tags": ["b", "c"]})),
            feature(json!({"tags": ["c"]})),
        ];
        let state = AnimationState::stopped_at(EpochMillis(0));
        let all = extract_tags(&fs);
        assert_eq!(
            filter_features(&fs, &all, &state).len(),
            filter_features(&fs, &TagSet::new(), &state).len()
        );
    }
}
