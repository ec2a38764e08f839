//! Map control panel as data.
//!
//! The panel is recomputed from state on every change and handed to the UI
//! layer, which diffs it. Nothing here holds element handles.

use serde::Serialize;

use crate::gis::{TagSet, format_date};
use crate::playback::Playback;

pub const PLAY_GLYPH: &str = "\u{25b6}";
pub const PAUSE_GLYPH: &str = "\u{23f8}";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slider {
    pub min: i64,
    pub max: i64,
    pub value: i64,
    pub step: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeControl {
    pub playing: bool,
    pub button_label: &'static str,
    pub current_label: String,
    pub slider: Slider,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagToggle {
    pub tag: String,
    pub checked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlPanel {
    /// Present only when the data has timestamps.
    pub time: Option<TimeControl>,
    pub tag_filters: Vec<TagToggle>,
    pub clear_enabled: bool,
}

pub fn describe_controls(
    tags: &TagSet,
    selected: &TagSet,
    playback: Option<&Playback>,
) -> ControlPanel {
    let time = playback.map(|p| {
        let range = p.range();
        let cursor = p.cursor();
        TimeControl {
            playing: p.is_playing(),
            button_label: if p.is_playing() { PAUSE_GLYPH } else { PLAY_GLYPH },
            current_label: format!("Current: {}", format_date(cursor)),
            slider: Slider {
                min: range.min.0,
                max: range.max.0,
                value: cursor.0,
                step: p.step_ms(),
            },
        }
    });

    let tag_filters = tags
        .iter()
        .map(|tag| TagToggle {
            tag: tag.clone(),
            checked: selected.contains(tag),
        })
        .collect();

    ControlPanel {
        time,
        tag_filters,
        clear_enabled: !selected.is_empty(),
    }
}

/// Checkbox change: add or remove `tag` from the selection.
pub fn set_tag_selected(selected: &mut TagSet, tag: &str, checked: bool) {
    if checked {
        selected.insert(tag.to_string());
    } else {
        selected.remove(tag);
    }
}

#[cfg(test)]
mod tests {
    use super::{PAUSE_GLYPH, PLAY_GLYPH, describe_controls, set_tag_selected};
    use crate::gis::TagSet;
    use crate::playback::Playback;
    use foundation::time::{DAY_MS, EpochMillis, TimeRange};
    use pretty_assertions::assert_eq;

    #[test]
    fn panel_reflects_selection_and_playback() {
        let tags: TagSet = ["a", "b"].iter().map(|s| s.to_string()).collect();
        let mut selected = TagSet::new();
        set_tag_selected(&mut selected, "b", true);

        let mut playback = Playback::new(TimeRange {
            min: EpochMillis(1_704_067_200_000),
            max: EpochMillis(1_704_067_200_000 + 3 * DAY_MS),
        });
        let panel = describe_controls(&tags, &selected, Some(&playback));
        let time = panel.time.as_ref().unwrap();
        assert_eq!(time.button_label, PLAY_GLYPH);
        assert_eq!(time.current_label, "Current: 2024-01-01");
        assert_eq!(time.slider.step, DAY_MS);
        assert_eq!(
            panel
                .tag_filters
                .iter()
                .map(|t| (t.tag.as_str(), t.checked))
                .collect::<Vec<_>>(),
            vec![("a", false), ("b", true)]
        );
        assert!(panel.clear_enabled);

        playback.play();
        let panel = describe_controls(&tags, &selected, Some(&playback));
        assert_eq!(panel.time.unwrap().button_label, PAUSE_GLYPH);

        set_tag_selected(&mut selected, "b", false);
        let panel = describe_controls(&tags, &selected, None);
        assert!(panel.time.is_none());
        assert!(!panel.clear_enabled);
    }
}
