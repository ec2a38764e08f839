use foundation::time::{DAY_MS, EpochMillis, TimeRange};
use serde::Serialize;

use crate::gis::AnimationState;

/// One animation step: move the cursor by `step_ms`; on reaching `range.max`
/// rewind to `range.min` and stop. A stopped state is returned unchanged.
pub fn advance_animation(state: AnimationState, step_ms: i64, range: TimeRange) -> AnimationState {
    if !state.is_playing {
        return state;
    }
    let next = state.current_time.saturating_add(step_ms);
    if next >= range.max {
        AnimationState {
            current_time: range.min,
            is_playing: false,
        }
    } else {
        AnimationState {
            current_time: next,
            is_playing: true,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum PlaybackPhase {
    Stopped,
    Playing,
}

/// Playback controller over a fixed time range.
///
/// Pausing keeps the cursor; a full sweep ends stopped at `range.min`.
#[derive(Debug, Clone, PartialEq)]
pub struct Playback {
    range: TimeRange,
    step_ms: i64,
    state: AnimationState,
}

impl Playback {
    pub fn new(range: TimeRange) -> Self {
        Self::with_step(range, DAY_MS)
    }

    pub fn with_step(range: TimeRange, step_ms: i64) -> Self {
        Self {
            range,
            step_ms: step_ms.max(1),
            state: AnimationState::stopped_at(range.min),
        }
    }

    pub fn range(&self) -> TimeRange {
        self.range
    }

    pub fn step_ms(&self) -> i64 {
        self.step_ms
    }

    pub fn state(&self) -> AnimationState {
        self.state
    }

    pub fn cursor(&self) -> EpochMillis {
        self.state.current_time
    }

    pub fn phase(&self) -> PlaybackPhase {
        if self.state.is_playing {
            PlaybackPhase::Playing
        } else {
            PlaybackPhase::Stopped
        }
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing
    }

    /// Starts from wherever the cursor (slider) currently sits.
    pub fn play(&mut self) {
        self.state.is_playing = true;
    }

    pub fn pause(&mut self) {
        self.state.is_playing = false;
    }

    pub fn toggle(&mut self) -> PlaybackPhase {
        if self.state.is_playing {
            self.pause();
        } else {
            self.play();
        }
        self.phase()
    }

    /// Moves the cursor like a range slider: clamped to the range and
    /// snapped to whole steps from `range.min`.
    pub fn seek(&mut self, t: EpochMillis) -> EpochMillis {
        let clamped = self.range.clamp(t);
        let offset = clamped.0 - self.range.min.0;
        let steps = (offset as f64 / self.step_ms as f64).round() as i64;
        let mut snapped = self.range.min.0 + steps * self.step_ms;
        if snapped > self.range.max.0 {
            snapped -= self.step_ms;
        }
        self.state.current_time = self.range.clamp(EpochMillis(snapped));
        self.state.current_time
    }

    /// Advances one frame while playing.
    pub fn tick(&mut self) -> PlaybackPhase {
        self.state = advance_animation(self.state, self.step_ms, self.range);
        self.phase()
    }
}

#[cfg(test)]
mod tests {
    use super::{Playback, PlaybackPhase, advance_animation};
    use crate::gis::{AnimationState, TagSet, filter_features};
    use formats::geojson::Feature;
    use foundation::time::{DAY_MS, EpochMillis, TimeRange};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn range(days: i64) -> TimeRange {
        TimeRange {
            min: EpochMillis(0),
            max: EpochMillis(days * DAY_MS),
        }
    }

    #[test]
    fn sweep_stops_once_at_min() {
        let r = range(5);
        for step in [DAY_MS, 2 * DAY_MS, 3 * DAY_MS, 7 * DAY_MS] {
            let mut state = AnimationState {
                current_time: r.min,
                is_playing: true,
            };
            let mut ticks = 0;
            while state.is_playing {
                state = advance_animation(state, step, r);
                ticks += 1;
                assert!(ticks <= 10, "sweep never ended for step {step}");
                assert!(state.current_time < r.max);
            }
            assert_eq!(state.current_time, r.min);
            let expected = (r.max.0 + step - 1) / step;
            assert_eq!(ticks, expected);
        }
    }

    #[test]
    fn stopped_state_does_not_move() {
        let s = AnimationState::stopped_at(EpochMillis(DAY_MS));
        assert_eq!(advance_animation(s, DAY_MS, range(5)), s);
    }

    #[test]
    fn pause_keeps_cursor_and_play_resumes_from_it() {
        let mut p = Playback::new(range(10));
        p.play();
        p.tick();
        p.tick();
        assert_eq!(p.toggle(), PlaybackPhase::Stopped);
        assert_eq!(p.cursor(), EpochMillis(2 * DAY_MS));
        p.tick();
        assert_eq!(p.cursor(), EpochMillis(2 * DAY_MS));
        p.play();
        p.tick();
        assert_eq!(p.cursor(), EpochMillis(3 * DAY_MS));
    }

    #[test]
    fn seek_clamps_and_snaps_to_days() {
        let mut p = Playback::new(range(3));
        assert_eq!(p.seek(EpochMillis(DAY_MS + DAY_MS / 3)), EpochMillis(DAY_MS));
        assert_eq!(p.seek(EpochMillis(DAY_MS + 2 * DAY_MS / 3)), EpochMillis(2 * DAY_MS));
        assert_eq!(p.seek(EpochMillis(-5)), EpochMillis(0));
        assert_eq!(p.seek(EpochMillis(99 * DAY_MS)), EpochMillis(3 * DAY_MS));

        let mut uneven = Playback::new(TimeRange {
            min: EpochMillis(0),
            max: EpochMillis(DAY_MS + DAY_MS / 4),
        });
        assert_eq!(uneven.seek(uneven.range().max), EpochMillis(DAY_MS));
    }

    #[test]
    fn three_feature_scenario() {
        let day = |d: i64| json!(format!("2024-01-0{}", d + 1));
        let features: Vec<Feature> = [0, 2, 5]
            .iter()
            .map(|&d| Feature {
                properties: json!({ "timestamp": day(d) })
                    .as_object()
                    .cloned()
                    .unwrap_or_default(),
                ..Feature::default()
            })
            .collect();
        let r = crate::gis::extract_time_range(&features).unwrap();
        assert_eq!(r.max.0 - r.min.0, 5 * DAY_MS);

        let mut p = Playback::new(r);
        p.play();
        let visible = |p: &Playback| filter_features(&features, &TagSet::new(), &p.state());

        p.tick();
        assert_eq!(visible(&p), vec![0]);
        p.tick();
        p.tick();
        assert_eq!(visible(&p), vec![0, 1]);
        p.tick();
        assert!(p.is_playing());
        assert_eq!(p.tick(), PlaybackPhase::Stopped);
        assert_eq!(
            p.state(),
            AnimationState {
                current_time: r.min,
                is_playing: false,
            }
        );
        assert_eq!(visible(&p), vec![0, 1, 2]);
    }
}
