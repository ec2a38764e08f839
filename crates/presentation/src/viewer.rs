//! Per-view presentation state: the loaded data plus the user's settings,
//! reduced to a frame a host can draw.

use formats::geojson::FeatureCollection;
use foundation::bounds::Aabb3;
use foundation::color::Rgb;
use foundation::math::Vec3;
use foundation::time::{EpochMillis, TimeRange};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::PresentationError;
use crate::controls::{ControlPanel, describe_controls, set_tag_selected};
use crate::gis::{AnimationState, TagSet, extract_tags, extract_time_range, filter_features};
use crate::playback::{Playback, PlaybackPhase};
use crate::point_cloud::{
    AltitudeFilter, ColorRange, Placement, apply_altitude_filter, color_by_height,
    compute_centering_and_scale,
};
use crate::popup::{Popup, feature_popup};

pub const DEFAULT_TARGET_SIZE: f64 = 5.0;
pub const DEFAULT_POINT_SIZE: f32 = 0.005;
pub const POINT_SIZE_RANGE: (f32, f32) = (0.001, 0.02);
pub const MODEL_SCALE_RANGE: (f64, f64) = (0.1, 10.0);

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointCloudSettings {
    /// When off every point is drawn white.
    pub use_altitude_colors: bool,
    pub colors: ColorRange,
    pub point_size: f32,
    pub model_scale: f64,
    pub altitude: AltitudeFilter,
}

/// Everything a scene host needs to draw one cloud.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointCloudFrame {
    /// Centered and scaled positions.
    pub positions: Vec<[f32; 3]>,
    pub colors: Vec<[f32; 3]>,
    pub visible: Vec<bool>,
    pub point_size: f32,
}

impl PointCloudFrame {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn visible_count(&self) -> usize {
        self.visible.iter().filter(|v| **v).count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointCloudView {
    points: Vec<Vec3>,
    bounds: Aabb3,
    placement: Placement,
    full_altitude: AltitudeFilter,
    settings: PointCloudSettings,
}

impl PointCloudView {
    pub fn new(
        points: Vec<Vec3>,
        colors: ColorRange,
        point_size: f32,
        target_size: f64,
    ) -> Result<Self, PresentationError> {
        let placement = compute_centering_and_scale(&points, target_size)?;
        let bounds = Aabb3::from_points(&points).ok_or(PresentationError::EmptyInput)?;
        let full_altitude = AltitudeFilter::spanning(&bounds);
        Ok(Self {
            points,
            bounds,
            placement,
            full_altitude,
            settings: PointCloudSettings {
                use_altitude_colors: true,
                colors,
                point_size: point_size.clamp(POINT_SIZE_RANGE.0, POINT_SIZE_RANGE.1),
                model_scale: placement.scale,
                altitude: full_altitude,
            },
        })
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn bounds(&self) -> Aabb3 {
        self.bounds
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    pub fn settings(&self) -> &PointCloudSettings {
        &self.settings
    }

    /// Observed Y range; the altitude sliders live inside it.
    pub fn altitude_bounds(&self) -> AltitudeFilter {
        self.full_altitude
    }

    pub fn set_use_altitude_colors(&mut self, on: bool) {
        self.settings.use_altitude_colors = on;
    }

    pub fn set_low_color(&mut self, color: Rgb) {
        self.settings.colors.low = color;
    }

    pub fn set_high_color(&mut self, color: Rgb) {
        self.settings.colors.high = color;
    }

    pub fn set_point_size(&mut self, size: f32) {
        self.settings.point_size = size.clamp(POINT_SIZE_RANGE.0, POINT_SIZE_RANGE.1);
    }

    pub fn set_model_scale(&mut self, scale: f64) {
        self.settings.model_scale = scale.clamp(MODEL_SCALE_RANGE.0, MODEL_SCALE_RANGE.1);
    }

    /// Raising the minimum past the maximum drags the maximum along.
    pub fn set_min_altitude(&mut self, v: f64) {
        let v = self.clamp_altitude(v);
        let a = &mut self.settings.altitude;
        a.min_altitude = v;
        a.max_altitude = a.max_altitude.max(v);
    }

    /// Lowering the maximum past the minimum drags the minimum along.
    pub fn set_max_altitude(&mut self, v: f64) {
        let v = self.clamp_altitude(v);
        let a = &mut self.settings.altitude;
        a.max_altitude = v;
        a.min_altitude = a.min_altitude.min(v);
    }

    pub fn reset_altitude_filter(&mut self) {
        self.settings.altitude = self.full_altitude;
    }

    fn clamp_altitude(&self, v: f64) -> f64 {
        v.clamp(self.full_altitude.min_altitude, self.full_altitude.max_altitude)
    }

    pub fn frame(&self) -> PointCloudFrame {
        let s = &self.settings;
        let placement = Placement {
            translation: self.placement.translation,
            scale: s.model_scale,
        };
        let positions = self
            .points
            .iter()
            .map(|p| {
                let q = placement.apply(*p);
                [q.x as f32, q.y as f32, q.z as f32]
            })
            .collect();
        let colors = if s.use_altitude_colors {
            color_by_height(&self.points, &s.colors)
                .into_iter()
                .map(Rgb::to_array)
                .collect()
        } else {
            vec![Rgb::WHITE.to_array(); self.points.len()]
        };
        PointCloudFrame {
            positions,
            colors,
            visible: apply_altitude_filter(&self.points, &s.altitude),
            point_size: s.point_size,
        }
    }
}

/// Filtered features ready for a map host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureFrame {
    pub visible: Vec<usize>,
    /// FeatureCollection of the visible features only.
    pub geojson: Value,
    pub popups: Vec<Popup>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureView {
    collection: FeatureCollection,
    tags: TagSet,
    selected: TagSet,
    playback: Option<Playback>,
}

impl FeatureView {
    pub fn new(collection: FeatureCollection, step_ms: i64) -> Self {
        let tags = extract_tags(&collection.features);
        let playback =
            extract_time_range(&collection.features).map(|r| Playback::with_step(r, step_ms));
        Self {
            collection,
            tags,
            selected: TagSet::new(),
            playback,
        }
    }

    pub fn collection(&self) -> &FeatureCollection {
        &self.collection
    }

    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    pub fn selected(&self) -> &TagSet {
        &self.selected
    }

    pub fn playback(&self) -> Option<&Playback> {
        self.playback.as_ref()
    }

    pub fn time_range(&self) -> Option<TimeRange> {
        self.playback.as_ref().map(Playback::range)
    }

    pub fn is_playing(&self) -> bool {
        self.playback.as_ref().is_some_and(Playback::is_playing)
    }

    /// Unknown tags are ignored; returns whether the selection changed.
    pub fn set_tag(&mut self, tag: &str, checked: bool) -> bool {
        if !self.tags.contains(tag) || self.selected.contains(tag) == checked {
            return false;
        }
        set_tag_selected(&mut self.selected, tag, checked);
        true
    }

    pub fn clear_tags(&mut self) {
        self.selected.clear();
    }

    /// `None` when the collection has no timestamps.
    pub fn toggle_playback(&mut self) -> Option<PlaybackPhase> {
        self.playback.as_mut().map(Playback::toggle)
    }

    pub fn pause(&mut self) {
        if let Some(p) = self.playback.as_mut() {
            p.pause();
        }
    }

    pub fn seek(&mut self, t: EpochMillis) -> Option<EpochMillis> {
        self.playback.as_mut().map(|p| p.seek(t))
    }

    pub fn tick(&mut self) -> Option<PlaybackPhase> {
        self.playback.as_mut().map(Playback::tick)
    }

    pub fn animation_state(&self) -> AnimationState {
        match &self.playback {
            Some(p) => p.state(),
            None => AnimationState::stopped_at(EpochMillis(0)),
        }
    }

    pub fn visible_indices(&self) -> Vec<usize> {
        filter_features(
            &self.collection.features,
            &self.selected,
            &self.animation_state(),
        )
    }

    pub fn controls(&self) -> ControlPanel {
        describe_controls(&self.tags, &self.selected, self.playback.as_ref())
    }

    pub fn frame(&self) -> FeatureFrame {
        let visible = self.visible_indices();
        let popups = visible
            .iter()
            .map(|&i| feature_popup(&self.collection.features[i]))
            .collect();
        FeatureFrame {
            geojson: self.collection.subset_to_geojson_value(&visible),
            visible,
            popups,
        }
    }
}
