//! The dashboard: which view is showing, the loaded datasets, and the log.

use formats::geojson::FeatureCollection;
use formats::ingest::{Dataset, FileKind, IngestError, Ingestion, PointCloudData, format_count, ingest};
use foundation::color::Rgb;
use foundation::time::EpochMillis;
use host::map::MapHost;
use host::scene::SceneHost;
use host::{HostError, RenderHost, Viewport};
use presentation::controls::ControlPanel;
use presentation::playback::PlaybackPhase;
use presentation::viewer::{FeatureView, PointCloudSettings, PointCloudView};
use runtime::frame::Frame;
use runtime::frame_loop::{FrameHandle, FrameLoop};
use serde::Serialize;

use crate::config::{ConfigError, DashboardConfig};
use crate::log::{LogBook, LogEntry};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize)]
pub enum View {
    #[default]
    PointCloud,
    Map,
}

impl View {
    pub const ALL: [View; 2] = [View::PointCloud, View::Map];

    /// Tab caption.
    pub fn label(self) -> &'static str {
        match self {
            View::PointCloud => "3D Viewer",
            View::Map => "GIS Map",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.label() == label)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Host(#[from] HostError),
}

/// What one pumped frame did.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameReport {
    pub frame: Frame,
    /// Playback phase after the tick, when playback ran this frame.
    pub playback: Option<PlaybackPhase>,
}

/// Orchestrates the two views.
///
/// Point clouds and feature collections are held in separate slots; an
/// upload replaces the slot of its own kind and leaves the other alone.
/// Only the active view's host is alive.
#[derive(Debug)]
pub struct Dashboard {
    config: DashboardConfig,
    active: View,
    viewport: Viewport,
    point_cloud: Option<PointCloudView>,
    point_cloud_source: Option<PointCloudData>,
    features: Option<FeatureView>,
    log: LogBook,
    scene: SceneHost,
    map: MapHost,
    frames: FrameLoop,
    playback_request: Option<FrameHandle>,
}

impl Dashboard {
    pub fn new(config: DashboardConfig, viewport: Viewport) -> Result<Self, DashboardError> {
        config.validate()?;
        let mut scene = SceneHost::new(config.camera());
        scene.initialize(viewport)?;
        let map = MapHost::new(config.tile_template(), config.map_view());
        Ok(Self {
            config,
            active: View::default(),
            viewport,
            point_cloud: None,
            point_cloud_source: None,
            features: None,
            log: LogBook::new(),
            scene,
            map,
            frames: FrameLoop::new(),
            playback_request: None,
        })
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn active_view(&self) -> View {
        self.active
    }

    pub fn logs(&self) -> &[LogEntry] {
        self.log.entries()
    }

    pub fn log_book(&self) -> &LogBook {
        &self.log
    }

    pub fn point_cloud(&self) -> Option<&PointCloudView> {
        self.point_cloud.as_ref()
    }

    /// Ingestion output behind the current point cloud.
    pub fn point_cloud_source(&self) -> Option<&PointCloudData> {
        self.point_cloud_source.as_ref()
    }

    pub fn point_cloud_settings(&self) -> Option<&PointCloudSettings> {
        self.point_cloud.as_ref().map(PointCloudView::settings)
    }

    pub fn features(&self) -> Option<&FeatureView> {
        self.features.as_ref()
    }

    pub fn scene(&self) -> &SceneHost {
        &self.scene
    }

    pub fn map(&self) -> &MapHost {
        &self.map
    }

    pub fn frame_loop(&self) -> &FrameLoop {
        &self.frames
    }

    /// Switches tabs. Leaving the map stops playback and drops its frame
    /// request; the entered view's host is created and drawn.
    pub fn select_view(&mut self, view: View) -> Result<(), HostError> {
        if view == self.active {
            return Ok(());
        }
        match self.active {
            View::PointCloud => self.scene.dispose(),
            View::Map => {
                self.stop_playback();
                self.map.dispose();
            }
        }
        self.active = view;
        match view {
            View::PointCloud => self.scene.initialize(self.viewport)?,
            View::Map => {
                self.map.initialize(self.viewport)?;
                if self.features.as_ref().is_some_and(FeatureView::is_playing) {
                    self.request_playback_frame();
                }
            }
        }
        tracing::debug!(view = view.label(), "view selected");
        self.refresh();
        Ok(())
    }

    pub fn resize(&mut self, viewport: Viewport) -> Result<(), HostError> {
        match self.active {
            View::PointCloud => self.scene.resize(viewport)?,
            View::Map => self.map.resize(viewport)?,
        }
        self.viewport = viewport;
        self.refresh();
        Ok(())
    }

    /// Loads one file. Failures are logged and the previous data stays; the
    /// error is also returned for callers that want it.
    pub fn upload_file(&mut self, name: &str, bytes: &[u8]) -> Result<FileKind, IngestError> {
        match ingest(name, bytes) {
            Ok(ingestion) => {
                let kind = ingestion.kind;
                self.accept(ingestion);
                Ok(kind)
            }
            Err(err) => {
                tracing::warn!(file = name, error = %err, "upload rejected");
                match &err {
                    IngestError::UnsupportedFileType { .. } => {
                        self.log.error(format!("Unsupported file type: {name}"));
                    }
                    other => {
                        self.log
                            .error(format!("Failed to load {name}: {}", other.reason()));
                    }
                }
                Err(err)
            }
        }
    }

    fn accept(&mut self, ingestion: Ingestion) {
        let Ingestion { stats, dataset, .. } = ingestion;
        match dataset {
            Dataset::PointCloud(data) => {
                let colors = self.config.color_range().unwrap_or_default();
                let view = match PointCloudView::new(
                    data.points.clone(),
                    colors,
                    self.config.point_size,
                    self.config.target_size,
                ) {
                    Ok(v) => v,
                    Err(err) => {
                        self.log
                            .error(format!("Failed to load {}: {err}", stats.name));
                        return;
                    }
                };
                let size = data.summary.bounds.size();
                self.log.info(format!("File uploaded: {}", stats.name));
                self.log
                    .info(format!("Number of points: {}", format_count(data.summary.count)));
                self.log.info(format!("File size: {}", stats.size_label()));
                self.log.info("Bounding box dimensions:");
                self.log.info(format!("  Width: {:.2} units", size.x));
                self.log.info(format!("  Height: {:.2} units", size.y));
                self.log.info(format!("  Depth: {:.2} units", size.z));
                if !data.skipped_lines.is_empty() {
                    self.log.warn(format!(
                        "Skipped {} malformed lines",
                        data.skipped_lines.len()
                    ));
                }
                tracing::info!(file = %stats.name, points = data.summary.count, "point cloud replaced");
                self.point_cloud = Some(view);
                self.point_cloud_source = Some(data);
                if self.active == View::PointCloud {
                    self.refresh();
                }
            }
            Dataset::Features(collection) => {
                self.install_features(collection);
                self.log
                    .info(format!("GeoJSON file uploaded: {}", stats.name));
                self.log.info(format!("File size: {}", stats.size_label()));
                tracing::info!(
                    file = %stats.name,
                    features = self.features.as_ref().map_or(0, |f| f.collection().len()),
                    "feature collection replaced"
                );
            }
        }
    }

    fn install_features(&mut self, collection: FeatureCollection) {
        self.stop_playback();
        self.features = Some(FeatureView::new(collection, self.config.step_ms));
        if self.active == View::Map {
            self.refresh();
        }
    }

    // Point-cloud controls. Each returns false when no cloud is loaded.

    pub fn set_use_altitude_colors(&mut self, on: bool) -> bool {
        self.with_point_cloud(|v| v.set_use_altitude_colors(on))
    }

    pub fn set_low_color(&mut self, color: Rgb) -> bool {
        self.with_point_cloud(|v| v.set_low_color(color))
    }

    pub fn set_high_color(&mut self, color: Rgb) -> bool {
        self.with_point_cloud(|v| v.set_high_color(color))
    }

    pub fn set_point_size(&mut self, size: f32) -> bool {
        self.with_point_cloud(|v| v.set_point_size(size))
    }

    pub fn set_model_scale(&mut self, scale: f64) -> bool {
        self.with_point_cloud(|v| v.set_model_scale(scale))
    }

    pub fn set_min_altitude(&mut self, y: f64) -> bool {
        self.with_point_cloud(|v| v.set_min_altitude(y))
    }

    pub fn set_max_altitude(&mut self, y: f64) -> bool {
        self.with_point_cloud(|v| v.set_max_altitude(y))
    }

    pub fn reset_altitude_filter(&mut self) -> bool {
        self.with_point_cloud(PointCloudView::reset_altitude_filter)
    }

    fn with_point_cloud(&mut self, f: impl FnOnce(&mut PointCloudView)) -> bool {
        let Some(view) = self.point_cloud.as_mut() else {
            return false;
        };
        f(view);
        if self.active == View::PointCloud {
            self.refresh();
        }
        true
    }

    // Map controls.

    /// Checkbox change for one tag; returns whether the selection changed.
    pub fn set_tag(&mut self, tag: &str, checked: bool) -> bool {
        let changed = self
            .features
            .as_mut()
            .is_some_and(|f| f.set_tag(tag, checked));
        if changed {
            self.refresh_map();
        }
        changed
    }

    pub fn clear_tags(&mut self) -> bool {
        let Some(features) = self.features.as_mut() else {
            return false;
        };
        features.clear_tags();
        self.refresh_map();
        true
    }

    /// Play/pause button. `None` when there is no timestamped data.
    pub fn toggle_playback(&mut self) -> Option<PlaybackPhase> {
        let phase = self.features.as_mut()?.toggle_playback()?;
        match phase {
            PlaybackPhase::Playing => self.request_playback_frame(),
            PlaybackPhase::Stopped => self.cancel_playback_frame(),
        }
        self.refresh_map();
        Some(phase)
    }

    /// Slider drag. Returns the snapped cursor.
    pub fn seek(&mut self, t: EpochMillis) -> Option<EpochMillis> {
        let at = self.features.as_mut()?.seek(t)?;
        self.refresh_map();
        Some(at)
    }

    pub fn controls(&self) -> Option<ControlPanel> {
        self.features.as_ref().map(FeatureView::controls)
    }

    /// Runs one display frame: fires pending callbacks, advances playback
    /// if it was waiting on this frame, and re-requests while still playing.
    pub fn tick_frame(&mut self) -> FrameReport {
        let fired = self.frames.pump();
        let mut playback = None;
        if let Some(handle) = self.playback_request {
            if fired.fired(handle) {
                self.playback_request = None;
                playback = self.features.as_mut().and_then(FeatureView::tick);
                if playback == Some(PlaybackPhase::Playing) {
                    self.request_playback_frame();
                }
                self.refresh_map();
            }
        }
        FrameReport {
            frame: fired.frame,
            playback,
        }
    }

    fn request_playback_frame(&mut self) {
        if self.active != View::Map || self.playback_request.is_some() {
            return;
        }
        self.playback_request = Some(self.frames.request());
    }

    fn cancel_playback_frame(&mut self) {
        if let Some(handle) = self.playback_request.take() {
            self.frames.cancel(handle);
        }
    }

    fn stop_playback(&mut self) {
        self.cancel_playback_frame();
        if let Some(features) = self.features.as_mut() {
            features.pause();
        }
    }

    fn refresh_map(&mut self) {
        if self.active == View::Map {
            self.refresh();
        }
    }

    /// Rebinds the active host to current data and draws it.
    fn refresh(&mut self) {
        let result = match self.active {
            View::PointCloud => {
                if let Some(view) = &self.point_cloud {
                    self.scene.set_data(view.frame());
                }
                self.scene.render()
            }
            View::Map => {
                if let Some(view) = &self.features {
                    self.map.set_data(view.frame());
                }
                self.map.render()
            }
        };
        if let Err(err) = result {
            tracing::warn!(view = self.active.label(), error = %err, "render skipped");
        }
    }
}
