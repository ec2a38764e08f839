//! Dashboard settings: JSON file first, then `DASHBOARD_*` environment
//! overrides.

use std::path::{Path, PathBuf};

use foundation::color::Rgb;
use foundation::math::Vec3;
use foundation::time::DAY_MS;
use host::camera::Camera3D;
use host::map::{MapView, OSM_ATTRIBUTION, OSM_TILE_URL, TileTemplate};
use presentation::point_cloud::ColorRange;
use presentation::viewer::{DEFAULT_POINT_SIZE, DEFAULT_TARGET_SIZE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_PREFIX: &str = "DASHBOARD_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f64; 3],
    pub fov_y_deg: f64,
    pub near: f64,
    pub far: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        let cam = Camera3D::default();
        Self {
            position: cam.position.to_array(),
            fov_y_deg: cam.fov_y_deg,
            near: cam.near,
            far: cam.far,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Longest bounding-box side after normalization.
    pub target_size: f64,
    /// Playback step per frame.
    pub step_ms: i64,
    pub low_color: String,
    pub high_color: String,
    pub point_size: f32,
    pub tile_url: String,
    pub attribution: String,
    /// `[lat, lng]`.
    pub map_center: [f64; 2],
    pub map_zoom: u8,
    pub camera: CameraConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        let colors = ColorRange::default();
        Self {
            target_size: DEFAULT_TARGET_SIZE,
            step_ms: DAY_MS,
            low_color: colors.low.to_hex(),
            high_color: colors.high.to_hex(),
            point_size: DEFAULT_POINT_SIZE,
            tile_url: OSM_TILE_URL.to_string(),
            attribution: OSM_ATTRIBUTION.to_string(),
            map_center: [0.0, 0.0],
            map_zoom: 2,
            camera: CameraConfig::default(),
        }
    }
}

impl DashboardConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// File (when given) then process environment.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::load(p)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Applies `DASHBOARD_<FIELD>` overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |field: &str| lookup(&format!("{ENV_PREFIX}{field}"));

        if let Some(v) = get("TARGET_SIZE") {
            self.target_size = parse_env("TARGET_SIZE", &v)?;
        }
        if let Some(v) = get("STEP_MS") {
            self.step_ms = parse_env("STEP_MS", &v)?;
        }
        if let Some(v) = get("POINT_SIZE") {
            self.point_size = parse_env("POINT_SIZE", &v)?;
        }
        if let Some(v) = get("MAP_ZOOM") {
            self.map_zoom = parse_env("MAP_ZOOM", &v)?;
        }
        if let Some(v) = get("LOW_COLOR") {
            self.low_color = v;
        }
        if let Some(v) = get("HIGH_COLOR") {
            self.high_color = v;
        }
        if let Some(v) = get("TILE_URL") {
            self.tile_url = v;
        }
        if let Some(v) = get("ATTRIBUTION") {
            self.attribution = v;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.target_size.is_finite() && self.target_size > 0.0) {
            return Err(invalid("target_size", self.target_size));
        }
        if self.step_ms <= 0 {
            return Err(invalid("step_ms", self.step_ms));
        }
        if !(self.point_size.is_finite() && self.point_size > 0.0) {
            return Err(invalid("point_size", self.point_size));
        }
        if self.map_zoom > 22 {
            return Err(invalid("map_zoom", self.map_zoom));
        }
        let cam = &self.camera;
        if !(cam.near > 0.0 && cam.far > cam.near && cam.fov_y_deg > 0.0 && cam.fov_y_deg < 180.0)
        {
            return Err(invalid("camera", format!("{cam:?}")));
        }
        self.color_range().map(|_| ())
    }

    pub fn color_range(&self) -> Result<ColorRange, ConfigError> {
        let parse = |key: &str, hex: &str| {
            Rgb::from_hex(hex).ok_or_else(|| ConfigError::InvalidValue {
                key: key.to_string(),
                value: hex.to_string(),
            })
        };
        Ok(ColorRange {
            low: parse("low_color", &self.low_color)?,
            high: parse("high_color", &self.high_color)?,
        })
    }

    pub fn camera(&self) -> Camera3D {
        let c = &self.camera;
        Camera3D::look_at(
            Vec3::from_array(c.position),
            Vec3::ZERO,
            c.fov_y_deg,
            c.near,
            c.far,
        )
    }

    pub fn map_view(&self) -> MapView {
        MapView {
            center: self.map_center,
            zoom: self.map_zoom,
        }
    }

    pub fn tile_template(&self) -> TileTemplate {
        TileTemplate::new(self.tile_url.clone(), self.attribution.clone())
    }
}

fn parse_env<T: std::str::FromStr>(field: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: format!("{ENV_PREFIX}{field}"),
        value: raw.to_string(),
    })
}

fn invalid(key: &str, value: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, DashboardConfig};
    use foundation::color::Rgb;
    use foundation::time::DAY_MS;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_viewer() {
        let c = DashboardConfig::default();
        assert_eq!(c.target_size, 5.0);
        assert_eq!(c.step_ms, DAY_MS);
        assert_eq!(c.map_zoom, 2);
        assert_eq!(c.color_range().unwrap().low, Rgb::BLUE);
        assert_eq!(c.camera().position.z, 5.0);
        c.validate().unwrap();
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let c = DashboardConfig::from_json_str(r##"{"target_size": 10, "high_color": "#00ff00"}"##)
            .unwrap();
        assert_eq!(c.target_size, 10.0);
        assert_eq!(c.color_range().unwrap().high, Rgb::new(0.0, 1.0, 0.0));
        assert_eq!(c.step_ms, DAY_MS);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            DashboardConfig::from_json_str(r#"{"step_ms": 0}"#),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            DashboardConfig::from_json_str(r#"{"low_color": "blue"}"#),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            DashboardConfig::from_json_str("{"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn env_overrides_file_values() {
        let env: HashMap<&str, &str> = [
            ("DASHBOARD_TARGET_SIZE", "2.5"),
            ("DASHBOARD_MAP_ZOOM", "4"),
            ("DASHBOARD_TILE_URL", "https://tiles.example/{z}/{x}/{y}.png"),
        ]
        .into_iter()
        .collect();
        let mut c = DashboardConfig::default();
        c.apply_env(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(c.target_size, 2.5);
        assert_eq!(c.map_zoom, 4);
        assert_eq!(c.tile_url, "https://tiles.example/{z}/{x}/{y}.png");

        let err = c
            .apply_env(|k| (k == "DASHBOARD_STEP_MS").then(|| "soon".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("DASHBOARD_STEP_MS"));
    }
}
