//! Slippy-map host: a raster basemap plus one GeoJSON overlay layer.

use std::f64::consts::PI;

use presentation::viewer::FeatureFrame;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{HostError, RenderHost, RenderStats, Viewport};

pub const TILE_SIZE: u32 = 256;
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_6;

pub const OSM_TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const OSM_ATTRIBUTION: &str = "\u{a9} OpenStreetMap contributors";

/// Tile coordinate in ZXY scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    pub fn new(z: u8, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Tiles along one axis at zoom `z`.
    pub fn axis_len(z: u8) -> u32 {
        1u32 << z.min(30)
    }
}

/// `{s}`/`{z}`/`{x}`/`{y}` URL template with rotating subdomains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileTemplate {
    pub url: String,
    pub subdomains: Vec<String>,
    pub attribution: String,
}

impl Default for TileTemplate {
    fn default() -> Self {
        Self::new(OSM_TILE_URL, OSM_ATTRIBUTION)
    }
}

impl TileTemplate {
    pub fn new(url: impl Into<String>, attribution: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            subdomains: ["a", "b", "c"].iter().map(|s| s.to_string()).collect(),
            attribution: attribution.into(),
        }
    }

    pub fn url_for(&self, tile: TileCoord) -> String {
        let s = if self.subdomains.is_empty() {
            ""
        } else {
            let i = (tile.x as usize + tile.y as usize) % self.subdomains.len();
            self.subdomains[i].as_str()
        };
        self.url
            .replace("{s}", s)
            .replace("{z}", &tile.z.to_string())
            .replace("{x}", &tile.x.to_string())
            .replace("{y}", &tile.y.to_string())
    }
}

/// Map center and zoom, `[lat, lng]` order like the map libraries take it.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapView {
    pub center: [f64; 2],
    pub zoom: u8,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            center: [0.0, 0.0],
            zoom: 2,
        }
    }
}

/// Web Mercator world pixel of a lat/lng at `zoom`.
pub fn project(lat: f64, lng: f64, zoom: u8) -> (f64, f64) {
    let world = f64::from(TILE_SIZE) * f64::from(TileCoord::axis_len(zoom));
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = (lng + 180.0) / 360.0 * world;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * world;
    (x, y)
}

/// Tiles covering `viewport` around `view.center`, row-major from the
/// top-left. Columns wrap around the antimeridian; rows are clipped.
pub fn visible_tiles(view: &MapView, viewport: Viewport) -> Vec<TileCoord> {
    let (cx, cy) = project(view.center[0], view.center[1], view.zoom);
    let half_w = f64::from(viewport.width) / 2.0;
    let half_h = f64::from(viewport.height) / 2.0;
    let size = f64::from(TILE_SIZE);
    let n = i64::from(TileCoord::axis_len(view.zoom));

    let x0 = ((cx - half_w) / size).floor() as i64;
    let x1 = ((cx + half_w - 1.0) / size).floor() as i64;
    let y0 = (((cy - half_h) / size).floor() as i64).max(0);
    let y1 = (((cy + half_h - 1.0) / size).floor() as i64).min(n - 1);

    // A span wider than the world visits each column once.
    let x1 = x1.min(x0 + n - 1);

    let mut tiles = Vec::new();
    for y in y0..=y1 {
        for x in x0..=x1 {
            let wrapped = x.rem_euclid(n);
            tiles.push(TileCoord::new(view.zoom, wrapped as u32, y as u32));
        }
    }
    tiles
}

/// Headless map. The overlay is replaced wholesale on every `set_data`.
#[derive(Debug, Default)]
pub struct MapHost {
    template: TileTemplate,
    view: MapView,
    viewport: Option<Viewport>,
    overlay: Option<FeatureFrame>,
    tiles: Vec<TileCoord>,
    stats: RenderStats,
}

impl MapHost {
    pub fn new(template: TileTemplate, view: MapView) -> Self {
        Self {
            template,
            view,
            ..Self::default()
        }
    }

    pub fn template(&self) -> &TileTemplate {
        &self.template
    }

    pub fn view(&self) -> MapView {
        self.view
    }

    pub fn set_view(&mut self, view: MapView) {
        self.view = view;
    }

    /// GeoJSON currently on the overlay layer.
    pub fn overlay(&self) -> Option<&Value> {
        self.overlay.as_ref().map(|f| &f.geojson)
    }

    pub fn popup_html(&self, visible_slot: usize) -> Option<String> {
        self.overlay
            .as_ref()
            .and_then(|f| f.popups.get(visible_slot))
            .map(|p| p.to_html())
    }

    /// Basemap tiles requested by the last render.
    pub fn tiles(&self) -> &[TileCoord] {
        &self.tiles
    }

    pub fn tile_urls(&self) -> Vec<String> {
        self.tiles.iter().map(|t| self.template.url_for(*t)).collect()
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }
}

impl RenderHost for MapHost {
    type Data = FeatureFrame;

    fn initialize(&mut self, viewport: Viewport) -> Result<(), HostError> {
        if self.viewport.is_some() {
            return Ok(());
        }
        self.viewport = Some(viewport.validate()?);
        tracing::debug!(zoom = self.view.zoom, "map initialized");
        Ok(())
    }

    fn set_data(&mut self, data: FeatureFrame) {
        self.overlay = Some(data);
    }

    fn resize(&mut self, viewport: Viewport) -> Result<(), HostError> {
        if self.viewport.is_none() {
            return Err(HostError::NotInitialized);
        }
        self.viewport = Some(viewport.validate()?);
        Ok(())
    }

    fn render(&mut self) -> Result<RenderStats, HostError> {
        let viewport = self.viewport.ok_or(HostError::NotInitialized)?;
        self.tiles = visible_tiles(&self.view, viewport);
        self.stats.renders += 1;
        self.stats.last_drawn = self.overlay.as_ref().map_or(0, |f| f.visible.len());
        self.stats.last_hidden = 0;
        Ok(self.stats)
    }

    fn dispose(&mut self) {
        self.viewport = None;
        self.overlay = None;
        self.tiles.clear();
    }

    fn is_initialized(&self) -> bool {
        self.viewport.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::{MapHost, MapView, TileCoord, TileTemplate, project, visible_tiles};
    use crate::{RenderHost, Viewport};
    use pretty_assertions::assert_eq;
    use presentation::viewer::FeatureFrame;
    use serde_json::json;

    #[test]
    fn template_rotates_subdomains() {
        let t = TileTemplate::default();
        assert_eq!(
            t.url_for(TileCoord::new(2, 1, 1)),
            "https://c.tile.openstreetmap.org/2/1/1.png"
        );
        assert_eq!(
            t.url_for(TileCoord::new(2, 2, 1)),
            "https://a.tile.openstreetmap.org/2/2/1.png"
        );
    }

    #[test]
    fn origin_projects_to_world_center() {
        let (x, y) = project(0.0, 0.0, 2);
        assert!((x - 512.0).abs() < 1e-9);
        assert!((y - 512.0).abs() < 1e-9);
    }

    #[test]
    fn default_view_covers_center_tiles() {
        let tiles = visible_tiles(&MapView::default(), Viewport::new(512, 512));
        let coords: Vec<(u32, u32)> = tiles.iter().map(|t| (t.x, t.y)).collect();
        assert_eq!(coords, vec![(1, 1), (2, 1), (1, 2), (2, 2)]);
    }

    #[test]
    fn wide_viewport_wraps_without_duplicates() {
        let view = MapView {
            center: [0.0, 0.0],
            zoom: 0,
        };
        let tiles = visible_tiles(&view, Viewport::new(2000, 256));
        assert_eq!(tiles, vec![TileCoord::new(0, 0, 0)]);
    }

    #[test]
    fn very_wide_viewport_visits_each_column_once() {
        let view = MapView {
            center: [0.0, 0.0],
            zoom: 1,
        };
        let tiles = visible_tiles(&view, Viewport::new(4000, 256));
        let coords: Vec<(u32, u32)> = tiles.iter().map(|t| (t.x, t.y)).collect();
        assert_eq!(coords, vec![(1, 0), (0, 0), (1, 1), (0, 1)]);

        let tiles = visible_tiles(&view, Viewport::new(u32::MAX, 512));
        assert_eq!(tiles.len(), 4);
    }

    #[test]
    fn render_counts_overlay_features() {
        let mut host = MapHost::new(TileTemplate::default(), MapView::default());
        host.initialize(Viewport::new(512, 512)).unwrap();
        host.set_data(FeatureFrame {
            visible: vec![0, 2],
            geojson: json!({"type": "FeatureCollection", "features": []}),
            popups: Vec::new(),
        });
        let stats = host.render().unwrap();
        assert_eq!(stats.last_drawn, 2);
        assert_eq!(host.tile_urls().len(), 4);
        assert!(host.popup_html(0).is_none());
    }
}
