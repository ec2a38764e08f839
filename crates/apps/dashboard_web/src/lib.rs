//! Browser bindings. JavaScript owns the DOM, the file input, and the
//! `requestAnimationFrame` loop; everything it renders comes from here.

use console_error_panic_hook::set_once;
use std::cell::RefCell;
use wasm_bindgen::prelude::*;

use dashboard::{Dashboard, DashboardConfig, View};
use foundation::color::Rgb;
use foundation::time::EpochMillis;
use host::Viewport;
use presentation::point_cloud::AltitudeFilter;
use presentation::viewer::PointCloudSettings;
use serde::Serialize;

const DEFAULT_VIEWPORT: Viewport = Viewport {
    width: 1280,
    height: 720,
};

thread_local! {
    static STATE: RefCell<Option<Dashboard>> = const { RefCell::new(None) };
}

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn with_dashboard<R>(f: impl FnOnce(&mut Dashboard) -> R) -> Result<R, JsValue> {
    STATE.with(|state| {
        let mut s = state.borrow_mut();
        let dash = s
            .as_mut()
            .ok_or_else(|| JsValue::from_str("dashboard not started"))?;
        Ok(f(dash))
    })
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(js_err)
}

fn install(config: DashboardConfig, viewport: Viewport) -> Result<(), JsValue> {
    let dash = Dashboard::new(config, viewport).map_err(js_err)?;
    STATE.with(|state| *state.borrow_mut() = Some(dash));
    Ok(())
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    set_once();
    install(DashboardConfig::default(), DEFAULT_VIEWPORT)
}

/// Replaces the dashboard with one built from a JSON config. Loaded data
/// and the log are discarded.
#[wasm_bindgen]
pub fn configure(config_json: &str) -> Result<(), JsValue> {
    let config = DashboardConfig::from_json_str(config_json).map_err(js_err)?;
    let viewport = STATE
        .with(|state| state.borrow().as_ref().map(Dashboard::viewport))
        .unwrap_or(DEFAULT_VIEWPORT);
    install(config, viewport)
}

#[wasm_bindgen]
pub fn accepted_extensions() -> String {
    formats::ingest::ACCEPTED_EXTENSIONS.to_string()
}

#[wasm_bindgen]
pub fn set_viewport(width: u32, height: u32) -> Result<(), JsValue> {
    with_dashboard(|d| d.resize(Viewport::new(width, height)))?.map_err(js_err)
}

/// Returns false when the file was rejected; the reason is in the log.
#[wasm_bindgen]
pub fn upload_file(name: &str, bytes: &[u8]) -> Result<bool, JsValue> {
    with_dashboard(|d| match d.upload_file(name, bytes) {
        Ok(_) => true,
        Err(err) => {
            web_sys::console::warn_1(&js_err(&err));
            false
        }
    })
}

/// Takes a tab caption: "3D Viewer" or "GIS Map".
#[wasm_bindgen]
pub fn select_view(label: &str) -> Result<(), JsValue> {
    let view = View::from_label(label).ok_or_else(|| js_err(format!("unknown view {label:?}")))?;
    with_dashboard(|d| d.select_view(view))?.map_err(js_err)
}

#[wasm_bindgen]
pub fn active_view() -> Result<String, JsValue> {
    with_dashboard(|d| d.active_view().label().to_string())
}

/// Log entries with `seq >= since` as a JSON array.
#[wasm_bindgen]
pub fn logs_json(since: u32) -> Result<String, JsValue> {
    with_dashboard(|d| to_json(&d.log_book().since(u64::from(since))))?
}

// Point-cloud panel.

#[wasm_bindgen]
pub fn set_altitude_colors(on: bool) -> Result<bool, JsValue> {
    with_dashboard(|d| d.set_use_altitude_colors(on))
}

#[wasm_bindgen]
pub fn set_low_color(hex: &str) -> Result<bool, JsValue> {
    let color = Rgb::from_hex(hex).ok_or_else(|| js_err(format!("invalid color {hex:?}")))?;
    with_dashboard(|d| d.set_low_color(color))
}

#[wasm_bindgen]
pub fn set_high_color(hex: &str) -> Result<bool, JsValue> {
    let color = Rgb::from_hex(hex).ok_or_else(|| js_err(format!("invalid color {hex:?}")))?;
    with_dashboard(|d| d.set_high_color(color))
}

#[wasm_bindgen]
pub fn set_point_size(size: f32) -> Result<bool, JsValue> {
    with_dashboard(|d| d.set_point_size(size))
}

#[wasm_bindgen]
pub fn set_model_scale(scale: f64) -> Result<bool, JsValue> {
    with_dashboard(|d| d.set_model_scale(scale))
}

#[wasm_bindgen]
pub fn set_min_altitude(y: f64) -> Result<bool, JsValue> {
    with_dashboard(|d| d.set_min_altitude(y))
}

#[wasm_bindgen]
pub fn set_max_altitude(y: f64) -> Result<bool, JsValue> {
    with_dashboard(|d| d.set_max_altitude(y))
}

#[wasm_bindgen]
pub fn reset_altitude_filter() -> Result<bool, JsValue> {
    with_dashboard(|d| d.reset_altitude_filter())
}

/// Current settings plus slider limits, or `null` before a cloud is loaded.
#[wasm_bindgen]
pub fn point_cloud_settings_json() -> Result<String, JsValue> {
    #[derive(Serialize)]
    struct Panel<'a> {
        settings: &'a PointCloudSettings,
        altitude_bounds: AltitudeFilter,
    }
    with_dashboard(|d| match d.point_cloud() {
        Some(view) => to_json(&Panel {
            settings: view.settings(),
            altitude_bounds: view.altitude_bounds(),
        }),
        None => Ok("null".to_string()),
    })?
}

/// Interleaved `x, y, z` of every visible point in scene space.
#[wasm_bindgen]
pub fn point_positions() -> Result<js_sys::Float32Array, JsValue> {
    with_dashboard(|d| {
        let flat: Vec<f32> = d
            .scene()
            .draw_list()
            .iter()
            .flat_map(|p| p.position)
            .collect();
        js_sys::Float32Array::from(flat.as_slice())
    })
}

/// Interleaved `r, g, b` matching [`point_positions`].
#[wasm_bindgen]
pub fn point_colors() -> Result<js_sys::Float32Array, JsValue> {
    with_dashboard(|d| {
        let flat: Vec<f32> = d.scene().draw_list().iter().flat_map(|p| p.color).collect();
        js_sys::Float32Array::from(flat.as_slice())
    })
}

#[wasm_bindgen]
pub fn point_size() -> Result<f32, JsValue> {
    with_dashboard(|d| d.scene().frame().map_or(0.0, |f| f.point_size))
}

// Map panel.

#[wasm_bindgen]
pub fn set_tag(tag: &str, checked: bool) -> Result<bool, JsValue> {
    with_dashboard(|d| d.set_tag(tag, checked))
}

#[wasm_bindgen]
pub fn clear_tags() -> Result<bool, JsValue> {
    with_dashboard(|d| d.clear_tags())
}

/// Returns true while playing. JavaScript should call [`tick`] from
/// `requestAnimationFrame` as long as this or `tick` reports true.
#[wasm_bindgen]
pub fn toggle_play() -> Result<bool, JsValue> {
    with_dashboard(|d| {
        d.toggle_playback();
        d.features().is_some_and(|f| f.is_playing())
    })
}

#[wasm_bindgen]
pub fn seek(epoch_ms: f64) -> Result<Option<f64>, JsValue> {
    with_dashboard(|d| d.seek(EpochMillis(epoch_ms as i64)).map(|t| t.0 as f64))
}

/// One display frame. Returns true if another frame is wanted.
#[wasm_bindgen]
pub fn tick() -> Result<bool, JsValue> {
    with_dashboard(|d| {
        d.tick_frame();
        d.frame_loop().pending() > 0
    })
}

/// Control panel description, or `null` without feature data.
#[wasm_bindgen]
pub fn controls_json() -> Result<String, JsValue> {
    with_dashboard(|d| to_json(&d.controls()))?
}

/// FeatureCollection of the features currently on the map.
#[wasm_bindgen]
pub fn map_overlay_json() -> Result<String, JsValue> {
    with_dashboard(|d| to_json(&d.map().overlay()))?
}

#[wasm_bindgen]
pub fn popup_html(visible_slot: usize) -> Result<Option<String>, JsValue> {
    with_dashboard(|d| d.map().popup_html(visible_slot))
}

#[wasm_bindgen]
pub fn map_view_json() -> Result<String, JsValue> {
    #[derive(Serialize)]
    struct MapSetup<'a> {
        view: host::map::MapView,
        template: &'a host::map::TileTemplate,
    }
    with_dashboard(|d| {
        to_json(&MapSetup {
            view: d.map().view(),
            template: d.map().template(),
        })
    })?
}

#[wasm_bindgen]
pub fn tile_urls() -> Result<js_sys::Array, JsValue> {
    with_dashboard(|d| {
        d.map()
            .tile_urls()
            .into_iter()
            .map(JsValue::from)
            .collect::<js_sys::Array>()
    })
}
