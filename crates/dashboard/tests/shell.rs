use dashboard::{Dashboard, DashboardConfig, LogLevel, View};
use foundation::time::DAY_MS;
use host::{RenderHost, Viewport};
use presentation::playback::PlaybackPhase;
use pretty_assertions::assert_eq;

fn dashboard() -> Dashboard {
    Dashboard::new(DashboardConfig::default(), Viewport::new(800, 600)).unwrap()
}

fn messages(d: &Dashboard) -> Vec<String> {
    d.logs().iter().map(|e| e.message.clone()).collect()
}

const FEATURES: &str = r#"{"type": "FeatureCollection", "features": [
    {"type": "Feature", "geometry": {"type": "Point", "coordinates": [0, 0]},
     "properties": {"tags": ["a"], "timestamp": "2024-01-01"}},
    {"type": "Feature", "geometry": {"type": "Point", "coordinates": [1, 1]},
     "properties": {"tags": ["b"], "timestamp": "2024-01-03"}},
    {"type": "Feature", "geometry": {"type": "Point", "coordinates": [2, 2]},
     "properties": {"tags": ["a", "b"], "timestamp": "2024-01-06"}}
]}"#;

#[test]
fn xyz_upload_logs_summary_and_draws() {
    let mut d = dashboard();
    d.upload_file("scan.xyz", b"0 0 0\n10 4 0\n0 8 0\nnot a point\n")
        .unwrap();

    assert_eq!(
        messages(&d),
        vec![
            "File uploaded: scan.xyz",
            "Number of points: 3",
            "File size: 0.03 KB",
            "Bounding box dimensions:",
            "  Width: 10.00 units",
            "  Height: 8.00 units",
            "  Depth: 0.00 units",
            "Skipped 1 malformed lines",
        ]
    );
    assert_eq!(d.logs()[7].level, LogLevel::Warn);

    let settings = d.point_cloud_settings().unwrap();
    assert_eq!(settings.model_scale, 0.5);
    assert_eq!(d.scene().stats().last_drawn, 3);

    assert!(d.set_min_altitude(5.0));
    assert_eq!(d.scene().stats().last_drawn, 1);
    assert_eq!(d.scene().stats().last_hidden, 2);
    assert!(d.reset_altitude_filter());
    assert_eq!(d.scene().stats().last_drawn, 3);
}

#[test]
fn failed_uploads_keep_previous_data() {
    let mut d = dashboard();
    d.upload_file("scan.xyz", b"0 0 0\n1 1 1\n").unwrap();
    let before = d.point_cloud().cloned();
    let logged = d.logs().len();

    assert!(d.upload_file("notes.txt", b"hello").is_err());
    assert!(d.upload_file("empty.xyz", b"garbage\n").is_err());
    assert!(d.upload_file("map.json", b"{ nope").is_err());

    let tail: Vec<String> = messages(&d).split_off(logged);
    assert_eq!(tail[0], "Unsupported file type: notes.txt");
    assert_eq!(tail[1], "Failed to load empty.xyz: no valid points");
    assert!(tail[2].starts_with("Failed to load map.json: malformed JSON"));
    assert!(d.logs()[logged..].iter().all(|e| e.level == LogLevel::Error));
    assert_eq!(d.point_cloud().cloned(), before);
    assert!(d.features().is_none());
}

#[test]
fn datasets_of_different_kinds_coexist() {
    let mut d = dashboard();
    d.upload_file("scan.xyz", b"0 0 0\n1 1 1\n").unwrap();
    d.upload_file("places.geojson", FEATURES.as_bytes()).unwrap();
    assert!(d.point_cloud().is_some());
    assert_eq!(d.features().map(|f| f.collection().len()), Some(3));
    assert!(messages(&d).contains(&"GeoJSON file uploaded: places.geojson".to_string()));
}

#[test]
fn playback_runs_on_frames_and_stops_after_a_sweep() {
    let mut d = dashboard();
    d.upload_file("places.json", FEATURES.as_bytes()).unwrap();
    d.select_view(View::Map).unwrap();
    assert_eq!(d.map().stats().last_drawn, 3);

    assert_eq!(d.toggle_playback(), Some(PlaybackPhase::Playing));
    assert_eq!(d.frame_loop().pending(), 1);

    let report = d.tick_frame();
    assert_eq!(report.playback, Some(PlaybackPhase::Playing));
    assert_eq!(d.map().stats().last_drawn, 1);

    let mut frames = 1;
    while d.tick_frame().playback == Some(PlaybackPhase::Playing) {
        frames += 1;
        assert!(frames < 10);
    }
    assert_eq!(frames + 1, 5);
    assert_eq!(d.frame_loop().pending(), 0);
    assert_eq!(d.map().stats().last_drawn, 3);

    let range = d.features().and_then(|f| f.time_range()).unwrap();
    let cursor = d.features().and_then(|f| f.playback()).map(|p| p.cursor());
    assert_eq!(cursor, Some(range.min));
    assert_eq!(d.tick_frame().playback, None);
}

#[test]
fn leaving_the_map_pauses_and_cancels_the_frame_request() {
    let mut d = dashboard();
    d.upload_file("places.json", FEATURES.as_bytes()).unwrap();
    d.select_view(View::Map).unwrap();
    d.toggle_playback();
    d.tick_frame();
    let cursor = d.features().and_then(|f| f.playback()).map(|p| p.cursor());

    d.select_view(View::PointCloud).unwrap();
    assert!(!d.map().is_initialized());
    assert_eq!(d.frame_loop().pending(), 0);
    assert!(!d.features().is_some_and(|f| f.is_playing()));
    assert_eq!(d.tick_frame().playback, None);
    assert_eq!(
        d.features().and_then(|f| f.playback()).map(|p| p.cursor()),
        cursor
    );
}

#[test]
fn tag_controls_filter_the_map() {
    let mut d = dashboard();
    d.upload_file("places.json", FEATURES.as_bytes()).unwrap();
    d.select_view(View::Map).unwrap();

    assert!(d.set_tag("b", true));
    assert_eq!(d.map().stats().last_drawn, 2);
    let panel = d.controls().unwrap();
    assert!(panel.clear_enabled);
    assert_eq!(panel.time.map(|t| t.slider.step), Some(DAY_MS));

    assert!(d.clear_tags());
    assert_eq!(d.map().stats().last_drawn, 3);
}
