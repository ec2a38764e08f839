use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use dashboard::{Dashboard, DashboardConfig, View};
use foundation::color::Rgb;
use foundation::time::EpochMillis;
use host::Viewport;
use presentation::gis::{format_date, parse_timestamp};
use presentation::playback::PlaybackPhase;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect point clouds and GeoJSON the way the dashboard shows them")]
struct Args {
    /// JSON settings file; DASHBOARD_* variables override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Viewport used for host computations
    #[arg(long, default_value_t = 800)]
    width: u32,
    #[arg(long, default_value_t = 600)]
    height: u32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a file and print the dashboard log
    Inspect { file: PathBuf },

    /// Print the GeoJSON the map would show
    Filter {
        file: PathBuf,

        /// Selected tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Playback cursor, e.g. 2024-01-03; implies playing
        #[arg(long)]
        at: Option<String>,
    },

    /// Run timestamp playback frame by frame
    Play {
        file: PathBuf,

        /// Stop after this many frames even if still playing
        #[arg(long, default_value_t = 1000)]
        max_frames: u32,
    },

    /// Print normalized positions and height colors per point
    Colors {
        file: PathBuf,

        #[arg(long)]
        low: Option<String>,
        #[arg(long)]
        high: Option<String>,
        #[arg(long)]
        min_altitude: Option<f64>,
        #[arg(long)]
        max_altitude: Option<f64>,
        /// Print white points instead of the height gradient
        #[arg(long)]
        flat: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = DashboardConfig::resolve(args.config.as_deref())
        .context("loading dashboard config")?;
    let mut dash = Dashboard::new(config, Viewport::new(args.width, args.height))?;

    match args.command {
        Command::Inspect { file } => {
            let loaded = upload(&mut dash, &file);
            print_logs(&dash);
            loaded?;
            if let Some(header) = dash.point_cloud_source().and_then(|s| s.pcd.as_ref()) {
                println!(
                    "PCD {} {:?}, fields: {}",
                    header.version.as_deref().unwrap_or("(no version)"),
                    header.data,
                    header
                        .fields
                        .iter()
                        .map(|f| f.name.as_str())
                        .collect::<Vec<_>>()
                        .join(" ")
                );
            }
            if let Some(features) = dash.features() {
                println!("Features: {}", features.collection().len());
                let tags: Vec<&str> = features.tags().iter().map(String::as_str).collect();
                println!("Tags: {}", tags.join(", "));
                if let Some(range) = features.time_range() {
                    println!("Time: {} .. {}", format_date(range.min), format_date(range.max));
                }
            }
        }
        Command::Filter { file, tags, at } => {
            upload(&mut dash, &file)?;
            dash.select_view(View::Map)?;
            for tag in &tags {
                if !dash.set_tag(tag, true) {
                    bail!("unknown tag {tag:?}");
                }
            }
            if let Some(at) = at {
                let t = parse_timestamp(&serde_json::Value::String(at.clone()))
                    .with_context(|| format!("unparseable time {at:?}"))?;
                if dash.seek(t).is_none() {
                    bail!("{} has no timestamps", file.display());
                }
                dash.toggle_playback();
            }
            let overlay = dash.map().overlay().cloned().unwrap_or_default();
            println!("{}", serde_json::to_string_pretty(&overlay)?);
        }
        Command::Play { file, max_frames } => {
            upload(&mut dash, &file)?;
            dash.select_view(View::Map)?;
            if dash.toggle_playback().is_none() {
                bail!("{} has no timestamps", file.display());
            }
            for _ in 0..max_frames {
                let report = dash.tick_frame();
                let cursor = dash
                    .features()
                    .and_then(|f| f.playback())
                    .map_or(EpochMillis(0), |p| p.cursor());
                println!(
                    "frame {:>4}  {}  visible {}",
                    report.frame.index,
                    format_date(cursor),
                    dash.map().stats().last_drawn
                );
                if report.playback != Some(PlaybackPhase::Playing) {
                    break;
                }
            }
        }
        Command::Colors {
            file,
            low,
            high,
            min_altitude,
            max_altitude,
            flat,
        } => {
            upload(&mut dash, &file)?;
            if dash.point_cloud().is_none() {
                bail!("{} is not a point cloud", file.display());
            }
            if let Some(hex) = low {
                dash.set_low_color(parse_color(&hex)?);
            }
            if let Some(hex) = high {
                dash.set_high_color(parse_color(&hex)?);
            }
            if let Some(y) = min_altitude {
                dash.set_min_altitude(y);
            }
            if let Some(y) = max_altitude {
                dash.set_max_altitude(y);
            }
            dash.set_use_altitude_colors(!flat);

            let Some(frame) = dash.point_cloud().map(|v| v.frame()) else {
                bail!("point cloud disappeared");
            };
            for ((p, c), visible) in frame.positions.iter().zip(&frame.colors).zip(&frame.visible) {
                let color = Rgb::new(c[0], c[1], c[2]).to_hex();
                println!(
                    "{:>9.4} {:>9.4} {:>9.4}  {}{}",
                    p[0],
                    p[1],
                    p[2],
                    color,
                    if *visible { "" } else { "  hidden" }
                );
            }
            info!(
                drawn = dash.scene().stats().last_drawn,
                hidden = dash.scene().stats().last_hidden,
                "colored"
            );
        }
    }
    Ok(())
}

fn upload(dash: &mut Dashboard, path: &Path) -> Result<()> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    dash.upload_file(&name, &bytes)?;
    Ok(())
}

fn print_logs(dash: &Dashboard) {
    for entry in dash.logs() {
        println!("{}", entry.message);
    }
}

fn parse_color(hex: &str) -> Result<Rgb> {
    Rgb::from_hex(hex).with_context(|| format!("invalid color {hex:?}, expected #rrggbb"))
}
