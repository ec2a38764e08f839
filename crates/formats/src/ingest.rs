//! Upload dispatch: file name + bytes in, typed dataset out.

use foundation::bounds::Aabb3;
use foundation::math::Vec3;
use thiserror::Error;

use crate::geojson::{FeatureCollection, GeoJsonError};
use crate::pcd::{PcdDecoder, PcdError, PcdHeader, PointCloudDecoder};
use crate::xyz::parse_xyz;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Unsupported file type: {name}")]
    UnsupportedFileType { name: String },
    #[error("{name} is not valid UTF-8 text")]
    InvalidText { name: String },
    #[error("{name} is not valid JSON: {source}")]
    MalformedJson {
        name: String,
        source: serde_json::Error,
    },
    #[error("{name} is not a GeoJSON feature collection")]
    NotAFeatureCollection { name: String },
    #[error("{name} contains no valid points")]
    EmptyInput { name: String },
    #[error("{name}: {source}")]
    Pcd { name: String, source: PcdError },
}

impl IngestError {
    /// The failure without the file name, for `Failed to load {name}: {reason}`.
    pub fn reason(&self) -> String {
        match self {
            IngestError::UnsupportedFileType { .. } => "unsupported file type".to_string(),
            IngestError::InvalidText { .. } => "not valid UTF-8 text".to_string(),
            IngestError::MalformedJson { source, .. } => format!("malformed JSON ({source})"),
            IngestError::NotAFeatureCollection { .. } => {
                "not a GeoJSON feature collection".to_string()
            }
            IngestError::EmptyInput { .. } => "no valid points".to_string(),
            IngestError::Pcd { source, .. } => source.to_string(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FileKind {
    Xyz,
    Pcd,
    GeoJson,
}

/// `accept` filter for the upload control.
pub const ACCEPTED_EXTENSIONS: &str = ".json,.geojson,.xyz,.pcd";

impl FileKind {
    pub fn from_file_name(name: &str) -> Result<Self, IngestError> {
        let ext = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "xyz" => Ok(FileKind::Xyz),
            "pcd" => Ok(FileKind::Pcd),
            "json" | "geojson" => Ok(FileKind::GeoJson),
            _ => Err(IngestError::UnsupportedFileType {
                name: name.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileStats {
    pub name: String,
    pub size_bytes: u64,
}

impl FileStats {
    pub fn size_label(&self) -> String {
        format_file_size(self.size_bytes)
    }
}

/// KB below one MiB, MB from there on, two decimals either way.
pub fn format_file_size(bytes: u64) -> String {
    let mib = bytes as f64 / (1024.0 * 1024.0);
    if mib < 1.0 {
        format!("{:.2} KB", bytes as f64 / 1024.0)
    } else {
        format!("{mib:.2} MB")
    }
}

/// Decimal with `,` thousands separators.
pub fn format_count(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointCloudSummary {
    pub count: usize,
    pub bounds: Aabb3,
}

impl PointCloudSummary {
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        Some(Self {
            count: points.len(),
            bounds: Aabb3::from_points(points)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointCloudData {
    pub points: Vec<Vec3>,
    pub summary: PointCloudSummary,
    /// Lines dropped while reading `.xyz` text (1-based).
    pub skipped_lines: Vec<usize>,
    /// Header metadata when the source was `.pcd`.
    pub pcd: Option<PcdHeader>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Dataset {
    PointCloud(PointCloudData),
    Features(FeatureCollection),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ingestion {
    pub stats: FileStats,
    pub kind: FileKind,
    pub dataset: Dataset,
}

pub fn ingest(name: &str, bytes: &[u8]) -> Result<Ingestion, IngestError> {
    ingest_with(name, bytes, &PcdDecoder)
}

/// Like [`ingest`] with a caller-supplied `.pcd` decoder.
pub fn ingest_with(
    name: &str,
    bytes: &[u8],
    decoder: &dyn PointCloudDecoder,
) -> Result<Ingestion, IngestError> {
    let kind = FileKind::from_file_name(name)?;
    let stats = FileStats {
        name: name.to_string(),
        size_bytes: bytes.len() as u64,
    };

    let dataset = match kind {
        FileKind::Xyz => {
            let text = as_text(name, bytes)?;
            let parsed = parse_xyz(text);
            if !parsed.skipped_lines.is_empty() {
                tracing::debug!(file = name, skipped = parsed.skipped(), "dropped xyz lines");
            }
            point_cloud(name, parsed.points, parsed.skipped_lines, None)?
        }
        FileKind::Pcd => {
            let cloud = decoder.decode(bytes).map_err(|source| IngestError::Pcd {
                name: name.to_string(),
                source,
            })?;
            point_cloud(name, cloud.points, Vec::new(), Some(cloud.header))?
        }
        FileKind::GeoJson => {
            let text = as_text(name, bytes)?;
            let collection =
                FeatureCollection::from_geojson_str(text).map_err(|e| match e {
                    GeoJsonError::Malformed(source) => IngestError::MalformedJson {
                        name: name.to_string(),
                        source,
                    },
                    GeoJsonError::NotAFeatureCollection => IngestError::NotAFeatureCollection {
                        name: name.to_string(),
                    },
                })?;
            Dataset::Features(collection)
        }
    };

    tracing::debug!(file = name, ?kind, size = stats.size_bytes, "ingested file");
    Ok(Ingestion {
        stats,
        kind,
        dataset,
    })
}

fn as_text<'a>(name: &str, bytes: &'a [u8]) -> Result<&'a str, IngestError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    std::str::from_utf8(bytes).map_err(|_| IngestError::InvalidText {
        name: name.to_string(),
    })
}

fn point_cloud(
    name: &str,
    points: Vec<Vec3>,
    skipped_lines: Vec<usize>,
    pcd: Option<PcdHeader>,
) -> Result<Dataset, IngestError> {
    let summary = PointCloudSummary::from_points(&points).ok_or_else(|| IngestError::EmptyInput {
        name: name.to_string(),
    })?;
    Ok(Dataset::PointCloud(PointCloudData {
        points,
        summary,
        skipped_lines,
        pcd,
    }))
}
