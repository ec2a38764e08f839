//! Point Cloud Data (`.pcd`) decoding.
//!
//! Only the header and the uncompressed payload layouts are understood:
//! `DATA ascii` and `DATA binary`. Anything richer belongs to a dedicated
//! decoder plugged in through [`PointCloudDecoder`].

use foundation::math::Vec3;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PcdError {
    #[error("pcd header is not valid text")]
    NonTextHeader,
    #[error("pcd header has no DATA line")]
    MissingData,
    #[error("invalid pcd header line `{key}`: {reason}")]
    InvalidHeader { key: String, reason: String },
    #[error("pcd has no `{0}` field")]
    MissingField(&'static str),
    #[error("unsupported pcd data layout: {0}")]
    UnsupportedData(String),
    #[error("pcd payload truncated: expected {expected} bytes, found {actual}")]
    Truncated { expected: usize, actual: usize },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum PcdData {
    Ascii,
    Binary,
    BinaryCompressed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PcdField {
    pub name: String,
    /// Bytes per element.
    pub size: usize,
    /// `F` float, `I` signed, `U` unsigned.
    pub kind: char,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PcdHeader {
    pub version: Option<String>,
    pub fields: Vec<PcdField>,
    pub width: usize,
    pub height: usize,
    pub viewpoint: Option<[f64; 7]>,
    pub points: usize,
    pub data: PcdData,
}

impl PcdHeader {
    /// Bytes per record in the binary layout.
    pub fn point_step(&self) -> usize {
        self.fields.iter().map(|f| f.size * f.count).sum()
    }

    fn locate(&self, name: &'static str) -> Result<FieldSlot, PcdError> {
        let mut column = 0;
        let mut byte_offset = 0;
        for f in &self.fields {
            if f.name.eq_ignore_ascii_case(name) {
                return Ok(FieldSlot {
                    column,
                    byte_offset,
                    size: f.size,
                    kind: f.kind,
                });
            }
            column += f.count;
            byte_offset += f.size * f.count;
        }
        Err(PcdError::MissingField(name))
    }
}

#[derive(Debug, Copy, Clone)]
struct FieldSlot {
    column: usize,
    byte_offset: usize,
    size: usize,
    kind: char,
}

/// Decoded cloud plus whatever metadata the decoder exposes.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedCloud {
    pub points: Vec<Vec3>,
    pub header: PcdHeader,
}

/// Collaborator boundary for binary point-cloud formats.
pub trait PointCloudDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedCloud, PcdError>;
}

#[derive(Debug, Default, Copy, Clone)]
pub struct PcdDecoder;

impl PointCloudDecoder for PcdDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedCloud, PcdError> {
        let (header, payload) = parse_header(bytes)?;
        let slots = [header.locate("x")?, header.locate("y")?, header.locate("z")?];
        let points = match header.data {
            PcdData::Ascii => decode_ascii(&header, &slots, payload)?,
            PcdData::Binary => decode_binary(&header, &slots, payload)?,
            PcdData::BinaryCompressed => {
                return Err(PcdError::UnsupportedData("binary_compressed".to_string()));
            }
        };
        tracing::debug!(
            points = points.len(),
            declared = header.points,
            "decoded pcd payload"
        );
        Ok(DecodedCloud { points, header })
    }
}

fn invalid(key: &str, reason: impl Into<String>) -> PcdError {
    PcdError::InvalidHeader {
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn parse_list<T: std::str::FromStr>(key: &str, values: &[&str]) -> Result<Vec<T>, PcdError> {
    values
        .iter()
        .map(|v| v.parse::<T>().map_err(|_| invalid(key, format!("bad value {v}"))))
        .collect()
}

fn parse_one<T: std::str::FromStr>(key: &str, values: &[&str]) -> Result<T, PcdError> {
    let first = values.first().ok_or_else(|| invalid(key, "missing value"))?;
    first
        .parse::<T>()
        .map_err(|_| invalid(key, format!("bad value {first}")))
}

fn parse_header(bytes: &[u8]) -> Result<(PcdHeader, &[u8]), PcdError> {
    let mut version = None;
    let mut names: Vec<String> = Vec::new();
    let mut sizes: Vec<usize> = Vec::new();
    let mut kinds: Vec<char> = Vec::new();
    let mut counts: Vec<usize> = Vec::new();
    let mut width = None;
    let mut height = None;
    let mut viewpoint = None;
    let mut points = None;

    let mut offset = 0;
    let data = loop {
        let rest = &bytes[offset..];
        if rest.is_empty() {
            return Err(PcdError::MissingData);
        }
        let end = rest
            .iter()
            .position(|&b| b == b'\n')
            .map(|i| i + 1)
            .unwrap_or(rest.len());
        let line = std::str::from_utf8(&rest[..end]).map_err(|_| PcdError::NonTextHeader)?;
        offset += end;

        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.split_whitespace();
        let Some(key) = parts.next() else {
            continue;
        };
        let values: Vec<&str> = parts.collect();
        match key.to_ascii_uppercase().as_str() {
            "VERSION" => version = values.first().map(|v| v.to_string()),
            "FIELDS" => names = values.iter().map(|v| v.to_string()).collect(),
            "SIZE" => sizes = parse_list(key, &values)?,
            "TYPE" => kinds = parse_list(key, &values)?,
            "COUNT" => counts = parse_list(key, &values)?,
            "WIDTH" => width = Some(parse_one(key, &values)?),
            "HEIGHT" => height = Some(parse_one(key, &values)?),
            "POINTS" => points = Some(parse_one(key, &values)?),
            "VIEWPOINT" => {
                let v: Vec<f64> = parse_list(key, &values)?;
                let vp: [f64; 7] = v
                    .try_into()
                    .map_err(|_| invalid(key, "expected 7 values"))?;
                viewpoint = Some(vp);
            }
            "DATA" => {
                let kind = values.first().copied().unwrap_or_default();
                break match kind.to_ascii_lowercase().as_str() {
                    "ascii" => PcdData::Ascii,
                    "binary" => PcdData::Binary,
                    "binary_compressed" => PcdData::BinaryCompressed,
                    other => return Err(PcdError::UnsupportedData(other.to_string())),
                };
            }
            other => tracing::debug!(key = other, "ignoring unknown pcd header key"),
        }
    };

    if names.is_empty() {
        return Err(invalid("FIELDS", "no fields declared"));
    }
    let n = names.len();
    if sizes.is_empty() {
        sizes = vec![4; n];
    }
    if kinds.is_empty() {
        kinds = vec!['F'; n];
    }
    if counts.is_empty() {
        counts = vec![1; n];
    }
    if sizes.len() != n || kinds.len() != n || counts.len() != n {
        return Err(invalid("FIELDS", "SIZE/TYPE/COUNT do not match FIELDS"));
    }

    let fields: Vec<PcdField> = names
        .into_iter()
        .zip(sizes)
        .zip(kinds)
        .zip(counts)
        .map(|(((name, size), kind), count)| PcdField {
            name,
            size,
            kind: kind.to_ascii_uppercase(),
            count,
        })
        .collect();

    let step = fields.iter().try_fold(0usize, |acc, f| {
        f.size.checked_mul(f.count).and_then(|b| acc.checked_add(b))
    });
    if step.is_none() {
        return Err(invalid("SIZE", "record size overflows"));
    }

    let width: usize = width.unwrap_or(0);
    let height = height.unwrap_or(1);
    let points = match points {
        Some(p) => p,
        None => width
            .checked_mul(height)
            .ok_or_else(|| invalid("WIDTH", "WIDTH * HEIGHT overflows"))?,
    };
    let header = PcdHeader {
        version,
        fields,
        width,
        height,
        viewpoint,
        points,
        data,
    };
    Ok((header, &bytes[offset..]))
}

fn decode_ascii(
    header: &PcdHeader,
    slots: &[FieldSlot; 3],
    payload: &[u8],
) -> Result<Vec<Vec3>, PcdError> {
    let text = String::from_utf8_lossy(payload);
    let mut out = Vec::new();
    for line in text.lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }
        let read = |slot: &FieldSlot| -> Option<f64> { tokens.get(slot.column)?.parse().ok() };
        let (Some(x), Some(y), Some(z)) = (read(&slots[0]), read(&slots[1]), read(&slots[2]))
        else {
            continue;
        };
        let p = Vec3::new(x, y, z);
        if p.is_finite() {
            out.push(p);
        }
        if out.len() == header.points {
            break;
        }
    }
    Ok(out)
}

fn decode_binary(
    header: &PcdHeader,
    slots: &[FieldSlot; 3],
    payload: &[u8],
) -> Result<Vec<Vec3>, PcdError> {
    let step = header.point_step();
    let expected = step
        .checked_mul(header.points)
        .ok_or_else(|| invalid("POINTS", "payload size overflows"))?;
    if payload.len() < expected {
        return Err(PcdError::Truncated {
            expected,
            actual: payload.len(),
        });
    }
    for slot in slots {
        if read_scalar(slot, &[0u8; 8]).is_none() {
            return Err(PcdError::UnsupportedData(format!(
                "field type {}{}",
                slot.kind, slot.size
            )));
        }
    }

    let mut out = Vec::with_capacity(header.points.min(payload.len() / step.max(1)));
    for record in payload[..expected].chunks_exact(step.max(1)) {
        let read = |slot: &FieldSlot| {
            record
                .get(slot.byte_offset..slot.byte_offset + slot.size)
                .and_then(|b| read_scalar(slot, b))
        };
        if let (Some(x), Some(y), Some(z)) = (read(&slots[0]), read(&slots[1]), read(&slots[2])) {
            let p = Vec3::new(x, y, z);
            if p.is_finite() {
                out.push(p);
            }
        }
    }
    Ok(out)
}

/// Little-endian scalar at the start of `b`.
fn read_scalar(slot: &FieldSlot, b: &[u8]) -> Option<f64> {
    Some(match (slot.kind, slot.size) {
        ('F', 4) => f64::from(f32::from_le_bytes(b.get(..4)?.try_into().ok()?)),
        ('F', 8) => f64::from_le_bytes(b.get(..8)?.try_into().ok()?),
        ('I', 1) => f64::from(i8::from_le_bytes(b.get(..1)?.try_into().ok()?)),
        ('I', 2) => f64::from(i16::from_le_bytes(b.get(..2)?.try_into().ok()?)),
        ('I', 4) => f64::from(i32::from_le_bytes(b.get(..4)?.try_into().ok()?)),
        ('U', 1) => f64::from(*b.first()?),
        ('U', 2) => f64::from(u16::from_le_bytes(b.get(..2)?.try_into().ok()?)),
        ('U', 4) => f64::from(u32::from_le_bytes(b.get(..4)?.try_into().ok()?)),
        _ => return None,
    })
}
