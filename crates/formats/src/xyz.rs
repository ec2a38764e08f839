//! Plain-text `.xyz` point files: one `x y z` triple per line.

use foundation::math::Vec3;

/// Result of parsing an `.xyz` payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XyzParse {
    /// Valid points in file order.
    pub points: Vec<Vec3>,
    /// 1-based line numbers of non-blank lines that were dropped.
    pub skipped_lines: Vec<usize>,
}

impl XyzParse {
    pub fn skipped(&self) -> usize {
        self.skipped_lines.len()
    }
}

/// Parses whitespace-separated triples.
///
/// A line is kept only if it holds exactly three tokens that all parse as
/// finite floats. Blank lines are ignored; every other rejected line is
/// reported in `skipped_lines` instead of failing the whole file.
pub fn parse_xyz(text: &str) -> XyzParse {
    let mut out = XyzParse::default();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_triple(line) {
            Some(p) => out.points.push(p),
            None => out.skipped_lines.push(index + 1),
        }
    }
    out
}

fn parse_triple(line: &str) -> Option<Vec3> {
    let mut values = [0.0f64; 3];
    let mut n = 0;
    for token in line.split_whitespace() {
        if n == 3 {
            return None;
        }
        let v: f64 = token.parse().ok()?;
        if !v.is_finite() {
            return None;
        }
        values[n] = v;
        n += 1;
    }
    (n == 3).then(|| Vec3::from_array(values))
}
