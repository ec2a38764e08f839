use foundation::bounds::Aabb3;
use foundation::color::Rgb;
use foundation::math::Vec3;
use serde::{Deserialize, Serialize};

use crate::PresentationError;

/// Endpoints of the height gradient.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorRange {
    pub low: Rgb,
    pub high: Rgb,
}

impl Default for ColorRange {
    fn default() -> Self {
        Self {
            low: Rgb::BLUE,
            high: Rgb::RED,
        }
    }
}

/// Inclusive altitude window; points outside are hidden, never removed.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct AltitudeFilter {
    pub min_altitude: f64,
    pub max_altitude: f64,
}

impl AltitudeFilter {
    /// Swaps the bounds if given out of order so `min <= max` always holds.
    pub fn new(min_altitude: f64, max_altitude: f64) -> Self {
        if min_altitude <= max_altitude {
            Self {
                min_altitude,
                max_altitude,
            }
        } else {
            Self {
                min_altitude: max_altitude,
                max_altitude: min_altitude,
            }
        }
    }

    /// Full Y range of `bounds`.
    pub fn spanning(bounds: &Aabb3) -> Self {
        Self::new(bounds.min.y, bounds.max.y)
    }

    pub fn contains(&self, y: f64) -> bool {
        y >= self.min_altitude && y <= self.max_altitude
    }
}

/// Translation to the origin followed by a uniform scale.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub translation: Vec3,
    pub scale: f64,
}

impl Placement {
    pub fn apply(&self, p: Vec3) -> Vec3 {
        (p + self.translation).scale(self.scale)
    }
}

pub fn compute_bounding_box(points: &[Vec3]) -> Result<Aabb3, PresentationError> {
    Aabb3::from_points(points).ok_or(PresentationError::EmptyInput)
}

/// `target_size / max(dx, dy, dz)`, failing on a zero-extent box.
pub fn uniform_scale(bounds: &Aabb3, target_size: f64) -> Result<f64, PresentationError> {
    bounds
        .uniform_scale_to(target_size)
        .ok_or(PresentationError::DegenerateGeometry)
}

/// Centers the bounding box on the origin and fits its largest extent to
/// `target_size`. A zero-extent cloud keeps `scale = 1`.
pub fn compute_centering_and_scale(
    points: &[Vec3],
    target_size: f64,
) -> Result<Placement, PresentationError> {
    let bounds = compute_bounding_box(points)?;
    let scale = match uniform_scale(&bounds, target_size) {
        Ok(s) => s,
        Err(err) => {
            tracing::debug!(%err, "falling back to unit scale");
            1.0
        }
    };
    Ok(Placement {
        translation: -bounds.center(),
        scale,
    })
}

/// Position of `y` within `[min_y, max_y]`, clamped to `[0, 1]`.
///
/// A flat range maps everything to 0.
pub fn height_fraction(y: f64, min_y: f64, max_y: f64) -> f32 {
    let span = max_y - min_y;
    if span <= 0.0 || !span.is_finite() {
        return 0.0;
    }
    (((y - min_y) / span) as f32).clamp(0.0, 1.0)
}

/// One gradient color per point, same order as `points`.
pub fn color_by_height(points: &[Vec3], range: &ColorRange) -> Vec<Rgb> {
    let Some(bounds) = Aabb3::from_points(points) else {
        return Vec::new();
    };
    points
        .iter()
        .map(|p| {
            let t = height_fraction(p.y, bounds.min.y, bounds.max.y);
            range.low.lerp(range.high, t)
        })
        .collect()
}

/// Visibility mask, same order as `points`.
pub fn apply_altitude_filter(points: &[Vec3], filter: &AltitudeFilter) -> Vec<bool> {
    points.iter().map(|p| filter.contains(p.y)).collect()
}
