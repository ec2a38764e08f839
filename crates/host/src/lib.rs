//! Rendering-surface boundary.
//!
//! A host owns one long-lived surface (a 3D scene or a slippy map), accepts
//! presentation frames, and redraws on demand. The concrete graphics and map
//! libraries sit behind [`RenderHost`]; the headless hosts here track exactly
//! what would be drawn so the rest of the application can be exercised
//! without a display.

pub mod camera;
pub mod map;
pub mod scene;

pub use camera::*;
pub use map::*;
pub use scene::*;

use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("host used before initialize()")]
    NotInitialized,
    #[error("viewport {width}x{height} has no area")]
    ZeroSizedViewport { width: u32, height: u32 },
}

/// Container size in CSS pixels.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f64 {
        self.width as f64 / self.height.max(1) as f64
    }

    pub(crate) fn validate(self) -> Result<Self, HostError> {
        if self.width == 0 || self.height == 0 {
            return Err(HostError::ZeroSizedViewport {
                width: self.width,
                height: self.height,
            });
        }
        Ok(self)
    }
}

/// Counters a host keeps about its own draws.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderStats {
    pub renders: u64,
    pub last_drawn: usize,
    pub last_hidden: usize,
}

pub trait RenderHost {
    type Data;

    /// Creates the surface. A second call on a live host is a no-op.
    fn initialize(&mut self, viewport: Viewport) -> Result<(), HostError>;

    /// Replaces whatever the host was showing.
    fn set_data(&mut self, data: Self::Data);

    /// Recomputes projection for a new container size.
    fn resize(&mut self, viewport: Viewport) -> Result<(), HostError>;

    fn render(&mut self) -> Result<RenderStats, HostError>;

    /// Releases the surface; the host may be initialized again afterwards.
    fn dispose(&mut self);

    fn is_initialized(&self) -> bool;
}
