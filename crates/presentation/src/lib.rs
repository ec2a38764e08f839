//! Pure presentation math for point clouds and GIS features.
//!
//! Nothing here touches a rendering surface: every function maps loaded data
//! plus user settings to plain values that a host can draw.

pub mod controls;
pub mod gis;
pub mod playback;
pub mod point_cloud;
pub mod popup;
pub mod viewer;

pub use controls::*;
pub use gis::*;
pub use playback::*;
pub use point_cloud::*;
pub use popup::*;
pub use viewer::*;

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PresentationError {
    #[error("point collection is empty")]
    EmptyInput,
    #[error("bounding box has zero extent")]
    DegenerateGeometry,
}
