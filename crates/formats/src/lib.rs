pub mod geojson;
pub mod ingest;
pub mod pcd;
pub mod xyz;

pub use geojson::*;
pub use ingest::*;
pub use pcd::*;
pub use xyz::*;
