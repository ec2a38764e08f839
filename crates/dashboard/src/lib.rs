//! Dashboard shell: routes uploads to ingestion, keeps one dataset per kind,
//! drives the active view's host, and records a user-facing log.

pub mod config;
pub mod log;
pub mod shell;

pub use config::{ConfigError, DashboardConfig};
pub use log::{LogBook, LogEntry, LogLevel};
pub use shell::{Dashboard, DashboardError, FrameReport, View};
