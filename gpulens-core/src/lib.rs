//! # gpulens Core
//!
//! Core library for the gpulens GPU profiler analysis dashboard.
//! Loads profiler CSV exports, computes per-metric histograms and summary
//! statistics, composes the utilization timeline, and serves the dashboard.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod histogram;
pub mod metrics;
pub mod render;
pub mod server;
pub mod summary;
pub mod table;
pub mod timeline;

// Re-export commonly used types at the crate root.
pub use config::{GpulensConfig, load_config};
pub use dashboard::{Dashboard, LoadedDataset, Outcome, SectionReport, Session, build_dashboard};
pub use error::{ConfigError, GpulensError, LoadError, Result, StatsError};
pub use histogram::{HistogramBin, HistogramResult, histogram};
pub use metrics::{MetricKind, MetricSpec};
pub use server::{AppState, SharedState, dashboard_router, run_dashboard};
pub use summary::{
    Percentile, Summarizer, SummaryResult, SummaryRow, SummaryStats, UnitConversion, UnitMode,
    summarize, summarize_with_unit_conversion,
};
pub use table::{LoadReport, Table, load, load_with_report};
pub use timeline::{TimelineSeries, TimelineSpec, compose_timeline};
