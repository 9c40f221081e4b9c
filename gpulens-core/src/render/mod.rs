//! # Rendering
//!
//! Turns analysis results into Chart.js chart configs, HTML tables and the
//! single dashboard page served by the HTTP server.

pub mod components;
pub mod page;
pub mod renderer;

pub use components::{ChartDataset, ChartSpec, HISTOGRAM_COLOR, TableSpec};
pub use page::{PageContext, render_dashboard_page};
pub use renderer::{chart_config, escape_html, render_chart_config, render_table_html};
