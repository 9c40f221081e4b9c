//! Chart and table specifications for the dashboard page.
//!
//! Built from the analysis results; the renderer turns them into Chart.js
//! configs and HTML tables.

use crate::histogram::HistogramResult;
use crate::summary::SummaryResult;
use crate::timeline::TimelineSpec;
use serde::{Deserialize, Serialize};

/// Bar color of every histogram.
pub const HISTOGRAM_COLOR: &str = "#034EA2";

/// Chart specification (rendered via Chart.js).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartSpec {
    /// Chart type: "line" or "bar".
    pub chart_type: String,
    /// Category labels (x-axis) for bar charts. Empty for x/y line charts.
    #[serde(default)]
    pub labels: Vec<String>,
    pub datasets: Vec<ChartDataset>,
    #[serde(default)]
    pub x_title: Option<String>,
    #[serde(default)]
    pub y_title: Option<String>,
    /// Fixed y-axis range, e.g. `(0, 100)` for percentages.
    #[serde(default)]
    pub y_range: Option<(f64, f64)>,
}

/// A single dataset in a chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartDataset {
    pub label: String,
    /// Values aligned with `ChartSpec::labels`.
    #[serde(default)]
    pub data: Vec<f64>,
    /// `(x, y)` points for line charts over a numeric axis.
    #[serde(default)]
    pub points: Vec<(f64, f64)>,
    #[serde(default)]
    pub color: Option<String>,
    /// Text drawn above each bar; empty strings draw nothing.
    #[serde(default)]
    pub bar_labels: Vec<String>,
    /// Start with the dataset toggled off in the legend.
    #[serde(default)]
    pub hidden: bool,
}

impl ChartSpec {
    /// Bar chart of a histogram; y reads as percent of samples.
    pub fn from_histogram(hist: &HistogramResult) -> Self {
        Self {
            chart_type: "bar".into(),
            labels: hist.bins.iter().map(|b| b.center.to_string()).collect(),
            datasets: vec![ChartDataset {
                label: hist.column.clone(),
                data: hist.bins.iter().map(|b| b.value).collect(),
                points: Vec::new(),
                color: Some(HISTOGRAM_COLOR.into()),
                bar_labels: hist
                    .bins
                    .iter()
                    .map(|b| b.label.clone().unwrap_or_default())
                    .collect(),
                hidden: false,
            }],
            x_title: Some(hist.column.clone()),
            y_title: Some("Probability (%)".into()),
            y_range: Some((0.0, 100.0)),
        }
    }

    /// Multi-series line chart of the utilization timeline.
    pub fn from_timeline(timeline: &TimelineSpec) -> Self {
        Self {
            chart_type: "line".into(),
            labels: Vec::new(),
            datasets: timeline
                .series
                .iter()
                .map(|s| ChartDataset {
                    label: s.name.clone(),
                    data: Vec::new(),
                    points: s.points.clone(),
                    color: Some(s.color.clone()),
                    bar_labels: Vec::new(),
                    hidden: s.hidden,
                })
                .collect(),
            x_title: Some(timeline.duration_label.clone()),
            y_title: None,
            y_range: None,
        }
    }
}

/// Table specification (plain HTML table).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSpec {
    /// Column headers.
    pub headers: Vec<String>,
    /// Row data (each row is a vec of cell values).
    pub rows: Vec<Vec<String>>,
}

impl TableSpec {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Two-column `Analysis | Value` table of a summary.
    pub fn from_summary(summary: &SummaryResult) -> Self {
        Self::new(
            vec!["Analysis".into(), "Value".into()],
            summary
                .rows
                .iter()
                .map(|r| vec![r.label.clone(), r.value.clone()])
                .collect(),
        )
    }
}
