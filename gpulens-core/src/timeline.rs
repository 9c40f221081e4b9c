//! Timeline composer for the utilization overview chart.

use crate::error::StatsError;
use crate::table::Table;
use serde::{Deserialize, Serialize};

/// Elapsed-time column shared by every series.
pub const TIME_COLUMN: &str = "Time (s)";

/// A series the overview chart tracks: `(column, display name, color, initially hidden)`.
const TRACKED_SERIES: [(&str, &str, &str, bool); 6] = [
    ("CPU (%)", "CPU (%)", "#4379BD", false),
    ("Mem (%)", "Memory (%)", "#F4B324", false),
    ("GPU0 (%)", "GPU0 (%)", "#F36D21", false),
    ("GPU0 Mem (%)", "GPU0 Memory (%)", "#3ABFEF", false),
    ("GPU0 Encode (%)", "GPU0 Encode (%)", "#6560AB", true),
    ("GPU0 Decode (%)", "GPU0 Decode (%)", "#76787A", true),
];

/// One line of the overview chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineSeries {
    pub column: String,
    pub name: String,
    pub color: String,
    /// Display default only; the data is always present.
    pub hidden: bool,
    /// `(time, value)` pairs in row order.
    pub points: Vec<(f64, f64)>,
}

/// Multi-series line chart description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineSpec {
    pub series: Vec<TimelineSeries>,
    /// Largest observed elapsed time, in whole seconds.
    pub duration_secs: u64,
    /// `"Duration 01:02:03 (h/m/s)"`
    pub duration_label: String,
    /// Tracked columns absent from the table.
    pub missing: Vec<String>,
}

/// Build the overview timeline from the full table.
pub fn compose_timeline(table: &Table) -> Result<TimelineSpec, StatsError> {
    let time = table
        .column(TIME_COLUMN)
        .ok_or_else(|| StatsError::ColumnNotFound {
            column: TIME_COLUMN.to_string(),
        })?;
    let max_time = time
        .iter()
        .flatten()
        .copied()
        .reduce(f64::max)
        .ok_or_else(|| StatsError::EmptyDataset {
            column: TIME_COLUMN.to_string(),
        })?;

    let mut series = Vec::with_capacity(TRACKED_SERIES.len());
    let mut missing = Vec::new();
    for (column, name, color, hidden) in TRACKED_SERIES {
        let Some(values) = table.column(column) else {
            tracing::warn!(column, "Timeline column missing, skipping series");
            missing.push(column.to_string());
            continue;
        };
        let points = time
            .iter()
            .zip(values)
            .filter_map(|(t, v)| Some(((*t)?, (*v)?)))
            .collect();
        series.push(TimelineSeries {
            column: column.to_string(),
            name: name.to_string(),
            color: color.to_string(),
            hidden,
            points,
        });
    }

    // Truncates toward zero; negative or non-finite times count as zero.
    let duration_secs = if max_time.is_finite() && max_time > 0.0 {
        max_time as u64
    } else {
        0
    };

    Ok(TimelineSpec {
        series,
        duration_secs,
        duration_label: format!("Duration {} (h/m/s)", format_hms(duration_secs)),
        missing,
    })
}

/// Zero-padded `HH:MM:SS`; hours keep counting past 24.
pub fn format_hms(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
