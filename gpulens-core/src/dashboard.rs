//! Dashboard assembly and the per-user session state.
//!
//! A [`Session`] is either waiting for an upload or holds one loaded table.
//! [`build_dashboard`] computes every section independently so that a
//! missing column only fails the tables that need it.

use crate::error::{LoadError, StatsError};
use crate::histogram::{HistogramResult, histogram};
use crate::metrics::{MetricKind, MetricSpec, SECOND_GPU_COLUMN};
use crate::summary::{Percentile, SummaryResult, round_half_even};
use crate::table::{LoadReport, Table, load_with_report};
use crate::timeline::{TimelineSpec, compose_timeline};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Warning shown when the export contains more than one GPU.
pub const MULTI_GPU_WARNING: &str = "More than 1 GPU detected. Only the first GPU (GPU0) is analysed.";

/// A parsed upload held read-only for the session.
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub id: Uuid,
    pub name: String,
    pub loaded_at: DateTime<Utc>,
    pub table: Arc<Table>,
    pub report: LoadReport,
}

impl LoadedDataset {
    /// Parse an upload. Fails only when the bytes are not delimited text.
    pub fn from_bytes(name: impl Into<String>, raw: &[u8]) -> Result<Self, LoadError> {
        let (table, report) = load_with_report(raw)?;
        Ok(Self {
            id: Uuid::new_v4(),
            name: name.into(),
            loaded_at: Utc::now(),
            table: Arc::new(table),
            report,
        })
    }
}

/// Session state: no upload yet, or one loaded dataset.
#[derive(Debug, Clone, Default)]
pub enum Session {
    #[default]
    NoData,
    Loaded(LoadedDataset),
}

impl Session {
    /// Replace whatever was loaded with `dataset`.
    pub fn replace(&mut self, dataset: LoadedDataset) {
        tracing::info!(id = %dataset.id, name = %dataset.name, "Session dataset replaced");
        *self = Session::Loaded(dataset);
    }

    pub fn clear(&mut self) {
        *self = Session::NoData;
    }

    pub fn dataset(&self) -> Option<&LoadedDataset> {
        match self {
            Session::NoData => None,
            Session::Loaded(dataset) => Some(dataset),
        }
    }
}

/// Result of one independently failable computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome<T> {
    Ready(T),
    Failed { message: String },
}

impl<T> Outcome<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Outcome::Ready(value) => Some(value),
            Outcome::Failed { .. } => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Outcome::Ready(_))
    }
}

impl<T> From<Result<T, StatsError>> for Outcome<T> {
    fn from(result: Result<T, StatsError>) -> Self {
        match result {
            Ok(value) => Outcome::Ready(value),
            Err(e) => Outcome::Failed {
                message: e.to_string(),
            },
        }
    }
}

/// One metric's histogram, summary tables and optional capacity line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionReport {
    pub metric: MetricKind,
    pub title: String,
    pub heading: String,
    pub histogram: HistogramResult,
    /// Percent table first, then the absolute (MB/GB) table if the metric has one.
    pub tables: Vec<Outcome<SummaryResult>>,
    /// e.g. `"Total Memory Available: 16384 MB / 16 GB"`.
    pub capacity: Option<String>,
}

/// Everything the presentation layer needs for one table and percentile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub percentile: Percentile,
    pub rows: usize,
    pub timeline: Outcome<TimelineSpec>,
    pub sections: Vec<SectionReport>,
    pub warnings: Vec<String>,
}

/// Compute the full dashboard for `table`.
pub fn build_dashboard(table: &Table, percentile: Percentile) -> Dashboard {
    let mut warnings = Vec::new();
    if table.has_column(SECOND_GPU_COLUMN) {
        tracing::warn!("Multiple GPUs detected; only GPU0 is analysed");
        warnings.push(MULTI_GPU_WARNING.to_string());
    }

    let sections = MetricKind::ALL
        .into_iter()
        .map(|kind| build_section(table, kind.spec(), percentile))
        .collect();

    Dashboard {
        percentile,
        rows: table.row_count(),
        timeline: compose_timeline(table).into(),
        sections,
        warnings,
    }
}

/// Compute one section.
pub fn build_section(table: &Table, spec: &MetricSpec, percentile: Percentile) -> SectionReport {
    let mut tables: Vec<Outcome<SummaryResult>> = vec![
        spec.percent_summarizer()
            .summarize(table, spec.percent_column, percentile)
            .into(),
    ];
    if let Some((summarizer, column)) = spec.absolute_summarizer() {
        tables.push(summarizer.summarize(table, column, percentile).into());
    }

    let capacity = spec
        .absolute
        .as_ref()
        .and_then(|abs| capacity_line(table, abs.total, abs.capacity_label));

    let failed = tables.iter().filter(|t| !t.is_ready()).count();
    tracing::debug!(metric = ?spec.kind, failed, "Built dashboard section");

    SectionReport {
        metric: spec.kind,
        title: spec.title.to_string(),
        heading: spec.heading.to_string(),
        histogram: histogram(table, spec.percent_column),
        tables,
        capacity,
    }
}

/// `"{label}: {mean} MB / {mean / 1024} GB"` from the average of a total-capacity column.
pub fn capacity_line(table: &Table, column: &str, label: &str) -> Option<String> {
    let values = table.values(column)?;
    if values.is_empty() {
        return None;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    Some(format!(
        "{label}: {} MB / {} GB",
        round_half_even(mean),
        round_half_even(mean / 1024.0)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn profiler_csv() -> &'static str {
        "Time (s),CPU (%),Mem (%),Mem Total (MB),Mem Used (MB),GPU0 (%),GPU0 Mem (%),GPU0 Mem Total (MB),GPU0 Mem Used (MB),GPU0 Encode (%),GPU0 Decode (%)\n\
         0,10,50,16384,8192,20,25,8192,2048,0,0\n\
         1,20,50,16384,8192,40,25,8192,2048,0,5\n\
         2,30,50,16384,8192,60,25,8192,2048,10,5\n\
         3,40,50,16384,8192,80,25,8192,2048,10,0\n"
    }

    fn loaded_table() -> Table {
        crate::table::load(profiler_csv().as_bytes()).unwrap()
    }

    #[test]
    fn test_dashboard_has_all_sections() {
        let dash = build_dashboard(&loaded_table(), Percentile::DEFAULT);
        let kinds: Vec<MetricKind> = dash.sections.iter().map(|s| s.metric).collect();
        assert_eq!(kinds, MetricKind::ALL.to_vec());
        assert_eq!(dash.rows, 4);
        assert!(dash.timeline.is_ready());
        assert!(dash.warnings.is_empty());
    }

    #[test]
    fn test_memory_section_has_two_tables_and_capacity() {
        let dash = build_dashboard(&loaded_table(), Percentile::DEFAULT);
        let memory = &dash.sections[1];
        assert_eq!(memory.tables.len(), 2);
        let absolute = memory.tables[1].ready().unwrap();
        assert_eq!(absolute.value(0), Some("8192 MB / ~8 GB"));
        assert_eq!(absolute.rows[0].label, "Memory Min:");
        assert_eq!(
            memory.capacity.as_deref(),
            Some("Total Memory Available: 16384 MB / 16 GB")
        );

        let gpu_mem = &dash.sections[3];
        assert_eq!(
            gpu_mem.capacity.as_deref(),
            Some("Total GPU0 Memory Available: 8192 MB / 8 GB")
        );
    }

    #[test]
    fn test_missing_column_only_fails_its_section() {
        let table = Table::from_columns(vec![
            ("Time (s)", vec![0.0, 1.0]),
            ("CPU (%)", vec![10.0, 30.0]),
        ]);
        let dash = build_dashboard(&table, Percentile::DEFAULT);
        assert!(dash.sections[0].tables[0].is_ready());
        match &dash.sections[2].tables[0] {
            Outcome::Failed { message } => assert_eq!(message, "Column not found: GPU0 (%)"),
            Outcome::Ready(_) => panic!("Expected failure for missing GPU0 column"),
        }
        assert!(dash.sections[1].capacity.is_none());
        assert!(dash.sections[2].histogram.is_empty());
    }

    #[test]
    fn test_multi_gpu_warning() {
        let table = Table::from_columns(vec![
            ("Time (s)", vec![0.0]),
            ("GPU0 (%)", vec![10.0]),
            ("GPU1 (%)", vec![20.0]),
        ]);
        let dash = build_dashboard(&table, Percentile::DEFAULT);
        assert_eq!(dash.warnings, vec![MULTI_GPU_WARNING.to_string()]);
    }

    #[test]
    fn test_empty_table_fails_tables_not_dashboard() {
        let table = Table::empty(&["Time (s)", "CPU (%)"]);
        let dash = build_dashboard(&table, Percentile::DEFAULT);
        assert!(!dash.timeline.is_ready());
        assert!(matches!(
            &dash.sections[0].tables[0],
            Outcome::Failed { message } if message.starts_with("No samples")
        ));
        assert_eq!(dash.sections[0].histogram.total(), 0.0);
    }

    #[test]
    fn test_session_lifecycle() {
        let mut session = Session::default();
        assert!(session.dataset().is_none());

        let dataset = LoadedDataset::from_bytes("run.csv", profiler_csv().as_bytes()).unwrap();
        let id = dataset.id;
        session.replace(dataset);
        assert_eq!(session.dataset().unwrap().id, id);
        assert_eq!(session.dataset().unwrap().report.rows_kept, 4);

        let next = LoadedDataset::from_bytes("other.csv", b"Time (s)\n1\n").unwrap();
        session.replace(next);
        assert_ne!(session.dataset().unwrap().id, id);
        assert_eq!(session.dataset().unwrap().name, "other.csv");

        session.clear();
        assert!(matches!(session, Session::NoData));
    }

    #[test]
    fn test_dataset_load_error() {
        assert!(LoadedDataset::from_bytes("empty.csv", b"").is_err());
    }

    #[test]
    fn test_outcome_serialization() {
        let failed: Outcome<SummaryResult> = Outcome::Failed {
            message: "boom".into(),
        };
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["message"], "boom");
    }

    #[test]
    fn test_dashboard_is_deterministic() {
        let table = loaded_table();
        let p = Percentile::new(90).unwrap();
        assert_eq!(build_dashboard(&table, p), build_dashboard(&table, p));
    }
}
