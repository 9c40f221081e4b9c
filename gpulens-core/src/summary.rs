//! Metric summarizer: the five-statistic table shown beside each histogram.
//!
//! One [`Summarizer`] policy covers every metric. It is parameterized by the
//! display label and a [`UnitMode`]: plain percentages, or an absolute unit
//! with a derived secondary unit (MB shown alongside GB).

use crate::error::StatsError;
use crate::table::Table;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A percentile in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Percentile(u8);

impl Percentile {
    pub const MEDIAN: Self = Self(50);
    pub const DEFAULT: Self = Self(95);

    pub fn new(value: i64) -> Result<Self, StatsError> {
        u8::try_from(value)
            .ok()
            .filter(|v| *v <= 100)
            .map(Self)
            .ok_or(StatsError::PercentileRange { value })
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// The percentile as a quantile in `[0, 1]`.
    pub fn quantile(self) -> f64 {
        f64::from(self.0) / 100.0
    }
}

impl Default for Percentile {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<i64> for Percentile {
    type Error = StatsError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Percentile> for u8 {
    fn from(p: Percentile) -> Self {
        p.0
    }
}

impl fmt::Display for Percentile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Linear interpolation between closest ranks over an ascending slice.
///
/// `rank = q * (n - 1)`; the fractional part blends the two neighbours.
/// Returns `None` for an empty slice.
pub fn percentile_of_sorted(sorted: &[f64], quantile: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let rank = quantile * last as f64;
    let lo = (rank.floor() as usize).min(last);
    let hi = (lo + 1).min(last);
    let t = rank - lo as f64;
    Some(lerp(sorted[lo], sorted[hi], t))
}

/// Interpolate from the nearer end so `t = 0` and `t = 1` return the endpoints exactly.
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    let diff = b - a;
    if t >= 0.5 {
        b - diff * (1.0 - t)
    } else {
        a + diff * t
    }
}

/// Unrounded descriptive statistics of one column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub count: usize,
    pub min: f64,
    pub median: f64,
    pub mean: f64,
    /// Value at the requested percentile.
    pub percentile: f64,
    pub max: f64,
}

impl SummaryStats {
    /// Describe the finite entries of `values`; `None` when there are none.
    pub fn describe(values: &[f64], percentile: Percentile) -> Option<Self> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);
        let count = sorted.len();
        Some(Self {
            count,
            min: sorted[0],
            median: percentile_of_sorted(&sorted, Percentile::MEDIAN.quantile())?,
            mean: sorted.iter().sum::<f64>() / count as f64,
            percentile: percentile_of_sorted(&sorted, percentile.quantile())?,
            max: sorted[count - 1],
        })
    }
}

/// Conversion from a primary absolute unit to a coarser secondary one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitConversion {
    pub divisor: f64,
    pub primary: String,
    pub secondary: String,
}

impl UnitConversion {
    pub fn new(divisor: f64, primary: impl Into<String>, secondary: impl Into<String>) -> Self {
        Self {
            divisor,
            primary: primary.into(),
            secondary: secondary.into(),
        }
    }

    pub fn megabytes_to_gigabytes() -> Self {
        Self::new(1024.0, "MB", "GB")
    }

    /// `"2048 MB / ~2 GB"`
    fn format(&self, raw: f64) -> String {
        format!(
            "{} {} / ~{} {}",
            round_half_even(raw),
            self.primary,
            round_half_even(raw / self.divisor),
            self.secondary
        )
    }
}

/// How summary values are rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum UnitMode {
    Percent,
    Converted(UnitConversion),
}

impl UnitMode {
    fn format(&self, raw: f64) -> String {
        match self {
            UnitMode::Percent => format!("{} %", round_half_even(raw)),
            UnitMode::Converted(conversion) => conversion.format(raw),
        }
    }
}

/// One `(label, value)` line of a summary table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub label: String,
    pub value: String,
}

/// A rendered five-statistic summary of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub column: String,
    pub percentile: Percentile,
    pub unit: UnitMode,
    pub stats: SummaryStats,
    /// Min, Median, Average, Pn, Max, in that order.
    pub rows: Vec<SummaryRow>,
}

impl SummaryResult {
    /// Value text of the row at `idx` (0 = Min .. 4 = Max).
    pub fn value(&self, idx: usize) -> Option<&str> {
        self.rows.get(idx).map(|r| r.value.as_str())
    }
}

/// Summary policy for one metric.
#[derive(Debug, Clone, PartialEq)]
pub struct Summarizer {
    label: String,
    unit: UnitMode,
}

impl Summarizer {
    /// Percent-valued metric, e.g. `Summarizer::percent("CPU")`.
    pub fn percent(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            unit: UnitMode::Percent,
        }
    }

    /// Absolute-valued metric shown in two units.
    pub fn converted(label: impl Into<String>, conversion: UnitConversion) -> Self {
        Self {
            label: label.into(),
            unit: UnitMode::Converted(conversion),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn unit(&self) -> &UnitMode {
        &self.unit
    }

    pub fn summarize(
        &self,
        table: &Table,
        column: &str,
        percentile: Percentile,
    ) -> Result<SummaryResult, StatsError> {
        let values = table
            .values(column)
            .ok_or_else(|| StatsError::ColumnNotFound {
                column: column.to_string(),
            })?;
        let stats =
            SummaryStats::describe(&values, percentile).ok_or_else(|| StatsError::EmptyDataset {
                column: column.to_string(),
            })?;

        let label = &self.label;
        let rows = [
            (format!("{label} Min:"), stats.min),
            (format!("{label} Median:"), stats.median),
            (format!("{label} Average:"), stats.mean),
            (format!("{label} {percentile}th Percentile:"), stats.percentile),
            (format!("{label} Max:"), stats.max),
        ]
        .into_iter()
        .map(|(label, raw)| SummaryRow {
            label,
            value: self.unit.format(raw),
        })
        .collect();

        tracing::debug!(column, %percentile, count = stats.count, "Summarized column");

        Ok(SummaryResult {
            column: column.to_string(),
            percentile,
            unit: self.unit.clone(),
            stats,
            rows,
        })
    }
}

/// Summarize a percent-valued column, labelling rows after the column name.
pub fn summarize(
    table: &Table,
    column: &str,
    percentile: Percentile,
) -> Result<SummaryResult, StatsError> {
    Summarizer::percent(metric_label(column)).summarize(table, column, percentile)
}

/// Summarize an absolute-valued column, showing `value / divisor` in the secondary unit.
pub fn summarize_with_unit_conversion(
    table: &Table,
    column: &str,
    percentile: Percentile,
    divisor: f64,
    unit_labels: (&str, &str),
) -> Result<SummaryResult, StatsError> {
    let (primary, secondary) = unit_labels;
    Summarizer::converted(
        metric_label(column),
        UnitConversion::new(divisor, primary, secondary),
    )
    .summarize(table, column, percentile)
}

/// Column name without its trailing unit: `"GPU0 Mem Used (MB)"` -> `"GPU0 Mem Used"`.
pub fn metric_label(column: &str) -> &str {
    match column.rfind(" (") {
        Some(idx) if column.ends_with(')') => &column[..idx],
        _ => column,
    }
}

/// Round to the nearest integer, ties to even (98.5 -> 98, 99.5 -> 100).
pub fn round_half_even(value: f64) -> i64 {
    value.round_ties_even() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cpu_table() -> Table {
        Table::from_columns(vec![(
            "CPU (%)",
            vec![10.0, 20.0, 30.0, 40.0, 50.0, 95.0, 100.0],
        )])
    }

    fn p(value: i64) -> Percentile {
        Percentile::new(value).unwrap()
    }

    #[test]
    fn test_percentile_bounds() {
        assert_eq!(p(0).get(), 0);
        assert_eq!(p(100).get(), 100);
        assert_eq!(
            Percentile::new(101),
            Err(StatsError::PercentileRange { value: 101 })
        );
        assert_eq!(
            Percentile::new(-1),
            Err(StatsError::PercentileRange { value: -1 })
        );
        assert_eq!(Percentile::default(), Percentile::DEFAULT);
    }

    #[test]
    fn test_percentile_serde() {
        let parsed: Percentile = serde_json::from_str("90").unwrap();
        assert_eq!(parsed.get(), 90);
        assert!(serde_json::from_str::<Percentile>("150").is_err());
        assert_eq!(serde_json::to_string(&p(42)).unwrap(), "42");
    }

    #[test]
    fn test_percentile_of_sorted_linear() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile_of_sorted(&sorted, 0.0), Some(1.0));
        assert_eq!(percentile_of_sorted(&sorted, 0.5), Some(3.0));
        assert_eq!(percentile_of_sorted(&sorted, 1.0), Some(5.0));
        assert!((percentile_of_sorted(&sorted, 0.9).unwrap() - 4.6).abs() < 1e-12);
        assert_eq!(percentile_of_sorted(&[7.0], 0.3), Some(7.0));
        assert_eq!(percentile_of_sorted(&[], 0.5), None);
    }

    #[test]
    fn test_even_count_median() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile_of_sorted(&sorted, 0.5), Some(2.5));
    }

    #[test]
    fn test_cpu_scenario_p95() {
        let result = summarize(&cpu_table(), "CPU (%)", p(95)).unwrap();
        let rows: Vec<(&str, &str)> = result
            .rows
            .iter()
            .map(|r| (r.label.as_str(), r.value.as_str()))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("CPU Min:", "10 %"),
                ("CPU Median:", "40 %"),
                ("CPU Average:", "49 %"),
                ("CPU 95th Percentile:", "98 %"),
                ("CPU Max:", "100 %"),
            ]
        );
        assert!((result.stats.percentile - 98.5).abs() < 1e-9);
        assert_eq!(result.stats.count, 7);
    }

    #[test]
    fn test_unit_conversion() {
        let table = Table::from_columns(vec![("Mem Used (MB)", vec![1024.0, 2048.0, 3072.0])]);
        let result =
            summarize_with_unit_conversion(&table, "Mem Used (MB)", p(95), 1024.0, ("MB", "GB"))
                .unwrap();
        assert_eq!(result.value(0), Some("1024 MB / ~1 GB"));
        assert_eq!(result.value(1), Some("2048 MB / ~2 GB"));
        assert_eq!(result.value(2), Some("2048 MB / ~2 GB"));
        assert_eq!(result.value(3), Some("2970 MB / ~3 GB"));
        assert_eq!(result.value(4), Some("3072 MB / ~3 GB"));
        assert_eq!(result.rows[0].label, "Mem Used Min:");
    }

    #[test]
    fn test_secondary_unit_uses_unrounded_value() {
        // 1535.6 MB rounds to 1536 MB, but 1535.6 / 1024 = 1.4996 rounds to 1 GB.
        let table = Table::from_columns(vec![("x (MB)", vec![1535.6])]);
        let result = Summarizer::converted("X", UnitConversion::megabytes_to_gigabytes())
            .summarize(&table, "x (MB)", p(50))
            .unwrap();
        assert_eq!(result.value(0), Some("1536 MB / ~1 GB"));
    }

    #[test]
    fn test_rounding_ties_to_even() {
        assert_eq!(round_half_even(98.5), 98);
        assert_eq!(round_half_even(99.5), 100);
        assert_eq!(round_half_even(2.5), 2);
        assert_eq!(round_half_even(2.51), 3);
        assert_eq!(round_half_even(-0.4), 0);
    }

    #[test]
    fn test_custom_label() {
        let result = Summarizer::percent("GPU0 Memory")
            .summarize(
                &Table::from_columns(vec![("GPU0 Mem (%)", vec![5.0])]),
                "GPU0 Mem (%)",
                p(90),
            )
            .unwrap();
        assert_eq!(result.rows[3].label, "GPU0 Memory 90th Percentile:");
        assert_eq!(result.rows[2].label, "GPU0 Memory Average:");
    }

    #[test]
    fn test_missing_column() {
        let err = summarize(&cpu_table(), "GPU0 (%)", p(95)).unwrap_err();
        assert_eq!(
            err,
            StatsError::ColumnNotFound {
                column: "GPU0 (%)".into()
            }
        );
    }

    #[test]
    fn test_empty_table() {
        let err = summarize(&Table::empty(&["CPU (%)"]), "CPU (%)", p(95)).unwrap_err();
        assert_eq!(
            err,
            StatsError::EmptyDataset {
                column: "CPU (%)".into()
            }
        );
    }

    #[test]
    fn test_missing_cells_are_skipped() {
        let table = crate::table::load(b"CPU (%)\n10\n\n30\n,\n").unwrap();
        let result = summarize(&table, "CPU (%)", p(50)).unwrap();
        assert_eq!(result.stats.count, 2);
        assert_eq!(result.value(1), Some("20 %"));
    }

    #[test]
    fn test_infinite_cells_do_not_reach_summary() {
        let table = crate::table::load(b"CPU (%)\ninf\n-inf\n10\n").unwrap();
        let result = summarize(&table, "CPU (%)", p(95)).unwrap();
        assert_eq!(result.stats.count, 1);
        for row in &result.rows {
            assert_eq!(row.value, "10 %");
        }

        let table = crate::table::load(b"Mem Used (MB)\n1e400\n2048\n").unwrap();
        let result =
            summarize_with_unit_conversion(&table, "Mem Used (MB)", p(95), 1024.0, ("MB", "GB"))
                .unwrap();
        assert_eq!(result.value(1), Some("2048 MB / ~2 GB"));
        assert_eq!(result.value(2), Some("2048 MB / ~2 GB"));
    }

    #[test]
    fn test_describe_ignores_non_finite_values() {
        let stats =
            SummaryStats::describe(&[f64::INFINITY, 20.0, f64::NEG_INFINITY, 40.0, f64::NAN], p(50))
                .unwrap();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.min, 20.0);
        assert_eq!(stats.median, 30.0);
        assert_eq!(stats.max, 40.0);
        assert!(SummaryStats::describe(&[f64::INFINITY], p(50)).is_none());

        let table = Table::from_columns(vec![("CPU (%)", vec![f64::INFINITY])]);
        assert_eq!(
            summarize(&table, "CPU (%)", p(95)).unwrap_err(),
            StatsError::EmptyDataset {
                column: "CPU (%)".into()
            }
        );
    }

    #[test]
    fn test_median_matches_p50() {
        let result = summarize(&cpu_table(), "CPU (%)", Percentile::MEDIAN).unwrap();
        assert_eq!(result.stats.median, result.stats.percentile);
        assert_eq!(result.rows[1].value, result.rows[3].value);
    }

    #[test]
    fn test_metric_label() {
        assert_eq!(metric_label("CPU (%)"), "CPU");
        assert_eq!(metric_label("GPU0 Mem Used (MB)"), "GPU0 Mem Used");
        assert_eq!(metric_label("Time"), "Time");
    }
}
