//! Distribution binner for percentage metrics.
//!
//! Bins a column over the fixed domain `[0, 100]` in ten bins of width 10 and
//! reports each bin as the percentage of in-range samples it holds.

use crate::table::Table;
use serde::{Deserialize, Serialize};

/// Width of every bin.
pub const BIN_WIDTH: f64 = 10.0;
/// Number of bins covering `[0, 100]`.
pub const BIN_COUNT: usize = 10;
/// Bins whose displayed value is at or below this get no text label.
pub const LABEL_THRESHOLD: f64 = 0.9;

const DOMAIN_MIN: f64 = 0.0;
const DOMAIN_MAX: f64 = 100.0;

/// One histogram bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    /// Midpoint of the bin edges.
    pub center: f64,
    /// Percentage of in-range samples falling in this bin.
    pub value: f64,
    /// Text shown above the bar, e.g. `"12.5%"`.
    pub label: Option<String>,
}

/// A normalized histogram of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramResult {
    pub column: String,
    pub bins: Vec<HistogramBin>,
    /// Samples that fell inside `[0, 100]`.
    pub in_range: usize,
    /// Present samples outside `[0, 100]`.
    pub excluded: usize,
}

impl HistogramResult {
    /// Sum of displayed values; 100 whenever at least one sample is in range.
    pub fn total(&self) -> f64 {
        self.bins.iter().map(|b| b.value).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.in_range == 0
    }
}

/// Lower and upper edge of bin `idx`.
pub fn bin_edges(idx: usize) -> (f64, f64) {
    let lo = DOMAIN_MIN + idx as f64 * BIN_WIDTH;
    (lo, lo + BIN_WIDTH)
}

/// Compute the histogram of `column`.
///
/// An absent column, an empty table, or a column with no in-range samples
/// yields ten zero-valued bins.
pub fn histogram(table: &Table, column: &str) -> HistogramResult {
    let mut counts = [0usize; BIN_COUNT];
    let mut excluded = 0;

    for value in table.values(column).unwrap_or_default() {
        match bin_index(value) {
            Some(idx) => counts[idx] += 1,
            None => excluded += 1,
        }
    }

    let in_range: usize = counts.iter().sum();
    let bins = counts
        .iter()
        .enumerate()
        .map(|(idx, &count)| {
            let (lo, hi) = bin_edges(idx);
            let value = displayed_value(count, in_range);
            HistogramBin {
                center: 0.5 * (lo + hi),
                value,
                label: (value > LABEL_THRESHOLD).then(|| format_percent_label(value)),
            }
        })
        .collect();

    tracing::debug!(column, in_range, excluded, "Computed histogram");

    HistogramResult {
        column: column.to_string(),
        bins,
        in_range,
        excluded,
    }
}

/// Bin for `value`; the last bin is closed on the right.
fn bin_index(value: f64) -> Option<usize> {
    if !(DOMAIN_MIN..=DOMAIN_MAX).contains(&value) {
        return None;
    }
    let idx = ((value - DOMAIN_MIN) / BIN_WIDTH).floor() as usize;
    Some(idx.min(BIN_COUNT - 1))
}

/// Probability density scaled to percent-of-samples: `count / width / total * width * 100`.
fn displayed_value(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let density = count as f64 / BIN_WIDTH / total as f64;
    density * BIN_WIDTH * DOMAIN_MAX
}

/// Round to two decimals (half to even) and print with at least one fractional digit.
pub fn format_percent_label(value: f64) -> String {
    let rounded = (value * 100.0).round_ties_even() / 100.0;
    let mut text = rounded.to_string();
    if !text.contains('.') {
        text.push_str(".0");
    }
    text.push('%');
    text
}
