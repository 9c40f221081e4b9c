//! Catalog of the metrics the dashboard analyzes.
//!
//! Every section is described by data here and computed by the same
//! histogram and summary code; nothing is special-cased per metric.

use crate::summary::{Summarizer, UnitConversion};
use serde::{Deserialize, Serialize};

/// Column whose presence signals a second GPU. Only GPU0 is analyzed.
pub const SECOND_GPU_COLUMN: &str = "GPU1 (%)";

/// The six analyzed metrics, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Cpu,
    Memory,
    Gpu0,
    Gpu0Memory,
    Gpu0Encode,
    Gpu0Decode,
}

impl MetricKind {
    pub const ALL: [MetricKind; 6] = [
        MetricKind::Cpu,
        MetricKind::Memory,
        MetricKind::Gpu0,
        MetricKind::Gpu0Memory,
        MetricKind::Gpu0Encode,
        MetricKind::Gpu0Decode,
    ];

    pub fn spec(self) -> &'static MetricSpec {
        match self {
            MetricKind::Cpu => &CATALOG[0],
            MetricKind::Memory => &CATALOG[1],
            MetricKind::Gpu0 => &CATALOG[2],
            MetricKind::Gpu0Memory => &CATALOG[3],
            MetricKind::Gpu0Encode => &CATALOG[4],
            MetricKind::Gpu0Decode => &CATALOG[5],
        }
    }
}

/// Absolute-valued companion columns of a memory metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbsoluteColumns {
    /// Used amount in MB, summarized with a GB secondary unit.
    pub used: &'static str,
    /// Total capacity in MB, shown as a single average line.
    pub total: &'static str,
    /// Prefix of the capacity line, e.g. `"Total Memory Available"`.
    pub capacity_label: &'static str,
}

/// Static description of one dashboard section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSpec {
    pub kind: MetricKind,
    /// Expander title, e.g. `"CPU Details"`.
    pub title: &'static str,
    /// Heading inside the section, e.g. `"CPU Analysis"`.
    pub heading: &'static str,
    /// Prefix of every summary row label.
    pub label: &'static str,
    /// Percentage column used for the histogram and the first table.
    pub percent_column: &'static str,
    pub absolute: Option<AbsoluteColumns>,
}

impl MetricSpec {
    pub fn percent_summarizer(&self) -> Summarizer {
        Summarizer::percent(self.label)
    }

    pub fn absolute_summarizer(&self) -> Option<(Summarizer, &'static str)> {
        self.absolute.as_ref().map(|abs| {
            (
                Summarizer::converted(self.label, UnitConversion::megabytes_to_gigabytes()),
                abs.used,
            )
        })
    }
}

static CATALOG: [MetricSpec; 6] = [
    MetricSpec {
        kind: MetricKind::Cpu,
        title: "CPU Details",
        heading: "CPU Analysis",
        label: "CPU",
        percent_column: "CPU (%)",
        absolute: None,
    },
    MetricSpec {
        kind: MetricKind::Memory,
        title: "Memory Details",
        heading: "Memory Analysis",
        label: "Memory",
        percent_column: "Mem (%)",
        absolute: Some(AbsoluteColumns {
            used: "Mem Used (MB)",
            total: "Mem Total (MB)",
            capacity_label: "Total Memory Available",
        }),
    },
    MetricSpec {
        kind: MetricKind::Gpu0,
        title: "GPU0 Details",
        heading: "GPU0 Analysis",
        label: "GPU0",
        percent_column: "GPU0 (%)",
        absolute: None,
    },
    MetricSpec {
        kind: MetricKind::Gpu0Memory,
        title: "GPU0 Memory Details",
        heading: "GPU0 Memory Analysis",
        label: "GPU0 Memory",
        percent_column: "GPU0 Mem (%)",
        absolute: Some(AbsoluteColumns {
            used: "GPU0 Mem Used (MB)",
            total: "GPU0 Mem Total (MB)",
            capacity_label: "Total GPU0 Memory Available",
        }),
    },
    MetricSpec {
        kind: MetricKind::Gpu0Encode,
        title: "GPU0 Encode Details",
        heading: "GPU0 Encode Analysis",
        label: "GPU0 Encode",
        percent_column: "GPU0 Encode (%)",
        absolute: None,
    },
    MetricSpec {
        kind: MetricKind::Gpu0Decode,
        title: "GPU0 Decode Details",
        heading: "GPU0 Decode Analysis",
        label: "GPU0 Decode",
        percent_column: "GPU0 Decode (%)",
        absolute: None,
    },
];
