//! Single-page HTML dashboard.

use super::components::{ChartSpec, TableSpec};
use super::renderer::{chart_config, escape_html, render_table_html, script_json};
use crate::dashboard::{Dashboard, LoadedDataset, Outcome, SectionReport};
use crate::summary::Percentile;

const CHART_JS_URL: &str = "https://cdn.jsdelivr.net/npm/chart.js@4.4.1/dist/chart.umd.min.js";

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; display: flex; color: #222; }
aside { width: 260px; padding: 1.5rem; background: #f3f5f8; min-height: 100vh; box-sizing: border-box; }
main { flex: 1; padding: 1.5rem 2rem; }
h1 { color: #034ea2; }
h5 { color: #034ea2; font-size: 1rem; margin: 0.5rem 0; }
details { border: 1px solid #dde3ea; border-radius: 6px; margin: 1rem 0; padding: 0.5rem 1rem; }
summary { cursor: pointer; font-weight: 600; }
.columns { display: grid; grid-template-columns: 1fr 1fr; gap: 1.5rem; align-items: start; }
.summary-table { border-collapse: collapse; width: 100%; margin-bottom: 1rem; }
.summary-table th, .summary-table td { border-bottom: 1px solid #e4e8ee; padding: 0.35rem 0.6rem; text-align: left; }
.notice { padding: 0.75rem 1rem; border-radius: 6px; margin: 1rem 0; }
.info { background: #e8f1fb; }
.warning { background: #fff4d6; }
.error { background: #fde8e8; }
pre { white-space: pre-wrap; }
"#;

/// Registers a Chart.js plugin drawing `barLabels` above each bar.
const BAR_LABEL_PLUGIN: &str = r#"
Chart.register({
  id: 'barLabels',
  afterDatasetsDraw(chart) {
    const ctx = chart.ctx;
    chart.data.datasets.forEach((ds, i) => {
      if (!ds.barLabels) return;
      chart.getDatasetMeta(i).data.forEach((bar, j) => {
        const text = ds.barLabels[j];
        if (!text) return;
        ctx.save();
        ctx.font = '14px system-ui, sans-serif';
        ctx.textAlign = 'center';
        ctx.fillStyle = '#222';
        ctx.fillText(text, bar.x, bar.y - 6);
        ctx.restore();
      });
    });
  }
});
"#;

const UPLOAD_SCRIPT: &str = r#"
document.getElementById('upload').addEventListener('change', async (ev) => {
  const file = ev.target.files[0];
  if (!file) return;
  const resp = await fetch('/api/upload?name=' + encodeURIComponent(file.name), {
    method: 'POST',
    headers: { 'content-type': 'text/csv' },
    body: file,
  });
  window.location.reload();
});
"#;

/// What the page should show.
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    pub percentile: Percentile,
    /// The loaded dataset and its dashboard; `None` before the first upload.
    pub loaded: Option<(&'a LoadedDataset, &'a Dashboard)>,
    /// Diagnostic text of the last failed upload.
    pub error: Option<&'a str>,
}

/// Render the full dashboard page.
pub fn render_dashboard_page(ctx: &PageContext<'_>) -> String {
    let mut charts: Vec<(String, serde_json::Value)> = Vec::new();
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>GPU Profiler Analysis</title>\n");
    html.push_str(&format!("<style>{STYLE}</style>\n"));
    html.push_str(&format!("<script src=\"{CHART_JS_URL}\"></script>\n"));
    html.push_str("</head>\n<body>\n");

    render_sidebar(&mut html, ctx.percentile);

    html.push_str("<main>\n<h1>GPU Profiler Analysis</h1>\n");

    if let Some(error) = ctx.error {
        html.push_str("<div class=\"notice error\"><strong>ERROR: CSV file could not be read.</strong>\n");
        html.push_str("<p>The following error occurred for further troubleshooting:</p>\n");
        html.push_str(&format!("<pre>{}</pre></div>\n", escape_html(error)));
    }

    match ctx.loaded {
        None => {
            html.push_str(
                "<div class=\"notice info\">Upload a CSV export from the GPU profiler to start the analysis.</div>\n",
            );
        }
        Some((dataset, dashboard)) => {
            render_loaded(&mut html, &mut charts, dataset, dashboard);
        }
    }

    html.push_str("</main>\n<script>\n");
    html.push_str(BAR_LABEL_PLUGIN);
    html.push_str(UPLOAD_SCRIPT);
    for (id, config) in &charts {
        html.push_str(&format!(
            "new Chart(document.getElementById('{id}'), {});\n",
            script_json(config)
        ));
    }
    html.push_str("</script>\n</body>\n</html>\n");
    html
}

fn render_sidebar(html: &mut String, percentile: Percentile) {
    html.push_str("<aside>\n<h2>Upload</h2>\n");
    html.push_str("<p>Upload the CSV export of the GPU profiler.</p>\n");
    html.push_str("<input type=\"file\" id=\"upload\" accept=\".csv\">\n");
    html.push_str("<form method=\"get\" action=\"/\">\n");
    html.push_str("<h2>Percentile</h2>\n<label for=\"percentile\">Choose custom X-Percentile:</label>\n");
    html.push_str(&format!(
        "<input type=\"range\" id=\"percentile\" name=\"percentile\" min=\"0\" max=\"100\" value=\"{percentile}\" \
         oninput=\"this.nextElementSibling.value = this.value\">\n<output>{percentile}</output>\n"
    ));
    html.push_str("<button type=\"submit\">Apply</button>\n</form>\n</aside>\n");
}

fn render_loaded(
    html: &mut String,
    charts: &mut Vec<(String, serde_json::Value)>,
    dataset: &LoadedDataset,
    dashboard: &Dashboard,
) {
    html.push_str(&format!(
        "<p>File <strong>{}</strong>: {} rows analysed",
        escape_html(&dataset.name),
        dashboard.rows
    ));
    if dataset.report.rows_skipped > 0 {
        html.push_str(&format!(
            ", {} malformed rows skipped",
            dataset.report.rows_skipped
        ));
    }
    html.push_str(".</p>\n");

    for warning in &dashboard.warnings {
        html.push_str(&format!(
            "<div class=\"notice warning\">{}</div>\n",
            escape_html(warning)
        ));
    }

    html.push_str("<h5>General Utilization Overview</h5>\n");
    match &dashboard.timeline {
        Outcome::Ready(timeline) => {
            html.push_str("<p>Use the legend entries above the diagram to show or hide certain graphs.</p>\n");
            html.push_str("<canvas id=\"timeline\" height=\"110\"></canvas>\n");
            charts.push((
                "timeline".into(),
                chart_config(&ChartSpec::from_timeline(timeline)),
            ));
        }
        Outcome::Failed { message } => {
            html.push_str(&format!(
                "<div class=\"notice error\">{}</div>\n",
                escape_html(message)
            ));
        }
    }

    for (idx, section) in dashboard.sections.iter().enumerate() {
        render_section(html, charts, idx, section);
    }
}

fn render_section(
    html: &mut String,
    charts: &mut Vec<(String, serde_json::Value)>,
    idx: usize,
    section: &SectionReport,
) {
    let chart_id = format!("hist-{idx}");
    html.push_str(&format!(
        "<details>\n<summary>{}</summary>\n<h5>{}</h5>\n<div class=\"columns\">\n",
        escape_html(&section.title),
        escape_html(&section.heading)
    ));
    html.push_str(&format!("<div><canvas id=\"{chart_id}\"></canvas></div>\n<div>\n"));
    charts.push((
        chart_id,
        chart_config(&ChartSpec::from_histogram(&section.histogram)),
    ));

    for (pos, table) in section.tables.iter().enumerate() {
        if pos == 1 {
            if let Some(capacity) = &section.capacity {
                html.push_str(&format!(
                    "<p><strong>{}</strong></p>\n",
                    escape_html(capacity)
                ));
            }
        }
        match table {
            Outcome::Ready(summary) => {
                html.push_str(&render_table_html(&TableSpec::from_summary(summary)));
                html.push('\n');
            }
            Outcome::Failed { message } => {
                html.push_str(&format!(
                    "<div class=\"notice error\">{}</div>\n",
                    escape_html(message)
                ));
            }
        }
    }
    html.push_str("</div>\n</div>\n</details>\n");
}
