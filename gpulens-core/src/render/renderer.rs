//! Server-side renderer.
//!
//! Converts component specs (ChartSpec, TableSpec) into Chart.js configs and
//! HTML strings suitable for embedding in the dashboard page.

use super::components::{ChartSpec, TableSpec};

/// Render a ChartSpec to a Chart.js config JSON value.
pub fn chart_config(spec: &ChartSpec) -> serde_json::Value {
    let datasets: Vec<serde_json::Value> = spec
        .datasets
        .iter()
        .map(|ds| {
            let data = if ds.points.is_empty() {
                serde_json::json!(ds.data)
            } else {
                serde_json::Value::Array(
                    ds.points
                        .iter()
                        .map(|(x, y)| serde_json::json!({ "x": x, "y": y }))
                        .collect(),
                )
            };
            let mut obj = serde_json::json!({
                "label": ds.label,
                "data": data,
                "hidden": ds.hidden,
            });
            if let Some(color) = &ds.color {
                obj["borderColor"] = serde_json::json!(color);
                obj["backgroundColor"] = serde_json::json!(color);
            }
            if !ds.bar_labels.is_empty() {
                obj["barLabels"] = serde_json::json!(ds.bar_labels);
            }
            if spec.chart_type == "line" {
                obj["pointRadius"] = serde_json::json!(0);
                obj["borderWidth"] = serde_json::json!(1.5);
            }
            obj
        })
        .collect();

    let x_type = if spec.labels.is_empty() { "linear" } else { "category" };
    let mut y_axis = serde_json::json!({
        "title": {
            "display": spec.y_title.is_some(),
            "text": spec.y_title.as_deref().unwrap_or(""),
        }
    });
    if let Some((min, max)) = spec.y_range {
        y_axis["min"] = serde_json::json!(min);
        y_axis["max"] = serde_json::json!(max);
        y_axis["ticks"] = serde_json::json!({ "stepSize": 10 });
    }

    serde_json::json!({
        "type": spec.chart_type,
        "data": {
            "labels": spec.labels,
            "datasets": datasets,
        },
        "options": {
            "responsive": true,
            "animation": false,
            "interaction": { "mode": "index", "intersect": false },
            "plugins": {
                "legend": { "display": spec.datasets.len() > 1, "position": "top" },
            },
            "scales": {
                "x": {
                    "type": x_type,
                    "title": {
                        "display": spec.x_title.is_some(),
                        "text": spec.x_title.as_deref().unwrap_or(""),
                    }
                },
                "y": y_axis,
            }
        }
    })
}

/// Render a ChartSpec to a pretty-printed Chart.js config string.
pub fn render_chart_config(spec: &ChartSpec) -> String {
    serde_json::to_string_pretty(&chart_config(spec)).unwrap_or_else(|_| "{}".into())
}

/// Render a TableSpec to an HTML table string.
pub fn render_table_html(spec: &TableSpec) -> String {
    let mut html = String::from("<table class=\"summary-table\">\n<thead><tr>\n");
    for header in &spec.headers {
        html.push_str(&format!("  <th>{}</th>\n", escape_html(header)));
    }
    html.push_str("</tr></thead>\n<tbody>\n");
    for row in &spec.rows {
        html.push_str("<tr>\n");
        for cell in row {
            html.push_str(&format!("  <td>{}</td>\n", escape_html(cell)));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>");
    html
}

/// Escape HTML special characters.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// JSON safe to inline inside a `<script>` element.
pub fn script_json(value: &serde_json::Value) -> String {
    value.to_string().replace("</", "<\\/")
}
