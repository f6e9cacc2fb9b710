//! Prometheus text exposition format (version 0.0.4).

use std::fmt::Write;

use super::registry::RegistrySnapshot;

pub const TEXT_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn escape_help(v: &str) -> String {
    v.replace('\\', "\\\\").replace('\n', "\\n")
}

fn format_value(v: f64) -> String {
    if v == f64::INFINITY {
        "+Inf".to_string()
    } else if v == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else if v.is_nan() {
        "NaN".to_string()
    } else {
        v.to_string()
    }
}

/// Render every series of a snapshot as histograms.
pub fn render_snapshot(snapshot: &RegistrySnapshot, out: &mut String) {
    for series in &snapshot.series {
        let name = &series.name;
        let _ = writeln!(out, "# HELP {} {}", name, escape_help(&series.help));
        let _ = writeln!(out, "# TYPE {} histogram", name);

        for cell in &series.cells {
            let label_str = series
                .label_names
                .iter()
                .zip(&cell.label_values)
                .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
                .collect::<Vec<_>>()
                .join(",");
            let prefix = if label_str.is_empty() {
                String::new()
            } else {
                format!("{},", label_str)
            };
            let braced = if label_str.is_empty() {
                String::new()
            } else {
                format!("{{{}}}", label_str)
            };

            for (le, count) in series.bounds.iter().zip(&cell.buckets) {
                let _ = writeln!(
                    out,
                    "{}_bucket{{{}le=\"{}\"}} {}",
                    name,
                    prefix,
                    format_value(*le),
                    count
                );
            }
            let _ = writeln!(out, "{}_bucket{{{}le=\"+Inf\"}} {}", name, prefix, cell.count);
            let _ = writeln!(out, "{}_sum{} {}", name, braced, format_value(cell.sum));
            let _ = writeln!(out, "{}_count{} {}", name, braced, cell.count);
        }
    }
}

/// Render a single unlabelled gauge sample.
pub fn render_gauge(name: &str, help: &str, value: f64, out: &mut String) {
    let _ = writeln!(out, "# HELP {} {}", name, escape_help(help));
    let _ = writeln!(out, "# TYPE {} gauge", name);
    let _ = writeln!(out, "{} {}", name, format_value(value));
}
