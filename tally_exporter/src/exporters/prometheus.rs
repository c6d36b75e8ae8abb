use crate::snapshot::{MetricSnapshot, Snapshot};
use std::fmt::Write;
use tally_core::{Kind, Value};

pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4";

const PROGRAM_LABEL: &str = "prog";

fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

/// Maps every character outside the allowed set to `_` and keeps the name
/// from starting with a digit.
fn sanitize(name: &str, allow_colon: bool) -> String {
    let mut out: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || (allow_colon && c == ':') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

fn metric_name(name: &str) -> String {
    sanitize(name, true)
}

fn label_name(key: &str) -> String {
    let name = sanitize(key, false);
    if name == PROGRAM_LABEL {
        format!("{}_", name)
    } else {
        name
    }
}

fn format_value(value: &Value) -> String {
    match *value {
        Value::Float(v) if v.is_nan() => "NaN".to_string(),
        Value::Float(v) if v == f64::INFINITY => "+Inf".to_string(),
        Value::Float(v) if v == f64::NEG_INFINITY => "-Inf".to_string(),
        v => v.to_string(),
    }
}

pub struct PrometheusExporter;

impl PrometheusExporter {
    /// Renders the snapshot in the Prometheus text exposition format.
    ///
    /// Metrics sharing a name and kind across programs are grouped under one
    /// TYPE line and told apart by the `prog` label. A key named `prog` is
    /// exported as `prog_`.
    pub fn format(snapshot: &Snapshot) -> String {
        let mut families: Vec<(String, Kind, Vec<&MetricSnapshot>)> = Vec::new();
        for metric in &snapshot.metrics {
            let name = metric_name(&metric.name);
            match families
                .iter_mut()
                .find(|(n, kind, _)| *n == name && *kind == metric.kind)
            {
                Some((_, _, members)) => members.push(metric),
                None => families.push((name, metric.kind, vec![metric])),
            }
        }

        let mut out = String::new();
        for (name, kind, members) in &families {
            let _ = writeln!(out, "# TYPE {} {}", name, kind);
            for metric in members {
                Self::render_samples(name, metric, &mut out);
            }
        }
        out
    }

    fn render_samples(name: &str, metric: &MetricSnapshot, out: &mut String) {
        let keys: Vec<String> = metric.keys.iter().map(|k| label_name(k)).collect();

        for lv in &metric.label_values {
            let mut labels = vec![format!(
                "{}=\"{}\"",
                PROGRAM_LABEL,
                escape_label(&metric.program)
            )];
            labels.extend(
                keys.iter()
                    .zip(&lv.labels)
                    .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v))),
            );
            let _ = writeln!(
                out,
                "{}{{{}}} {}",
                name,
                labels.join(","),
                format_value(&lv.value.value)
            );
        }
    }
}
