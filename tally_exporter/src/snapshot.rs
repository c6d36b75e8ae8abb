//! Owned, serializable copies of the registry contents.
//!
//! Each metric and each datum is read under its own lock, so a snapshot is
//! consistent per datum but not across the whole store.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use std::sync::Arc;
use tally_core::{Kind, Metric, Store, Value};

/// Rendering of an unset timestamp.
pub const ZERO_TIME: &str = "0001-01-01T00:00:00Z";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DatumSnapshot {
    pub value: Value,
    #[serde(serialize_with = "serialize_time")]
    pub time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LabelValueSnapshot {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    pub value: DatumSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricSnapshot {
    pub name: String,
    pub program: String,
    pub kind: Kind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<String>,
    pub label_values: Vec<LabelValueSnapshot>,
}

impl MetricSnapshot {
    pub async fn capture(metric: &Metric) -> Self {
        let mut label_values = Vec::new();
        for lv in metric.label_values().await {
            let sample = lv.value.get().await;
            label_values.push(LabelValueSnapshot {
                labels: lv.labels,
                value: DatumSnapshot {
                    value: sample.value,
                    time: sample.time,
                },
            });
        }

        Self {
            name: metric.name().to_string(),
            program: metric.program().to_string(),
            kind: metric.kind(),
            keys: metric.keys().to_vec(),
            label_values,
        }
    }
}

/// Every metric in the store, in registration order.
///
/// An empty snapshot serializes as `null`, not `[]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub metrics: Vec<MetricSnapshot>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }
}

impl Serialize for Snapshot {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if self.metrics.is_empty() {
            serializer.serialize_none()
        } else {
            self.metrics.serialize(serializer)
        }
    }
}

fn serialize_time<S>(time: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match time {
        Some(t) => serializer.serialize_str(&format_time(t)),
        None => serializer.serialize_str(ZERO_TIME),
    }
}

/// RFC3339 in UTC with trailing zeros trimmed from the fraction, and no
/// fraction at all on a whole second.
fn format_time(time: &DateTime<Utc>) -> String {
    let full = time.to_rfc3339_opts(SecondsFormat::Nanos, true);
    let stamp = full.trim_end_matches('Z');
    match stamp.split_once('.') {
        Some((seconds, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                format!("{}Z", seconds)
            } else {
                format!("{}.{}Z", seconds, fraction)
            }
        }
        None => full,
    }
}

/// Read-only view over a [`Store`].
#[derive(Debug, Clone)]
pub struct Exporter {
    store: Arc<Store>,
}

impl Exporter {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub async fn snapshot(&self) -> Snapshot {
        let mut metrics = Vec::new();
        for metric in self.store.metrics().await {
            metrics.push(MetricSnapshot::capture(&metric).await);
        }
        Snapshot { metrics }
    }
}
