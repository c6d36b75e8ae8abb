use crate::datum::Datum;
use crate::error::{Result, TallyError};
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Metric type. Serialized as its ordinal, `Counter` is 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Kind {
    Counter = 0,
    Gauge = 1,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Counter => "counter",
            Kind::Gauge => "gauge",
        }
    }
}

impl Serialize for Kind {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(*self as u8)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One point in a metric's label space and the datum recorded for it.
#[derive(Debug, Clone)]
pub struct LabelValue {
    pub labels: Vec<String>,
    pub value: Arc<Datum>,
}

#[derive(Debug, Default)]
struct LabelSet {
    entries: Vec<LabelValue>,
    index: HashMap<Vec<String>, usize>,
}

impl LabelSet {
    fn insert(&mut self, labels: Vec<String>) -> Arc<Datum> {
        let datum = Arc::new(Datum::new());
        self.index.insert(labels.clone(), self.entries.len());
        self.entries.push(LabelValue {
            labels,
            value: Arc::clone(&datum),
        });
        datum
    }

    fn get(&self, labels: &[String]) -> Option<Arc<Datum>> {
        self.index
            .get(labels)
            .map(|&i| Arc::clone(&self.entries[i].value))
    }
}

/// A named, typed series split along zero or more label dimensions.
#[derive(Debug)]
pub struct Metric {
    name: String,
    program: String,
    kind: Kind,
    keys: Vec<String>,
    label_values: RwLock<LabelSet>,
}

impl Metric {
    /// Creates a metric. A metric without keys starts with its single
    /// dimensionless entry already in place.
    pub fn new<K, S>(
        name: impl Into<String>,
        program: impl Into<String>,
        kind: Kind,
        keys: K,
    ) -> Self
    where
        K: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();

        let mut set = LabelSet::default();
        if keys.is_empty() {
            set.insert(Vec::new());
        }

        Self {
            name: name.into(),
            program: program.into(),
            kind,
            keys,
            label_values: RwLock::new(set),
        }
    }

    pub fn counter<K, S>(name: impl Into<String>, program: impl Into<String>, keys: K) -> Self
    where
        K: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(name, program, Kind::Counter, keys)
    }

    pub fn gauge<K, S>(name: impl Into<String>, program: impl Into<String>, keys: K) -> Self
    where
        K: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(name, program, Kind::Gauge, keys)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Returns the datum for `labels`, creating a zeroed one on first sight.
    ///
    /// `labels` must line up with [`Metric::keys`]; a length mismatch is
    /// rejected with [`TallyError::InvalidDimension`].
    pub async fn get_or_create_label_value<S: AsRef<str>>(
        &self,
        labels: &[S],
    ) -> Result<Arc<Datum>> {
        if labels.len() != self.keys.len() {
            return Err(TallyError::InvalidDimension {
                metric: self.name.clone(),
                expected: self.keys.len(),
                actual: labels.len(),
            });
        }

        let labels: Vec<String> = labels.iter().map(|l| l.as_ref().to_string()).collect();

        if let Some(datum) = self.label_values.read().await.get(&labels) {
            return Ok(datum);
        }

        let mut set = self.label_values.write().await;
        // Another writer may have won the race between the two locks.
        if let Some(datum) = set.get(&labels) {
            return Ok(datum);
        }

        debug!(metric = %self.name, program = %self.program, ?labels, "new label value");
        Ok(set.insert(labels))
    }

    /// Label values in first-seen order.
    pub async fn label_values(&self) -> Vec<LabelValue> {
        self.label_values.read().await.entries.clone()
    }

    pub async fn label_value_count(&self) -> usize {
        self.label_values.read().await.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datum::Value;
    use proptest::prelude::*;

    #[tokio::test]
    async fn test_same_labels_return_same_datum() {
        let metric = Metric::counter("requests", "web", ["code", "method"]);

        let first = metric.get_or_create_label_value(&["200", "GET"]).await.unwrap();
        let second = metric.get_or_create_label_value(&["200", "GET"]).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(metric.label_value_count().await, 1);
    }

    #[tokio::test]
    async fn test_distinct_labels_keep_first_seen_order() {
        let metric = Metric::gauge("queue_depth", "worker", ["queue"]);

        metric.get_or_create_label_value(&["b"]).await.unwrap();
        metric.get_or_create_label_value(&["a"]).await.unwrap();
        metric.get_or_create_label_value(&["b"]).await.unwrap();

        let labels: Vec<Vec<String>> = metric
            .label_values()
            .await
            .into_iter()
            .map(|lv| lv.labels)
            .collect();
        assert_eq!(labels, vec![vec!["b".to_string()], vec!["a".to_string()]]);
    }

    #[tokio::test]
    async fn test_wrong_label_count_is_rejected() {
        let metric = Metric::counter("requests", "web", ["code"]);

        let err = metric
            .get_or_create_label_value(&["200", "GET"])
            .await
            .unwrap_err();

        match err {
            TallyError::InvalidDimension {
                metric,
                expected,
                actual,
            } => {
                assert_eq!(metric, "requests");
                assert_eq!(expected, 1);
                assert_eq!(actual, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(metric.label_value_count().await, 0);
    }

    #[tokio::test]
    async fn test_dimensionless_metric_has_single_entry() {
        let metric = Metric::counter("lines", "syslog", Vec::<String>::new());
        assert_eq!(metric.label_value_count().await, 1);

        let empty: [&str; 0] = [];
        let datum = metric.get_or_create_label_value(&empty).await.unwrap();
        datum.inc().await;

        let entries = metric.label_values().await;
        assert_eq!(entries.len(), 1);
        assert!(entries[0].labels.is_empty());
        assert_eq!(entries[0].value.value().await, Value::Int(1));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_on_distinct_datums() {
        let metric = Arc::new(Metric::gauge("temperature", "sensors", ["sensor"]));

        let tasks: Vec<_> = (0..32)
            .map(|i| {
                let metric = Arc::clone(&metric);
                tokio::spawn(async move {
                    let label = format!("s{}", i);
                    let datum = metric.get_or_create_label_value(&[label]).await.unwrap();
                    datum.set(i as i64).await;
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap();
        }

        let entries = metric.label_values().await;
        assert_eq!(entries.len(), 32);
        for entry in entries {
            let expected: i64 = entry.labels[0][1..].parse().unwrap();
            let sample = entry.value.get().await;
            assert_eq!(sample.value, Value::Int(expected));
            assert!(sample.time.is_some());
        }
    }

    #[test]
    fn test_kind_serializes_as_ordinal() {
        assert_eq!(serde_json::to_string(&Kind::Counter).unwrap(), "0");
        assert_eq!(serde_json::to_string(&Kind::Gauge).unwrap(), "1");
    }

    proptest! {
        #[test]
        fn prop_label_values_follow_first_seen_order(
            tuples in proptest::collection::vec(("[a-c]", "[x-z]"), 1..40)
        ) {
            let metric = Metric::counter("events", "prop", ["left", "right"]);

            let mut expected: Vec<Vec<String>> = Vec::new();
            futures::executor::block_on(async {
                for (left, right) in &tuples {
                    let labels = vec![left.clone(), right.clone()];
                    metric.get_or_create_label_value(&labels).await.unwrap();
                    if !expected.contains(&labels) {
                        expected.push(labels);
                    }
                }
            });

            let actual: Vec<Vec<String>> = futures::executor::block_on(metric.label_values())
                .into_iter()
                .map(|lv| lv.labels)
                .collect();
            prop_assert_eq!(actual, expected);
        }
    }
}
