use crate::metric::Metric;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Insertion-ordered registry of metrics.
///
/// `add` does not deduplicate: registering the same name and program twice
/// yields two entries, and both are exported. Producers that want a single
/// entry keep the `Arc<Metric>` they registered, or look it up with
/// [`Store::find`] before adding.
#[derive(Debug, Default)]
pub struct Store {
    metrics: RwLock<Vec<Arc<Metric>>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `metric` to the registry.
    pub async fn add(&self, metric: Arc<Metric>) {
        debug!(
            metric = metric.name(),
            program = metric.program(),
            kind = %metric.kind(),
            "registering metric"
        );
        self.metrics.write().await.push(metric);
    }

    /// Wraps `metric` in an `Arc`, adds it, and hands the shared handle back.
    pub async fn register(&self, metric: Metric) -> Arc<Metric> {
        let metric = Arc::new(metric);
        self.add(Arc::clone(&metric)).await;
        metric
    }

    /// All registered metrics in insertion order.
    pub async fn metrics(&self) -> Vec<Arc<Metric>> {
        self.metrics.read().await.clone()
    }

    /// First metric registered under `name` and `program`.
    pub async fn find(&self, name: &str, program: &str) -> Option<Arc<Metric>> {
        self.metrics
            .read()
            .await
            .iter()
            .find(|m| m.name() == name && m.program() == program)
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.metrics.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.metrics.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::Kind;
    use proptest::prelude::*;

    #[tokio::test]
    async fn test_metrics_keep_insertion_order() {
        let store = Store::new();
        store.register(Metric::counter("b", "prog", ["k"])).await;
        store.register(Metric::gauge("a", "prog", ["k"])).await;
        store.register(Metric::counter("c", "other", ["k"])).await;

        let names: Vec<String> = store
            .metrics()
            .await
            .iter()
            .map(|m| m.name().to_string())
            .collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[tokio::test]
    async fn test_duplicate_registration_is_kept() {
        let store = Store::new();
        let first = store.register(Metric::counter("foo", "test", ["k"])).await;
        let second = store.register(Metric::counter("foo", "test", ["k"])).await;

        assert_eq!(store.len().await, 2);
        assert!(!Arc::ptr_eq(&first, &second));

        let found = store.find("foo", "test").await.unwrap();
        assert!(Arc::ptr_eq(&found, &first));
    }

    #[tokio::test]
    async fn test_find_misses_other_program() {
        let store = Store::new();
        assert!(store.is_empty().await);

        store.register(Metric::new("foo", "a", Kind::Gauge, ["k"])).await;
        assert!(store.find("foo", "b").await.is_none());
        assert!(store.find("foo", "a").await.is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_add_and_iterate() {
        let store = Arc::new(Store::new());

        let writers: Vec<_> = (0..16)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    for j in 0..8 {
                        let name = format!("m{}_{}", i, j);
                        store.register(Metric::counter(name, "load", ["k"])).await;
                    }
                })
            })
            .collect();

        let reader = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                let mut last = 0;
                for _ in 0..50 {
                    let seen = store.metrics().await.len();
                    assert!(seen >= last);
                    last = seen;
                    tokio::task::yield_now().await;
                }
            })
        };

        for result in futures::future::join_all(writers).await {
            result.unwrap();
        }
        reader.await.unwrap();

        assert_eq!(store.len().await, 128);
    }

    proptest! {
        #[test]
        fn prop_iteration_matches_add_order(names in proptest::collection::vec("[a-z]{1,6}", 0..30)) {
            let store = Store::new();
            futures::executor::block_on(async {
                for name in &names {
                    store.register(Metric::counter(name.clone(), "prop", ["k"])).await;
                }
            });

            let seen: Vec<String> = futures::executor::block_on(store.metrics())
                .iter()
                .map(|m| m.name().to_string())
                .collect();
            prop_assert_eq!(seen, names);
        }
    }
}
