pub mod exporters;
pub mod http;
pub mod snapshot;

pub use exporters::{JsonExporter, PrometheusExporter};
pub use http::{router, AppState};
pub use snapshot::{DatumSnapshot, Exporter, LabelValueSnapshot, MetricSnapshot, Snapshot};
