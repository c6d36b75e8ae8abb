pub mod datum;
pub mod error;
pub mod metric;
pub mod store;

pub use datum::{Datum, Sample, Value};
pub use error::{Result, TallyError};
pub use metric::{Kind, LabelValue, Metric};
pub use store::Store;
