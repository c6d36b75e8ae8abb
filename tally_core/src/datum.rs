use chrono::{DateTime, Utc};
use serde::{ser::Error as _, Serialize, Serializer};
use std::fmt;
use tokio::sync::RwLock;

/// Numeric scalar held by a [`Datum`]. Serializes as a bare number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
}

impl Value {
    pub fn as_f64(&self) -> f64 {
        match *self {
            Value::Int(v) => v as f64,
            Value::Float(v) => v,
        }
    }

    fn add(self, delta: Value) -> Value {
        match (self, delta) {
            (Value::Int(a), Value::Int(b)) => Value::Int(a.saturating_add(b)),
            (a, b) => Value::Float(a.as_f64() + b.as_f64()),
        }
    }
}

/// Non-finite floats have no JSON representation and are refused rather
/// than written as `null`.
impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match *self {
            Value::Int(v) => serializer.serialize_i64(v),
            Value::Float(v) if v.is_finite() => serializer.serialize_f64(v),
            Value::Float(v) => Err(S::Error::custom(format!(
                "non-finite value {} cannot be serialized",
                v
            ))),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Int(0)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

/// A value together with the instant it was last written.
///
/// `time` is `None` until the first write.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Sample {
    pub value: Value,
    pub time: Option<DateTime<Utc>>,
}

/// Latest observation for one label tuple of a metric.
///
/// Value and timestamp sit behind a single lock, so readers always see a
/// matching pair.
#[derive(Debug, Default)]
pub struct Datum {
    inner: RwLock<Sample>,
}

impl Datum {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a datum holding `value` with an unset timestamp.
    pub fn with_value(value: impl Into<Value>) -> Self {
        Self {
            inner: RwLock::new(Sample {
                value: value.into(),
                time: None,
            }),
        }
    }

    /// Overwrites the value and stamps the current time.
    pub async fn set(&self, value: impl Into<Value>) {
        let mut sample = self.inner.write().await;
        sample.value = value.into();
        sample.time = Some(Utc::now());
    }

    /// Adds `delta` to the current value and stamps the current time.
    pub async fn inc_by(&self, delta: impl Into<Value>) {
        let mut sample = self.inner.write().await;
        sample.value = sample.value.add(delta.into());
        sample.time = Some(Utc::now());
    }

    pub async fn inc(&self) {
        self.inc_by(1i64).await;
    }

    pub async fn get(&self) -> Sample {
        *self.inner.read().await
    }

    pub async fn value(&self) -> Value {
        self.inner.read().await.value
    }

    pub async fn time(&self) -> Option<DateTime<Utc>> {
        self.inner.read().await.time
    }
}
