use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tally_core::{Kind, Metric, Store};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    #[serde(with = "humantime_serde", default = "default_summary_interval")]
    pub summary_interval: Duration,
    /// Export `http_requests_total` and `uptime_seconds` for the server itself.
    #[serde(default = "default_self_metrics")]
    pub self_metrics: bool,
    #[serde(default)]
    pub metrics: Vec<MetricDecl>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindDecl {
    Counter,
    Gauge,
}

impl From<KindDecl> for Kind {
    fn from(kind: KindDecl) -> Self {
        match kind {
            KindDecl::Counter => Kind::Counter,
            KindDecl::Gauge => Kind::Gauge,
        }
    }
}

/// A metric registered into the store when the server starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricDecl {
    pub name: String,
    pub program: String,
    pub kind: KindDecl,
    #[serde(default)]
    pub keys: Vec<String>,
}

impl MetricDecl {
    #[allow(dead_code)]
    pub fn new(
        name: impl Into<String>,
        program: impl Into<String>,
        kind: KindDecl,
        keys: &[&str],
    ) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            kind,
            keys: keys.iter().map(|k| k.to_string()).collect(),
        }
    }

    pub fn to_metric(&self) -> Metric {
        Metric::new(
            self.name.clone(),
            self.program.clone(),
            self.kind.into(),
            self.keys.clone(),
        )
    }
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3903))
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_summary_interval() -> Duration {
    Duration::from_secs(60)
}

fn default_self_metrics() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            log_level: default_log_level(),
            log_file: None,
            summary_interval: default_summary_interval(),
            self_metrics: default_self_metrics(),
            metrics: Vec::new(),
        }
    }
}

impl Config {
    #[allow(dead_code)]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.log_level.trim().is_empty() {
            return Err("log_level cannot be empty".to_string());
        }

        let mut seen = HashSet::new();
        for (i, decl) in self.metrics.iter().enumerate() {
            if decl.name.is_empty() {
                return Err(format!("Metric {} name cannot be empty", i));
            }

            if decl.program.is_empty() {
                return Err(format!("Metric '{}' must have a program", decl.name));
            }

            let mut keys = HashSet::new();
            for key in &decl.keys {
                if !keys.insert(key) {
                    return Err(format!(
                        "Metric '{}' declares key '{}' more than once",
                        decl.name, key
                    ));
                }
            }

            if !seen.insert((&decl.name, &decl.program)) {
                return Err(format!(
                    "Metric '{}' is declared twice for program '{}'",
                    decl.name, decl.program
                ));
            }
        }

        Ok(())
    }

    /// Adds every declared metric to `store`, in declaration order.
    pub async fn register(&self, store: &Store) -> Vec<Arc<Metric>> {
        let mut registered = Vec::with_capacity(self.metrics.len());
        for decl in &self.metrics {
            registered.push(store.register(decl.to_metric()).await);
        }
        registered
    }
}

#[allow(dead_code)]
#[derive(Default)]
pub struct ConfigBuilder {
    listen: Option<SocketAddr>,
    log_level: Option<String>,
    log_file: Option<PathBuf>,
    summary_interval: Option<Duration>,
    self_metrics: Option<bool>,
    metrics: Vec<MetricDecl>,
}

#[allow(dead_code)]
impl ConfigBuilder {
    pub fn listen(mut self, listen: SocketAddr) -> Self {
        self.listen = Some(listen);
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    pub fn summary_interval(mut self, interval: Duration) -> Self {
        self.summary_interval = Some(interval);
        self
    }

    pub fn self_metrics(mut self, enabled: bool) -> Self {
        self.self_metrics = Some(enabled);
        self
    }

    pub fn add_metric(mut self, decl: MetricDecl) -> Self {
        self.metrics.push(decl);
        self
    }

    pub fn build(self) -> Config {
        Config {
            listen: self.listen.unwrap_or_else(default_listen),
            log_level: self.log_level.unwrap_or_else(default_log_level),
            log_file: self.log_file,
            summary_interval: self.summary_interval.unwrap_or_else(default_summary_interval),
            self_metrics: self.self_metrics.unwrap_or_else(default_self_metrics),
            metrics: self.metrics,
        }
    }
}

pub async fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let contents = tokio::fs::read_to_string(path).await?;

    let extension = path.extension().and_then(|s| s.to_str());

    match extension {
        Some("yaml") | Some("yml") => parse_from_str(&contents, "yaml"),
        Some("toml") => parse_from_str(&contents, "toml"),
        Some("json") => parse_from_str(&contents, "json"),
        _ => Err(anyhow::anyhow!(
            "Unsupported file format. Use .yaml, .yml, .toml, or .json"
        )),
    }
}

pub fn parse_from_str(content: &str, format: &str) -> Result<Config> {
    let config: Config = match format.to_lowercase().as_str() {
        "yaml" | "yml" => serde_yaml::from_str(content)?,
        "toml" => toml::from_str(content)?,
        "json" => serde_json::from_str(content)?,
        _ => return Err(anyhow::anyhow!("Unsupported format: {}", format)),
    };
    config.validate().map_err(|e| anyhow::anyhow!(e))?;
    Ok(config)
}

mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
