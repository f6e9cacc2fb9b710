use std::collections::HashMap;
use std::net::SocketAddr;

use serde::Deserialize;
use ingestor_core::error::{IngestError, Result};
use ingestor_core::metrics::DEFAULT_LATENCY_BUCKETS;

use crate::router::API_ROUTES;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IngestorConfig {
    pub version: u32,

    #[serde(default)]
    pub api: ApiSection,

    #[serde(default)]
    pub metrics: MetricsSection,

    #[serde(default)]
    pub classifier: ClassifierSection,

    #[serde(default)]
    pub analyzer: AnalyzerSection,
}

impl Default for IngestorConfig {
    fn default() -> Self {
        Self {
            version: 1,
            api: ApiSection::default(),
            metrics: MetricsSection::default(),
            classifier: ClassifierSection::default(),
            analyzer: AnalyzerSection::default(),
        }
    }
}

impl IngestorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(IngestError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }

        let api_addr = self.api.validate()?;
        let metrics_addr = self.metrics.validate()?;
        self.classifier.validate()?;

        if metrics_addr == Some(api_addr) {
            return Err(IngestError::Config(
                "metrics.listen must differ from api.listen".into(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiSection {
    #[serde(default = "default_api_listen")]
    pub listen: String,

    #[serde(default = "default_body_limit_bytes")]
    pub body_limit_bytes: usize,

    #[serde(default = "default_true")]
    pub cors_allow_all: bool,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            listen: default_api_listen(),
            body_limit_bytes: default_body_limit_bytes(),
            cors_allow_all: true,
        }
    }
}

impl ApiSection {
    pub fn validate(&self) -> Result<SocketAddr> {
        let addr = parse_listen("api.listen", &self.listen)?;
        if !(1..=MAX_BODY_LIMIT_BYTES).contains(&self.body_limit_bytes) {
            return Err(IngestError::Config(format!(
                "api.body_limit_bytes must be between 1 and {MAX_BODY_LIMIT_BYTES}"
            )));
        }
        Ok(addr)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    /// Dedicated scrape listener. `None` serves metrics on the API port only.
    #[serde(default = "default_metrics_listen")]
    pub listen: Option<String>,

    #[serde(default = "default_metrics_path")]
    pub path: String,

    #[serde(default = "default_true")]
    pub expose_on_api: bool,

    #[serde(default = "default_true")]
    pub process_metrics: bool,

    /// Latency bucket bounds in seconds.
    #[serde(default = "default_buckets")]
    pub buckets: Vec<f64>,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            listen: default_metrics_listen(),
            path: default_metrics_path(),
            expose_on_api: true,
            process_metrics: true,
            buckets: default_buckets(),
        }
    }
}

impl MetricsSection {
    pub fn validate(&self) -> Result<Option<SocketAddr>> {
        if !self.path.starts_with('/') {
            return Err(IngestError::Config("metrics.path must start with '/'".into()));
        }
        // ':' and '*' would turn the path into a capture or wildcard route
        if self.path.contains([':', '*']) {
            return Err(IngestError::Config(
                "metrics.path must not contain ':' or '*'".into(),
            ));
        }
        if API_ROUTES.contains(&self.path.as_str()) {
            return Err(IngestError::Config(format!(
                "metrics.path {} collides with an API route",
                self.path
            )));
        }
        if self.listen.is_none() && !self.expose_on_api {
            return Err(IngestError::Config(
                "metrics must be served somewhere: set metrics.listen or metrics.expose_on_api".into(),
            ));
        }
        if self.buckets.iter().any(|b| !b.is_finite() || *b <= 0.0) {
            return Err(IngestError::Config(
                "metrics.buckets must be positive finite seconds".into(),
            ));
        }
        if self.buckets.windows(2).any(|w| w[0] >= w[1]) {
            return Err(IngestError::Config(
                "metrics.buckets must be strictly increasing".into(),
            ));
        }
        self.listen
            .as_deref()
            .map(|l| parse_listen("metrics.listen", l))
            .transpose()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassifierSection {
    /// Load the model at startup instead of on the first upload.
    #[serde(default)]
    pub warmup: bool,

    #[serde(default = "default_load_timeout_ms")]
    pub load_timeout_ms: u64,

    #[serde(default = "default_classify_timeout_ms")]
    pub classify_timeout_ms: u64,

    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for ClassifierSection {
    fn default() -> Self {
        Self {
            warmup: false,
            load_timeout_ms: default_load_timeout_ms(),
            classify_timeout_ms: default_classify_timeout_ms(),
            top_k: default_top_k(),
        }
    }
}

impl ClassifierSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=600000).contains(&self.load_timeout_ms) {
            return Err(IngestError::Config(
                "classifier.load_timeout_ms must be between 1 and 600000".into(),
            ));
        }
        if !(1..=600000).contains(&self.classify_timeout_ms) {
            return Err(IngestError::Config(
                "classifier.classify_timeout_ms must be between 1 and 600000".into(),
            ));
        }
        if !(1..=100).contains(&self.top_k) {
            return Err(IngestError::Config(
                "classifier.top_k must be between 1 and 100".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct AnalyzerSection {
    /// Extra or overriding lexicon entries (word -> score).
    #[serde(default)]
    pub extra_words: HashMap<String, i32>,
}

const MAX_BODY_LIMIT_BYTES: usize = 1 << 30;

fn parse_listen(field: &str, v: &str) -> Result<SocketAddr> {
    v.parse()
        .map_err(|e| IngestError::Config(format!("{field} must be a valid SocketAddr: {e}")))
}

fn default_api_listen() -> String {
    "0.0.0.0:3001".into()
}
fn default_body_limit_bytes() -> usize {
    10 * 1024 * 1024
}
fn default_metrics_listen() -> Option<String> {
    Some("0.0.0.0:9100".into())
}
fn default_metrics_path() -> String {
    "/metrics".into()
}
fn default_buckets() -> Vec<f64> {
    DEFAULT_LATENCY_BUCKETS.to_vec()
}
fn default_load_timeout_ms() -> u64 {
    30000
}
fn default_classify_timeout_ms() -> u64 {
    10000
}
fn default_top_k() -> usize {
    3
}
fn default_true() -> bool {
    true
}
