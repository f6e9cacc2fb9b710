//! Service config loader (strict parsing).

pub mod schema;

use std::fs;
use std::io::ErrorKind;

use ingestor_core::error::{IngestError, Result};

pub use schema::{AnalyzerSection, ApiSection, ClassifierSection, IngestorConfig, MetricsSection};

pub fn load_from_file(path: &str) -> Result<IngestorConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| IngestError::Config(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

/// Like `load_from_file`, but a missing file yields the validated defaults.
pub fn load_or_default(path: &str) -> Result<IngestorConfig> {
    match fs::metadata(path) {
        Ok(_) => load_from_file(path),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::info!(%path, "config file not found, using defaults");
            let cfg = IngestorConfig::default();
            cfg.validate()?;
            Ok(cfg)
        }
        Err(e) => Err(IngestError::Config(format!("stat config failed: {e}"))),
    }
}

pub fn load_from_str(s: &str) -> Result<IngestorConfig> {
    let cfg: IngestorConfig = serde_yaml::from_str(s)
        .map_err(|e| IngestError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
