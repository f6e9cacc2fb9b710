//! Named histogram series owned by one registry instance.
//!
//! The registry is built once at process start and shared by `Arc`; there is
//! no global default registry.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use crate::error::{IngestError, Result};

use super::histogram::{HistogramSeries, SeriesSnapshot};

/// Default latency buckets, in seconds.
pub const DEFAULT_LATENCY_BUCKETS: [f64; 11] =
    [0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

#[derive(Default)]
pub struct MetricsRegistry {
    series: RwLock<BTreeMap<String, Arc<HistogramSeries>>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a histogram series. Bounds are fixed from here on.
    pub fn register(
        &self,
        name: &str,
        help: &str,
        label_names: &[&str],
        buckets: &[f64],
    ) -> Result<()> {
        if !is_metric_name(name) {
            return Err(IngestError::InvalidSeries(format!("bad metric name: {name:?}")));
        }
        let label_names = check_label_names(name, label_names)?;
        let bounds = check_buckets(name, buckets)?;

        let mut series = self.series.write().unwrap_or_else(PoisonError::into_inner);
        if series.contains_key(name) {
            return Err(IngestError::DuplicateSeries(name.to_string()));
        }
        series.insert(
            name.to_string(),
            Arc::new(HistogramSeries::new(
                name.to_string(),
                help.to_string(),
                label_names,
                bounds,
            )),
        );
        tracing::debug!(series = %name, "histogram registered");
        Ok(())
    }

    /// Record one observation in the series' declared unit.
    pub fn observe(&self, name: &str, labels: &[(&str, &str)], value: f64) -> Result<()> {
        let series = {
            let map = self.series.read().unwrap_or_else(PoisonError::into_inner);
            map.get(name)
                .cloned()
                .ok_or_else(|| IngestError::UnknownSeries(name.to_string()))?
        };
        series.observe(labels, value)
    }

    /// Record a duration as seconds. This is the only place durations become numbers.
    pub fn observe_duration(
        &self,
        name: &str,
        labels: &[(&str, &str)],
        elapsed: Duration,
    ) -> Result<()> {
        self.observe(name, labels, elapsed.as_secs_f64())
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        let series: Vec<Arc<HistogramSeries>> = {
            let map = self.series.read().unwrap_or_else(PoisonError::into_inner);
            map.values().cloned().collect()
        };
        RegistrySnapshot {
            series: series.iter().map(|s| s.snapshot()).collect(),
        }
    }
}

/// Immutable view of every series, ordered by name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RegistrySnapshot {
    pub series: Vec<SeriesSnapshot>,
}

impl RegistrySnapshot {
    pub fn series(&self, name: &str) -> Option<&SeriesSnapshot> {
        self.series.iter().find(|s| s.name == name)
    }
}

fn is_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

fn is_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn check_label_names(series: &str, label_names: &[&str]) -> Result<Vec<String>> {
    let mut out: Vec<String> = Vec::with_capacity(label_names.len());
    for &l in label_names {
        if !is_label_name(l) || l == "le" || l.starts_with("__") {
            return Err(IngestError::InvalidSeries(format!(
                "{series}: bad label name {l:?}"
            )));
        }
        if out.iter().any(|o| o == l) {
            return Err(IngestError::InvalidSeries(format!(
                "{series}: duplicate label name {l:?}"
            )));
        }
        out.push(l.to_string());
    }
    Ok(out)
}

fn check_buckets(series: &str, buckets: &[f64]) -> Result<Vec<f64>> {
    let mut bounds = buckets.to_vec();
    // +Inf is implicit; accept it written out as the last bound.
    if bounds.last() == Some(&f64::INFINITY) {
        bounds.pop();
    }
    if let Some(b) = bounds.iter().find(|b| !b.is_finite()) {
        return Err(IngestError::InvalidBuckets(format!(
            "{series}: bound {b} is not finite"
        )));
    }
    if bounds.windows(2).any(|w| w[0] >= w[1]) {
        return Err(IngestError::InvalidBuckets(format!(
            "{series}: bounds must be strictly increasing"
        )));
    }
    Ok(bounds)
}
