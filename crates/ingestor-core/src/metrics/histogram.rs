//! A single labelled histogram series.
//!
//! Each label combination owns one `HistogramCell`. Cells live in a `DashMap`
//! and are only ever mutated through a `RefMut`, which holds the shard write
//! lock, so an observation's bucket, sum and count updates land together.
//! Snapshots read through shard read locks and therefore never see half of an
//! observation.

use std::sync::Arc;

use dashmap::DashMap;

use crate::error::{IngestError, Result};

/// Counters for one label combination. Bucket counts are cumulative.
#[derive(Debug, Clone)]
struct HistogramCell {
    buckets: Vec<u64>,
    sum: f64,
    count: u64,
}

impl HistogramCell {
    fn new(bucket_len: usize) -> Self {
        Self {
            buckets: vec![0; bucket_len],
            sum: 0.0,
            count: 0,
        }
    }
}

pub(crate) struct HistogramSeries {
    name: String,
    help: String,
    label_names: Vec<String>,
    bounds: Arc<[f64]>,
    cells: DashMap<Vec<String>, HistogramCell>,
}

impl HistogramSeries {
    pub(crate) fn new(name: String, help: String, label_names: Vec<String>, bounds: Vec<f64>) -> Self {
        Self {
            name,
            help,
            label_names,
            bounds: bounds.into(),
            cells: DashMap::new(),
        }
    }

    /// Resolve label pairs into values ordered like the declared label names.
    fn label_values(&self, labels: &[(&str, &str)]) -> Result<Vec<String>> {
        let mismatch = || IngestError::LabelMismatch {
            series: self.name.clone(),
            expected: self.label_names.clone(),
            got: labels.iter().map(|(k, _)| k.to_string()).collect(),
        };

        if labels.len() != self.label_names.len() {
            return Err(mismatch());
        }

        self.label_names
            .iter()
            .map(|name| {
                labels
                    .iter()
                    .find(|(k, _)| k == name)
                    .map(|(_, v)| v.to_string())
                    .ok_or_else(mismatch)
            })
            .collect()
    }

    pub(crate) fn observe(&self, labels: &[(&str, &str)], value: f64) -> Result<()> {
        if value.is_nan() {
            return Err(IngestError::InvalidObservation(format!(
                "{}: value is NaN",
                self.name
            )));
        }
        let key = self.label_values(labels)?;

        // Bounds are strictly increasing: every bucket from `first` on has bound >= value.
        let first = self.bounds.partition_point(|b| *b < value);

        let mut cell = self
            .cells
            .entry(key)
            .or_insert_with(|| HistogramCell::new(self.bounds.len()));
        for c in &mut cell.buckets[first..] {
            *c += 1;
        }
        cell.sum += value;
        cell.count += 1;
        Ok(())
    }

    pub(crate) fn snapshot(&self) -> SeriesSnapshot {
        let mut cells: Vec<CellSnapshot> = self
            .cells
            .iter()
            .map(|r| {
                let cell = r.value();
                CellSnapshot {
                    label_values: r.key().clone(),
                    buckets: cell.buckets.clone(),
                    sum: cell.sum,
                    count: cell.count,
                }
            })
            .collect();
        cells.sort_by(|a, b| a.label_values.cmp(&b.label_values));

        SeriesSnapshot {
            name: self.name.clone(),
            help: self.help.clone(),
            label_names: self.label_names.clone(),
            bounds: Arc::clone(&self.bounds),
            cells,
        }
    }
}

/// Point-in-time copy of one series.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSnapshot {
    pub name: String,
    pub help: String,
    pub label_names: Vec<String>,
    /// Finite upper bounds; `+Inf` is implicit.
    pub bounds: Arc<[f64]>,
    /// Sorted by label values.
    pub cells: Vec<CellSnapshot>,
}

impl SeriesSnapshot {
    /// Find the cell for a label set (pair order does not matter).
    pub fn cell(&self, labels: &[(&str, &str)]) -> Option<&CellSnapshot> {
        if labels.len() != self.label_names.len() {
            return None;
        }
        let wanted: Option<Vec<&str>> = self
            .label_names
            .iter()
            .map(|name| labels.iter().find(|(k, _)| k == name).map(|(_, v)| *v))
            .collect();
        let wanted = wanted?;
        self.cells
            .iter()
            .find(|c| c.label_values.iter().map(String::as_str).eq(wanted.iter().copied()))
    }

    /// Sum of counts across all label combinations.
    pub fn total_count(&self) -> u64 {
        self.cells.iter().map(|c| c.count).sum()
    }
}

/// Counters of one label combination at snapshot time.
#[derive(Debug, Clone, PartialEq)]
pub struct CellSnapshot {
    /// Values in declared label-name order.
    pub label_values: Vec<String>,
    /// Cumulative count per finite bound.
    pub buckets: Vec<u64>,
    pub sum: f64,
    pub count: u64,
}
