//! In-process histogram registry and Prometheus text rendering.
//!
//! Series are registered once at startup and observed from any number of
//! request tasks. Values are recorded in the unit declared by the series; for
//! latency that is always seconds, converted in exactly one place
//! (`MetricsRegistry::observe_duration`).

pub mod exposition;
pub mod histogram;
pub mod registry;

pub use exposition::{render_gauge, render_snapshot, TEXT_CONTENT_TYPE};
pub use histogram::{CellSnapshot, SeriesSnapshot};
pub use registry::{MetricsRegistry, RegistrySnapshot, DEFAULT_LATENCY_BUCKETS};
