//! Observability: request timing, process gauges and the metrics exporter.
//!
//! The histogram registry itself lives in `ingestor_core::metrics`; this module
//! wires it into the HTTP stack.

pub mod exporter;
pub mod process;
pub mod timing;
