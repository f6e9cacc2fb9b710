//! ingestor core: metrics registry, exposition format, error types and the
//! pure transformations applied to uploaded rows.
//!
//! This crate carries no transport or runtime dependencies so the histogram
//! registry can be exercised and reused outside the HTTP gateway.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. All fallible paths
//! surface as `IngestError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod convert;
pub mod error;
pub mod metrics;

/// Shared result type.
pub use error::{ClientCode, IngestError, Result};
