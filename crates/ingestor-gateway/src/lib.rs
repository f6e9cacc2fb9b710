//! ingestor gateway library entry.
//!
//! Wires config, the shared metrics registry, the request timing middleware,
//! the content endpoints and their collaborators into one axum stack. It is
//! consumed by the binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod collab;
pub mod config;
pub mod error;
pub mod obs;
pub mod ops;
pub mod router;
pub mod services;
