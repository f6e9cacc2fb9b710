//! Top-level facade crate for ingestor.
//!
//! Re-exports core types and the gateway library so users can depend on a single crate.

pub mod core {
    pub use ingestor_core::*;
}

pub mod gateway {
    pub use ingestor_gateway::*;
}
