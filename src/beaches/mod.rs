//! Beach data module
//!
//! Contains the upstream types, data sources, enrichment, ranking and the
//! per-tool pipelines built on them.

pub mod client;
pub mod pipeline;
pub mod ranking;
pub mod transform;
pub mod types;
