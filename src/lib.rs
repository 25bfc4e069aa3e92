//! Core library functions for the link constellation exporter

pub mod config;
pub mod data;
pub mod graph;
pub mod cluster;
pub mod storage;
pub mod pipeline;

pub use anyhow::{Result, anyhow};
pub use config::Config;
pub use pipeline::{build_snapshot, export};
pub use storage::Snapshot;
