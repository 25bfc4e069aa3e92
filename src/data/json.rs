//! JSON link graph dump handling

use anyhow::{Context, Result};
use crate::data::GraphDump;
use std::fs;
use std::path::Path;

/// Load a link graph dump from a JSON file
pub fn load_graph(path: &Path) -> Result<GraphDump> {
    log::info!("Reading link graph: {}", path.display());

    if !path.exists() {
        return Err(anyhow::anyhow!("File not found: {}", path.display()));
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("read link graph {}", path.display()))?;
    let dump = parse_graph(&raw)
        .with_context(|| format!("parse link graph {}", path.display()))?;

    log::info!(
        "Loaded {} nodes and {} edges",
        dump.nodes.len(),
        dump.edges.len()
    );

    Ok(dump)
}

/// Parse a link graph dump from its JSON text
pub fn parse_graph(raw: &str) -> Result<GraphDump> {
    Ok(serde_json::from_str(raw)?)
}
