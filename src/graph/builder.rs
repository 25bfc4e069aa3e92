//! Graph construction module

use crate::data::Edge;
use crate::graph::weighted::{Accumulator, WeightedGraph};
use std::collections::HashMap;

/// Link graph with its node keys; node `i` of `weighted` is `node_ids[i]`
#[derive(Debug, Clone, Default)]
pub struct LinkGraph {
    /// Node keys in input order
    pub node_ids: Vec<String>,

    /// Undirected weighted view used for clustering
    pub weighted: WeightedGraph,

    /// Edges skipped because an endpoint was not a known node
    pub dropped_edges: usize,
}

impl LinkGraph {
    pub fn node_count(&self) -> usize {
        self.node_ids.len()
    }
}

/// Builder for constructing a `LinkGraph` from keys and directed edges.
///
/// Node ids are assigned densely in insertion order. Edges must reference
/// nodes added beforehand; anything else is counted and skipped.
pub struct GraphBuilder {
    /// Mapping from string IDs to node indices
    id_to_index: HashMap<String, usize>,

    /// Node string IDs
    node_ids: Vec<String>,

    /// Resolved edges as index pairs
    edges: Vec<(usize, usize)>,

    dropped_edges: usize,
}

impl GraphBuilder {
    /// Create a new graph builder with the given node capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            id_to_index: HashMap::with_capacity(capacity),
            node_ids: Vec::with_capacity(capacity),
            edges: Vec::new(),
            dropped_edges: 0,
        }
    }

    /// Get or create a node index for the given string ID
    pub fn get_or_create_node(&mut self, id: &str) -> usize {
        if let Some(&idx) = self.id_to_index.get(id) {
            return idx;
        }

        let idx = self.node_ids.len();
        self.id_to_index.insert(id.to_string(), idx);
        self.node_ids.push(id.to_string());

        idx
    }

    /// Index of a previously added node
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.id_to_index.get(id).copied()
    }

    /// Add an edge between two known nodes; returns false if it was dropped
    pub fn add_edge(&mut self, src_id: &str, dst_id: &str) -> bool {
        match (self.index_of(src_id), self.index_of(dst_id)) {
            (Some(src), Some(dst)) => {
                self.edges.push((src, dst));
                true
            }
            _ => {
                self.dropped_edges += 1;
                false
            }
        }
    }

    /// Build the link graph
    pub fn build(self) -> LinkGraph {
        let mut acc = Accumulator::new(self.node_ids.len());
        for &(src, dst) in &self.edges {
            acc.add_edge(src, dst, 1.0);
        }

        LinkGraph {
            node_ids: self.node_ids,
            weighted: acc.finish(),
            dropped_edges: self.dropped_edges,
        }
    }
}

/// Build a link graph from ordered node keys and a directed edge list
pub fn build_link_graph<S: AsRef<str>>(keys: &[S], edges: &[Edge]) -> LinkGraph {
    let mut builder = GraphBuilder::with_capacity(keys.len());
    for key in keys {
        builder.get_or_create_node(key.as_ref());
    }
    for edge in edges {
        builder.add_edge(&edge.source, &edge.target);
    }

    let graph = builder.build();
    if graph.dropped_edges > 0 {
        log::debug!("Skipped {} edges with unknown endpoints", graph.dropped_edges);
    }
    graph
}
