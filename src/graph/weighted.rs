//! Undirected weighted graph used by community detection

use std::collections::BTreeMap;

/// One adjacency entry: neighbor id and accumulated edge weight
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub node: usize,
    pub weight: f64,
}

/// Undirected weighted graph over dense node ids `0..node_count`.
///
/// Adjacency lists never contain the node itself: self-loop weight is kept
/// separately in `loops`. A node's degree counts its self-loop weight twice,
/// and `total_weight` counts every edge (self-loops included) once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightedGraph {
    /// Neighbors of each node, sorted by neighbor id
    adjacency: Vec<Vec<Neighbor>>,

    /// Sum of incident weights per node
    degree: Vec<f64>,

    /// Self-loop weight per node
    loops: Vec<f64>,

    /// Sum of all edge weights
    total_weight: f64,
}

impl WeightedGraph {
    /// Create a graph with `node_count` nodes and no edges
    pub fn with_nodes(node_count: usize) -> Self {
        Accumulator::new(node_count).finish()
    }

    /// Number of nodes in the graph
    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Neighbors of a node (excluding itself), sorted by id
    pub fn neighbors(&self, node: usize) -> &[Neighbor] {
        &self.adjacency[node]
    }

    pub fn degree(&self, node: usize) -> f64 {
        self.degree[node]
    }

    pub fn loop_weight(&self, node: usize) -> f64 {
        self.loops[node]
    }

    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// Weight between two distinct nodes, or the self-loop weight when equal
    pub fn edge_weight(&self, a: usize, b: usize) -> f64 {
        if a == b {
            return self.loops[a];
        }
        self.adjacency[a]
            .binary_search_by_key(&b, |n| n.node)
            .map(|idx| self.adjacency[a][idx].weight)
            .unwrap_or(0.0)
    }

    /// Number of distinct undirected neighbor pairs
    pub fn pair_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum::<usize>() / 2
    }
}

/// Accumulates weighted edges before freezing them into a `WeightedGraph`
#[derive(Debug)]
pub(crate) struct Accumulator {
    adjacency: Vec<BTreeMap<usize, f64>>,
    degree: Vec<f64>,
    loops: Vec<f64>,
    total_weight: f64,
}

impl Accumulator {
    pub(crate) fn new(node_count: usize) -> Self {
        Self {
            adjacency: vec![BTreeMap::new(); node_count],
            degree: vec![0.0; node_count],
            loops: vec![0.0; node_count],
            total_weight: 0.0,
        }
    }

    /// Add weight between two nodes; equal endpoints become self-loop weight
    pub(crate) fn add_edge(&mut self, a: usize, b: usize, weight: f64) {
        if a == b {
            self.add_loop(a, weight);
            return;
        }

        *self.adjacency[a].entry(b).or_insert(0.0) += weight;
        *self.adjacency[b].entry(a).or_insert(0.0) += weight;
        self.degree[a] += weight;
        self.degree[b] += weight;
        self.total_weight += weight;
    }

    pub(crate) fn add_loop(&mut self, node: usize, weight: f64) {
        self.loops[node] += weight;
        self.degree[node] += 2.0 * weight;
        self.total_weight += weight;
    }

    pub(crate) fn finish(self) -> WeightedGraph {
        let adjacency = self
            .adjacency
            .into_iter()
            .map(|neighbors| {
                neighbors
                    .into_iter()
                    .map(|(node, weight)| Neighbor { node, weight })
                    .collect()
            })
            .collect();

        WeightedGraph {
            adjacency,
            degree: self.degree,
            loops: self.loops,
            total_weight: self.total_weight,
        }
    }
}
