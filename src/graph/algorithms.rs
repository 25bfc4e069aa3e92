//! Graph algorithms for diagnostics

use crate::graph::WeightedGraph;

/// Union-Find data structure for connected component analysis
pub struct DisjointSets {
    /// Parent pointers (parent[i] = parent of node i)
    parent: Vec<usize>,

    /// Size of each set (for union by size)
    size: Vec<usize>,
}

impl DisjointSets {
    /// Create a new DisjointSets data structure
    pub fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
            size: vec![1; size],
        }
    }

    /// Find the root of the set containing x with path compression
    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }

        // Path compression: point every visited node at the root
        let mut node = x;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }

        root
    }

    /// Union the sets containing x and y
    pub fn union(&mut self, x: usize, y: usize) {
        let root_x = self.find(x);
        let root_y = self.find(y);

        if root_x == root_y {
            return;
        }

        // Attach smaller tree under root of larger tree
        if self.size[root_x] >= self.size[root_y] {
            self.parent[root_y] = root_x;
            self.size[root_x] += self.size[root_y];
        } else {
            self.parent[root_x] = root_y;
            self.size[root_y] += self.size[root_x];
        }
    }

    /// Get the size of the set containing x
    pub fn set_size(&mut self, x: usize) -> usize {
        let root = self.find(x);
        self.size[root]
    }
}

/// Structural summary of a weighted graph
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphStats {
    pub node_count: usize,
    pub pair_count: usize,
    pub total_weight: f64,
    pub loop_weight: f64,
    pub isolated_nodes: usize,
    pub components: usize,
    pub largest_component: usize,
}

/// Count connected components and return (count, size of largest)
pub fn connected_components(graph: &WeightedGraph) -> (usize, usize) {
    let n = graph.node_count();
    let mut sets = DisjointSets::new(n);

    for node in 0..n {
        for neighbor in graph.neighbors(node) {
            if neighbor.node > node {
                sets.union(node, neighbor.node);
            }
        }
    }

    let mut components = 0;
    let mut largest = 0;
    for node in 0..n {
        if sets.find(node) == node {
            components += 1;
            largest = largest.max(sets.set_size(node));
        }
    }

    (components, largest)
}

/// Compute structural statistics for logging
pub fn graph_stats(graph: &WeightedGraph) -> GraphStats {
    let n = graph.node_count();
    let (components, largest_component) = connected_components(graph);

    let isolated_nodes = (0..n).filter(|&node| graph.degree(node) == 0.0).count();
    let loop_weight = (0..n).map(|node| graph.loop_weight(node)).sum();

    GraphStats {
        node_count: n,
        pair_count: graph.pair_count(),
        total_weight: graph.total_weight(),
        loop_weight,
        isolated_nodes,
        components,
        largest_component,
    }
}
