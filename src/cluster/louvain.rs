//! Multi-level Louvain modularity optimization.
//!
//! Each level runs a local-moving phase: nodes are visited in a seeded
//! shuffled order and moved to the neighboring community with the largest
//! positive modularity gain
//!
//! ```text
//! gain = k_i,in - resolution * Σ_tot * k_i / 2m
//! ```
//!
//! until a full sweep moves nothing. The communities found are then collapsed
//! into super-nodes (internal edges become self-loops) and the next level runs
//! on the aggregated graph. The first level that moves nothing ends the run;
//! the per-level mappings are composed to obtain the partition of the
//! original nodes.

use crate::graph::weighted::{Accumulator, WeightedGraph};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::borrow::Cow;

/// Seed used by `optimize` and `Louvain::new`
pub const DEFAULT_SEED: u64 = 42;

const DEFAULT_MAX_SWEEPS: usize = 1000;

/// Louvain community detection with a fixed visitation seed
#[derive(Debug, Clone)]
pub struct Louvain {
    /// Resolution parameter (higher = more, smaller communities)
    resolution: f64,

    /// Seed for the node visitation order
    seed: u64,

    /// Safety bound on local-moving sweeps per level
    max_sweeps: usize,
}

impl Default for Louvain {
    fn default() -> Self {
        Self::new()
    }
}

impl Louvain {
    pub fn new() -> Self {
        Self {
            resolution: 1.0,
            seed: DEFAULT_SEED,
            max_sweeps: DEFAULT_MAX_SWEEPS,
        }
    }

    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_sweeps(mut self, max_sweeps: usize) -> Self {
        self.max_sweeps = max_sweeps.max(1);
        self
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Community of every node, with dense ids in order of first appearance
    pub fn optimize(&self, graph: &WeightedGraph) -> Vec<usize> {
        self.dendrogram(graph).best_partition()
    }

    /// Run all aggregation levels and keep each level's mapping
    pub fn dendrogram(&self, graph: &WeightedGraph) -> Dendrogram {
        let mut dendrogram = Dendrogram::default();
        if graph.is_empty() {
            return dendrogram;
        }

        // Generator is local to this run
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut level_graph: Cow<'_, WeightedGraph> = Cow::Borrowed(graph);

        loop {
            let mut status = CommunityStatus::new(&level_graph);
            let moved = self.one_level(&level_graph, &mut status, &mut rng);
            let (partition, community_count) = renumber(&status.node_community);

            log::debug!(
                "Louvain level {}: {} nodes -> {} communities (resolution {}, modularity {:.4})",
                dendrogram.len(),
                level_graph.node_count(),
                community_count,
                self.resolution,
                status.modularity(&level_graph, self.resolution)
            );

            if !moved {
                dendrogram.push(partition);
                break;
            }

            let aggregated = induced_graph(&partition, community_count, &level_graph);
            dendrogram.push(partition);
            level_graph = Cow::Owned(aggregated);
        }

        dendrogram
    }

    /// Local-moving phase; returns whether any node changed community
    fn one_level(
        &self,
        graph: &WeightedGraph,
        status: &mut CommunityStatus,
        rng: &mut ChaCha8Rng,
    ) -> bool {
        let n = graph.node_count();
        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(rng);

        let m2 = 2.0 * graph.total_weight();
        let mut weights = NeighborWeights::new(n);
        let mut moved_any = false;

        for _ in 0..self.max_sweeps {
            let mut moved = false;

            for &node in &order {
                let current = status.node_community[node];
                let node_degree = graph.degree(node);

                weights.collect(node, graph, &status.node_community);
                let weight_in_current = weights.get(current);
                status.remove(graph, node, current, weight_in_current);

                let best = if node_degree == 0.0 || m2 == 0.0 {
                    current
                } else {
                    self.best_community(&weights, status, current, node_degree, m2)
                };

                status.insert(graph, node, best, weights.get(best));
                if best != current {
                    moved = true;
                    moved_any = true;
                }
            }

            if !moved {
                return moved_any;
            }
        }

        log::warn!(
            "Local moving stopped after {} sweeps without settling",
            self.max_sweeps
        );
        moved_any
    }

    /// Community with the strictly largest positive gain; ties keep the
    /// current community, otherwise go to the smallest id
    fn best_community(
        &self,
        weights: &NeighborWeights,
        status: &CommunityStatus,
        current: usize,
        node_degree: f64,
        m2: f64,
    ) -> usize {
        let mut best: Option<(usize, f64)> = None;

        for &community in weights.communities() {
            let gain = weights.get(community)
                - self.resolution * status.community_degree[community] * node_degree / m2;
            if gain <= 0.0 {
                continue;
            }

            best = match best {
                Some((incumbent, best_gain)) if best_gain > gain => Some((incumbent, best_gain)),
                Some((incumbent, best_gain)) if best_gain == gain => {
                    let preferred = if incumbent == current || community == current {
                        current
                    } else {
                        incumbent.min(community)
                    };
                    Some((preferred, best_gain))
                }
                _ => Some((community, gain)),
            };
        }

        best.map_or(current, |(community, _)| community)
    }
}

/// Optimize with the default seed at the given resolution
pub fn optimize(graph: &WeightedGraph, resolution: f64) -> Vec<usize> {
    Louvain::new().with_resolution(resolution).optimize(graph)
}

/// Transient per-level optimization state over dense community ids
#[derive(Debug, Clone)]
pub struct CommunityStatus {
    /// Community of each node
    node_community: Vec<usize>,

    /// Sum of member degrees per community
    community_degree: Vec<f64>,

    /// Weight of edges inside each community (self-loops included, each edge once)
    community_internal: Vec<f64>,
}

impl CommunityStatus {
    /// Every node starts in its own singleton community
    pub fn new(graph: &WeightedGraph) -> Self {
        let n = graph.node_count();
        Self {
            node_community: (0..n).collect(),
            community_degree: (0..n).map(|node| graph.degree(node)).collect(),
            community_internal: (0..n).map(|node| graph.loop_weight(node)).collect(),
        }
    }

    pub fn community_of(&self, node: usize) -> usize {
        self.node_community[node]
    }

    fn remove(&mut self, graph: &WeightedGraph, node: usize, community: usize, weight_in: f64) {
        self.community_degree[community] -= graph.degree(node);
        self.community_internal[community] -= weight_in + graph.loop_weight(node);
    }

    fn insert(&mut self, graph: &WeightedGraph, node: usize, community: usize, weight_in: f64) {
        self.node_community[node] = community;
        self.community_degree[community] += graph.degree(node);
        self.community_internal[community] += weight_in + graph.loop_weight(node);
    }

    /// Modularity of the current assignment
    pub fn modularity(&self, graph: &WeightedGraph, resolution: f64) -> f64 {
        let m = graph.total_weight();
        if m == 0.0 {
            return 0.0;
        }

        self.community_internal
            .iter()
            .zip(&self.community_degree)
            .map(|(&internal, &degree)| {
                internal / m - resolution * (degree / (2.0 * m)).powi(2)
            })
            .sum()
    }
}

/// Sparse accumulator of edge weight from one node to each neighboring community
#[derive(Debug)]
struct NeighborWeights {
    weights: Vec<f64>,
    in_use: Vec<bool>,
    touched: Vec<usize>,
}

impl NeighborWeights {
    fn new(community_count: usize) -> Self {
        Self {
            weights: vec![0.0; community_count],
            in_use: vec![false; community_count],
            touched: Vec::with_capacity(8),
        }
    }

    fn collect(&mut self, node: usize, graph: &WeightedGraph, node_community: &[usize]) {
        for &community in &self.touched {
            self.weights[community] = 0.0;
            self.in_use[community] = false;
        }
        self.touched.clear();

        for neighbor in graph.neighbors(node) {
            let community = node_community[neighbor.node];
            if !self.in_use[community] {
                self.in_use[community] = true;
                self.touched.push(community);
            }
            self.weights[community] += neighbor.weight;
        }
    }

    fn get(&self, community: usize) -> f64 {
        self.weights[community]
    }

    fn communities(&self) -> &[usize] {
        &self.touched
    }
}

/// Per-level community mappings, finest first.
///
/// Level 0 maps original nodes to first-level communities; level `i` maps the
/// communities of level `i - 1` to coarser ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dendrogram {
    levels: Vec<Vec<usize>>,
}

impl Dendrogram {
    pub fn push(&mut self, partition: Vec<usize>) {
        self.levels.push(partition);
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn levels(&self) -> &[Vec<usize>] {
        &self.levels
    }

    /// Partition of the original nodes after composing levels `0..=level`
    pub fn partition_at_level(&self, level: usize) -> Vec<usize> {
        let Some(first) = self.levels.first() else {
            return Vec::new();
        };
        let last = level.min(self.levels.len() - 1);

        let mut result = first.clone();
        for next in &self.levels[1..=last] {
            for community in result.iter_mut() {
                *community = next[*community];
            }
        }
        result
    }

    /// Coarsest partition, renumbered densely
    pub fn best_partition(&self) -> Vec<usize> {
        if self.levels.is_empty() {
            return Vec::new();
        }
        renumber(&self.partition_at_level(self.levels.len() - 1)).0
    }
}

/// Renumber community ids densely in order of first appearance
pub fn renumber(partition: &[usize]) -> (Vec<usize>, usize) {
    let mut mapping = vec![usize::MAX; partition.len()];
    let mut next = 0;
    let mut result = Vec::with_capacity(partition.len());

    for &community in partition {
        if community >= mapping.len() {
            mapping.resize(community + 1, usize::MAX);
        }
        if mapping[community] == usize::MAX {
            mapping[community] = next;
            next += 1;
        }
        result.push(mapping[community]);
    }

    (result, next)
}

/// Collapse each community into one node; internal edges become self-loops
pub fn induced_graph(
    partition: &[usize],
    community_count: usize,
    graph: &WeightedGraph,
) -> WeightedGraph {
    let mut acc = Accumulator::new(community_count);

    for node in 0..graph.node_count() {
        let community = partition[node];

        let loop_weight = graph.loop_weight(node);
        if loop_weight != 0.0 {
            acc.add_loop(community, loop_weight);
        }

        for neighbor in graph.neighbors(node) {
            // Each undirected edge once
            if neighbor.node < node {
                continue;
            }
            acc.add_edge(community, partition[neighbor.node], neighbor.weight);
        }
    }

    acc.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Edge;
    use crate::graph::build_link_graph;

    fn graph_of(keys: &[&str], pairs: &[(&str, &str)]) -> WeightedGraph {
        let edges: Vec<Edge> = pairs.iter().map(|(s, t)| Edge::new(*s, *t)).collect();
        build_link_graph(keys, &edges).weighted
    }

    fn two_triangles() -> WeightedGraph {
        graph_of(
            &["a", "b", "c", "d", "e", "f"],
            &[
                ("a", "b"),
                ("b", "c"),
                ("c", "a"),
                ("d", "e"),
                ("e", "f"),
                ("f", "d"),
            ],
        )
    }

    /// Hub linked once to each of two leaves
    fn fork() -> WeightedGraph {
        graph_of(&["hub", "x", "y"], &[("hub", "x"), ("hub", "y")])
    }

    #[test]
    fn separates_disjoint_triangles() {
        let partition = optimize(&two_triangles(), 1.0);

        assert_eq!(partition[0], partition[1]);
        assert_eq!(partition[1], partition[2]);
        assert_eq!(partition[3], partition[4]);
        assert_eq!(partition[4], partition[5]);
        assert_ne!(partition[0], partition[3]);
    }

    #[test]
    fn ids_are_dense_in_first_appearance_order() {
        let partition = optimize(&two_triangles(), 1.0);
        assert_eq!(partition, vec![0, 0, 0, 1, 1, 1]);
    }

    #[test]
    fn triangles_joined_by_a_bridge_stay_apart() {
        let graph = graph_of(
            &["a", "b", "c", "d", "e", "f"],
            &[
                ("a", "b"),
                ("b", "c"),
                ("c", "a"),
                ("d", "e"),
                ("e", "f"),
                ("f", "d"),
                ("c", "d"),
            ],
        );
        let partition = optimize(&graph, 1.0);

        assert_eq!(partition[0], partition[2]);
        assert_eq!(partition[3], partition[5]);
        assert_ne!(partition[2], partition[3]);
    }

    #[test]
    fn isolated_nodes_keep_singletons() {
        let graph = graph_of(&["solo", "alone", "apart"], &[]);
        assert_eq!(optimize(&graph, 1.0), vec![0, 1, 2]);
    }

    #[test]
    fn isolate_next_to_an_edge_is_not_absorbed() {
        let graph = graph_of(&["a", "b", "lonely"], &[("a", "b")]);
        let partition = optimize(&graph, 1.0);

        assert_eq!(partition[0], partition[1]);
        assert_ne!(partition[2], partition[0]);
    }

    #[test]
    fn empty_graph_yields_empty_partition() {
        assert!(optimize(&WeightedGraph::default(), 1.0).is_empty());
        assert!(Louvain::new().dendrogram(&WeightedGraph::default()).is_empty());
    }

    #[test]
    fn same_seed_same_partition() {
        let mut pairs = Vec::new();
        let keys: Vec<String> = (0..60).map(|i| format!("n{}", i)).collect();
        for i in 0..60 {
            pairs.push((keys[i].clone(), keys[(i + 1) % 60].clone()));
            pairs.push((keys[i].clone(), keys[(i * 7 + 3) % 60].clone()));
        }
        let edges: Vec<Edge> = pairs.iter().map(|(s, t)| Edge::new(s, t)).collect();
        let graph = build_link_graph(&keys, &edges).weighted;

        let louvain = Louvain::new().with_seed(7);
        assert_eq!(louvain.optimize(&graph), louvain.optimize(&graph));
    }

    #[test]
    fn higher_resolution_gives_more_communities() {
        let graph = graph_of(
            &["a", "b", "c", "d"],
            &[
                ("a", "b"),
                ("b", "c"),
                ("c", "d"),
                ("d", "a"),
                ("a", "c"),
                ("b", "d"),
            ],
        );
        let coarse = optimize(&graph, 1.0);
        let fine = optimize(&graph, 10.0);

        let count = |p: &[usize]| p.iter().max().map_or(0, |m| m + 1);
        assert_eq!(count(&coarse), 1);
        assert_eq!(count(&fine), 4);
    }

    #[test]
    fn equal_gains_go_to_the_smallest_community() {
        let graph = fork();
        let mut status = CommunityStatus::new(&graph);
        // Leaves swap ids so the larger community is seen first
        status.node_community = vec![0, 2, 1];
        let mut weights = NeighborWeights::new(graph.node_count());
        weights.collect(0, &graph, &status.node_community);
        assert_eq!(weights.communities(), &[2, 1]);

        let chosen = Louvain::new().best_community(&weights, &status, 0, graph.degree(0), 4.0);
        assert_eq!(chosen, 1);
    }

    #[test]
    fn equal_gain_keeps_the_current_community() {
        let graph = fork();
        let mut status = CommunityStatus::new(&graph);
        status.node_community = vec![2, 1, 2];
        status.community_degree = vec![0.0, 1.0, 1.0];
        let mut weights = NeighborWeights::new(graph.node_count());
        weights.collect(0, &graph, &status.node_community);
        assert_eq!(weights.communities(), &[1, 2]);

        let chosen = Louvain::new().best_community(&weights, &status, 2, graph.degree(0), 4.0);
        assert_eq!(chosen, 2);
    }

    #[test]
    fn no_positive_gain_stays_put() {
        let graph = fork();
        let status = CommunityStatus::new(&graph);
        let mut weights = NeighborWeights::new(graph.node_count());
        weights.collect(0, &graph, &status.node_community);

        let chosen = Louvain::new()
            .with_resolution(10.0)
            .best_community(&weights, &status, 0, graph.degree(0), 4.0);
        assert_eq!(chosen, 0);
    }

    #[test]
    fn dendrogram_levels_compose() {
        let mut dendrogram = Dendrogram::default();
        dendrogram.push(vec![0, 0, 1, 1, 2, 2]);
        dendrogram.push(vec![0, 0, 1]);

        assert_eq!(dendrogram.partition_at_level(0), vec![0, 0, 1, 1, 2, 2]);
        assert_eq!(dendrogram.partition_at_level(1), vec![0, 0, 0, 0, 1, 1]);
        assert_eq!(dendrogram.partition_at_level(9), vec![0, 0, 0, 0, 1, 1]);
        assert_eq!(dendrogram.best_partition(), vec![0, 0, 0, 0, 1, 1]);
    }

    #[test]
    fn renumber_uses_first_appearance() {
        assert_eq!(renumber(&[5, 2, 5, 9, 2]), (vec![0, 1, 0, 2, 1], 3));
        assert_eq!(renumber(&[]), (vec![], 0));
    }

    #[test]
    fn induced_graph_preserves_total_weight() {
        let graph = graph_of(
            &["a", "b", "c", "d"],
            &[
                ("a", "b"),
                ("b", "c"),
                ("c", "d"),
                ("a", "a"),
            ],
        );
        let induced = induced_graph(&[0, 0, 1, 1], 2, &graph);

        assert_eq!(induced.node_count(), 2);
        assert_eq!(induced.total_weight(), graph.total_weight());
        assert_eq!(induced.loop_weight(0), 2.0);
        assert_eq!(induced.loop_weight(1), 1.0);
        assert_eq!(induced.edge_weight(0, 1), 1.0);
        assert_eq!(induced.degree(0), 5.0);
        assert_eq!(induced.degree(1), 3.0);
    }

    #[test]
    fn status_modularity_of_singletons_is_negative() {
        let graph = two_triangles();
        let status = CommunityStatus::new(&graph);
        assert!(status.modularity(&graph, 1.0) < 0.0);
        assert_eq!(status.community_of(4), 4);
    }
}
