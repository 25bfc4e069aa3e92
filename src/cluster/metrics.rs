//! Partition quality metrics

use crate::graph::WeightedGraph;
use itertools::Itertools;

/// Number of distinct community ids in a partition
pub fn count_unique(partition: &[usize]) -> usize {
    partition.iter().unique().count()
}

/// Modularity of a partition of `graph` at the given resolution.
///
/// Q = Σ_c [ in_c / m - resolution * (tot_c / 2m)² ], where `in_c` is the
/// weight inside community c (self-loops included) and `tot_c` the sum of its
/// member degrees.
pub fn modularity(graph: &WeightedGraph, partition: &[usize], resolution: f64) -> f64 {
    let m = graph.total_weight();
    if m == 0.0 || partition.is_empty() {
        return 0.0;
    }

    let community_count = partition.iter().max().map_or(0, |&max| max + 1);
    let mut internal = vec![0.0; community_count];
    let mut degree = vec![0.0; community_count];

    for node in 0..graph.node_count() {
        let community = partition[node];
        degree[community] += graph.degree(node);
        internal[community] += graph.loop_weight(node);

        for neighbor in graph.neighbors(node) {
            if neighbor.node > node && partition[neighbor.node] == community {
                internal[community] += neighbor.weight;
            }
        }
    }

    internal
        .iter()
        .zip(&degree)
        .map(|(&inside, &total)| inside / m - resolution * (total / (2.0 * m)).powi(2))
        .sum()
}
