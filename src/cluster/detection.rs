//! Community detection: resolution search with a deterministic fallback

use crate::cluster::louvain::{renumber, Louvain};
use crate::cluster::metrics::{count_unique, modularity};
use crate::config::Config;
use crate::graph::LinkGraph;
use std::hash::Hasher;
use twox_hash::XxHash32;

/// How a partition was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionMethod {
    Louvain,
    HashFallback,
}

/// Community of every node of a `LinkGraph`, indexed by node id
#[derive(Debug, Clone, PartialEq)]
pub struct CommunityAssignment {
    /// Dense community id per node
    pub communities: Vec<usize>,

    /// Number of distinct communities
    pub cluster_count: usize,

    pub method: PartitionMethod,

    /// Resolution of the accepted optimizer run
    pub resolution: Option<f64>,
}

impl CommunityAssignment {
    fn fallback(communities: Vec<usize>) -> Self {
        Self {
            cluster_count: count_unique(&communities),
            communities,
            method: PartitionMethod::HashFallback,
            resolution: None,
        }
    }
}

/// Partition the graph into communities, aiming for the configured count.
///
/// The optimizer runs down the resolution ladder until it reaches the target,
/// then escalates the last resolution a bounded number of times. If the target
/// is still missed, nodes are bucketed by a hash of their key instead.
pub fn detect_communities(graph: &LinkGraph, config: &Config) -> CommunityAssignment {
    let node_count = graph.node_count();
    let desired = config.desired_clusters(node_count);

    if node_count == 0 {
        return CommunityAssignment::fallback(Vec::new());
    }

    if node_count > config.max_optimizer_nodes {
        log::warn!(
            "Graph has {} nodes (limit {}); using hash partition",
            node_count,
            config.max_optimizer_nodes
        );
        return hash_assignment(graph, config, desired);
    }

    let louvain = Louvain::new()
        .with_seed(config.seed)
        .with_max_sweeps(config.max_sweeps);

    let resolutions = config.resolutions_for(node_count);
    let mut resolution = resolutions.first().copied().unwrap_or(1.0);
    let mut partition = Vec::new();
    let mut unique = 0;

    for &candidate in resolutions {
        resolution = candidate;
        partition = louvain.clone().with_resolution(resolution).optimize(&graph.weighted);
        unique = count_unique(&partition);
        log::debug!("Resolution {}: {} communities", resolution, unique);
        if partition.is_empty() || unique >= desired {
            break;
        }
    }

    let mut attempts = 0;
    while !partition.is_empty() && unique < desired && attempts < config.escalation_attempts {
        resolution *= config.escalation_factor;
        attempts += 1;
        partition = louvain.clone().with_resolution(resolution).optimize(&graph.weighted);
        unique = count_unique(&partition);
        log::debug!("Escalated resolution {}: {} communities", resolution, unique);
    }

    if partition.is_empty() || unique < desired {
        log::info!(
            "Optimizer found {} communities, wanted {}; using hash partition",
            unique,
            desired
        );
        return hash_assignment(graph, config, desired);
    }

    log::info!(
        "Louvain found {} communities at resolution {} (modularity {:.4})",
        unique,
        resolution,
        modularity(&graph.weighted, &partition, resolution)
    );

    CommunityAssignment {
        communities: partition,
        cluster_count: unique,
        method: PartitionMethod::Louvain,
        resolution: Some(resolution),
    }
}

fn hash_assignment(graph: &LinkGraph, config: &Config, desired: usize) -> CommunityAssignment {
    let buckets = config.fallback_clusters(graph.node_count(), desired);
    let assignment = CommunityAssignment::fallback(hash_partition(
        &graph.node_ids,
        buckets,
        config.min_clusters,
    ));
    log::info!(
        "Hash partition placed {} nodes into {} clusters",
        graph.node_count(),
        assignment.cluster_count
    );
    assignment
}

/// Stable 32-bit hash of a node key
pub fn key_hash(key: &str) -> u32 {
    let mut hasher = XxHash32::with_seed(0);
    hasher.write(key.as_bytes());
    hasher.finish() as u32
}

/// Bucket nodes by key hash, independent of input order.
///
/// Keys are visited in sorted order; with at least as many buckets as nodes
/// every node gets its own bucket. When hash collisions leave fewer than
/// `min_distinct` buckets occupied, nodes are dealt round-robin by sorted
/// position instead. Bucket ids are renumbered densely in sorted-key order.
/// The result is indexed like `keys`.
pub fn hash_partition<S: AsRef<str>>(
    keys: &[S],
    buckets: usize,
    min_distinct: usize,
) -> Vec<usize> {
    let buckets = buckets.max(1);
    let mut order: Vec<usize> = (0..keys.len()).collect();
    order.sort_by(|&a, &b| keys[a].as_ref().cmp(keys[b].as_ref()));

    let mut raw: Vec<usize> = order
        .iter()
        .enumerate()
        .map(|(position, &node)| {
            if buckets >= keys.len() {
                position
            } else {
                (key_hash(keys[node].as_ref()) % buckets as u32) as usize
            }
        })
        .collect();

    let required = min_distinct.min(buckets).min(keys.len());
    if count_unique(&raw) < required {
        log::debug!(
            "Hash buckets collided below {} clusters; assigning by key order",
            required
        );
        raw = (0..keys.len()).map(|position| position % buckets).collect();
    }

    let (dense, _) = renumber(&raw);
    let mut result = vec![0; keys.len()];
    for (&node, community) in order.iter().zip(dense) {
        result[node] = community;
    }
    result
}
