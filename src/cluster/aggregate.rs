//! Cluster statistics from a community assignment

use crate::cluster::{Cluster, ClusterLink, ClusterMember};
use crate::data::{Edge, Node};
use chrono::{DateTime, Utc};
use itertools::Itertools;
use std::cmp::Reverse;
use std::collections::HashMap;

/// Ordered clusters and inter-cluster links
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterSummary {
    pub clusters: Vec<Cluster>,
    pub links: Vec<ClusterLink>,

    /// Edges that were counted (known endpoints, not self references)
    pub counted_edges: usize,
}

#[derive(Debug, Default)]
struct ClusterStats {
    members: Vec<ClusterMember>,
    internal_links: usize,
    external_links: usize,
    oldest: Option<DateTime<Utc>>,
    newest: Option<DateTime<Utc>>,
}

impl ClusterStats {
    fn add_member(&mut self, node: &Node) {
        if let Some(created) = node.created_at {
            self.oldest = Some(self.oldest.map_or(created, |oldest| oldest.min(created)));
            self.newest = Some(self.newest.map_or(created, |newest| newest.max(created)));
        }
        self.members.push(ClusterMember {
            slug: node.slug.clone(),
            outbound: node.outbound,
            created_at: node.created_at,
        });
    }
}

/// Build cluster records from `communities[i]`, the community of `nodes[i]`.
///
/// Clusters are ordered by size (largest first, then id); samples by outbound
/// count (highest first, then slug) truncated to `sample_cap`; links by weight
/// (heaviest first, then source, then target).
pub fn summarize_clusters(
    nodes: &[Node],
    communities: &[usize],
    edges: &[Edge],
    sample_cap: usize,
) -> ClusterSummary {
    let cluster_count = communities.iter().max().map_or(0, |&max| max + 1);
    let mut stats: Vec<ClusterStats> = (0..cluster_count).map(|_| ClusterStats::default()).collect();
    let mut community_of: HashMap<&str, usize> = HashMap::with_capacity(nodes.len());

    for (node, &community) in nodes.iter().zip(communities) {
        community_of.insert(node.slug.as_str(), community);
        stats[community].add_member(node);
    }

    let mut link_weights: HashMap<(usize, usize), usize> = HashMap::new();
    let mut counted_edges = 0;

    for edge in edges {
        if edge.source == edge.target {
            continue;
        }
        let (Some(&src), Some(&dst)) = (
            community_of.get(edge.source.as_str()),
            community_of.get(edge.target.as_str()),
        ) else {
            continue;
        };
        counted_edges += 1;

        if src == dst {
            stats[src].internal_links += 1;
            continue;
        }

        stats[src].external_links += 1;
        stats[dst].external_links += 1;
        *link_weights.entry((src.min(dst), src.max(dst))).or_insert(0) += 1;
    }

    let clusters = stats
        .into_iter()
        .enumerate()
        .filter(|(_, stats)| !stats.members.is_empty())
        .sorted_by_key(|(id, stats)| (Reverse(stats.members.len()), *id))
        .map(|(id, mut stats)| {
            let size = stats.members.len();
            stats.members.sort_by(|a, b| {
                b.outbound.cmp(&a.outbound).then_with(|| a.slug.cmp(&b.slug))
            });
            stats.members.truncate(sample_cap);

            Cluster {
                id,
                size,
                sample: stats.members,
                internal_links: stats.internal_links,
                external_links: stats.external_links,
                oldest_created_at: stats.oldest,
                newest_created_at: stats.newest,
            }
        })
        .collect();

    let links = link_weights
        .into_iter()
        .map(|((source, target), weight)| ClusterLink {
            source,
            target,
            weight,
        })
        .sorted_by_key(|link| (Reverse(link.weight), link.source, link.target))
        .collect();

    ClusterSummary {
        clusters,
        links,
        counted_edges,
    }
}
