//! End-to-end snapshot generation

use crate::cluster::aggregate::summarize_clusters;
use crate::cluster::detection::detect_communities;
use crate::config::Config;
use crate::data::preprocessing::sanitize;
use crate::data::{Edge, Node};
use crate::graph::algorithms::graph_stats;
use crate::graph::build_link_graph;
use crate::storage::{save_snapshot, Snapshot, Totals};
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::path::Path;

/// Cluster the link graph and assemble a snapshot stamped with `generated_at`.
///
/// Identical input and configuration always produce an identical snapshot.
pub fn build_snapshot(
    nodes: &[Node],
    edges: &[Edge],
    config: &Config,
    generated_at: DateTime<Utc>,
) -> Snapshot {
    let (nodes, edges, _) = sanitize(nodes, edges);
    if nodes.is_empty() {
        log::info!("No pages to cluster");
        return Snapshot::empty(generated_at);
    }

    let keys: Vec<&str> = nodes.iter().map(|n| n.slug.as_str()).collect();
    let graph = build_link_graph(&keys, &edges);

    let stats = graph_stats(&graph.weighted);
    log::info!(
        "Link graph: {} nodes, {} linked pairs, {} components (largest {}), {} isolated",
        stats.node_count,
        stats.pair_count,
        stats.components,
        stats.largest_component,
        stats.isolated_nodes
    );

    let assignment = detect_communities(&graph, config);
    let summary = summarize_clusters(
        &nodes,
        &assignment.communities,
        &edges,
        config.max_cluster_sample,
    );

    log::info!(
        "Found {} clusters and {} cluster links",
        summary.clusters.len(),
        summary.links.len()
    );

    Snapshot {
        generated_at,
        totals: Totals {
            pages: nodes.len(),
            links: summary.counted_edges,
            clusters: summary.clusters.len(),
        },
        clusters: summary.clusters,
        links: summary.links,
    }
}

/// Build a snapshot stamped with the current time and write it to
/// `destination` when one is given
pub fn export(
    nodes: &[Node],
    edges: &[Edge],
    config: &Config,
    destination: Option<&Path>,
) -> Result<Snapshot> {
    config.validate()?;

    let snapshot = build_snapshot(nodes, edges, config, Utc::now());

    if let Some(path) = destination {
        save_snapshot(&snapshot, path)?;
    }

    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_without_destination_only_computes() {
        let nodes = vec![Node::new("a"), Node::new("b")];
        let snapshot = export(&nodes, &[Edge::new("a", "b")], &Config::default(), None).unwrap();

        assert_eq!(snapshot.totals.pages, 2);
        assert_eq!(snapshot.totals.links, 1);
    }

    #[test]
    fn export_rejects_invalid_config() {
        let config = Config {
            max_cluster_sample: 0,
            ..Config::default()
        };
        assert!(export(&[], &[], &config, None).is_err());
    }

    #[test]
    fn degenerate_policy_still_places_every_page() {
        let config = Config {
            small_target_divisor: 0,
            min_clusters: 0,
            fallback_nodes_per_cluster: 0,
            max_optimizer_nodes: 0,
            ..Config::default()
        };
        let nodes = vec![Node::new("a"), Node::new("b"), Node::new("c")];
        let edges = vec![Edge::new("a", "b")];

        let snapshot = build_snapshot(&nodes, &edges, &config, Utc::now());

        assert_eq!(snapshot.totals.pages, 3);
        assert!(snapshot.totals.clusters >= 1);
        assert_eq!(snapshot.clusters.iter().map(|c| c.size).sum::<usize>(), 3);
    }

    #[test]
    fn export_writes_destination() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("constellation.json");
        let nodes = vec![Node::new("a")];

        let snapshot = export(&nodes, &[], &Config::default(), Some(&path)).unwrap();

        assert_eq!(crate::storage::load_snapshot(&path).unwrap(), snapshot);
    }
}
