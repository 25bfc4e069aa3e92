//! Data preprocessing module for link graph input

use crate::data::{Edge, Node};
use std::collections::HashSet;

/// Counts of records dropped while sanitizing input
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SanitizeReport {
    pub duplicate_nodes: usize,
    pub self_references: usize,
    pub dangling_edges: usize,
    pub duplicate_edges: usize,
}

impl SanitizeReport {
    pub fn dropped_edges(&self) -> usize {
        self.self_references + self.dangling_edges + self.duplicate_edges
    }
}

/// Drop duplicate node keys, keeping the first occurrence
pub fn dedupe_nodes(nodes: &[Node]) -> (Vec<Node>, usize) {
    let mut seen: HashSet<&str> = HashSet::with_capacity(nodes.len());
    let mut kept = Vec::with_capacity(nodes.len());
    let mut duplicates = 0;

    for node in nodes {
        if seen.insert(node.slug.as_str()) {
            kept.push(node.clone());
        } else {
            duplicates += 1;
        }
    }

    (kept, duplicates)
}

/// Filter edges the way link extraction does: no self references, no
/// references to unknown pages, and each (source, target) pair once.
/// Input order of surviving edges is preserved.
pub fn filter_edges(nodes: &[Node], edges: &[Edge]) -> (Vec<Edge>, SanitizeReport) {
    let known: HashSet<&str> = nodes.iter().map(|n| n.slug.as_str()).collect();
    let mut seen: HashSet<(&str, &str)> = HashSet::with_capacity(edges.len());
    let mut report = SanitizeReport::default();
    let mut kept = Vec::with_capacity(edges.len());

    for edge in edges {
        if edge.source == edge.target {
            report.self_references += 1;
            continue;
        }
        if !known.contains(edge.source.as_str()) || !known.contains(edge.target.as_str()) {
            report.dangling_edges += 1;
            continue;
        }
        if !seen.insert((edge.source.as_str(), edge.target.as_str())) {
            report.duplicate_edges += 1;
            continue;
        }
        kept.push(edge.clone());
    }

    (kept, report)
}

/// Sanitize a raw node and edge list before building the graph
pub fn sanitize(nodes: &[Node], edges: &[Edge]) -> (Vec<Node>, Vec<Edge>, SanitizeReport) {
    let (nodes, duplicate_nodes) = dedupe_nodes(nodes);
    let (edges, mut report) = filter_edges(&nodes, edges);
    report.duplicate_nodes = duplicate_nodes;

    if duplicate_nodes > 0 {
        log::warn!("Dropped {} duplicate node keys", duplicate_nodes);
    }
    if report.dropped_edges() > 0 {
        log::debug!(
            "Dropped {} edges ({} self references, {} dangling, {} duplicates)",
            report.dropped_edges(),
            report.self_references,
            report.dangling_edges,
            report.duplicate_edges
        );
    }

    (nodes, edges, report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes(keys: &[&str]) -> Vec<Node> {
        keys.iter().map(|k| Node::new(*k)).collect()
    }

    #[test]
    fn duplicate_nodes_keep_first() {
        let input = vec![
            Node::new("a").with_outbound(3),
            Node::new("b"),
            Node::new("a").with_outbound(7),
        ];
        let (kept, dupes) = dedupe_nodes(&input);
        assert_eq!(dupes, 1);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].outbound, 3);
    }

    #[test]
    fn edges_are_filtered_like_link_extraction() {
        let nodes = nodes(&["a", "b", "c"]);
        let edges = vec![
            Edge::new("a", "b"),
            Edge::new("a", "a"),
            Edge::new("a", "missing"),
            Edge::new("ghost", "c"),
            Edge::new("a", "b"),
            Edge::new("b", "a"),
        ];

        let (kept, report) = filter_edges(&nodes, &edges);
        assert_eq!(kept, vec![Edge::new("a", "b"), Edge::new("b", "a")]);
        assert_eq!(report.self_references, 1);
        assert_eq!(report.dangling_edges, 2);
        assert_eq!(report.duplicate_edges, 1);
        assert_eq!(report.dropped_edges(), 4);
    }

    #[test]
    fn sanitize_filters_against_deduped_nodes() {
        let input = vec![Node::new("a"), Node::new("a"), Node::new("b")];
        let (nodes, edges, report) = sanitize(&input, &[Edge::new("a", "b")]);
        assert_eq!(nodes.len(), 2);
        assert_eq!(edges.len(), 1);
        assert_eq!(report.duplicate_nodes, 1);
    }
}
