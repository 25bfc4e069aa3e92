//! Configuration management for the constellation exporter

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunable policy for community detection and export.
///
/// Every field has a default; a JSON config file only needs the fields it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seed for the node visitation order of the optimizer
    pub seed: u64,

    /// Maximum number of members listed per exported cluster
    pub max_cluster_sample: usize,

    /// Community count aimed for on graphs with at least this many nodes
    pub target_cluster_count: usize,

    /// Smaller graphs aim for `node_count / small_target_divisor` communities
    pub small_target_divisor: usize,

    /// Lower bound on the community target and the fallback bucket count
    pub min_clusters: usize,

    /// Graphs below this node count use `small_graph_resolutions`
    pub small_graph_threshold: usize,

    /// Resolution ladder for large graphs, tried in order
    pub large_graph_resolutions: Vec<f64>,

    /// Resolution ladder for small graphs, tried in order
    pub small_graph_resolutions: Vec<f64>,

    /// Multiplier applied to the last ladder entry when the target is missed
    pub escalation_factor: f64,

    /// Number of escalated retries before falling back
    pub escalation_attempts: usize,

    /// The fallback partitioner creates one bucket per this many nodes
    pub fallback_nodes_per_cluster: usize,

    /// Upper bound on fallback buckets
    pub fallback_max_clusters: usize,

    /// Graphs above this node count skip the optimizer entirely
    pub max_optimizer_nodes: usize,

    /// Upper bound on local-moving sweeps per aggregation level
    pub max_sweeps: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: 42,
            max_cluster_sample: 40,
            target_cluster_count: 20,
            small_target_divisor: 3,
            min_clusters: 2,
            small_graph_threshold: 500,
            large_graph_resolutions: vec![3.4, 2.6, 2.0, 1.6, 1.3, 1.0],
            small_graph_resolutions: vec![1.0, 0.8, 0.6],
            escalation_factor: 1.5,
            escalation_attempts: 4,
            fallback_nodes_per_cluster: 5000,
            fallback_max_clusters: 64,
            max_optimizer_nodes: 2_000_000,
            max_sweeps: 1000,
        }
    }
}

impl Config {
    /// Load a configuration from a JSON file, defaulting absent fields
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let config: Config = serde_json::from_str(&raw)
            .with_context(|| format!("parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the detection pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.max_cluster_sample == 0 {
            anyhow::bail!("max_cluster_sample must be positive");
        }
        if self.min_clusters == 0 {
            anyhow::bail!("min_clusters must be positive");
        }
        if self.small_target_divisor == 0 {
            anyhow::bail!("small_target_divisor must be positive");
        }
        if self.fallback_nodes_per_cluster == 0 {
            anyhow::bail!("fallback_nodes_per_cluster must be positive");
        }
        if self.fallback_max_clusters < self.min_clusters {
            anyhow::bail!(
                "fallback_max_clusters ({}) is below min_clusters ({})",
                self.fallback_max_clusters,
                self.min_clusters
            );
        }
        if self.max_sweeps == 0 {
            anyhow::bail!("max_sweeps must be positive");
        }
        if self.escalation_factor.is_nan() || self.escalation_factor <= 1.0 {
            anyhow::bail!("escalation_factor must be greater than 1");
        }
        for (name, ladder) in [
            ("large_graph_resolutions", &self.large_graph_resolutions),
            ("small_graph_resolutions", &self.small_graph_resolutions),
        ] {
            if ladder.is_empty() {
                anyhow::bail!("{} must not be empty", name);
            }
            if ladder.iter().any(|r| !r.is_finite() || *r <= 0.0) {
                anyhow::bail!("{} must hold positive finite values", name);
            }
        }
        Ok(())
    }

    /// Resolution ladder for a graph of the given size
    pub fn resolutions_for(&self, node_count: usize) -> &[f64] {
        if node_count < self.small_graph_threshold {
            &self.small_graph_resolutions
        } else {
            &self.large_graph_resolutions
        }
    }

    /// Number of communities the search aims for on a graph of the given size
    pub fn desired_clusters(&self, node_count: usize) -> usize {
        if node_count >= self.target_cluster_count {
            return self.target_cluster_count;
        }
        (node_count / self.small_target_divisor.max(1))
            .max(self.min_clusters.max(1))
            .min(node_count)
    }

    /// Bucket count used by the hash fallback for a graph of the given size
    pub fn fallback_clusters(&self, node_count: usize, desired: usize) -> usize {
        (node_count / self.fallback_nodes_per_cluster.max(1))
            .max(desired)
            .min(self.fallback_max_clusters)
            .min(node_count)
            .max(self.min_clusters)
            .max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn desired_clusters_scales_with_size() {
        let config = Config::default();
        assert_eq!(config.desired_clusters(10_000), 20);
        assert_eq!(config.desired_clusters(20), 20);
        assert_eq!(config.desired_clusters(12), 4);
        assert_eq!(config.desired_clusters(6), 2);
        assert_eq!(config.desired_clusters(2), 2);
        assert_eq!(config.desired_clusters(1), 1);
        assert_eq!(config.desired_clusters(0), 0);
    }

    #[test]
    fn ladder_depends_on_graph_size() {
        let config = Config::default();
        assert_eq!(config.resolutions_for(10), &[1.0, 0.8, 0.6]);
        assert_eq!(config.resolutions_for(500).len(), 6);
    }

    #[test]
    fn fallback_clusters_stay_in_bounds() {
        let config = Config::default();
        assert_eq!(config.fallback_clusters(1_000_000, 20), 64);
        assert_eq!(config.fallback_clusters(200_000, 20), 40);
        assert_eq!(config.fallback_clusters(100, 20), 20);
        assert_eq!(config.fallback_clusters(5, 2), 2);
    }

    #[test]
    fn zero_divisors_do_not_panic() {
        let config = Config {
            small_target_divisor: 0,
            min_clusters: 0,
            fallback_nodes_per_cluster: 0,
            ..Config::default()
        };
        assert_eq!(config.desired_clusters(12), 12);
        assert_eq!(config.desired_clusters(0), 0);
        assert_eq!(config.fallback_clusters(100, 20), 64);
        assert_eq!(config.fallback_clusters(0, 0), 1);
    }

    #[test]
    fn rejects_bad_policy() {
        let config = Config {
            escalation_factor: 1.0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            small_graph_resolutions: vec![],
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            fallback_max_clusters: 1,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"seed": 7, "max_cluster_sample": 5}}"#).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.max_cluster_sample, 5);
        assert_eq!(config.target_cluster_count, 20);
    }
}
