//! Cluster analysis module

pub mod louvain;
pub mod detection;
pub mod metrics;
pub mod aggregate;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A sampled member of a cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterMember {
    pub slug: String,
    pub outbound: usize,
    pub created_at: Option<DateTime<Utc>>,
}

/// A community of pages in the exported snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    /// Dense identifier, referenced by `ClusterLink`
    pub id: usize,

    /// Number of member pages
    pub size: usize,

    /// Members with the most outbound links, capped per cluster
    pub sample: Vec<ClusterMember>,

    /// Links with both endpoints in this cluster
    pub internal_links: usize,

    /// Links with exactly one endpoint in this cluster
    pub external_links: usize,

    pub oldest_created_at: Option<DateTime<Utc>>,

    pub newest_created_at: Option<DateTime<Utc>>,
}

/// Links crossing between two clusters; `source < target`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterLink {
    pub source: usize,
    pub target: usize,
    pub weight: usize,
}
