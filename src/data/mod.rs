//! Input data model and loading

pub mod json;
pub mod preprocessing;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A page in the link graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Stable key of the page
    pub slug: String,

    /// When the page was created, if known
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    /// Number of distinct internal references leaving this page
    #[serde(default)]
    pub outbound: usize,
}

impl Node {
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            created_at: None,
            outbound: 0,
        }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn with_outbound(mut self, outbound: usize) -> Self {
        self.outbound = outbound;
        self
    }
}

/// A directed reference from one page to another
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Link graph dump as written by the extraction step
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphDump {
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub nodes: Vec<Node>,

    #[serde(default)]
    pub edges: Vec<Edge>,
}
