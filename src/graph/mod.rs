//! Graph representation and algorithms module

pub mod weighted;
pub mod builder;
pub mod algorithms;

pub use builder::{build_link_graph, GraphBuilder, LinkGraph};
pub use weighted::{Neighbor, WeightedGraph};
