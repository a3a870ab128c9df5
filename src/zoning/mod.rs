// Adaptive hierarchical zoning: merge tree, clustering, neighbourhoods
mod adjacency;
mod cluster;
mod data;
mod lazy_distance;
mod neighbourhood;
mod system;
mod tree;

pub use system::{AdaptiveZoneSystem, ZoneSystemBuilder};
pub use tree::ZoneTree;
