// The internal layers of the clustering engine, one file per stage:
// data containers, projection capability, grouping, rendering, expansion.

pub mod cluster;
pub mod cluster_builder;
pub mod cluster_expander;
pub mod cluster_renderer;
pub mod projector;
