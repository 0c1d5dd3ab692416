// THEORY:
// This file is the main entry point for the `marker_cluster` library crate.
// It follows the standard Rust convention of using `lib.rs` to define the
// public API that will be exposed to external consumers (the hosting map UI).
//
// The primary goal is to export the `ClusterPipeline` and its associated data
// structures (`ClusterConfig`, `Cluster`, the capability traits) as the
// clean, high-level interface for the entire clustering engine. The internal
// layers (`core_modules`) remain reachable for hosts that want to call the
// build/render/expand stages individually.

pub mod core_modules;
pub mod pipeline;

pub use core_modules::cluster::{Cluster, GeoBounds, GeoPoint, LatLng};
pub use core_modules::cluster_expander::{IdleCallback, IdleHandle, Viewport};
pub use core_modules::cluster_renderer::{MarkerFactory, RenderedMarker};
pub use core_modules::projector::{PixelPoint, Projector, WebMercatorProjector};
pub use pipeline::{ClusterConfig, ClusterError, ClusterPipeline, ZoomScaling};
