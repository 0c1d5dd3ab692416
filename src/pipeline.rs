// THEORY:
// The `pipeline` module is the final, top-level API for the clustering
// engine. It encapsulates the three grouping layers (build, render, expand)
// behind a single configured entry point so the hosting application wires up
// one object instead of three free functions.
//
// The pipeline holds configuration only. Clusters are recomputed from scratch
// on every trigger (listing refresh, pan, zoom, viewport-ready) and are
// discarded once the renderer has consumed them; no cluster state survives a
// call. Callers embedding this in a hot pan loop should debounce their own
// invocation frequency; the engine itself has no notion of time.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core_modules::cluster::{Cluster, GeoPoint, LatLng};
use crate::core_modules::cluster_builder::cluster_builder;
use crate::core_modules::cluster_expander::{self, Viewport};
use crate::core_modules::cluster_renderer::{self, MarkerFactory, RenderedMarker};
use crate::core_modules::projector::Projector;

// Re-export key data structures for the public API.
pub use crate::core_modules::cluster::GeoBounds;

/// Direction the zoom level bends the distance rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ZoomScaling {
    /// `adjusted = raw * 2^zoom`: the clustering radius widens as the user
    /// zooms in. This is the shipped product behavior and the default;
    /// validate against your map's intended look before switching.
    #[default]
    Amplify,
    /// `adjusted = raw / 2^zoom`: the conventional direction, where a fixed
    /// pixel threshold corresponds to a smaller radius at higher zoom.
    Attenuate,
}

impl ZoomScaling {
    /// Applies the zoom adjustment to a raw pixel distance.
    pub fn apply(&self, raw_px: f64, zoom: u32) -> f64 {
        let factor = f64::from(2u32.pow(zoom.min(30)));
        match self {
            ZoomScaling::Amplify => raw_px * factor,
            ZoomScaling::Attenuate => raw_px / factor,
        }
    }
}

/// Configuration for the clustering engine, allowing for tunable behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Zoom-adjusted pixel distance at or under which a point joins the
    /// current seed's cluster.
    pub distance_threshold_px: f64,
    /// Point sets at or under this size skip the distance pass entirely and
    /// render as individual markers.
    pub singleton_cutoff: usize,
    /// Ceiling applied to the settled zoom after a cluster expansion, so
    /// coincident points cannot drive the viewport arbitrarily deep.
    pub max_expand_zoom: u32,
    /// Which way the zoom level bends the distance rule.
    pub zoom_scaling: ZoomScaling,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            distance_threshold_px: 40.0,
            singleton_cutoff: 100,
            max_expand_zoom: 18,
            zoom_scaling: ZoomScaling::default(),
        }
    }
}

impl ClusterConfig {
    /// Rejects configurations that would make the distance rule meaningless.
    /// Called at pipeline construction so a bad config never reaches a build.
    pub fn validate(&self) -> Result<(), ClusterError> {
        if !self.distance_threshold_px.is_finite() || self.distance_threshold_px < 0.0 {
            return Err(ClusterError::InvalidConfig {
                reason: format!(
                    "distance_threshold_px must be finite and non-negative, got {}",
                    self.distance_threshold_px
                ),
            });
        }
        Ok(())
    }
}

/// Failures the engine can actually report. Everything else degrades
/// gracefully instead of erroring.
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("invalid cluster configuration: {reason}")]
    InvalidConfig { reason: String },
    #[error("no resolvable member coordinates for cluster expansion")]
    NoExpandableMembers,
}

/// The main, top-level struct for the clustering engine: a validated
/// configuration threaded through build, render, and expand.
pub struct ClusterPipeline {
    config: ClusterConfig,
}

impl ClusterPipeline {
    pub fn new(config: ClusterConfig) -> Result<Self, ClusterError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Stage 1: partition the caller's points for the current zoom.
    pub fn build(&self, points: &[GeoPoint], projector: &dyn Projector, zoom: u32) -> Vec<Cluster> {
        cluster_builder::build_clusters(points, projector, zoom, &self.config)
    }

    /// Stage 2: describe the markers one build's clusters should produce.
    pub fn render<F: MarkerFactory>(
        &self,
        clusters: &[Cluster],
        factory: &mut F,
        on_cluster_activated: Rc<dyn Fn(&[u64])>,
    ) -> Vec<RenderedMarker<F::Entity>> {
        cluster_renderer::render_markers(clusters, factory, on_cluster_activated)
    }

    /// Stage 3: re-frame the viewport around an activated cluster's members.
    pub fn expand<L>(
        &self,
        member_ids: &[u64],
        point_lookup: L,
        viewport: &mut dyn Viewport,
    ) -> Result<(), ClusterError>
    where
        L: Fn(u64) -> Option<LatLng>,
    {
        cluster_expander::expand_cluster(
            member_ids,
            point_lookup,
            viewport,
            self.config.max_expand_zoom,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::projector::WebMercatorProjector;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config_matches_product_tuning() {
        let config = ClusterConfig::default();
        assert_eq!(config.distance_threshold_px, 40.0);
        assert_eq!(config.singleton_cutoff, 100);
        assert_eq!(config.max_expand_zoom, 18);
        assert_eq!(config.zoom_scaling, ZoomScaling::Amplify);
    }

    #[test]
    fn test_invalid_threshold_is_rejected_at_construction() {
        let config = ClusterConfig {
            distance_threshold_px: f64::NAN,
            ..ClusterConfig::default()
        };
        assert!(matches!(
            ClusterPipeline::new(config),
            Err(ClusterError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_zoom_scaling_directions() {
        assert_eq!(ZoomScaling::Amplify.apply(10.0, 2), 40.0);
        assert_eq!(ZoomScaling::Attenuate.apply(10.0, 2), 2.5);
        assert_eq!(ZoomScaling::Amplify.apply(10.0, 0), 10.0);
    }

    #[test]
    fn test_pipeline_builds_with_a_real_projection() {
        let pipeline = ClusterPipeline::new(ClusterConfig {
            singleton_cutoff: 0,
            ..ClusterConfig::default()
        })
        .unwrap();
        // Two listings a street apart and one across the city.
        let points = vec![
            GeoPoint::new(1, 48.2100, 16.3700),
            GeoPoint::new(2, 48.2101, 16.3701),
            GeoPoint::new(3, 48.3000, 16.5000),
        ];
        let projector = WebMercatorProjector::new(12);
        let clusters = pipeline.build(&points, &projector, 0);

        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].member_ids, vec![1, 2]);
        assert!(clusters[1].is_single);
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = ClusterConfig {
            distance_threshold_px: 25.0,
            singleton_cutoff: 10,
            max_expand_zoom: 16,
            zoom_scaling: ZoomScaling::Attenuate,
        };
        let encoded = serde_json::to_string(&config).unwrap();
        let decoded: ClusterConfig = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, config);
    }
}
