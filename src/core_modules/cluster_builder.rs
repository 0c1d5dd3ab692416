// THEORY:
// The `ClusterBuilder` is the engine of the Spatial Grouping Layer. It
// partitions the full set of geo-located points into visual clusters so that
// a dense area renders as one aggregate marker instead of hundreds of
// overlapping pins.
//
// Key architectural principles & algorithm steps:
// 1.  **Singleton Fast Path**: Small point sets do not need decluttering, so
//     a set at or under the configured cutoff skips every distance
//     computation and comes back as one singleton cluster per point. This
//     bypasses the O(n^2) pass exactly where it buys nothing.
// 2.  **Projection, With a Degrade Path**: Distances are measured in pixel
//     space via the injected `Projector`. If the projection is not available
//     yet (the host map has not finished initializing), the builder returns
//     every point as its own singleton rather than failing - the map stays
//     usable, it is just not decluttered.
// 3.  **Seed Scan**: Points are walked in input order with a visited flag
//     per point. Each unvisited point opens a new cluster as its seed, then
//     scans all later unvisited points; any within the zoom-adjusted pixel
//     threshold of the seed joins the cluster and is marked visited.
// 4.  **Seed-Linkage Semantics**: Membership is decided against the seed
//     only. Two non-seed members of the same cluster may be farther apart
//     than the threshold. This keeps the pass a single O(n^2) scan.
// 5.  **Geographic Centroid**: An aggregate's position is the arithmetic
//     mean of its members' lat and lng, computed in geographic space, never
//     in pixel space.
// 6.  **Stateless Utility**: `build_clusters` is a pure function of its
//     arguments. Identical inputs always produce the identical partition;
//     nothing is cached between builds.

use crate::core_modules::cluster::{Cluster, GeoPoint, LatLng};
use crate::core_modules::projector::{PixelPoint, Projector};
use crate::pipeline::ClusterConfig;

pub mod cluster_builder {
    use super::*; // Make structs from parent module available.

    /// A point paired with its planar projection for the current zoom.
    /// Ephemeral: valid only inside the build that produced it.
    struct ProjectedPoint {
        point_id: u64,
        pixel: PixelPoint,
    }

    /// The main function of the grouping layer. Partitions `points` into
    /// clusters for the given zoom level.
    ///
    /// The output is an exhaustive partition: every (well-formed) input id
    /// appears in exactly one cluster. Cluster order follows the index of
    /// each cluster's seed point in the input.
    pub fn build_clusters(
        points: &[GeoPoint],
        projector: &dyn Projector,
        zoom: u32,
        config: &ClusterConfig,
    ) -> Vec<Cluster> {
        // --- 1. Defensive Filtering ---
        // Points with non-finite coordinates cannot be projected or averaged
        // without corrupting a centroid. Skip them and keep the build alive.
        let mut well_formed: Vec<&GeoPoint> = Vec::with_capacity(points.len());
        for point in points {
            if point.position().is_finite() {
                well_formed.push(point);
            } else {
                tracing::warn!(
                    point_id = point.id,
                    lat = point.lat,
                    lng = point.lng,
                    "dropping point with non-finite coordinates"
                );
            }
        }

        // --- 2. Singleton Fast Path ---
        if well_formed.len() <= config.singleton_cutoff {
            return all_singletons(&well_formed);
        }

        // --- 3. Projection ---
        // Projection validity is all-or-nothing for a given zoom: if any
        // point fails to project the host map is not ready, and a partially
        // projected distance pass would group arbitrarily. Degrade instead.
        let mut projected: Vec<ProjectedPoint> = Vec::with_capacity(well_formed.len());
        for point in &well_formed {
            match projector.project(point.position()) {
                Some(pixel) => projected.push(ProjectedPoint {
                    point_id: point.id,
                    pixel,
                }),
                None => {
                    tracing::debug!(
                        total_points = well_formed.len(),
                        "projection unavailable, returning singleton clusters"
                    );
                    return all_singletons(&well_formed);
                }
            }
        }

        // --- 4. Seed Scan ---
        // A `visited` flag per point ensures each point lands in exactly one
        // cluster; iteration order makes the pass deterministic.
        let mut visited = vec![false; well_formed.len()];
        let mut clusters: Vec<Cluster> = Vec::new();
        let mut cluster_id_counter = 0u64;

        for i in 0..well_formed.len() {
            if visited[i] {
                continue;
            }
            visited[i] = true;

            let mut member_indices = vec![i];
            for j in (i + 1)..well_formed.len() {
                if visited[j] {
                    continue;
                }
                let raw = projected[i].pixel.distance_to(&projected[j].pixel);
                let adjusted = config.zoom_scaling.apply(raw, zoom);
                if adjusted <= config.distance_threshold_px {
                    visited[j] = true;
                    tracing::trace!(
                        seed = projected[i].point_id,
                        joined = projected[j].point_id,
                        adjusted,
                        "point joined seed cluster"
                    );
                    member_indices.push(j);
                }
            }

            clusters.push(make_cluster(cluster_id_counter, &member_indices, &well_formed));
            cluster_id_counter += 1;
        }

        tracing::debug!(
            total_points = well_formed.len(),
            zoom,
            clusters = clusters.len(),
            "clustered point set"
        );
        clusters
    }

    /// One singleton cluster per point, preserving input order. Serves both
    /// the small-set fast path and the projection-unavailable degrade path.
    fn all_singletons(points: &[&GeoPoint]) -> Vec<Cluster> {
        points
            .iter()
            .enumerate()
            .map(|(id, point)| Cluster::singleton(id as u64, point))
            .collect()
    }

    /// Finalizes one cluster from the member indices the seed scan gathered.
    /// Aggregates get the geographic mean position; singletons keep the
    /// point's own coordinate.
    fn make_cluster(id: u64, member_indices: &[usize], points: &[&GeoPoint]) -> Cluster {
        let member_ids: Vec<u64> = member_indices.iter().map(|&i| points[i].id).collect();
        if member_indices.len() == 1 {
            return Cluster::singleton(id, points[member_indices[0]]);
        }

        let mut lat_sum = 0.0;
        let mut lng_sum = 0.0;
        for &i in member_indices {
            lat_sum += points[i].lat;
            lng_sum += points[i].lng;
        }
        let count = member_indices.len() as f64;

        Cluster {
            id,
            member_ids,
            centroid: LatLng::new(lat_sum / count, lng_sum / count),
            is_single: false,
        }
    }
}
