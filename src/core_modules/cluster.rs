// THEORY:
// The `cluster` module holds the data containers of the Spatial Grouping Layer.
// Its purpose is to give the rest of the engine a small, stable vocabulary of
// geographic values: the points the hosting application supplies, the bounding
// regions the expander computes, and the `Cluster` itself - the single visual
// unit the renderer turns into a marker.
//
// Key architectural principles:
// 1.  **Dumb Data Containers**: Everything in this file is a plain value. A
//     `Cluster` represents the grouping decision for a single build; it does
//     not have a memory of previous builds and is never mutated after the
//     builder emits it. The next build produces a wholly new set.
// 2.  **Geographic, Not Pixel, Truth**: Positions here are always lat/lng.
//     Pixel-space values exist only transiently inside the builder, because
//     they are valid for exactly one zoom level. Keeping the containers
//     geographic means a cluster can outlive the zoom it was computed at for
//     as long as the caller needs to render it.
// 3.  **Input for the Next Layer**: A list of `Cluster`s is the final output
//     of the grouping layer and the direct input for the renderer; the
//     `member_ids` carried by each aggregate are later the input for the
//     expander when the user activates its marker.

use serde::{Deserialize, Serialize};

/// A geographic coordinate pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// True when both components are finite numbers. Non-finite coordinates
    /// are treated as malformed input and dropped before clustering so they
    /// can never poison a centroid.
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

/// A single geo-located point supplied by the hosting application, typically
/// one listing on the marketplace map. Immutable; a fresh set is handed to
/// the builder on every trigger (data refresh, pan, zoom, viewport-ready).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// The caller's identifier for this point. The engine never interprets
    /// it; it only threads it through to clusters and activation callbacks.
    pub id: u64,
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(id: u64, lat: f64, lng: f64) -> Self {
        Self { id, lat, lng }
    }

    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}

/// The minimal lat/lng rectangle enclosing a set of coordinates. This is the
/// region handed to the host viewport's `fit_bounds` when a cluster expands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl GeoBounds {
    /// Starts a bounds accumulation from a single coordinate.
    pub fn from_position(position: LatLng) -> Self {
        Self {
            min_lat: position.lat,
            max_lat: position.lat,
            min_lng: position.lng,
            max_lng: position.lng,
        }
    }

    /// Grows the rectangle just enough to contain `position`.
    pub fn extend(&mut self, position: LatLng) {
        self.min_lat = self.min_lat.min(position.lat);
        self.max_lat = self.max_lat.max(position.lat);
        self.min_lng = self.min_lng.min(position.lng);
        self.max_lng = self.max_lng.max(position.lng);
    }
}

/// A group of one or more points treated as a single visual unit.
/// This is a "dumb" data container summarizing one grouping decision made by
/// the builder for one build; it is never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// Identifier assigned for the current build only. Not persistent across
    /// builds; ordering follows the seed point's index in the input.
    pub id: u64,
    /// The ids of every member point, in discovery order. The first entry is
    /// always the seed the cluster was opened from.
    pub member_ids: Vec<u64>,
    /// The geographic mean of all members for aggregates, or the point's own
    /// coordinate for singletons.
    pub centroid: LatLng,
    /// Singleton clusters render as the point's own existing marker; only
    /// multi-member clusters get a synthesized aggregate marker.
    pub is_single: bool,
}

impl Cluster {
    /// Wraps one point as its own cluster.
    pub fn singleton(id: u64, point: &GeoPoint) -> Self {
        Self {
            id,
            member_ids: vec![point.id],
            centroid: point.position(),
            is_single: true,
        }
    }

    /// The number of member points in this cluster.
    pub fn len(&self) -> usize {
        self.member_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.member_ids.is_empty()
    }
}
