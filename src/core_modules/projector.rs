// THEORY:
// The `projector` module defines the engine's one geometric capability: turning
// a geographic coordinate into planar pixel coordinates for the current zoom
// level. The clustering pass measures distances in pixel space because "too
// close to tell apart" is a screen property, not a geographic one.
//
// Key architectural principles:
// 1.  **Capability Injection**: The engine never talks to a mapping SDK
//     directly. The host adapts whatever projection its map provider exposes
//     behind the `Projector` trait, which keeps the engine portable across
//     providers and trivially fakeable in tests.
// 2.  **Unavailability is a State, Not an Error**: Map providers initialize
//     their projection asynchronously; before the map is ready there is no
//     projection to offer. `project` therefore returns an `Option`, and the
//     builder degrades to all-singleton output when it gets `None` rather
//     than failing the build.
// 3.  **Zoom-Scoped Validity**: A projected value is meaningful only for the
//     zoom level the projector was configured for. Nothing in the engine
//     stores projected coordinates past a single build.

use crate::core_modules::cluster::LatLng;

/// A planar coordinate produced by a `Projector`, valid for one zoom level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    /// Euclidean distance to another projected point, in pixels.
    pub fn distance_to(&self, other: &PixelPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Capability that maps a geographic coordinate to planar pixel coordinates.
/// Returns `None` while the host map's projection is not yet initialized.
pub trait Projector {
    fn project(&self, position: LatLng) -> Option<PixelPoint>;
}

/// Web Mercator latitude limit; poleward of this the projection diverges.
const MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_6;

/// The standard 256px-tile Web Mercator world projection at a fixed zoom.
/// Hosts whose map provider exposes its own projection should adapt that one
/// instead; this implementation serves hosts without one, the demo binary,
/// and tests that want realistic pixel geometry.
#[derive(Debug, Clone, Copy)]
pub struct WebMercatorProjector {
    /// World size in pixels at the configured zoom: 256 * 2^zoom.
    world_px: f64,
}

impl WebMercatorProjector {
    pub fn new(zoom: u32) -> Self {
        Self {
            world_px: 256.0 * f64::from(2u32.pow(zoom.min(30))),
        }
    }
}

impl Projector for WebMercatorProjector {
    fn project(&self, position: LatLng) -> Option<PixelPoint> {
        let lat = position.lat.clamp(-MERCATOR_MAX_LAT, MERCATOR_MAX_LAT);
        let x = (position.lng + 180.0) / 360.0 * self.world_px;
        let sin_lat = lat.to_radians().sin();
        let y = (0.5 - ((1.0 + sin_lat) / (1.0 - sin_lat)).ln() / (4.0 * std::f64::consts::PI))
            * self.world_px;
        Some(PixelPoint { x, y })
    }
}

/// Models a host map whose projection has not come up yet. Every call yields
/// `None`, which drives the builder's all-singleton degrade path.
#[derive(Debug, Clone, Copy, Default)]
pub struct UninitializedProjector;

impl Projector for UninitializedProjector {
    fn project(&self, _position: LatLng) -> Option<PixelPoint> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_mercator_centers_the_origin() {
        let projector = WebMercatorProjector::new(0);
        let px = projector.project(LatLng::new(0.0, 0.0)).unwrap();
        assert_eq!(px, PixelPoint { x: 128.0, y: 128.0 });
    }

    #[test]
    fn test_mercator_scales_with_zoom() {
        let z0 = WebMercatorProjector::new(0);
        let z2 = WebMercatorProjector::new(2);
        let at_z0 = z0.project(LatLng::new(20.0, 30.0)).unwrap();
        let at_z2 = z2.project(LatLng::new(20.0, 30.0)).unwrap();
        assert!((at_z2.x - at_z0.x * 4.0).abs() < 1e-9);
        assert!((at_z2.y - at_z0.y * 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_mercator_clamps_polar_latitudes() {
        let projector = WebMercatorProjector::new(0);
        let pole = projector.project(LatLng::new(90.0, 0.0)).unwrap();
        assert!(pole.y.is_finite());
    }

    #[test]
    fn test_pixel_distance_is_euclidean() {
        let a = PixelPoint { x: 0.0, y: 0.0 };
        let b = PixelPoint { x: 3.0, y: 4.0 };
        assert_eq!(a.distance_to(&b), 5.0);
    }

    #[test]
    fn test_uninitialized_projector_yields_none() {
        assert_eq!(
            UninitializedProjector.project(LatLng::new(1.0, 1.0)),
            None
        );
    }
}
