// This file is an example of how to use the `marker_cluster` library.
// The main library entry point is `src/lib.rs`.
//
// It drives the full pipeline once: a handful of listing coordinates are
// clustered, rendered through a logging marker factory, and the densest
// aggregate is expanded against an in-memory viewport.

use std::rc::Rc;

use marker_cluster::{
    ClusterConfig, ClusterPipeline, GeoBounds, GeoPoint, IdleCallback, IdleHandle, LatLng,
    MarkerFactory, RenderedMarker, Viewport, WebMercatorProjector,
};

/// Prints what a real host SDK would draw.
struct ConsoleMarkerFactory {
    next_entity: u64,
}

impl MarkerFactory for ConsoleMarkerFactory {
    type Entity = u64;

    fn create_aggregate(&mut self, position: LatLng, count: usize, scale: f64) -> u64 {
        let entity = self.next_entity;
        self.next_entity += 1;
        println!(
            "aggregate marker #{entity}: {count} listings at ({:.4}, {:.4}), scale {scale}",
            position.lat, position.lng
        );
        entity
    }

    fn bind_activation(&mut self, entity: &u64, _handler: Box<dyn Fn()>) {
        println!("aggregate marker #{entity}: activation handler bound");
    }
}

/// Minimal stand-in for a host map viewport that settles immediately.
struct ConsoleViewport {
    zoom: u32,
    listeners: Vec<(IdleHandle, IdleCallback)>,
    removed: Vec<IdleHandle>,
    next_handle: IdleHandle,
}

impl Viewport for ConsoleViewport {
    fn zoom(&self) -> u32 {
        self.zoom
    }

    fn fit_bounds(&mut self, region: GeoBounds) {
        println!(
            "viewport: fit lat [{:.4}, {:.4}], lng [{:.4}, {:.4}]",
            region.min_lat, region.max_lat, region.min_lng, region.max_lng
        );
        // Pretend the host fit coincident points by zooming all the way in.
        self.zoom = 22;
    }

    fn set_zoom(&mut self, zoom: u32) {
        println!("viewport: zoom clamped to {zoom}");
        self.zoom = zoom;
    }

    fn on_idle(&mut self, callback: IdleCallback) -> IdleHandle {
        let handle = self.next_handle;
        self.next_handle += 1;
        self.listeners.push((handle, callback));
        handle
    }

    fn off_idle(&mut self, handle: IdleHandle) {
        self.listeners.retain(|(h, _)| *h != handle);
        self.removed.push(handle);
    }
}

impl ConsoleViewport {
    /// Delivers one idle signal, honoring unsubscriptions made inside the
    /// callbacks themselves.
    fn settle(&mut self) {
        let mut listeners = std::mem::take(&mut self.listeners);
        self.removed.clear();
        for (handle, callback) in listeners.iter_mut() {
            callback(self, *handle);
        }
        let removed = std::mem::take(&mut self.removed);
        listeners.retain(|(handle, _)| !removed.contains(handle));
        listeners.append(&mut self.listeners);
        self.listeners = listeners;
    }
}

fn main() -> Result<(), marker_cluster::ClusterError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .init();

    // A block of listings in one courtyard plus two solitary ones, small
    // enough that the cutoff is lowered to show the distance pass.
    let mut points: Vec<GeoPoint> = (0..8)
        .map(|i| GeoPoint::new(i, 48.2100 + i as f64 * 0.00001, 16.3700))
        .collect();
    points.push(GeoPoint::new(100, 48.2500, 16.4200));
    points.push(GeoPoint::new(101, 48.1700, 16.3000));

    let pipeline = ClusterPipeline::new(ClusterConfig {
        singleton_cutoff: 0,
        ..ClusterConfig::default()
    })?;

    let projector = WebMercatorProjector::new(14);
    let clusters = pipeline.build(&points, &projector, 0);
    println!("built {} clusters from {} points", clusters.len(), points.len());

    let mut factory = ConsoleMarkerFactory { next_entity: 0 };
    let on_activated: Rc<dyn Fn(&[u64])> =
        Rc::new(|ids: &[u64]| println!("cluster activated with members {ids:?}"));
    let rendered = pipeline.render(&clusters, &mut factory, on_activated);

    let kept: usize = rendered
        .iter()
        .filter(|m| matches!(m, RenderedMarker::Point { .. }))
        .count();
    println!("{kept} point markers kept, {} aggregates created", rendered.len() - kept);

    // Expand the densest aggregate, as a click on its marker would.
    if let Some(densest) = clusters
        .iter()
        .filter(|c| !c.is_single)
        .max_by_key(|c| c.len())
    {
        let mut viewport = ConsoleViewport {
            zoom: 12,
            listeners: Vec::new(),
            removed: Vec::new(),
            next_handle: 0,
        };
        let lookup = |id: u64| points.iter().find(|p| p.id == id).map(GeoPoint::position);
        pipeline.expand(&densest.member_ids, lookup, &mut viewport)?;
        viewport.settle();
        println!("viewport settled at zoom {}", viewport.zoom());
    }

    Ok(())
}
