// THEORY:
// The `ClusterRenderer` is the bridge between the grouping layer and the host
// map's marker surface. It walks one build's clusters and describes, per
// cluster, what marker entity should exist: the caller's own per-point marker
// for singletons, or a synthesized aggregate created through the injected
// `MarkerFactory` for groups.
//
// Key architectural principles:
// 1.  **Pass-Through for Singletons**: A singleton cluster is the point the
//     caller already has a marker for. The renderer creates nothing for it;
//     it only reports which point markers should stay on screen.
// 2.  **Factory-Synthesized Aggregates**: Multi-member clusters become one
//     aggregate entity at the centroid, labeled with the member count and
//     sized by a bounded, monotone function of that count. The factory owns
//     how that looks; the renderer owns only the numbers.
// 3.  **Activation Wiring**: Every aggregate entity gets an activation
//     handler bound at creation. When the host fires it (click/tap), the
//     caller's `on_cluster_activated` receives the member ids, which is
//     exactly what the expander needs next.
// 4.  **Describes, Does Not Own**: Rendering is idempotent per call and the
//     renderer never disposes anything. Entity lifecycle across successive
//     builds (removing stale markers, reusing live ones) belongs to the
//     caller.

use std::rc::Rc;

use crate::core_modules::cluster::{Cluster, LatLng};

/// Smallest and largest visual scale an aggregate marker may take.
pub const MIN_AGGREGATE_SCALE: f64 = 14.0;
pub const MAX_AGGREGATE_SCALE: f64 = 20.0;

/// Capability for synthesizing aggregate marker entities on the host map and
/// attaching activation (click/tap) handlers to them.
pub trait MarkerFactory {
    /// The host SDK's handle for one created marker entity.
    type Entity;

    /// Creates one aggregate marker at `position`, labeled with `count` and
    /// drawn at `scale`.
    fn create_aggregate(&mut self, position: LatLng, count: usize, scale: f64) -> Self::Entity;

    /// Attaches a click/tap handler to a previously created entity. The host
    /// invokes the handler each time the user activates the marker.
    fn bind_activation(&mut self, entity: &Self::Entity, handler: Box<dyn Fn()>);
}

/// The renderer's description of one marker that should exist for a cluster.
#[derive(Debug)]
pub enum RenderedMarker<E> {
    /// Keep the caller's existing marker for this point; nothing was created.
    Point { point_id: u64 },
    /// A synthesized aggregate entity standing in for `member_ids`.
    Aggregate { entity: E, member_ids: Vec<u64> },
}

/// Visual scale for an aggregate of `count` members. Monotone non-decreasing
/// in the count and bounded to [14, 20] so a thousand-member cluster does
/// not swallow the map.
pub fn aggregate_scale(count: usize) -> f64 {
    (MIN_AGGREGATE_SCALE + count as f64 / 10.0).clamp(MIN_AGGREGATE_SCALE, MAX_AGGREGATE_SCALE)
}

/// Converts one build's clusters into marker descriptions, creating aggregate
/// entities through `factory` and binding `on_cluster_activated` to each.
///
/// The handler is shared, not consumed: it is cloned per aggregate so every
/// marker on the map can fire it independently, any number of times.
pub fn render_markers<F: MarkerFactory>(
    clusters: &[Cluster],
    factory: &mut F,
    on_cluster_activated: Rc<dyn Fn(&[u64])>,
) -> Vec<RenderedMarker<F::Entity>> {
    let mut rendered: Vec<RenderedMarker<F::Entity>> = Vec::with_capacity(clusters.len());
    let mut aggregates = 0usize;

    for cluster in clusters {
        if cluster.is_single {
            rendered.push(RenderedMarker::Point {
                point_id: cluster.member_ids[0],
            });
            continue;
        }

        let count = cluster.len();
        let entity = factory.create_aggregate(cluster.centroid, count, aggregate_scale(count));
        let handler = Rc::clone(&on_cluster_activated);
        let member_ids = cluster.member_ids.clone();
        factory.bind_activation(&entity, Box::new(move || handler(&member_ids)));
        rendered.push(RenderedMarker::Aggregate {
            entity,
            member_ids: cluster.member_ids.clone(),
        });
        aggregates += 1;
    }

    tracing::debug!(
        clusters = clusters.len(),
        aggregates,
        "rendered marker descriptions"
    );
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::cluster::GeoPoint;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    /// Records every created aggregate and lets tests fire its activation
    /// handler as the host map would on a click.
    #[derive(Default)]
    struct RecordingFactory {
        created: Vec<(LatLng, usize, f64)>,
        handlers: Vec<Option<Box<dyn Fn()>>>,
    }

    impl MarkerFactory for RecordingFactory {
        type Entity = usize;

        fn create_aggregate(&mut self, position: LatLng, count: usize, scale: f64) -> usize {
            self.created.push((position, count, scale));
            self.handlers.push(None);
            self.created.len() - 1
        }

        fn bind_activation(&mut self, entity: &usize, handler: Box<dyn Fn()>) {
            self.handlers[*entity] = Some(handler);
        }
    }

    impl RecordingFactory {
        fn fire(&self, entity: usize) {
            self.handlers[entity].as_ref().expect("handler bound")();
        }
    }

    fn aggregate(id: u64, member_ids: Vec<u64>, centroid: LatLng) -> Cluster {
        Cluster {
            id,
            member_ids,
            centroid,
            is_single: false,
        }
    }

    fn noop_handler() -> Rc<dyn Fn(&[u64])> {
        Rc::new(|_: &[u64]| {})
    }

    #[test]
    fn test_singletons_pass_through_without_entity_creation() {
        let clusters = vec![
            Cluster::singleton(0, &GeoPoint::new(11, 1.0, 2.0)),
            Cluster::singleton(1, &GeoPoint::new(12, 3.0, 4.0)),
        ];
        let mut factory = RecordingFactory::default();
        let rendered = render_markers(&clusters, &mut factory, noop_handler());

        assert_eq!(factory.created.len(), 0);
        let point_ids: Vec<u64> = rendered
            .iter()
            .map(|m| match m {
                RenderedMarker::Point { point_id } => *point_id,
                RenderedMarker::Aggregate { .. } => panic!("unexpected aggregate"),
            })
            .collect();
        assert_eq!(point_ids, vec![11, 12]);
    }

    #[test]
    fn test_aggregate_created_at_centroid_with_count_label() {
        let clusters = vec![aggregate(0, vec![1, 2, 3], LatLng::new(12.0, 24.0))];
        let mut factory = RecordingFactory::default();
        render_markers(&clusters, &mut factory, noop_handler());

        assert_eq!(factory.created.len(), 1);
        let (position, count, _) = factory.created[0];
        assert_eq!(position, LatLng::new(12.0, 24.0));
        assert_eq!(count, 3);
    }

    #[test]
    fn test_scale_grows_with_count_and_is_clamped() {
        assert_eq!(aggregate_scale(5), 14.5);
        assert_eq!(aggregate_scale(10), 15.0);
        assert_eq!(aggregate_scale(60), 20.0);
        assert_eq!(aggregate_scale(1000), 20.0);
    }

    #[test]
    fn test_activation_delivers_member_ids() {
        let clusters = vec![
            aggregate(0, vec![5, 6], LatLng::new(0.0, 0.0)),
            aggregate(1, vec![7, 8, 9], LatLng::new(1.0, 1.0)),
        ];
        let mut factory = RecordingFactory::default();
        let activations: Rc<RefCell<Vec<Vec<u64>>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&activations);
        let handler: Rc<dyn Fn(&[u64])> =
            Rc::new(move |ids: &[u64]| sink.borrow_mut().push(ids.to_vec()));

        render_markers(&clusters, &mut factory, handler);

        factory.fire(1);
        factory.fire(0);
        factory.fire(1);
        assert_eq!(
            *activations.borrow(),
            vec![vec![7, 8, 9], vec![5, 6], vec![7, 8, 9]]
        );
    }

    #[test]
    fn test_repeated_render_does_not_touch_previous_entities() {
        let clusters = vec![aggregate(0, vec![1, 2], LatLng::new(0.0, 0.0))];
        let mut factory = RecordingFactory::default();
        render_markers(&clusters, &mut factory, noop_handler());
        render_markers(&clusters, &mut factory, noop_handler());

        // Two calls describe two entities; disposal of the first is the
        // caller's lifecycle concern, not the renderer's.
        assert_eq!(factory.created.len(), 2);
    }
}
