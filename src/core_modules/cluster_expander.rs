// THEORY:
// The `ClusterExpander` is the engine's reaction to an aggregate marker being
// activated. The user clicked a marker that stands in for many points; the
// honest response is to re-frame the viewport so those points become
// individually visible.
//
// Key architectural principles:
// 1.  **Bounding Region, Then Fit**: The expander resolves every member id
//     back to its coordinate, accumulates the minimal lat/lng rectangle over
//     them, and asks the host viewport to fit that region. The host decides
//     the actual pan/zoom animation; the engine only states the goal.
// 2.  **One-Shot Zoom Clamp**: Fitting the bounds of near-coincident points
//     would zoom in arbitrarily far. So the expander registers a listener
//     for the viewport's "idle" signal (the host's notification that the
//     requested change has settled) and, if the settled zoom exceeds the
//     ceiling, pulls it back down.
// 3.  **The Listener Removes Itself**: The idle listener unsubscribes inside
//     its own callback, using the handle the host passed it. Without this,
//     every cluster activation would leave one more listener behind, a leak
//     that grows with every click. A fired flag additionally guards against
//     a host that delivers a second idle before the unsubscribe lands.
// 4.  **Independent Activations**: Each expansion is self-contained:
//     Idle -> FitRequested -> (host settles) -> ZoomClamped(if needed) ->
//     Idle. Nothing blocks a subsequent activation.

use crate::core_modules::cluster::{GeoBounds, LatLng};
use crate::pipeline::ClusterError;

/// Opaque identifier for one idle subscription, issued by the host viewport.
pub type IdleHandle = u64;

/// Callback invoked when the viewport settles. The host hands the callback
/// mutable access to the viewport plus its own subscription handle, so a
/// one-shot listener can unsubscribe itself.
pub type IdleCallback = Box<dyn FnMut(&mut dyn Viewport, IdleHandle)>;

/// Capability surface of the host map's viewport: read the zoom, request
/// bound/zoom changes, and subscribe to the "settled" signal. The engine
/// never mutates host state except through these requests.
pub trait Viewport {
    fn zoom(&self) -> u32;
    fn fit_bounds(&mut self, region: GeoBounds);
    fn set_zoom(&mut self, zoom: u32);
    fn on_idle(&mut self, callback: IdleCallback) -> IdleHandle;
    fn off_idle(&mut self, handle: IdleHandle);
}

/// Re-frames `viewport` around the members of an activated cluster, clamping
/// the settled zoom to `max_zoom`.
///
/// Member ids the lookup cannot resolve are skipped; the expansion fails only
/// when no member resolves at all.
pub fn expand_cluster<L>(
    member_ids: &[u64],
    point_lookup: L,
    viewport: &mut dyn Viewport,
    max_zoom: u32,
) -> Result<(), ClusterError>
where
    L: Fn(u64) -> Option<LatLng>,
{
    let mut region: Option<GeoBounds> = None;
    for &member_id in member_ids {
        match point_lookup(member_id) {
            Some(position) if position.is_finite() => match region.as_mut() {
                Some(bounds) => bounds.extend(position),
                None => region = Some(GeoBounds::from_position(position)),
            },
            _ => {
                tracing::warn!(member_id, "skipping unresolvable cluster member");
            }
        }
    }
    let region = region.ok_or(ClusterError::NoExpandableMembers)?;

    viewport.fit_bounds(region);
    tracing::debug!(
        members = member_ids.len(),
        min_lat = region.min_lat,
        max_lat = region.max_lat,
        min_lng = region.min_lng,
        max_lng = region.max_lng,
        "requested viewport fit for activated cluster"
    );

    // One-shot: fires on the first settle after the fit, clamps if the host
    // over-zoomed, then removes itself via its own handle.
    let mut fired = false;
    viewport.on_idle(Box::new(move |vp, handle| {
        if fired {
            return;
        }
        fired = true;
        if vp.zoom() > max_zoom {
            vp.set_zoom(max_zoom);
        }
        vp.off_idle(handle);
    }));

    Ok(())
}
