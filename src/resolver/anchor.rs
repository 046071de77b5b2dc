//! Seed-frame resolution from stored anchors.
//!
//! No traversal: each anchor already holds `seed_tform_waypoint`. Waypoints
//! without an anchor are simply absent from the result.

use tracing::debug;

use super::TransformMap;
use crate::graph::GraphStore;

pub struct AnchorResolver;

impl AnchorResolver {
    /// Map every anchored waypoint to its seed-frame transform.
    ///
    /// If a waypoint is anchored twice, the last anchor wins.
    pub fn resolve(store: &GraphStore) -> TransformMap {
        let transforms: TransformMap = store
            .anchors()
            .iter()
            .map(|a| (a.waypoint_id.clone(), a.seed_tform_waypoint.clone()))
            .collect();

        debug!(
            "Anchoring covers {} of {} waypoints",
            transforms.len(),
            store.waypoints().len()
        );
        transforms
    }
}
