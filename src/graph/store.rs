//! GraphStore - in-memory pose graph with snapshots and anchoring data.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use tracing::{debug, warn};

use super::types::{Anchor, AnchoredObject, Edge, Snapshot, Waypoint, WaypointId};

/// The loaded map: waypoints in load order, edges, anchors and snapshots.
///
/// Waypoint order is significant: the first waypoint is the traversal root.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    waypoints: Vec<Waypoint>,
    /// Waypoint id -> index into `waypoints`.
    index: HashMap<WaypointId, usize>,
    edges: Vec<Edge>,
    anchors: Vec<Anchor>,
    anchored_objects: Vec<AnchoredObject>,
    /// Snapshot id -> snapshot.
    snapshots: HashMap<String, Snapshot>,
}

impl GraphStore {
    /// Build a store, dropping edges that reference unknown waypoints.
    ///
    /// Duplicate waypoint ids keep their first occurrence. Anchored objects
    /// sharing an id keep the last one.
    pub fn new(
        waypoints: Vec<Waypoint>,
        edges: Vec<Edge>,
        anchors: Vec<Anchor>,
        anchored_objects: Vec<AnchoredObject>,
    ) -> Self {
        let mut unique = Vec::with_capacity(waypoints.len());
        let mut index = HashMap::with_capacity(waypoints.len());
        for waypoint in waypoints {
            if index.contains_key(&waypoint.id) {
                warn!("Duplicate waypoint {} ignored", waypoint.id);
                continue;
            }
            index.insert(waypoint.id.clone(), unique.len());
            unique.push(waypoint);
        }

        let edges: Vec<Edge> = edges
            .into_iter()
            .filter(|edge| {
                let known = index.contains_key(&edge.from) && index.contains_key(&edge.to);
                if !known {
                    warn!(
                        "Edge {} references an unknown waypoint, skipping it",
                        edge.key()
                    );
                }
                known
            })
            .collect();

        let mut seen_pairs = HashSet::new();
        for edge in &edges {
            if !seen_pairs.insert((edge.from.as_str(), edge.to.as_str())) {
                debug!("Parallel edge {} kept; first one wins during traversal", edge.key());
            }
        }

        // Repeated object ids collapse onto the first slot with the last pose
        let mut objects: IndexMap<String, AnchoredObject> =
            IndexMap::with_capacity(anchored_objects.len());
        for object in anchored_objects {
            if let Some(previous) = objects.insert(object.id.clone(), object) {
                debug!("Anchored object {} repeated; later entry replaces it", previous.id);
            }
        }

        Self {
            waypoints: unique,
            index,
            edges,
            anchors,
            anchored_objects: objects.into_values().collect(),
            snapshots: HashMap::new(),
        }
    }

    /// Attach a loaded snapshot.
    pub fn insert_snapshot(&mut self, snapshot: Snapshot) {
        self.snapshots.insert(snapshot.id.clone(), snapshot);
    }

    /// Waypoints in load order.
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn anchors(&self) -> &[Anchor] {
        &self.anchors
    }

    pub fn anchored_objects(&self) -> &[AnchoredObject] {
        &self.anchored_objects
    }

    /// Traversal root: the first waypoint in load order.
    pub fn root(&self) -> Option<&Waypoint> {
        self.waypoints.first()
    }

    pub fn get_waypoint(&self, id: &str) -> Option<&Waypoint> {
        self.index.get(id).map(|&i| &self.waypoints[i])
    }

    pub fn contains_waypoint(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Snapshot recorded at the given waypoint, if it was loaded.
    pub fn snapshot_for(&self, waypoint_id: &str) -> Option<&Snapshot> {
        let waypoint = self.get_waypoint(waypoint_id)?;
        if !waypoint.has_snapshot() {
            return None;
        }
        self.snapshots.get(&waypoint.snapshot_id)
    }

    /// Whether the waypoint's snapshot is available in memory.
    pub fn has_images(&self, waypoint: &Waypoint) -> bool {
        waypoint.has_snapshot() && self.snapshots.contains_key(&waypoint.snapshot_id)
    }

    pub fn num_snapshots(&self) -> usize {
        self.snapshots.len()
    }

    /// Replace a waypoint's label. Returns false if the waypoint is unknown.
    pub fn set_label(&mut self, id: &str, label: impl Into<String>) -> bool {
        match self.index.get(id) {
            Some(&i) => {
                self.waypoints[i].label = label.into();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::SE3;

    fn waypoint(id: &str, snapshot_id: &str) -> Waypoint {
        Waypoint {
            id: id.into(),
            label: String::new(),
            snapshot_id: snapshot_id.to_string(),
        }
    }

    fn edge(from: &str, to: &str) -> Edge {
        Edge {
            snapshot_id: String::new(),
            from: from.into(),
            to: to.into(),
            from_tform_to: SE3::identity(),
        }
    }

    #[test]
    fn test_root_is_first_waypoint() {
        let store = GraphStore::new(
            vec![waypoint("b", ""), waypoint("a", "")],
            vec![],
            vec![],
            vec![],
        );
        assert_eq!(store.root().map(|w| w.id.as_str()), Some("b"));
    }

    #[test]
    fn test_empty_store_has_no_root() {
        assert!(GraphStore::default().root().is_none());
    }

    #[test]
    fn test_edges_with_unknown_endpoints_dropped() {
        let store = GraphStore::new(
            vec![waypoint("a", ""), waypoint("b", "")],
            vec![edge("a", "b"), edge("a", "ghost"), edge("ghost", "b")],
            vec![],
            vec![],
        );
        assert_eq!(store.edges().len(), 1);
        assert_eq!(store.edges()[0].key(), "a_b");
    }

    #[test]
    fn test_parallel_edges_kept() {
        let store = GraphStore::new(
            vec![waypoint("a", ""), waypoint("b", "")],
            vec![edge("a", "b"), edge("a", "b")],
            vec![],
            vec![],
        );
        assert_eq!(store.edges().len(), 2);
    }

    #[test]
    fn test_duplicate_waypoint_keeps_first() {
        let mut first = waypoint("a", "");
        first.label = "first".to_string();
        let mut second = waypoint("a", "");
        second.label = "second".to_string();

        let store = GraphStore::new(vec![first, second], vec![], vec![], vec![]);
        assert_eq!(store.waypoints().len(), 1);
        assert_eq!(store.get_waypoint("a").unwrap().label, "first");
    }

    #[test]
    fn test_repeated_anchored_object_last_wins() {
        let object = |id: &str, x: f64| AnchoredObject {
            id: id.to_string(),
            seed_tform_object: SE3 {
                translation: nalgebra::Vector3::new(x, 0.0, 0.0),
                ..SE3::identity()
            },
        };
        let store = GraphStore::new(
            vec![],
            vec![],
            vec![],
            vec![object("dock", 1.0), object("door", 2.0), object("dock", 3.0)],
        );

        let ids: Vec<_> = store.anchored_objects().iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, ["dock", "door"]);
        assert_eq!(store.anchored_objects()[0].seed_tform_object.position(), [3.0, 0.0, 0.0]);
    }

    #[test]
    fn test_snapshot_lookup() {
        let mut store = GraphStore::new(
            vec![waypoint("a", "snap-a"), waypoint("b", "snap-missing"), waypoint("c", "")],
            vec![],
            vec![],
            vec![],
        );
        store.insert_snapshot(Snapshot {
            id: "snap-a".to_string(),
            images: vec![],
        });

        assert!(store.snapshot_for("a").is_some());
        assert!(store.snapshot_for("b").is_none());
        assert!(store.snapshot_for("c").is_none());
        assert!(store.has_images(store.get_waypoint("a").unwrap()));
        assert!(!store.has_images(store.get_waypoint("b").unwrap()));
    }

    #[test]
    fn test_set_label() {
        let mut store = GraphStore::new(vec![waypoint("a", "")], vec![], vec![], vec![]);

        assert!(store.set_label("a", "kitchen"));
        assert_eq!(store.get_waypoint("a").unwrap().label, "kitchen");
        assert!(!store.set_label("nope", "x"));
    }
}
