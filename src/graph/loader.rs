//! Reading and writing a recorded map directory.
//!
//! Layout:
//! ```text
//! <map_path>/graph                          - serialized Graph
//! <map_path>/waypoint_snapshots/<snap_id>   - one WaypointSnapshot per file
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use prost::Message;
use tracing::{debug, info, warn};

use super::proto::{self, pose_or_identity};
use super::store::GraphStore;
use super::types::{Anchor, AnchoredObject, Edge, Snapshot, Waypoint, WaypointId};
use crate::error::Result;

/// Name of the graph file inside a map directory.
pub const GRAPH_FILE_NAME: &str = "graph";

/// Directory holding snapshot files inside a map directory.
pub const SNAPSHOT_DIR_NAME: &str = "waypoint_snapshots";

pub fn graph_path(map_path: &Path) -> PathBuf {
    map_path.join(GRAPH_FILE_NAME)
}

pub fn snapshot_dir(map_path: &Path) -> PathBuf {
    map_path.join(SNAPSHOT_DIR_NAME)
}

/// Load the graph and every snapshot it references.
///
/// Snapshot files that are missing or fail to decode are skipped with a
/// warning; the waypoint then simply reports no images.
pub fn load_graph<P: AsRef<Path>>(map_path: P) -> Result<GraphStore> {
    let map_path = map_path.as_ref();
    let bytes = read_graph_bytes(map_path)?;
    load_graph_from_bytes(map_path, &bytes)
}

/// Raw contents of the graph file.
pub fn read_graph_bytes(map_path: &Path) -> Result<Vec<u8>> {
    Ok(fs::read(graph_path(map_path))?)
}

/// Build the store from already read graph bytes, loading snapshots from
/// `map_path`.
pub fn load_graph_from_bytes(map_path: &Path, bytes: &[u8]) -> Result<GraphStore> {
    let graph = proto::Graph::decode(bytes)?;

    let mut store = graph_from_wire(&graph);

    let snap_dir = snapshot_dir(map_path);
    let snapshot_ids: Vec<String> = store
        .waypoints()
        .iter()
        .filter(|w| w.has_snapshot())
        .map(|w| w.snapshot_id.clone())
        .collect();

    for snapshot_id in snapshot_ids {
        let path = snap_dir.join(&snapshot_id);
        if !path.exists() {
            debug!("Snapshot {} not found on disk", snapshot_id);
            continue;
        }
        match load_snapshot(&path) {
            Ok(snapshot) => store.insert_snapshot(snapshot),
            Err(e) => warn!("Could not load snapshot {:?}: {}. Skipping it.", path, e),
        }
    }

    info!(
        "Loaded map {:?}: {} waypoints, {} edges, {} anchors, {} anchored objects, {} snapshots",
        map_path,
        store.waypoints().len(),
        store.edges().len(),
        store.anchors().len(),
        store.anchored_objects().len(),
        store.num_snapshots()
    );

    Ok(store)
}

fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let bytes = fs::read(path)?;
    let snapshot = proto::WaypointSnapshot::decode(bytes.as_slice())?;
    Ok(Snapshot::from(&snapshot))
}

/// Convert the decoded wire graph into a [`GraphStore`] (without snapshots).
pub fn graph_from_wire(graph: &proto::Graph) -> GraphStore {
    let waypoints = graph
        .waypoints
        .iter()
        .map(|w| Waypoint {
            id: WaypointId::new(w.id.clone()),
            label: w
                .annotations
                .as_ref()
                .map(|a| a.name.clone())
                .unwrap_or_default(),
            snapshot_id: w.snapshot_id.clone(),
        })
        .collect();

    let edges = graph
        .edges
        .iter()
        .map(|e| {
            let id = e.id.clone().unwrap_or_default();
            Edge {
                from: WaypointId::new(id.from_waypoint),
                to: WaypointId::new(id.to_waypoint),
                from_tform_to: pose_or_identity(e.from_tform_to.as_ref()),
                snapshot_id: e.snapshot_id.clone(),
            }
        })
        .collect();

    let anchoring = graph.anchoring.clone().unwrap_or_default();
    let anchors = anchoring
        .anchors
        .iter()
        .map(|a| Anchor {
            waypoint_id: WaypointId::new(a.id.clone()),
            seed_tform_waypoint: pose_or_identity(a.seed_tform_waypoint.as_ref()),
        })
        .collect();
    let anchored_objects = anchoring
        .objects
        .iter()
        .map(|o| AnchoredObject {
            id: o.id.clone(),
            seed_tform_object: pose_or_identity(o.seed_tform_object.as_ref()),
        })
        .collect();

    GraphStore::new(waypoints, edges, anchors, anchored_objects)
}

/// Convert a [`GraphStore`] back into its wire form.
pub fn graph_to_wire(store: &GraphStore) -> proto::Graph {
    let waypoints = store
        .waypoints()
        .iter()
        .map(|w| proto::Waypoint {
            id: w.id.0.clone(),
            snapshot_id: w.snapshot_id.clone(),
            annotations: Some(proto::WaypointAnnotations {
                name: w.label.clone(),
            }),
        })
        .collect();

    let edges = store
        .edges()
        .iter()
        .map(|e| proto::Edge {
            id: Some(proto::EdgeId {
                from_waypoint: e.from.0.clone(),
                to_waypoint: e.to.0.clone(),
            }),
            snapshot_id: e.snapshot_id.clone(),
            from_tform_to: Some((&e.from_tform_to).into()),
        })
        .collect();

    let anchoring = proto::Anchoring {
        anchors: store
            .anchors()
            .iter()
            .map(|a| proto::Anchor {
                id: a.waypoint_id.0.clone(),
                seed_tform_waypoint: Some((&a.seed_tform_waypoint).into()),
            })
            .collect(),
        objects: store
            .anchored_objects()
            .iter()
            .map(|o| proto::AnchoredWorldObject {
                id: o.id.clone(),
                seed_tform_object: Some((&o.seed_tform_object).into()),
            })
            .collect(),
    };

    proto::Graph {
        waypoints,
        edges,
        anchoring: Some(anchoring),
    }
}

/// Write the full graph file, replacing the previous one atomically.
///
/// The bytes go to a sibling temporary file first and are renamed over the
/// graph file, so a failed write never leaves a truncated graph behind.
pub fn write_graph(map_path: &Path, graph: &proto::Graph) -> Result<()> {
    write_graph_bytes(map_path, &graph.encode_to_vec())
}

/// Atomically replace the graph file with already encoded bytes.
pub fn write_graph_bytes(map_path: &Path, bytes: &[u8]) -> Result<()> {
    let target = graph_path(map_path);
    let tmp = map_path.join(format!("{}.tmp", GRAPH_FILE_NAME));

    fs::write(&tmp, bytes)?;
    if let Err(e) = fs::rename(&tmp, &target) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

/// Persist the whole store (graph file only).
pub fn save_graph<P: AsRef<Path>>(map_path: P, store: &GraphStore) -> Result<()> {
    let map_path = map_path.as_ref();
    fs::create_dir_all(map_path)?;
    write_graph(map_path, &graph_to_wire(store))
}

/// Write one snapshot file under the map's snapshot directory.
pub fn save_snapshot<P: AsRef<Path>>(map_path: P, snapshot: &Snapshot) -> Result<()> {
    let dir = snapshot_dir(map_path.as_ref());
    fs::create_dir_all(&dir)?;
    let wire = proto::WaypointSnapshot::from(snapshot);
    fs::write(dir.join(&snapshot.id), wire.encode_to_vec())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::SE3;
    use crate::graph::types::{ImageCapture, ImageEncoding, PixelFormat};
    use approx::assert_relative_eq;
    use nalgebra::Vector3;
    use tempfile::TempDir;

    fn sample_store() -> GraphStore {
        let waypoints = vec![
            Waypoint {
                id: "wp-0".into(),
                label: "start".to_string(),
                snapshot_id: "snap-0".to_string(),
            },
            Waypoint {
                id: "wp-1".into(),
                label: String::new(),
                snapshot_id: String::new(),
            },
        ];
        let edges = vec![Edge {
            snapshot_id: "edge-snap".to_string(),
            from: "wp-0".into(),
            to: "wp-1".into(),
            from_tform_to: SE3::from_quaternion(
                0.0,
                0.0,
                0.0,
                1.0,
                Vector3::new(1.0, 0.0, 0.0),
            ),
        }];
        let anchors = vec![Anchor {
            waypoint_id: "wp-1".into(),
            seed_tform_waypoint: SE3::from_quaternion(1.0, 0.0, 0.0, 0.0, Vector3::new(5.0, 6.0, 7.0)),
        }];
        let objects = vec![AnchoredObject {
            id: "dock".to_string(),
            seed_tform_object: SE3::identity(),
        }];
        GraphStore::new(waypoints, edges, anchors, objects)
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = sample_store();
        save_graph(dir.path(), &store).unwrap();

        let loaded = load_graph(dir.path()).unwrap();
        assert_eq!(loaded.waypoints(), store.waypoints());
        assert_eq!(loaded.edges().len(), 1);
        assert_eq!(loaded.edges()[0].snapshot_id, "edge-snap");
        assert_relative_eq!(
            loaded.edges()[0].from_tform_to.to_matrix(),
            store.edges()[0].from_tform_to.to_matrix(),
            epsilon = 1e-12
        );
        assert_eq!(loaded.anchors()[0].seed_tform_waypoint.position(), [5.0, 6.0, 7.0]);
        assert_eq!(loaded.anchored_objects()[0].id, "dock");
        // snap-0 was never written
        assert_eq!(loaded.num_snapshots(), 0);
    }

    #[test]
    fn test_snapshots_loaded_for_waypoints() {
        let dir = TempDir::new().unwrap();
        save_graph(dir.path(), &sample_store()).unwrap();
        save_snapshot(
            dir.path(),
            &Snapshot {
                id: "snap-0".to_string(),
                images: vec![ImageCapture {
                    source: "frontleft_fisheye_image".to_string(),
                    pixel_format: PixelFormat::Gray8,
                    encoding: ImageEncoding::Raw,
                    rows: 2,
                    cols: 2,
                    data: vec![1, 2, 3, 4],
                }],
            },
        )
        .unwrap();

        let loaded = load_graph(dir.path()).unwrap();
        let snapshot = loaded.snapshot_for("wp-0").unwrap();
        assert_eq!(snapshot.images.len(), 1);
        assert_eq!(snapshot.images[0].data, vec![1, 2, 3, 4]);
        assert_eq!(snapshot.images[0].encoding, ImageEncoding::Raw);
    }

    #[test]
    fn test_corrupt_snapshot_skipped() {
        let dir = TempDir::new().unwrap();
        save_graph(dir.path(), &sample_store()).unwrap();
        fs::create_dir_all(snapshot_dir(dir.path())).unwrap();
        fs::write(snapshot_dir(dir.path()).join("snap-0"), [0xff, 0xff, 0xff]).unwrap();

        let loaded = load_graph(dir.path()).unwrap();
        assert_eq!(loaded.num_snapshots(), 0);
    }

    #[test]
    fn test_missing_graph_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = load_graph(dir.path()).unwrap_err();
        assert!(matches!(err, crate::Error::Io(_)));
    }

    #[test]
    fn test_write_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        save_graph(dir.path(), &sample_store()).unwrap();

        assert!(graph_path(dir.path()).exists());
        assert!(!dir.path().join("graph.tmp").exists());
    }
}
