//! MapService - the query context shared by every request.
//!
//! Built once at startup from a map directory and an annotation directory.
//! Transforms and annotations are resolved up front and never change; the
//! only mutation is the waypoint label update, which is serialized behind a
//! single writer lock and persisted before it becomes visible.

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::annotations::{load_annotations, AnnotationIndex};
use crate::config::ServiceConfig;
use crate::error::{Error, Result};
use prost::Message;

use crate::graph::loader::{graph_to_wire, load_graph_from_bytes, read_graph_bytes, write_graph_bytes};
use crate::graph::patch::relabel_waypoint;
use crate::graph::{GraphStore, Snapshot};
use crate::imaging::{EncodedImage, ImageReconstructor};
use crate::resolver::{AnchorResolver, FrameMode, PoseResolver, ResolvedFrames};

pub mod responses;

pub use responses::{
    CheckResponse, FrontImages, LabelUpdate, MapEdge, MapObject, MapResponse, MapWaypoint,
    WaypointDetail, WaypointImages, WaypointSummary,
};

/// Shared map state plus the operations exposed to callers.
pub struct MapService {
    config: ServiceConfig,
    store: RwLock<GraphStore>,
    frames: ResolvedFrames,
    annotations: AnnotationIndex,
    reconstructor: ImageReconstructor,
    /// Graph file bytes as last persisted. Label updates patch these, so
    /// everything the store does not model survives a rewrite. Locking it
    /// serializes persist-then-mutate.
    persisted: Mutex<Vec<u8>>,
}

impl MapService {
    /// Load the map and annotations named by `config`.
    pub fn load(config: ServiceConfig) -> Result<Self> {
        info!("Loading map from {:?}", config.map_path);
        let graph_bytes = read_graph_bytes(&config.map_path)?;
        let store = load_graph_from_bytes(&config.map_path, &graph_bytes)?;

        let annotations = AnnotationIndex::build(load_annotations(&config.annotations_path)?);
        if annotations.is_empty() {
            warn!("No waypoint annotations found in {:?}", config.annotations_path);
        } else {
            info!("{} waypoints carry annotations", annotations.len());
        }

        Ok(Self::assemble(config, store, graph_bytes, annotations))
    }

    /// Assemble a service from an in-memory store, resolving both frames.
    ///
    /// The graph file a label update writes is the store's own encoding.
    pub fn from_parts(config: ServiceConfig, store: GraphStore, annotations: AnnotationIndex) -> Self {
        let graph_bytes = graph_to_wire(&store).encode_to_vec();
        Self::assemble(config, store, graph_bytes, annotations)
    }

    fn assemble(
        config: ServiceConfig,
        store: GraphStore,
        graph_bytes: Vec<u8>,
        annotations: AnnotationIndex,
    ) -> Self {
        let traversal = PoseResolver::new(&store).resolve();
        let anchoring = AnchorResolver::resolve(&store);
        info!(
            "Resolved {} waypoints by traversal and {} by anchoring",
            traversal.len(),
            anchoring.len()
        );

        let reconstructor = ImageReconstructor::new(config.jpeg_quality);
        Self {
            config,
            store: RwLock::new(store),
            frames: ResolvedFrames::new(traversal, anchoring),
            annotations,
            reconstructor,
            persisted: Mutex::new(graph_bytes),
        }
    }

    /// Waypoints, edges and (in anchoring mode) anchored objects placed in
    /// the selected frame. Anything without a transform is left out.
    pub fn map(&self, use_anchoring: bool) -> MapResponse {
        let mode = FrameMode::from_anchoring(use_anchoring);
        let store = self.store.read();

        let waypoints = store
            .waypoints()
            .iter()
            .filter_map(|waypoint| {
                let position = self.frames.position(mode, waypoint.id.as_str())?;
                Some(MapWaypoint {
                    id: waypoint.id.to_string(),
                    position,
                    label: waypoint.label.clone(),
                    snapshot_id: waypoint.snapshot_id.clone(),
                    has_images: store.has_images(waypoint),
                    objects: self.annotations.objects_for(waypoint.id.as_str()).to_vec(),
                })
            })
            .collect();

        let edges = store
            .edges()
            .iter()
            .filter_map(|edge| {
                let from_position = self.frames.position(mode, edge.from.as_str())?;
                let to_position = self.frames.position(mode, edge.to.as_str())?;
                Some(MapEdge {
                    id: edge.key(),
                    from_id: edge.from.to_string(),
                    to_id: edge.to.to_string(),
                    from_position,
                    to_position,
                })
            })
            .collect();

        let objects = if mode.is_anchoring() {
            store
                .anchored_objects()
                .iter()
                .map(|object| MapObject {
                    id: object.id.clone(),
                    position: object.seed_tform_object.position(),
                    kind: "anchor",
                })
                .collect()
        } else {
            Vec::new()
        };

        MapResponse {
            waypoints,
            edges,
            objects,
            use_anchoring,
        }
    }

    /// Every waypoint in load order, placed or not.
    pub fn waypoints(&self) -> Vec<WaypointSummary> {
        self.store
            .read()
            .waypoints()
            .iter()
            .map(|waypoint| WaypointSummary {
                id: waypoint.id.to_string(),
                label: waypoint.label.clone(),
                has_snapshot: waypoint.has_snapshot(),
            })
            .collect()
    }

    pub fn waypoint(&self, waypoint_id: &str, use_anchoring: bool) -> Result<WaypointDetail> {
        let store = self.store.read();
        let waypoint = store
            .get_waypoint(waypoint_id)
            .ok_or_else(|| Error::NotFound(format!("Waypoint {}", waypoint_id)))?;

        Ok(WaypointDetail {
            id: waypoint.id.to_string(),
            label: waypoint.label.clone(),
            snapshot_id: waypoint.snapshot_id.clone(),
            position: self
                .frames
                .position(FrameMode::from_anchoring(use_anchoring), waypoint_id),
            objects: self.annotations.objects_for(waypoint_id).to_vec(),
        })
    }

    /// Reconstruct the two forward camera images of a waypoint's snapshot.
    ///
    /// Fails only when there is no snapshot to read; a capture that cannot be
    /// reconstructed leaves its side empty.
    pub fn waypoint_images(&self, waypoint_id: &str) -> Result<FrontImages> {
        let store = self.store.read();
        let waypoint = store
            .get_waypoint(waypoint_id)
            .ok_or_else(|| Error::NotFound(format!("Waypoint {}", waypoint_id)))?;
        if !waypoint.has_snapshot() {
            return Err(Error::NotFound(format!("Snapshot for waypoint {}", waypoint_id)));
        }
        let snapshot = store
            .snapshot_for(waypoint_id)
            .ok_or_else(|| Error::NotFound(format!("Snapshot {}", waypoint.snapshot_id)))?;

        let sources = &self.config.front_sources;
        Ok(FrontImages {
            left: self.reconstruct_source(snapshot, &sources.left),
            right: self.reconstruct_source(snapshot, &sources.right),
        })
    }

    fn reconstruct_source(&self, snapshot: &Snapshot, source: &str) -> Option<EncodedImage> {
        let Some(capture) = snapshot.image_from(source) else {
            debug!("Snapshot {} has no image from {}", snapshot.id, source);
            return None;
        };
        match self.reconstructor.reconstruct(capture) {
            Ok(image) => Some(image),
            Err(e) => {
                warn!("Skipping {} image of snapshot {}: {}", source, snapshot.id, e);
                None
            }
        }
    }

    /// Sorted catalog of every annotated object label.
    pub fn objects(&self) -> Vec<String> {
        self.annotations.catalog().to_vec()
    }

    pub fn check(&self) -> CheckResponse {
        let store = self.store.read();
        CheckResponse {
            status: "ok",
            map_path: self.config.map_path.display().to_string(),
            waypoints_count: store.waypoints().len(),
            edges_count: store.edges().len(),
            snapshots_count: store.num_snapshots(),
            objects_count: self.annotations.catalog().len(),
        }
    }

    /// Rename a waypoint and rewrite the graph file.
    ///
    /// Only the waypoint's name changes in the file; every other byte is
    /// carried over. The new graph is written first and memory changes only
    /// once the write has succeeded, so a failed write leaves both sides as
    /// they were.
    pub fn update_label(&self, waypoint_id: &str, label: &str) -> Result<LabelUpdate> {
        let mut persisted = self.persisted.lock();

        if !self.store.read().contains_waypoint(waypoint_id) {
            return Err(Error::NotFound(format!("Waypoint {}", waypoint_id)));
        }
        let patched = relabel_waypoint(&persisted, waypoint_id, label)?;

        write_graph_bytes(&self.config.map_path, &patched).map_err(|e| {
            warn!("Could not persist label of waypoint {}: {}", waypoint_id, e);
            Error::Persistence(e.to_string())
        })?;

        *persisted = patched;
        self.store.write().set_label(waypoint_id, label);
        info!("Waypoint {} relabelled to {:?}", waypoint_id, label);

        Ok(LabelUpdate {
            success: true,
            message: format!("Label updated for waypoint {}", waypoint_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::AnnotationRecord;
    use crate::geometry::SE3;
    use crate::graph::{
        load_graph, Anchor, AnchoredObject, Edge, ImageCapture, ImageEncoding, PixelFormat,
        Waypoint,
    };
    use crate::imaging::rotation::{FRONTLEFT_FISHEYE, FRONTRIGHT_FISHEYE};
    use approx::assert_relative_eq;
    use nalgebra::{UnitQuaternion, Vector3};
    use tempfile::TempDir;

    fn waypoint(id: &str, snapshot_id: &str) -> Waypoint {
        Waypoint {
            id: id.into(),
            label: String::new(),
            snapshot_id: snapshot_id.to_string(),
        }
    }

    fn shift(x: f64, y: f64) -> SE3 {
        SE3 {
            rotation: UnitQuaternion::identity(),
            translation: Vector3::new(x, y, 0.0),
        }
    }

    fn gray_capture(source: &str) -> ImageCapture {
        ImageCapture {
            source: source.to_string(),
            pixel_format: PixelFormat::Gray8,
            encoding: ImageEncoding::Raw,
            rows: 4,
            cols: 6,
            data: vec![128; 24],
        }
    }

    /// root -> a, b -> root, c isolated. Only a and c are anchored.
    fn sample_service(map_path: &std::path::Path) -> MapService {
        let waypoints = vec![
            waypoint("root", "snap-root"),
            waypoint("a", ""),
            waypoint("b", "snap-missing"),
            waypoint("c", ""),
        ];
        let edges = vec![
            Edge {
                snapshot_id: String::new(),
                from: "root".into(),
                to: "a".into(),
                from_tform_to: shift(1.0, 0.0),
            },
            Edge {
                snapshot_id: String::new(),
                from: "b".into(),
                to: "root".into(),
                from_tform_to: shift(0.0, 2.0),
            },
        ];
        let anchors = vec![
            Anchor {
                waypoint_id: "a".into(),
                seed_tform_waypoint: shift(5.0, 5.0),
            },
            Anchor {
                waypoint_id: "c".into(),
                seed_tform_waypoint: shift(-1.0, 0.0),
            },
        ];
        let objects = vec![AnchoredObject {
            id: "dock".to_string(),
            seed_tform_object: shift(3.0, 0.0),
        }];

        let mut store = GraphStore::new(waypoints, edges, anchors, objects);
        store.insert_snapshot(Snapshot {
            id: "snap-root".to_string(),
            images: vec![
                gray_capture(FRONTRIGHT_FISHEYE),
                ImageCapture {
                    data: vec![1, 2, 3],
                    encoding: ImageEncoding::Compressed,
                    ..gray_capture(FRONTLEFT_FISHEYE)
                },
            ],
        });

        let record: AnnotationRecord = serde_json::from_str(
            r#"{"waypoint_id": "root", "views": {"front": {"visible_objects": ["Chairs", "a desk"]}}}"#,
        )
        .unwrap();
        let annotations = AnnotationIndex::build([record]);

        let config = ServiceConfig::new(map_path, map_path.join("db"));
        MapService::from_parts(config, store, annotations)
    }

    #[test]
    fn test_map_traversal_frame() {
        let dir = TempDir::new().unwrap();
        let service = sample_service(dir.path());
        let map = service.map(false);

        let ids: Vec<_> = map.waypoints.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, ["root", "a", "b"]);
        assert!(!map.use_anchoring);
        assert!(map.objects.is_empty());

        let b = &map.waypoints[2];
        assert_relative_eq!(b.position[1], -2.0, epsilon = 1e-12);
        assert!(!b.has_images);
        assert!(map.waypoints[0].has_images);
        assert_eq!(map.waypoints[0].objects, ["chair", "desk"]);

        assert_eq!(map.edges.len(), 2);
        assert_eq!(map.edges[0].id, "root_a");
        assert_relative_eq!(map.edges[0].to_position[0], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_map_anchoring_frame() {
        let dir = TempDir::new().unwrap();
        let service = sample_service(dir.path());
        let map = service.map(true);

        let ids: Vec<_> = map.waypoints.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, ["a", "c"]);
        // Neither edge has both ends anchored
        assert!(map.edges.is_empty());
        assert_eq!(map.objects.len(), 1);
        assert_eq!(map.objects[0].kind, "anchor");
        assert_relative_eq!(map.objects[0].position[0], 3.0, epsilon = 1e-12);
        assert!(map.use_anchoring);
    }

    #[test]
    fn test_map_serializes_type_field() {
        let dir = TempDir::new().unwrap();
        let service = sample_service(dir.path());
        let json = serde_json::to_value(service.map(true)).unwrap();
        assert_eq!(json["objects"][0]["type"], "anchor");
        assert_eq!(json["use_anchoring"], true);
    }

    #[test]
    fn test_waypoints_list() {
        let dir = TempDir::new().unwrap();
        let service = sample_service(dir.path());
        let list = service.waypoints();
        assert_eq!(list.len(), 4);
        assert!(list[0].has_snapshot);
        assert!(!list[1].has_snapshot);
        assert!(list[2].has_snapshot);
    }

    #[test]
    fn test_waypoint_detail() {
        let dir = TempDir::new().unwrap();
        let service = sample_service(dir.path());

        let c = service.waypoint("c", false).unwrap();
        assert!(c.position.is_none());
        let c = service.waypoint("c", true).unwrap();
        assert_relative_eq!(c.position.unwrap()[0], -1.0, epsilon = 1e-12);

        let root = service.waypoint("root", false).unwrap();
        assert_eq!(root.objects, ["chair", "desk"]);

        let err = service.waypoint("nope", false).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_waypoint_images_partial_failure() {
        let dir = TempDir::new().unwrap();
        let service = sample_service(dir.path());
        let images = service.waypoint_images("root").unwrap();

        // Left comes from the front-right camera, rotated a quarter turn
        let left = images.left.as_ref().unwrap();
        assert_eq!(left.source, FRONTRIGHT_FISHEYE);
        assert_eq!((left.width, left.height), (4, 6));
        // The front-left capture holds garbage compressed bytes
        assert!(images.right.is_none());

        let response = images.to_response();
        assert!(response.left.is_some());
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("right").is_none());
    }

    #[test]
    fn test_waypoint_images_not_found() {
        let dir = TempDir::new().unwrap();
        let service = sample_service(dir.path());
        assert!(service.waypoint_images("nope").unwrap_err().is_not_found());
        assert!(service.waypoint_images("a").unwrap_err().is_not_found());
        // Snapshot id recorded but the file was never loaded
        assert!(service.waypoint_images("b").unwrap_err().is_not_found());
    }

    #[test]
    fn test_objects_and_check() {
        let dir = TempDir::new().unwrap();
        let service = sample_service(dir.path());
        assert_eq!(service.objects(), ["chair", "desk"]);

        let check = service.check();
        assert_eq!(check.status, "ok");
        assert_eq!(check.waypoints_count, 4);
        assert_eq!(check.edges_count, 2);
        assert_eq!(check.snapshots_count, 1);
        assert_eq!(check.objects_count, 2);
    }

    #[test]
    fn test_update_label_persists_then_applies() {
        let dir = TempDir::new().unwrap();
        let service = sample_service(dir.path());

        let update = service.update_label("a", "kitchen").unwrap();
        assert!(update.success);
        assert_eq!(service.waypoint("a", false).unwrap().label, "kitchen");

        let reloaded = load_graph(dir.path()).unwrap();
        assert_eq!(reloaded.get_waypoint("a").unwrap().label, "kitchen");
        assert_eq!(reloaded.waypoints().len(), 4);
    }

    #[test]
    fn test_update_label_unknown_waypoint() {
        let dir = TempDir::new().unwrap();
        let service = sample_service(dir.path());
        let err = service.update_label("nope", "x").unwrap_err();
        assert!(err.is_not_found());
        assert!(!dir.path().join("graph").exists());
    }

    #[test]
    fn test_update_label_failed_write_leaves_memory() {
        let dir = TempDir::new().unwrap();
        // A directory in the temp file's place makes the write fail
        std::fs::create_dir(dir.path().join("graph.tmp")).unwrap();
        let service = sample_service(dir.path());

        let err = service.update_label("a", "kitchen").unwrap_err();
        assert!(matches!(err, Error::Persistence(_)));
        assert!(err.to_string().starts_with("Error updating label"));
        assert_eq!(service.waypoint("a", false).unwrap().label, "");
    }
}
