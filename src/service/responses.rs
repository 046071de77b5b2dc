//! Serializable shapes returned by [`MapService`](super::MapService) queries.

use serde::Serialize;

use crate::imaging::EncodedImage;

/// One waypoint placed in the selected frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapWaypoint {
    pub id: String,
    pub position: [f64; 3],
    pub label: String,
    pub snapshot_id: String,
    pub has_images: bool,
    pub objects: Vec<String>,
}

/// An edge whose endpoints both have a position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapEdge {
    pub id: String,
    pub from_id: String,
    pub to_id: String,
    pub from_position: [f64; 3],
    pub to_position: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapObject {
    pub id: String,
    pub position: [f64; 3],
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapResponse {
    pub waypoints: Vec<MapWaypoint>,
    pub edges: Vec<MapEdge>,
    pub objects: Vec<MapObject>,
    pub use_anchoring: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WaypointSummary {
    pub id: String,
    pub label: String,
    pub has_snapshot: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaypointDetail {
    pub id: String,
    pub label: String,
    pub snapshot_id: String,
    /// `null` when the waypoint has no transform in the selected frame.
    pub position: Option<[f64; 3]>,
    pub objects: Vec<String>,
}

/// The two forward camera images of a waypoint.
///
/// A side is `None` when its source is missing from the snapshot or could not
/// be reconstructed.
#[derive(Debug, Clone, Default)]
pub struct FrontImages {
    pub left: Option<EncodedImage>,
    pub right: Option<EncodedImage>,
}

impl FrontImages {
    pub fn to_response(&self) -> WaypointImages {
        WaypointImages {
            left: self.left.as_ref().map(EncodedImage::to_base64),
            right: self.right.as_ref().map(EncodedImage::to_base64),
        }
    }
}

/// Base64 JPEG payloads; absent sides are omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WaypointImages {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResponse {
    pub status: &'static str,
    pub map_path: String,
    pub waypoints_count: usize,
    pub edges_count: usize,
    pub snapshots_count: usize,
    pub objects_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelUpdate {
    pub success: bool,
    pub message: String,
}
