//! Core types for the in-memory pose graph.

use std::borrow::Borrow;

use crate::geometry::SE3;

/// Identifier of a waypoint, as recorded in the graph file.
///
/// Ids are opaque strings; the newtype keeps them from being mixed up with
/// snapshot ids, which are also strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WaypointId(pub String);

impl WaypointId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WaypointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WaypointId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl Borrow<str> for WaypointId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A recorded location in the pose graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    pub id: WaypointId,
    /// User-facing name; empty when never labelled.
    pub label: String,
    /// Snapshot recorded at this waypoint; empty when none was taken.
    pub snapshot_id: String,
}

impl Waypoint {
    pub fn has_snapshot(&self) -> bool {
        !self.snapshot_id.is_empty()
    }
}

/// Directed relation between two waypoints.
///
/// `from_tform_to` maps points in the `to` frame into the `from` frame.
/// Traversing the edge backwards uses its inverse.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub from: WaypointId,
    pub to: WaypointId,
    pub from_tform_to: SE3,
    /// Snapshot recorded while traversing the edge; empty when none.
    pub snapshot_id: String,
}

impl Edge {
    /// Wire id of the edge, `"<from>_<to>"`.
    pub fn key(&self) -> String {
        format!("{}_{}", self.from, self.to)
    }
}

/// Absolute pose of a waypoint in the seed frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    pub waypoint_id: WaypointId,
    pub seed_tform_waypoint: SE3,
}

/// Absolute pose of a detected world object in the seed frame.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchoredObject {
    pub id: String,
    pub seed_tform_object: SE3,
}

/// Pixel layout of a raw capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Unknown,
    Gray8,
    Gray16,
    Rgb8,
    Rgba8,
    Depth16,
}

/// How the capture's byte buffer is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageEncoding {
    /// Uncompressed samples, row-major.
    Raw,
    /// Any container the general image codec understands (JPEG, PNG, ...).
    Compressed,
}

/// One camera capture stored in a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageCapture {
    pub source: String,
    pub pixel_format: PixelFormat,
    pub encoding: ImageEncoding,
    pub rows: u32,
    pub cols: u32,
    pub data: Vec<u8>,
}

/// Bundle of sensor captures recorded at one waypoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub id: String,
    pub images: Vec<ImageCapture>,
}

impl Snapshot {
    /// Capture taken by the named camera source. When the source appears
    /// more than once, the last capture wins.
    pub fn image_from(&self, source: &str) -> Option<&ImageCapture> {
        self.images.iter().rev().find(|img| img.source == source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_waypoint_id_str_lookup() {
        let mut map: HashMap<WaypointId, u32> = HashMap::new();
        map.insert(WaypointId::new("wp-1"), 1);

        assert_eq!(map.get("wp-1"), Some(&1));
        assert_eq!(map.get("wp-2"), None);
    }

    #[test]
    fn test_edge_key() {
        let edge = Edge {
            snapshot_id: String::new(),
            from: "a".into(),
            to: "b".into(),
            from_tform_to: SE3::identity(),
        };
        assert_eq!(edge.key(), "a_b");
    }

    #[test]
    fn test_snapshot_image_from() {
        let capture = |source: &str| ImageCapture {
            source: source.to_string(),
            pixel_format: PixelFormat::Gray8,
            encoding: ImageEncoding::Raw,
            rows: 1,
            cols: 1,
            data: vec![0],
        };
        let snapshot = Snapshot {
            id: "snap".to_string(),
            images: vec![capture("back_fisheye_image"), capture("left_fisheye_image")],
        };

        assert!(snapshot.image_from("left_fisheye_image").is_some());
        assert!(snapshot.image_from("frontleft_fisheye_image").is_none());
    }

    #[test]
    fn test_snapshot_repeated_source_last_wins() {
        let capture = |data: u8| ImageCapture {
            source: "frontleft_fisheye_image".to_string(),
            pixel_format: PixelFormat::Gray8,
            encoding: ImageEncoding::Raw,
            rows: 1,
            cols: 1,
            data: vec![data],
        };
        let snapshot = Snapshot {
            id: "snap".to_string(),
            images: vec![capture(1), capture(2), capture(3)],
        };

        let picked = snapshot.image_from("frontleft_fisheye_image").unwrap();
        assert_eq!(picked.data, vec![3]);
    }
}
