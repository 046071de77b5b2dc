//! Protobuf wire layout of the graph and snapshot files.
//!
//! Only the fields this crate consumes are declared. prost skips unknown
//! fields when decoding, so files carrying extra data still load. Label
//! updates go through [`super::patch`], which edits the encoded bytes and
//! keeps that extra data; [`super::loader::save_graph`] writes only what is
//! declared here.

use nalgebra::Vector3;

use super::types::{self, ImageEncoding, PixelFormat};
use crate::geometry::SE3;

#[derive(Clone, PartialEq, prost::Message)]
pub struct Vec3 {
    #[prost(double, tag = "1")]
    pub x: f64,
    #[prost(double, tag = "2")]
    pub y: f64,
    #[prost(double, tag = "3")]
    pub z: f64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Quaternion {
    #[prost(double, tag = "1")]
    pub x: f64,
    #[prost(double, tag = "2")]
    pub y: f64,
    #[prost(double, tag = "3")]
    pub z: f64,
    #[prost(double, tag = "4")]
    pub w: f64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Se3Pose {
    #[prost(message, optional, tag = "1")]
    pub position: Option<Vec3>,
    #[prost(message, optional, tag = "2")]
    pub rotation: Option<Quaternion>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct WaypointAnnotations {
    #[prost(string, tag = "1")]
    pub name: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Waypoint {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub snapshot_id: String,
    #[prost(message, optional, tag = "4")]
    pub annotations: Option<WaypointAnnotations>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct EdgeId {
    #[prost(string, tag = "1")]
    pub from_waypoint: String,
    #[prost(string, tag = "2")]
    pub to_waypoint: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Edge {
    #[prost(message, optional, tag = "1")]
    pub id: Option<EdgeId>,
    #[prost(string, tag = "2")]
    pub snapshot_id: String,
    #[prost(message, optional, tag = "3")]
    pub from_tform_to: Option<Se3Pose>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Anchor {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(message, optional, tag = "2")]
    pub seed_tform_waypoint: Option<Se3Pose>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct AnchoredWorldObject {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(message, optional, tag = "2")]
    pub seed_tform_object: Option<Se3Pose>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Anchoring {
    #[prost(message, repeated, tag = "1")]
    pub anchors: Vec<Anchor>,
    #[prost(message, repeated, tag = "2")]
    pub objects: Vec<AnchoredWorldObject>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Graph {
    #[prost(message, repeated, tag = "1")]
    pub waypoints: Vec<Waypoint>,
    #[prost(message, repeated, tag = "2")]
    pub edges: Vec<Edge>,
    #[prost(message, optional, tag = "3")]
    pub anchoring: Option<Anchoring>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Image {
    #[prost(int32, tag = "2")]
    pub cols: i32,
    #[prost(int32, tag = "3")]
    pub rows: i32,
    #[prost(bytes = "vec", tag = "4")]
    pub data: Vec<u8>,
    #[prost(int32, tag = "5")]
    pub format: i32,
    #[prost(int32, tag = "6")]
    pub pixel_format: i32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ImageCapture {
    #[prost(message, optional, tag = "4")]
    pub image: Option<Image>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ImageSource {
    #[prost(string, tag = "2")]
    pub name: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ImageResponse {
    #[prost(message, optional, tag = "1")]
    pub shot: Option<ImageCapture>,
    #[prost(message, optional, tag = "2")]
    pub source: Option<ImageSource>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct WaypointSnapshot {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(message, repeated, tag = "2")]
    pub images: Vec<ImageResponse>,
}

// Wire values of the image enumerations.
const FORMAT_RAW: i32 = 2;
const FORMAT_JPEG: i32 = 1;

const PIXEL_FORMAT_GREYSCALE_U8: i32 = 1;
const PIXEL_FORMAT_GREYSCALE_U16: i32 = 2;
const PIXEL_FORMAT_RGB_U8: i32 = 3;
const PIXEL_FORMAT_RGBA_U8: i32 = 4;
const PIXEL_FORMAT_DEPTH_U16: i32 = 5;

impl From<&Se3Pose> for SE3 {
    fn from(pose: &Se3Pose) -> Self {
        let position = pose.position.clone().unwrap_or_default();
        let rotation = pose.rotation.clone().unwrap_or_default();
        SE3::from_quaternion(
            rotation.w,
            rotation.x,
            rotation.y,
            rotation.z,
            Vector3::new(position.x, position.y, position.z),
        )
    }
}

impl From<&SE3> for Se3Pose {
    fn from(pose: &SE3) -> Self {
        let q = pose.rotation.quaternion();
        Se3Pose {
            position: Some(Vec3 {
                x: pose.translation.x,
                y: pose.translation.y,
                z: pose.translation.z,
            }),
            rotation: Some(Quaternion {
                x: q.i,
                y: q.j,
                z: q.k,
                w: q.w,
            }),
        }
    }
}

/// Absent pose fields decode as identity.
pub(crate) fn pose_or_identity(pose: Option<&Se3Pose>) -> SE3 {
    pose.map(SE3::from).unwrap_or_default()
}

impl PixelFormat {
    pub(crate) fn from_wire(value: i32) -> Self {
        match value {
            PIXEL_FORMAT_GREYSCALE_U8 => PixelFormat::Gray8,
            PIXEL_FORMAT_GREYSCALE_U16 => PixelFormat::Gray16,
            PIXEL_FORMAT_RGB_U8 => PixelFormat::Rgb8,
            PIXEL_FORMAT_RGBA_U8 => PixelFormat::Rgba8,
            PIXEL_FORMAT_DEPTH_U16 => PixelFormat::Depth16,
            _ => PixelFormat::Unknown,
        }
    }

    pub(crate) fn to_wire(self) -> i32 {
        match self {
            PixelFormat::Unknown => 0,
            PixelFormat::Gray8 => PIXEL_FORMAT_GREYSCALE_U8,
            PixelFormat::Gray16 => PIXEL_FORMAT_GREYSCALE_U16,
            PixelFormat::Rgb8 => PIXEL_FORMAT_RGB_U8,
            PixelFormat::Rgba8 => PIXEL_FORMAT_RGBA_U8,
            PixelFormat::Depth16 => PIXEL_FORMAT_DEPTH_U16,
        }
    }
}

impl ImageEncoding {
    /// Everything that is not raw goes through the general codec.
    pub(crate) fn from_wire(value: i32) -> Self {
        if value == FORMAT_RAW {
            ImageEncoding::Raw
        } else {
            ImageEncoding::Compressed
        }
    }

    pub(crate) fn to_wire(self) -> i32 {
        match self {
            ImageEncoding::Raw => FORMAT_RAW,
            ImageEncoding::Compressed => FORMAT_JPEG,
        }
    }
}

impl From<&ImageResponse> for types::ImageCapture {
    fn from(response: &ImageResponse) -> Self {
        let source = response
            .source
            .as_ref()
            .map(|s| s.name.clone())
            .unwrap_or_default();
        let image = response
            .shot
            .as_ref()
            .and_then(|shot| shot.image.clone())
            .unwrap_or_default();

        types::ImageCapture {
            source,
            pixel_format: PixelFormat::from_wire(image.pixel_format),
            encoding: ImageEncoding::from_wire(image.format),
            rows: image.rows.max(0) as u32,
            cols: image.cols.max(0) as u32,
            data: image.data,
        }
    }
}

impl From<&types::ImageCapture> for ImageResponse {
    fn from(capture: &types::ImageCapture) -> Self {
        ImageResponse {
            shot: Some(ImageCapture {
                image: Some(Image {
                    cols: capture.cols as i32,
                    rows: capture.rows as i32,
                    data: capture.data.clone(),
                    format: capture.encoding.to_wire(),
                    pixel_format: capture.pixel_format.to_wire(),
                }),
            }),
            source: Some(ImageSource {
                name: capture.source.clone(),
            }),
        }
    }
}

impl From<&WaypointSnapshot> for types::Snapshot {
    fn from(snapshot: &WaypointSnapshot) -> Self {
        types::Snapshot {
            id: snapshot.id.clone(),
            images: snapshot.images.iter().map(types::ImageCapture::from).collect(),
        }
    }
}

impl From<&types::Snapshot> for WaypointSnapshot {
    fn from(snapshot: &types::Snapshot) -> Self {
        WaypointSnapshot {
            id: snapshot.id.clone(),
            images: snapshot.images.iter().map(ImageResponse::from).collect(),
        }
    }
}
