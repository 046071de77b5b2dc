//! Service configuration.

use std::path::PathBuf;

use crate::imaging::rotation::{FRONTLEFT_FISHEYE, FRONTRIGHT_FISHEYE};
use crate::imaging::DEFAULT_JPEG_QUALITY;

/// Camera sources served by the waypoint image query.
///
/// The forward cameras are crossed over on the robot, so the image shown on
/// the left comes from the front-right fisheye and vice versa.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontCameraSources {
    pub left: String,
    pub right: String,
}

impl Default for FrontCameraSources {
    fn default() -> Self {
        Self {
            left: FRONTRIGHT_FISHEYE.to_string(),
            right: FRONTLEFT_FISHEYE.to_string(),
        }
    }
}

/// Where the map lives and how images are served.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Map directory holding `graph` and `waypoint_snapshots/`.
    pub map_path: PathBuf,
    /// Directory of `metadata_*.json` annotation documents.
    pub annotations_path: PathBuf,
    pub jpeg_quality: u8,
    pub front_sources: FrontCameraSources,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            map_path: PathBuf::from("./assets/maps/chair_v3"),
            annotations_path: PathBuf::from("./assets/database/chair_v3"),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            front_sources: FrontCameraSources::default(),
        }
    }
}

impl ServiceConfig {
    pub fn new(map_path: impl Into<PathBuf>, annotations_path: impl Into<PathBuf>) -> Self {
        Self {
            map_path: map_path.into(),
            annotations_path: annotations_path.into(),
            ..Self::default()
        }
    }
}
