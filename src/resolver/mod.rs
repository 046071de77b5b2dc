//! Waypoint transform resolution.
//!
//! Two independent coordinate frames are produced, both as a
//! `waypoint id -> global transform` map:
//! - [`PoseResolver`] - BFS over edges, relative to the traversal root
//! - [`AnchorResolver`] - stored anchors, relative to the seed frame
//!
//! A waypoint missing from a map has no position in that frame. The two maps
//! are never mixed.

use std::collections::HashMap;

use crate::geometry::SE3;
use crate::graph::WaypointId;

pub mod anchor;
pub mod pose;

pub use anchor::AnchorResolver;
pub use pose::PoseResolver;

/// Waypoint id -> global transform.
pub type TransformMap = HashMap<WaypointId, SE3>;

/// Which frame a query reports positions in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameMode {
    /// Relative to the traversal root.
    #[default]
    Traversal,
    /// Relative to the seed frame, via anchors.
    Anchoring,
}

impl FrameMode {
    pub fn from_anchoring(use_anchoring: bool) -> Self {
        if use_anchoring {
            FrameMode::Anchoring
        } else {
            FrameMode::Traversal
        }
    }

    pub fn is_anchoring(self) -> bool {
        self == FrameMode::Anchoring
    }
}

/// Both resolved frames, computed once at startup.
#[derive(Debug, Clone, Default)]
pub struct ResolvedFrames {
    pub traversal: TransformMap,
    pub anchoring: TransformMap,
}

impl ResolvedFrames {
    pub fn new(traversal: TransformMap, anchoring: TransformMap) -> Self {
        Self {
            traversal,
            anchoring,
        }
    }

    pub fn get(&self, mode: FrameMode) -> &TransformMap {
        match mode {
            FrameMode::Traversal => &self.traversal,
            FrameMode::Anchoring => &self.anchoring,
        }
    }

    /// Position of a waypoint in the selected frame.
    pub fn position(&self, mode: FrameMode, waypoint_id: &str) -> Option<[f64; 3]> {
        self.get(mode).get(waypoint_id).map(SE3::position)
    }
}
