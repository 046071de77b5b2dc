//! Pose graph data: waypoints, edges, anchoring and snapshots.
//!
//! - [`GraphStore`] - in-memory container, populated once at startup
//! - [`loader`] - map directory reading/writing
//! - [`proto`] - protobuf wire layout of the persisted files
//! - [`patch`] - label edits applied to the encoded graph bytes

pub mod loader;
pub mod patch;
pub mod proto;
pub mod store;
pub mod types;

pub use loader::{load_graph, save_graph, save_snapshot};
pub use store::GraphStore;
pub use types::{
    Anchor, AnchoredObject, Edge, ImageCapture, ImageEncoding, PixelFormat, Snapshot, Waypoint,
    WaypointId,
};
