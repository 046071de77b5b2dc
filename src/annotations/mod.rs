//! Object labels attached to waypoints by external scene descriptions.

pub mod index;
pub mod loader;
pub mod normalize;

pub use index::{AnnotationIndex, AnnotationRecord, ViewAnnotation};
pub use loader::load_annotations;
pub use normalize::normalize_label;
