//! Snapshot image reconstruction.
//!
//! Turns heterogeneous raw or compressed captures into upright JPEG images.
//! Reconstruction is stateless and may run concurrently across requests.

pub mod pixel;
pub mod reconstruct;
pub mod rotation;

pub use pixel::SampleLayout;
pub use reconstruct::{
    DecodePath, Decoded, EncodedImage, ImageError, ImageReconstructor, DEFAULT_JPEG_QUALITY,
};
pub use rotation::{rotation_for, Rotation};
