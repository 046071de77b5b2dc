//! Error types for graphnav-viz.

use thiserror::Error;

use crate::imaging::ImageError;

/// Crate-level error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protobuf decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Requested waypoint, snapshot or image source does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The updated graph could not be written back to disk.
    #[error("Error updating label: {0}")]
    Persistence(String),

    #[error("Image error: {0}")]
    Image(#[from] ImageError),
}

impl Error {
    /// True for the not-found signal, which callers map to a 404-style reply.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
