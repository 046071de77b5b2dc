pub mod annotations;
pub mod config;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod imaging;
pub mod resolver;
pub mod service;

pub use config::ServiceConfig;
pub use error::{Error, Result};
pub use service::MapService;

#[cfg(test)]
mod test_utils;
