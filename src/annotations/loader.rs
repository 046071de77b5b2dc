//! Reading annotation metadata documents from disk.
//!
//! Every `metadata_*.json` file in the directory is one [`AnnotationRecord`].

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use super::index::AnnotationRecord;
use crate::error::Result;

const FILE_PREFIX: &str = "metadata_";
const FILE_SUFFIX: &str = ".json";

/// Load every metadata document in `dir`, in file name order.
///
/// A missing directory yields no records. Unreadable or malformed files are
/// skipped with a warning.
pub fn load_annotations<P: AsRef<Path>>(dir: P) -> Result<Vec<AnnotationRecord>> {
    let dir = dir.as_ref();
    if !dir.exists() {
        info!("No annotation directory at {:?}", dir);
        return Ok(Vec::new());
    }

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_metadata = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(FILE_PREFIX) && n.ends_with(FILE_SUFFIX));
        if is_metadata {
            paths.push(path);
        }
    }
    paths.sort();

    let mut records = Vec::with_capacity(paths.len());
    for path in paths {
        match read_record(&path) {
            Ok(record) => records.push(record),
            Err(e) => warn!("Could not read annotation file {:?}: {}. Skipping it.", path, e),
        }
    }

    info!("Loaded {} annotation documents from {:?}", records.len(), dir);
    Ok(records)
}

fn read_record(path: &Path) -> Result<AnnotationRecord> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}
