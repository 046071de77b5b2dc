//! AnnotationIndex - normalized object labels per waypoint and globally.

use std::collections::{BTreeSet, HashMap, HashSet};

use indexmap::IndexMap;
use serde::Deserialize;

use super::normalize::normalize_label;
use crate::graph::WaypointId;

/// One view (camera direction, prompt, ...) of a waypoint's metadata.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewAnnotation {
    #[serde(default)]
    pub visible_objects: Vec<String>,
}

/// External metadata document for one waypoint.
///
/// Views keep their document order, which decides first-seen label order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnnotationRecord {
    #[serde(default)]
    pub waypoint_id: Option<String>,
    #[serde(default)]
    pub views: IndexMap<String, ViewAnnotation>,
}

/// Normalized labels, built once and read by queries.
#[derive(Debug, Clone, Default)]
pub struct AnnotationIndex {
    /// Waypoint id -> labels in first-seen order.
    per_waypoint: HashMap<WaypointId, Vec<String>>,
    /// Every label across all waypoints, sorted.
    catalog: Vec<String>,
}

impl AnnotationIndex {
    /// Build from records. Records without a waypoint id are ignored; a later
    /// record for the same waypoint replaces an earlier one. Labels that
    /// normalize to nothing are dropped.
    pub fn build(records: impl IntoIterator<Item = AnnotationRecord>) -> Self {
        let mut latest: HashMap<WaypointId, AnnotationRecord> = HashMap::new();
        for record in records {
            if let Some(id) = record.waypoint_id.clone().filter(|id| !id.is_empty()) {
                latest.insert(WaypointId::new(id), record);
            }
        }

        let mut per_waypoint = HashMap::with_capacity(latest.len());
        let mut catalog = BTreeSet::new();

        for (id, record) in latest {
            let labels = dedup_labels(&record);
            catalog.extend(labels.iter().cloned());
            per_waypoint.insert(id, labels);
        }

        Self {
            per_waypoint,
            catalog: catalog.into_iter().collect(),
        }
    }

    /// Labels for a waypoint; empty if it has no metadata.
    pub fn objects_for(&self, waypoint_id: &str) -> &[String] {
        self.per_waypoint
            .get(waypoint_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All distinct labels, alphabetically sorted.
    pub fn catalog(&self) -> &[String] {
        &self.catalog
    }

    /// Number of annotated waypoints.
    pub fn len(&self) -> usize {
        self.per_waypoint.len()
    }

    pub fn is_empty(&self) -> bool {
        self.per_waypoint.is_empty()
    }
}

fn dedup_labels(record: &AnnotationRecord) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut labels = Vec::new();
    for view in record.views.values() {
        for raw in &view.visible_objects {
            let label = normalize_label(raw);
            if label.is_empty() {
                continue;
            }
            if seen.insert(label.clone()) {
                labels.push(label);
            }
        }
    }
    labels
}
