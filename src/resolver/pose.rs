//! Breadth-first propagation of edge transforms into one global frame.
//!
//! Starting at the root with the identity, every discovered waypoint gets
//! `world_tform_waypoint = world_tform_current ∘ current_tform_next`, where the
//! edge transform is used as-is when walking from its `from` end and inverted
//! when walking from its `to` end.
//!
//! The first time a waypoint is dequeued decides its transform. Later queue
//! entries for the same waypoint are dropped, so the result depends on edge
//! order, not on path quality.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::{debug, info};

use super::TransformMap;
use crate::geometry::SE3;
use crate::graph::GraphStore;

/// Direction an edge is walked in from a given waypoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    /// Current waypoint is the edge's `from` end.
    Forward,
    /// Current waypoint is the edge's `to` end.
    Reverse,
}

/// One adjacency entry: (edge index, neighbour waypoint index, direction).
type Neighbor = (usize, usize, Direction);

/// Resolves global transforms for every waypoint reachable from a root.
pub struct PoseResolver<'a> {
    store: &'a GraphStore,
    /// Waypoint index -> incident edges, in edge load order.
    adjacency: Vec<Vec<Neighbor>>,
}

impl<'a> PoseResolver<'a> {
    /// Precompute adjacency lists so traversal is O(V + E).
    pub fn new(store: &'a GraphStore) -> Self {
        let index: HashMap<&str, usize> = store
            .waypoints()
            .iter()
            .enumerate()
            .map(|(i, w)| (w.id.as_str(), i))
            .collect();

        let mut adjacency = vec![Vec::new(); store.waypoints().len()];
        for (edge_idx, edge) in store.edges().iter().enumerate() {
            let (Some(&from), Some(&to)) =
                (index.get(edge.from.as_str()), index.get(edge.to.as_str()))
            else {
                continue;
            };
            // Self-referential edges never lead anywhere new
            if from == to {
                continue;
            }
            adjacency[from].push((edge_idx, to, Direction::Forward));
            adjacency[to].push((edge_idx, from, Direction::Reverse));
        }

        Self { store, adjacency }
    }

    /// Resolve from the first waypoint in load order.
    ///
    /// An empty graph yields an empty map.
    pub fn resolve(&self) -> TransformMap {
        match self.store.root() {
            Some(root) => self.resolve_from(root.id.as_str()),
            None => TransformMap::new(),
        }
    }

    /// Resolve with an explicit root. An unknown root yields an empty map.
    pub fn resolve_from(&self, root_id: &str) -> TransformMap {
        let waypoints = self.store.waypoints();
        let Some(root) = waypoints.iter().position(|w| w.id.as_str() == root_id) else {
            debug!("Root waypoint {} not in graph", root_id);
            return TransformMap::new();
        };

        let edges = self.store.edges();
        let mut transforms = TransformMap::with_capacity(waypoints.len());
        let mut visited: HashSet<usize> = HashSet::with_capacity(waypoints.len());
        let mut queue: VecDeque<(usize, SE3)> = VecDeque::new();
        queue.push_back((root, SE3::identity()));

        while let Some((current, world_tform_current)) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }

            for &(edge_idx, next, direction) in &self.adjacency[current] {
                if visited.contains(&next) {
                    continue;
                }
                let from_tform_to = &edges[edge_idx].from_tform_to;
                let world_tform_next = match direction {
                    Direction::Forward => world_tform_current.compose(from_tform_to),
                    Direction::Reverse => world_tform_current.compose(&from_tform_to.inverse()),
                };
                queue.push_back((next, world_tform_next));
            }

            transforms.insert(waypoints[current].id.clone(), world_tform_current);
        }

        let unreachable = waypoints.len() - transforms.len();
        if unreachable > 0 {
            info!(
                "{} of {} waypoints unreachable from root {}",
                unreachable,
                waypoints.len(),
                root_id
            );
        }

        transforms
    }
}
