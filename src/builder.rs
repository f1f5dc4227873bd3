//! Bulk construction of a [`Tree`] from a fully-known set of `(bounds,
//! payload)` pairs, under a chosen partitioning [`SplitStrategy`].
//!
//! A recursive widest-axis split-and-recurse build: pick the widest axis of
//! the current range's bounds, partition by [`SplitStrategy`], and recurse
//! into the two halves until a leaf-size or depth threshold ends the
//! recursion.

use crate::core::types::Number;
use crate::node::{NodeArena, NodeHandle, ObjectId};
use crate::shared::aabb::Aabb;
use crate::shared::volume::BoundingVolume;
use crate::tree::{Tree, TreeConfig};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

const SAH_BIN_COUNT: usize = 12;

/// How [`Builder`] partitions a cluster of items at each recursion step.
#[derive(Copy, Clone, Debug, PartialEq, Eq, strum_macros::EnumIter)]
pub enum SplitStrategy {
    /// Minimise `SA(left)*|left| + SA(right)*|right|` over 12 candidate
    /// bins along the widest axis; falls back to a leaf cluster if no bin
    /// beats leaving the whole range in one leaf.
    Sah,
    /// Sort by centroid on the widest axis and split at the middle index.
    Median,
    /// Split at the middle index by centroid on the widest axis, without a
    /// full sort (`slice::select_nth_unstable_by`).
    Equal,
}

/// Bulk tree builder. Configure with `with_*`, then consume with [`build`](Builder::build).
#[derive(Copy, Clone, Debug)]
pub struct Builder {
    strategy: SplitStrategy,
    max_leaf_size: usize,
    max_depth: u32,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            strategy: SplitStrategy::Sah,
            max_leaf_size: 4,
            max_depth: 32,
        }
    }
}

impl Builder {
    pub fn new() -> Self { Self::default() }

    pub fn with_strategy(mut self, strategy: SplitStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_max_leaf_size(mut self, max_leaf_size: usize) -> Self {
        self.max_leaf_size = max_leaf_size.max(1);
        self
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Builds a [`Tree`] from `pairs` in one pass, assigning each pair a
    /// fresh sequential [`ObjectId`] in input order.
    pub fn build<P>(&self, pairs: Vec<(Aabb, P)>) -> Tree<P>
    where
        P: Copy + Eq + Hash + Debug,
    {
        tracing::debug!(count = pairs.len(), strategy = ?self.strategy, "bulk building tree");

        let config = TreeConfig {
            max_leaf_size: self.max_leaf_size,
            max_depth: self.max_depth,
            enable_sah: matches!(self.strategy, SplitStrategy::Sah),
        };

        if pairs.is_empty() {
            return Tree::from_parts(NodeArena::new(), None, config, 1, HashMap::new());
        }

        let mut items: Vec<(ObjectId, Aabb, P)> = pairs
            .into_iter()
            .enumerate()
            .map(|(i, (bounds, payload))| (ObjectId(i as u64 + 1), bounds, payload))
            .collect();

        let mut arena = NodeArena::new();
        let root = build_subtree(&mut arena, &mut items, 0, self.max_leaf_size, self.max_depth, self.strategy);

        let mut leaves = Vec::new();
        arena.get_leaves(root, &mut leaves);
        let next_id = leaves.len() as u64 + 1;
        let id_to_node = leaves
            .into_iter()
            .map(|h| (arena.get(h).leaf.as_ref().unwrap().object_id, h))
            .collect();

        Tree::from_parts(arena, Some(root), config, next_id, id_to_node)
    }
}

/// Recursively partitions `items` (already tagged with their ids) into a
/// subtree rooted at `depth`. Shared by [`Builder::build`] and
/// `Tree::rebuild`, which calls this directly to preserve existing ids.
pub(crate) fn build_subtree<P: Copy>(
    arena: &mut NodeArena<P>,
    items: &mut [(ObjectId, Aabb, P)],
    depth: u32,
    max_leaf_size: usize,
    max_depth: u32,
    strategy: SplitStrategy,
) -> NodeHandle {
    debug_assert!(!items.is_empty(), "build_subtree called with no items");

    if items.len() == 1 {
        let (id, bounds, payload) = items[0];
        return arena.alloc_leaf(bounds, None, depth, id, payload);
    }

    if items.len() <= max_leaf_size || depth >= max_depth {
        return build_leaf_cluster(arena, items, depth);
    }

    let whole_bounds = items.iter().fold(Aabb::reset(), |acc, (_, b, _)| acc.merge(b));
    let axis = widest_axis(&whole_bounds);

    let split = match strategy {
        SplitStrategy::Sah => sah_split(items, axis, whole_bounds),
        SplitStrategy::Median => Some(median_split(items, axis)),
        SplitStrategy::Equal => Some(equal_split(items, axis)),
    };

    match split {
        Some(index) => {
            let (left_items, right_items) = items.split_at_mut(index);
            let left = build_subtree(arena, left_items, depth + 1, max_leaf_size, max_depth, strategy);
            let right = build_subtree(arena, right_items, depth + 1, max_leaf_size, max_depth, strategy);
            let node_bounds = arena.get(left).bounds.merge(&arena.get(right).bounds);
            let internal = arena.alloc_internal(node_bounds, None, depth);
            arena.set_left(internal, Some(left));
            arena.set_right(internal, Some(right));
            internal
        }
        None => build_leaf_cluster(arena, items, depth),
    }
}

/// Terminates recursion below the base-case threshold: a small subtree of
/// single-object leaves built by repeated median splitting, not a single
/// node holding multiple payloads (every leaf still carries exactly one
/// payload, per the node model).
fn build_leaf_cluster<P: Copy>(arena: &mut NodeArena<P>, items: &mut [(ObjectId, Aabb, P)], depth: u32) -> NodeHandle {
    if items.len() == 1 {
        let (id, bounds, payload) = items[0];
        return arena.alloc_leaf(bounds, None, depth, id, payload);
    }

    let whole_bounds = items.iter().fold(Aabb::reset(), |acc, (_, b, _)| acc.merge(b));
    let axis = widest_axis(&whole_bounds);
    let mid = median_split(items, axis);
    let (left_items, right_items) = items.split_at_mut(mid);

    let left = build_leaf_cluster(arena, left_items, depth + 1);
    let right = build_leaf_cluster(arena, right_items, depth + 1);
    let node_bounds = arena.get(left).bounds.merge(&arena.get(right).bounds);
    let internal = arena.alloc_internal(node_bounds, None, depth);
    arena.set_left(internal, Some(left));
    arena.set_right(internal, Some(right));
    internal
}

fn widest_axis(bounds: &Aabb) -> usize {
    let size = bounds.size();
    let components = [size.x, size.y, size.z];
    let mut best = 0;
    for (i, &c) in components.iter().enumerate().skip(1) {
        if c > components[best] {
            best = i;
        }
    }
    best
}

fn centroid_axis(bounds: &Aabb, axis: usize) -> Number {
    let c = bounds.center();
    match axis {
        0 => c.x,
        1 => c.y,
        _ => c.z,
    }
}

fn median_split<P>(items: &mut [(ObjectId, Aabb, P)], axis: usize) -> usize {
    items.sort_by(|a, b| centroid_axis(&a.1, axis).partial_cmp(&centroid_axis(&b.1, axis)).unwrap());
    items.len() / 2
}

fn equal_split<P>(items: &mut [(ObjectId, Aabb, P)], axis: usize) -> usize {
    let mid = items.len() / 2;
    items.select_nth_unstable_by(mid, |a, b| centroid_axis(&a.1, axis).partial_cmp(&centroid_axis(&b.1, axis)).unwrap());
    mid
}

/// Sorts `items` by centroid (so the returned index is a contiguous split),
/// bins their centroids into [`SAH_BIN_COUNT`] candidate thresholds, and
/// returns the index of the cheapest split, or `None` if every candidate
/// costs more than leaving `items` as one leaf cluster.
fn sah_split<P>(items: &mut [(ObjectId, Aabb, P)], axis: usize, whole: Aabb) -> Option<usize> {
    items.sort_by(|a, b| centroid_axis(&a.1, axis).partial_cmp(&centroid_axis(&b.1, axis)).unwrap());

    let min_c = centroid_axis(&items[0].1, axis);
    let max_c = centroid_axis(&items[items.len() - 1].1, axis);
    if (max_c - min_c) < 1e-9 {
        return None;
    }

    let whole_cost = whole.surface_area() * items.len() as Number;
    let mut best_cost = Number::INFINITY;
    let mut best_index = None;

    for bin in 1..SAH_BIN_COUNT {
        let t = bin as Number / SAH_BIN_COUNT as Number;
        let threshold = min_c + (max_c - min_c) * t;
        let split = items.partition_point(|(_, b, _)| centroid_axis(b, axis) < threshold);
        if split == 0 || split == items.len() {
            continue;
        }
        let (left, right) = items.split_at(split);
        let left_bounds = left.iter().fold(Aabb::reset(), |acc, (_, b, _)| acc.merge(b));
        let right_bounds = right.iter().fold(Aabb::reset(), |acc, (_, b, _)| acc.merge(b));
        let cost = left_bounds.surface_area() * left.len() as Number + right_bounds.surface_area() * right.len() as Number;
        if cost < best_cost {
            best_cost = cost;
            best_index = Some(split);
        }
    }

    if best_cost > whole_cost {
        None
    } else {
        best_index
    }
}
