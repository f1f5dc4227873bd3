//! The incremental bounding volume hierarchy.
//!
//! [`Tree`] owns a [`NodeArena`] and exposes the query/mutation surface:
//! insert/remove/update one object at a time, raycast, range and nearest
//! queries, bounds-overlap queries, and rebuild/optimize/validate/stats.
//! Every query shares the same recursive traversal shape: prune a subtree
//! once its bounds fail a test, otherwise recurse into both children.

use crate::core::types::{Number, Point3, Vector3};
use crate::node::{Leaf, NodeArena, NodeHandle, ObjectId};
use crate::shared::aabb::Aabb;
use crate::shared::ray::Ray;
use crate::shared::volume::BoundingVolume;
use getset::CopyGetters;
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;

/// Construction parameters for a [`Tree`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TreeConfig {
    /// Upper bound on the cluster size a bulk build collapses into one
    /// leaf-cluster subtree; incremental `insert` always produces
    /// one-object leaves regardless of this value.
    pub max_leaf_size: usize,
    /// Insertion and bulk-build recursion stop once a node reaches this
    /// depth, even if more splitting would otherwise occur.
    pub max_depth: u32,
    /// Whether insertion descent and `optimize` cost their decisions by
    /// surface area (`true`) or by volume (`false`).
    pub enable_sah: bool,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_leaf_size: 8,
            max_depth: 32,
            enable_sah: true,
        }
    }
}

/// Snapshot of tree shape, returned by [`Tree::get_stats`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TreeStats {
    pub node_count: usize,
    pub leaf_count: usize,
    pub max_depth: u32,
    pub average_depth: Number,
    /// `1.0` for a perfectly balanced tree (ideal depth for its leaf
    /// count); lower values indicate a deeper-than-ideal tree.
    pub balance_factor: Number,
}

/// One raycast hit: the payload, the entry distance, and the world-space
/// point at that distance. `normal`/`uv` are populated only when a caller's
/// payload-aware post-processing fills them in (this crate leaves them
/// unset, since leaf bounds alone don't carry surface data).
#[derive(Copy, Clone, Debug, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct CollisionResult<P: Copy> {
    payload: P,
    distance: Number,
    point: Point3,
    normal: Option<Vector3>,
    uv: Option<crate::core::types::Point2>,
    node: Option<NodeHandle>,
}

/// An incremental bounding volume hierarchy over `(Aabb, P)` pairs.
pub struct Tree<P> {
    arena: NodeArena<P>,
    root: Option<NodeHandle>,
    config: TreeConfig,
    next_id: u64,
    id_to_node: HashMap<ObjectId, NodeHandle>,
}

impl<P> Tree<P>
where
    P: Copy + Eq + Hash + Debug,
{
    pub fn new() -> Self { Self::with_config(TreeConfig::default()) }

    pub fn with_config(config: TreeConfig) -> Self {
        Self {
            arena: NodeArena::new(),
            root: None,
            config,
            next_id: 1,
            id_to_node: HashMap::new(),
        }
    }

    /// Assembles a tree from already-built parts. Used by [`crate::builder::Builder`]
    /// and by [`Tree::rebuild`] to adopt a freshly bulk-built subtree.
    pub(crate) fn from_parts(
        arena: NodeArena<P>,
        root: Option<NodeHandle>,
        config: TreeConfig,
        next_id: u64,
        id_to_node: HashMap<ObjectId, NodeHandle>,
    ) -> Self {
        Self { arena, root, config, next_id, id_to_node }
    }

    pub fn config(&self) -> TreeConfig { self.config }

    pub fn len(&self) -> usize { self.id_to_node.len() }

    pub fn is_empty(&self) -> bool { self.id_to_node.is_empty() }

    /// All live payloads, in arbitrary order.
    pub fn iter_payloads(&self) -> impl Iterator<Item = P> + '_ {
        self.id_to_node.values().map(|&h| self.arena.get(h).leaf.as_ref().unwrap().payload)
    }

    // region Mutation

    pub fn insert(&mut self, bounds: Aabb, payload: P) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        tracing::trace!(?id, "inserting leaf");
        let handle = self.insert_leaf(bounds, id, payload);
        self.id_to_node.insert(id, handle);
        debug_assert!(self.validate(), "tree invariant violated after insert");
        id
    }

    fn insert_leaf(&mut self, bounds: Aabb, id: ObjectId, payload: P) -> NodeHandle {
        match self.root {
            None => {
                let handle = self.arena.alloc_leaf(bounds, None, 0, id, payload);
                self.root = Some(handle);
                handle
            }
            Some(root) => {
                let target = self.find_insertion_point(root, &bounds);
                self.splice_leaf(target, bounds, id, payload)
            }
        }
    }

    /// Descends from `current`, at each internal node choosing the child
    /// whose bounds would grow least to include `bounds` (ties favour the
    /// left child), stopping at a leaf or once `max_depth` is reached.
    fn find_insertion_point(&self, mut current: NodeHandle, bounds: &Aabb) -> NodeHandle {
        loop {
            let node = self.arena.get(current);
            if node.is_leaf() || node.depth >= self.config.max_depth {
                return current;
            }
            let left = node.left.expect("internal node missing left child");
            let right = node.right.expect("internal node missing right child");
            let cost_left = self.insertion_cost(left, bounds);
            let cost_right = self.insertion_cost(right, bounds);
            current = if cost_left <= cost_right { left } else { right };
        }
    }

    fn insertion_cost(&self, handle: NodeHandle, bounds: &Aabb) -> Number {
        let existing = self.arena.get(handle).bounds;
        let merged = existing.merge(bounds);
        if self.config.enable_sah {
            merged.surface_area() - existing.surface_area()
        } else {
            merged.volume() - existing.volume()
        }
    }

    /// Splices a fresh internal node in `target`'s place, with `target` and
    /// a new leaf as its two children, then refits bounds up to the root.
    fn splice_leaf(&mut self, target: NodeHandle, bounds: Aabb, id: ObjectId, payload: P) -> NodeHandle {
        let target_node = self.arena.get(target);
        let target_depth = target_node.depth;
        let target_bounds = target_node.bounds;
        let parent = target_node.parent;
        let merged = target_bounds.merge(&bounds);

        let new_leaf = self.arena.alloc_leaf(bounds, None, target_depth + 1, id, payload);
        let new_internal = self.arena.alloc_internal(merged, parent, target_depth);

        match parent {
            Some(p) => {
                if self.arena.get(p).left == Some(target) {
                    self.arena.set_left(p, Some(new_internal));
                } else {
                    self.arena.set_right(p, Some(new_internal));
                }
            }
            None => self.root = Some(new_internal),
        }

        self.arena.set_left(new_internal, Some(target));
        self.arena.set_right(new_internal, Some(new_leaf));
        self.arena.update_bounds(new_internal);
        new_leaf
    }

    pub fn remove(&mut self, id: ObjectId) -> bool {
        let Some(handle) = self.id_to_node.remove(&id) else { return false };
        tracing::trace!(?id, "removing leaf");
        self.remove_leaf(handle);
        debug_assert!(self.validate(), "tree invariant violated after remove");
        true
    }

    /// Promotes `handle`'s sibling into its parent's slot. Deliberately
    /// does not refit the remaining ancestors' bounds: `rebuild` is the
    /// cure for that drift.
    fn remove_leaf(&mut self, handle: NodeHandle) {
        let parent = self.arena.get(handle).parent;
        match parent {
            None => {
                self.arena.free(handle);
                self.root = None;
            }
            Some(parent) => {
                let grandparent = self.arena.get(parent).parent;
                let sibling = if self.arena.get(parent).left == Some(handle) {
                    self.arena.get(parent).right
                } else {
                    self.arena.get(parent).left
                };
                self.arena.free(handle);
                match grandparent {
                    None => {
                        if let Some(sibling) = sibling {
                            self.arena.promote_to_root(sibling);
                        }
                        self.root = sibling;
                        self.arena.free(parent);
                    }
                    Some(grandparent) => {
                        if self.arena.get(grandparent).left == Some(parent) {
                            self.arena.set_left(grandparent, sibling);
                        } else {
                            self.arena.set_right(grandparent, sibling);
                        }
                        self.arena.free(parent);
                    }
                }
            }
        }
    }

    /// Fast path: if `new_bounds` still fits inside the leaf's current
    /// bounds, just overwrite them (no restructuring, no ancestor refit).
    /// Otherwise removes and reinserts the object under the same id.
    pub fn update(&mut self, id: ObjectId, new_bounds: Aabb) -> bool {
        let Some(&handle) = self.id_to_node.get(&id) else { return false };
        let current = self.arena.get(handle).bounds;
        if aabb_contains(&current, &new_bounds) {
            self.arena.get_mut(handle).bounds = new_bounds;
            return true;
        }
        tracing::trace!(?id, "update falling back to remove+reinsert");
        let payload = self.arena.get(handle).leaf.as_ref().unwrap().payload;
        self.remove_leaf(handle);
        let new_handle = self.insert_leaf(new_bounds, id, payload);
        self.id_to_node.insert(id, new_handle);
        debug_assert!(self.validate(), "tree invariant violated after update");
        true
    }

    pub fn clear(&mut self) {
        tracing::debug!("clearing tree");
        self.arena.clear();
        self.root = None;
        self.id_to_node.clear();
    }

    /// Bulk rebuilds the tree in place over its current `(bounds, payload)`
    /// pairs, preserving every object's id, using the same split strategy
    /// implied by `enable_sah` (SAH if set, spatial median otherwise).
    pub fn rebuild(&mut self) {
        tracing::debug!("rebuilding tree");
        let Some(root) = self.root else { return };
        let mut leaves = Vec::new();
        self.arena.get_leaves(root, &mut leaves);
        let mut items: Vec<(ObjectId, Aabb, P)> = leaves
            .into_iter()
            .map(|h| {
                let node = self.arena.get(h);
                let leaf = node.leaf.as_ref().unwrap();
                (leaf.object_id, node.bounds, leaf.payload)
            })
            .collect();

        let strategy = if self.config.enable_sah {
            crate::builder::SplitStrategy::Sah
        } else {
            crate::builder::SplitStrategy::Median
        };

        let mut arena = NodeArena::new();
        let new_root = crate::builder::build_subtree(
            &mut arena,
            &mut items,
            0,
            self.config.max_leaf_size,
            self.config.max_depth,
            strategy,
        );
        let mut new_leaves = Vec::new();
        arena.get_leaves(new_root, &mut new_leaves);
        let id_to_node = new_leaves
            .into_iter()
            .map(|h| (arena.get(h).leaf.as_ref().unwrap().object_id, h))
            .collect();

        self.arena = arena;
        self.root = Some(new_root);
        self.id_to_node = id_to_node;
        debug_assert!(self.validate(), "tree invariant violated after rebuild");
    }

    /// Rebuilds the tree if it is both SAH-enabled and currently
    /// imbalanced; a no-op (returning `false`) otherwise.
    pub fn optimize(&mut self) -> bool {
        let Some(root) = self.root else { return false };
        if !self.config.enable_sah || self.arena.is_balanced(root) {
            return false;
        }
        tracing::debug!("optimizing: tree is imbalanced, rebuilding");
        self.rebuild();
        true
    }

    // endregion Mutation

    // region Queries

    pub fn raycast(&self, ray: &Ray) -> Vec<CollisionResult<P>> { self.raycast_max(ray, Number::INFINITY) }

    pub fn raycast_max(&self, ray: &Ray, max_distance: Number) -> Vec<CollisionResult<P>> {
        let mut results = Vec::new();
        if let Some(root) = self.root {
            let mut seen = HashSet::new();
            self.raycast_node(root, ray, max_distance, &mut results, &mut seen);
        }
        results.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap());
        results
    }

    fn raycast_node(
        &self,
        handle: NodeHandle,
        ray: &Ray,
        max_distance: Number,
        out: &mut Vec<CollisionResult<P>>,
        seen: &mut HashSet<P>,
    ) {
        let node = self.arena.get(handle);
        let Some((near, _far)) = node.bounds.intersect_ray_interval(ray) else { return };
        if near > max_distance {
            return;
        }
        if node.is_leaf() {
            let leaf: &Leaf<P> = node.leaf.as_ref().unwrap();
            if seen.insert(leaf.payload) {
                out.push(CollisionResult {
                    payload: leaf.payload,
                    distance: near,
                    point: ray.get_point(near),
                    normal: None,
                    uv: None,
                    node: Some(handle),
                });
            }
            return;
        }
        if let Some(l) = node.left {
            self.raycast_node(l, ray, max_distance, out, seen);
        }
        if let Some(r) = node.right {
            self.raycast_node(r, ray, max_distance, out, seen);
        }
    }

    /// Every live payload whose bounds lie within `radius` of `point`
    /// (axis-separated box distance, zero if `point` is inside the bounds).
    pub fn query_range(&self, point: Point3, radius: Number) -> Vec<P> {
        let mut out = Vec::new();
        if let Some(root) = self.root {
            self.query_range_node(root, point, radius, &mut out);
        }
        out
    }

    fn query_range_node(&self, handle: NodeHandle, point: Point3, radius: Number, out: &mut Vec<P>) {
        let node = self.arena.get(handle);
        if node.bounds.distance_to_point(point) > radius {
            return;
        }
        if node.is_leaf() {
            out.push(node.leaf.as_ref().unwrap().payload);
            return;
        }
        if let Some(l) = node.left {
            self.query_range_node(l, point, radius, out);
        }
        if let Some(r) = node.right {
            self.query_range_node(r, point, radius, out);
        }
    }

    pub fn find_nearest(&self, point: Point3) -> Option<P> { self.find_nearest_max(point, Number::INFINITY) }

    /// Best-first descent: visits the nearer child first and prunes any
    /// subtree whose bounds distance already exceeds the best match found
    /// so far.
    pub fn find_nearest_max(&self, point: Point3, max_distance: Number) -> Option<P> {
        let root = self.root?;
        let mut best: Option<(P, Number)> = None;
        self.find_nearest_node(root, point, max_distance, &mut best);
        best.map(|(payload, _)| payload)
    }

    fn find_nearest_node(&self, handle: NodeHandle, point: Point3, max_distance: Number, best: &mut Option<(P, Number)>) {
        let node = self.arena.get(handle);
        let bound_dist = node.bounds.distance_to_point(point);
        if bound_dist > max_distance {
            return;
        }
        if let Some((_, best_dist)) = *best {
            if bound_dist > best_dist {
                return;
            }
        }
        if node.is_leaf() {
            let leaf = node.leaf.as_ref().unwrap();
            let replace = match *best {
                None => true,
                Some((_, best_dist)) => bound_dist < best_dist,
            };
            if replace {
                *best = Some((leaf.payload, bound_dist));
            }
            return;
        }
        let mut children: Vec<NodeHandle> = [node.left, node.right].into_iter().flatten().collect();
        children.sort_by(|&a, &b| {
            let da = self.arena.get(a).bounds.distance_to_point(point);
            let db = self.arena.get(b).bounds.distance_to_point(point);
            da.partial_cmp(&db).unwrap()
        });
        for child in children {
            self.find_nearest_node(child, point, max_distance, best);
        }
    }

    /// Every live payload whose bounds overlap `bounds`, de-duplicated.
    pub fn intersect_bounds(&self, bounds: &Aabb) -> Vec<P> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        if let Some(root) = self.root {
            self.intersect_bounds_node(root, bounds, &mut seen, &mut out);
        }
        out
    }

    fn intersect_bounds_node(&self, handle: NodeHandle, bounds: &Aabb, seen: &mut HashSet<P>, out: &mut Vec<P>) {
        let node = self.arena.get(handle);
        if !node.bounds.intersects(bounds) {
            return;
        }
        if node.is_leaf() {
            let leaf = node.leaf.as_ref().unwrap();
            if seen.insert(leaf.payload) {
                out.push(leaf.payload);
            }
            return;
        }
        if let Some(l) = node.left {
            self.intersect_bounds_node(l, bounds, seen, out);
        }
        if let Some(r) = node.right {
            self.intersect_bounds_node(r, bounds, seen, out);
        }
    }

    // endregion Queries

    // region Stats & validation

    pub fn get_stats(&self) -> TreeStats {
        let Some(root) = self.root else {
            return TreeStats { node_count: 0, leaf_count: 0, max_depth: 0, average_depth: 0.0, balance_factor: 1.0 };
        };
        let mut leaves = Vec::new();
        self.arena.get_leaves(root, &mut leaves);
        let leaf_count = self.arena.subtree_size(root) as usize;
        debug_assert_eq!(leaf_count, leaves.len(), "cached subtree size drifted from the actual leaf count");
        let node_count = self.count_nodes(root);
        let max_depth = self.arena.get_max_depth(root);
        let average_depth =
            leaves.iter().map(|&h| self.arena.get(h).depth as Number).sum::<Number>() / leaf_count as Number;
        let ideal_depth = (leaf_count as Number).log2().max(1.0);
        let balance_factor = (ideal_depth / (max_depth as Number).max(1.0)).min(1.0);
        TreeStats { node_count, leaf_count, max_depth, average_depth, balance_factor }
    }

    fn count_nodes(&self, handle: NodeHandle) -> usize {
        let node = self.arena.get(handle);
        1 + node.left.map_or(0, |l| self.count_nodes(l)) + node.right.map_or(0, |r| self.count_nodes(r))
    }

    /// Checks the structural invariants (node linkage, bounds containment,
    /// depth consistency, id-map consistency), logging a `warn!` naming
    /// each violated invariant and returning whether the tree is sound.
    pub fn validate(&self) -> bool {
        let mut ok = true;
        match self.root {
            None => {
                if !self.id_to_node.is_empty() {
                    tracing::warn!("T5 violated: tree has no root but id_to_node is non-empty");
                    ok = false;
                }
            }
            Some(root) => {
                if self.arena.get(root).parent.is_some() {
                    tracing::warn!("T3 violated: root has a parent");
                    ok = false;
                }
                let mut leaf_count = 0usize;
                if !self.validate_node(root, &mut leaf_count) {
                    ok = false;
                }
                if leaf_count != self.id_to_node.len() {
                    tracing::warn!(
                        expected = self.id_to_node.len(),
                        found = leaf_count,
                        "T4 violated: id_to_node size does not match live leaf count"
                    );
                    ok = false;
                }
            }
        }
        for (&id, &handle) in &self.id_to_node {
            match &self.arena.get(handle).leaf {
                Some(leaf) if leaf.object_id == id => {}
                _ => {
                    tracing::warn!(?id, "T4 violated: id does not map to a matching live leaf");
                    ok = false;
                }
            }
        }
        ok
    }

    fn validate_node(&self, handle: NodeHandle, leaf_count: &mut usize) -> bool {
        let node = self.arena.get(handle);
        let mut ok = true;
        match (&node.leaf, node.left, node.right) {
            (Some(_), None, None) => {
                *leaf_count += 1;
            }
            (None, Some(left), Some(right)) => {
                let union = self.arena.get(left).bounds.merge(&self.arena.get(right).bounds);
                if !aabb_contains(&node.bounds, &union) {
                    tracing::warn!("N2 violated: node bounds do not contain the union of its children");
                    ok = false;
                }
                for child in [left, right] {
                    let child_node = self.arena.get(child);
                    if child_node.parent != Some(handle) {
                        tracing::warn!("N1 violated: child's parent link does not point back to this node");
                        ok = false;
                    }
                    if child_node.depth != node.depth + 1 {
                        tracing::warn!("N3 violated: child depth is not parent depth + 1");
                        ok = false;
                    }
                    if let Some(cached) = child_node.cached_subtree_size_if_clean() {
                        let mut actual = 0usize;
                        self.count_leaves_only(child, &mut actual);
                        if cached as usize != actual {
                            tracing::warn!("N4 violated: cached subtree size does not match actual leaf count");
                            ok = false;
                        }
                    }
                    if !self.validate_node(child, leaf_count) {
                        ok = false;
                    }
                }
            }
            _ => {
                tracing::warn!("N1 violated: node is neither a clean leaf nor a clean internal node");
                ok = false;
            }
        }
        ok
    }

    fn count_leaves_only(&self, handle: NodeHandle, count: &mut usize) {
        let node = self.arena.get(handle);
        if node.is_leaf() {
            *count += 1;
            return;
        }
        if let Some(l) = node.left {
            self.count_leaves_only(l, count);
        }
        if let Some(r) = node.right {
            self.count_leaves_only(r, count);
        }
    }

    // endregion Stats & validation
}

impl<P> Default for Tree<P>
where
    P: Copy + Eq + Hash + Debug,
{
    fn default() -> Self { Self::new() }
}

impl<P> Clone for Tree<P>
where
    P: Copy + Eq + Hash + Debug,
{
    /// Deep-clones into a fresh arena; node handles are not shared with the
    /// original.
    fn clone(&self) -> Self {
        let mut arena = NodeArena::new();
        let root = self.root.map(|r| crate::node::clone_subtree(&mut arena, &self.arena, r, None));
        let id_to_node = if let Some(root) = root {
            let mut leaves = Vec::new();
            arena.get_leaves(root, &mut leaves);
            leaves.into_iter().map(|h| (arena.get(h).leaf.as_ref().unwrap().object_id, h)).collect()
        } else {
            HashMap::new()
        };
        Self { arena, root, config: self.config, next_id: self.next_id, id_to_node }
    }
}

fn aabb_contains(outer: &Aabb, inner: &Aabb) -> bool {
    outer.min().cmple(inner.min()).all() && outer.max().cmpge(inner.max()).all()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube(center: Point3, half: Number) -> Aabb { Aabb::from_center_half_extents(center, Vector3::splat(half)) }

    #[test]
    fn insert_then_remove_returns_to_empty() {
        let mut tree: Tree<u32> = Tree::new();
        let a = tree.insert(cube(Point3::ZERO, 1.0), 1);
        let b = tree.insert(cube(Point3::new(5.0, 0.0, 0.0), 1.0), 2);
        assert!(tree.validate());
        assert!(tree.remove(a));
        assert!(tree.validate());
        assert!(tree.remove(b));
        assert!(tree.is_empty());
        assert!(tree.validate());
    }

    #[test]
    fn remove_of_unknown_id_returns_false() {
        let mut tree: Tree<u32> = Tree::new();
        let a = tree.insert(cube(Point3::ZERO, 1.0), 1);
        assert!(tree.remove(a));
        assert!(!tree.remove(a));
    }

    #[test]
    fn raycast_across_three_boxes_is_sorted_and_deduped() {
        let mut tree: Tree<&'static str> = Tree::new();
        tree.insert(cube(Point3::new(0.0, 0.0, 0.0), 1.0), "near");
        tree.insert(cube(Point3::new(5.0, 0.0, 0.0), 1.0), "mid");
        tree.insert(cube(Point3::new(10.0, 0.0, 0.0), 1.0), "far");

        let ray = Ray::new(Point3::new(-5.0, 0.0, 0.0), Vector3::X);
        let hits = tree.raycast(&ray);
        let payloads: Vec<_> = hits.iter().map(|h| h.payload()).collect();
        assert_eq!(payloads, vec!["near", "mid", "far"]);
        for pair in hits.windows(2) {
            assert!(pair[0].distance() <= pair[1].distance());
        }
    }

    #[test]
    fn raycast_missing_everything_returns_empty() {
        let mut tree: Tree<u32> = Tree::new();
        tree.insert(cube(Point3::new(0.0, 10.0, 0.0), 1.0), 1);
        let ray = Ray::new(Point3::ZERO, Vector3::X);
        assert!(tree.raycast(&ray).is_empty());
    }

    #[test]
    fn query_range_over_a_grid_finds_only_nearby_cells() {
        let mut tree: Tree<(i32, i32)> = Tree::new();
        for x in 0..5 {
            for y in 0..5 {
                tree.insert(cube(Point3::new(x as Number * 2.0, y as Number * 2.0, 0.0), 0.4), (x, y));
            }
        }
        let found = tree.query_range(Point3::new(4.0, 4.0, 0.0), 2.5);
        assert!(found.contains(&(2, 2)));
        assert!(!found.contains(&(0, 0)));
    }

    #[test]
    fn find_nearest_picks_the_closest_cell() {
        let mut tree: Tree<(i32, i32)> = Tree::new();
        for x in 0..5 {
            for y in 0..5 {
                tree.insert(cube(Point3::new(x as Number * 2.0, y as Number * 2.0, 0.0), 0.4), (x, y));
            }
        }
        assert_eq!(tree.find_nearest(Point3::new(4.1, 4.1, 0.0)), Some((2, 2)));
    }

    #[test]
    fn update_within_current_bounds_is_a_fast_path() {
        let mut tree: Tree<u32> = Tree::new();
        let id = tree.insert(cube(Point3::ZERO, 2.0), 1);
        let stats_before = tree.get_stats();
        assert!(tree.update(id, cube(Point3::ZERO, 0.5)));
        let stats_after = tree.get_stats();
        assert_eq!(stats_before.node_count, stats_after.node_count);
        assert!(tree.validate());
    }

    #[test]
    fn update_outside_current_bounds_reinserts_under_the_same_id() {
        let mut tree: Tree<u32> = Tree::new();
        tree.insert(cube(Point3::ZERO, 1.0), 1);
        let id = tree.insert(cube(Point3::new(50.0, 50.0, 50.0), 1.0), 2);
        assert!(tree.update(id, cube(Point3::new(-50.0, -50.0, -50.0), 1.0)));
        assert!(tree.validate());
        assert_eq!(tree.find_nearest(Point3::new(-50.0, -50.0, -50.0)), Some(2));
    }

    #[test]
    fn remove_until_empty_over_many_random_boxes() {
        use rand::{Rng, SeedableRng};
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(42);
        let mut tree: Tree<u32> = Tree::new();
        let mut ids = Vec::new();
        for i in 0..100u32 {
            let center = Point3::new(rng.gen_range(-100.0..100.0), rng.gen_range(-100.0..100.0), rng.gen_range(-100.0..100.0));
            ids.push(tree.insert(cube(center, rng.gen_range(0.1..5.0)), i));
        }
        assert!(tree.validate());
        for id in ids {
            assert!(tree.remove(id));
        }
        assert!(tree.is_empty());
        assert!(tree.validate());
    }

    #[test]
    fn intersect_bounds_deduplicates_and_finds_overlaps() {
        let mut tree: Tree<u32> = Tree::new();
        tree.insert(cube(Point3::ZERO, 1.0), 1);
        tree.insert(cube(Point3::new(10.0, 0.0, 0.0), 1.0), 2);
        let found = tree.intersect_bounds(&cube(Point3::ZERO, 2.0));
        assert_eq!(found, vec![1]);
    }

    #[test]
    fn optimize_is_a_noop_on_an_already_balanced_tree_without_sah() {
        let mut config = TreeConfig::default();
        config.enable_sah = false;
        let mut tree: Tree<u32> = Tree::with_config(config);
        tree.insert(cube(Point3::ZERO, 1.0), 1);
        assert!(!tree.optimize());
    }

    #[test]
    fn clone_is_independent_of_the_original() {
        let mut tree: Tree<u32> = Tree::new();
        let id = tree.insert(cube(Point3::ZERO, 1.0), 1);
        let mut cloned = tree.clone();
        assert!(cloned.validate());
        assert!(cloned.remove(id));
        assert!(tree.find_nearest(Point3::ZERO).is_some(), "clone's removal should not affect the original");
    }

    #[test]
    fn rebuild_preserves_ids_and_payloads() {
        let mut tree: Tree<u32> = Tree::new();
        let mut ids = Vec::new();
        for i in 0..20u32 {
            ids.push(tree.insert(cube(Point3::new(i as Number, 0.0, 0.0), 0.4), i));
        }
        tree.rebuild();
        assert!(tree.validate());
        for id in ids {
            assert!(tree.id_to_node.contains_key(&id));
        }
    }
}
