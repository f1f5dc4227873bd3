//! Shared capability set implemented by both bounding volume primitives.
//!
//! [`Aabb`](crate::shared::aabb::Aabb) and
//! [`BoundingSphere`](crate::shared::sphere::BoundingSphere) implement this
//! trait directly rather than going through a tagged-variant dispatch: the
//! tree only ever stores [`Aabb`](crate::shared::aabb::Aabb) bounds (per
//! this crate's non-goals, spheres and OBBs are never leaf bounds), so a
//! virtual-call hierarchy buys nothing here.

use crate::core::types::{Matrix4, Number, Point3};
use crate::shared::aabb::Aabb;
use crate::shared::ray::Ray;

/// Common contract for bounding volume primitives (AABB, bounding sphere).
pub trait BoundingVolume: Sized + Clone {
    /// The smallest AABB enclosing this volume.
    fn bounding_box(&self) -> Aabb;

    /// Whether this volume overlaps `other`'s AABB envelope.
    fn intersects(&self, other: &Aabb) -> bool { self.bounding_box().intersects(other) }

    /// Whether `ray` enters this volume, returning the entry distance.
    fn intersects_ray(&self, ray: &Ray) -> Option<Number>;

    fn contains_point(&self, p: Point3) -> bool;

    fn surface_area(&self) -> Number;

    fn volume(&self) -> Number;

    /// Union of `self` and `other`.
    fn merge(&self, other: &Self) -> Self;

    /// Transform this volume by `matrix`.
    fn transform(&self, matrix: &Matrix4) -> Self;

    /// Whether this volume encloses no points (a degenerate/reset volume).
    fn is_empty(&self) -> bool;

    /// Returns the "identity" value for `merge` (an inverted/empty volume).
    fn reset() -> Self;
}
