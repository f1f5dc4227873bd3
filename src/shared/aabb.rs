//! Axis-aligned bounding box.

use crate::core::types::{Matrix4, Number, Point3, Vector3};
use crate::shared::ray::Ray;
use crate::shared::volume::BoundingVolume;
use getset::CopyGetters;

/// An axis-aligned bounding box, stored as its `min` and `max` corners.
///
/// A box is *degenerate* (and [`is_empty`](Aabb::is_empty)) when
/// `min.i >= max.i` on any axis; [`Aabb::reset`] produces the canonical
/// empty box (`min = +inf, max = -inf`) so that [`BoundingVolume::merge`]
/// acts as an identity over it.
#[derive(CopyGetters, Copy, Clone, Debug, PartialEq)]
#[getset(get_copy = "pub")]
pub struct Aabb {
    min: Point3,
    max: Point3,
}

impl Default for Aabb {
    fn default() -> Self { Self::reset() }
}

// region Constructors

impl Aabb {
    /// Creates an AABB from two corners, which do not have to be sorted.
    pub fn new(a: Point3, b: Point3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn from_center_half_extents(center: Point3, half_extents: Vector3) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    /// Returns an AABB enclosing the given points. An empty iterator yields
    /// [`Aabb::reset`] (the empty-input edge case).
    pub fn from_points(points: impl IntoIterator<Item = Point3>) -> Self {
        points
            .into_iter()
            .fold(Self::reset(), |acc, p| Self::new(acc.min.min(p), acc.max.max(p)))
    }

    pub fn encompass(a: &Self, b: &Self) -> Self { a.merge(b) }

    pub fn encompass_iter<'a>(iter: impl IntoIterator<Item = &'a Self>) -> Self {
        iter.into_iter().fold(Self::reset(), |acc, b| acc.merge(b))
    }
}

// endregion Constructors

// region Derived quantities

impl Aabb {
    pub fn center(&self) -> Point3 { (self.min + self.max) * 0.5 }

    /// Half of the box's side lengths.
    pub fn extent(&self) -> Vector3 { (self.max - self.min) * 0.5 }

    pub fn size(&self) -> Vector3 { self.max - self.min }

    pub fn corners(&self) -> [Point3; 8] {
        let (l, h) = (self.min, self.max);
        [
            Point3::new(l.x, l.y, l.z),
            Point3::new(l.x, l.y, h.z),
            Point3::new(l.x, h.y, l.z),
            Point3::new(l.x, h.y, h.z),
            Point3::new(h.x, l.y, l.z),
            Point3::new(h.x, l.y, h.z),
            Point3::new(h.x, h.y, l.z),
            Point3::new(h.x, h.y, h.z),
        ]
    }

    pub fn contains_point(&self, p: Point3) -> bool { (p.cmpge(self.min) & p.cmple(self.max)).all() }

    /// Six-plane separating-axis overlap test.
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Axis-separated distance from `p` to this box: zero inside, otherwise
    /// the length of the vector from `p` to its closest point on the box.
    pub fn distance_to_point(&self, p: Point3) -> Number {
        let d = (self.min - p).max(Vector3::ZERO).max(p - self.max);
        d.length()
    }
}

// endregion Derived quantities

// region Ray intersection

impl Aabb {
    /// Slab-method entry/exit distances along `ray`, or `None` on a miss.
    ///
    /// `tNear` is clamped to `max(0, tNear)`, per the entry-distance
    /// convention used by the tree's traversal; `tFar` is left unclamped so
    /// callers can tell a ray starting inside the box (`tNear == 0`) from
    /// one that starts outside it.
    ///
    /// CREDITS: <https://tavianator.com/2011/ray_box.html>: division by a
    /// zero direction component compares correctly against `+-inf`, so
    /// axis-parallel rays need no branch. Exception: a ray exactly on a
    /// slab plane it is also parallel to (`0 * inf`) is an unspecified
    /// hit/miss, a knife-edge case not worth a branch to pin down.
    pub fn intersect_ray_interval(&self, ray: &Ray) -> Option<(Number, Number)> {
        let inv_dir = ray.inv_direction();
        let t1 = (self.min - ray.origin()) * inv_dir;
        let t2 = (self.max - ray.origin()) * inv_dir;

        let t_near = t1.min(t2).max_element();
        let t_far = t1.max(t2).min_element();

        if t_far < t_near.max(0.0) {
            None
        } else {
            Some((t_near.max(0.0), t_far))
        }
    }

    /// Entry distance only, as used by the tree's traversal code.
    pub fn hit(&self, ray: &Ray) -> Option<Number> { self.intersect_ray_interval(ray).map(|(near, _)| near) }
}

// endregion Ray intersection

impl BoundingVolume for Aabb {
    fn bounding_box(&self) -> Aabb { *self }

    fn intersects(&self, other: &Aabb) -> bool { Aabb::intersects(self, other) }

    fn intersects_ray(&self, ray: &Ray) -> Option<Number> { self.hit(ray) }

    fn contains_point(&self, p: Point3) -> bool { Aabb::contains_point(self, p) }

    fn surface_area(&self) -> Number {
        if self.is_empty() {
            return 0.0;
        }
        let d = self.size();
        2.0 * (d.x * d.y + d.y * d.z + d.z * d.x)
    }

    fn volume(&self) -> Number {
        if self.is_empty() {
            return 0.0;
        }
        let d = self.size();
        d.x * d.y * d.z
    }

    fn merge(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Transforms the box's eight corners and takes the [`Aabb::from_points`]
    /// envelope of the result.
    fn transform(&self, matrix: &Matrix4) -> Self { Self::from_points(self.corners().map(|c| matrix.transform_point3(c))) }

    fn is_empty(&self) -> bool { self.min.x >= self.max.x || self.min.y >= self.max.y || self.min.z >= self.max.z }

    fn reset() -> Self {
        Self {
            min: Point3::splat(Number::INFINITY),
            max: Point3::splat(Number::NEG_INFINITY),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_then_merge_is_identity() {
        let b = Aabb::new(Point3::new(1.0, 2.0, 3.0), Point3::new(4.0, 5.0, 6.0));
        assert_eq!(Aabb::reset().merge(&b), b);
    }

    #[test]
    fn from_points_empty_is_reset() {
        let b = Aabb::from_points(std::iter::empty());
        assert!(b.is_empty());
        assert_eq!(b, Aabb::reset());
    }

    #[test]
    fn surface_area_and_volume() {
        let b = Aabb::new(Point3::ZERO, Point3::new(2.0, 3.0, 4.0));
        assert_eq!(b.volume(), 24.0);
        assert_eq!(b.surface_area(), 2.0 * (6.0 + 12.0 + 8.0));
    }

    #[test]
    fn transform_axis_aligned_scale_translate_matches_from_points() {
        let b = Aabb::new(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
        let m = Matrix4::from_scale_rotation_translation(
            Vector3::new(2.0, 3.0, 4.0),
            glam::DQuat::IDENTITY,
            Vector3::new(10.0, 0.0, -5.0),
        );
        let transformed = b.transform(&m);
        let expected = Aabb::from_points(b.corners().map(|c| m.transform_point3(c)));
        assert_eq!(transformed, expected);
    }

    #[test]
    fn overlap_is_symmetric() {
        let a = Aabb::new(Point3::ZERO, Point3::new(2.0, 2.0, 2.0));
        let b = Aabb::new(Point3::new(1.0, 1.0, 1.0), Point3::new(3.0, 3.0, 3.0));
        let c = Aabb::new(Point3::new(5.0, 5.0, 5.0), Point3::new(6.0, 6.0, 6.0));
        assert!(a.intersects(&b) && b.intersects(&a));
        assert!(!a.intersects(&c) && !c.intersects(&a));
    }
}
