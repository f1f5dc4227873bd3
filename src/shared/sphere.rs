//! Bounding sphere primitive.

use crate::core::types::{Matrix4, Number, Point3, Vector3};
use crate::shared::aabb::Aabb;
use crate::shared::ray::Ray;
use crate::shared::volume::BoundingVolume;
use getset::CopyGetters;

/// A ball of `radius` centred at `center`.
#[derive(CopyGetters, Copy, Clone, Debug, PartialEq)]
#[getset(get_copy = "pub")]
pub struct BoundingSphere {
    center: Point3,
    radius: Number,
}

impl BoundingSphere {
    pub fn new(center: Point3, radius: Number) -> Self {
        debug_assert!(radius >= 0.0, "radius must be non-negative; got {radius}");
        Self { center, radius }
    }

    /// The smallest sphere enclosing the given points, using the
    /// center-of-AABB as the sphere's center (a cheap, non-minimal bound,
    /// matching the "good enough for culling" spirit of an AABB envelope).
    pub fn from_points(points: impl IntoIterator<Item = Point3>) -> Self {
        let points: Vec<Point3> = points.into_iter().collect();
        if points.is_empty() {
            return Self::reset();
        }
        let aabb = Aabb::from_points(points.iter().copied());
        let center = aabb.center();
        let radius = points
            .iter()
            .map(|p| center.distance(*p))
            .fold(0.0, Number::max);
        Self { center, radius }
    }

    /// Standard closest-point-on-box test.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool { aabb.distance_to_point(self.center) <= self.radius }
}

impl BoundingVolume for BoundingSphere {
    fn bounding_box(&self) -> Aabb { Aabb::from_center_half_extents(self.center, Vector3::splat(self.radius)) }

    fn intersects(&self, other: &Aabb) -> bool { self.intersects_aabb(other) }

    fn intersects_ray(&self, ray: &Ray) -> Option<Number> { ray.intersect_sphere(self) }

    fn contains_point(&self, p: Point3) -> bool { self.center.distance_squared(p) <= self.radius * self.radius }

    fn surface_area(&self) -> Number { 4.0 * std::f64::consts::PI * self.radius * self.radius }

    fn volume(&self) -> Number { (4.0 / 3.0) * std::f64::consts::PI * self.radius.powi(3) }

    /// The smallest sphere enclosing both `self` and `other`.
    fn merge(&self, other: &Self) -> Self {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let to_other = other.center - self.center;
        let dist = to_other.length();
        if dist + other.radius <= self.radius {
            return *self;
        }
        if dist + self.radius <= other.radius {
            return *other;
        }
        let radius = (self.radius + other.radius + dist) * 0.5;
        let center = if dist > crate::shared::validate::EPSILON {
            self.center + to_other * ((radius - self.radius) / dist)
        } else {
            self.center
        };
        Self { center, radius }
    }

    /// Transforms the center as a point; the new radius is the old radius
    /// scaled by the largest row-scale of the matrix's linear part.
    fn transform(&self, matrix: &Matrix4) -> Self {
        let center = matrix.transform_point3(self.center);
        let axes = [
            matrix.transform_vector3(Vector3::X).length(),
            matrix.transform_vector3(Vector3::Y).length(),
            matrix.transform_vector3(Vector3::Z).length(),
        ];
        let max_scale = axes.into_iter().fold(0.0, Number::max);
        Self {
            center,
            radius: self.radius * max_scale,
        }
    }

    fn is_empty(&self) -> bool { self.radius <= 0.0 }

    fn reset() -> Self {
        Self {
            center: Point3::ZERO,
            radius: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_matches_spec() {
        let s = BoundingSphere::new(Point3::new(1.0, 2.0, 3.0), 2.0);
        let b = s.bounding_box();
        assert_eq!(b.min(), Point3::new(-1.0, 0.0, 1.0));
        assert_eq!(b.max(), Point3::new(3.0, 4.0, 5.0));
    }

    #[test]
    fn merge_encloses_both() {
        let a = BoundingSphere::new(Point3::ZERO, 1.0);
        let b = BoundingSphere::new(Point3::new(5.0, 0.0, 0.0), 1.0);
        let merged = a.merge(&b);
        assert!(merged.center.distance(a.center) + a.radius <= merged.radius + 1e-9);
        assert!(merged.center.distance(b.center) + b.radius <= merged.radius + 1e-9);
    }

    #[test]
    fn transform_scales_radius_by_max_axis() {
        let s = BoundingSphere::new(Point3::ZERO, 1.0);
        let m = Matrix4::from_scale(Vector3::new(2.0, 3.0, 1.0));
        let transformed = s.transform(&m);
        approx::assert_relative_eq!(transformed.radius, 3.0);
    }

    #[test]
    fn surface_area_and_volume_match_sphere_formulas() {
        let s = BoundingSphere::new(Point3::ZERO, 2.0);
        approx::assert_relative_eq!(s.surface_area(), 4.0 * std::f64::consts::PI * 4.0);
        approx::assert_relative_eq!(s.volume(), (4.0 / 3.0) * std::f64::consts::PI * 8.0);
    }
}
