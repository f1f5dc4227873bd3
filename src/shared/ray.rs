use crate::core::types::{Matrix4, Number, Point3, Vector3};
use crate::shared::aabb::Aabb;
use crate::shared::sphere::BoundingSphere;
use crate::shared::validate;
use getset::CopyGetters;

/// Distinguished "miss" sentinel returned by the scalar intersection tests.
pub const MISS: Number = -1.0;

/// Epsilon below which an axis/direction is treated as degenerate (parallel
/// slab test, zero-length capsule axis).
const EPSILON: Number = 1e-6;

/// A 3D half-line: an `origin` and a (conceptually unit-length) `direction`.
#[derive(Copy, Clone, PartialEq, Debug, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct Ray {
    origin: Point3,
    direction: Vector3,
    inv_direction: Vector3,
}

impl Ray {
    /// Creates a ray, normalising `direction`.
    pub fn new(origin: Point3, direction: Vector3) -> Self {
        let direction = direction.normalize();
        Self {
            origin,
            direction,
            inv_direction: direction.recip(),
        }
    }

    /// Creates a ray without normalising `direction`.
    ///
    /// # Safety
    /// The caller must provide an already-normalised direction; this only
    /// validates it in debug builds (via [`validate::normal3`]), it does not
    /// normalise on your behalf.
    pub unsafe fn new_unchecked(origin: Point3, direction: Vector3) -> Self {
        validate::normal3(direction);
        Self {
            origin,
            direction,
            inv_direction: direction.recip(),
        }
    }

    /// `origin + t * direction`.
    pub fn get_point(&self, t: Number) -> Point3 { self.origin + self.direction * t }

    // region AABB

    /// Entry distance, or [`MISS`] if the ray never enters `aabb`.
    pub fn intersect_box(&self, aabb: &Aabb) -> Number { aabb.hit(self).unwrap_or(MISS) }

    /// Slab-method entry (`tNear`, clamped to `>= 0`) and exit (`tFar`)
    /// distances, or `None` on a miss.
    pub fn intersect_box_points(&self, aabb: &Aabb) -> Option<(Number, Number)> { aabb.intersect_ray_interval(self) }

    // endregion AABB

    // region Sphere

    /// Entry distance to `sphere`, or `None` on a miss.
    pub fn intersect_sphere(&self, sphere: &BoundingSphere) -> Option<Number> {
        let oc = self.origin - sphere.center();
        let b = oc.dot(self.direction);
        let c = oc.length_squared() - sphere.radius() * sphere.radius();
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }
        let sqrt_d = discriminant.sqrt();
        let near = -b - sqrt_d;
        let far = -b + sqrt_d;
        if far < 0.0 {
            None
        } else if near >= 0.0 {
            Some(near)
        } else {
            Some(0.0)
        }
    }

    // endregion Sphere

    // region OBB

    /// Intersects an oriented bounding box, given in world space as
    /// `center`, `half_extents`, and a `rotation` (world ← local).
    ///
    /// Transforms the ray into the OBB's local frame and runs the AABB test
    /// there.
    pub fn intersect_obb(&self, center: Point3, half_extents: Vector3, rotation: glam::DQuat) -> Option<Number> {
        let inv_rotation = rotation.inverse();
        let local_origin = inv_rotation * (self.origin - center);
        let local_dir = inv_rotation * self.direction;
        let local_ray = Ray::new(local_origin, local_dir);
        let local_aabb = Aabb::from_center_half_extents(Point3::ZERO, half_extents);
        local_aabb.hit(&local_ray)
    }

    // endregion OBB

    // region Capsule

    /// Intersects a capsule: the Minkowski sum of a segment `start..end` and
    /// a ball of `radius`.
    ///
    /// Falls back to a sphere test centred on `start` when the segment is
    /// shorter than `1e-6` (the degenerate-axis edge case).
    pub fn intersect_capsule(&self, start: Point3, end: Point3, radius: Number) -> Option<Number> {
        let axis = end - start;
        if axis.length_squared() < EPSILON * EPSILON {
            return self.intersect_sphere(&BoundingSphere::new(start, radius));
        }

        // Closest point between the ray (p = o + t*d) and the infinite line
        // through the axis, clamped onto the segment, then a sphere test at
        // that clamped point.
        let axis_dir = axis.normalize();
        let axis_len = axis.length();

        let delta = self.origin - start;
        let d = self.direction;

        let dd = d.dot(d);
        let da = d.dot(axis_dir);
        let aa = axis_dir.dot(axis_dir);
        let dp = d.dot(delta);
        let ap = axis_dir.dot(delta);

        let denom = dd * aa - da * da;
        let s = if denom.abs() > EPSILON {
            ((dp * da - ap * dd) / denom).clamp(0.0, axis_len)
        } else {
            ap.clamp(0.0, axis_len)
        };

        let closest_on_axis = start + axis_dir * s;
        self.intersect_sphere(&BoundingSphere::new(closest_on_axis, radius))
    }

    // endregion Capsule

    // region Point geometry

    pub fn get_closest_point(&self, p: Point3) -> Point3 {
        let t = (p - self.origin).dot(self.direction).max(0.0);
        self.get_point(t)
    }

    pub fn distance_to_point_squared(&self, p: Point3) -> Number { self.get_closest_point(p).distance_squared(p) }

    pub fn distance_to_point(&self, p: Point3) -> Number { self.distance_to_point_squared(p).sqrt() }

    // endregion Point geometry

    /// Transforms the ray's origin as a point and direction as a normal
    /// (`transpose(inverse(matrix))`), renormalising the direction.
    pub fn transform(&self, matrix: &Matrix4) -> Self {
        let origin = matrix.transform_point3(self.origin);
        let normal_matrix = matrix.inverse().transpose();
        let direction = normal_matrix.transform_vector3(self.direction);
        Self::new(origin, direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_inside_box_has_zero_near() {
        let ray = Ray::new(Point3::ZERO, Vector3::X);
        let aabb = Aabb::new(Point3::splat(-1.0), Point3::splat(1.0));
        let (near, far) = ray.intersect_box_points(&aabb).expect("should hit");
        assert_eq!(near, 0.0);
        assert!(far > 0.0);
    }

    #[test]
    fn parallel_and_outside_slab_misses() {
        let ray = Ray::new(Point3::new(0.0, 5.0, 0.0), Vector3::X);
        let aabb = Aabb::new(Point3::splat(-1.0), Point3::splat(1.0));
        assert!(ray.intersect_box_points(&aabb).is_none());
    }

    #[test]
    fn sphere_hit_returns_entry_distance() {
        let ray = Ray::new(Point3::new(-5.0, 0.0, 0.0), Vector3::X);
        let sphere = BoundingSphere::new(Point3::ZERO, 1.0);
        assert_eq!(ray.intersect_sphere(&sphere), Some(4.0));
    }

    #[test]
    fn capsule_falls_back_to_sphere_when_degenerate() {
        let ray = Ray::new(Point3::new(-5.0, 0.0, 0.0), Vector3::X);
        let hit = ray.intersect_capsule(Point3::ZERO, Point3::new(1e-9, 0.0, 0.0), 1.0);
        assert_eq!(hit, Some(4.0));
    }

    #[test]
    fn closest_point_clamps_to_ray_start() {
        let ray = Ray::new(Point3::ZERO, Vector3::X);
        let behind = Point3::new(-10.0, 0.0, 0.0);
        assert_eq!(ray.get_closest_point(behind), Point3::ZERO);
    }
}
