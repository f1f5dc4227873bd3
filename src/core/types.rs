//! Numeric and vector type aliases shared by every module in the crate.

/// Numeric type used for all distance/coordinate calculations.
pub type Number = f64;
pub type Vector2 = glam::DVec2;
pub type Vector3 = glam::DVec3;
pub type Point2 = glam::DVec2;
pub type Point3 = glam::DVec3;
pub type Matrix4 = glam::DMat4;
