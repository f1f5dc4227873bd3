//! Debug-only geometric sanity checks.
//!
//! Every function here compiles to nothing when `debug_assertions` is off;
//! in debug builds they `panic!` on a bad value. The tree's own structural
//! invariants (N1-N5, T1-T6) are checked separately, via `Tree::validate`
//! called through `debug_assert!` after mutating operations.

use crate::core::types::{Number, Point3, Vector3};
use crate::shared::ray::Ray;
use std::borrow::Borrow;

/// Inserts a `return` statement if debug assertions are disabled.
macro_rules! debug_assert_only {
    () => {
        if cfg!(not(debug_assertions)) {
            return;
        }
    };
}

pub const EPSILON: Number = 1e-6;
pub const RELATIVE: Number = 1e-3;

/// Check is not [`Number::NAN`] and not [`Number::INFINITY`]
#[inline(always)]
#[track_caller]
pub fn number(val: impl Borrow<Number>) {
    debug_assert_only!();
    let val = val.borrow();

    assert!(!val.is_nan(), "should not be nan; val: {val}");
    assert!(!val.is_infinite(), "should not be inf; val: {val}");
}

/// Check is a valid vector, and normalised
#[inline(always)]
#[track_caller]
pub fn normal3(n: impl Borrow<Vector3>) {
    debug_assert_only!();
    let n = n.borrow();

    vector3(n);
    assert!(
        (n.length() - 1.0).abs() <= RELATIVE,
        "should be normalised; vec: {n:?}, len: {:?}",
        n.length()
    );
}

/// Check all components are valid numbers
#[inline(always)]
#[track_caller]
pub fn point3(v: impl Borrow<Point3>) {
    debug_assert_only!();
    let p = v.borrow();

    for c in p.to_array() {
        number(c);
    }
}

/// Check all components are valid numbers
#[inline(always)]
#[track_caller]
pub fn vector3(v: impl Borrow<Vector3>) {
    debug_assert_only!();
    let v = v.borrow();

    for c in v.to_array() {
        number(c);
    }
}

/// Check position and direction are valid (ignore [`Ray::inv_direction`])
#[inline(always)]
#[track_caller]
pub fn ray(r: impl Borrow<Ray>) {
    debug_assert_only!();
    let r = r.borrow();

    normal3(r.direction());
    point3(r.origin());
}
