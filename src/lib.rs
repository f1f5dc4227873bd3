//! A bounding volume hierarchy over 3D axis-aligned bounding boxes.
//!
//! [`Tree`] is the incremental index: insert, remove, update, and query
//! `(bounds, payload)` pairs one at a time. [`Builder`] constructs a
//! [`Tree`] in one pass from a fully-known set of pairs, under a chosen
//! [`SplitStrategy`].

pub mod builder;
pub mod core;
pub mod node;
pub mod shared;
pub mod tree;

pub use builder::{Builder, SplitStrategy};
pub use node::{NodeHandle, ObjectId};
pub use shared::aabb::Aabb;
pub use shared::ray::Ray;
pub use shared::sphere::BoundingSphere;
pub use tree::{CollisionResult, Tree, TreeConfig, TreeStats};
