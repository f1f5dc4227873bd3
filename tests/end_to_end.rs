//! End-to-end scenarios spanning the incremental tree, the bulk builder,
//! and the ray/box primitives together — the teacher's `tests/` tier for
//! whole-system behavior, as opposed to the per-module unit tests in
//! `#[cfg(test)]` blocks.

mod common;

use bvh_tree::core::types::{Point3, Vector3};
use bvh_tree::{Aabb, Builder, Ray, SplitStrategy, Tree};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn cube(center: Point3, half: f64) -> Aabb { Aabb::from_center_half_extents(center, Vector3::splat(half)) }

#[test]
fn sah_median_and_equal_strategies_agree_on_the_final_payload_set() {
    common::init();

    let mut rng = ChaCha8Rng::seed_from_u64(1234);
    let pairs: Vec<(Aabb, u32)> = (0..1000u32)
        .map(|id| {
            let center = Point3::new(
                rng.gen_range(-500.0..500.0),
                rng.gen_range(-500.0..500.0),
                rng.gen_range(-500.0..500.0),
            );
            (cube(center, rng.gen_range(0.1..10.0)), id)
        })
        .collect();

    let expected: std::collections::HashSet<u32> = pairs.iter().map(|(_, id)| *id).collect();

    for strategy in [SplitStrategy::Sah, SplitStrategy::Median, SplitStrategy::Equal] {
        let tree = Builder::new().with_strategy(strategy).with_max_leaf_size(4).build(pairs.clone());
        assert!(tree.validate(), "{strategy:?} produced a tree that fails validation");
        let found: std::collections::HashSet<u32> = tree.iter_payloads().collect();
        assert_eq!(found, expected, "{strategy:?} lost or duplicated objects");
        assert_eq!(tree.get_stats().leaf_count, 1000);
    }
}

#[test]
fn ray_slab_edge_cases() {
    common::init();

    let aabb = Aabb::new(Point3::splat(-1.0), Point3::splat(1.0));

    // Ray origin exactly on the box's surface, pointing inward: should hit at t=0.
    let grazing_in = Ray::new(Point3::new(-1.0, 0.0, 0.0), Vector3::X);
    let (near, _far) = grazing_in.intersect_box_points(&aabb).expect("should hit from the surface");
    assert_eq!(near, 0.0);

    // Ray parallel to an axis and outside every slab on that axis: miss.
    let parallel_miss = Ray::new(Point3::new(-5.0, 5.0, 5.0), Vector3::X);
    assert!(parallel_miss.intersect_box_points(&aabb).is_none());

    // Ray pointing away from a box it starts outside of: miss (tFar < 0).
    let pointing_away = Ray::new(Point3::new(-5.0, 0.0, 0.0), -Vector3::X);
    assert!(pointing_away.intersect_box_points(&aabb).is_none());

    // Diagonal ray passing exactly through the box's two opposite corners.
    let diagonal = Ray::new(Point3::new(-2.0, -2.0, -2.0), Vector3::new(1.0, 1.0, 1.0));
    let (near, far) = diagonal.intersect_box_points(&aabb).expect("should pass through both corners");
    assert!(near <= far);
    approx::assert_relative_eq!(near, 3.0_f64.sqrt());
    approx::assert_relative_eq!(far, 3.0 * 3.0_f64.sqrt());
}

#[test]
fn insert_query_remove_round_trip_over_a_random_scene() {
    common::init();

    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut tree: Tree<u32> = Tree::new();
    let mut ids = Vec::new();
    for id in 0..300u32 {
        let center = Point3::new(rng.gen_range(-50.0..50.0), rng.gen_range(-50.0..50.0), rng.gen_range(-50.0..50.0));
        ids.push(tree.insert(cube(center, rng.gen_range(0.2..3.0)), id));
    }
    assert!(tree.validate());

    let ray = Ray::new(Point3::new(-1000.0, 0.0, 0.0), Vector3::X);
    let hits = tree.raycast(&ray);
    for pair in hits.windows(2) {
        assert!(pair[0].distance() <= pair[1].distance());
    }

    let nearest = tree.find_nearest(Point3::ZERO);
    assert!(nearest.is_some());

    tree.optimize();
    assert!(tree.validate());

    for id in ids {
        assert!(tree.remove(id));
    }
    assert!(tree.is_empty());
    assert!(tree.validate());
}
