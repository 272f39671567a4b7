//! Transformation cache tests
//!
//! Tests for:
//! - World matrix composition along parent chains
//! - Lazy recomputation and dirty flag propagation
//! - Propagation stopping at already-dirty subtrees
//! - World/Object inverse relationship
//! - Detach, reattach and transform release
//! - Nodes without transforms passing the parent matrix through
//! - Explicit-memory scenes and sharing behind a lock

use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use ramses::prelude::*;

// ============================================================================
// Helper
// ============================================================================

const EPSILON: f32 = 1e-4;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn translation_of(matrix: Mat4) -> Vec3 {
    matrix.w_axis.truncate()
}

struct Chain {
    scene: TransformationCachedScene,
    nodes: [NodeHandle; 3],
    transforms: [TransformHandle; 3],
}

/// root -> a -> b, translated by +X, +Y and +Z respectively.
fn translated_chain() -> Chain {
    let mut scene = TransformationCachedScene::default();
    let root = scene.allocate_node(1, None);
    let a = scene.allocate_node(1, None);
    let b = scene.allocate_node(0, None);
    scene.add_child_to_node(root, a);
    scene.add_child_to_node(a, b);

    let nodes = [root, a, b];
    let offsets = [Vec3::X, Vec3::Y, Vec3::Z];
    let transforms = [0, 1, 2].map(|i| {
        let transform = scene.allocate_transform(nodes[i], None);
        scene.set_translation(transform, offsets[i]);
        transform
    });

    Chain { scene, nodes, transforms }
}

// ============================================================================
// Composition
// ============================================================================

#[test]
fn chain_composes_translations() {
    init_logger();
    let Chain { scene, nodes: [root, a, b], .. } = translated_chain();

    let world = scene.update_matrix_cache(MatrixType::World, b);
    assert!(world.abs_diff_eq(Mat4::from_translation(Vec3::ONE), EPSILON));

    let world = scene.update_matrix_cache(MatrixType::World, a);
    assert!(translation_of(world).abs_diff_eq(Vec3::new(1.0, 1.0, 0.0), EPSILON));
    assert!(translation_of(scene.update_matrix_cache(MatrixType::World, root)).abs_diff_eq(Vec3::X, EPSILON));
}

#[test]
fn child_inherits_parent_rotation_and_scale() {
    let mut scene = TransformationCachedScene::default();
    let parent = scene.allocate_node(1, None);
    let child = scene.allocate_node(0, None);
    scene.add_child_to_node(parent, child);

    let parent_transform = scene.allocate_transform(parent, None);
    scene.set_rotation(parent_transform, Vec4::new(0.0, 0.0, 90.0, 0.0), RotationType::EulerXYZ);
    scene.set_scaling(parent_transform, Vec3::splat(2.0));
    let child_transform = scene.allocate_transform(child, None);
    scene.set_translation(child_transform, Vec3::X);

    // Child offset +X is rotated onto +Y and doubled by the parent.
    let world = scene.update_matrix_cache(MatrixType::World, child);
    assert!(translation_of(world).abs_diff_eq(Vec3::new(0.0, 2.0, 0.0), EPSILON));
}

#[test]
fn world_times_object_is_identity() {
    let Chain { mut scene, nodes: [_, a, b], transforms: [root_t, a_t, b_t] } = translated_chain();
    scene.set_rotation(root_t, Vec4::new(10.0, 20.0, 30.0, 0.0), RotationType::EulerZYX);
    scene.set_scaling(a_t, Vec3::new(2.0, 0.5, 4.0));
    scene.set_rotation(b_t, Quat::from_rotation_y(0.7).into(), RotationType::Quaternion);

    for node in [a, b] {
        let world = scene.update_matrix_cache(MatrixType::World, node);
        let object = scene.update_matrix_cache(MatrixType::Object, node);
        assert!((world * object).abs_diff_eq(Mat4::IDENTITY, EPSILON));
        assert!(object.abs_diff_eq(world.inverse(), EPSILON));
    }
}

// ============================================================================
// Laziness
// ============================================================================

#[test]
fn mutation_only_marks_dirty() {
    let Chain { mut scene, nodes: [root, a, b], transforms: [_, a_t, _] } = translated_chain();
    let _ = scene.update_matrix_cache(MatrixType::World, b);
    assert!(!scene.is_matrix_cache_dirty(MatrixType::World, b));

    let computed = scene.matrix_computation_count();
    scene.set_translation(a_t, Vec3::new(0.0, 5.0, 0.0));

    assert!(scene.is_matrix_cache_dirty(MatrixType::World, a));
    assert!(scene.is_matrix_cache_dirty(MatrixType::World, b));
    assert!(!scene.is_matrix_cache_dirty(MatrixType::World, root));
    assert_eq!(scene.matrix_computation_count(), computed);

    let world = scene.update_matrix_cache(MatrixType::World, b);
    assert!(translation_of(world).abs_diff_eq(Vec3::new(1.0, 5.0, 1.0), EPSILON));
    // Only a and b are recomputed; root stays cached.
    assert_eq!(scene.matrix_computation_count(), computed + 2);
}

#[test]
fn repeated_reads_compute_nothing() {
    let Chain { scene, nodes: [_, _, b], .. } = translated_chain();
    let first = scene.update_matrix_cache(MatrixType::World, b);
    let computed = scene.matrix_computation_count();

    let second = scene.update_matrix_cache(MatrixType::World, b);
    assert_eq!(first, second);
    assert_eq!(scene.matrix_computation_count(), computed);
}

#[test]
fn world_and_object_are_tracked_separately() {
    let Chain { scene, nodes: [_, _, b], .. } = translated_chain();
    let _ = scene.update_matrix_cache(MatrixType::Object, b);

    assert!(!scene.is_matrix_cache_dirty(MatrixType::Object, b));
    assert!(scene.is_matrix_cache_dirty(MatrixType::World, b));
}

#[test]
fn dirtying_twice_propagates_once() {
    let Chain { mut scene, nodes: [_, _, b], transforms: [root_t, ..] } = translated_chain();
    let _ = scene.update_matrix_cache(MatrixType::World, b);
    let _ = scene.update_matrix_cache(MatrixType::Object, b);

    let before = scene.dirty_propagation_count();
    scene.set_translation(root_t, Vec3::new(2.0, 0.0, 0.0));
    let after_first = scene.dirty_propagation_count();
    assert_eq!(after_first - before, 3);

    scene.set_translation(root_t, Vec3::new(3.0, 0.0, 0.0));
    assert_eq!(scene.dirty_propagation_count(), after_first);

    let world = scene.update_matrix_cache(MatrixType::World, b);
    assert!(translation_of(world).abs_diff_eq(Vec3::new(3.0, 1.0, 1.0), EPSILON));
}

#[test]
fn propagation_stops_at_dirty_subtree() {
    let Chain { mut scene, nodes: [_, _, b], transforms: [root_t, a_t, _] } = translated_chain();
    let _ = scene.update_matrix_cache(MatrixType::World, b);
    let _ = scene.update_matrix_cache(MatrixType::Object, b);

    scene.set_scaling(a_t, Vec3::splat(3.0));
    let after_inner = scene.dirty_propagation_count();

    // a and b are already dirty; only root is newly marked.
    scene.set_scaling(root_t, Vec3::splat(2.0));
    assert_eq!(scene.dirty_propagation_count(), after_inner + 1);
}

// ============================================================================
// Topology changes
// ============================================================================

#[test]
fn detached_child_becomes_its_own_root() {
    let Chain { mut scene, nodes: [_, a, b], .. } = translated_chain();
    let _ = scene.update_matrix_cache(MatrixType::World, b);

    scene.remove_child_from_node(a, b);

    assert_eq!(scene.parent(b), NodeHandle::invalid());
    assert!(!scene.children(a).contains(&b));
    assert!(scene.is_matrix_cache_dirty(MatrixType::World, b));
    let world = scene.update_matrix_cache(MatrixType::World, b);
    assert!(world.abs_diff_eq(Mat4::from_translation(Vec3::Z), EPSILON));
}

#[test]
fn reattached_subtree_picks_up_new_parent() {
    let Chain { mut scene, nodes: [root, a, b], .. } = translated_chain();
    let other = scene.allocate_node(1, None);
    let other_t = scene.allocate_transform(other, None);
    scene.set_translation(other_t, Vec3::new(0.0, 0.0, 10.0));
    let _ = scene.update_matrix_cache(MatrixType::World, b);

    scene.remove_child_from_node(root, a);
    scene.add_child_to_node(other, a);

    let world = scene.update_matrix_cache(MatrixType::World, b);
    assert!(translation_of(world).abs_diff_eq(Vec3::new(0.0, 1.0, 11.0), EPSILON));
}

#[test]
fn try_add_child_rejects_cycle_without_dirtying() -> anyhow::Result<()> {
    let Chain { mut scene, nodes: [root, _, b], .. } = translated_chain();
    let _ = scene.update_matrix_cache(MatrixType::World, b);

    let err = scene.try_add_child_to_node(b, root).unwrap_err();
    assert_eq!(err, SceneError::Cycle { parent: b, child: root });
    assert!(!scene.is_matrix_cache_dirty(MatrixType::World, root));

    let loose = scene.allocate_node(0, None);
    scene.try_add_child_to_node(b, loose)?;
    assert!(translation_of(scene.update_matrix_cache(MatrixType::World, loose)).abs_diff_eq(Vec3::ONE, EPSILON));
    Ok(())
}

#[test]
fn try_remove_child_detaches() -> anyhow::Result<()> {
    let Chain { mut scene, nodes: [root, a, b], .. } = translated_chain();

    assert_eq!(
        scene.try_remove_child_from_node(root, b),
        Err(SceneError::NotAChild { parent: root, child: b })
    );
    scene.try_remove_child_from_node(a, b)?;
    assert!(scene.validate_topology().is_ok());
    assert_eq!(scene.update_matrix_cache(MatrixType::World, b), Mat4::from_translation(Vec3::Z));
    Ok(())
}

#[test]
fn releasing_transform_removes_its_contribution() {
    let Chain { mut scene, nodes: [_, a, b], transforms: [_, a_t, _] } = translated_chain();
    let _ = scene.update_matrix_cache(MatrixType::World, b);

    scene.release_transform(a_t);

    assert_eq!(scene.transform_of(a), None);
    assert!(scene.is_matrix_cache_dirty(MatrixType::World, b));
    let world = scene.update_matrix_cache(MatrixType::World, b);
    assert!(translation_of(world).abs_diff_eq(Vec3::new(1.0, 0.0, 1.0), EPSILON));
}

#[test]
fn try_allocate_transform_rejects_second_transform() {
    let Chain { mut scene, nodes: [root, ..], transforms: [root_t, ..] } = translated_chain();

    assert_eq!(
        scene.try_allocate_transform(root, None),
        Err(SceneError::NodeAlreadyHasTransform { node: root, transform: root_t })
    );
    assert_eq!(
        scene.try_allocate_transform(NodeHandle::new(40), None),
        Err(SceneError::NodeNotAllocated(NodeHandle::new(40)))
    );
    assert_eq!(scene.transform_of(root), Some(root_t));
}

#[test]
fn try_release_transform_rejects_dead_handle_without_dirtying() {
    let Chain { mut scene, nodes: [_, a, b], transforms: [_, a_t, _] } = translated_chain();

    scene.try_release_transform(a_t).expect("live transform");
    assert_eq!(scene.transform_of(a), None);
    let _ = scene.update_matrix_cache(MatrixType::World, b);

    assert_eq!(scene.try_release_transform(a_t), Err(SceneError::TransformNotAllocated(a_t)));
    assert!(!scene.is_matrix_cache_dirty(MatrixType::World, b));
}

#[test]
fn released_node_slot_gets_fresh_cache_entry() {
    let mut scene = TransformationCachedScene::default();
    let node = scene.allocate_node(0, None);
    let transform = scene.allocate_transform(node, None);
    scene.set_translation(transform, Vec3::X);
    let _ = scene.update_matrix_cache(MatrixType::World, node);

    scene.release_transform(transform);
    scene.release_node(node);
    let reused = scene.allocate_node(0, None);

    assert_eq!(reused, node);
    let entry = scene.matrix_cache_entry(reused);
    assert!(entry.is_dirty(MatrixType::World));
    assert!(entry.is_identity());
}

// ============================================================================
// Pass-through nodes
// ============================================================================

#[test]
fn node_without_transform_passes_parent_matrix_through() {
    let Chain { mut scene, nodes: [_, _, b], .. } = translated_chain();
    let plain = scene.allocate_node(1, None);
    let plain_leaf = scene.allocate_node(0, None);
    scene.add_child_to_node(b, plain);
    scene.add_child_to_node(plain, plain_leaf);

    let parent_world = scene.update_matrix_cache(MatrixType::World, b);
    assert_eq!(scene.update_matrix_cache(MatrixType::World, plain), parent_world);
    assert_eq!(scene.update_matrix_cache(MatrixType::World, plain_leaf), parent_world);

    let parent_object = scene.update_matrix_cache(MatrixType::Object, b);
    assert_eq!(scene.update_matrix_cache(MatrixType::Object, plain_leaf), parent_object);
}

#[test]
fn attached_identity_transform_changes_nothing() {
    let Chain { mut scene, nodes: [_, _, b], .. } = translated_chain();
    let leaf = scene.allocate_node(0, None);
    scene.add_child_to_node(b, leaf);
    let _ = scene.allocate_transform(leaf, None);

    let parent_world = scene.update_matrix_cache(MatrixType::World, b);
    assert_eq!(scene.update_matrix_cache(MatrixType::World, leaf), parent_world);
    assert!(scene.matrix_cache_entry(leaf).is_identity());
}

// ============================================================================
// Explicit memory and sharing
// ============================================================================

#[test]
fn explicit_memory_scene_uses_given_handles() {
    let mut scene = TransformationCachedSceneWithExplicitMemory::new(SceneInfo::new(5, "explicit"));
    scene.preallocate_scene_size(&SceneSizeInformation { node_count: 8, transform_count: 8, ..Default::default() });

    let parent = scene.allocate_node(1, Some(NodeHandle::new(6)));
    let child = scene.allocate_node(0, Some(NodeHandle::new(2)));
    scene.add_child_to_node(parent, child);
    let transform = scene.allocate_transform(parent, Some(TransformHandle::new(7)));
    scene.set_translation(transform, Vec3::new(0.0, -3.0, 0.0));

    assert_eq!(scene.transform_of(parent), Some(TransformHandle::new(7)));
    let world = scene.update_matrix_cache(MatrixType::World, child);
    assert!(translation_of(world).abs_diff_eq(Vec3::new(0.0, -3.0, 0.0), EPSILON));
    assert_eq!(scene.scene_size_information().node_count, 8);
}

#[test]
fn explicit_memory_scene_checked_allocation() {
    let mut scene = TransformationCachedSceneWithExplicitMemory::default();
    scene.preallocate_scene_size(&SceneSizeInformation { node_count: 2, transform_count: 1, ..Default::default() });

    assert_eq!(scene.try_allocate_node(0, None), Err(SceneError::Pool(PoolError::MissingHandle)));
    let node = scene.allocate_node(0, Some(NodeHandle::new(0)));
    assert_eq!(
        scene.try_allocate_transform(node, Some(TransformHandle::new(1))),
        Err(SceneError::Pool(PoolError::OutOfRange { index: 1, size: 1 }))
    );
    assert_eq!(scene.transform_of(node), None);
}

#[test]
fn pool_families_report_handle_assignment() {
    assert!(AutoPools::AUTO_ASSIGNS_HANDLES);
    assert!(!ExplicitPools::AUTO_ASSIGNS_HANDLES);
}

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "needs a caller-supplied node handle")]
fn explicit_memory_scene_requires_node_handle() {
    let mut scene = TransformationCachedSceneWithExplicitMemory::default();
    scene.preallocate_scene_size(&SceneSizeInformation { node_count: 4, ..Default::default() });
    scene.allocate_node(0, None);
}

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "needs a caller-supplied transform handle")]
fn explicit_memory_scene_requires_transform_handle() {
    let mut scene = TransformationCachedSceneWithExplicitMemory::default();
    scene.preallocate_scene_size(&SceneSizeInformation { node_count: 1, transform_count: 1, ..Default::default() });
    let node = scene.allocate_node(0, Some(NodeHandle::new(0)));
    scene.allocate_transform(node, None);
}

#[test]
fn shared_scene_behind_mutex() {
    init_logger();
    let Chain { scene, nodes: [_, _, b], transforms: [root_t, ..] } = translated_chain();
    let shared = Arc::new(Mutex::new(scene));

    let writer = {
        let shared = Arc::clone(&shared);
        thread::spawn(move || {
            for step in 1..=10 {
                shared.lock().set_translation(root_t, Vec3::new(step as f32, 0.0, 0.0));
            }
        })
    };
    writer.join().expect("writer thread panicked");

    let world = shared.lock().update_matrix_cache(MatrixType::World, b);
    assert!(translation_of(world).abs_diff_eq(Vec3::new(10.0, 1.0, 1.0), EPSILON));
}
