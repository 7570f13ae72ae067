//! Integration tests for render queue classification and sorting
//!
//! Only the public API is used. No GPU required.
//!
//! Run with: cargo test --test render_queue_integration_tests

use glam::{Mat4, Vec3};
use prisma_engine::prisma::device::{BufferKey, DepthState, PipelineKey, StencilState};
use prisma_engine::prisma::queue::{
    calculate_sort_key, distance_key, GeometryHandle, MaterialRef, QueueBand, QueueRange,
    RenderObject, RenderQueue, RenderQueueId, RenderQueueManager, SortMode,
};

// ============================================================================
// HELPERS
// ============================================================================

fn object(name: &str, queue_id: u32, distance: f32, material_id: u32) -> RenderObject {
    RenderObject {
        name: name.to_string(),
        world_matrix: Mat4::IDENTITY,
        bounds_center: Vec3::ZERO,
        bounds_radius: 1.0,
        material: MaterialRef { id: material_id, pipeline: PipelineKey::default() },
        geometry: GeometryHandle {
            vertex_buffer: BufferKey::default(),
            index_buffer: None,
            element_count: 3,
            first_element: 0,
            vertex_offset: 0,
        },
        sub_mesh_index: 0,
        queue_id,
        depth_state: DepthState::default(),
        stencil_state: StencilState::default(),
        distance_to_camera: distance,
        cast_shadows: true,
    }
}

fn names(queue: &RenderQueue) -> Vec<&str> {
    queue.objects().iter().map(|o| o.name.as_str()).collect()
}

// ============================================================================
// CLASSIFICATION
// ============================================================================

#[test]
fn test_integration_objects_routed_by_band() {
    let mut manager = RenderQueueManager::new();
    manager.add_object(object("sky", RenderQueueId::BACKGROUND, 100.0, 0));
    manager.add_object(object("wall", RenderQueueId::OPAQUE, 5.0, 1));
    manager.add_object(object("decal", RenderQueueId::OPAQUE + 100, 4.0, 1));
    manager.add_object(object("fence", RenderQueueId::ALPHA_TEST, 3.0, 2));
    manager.add_object(object("glass", RenderQueueId::TRANSPARENT, 2.0, 3));
    manager.add_object(object("hud", RenderQueueId::OVERLAY + 10, 0.0, 4));

    assert_eq!(names(manager.band(QueueBand::Background)), vec!["sky"]);
    assert_eq!(names(manager.band(QueueBand::Opaque)), vec!["wall", "decal"]);
    assert_eq!(names(manager.band(QueueBand::AlphaTest)), vec!["fence"]);
    assert_eq!(names(manager.band(QueueBand::Transparent)), vec!["glass"]);
    assert_eq!(names(manager.band(QueueBand::Overlay)), vec!["hud"]);

    let stats = manager.stats();
    assert_eq!(stats.total, 6);
    assert_eq!(stats.opaque, 2);
    assert_eq!(stats.custom, 0);
}

#[test]
fn test_integration_custom_queue_takes_exact_id() {
    let mut manager = RenderQueueManager::new();
    manager.create_queue(2100, "Terrain").unwrap();

    manager.add_object(object("terrain", 2100, 10.0, 0));
    manager.add_object(object("rock", 2101, 10.0, 0));

    assert_eq!(manager.queue(2100).map(|q| q.len()), Some(1));
    assert_eq!(names(manager.band(QueueBand::Opaque)), vec!["rock"]);
    assert_eq!(manager.stats().custom, 1);
    assert_eq!(manager.queue(2100).map(|q| q.sort_mode()), Some(SortMode::FrontToBack));

    // Predefined and duplicate ids are refused
    assert!(manager.create_queue(RenderQueueId::OPAQUE, "Opaque2").is_err());
    assert!(manager.create_queue(2100, "Terrain2").is_err());
}

#[test]
fn test_integration_dispatch_order_bands_then_custom_by_id() {
    let mut manager = RenderQueueManager::new();
    manager.create_queue(4500, "Late").unwrap();
    manager.create_queue(1500, "Early").unwrap();

    let ids: Vec<u32> = manager.dispatch_order().map(|q| q.id()).collect();
    assert_eq!(ids, vec![1000, 2000, 2450, 3000, 4000, 1500, 4500]);
    assert_eq!(manager.queue_count(), 7);

    let opaque_ids: Vec<u32> = manager.queues_in_range(QueueRange::OPAQUES).map(|q| q.id()).collect();
    assert_eq!(opaque_ids, vec![1000, 2000, 2450, 1500]);
}

#[test]
fn test_integration_clear_keeps_custom_queues() {
    let mut manager = RenderQueueManager::new();
    manager.create_queue(3500, "Particles").unwrap();
    manager.add_object(object("spark", 3500, 1.0, 0));
    manager.add_object(object("wall", RenderQueueId::OPAQUE, 1.0, 0));

    manager.clear();
    assert_eq!(manager.object_count(), 0);
    assert!(manager.queue(3500).is_some());
}

// ============================================================================
// SORTING
// ============================================================================

#[test]
fn test_integration_opaque_front_to_back_transparent_back_to_front() {
    let mut manager = RenderQueueManager::new();
    for (name, distance) in [("mid", 5.0), ("near", 1.0), ("far", 9.0)] {
        manager.add_object(object(name, RenderQueueId::OPAQUE, distance, 0));
        manager.add_object(object(name, RenderQueueId::TRANSPARENT, distance, 0));
    }
    manager.sort_all();

    assert_eq!(names(manager.band(QueueBand::Opaque)), vec!["near", "mid", "far"]);
    assert_eq!(names(manager.band(QueueBand::Transparent)), vec!["far", "mid", "near"]);
}

#[test]
fn test_integration_none_mode_keeps_insertion_order() {
    let mut queue = RenderQueue::new(RenderQueueId::OVERLAY, "Overlay", SortMode::None);
    queue.add_object(object("b", RenderQueueId::OVERLAY, 1.0, 0));
    queue.add_object(object("a", RenderQueueId::OVERLAY, 0.5, 0));
    queue.add_object(object("c", RenderQueueId::OVERLAY, 2.0, 0));
    queue.sort();

    assert_eq!(names(&queue), vec!["b", "a", "c"]);
}

#[test]
fn test_integration_equal_distances_are_stable() {
    let mut queue = RenderQueue::new(RenderQueueId::OPAQUE, "Opaque", SortMode::FrontToBack);
    for name in ["first", "second", "third"] {
        queue.add_object(object(name, RenderQueueId::OPAQUE, 3.0, 0));
    }
    queue.add_object(object("closer", RenderQueueId::OPAQUE, 1.0, 0));
    queue.sort();

    assert_eq!(names(&queue), vec!["closer", "first", "second", "third"]);
}

#[test]
fn test_integration_material_then_distance() {
    let mut queue = RenderQueue::new(2200, "Grouped", SortMode::MaterialThenDistance);
    queue.add_object(object("m2_near", 2200, 1.0, 2));
    queue.add_object(object("m1_far", 2200, 8.0, 1));
    queue.add_object(object("m1_near", 2200, 2.0, 1));
    queue.add_object(object("m2_far", 2200, 7.0, 2));
    queue.sort();

    assert_eq!(names(&queue), vec!["m1_near", "m1_far", "m2_near", "m2_far"]);
    assert!(queue.is_sorted());
}

#[test]
fn test_integration_objects_behind_camera_sort_first() {
    let mut queue = RenderQueue::new(RenderQueueId::OPAQUE, "Opaque", SortMode::FrontToBack);
    queue.add_object(object("ahead", RenderQueueId::OPAQUE, 2.0, 0));
    queue.add_object(object("behind", RenderQueueId::OPAQUE, -2.0, 0));
    queue.add_object(object("at_eye", RenderQueueId::OPAQUE, 0.0, 0));
    queue.sort();

    assert_eq!(names(&queue), vec!["behind", "at_eye", "ahead"]);
}

// ============================================================================
// SORT KEYS
// ============================================================================

#[test]
fn test_integration_distance_key_preserves_float_order() {
    let values = [f32::NEG_INFINITY, -10.0, -0.5, 0.0, 0.25, 1.0, 1000.0, f32::INFINITY];
    for pair in values.windows(2) {
        assert!(distance_key(pair[0]) < distance_key(pair[1]), "{} vs {}", pair[0], pair[1]);
    }
}

#[test]
fn test_integration_composite_key_layout() {
    let o = object("o", RenderQueueId::OPAQUE, 4.0, 7);
    let key = calculate_sort_key(&o, SortMode::MaterialThenDistance);

    assert_eq!(key >> 32, 7);
    assert_eq!(key & 0xFFFF_FFFF, distance_key(4.0) as u64);
    assert_eq!(calculate_sort_key(&o, SortMode::ByMaterial), 7);
    assert_eq!(calculate_sort_key(&o, SortMode::None), 0);
}
