use super::*;
use glam::{Mat4, Vec3};
use slotmap::KeyData;
use crate::graphics_device::{BufferKey, PipelineKey};
use crate::render_queue::{GeometryHandle, MaterialRef};
use crate::rendering::LightData;

fn renderable(name: &str) -> Renderable {
    Renderable::new(
        name,
        MaterialRef { id: 1, pipeline: PipelineKey::from(KeyData::from_ffi(1)) },
        GeometryHandle {
            vertex_buffer: BufferKey::from(KeyData::from_ffi(1)),
            index_buffer: None,
            element_count: 3,
            first_element: 0,
            vertex_offset: 0,
        },
    )
}

// ============================================================================
// Scene
// ============================================================================

#[test]
fn test_add_get_remove() {
    let mut scene = Scene::new();
    let a = scene.add(renderable("a"));
    let b = scene.add(renderable("b"));
    assert_eq!(scene.len(), 2);
    assert_eq!(scene.get(a).unwrap().name, "a");

    assert_eq!(scene.remove(a).unwrap().name, "a");
    assert!(scene.get(a).is_none());
    assert!(scene.remove(a).is_none());
    assert_eq!(scene.get(b).unwrap().name, "b");
}

#[test]
fn test_stale_key_after_slot_reuse() {
    let mut scene = Scene::new();
    let a = scene.add(renderable("a"));
    scene.remove(a);
    let c = scene.add(renderable("c"));
    assert!(scene.get(a).is_none());
    assert_eq!(scene.get(c).unwrap().name, "c");
}

#[test]
fn test_for_each_renderable_visits_all() {
    let mut scene = Scene::new();
    scene.add(renderable("a"));
    scene.add(renderable("b").with_queue(3000));
    let mut seen = Vec::new();
    scene.for_each_renderable(&mut |r| seen.push(r.name.clone()));
    seen.sort();
    assert_eq!(seen, vec!["a", "b"]);
}

#[test]
fn test_lighting_access() {
    let mut scene = Scene::new();
    scene.lighting_mut().add_light(LightData::directional(Vec3::NEG_Y, Vec3::ONE, 1.0));
    assert_eq!(RenderScene::lighting(&scene).lights().len(), 1);
}

// ============================================================================
// Renderable
// ============================================================================

#[test]
fn test_renderable_defaults() {
    let r = renderable("r");
    assert_eq!(r.queue_id, crate::render_queue::RenderQueueId::OPAQUE);
    assert!(r.visible);
    assert!(r.cast_shadows);
    assert_eq!(r.world_matrix, Mat4::IDENTITY);
}

#[test]
fn test_world_bounds_follow_transform_and_scale() {
    let r = renderable("r")
        .with_bounds(Vec3::new(1.0, 0.0, 0.0), 2.0)
        .with_transform(Mat4::from_scale_rotation_translation(
            Vec3::new(1.0, 3.0, 1.0),
            glam::Quat::IDENTITY,
            Vec3::new(0.0, 0.0, -10.0),
        ));
    let (center, radius) = r.world_bounds();
    assert!((center - Vec3::new(1.0, 0.0, -10.0)).length() < 1e-5);
    assert_eq!(radius, 6.0);
}
