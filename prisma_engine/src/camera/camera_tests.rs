use glam::{Mat4, Vec3};
use crate::graphics_device::{Rect2D, Viewport};
use super::*;

fn test_camera() -> Camera {
    Camera::perspective(
        Vec3::new(0.0, 0.0, 5.0),
        Vec3::ZERO,
        Vec3::Y,
        std::f32::consts::FRAC_PI_4,
        16.0 / 9.0,
        0.1,
        100.0,
        Viewport::from_size(1920, 1080),
    )
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_camera_perspective() {
    let camera = test_camera();
    let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
    let proj = Mat4::perspective_rh(std::f32::consts::FRAC_PI_4, 16.0 / 9.0, 0.1, 100.0);

    assert_eq!(*camera.view_matrix(), view);
    assert_eq!(*camera.projection_matrix(), proj);
    assert_eq!(camera.view_projection_matrix(), proj * view);
    assert_eq!(camera.near(), 0.1);
    assert_eq!(camera.far(), 100.0);
    assert_eq!(camera.viewport().width, 1920.0);
    assert!(camera.scissor().is_none());
}

#[test]
fn test_position_derived_from_view() {
    let camera = test_camera();
    assert!((camera.position() - Vec3::new(0.0, 0.0, 5.0)).length() < 1e-5);
}

#[test]
fn test_frustum_derived_from_matrices() {
    let camera = test_camera();
    let expected = Frustum::from_view_projection(&camera.view_projection_matrix());
    assert_eq!(*camera.frustum(), expected);
}

// ============================================================================
// view_depth
// ============================================================================

#[test]
fn test_view_depth_is_signed() {
    let camera = test_camera();
    assert!((camera.view_depth(Vec3::ZERO) - 5.0).abs() < 1e-5);
    assert!((camera.view_depth(Vec3::new(3.0, 2.0, 0.0)) - 5.0).abs() < 1e-5);
    assert!((camera.view_depth(Vec3::new(0.0, 0.0, 8.0)) + 3.0).abs() < 1e-5);
}

// ============================================================================
// Setters
// ============================================================================

#[test]
fn test_set_matrices_keeps_scissor_and_viewport() {
    let mut camera = test_camera();
    camera.set_scissor(Some(Rect2D { x: 10, y: 10, width: 100, height: 100 }));
    let view = Mat4::look_at_rh(Vec3::new(0.0, 10.0, 0.0), Vec3::ZERO, Vec3::Z);
    camera.set_matrices(view, *camera.projection_matrix(), 0.5, 50.0);

    assert!((camera.position() - Vec3::new(0.0, 10.0, 0.0)).length() < 1e-4);
    assert_eq!(camera.near(), 0.5);
    assert_eq!(camera.scissor().unwrap().width, 100);
    assert_eq!(camera.viewport().height, 1080.0);
}

#[test]
fn test_effective_scissor_defaults_to_viewport() {
    let mut camera = test_camera();
    let effective = camera.effective_scissor();
    assert_eq!(effective, Rect2D { x: 0, y: 0, width: 1920, height: 1080 });

    let custom = Rect2D { x: 100, y: 50, width: 800, height: 600 };
    camera.set_scissor(Some(custom));
    assert_eq!(camera.effective_scissor(), custom);
}
