/// Tests for CameraTargets

use super::*;
use crate::graphics_device::mock_graphics_device::MockGraphicsDevice;

#[test]
fn test_create_targets() {
    let mut device = MockGraphicsDevice::new();
    let targets = CameraTargets::create(&mut device, Extent2D::new(1280, 720)).unwrap();

    assert_eq!(targets.extent(), Extent2D::new(1280, 720));
    assert_eq!(targets.color().format, CAMERA_COLOR_FORMAT);
    assert_eq!(targets.depth().format, CAMERA_DEPTH_FORMAT);
    assert_ne!(targets.clear_pass(), targets.load_pass());

    let color = device.texture_desc(targets.color().texture).unwrap();
    assert!(color.usage.contains(TextureUsage::TRANSFER_SRC));
    let stats = device.stats();
    assert_eq!(stats.live_textures, 2);
    assert_eq!(stats.live_render_passes, 2);
    assert_eq!(stats.live_framebuffers, 1);
}

#[test]
fn test_destroy_releases_everything() {
    let mut device = MockGraphicsDevice::new();
    let targets = CameraTargets::create(&mut device, Extent2D::new(64, 64)).unwrap();
    targets.destroy(&mut device);

    let stats = device.stats();
    assert_eq!(stats.live_textures, 0);
    assert_eq!(stats.live_render_passes, 0);
    assert_eq!(stats.live_framebuffers, 0);
}

#[test]
fn test_partial_failure_cleans_up() {
    let mut device = MockGraphicsDevice::new();
    device.fail_on("create_framebuffer");
    assert!(CameraTargets::create(&mut device, Extent2D::new(64, 64)).is_err());

    let stats = device.stats();
    assert_eq!(stats.live_textures, 0);
    assert_eq!(stats.live_render_passes, 0);
    assert_eq!(device.state().views.len(), 0);
}

#[test]
fn test_clear_values_order() {
    let values = CameraTargets::clear_values([0.1, 0.2, 0.3, 1.0]);
    assert_eq!(values[0], ClearValue::Color([0.1, 0.2, 0.3, 1.0]));
    assert_eq!(values[1], ClearValue::DepthStencil { depth: 1.0, stencil: 0 });
}
