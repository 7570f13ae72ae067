//! Unit tests for Engine
//!
//! The frame loop is driven against the mock device, whose state is shared
//! between clones so the test keeps a handle for scripting and inspection.
//! Tests touching the global logger are marked #[serial].

use super::*;
use std::sync::{Arc, Mutex};
use glam::Vec3;
use serial_test::serial;
use crate::graphics_device::mock_graphics_device::MockGraphicsDevice;
use crate::graphics_device::{AcquireResult, PresentResult};
use crate::passes::test_support::camera;
use crate::scene::Scene;

// ============================================================================
// TEST HELPERS
// ============================================================================

/// Test logger that captures log entries for verification
struct TestLogger {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Logger for TestLogger {
    fn log(&self, entry: &LogEntry) {
        let mut entries = self.entries.lock().unwrap();
        entries.push(format!("{:?}: {}", entry.severity, entry.message));
    }
}

const WINDOW: Extent2D = Extent2D { width: 800, height: 600 };

/// Engine over a mock device with every core pipeline registered
fn engine() -> (Engine, MockGraphicsDevice) {
    let mock = MockGraphicsDevice::new();
    let mut engine = Engine::new(Box::new(mock.clone()), WINDOW, Config::default()).unwrap();
    for name in ["lit", "shadow_depth", "skybox_cubemap"] {
        let key = mock.register_pipeline(name);
        engine.renderer_mut().resource_manager_mut().register_pipeline(name, key).unwrap();
    }
    (engine, mock)
}

fn frame(index: u64) -> FrameContext {
    FrameContext::new(0.016, index, index as f64 * 0.016)
}

fn submits(mock: &MockGraphicsDevice) -> u64 {
    mock.state().submits
}

// ============================================================================
// CREATION
// ============================================================================

#[test]
fn test_new_creates_chain_and_sync_objects() {
    let (engine, mock) = engine();
    assert!(engine.swapchain().state().is_some());
    assert_eq!(mock.live_swapchains(), 1);
    assert_eq!(mock.live_fences(), 1);
    assert_eq!(mock.live_semaphores(), 2);
    assert!(!engine.renderer().is_initialized());
}

#[test]
fn test_new_fails_without_surface_formats() {
    let mock = MockGraphicsDevice::new();
    let mut caps = crate::graphics_device::mock_graphics_device::default_surface_capabilities();
    caps.formats.clear();
    mock.set_surface_capabilities(caps);

    let result = Engine::new(Box::new(mock.clone()), WINDOW, Config::default());
    assert!(matches!(result, Err(Error::InitializationFailed(_))));
}

#[test]
fn test_new_releases_swapchain_when_sync_fails() {
    let mock = MockGraphicsDevice::new();
    mock.fail_on("create_fence");

    let result = Engine::new(Box::new(mock.clone()), WINDOW, Config::default());
    assert!(matches!(result, Err(Error::InitializationFailed(_))));
    assert_eq!(mock.live_swapchains(), 0);
}

// ============================================================================
// FRAME LOOP
// ============================================================================

#[test]
fn test_render_frame_presents() {
    let (mut engine, mock) = engine();
    let scene = Scene::new();

    let outcome = engine.render_frame(&scene, &camera(), &frame(0)).unwrap();
    assert_eq!(outcome, FrameOutcome::Presented { recreated: false });
    assert!(engine.renderer().is_initialized());
    assert_eq!(submits(&mock), 1);
    assert_eq!(mock.count_events("present 0"), 1);
    assert_eq!(engine.last_report().unwrap().frame_index, 0);
    assert_eq!(engine.frame_sync().frames_presented(), 1);

    // The fence of frame 0 is waited before frame 1 reuses the command list
    engine.render_frame(&scene, &camera(), &frame(1)).unwrap();
    assert_eq!(mock.count_events("wait_fence"), 2);
    assert_eq!(mock.count_events("present 1"), 1);
}

#[test]
fn test_acquire_out_of_date_skips_and_recreates_once() {
    let (mut engine, mock) = engine();
    let scene = Scene::new();
    mock.push_acquire_result(AcquireResult::OutOfDate);

    let outcome = engine.render_frame(&scene, &camera(), &frame(0)).unwrap();
    assert_eq!(outcome, FrameOutcome::Skipped);
    assert_eq!(engine.swapchain().recreate_count(), 1);
    assert_eq!(submits(&mock), 0);
    assert!(engine.last_report().is_none());

    let outcome = engine.render_frame(&scene, &camera(), &frame(1)).unwrap();
    assert_eq!(outcome, FrameOutcome::Presented { recreated: false });
    assert_eq!(engine.swapchain().recreate_count(), 1);
}

#[test]
fn test_present_out_of_date_recreates() {
    let (mut engine, mock) = engine();
    mock.push_present_result(Ok(PresentResult::OutOfDate));

    let outcome = engine.render_frame(&Scene::new(), &camera(), &frame(0)).unwrap();
    assert_eq!(outcome, FrameOutcome::Presented { recreated: true });
    assert_eq!(engine.swapchain().recreate_count(), 1);
    assert_eq!(submits(&mock), 1);
}

#[test]
fn test_suboptimal_acquire_recreates_after_present() {
    let (mut engine, mock) = engine();
    mock.push_acquire_result(AcquireResult::Acquired { image_index: 0, suboptimal: true });

    let outcome = engine.render_frame(&Scene::new(), &camera(), &frame(0)).unwrap();
    assert_eq!(outcome, FrameOutcome::Presented { recreated: true });
    assert_eq!(mock.count_events("present 0"), 1);
    assert_eq!(engine.swapchain().recreate_count(), 1);
}

#[test]
fn test_present_failure_drops_frame_and_loop_continues() {
    let (mut engine, mock) = engine();
    let scene = Scene::new();
    mock.push_present_result(Err(Error::BackendError("lost surface".to_string())));

    assert_eq!(engine.render_frame(&scene, &camera(), &frame(0)).unwrap(), FrameOutcome::Dropped);
    assert_eq!(
        engine.render_frame(&scene, &camera(), &frame(1)).unwrap(),
        FrameOutcome::Presented { recreated: false }
    );
}

#[test]
fn test_render_failure_drops_frame_without_submit() {
    let (mut engine, mock) = engine();
    let scene = Scene::new();
    engine.render_frame(&scene, &camera(), &frame(0)).unwrap();

    mock.fail_on("blit_texture");
    let before = submits(&mock);
    assert_eq!(engine.render_frame(&scene, &camera(), &frame(2)).unwrap(), FrameOutcome::Dropped);
    assert_eq!(submits(&mock), before);
    // The aborted frame released its semaphore and fence
    assert_eq!(mock.count_events("signal"), 1);

    mock.clear_failures();
    assert!(matches!(
        engine.render_frame(&scene, &camera(), &frame(3)).unwrap(),
        FrameOutcome::Presented { .. }
    ));
}

#[test]
fn test_submit_failure_is_returned() {
    let (mut engine, mock) = engine();
    mock.fail_on("submit");
    assert!(engine.render_frame(&Scene::new(), &camera(), &frame(0)).is_err());
}

// ============================================================================
// RESIZE
// ============================================================================

#[test]
fn test_resize_rebuilds_chain_and_targets() {
    let (mut engine, mock) = engine();
    let scene = Scene::new();
    engine.render_frame(&scene, &camera(), &frame(0)).unwrap();

    mock.set_surface_extent(Some(Extent2D::new(1024, 768)));
    engine.notify_resize(1024, 768);
    engine.render_frame(&scene, &camera(), &frame(1)).unwrap();

    assert_eq!(engine.swapchain().recreate_count(), 1);
    assert_eq!(engine.swapchain().state().unwrap().extent(), Extent2D::new(1024, 768));
    assert_eq!(engine.renderer().render_target_size(), Some(Extent2D::new(1024, 768)));
}

#[test]
fn test_same_size_resize_is_ignored() {
    let (mut engine, _mock) = engine();
    engine.notify_resize(WINDOW.width, WINDOW.height);
    engine.render_frame(&Scene::new(), &camera(), &frame(0)).unwrap();
    assert_eq!(engine.swapchain().recreate_count(), 0);
}

#[test]
fn test_minimized_window_suspends_until_restored() {
    let (mut engine, mock) = engine();
    let scene = Scene::new();

    mock.set_surface_extent(Some(Extent2D::new(0, 0)));
    engine.notify_resize(0, 0);
    assert_eq!(engine.render_frame(&scene, &camera(), &frame(0)).unwrap(), FrameOutcome::Skipped);
    assert!(engine.is_suspended());
    assert_eq!(engine.render_frame(&scene, &camera(), &frame(1)).unwrap(), FrameOutcome::Skipped);
    assert_eq!(submits(&mock), 0);

    mock.set_surface_extent(Some(WINDOW));
    engine.notify_resize(WINDOW.width, WINDOW.height);
    assert_eq!(
        engine.render_frame(&scene, &camera(), &frame(2)).unwrap(),
        FrameOutcome::Presented { recreated: false }
    );
    assert!(!engine.is_suspended());
}

// ============================================================================
// SHUTDOWN
// ============================================================================

#[test]
fn test_shutdown_is_idempotent_and_releases_everything() {
    let (mut engine, mock) = engine();
    let mut scene = Scene::new();
    scene.lighting_mut().add_light(crate::rendering::LightData::directional(-Vec3::Y, Vec3::ONE, 1.0));
    engine.render_frame(&scene, &camera(), &frame(0)).unwrap();

    engine.shutdown();
    assert!(engine.is_shut_down());
    assert_eq!(mock.live_swapchains(), 0);
    assert_eq!(mock.live_fences(), 0);
    assert_eq!(mock.live_semaphores(), 0);
    assert_eq!(mock.stats().live_textures, 0);

    mock.clear_events();
    engine.shutdown();
    assert!(mock.events().is_empty());
    assert!(matches!(
        engine.render_frame(&scene, &camera(), &frame(1)),
        Err(Error::InvalidState(_))
    ));
}

#[test]
fn test_drop_shuts_down() {
    let (engine, mock) = engine();
    drop(engine);
    assert_eq!(mock.live_swapchains(), 0);
    assert_eq!(mock.live_fences(), 0);
}

// ============================================================================
// LOGGING
// ============================================================================

#[test]
#[serial]
fn test_custom_logger_receives_engine_messages() {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(TestLogger { entries: entries.clone() });

    crate::engine_info!("prisma::test", "hello {}", 42);
    crate::engine_error!("prisma::test", "broken");

    Engine::reset_logger();
    let entries = entries.lock().unwrap();
    assert!(entries.contains(&"Info: hello 42".to_string()));
    assert!(entries.contains(&"Error: broken".to_string()));
}

#[test]
#[serial]
fn test_reset_logger_detaches_custom_logger() {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(TestLogger { entries: entries.clone() });
    Engine::reset_logger();

    Engine::log(LogSeverity::Info, "prisma::test", "not captured".to_string());
    assert!(!entries.lock().unwrap().iter().any(|e| e.contains("not captured")));
}

/// Feature that never gets its resources
struct RefusingFeature;

impl crate::render_feature::RenderFeature for RefusingFeature {
    fn name(&self) -> &str {
        "RefusingOverlay"
    }

    fn pass_event(&self) -> crate::render_feature::RenderPassEvent {
        crate::render_feature::RenderPassEvent::AfterRendering
    }

    fn initialize(&mut self, _setup: &mut crate::renderer::SetupContext) -> bool {
        false
    }

    fn execute(
        &mut self,
        _ctx: &mut dyn crate::renderer::RenderContext,
        _data: &crate::rendering::RenderingData,
    ) -> Result<()> {
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

#[test]
#[serial]
fn test_feature_disabled_warning_logged_once_across_resizes() {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(TestLogger { entries: entries.clone() });

    let (mut engine, mock) = engine();
    engine.renderer_mut().add_feature(Box::new(RefusingFeature)).unwrap();
    let scene = Scene::new();
    engine.render_frame(&scene, &camera(), &frame(0)).unwrap();

    mock.set_surface_extent(Some(Extent2D::new(1024, 768)));
    engine.notify_resize(1024, 768);
    engine.render_frame(&scene, &camera(), &frame(1)).unwrap();

    Engine::reset_logger();
    let warning = "Warn: Feature 'RefusingOverlay' failed to initialize, disabled".to_string();
    let entries = entries.lock().unwrap();
    assert_eq!(entries.iter().filter(|e| **e == warning).count(), 1);
}

#[test]
#[serial]
fn test_suspension_and_dropped_frame_are_logged() {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(TestLogger { entries: entries.clone() });

    let (mut engine, mock) = engine();
    let scene = Scene::new();
    mock.set_surface_extent(Some(Extent2D::new(0, 0)));
    engine.notify_resize(0, 0);
    engine.render_frame(&scene, &camera(), &frame(0)).unwrap();

    mock.set_surface_extent(Some(WINDOW));
    engine.notify_resize(WINDOW.width, WINDOW.height);
    mock.fail_on("blit_texture");
    assert_eq!(engine.render_frame(&scene, &camera(), &frame(7)).unwrap(), FrameOutcome::Dropped);

    Engine::reset_logger();
    let entries = entries.lock().unwrap();
    assert!(entries.contains(&"Info: Rendering suspended: window has no area".to_string()));
    assert!(entries.iter().any(|e| e.starts_with("Error: Final blit failed")));
    assert!(entries.iter().any(|e| e.starts_with("Warn: Frame 7 dropped")));
}
