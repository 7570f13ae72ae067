use super::*;
use crate::graphics_device::mock_graphics_device::MockGraphicsDevice;
use crate::graphics_device::{
    ColorSpace, Extent2D, PresentMode, SurfaceFormat, SwapchainDesc, TextureFormat,
};

fn setup() -> (MockGraphicsDevice, FrameSyncController, SwapchainKey) {
    let mut device = MockGraphicsDevice::new();
    let chain = device.create_swapchain(&SwapchainDesc {
        surface_format: SurfaceFormat::new(TextureFormat::B8G8R8A8_SRGB, ColorSpace::SrgbNonlinear),
        present_mode: PresentMode::Fifo,
        extent: Extent2D::new(800, 600),
        image_count: 3,
    }).unwrap();
    let controller = FrameSyncController::new(&mut device, u64::MAX).unwrap();
    device.clear_events();
    (device, controller, chain.swapchain)
}

fn run_frame(
    device: &mut MockGraphicsDevice,
    controller: &mut FrameSyncController,
    swapchain: SwapchainKey,
) -> PresentOutcome {
    match controller.acquire(device, swapchain).unwrap() {
        AcquireOutcome::Acquired { .. } => {}
        AcquireOutcome::SkipFrame => panic!("unexpected skip"),
    }
    controller.begin_recording().unwrap();
    controller.submit(device).unwrap();
    controller.present(device, swapchain)
}

// ============================================================================
// Happy path
// ============================================================================

#[test]
fn test_full_cycle_order() {
    let (mut device, mut controller, swapchain) = setup();

    assert_eq!(run_frame(&mut device, &mut controller, swapchain), PresentOutcome::Presented);
    assert_eq!(controller.state(), FrameState::Idle);
    assert_eq!(
        device.events(),
        vec!["wait_fence", "acquire", "reset_fence", "cmd:begin", "cmd:end", "submit", "present 0"]
    );
    assert_eq!(controller.frames_presented(), 1);
}

#[test]
fn test_fence_wait_precedes_every_recording() {
    let (mut device, mut controller, swapchain) = setup();
    for _ in 0..4 {
        run_frame(&mut device, &mut controller, swapchain);
    }

    let events = device.events();
    let mut waited = false;
    for event in &events {
        match event.as_str() {
            "wait_fence" => waited = true,
            "cmd:begin" => {
                assert!(waited, "recording started without a fence wait: {:?}", events);
                waited = false;
            }
            _ => {}
        }
    }
    assert_eq!(device.count_events("submit"), 4);
}

#[test]
fn test_submit_waits_and_signals() {
    let (mut device, mut controller, swapchain) = setup();
    let sync = controller.sync_objects().unwrap();
    controller.acquire(&mut device, swapchain).unwrap();
    assert_eq!(device.fence_signaled(sync.in_flight), Some(false));
    controller.begin_recording().unwrap();
    controller.submit(&mut device).unwrap();
    assert_eq!(device.fence_signaled(sync.in_flight), Some(true));
    assert_eq!(controller.state(), FrameState::Presenting);
}

// ============================================================================
// Transient conditions
// ============================================================================

#[test]
fn test_out_of_date_acquire_skips_without_touching_fence() {
    let (mut device, mut controller, swapchain) = setup();
    let sync = controller.sync_objects().unwrap();
    device.push_acquire_result(AcquireResult::OutOfDate);

    let outcome = controller.acquire(&mut device, swapchain).unwrap();
    assert_eq!(outcome, AcquireOutcome::SkipFrame);
    assert_eq!(controller.state(), FrameState::Idle);
    assert_eq!(device.fence_signaled(sync.in_flight), Some(true));
    assert!(controller.begin_recording().is_err());
    assert_eq!(device.count_events("submit"), 0);

    // The next frame proceeds normally
    assert_eq!(run_frame(&mut device, &mut controller, swapchain), PresentOutcome::Presented);
}

#[test]
fn test_suboptimal_acquire_requests_recreate_after_present() {
    let (mut device, mut controller, swapchain) = setup();
    device.push_acquire_result(AcquireResult::Acquired { image_index: 0, suboptimal: true });

    controller.acquire(&mut device, swapchain).unwrap();
    assert!(controller.recreate_pending());
    controller.begin_recording().unwrap();
    controller.submit(&mut device).unwrap();
    assert_eq!(controller.present(&mut device, swapchain), PresentOutcome::NeedsRecreate);
    assert!(!controller.recreate_pending());
}

#[test]
fn test_present_out_of_date_and_suboptimal() {
    let (mut device, mut controller, swapchain) = setup();
    device.push_present_result(Ok(PresentResult::OutOfDate));
    assert_eq!(run_frame(&mut device, &mut controller, swapchain), PresentOutcome::NeedsRecreate);
    device.push_present_result(Ok(PresentResult::Suboptimal));
    assert_eq!(run_frame(&mut device, &mut controller, swapchain), PresentOutcome::NeedsRecreate);
}

#[test]
fn test_present_failure_drops_frame_and_loop_continues() {
    let (mut device, mut controller, swapchain) = setup();
    device.push_present_result(Err(Error::BackendError("device hiccup".to_string())));
    assert!(matches!(
        run_frame(&mut device, &mut controller, swapchain),
        PresentOutcome::Failed(_)
    ));
    assert_eq!(controller.state(), FrameState::Idle);
    assert_eq!(run_frame(&mut device, &mut controller, swapchain), PresentOutcome::Presented);
}

// ============================================================================
// Protocol misuse & recovery
// ============================================================================

#[test]
fn test_out_of_order_calls_are_rejected() {
    let (mut device, mut controller, swapchain) = setup();
    assert!(controller.begin_recording().is_err());
    assert!(controller.submit(&mut device).is_err());
    assert!(matches!(controller.present(&mut device, swapchain), PresentOutcome::Failed(_)));

    controller.acquire(&mut device, swapchain).unwrap();
    assert!(matches!(controller.acquire(&mut device, swapchain), Err(Error::InvalidState(_))));
    assert!(controller.submit(&mut device).is_err());
}

#[test]
fn test_abort_frame_rearms_fence() {
    let (mut device, mut controller, swapchain) = setup();
    let sync = controller.sync_objects().unwrap();

    controller.acquire(&mut device, swapchain).unwrap();
    controller.begin_recording().unwrap();
    controller.abort_frame(&mut device);

    assert_eq!(controller.state(), FrameState::Idle);
    assert_eq!(device.fence_signaled(sync.in_flight), Some(true));
    assert_eq!(device.count_events("signal"), 1);
    assert_eq!(device.count_events_prefixed("present"), 0);

    assert_eq!(run_frame(&mut device, &mut controller, swapchain), PresentOutcome::Presented);
}

#[test]
fn test_submit_failure_aborts_cleanly() {
    let (mut device, mut controller, swapchain) = setup();
    controller.acquire(&mut device, swapchain).unwrap();
    controller.begin_recording().unwrap();
    device.fail_on("submit");
    assert!(controller.submit(&mut device).is_err());
    assert_eq!(controller.state(), FrameState::Idle);

    device.clear_failures();
    assert_eq!(run_frame(&mut device, &mut controller, swapchain), PresentOutcome::Presented);
}

#[test]
fn test_destroy_is_idempotent() {
    let (mut device, mut controller, swapchain) = setup();
    run_frame(&mut device, &mut controller, swapchain);
    let fences = device.live_fences();
    let semaphores = device.live_semaphores();

    controller.destroy(&mut device);
    controller.destroy(&mut device);
    assert_eq!(device.live_fences(), fences - 1);
    assert_eq!(device.live_semaphores(), semaphores - 2);
    assert!(controller.acquire(&mut device, swapchain).is_err());
}

#[test]
fn test_creation_failure_is_fatal_and_leak_free() {
    let mut device = MockGraphicsDevice::new();
    device.fail_on("create_command_list");
    let result = FrameSyncController::new(&mut device, u64::MAX);
    assert!(matches!(result, Err(Error::InitializationFailed(_))));
    assert_eq!(device.live_fences(), 0);
    assert_eq!(device.live_semaphores(), 0);
}
