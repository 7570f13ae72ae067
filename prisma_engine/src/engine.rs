/// Prisma Engine - owns the device and every per-frame subsystem
///
/// `Engine` is a plain value: the device, swapchain, frame synchronization,
/// renderer and clock live inside it and are torn down in reverse order by
/// `shutdown` (or on drop). The only process-wide state is the logger sink,
/// reachable through the associated functions `set_logger`, `log`, ...
///
/// # Example
///
/// ```no_run
/// use prisma_engine::prisma::{Engine, Config, FrameOutcome, Result};
/// use prisma_engine::prisma::camera::Camera;
/// use prisma_engine::prisma::device::{Extent2D, GraphicsDevice};
/// use prisma_engine::prisma::scene::Scene;
///
/// fn run(device: Box<dyn GraphicsDevice>, camera: &Camera) -> Result<()> {
///     let mut engine = Engine::new(device, Extent2D::new(1280, 720), Config::default())?;
///     let scene = Scene::new();
///     loop {
///         let frame = engine.next_frame();
///         if let FrameOutcome::Dropped = engine.render_frame(&scene, camera, &frame)? {
///             break;
///         }
///     }
///     engine.shutdown();
///     Ok(())
/// }
/// ```

use std::sync::{OnceLock, RwLock};
use std::time::SystemTime;
use crate::camera::Camera;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::frame::{AcquireOutcome, FrameClock, FrameContext, FrameSyncController, PresentOutcome};
use crate::graphics_device::{Extent2D, GraphicsDevice};
use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
use crate::passes::FrameTarget;
use crate::renderer::{BasicRenderer, FrameReport};
use crate::scene::RenderScene;
use crate::swapchain::{RecreateOutcome, SwapchainManager, SwapchainPreferences};
use crate::{engine_debug, engine_error, engine_info, engine_warn};

const SOURCE: &str = "prisma::Engine";

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

fn logger() -> &'static RwLock<Box<dyn Logger>> {
    LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger::default())))
}

/// What became of one `render_frame` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Submitted and handed to presentation; `recreated` when the swapchain
    /// was rebuilt afterwards
    Presented { recreated: bool },
    /// Nothing recorded: the chain was out of date or the window is minimized
    Skipped,
    /// Recording or presentation failed; the previous image stays on screen
    Dropped,
}

pub struct Engine {
    device: Box<dyn GraphicsDevice>,
    swapchain: SwapchainManager,
    frame_sync: FrameSyncController,
    renderer: BasicRenderer,
    clock: FrameClock,
    window_size: Extent2D,
    resize_pending: bool,
    suspended: bool,
    last_report: Option<FrameReport>,
    shut_down: bool,
}

impl Engine {
    /// Create the swapchain and frame sync objects on `device`
    ///
    /// The renderer is initialized lazily by the first `render_frame`, so
    /// pipelines and features can be registered in between.
    ///
    /// # Errors
    ///
    /// `InitializationFailed` when the swapchain or the sync objects cannot
    /// be created.
    pub fn new(mut device: Box<dyn GraphicsDevice>, window_size: Extent2D, config: Config) -> Result<Self> {
        let preferences = SwapchainPreferences {
            surface_format: config.preferred_surface_format,
            present_mode: config.preferred_present_mode,
        };
        let mut swapchain = SwapchainManager::create(device.as_mut(), window_size, preferences)?;
        let frame_sync = match FrameSyncController::new(device.as_mut(), config.fence_timeout_ns) {
            Ok(sync) => sync,
            Err(e) => {
                swapchain.destroy(device.as_mut());
                engine_error!(SOURCE, "Engine creation failed: {}", e);
                return Err(e);
            }
        };

        engine_info!(SOURCE, "Engine created for '{}'", config.app_name);
        Ok(Self {
            device,
            swapchain,
            frame_sync,
            renderer: BasicRenderer::new(config.renderer, config.temporary_pool_warn_threshold),
            clock: FrameClock::new(config.max_delta_time),
            window_size,
            resize_pending: false,
            suspended: false,
            last_report: None,
            shut_down: false,
        })
    }

    // ===== ACCESSORS =====

    pub fn device(&self) -> &dyn GraphicsDevice {
        self.device.as_ref()
    }

    pub fn device_mut(&mut self) -> &mut dyn GraphicsDevice {
        self.device.as_mut()
    }

    pub fn renderer(&self) -> &BasicRenderer {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut BasicRenderer {
        &mut self.renderer
    }

    pub fn swapchain(&self) -> &SwapchainManager {
        &self.swapchain
    }

    pub fn frame_sync(&self) -> &FrameSyncController {
        &self.frame_sync
    }

    pub fn frame_clock_mut(&mut self) -> &mut FrameClock {
        &mut self.clock
    }

    /// Report of the last frame that was recorded
    pub fn last_report(&self) -> Option<&FrameReport> {
        self.last_report.as_ref()
    }

    /// The window is minimized; frames are skipped until it has an area again
    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    // ===== FRAME LOOP =====

    /// Sample the wall clock for the next frame
    pub fn next_frame(&mut self) -> FrameContext {
        self.clock.tick_now()
    }

    /// Record the new window size; the chain is rebuilt before the next acquire
    pub fn notify_resize(&mut self, width: u32, height: u32) {
        let size = Extent2D::new(width, height);
        if size != self.window_size || self.suspended {
            engine_debug!(SOURCE, "Resize to {}x{} requested", width, height);
            self.window_size = size;
            self.resize_pending = true;
        }
    }

    /// Run one acquire, record, submit, present cycle
    ///
    /// # Errors
    ///
    /// Device-level failures (fence wait, acquire, submit, swapchain rebuild)
    /// are returned; they end the render loop. Failures local to the frame
    /// come back as `FrameOutcome::Dropped`.
    pub fn render_frame(
        &mut self,
        scene: &dyn RenderScene,
        camera: &Camera,
        frame: &FrameContext,
    ) -> Result<FrameOutcome> {
        if self.shut_down {
            return Err(Error::InvalidState("engine is shut down".to_string()));
        }
        self.ensure_renderer()?;

        if self.resize_pending || self.suspended {
            if self.recreate_swapchain()? == RecreateOutcome::Suspended {
                return Ok(FrameOutcome::Skipped);
            }
        }

        let Some(swapchain_key) = self.swapchain.state().map(|s| s.swapchain()) else {
            return Err(Error::InvalidState("no swapchain".to_string()));
        };

        let image_index = match self.frame_sync.acquire(self.device.as_mut(), swapchain_key)? {
            AcquireOutcome::Acquired { image_index } => image_index,
            AcquireOutcome::SkipFrame => {
                self.recreate_swapchain()?;
                return Ok(FrameOutcome::Skipped);
            }
        };

        if !self.record(scene, camera, frame, image_index)? {
            return Ok(FrameOutcome::Dropped);
        }
        self.frame_sync.submit(self.device.as_mut())?;

        match self.frame_sync.present(self.device.as_mut(), swapchain_key) {
            PresentOutcome::Presented => Ok(FrameOutcome::Presented { recreated: false }),
            PresentOutcome::NeedsRecreate => {
                self.recreate_swapchain()?;
                Ok(FrameOutcome::Presented { recreated: true })
            }
            PresentOutcome::Failed(_) => Ok(FrameOutcome::Dropped),
        }
    }

    /// Record the frame into the acquired image; `false` when it was aborted
    fn record(
        &mut self,
        scene: &dyn RenderScene,
        camera: &Camera,
        frame: &FrameContext,
        image_index: u32,
    ) -> Result<bool> {
        let target = match self.swapchain.state().map(|s| FrameTarget::from_swapchain(s, image_index)) {
            Some(Ok(target)) => target,
            Some(Err(e)) => {
                self.frame_sync.abort_frame(self.device.as_mut());
                return Err(e);
            }
            None => {
                self.frame_sync.abort_frame(self.device.as_mut());
                return Err(Error::InvalidState("no swapchain".to_string()));
            }
        };

        let cmd = match self.frame_sync.begin_recording() {
            Ok(cmd) => cmd,
            Err(e) => {
                self.frame_sync.abort_frame(self.device.as_mut());
                return Err(e);
            }
        };

        match self.renderer.render(self.device.as_mut(), cmd, scene, camera, frame, &target) {
            Ok(report) => {
                self.last_report = Some(report);
                Ok(true)
            }
            Err(e) => {
                engine_warn!(SOURCE, "Frame {} dropped: {}", frame.frame_index, e);
                self.last_report = None;
                self.frame_sync.abort_frame(self.device.as_mut());
                Ok(false)
            }
        }
    }

    fn ensure_renderer(&mut self) -> Result<()> {
        if self.renderer.is_initialized() {
            return Ok(());
        }
        let Some(state) = self.swapchain.state() else {
            return Err(Error::InvalidState("no swapchain".to_string()));
        };
        self.renderer.initialize(self.device.as_mut(), state)
    }

    /// Rebuild the chain at the last known window size and follow with the renderer
    fn recreate_swapchain(&mut self) -> Result<RecreateOutcome> {
        let outcome = self.swapchain.recreate(self.device.as_mut(), self.window_size)?;
        self.resize_pending = false;
        match outcome {
            RecreateOutcome::Suspended => {
                if !self.suspended {
                    engine_info!(SOURCE, "Rendering suspended: window has no area");
                }
                self.suspended = true;
            }
            RecreateOutcome::Recreated => {
                self.suspended = false;
                if let Some(state) = self.swapchain.state() {
                    self.renderer.on_swapchain_recreated(self.device.as_mut(), state)?;
                }
            }
        }
        Ok(outcome)
    }

    /// Idle the GPU and destroy everything in reverse creation order. Idempotent.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        if let Err(e) = self.device.wait_idle() {
            engine_warn!(SOURCE, "wait_idle failed during shutdown: {}", e);
        }
        self.renderer.cleanup(self.device.as_mut());
        self.frame_sync.destroy(self.device.as_mut());
        self.swapchain.destroy(self.device.as_mut());
        self.last_report = None;
        self.shut_down = true;
        engine_info!(SOURCE, "Engine shut down");
    }

    // ===== LOGGING API =====

    /// Replace the logger sink (file logger, test capture, ...)
    pub fn set_logger<L: Logger + 'static>(logger_impl: L) {
        if let Ok(mut lock) = logger().write() {
            *lock = Box::new(logger_impl);
        }
    }

    /// Restore the default console logger
    pub fn reset_logger() {
        Self::set_logger(DefaultLogger::default());
    }

    /// Install the console logger with a minimum severity, e.g. `Config::log_level`
    pub fn install_default_logger(min_severity: LogSeverity) {
        Self::set_logger(DefaultLogger::new(min_severity));
    }

    /// Log without file:line, used by `engine_info!` and friends
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        if let Ok(lock) = logger().read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: None,
                line: None,
            });
        }
    }

    /// Log with file:line, used by `engine_error!`
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        if let Ok(lock) = logger().read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: Some(file),
                line: Some(line),
            });
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
