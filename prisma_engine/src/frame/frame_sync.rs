/// FrameSyncController - drives acquire → record → submit → present for
/// the single frame in flight.
///
/// Owns one set of sync objects and the one command list they guard.
/// State machine per frame: `Idle → Acquiring → Acquired → Submitting →
/// Presenting → Idle`. The command list is only handed out once the fence
/// guarding its previous submission has been waited on.

use crate::error::{Error, Result};
use crate::graphics_device::{
    AcquireResult, CommandList, FenceKey, GraphicsDevice, PipelineStage, PresentResult,
    SemaphoreKey, SubmitInfo, SwapchainKey,
};
use crate::{engine_debug, engine_error, engine_trace, engine_warn};

const SOURCE: &str = "prisma::FrameSync";

/// Semaphores and fence guarding one frame slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSyncObjects {
    /// Signaled by acquire, waited by submit at color-attachment output
    pub image_available: SemaphoreKey,
    /// Signaled by submit, waited by present
    pub render_finished: SemaphoreKey,
    /// Signaled when the GPU finished executing the command list
    pub in_flight: FenceKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    Idle,
    Acquiring,
    Acquired,
    Submitting,
    Presenting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// An image is ready; recording may start
    Acquired { image_index: u32 },
    /// The chain is out of date; nothing was acquired and nothing may be recorded
    SkipFrame,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PresentOutcome {
    Presented,
    /// Presented or not, the chain must be rebuilt before the next acquire
    NeedsRecreate,
    /// The frame was dropped; the loop may continue with the next frame
    Failed(Error),
}

pub struct FrameSyncController {
    sync: Option<FrameSyncObjects>,
    command_list: Box<dyn CommandList>,
    state: FrameState,
    image_index: Option<u32>,
    /// The fence is signaled or will be by pending work: wait before reuse
    fence_pending: bool,
    recording: bool,
    recreate_pending: bool,
    fence_timeout_ns: u64,
    frames_presented: u64,
}

impl FrameSyncController {
    /// Create the sync objects (fence starts signaled) and the command list
    ///
    /// # Errors
    ///
    /// `InitializationFailed` if any object cannot be created.
    pub fn new(device: &mut dyn GraphicsDevice, fence_timeout_ns: u64) -> Result<Self> {
        let init = |e: Error| Error::InitializationFailed(format!("Frame sync objects: {}", e));

        let image_available = device.create_semaphore().map_err(init)?;
        let render_finished = match device.create_semaphore() {
            Ok(s) => s,
            Err(e) => {
                device.destroy_semaphore(image_available);
                return Err(init(e));
            }
        };
        let in_flight = match device.create_fence(true) {
            Ok(f) => f,
            Err(e) => {
                device.destroy_semaphore(image_available);
                device.destroy_semaphore(render_finished);
                return Err(init(e));
            }
        };
        let command_list = match device.create_command_list() {
            Ok(cmd) => cmd,
            Err(e) => {
                device.destroy_semaphore(image_available);
                device.destroy_semaphore(render_finished);
                device.destroy_fence(in_flight);
                return Err(init(e));
            }
        };

        Ok(Self {
            sync: Some(FrameSyncObjects { image_available, render_finished, in_flight }),
            command_list,
            state: FrameState::Idle,
            image_index: None,
            fence_pending: true,
            recording: false,
            recreate_pending: false,
            fence_timeout_ns,
            frames_presented: 0,
        })
    }

    // ===== ACCESSORS =====

    pub fn state(&self) -> FrameState {
        self.state
    }

    pub fn sync_objects(&self) -> Option<FrameSyncObjects> {
        self.sync
    }

    /// Index acquired for the current frame
    pub fn image_index(&self) -> Option<u32> {
        self.image_index
    }

    /// A suboptimal acquire asked for a recreation after this frame
    pub fn recreate_pending(&self) -> bool {
        self.recreate_pending
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    fn objects(&self) -> Result<FrameSyncObjects> {
        self.sync.ok_or_else(|| Error::InvalidState("frame sync objects destroyed".to_string()))
    }

    fn expect_state(&self, expected: FrameState, op: &str) -> Result<()> {
        if self.state != expected {
            return Err(Error::InvalidState(format!(
                "{} requires {:?}, frame is {:?}",
                op, expected, self.state
            )));
        }
        Ok(())
    }

    // ===== PROTOCOL =====

    /// Wait for the previous use of the command list, then acquire an image
    ///
    /// `OutOfDate` returns `SkipFrame` with the fence left signaled so the
    /// next attempt does not block. The fence is reset only once an image was
    /// actually acquired.
    pub fn acquire(
        &mut self,
        device: &mut dyn GraphicsDevice,
        swapchain: SwapchainKey,
    ) -> Result<AcquireOutcome> {
        self.expect_state(FrameState::Idle, "acquire")?;
        let sync = self.objects()?;
        self.state = FrameState::Acquiring;

        if self.fence_pending {
            if let Err(e) = device.wait_for_fence(sync.in_flight, self.fence_timeout_ns) {
                self.state = FrameState::Idle;
                engine_error!(SOURCE, "Waiting for the in-flight fence failed: {}", e);
                return Err(e);
            }
            engine_trace!(SOURCE, "In-flight fence signaled");
        }

        let acquired = device.acquire_next_image(swapchain, sync.image_available, u64::MAX);
        match acquired {
            Ok(AcquireResult::OutOfDate) => {
                self.state = FrameState::Idle;
                engine_debug!(SOURCE, "Swapchain out of date on acquire, skipping frame");
                Ok(AcquireOutcome::SkipFrame)
            }
            Ok(AcquireResult::Acquired { image_index, suboptimal }) => {
                if suboptimal {
                    engine_debug!(SOURCE, "Suboptimal acquire, recreation scheduled after this frame");
                    self.recreate_pending = true;
                }
                if self.fence_pending {
                    if let Err(e) = device.reset_fence(sync.in_flight) {
                        // The semaphore is signaled; consume it so the slot stays usable
                        self.state = FrameState::Acquired;
                        self.image_index = Some(image_index);
                        self.abort_frame(device);
                        return Err(e);
                    }
                    self.fence_pending = false;
                }
                self.image_index = Some(image_index);
                self.state = FrameState::Acquired;
                Ok(AcquireOutcome::Acquired { image_index })
            }
            Err(e) => {
                self.state = FrameState::Idle;
                Err(e)
            }
        }
    }

    /// Start recording into the frame's command list
    ///
    /// Only legal after a successful acquire, which guarantees the fence
    /// guarding the list's previous submission was waited on.
    pub fn begin_recording(&mut self) -> Result<&mut dyn CommandList> {
        self.expect_state(FrameState::Acquired, "begin_recording")?;
        if self.fence_pending {
            return Err(Error::InvalidState(
                "command list still guarded by an unwaited fence".to_string(),
            ));
        }
        if self.recording {
            return Err(Error::InvalidState("recording already started".to_string()));
        }
        self.command_list.begin()?;
        self.recording = true;
        Ok(self.command_list.as_mut())
    }

    /// The command list currently being recorded
    pub fn command_list(&mut self) -> Result<&mut dyn CommandList> {
        if !self.recording {
            return Err(Error::InvalidState("no recording in progress".to_string()));
        }
        Ok(self.command_list.as_mut())
    }

    /// End recording and submit: wait image-available at color output,
    /// signal render-finished and the in-flight fence
    pub fn submit(&mut self, device: &mut dyn GraphicsDevice) -> Result<()> {
        self.expect_state(FrameState::Acquired, "submit")?;
        if !self.recording {
            return Err(Error::InvalidState("submit without recording".to_string()));
        }
        let sync = self.objects()?;
        self.state = FrameState::Submitting;

        let info = SubmitInfo {
            wait_semaphores: vec![(sync.image_available, PipelineStage::ColorAttachmentOutput)],
            signal_semaphores: vec![sync.render_finished],
            signal_fence: Some(sync.in_flight),
        };
        let submitted = self
            .command_list
            .end()
            .and_then(|_| device.submit(self.command_list.as_ref(), &info));

        if let Err(e) = submitted {
            engine_error!(SOURCE, "Frame submission failed: {}", e);
            self.state = FrameState::Acquired;
            self.abort_frame(device);
            return Err(e);
        }

        self.recording = false;
        self.fence_pending = true;
        self.state = FrameState::Presenting;
        Ok(())
    }

    /// Present the acquired image once render-finished is signaled
    pub fn present(
        &mut self,
        device: &mut dyn GraphicsDevice,
        swapchain: SwapchainKey,
    ) -> PresentOutcome {
        if let Err(e) = self.expect_state(FrameState::Presenting, "present") {
            return PresentOutcome::Failed(e);
        }
        let (sync, image_index) = match (self.sync, self.image_index) {
            (Some(sync), Some(index)) => (sync, index),
            _ => {
                self.state = FrameState::Idle;
                return PresentOutcome::Failed(Error::InvalidState("no acquired image".to_string()));
            }
        };

        let result = device.present(swapchain, image_index, sync.render_finished);
        self.state = FrameState::Idle;
        self.image_index = None;
        let recreate = std::mem::take(&mut self.recreate_pending);

        match result {
            Ok(PresentResult::Optimal) if !recreate => {
                self.frames_presented += 1;
                PresentOutcome::Presented
            }
            Ok(PresentResult::Optimal) | Ok(PresentResult::Suboptimal) => {
                self.frames_presented += 1;
                PresentOutcome::NeedsRecreate
            }
            Ok(PresentResult::OutOfDate) => {
                engine_debug!(SOURCE, "Swapchain out of date on present");
                PresentOutcome::NeedsRecreate
            }
            Err(e) => {
                engine_error!(SOURCE, "Present failed, frame dropped: {}", e);
                PresentOutcome::Failed(e)
            }
        }
    }

    /// Abandon an acquired frame without presenting
    ///
    /// Discards the recording and submits a sync-only batch that consumes
    /// image-available and re-signals the fence, so the next acquire neither
    /// deadlocks nor reuses a signaled semaphore.
    pub fn abort_frame(&mut self, device: &mut dyn GraphicsDevice) {
        if self.state != FrameState::Acquired {
            return;
        }
        if let Err(e) = self.command_list.reset() {
            engine_warn!(SOURCE, "Command list reset failed: {}", e);
        }
        self.recording = false;

        if let Some(sync) = self.sync {
            let info = SubmitInfo {
                wait_semaphores: vec![(sync.image_available, PipelineStage::TopOfPipe)],
                signal_semaphores: Vec::new(),
                signal_fence: if self.fence_pending { None } else { Some(sync.in_flight) },
            };
            match device.signal(&info) {
                Ok(()) => self.fence_pending = true,
                Err(e) => engine_error!(SOURCE, "Failed to release aborted frame: {}", e),
            }
        }
        self.image_index = None;
        self.state = FrameState::Idle;
        engine_warn!(SOURCE, "Frame aborted, previous image stays on screen");
    }

    /// Wait for outstanding work and destroy the sync objects. Idempotent.
    pub fn destroy(&mut self, device: &mut dyn GraphicsDevice) {
        if let Some(sync) = self.sync.take() {
            if self.fence_pending {
                if let Err(e) = device.wait_for_fence(sync.in_flight, self.fence_timeout_ns) {
                    engine_warn!(SOURCE, "Fence wait failed during shutdown: {}", e);
                }
            }
            device.destroy_fence(sync.in_flight);
            device.destroy_semaphore(sync.render_finished);
            device.destroy_semaphore(sync.image_available);
            self.state = FrameState::Idle;
        }
    }
}

#[cfg(test)]
#[path = "frame_sync_tests.rs"]
mod tests;
