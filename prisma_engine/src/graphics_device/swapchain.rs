//! Presentation surface and swapchain value types
//!
//! The swapchain itself lives in the backend and is addressed through a
//! `SwapchainKey`. Acquire and present report the transient "out of date"
//! and "suboptimal" conditions as values, not errors.

use crate::graphics_device::{SemaphoreKey, TextureFormat, TextureKey};

/// Size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Extent2D {
    pub width: u32,
    pub height: u32,
}

impl Extent2D {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A minimized window reports a zero-area extent
    pub fn is_zero_area(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

/// Color space of a surface format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSpace {
    SrgbNonlinear,
    ExtendedSrgbLinear,
    Hdr10St2084,
}

/// A (format, color space) pair offered by the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceFormat {
    pub format: TextureFormat,
    pub color_space: ColorSpace,
}

impl SurfaceFormat {
    pub const fn new(format: TextureFormat, color_space: ColorSpace) -> Self {
        Self { format, color_space }
    }
}

/// Presentation policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresentMode {
    Immediate,
    /// Triple-buffered, latest frame wins
    Mailbox,
    /// Vsync queue; always supported
    Fifo,
    FifoRelaxed,
}

/// What the surface supports, queried on creation and on every recreation
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceCapabilities {
    pub min_image_count: u32,
    /// 0 means no upper bound
    pub max_image_count: u32,
    /// `None` when the surface lets the swapchain pick its size
    pub current_extent: Option<Extent2D>,
    pub min_extent: Extent2D,
    pub max_extent: Extent2D,
    pub formats: Vec<SurfaceFormat>,
    pub present_modes: Vec<PresentMode>,
}

/// Everything needed to build a swapchain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwapchainDesc {
    pub surface_format: SurfaceFormat,
    pub present_mode: PresentMode,
    pub extent: Extent2D,
    pub image_count: u32,
}

/// Swapchain handle plus its images, registered as non-owned textures
#[derive(Debug, Clone, PartialEq)]
pub struct SwapchainImages {
    pub swapchain: crate::graphics_device::SwapchainKey,
    pub images: Vec<TextureKey>,
}

/// Result of acquiring the next presentable image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireResult {
    /// Image index is valid; `suboptimal` asks for a recreation after this frame
    Acquired { image_index: u32, suboptimal: bool },
    /// The chain no longer matches the surface; nothing was acquired
    OutOfDate,
}

/// Result of presenting an image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentResult {
    Optimal,
    Suboptimal,
    OutOfDate,
}

/// Pipeline stage at which a submission waits on a semaphore
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    TopOfPipe,
    ColorAttachmentOutput,
    EarlyFragmentTests,
    Transfer,
    BottomOfPipe,
}

/// Synchronization attached to one queue submission
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmitInfo {
    pub wait_semaphores: Vec<(SemaphoreKey, PipelineStage)>,
    pub signal_semaphores: Vec<SemaphoreKey>,
    pub signal_fence: Option<crate::graphics_device::FenceKey>,
}
