/// GraphicsDevice trait - the boundary between the engine and a GPU backend
///
/// The frame pipeline only ever talks to the GPU through this trait and
/// `CommandList`. All objects are referenced by typed handles; a backend
/// resolves a handle through its generation-checked tables and reports a
/// stale one as `Error::InvalidResource`.

use crate::config::RendererCapabilities;
use crate::error::Result;
use crate::graphics_device::{
    AcquireResult, BufferDesc, BufferKey, CommandList, FenceKey, FramebufferDesc,
    FramebufferKey, PresentResult, RenderPassDesc, RenderPassKey, SemaphoreKey,
    SubmitInfo, SurfaceCapabilities, SwapchainDesc, SwapchainImages, SwapchainKey,
    TextureDesc, TextureKey, TextureViewDesc, TextureViewKey,
};

/// Counters exposed by a device for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceStats {
    pub live_textures: u32,
    pub live_buffers: u32,
    pub live_render_passes: u32,
    pub live_framebuffers: u32,
    pub submits: u64,
    pub gpu_memory_used: u64,
}

/// GPU device
///
/// Implemented by `prisma_engine_renderer_vulkan::VulkanGraphicsDevice`
/// and by the test mock.
pub trait GraphicsDevice: Send {
    // ===== COMMANDS & SYNCHRONIZATION =====

    /// Create a reusable command list
    fn create_command_list(&mut self) -> Result<Box<dyn CommandList>>;

    /// Create a fence, optionally already signaled
    fn create_fence(&mut self, signaled: bool) -> Result<FenceKey>;

    /// Block until the fence is signaled or `timeout_ns` elapses
    fn wait_for_fence(&mut self, fence: FenceKey, timeout_ns: u64) -> Result<()>;

    /// Return the fence to the unsignaled state
    fn reset_fence(&mut self, fence: FenceKey) -> Result<()>;

    fn destroy_fence(&mut self, fence: FenceKey);

    fn create_semaphore(&mut self) -> Result<SemaphoreKey>;

    fn destroy_semaphore(&mut self, semaphore: SemaphoreKey);

    /// Submit a recorded command list with the given synchronization
    fn submit(&mut self, commands: &dyn CommandList, info: &SubmitInfo) -> Result<()>;

    /// Submit synchronization only (no commands): wait on and signal the
    /// given semaphores and fence
    fn signal(&mut self, info: &SubmitInfo) -> Result<()>;

    /// Block until the GPU is idle
    fn wait_idle(&mut self) -> Result<()>;

    // ===== PRESENTATION =====

    /// Query what the window surface currently supports
    fn surface_capabilities(&mut self) -> Result<SurfaceCapabilities>;

    /// Create a swapchain and register its images as non-owned textures
    fn create_swapchain(&mut self, desc: &SwapchainDesc) -> Result<SwapchainImages>;

    /// Destroy a swapchain and unregister its images
    fn destroy_swapchain(&mut self, swapchain: SwapchainKey);

    /// Acquire the next presentable image, signaling `signal` when it is ready
    fn acquire_next_image(
        &mut self,
        swapchain: SwapchainKey,
        signal: SemaphoreKey,
        timeout_ns: u64,
    ) -> Result<AcquireResult>;

    /// Queue an image for presentation once `wait` is signaled
    fn present(
        &mut self,
        swapchain: SwapchainKey,
        image_index: u32,
        wait: SemaphoreKey,
    ) -> Result<PresentResult>;

    // ===== RESOURCES =====

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureKey>;

    fn destroy_texture(&mut self, texture: TextureKey);

    fn create_texture_view(&mut self, texture: TextureKey, desc: &TextureViewDesc) -> Result<TextureViewKey>;

    fn destroy_texture_view(&mut self, view: TextureViewKey);

    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<BufferKey>;

    fn destroy_buffer(&mut self, buffer: BufferKey);

    fn create_render_pass(&mut self, desc: &RenderPassDesc) -> Result<RenderPassKey>;

    fn destroy_render_pass(&mut self, render_pass: RenderPassKey);

    fn create_framebuffer(&mut self, desc: &FramebufferDesc) -> Result<FramebufferKey>;

    fn destroy_framebuffer(&mut self, framebuffer: FramebufferKey);

    // ===== INFO =====

    fn capabilities(&self) -> RendererCapabilities;

    fn stats(&self) -> DeviceStats;
}
