/// Mock GraphicsDevice for unit tests (no GPU required)
///
/// The device and every command list it creates share one
/// `MockDeviceState`, so a test can keep a clone of the device, hand the
/// original to the code under test, and inspect afterwards the exact
/// sequence of device calls and recorded commands.
///
/// Acquire and present results can be scripted; named operations can be
/// forced to fail.

use std::any::Any;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use rustc_hash::FxHashSet;
use slotmap::SlotMap;

use crate::config::RendererCapabilities;
use crate::error::{Error, Result};
use crate::graphics_device::{
    AcquireResult, BufferDesc, BufferKey, ClearValue, ColorSpace, CommandList, DepthState,
    DeviceStats, Extent2D, FenceKey, FramebufferDesc, FramebufferKey, GraphicsDevice,
    IndexType, PipelineKey, PresentMode, PresentResult, Rect2D, RenderPassDesc,
    RenderPassKey, SemaphoreKey, StencilState, SubmitInfo, SurfaceCapabilities,
    SurfaceFormat, SwapchainDesc, SwapchainImages, SwapchainKey, TextureDesc,
    TextureFormat, TextureKey, TextureUsage, TextureViewDesc, TextureViewKey, Viewport,
};

// ============================================================================
// Shared state
// ============================================================================

#[derive(Debug, Clone)]
pub struct MockTexture {
    pub desc: TextureDesc,
    /// Owned by a swapchain, not by the caller
    pub swapchain_image: bool,
}

#[derive(Debug)]
pub struct MockSwapchain {
    pub desc: SwapchainDesc,
    pub images: Vec<TextureKey>,
    next_image: u32,
}

#[derive(Debug)]
pub struct MockDeviceState {
    /// Device calls and recorded commands, in call order
    pub events: Vec<String>,
    pub textures: SlotMap<TextureKey, MockTexture>,
    pub views: SlotMap<TextureViewKey, TextureKey>,
    pub buffers: SlotMap<BufferKey, BufferDesc>,
    pub render_passes: SlotMap<RenderPassKey, RenderPassDesc>,
    pub framebuffers: SlotMap<FramebufferKey, FramebufferDesc>,
    pub pipelines: SlotMap<PipelineKey, String>,
    pub swapchains: SlotMap<SwapchainKey, MockSwapchain>,
    pub fences: SlotMap<FenceKey, bool>,
    pub semaphores: SlotMap<SemaphoreKey, ()>,
    pub surface: SurfaceCapabilities,
    pub acquire_script: VecDeque<AcquireResult>,
    pub present_script: VecDeque<Result<PresentResult>>,
    pub failing_ops: FxHashSet<String>,
    pub capabilities: RendererCapabilities,
    pub submits: u64,
}

impl MockDeviceState {
    /// Validate semaphores and signal the fence of a submission
    fn apply_submit_info(&mut self, info: &SubmitInfo) -> Result<()> {
        for (semaphore, _) in &info.wait_semaphores {
            if !self.semaphores.contains_key(*semaphore) {
                return Err(Error::InvalidResource("stale wait semaphore".to_string()));
            }
        }
        for semaphore in &info.signal_semaphores {
            if !self.semaphores.contains_key(*semaphore) {
                return Err(Error::InvalidResource("stale signal semaphore".to_string()));
            }
        }
        if let Some(fence) = info.signal_fence {
            match self.fences.get_mut(fence) {
                Some(signaled) if *signaled => {
                    return Err(Error::InvalidState("submit with a signaled fence".to_string()));
                }
                Some(signaled) => *signaled = true,
                None => return Err(Error::InvalidResource("stale fence handle".to_string())),
            }
        }
        Ok(())
    }

    fn fail_if_scripted(&self, op: &str) -> Result<()> {
        if self.failing_ops.contains(op) {
            return Err(Error::BackendError(format!("mock failure: {}", op)));
        }
        Ok(())
    }
}

/// Surface used by default: 800x600, sRGB + UNORM BGRA, FIFO + MAILBOX
pub fn default_surface_capabilities() -> SurfaceCapabilities {
    SurfaceCapabilities {
        min_image_count: 2,
        max_image_count: 3,
        current_extent: Some(Extent2D::new(800, 600)),
        min_extent: Extent2D::new(1, 1),
        max_extent: Extent2D::new(4096, 4096),
        formats: vec![
            SurfaceFormat::new(TextureFormat::B8G8R8A8_UNORM, ColorSpace::SrgbNonlinear),
            SurfaceFormat::new(TextureFormat::B8G8R8A8_SRGB, ColorSpace::SrgbNonlinear),
        ],
        present_modes: vec![PresentMode::Fifo, PresentMode::Mailbox],
    }
}

// ============================================================================
// Mock GraphicsDevice
// ============================================================================

#[derive(Clone)]
pub struct MockGraphicsDevice {
    state: Arc<Mutex<MockDeviceState>>,
}

impl MockGraphicsDevice {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockDeviceState {
                events: Vec::new(),
                textures: SlotMap::with_key(),
                views: SlotMap::with_key(),
                buffers: SlotMap::with_key(),
                render_passes: SlotMap::with_key(),
                framebuffers: SlotMap::with_key(),
                pipelines: SlotMap::with_key(),
                swapchains: SlotMap::with_key(),
                fences: SlotMap::with_key(),
                semaphores: SlotMap::with_key(),
                surface: default_surface_capabilities(),
                acquire_script: VecDeque::new(),
                present_script: VecDeque::new(),
                failing_ops: FxHashSet::default(),
                capabilities: RendererCapabilities::DYNAMIC_DEPTH_STATE
                    | RendererCapabilities::DEBUG_LABELS,
                submits: 0,
            })),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, MockDeviceState> {
        self.state.lock().unwrap()
    }

    // ===== SCRIPTING =====

    /// Register a named pipeline, as a material system would
    pub fn register_pipeline(&self, name: &str) -> PipelineKey {
        self.state().pipelines.insert(name.to_string())
    }

    pub fn set_surface_capabilities(&self, caps: SurfaceCapabilities) {
        self.state().surface = caps;
    }

    /// Change only the current extent of the surface (window resize)
    pub fn set_surface_extent(&self, extent: Option<Extent2D>) {
        self.state().surface.current_extent = extent;
    }

    pub fn push_acquire_result(&self, result: AcquireResult) {
        self.state().acquire_script.push_back(result);
    }

    pub fn push_present_result(&self, result: Result<PresentResult>) {
        self.state().present_script.push_back(result);
    }

    /// Make every call of `op` (e.g. "create_texture", "submit") fail
    pub fn fail_on(&self, op: &str) {
        self.state().failing_ops.insert(op.to_string());
    }

    pub fn clear_failures(&self) {
        self.state().failing_ops.clear();
    }

    pub fn set_capabilities(&self, caps: RendererCapabilities) {
        self.state().capabilities = caps;
    }

    // ===== INSPECTION =====

    pub fn events(&self) -> Vec<String> {
        self.state().events.clone()
    }

    pub fn clear_events(&self) {
        self.state().events.clear();
    }

    /// Number of events equal to `name`
    pub fn count_events(&self, name: &str) -> usize {
        self.state().events.iter().filter(|e| e.as_str() == name).count()
    }

    /// Number of events starting with `prefix`
    pub fn count_events_prefixed(&self, prefix: &str) -> usize {
        self.state().events.iter().filter(|e| e.starts_with(prefix)).count()
    }

    pub fn texture_desc(&self, texture: TextureKey) -> Option<TextureDesc> {
        self.state().textures.get(texture).map(|t| t.desc.clone())
    }

    pub fn fence_signaled(&self, fence: FenceKey) -> Option<bool> {
        self.state().fences.get(fence).copied()
    }

    pub fn live_swapchains(&self) -> usize {
        self.state().swapchains.len()
    }

    pub fn live_fences(&self) -> usize {
        self.state().fences.len()
    }

    pub fn live_semaphores(&self) -> usize {
        self.state().semaphores.len()
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn create_command_list(&mut self) -> Result<Box<dyn CommandList>> {
        let mut state = self.state();
        state.fail_if_scripted("create_command_list")?;
        state.events.push("create_command_list".to_string());
        Ok(Box::new(MockCommandList::new(self.state.clone())))
    }

    fn create_fence(&mut self, signaled: bool) -> Result<FenceKey> {
        let mut state = self.state();
        state.fail_if_scripted("create_fence")?;
        Ok(state.fences.insert(signaled))
    }

    fn wait_for_fence(&mut self, fence: FenceKey, _timeout_ns: u64) -> Result<()> {
        let mut state = self.state();
        state.fail_if_scripted("wait_for_fence")?;
        match state.fences.get(fence).copied() {
            Some(true) => {
                state.events.push("wait_fence".to_string());
                Ok(())
            }
            Some(false) => Err(Error::BackendError(
                "wait on a fence that no pending submission will signal".to_string(),
            )),
            None => Err(Error::InvalidResource("stale fence handle".to_string())),
        }
    }

    fn reset_fence(&mut self, fence: FenceKey) -> Result<()> {
        let mut state = self.state();
        let signaled = state.fences.get_mut(fence)
            .ok_or_else(|| Error::InvalidResource("stale fence handle".to_string()))?;
        *signaled = false;
        state.events.push("reset_fence".to_string());
        Ok(())
    }

    fn destroy_fence(&mut self, fence: FenceKey) {
        self.state().fences.remove(fence);
    }

    fn create_semaphore(&mut self) -> Result<SemaphoreKey> {
        let mut state = self.state();
        state.fail_if_scripted("create_semaphore")?;
        Ok(state.semaphores.insert(()))
    }

    fn destroy_semaphore(&mut self, semaphore: SemaphoreKey) {
        self.state().semaphores.remove(semaphore);
    }

    fn submit(&mut self, commands: &dyn CommandList, info: &SubmitInfo) -> Result<()> {
        let mock = commands.as_any().downcast_ref::<MockCommandList>()
            .ok_or_else(|| Error::InvalidResource("foreign command list".to_string()))?;
        if mock.recording {
            return Err(Error::InvalidState("submit of a command list still recording".to_string()));
        }

        let mut state = self.state();
        state.fail_if_scripted("submit")?;
        state.apply_submit_info(info)?;
        state.submits += 1;
        state.events.push("submit".to_string());
        Ok(())
    }

    fn signal(&mut self, info: &SubmitInfo) -> Result<()> {
        let mut state = self.state();
        state.fail_if_scripted("signal")?;
        state.apply_submit_info(info)?;
        state.events.push("signal".to_string());
        Ok(())
    }

    fn wait_idle(&mut self) -> Result<()> {
        let mut state = self.state();
        state.fail_if_scripted("wait_idle")?;
        state.events.push("wait_idle".to_string());
        Ok(())
    }

    fn surface_capabilities(&mut self) -> Result<SurfaceCapabilities> {
        let state = self.state();
        state.fail_if_scripted("surface_capabilities")?;
        Ok(state.surface.clone())
    }

    fn create_swapchain(&mut self, desc: &SwapchainDesc) -> Result<SwapchainImages> {
        let mut state = self.state();
        state.fail_if_scripted("create_swapchain")?;
        if desc.extent.is_zero_area() {
            return Err(Error::InvalidResource("zero-area swapchain".to_string()));
        }

        let mut images = Vec::with_capacity(desc.image_count as usize);
        for _ in 0..desc.image_count {
            images.push(state.textures.insert(MockTexture {
                desc: TextureDesc::new_2d(
                    desc.extent.width,
                    desc.extent.height,
                    desc.surface_format.format,
                    TextureUsage::COLOR_ATTACHMENT | TextureUsage::TRANSFER_DST,
                ),
                swapchain_image: true,
            }));
        }
        let swapchain = state.swapchains.insert(MockSwapchain {
            desc: *desc,
            images: images.clone(),
            next_image: 0,
        });
        state.events.push(format!(
            "create_swapchain {}x{}",
            desc.extent.width, desc.extent.height
        ));
        Ok(SwapchainImages { swapchain, images })
    }

    fn destroy_swapchain(&mut self, swapchain: SwapchainKey) {
        let mut state = self.state();
        if let Some(chain) = state.swapchains.remove(swapchain) {
            for image in chain.images {
                state.textures.remove(image);
            }
            state.events.push("destroy_swapchain".to_string());
        }
    }

    fn acquire_next_image(
        &mut self,
        swapchain: SwapchainKey,
        signal: SemaphoreKey,
        _timeout_ns: u64,
    ) -> Result<AcquireResult> {
        let mut state = self.state();
        state.fail_if_scripted("acquire_next_image")?;
        if !state.semaphores.contains_key(signal) {
            return Err(Error::InvalidResource("stale acquire semaphore".to_string()));
        }
        let scripted = state.acquire_script.pop_front();
        let chain = state.swapchains.get_mut(swapchain)
            .ok_or_else(|| Error::InvalidResource("stale swapchain handle".to_string()))?;

        let result = match scripted {
            Some(AcquireResult::Acquired { suboptimal, .. }) => {
                let index = chain.next_image;
                chain.next_image = (index + 1) % chain.images.len() as u32;
                AcquireResult::Acquired { image_index: index, suboptimal }
            }
            Some(AcquireResult::OutOfDate) => AcquireResult::OutOfDate,
            None => {
                let index = chain.next_image;
                chain.next_image = (index + 1) % chain.images.len() as u32;
                AcquireResult::Acquired { image_index: index, suboptimal: false }
            }
        };
        state.events.push("acquire".to_string());
        Ok(result)
    }

    fn present(
        &mut self,
        swapchain: SwapchainKey,
        image_index: u32,
        wait: SemaphoreKey,
    ) -> Result<PresentResult> {
        let mut state = self.state();
        if !state.swapchains.contains_key(swapchain) {
            return Err(Error::InvalidResource("stale swapchain handle".to_string()));
        }
        if !state.semaphores.contains_key(wait) {
            return Err(Error::InvalidResource("stale present semaphore".to_string()));
        }
        state.events.push(format!("present {}", image_index));
        state.present_script.pop_front().unwrap_or(Ok(PresentResult::Optimal))
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureKey> {
        let mut state = self.state();
        if state.failing_ops.contains("create_texture") {
            return Err(Error::OutOfMemory);
        }
        if desc.width == 0 || desc.height == 0 || desc.array_layers == 0 {
            return Err(Error::InvalidResource("zero-sized texture".to_string()));
        }
        state.events.push(format!(
            "create_texture {}x{} {:?}",
            desc.width, desc.height, desc.format
        ));
        Ok(state.textures.insert(MockTexture { desc: desc.clone(), swapchain_image: false }))
    }

    fn destroy_texture(&mut self, texture: TextureKey) {
        let mut state = self.state();
        let owned = state.textures.get(texture).map(|t| !t.swapchain_image).unwrap_or(false);
        if owned {
            state.textures.remove(texture);
            state.events.push("destroy_texture".to_string());
        }
    }

    fn create_texture_view(&mut self, texture: TextureKey, desc: &TextureViewDesc) -> Result<TextureViewKey> {
        let mut state = self.state();
        state.fail_if_scripted("create_texture_view")?;
        let layers = state.textures.get(texture)
            .map(|t| t.desc.array_layers)
            .ok_or_else(|| Error::InvalidResource("stale texture handle".to_string()))?;
        if desc.base_layer + desc.layer_count > layers {
            return Err(Error::InvalidResource("view layer range out of bounds".to_string()));
        }
        Ok(state.views.insert(texture))
    }

    fn destroy_texture_view(&mut self, view: TextureViewKey) {
        self.state().views.remove(view);
    }

    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<BufferKey> {
        let mut state = self.state();
        state.fail_if_scripted("create_buffer")?;
        if desc.size == 0 {
            return Err(Error::InvalidResource("zero-sized buffer".to_string()));
        }
        state.events.push(format!("create_buffer {}", desc.size));
        Ok(state.buffers.insert(desc.clone()))
    }

    fn destroy_buffer(&mut self, buffer: BufferKey) {
        let mut state = self.state();
        if state.buffers.remove(buffer).is_some() {
            state.events.push("destroy_buffer".to_string());
        }
    }

    fn create_render_pass(&mut self, desc: &RenderPassDesc) -> Result<RenderPassKey> {
        let mut state = self.state();
        state.fail_if_scripted("create_render_pass")?;
        state.events.push("create_render_pass".to_string());
        Ok(state.render_passes.insert(desc.clone()))
    }

    fn destroy_render_pass(&mut self, render_pass: RenderPassKey) {
        let mut state = self.state();
        if state.render_passes.remove(render_pass).is_some() {
            state.events.push("destroy_render_pass".to_string());
        }
    }

    fn create_framebuffer(&mut self, desc: &FramebufferDesc) -> Result<FramebufferKey> {
        let mut state = self.state();
        state.fail_if_scripted("create_framebuffer")?;
        if !state.render_passes.contains_key(desc.render_pass) {
            return Err(Error::InvalidResource("stale render pass handle".to_string()));
        }
        for view in desc.color_attachments.iter().chain(desc.depth_attachment.iter()) {
            if !state.views.contains_key(*view) {
                return Err(Error::InvalidResource("stale attachment view".to_string()));
            }
        }
        Ok(state.framebuffers.insert(desc.clone()))
    }

    fn destroy_framebuffer(&mut self, framebuffer: FramebufferKey) {
        let mut state = self.state();
        if state.framebuffers.remove(framebuffer).is_some() {
            state.events.push("destroy_framebuffer".to_string());
        }
    }

    fn capabilities(&self) -> RendererCapabilities {
        self.state().capabilities
    }

    fn stats(&self) -> DeviceStats {
        let state = self.state();
        DeviceStats {
            live_textures: state.textures.len() as u32,
            live_buffers: state.buffers.len() as u32,
            live_render_passes: state.render_passes.len() as u32,
            live_framebuffers: state.framebuffers.len() as u32,
            submits: state.submits,
            gpu_memory_used: 0,
        }
    }
}

// ============================================================================
// Mock CommandList
// ============================================================================

/// Records every command as a string, both locally and in the device event log
///
/// Rejects the misuse a real backend would fault on: nested render passes,
/// draws outside a render pass, blits inside one, stale handles.
pub struct MockCommandList {
    state: Arc<Mutex<MockDeviceState>>,
    pub commands: Vec<String>,
    pub recording: bool,
    pub in_render_pass: bool,
}

impl MockCommandList {
    pub fn new(state: Arc<Mutex<MockDeviceState>>) -> Self {
        Self { state, commands: Vec::new(), recording: false, in_render_pass: false }
    }

    /// Command list attached to a fresh device, for tests that only inspect commands
    pub fn standalone(device: &MockGraphicsDevice) -> Self {
        Self::new(device.state.clone())
    }

    fn record(&mut self, command: String) {
        self.state.lock().unwrap().events.push(format!("cmd:{}", command));
        self.commands.push(command);
    }

    fn require_recording(&self, op: &str) -> Result<()> {
        if !self.recording {
            return Err(Error::InvalidState(format!("{} outside begin/end", op)));
        }
        Ok(())
    }

    fn require_render_pass(&self, op: &str) -> Result<()> {
        self.require_recording(op)?;
        if !self.in_render_pass {
            return Err(Error::InvalidState(format!("{} outside a render pass", op)));
        }
        Ok(())
    }

    /// Commands starting with `prefix`
    pub fn count(&self, prefix: &str) -> usize {
        self.commands.iter().filter(|c| c.starts_with(prefix)).count()
    }
}

impl CommandList for MockCommandList {
    fn begin(&mut self) -> Result<()> {
        if self.recording {
            return Err(Error::InvalidState("begin while recording".to_string()));
        }
        self.recording = true;
        self.commands.clear();
        self.record("begin".to_string());
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.require_recording("end")?;
        if self.in_render_pass {
            return Err(Error::InvalidState("end inside a render pass".to_string()));
        }
        self.record("end".to_string());
        self.recording = false;
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        self.recording = false;
        self.in_render_pass = false;
        self.record("reset".to_string());
        Ok(())
    }

    fn begin_render_pass(
        &mut self,
        render_pass: RenderPassKey,
        framebuffer: FramebufferKey,
        _render_area: Rect2D,
        clear_values: &[ClearValue],
    ) -> Result<()> {
        self.require_recording("begin_render_pass")?;
        if self.in_render_pass {
            return Err(Error::InvalidState("nested render pass".to_string()));
        }
        {
            let state = self.state.lock().unwrap();
            if !state.render_passes.contains_key(render_pass) {
                return Err(Error::InvalidResource("stale render pass handle".to_string()));
            }
            if !state.framebuffers.contains_key(framebuffer) {
                return Err(Error::InvalidResource("stale framebuffer handle".to_string()));
            }
        }
        self.in_render_pass = true;
        self.record(format!("begin_render_pass clears={}", clear_values.len()));
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.require_render_pass("end_render_pass")?;
        self.in_render_pass = false;
        self.record("end_render_pass".to_string());
        Ok(())
    }

    fn set_viewport(&mut self, _viewport: Viewport) -> Result<()> {
        self.require_recording("set_viewport")?;
        self.record("set_viewport".to_string());
        Ok(())
    }

    fn set_scissor(&mut self, _scissor: Rect2D) -> Result<()> {
        self.require_recording("set_scissor")?;
        self.record("set_scissor".to_string());
        Ok(())
    }

    fn bind_pipeline(&mut self, pipeline: PipelineKey) -> Result<()> {
        self.require_render_pass("bind_pipeline")?;
        let name = self.state.lock().unwrap().pipelines.get(pipeline).cloned()
            .ok_or_else(|| Error::InvalidResource("stale pipeline handle".to_string()))?;
        self.record(format!("bind_pipeline {}", name));
        Ok(())
    }

    fn push_constants(&mut self, offset: u32, data: &[u8]) -> Result<()> {
        self.require_recording("push_constants")?;
        self.record(format!("push_constants {}+{}", offset, data.len()));
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, buffer: BufferKey, _offset: u64) -> Result<()> {
        self.require_recording("bind_vertex_buffer")?;
        if !self.state.lock().unwrap().buffers.contains_key(buffer) {
            return Err(Error::InvalidResource("stale vertex buffer".to_string()));
        }
        self.record("bind_vertex_buffer".to_string());
        Ok(())
    }

    fn bind_index_buffer(&mut self, buffer: BufferKey, _offset: u64, index_type: IndexType) -> Result<()> {
        self.require_recording("bind_index_buffer")?;
        if !self.state.lock().unwrap().buffers.contains_key(buffer) {
            return Err(Error::InvalidResource("stale index buffer".to_string()));
        }
        self.record(format!("bind_index_buffer {:?}", index_type));
        Ok(())
    }

    fn draw(&mut self, vertex_count: u32, _first_vertex: u32) -> Result<()> {
        self.require_render_pass("draw")?;
        self.record(format!("draw {}", vertex_count));
        Ok(())
    }

    fn draw_indexed(&mut self, index_count: u32, _first_index: u32, _vertex_offset: i32) -> Result<()> {
        self.require_render_pass("draw_indexed")?;
        self.record(format!("draw_indexed {}", index_count));
        Ok(())
    }

    fn set_depth_state(&mut self, depth: DepthState, _stencil: StencilState) -> Result<()> {
        self.require_recording("set_depth_state")?;
        self.record(format!(
            "set_depth_state test={} write={} {:?}",
            depth.test_enable, depth.write_enable, depth.compare
        ));
        Ok(())
    }

    fn set_depth_bias(&mut self, constant_factor: f32, slope_factor: f32) -> Result<()> {
        self.require_recording("set_depth_bias")?;
        self.record(format!("set_depth_bias {} {}", constant_factor, slope_factor));
        Ok(())
    }

    fn blit_texture(&mut self, src: TextureKey, dst: TextureKey) -> Result<()> {
        self.require_recording("blit_texture")?;
        if self.in_render_pass {
            return Err(Error::InvalidState("blit inside a render pass".to_string()));
        }
        {
            let state = self.state.lock().unwrap();
            state.fail_if_scripted("blit_texture")?;
            if !state.textures.contains_key(src) || !state.textures.contains_key(dst) {
                return Err(Error::InvalidResource("stale blit texture".to_string()));
            }
        }
        self.record("blit".to_string());
        Ok(())
    }

    fn begin_debug_label(&mut self, name: &str) -> Result<()> {
        self.require_recording("begin_debug_label")?;
        self.record(format!("label {}", name));
        Ok(())
    }

    fn end_debug_label(&mut self) -> Result<()> {
        self.require_recording("end_debug_label")?;
        self.record("end_label".to_string());
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
#[path = "mock_graphics_device_tests.rs"]
mod tests;
