/// RenderContext - what passes and features may touch while recording a frame
///
/// Passes and features never see the renderer itself. They get a
/// `RenderContext` for the duration of one frame: the command list, the
/// device, the camera targets, the temporary resource pool, the resource
/// registry and the sorted queues. All GPU objects are typed handles.
///
/// `FrameRenderContext` is the implementation the renderer builds each frame
/// from disjoint borrows of its own fields. It tracks which render pass is
/// open so callers can interleave queue submissions, procedural draws and
/// blits without nesting passes.

use rustc_hash::FxHashMap;
use crate::config::RendererCapabilities;
use crate::error::{Error, Result};
use crate::graphics_device::{
    AttachmentDesc, BufferDesc, BufferKey, ClearValue, CommandList, Extent2D, FramebufferDesc,
    FramebufferKey, GraphicsDevice, ImageLayout, LoadOp, PipelineKey, Rect2D, RenderPassDesc,
    RenderPassKey, StoreOp, TextureDesc, TextureFormat, TextureKey, Viewport,
};
use crate::render_queue::{BoundState, DrawParams, QueueRange, RenderQueueManager, SubmitStats};
use super::camera_targets::{CameraTargets, RenderTargetRef};
use super::resource_manager::ResourceManager;
use super::temporary_pool::{TemporaryBuffer, TemporaryResourcePool, TemporaryTexture};
use crate::{engine_debug, engine_trace};

const SOURCE: &str = "prisma::RenderContext";

/// Owner recorded for temporaries requested outside any scope
const ROOT_SCOPE: &str = "renderer";

/// Access given to passes and features at initialization
pub struct SetupContext<'a> {
    pub device: &'a mut dyn GraphicsDevice,
    pub resources: &'a ResourceManager,
    pub screen_size: Extent2D,
    pub capabilities: RendererCapabilities,
}

impl From<&TemporaryTexture> for RenderTargetRef {
    fn from(temp: &TemporaryTexture) -> Self {
        RenderTargetRef {
            texture: temp.texture,
            view: temp.view,
            format: temp.desc.format,
            extent: Extent2D::new(temp.desc.width, temp.desc.height),
        }
    }
}

/// Per-frame rendering services
pub trait RenderContext {
    // ===== RAW ACCESS =====

    fn command_list(&mut self) -> &mut dyn CommandList;

    fn device(&mut self) -> &mut dyn GraphicsDevice;

    fn camera_color(&self) -> RenderTargetRef;

    fn camera_depth(&self) -> RenderTargetRef;

    fn render_target_size(&self) -> Extent2D;

    fn resource_manager(&self) -> &ResourceManager;

    /// Sorted queues of the frame
    fn queues(&self) -> &RenderQueueManager;

    fn frame_index(&self) -> u64;

    // ===== TEMPORARY RESOURCES =====

    /// Borrow a texture for this frame; must be released before the frame ends
    fn create_temporary_texture(&mut self, desc: &TextureDesc) -> Result<TemporaryTexture>;

    fn release_temporary_texture(&mut self, texture: TextureKey) -> Result<()>;

    fn create_temporary_buffer(&mut self, desc: &BufferDesc) -> Result<TemporaryBuffer>;

    fn release_temporary_buffer(&mut self, buffer: BufferKey) -> Result<()>;

    // ===== DRAWING =====

    /// Draw a full-screen triangle with `pipeline`
    ///
    /// `target: None` draws into the camera color target (opening the camera
    /// pass if needed); otherwise the target is fully overwritten.
    fn draw_full_screen(
        &mut self,
        pipeline: PipelineKey,
        constants: &[u8],
        target: Option<RenderTargetRef>,
    ) -> Result<()>;

    /// Draw `vertex_count` vertices without vertex buffers
    ///
    /// `target: None` draws into the camera pass; an explicit target is
    /// cleared first.
    fn draw_procedural(
        &mut self,
        pipeline: PipelineKey,
        vertex_count: u32,
        constants: &[u8],
        target: Option<RenderTargetRef>,
    ) -> Result<()>;

    /// Copy one texture into another (closes the open pass)
    fn blit_texture(&mut self, src: TextureKey, dst: TextureKey) -> Result<()>;

    // ===== PASSES =====

    /// Open the camera render pass; the first one of a frame clears the targets
    fn begin_camera_pass(&mut self) -> Result<()>;

    /// Open an arbitrary render pass (shadow maps, swapchain)
    fn begin_target_pass(
        &mut self,
        render_pass: RenderPassKey,
        framebuffer: FramebufferKey,
        extent: Extent2D,
        clear_values: &[ClearValue],
    ) -> Result<()>;

    /// Close the open render pass
    fn end_pass(&mut self) -> Result<()>;

    fn end_pass_if_open(&mut self) -> Result<()>;

    /// Submit the queues of `range` into the open pass
    fn submit_queues(&mut self, range: QueueRange, params: &DrawParams) -> Result<SubmitStats>;

    // ===== SCOPES =====

    /// Open a named scope: a debug label and the owner of new temporaries
    fn push_scope(&mut self, name: &str) -> Result<()>;

    fn pop_scope(&mut self) -> Result<()>;
}

// ===== OFFSCREEN PASSES =====

/// Render passes for drawing into arbitrary single-attachment targets
///
/// Passes are cached per (format, load op). Framebuffers are built per draw
/// and retired: `recycle` destroys them once the frame that used them is
/// known to be complete.
pub struct OffscreenPasses {
    passes: FxHashMap<(TextureFormat, LoadOp), RenderPassKey>,
    retired: Vec<FramebufferKey>,
}

impl OffscreenPasses {
    pub fn new() -> Self {
        Self { passes: FxHashMap::default(), retired: Vec::new() }
    }

    /// Render pass writing a single `format` attachment
    pub fn render_pass(
        &mut self,
        device: &mut dyn GraphicsDevice,
        format: TextureFormat,
        load_op: LoadOp,
    ) -> Result<RenderPassKey> {
        if let Some(pass) = self.passes.get(&(format, load_op)) {
            return Ok(*pass);
        }

        let attachment = AttachmentDesc {
            format,
            samples: 1,
            load_op,
            store_op: StoreOp::Store,
            initial_layout: ImageLayout::Undefined,
            final_layout: ImageLayout::ShaderReadOnly,
        };
        let desc = if format.is_depth() {
            RenderPassDesc { color_attachments: Vec::new(), depth_attachment: Some(attachment) }
        } else {
            RenderPassDesc { color_attachments: vec![attachment], depth_attachment: None }
        };
        let pass = device.create_render_pass(&desc)?;
        self.passes.insert((format, load_op), pass);
        engine_debug!(SOURCE, "Created offscreen render pass for {:?} ({:?})", format, load_op);
        Ok(pass)
    }

    /// Framebuffer for `target`, destroyed by the next `recycle`
    pub fn framebuffer(
        &mut self,
        device: &mut dyn GraphicsDevice,
        render_pass: RenderPassKey,
        target: &RenderTargetRef,
    ) -> Result<FramebufferKey> {
        let (color_attachments, depth_attachment) = if target.format.is_depth() {
            (Vec::new(), Some(target.view))
        } else {
            (vec![target.view], None)
        };
        let framebuffer = device.create_framebuffer(&FramebufferDesc {
            render_pass,
            color_attachments,
            depth_attachment,
            width: target.extent.width,
            height: target.extent.height,
        })?;
        self.retired.push(framebuffer);
        Ok(framebuffer)
    }

    /// Destroy framebuffers of the previous frame
    ///
    /// Only call once the GPU finished that frame (after the in-flight fence).
    pub fn recycle(&mut self, device: &mut dyn GraphicsDevice) {
        for framebuffer in self.retired.drain(..) {
            device.destroy_framebuffer(framebuffer);
        }
    }

    pub fn pending_framebuffers(&self) -> usize {
        self.retired.len()
    }

    pub fn destroy(&mut self, device: &mut dyn GraphicsDevice) {
        self.recycle(device);
        for (_, pass) in self.passes.drain() {
            device.destroy_render_pass(pass);
        }
    }
}

impl Default for OffscreenPasses {
    fn default() -> Self {
        Self::new()
    }
}

// ===== FRAME CONTEXT =====

/// Renderer-owned state a frame context borrows
pub struct FrameResources<'a> {
    pub device: &'a mut dyn GraphicsDevice,
    pub cmd: &'a mut dyn CommandList,
    pub pool: &'a mut TemporaryResourcePool,
    pub offscreen: &'a mut OffscreenPasses,
    pub targets: &'a CameraTargets,
    pub resources: &'a ResourceManager,
    pub queues: &'a RenderQueueManager,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpenPass {
    None,
    Camera,
    Other,
}

pub struct FrameRenderContext<'a> {
    device: &'a mut dyn GraphicsDevice,
    cmd: &'a mut dyn CommandList,
    pool: &'a mut TemporaryResourcePool,
    offscreen: &'a mut OffscreenPasses,
    targets: &'a CameraTargets,
    resources: &'a ResourceManager,
    queues: &'a RenderQueueManager,
    bound: BoundState,
    frame_index: u64,
    clear_color: [f32; 4],
    debug_labels: bool,
    scopes: Vec<String>,
    open_pass: OpenPass,
    camera_cleared: bool,
    stats: SubmitStats,
}

impl<'a> FrameRenderContext<'a> {
    pub fn new(parts: FrameResources<'a>, frame_index: u64, clear_color: [f32; 4]) -> Self {
        let debug_labels = parts.device.capabilities().contains(RendererCapabilities::DEBUG_LABELS);
        Self {
            device: parts.device,
            cmd: parts.cmd,
            pool: parts.pool,
            offscreen: parts.offscreen,
            targets: parts.targets,
            resources: parts.resources,
            queues: parts.queues,
            bound: BoundState::default(),
            frame_index,
            clear_color,
            debug_labels,
            scopes: Vec::new(),
            open_pass: OpenPass::None,
            camera_cleared: false,
            stats: SubmitStats::default(),
        }
    }

    /// Everything drawn through this context so far
    pub fn stats(&self) -> SubmitStats {
        self.stats
    }

    pub fn is_in_pass(&self) -> bool {
        self.open_pass != OpenPass::None
    }

    /// True once the camera targets were cleared this frame
    pub fn camera_cleared(&self) -> bool {
        self.camera_cleared
    }

    /// Unwind open scopes and passes after a failure
    pub fn close_all(&mut self) {
        while !self.scopes.is_empty() {
            if self.pop_scope().is_err() {
                self.scopes.clear();
            }
        }
        if self.end_pass_if_open().is_err() {
            self.open_pass = OpenPass::None;
        }
    }

    fn owner(&self) -> &str {
        self.scopes.last().map(String::as_str).unwrap_or(ROOT_SCOPE)
    }

    fn set_full_viewport(&mut self, extent: Extent2D) -> Result<()> {
        self.cmd.set_viewport(Viewport::from_size(extent.width, extent.height))?;
        self.cmd.set_scissor(Rect2D::from_size(extent.width, extent.height))
    }

    /// Open a pass on an explicit target
    fn begin_offscreen(&mut self, target: &RenderTargetRef, load_op: LoadOp) -> Result<()> {
        self.end_pass_if_open()?;
        let render_pass = self.offscreen.render_pass(&mut *self.device, target.format, load_op)?;
        let framebuffer = self.offscreen.framebuffer(&mut *self.device, render_pass, target)?;
        let clears = match (load_op, target.format.is_depth()) {
            (LoadOp::Clear, true) => vec![ClearValue::DepthStencil { depth: 1.0, stencil: 0 }],
            (LoadOp::Clear, false) => vec![ClearValue::Color([0.0, 0.0, 0.0, 0.0])],
            _ => Vec::new(),
        };
        self.begin_target_pass(render_pass, framebuffer, target.extent, &clears)
    }

    fn draw_vertices(&mut self, pipeline: PipelineKey, vertex_count: u32, constants: &[u8]) -> Result<()> {
        self.cmd.bind_pipeline(pipeline)?;
        if !constants.is_empty() {
            self.cmd.push_constants(0, constants)?;
        }
        self.cmd.draw(vertex_count, 0)?;
        // Whatever a queue bound last is no longer bound
        self.bound.invalidate();
        self.stats.draw_calls += 1;
        self.stats.pipeline_binds += 1;
        Ok(())
    }
}

impl RenderContext for FrameRenderContext<'_> {
    fn command_list(&mut self) -> &mut dyn CommandList {
        &mut *self.cmd
    }

    fn device(&mut self) -> &mut dyn GraphicsDevice {
        &mut *self.device
    }

    fn camera_color(&self) -> RenderTargetRef {
        self.targets.color()
    }

    fn camera_depth(&self) -> RenderTargetRef {
        self.targets.depth()
    }

    fn render_target_size(&self) -> Extent2D {
        self.targets.extent()
    }

    fn resource_manager(&self) -> &ResourceManager {
        self.resources
    }

    fn queues(&self) -> &RenderQueueManager {
        self.queues
    }

    fn frame_index(&self) -> u64 {
        self.frame_index
    }

    fn create_temporary_texture(&mut self, desc: &TextureDesc) -> Result<TemporaryTexture> {
        let owner = self.owner().to_string();
        self.pool.acquire_texture(&mut *self.device, desc, &owner)
    }

    fn release_temporary_texture(&mut self, texture: TextureKey) -> Result<()> {
        self.pool.release_texture(texture)
    }

    fn create_temporary_buffer(&mut self, desc: &BufferDesc) -> Result<TemporaryBuffer> {
        let owner = self.owner().to_string();
        self.pool.acquire_buffer(&mut *self.device, desc, &owner)
    }

    fn release_temporary_buffer(&mut self, buffer: BufferKey) -> Result<()> {
        self.pool.release_buffer(buffer)
    }

    fn draw_full_screen(
        &mut self,
        pipeline: PipelineKey,
        constants: &[u8],
        target: Option<RenderTargetRef>,
    ) -> Result<()> {
        match target {
            None => {
                self.begin_camera_pass()?;
                self.draw_vertices(pipeline, 3, constants)
            }
            Some(target) => {
                self.begin_offscreen(&target, LoadOp::DontCare)?;
                self.draw_vertices(pipeline, 3, constants)?;
                self.end_pass()
            }
        }
    }

    fn draw_procedural(
        &mut self,
        pipeline: PipelineKey,
        vertex_count: u32,
        constants: &[u8],
        target: Option<RenderTargetRef>,
    ) -> Result<()> {
        match target {
            None => {
                self.begin_camera_pass()?;
                self.draw_vertices(pipeline, vertex_count, constants)
            }
            Some(target) => {
                self.begin_offscreen(&target, LoadOp::Clear)?;
                self.draw_vertices(pipeline, vertex_count, constants)?;
                self.end_pass()
            }
        }
    }

    fn blit_texture(&mut self, src: TextureKey, dst: TextureKey) -> Result<()> {
        self.end_pass_if_open()?;
        self.cmd.blit_texture(src, dst)
    }

    fn begin_camera_pass(&mut self) -> Result<()> {
        match self.open_pass {
            OpenPass::Camera => return Ok(()),
            OpenPass::Other => self.end_pass()?,
            OpenPass::None => {}
        }

        let extent = self.targets.extent();
        let area = Rect2D::from_size(extent.width, extent.height);
        if self.camera_cleared {
            self.cmd.begin_render_pass(self.targets.load_pass(), self.targets.framebuffer(), area, &[])?;
        } else {
            let clears = CameraTargets::clear_values(self.clear_color);
            self.cmd.begin_render_pass(self.targets.clear_pass(), self.targets.framebuffer(), area, &clears)?;
            self.camera_cleared = true;
        }
        self.open_pass = OpenPass::Camera;
        self.bound.invalidate();
        self.set_full_viewport(extent)
    }

    fn begin_target_pass(
        &mut self,
        render_pass: RenderPassKey,
        framebuffer: FramebufferKey,
        extent: Extent2D,
        clear_values: &[ClearValue],
    ) -> Result<()> {
        self.end_pass_if_open()?;
        let area = Rect2D::from_size(extent.width, extent.height);
        self.cmd.begin_render_pass(render_pass, framebuffer, area, clear_values)?;
        self.open_pass = OpenPass::Other;
        self.bound.invalidate();
        self.set_full_viewport(extent)
    }

    fn end_pass(&mut self) -> Result<()> {
        if self.open_pass == OpenPass::None {
            return Err(Error::InvalidState("no render pass is open".to_string()));
        }
        self.open_pass = OpenPass::None;
        self.cmd.end_render_pass()
    }

    fn end_pass_if_open(&mut self) -> Result<()> {
        if self.open_pass == OpenPass::None {
            return Ok(());
        }
        self.end_pass()
    }

    fn submit_queues(&mut self, range: QueueRange, params: &DrawParams) -> Result<SubmitStats> {
        if self.open_pass == OpenPass::None {
            return Err(Error::InvalidState("queue submission outside a render pass".to_string()));
        }
        let stats = self.queues.submit_range(range, &mut *self.cmd, params, &mut self.bound)?;
        self.stats += stats;
        Ok(stats)
    }

    fn push_scope(&mut self, name: &str) -> Result<()> {
        if self.debug_labels {
            self.cmd.begin_debug_label(name)?;
        }
        engine_trace!(SOURCE, "Enter '{}'", name);
        self.scopes.push(name.to_string());
        Ok(())
    }

    fn pop_scope(&mut self) -> Result<()> {
        if self.scopes.pop().is_none() {
            return Err(Error::InvalidState("pop_scope without push_scope".to_string()));
        }
        if self.debug_labels {
            self.cmd.end_debug_label()?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "render_context_tests.rs"]
mod tests;
