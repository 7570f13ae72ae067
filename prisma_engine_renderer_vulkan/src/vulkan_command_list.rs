/// VulkanCommandList - Vulkan implementation of the CommandList trait
///
/// Handles are resolved through the shared resource tables at record time.
/// Image layout changes are kept locally while recording and committed to
/// the tables when the list is submitted, so an abandoned recording leaves
/// the tracked layouts untouched.

use ash::vk;
use prisma_engine::prisma::{Error, Result, RendererCapabilities};
use prisma_engine::prisma::device::{
    BufferKey, ClearValue, CommandList, DepthState, FramebufferKey, IndexType, PipelineKey,
    Rect2D, RenderPassKey, StencilState, TextureKey, Viewport,
};
use prisma_engine::engine_error;
use rustc_hash::FxHashMap;
use std::any::Any;
use std::ffi::CString;
use std::sync::Arc;

use crate::vulkan_context::{GpuContext, ResourceTables};
use crate::vulkan_format::{
    compare_op_to_vk, index_type_to_vk, layout_access, stencil_op_to_vk,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordingState {
    Initial,
    Recording,
    Executable,
}

pub struct VulkanCommandList {
    ctx: Arc<GpuContext>,
    command_pool: vk::CommandPool,
    command_buffer: vk::CommandBuffer,
    state: RecordingState,
    /// Final layouts to apply when the open render pass ends
    open_pass: Option<Vec<(TextureKey, vk::ImageLayout)>>,
    /// Currently bound pipeline layout (for push constants)
    bound_pipeline_layout: Option<vk::PipelineLayout>,
    /// Layouts the recorded commands leave images in
    pending_layouts: FxHashMap<TextureKey, vk::ImageLayout>,
    label_depth: u32,
}

impl VulkanCommandList {
    /// Create a command list with its own pool
    ///
    /// # Arguments
    ///
    /// * `ctx` - Shared GPU context
    /// * `graphics_queue_family` - Graphics queue family index
    pub(crate) fn new(ctx: Arc<GpuContext>, graphics_queue_family: u32) -> Result<Self> {
        unsafe {
            let command_pool_create_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(graphics_queue_family)
                .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

            let command_pool = ctx.device.create_command_pool(&command_pool_create_info, None)
                .map_err(|e| {
                    engine_error!("prisma::vulkan", "Failed to create command pool: {:?}", e);
                    Error::BackendError(format!("Failed to create command pool: {:?}", e))
                })?;

            let command_buffer_allocate_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(command_pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);

            let command_buffers = match ctx.device.allocate_command_buffers(&command_buffer_allocate_info) {
                Ok(buffers) => buffers,
                Err(e) => {
                    ctx.device.destroy_command_pool(command_pool, None);
                    engine_error!("prisma::vulkan", "Failed to allocate command buffer: {:?}", e);
                    return Err(Error::BackendError(format!("Failed to allocate command buffers: {:?}", e)));
                }
            };

            Ok(Self {
                ctx,
                command_pool,
                command_buffer: command_buffers[0],
                state: RecordingState::Initial,
                open_pass: None,
                bound_pipeline_layout: None,
                pending_layouts: FxHashMap::default(),
                label_depth: 0,
            })
        }
    }

    /// Get the underlying Vulkan command buffer
    pub fn command_buffer(&self) -> vk::CommandBuffer {
        self.command_buffer
    }

    pub(crate) fn is_executable(&self) -> bool {
        self.state == RecordingState::Executable
    }

    /// Write the layouts recorded commands leave images in back to the tables
    pub(crate) fn commit_layouts(&self, resources: &mut ResourceTables) {
        for (&key, &layout) in &self.pending_layouts {
            if let Some(texture) = resources.textures.get_mut(key) {
                texture.layout = layout;
            }
        }
    }

    fn require_recording(&self) -> Result<()> {
        if self.state != RecordingState::Recording {
            return Err(Error::InvalidState("Command list not recording".to_string()));
        }
        Ok(())
    }

    fn require_render_pass(&self) -> Result<()> {
        self.require_recording()?;
        if self.open_pass.is_none() {
            return Err(Error::InvalidState("Not inside a render pass".to_string()));
        }
        Ok(())
    }

    /// Layout `texture` is in at this point of the recording
    fn current_layout(&self, resources: &ResourceTables, texture: TextureKey) -> Result<vk::ImageLayout> {
        match self.pending_layouts.get(&texture) {
            Some(&layout) => Ok(layout),
            None => Ok(resources.texture(texture)?.layout),
        }
    }

    /// Record a barrier moving the whole image from `old` to `new`
    fn transition(
        &mut self,
        resources: &ResourceTables,
        texture: TextureKey,
        old: vk::ImageLayout,
        new: vk::ImageLayout,
    ) -> Result<()> {
        let entry = resources.texture(texture)?;
        let (src_access, src_stage) = layout_access(old);
        let (dst_access, dst_stage) = layout_access(new);

        let barrier = vk::ImageMemoryBarrier::default()
            .old_layout(old)
            .new_layout(new)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(entry.image)
            .subresource_range(entry.full_range())
            .src_access_mask(src_access)
            .dst_access_mask(dst_access);

        unsafe {
            self.ctx.device.cmd_pipeline_barrier(
                self.command_buffer,
                src_stage,
                dst_stage,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[barrier],
            );
        }
        self.pending_layouts.insert(texture, new);
        Ok(())
    }

    fn reset_tracking(&mut self) {
        self.open_pass = None;
        self.bound_pipeline_layout = None;
        self.pending_layouts.clear();
        self.label_depth = 0;
    }
}

impl CommandList for VulkanCommandList {
    fn begin(&mut self) -> Result<()> {
        if self.state == RecordingState::Recording {
            return Err(Error::InvalidState("Command list already recording".to_string()));
        }

        unsafe {
            self.ctx.device
                .reset_command_buffer(self.command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(|e| Error::BackendError(format!("Failed to reset command buffer: {:?}", e)))?;

            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

            self.ctx.device
                .begin_command_buffer(self.command_buffer, &begin_info)
                .map_err(|e| Error::BackendError(format!("Failed to begin command buffer: {:?}", e)))?;
        }

        self.reset_tracking();
        self.state = RecordingState::Recording;
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.require_recording()?;
        if self.open_pass.is_some() {
            return Err(Error::InvalidState("Render pass not ended before ending command list".to_string()));
        }

        unsafe {
            self.ctx.device
                .end_command_buffer(self.command_buffer)
                .map_err(|e| Error::BackendError(format!("Failed to end command buffer: {:?}", e)))?;
        }
        self.state = RecordingState::Executable;
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        unsafe {
            self.ctx.device
                .reset_command_buffer(self.command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(|e| Error::BackendError(format!("Failed to reset command buffer: {:?}", e)))?;
        }
        self.reset_tracking();
        self.state = RecordingState::Initial;
        Ok(())
    }

    fn begin_render_pass(
        &mut self,
        render_pass: RenderPassKey,
        framebuffer: FramebufferKey,
        render_area: Rect2D,
        clear_values: &[ClearValue],
    ) -> Result<()> {
        self.require_recording()?;
        if self.open_pass.is_some() {
            return Err(Error::InvalidState("Already inside a render pass".to_string()));
        }

        let ctx = Arc::clone(&self.ctx);
        let resources = ctx.resources()?;
        let pass = resources.render_pass(render_pass)?;
        let target = resources.framebuffer(framebuffer)?;
        if pass.attachment_layouts.len() != target.textures.len() {
            return Err(Error::InvalidResource(format!(
                "framebuffer has {} attachments, render pass expects {}",
                target.textures.len(),
                pass.attachment_layouts.len()
            )));
        }

        // Attachments that are loaded must already be in the pass's initial layout
        let mut finals = Vec::with_capacity(target.textures.len());
        for (&texture, &(initial, final_layout)) in target.textures.iter().zip(&pass.attachment_layouts) {
            let current = self.current_layout(&resources, texture)?;
            if initial != vk::ImageLayout::UNDEFINED && current != initial {
                self.transition(&resources, texture, current, initial)?;
            }
            finals.push((texture, final_layout));
        }

        let vk_clear_values: Vec<vk::ClearValue> = clear_values
            .iter()
            .map(|cv| match cv {
                ClearValue::Color(color) => vk::ClearValue {
                    color: vk::ClearColorValue { float32: *color },
                },
                ClearValue::DepthStencil { depth, stencil } => vk::ClearValue {
                    depth_stencil: vk::ClearDepthStencilValue { depth: *depth, stencil: *stencil },
                },
            })
            .collect();

        let render_pass_info = vk::RenderPassBeginInfo::default()
            .render_pass(pass.render_pass)
            .framebuffer(target.framebuffer)
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: render_area.x, y: render_area.y },
                extent: vk::Extent2D { width: render_area.width, height: render_area.height },
            })
            .clear_values(&vk_clear_values);

        unsafe {
            ctx.device.cmd_begin_render_pass(
                self.command_buffer,
                &render_pass_info,
                vk::SubpassContents::INLINE,
            );
        }
        self.open_pass = Some(finals);
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.require_render_pass()?;
        unsafe {
            self.ctx.device.cmd_end_render_pass(self.command_buffer);
        }
        if let Some(finals) = self.open_pass.take() {
            self.pending_layouts.extend(finals);
        }
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.require_recording()?;
        let vk_viewport = vk::Viewport::default()
            .x(viewport.x)
            .y(viewport.y)
            .width(viewport.width)
            .height(viewport.height)
            .min_depth(viewport.min_depth)
            .max_depth(viewport.max_depth);
        unsafe {
            self.ctx.device.cmd_set_viewport(self.command_buffer, 0, &[vk_viewport]);
        }
        Ok(())
    }

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()> {
        self.require_recording()?;
        let vk_scissor = vk::Rect2D::default()
            .offset(vk::Offset2D { x: scissor.x, y: scissor.y })
            .extent(vk::Extent2D { width: scissor.width, height: scissor.height });
        unsafe {
            self.ctx.device.cmd_set_scissor(self.command_buffer, 0, &[vk_scissor]);
        }
        Ok(())
    }

    fn bind_pipeline(&mut self, pipeline: PipelineKey) -> Result<()> {
        self.require_recording()?;
        let (vk_pipeline, layout) = {
            let resources = self.ctx.resources()?;
            let entry = resources.pipeline(pipeline)?;
            (entry.pipeline, entry.pipeline_layout)
        };
        unsafe {
            self.ctx.device.cmd_bind_pipeline(
                self.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                vk_pipeline,
            );
        }
        self.bound_pipeline_layout = Some(layout);
        Ok(())
    }

    fn push_constants(&mut self, offset: u32, data: &[u8]) -> Result<()> {
        self.require_recording()?;
        let layout = self.bound_pipeline_layout.ok_or_else(|| {
            Error::InvalidState("No pipeline bound for push constants".to_string())
        })?;
        unsafe {
            self.ctx.device.cmd_push_constants(
                self.command_buffer,
                layout,
                vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT,
                offset,
                data,
            );
        }
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, buffer: BufferKey, offset: u64) -> Result<()> {
        self.require_recording()?;
        let vk_buffer = self.ctx.resources()?.buffer(buffer)?.buffer;
        unsafe {
            self.ctx.device.cmd_bind_vertex_buffers(self.command_buffer, 0, &[vk_buffer], &[offset]);
        }
        Ok(())
    }

    fn bind_index_buffer(&mut self, buffer: BufferKey, offset: u64, index_type: IndexType) -> Result<()> {
        self.require_recording()?;
        let vk_buffer = self.ctx.resources()?.buffer(buffer)?.buffer;
        unsafe {
            self.ctx.device.cmd_bind_index_buffer(
                self.command_buffer,
                vk_buffer,
                offset,
                index_type_to_vk(index_type),
            );
        }
        Ok(())
    }

    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()> {
        self.require_render_pass()?;
        unsafe {
            self.ctx.device.cmd_draw(
                self.command_buffer,
                vertex_count,
                1, // instance_count
                first_vertex,
                0, // first_instance
            );
        }
        Ok(())
    }

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()> {
        self.require_render_pass()?;
        unsafe {
            self.ctx.device.cmd_draw_indexed(
                self.command_buffer,
                index_count,
                1, // instance_count
                first_index,
                vertex_offset,
                0, // first_instance
            );
        }
        Ok(())
    }

    fn set_depth_state(&mut self, depth: DepthState, stencil: StencilState) -> Result<()> {
        self.require_recording()?;
        if !self.ctx.capabilities.contains(RendererCapabilities::DYNAMIC_DEPTH_STATE) {
            return Err(Error::InvalidState("Dynamic depth state requires Vulkan 1.3".to_string()));
        }

        let cb = self.command_buffer;
        let device = &self.ctx.device;
        unsafe {
            device.cmd_set_depth_test_enable(cb, depth.test_enable);
            device.cmd_set_depth_write_enable(cb, depth.write_enable);
            device.cmd_set_depth_compare_op(cb, compare_op_to_vk(depth.compare));

            device.cmd_set_stencil_test_enable(cb, stencil.enable);
            if stencil.enable {
                let faces = vk::StencilFaceFlags::FRONT_AND_BACK;
                device.cmd_set_stencil_op(
                    cb,
                    faces,
                    stencil_op_to_vk(stencil.fail_op),
                    stencil_op_to_vk(stencil.pass_op),
                    stencil_op_to_vk(stencil.depth_fail_op),
                    compare_op_to_vk(stencil.compare),
                );
                device.cmd_set_stencil_compare_mask(cb, faces, stencil.read_mask);
                device.cmd_set_stencil_write_mask(cb, faces, stencil.write_mask);
                device.cmd_set_stencil_reference(cb, faces, stencil.reference);
            }
        }
        Ok(())
    }

    fn set_depth_bias(&mut self, constant_factor: f32, slope_factor: f32) -> Result<()> {
        self.require_recording()?;
        unsafe {
            self.ctx.device.cmd_set_depth_bias(self.command_buffer, constant_factor, 0.0, slope_factor);
        }
        Ok(())
    }

    fn blit_texture(&mut self, src: TextureKey, dst: TextureKey) -> Result<()> {
        self.require_recording()?;
        if self.open_pass.is_some() {
            return Err(Error::InvalidState("blit_texture inside a render pass".to_string()));
        }

        let ctx = Arc::clone(&self.ctx);
        let resources = ctx.resources()?;
        let (src_image, src_extent, src_aspect, depth) = {
            let t = resources.texture(src)?;
            (t.image, (t.width, t.height), t.full_range().aspect_mask, t.format.is_depth())
        };
        let (dst_image, dst_extent) = {
            let t = resources.texture(dst)?;
            (t.image, (t.width, t.height))
        };

        let src_layout = self.current_layout(&resources, src)?;
        if src_layout != vk::ImageLayout::TRANSFER_SRC_OPTIMAL {
            self.transition(&resources, src, src_layout, vk::ImageLayout::TRANSFER_SRC_OPTIMAL)?;
        }
        // The whole destination is overwritten; its previous contents are discarded
        self.transition(&resources, dst, vk::ImageLayout::UNDEFINED, vk::ImageLayout::TRANSFER_DST_OPTIMAL)?;

        let layers = |aspect_mask| vk::ImageSubresourceLayers {
            aspect_mask,
            mip_level: 0,
            base_array_layer: 0,
            layer_count: 1,
        };
        let region = vk::ImageBlit {
            src_subresource: layers(src_aspect),
            src_offsets: [
                vk::Offset3D { x: 0, y: 0, z: 0 },
                vk::Offset3D { x: src_extent.0 as i32, y: src_extent.1 as i32, z: 1 },
            ],
            dst_subresource: layers(src_aspect),
            dst_offsets: [
                vk::Offset3D { x: 0, y: 0, z: 0 },
                vk::Offset3D { x: dst_extent.0 as i32, y: dst_extent.1 as i32, z: 1 },
            ],
        };

        unsafe {
            ctx.device.cmd_blit_image(
                self.command_buffer,
                src_image,
                vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                dst_image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[region],
                // Depth formats only support nearest filtering
                if depth { vk::Filter::NEAREST } else { vk::Filter::LINEAR },
            );
        }
        Ok(())
    }

    fn begin_debug_label(&mut self, name: &str) -> Result<()> {
        self.require_recording()?;
        if let Some(debug_utils) = &self.ctx.debug_utils {
            let name = CString::new(name)
                .map_err(|_| Error::InvalidResource(format!("debug label {:?} contains NUL", name)))?;
            let label = vk::DebugUtilsLabelEXT::default().label_name(&name);
            unsafe {
                debug_utils.cmd_begin_debug_utils_label(self.command_buffer, &label);
            }
        }
        self.label_depth += 1;
        Ok(())
    }

    fn end_debug_label(&mut self) -> Result<()> {
        self.require_recording()?;
        if self.label_depth == 0 {
            return Err(Error::InvalidState("end_debug_label without open label".to_string()));
        }
        if let Some(debug_utils) = &self.ctx.debug_utils {
            unsafe {
                debug_utils.cmd_end_debug_utils_label(self.command_buffer);
            }
        }
        self.label_depth -= 1;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanCommandList {
    fn drop(&mut self) {
        unsafe {
            // Command buffer is freed with its pool
            self.ctx.device.destroy_command_pool(self.command_pool, None);
        }
    }
}
