/// CommandList trait - for recording rendering commands

use std::any::Any;
use crate::error::Result;
use crate::graphics_device::{
    BufferKey, DepthState, FramebufferKey, IndexType, PipelineKey, RenderPassKey,
    StencilState, TextureKey,
};

/// Command list for recording rendering commands
///
/// Commands are recorded between `begin()` and `end()` and later handed to
/// `GraphicsDevice::submit()`. A command list is reused every frame; the
/// frame controller only exposes it once the in-flight fence guarding its
/// previous submission has been waited on.
pub trait CommandList: Send {
    /// Begin recording commands (resets previous contents)
    fn begin(&mut self) -> Result<()>;

    /// End recording commands
    fn end(&mut self) -> Result<()>;

    /// Discard whatever was recorded and return to the initial state
    ///
    /// Valid in any state except pending execution; used to abandon a frame
    /// whose recording failed part-way.
    fn reset(&mut self) -> Result<()>;

    /// Begin a render pass
    ///
    /// # Arguments
    ///
    /// * `render_pass` - The render pass to begin
    /// * `framebuffer` - Framebuffer compatible with `render_pass`
    /// * `render_area` - Area affected by load/store operations
    /// * `clear_values` - One per attachment using `LoadOp::Clear`, in attachment order
    fn begin_render_pass(
        &mut self,
        render_pass: RenderPassKey,
        framebuffer: FramebufferKey,
        render_area: Rect2D,
        clear_values: &[ClearValue],
    ) -> Result<()>;

    /// End the current render pass
    fn end_render_pass(&mut self) -> Result<()>;

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()>;

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()>;

    /// Bind a graphics pipeline registered with the device
    fn bind_pipeline(&mut self, pipeline: PipelineKey) -> Result<()>;

    /// Push constants to the bound pipeline (vertex + fragment stages)
    ///
    /// # Arguments
    ///
    /// * `offset` - Offset in bytes into the push constant range
    /// * `data` - Bytes to push
    fn push_constants(&mut self, offset: u32, data: &[u8]) -> Result<()>;

    fn bind_vertex_buffer(&mut self, buffer: BufferKey, offset: u64) -> Result<()>;

    fn bind_index_buffer(&mut self, buffer: BufferKey, offset: u64, index_type: IndexType) -> Result<()>;

    /// Draw non-indexed vertices
    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()>;

    /// Draw indexed vertices
    ///
    /// # Arguments
    ///
    /// * `index_count` - Number of indices to draw
    /// * `first_index` - Index of first index
    /// * `vertex_offset` - Value added to vertex index before indexing into the vertex buffer
    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()>;

    /// Set dynamic depth test/write/compare and stencil state
    fn set_depth_state(&mut self, depth: DepthState, stencil: StencilState) -> Result<()>;

    /// Set dynamic depth bias (shadow rendering)
    fn set_depth_bias(&mut self, constant_factor: f32, slope_factor: f32) -> Result<()>;

    /// Copy `src` into `dst`, scaling if sizes differ
    ///
    /// Must be recorded outside a render pass. Layout transitions are the
    /// backend's responsibility, including the one a later render pass on
    /// `dst` needs.
    fn blit_texture(&mut self, src: TextureKey, dst: TextureKey) -> Result<()>;

    /// Open a named debug region (GPU debuggers, capture tools)
    fn begin_debug_label(&mut self, name: &str) -> Result<()>;

    fn end_debug_label(&mut self) -> Result<()>;

    /// Downcast support for the backend that created this command list
    fn as_any(&self) -> &dyn Any;
}

/// Viewport dimensions and depth range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Full-target viewport with [0, 1] depth
    pub fn from_size(width: u32, height: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: width as f32,
            height: height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

/// 2D rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect2D {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect2D {
    pub fn from_size(width: u32, height: u32) -> Self {
        Self { x: 0, y: 0, width, height }
    }
}

/// Clear value for an attachment
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearValue {
    /// Color clear value (RGBA)
    Color([f32; 4]),
    /// Depth/stencil clear value
    DepthStencil { depth: f32, stencil: u32 },
}
