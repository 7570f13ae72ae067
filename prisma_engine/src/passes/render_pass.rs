/// RenderPass trait - a core stage of the frame
///
/// Core passes run at fixed points of the frame protocol. Each one is
/// initialized once with a `SetupContext`, executed every frame with a
/// `RenderContext` and read-only `PassInputs`, and cleaned up with the
/// device. A pass whose initialization failed reports `is_ready() == false`
/// and is skipped by the renderer.

use crate::error::{Error, Result};
use crate::graphics_device::{Extent2D, FramebufferKey, GraphicsDevice, RenderPassKey, TextureKey};
use crate::render_queue::SubmitStats;
use crate::renderer::{RenderContext, SetupContext};
use crate::rendering::{LightingData, RenderingData};
use crate::shadow::ShadowSettings;
use crate::swapchain::SwapchainState;

/// The acquired swapchain image a frame ends in
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTarget {
    pub image: TextureKey,
    pub framebuffer: FramebufferKey,
    /// Swapchain render pass: loads the blitted image, ends in present layout
    pub render_pass: RenderPassKey,
    pub extent: Extent2D,
    pub image_index: u32,
}

impl FrameTarget {
    pub fn from_swapchain(state: &SwapchainState, image_index: u32) -> Result<Self> {
        let image = state.image(image_index).ok_or_else(|| {
            Error::InvalidResource(format!(
                "swapchain image {} out of range ({} images)",
                image_index,
                state.image_count()
            ))
        })?;
        Ok(Self {
            image: image.texture,
            framebuffer: image.framebuffer,
            render_pass: state.render_pass(),
            extent: state.extent(),
            image_index,
        })
    }
}

/// Read-only frame data handed to every pass
pub struct PassInputs<'a> {
    pub rendering_data: &'a RenderingData,
    pub lighting: &'a LightingData,
    pub shadow_settings: &'a ShadowSettings,
    pub frame_target: &'a FrameTarget,
}

pub trait RenderPass: Send {
    fn name(&self) -> &str;

    /// Create GPU objects and look up pipelines
    ///
    /// An error leaves the pass not ready; the frame renders without it.
    fn initialize(&mut self, setup: &mut SetupContext) -> Result<()>;

    fn is_ready(&self) -> bool;

    /// Record the pass
    fn execute(&mut self, ctx: &mut dyn RenderContext, inputs: &PassInputs) -> Result<SubmitStats>;

    /// The pass did not run or failed this frame; drop any per-frame output
    /// left from an earlier frame
    fn discard_frame_output(&mut self) {}

    /// Destroy GPU objects; the pass may be initialized again afterwards
    fn cleanup(&mut self, device: &mut dyn GraphicsDevice);
}
