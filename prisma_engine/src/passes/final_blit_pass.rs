/// FinalBlitPass - copies the camera color into the swapchain image
///
/// After the blit the swapchain render pass is opened once (loading the
/// copied image) to draw the overlay queues; its final layout leaves the
/// image ready for presentation, so the pass runs even when nothing
/// overlays the frame.

use crate::config::RendererCapabilities;
use crate::error::Result;
use crate::graphics_device::GraphicsDevice;
use crate::render_queue::{DrawParams, QueueRange, SubmitStats};
use crate::renderer::{RenderContext, SetupContext};
use super::render_pass::{PassInputs, RenderPass};

#[derive(Debug, Default)]
pub struct FinalBlitPass {
    dynamic_depth_state: bool,
    initialized: bool,
}

impl FinalBlitPass {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RenderPass for FinalBlitPass {
    fn name(&self) -> &str {
        "FinalBlitPass"
    }

    fn initialize(&mut self, setup: &mut SetupContext) -> Result<()> {
        self.dynamic_depth_state = setup.capabilities.contains(RendererCapabilities::DYNAMIC_DEPTH_STATE);
        self.initialized = true;
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.initialized
    }

    fn execute(&mut self, ctx: &mut dyn RenderContext, inputs: &PassInputs) -> Result<SubmitStats> {
        let target = inputs.frame_target;
        let color = ctx.camera_color();
        ctx.blit_texture(color.texture, target.image)?;

        ctx.begin_target_pass(target.render_pass, target.framebuffer, target.extent, &[])?;
        let params = DrawParams {
            dynamic_depth_state: self.dynamic_depth_state,
            ..DrawParams::new(*inputs.rendering_data.view_projection())
        };
        let stats = ctx.submit_queues(QueueRange::OVERLAYS, &params)?;
        ctx.end_pass()?;
        Ok(stats)
    }

    fn cleanup(&mut self, _device: &mut dyn GraphicsDevice) {
        self.initialized = false;
    }
}

#[cfg(test)]
#[path = "final_blit_pass_tests.rs"]
mod tests;
