/// OpaquePass - front-to-back opaque geometry into the camera targets
///
/// Opens the camera pass (the first pass of the frame clears color and
/// depth) and submits the opaque queue range. The pass is left open so
/// features at `AfterRenderingOpaques` can keep drawing into it.

use crate::config::RendererCapabilities;
use crate::error::Result;
use crate::graphics_device::GraphicsDevice;
use crate::render_queue::{DrawParams, QueueRange, SubmitStats};
use crate::renderer::{RenderContext, SetupContext};
use super::render_pass::{PassInputs, RenderPass};

#[derive(Debug, Default)]
pub struct OpaquePass {
    dynamic_depth_state: bool,
    initialized: bool,
}

impl OpaquePass {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RenderPass for OpaquePass {
    fn name(&self) -> &str {
        "OpaquePass"
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
        ctx.begin_camera_pass()?;
        let params = DrawParams {
            dynamic_depth_state: self.dynamic_depth_state,
            ..DrawParams::new(*inputs.rendering_data.view_projection())
        };
        ctx.submit_queues(QueueRange::OPAQUES, &params)
    }

    fn cleanup(&mut self, _device: &mut dyn GraphicsDevice) {
        self.initialized = false;
    }
}

#[cfg(test)]
#[path = "opaque_pass_tests.rs"]
mod tests;
