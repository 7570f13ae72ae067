/// TransparentPass - back-to-front blended geometry over the opaque result

use crate::config::RendererCapabilities;
use crate::error::Result;
use crate::graphics_device::GraphicsDevice;
use crate::render_queue::{DrawParams, QueueRange, SubmitStats};
use crate::renderer::{RenderContext, SetupContext};
use super::render_pass::{PassInputs, RenderPass};

#[derive(Debug, Default)]
pub struct TransparentPass {
    dynamic_depth_state: bool,
    initialized: bool,
}

impl TransparentPass {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RenderPass for TransparentPass {
    fn name(&self) -> &str {
        "TransparentPass"
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
        // Nothing to blend: leave the pass state as features left it
        if ctx.queues().queues_in_range(QueueRange::TRANSPARENTS).all(|q| q.is_empty()) {
            return Ok(SubmitStats::default());
        }
        ctx.begin_camera_pass()?;
        let params = DrawParams {
            dynamic_depth_state: self.dynamic_depth_state,
            ..DrawParams::new(*inputs.rendering_data.view_projection())
        };
        ctx.submit_queues(QueueRange::TRANSPARENTS, &params)
    }

    fn cleanup(&mut self, _device: &mut dyn GraphicsDevice) {
        self.initialized = false;
    }
}

#[cfg(test)]
#[path = "transparent_pass_tests.rs"]
mod tests;
