/// Depth pre-pass: lay down opaque depth before shading so the opaque pass
/// only shades visible fragments

use std::any::Any;
use crate::config::RendererCapabilities;
use crate::error::Result;
use crate::graphics_device::{GraphicsDevice, PipelineKey};
use crate::render_queue::{DrawParams, QueueRange};
use crate::renderer::{RenderContext, SetupContext};
use crate::rendering::RenderingData;
use crate::render_feature::{require_pipelines, RenderFeature, RenderPassEvent};

pub struct DepthPrepassFeature {
    pipeline: Option<PipelineKey>,
    dynamic_depth_state: bool,
}

impl DepthPrepassFeature {
    pub const NAME: &'static str = "DepthPrepass";

    pub fn new() -> Self {
        Self { pipeline: None, dynamic_depth_state: false }
    }
}

impl Default for DepthPrepassFeature {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderFeature for DepthPrepassFeature {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn pass_event(&self) -> RenderPassEvent {
        RenderPassEvent::BeforeRenderingOpaques
    }

    fn initialize(&mut self, setup: &mut SetupContext) -> bool {
        self.dynamic_depth_state = setup.capabilities.contains(RendererCapabilities::DYNAMIC_DEPTH_STATE);
        self.pipeline = require_pipelines(setup, Self::NAME, ["depth_prepass"]).map(|[p]| p);
        self.pipeline.is_some()
    }

    fn execute(&mut self, ctx: &mut dyn RenderContext, data: &RenderingData) -> Result<()> {
        let Some(pipeline) = self.pipeline else {
            return Ok(());
        };
        // Opening the camera pass here makes this the clearing pass of the frame
        ctx.begin_camera_pass()?;
        let params = DrawParams {
            dynamic_depth_state: self.dynamic_depth_state,
            pipeline_override: Some(pipeline),
            ..DrawParams::new(*data.view_projection())
        };
        ctx.submit_queues(QueueRange::OPAQUES, &params)?;
        Ok(())
    }

    fn cleanup(&mut self, _device: &mut dyn GraphicsDevice) {
        self.pipeline = None;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
#[path = "depth_prepass_tests.rs"]
mod tests;
