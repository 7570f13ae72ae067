/// Screen-space features: ambient occlusion and reflections
///
/// Both read the camera depth after the opaque pass, work in temporaries
/// and composite back into the camera color.

use std::any::Any;
use bytemuck::{Pod, Zeroable};
use crate::error::Result;
use crate::graphics_device::{GraphicsDevice, PipelineKey, TextureFormat};
use crate::renderer::{RenderContext, RenderTargetRef, SetupContext};
use crate::rendering::RenderingData;
use crate::render_feature::{require_pipelines, RenderFeature, RenderPassEvent};
use super::scaled_target;

// ============================================================================
// SSAO
// ============================================================================

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct SsaoConstants {
    inverse_projection: [[f32; 4]; 4],
    radius: f32,
    intensity: f32,
    sample_count: u32,
    _pad: u32,
}

/// Half-resolution occlusion, blurred, then multiplied into the camera color
pub struct SsaoFeature {
    sample_count: u32,
    radius: f32,
    intensity: f32,
    /// ssao, ssao_blur, ssao_apply
    pipelines: Option<[PipelineKey; 3]>,
}

impl SsaoFeature {
    pub const NAME: &'static str = "SSAO";
    pub const MAX_SAMPLES: u32 = 256;

    pub fn new() -> Self {
        Self { sample_count: 64, radius: 0.5, intensity: 1.0, pipelines: None }
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    pub fn set_sample_count(&mut self, count: u32) {
        self.sample_count = count.clamp(1, Self::MAX_SAMPLES);
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn set_radius(&mut self, radius: f32) {
        self.radius = radius.max(0.0);
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity.max(0.0);
    }

    fn render(
        &self,
        ctx: &mut dyn RenderContext,
        pipelines: [PipelineKey; 3],
        constants: &SsaoConstants,
        ao: RenderTargetRef,
        blurred: RenderTargetRef,
    ) -> Result<()> {
        let [ssao, blur, apply] = pipelines;
        ctx.draw_full_screen(ssao, bytemuck::bytes_of(constants), Some(ao))?;
        ctx.draw_full_screen(blur, &[], Some(blurred))?;
        ctx.draw_full_screen(apply, &[], None)
    }
}

impl Default for SsaoFeature {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderFeature for SsaoFeature {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn initialize(&mut self, setup: &mut SetupContext) -> bool {
        self.pipelines = require_pipelines(setup, Self::NAME, ["ssao", "ssao_blur", "ssao_apply"]);
        self.pipelines.is_some()
    }

    fn execute(&mut self, ctx: &mut dyn RenderContext, data: &RenderingData) -> Result<()> {
        let Some(pipelines) = self.pipelines else {
            return Ok(());
        };
        let constants = SsaoConstants {
            inverse_projection: data.projection().inverse().to_cols_array_2d(),
            radius: self.radius,
            intensity: self.intensity,
            sample_count: self.sample_count,
            _pad: 0,
        };

        let desc = scaled_target(ctx.render_target_size(), 2, TextureFormat::R32_SFLOAT);
        let ao = ctx.create_temporary_texture(&desc)?;
        let blurred = match ctx.create_temporary_texture(&desc) {
            Ok(t) => t,
            Err(e) => {
                ctx.release_temporary_texture(ao.texture)?;
                return Err(e);
            }
        };

        let result = self.render(ctx, pipelines, &constants, (&ao).into(), (&blurred).into());
        ctx.release_temporary_texture(blurred.texture)?;
        ctx.release_temporary_texture(ao.texture)?;
        result
    }

    fn cleanup(&mut self, _device: &mut dyn GraphicsDevice) {
        self.pipelines = None;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ============================================================================
// SSR
// ============================================================================

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct SsrConstants {
    inverse_view_projection: [[f32; 4]; 4],
    max_iterations: u32,
    thickness: f32,
    _pad: [u32; 2],
}

/// Ray-marched reflections of the opaque result, before transparents
pub struct SsrFeature {
    max_iterations: u32,
    thickness: f32,
    /// ssr, ssr_composite
    pipelines: Option<[PipelineKey; 2]>,
}

impl SsrFeature {
    pub const NAME: &'static str = "SSR";

    pub fn new() -> Self {
        Self { max_iterations: 128, thickness: 0.01, pipelines: None }
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    pub fn set_max_iterations(&mut self, iterations: u32) {
        self.max_iterations = iterations.max(1);
    }

    pub fn thickness(&self) -> f32 {
        self.thickness
    }

    pub fn set_thickness(&mut self, thickness: f32) {
        self.thickness = thickness.max(0.0);
    }
}

impl Default for SsrFeature {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderFeature for SsrFeature {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn pass_event(&self) -> RenderPassEvent {
        RenderPassEvent::BeforeRenderingTransparents
    }

    fn initialize(&mut self, setup: &mut SetupContext) -> bool {
        self.pipelines = require_pipelines(setup, Self::NAME, ["ssr", "ssr_composite"]);
        self.pipelines.is_some()
    }

    fn execute(&mut self, ctx: &mut dyn RenderContext, data: &RenderingData) -> Result<()> {
        let Some([trace, composite]) = self.pipelines else {
            return Ok(());
        };
        let constants = SsrConstants {
            inverse_view_projection: data.inverse_view_projection().to_cols_array_2d(),
            max_iterations: self.max_iterations,
            thickness: self.thickness,
            _pad: [0; 2],
        };

        let desc = scaled_target(ctx.render_target_size(), 1, TextureFormat::R16G16B16A16_SFLOAT);
        let reflections = ctx.create_temporary_texture(&desc)?;
        let result = ctx
            .draw_full_screen(trace, bytemuck::bytes_of(&constants), Some((&reflections).into()))
            .and_then(|_| ctx.draw_full_screen(composite, &[], None));
        ctx.release_temporary_texture(reflections.texture)?;
        result
    }

    fn cleanup(&mut self, _device: &mut dyn GraphicsDevice) {
        self.pipelines = None;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
#[path = "screen_space_tests.rs"]
mod tests;
