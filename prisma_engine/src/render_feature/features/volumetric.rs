/// Volumetric effects: light shafts, height fog and clouds

use std::any::Any;
use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3, Vec4};
use crate::error::Result;
use crate::graphics_device::{GraphicsDevice, PipelineKey};
use crate::renderer::{RenderContext, SetupContext, CAMERA_COLOR_FORMAT};
use crate::rendering::RenderingData;
use crate::render_feature::{require_pipelines, RenderFeature, RenderPassEvent};
use super::scaled_target;

/// Trace into a half-resolution temporary, then composite into the camera color
fn trace_and_composite(
    ctx: &mut dyn RenderContext,
    trace: PipelineKey,
    composite: PipelineKey,
    constants: &[u8],
) -> Result<()> {
    let desc = scaled_target(ctx.render_target_size(), 2, CAMERA_COLOR_FORMAT);
    let target = ctx.create_temporary_texture(&desc)?;
    let result = ctx
        .draw_full_screen(trace, constants, Some((&target).into()))
        .and_then(|_| ctx.draw_full_screen(composite, &[], None));
    ctx.release_temporary_texture(target.texture)?;
    result
}

// ============================================================================
// Light shafts
// ============================================================================

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct LightShaftConstants {
    light_uv: [f32; 2],
    intensity: f32,
    samples: u32,
}

/// Screen-space god rays radiating from a world-space light position
pub struct VolumetricLightFeature {
    light_position: Vec3,
    intensity: f32,
    samples: u32,
    /// volumetric_light, volumetric_light_composite
    pipelines: Option<[PipelineKey; 2]>,
}

impl VolumetricLightFeature {
    pub const NAME: &'static str = "VolumetricLight";

    pub fn new() -> Self {
        Self {
            light_position: Vec3::new(0.0, 10.0, 0.0),
            intensity: 0.5,
            samples: 64,
            pipelines: None,
        }
    }

    pub fn light_position(&self) -> Vec3 {
        self.light_position
    }

    pub fn set_light_position(&mut self, position: Vec3) {
        self.light_position = position;
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity.max(0.0);
    }

    pub fn samples(&self) -> u32 {
        self.samples
    }

    pub fn set_samples(&mut self, samples: u32) {
        self.samples = samples.max(1);
    }

    /// Light position in [0, 1] texture space, `None` when behind the camera
    pub fn light_screen_uv(&self, data: &RenderingData) -> Option<Vec2> {
        let clip = *data.view_projection() * Vec4::from((self.light_position, 1.0));
        if clip.w <= 0.0 {
            return None;
        }
        let ndc = Vec2::new(clip.x, clip.y) / clip.w;
        Some(ndc * 0.5 + Vec2::splat(0.5))
    }
}

impl Default for VolumetricLightFeature {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderFeature for VolumetricLightFeature {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn pass_event(&self) -> RenderPassEvent {
        RenderPassEvent::AfterRenderingTransparents
    }

    /// Ahead of bloom, which runs at the same event
    fn order(&self) -> i32 {
        -10
    }

    fn initialize(&mut self, setup: &mut SetupContext) -> bool {
        self.pipelines = require_pipelines(
            setup,
            Self::NAME,
            ["volumetric_light", "volumetric_light_composite"],
        );
        self.pipelines.is_some()
    }

    fn execute(&mut self, ctx: &mut dyn RenderContext, data: &RenderingData) -> Result<()> {
        let Some([trace, composite]) = self.pipelines else {
            return Ok(());
        };
        let Some(light_uv) = self.light_screen_uv(data) else {
            return Ok(());
        };
        let constants = LightShaftConstants {
            light_uv: light_uv.to_array(),
            intensity: self.intensity,
            samples: self.samples,
        };
        trace_and_composite(ctx, trace, composite, bytemuck::bytes_of(&constants))
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
// Height fog
// ============================================================================

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct FogConstants {
    inverse_view_projection: [[f32; 4]; 4],
    camera_position: [f32; 3],
    density: f32,
    height: f32,
    height_falloff: f32,
    _pad: [f32; 2],
}

/// Exponential height fog applied over opaques and sky
pub struct VolumetricFogFeature {
    density: f32,
    height: f32,
    height_falloff: f32,
    pipeline: Option<PipelineKey>,
}

impl VolumetricFogFeature {
    pub const NAME: &'static str = "VolumetricFog";

    pub fn new() -> Self {
        Self { density: 0.01, height: 50.0, height_falloff: 0.1, pipeline: None }
    }

    pub fn density(&self) -> f32 {
        self.density
    }

    pub fn set_density(&mut self, density: f32) {
        self.density = density.max(0.0);
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn set_height(&mut self, height: f32) {
        self.height = height;
    }

    pub fn height_falloff(&self) -> f32 {
        self.height_falloff
    }

    pub fn set_height_falloff(&mut self, falloff: f32) {
        self.height_falloff = falloff.max(0.0);
    }
}

impl Default for VolumetricFogFeature {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderFeature for VolumetricFogFeature {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn pass_event(&self) -> RenderPassEvent {
        RenderPassEvent::AfterRenderingSkybox
    }

    fn initialize(&mut self, setup: &mut SetupContext) -> bool {
        self.pipeline = require_pipelines(setup, Self::NAME, ["volumetric_fog"]).map(|[p]| p);
        self.pipeline.is_some()
    }

    fn execute(&mut self, ctx: &mut dyn RenderContext, data: &RenderingData) -> Result<()> {
        let Some(pipeline) = self.pipeline else {
            return Ok(());
        };
        // Zero density is a no-op
        if self.density <= 0.0 {
            return Ok(());
        }
        let constants = FogConstants {
            inverse_view_projection: data.inverse_view_projection().to_cols_array_2d(),
            camera_position: data.camera_position().to_array(),
            density: self.density,
            height: self.height,
            height_falloff: self.height_falloff,
            _pad: [0.0; 2],
        };
        ctx.draw_full_screen(pipeline, bytemuck::bytes_of(&constants), None)
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

// ============================================================================
// Clouds
// ============================================================================

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct CloudConstants {
    inverse_view_projection: [[f32; 4]; 4],
    camera_position: [f32; 3],
    time: f32,
    coverage: f32,
    density: f32,
    height: f32,
    _pad: f32,
}

/// Ray-marched cloud layer behind the fog
pub struct VolumetricCloudFeature {
    coverage: f32,
    density: f32,
    height: f32,
    /// volumetric_clouds, volumetric_clouds_composite
    pipelines: Option<[PipelineKey; 2]>,
}

impl VolumetricCloudFeature {
    pub const NAME: &'static str = "VolumetricCloud";

    pub fn new() -> Self {
        Self { coverage: 0.5, density: 0.8, height: 1500.0, pipelines: None }
    }

    pub fn coverage(&self) -> f32 {
        self.coverage
    }

    pub fn set_coverage(&mut self, coverage: f32) {
        self.coverage = coverage.clamp(0.0, 1.0);
    }

    pub fn density(&self) -> f32 {
        self.density
    }

    pub fn set_density(&mut self, density: f32) {
        self.density = density.max(0.0);
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn set_height(&mut self, height: f32) {
        self.height = height;
    }
}

impl Default for VolumetricCloudFeature {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderFeature for VolumetricCloudFeature {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn pass_event(&self) -> RenderPassEvent {
        RenderPassEvent::AfterRenderingSkybox
    }

    fn order(&self) -> i32 {
        -10
    }

    fn initialize(&mut self, setup: &mut SetupContext) -> bool {
        self.pipelines = require_pipelines(
            setup,
            Self::NAME,
            ["volumetric_clouds", "volumetric_clouds_composite"],
        );
        self.pipelines.is_some()
    }

    fn execute(&mut self, ctx: &mut dyn RenderContext, data: &RenderingData) -> Result<()> {
        let Some([trace, composite]) = self.pipelines else {
            return Ok(());
        };
        if self.coverage <= 0.0 {
            return Ok(());
        }
        let constants = CloudConstants {
            inverse_view_projection: data.inverse_view_projection().to_cols_array_2d(),
            camera_position: data.camera_position().to_array(),
            time: data.time() as f32,
            coverage: self.coverage,
            density: self.density,
            height: self.height,
            _pad: 0.0,
        };
        trace_and_composite(ctx, trace, composite, bytemuck::bytes_of(&constants))
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
#[path = "volumetric_tests.rs"]
mod tests;
