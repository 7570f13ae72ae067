/// Reflection probes: blend pre-captured cubemaps into the opaque result

use std::any::Any;
use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use crate::error::Result;
use crate::graphics_device::{GraphicsDevice, PipelineKey, TextureKey};
use crate::renderer::{RenderContext, SetupContext};
use crate::rendering::RenderingData;
use crate::render_feature::{require_pipelines, RenderFeature, RenderPassEvent};

#[derive(Debug, Clone, PartialEq)]
pub struct ReflectionProbe {
    pub position: Vec3,
    pub influence_radius: f32,
    /// Captured environment; probes without one are ignored
    pub cubemap: Option<TextureKey>,
    pub resolution: u32,
}

impl ReflectionProbe {
    pub fn new(position: Vec3, influence_radius: f32) -> Self {
        Self { position, influence_radius, cubemap: None, resolution: 128 }
    }

    pub fn with_cubemap(mut self, cubemap: TextureKey) -> Self {
        self.cubemap = Some(cubemap);
        self
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct ProbeConstants {
    inverse_view_projection: [[f32; 4]; 4],
    position: [f32; 3],
    influence_radius: f32,
}

pub struct ReflectionProbeFeature {
    probes: Vec<ReflectionProbe>,
    max_blended: usize,
    pipeline: Option<PipelineKey>,
}

impl ReflectionProbeFeature {
    pub const NAME: &'static str = "ReflectionProbe";

    pub fn new() -> Self {
        Self { probes: Vec::new(), max_blended: 4, pipeline: None }
    }

    pub fn add_probe(&mut self, probe: ReflectionProbe) {
        self.probes.push(probe);
    }

    pub fn set_probes(&mut self, probes: Vec<ReflectionProbe>) {
        self.probes = probes;
    }

    pub fn probes(&self) -> &[ReflectionProbe] {
        &self.probes
    }

    pub fn set_max_blended(&mut self, count: usize) {
        self.max_blended = count;
    }

    /// Captured probes nearest to `camera` first, at most `max_blended`
    fn blend_set(&self, camera: Vec3) -> Vec<&ReflectionProbe> {
        let mut probes: Vec<&ReflectionProbe> = self
            .probes
            .iter()
            .filter(|p| p.cubemap.is_some() && p.influence_radius > 0.0)
            .collect();
        probes.sort_by(|a, b| {
            a.position
                .distance_squared(camera)
                .total_cmp(&b.position.distance_squared(camera))
        });
        probes.truncate(self.max_blended);
        probes
    }
}

impl Default for ReflectionProbeFeature {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderFeature for ReflectionProbeFeature {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn pass_event(&self) -> RenderPassEvent {
        RenderPassEvent::BeforeRenderingTransparents
    }

    /// After screen-space reflections fill what they can
    fn order(&self) -> i32 {
        10
    }

    fn initialize(&mut self, setup: &mut SetupContext) -> bool {
        self.pipeline = require_pipelines(setup, Self::NAME, ["reflection_probe_blend"]).map(|[p]| p);
        self.pipeline.is_some()
    }

    fn execute(&mut self, ctx: &mut dyn RenderContext, data: &RenderingData) -> Result<()> {
        let Some(pipeline) = self.pipeline else {
            return Ok(());
        };
        let inverse_view_projection = data.inverse_view_projection().to_cols_array_2d();
        for probe in self.blend_set(data.camera_position()) {
            let constants = ProbeConstants {
                inverse_view_projection,
                position: probe.position.to_array(),
                influence_radius: probe.influence_radius,
            };
            ctx.draw_full_screen(pipeline, bytemuck::bytes_of(&constants), None)?;
        }
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
#[path = "reflection_tests.rs"]
mod tests;
