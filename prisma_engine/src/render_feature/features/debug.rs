/// Debug visualization: G-buffer style views and bounding volumes
///
/// Only runs on frames with the debug view toggled on.

use std::any::Any;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};
use crate::error::Result;
use crate::graphics_device::{GraphicsDevice, PipelineKey};
use crate::render_queue::QueueRange;
use crate::renderer::{RenderContext, SetupContext};
use crate::rendering::RenderingData;
use crate::render_feature::{require_pipelines, RenderFeature, RenderPassEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DebugViewMode {
    #[default]
    None,
    Wireframe,
    Normals,
    Uv,
    Depth,
    Albedo,
    Metallic,
    Roughness,
    Lighting,
    Shadows,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct DebugViewConstants {
    inverse_view_projection: [[f32; 4]; 4],
    mode: u32,
    near: f32,
    far: f32,
    _pad: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct BoundsConstants {
    transform: [[f32; 4]; 4],
    color: [f32; 4],
}

pub struct DebugFeature {
    mode: DebugViewMode,
    show_bounds: bool,
    bounds_color: Vec4,
    /// debug_view, debug_bounds
    pipelines: Option<[PipelineKey; 2]>,
}

impl DebugFeature {
    pub const NAME: &'static str = "Debug";
    /// Unit cube as a triangle list
    const BOX_VERTICES: u32 = 36;

    pub fn new() -> Self {
        Self {
            mode: DebugViewMode::None,
            show_bounds: false,
            bounds_color: Vec4::new(0.0, 1.0, 0.0, 1.0),
            pipelines: None,
        }
    }

    pub fn mode(&self) -> DebugViewMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: DebugViewMode) {
        self.mode = mode;
    }

    pub fn show_bounds(&self) -> bool {
        self.show_bounds
    }

    pub fn set_show_bounds(&mut self, show: bool) {
        self.show_bounds = show;
    }

    pub fn set_bounds_color(&mut self, color: Vec4) {
        self.bounds_color = color;
    }

    /// One box transform per queued object, scaled to its bounding sphere
    fn bounds_transforms(ctx: &dyn RenderContext, view_projection: Mat4) -> Vec<Mat4> {
        ctx.queues()
            .queues_in_range(QueueRange::ALL)
            .flat_map(|queue| queue.objects())
            .map(|object| {
                view_projection
                    * Mat4::from_translation(object.bounds_center)
                    * Mat4::from_scale(glam::Vec3::splat(object.bounds_radius.max(0.0)))
            })
            .collect()
    }
}

impl Default for DebugFeature {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderFeature for DebugFeature {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn pass_event(&self) -> RenderPassEvent {
        RenderPassEvent::AfterRendering
    }

    /// On top of the UI
    fn order(&self) -> i32 {
        1000
    }

    fn is_debug(&self) -> bool {
        true
    }

    fn initialize(&mut self, setup: &mut SetupContext) -> bool {
        self.pipelines = require_pipelines(setup, Self::NAME, ["debug_view", "debug_bounds"]);
        self.pipelines.is_some()
    }

    fn execute(&mut self, ctx: &mut dyn RenderContext, data: &RenderingData) -> Result<()> {
        let Some([view, bounds]) = self.pipelines else {
            return Ok(());
        };

        if self.mode != DebugViewMode::None {
            let constants = DebugViewConstants {
                inverse_view_projection: data.inverse_view_projection().to_cols_array_2d(),
                mode: self.mode as u32,
                near: data.near(),
                far: data.far(),
                _pad: 0,
            };
            ctx.draw_full_screen(view, bytemuck::bytes_of(&constants), None)?;
        }

        if self.show_bounds {
            for transform in Self::bounds_transforms(ctx, *data.view_projection()) {
                let constants = BoundsConstants {
                    transform: transform.to_cols_array_2d(),
                    color: self.bounds_color.to_array(),
                };
                ctx.draw_procedural(bounds, Self::BOX_VERTICES, bytemuck::bytes_of(&constants), None)?;
            }
        }
        Ok(())
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
#[path = "debug_tests.rs"]
mod tests;
