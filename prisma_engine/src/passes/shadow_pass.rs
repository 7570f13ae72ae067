/// ShadowPass - renders shadow casters into a layered depth map
///
/// One depth array texture holds every shadow map of the frame. Directional
/// lights take one layer per cascade, spot lights one, point lights six.
/// Only the first `max_shadow_casting_lights_per_frame` casters (scene order)
/// get maps; the rest, and any light that no longer fits in the array, are
/// counted as skipped and render unshadowed.

use glam::Mat4;
use crate::error::{Error, Result};
use crate::graphics_device::{
    AttachmentDesc, ClearValue, Extent2D, FramebufferDesc, FramebufferKey, GraphicsDevice,
    ImageLayout, PipelineKey, RenderPassDesc, RenderPassKey, TextureDesc, TextureFormat,
    TextureKey, TextureUsage, TextureViewDesc, TextureViewKey,
};
use crate::render_queue::{DrawParams, QueueRange, SubmitStats};
use crate::renderer::{RenderContext, SetupContext};
use crate::rendering::{LightData, LightType, RenderingData};
use crate::shadow::{
    apply_depth_bias, calculate_cascade_projection, frustum_slice_corners,
    point_light_face_matrices, spot_light_matrices, CascadeMatrices, ShadowSettings,
};
use super::render_pass::{PassInputs, RenderPass};
use crate::{engine_debug, engine_trace, engine_warn};

const SOURCE: &str = "prisma::ShadowPass";

pub const SHADOW_MAP_FORMAT: TextureFormat = TextureFormat::D32_SFLOAT;
pub const SHADOW_DEPTH_PIPELINE: &str = "shadow_depth";

/// Shadow maps of one light
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowLightData {
    /// Index of the light in `LightingData::lights()`
    pub light_index: usize,
    /// First array layer; the light owns `matrices.len()` consecutive layers
    pub first_layer: u32,
    /// One per cascade (directional), one (spot) or six faces (point)
    pub matrices: Vec<CascadeMatrices>,
}

/// What the shadow pass produced this frame, for lit passes and diagnostics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShadowFrameData {
    /// Cascade boundaries in view depth, `cascade_count + 1` values
    pub cascade_splits: Vec<f32>,
    pub lights: Vec<ShadowLightData>,
    pub rendered_lights: u32,
    pub skipped_lights: u32,
}

impl ShadowFrameData {
    pub fn clear(&mut self) {
        self.cascade_splits.clear();
        self.lights.clear();
        self.rendered_lights = 0;
        self.skipped_lights = 0;
    }

    /// Layers written this frame
    pub fn used_layers(&self) -> u32 {
        self.lights.iter().map(|l| l.matrices.len() as u32).sum()
    }
}

struct ShadowMapArray {
    texture: TextureKey,
    render_pass: RenderPassKey,
    layer_views: Vec<TextureViewKey>,
    framebuffers: Vec<FramebufferKey>,
}

impl ShadowMapArray {
    fn destroy(self, device: &mut dyn GraphicsDevice) {
        for framebuffer in self.framebuffers {
            device.destroy_framebuffer(framebuffer);
        }
        for view in self.layer_views {
            device.destroy_texture_view(view);
        }
        device.destroy_render_pass(self.render_pass);
        device.destroy_texture(self.texture);
    }
}

pub struct ShadowPass {
    resolution: u32,
    layers: u32,
    maps: Option<ShadowMapArray>,
    pipeline: Option<PipelineKey>,
    frame_data: ShadowFrameData,
}

impl ShadowPass {
    /// Size the map array from `settings`
    pub fn new(settings: &ShadowSettings) -> Self {
        Self {
            resolution: settings.cascaded.resolution.pixels(),
            layers: settings.shadow_map_array_size.max(1),
            maps: None,
            pipeline: None,
            frame_data: ShadowFrameData::default(),
        }
    }

    /// Whether `settings` needs a differently sized array
    pub fn needs_rebuild(&self, settings: &ShadowSettings) -> bool {
        self.resolution != settings.cascaded.resolution.pixels()
            || self.layers != settings.shadow_map_array_size.max(1)
    }

    pub fn frame_data(&self) -> &ShadowFrameData {
        &self.frame_data
    }

    /// Depth array sampled by lit passes
    pub fn shadow_map(&self) -> Option<TextureKey> {
        self.maps.as_ref().map(|m| m.texture)
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn layer_count(&self) -> u32 {
        self.layers
    }

    fn create_maps(&self, device: &mut dyn GraphicsDevice) -> Result<ShadowMapArray> {
        let desc = TextureDesc::new_2d(
            self.resolution,
            self.resolution,
            SHADOW_MAP_FORMAT,
            TextureUsage::DEPTH_STENCIL_ATTACHMENT | TextureUsage::SAMPLED,
        )
        .with_layers(self.layers)
        .with_name("shadow_maps");
        let texture = device.create_texture(&desc)?;

        let render_pass = match device.create_render_pass(&RenderPassDesc {
            color_attachments: Vec::new(),
            depth_attachment: Some(
                AttachmentDesc::depth_clear(SHADOW_MAP_FORMAT).with_final_layout(ImageLayout::ShaderReadOnly),
            ),
        }) {
            Ok(pass) => pass,
            Err(e) => {
                device.destroy_texture(texture);
                return Err(e);
            }
        };

        let mut maps = ShadowMapArray {
            texture,
            render_pass,
            layer_views: Vec::with_capacity(self.layers as usize),
            framebuffers: Vec::with_capacity(self.layers as usize),
        };
        for layer in 0..self.layers {
            let built = device
                .create_texture_view(texture, &TextureViewDesc::layer(layer))
                .and_then(|view| {
                    maps.layer_views.push(view);
                    device.create_framebuffer(&FramebufferDesc {
                        render_pass,
                        color_attachments: Vec::new(),
                        depth_attachment: Some(view),
                        width: self.resolution,
                        height: self.resolution,
                    })
                });
            match built {
                Ok(framebuffer) => maps.framebuffers.push(framebuffer),
                Err(e) => {
                    maps.destroy(device);
                    return Err(e);
                }
            }
        }
        Ok(maps)
    }

    /// Assign layers and compute matrices for this frame's casters
    fn plan(&mut self, data: &RenderingData, lights: &[LightData], settings: &ShadowSettings) {
        self.frame_data.clear();
        let mut next_layer = 0;

        let casters = lights.iter().enumerate().filter(|(_, l)| l.casts_shadow_map());
        for (caster, (light_index, light)) in casters.enumerate() {
            if !settings.should_render_shadow(caster) {
                self.frame_data.skipped_lights += 1;
                continue;
            }

            let matrices = match self.light_matrices(data, light, settings) {
                Ok(matrices) => matrices,
                Err(e) => {
                    engine_warn!(SOURCE, "Light {} casts no shadow this frame: {}", light_index, e);
                    self.frame_data.skipped_lights += 1;
                    continue;
                }
            };
            let needed = matrices.len() as u32;
            if next_layer + needed > self.layers {
                engine_debug!(
                    SOURCE,
                    "Shadow map array full ({} layers), light {} needs {}",
                    self.layers, light_index, needed
                );
                self.frame_data.skipped_lights += 1;
                continue;
            }

            self.frame_data.lights.push(ShadowLightData { light_index, first_layer: next_layer, matrices });
            self.frame_data.rendered_lights += 1;
            next_layer += needed;
        }
    }

    fn light_matrices(
        &mut self,
        data: &RenderingData,
        light: &LightData,
        settings: &ShadowSettings,
    ) -> Result<Vec<CascadeMatrices>> {
        let depth_bias = light.shadow_bias * settings.depth_bias_scale;
        let biased = |m: CascadeMatrices| {
            let projection = apply_depth_bias(&m.projection, depth_bias, 0.0);
            CascadeMatrices { view: m.view, projection, view_projection: projection * m.view }
        };

        match light.light_type {
            LightType::Directional => {
                let splits = self.cascade_splits(data, settings)?;
                let matrices = splits
                    .windows(2)
                    .map(|w| {
                        let corners = frustum_slice_corners(
                            data.view(), data.projection(), data.near(), data.far(), w[0], w[1],
                        );
                        biased(calculate_cascade_projection(light.direction, &corners, self.resolution))
                    })
                    .collect();
                Ok(matrices)
            }
            LightType::Spot => Ok(vec![biased(spot_light_matrices(
                light.position,
                light.direction,
                light.outer_angle,
                light.shadow_near_plane,
                light.range,
            ))]),
            LightType::Point => Ok(point_light_face_matrices(light.position, light.shadow_near_plane, light.range)
                .into_iter()
                .map(biased)
                .collect()),
            LightType::Area => Err(Error::InvalidState("area lights have no shadow maps".to_string())),
        }
    }

    /// Split distances shared by every directional light of the frame
    fn cascade_splits(&mut self, data: &RenderingData, settings: &ShadowSettings) -> Result<Vec<f32>> {
        if !self.frame_data.cascade_splits.is_empty() {
            return Ok(self.frame_data.cascade_splits.clone());
        }
        let near = data.near();
        let far = if settings.shadow_distance > near {
            settings.shadow_distance.min(data.far())
        } else {
            data.far()
        };
        let splits = if settings.enable_cascaded_shadows {
            settings.cascaded.calculate_split_distances(near, far)?
        } else {
            vec![near, far]
        };
        self.frame_data.cascade_splits = splits.clone();
        Ok(splits)
    }
}

impl RenderPass for ShadowPass {
    fn name(&self) -> &str {
        "ShadowPass"
    }

    fn initialize(&mut self, setup: &mut SetupContext) -> Result<()> {
        let pipeline = setup.resources.pipeline(SHADOW_DEPTH_PIPELINE).ok_or_else(|| {
            Error::InvalidResource(format!("pipeline '{}' not registered", SHADOW_DEPTH_PIPELINE))
        })?;
        let maps = self.create_maps(&mut *setup.device)?;
        engine_debug!(
            SOURCE,
            "Shadow map array created: {}x{} x {} layers",
            self.resolution, self.resolution, self.layers
        );
        self.maps = Some(maps);
        self.pipeline = Some(pipeline);
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.maps.is_some() && self.pipeline.is_some()
    }

    fn execute(&mut self, ctx: &mut dyn RenderContext, inputs: &PassInputs) -> Result<SubmitStats> {
        self.frame_data.clear();
        let (Some(pipeline), true) = (self.pipeline, self.maps.is_some()) else {
            return Ok(SubmitStats::default());
        };

        self.plan(inputs.rendering_data, inputs.lighting.lights(), inputs.shadow_settings);

        let settings = inputs.shadow_settings;
        let extent = Extent2D::new(self.resolution, self.resolution);
        let clear = [ClearValue::DepthStencil { depth: 1.0, stencil: 0 }];
        let mut stats = SubmitStats::default();

        let Some(maps) = self.maps.as_ref() else {
            return Ok(stats);
        };
        for light in &self.frame_data.lights {
            for (i, matrices) in light.matrices.iter().enumerate() {
                let layer = (light.first_layer + i as u32) as usize;
                ctx.begin_target_pass(maps.render_pass, maps.framebuffers[layer], extent, &clear)?;
                ctx.command_list().set_depth_bias(settings.depth_bias_constant, settings.depth_bias_slope)?;

                let params = DrawParams {
                    view_projection: matrices.view_projection,
                    dynamic_depth_state: false,
                    pipeline_override: Some(pipeline),
                    shadow_casters_only: true,
                };
                stats += ctx.submit_queues(QueueRange::OPAQUES, &params)?;
                ctx.end_pass()?;
            }
        }

        engine_trace!(
            SOURCE,
            "{} light(s) shadowed, {} skipped, {} layer(s)",
            self.frame_data.rendered_lights,
            self.frame_data.skipped_lights,
            self.frame_data.used_layers()
        );
        Ok(stats)
    }

    fn discard_frame_output(&mut self) {
        self.frame_data.clear();
    }

    fn cleanup(&mut self, device: &mut dyn GraphicsDevice) {
        if let Some(maps) = self.maps.take() {
            maps.destroy(device);
        }
        self.pipeline = None;
        self.frame_data.clear();
    }
}

/// Light-space view-projection of the first cascade, identity without lights
pub fn main_shadow_matrix(data: &ShadowFrameData) -> Mat4 {
    data.lights
        .first()
        .and_then(|l| l.matrices.first())
        .map(CascadeMatrices::shadow_matrix)
        .unwrap_or(Mat4::IDENTITY)
}

#[cfg(test)]
#[path = "shadow_pass_tests.rs"]
mod tests;
