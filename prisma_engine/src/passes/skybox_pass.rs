/// SkyboxPass - background drawn behind the opaque geometry
///
/// A 36-vertex cube generated in the vertex shader, rendered in the camera
/// pass with depth test `LessEqual` and no depth write so it only fills
/// pixels nothing opaque covered. Pipelines are looked up for every mode at
/// initialization, so the mode can change between frames.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use crate::config::RendererCapabilities;
use crate::error::{Error, Result};
use crate::graphics_device::{DepthState, GraphicsDevice, PipelineKey, StencilState};
use crate::render_queue::SubmitStats;
use crate::renderer::{RenderContext, SetupContext};
use super::render_pass::{PassInputs, RenderPass};
use crate::engine_debug;

const SOURCE: &str = "prisma::SkyboxPass";

const SKYBOX_VERTEX_COUNT: u32 = 36;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SkyboxMode {
    #[default]
    Cubemap,
    Procedural,
    AtmosphericScattering,
    None,
}

impl SkyboxMode {
    pub fn pipeline_name(&self) -> Option<&'static str> {
        match self {
            SkyboxMode::Cubemap => Some("skybox_cubemap"),
            SkyboxMode::Procedural => Some("skybox_procedural"),
            SkyboxMode::AtmosphericScattering => Some("skybox_atmospheric"),
            SkyboxMode::None => None,
        }
    }

    fn slot(&self) -> Option<usize> {
        match self {
            SkyboxMode::Cubemap => Some(0),
            SkyboxMode::Procedural => Some(1),
            SkyboxMode::AtmosphericScattering => Some(2),
            SkyboxMode::None => None,
        }
    }
}

/// Sky colors of the procedural mode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyboxGradient {
    pub top: Vec3,
    pub bottom: Vec3,
    pub horizon: Vec3,
}

impl Default for SkyboxGradient {
    fn default() -> Self {
        Self {
            top: Vec3::new(0.1, 0.4, 0.8),
            bottom: Vec3::new(0.6, 0.7, 0.9),
            horizon: Vec3::new(0.8, 0.85, 0.95),
        }
    }
}

/// Single-scattering sky parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtmosphereSettings {
    pub rayleigh_coefficient: f32,
    pub mie_coefficient: f32,
    /// Mie phase anisotropy
    pub mie_g: f32,
    pub atmosphere_height: f32,
    pub sun_direction: Vec3,
    pub sun_intensity: f32,
}

impl Default for AtmosphereSettings {
    fn default() -> Self {
        Self {
            rayleigh_coefficient: 0.005,
            mie_coefficient: 0.002,
            mie_g: 0.8,
            atmosphere_height: 1000.0,
            sun_direction: Vec3::new(0.5, 0.2, 0.2),
            sun_intensity: 1.0,
        }
    }
}

/// Push constants shared by the skybox pipelines (128 bytes)
///
/// `params` holds top/bottom/horizon colors in procedural mode and
/// coefficients/sun/unused in atmospheric mode.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SkyboxConstants {
    pub inverse_view_projection: [[f32; 4]; 4],
    /// xyz camera position, w time in seconds
    pub camera: [f32; 4],
    pub params: [[f32; 4]; 3],
}

pub struct SkyboxPass {
    mode: SkyboxMode,
    gradient: SkyboxGradient,
    atmosphere: AtmosphereSettings,
    pipelines: [Option<PipelineKey>; 3],
    dynamic_depth_state: bool,
    initialized: bool,
}

impl SkyboxPass {
    pub fn new(mode: SkyboxMode) -> Self {
        Self {
            mode,
            gradient: SkyboxGradient::default(),
            atmosphere: AtmosphereSettings::default(),
            pipelines: [None; 3],
            dynamic_depth_state: false,
            initialized: false,
        }
    }

    pub fn mode(&self) -> SkyboxMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: SkyboxMode) {
        self.mode = mode;
    }

    pub fn gradient(&self) -> &SkyboxGradient {
        &self.gradient
    }

    pub fn set_gradient(&mut self, gradient: SkyboxGradient) {
        self.gradient = gradient;
    }

    pub fn atmosphere(&self) -> &AtmosphereSettings {
        &self.atmosphere
    }

    pub fn set_atmosphere(&mut self, atmosphere: AtmosphereSettings) {
        self.atmosphere = atmosphere;
    }

    fn current_pipeline(&self) -> Option<PipelineKey> {
        self.mode.slot().and_then(|slot| self.pipelines[slot])
    }

    pub fn constants(&self, inverse_view_projection: Mat4, camera_position: Vec3, time: f64) -> SkyboxConstants {
        let params = match self.mode {
            SkyboxMode::Procedural => [
                self.gradient.top.extend(1.0).to_array(),
                self.gradient.bottom.extend(1.0).to_array(),
                self.gradient.horizon.extend(1.0).to_array(),
            ],
            SkyboxMode::AtmosphericScattering => {
                let a = &self.atmosphere;
                let sun = a.sun_direction.try_normalize().unwrap_or(Vec3::Y);
                [
                    [a.rayleigh_coefficient, a.mie_coefficient, a.mie_g, a.atmosphere_height],
                    sun.extend(a.sun_intensity).to_array(),
                    [0.0; 4],
                ]
            }
            SkyboxMode::Cubemap | SkyboxMode::None => [[0.0; 4]; 3],
        };
        SkyboxConstants {
            inverse_view_projection: inverse_view_projection.to_cols_array_2d(),
            camera: camera_position.extend(time as f32).to_array(),
            params,
        }
    }
}

impl Default for SkyboxPass {
    fn default() -> Self {
        Self::new(SkyboxMode::default())
    }
}

impl RenderPass for SkyboxPass {
    fn name(&self) -> &str {
        "SkyboxPass"
    }

    fn initialize(&mut self, setup: &mut SetupContext) -> Result<()> {
        for mode in [SkyboxMode::Cubemap, SkyboxMode::Procedural, SkyboxMode::AtmosphericScattering] {
            if let (Some(slot), Some(name)) = (mode.slot(), mode.pipeline_name()) {
                self.pipelines[slot] = setup.resources.pipeline(name);
            }
        }
        self.dynamic_depth_state = setup.capabilities.contains(RendererCapabilities::DYNAMIC_DEPTH_STATE);
        self.initialized = true;

        if let Some(name) = self.mode.pipeline_name() {
            if self.current_pipeline().is_none() {
                return Err(Error::InvalidResource(format!("pipeline '{}' not registered", name)));
            }
        }
        engine_debug!(SOURCE, "Skybox ready in {:?} mode", self.mode);
        Ok(())
    }

    /// Ready when the current mode has a pipeline; `None` never is
    fn is_ready(&self) -> bool {
        self.initialized && self.current_pipeline().is_some()
    }

    fn execute(&mut self, ctx: &mut dyn RenderContext, inputs: &PassInputs) -> Result<SubmitStats> {
        let Some(pipeline) = self.current_pipeline() else {
            return Ok(SubmitStats::default());
        };
        let data = inputs.rendering_data;
        let constants = self.constants(*data.inverse_view_projection(), data.camera_position(), data.time());

        ctx.begin_camera_pass()?;
        let mut stats = SubmitStats::default();
        if self.dynamic_depth_state {
            ctx.command_list().set_depth_state(DepthState::skybox(), StencilState::disabled())?;
            stats.depth_state_changes += 1;
        }
        ctx.draw_procedural(pipeline, SKYBOX_VERTEX_COUNT, bytemuck::bytes_of(&constants), None)?;
        stats.draw_calls += 1;
        stats.pipeline_binds += 1;
        Ok(stats)
    }

    fn cleanup(&mut self, _device: &mut dyn GraphicsDevice) {
        self.pipelines = [None; 3];
        self.initialized = false;
    }
}

#[cfg(test)]
#[path = "skybox_pass_tests.rs"]
mod tests;
