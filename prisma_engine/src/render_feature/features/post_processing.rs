/// Post-processing features: bloom, tone mapping / color grading, anti-aliasing
///
/// All three report `is_post_processing()` and are skipped on frames with
/// post-processing toggled off.

use std::any::Any;
use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use crate::error::Result;
use crate::frame::FrameContext;
use crate::graphics_device::{
    GraphicsDevice, PipelineKey, TextureDesc, TextureFormat, TextureKey, TextureUsage,
};
use crate::renderer::{RenderContext, SetupContext, TemporaryTexture, CAMERA_COLOR_FORMAT};
use crate::rendering::RenderingData;
use crate::render_feature::{require_pipelines, RenderFeature, RenderPassEvent};
use super::scaled_target;
use crate::{engine_debug, engine_warn};

const SOURCE: &str = "prisma::PostProcessing";

/// Copy the camera color into a temporary so a full-screen pass can read it
fn copy_camera_color(ctx: &mut dyn RenderContext) -> Result<TemporaryTexture> {
    let color = ctx.camera_color();
    let desc = TextureDesc::new_2d(
        color.extent.width,
        color.extent.height,
        color.format,
        TextureUsage::SAMPLED | TextureUsage::TRANSFER_DST,
    );
    let copy = ctx.create_temporary_texture(&desc)?;
    if let Err(e) = ctx.blit_texture(color.texture, copy.texture) {
        ctx.release_temporary_texture(copy.texture)?;
        return Err(e);
    }
    Ok(copy)
}

// ============================================================================
// Bloom
// ============================================================================

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct BloomConstants {
    threshold: f32,
    soft_knee: f32,
    intensity: f32,
    scatter: f32,
}

/// Bright-pass at half resolution, a downsample chain, then additive composite
pub struct BloomFeature {
    threshold: f32,
    soft_knee: f32,
    intensity: f32,
    scatter: f32,
    mip_count: u32,
    /// bloom_threshold, bloom_downsample, bloom_composite
    pipelines: Option<[PipelineKey; 3]>,
}

impl BloomFeature {
    pub const NAME: &'static str = "Bloom";
    pub const MAX_MIPS: u32 = 8;

    pub fn new() -> Self {
        Self {
            threshold: 1.0,
            soft_knee: 0.5,
            intensity: 0.5,
            scatter: 0.7,
            mip_count: 5,
            pipelines: None,
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn set_threshold(&mut self, threshold: f32) {
        self.threshold = threshold.max(0.0);
    }

    pub fn set_soft_knee(&mut self, knee: f32) {
        self.soft_knee = knee.clamp(0.0, 1.0);
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity.max(0.0);
    }

    pub fn set_scatter(&mut self, scatter: f32) {
        self.scatter = scatter.clamp(0.0, 1.0);
    }

    pub fn mip_count(&self) -> u32 {
        self.mip_count
    }

    pub fn set_mip_count(&mut self, count: u32) {
        self.mip_count = count.clamp(1, Self::MAX_MIPS);
    }

    fn render(&self, ctx: &mut dyn RenderContext, chain: &mut Vec<TemporaryTexture>) -> Result<()> {
        let Some([threshold, downsample, composite]) = self.pipelines else {
            return Ok(());
        };
        let constants = BloomConstants {
            threshold: self.threshold,
            soft_knee: self.soft_knee,
            intensity: self.intensity,
            scatter: self.scatter,
        };
        let size = ctx.render_target_size();

        for mip in 0..self.mip_count {
            let desc = scaled_target(size, 2 << mip, CAMERA_COLOR_FORMAT);
            let target = ctx.create_temporary_texture(&desc)?;
            let target_ref = (&target).into();
            chain.push(target);
            let pipeline = if mip == 0 { threshold } else { downsample };
            ctx.draw_full_screen(pipeline, bytemuck::bytes_of(&constants), Some(target_ref))?;
            // The chain stops once a level reaches a single texel
            if desc.width == 1 && desc.height == 1 {
                break;
            }
        }
        ctx.draw_full_screen(composite, bytemuck::bytes_of(&constants), None)
    }
}

impl Default for BloomFeature {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderFeature for BloomFeature {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn pass_event(&self) -> RenderPassEvent {
        RenderPassEvent::AfterRenderingTransparents
    }

    fn is_post_processing(&self) -> bool {
        true
    }

    fn initialize(&mut self, setup: &mut SetupContext) -> bool {
        self.pipelines = require_pipelines(
            setup,
            Self::NAME,
            ["bloom_threshold", "bloom_downsample", "bloom_composite"],
        );
        self.pipelines.is_some()
    }

    fn execute(&mut self, ctx: &mut dyn RenderContext, _data: &RenderingData) -> Result<()> {
        let mut chain = Vec::with_capacity(self.mip_count as usize);
        let result = self.render(ctx, &mut chain);
        for texture in chain {
            ctx.release_temporary_texture(texture.texture)?;
        }
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
// Post process (tone mapping and color grading)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToneMapper {
    None,
    Reinhard,
    #[default]
    Aces,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct PostProcessConstants {
    exposure: f32,
    gamma: f32,
    contrast: f32,
    saturation: f32,
    vignette: f32,
    tone_mapper: u32,
    _pad: [u32; 2],
}

/// HDR camera color to display range
pub struct PostProcessFeature {
    pub exposure: f32,
    pub gamma: f32,
    pub contrast: f32,
    pub saturation: f32,
    /// Vignette strength, 0 disables it
    pub vignette: f32,
    pub tone_mapper: ToneMapper,
    pipeline: Option<PipelineKey>,
}

impl PostProcessFeature {
    pub const NAME: &'static str = "PostProcess";

    pub fn new() -> Self {
        Self {
            exposure: 1.0,
            gamma: 2.2,
            contrast: 1.0,
            saturation: 1.0,
            vignette: 0.0,
            tone_mapper: ToneMapper::default(),
            pipeline: None,
        }
    }

    fn constants(&self) -> PostProcessConstants {
        PostProcessConstants {
            exposure: self.exposure.max(0.0),
            gamma: self.gamma.max(0.01),
            contrast: self.contrast,
            saturation: self.saturation,
            vignette: self.vignette.clamp(0.0, 1.0),
            tone_mapper: self.tone_mapper as u32,
            _pad: [0; 2],
        }
    }
}

impl Default for PostProcessFeature {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderFeature for PostProcessFeature {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn pass_event(&self) -> RenderPassEvent {
        RenderPassEvent::AfterRendering
    }

    fn is_post_processing(&self) -> bool {
        true
    }

    fn initialize(&mut self, setup: &mut SetupContext) -> bool {
        self.pipeline = require_pipelines(setup, Self::NAME, ["post_process"]).map(|[p]| p);
        self.pipeline.is_some()
    }

    fn execute(&mut self, ctx: &mut dyn RenderContext, _data: &RenderingData) -> Result<()> {
        let Some(pipeline) = self.pipeline else {
            return Ok(());
        };
        let source = copy_camera_color(ctx)?;
        let result = ctx.draw_full_screen(pipeline, bytemuck::bytes_of(&self.constants()), None);
        ctx.release_temporary_texture(source.texture)?;
        result
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
// Anti-aliasing
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AntiAliasingMode {
    None,
    #[default]
    Fxaa,
    Taa,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct TaaConstants {
    jitter: [f32; 2],
    feedback_min: f32,
    feedback_max: f32,
    history_valid: u32,
    _pad: [u32; 3],
}

/// Radical inverse of `index` in `base`, in [0, 1)
pub fn halton(mut index: u32, base: u32) -> f32 {
    let mut result = 0.0;
    let mut fraction = 1.0;
    while index > 0 {
        fraction /= base as f32;
        result += fraction * (index % base) as f32;
        index /= base;
    }
    result
}

/// FXAA, or TAA with a persistent history texture and Halton(2,3) jitter
pub struct AntiAliasingFeature {
    mode: AntiAliasingMode,
    jitter_offset: Vec2,
    auto_jitter: bool,
    feedback_min: f32,
    feedback_max: f32,
    fxaa: Option<PipelineKey>,
    taa: Option<PipelineKey>,
    history: Option<TextureKey>,
    history_valid: bool,
    initialized: bool,
}

impl AntiAliasingFeature {
    pub const NAME: &'static str = "AntiAliasing";
    /// Length of the jitter sequence before it repeats
    pub const JITTER_PHASES: u64 = 8;

    pub fn new() -> Self {
        Self {
            mode: AntiAliasingMode::default(),
            jitter_offset: Vec2::ZERO,
            auto_jitter: true,
            feedback_min: 0.88,
            feedback_max: 0.97,
            fxaa: None,
            taa: None,
            history: None,
            history_valid: false,
            initialized: false,
        }
    }

    pub fn mode(&self) -> AntiAliasingMode {
        self.mode
    }

    /// Switching mode invalidates the TAA history
    pub fn set_mode(&mut self, mode: AntiAliasingMode) {
        if mode != self.mode {
            self.history_valid = false;
        }
        self.mode = mode;
    }

    pub fn jitter_offset(&self) -> Vec2 {
        self.jitter_offset
    }

    /// Fixed jitter in pixels; disables the automatic sequence
    pub fn set_jitter_offset(&mut self, offset: Vec2) {
        self.jitter_offset = offset;
        self.auto_jitter = false;
    }

    pub fn set_auto_jitter(&mut self, enabled: bool) {
        self.auto_jitter = enabled;
    }

    pub fn feedback(&self) -> (f32, f32) {
        (self.feedback_min, self.feedback_max)
    }

    pub fn set_feedback(&mut self, min: f32, max: f32) {
        self.feedback_min = min.clamp(0.0, 1.0);
        self.feedback_max = max.clamp(self.feedback_min, 1.0);
    }

    pub fn has_history(&self) -> bool {
        self.history.is_some()
    }

    fn run_fxaa(&self, ctx: &mut dyn RenderContext, pipeline: PipelineKey) -> Result<()> {
        let source = copy_camera_color(ctx)?;
        let result = ctx.draw_full_screen(pipeline, &[], None);
        ctx.release_temporary_texture(source.texture)?;
        result
    }

    fn run_taa(&mut self, ctx: &mut dyn RenderContext, pipeline: PipelineKey, history: TextureKey) -> Result<()> {
        let constants = TaaConstants {
            jitter: self.jitter_offset.to_array(),
            feedback_min: self.feedback_min,
            feedback_max: self.feedback_max,
            history_valid: self.history_valid as u32,
            _pad: [0; 3],
        };
        let source = copy_camera_color(ctx)?;
        let result = ctx
            .draw_full_screen(pipeline, bytemuck::bytes_of(&constants), None)
            .and_then(|_| {
                let color = ctx.camera_color();
                ctx.blit_texture(color.texture, history)
            });
        ctx.release_temporary_texture(source.texture)?;
        result?;
        self.history_valid = true;
        Ok(())
    }
}

impl Default for AntiAliasingFeature {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderFeature for AntiAliasingFeature {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn pass_event(&self) -> RenderPassEvent {
        RenderPassEvent::AfterRendering
    }

    /// After tone mapping
    fn order(&self) -> i32 {
        10
    }

    fn is_post_processing(&self) -> bool {
        true
    }

    fn initialize(&mut self, setup: &mut SetupContext) -> bool {
        self.fxaa = setup.resources.pipeline("fxaa");
        self.taa = setup.resources.pipeline("taa_resolve");

        if self.taa.is_some() {
            let desc = TextureDesc::new_2d(
                setup.screen_size.width.max(1),
                setup.screen_size.height.max(1),
                CAMERA_COLOR_FORMAT,
                TextureUsage::SAMPLED | TextureUsage::TRANSFER_DST,
            )
            .with_name("taa_history");
            match setup.device.create_texture(&desc) {
                Ok(texture) => self.history = Some(texture),
                Err(e) => engine_warn!(SOURCE, "TAA history texture not created: {}", e),
            }
        }
        self.history_valid = false;
        self.initialized = true;

        let ready = match self.mode {
            AntiAliasingMode::None => true,
            AntiAliasingMode::Fxaa => self.fxaa.is_some(),
            AntiAliasingMode::Taa => self.taa.is_some() && self.history.is_some(),
        };
        if !ready {
            engine_warn!(SOURCE, "No pipeline for {:?} anti-aliasing", self.mode);
        }
        ready
    }

    fn on_frame_begin(&mut self, frame: &FrameContext) {
        if self.mode == AntiAliasingMode::Taa && self.auto_jitter {
            let phase = (frame.frame_index % Self::JITTER_PHASES) as u32 + 1;
            self.jitter_offset = Vec2::new(halton(phase, 2) - 0.5, halton(phase, 3) - 0.5);
        }
    }

    fn execute(&mut self, ctx: &mut dyn RenderContext, _data: &RenderingData) -> Result<()> {
        match self.mode {
            AntiAliasingMode::None => Ok(()),
            AntiAliasingMode::Fxaa => match self.fxaa {
                Some(pipeline) => self.run_fxaa(ctx, pipeline),
                None => Ok(()),
            },
            AntiAliasingMode::Taa => match (self.taa, self.history) {
                (Some(pipeline), Some(history)) => self.run_taa(ctx, pipeline, history),
                _ => Ok(()),
            },
        }
    }

    fn cleanup(&mut self, device: &mut dyn GraphicsDevice) {
        if let Some(history) = self.history.take() {
            device.destroy_texture(history);
            engine_debug!(SOURCE, "TAA history released");
        }
        self.fxaa = None;
        self.taa = None;
        self.history_valid = false;
        self.initialized = false;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
#[path = "post_processing_tests.rs"]
mod tests;
