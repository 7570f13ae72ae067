/// BasicRenderer - records one frame in a fixed pass/feature order
///
/// Frame protocol, each event running the features registered at it:
///
/// ```text
/// BeforeRendering
///   BeforeRenderingShadows -> ShadowPass -> AfterRenderingShadows
/// BeforeRenderingOpaques -> OpaquePass -> AfterRenderingOpaques
/// BeforeRenderingSkybox -> SkyboxPass -> AfterRenderingSkybox
/// BeforeRenderingTransparents -> TransparentPass -> AfterRenderingTransparents
/// AfterRendering -> FinalBlitPass
/// ```
///
/// Errors of a core pass or a feature are logged and the frame goes on
/// without its contribution. The final blit is the exception: without it
/// there is nothing valid to present, so its error fails the frame.

use crate::camera::Camera;
use crate::config::{RendererCapabilities, RendererConfig};
use crate::error::{Error, Result};
use crate::frame::FrameContext;
use crate::graphics_device::{CommandList, Extent2D, GraphicsDevice};
use crate::passes::{
    FinalBlitPass, FrameTarget, OpaquePass, PassInputs, RenderPass, ShadowPass, SkyboxMode,
    SkyboxPass, TransparentPass,
};
use crate::render_feature::{EventStats, RenderFeature, RenderFeatureManager, RenderPassEvent};
use crate::render_queue::{BuildStats, RenderQueueBuilder, RenderQueueManager};
use crate::rendering::{LightingData, RenderToggles, RenderingData};
use crate::scene::RenderScene;
use crate::shadow::ShadowSettings;
use crate::swapchain::SwapchainState;
use super::camera_targets::CameraTargets;
use super::render_context::{FrameRenderContext, RenderContext, FrameResources, OffscreenPasses, SetupContext};
use super::resource_manager::ResourceManager;
use super::temporary_pool::{PoolStats, TemporaryResourcePool};
use crate::{engine_debug, engine_error, engine_info, engine_warn};

const SOURCE: &str = "prisma::BasicRenderer";

/// Free temporaries unused for this many frames are destroyed
pub const TEMPORARY_IDLE_FRAMES: u64 = 120;

/// What one `render` call did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    pub frame_index: u64,
    pub draw_calls: u32,
    pub pipeline_binds: u32,
    pub depth_state_changes: u32,
    pub build: BuildStats,
    pub features: EventStats,
    /// Passes not ready or toggled off this frame
    pub skipped_passes: Vec<String>,
    /// Passes whose `execute` failed
    pub failed_passes: Vec<String>,
    pub shadow_lights: u32,
    pub leaked_temporaries: usize,
    pub pool: PoolStats,
}

struct CorePasses {
    shadow: ShadowPass,
    opaque: OpaquePass,
    skybox: SkyboxPass,
    transparent: TransparentPass,
    final_blit: FinalBlitPass,
}

impl CorePasses {
    fn new(shadow_settings: &ShadowSettings) -> Self {
        Self {
            shadow: ShadowPass::new(shadow_settings),
            opaque: OpaquePass::new(),
            skybox: SkyboxPass::new(SkyboxMode::default()),
            transparent: TransparentPass::new(),
            final_blit: FinalBlitPass::new(),
        }
    }

    fn each_mut(&mut self) -> [&mut dyn RenderPass; 5] {
        [
            &mut self.shadow,
            &mut self.opaque,
            &mut self.skybox,
            &mut self.transparent,
            &mut self.final_blit,
        ]
    }
}

pub struct BasicRenderer {
    config: RendererConfig,
    shadow_settings: ShadowSettings,
    capabilities: RendererCapabilities,
    resources: ResourceManager,
    queues: RenderQueueManager,
    pool: TemporaryResourcePool,
    offscreen: OffscreenPasses,
    targets: Option<CameraTargets>,
    passes: CorePasses,
    features: RenderFeatureManager,
    rendering_data: Option<RenderingData>,
    initialized: bool,
}

impl BasicRenderer {
    pub fn new(config: RendererConfig, pool_warn_threshold: usize) -> Self {
        let shadow_settings = ShadowSettings::default();
        Self {
            passes: CorePasses::new(&shadow_settings),
            config,
            shadow_settings,
            capabilities: RendererCapabilities::empty(),
            resources: ResourceManager::new(),
            queues: RenderQueueManager::new(),
            pool: TemporaryResourcePool::new(pool_warn_threshold),
            offscreen: OffscreenPasses::new(),
            targets: None,
            features: RenderFeatureManager::new(),
            rendering_data: None,
            initialized: false,
        }
    }

    // ===== LIFECYCLE =====

    /// Create the camera targets and initialize passes and features
    ///
    /// Pipelines must be registered in the resource manager beforehand.
    /// A pass or feature that fails to initialize is skipped; only a
    /// camera-target failure is an error.
    pub fn initialize(&mut self, device: &mut dyn GraphicsDevice, swapchain: &SwapchainState) -> Result<()> {
        if self.initialized {
            engine_warn!(SOURCE, "BasicRenderer already initialized");
            return Err(Error::InvalidState("renderer already initialized".to_string()));
        }
        let extent = swapchain.extent();
        self.targets = Some(CameraTargets::create(device, extent)?);
        self.capabilities = device.capabilities();

        let mut setup = SetupContext {
            device,
            resources: &self.resources,
            screen_size: extent,
            capabilities: self.capabilities,
        };
        for pass in self.passes.each_mut() {
            if let Err(e) = pass.initialize(&mut setup) {
                engine_warn!(SOURCE, "Pass '{}' not ready: {}", pass.name(), e);
            }
        }
        self.features.initialize_all(&mut setup);

        self.initialized = true;
        engine_info!(
            SOURCE,
            "BasicRenderer initialized: {}x{}, {} feature(s)",
            extent.width, extent.height, self.features.count()
        );
        Ok(())
    }

    /// Follow a swapchain rebuild: resize targets, drop sized temporaries and
    /// reinitialize features against the new size
    pub fn on_swapchain_recreated(&mut self, device: &mut dyn GraphicsDevice, swapchain: &SwapchainState) -> Result<()> {
        if !self.initialized {
            return Ok(());
        }
        let extent = swapchain.extent();
        if self.targets.as_ref().map(|t| t.extent()) != Some(extent) {
            if let Some(targets) = self.targets.take() {
                targets.destroy(device);
            }
            self.offscreen.recycle(device);
            self.pool.destroy_all(device);
            self.targets = Some(CameraTargets::create(device, extent)?);
            engine_debug!(SOURCE, "Camera targets resized to {}x{}", extent.width, extent.height);
        }

        self.features.cleanup_all(device);
        let mut setup = SetupContext {
            device,
            resources: &self.resources,
            screen_size: extent,
            capabilities: self.capabilities,
        };
        self.features.initialize_all(&mut setup);
        Ok(())
    }

    /// Release every GPU object the renderer owns; idempotent
    pub fn cleanup(&mut self, device: &mut dyn GraphicsDevice) {
        if !self.initialized {
            return;
        }
        self.features.cleanup_all(device);
        for pass in self.passes.each_mut() {
            pass.cleanup(device);
        }
        self.pool.destroy_all(device);
        self.offscreen.destroy(device);
        if let Some(targets) = self.targets.take() {
            targets.destroy(device);
        }
        self.rendering_data = None;
        self.initialized = false;
        engine_debug!(SOURCE, "BasicRenderer cleaned up");
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    // ===== CONFIGURATION =====

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut RendererConfig {
        &mut self.config
    }

    /// Features added after `initialize` are initialized with the next
    /// swapchain recreation, or by `initialize_pending_features`
    pub fn add_feature(&mut self, feature: Box<dyn RenderFeature>) -> Result<()> {
        self.features.add_feature(feature)
    }

    pub fn initialize_pending_features(&mut self, device: &mut dyn GraphicsDevice) -> usize {
        let Some(extent) = self.targets.as_ref().map(|t| t.extent()) else {
            return 0;
        };
        let mut setup = SetupContext {
            device,
            resources: &self.resources,
            screen_size: extent,
            capabilities: self.capabilities,
        };
        self.features.initialize_all(&mut setup)
    }

    pub fn feature_manager(&self) -> &RenderFeatureManager {
        &self.features
    }

    pub fn feature_manager_mut(&mut self) -> &mut RenderFeatureManager {
        &mut self.features
    }

    pub fn resource_manager(&self) -> &ResourceManager {
        &self.resources
    }

    pub fn resource_manager_mut(&mut self) -> &mut ResourceManager {
        &mut self.resources
    }

    /// Takes effect at the next frame; a differently sized map array is rebuilt then
    pub fn set_shadow_settings(&mut self, settings: ShadowSettings) {
        self.shadow_settings = settings;
    }

    pub fn shadow_settings(&self) -> &ShadowSettings {
        &self.shadow_settings
    }

    pub fn shadow_pass(&self) -> &ShadowPass {
        &self.passes.shadow
    }

    pub fn skybox_pass_mut(&mut self) -> &mut SkyboxPass {
        &mut self.passes.skybox
    }

    pub fn queue_manager(&self) -> &RenderQueueManager {
        &self.queues
    }

    /// Snapshot of the last prepared frame
    pub fn rendering_data(&self) -> Option<&RenderingData> {
        self.rendering_data.as_ref()
    }

    pub fn render_target_size(&self) -> Option<Extent2D> {
        self.targets.as_ref().map(|t| t.extent())
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    // ===== FRAME =====

    /// Build the frame snapshot and the sorted queues
    ///
    /// Must run after the previous use of this frame's resources completed
    /// on the GPU: offscreen framebuffers of that frame are destroyed here.
    pub fn prepare_rendering(
        &mut self,
        device: &mut dyn GraphicsDevice,
        scene: &dyn RenderScene,
        camera: &Camera,
        frame: &FrameContext,
    ) -> Result<BuildStats> {
        let Some(extent) = self.targets.as_ref().map(|t| t.extent()) else {
            return Err(Error::InvalidState("renderer not initialized".to_string()));
        };

        self.offscreen.recycle(device);
        self.pool.begin_frame(frame.frame_index);

        let toggles = RenderToggles {
            enable_shadows: self.config.enable_shadows && self.shadow_settings.enable_shadows,
            enable_post_processing: self.config.enable_post_processing,
            enable_skybox: self.config.enable_skybox,
            debug_view: self.config.debug_view,
        };
        self.rendering_data = Some(RenderingData::new(camera, frame, extent, toggles));

        self.queues.clear();
        let build = RenderQueueBuilder::build(scene, camera, &mut self.queues, self.config.enable_frustum_culling);
        self.queues.sort_all();
        Ok(build)
    }

    /// Prepare and record one frame into `cmd`, ending in `target`
    pub fn render(
        &mut self,
        device: &mut dyn GraphicsDevice,
        cmd: &mut dyn CommandList,
        scene: &dyn RenderScene,
        camera: &Camera,
        frame: &FrameContext,
        target: &FrameTarget,
    ) -> Result<FrameReport> {
        if !self.initialized {
            return Err(Error::InvalidState("renderer not initialized".to_string()));
        }
        self.rebuild_shadow_maps(device);

        let build = self.prepare_rendering(device, scene, camera, frame)?;
        let mut report = FrameReport { frame_index: frame.frame_index, build, ..FrameReport::default() };

        self.features.begin_frame(frame);
        let result = self.record(device, cmd, scene.lighting(), target, &mut report);
        self.features.end_frame();

        report.leaked_temporaries = self.pool.end_frame();
        self.pool.trim(device, TEMPORARY_IDLE_FRAMES);
        report.pool = self.pool.stats();
        report.shadow_lights = self.passes.shadow.frame_data().rendered_lights;

        result.map(|_| report)
    }

    fn rebuild_shadow_maps(&mut self, device: &mut dyn GraphicsDevice) {
        if !self.passes.shadow.needs_rebuild(&self.shadow_settings) {
            return;
        }
        let Some(extent) = self.targets.as_ref().map(|t| t.extent()) else {
            return;
        };
        self.passes.shadow.cleanup(device);
        self.passes.shadow = ShadowPass::new(&self.shadow_settings);
        let mut setup = SetupContext {
            device,
            resources: &self.resources,
            screen_size: extent,
            capabilities: self.capabilities,
        };
        match self.passes.shadow.initialize(&mut setup) {
            Ok(()) => engine_debug!(
                SOURCE,
                "Shadow maps rebuilt: {} x {} layers",
                self.passes.shadow.resolution(), self.passes.shadow.layer_count()
            ),
            Err(e) => engine_warn!(SOURCE, "Shadow maps not rebuilt: {}", e),
        }
    }

    fn record(
        &mut self,
        device: &mut dyn GraphicsDevice,
        cmd: &mut dyn CommandList,
        lighting: &LightingData,
        target: &FrameTarget,
        report: &mut FrameReport,
    ) -> Result<()> {
        let (Some(targets), Some(data)) = (self.targets.as_ref(), self.rendering_data.as_ref()) else {
            return Err(Error::InvalidState("frame not prepared".to_string()));
        };
        let toggles = *data.toggles();
        let inputs = PassInputs {
            rendering_data: data,
            lighting,
            shadow_settings: &self.shadow_settings,
            frame_target: target,
        };
        let mut ctx = FrameRenderContext::new(
            FrameResources {
                device,
                cmd,
                pool: &mut self.pool,
                offscreen: &mut self.offscreen,
                targets,
                resources: &self.resources,
                queues: &self.queues,
            },
            data.frame_index(),
            self.config.clear_color,
        );
        let features = &mut self.features;
        let passes = &mut self.passes;

        run_event(features, RenderPassEvent::BeforeRendering, &mut ctx, data, report);

        run_event(features, RenderPassEvent::BeforeRenderingShadows, &mut ctx, data, report);
        run_pass(&mut passes.shadow, toggles.enable_shadows, &mut ctx, &inputs, report);
        run_event(features, RenderPassEvent::AfterRenderingShadows, &mut ctx, data, report);

        run_event(features, RenderPassEvent::BeforeRenderingOpaques, &mut ctx, data, report);
        run_pass(&mut passes.opaque, true, &mut ctx, &inputs, report);
        run_event(features, RenderPassEvent::AfterRenderingOpaques, &mut ctx, data, report);

        run_event(features, RenderPassEvent::BeforeRenderingSkybox, &mut ctx, data, report);
        run_pass(&mut passes.skybox, toggles.enable_skybox, &mut ctx, &inputs, report);
        run_event(features, RenderPassEvent::AfterRenderingSkybox, &mut ctx, data, report);

        run_event(features, RenderPassEvent::BeforeRenderingTransparents, &mut ctx, data, report);
        run_pass(&mut passes.transparent, true, &mut ctx, &inputs, report);
        run_event(features, RenderPassEvent::AfterRenderingTransparents, &mut ctx, data, report);

        run_event(features, RenderPassEvent::AfterRendering, &mut ctx, data, report);
        let result = final_blit(&mut passes.final_blit, &mut ctx, &inputs, report);

        ctx.close_all();
        let stats = ctx.stats();
        report.draw_calls = stats.draw_calls;
        report.pipeline_binds = stats.pipeline_binds;
        report.depth_state_changes = stats.depth_state_changes;
        result
    }
}

fn run_event(
    features: &mut RenderFeatureManager,
    event: RenderPassEvent,
    ctx: &mut FrameRenderContext<'_>,
    data: &RenderingData,
    report: &mut FrameReport,
) {
    let stats = features.execute_event(event, ctx, data);
    report.features.merge(stats);
}

/// Run a pass inside a scope named after it
fn execute_scoped(pass: &mut dyn RenderPass, ctx: &mut FrameRenderContext<'_>, inputs: &PassInputs) -> Result<()> {
    ctx.push_scope(pass.name())?;
    let result = pass.execute(ctx, inputs).map(|_| ());
    if result.is_err() {
        // Leave no half-recorded pass open for the next stage
        if let Err(e) = ctx.end_pass_if_open() {
            engine_warn!(SOURCE, "Could not close render pass after '{}' failed: {}", pass.name(), e);
        }
    }
    let popped = ctx.pop_scope();
    result.and(popped)
}

fn run_pass(
    pass: &mut dyn RenderPass,
    enabled: bool,
    ctx: &mut FrameRenderContext<'_>,
    inputs: &PassInputs,
    report: &mut FrameReport,
) {
    if !enabled || !pass.is_ready() {
        pass.discard_frame_output();
        report.skipped_passes.push(pass.name().to_string());
        return;
    }
    if let Err(e) = execute_scoped(pass, ctx, inputs) {
        engine_warn!(SOURCE, "Pass '{}' failed, frame continues without it: {}", pass.name(), e);
        pass.discard_frame_output();
        report.failed_passes.push(pass.name().to_string());
    }
}

fn final_blit(
    pass: &mut FinalBlitPass,
    ctx: &mut FrameRenderContext<'_>,
    inputs: &PassInputs,
    report: &mut FrameReport,
) -> Result<()> {
    if !pass.is_ready() {
        report.skipped_passes.push(pass.name().to_string());
        return Err(Error::InvalidState("final blit pass not initialized".to_string()));
    }
    execute_scoped(pass, ctx, inputs).map_err(|e| {
        engine_error!(SOURCE, "Final blit failed, frame dropped: {}", e);
        report.failed_passes.push(pass.name().to_string());
        e
    })
}

#[cfg(test)]
#[path = "basic_renderer_tests.rs"]
mod tests;
