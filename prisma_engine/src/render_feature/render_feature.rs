/// RenderFeature trait - pluggable rendering logic run at a named frame event
///
/// Features are owned by the `RenderFeatureManager`. Each declares the event
/// it runs at and its order within that event; the manager may override both.

use std::any::Any;
use crate::frame::FrameContext;
use crate::error::Result;
use crate::graphics_device::{GraphicsDevice, PipelineKey};
use crate::renderer::{RenderContext, SetupContext};
use crate::rendering::RenderingData;
use crate::engine_warn;

const SOURCE: &str = "prisma::RenderFeature";

/// Hook points of the frame, in the order the renderer reaches them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RenderPassEvent {
    BeforeRendering,
    BeforeRenderingShadows,
    AfterRenderingShadows,
    BeforeRenderingOpaques,
    AfterRenderingOpaques,
    BeforeRenderingSkybox,
    AfterRenderingSkybox,
    BeforeRenderingTransparents,
    AfterRenderingTransparents,
    AfterRendering,
}

impl RenderPassEvent {
    pub const ALL: [RenderPassEvent; 10] = [
        RenderPassEvent::BeforeRendering,
        RenderPassEvent::BeforeRenderingShadows,
        RenderPassEvent::AfterRenderingShadows,
        RenderPassEvent::BeforeRenderingOpaques,
        RenderPassEvent::AfterRenderingOpaques,
        RenderPassEvent::BeforeRenderingSkybox,
        RenderPassEvent::AfterRenderingSkybox,
        RenderPassEvent::BeforeRenderingTransparents,
        RenderPassEvent::AfterRenderingTransparents,
        RenderPassEvent::AfterRendering,
    ];
}

impl Default for RenderPassEvent {
    fn default() -> Self {
        RenderPassEvent::AfterRenderingOpaques
    }
}

pub trait RenderFeature: Send {
    fn name(&self) -> &str;

    fn pass_event(&self) -> RenderPassEvent {
        RenderPassEvent::default()
    }

    /// Position among the features of the same event, ascending
    fn order(&self) -> i32 {
        0
    }

    /// Skipped when post-processing is toggled off for the frame
    fn is_post_processing(&self) -> bool {
        false
    }

    /// Skipped unless the frame has the debug view toggled on
    fn is_debug(&self) -> bool {
        false
    }

    /// Look up pipelines and create persistent resources
    ///
    /// Returning false disables the feature for the session.
    fn initialize(&mut self, _setup: &mut SetupContext) -> bool {
        true
    }

    fn on_frame_begin(&mut self, _frame: &FrameContext) {}

    fn on_frame_end(&mut self) {}

    /// Record the feature's work; temporaries must be released before returning
    fn execute(&mut self, ctx: &mut dyn RenderContext, data: &RenderingData) -> Result<()>;

    fn cleanup(&mut self, _device: &mut dyn GraphicsDevice) {}

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Resolve `names` in the setup's resource manager, all or nothing
///
/// Missing pipelines are logged against `feature`.
pub fn require_pipelines<const N: usize>(
    setup: &SetupContext,
    feature: &str,
    names: [&str; N],
) -> Option<[PipelineKey; N]> {
    let found = names.map(|name| setup.resources.pipeline(name));
    let missing: Vec<&str> = names
        .iter()
        .zip(found.iter())
        .filter(|(_, key)| key.is_none())
        .map(|(name, _)| *name)
        .collect();
    if !missing.is_empty() {
        engine_warn!(SOURCE, "Feature '{}' is missing pipeline(s): {}", feature, missing.join(", "));
        return None;
    }
    Some(found.map(|key| key.unwrap_or_default()))
}
