//! Built-in render features and the preset sets the renderer ships with

mod screen_space;
mod post_processing;
mod depth_prepass;
mod ui;
mod debug;
mod volumetric;
mod reflection;

pub use screen_space::{SsaoFeature, SsrFeature};
pub use post_processing::{
    BloomFeature, PostProcessFeature, ToneMapper, AntiAliasingFeature, AntiAliasingMode, halton,
};
pub use depth_prepass::DepthPrepassFeature;
pub use ui::{UiFeature, UiElement};
pub use debug::{DebugFeature, DebugViewMode};
pub use volumetric::{VolumetricLightFeature, VolumetricFogFeature, VolumetricCloudFeature};
pub use reflection::{ReflectionProbeFeature, ReflectionProbe};

use crate::graphics_device::{Extent2D, TextureDesc, TextureFormat, TextureUsage};
use super::RenderFeature;

/// Color target at `1/divisor` of `size`, never smaller than one texel
pub(super) fn scaled_target(size: Extent2D, divisor: u32, format: TextureFormat) -> TextureDesc {
    let divisor = divisor.max(1);
    TextureDesc::new_2d(
        (size.width / divisor).max(1),
        (size.height / divisor).max(1),
        format,
        TextureUsage::COLOR_ATTACHMENT | TextureUsage::SAMPLED,
    )
}

/// Desktop defaults
pub fn default_features() -> Vec<Box<dyn RenderFeature>> {
    vec![
        Box::new(DepthPrepassFeature::new()),
        Box::new(SsaoFeature::new()),
        Box::new(PostProcessFeature::new()),
        Box::new(AntiAliasingFeature::new()),
        Box::new(UiFeature::new()),
    ]
}

pub fn high_quality_features() -> Vec<Box<dyn RenderFeature>> {
    let mut anti_aliasing = AntiAliasingFeature::new();
    anti_aliasing.set_mode(AntiAliasingMode::Taa);
    vec![
        Box::new(DepthPrepassFeature::new()),
        Box::new(SsaoFeature::new()),
        Box::new(SsrFeature::new()),
        Box::new(BloomFeature::new()),
        Box::new(VolumetricLightFeature::new()),
        Box::new(PostProcessFeature::new()),
        Box::new(anti_aliasing),
        Box::new(UiFeature::new()),
        Box::new(ReflectionProbeFeature::new()),
    ]
}

/// Tone mapping and UI only
pub fn mobile_features() -> Vec<Box<dyn RenderFeature>> {
    vec![
        Box::new(PostProcessFeature::new()),
        Box::new(UiFeature::new()),
    ]
}

#[cfg(test)]
#[path = "feature_sets_tests.rs"]
mod tests;
