//! Core render passes run by the renderer at fixed points of the frame

mod render_pass;
mod shadow_pass;
mod opaque_pass;
mod skybox_pass;
mod transparent_pass;
mod final_blit_pass;

pub use render_pass::{RenderPass, PassInputs, FrameTarget};
pub use shadow_pass::{
    ShadowPass, ShadowFrameData, ShadowLightData, main_shadow_matrix,
    SHADOW_MAP_FORMAT, SHADOW_DEPTH_PIPELINE,
};
pub use opaque_pass::OpaquePass;
pub use skybox_pass::{SkyboxPass, SkyboxMode, SkyboxGradient, AtmosphereSettings, SkyboxConstants};
pub use transparent_pass::TransparentPass;
pub use final_blit_pass::FinalBlitPass;
