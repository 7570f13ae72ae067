//! Renderer: per-frame orchestration of core passes and features

mod resource_manager;
mod temporary_pool;
mod camera_targets;
mod render_context;
mod basic_renderer;

pub use resource_manager::ResourceManager;
pub use temporary_pool::{TemporaryResourcePool, TemporaryTexture, TemporaryBuffer, PoolStats};
pub use camera_targets::{CameraTargets, RenderTargetRef, CAMERA_COLOR_FORMAT, CAMERA_DEPTH_FORMAT};
pub use render_context::{
    RenderContext, FrameRenderContext, FrameResources, SetupContext, OffscreenPasses,
};
pub use basic_renderer::{BasicRenderer, FrameReport, TEMPORARY_IDLE_FRAMES};
