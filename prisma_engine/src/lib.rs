/*!
# Prisma Engine

Frame-rendering pipeline: swapchain lifecycle, frame synchronization, render
queues, core passes with pluggable features, and cascaded shadows.

The GPU is reached only through the `GraphicsDevice` / `CommandList` traits;
backends (Vulkan in `prisma_engine_renderer_vulkan`) implement them.

## Architecture

- **Engine**: owns the device, swapchain, frame sync, renderer and clock
- **SwapchainManager**: negotiates and rebuilds the presentable image chain
- **FrameSyncController**: acquire, record, submit, present with fence discipline
- **BasicRenderer**: fixed pass order with feature hook points
- **RenderQueueManager**: sort-key based classification and dispatch
- **ShadowPass**: cascaded shadow maps in a layered depth array

The public API lives under the `prisma` namespace module.
*/

// Internal modules
mod error;
mod engine;
mod config;
pub mod log;
pub mod camera;
pub mod frame;
pub mod graphics_device;
pub mod passes;
pub mod platform;
pub mod render_feature;
pub mod render_queue;
pub mod renderer;
pub mod rendering;
pub mod scene;
pub mod shadow;
pub mod swapchain;

// Main prisma namespace module
pub mod prisma {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine and per-frame outcome
    pub use crate::engine::{Engine, FrameOutcome};

    // Configuration
    pub use crate::config::{
        Config, RendererConfig, RendererCapabilities,
        DebugSeverity, DebugMessageFilter, ValidationStats,
    };

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger, format_entry};
        // Note: engine_* macros are NOT re-exported here - they are internal only
    }

    // GPU boundary
    pub mod device {
        pub use crate::graphics_device::*;
    }

    // Frame orchestration
    pub mod render {
        pub use crate::renderer::*;
        pub use crate::passes::{
            RenderPass, PassInputs, FrameTarget, ShadowPass, ShadowFrameData, ShadowLightData,
            OpaquePass, SkyboxPass, SkyboxMode, TransparentPass, FinalBlitPass,
        };
        pub use crate::render_feature::{
            RenderFeature, RenderPassEvent, RenderFeatureManager, FeatureState, EventStats,
            default_features, high_quality_features, mobile_features,
        };
        pub use crate::rendering::*;
    }

    // Built-in features
    pub mod features {
        pub use crate::render_feature::features::*;
    }

    pub mod queue {
        pub use crate::render_queue::*;
    }

    pub mod frame {
        pub use crate::frame::*;
        pub use crate::swapchain::*;
    }

    pub mod scene {
        pub use crate::scene::*;
        pub use crate::platform::{WindowSurface, FixedSurface};
    }

    pub mod camera {
        pub use crate::camera::*;
    }

    pub mod shadow {
        pub use crate::shadow::*;
    }
}

// Re-export math library at crate root
pub use glam;
