//! Engine configuration
//!
//! Plain `Clone` structs with `Default` values. `Config` drives the engine
//! and backend creation, `RendererConfig` the per-frame renderer toggles.

use bitflags::bitflags;
use crate::graphics_device::{PresentMode, SurfaceFormat};
use crate::log::LogSeverity;

/// Validation layer severity filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugSeverity {
    ErrorsOnly,
    ErrorsAndWarnings,
    All,
}

/// Validation message categories to forward to the logger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebugMessageFilter {
    pub show_general: bool,
    pub show_validation: bool,
    pub show_performance: bool,
}

impl Default for DebugMessageFilter {
    fn default() -> Self {
        Self {
            show_general: true,
            show_validation: true,
            show_performance: true,
        }
    }
}

/// Counters of validation messages seen by the backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationStats {
    pub errors: u32,
    pub warnings: u32,
    pub info: u32,
    pub verbose: u32,
}

impl ValidationStats {
    pub fn total(&self) -> u32 {
        self.errors + self.warnings + self.info + self.verbose
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}

bitflags! {
    /// Optional backend capabilities
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RendererCapabilities: u32 {
        /// Command recording may happen on several threads
        const MULTI_THREADED = 1 << 0;
        /// Depth test/write/compare can change inside a render pass
        const DYNAMIC_DEPTH_STATE = 1 << 1;
        /// Debug labels are forwarded to the GPU debugger
        const DEBUG_LABELS = 1 << 2;
    }
}

/// Per-frame renderer toggles
#[derive(Debug, Clone, PartialEq)]
pub struct RendererConfig {
    pub enable_shadows: bool,
    pub enable_post_processing: bool,
    pub enable_skybox: bool,
    /// Run debug-class features
    pub debug_view: bool,
    pub enable_frustum_culling: bool,
    /// Camera target clear color (linear RGBA)
    pub clear_color: [f32; 4],
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            enable_shadows: true,
            enable_post_processing: true,
            enable_skybox: true,
            debug_view: false,
            enable_frustum_culling: true,
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub app_name: String,
    pub app_version: (u32, u32, u32),

    /// Enable backend validation layers (only honored when the backend was built with them)
    pub enable_validation: bool,
    pub debug_severity: DebugSeverity,
    pub debug_message_filter: DebugMessageFilter,
    /// Minimum severity printed by the default logger
    pub log_level: LogSeverity,

    /// Surface format to use when the surface offers it
    pub preferred_surface_format: Option<SurfaceFormat>,
    pub preferred_present_mode: PresentMode,

    /// Timeout for the in-flight fence wait, in nanoseconds
    pub fence_timeout_ns: u64,
    /// Upper bound applied to the frame delta time, in seconds
    pub max_delta_time: f32,
    /// Temporary pool size above which growth is reported
    pub temporary_pool_warn_threshold: usize,

    pub renderer: RendererConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "Prisma Application".to_string(),
            app_version: (1, 0, 0),
            enable_validation: cfg!(debug_assertions),
            debug_severity: DebugSeverity::ErrorsAndWarnings,
            debug_message_filter: DebugMessageFilter::default(),
            log_level: LogSeverity::Info,
            preferred_surface_format: None,
            preferred_present_mode: PresentMode::Mailbox,
            fence_timeout_ns: u64::MAX,
            max_delta_time: 0.25,
            temporary_pool_warn_threshold: 64,
            renderer: RendererConfig::default(),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
