//! Swapchain module - presentable image chain negotiation and lifecycle

mod swapchain_manager;

pub use swapchain_manager::{
    SwapchainManager, SwapchainState, SwapchainImage, SwapchainPreferences, RecreateOutcome,
    choose_surface_format, choose_present_mode, choose_extent, choose_image_count, negotiate,
};
