//! Framebuffer descriptor
//!
//! Created once and reused each frame; rebuilt only when its attachments
//! change (swapchain recreation, shadow map reallocation).

use crate::graphics_device::{RenderPassKey, TextureViewKey};

#[derive(Debug, Clone, PartialEq)]
pub struct FramebufferDesc {
    /// Render pass this framebuffer is compatible with
    pub render_pass: RenderPassKey,
    pub color_attachments: Vec<TextureViewKey>,
    pub depth_attachment: Option<TextureViewKey>,
    pub width: u32,
    pub height: u32,
}
