/// Render pass entry of the Vulkan resource tables

use ash::vk;

/// Vulkan render pass plus the layouts its attachments enter and leave in
///
/// `attachment_layouts` follows attachment order: colors first, then depth.
pub(crate) struct RenderPass {
    pub(crate) render_pass: vk::RenderPass,
    pub(crate) attachment_layouts: Vec<(vk::ImageLayout, vk::ImageLayout)>,
    device: ash::Device,
}

impl RenderPass {
    pub(crate) fn new(
        render_pass: vk::RenderPass,
        attachment_layouts: Vec<(vk::ImageLayout, vk::ImageLayout)>,
        device: ash::Device,
    ) -> Self {
        Self { render_pass, attachment_layouts, device }
    }
}

impl Drop for RenderPass {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_render_pass(self.render_pass, None);
        }
    }
}
