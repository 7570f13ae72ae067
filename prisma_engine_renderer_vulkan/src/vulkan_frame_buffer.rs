/// Framebuffer entry of the Vulkan resource tables
///
/// Created once, reused each frame; the engine rebuilds it when its
/// attachments change.

use ash::vk;
use prisma_engine::prisma::device::TextureKey;

pub(crate) struct Framebuffer {
    pub(crate) framebuffer: vk::Framebuffer,
    /// Textures behind the attachments, in attachment order
    pub(crate) textures: Vec<TextureKey>,
    pub(crate) width: u32,
    pub(crate) height: u32,
    device: ash::Device,
}

impl Framebuffer {
    pub(crate) fn new(
        framebuffer: vk::Framebuffer,
        textures: Vec<TextureKey>,
        width: u32,
        height: u32,
        device: ash::Device,
    ) -> Self {
        Self { framebuffer, textures, width, height, device }
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_framebuffer(self.framebuffer, None);
        }
    }
}
