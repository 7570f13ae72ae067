/// GpuContext - Vulkan objects shared by the device and its command lists
///
/// The device and every command list hold an `Arc<GpuContext>`; the logical
/// device and instance are destroyed when the last of them goes away, so a
/// command list outliving the `VulkanGraphicsDevice` stays valid.

use ash::vk;
use prisma_engine::prisma::{Error, Result, RendererCapabilities};
use prisma_engine::prisma::device::{
    BufferKey, FramebufferKey, PipelineKey, RenderPassKey, TextureKey, TextureViewKey,
};
use slotmap::SlotMap;
use std::sync::{Mutex, MutexGuard};

use crate::vulkan_buffer::Buffer;
use crate::vulkan_frame_buffer::Framebuffer;
use crate::vulkan_pipeline::Pipeline;
use crate::vulkan_render_pass::RenderPass;
use crate::vulkan_texture::{Texture, TextureView};

/// Generation-checked tables of every object a command list can reference
#[derive(Default)]
pub(crate) struct ResourceTables {
    pub(crate) textures: SlotMap<TextureKey, Texture>,
    pub(crate) views: SlotMap<TextureViewKey, TextureView>,
    pub(crate) buffers: SlotMap<BufferKey, Buffer>,
    pub(crate) render_passes: SlotMap<RenderPassKey, RenderPass>,
    pub(crate) framebuffers: SlotMap<FramebufferKey, Framebuffer>,
    pub(crate) pipelines: SlotMap<PipelineKey, Pipeline>,
}

impl ResourceTables {
    pub(crate) fn texture(&self, key: TextureKey) -> Result<&Texture> {
        self.textures
            .get(key)
            .ok_or_else(|| Error::InvalidResource(format!("stale texture handle {:?}", key)))
    }

    pub(crate) fn view(&self, key: TextureViewKey) -> Result<&TextureView> {
        self.views
            .get(key)
            .ok_or_else(|| Error::InvalidResource(format!("stale texture view handle {:?}", key)))
    }

    pub(crate) fn buffer(&self, key: BufferKey) -> Result<&Buffer> {
        self.buffers
            .get(key)
            .ok_or_else(|| Error::InvalidResource(format!("stale buffer handle {:?}", key)))
    }

    pub(crate) fn render_pass(&self, key: RenderPassKey) -> Result<&RenderPass> {
        self.render_passes
            .get(key)
            .ok_or_else(|| Error::InvalidResource(format!("stale render pass handle {:?}", key)))
    }

    pub(crate) fn framebuffer(&self, key: FramebufferKey) -> Result<&Framebuffer> {
        self.framebuffers
            .get(key)
            .ok_or_else(|| Error::InvalidResource(format!("stale framebuffer handle {:?}", key)))
    }

    pub(crate) fn pipeline(&self, key: PipelineKey) -> Result<&Pipeline> {
        self.pipelines
            .get(key)
            .ok_or_else(|| Error::InvalidResource(format!("unknown pipeline handle {:?}", key)))
    }

    /// Drop every entry; dependents before what they reference
    pub(crate) fn clear(&mut self) {
        self.framebuffers.clear();
        self.views.clear();
        self.render_passes.clear();
        self.pipelines.clear();
        self.buffers.clear();
        self.textures.clear();
    }
}

/// Debug utils messenger and the instance loader that destroys it
pub(crate) struct DebugMessenger {
    pub(crate) loader: ash::ext::debug_utils::Instance,
    pub(crate) messenger: vk::DebugUtilsMessengerEXT,
}

pub(crate) struct GpuContext {
    /// Keeps the Vulkan library loaded
    _entry: ash::Entry,
    instance: ash::Instance,
    pub(crate) device: ash::Device,
    /// Command-buffer label functions, present when debug utils are enabled
    pub(crate) debug_utils: Option<ash::ext::debug_utils::Device>,
    debug_messenger: Option<DebugMessenger>,
    pub(crate) capabilities: RendererCapabilities,
    resources: Mutex<ResourceTables>,
}

impl GpuContext {
    pub(crate) fn new(
        entry: ash::Entry,
        instance: ash::Instance,
        device: ash::Device,
        debug_messenger: Option<DebugMessenger>,
        capabilities: RendererCapabilities,
    ) -> Self {
        let debug_utils = debug_messenger
            .as_ref()
            .map(|_| ash::ext::debug_utils::Device::new(&instance, &device));
        Self {
            _entry: entry,
            instance,
            device,
            debug_utils,
            debug_messenger,
            capabilities,
            resources: Mutex::new(ResourceTables::default()),
        }
    }

    pub(crate) fn instance(&self) -> &ash::Instance {
        &self.instance
    }

    /// Lock the resource tables
    pub(crate) fn resources(&self) -> Result<MutexGuard<'_, ResourceTables>> {
        self.resources
            .lock()
            .map_err(|_| Error::BackendError("resource tables poisoned".to_string()))
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        unsafe {
            self.device.device_wait_idle().ok();

            if let Ok(resources) = self.resources.get_mut() {
                resources.clear();
            }

            self.device.destroy_device(None);

            // Stop callbacks before the messenger goes away
            crate::debug::cleanup_debug_config();
            if let Some(debug) = self.debug_messenger.take() {
                debug.loader.destroy_debug_utils_messenger(debug.messenger, None);
            }

            self.instance.destroy_instance(None);
        }
    }
}
