/// Texture and texture view entries of the Vulkan resource tables

use ash::vk;
use gpu_allocator::vulkan::{Allocation, Allocator};
use prisma_engine::prisma::device::{TextureDesc, TextureFormat, TextureKey};
use std::sync::{Arc, Mutex};

/// Vulkan image plus the state the command lists need to transition it
pub(crate) struct Texture {
    pub(crate) image: vk::Image,
    pub(crate) format: TextureFormat,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) array_layers: u32,
    pub(crate) mip_levels: u32,
    /// Layout after the last submitted command list that touched the image
    pub(crate) layout: vk::ImageLayout,
    /// GPU memory; `None` for swapchain images, which the swapchain owns
    allocation: Option<Allocation>,
    device: ash::Device,
    allocator: Arc<Mutex<Allocator>>,
}

impl Texture {
    pub(crate) fn owned(
        image: vk::Image,
        allocation: Allocation,
        desc: &TextureDesc,
        device: ash::Device,
        allocator: Arc<Mutex<Allocator>>,
    ) -> Self {
        Self {
            image,
            format: desc.format,
            width: desc.width,
            height: desc.height,
            array_layers: desc.array_layers.max(1),
            mip_levels: desc.mip_levels.max(1),
            layout: vk::ImageLayout::UNDEFINED,
            allocation: Some(allocation),
            device,
            allocator,
        }
    }

    /// Swapchain image registered so passes can address it by key
    pub(crate) fn presentable(
        image: vk::Image,
        format: TextureFormat,
        extent: vk::Extent2D,
        device: ash::Device,
        allocator: Arc<Mutex<Allocator>>,
    ) -> Self {
        Self {
            image,
            format,
            width: extent.width,
            height: extent.height,
            array_layers: 1,
            mip_levels: 1,
            layout: vk::ImageLayout::UNDEFINED,
            allocation: None,
            device,
            allocator,
        }
    }

    pub(crate) fn is_owned(&self) -> bool {
        self.allocation.is_some()
    }

    pub(crate) fn memory_size(&self) -> u64 {
        self.allocation.as_ref().map_or(0, |a| a.size())
    }

    /// Every layer and mip of the image
    pub(crate) fn full_range(&self) -> vk::ImageSubresourceRange {
        vk::ImageSubresourceRange {
            aspect_mask: crate::vulkan_format::aspect_for_format(self.format),
            base_mip_level: 0,
            level_count: self.mip_levels,
            base_array_layer: 0,
            layer_count: self.array_layers,
        }
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        if let Some(allocation) = self.allocation.take() {
            unsafe {
                if let Ok(mut allocator) = self.allocator.lock() {
                    allocator.free(allocation).ok();
                }
                self.device.destroy_image(self.image, None);
            }
        }
    }
}

/// Image view onto a range of a texture
pub(crate) struct TextureView {
    pub(crate) view: vk::ImageView,
    pub(crate) texture: TextureKey,
    device: ash::Device,
}

impl TextureView {
    pub(crate) fn new(view: vk::ImageView, texture: TextureKey, device: ash::Device) -> Self {
        Self { view, texture, device }
    }
}

impl Drop for TextureView {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_image_view(self.view, None);
        }
    }
}
