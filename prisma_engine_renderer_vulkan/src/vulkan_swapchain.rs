/// Surface queries and swapchain creation
///
/// The device owns one window surface. Swapchains are built against it on
/// request; their images are registered by the device as non-owned textures.

use ash::vk;
use prisma_engine::prisma::{Error, Result};
use prisma_engine::prisma::device::{Extent2D, SurfaceCapabilities, SwapchainDesc, TextureKey};
use prisma_engine::{engine_err, engine_error};

use crate::vulkan_format::{
    color_space_to_vk, current_extent_from_vk, present_mode_from_vk, present_mode_to_vk,
    surface_format_from_vk, texture_format_to_vk,
};

/// Window surface plus the loader that queries and destroys it
pub(crate) struct Surface {
    pub(crate) surface: vk::SurfaceKHR,
    pub(crate) loader: ash::khr::surface::Instance,
}

impl Surface {
    /// What the surface supports right now; called on every (re)creation
    pub(crate) fn capabilities(&self, physical_device: vk::PhysicalDevice) -> Result<SurfaceCapabilities> {
        unsafe {
            let caps = self.loader
                .get_physical_device_surface_capabilities(physical_device, self.surface)
                .map_err(|e| engine_err!("prisma::vulkan", "Failed to get surface capabilities: {:?}", e))?;
            let formats = self.loader
                .get_physical_device_surface_formats(physical_device, self.surface)
                .map_err(|e| engine_err!("prisma::vulkan", "Failed to query surface formats: {:?}", e))?;
            let present_modes = self.loader
                .get_physical_device_surface_present_modes(physical_device, self.surface)
                .map_err(|e| engine_err!("prisma::vulkan", "Failed to query present modes: {:?}", e))?;

            Ok(SurfaceCapabilities {
                min_image_count: caps.min_image_count,
                max_image_count: caps.max_image_count,
                current_extent: current_extent_from_vk(caps.current_extent),
                min_extent: Extent2D::new(caps.min_image_extent.width, caps.min_image_extent.height),
                max_extent: Extent2D::new(caps.max_image_extent.width, caps.max_image_extent.height),
                formats: formats.into_iter().filter_map(surface_format_from_vk).collect(),
                present_modes: present_modes.into_iter().filter_map(present_mode_from_vk).collect(),
            })
        }
    }

    pub(crate) fn current_transform(&self, physical_device: vk::PhysicalDevice) -> vk::SurfaceTransformFlagsKHR {
        unsafe {
            self.loader
                .get_physical_device_surface_capabilities(physical_device, self.surface)
                .map(|caps| caps.current_transform)
                .unwrap_or(vk::SurfaceTransformFlagsKHR::IDENTITY)
        }
    }
}

/// Swapchain entry: the chain and the texture keys of its images
pub(crate) struct Swapchain {
    pub(crate) swapchain: vk::SwapchainKHR,
    pub(crate) images: Vec<TextureKey>,
}

/// Create a swapchain from a negotiated descriptor and fetch its images
pub(crate) fn create_swapchain(
    loader: &ash::khr::swapchain::Device,
    surface: &Surface,
    transform: vk::SurfaceTransformFlagsKHR,
    desc: &SwapchainDesc,
) -> Result<(vk::SwapchainKHR, Vec<vk::Image>)> {
    unsafe {
        let swapchain_create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(surface.surface)
            .min_image_count(desc.image_count)
            .image_format(texture_format_to_vk(desc.surface_format.format))
            .image_color_space(color_space_to_vk(desc.surface_format.color_space))
            .image_extent(vk::Extent2D { width: desc.extent.width, height: desc.extent.height })
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::TRANSFER_DST)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .pre_transform(transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode_to_vk(desc.present_mode))
            .clipped(true);

        let swapchain = loader
            .create_swapchain(&swapchain_create_info, None)
            .map_err(|e| {
                engine_error!("prisma::vulkan", "Failed to create swapchain: {:?}", e);
                Error::InitializationFailed(format!("Failed to create swapchain: {:?}", e))
            })?;

        match loader.get_swapchain_images(swapchain) {
            Ok(images) => Ok((swapchain, images)),
            Err(e) => {
                loader.destroy_swapchain(swapchain, None);
                engine_error!("prisma::vulkan", "Failed to get swapchain images: {:?}", e);
                Err(Error::InitializationFailed(format!("Failed to get swapchain images: {:?}", e)))
            }
        }
    }
}
