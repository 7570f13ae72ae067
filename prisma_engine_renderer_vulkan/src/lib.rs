/*!
# Prisma Engine - Vulkan Backend

Vulkan implementation of the `GraphicsDevice` and `CommandList` traits of
`prisma_engine`, built on Ash for the bindings and gpu-allocator for memory.

Pipelines are created by the application against the render passes exposed by
[`VulkanGraphicsDevice::vk_render_pass`] and handed over with
[`VulkanGraphicsDevice::register_pipeline`].

```no_run
use prisma_engine::prisma::{Config, Engine};
use prisma_engine::prisma::device::Extent2D;
use prisma_engine_renderer_vulkan::VulkanGraphicsDevice;
# fn run(window: &winit::window::Window) -> prisma_engine::prisma::Result<()> {
let config = Config::default();
let size = window.inner_size();
let device = VulkanGraphicsDevice::new(window, &config)?;
let engine = Engine::new(Box::new(device), Extent2D::new(size.width, size.height), config)?;
# Ok(())
# }
```
*/

mod vulkan;
mod vulkan_context;
mod vulkan_format;
mod vulkan_texture;
mod vulkan_buffer;
mod vulkan_pipeline;
mod vulkan_render_pass;
mod vulkan_frame_buffer;
mod vulkan_swapchain;
mod vulkan_command_list;
mod debug;

pub use vulkan::VulkanGraphicsDevice;
pub use vulkan_command_list::VulkanCommandList;

// Re-export debug utilities
pub use debug::{get_validation_stats, print_validation_stats_report};
