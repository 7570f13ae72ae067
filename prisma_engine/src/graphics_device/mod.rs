/// Graphics device module - the GPU boundary: traits, handles and value types

pub mod handles;
pub mod graphics_device;
pub mod command_list;
pub mod texture;
pub mod buffer;
pub mod swapchain;
pub mod render_pass;
pub mod frame_buffer;
pub mod depth_stencil;

pub use handles::*;
pub use graphics_device::*;
pub use command_list::*;
pub use texture::*;
pub use buffer::*;
pub use swapchain::*;
pub use render_pass::*;
pub use frame_buffer::*;
pub use depth_stencil::*;

// Mock graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_graphics_device;
