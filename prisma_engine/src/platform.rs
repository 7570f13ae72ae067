//! Platform window boundary
//!
//! The frame pipeline only needs the live pixel size of the window; event
//! handling stays with the application, which forwards resizes to
//! `Engine::notify_resize`.

use winit::window::Window;
use crate::graphics_device::Extent2D;

/// A window the swapchain presents into
pub trait WindowSurface {
    /// Current drawable size in physical pixels (0x0 when minimized)
    fn pixel_size(&self) -> Extent2D;
}

impl WindowSurface for Window {
    fn pixel_size(&self) -> Extent2D {
        let size = self.inner_size();
        Extent2D::new(size.width, size.height)
    }
}

/// Fixed-size surface, for headless use and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedSurface(pub Extent2D);

impl WindowSurface for FixedSurface {
    fn pixel_size(&self) -> Extent2D {
        self.0
    }
}
