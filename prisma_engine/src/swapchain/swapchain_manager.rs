/// SwapchainManager - owns the presentable image chain, its views,
/// framebuffers and the render pass they are bound to.
///
/// Negotiation is a set of pure functions over `SurfaceCapabilities` so it
/// can be tested without a device. The live chain is held as one
/// `SwapchainState` value: it is either fully built or absent, never
/// half-rebuilt.

use crate::error::{Error, Result};
use crate::graphics_device::{
    AttachmentDesc, ColorSpace, Extent2D, FramebufferDesc, FramebufferKey, GraphicsDevice,
    ImageLayout, PresentMode, RenderPassDesc, RenderPassKey, SurfaceCapabilities,
    SurfaceFormat, SwapchainDesc, SwapchainKey, TextureFormat, TextureKey, TextureViewDesc,
    TextureViewKey,
};
use crate::{engine_debug, engine_error, engine_info, engine_warn};

const SOURCE: &str = "prisma::SwapchainManager";

// ===== NEGOTIATION =====

/// Caller preferences applied during negotiation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwapchainPreferences {
    pub surface_format: Option<SurfaceFormat>,
    pub present_mode: PresentMode,
}

impl Default for SwapchainPreferences {
    fn default() -> Self {
        Self { surface_format: None, present_mode: PresentMode::Mailbox }
    }
}

/// Pick the surface format
///
/// The preferred format wins when offered, then the first 8-bit sRGB format
/// in the sRGB-nonlinear color space, then whatever comes first.
pub fn choose_surface_format(
    formats: &[SurfaceFormat],
    preferred: Option<SurfaceFormat>,
) -> Option<SurfaceFormat> {
    if let Some(preferred) = preferred {
        if formats.contains(&preferred) {
            return Some(preferred);
        }
    }
    formats
        .iter()
        .find(|f| f.format.is_srgb() && f.color_space == ColorSpace::SrgbNonlinear)
        .or_else(|| formats.first())
        .copied()
}

/// Pick the present mode: preferred, else Mailbox, else Fifo (always supported)
pub fn choose_present_mode(modes: &[PresentMode], preferred: PresentMode) -> PresentMode {
    if modes.contains(&preferred) {
        preferred
    } else if modes.contains(&PresentMode::Mailbox) {
        PresentMode::Mailbox
    } else {
        PresentMode::Fifo
    }
}

/// Pick the extent: the surface's own size, or the window size clamped to the
/// supported range when the surface lets the swapchain decide
pub fn choose_extent(caps: &SurfaceCapabilities, window_size: Extent2D) -> Extent2D {
    match caps.current_extent {
        Some(extent) => extent,
        // A minimized window stays zero so the caller suspends
        None if window_size.is_zero_area() => window_size,
        None => Extent2D::new(
            window_size.width.clamp(caps.min_extent.width, caps.max_extent.width),
            window_size.height.clamp(caps.min_extent.height, caps.max_extent.height),
        ),
    }
}

/// `min + 1`, clamped to `max` when the surface has an upper bound
pub fn choose_image_count(caps: &SurfaceCapabilities) -> u32 {
    let count = caps.min_image_count + 1;
    if caps.max_image_count > 0 {
        count.min(caps.max_image_count)
    } else {
        count
    }
}

/// Full negotiation against the current surface capabilities
pub fn negotiate(
    caps: &SurfaceCapabilities,
    window_size: Extent2D,
    preferences: &SwapchainPreferences,
) -> Result<SwapchainDesc> {
    let surface_format = choose_surface_format(&caps.formats, preferences.surface_format)
        .ok_or_else(|| Error::InitializationFailed("Surface reports no formats".to_string()))?;

    Ok(SwapchainDesc {
        surface_format,
        present_mode: choose_present_mode(&caps.present_modes, preferences.present_mode),
        extent: choose_extent(caps, window_size),
        image_count: choose_image_count(caps),
    })
}

// ===== STATE =====

/// One presentable image with its view and framebuffer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwapchainImage {
    pub texture: TextureKey,
    pub view: TextureViewKey,
    pub framebuffer: FramebufferKey,
}

/// A complete, usable chain
#[derive(Debug, Clone, PartialEq)]
pub struct SwapchainState {
    swapchain: SwapchainKey,
    images: Vec<SwapchainImage>,
    render_pass: RenderPassKey,
    desc: SwapchainDesc,
}

impl SwapchainState {
    pub fn swapchain(&self) -> SwapchainKey {
        self.swapchain
    }

    pub fn images(&self) -> &[SwapchainImage] {
        &self.images
    }

    pub fn image(&self, index: u32) -> Option<&SwapchainImage> {
        self.images.get(index as usize)
    }

    pub fn image_count(&self) -> u32 {
        self.images.len() as u32
    }

    /// Render pass drawing on top of the blitted frame, ending in present layout
    pub fn render_pass(&self) -> RenderPassKey {
        self.render_pass
    }

    pub fn extent(&self) -> Extent2D {
        self.desc.extent
    }

    pub fn format(&self) -> TextureFormat {
        self.desc.surface_format.format
    }

    pub fn surface_format(&self) -> SurfaceFormat {
        self.desc.surface_format
    }

    pub fn present_mode(&self) -> PresentMode {
        self.desc.present_mode
    }

    pub fn desc(&self) -> &SwapchainDesc {
        &self.desc
    }
}

/// Outcome of a recreation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecreateOutcome {
    /// A new chain is installed
    Recreated,
    /// The surface has zero area (minimized); the chain was left alone
    Suspended,
}

// ===== MANAGER =====

pub struct SwapchainManager {
    state: Option<SwapchainState>,
    preferences: SwapchainPreferences,
    recreate_count: u32,
}

impl SwapchainManager {
    /// Negotiate and build the chain
    ///
    /// # Errors
    ///
    /// Every failure is `InitializationFailed`: without a chain nothing can be presented.
    pub fn create(
        device: &mut dyn GraphicsDevice,
        window_size: Extent2D,
        preferences: SwapchainPreferences,
    ) -> Result<Self> {
        let caps = device.surface_capabilities().map_err(fatal)?;
        let desc = negotiate(&caps, window_size, &preferences)?;
        if desc.extent.is_zero_area() {
            engine_error!(SOURCE, "Cannot create a swapchain on a zero-area surface");
            return Err(Error::InitializationFailed("Surface has zero area".to_string()));
        }

        let render_pass = device
            .create_render_pass(&swapchain_render_pass_desc(desc.surface_format.format))
            .map_err(fatal)?;
        let state = build_chain(device, &desc, render_pass).map_err(|e| {
            device.destroy_render_pass(render_pass);
            fatal(e)
        })?;

        engine_info!(
            SOURCE,
            "Swapchain created: {}x{}, {} images, {:?}, {:?}",
            desc.extent.width,
            desc.extent.height,
            desc.image_count,
            desc.surface_format.format,
            desc.present_mode
        );

        Ok(Self { state: Some(state), preferences, recreate_count: 0 })
    }

    /// The live chain, if any
    pub fn state(&self) -> Option<&SwapchainState> {
        self.state.as_ref()
    }

    pub fn preferences(&self) -> &SwapchainPreferences {
        &self.preferences
    }

    /// Number of completed recreations since creation
    pub fn recreate_count(&self) -> u32 {
        self.recreate_count
    }

    /// Rebuild the chain against the current surface
    ///
    /// Capabilities are queried first; a zero-area surface suspends instead of
    /// rebuilding. Otherwise the GPU is idled before any object the old chain
    /// owns is destroyed, then everything is rebuilt in creation order. The
    /// render pass survives unless the negotiated format changed.
    pub fn recreate(
        &mut self,
        device: &mut dyn GraphicsDevice,
        window_size: Extent2D,
    ) -> Result<RecreateOutcome> {
        let caps = device.surface_capabilities()?;
        let desc = negotiate(&caps, window_size, &self.preferences)?;
        if desc.extent.is_zero_area() {
            engine_debug!(SOURCE, "Surface has zero area, swapchain recreation deferred");
            return Ok(RecreateOutcome::Suspended);
        }

        device.wait_idle()?;

        let old = self.state.take();
        let mut render_pass = None;
        if let Some(old) = old {
            destroy_chain(device, &old);
            if old.desc.surface_format.format == desc.surface_format.format {
                render_pass = Some(old.render_pass);
            } else {
                engine_warn!(
                    SOURCE,
                    "Surface format changed from {:?} to {:?}, rebuilding render pass",
                    old.desc.surface_format.format,
                    desc.surface_format.format
                );
                device.destroy_render_pass(old.render_pass);
            }
        }

        let render_pass = match render_pass {
            Some(rp) => rp,
            None => device.create_render_pass(&swapchain_render_pass_desc(desc.surface_format.format))?,
        };
        let state = match build_chain(device, &desc, render_pass) {
            Ok(state) => state,
            Err(e) => {
                device.destroy_render_pass(render_pass);
                engine_error!(SOURCE, "Swapchain recreation failed: {}", e);
                return Err(e);
            }
        };

        self.state = Some(state);
        self.recreate_count += 1;
        engine_info!(
            SOURCE,
            "Swapchain recreated: {}x{}, {} images",
            desc.extent.width,
            desc.extent.height,
            desc.image_count
        );
        Ok(RecreateOutcome::Recreated)
    }

    /// Tear the chain down after a device-idle wait
    pub fn destroy(&mut self, device: &mut dyn GraphicsDevice) {
        if let Some(state) = self.state.take() {
            if let Err(e) = device.wait_idle() {
                engine_warn!(SOURCE, "wait_idle failed during swapchain destruction: {}", e);
            }
            destroy_chain(device, &state);
            device.destroy_render_pass(state.render_pass);
            engine_debug!(SOURCE, "Swapchain destroyed");
        }
    }
}

fn fatal(error: Error) -> Error {
    match error {
        Error::InitializationFailed(_) => error,
        other => Error::InitializationFailed(other.to_string()),
    }
}

/// Single color attachment: the final blit writes the image (transfer-dst),
/// the overlay stage loads it and leaves it ready for presentation
fn swapchain_render_pass_desc(format: TextureFormat) -> RenderPassDesc {
    let mut color = AttachmentDesc::color_load(format).with_final_layout(ImageLayout::PresentSrc);
    color.initial_layout = ImageLayout::TransferDst;
    RenderPassDesc { color_attachments: vec![color], depth_attachment: None }
}

/// Build swapchain, views and framebuffers; on failure release what was built
fn build_chain(
    device: &mut dyn GraphicsDevice,
    desc: &SwapchainDesc,
    render_pass: RenderPassKey,
) -> Result<SwapchainState> {
    let chain = device.create_swapchain(desc)?;
    let mut state = SwapchainState {
        swapchain: chain.swapchain,
        images: Vec::with_capacity(chain.images.len()),
        render_pass,
        desc: SwapchainDesc { image_count: chain.images.len() as u32, ..*desc },
    };

    for texture in chain.images {
        let view = match device.create_texture_view(texture, &TextureViewDesc::whole()) {
            Ok(view) => view,
            Err(e) => {
                destroy_chain(device, &state);
                return Err(e);
            }
        };
        let framebuffer = device.create_framebuffer(&FramebufferDesc {
            render_pass,
            color_attachments: vec![view],
            depth_attachment: None,
            width: desc.extent.width,
            height: desc.extent.height,
        });
        match framebuffer {
            Ok(framebuffer) => state.images.push(SwapchainImage { texture, view, framebuffer }),
            Err(e) => {
                device.destroy_texture_view(view);
                destroy_chain(device, &state);
                return Err(e);
            }
        }
    }

    Ok(state)
}

/// Destroy framebuffers, views, then the swapchain (render pass is left to the caller)
fn destroy_chain(device: &mut dyn GraphicsDevice, state: &SwapchainState) {
    for image in &state.images {
        device.destroy_framebuffer(image.framebuffer);
    }
    for image in &state.images {
        device.destroy_texture_view(image.view);
    }
    device.destroy_swapchain(state.swapchain);
}

#[cfg(test)]
#[path = "swapchain_manager_tests.rs"]
mod tests;
