/// Camera color and depth targets the core passes render into.
///
/// Color is HDR (`R16G16B16A16_SFLOAT`) and is blitted to the swapchain by
/// the final pass. Two render passes share the framebuffer: `clear_pass`
/// for the first pass of a frame, `load_pass` for every later one.

use crate::error::Result;
use crate::graphics_device::{
    AttachmentDesc, ClearValue, Extent2D, FramebufferDesc, FramebufferKey, GraphicsDevice,
    RenderPassDesc, RenderPassKey, TextureDesc, TextureFormat, TextureKey, TextureUsage,
    TextureViewDesc, TextureViewKey,
};
use crate::engine_debug;

const SOURCE: &str = "prisma::CameraTargets";

pub const CAMERA_COLOR_FORMAT: TextureFormat = TextureFormat::R16G16B16A16_SFLOAT;
pub const CAMERA_DEPTH_FORMAT: TextureFormat = TextureFormat::D32_SFLOAT;

/// A texture the caller may render into or sample from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderTargetRef {
    pub texture: TextureKey,
    pub view: TextureViewKey,
    pub format: TextureFormat,
    pub extent: Extent2D,
}

#[derive(Debug)]
pub struct CameraTargets {
    color: RenderTargetRef,
    depth: RenderTargetRef,
    clear_pass: RenderPassKey,
    load_pass: RenderPassKey,
    framebuffer: FramebufferKey,
}

impl CameraTargets {
    /// Create targets of `extent`; on failure everything built so far is destroyed
    pub fn create(device: &mut dyn GraphicsDevice, extent: Extent2D) -> Result<Self> {
        let mut built = Built::default();
        match Self::build(device, extent, &mut built) {
            Ok(targets) => {
                engine_debug!(SOURCE, "Camera targets created: {}x{}", extent.width, extent.height);
                Ok(targets)
            }
            Err(e) => {
                built.destroy(device);
                Err(e)
            }
        }
    }

    fn build(device: &mut dyn GraphicsDevice, extent: Extent2D, built: &mut Built) -> Result<Self> {
        let color_desc = TextureDesc::new_2d(
            extent.width,
            extent.height,
            CAMERA_COLOR_FORMAT,
            TextureUsage::COLOR_ATTACHMENT | TextureUsage::SAMPLED | TextureUsage::TRANSFER_SRC
                | TextureUsage::TRANSFER_DST,
        ).with_name("camera_color");
        let depth_desc = TextureDesc::new_2d(
            extent.width,
            extent.height,
            CAMERA_DEPTH_FORMAT,
            TextureUsage::DEPTH_STENCIL_ATTACHMENT | TextureUsage::SAMPLED,
        ).with_name("camera_depth");

        let color_texture = device.create_texture(&color_desc)?;
        built.textures.push(color_texture);
        let depth_texture = device.create_texture(&depth_desc)?;
        built.textures.push(depth_texture);
        let color_view = device.create_texture_view(color_texture, &TextureViewDesc::whole())?;
        built.views.push(color_view);
        let depth_view = device.create_texture_view(depth_texture, &TextureViewDesc::whole())?;
        built.views.push(depth_view);

        let clear_pass = device.create_render_pass(&RenderPassDesc {
            color_attachments: vec![AttachmentDesc::color_clear(CAMERA_COLOR_FORMAT)],
            depth_attachment: Some(AttachmentDesc::depth_clear(CAMERA_DEPTH_FORMAT)),
        })?;
        built.passes.push(clear_pass);
        let load_pass = device.create_render_pass(&RenderPassDesc {
            color_attachments: vec![AttachmentDesc::color_load(CAMERA_COLOR_FORMAT)],
            depth_attachment: Some(AttachmentDesc::depth_load(CAMERA_DEPTH_FORMAT)),
        })?;
        built.passes.push(load_pass);

        let framebuffer = device.create_framebuffer(&FramebufferDesc {
            render_pass: clear_pass,
            color_attachments: vec![color_view],
            depth_attachment: Some(depth_view),
            width: extent.width,
            height: extent.height,
        })?;

        Ok(Self {
            color: RenderTargetRef {
                texture: color_texture,
                view: color_view,
                format: CAMERA_COLOR_FORMAT,
                extent,
            },
            depth: RenderTargetRef {
                texture: depth_texture,
                view: depth_view,
                format: CAMERA_DEPTH_FORMAT,
                extent,
            },
            clear_pass,
            load_pass,
            framebuffer,
        })
    }

    pub fn color(&self) -> RenderTargetRef {
        self.color
    }

    pub fn depth(&self) -> RenderTargetRef {
        self.depth
    }

    pub fn extent(&self) -> Extent2D {
        self.color.extent
    }

    pub fn clear_pass(&self) -> RenderPassKey {
        self.clear_pass
    }

    pub fn load_pass(&self) -> RenderPassKey {
        self.load_pass
    }

    pub fn framebuffer(&self) -> FramebufferKey {
        self.framebuffer
    }

    /// Clear values for `clear_pass`, color then depth
    pub fn clear_values(clear_color: [f32; 4]) -> [ClearValue; 2] {
        [
            ClearValue::Color(clear_color),
            ClearValue::DepthStencil { depth: 1.0, stencil: 0 },
        ]
    }

    pub fn destroy(self, device: &mut dyn GraphicsDevice) {
        device.destroy_framebuffer(self.framebuffer);
        device.destroy_render_pass(self.load_pass);
        device.destroy_render_pass(self.clear_pass);
        device.destroy_texture_view(self.depth.view);
        device.destroy_texture_view(self.color.view);
        device.destroy_texture(self.depth.texture);
        device.destroy_texture(self.color.texture);
    }
}

/// Objects created by a partial build, released in reverse on failure
#[derive(Default)]
struct Built {
    textures: Vec<TextureKey>,
    views: Vec<TextureViewKey>,
    passes: Vec<RenderPassKey>,
}

impl Built {
    fn destroy(self, device: &mut dyn GraphicsDevice) {
        for pass in self.passes.into_iter().rev() {
            device.destroy_render_pass(pass);
        }
        for view in self.views.into_iter().rev() {
            device.destroy_texture_view(view);
        }
        for texture in self.textures.into_iter().rev() {
            device.destroy_texture(texture);
        }
    }
}

#[cfg(test)]
#[path = "camera_targets_tests.rs"]
mod tests;
