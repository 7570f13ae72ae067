//! Render pass descriptors
//!
//! A render pass fixes attachment formats, what happens to their contents
//! on entry and exit, and the image layouts they move between.

use crate::graphics_device::TextureFormat;

/// What happens to an attachment when the pass begins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadOp {
    Load,
    Clear,
    DontCare,
}

/// What happens to an attachment when the pass ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Store,
    DontCare,
}

/// Image layout an attachment enters or leaves the pass in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageLayout {
    Undefined,
    ColorAttachment,
    DepthStencilAttachment,
    ShaderReadOnly,
    TransferSrc,
    TransferDst,
    PresentSrc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttachmentDesc {
    pub format: TextureFormat,
    pub samples: u32,
    pub load_op: LoadOp,
    pub store_op: StoreOp,
    pub initial_layout: ImageLayout,
    pub final_layout: ImageLayout,
}

impl AttachmentDesc {
    /// Color attachment cleared on entry and kept as a color target
    pub fn color_clear(format: TextureFormat) -> Self {
        Self {
            format,
            samples: 1,
            load_op: LoadOp::Clear,
            store_op: StoreOp::Store,
            initial_layout: ImageLayout::Undefined,
            final_layout: ImageLayout::ColorAttachment,
        }
    }

    /// Color attachment whose previous contents are kept
    pub fn color_load(format: TextureFormat) -> Self {
        Self {
            format,
            samples: 1,
            load_op: LoadOp::Load,
            store_op: StoreOp::Store,
            initial_layout: ImageLayout::ColorAttachment,
            final_layout: ImageLayout::ColorAttachment,
        }
    }

    /// Depth attachment cleared on entry
    pub fn depth_clear(format: TextureFormat) -> Self {
        Self {
            format,
            samples: 1,
            load_op: LoadOp::Clear,
            store_op: StoreOp::Store,
            initial_layout: ImageLayout::Undefined,
            final_layout: ImageLayout::DepthStencilAttachment,
        }
    }

    pub fn depth_load(format: TextureFormat) -> Self {
        Self {
            format,
            samples: 1,
            load_op: LoadOp::Load,
            store_op: StoreOp::Store,
            initial_layout: ImageLayout::DepthStencilAttachment,
            final_layout: ImageLayout::DepthStencilAttachment,
        }
    }

    pub fn with_final_layout(mut self, layout: ImageLayout) -> Self {
        self.final_layout = layout;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RenderPassDesc {
    pub color_attachments: Vec<AttachmentDesc>,
    pub depth_attachment: Option<AttachmentDesc>,
}
