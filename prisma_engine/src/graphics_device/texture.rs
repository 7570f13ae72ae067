//! Texture formats, usages and descriptors

use bitflags::bitflags;

/// Texture pixel format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum TextureFormat {
    R8G8B8A8_UNORM,
    R8G8B8A8_SRGB,
    B8G8R8A8_UNORM,
    B8G8R8A8_SRGB,
    R16G16B16A16_SFLOAT,
    R32_SFLOAT,
    D16_UNORM,
    D32_SFLOAT,
    D24_UNORM_S8_UINT,
}

impl TextureFormat {
    /// Depth or depth/stencil format
    pub fn is_depth(&self) -> bool {
        matches!(
            self,
            TextureFormat::D16_UNORM | TextureFormat::D32_SFLOAT | TextureFormat::D24_UNORM_S8_UINT
        )
    }

    pub fn has_stencil(&self) -> bool {
        matches!(self, TextureFormat::D24_UNORM_S8_UINT)
    }

    /// 8-bit per channel sRGB color format
    pub fn is_srgb(&self) -> bool {
        matches!(self, TextureFormat::R8G8B8A8_SRGB | TextureFormat::B8G8R8A8_SRGB)
    }

    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            TextureFormat::R8G8B8A8_UNORM
            | TextureFormat::R8G8B8A8_SRGB
            | TextureFormat::B8G8R8A8_UNORM
            | TextureFormat::B8G8R8A8_SRGB => 4,
            TextureFormat::R16G16B16A16_SFLOAT => 8,
            TextureFormat::R32_SFLOAT => 4,
            TextureFormat::D16_UNORM => 2,
            TextureFormat::D32_SFLOAT => 4,
            TextureFormat::D24_UNORM_S8_UINT => 4,
        }
    }
}

bitflags! {
    /// How a texture will be used
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u32 {
        const SAMPLED = 1 << 0;
        const COLOR_ATTACHMENT = 1 << 1;
        const DEPTH_STENCIL_ATTACHMENT = 1 << 2;
        const TRANSFER_SRC = 1 << 3;
        const TRANSFER_DST = 1 << 4;
        const STORAGE = 1 << 5;
    }
}

/// Descriptor for creating a texture
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub usage: TextureUsage,
    /// Number of array layers (1 for a plain 2D texture)
    pub array_layers: u32,
    pub mip_levels: u32,
    pub debug_name: Option<String>,
}

impl TextureDesc {
    /// Single-layer, single-mip 2D texture
    pub fn new_2d(width: u32, height: u32, format: TextureFormat, usage: TextureUsage) -> Self {
        Self {
            width,
            height,
            format,
            usage,
            array_layers: 1,
            mip_levels: 1,
            debug_name: None,
        }
    }

    pub fn with_layers(mut self, array_layers: u32) -> Self {
        self.array_layers = array_layers;
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.debug_name = Some(name.to_string());
        self
    }
}

/// Descriptor for creating a view onto a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureViewDesc {
    pub base_layer: u32,
    pub layer_count: u32,
    pub base_mip: u32,
    pub mip_count: u32,
}

impl TextureViewDesc {
    /// Whole first layer, all of mip 0
    pub fn whole() -> Self {
        Self { base_layer: 0, layer_count: 1, base_mip: 0, mip_count: 1 }
    }

    /// One layer of an array texture
    pub fn layer(layer: u32) -> Self {
        Self { base_layer: layer, layer_count: 1, base_mip: 0, mip_count: 1 }
    }
}
