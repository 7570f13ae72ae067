/// Conversions between engine value types and Vulkan enums
///
/// Pure functions, no device needed; covered by `vulkan_format_tests.rs`.

use ash::vk;
use prisma_engine::prisma::device::{
    BufferUsage, ColorSpace, CompareFunction, Extent2D, ImageLayout, IndexType, LoadOp,
    PipelineStage, PresentMode, StencilOp, StoreOp, SurfaceFormat, TextureFormat, TextureUsage,
};

// ===== FORMATS =====

pub(crate) fn texture_format_to_vk(format: TextureFormat) -> vk::Format {
    match format {
        TextureFormat::R8G8B8A8_UNORM => vk::Format::R8G8B8A8_UNORM,
        TextureFormat::R8G8B8A8_SRGB => vk::Format::R8G8B8A8_SRGB,
        TextureFormat::B8G8R8A8_UNORM => vk::Format::B8G8R8A8_UNORM,
        TextureFormat::B8G8R8A8_SRGB => vk::Format::B8G8R8A8_SRGB,
        TextureFormat::R16G16B16A16_SFLOAT => vk::Format::R16G16B16A16_SFLOAT,
        TextureFormat::R32_SFLOAT => vk::Format::R32_SFLOAT,
        TextureFormat::D16_UNORM => vk::Format::D16_UNORM,
        TextureFormat::D32_SFLOAT => vk::Format::D32_SFLOAT,
        TextureFormat::D24_UNORM_S8_UINT => vk::Format::D24_UNORM_S8_UINT,
    }
}

/// `None` for formats the engine has no name for
pub(crate) fn texture_format_from_vk(format: vk::Format) -> Option<TextureFormat> {
    match format {
        vk::Format::R8G8B8A8_UNORM => Some(TextureFormat::R8G8B8A8_UNORM),
        vk::Format::R8G8B8A8_SRGB => Some(TextureFormat::R8G8B8A8_SRGB),
        vk::Format::B8G8R8A8_UNORM => Some(TextureFormat::B8G8R8A8_UNORM),
        vk::Format::B8G8R8A8_SRGB => Some(TextureFormat::B8G8R8A8_SRGB),
        vk::Format::R16G16B16A16_SFLOAT => Some(TextureFormat::R16G16B16A16_SFLOAT),
        vk::Format::R32_SFLOAT => Some(TextureFormat::R32_SFLOAT),
        vk::Format::D16_UNORM => Some(TextureFormat::D16_UNORM),
        vk::Format::D32_SFLOAT => Some(TextureFormat::D32_SFLOAT),
        vk::Format::D24_UNORM_S8_UINT => Some(TextureFormat::D24_UNORM_S8_UINT),
        _ => None,
    }
}

pub(crate) fn aspect_for_format(format: TextureFormat) -> vk::ImageAspectFlags {
    if format.has_stencil() {
        vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
    } else if format.is_depth() {
        vk::ImageAspectFlags::DEPTH
    } else {
        vk::ImageAspectFlags::COLOR
    }
}

pub(crate) fn texture_usage_to_vk(usage: TextureUsage) -> vk::ImageUsageFlags {
    let mut flags = vk::ImageUsageFlags::empty();
    if usage.contains(TextureUsage::SAMPLED) { flags |= vk::ImageUsageFlags::SAMPLED; }
    if usage.contains(TextureUsage::COLOR_ATTACHMENT) { flags |= vk::ImageUsageFlags::COLOR_ATTACHMENT; }
    if usage.contains(TextureUsage::DEPTH_STENCIL_ATTACHMENT) { flags |= vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT; }
    if usage.contains(TextureUsage::TRANSFER_SRC) { flags |= vk::ImageUsageFlags::TRANSFER_SRC; }
    if usage.contains(TextureUsage::TRANSFER_DST) { flags |= vk::ImageUsageFlags::TRANSFER_DST; }
    if usage.contains(TextureUsage::STORAGE) { flags |= vk::ImageUsageFlags::STORAGE; }
    flags
}

pub(crate) fn buffer_usage_to_vk(usage: BufferUsage) -> vk::BufferUsageFlags {
    match usage {
        BufferUsage::Vertex => vk::BufferUsageFlags::VERTEX_BUFFER,
        BufferUsage::Index => vk::BufferUsageFlags::INDEX_BUFFER,
        BufferUsage::Uniform => vk::BufferUsageFlags::UNIFORM_BUFFER,
        BufferUsage::Storage => vk::BufferUsageFlags::STORAGE_BUFFER,
    }
}

pub(crate) fn index_type_to_vk(index_type: IndexType) -> vk::IndexType {
    match index_type {
        IndexType::U16 => vk::IndexType::UINT16,
        IndexType::U32 => vk::IndexType::UINT32,
    }
}

pub(crate) fn sample_count_to_vk(samples: u32) -> vk::SampleCountFlags {
    match samples {
        2 => vk::SampleCountFlags::TYPE_2,
        4 => vk::SampleCountFlags::TYPE_4,
        8 => vk::SampleCountFlags::TYPE_8,
        _ => vk::SampleCountFlags::TYPE_1,
    }
}

// ===== SURFACE =====

pub(crate) fn color_space_to_vk(color_space: ColorSpace) -> vk::ColorSpaceKHR {
    match color_space {
        ColorSpace::SrgbNonlinear => vk::ColorSpaceKHR::SRGB_NONLINEAR,
        ColorSpace::ExtendedSrgbLinear => vk::ColorSpaceKHR::EXTENDED_SRGB_LINEAR_EXT,
        ColorSpace::Hdr10St2084 => vk::ColorSpaceKHR::HDR10_ST2084_EXT,
    }
}

pub(crate) fn color_space_from_vk(color_space: vk::ColorSpaceKHR) -> Option<ColorSpace> {
    match color_space {
        vk::ColorSpaceKHR::SRGB_NONLINEAR => Some(ColorSpace::SrgbNonlinear),
        vk::ColorSpaceKHR::EXTENDED_SRGB_LINEAR_EXT => Some(ColorSpace::ExtendedSrgbLinear),
        vk::ColorSpaceKHR::HDR10_ST2084_EXT => Some(ColorSpace::Hdr10St2084),
        _ => None,
    }
}

/// Surface formats outside the engine's vocabulary are dropped
pub(crate) fn surface_format_from_vk(format: vk::SurfaceFormatKHR) -> Option<SurfaceFormat> {
    Some(SurfaceFormat::new(
        texture_format_from_vk(format.format)?,
        color_space_from_vk(format.color_space)?,
    ))
}

pub(crate) fn present_mode_to_vk(mode: PresentMode) -> vk::PresentModeKHR {
    match mode {
        PresentMode::Immediate => vk::PresentModeKHR::IMMEDIATE,
        PresentMode::Mailbox => vk::PresentModeKHR::MAILBOX,
        PresentMode::Fifo => vk::PresentModeKHR::FIFO,
        PresentMode::FifoRelaxed => vk::PresentModeKHR::FIFO_RELAXED,
    }
}

pub(crate) fn present_mode_from_vk(mode: vk::PresentModeKHR) -> Option<PresentMode> {
    match mode {
        vk::PresentModeKHR::IMMEDIATE => Some(PresentMode::Immediate),
        vk::PresentModeKHR::MAILBOX => Some(PresentMode::Mailbox),
        vk::PresentModeKHR::FIFO => Some(PresentMode::Fifo),
        vk::PresentModeKHR::FIFO_RELAXED => Some(PresentMode::FifoRelaxed),
        _ => None,
    }
}

/// A current extent of `u32::MAX` means the swapchain decides its own size
pub(crate) fn current_extent_from_vk(extent: vk::Extent2D) -> Option<Extent2D> {
    if extent.width == u32::MAX {
        None
    } else {
        Some(Extent2D::new(extent.width, extent.height))
    }
}

// ===== RENDER PASS =====

pub(crate) fn load_op_to_vk(load_op: LoadOp) -> vk::AttachmentLoadOp {
    match load_op {
        LoadOp::Load => vk::AttachmentLoadOp::LOAD,
        LoadOp::Clear => vk::AttachmentLoadOp::CLEAR,
        LoadOp::DontCare => vk::AttachmentLoadOp::DONT_CARE,
    }
}

pub(crate) fn store_op_to_vk(store_op: StoreOp) -> vk::AttachmentStoreOp {
    match store_op {
        StoreOp::Store => vk::AttachmentStoreOp::STORE,
        StoreOp::DontCare => vk::AttachmentStoreOp::DONT_CARE,
    }
}

pub(crate) fn image_layout_to_vk(layout: ImageLayout) -> vk::ImageLayout {
    match layout {
        ImageLayout::Undefined => vk::ImageLayout::UNDEFINED,
        ImageLayout::ColorAttachment => vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        ImageLayout::DepthStencilAttachment => vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        ImageLayout::ShaderReadOnly => vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        ImageLayout::TransferSrc => vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
        ImageLayout::TransferDst => vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        ImageLayout::PresentSrc => vk::ImageLayout::PRESENT_SRC_KHR,
    }
}

/// Access mask and pipeline stage an image in `layout` is touched with
///
/// Used for both sides of a layout barrier.
pub(crate) fn layout_access(layout: vk::ImageLayout) -> (vk::AccessFlags, vk::PipelineStageFlags) {
    match layout {
        vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL => (
            vk::AccessFlags::COLOR_ATTACHMENT_READ | vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
        ),
        vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL => (
            vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ
                | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS | vk::PipelineStageFlags::LATE_FRAGMENT_TESTS,
        ),
        vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL => (
            vk::AccessFlags::SHADER_READ,
            vk::PipelineStageFlags::FRAGMENT_SHADER,
        ),
        vk::ImageLayout::TRANSFER_SRC_OPTIMAL => (
            vk::AccessFlags::TRANSFER_READ,
            vk::PipelineStageFlags::TRANSFER,
        ),
        vk::ImageLayout::TRANSFER_DST_OPTIMAL => (
            vk::AccessFlags::TRANSFER_WRITE,
            vk::PipelineStageFlags::TRANSFER,
        ),
        vk::ImageLayout::PRESENT_SRC_KHR => (
            vk::AccessFlags::empty(),
            vk::PipelineStageFlags::BOTTOM_OF_PIPE,
        ),
        _ => (vk::AccessFlags::empty(), vk::PipelineStageFlags::TOP_OF_PIPE),
    }
}

// ===== SYNCHRONIZATION =====

pub(crate) fn pipeline_stage_to_vk(stage: PipelineStage) -> vk::PipelineStageFlags {
    match stage {
        PipelineStage::TopOfPipe => vk::PipelineStageFlags::TOP_OF_PIPE,
        PipelineStage::ColorAttachmentOutput => vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
        PipelineStage::EarlyFragmentTests => vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
        PipelineStage::Transfer => vk::PipelineStageFlags::TRANSFER,
        PipelineStage::BottomOfPipe => vk::PipelineStageFlags::BOTTOM_OF_PIPE,
    }
}

// ===== DEPTH / STENCIL =====

pub(crate) fn compare_op_to_vk(compare: CompareFunction) -> vk::CompareOp {
    match compare {
        CompareFunction::Never => vk::CompareOp::NEVER,
        CompareFunction::Less => vk::CompareOp::LESS,
        CompareFunction::Equal => vk::CompareOp::EQUAL,
        CompareFunction::LessEqual => vk::CompareOp::LESS_OR_EQUAL,
        CompareFunction::Greater => vk::CompareOp::GREATER,
        CompareFunction::NotEqual => vk::CompareOp::NOT_EQUAL,
        CompareFunction::GreaterEqual => vk::CompareOp::GREATER_OR_EQUAL,
        CompareFunction::Always => vk::CompareOp::ALWAYS,
    }
}

pub(crate) fn stencil_op_to_vk(op: StencilOp) -> vk::StencilOp {
    match op {
        StencilOp::Keep => vk::StencilOp::KEEP,
        StencilOp::Zero => vk::StencilOp::ZERO,
        StencilOp::Replace => vk::StencilOp::REPLACE,
        StencilOp::IncrementClamp => vk::StencilOp::INCREMENT_AND_CLAMP,
        StencilOp::DecrementClamp => vk::StencilOp::DECREMENT_AND_CLAMP,
        StencilOp::Invert => vk::StencilOp::INVERT,
        StencilOp::IncrementWrap => vk::StencilOp::INCREMENT_AND_WRAP,
        StencilOp::DecrementWrap => vk::StencilOp::DECREMENT_AND_WRAP,
    }
}

#[cfg(test)]
#[path = "vulkan_format_tests.rs"]
mod tests;
