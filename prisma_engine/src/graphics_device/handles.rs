//! Typed, generation-checked GPU resource handles
//!
//! Every GPU object the engine talks about is referenced through one of
//! these keys. Backends keep their objects in `SlotMap`s keyed by them, so
//! a handle that outlived its object fails the generation check and is
//! reported as `Error::InvalidResource` instead of aliasing a new object.

use slotmap::new_key_type;

new_key_type! {
    /// Texture (image + memory)
    pub struct TextureKey;
    /// View onto a texture (a layer range, mip range, aspect)
    pub struct TextureViewKey;
    /// GPU buffer
    pub struct BufferKey;
    /// Graphics pipeline registered with the backend
    pub struct PipelineKey;
    /// Render pass (attachment formats, load/store ops, layouts)
    pub struct RenderPassKey;
    /// Framebuffer compatible with a render pass
    pub struct FramebufferKey;
    /// Presentable image chain
    pub struct SwapchainKey;
    /// CPU-waitable GPU completion signal
    pub struct FenceKey;
    /// GPU-to-GPU ordering signal
    pub struct SemaphoreKey;
}
