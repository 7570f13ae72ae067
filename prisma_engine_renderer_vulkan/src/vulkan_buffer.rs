/// Buffer entry of the Vulkan resource tables

use ash::vk;
use gpu_allocator::vulkan::{Allocation, Allocator};
use prisma_engine::prisma::{Error, Result};
use prisma_engine::engine_error;
use std::sync::{Arc, Mutex};

/// Host-visible Vulkan buffer
pub(crate) struct Buffer {
    pub(crate) buffer: vk::Buffer,
    pub(crate) size: u64,
    allocation: Option<Allocation>,
    device: ash::Device,
    allocator: Arc<Mutex<Allocator>>,
}

impl Buffer {
    pub(crate) fn new(
        buffer: vk::Buffer,
        allocation: Allocation,
        size: u64,
        device: ash::Device,
        allocator: Arc<Mutex<Allocator>>,
    ) -> Self {
        Self { buffer, size, allocation: Some(allocation), device, allocator }
    }

    pub(crate) fn memory_size(&self) -> u64 {
        self.allocation.as_ref().map_or(0, |a| a.size())
    }

    /// Copy `data` into the mapped memory at `offset`
    pub(crate) fn write(&self, offset: u64, data: &[u8]) -> Result<()> {
        if offset + data.len() as u64 > self.size {
            return Err(Error::InvalidResource(format!(
                "Buffer write of {} bytes at offset {} exceeds size {}",
                data.len(), offset, self.size
            )));
        }

        let Some(allocation) = &self.allocation else {
            engine_error!("prisma::vulkan", "Buffer write failed: no GPU allocation");
            return Err(Error::BackendError("Buffer has no allocation".to_string()));
        };
        let mapped_ptr = allocation
            .mapped_ptr()
            .ok_or_else(|| Error::BackendError("Buffer is not CPU-accessible".to_string()))?
            .as_ptr() as *mut u8;

        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), mapped_ptr.add(offset as usize), data.len());
        }
        Ok(())
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        unsafe {
            if let Some(allocation) = self.allocation.take() {
                // Don't panic if lock fails - we still need to destroy the buffer
                if let Ok(mut allocator) = self.allocator.lock() {
                    allocator.free(allocation).ok();
                }
            }
            self.device.destroy_buffer(self.buffer, None);
        }
    }
}
