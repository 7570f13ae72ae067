/// VulkanGraphicsDevice - Vulkan implementation of the GraphicsDevice trait

use ash::vk;
use gpu_allocator::vulkan::{AllocationCreateDesc, AllocationScheme, Allocator, AllocatorCreateDesc};
use gpu_allocator::MemoryLocation;
use prisma_engine::prisma::{Config, Error, RendererCapabilities, Result, ValidationStats};
use prisma_engine::prisma::device::{
    AcquireResult, BufferDesc, BufferKey, CommandList, DeviceStats, FenceKey, FramebufferDesc,
    FramebufferKey, GraphicsDevice, PipelineKey, PresentResult, RenderPassDesc, RenderPassKey,
    SemaphoreKey, SubmitInfo, SurfaceCapabilities, SwapchainDesc, SwapchainImages, SwapchainKey,
    TextureDesc, TextureKey, TextureViewDesc, TextureViewKey,
};
use prisma_engine::{engine_debug, engine_err, engine_error, engine_info, engine_warn};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use slotmap::SlotMap;
use std::ffi::CString;
use std::mem::ManuallyDrop;
use std::sync::{Arc, Mutex};

use crate::debug::{self, DebugConfig};
use crate::vulkan_buffer::Buffer;
use crate::vulkan_command_list::VulkanCommandList;
use crate::vulkan_context::{DebugMessenger, GpuContext};
use crate::vulkan_format::{
    aspect_for_format, buffer_usage_to_vk, image_layout_to_vk, load_op_to_vk,
    pipeline_stage_to_vk, sample_count_to_vk, store_op_to_vk, texture_format_to_vk,
    texture_usage_to_vk,
};
use crate::vulkan_frame_buffer::Framebuffer;
use crate::vulkan_pipeline::Pipeline;
use crate::vulkan_render_pass::RenderPass;
use crate::vulkan_swapchain::{create_swapchain, Surface, Swapchain};
use crate::vulkan_texture::{Texture, TextureView};

const SOURCE: &str = "prisma::vulkan";

/// Physical device and the queue families picked on it
struct SelectedDevice {
    physical_device: vk::PhysicalDevice,
    graphics_family: u32,
    present_family: u32,
    api_version: u32,
    name: String,
}

/// Vulkan device implementation
///
/// Owns the window surface, the presentation objects (swapchains, fences,
/// semaphores) and the allocator. Textures, views, buffers, render passes,
/// framebuffers and pipelines live in the resource tables shared with the
/// command lists.
pub struct VulkanGraphicsDevice {
    ctx: Arc<GpuContext>,
    physical_device: vk::PhysicalDevice,
    graphics_queue: vk::Queue,
    graphics_queue_family: u32,
    /// Present queue (may be same as graphics)
    present_queue: vk::Queue,
    surface: Surface,
    swapchain_loader: ash::khr::swapchain::Device,
    /// Dropped before the context so allocations are freed on a live device
    allocator: ManuallyDrop<Arc<Mutex<Allocator>>>,
    swapchains: SlotMap<SwapchainKey, Swapchain>,
    fences: SlotMap<FenceKey, vk::Fence>,
    semaphores: SlotMap<SemaphoreKey, vk::Semaphore>,
    submits: u64,
}

fn init_failed(what: &str, detail: impl std::fmt::Debug) -> Error {
    engine_error!(SOURCE, "{}: {:?}", what, detail);
    Error::InitializationFailed(format!("{}: {:?}", what, detail))
}

impl VulkanGraphicsDevice {
    /// Create a Vulkan device presenting to `window`
    ///
    /// # Arguments
    ///
    /// * `window` - Window for surface creation
    /// * `config` - Engine configuration (application name, validation settings)
    ///
    /// # Errors
    ///
    /// `InitializationFailed` for every failure; partially created objects
    /// are destroyed before returning.
    pub fn new<W: HasDisplayHandle + HasWindowHandle>(window: &W, config: &Config) -> Result<Self> {
        let validation = cfg!(feature = "vulkan-validation") && config.enable_validation;

        unsafe {
            let entry = ash::Entry::load()
                .map_err(|e| init_failed("Failed to load Vulkan library", e))?;

            let app_name = CString::new(config.app_name.clone()).unwrap_or_default();
            let (major, minor, patch) = config.app_version;
            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(vk::make_api_version(0, major, minor, patch))
                .engine_name(c"Prisma")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_3);

            let display_handle = window.display_handle()
                .map_err(|e| init_failed("Failed to get display handle", e))?;
            let mut extension_names = ash_window::enumerate_required_extensions(display_handle.as_raw())
                .map_err(|e| init_failed("Failed to get required extensions", e))?
                .to_vec();
            if validation {
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
            }

            let layer_names = if validation {
                vec![c"VK_LAYER_KHRONOS_validation".as_ptr()]
            } else {
                vec![]
            };

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let instance = entry
                .create_instance(&create_info, None)
                .map_err(|e| init_failed("Failed to create Vulkan instance", e))?;

            let debug_messenger = if validation {
                match Self::create_debug_messenger(&entry, &instance, config) {
                    Ok(messenger) => Some(messenger),
                    Err(e) => {
                        instance.destroy_instance(None);
                        return Err(e);
                    }
                }
            } else {
                None
            };

            // Tear down what exists so far when a later step fails
            let abort = |surface: Option<&Surface>, debug: Option<DebugMessenger>, error: Error| -> Error {
                if let Some(surface) = surface {
                    surface.loader.destroy_surface(surface.surface, None);
                }
                if let Some(debug) = debug {
                    debug::cleanup_debug_config();
                    debug.loader.destroy_debug_utils_messenger(debug.messenger, None);
                }
                instance.destroy_instance(None);
                error
            };

            let window_handle = match window.window_handle() {
                Ok(handle) => handle,
                Err(e) => return Err(abort(None, debug_messenger, init_failed("Failed to get window handle", e))),
            };
            let surface = match ash_window::create_surface(
                &entry,
                &instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            ) {
                Ok(surface) => Surface {
                    surface,
                    loader: ash::khr::surface::Instance::new(&entry, &instance),
                },
                Err(e) => return Err(abort(None, debug_messenger, init_failed("Failed to create surface", e))),
            };

            let selected = match Self::pick_physical_device(&instance, &surface) {
                Ok(selected) => selected,
                Err(e) => return Err(abort(Some(&surface), debug_messenger, e)),
            };

            let device = match Self::create_logical_device(&instance, &selected) {
                Ok(device) => device,
                Err(e) => return Err(abort(Some(&surface), debug_messenger, e)),
            };

            let mut capabilities = RendererCapabilities::empty();
            if vk::api_version_major(selected.api_version) > 1 || vk::api_version_minor(selected.api_version) >= 3 {
                capabilities |= RendererCapabilities::DYNAMIC_DEPTH_STATE;
            }
            if debug_messenger.is_some() {
                capabilities |= RendererCapabilities::DEBUG_LABELS;
            }

            let graphics_queue = device.get_device_queue(selected.graphics_family, 0);
            let present_queue = device.get_device_queue(selected.present_family, 0);

            let allocator = Allocator::new(&AllocatorCreateDesc {
                instance: instance.clone(),
                device: device.clone(),
                physical_device: selected.physical_device,
                debug_settings: Default::default(),
                buffer_device_address: false,
                allocation_sizes: Default::default(),
            });

            // From here on the context owns device and instance
            let ctx = Arc::new(GpuContext::new(entry, instance, device, debug_messenger, capabilities));
            let swapchain_loader = ash::khr::swapchain::Device::new(ctx.instance(), &ctx.device);

            let allocator = match allocator {
                Ok(allocator) => allocator,
                Err(e) => {
                    surface.loader.destroy_surface(surface.surface, None);
                    return Err(init_failed("Failed to create GPU allocator", e));
                }
            };

            engine_info!(
                SOURCE,
                "Vulkan device '{}' (API {}.{}), validation {}",
                selected.name,
                vk::api_version_major(selected.api_version),
                vk::api_version_minor(selected.api_version),
                if validation { "on" } else { "off" }
            );

            Ok(Self {
                ctx,
                physical_device: selected.physical_device,
                graphics_queue,
                graphics_queue_family: selected.graphics_family,
                present_queue,
                surface,
                swapchain_loader,
                allocator: ManuallyDrop::new(Arc::new(Mutex::new(allocator))),
                swapchains: SlotMap::with_key(),
                fences: SlotMap::with_key(),
                semaphores: SlotMap::with_key(),
                submits: 0,
            })
        }
    }

    unsafe fn create_debug_messenger(
        entry: &ash::Entry,
        instance: &ash::Instance,
        config: &Config,
    ) -> Result<DebugMessenger> {
        debug::init_debug_config(DebugConfig {
            severity: config.debug_severity,
            message_filter: config.debug_message_filter,
        });

        let loader = ash::ext::debug_utils::Instance::new(entry, instance);
        let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
            .message_severity(debug::severity_flags(config.debug_severity))
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(debug::vulkan_debug_callback));

        let messenger = loader
            .create_debug_utils_messenger(&debug_info, None)
            .map_err(|e| init_failed("Failed to create debug messenger", e))?;
        Ok(DebugMessenger { loader, messenger })
    }

    /// First device able to render and present, discrete GPUs first
    unsafe fn pick_physical_device(instance: &ash::Instance, surface: &Surface) -> Result<SelectedDevice> {
        let physical_devices = instance
            .enumerate_physical_devices()
            .map_err(|e| init_failed("Failed to enumerate physical devices", e))?;

        let mut candidates = Vec::new();
        for physical_device in physical_devices {
            let queue_families = instance.get_physical_device_queue_family_properties(physical_device);
            let Some(graphics_family) = queue_families
                .iter()
                .position(|qf| qf.queue_flags.contains(vk::QueueFlags::GRAPHICS))
                .map(|i| i as u32)
            else {
                continue;
            };

            let supports_present = |family: u32| {
                surface.loader
                    .get_physical_device_surface_support(physical_device, family, surface.surface)
                    .unwrap_or(false)
            };
            let present_family = if supports_present(graphics_family) {
                Some(graphics_family)
            } else {
                (0..queue_families.len() as u32).find(|&i| supports_present(i))
            };
            let Some(present_family) = present_family else {
                continue;
            };

            let properties = instance.get_physical_device_properties(physical_device);
            let name = properties
                .device_name_as_c_str()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|_| "unknown".to_string());
            candidates.push((
                properties.device_type == vk::PhysicalDeviceType::DISCRETE_GPU,
                SelectedDevice {
                    physical_device,
                    graphics_family,
                    present_family,
                    api_version: properties.api_version,
                    name,
                },
            ));
        }

        // Stable sort keeps enumeration order among equals
        candidates.sort_by_key(|(discrete, _)| !discrete);
        candidates
            .into_iter()
            .next()
            .map(|(_, selected)| selected)
            .ok_or_else(|| init_failed("No Vulkan GPU can render to this surface", vk::Result::ERROR_INCOMPATIBLE_DRIVER))
    }

    unsafe fn create_logical_device(instance: &ash::Instance, selected: &SelectedDevice) -> Result<ash::Device> {
        let queue_priorities = [1.0];
        let mut queue_create_infos = vec![
            vk::DeviceQueueCreateInfo::default()
                .queue_family_index(selected.graphics_family)
                .queue_priorities(&queue_priorities),
        ];
        if selected.present_family != selected.graphics_family {
            queue_create_infos.push(
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(selected.present_family)
                    .queue_priorities(&queue_priorities),
            );
        }

        let device_extension_names = [ash::khr::swapchain::NAME.as_ptr()];
        let device_features = vk::PhysicalDeviceFeatures::default().sampler_anisotropy(true);

        let device_create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&device_extension_names)
            .enabled_features(&device_features);

        instance
            .create_device(selected.physical_device, &device_create_info, None)
            .map_err(|e| init_failed("Failed to create logical device", e))
    }

    // ===== VULKAN-SPECIFIC API =====

    /// Logical device, for building pipelines outside the engine
    pub fn ash_device(&self) -> &ash::Device {
        &self.ctx.device
    }

    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    pub fn graphics_queue_family(&self) -> u32 {
        self.graphics_queue_family
    }

    /// Vulkan render pass behind a key, for pipeline compatibility
    pub fn vk_render_pass(&self, render_pass: RenderPassKey) -> Result<vk::RenderPass> {
        Ok(self.ctx.resources()?.render_pass(render_pass)?.render_pass)
    }

    /// Hand a pipeline built by the application to the device
    ///
    /// The device takes ownership: pipeline and layout are destroyed by
    /// `unregister_pipeline` or when the device is dropped. Push constants
    /// must be declared for the vertex and fragment stages.
    pub fn register_pipeline(&mut self, pipeline: vk::Pipeline, layout: vk::PipelineLayout) -> Result<PipelineKey> {
        let entry = Pipeline::new(pipeline, layout, self.ctx.device.clone());
        Ok(self.ctx.resources()?.pipelines.insert(entry))
    }

    pub fn unregister_pipeline(&mut self, pipeline: PipelineKey) {
        if let Ok(mut resources) = self.ctx.resources() {
            resources.pipelines.remove(pipeline);
        }
    }

    /// Copy `data` into a buffer at `offset`
    pub fn write_buffer(&mut self, buffer: BufferKey, offset: u64, data: &[u8]) -> Result<()> {
        self.ctx.resources()?.buffer(buffer)?.write(offset, data)
    }

    /// Validation messages seen since the device was created
    pub fn validation_stats(&self) -> ValidationStats {
        debug::get_validation_stats()
    }

    fn semaphore(&self, key: SemaphoreKey) -> Result<vk::Semaphore> {
        self.semaphores
            .get(key)
            .copied()
            .ok_or_else(|| Error::InvalidResource(format!("stale semaphore handle {:?}", key)))
    }

    fn fence(&self, key: FenceKey) -> Result<vk::Fence> {
        self.fences
            .get(key)
            .copied()
            .ok_or_else(|| Error::InvalidResource(format!("stale fence handle {:?}", key)))
    }

    /// Submit `command_buffers` with the synchronization from `info`
    fn queue_submit(&mut self, command_buffers: &[vk::CommandBuffer], info: &SubmitInfo) -> Result<()> {
        let mut wait_semaphores = Vec::with_capacity(info.wait_semaphores.len());
        let mut wait_stages = Vec::with_capacity(info.wait_semaphores.len());
        for &(semaphore, stage) in &info.wait_semaphores {
            wait_semaphores.push(self.semaphore(semaphore)?);
            wait_stages.push(pipeline_stage_to_vk(stage));
        }
        let signal_semaphores = info
            .signal_semaphores
            .iter()
            .map(|&s| self.semaphore(s))
            .collect::<Result<Vec<_>>>()?;
        let fence = match info.signal_fence {
            Some(fence) => self.fence(fence)?,
            None => vk::Fence::null(),
        };

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            self.ctx.device
                .queue_submit(self.graphics_queue, &[submit_info], fence)
                .map_err(|e| engine_err!(SOURCE, "Failed to submit commands to GPU queue: {:?}", e))
        }
    }

    fn allocate(&self, name: &str, requirements: vk::MemoryRequirements, location: MemoryLocation, linear: bool)
        -> Result<gpu_allocator::vulkan::Allocation>
    {
        let mut allocator = self.allocator
            .lock()
            .map_err(|_| Error::BackendError("allocator poisoned".to_string()))?;
        allocator
            .allocate(&AllocationCreateDesc {
                name,
                requirements,
                location,
                linear,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })
            .map_err(|e| {
                let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                engine_error!(SOURCE, "Out of GPU memory for {} ({:.2} MB): {}", name, size_mb, e);
                Error::OutOfMemory
            })
    }
}

impl GraphicsDevice for VulkanGraphicsDevice {
    // ===== COMMANDS & SYNCHRONIZATION =====

    fn create_command_list(&mut self) -> Result<Box<dyn CommandList>> {
        let cmd_list = VulkanCommandList::new(Arc::clone(&self.ctx), self.graphics_queue_family)?;
        Ok(Box::new(cmd_list))
    }

    fn create_fence(&mut self, signaled: bool) -> Result<FenceKey> {
        let flags = if signaled { vk::FenceCreateFlags::SIGNALED } else { vk::FenceCreateFlags::empty() };
        let fence = unsafe {
            self.ctx.device
                .create_fence(&vk::FenceCreateInfo::default().flags(flags), None)
                .map_err(|e| engine_err!(SOURCE, "Failed to create fence: {:?}", e))?
        };
        Ok(self.fences.insert(fence))
    }

    fn wait_for_fence(&mut self, fence: FenceKey, timeout_ns: u64) -> Result<()> {
        let vk_fence = self.fence(fence)?;
        unsafe {
            match self.ctx.device.wait_for_fences(&[vk_fence], true, timeout_ns) {
                Ok(()) => Ok(()),
                Err(vk::Result::TIMEOUT) => Err(engine_err!(SOURCE, "Fence wait timed out after {} ns", timeout_ns)),
                Err(e) => Err(engine_err!(SOURCE, "Failed to wait for fence: {:?}", e)),
            }
        }
    }

    fn reset_fence(&mut self, fence: FenceKey) -> Result<()> {
        let vk_fence = self.fence(fence)?;
        unsafe {
            self.ctx.device
                .reset_fences(&[vk_fence])
                .map_err(|e| engine_err!(SOURCE, "Failed to reset fence: {:?}", e))
        }
    }

    fn destroy_fence(&mut self, fence: FenceKey) {
        if let Some(vk_fence) = self.fences.remove(fence) {
            unsafe { self.ctx.device.destroy_fence(vk_fence, None) };
        }
    }

    fn create_semaphore(&mut self) -> Result<SemaphoreKey> {
        let semaphore = unsafe {
            self.ctx.device
                .create_semaphore(&vk::SemaphoreCreateInfo::default(), None)
                .map_err(|e| engine_err!(SOURCE, "Failed to create semaphore: {:?}", e))?
        };
        Ok(self.semaphores.insert(semaphore))
    }

    fn destroy_semaphore(&mut self, semaphore: SemaphoreKey) {
        if let Some(vk_semaphore) = self.semaphores.remove(semaphore) {
            unsafe { self.ctx.device.destroy_semaphore(vk_semaphore, None) };
        }
    }

    fn submit(&mut self, commands: &dyn CommandList, info: &SubmitInfo) -> Result<()> {
        let cmd = commands
            .as_any()
            .downcast_ref::<VulkanCommandList>()
            .ok_or_else(|| Error::InvalidResource("command list was not created by the Vulkan device".to_string()))?;
        if !cmd.is_executable() {
            return Err(Error::InvalidState("submit of a command list that was not ended".to_string()));
        }

        self.queue_submit(&[cmd.command_buffer()], info)?;
        cmd.commit_layouts(&mut *self.ctx.resources()?);
        self.submits += 1;
        Ok(())
    }

    fn signal(&mut self, info: &SubmitInfo) -> Result<()> {
        self.queue_submit(&[], info)
    }

    fn wait_idle(&mut self) -> Result<()> {
        unsafe {
            self.ctx.device
                .device_wait_idle()
                .map_err(|e| engine_err!(SOURCE, "Failed to wait idle: {:?}", e))
        }
    }

    // ===== PRESENTATION =====

    fn surface_capabilities(&mut self) -> Result<SurfaceCapabilities> {
        self.surface.capabilities(self.physical_device)
    }

    fn create_swapchain(&mut self, desc: &SwapchainDesc) -> Result<SwapchainImages> {
        let transform = self.surface.current_transform(self.physical_device);
        let (swapchain, images) = create_swapchain(&self.swapchain_loader, &self.surface, transform, desc)?;

        let extent = vk::Extent2D { width: desc.extent.width, height: desc.extent.height };
        let keys = {
            let mut resources = match self.ctx.resources() {
                Ok(resources) => resources,
                Err(e) => {
                    unsafe { self.swapchain_loader.destroy_swapchain(swapchain, None) };
                    return Err(e);
                }
            };
            images
                .into_iter()
                .map(|image| {
                    resources.textures.insert(Texture::presentable(
                        image,
                        desc.surface_format.format,
                        extent,
                        self.ctx.device.clone(),
                        Arc::clone(&*self.allocator),
                    ))
                })
                .collect::<Vec<TextureKey>>()
        };

        engine_debug!(
            SOURCE,
            "Swapchain created: {}x{}, {} images, {:?}",
            extent.width, extent.height, keys.len(), desc.present_mode
        );
        let key = self.swapchains.insert(Swapchain { swapchain, images: keys.clone() });
        Ok(SwapchainImages { swapchain: key, images: keys })
    }

    fn destroy_swapchain(&mut self, swapchain: SwapchainKey) {
        let Some(entry) = self.swapchains.remove(swapchain) else {
            return;
        };
        if let Ok(mut resources) = self.ctx.resources() {
            for image in &entry.images {
                resources.textures.remove(*image);
            }
        }
        unsafe {
            self.swapchain_loader.destroy_swapchain(entry.swapchain, None);
        }
    }

    fn acquire_next_image(
        &mut self,
        swapchain: SwapchainKey,
        signal: SemaphoreKey,
        timeout_ns: u64,
    ) -> Result<AcquireResult> {
        let vk_swapchain = self.swapchains
            .get(swapchain)
            .map(|s| s.swapchain)
            .ok_or_else(|| Error::InvalidResource(format!("stale swapchain handle {:?}", swapchain)))?;
        let semaphore = self.semaphore(signal)?;

        unsafe {
            match self.swapchain_loader.acquire_next_image(vk_swapchain, timeout_ns, semaphore, vk::Fence::null()) {
                Ok((image_index, suboptimal)) => Ok(AcquireResult::Acquired { image_index, suboptimal }),
                Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(AcquireResult::OutOfDate),
                Err(e) => Err(engine_err!(SOURCE, "Failed to acquire next swapchain image: {:?}", e)),
            }
        }
    }

    fn present(&mut self, swapchain: SwapchainKey, image_index: u32, wait: SemaphoreKey) -> Result<PresentResult> {
        let vk_swapchain = self.swapchains
            .get(swapchain)
            .map(|s| s.swapchain)
            .ok_or_else(|| Error::InvalidResource(format!("stale swapchain handle {:?}", swapchain)))?;

        let swapchains = [vk_swapchain];
        let image_indices = [image_index];
        let wait_semaphores = [self.semaphore(wait)?];
        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        unsafe {
            match self.swapchain_loader.queue_present(self.present_queue, &present_info) {
                Ok(false) => Ok(PresentResult::Optimal),
                Ok(true) => Ok(PresentResult::Suboptimal),
                Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(PresentResult::OutOfDate),
                Err(e) => Err(engine_err!(SOURCE, "Failed to present swapchain image: {:?}", e)),
            }
        }
    }

    // ===== RESOURCES =====

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureKey> {
        if desc.width == 0 || desc.height == 0 {
            return Err(Error::InvalidResource(format!("texture size {}x{}", desc.width, desc.height)));
        }

        unsafe {
            let image_create_info = vk::ImageCreateInfo::default()
                .image_type(vk::ImageType::TYPE_2D)
                .format(texture_format_to_vk(desc.format))
                .extent(vk::Extent3D { width: desc.width, height: desc.height, depth: 1 })
                .mip_levels(desc.mip_levels.max(1))
                .array_layers(desc.array_layers.max(1))
                .samples(vk::SampleCountFlags::TYPE_1)
                .tiling(vk::ImageTiling::OPTIMAL)
                .usage(texture_usage_to_vk(desc.usage))
                .sharing_mode(vk::SharingMode::EXCLUSIVE)
                .initial_layout(vk::ImageLayout::UNDEFINED);

            let image = self.ctx.device
                .create_image(&image_create_info, None)
                .map_err(|e| engine_err!(SOURCE, "Failed to create texture image: {:?}", e))?;

            let requirements = self.ctx.device.get_image_memory_requirements(image);
            let name = desc.debug_name.as_deref().unwrap_or("texture");
            let allocation = match self.allocate(name, requirements, MemoryLocation::GpuOnly, false) {
                Ok(allocation) => allocation,
                Err(e) => {
                    self.ctx.device.destroy_image(image, None);
                    return Err(e);
                }
            };

            if let Err(e) = self.ctx.device.bind_image_memory(image, allocation.memory(), allocation.offset()) {
                if let Ok(mut allocator) = self.allocator.lock() {
                    allocator.free(allocation).ok();
                }
                self.ctx.device.destroy_image(image, None);
                return Err(engine_err!(SOURCE, "Failed to bind texture memory: {:?}", e));
            }

            let texture = Texture::owned(image, allocation, desc, self.ctx.device.clone(), Arc::clone(&*self.allocator));
            Ok(self.ctx.resources()?.textures.insert(texture))
        }
    }

    fn destroy_texture(&mut self, texture: TextureKey) {
        let Ok(mut resources) = self.ctx.resources() else {
            return;
        };
        if let Some(entry) = resources.textures.get(texture) {
            if !entry.is_owned() {
                engine_warn!(SOURCE, "destroy_texture on a swapchain image ignored");
                return;
            }
        }
        resources.textures.remove(texture);
    }

    fn create_texture_view(&mut self, texture: TextureKey, desc: &TextureViewDesc) -> Result<TextureViewKey> {
        let mut resources = self.ctx.resources()?;
        let entry = resources.texture(texture)?;

        if desc.layer_count == 0 || desc.base_layer + desc.layer_count > entry.array_layers {
            return Err(Error::InvalidResource(format!(
                "view layers {}..{} out of range (array_layers = {})",
                desc.base_layer, desc.base_layer + desc.layer_count, entry.array_layers
            )));
        }
        if desc.mip_count == 0 || desc.base_mip + desc.mip_count > entry.mip_levels {
            return Err(Error::InvalidResource(format!(
                "view mips {}..{} out of range (mip_levels = {})",
                desc.base_mip, desc.base_mip + desc.mip_count, entry.mip_levels
            )));
        }

        let view_type = if desc.layer_count > 1 {
            vk::ImageViewType::TYPE_2D_ARRAY
        } else {
            vk::ImageViewType::TYPE_2D
        };
        let view_create_info = vk::ImageViewCreateInfo::default()
            .image(entry.image)
            .view_type(view_type)
            .format(texture_format_to_vk(entry.format))
            .components(vk::ComponentMapping {
                r: vk::ComponentSwizzle::IDENTITY,
                g: vk::ComponentSwizzle::IDENTITY,
                b: vk::ComponentSwizzle::IDENTITY,
                a: vk::ComponentSwizzle::IDENTITY,
            })
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: aspect_for_format(entry.format),
                base_mip_level: desc.base_mip,
                level_count: desc.mip_count,
                base_array_layer: desc.base_layer,
                layer_count: desc.layer_count,
            });

        let view = unsafe {
            self.ctx.device
                .create_image_view(&view_create_info, None)
                .map_err(|e| engine_err!(SOURCE, "Failed to create image view: {:?}", e))?
        };
        Ok(resources.views.insert(TextureView::new(view, texture, self.ctx.device.clone())))
    }

    fn destroy_texture_view(&mut self, view: TextureViewKey) {
        if let Ok(mut resources) = self.ctx.resources() {
            resources.views.remove(view);
        }
    }

    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<BufferKey> {
        if desc.size == 0 {
            return Err(Error::InvalidResource("buffer of size 0".to_string()));
        }

        unsafe {
            let buffer_create_info = vk::BufferCreateInfo::default()
                .size(desc.size)
                .usage(buffer_usage_to_vk(desc.usage) | vk::BufferUsageFlags::TRANSFER_DST)
                .sharing_mode(vk::SharingMode::EXCLUSIVE);

            let buffer = self.ctx.device
                .create_buffer(&buffer_create_info, None)
                .map_err(|e| engine_err!(SOURCE, "Failed to create buffer of size {} bytes: {:?}", desc.size, e))?;

            let requirements = self.ctx.device.get_buffer_memory_requirements(buffer);
            let allocation = match self.allocate("buffer", requirements, MemoryLocation::CpuToGpu, true) {
                Ok(allocation) => allocation,
                Err(e) => {
                    self.ctx.device.destroy_buffer(buffer, None);
                    return Err(e);
                }
            };

            if let Err(e) = self.ctx.device.bind_buffer_memory(buffer, allocation.memory(), allocation.offset()) {
                if let Ok(mut allocator) = self.allocator.lock() {
                    allocator.free(allocation).ok();
                }
                self.ctx.device.destroy_buffer(buffer, None);
                return Err(engine_err!(SOURCE, "Failed to bind buffer memory: {:?}", e));
            }

            let entry = Buffer::new(buffer, allocation, desc.size, self.ctx.device.clone(), Arc::clone(&*self.allocator));
            Ok(self.ctx.resources()?.buffers.insert(entry))
        }
    }

    fn destroy_buffer(&mut self, buffer: BufferKey) {
        if let Ok(mut resources) = self.ctx.resources() {
            resources.buffers.remove(buffer);
        }
    }

    fn create_render_pass(&mut self, desc: &RenderPassDesc) -> Result<RenderPassKey> {
        let mut attachments = Vec::new();
        let mut attachment_layouts = Vec::new();
        let mut color_attachment_refs = Vec::new();
        let mut depth_attachment_ref: Option<vk::AttachmentReference> = None;

        let all = desc.color_attachments.iter().chain(desc.depth_attachment.iter());
        for (i, attachment) in all.enumerate() {
            let (stencil_load, stencil_store) = if attachment.format.has_stencil() {
                (load_op_to_vk(attachment.load_op), store_op_to_vk(attachment.store_op))
            } else {
                (vk::AttachmentLoadOp::DONT_CARE, vk::AttachmentStoreOp::DONT_CARE)
            };
            let initial = image_layout_to_vk(attachment.initial_layout);
            let final_layout = image_layout_to_vk(attachment.final_layout);

            attachments.push(vk::AttachmentDescription::default()
                .format(texture_format_to_vk(attachment.format))
                .samples(sample_count_to_vk(attachment.samples))
                .load_op(load_op_to_vk(attachment.load_op))
                .store_op(store_op_to_vk(attachment.store_op))
                .stencil_load_op(stencil_load)
                .stencil_store_op(stencil_store)
                .initial_layout(initial)
                .final_layout(final_layout));
            attachment_layouts.push((initial, final_layout));

            if i < desc.color_attachments.len() {
                color_attachment_refs.push(vk::AttachmentReference::default()
                    .attachment(i as u32)
                    .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL));
            } else {
                depth_attachment_ref = Some(vk::AttachmentReference::default()
                    .attachment(i as u32)
                    .layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL));
            }
        }

        let mut subpass = vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&color_attachment_refs);
        if let Some(ref depth_ref) = depth_attachment_ref {
            subpass = subpass.depth_stencil_attachment(depth_ref);
        }

        // Include depth stages when a depth attachment is present
        let (stage_mask, access_mask) = if depth_attachment_ref.is_some() {
            (
                vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                    | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
                vk::AccessFlags::COLOR_ATTACHMENT_WRITE
                    | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            )
        } else {
            (
                vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
                vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
            )
        };

        let dependency = vk::SubpassDependency::default()
            .src_subpass(vk::SUBPASS_EXTERNAL)
            .dst_subpass(0)
            .src_stage_mask(stage_mask)
            .src_access_mask(vk::AccessFlags::empty())
            .dst_stage_mask(stage_mask)
            .dst_access_mask(access_mask);

        let render_pass_info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(std::slice::from_ref(&subpass))
            .dependencies(std::slice::from_ref(&dependency));

        let render_pass = unsafe {
            self.ctx.device
                .create_render_pass(&render_pass_info, None)
                .map_err(|e| engine_err!(SOURCE, "Failed to create render pass: {:?}", e))?
        };

        let entry = RenderPass::new(render_pass, attachment_layouts, self.ctx.device.clone());
        Ok(self.ctx.resources()?.render_passes.insert(entry))
    }

    fn destroy_render_pass(&mut self, render_pass: RenderPassKey) {
        if let Ok(mut resources) = self.ctx.resources() {
            resources.render_passes.remove(render_pass);
        }
    }

    fn create_framebuffer(&mut self, desc: &FramebufferDesc) -> Result<FramebufferKey> {
        let mut resources = self.ctx.resources()?;
        let vk_render_pass = resources.render_pass(desc.render_pass)?.render_pass;

        let mut image_views = Vec::with_capacity(desc.color_attachments.len() + 1);
        let mut textures = Vec::with_capacity(desc.color_attachments.len() + 1);
        for &view in desc.color_attachments.iter().chain(desc.depth_attachment.iter()) {
            let entry = resources.view(view)?;
            image_views.push(entry.view);
            textures.push(entry.texture);
        }

        let framebuffer_info = vk::FramebufferCreateInfo::default()
            .render_pass(vk_render_pass)
            .attachments(&image_views)
            .width(desc.width)
            .height(desc.height)
            .layers(1);

        let framebuffer = unsafe {
            self.ctx.device
                .create_framebuffer(&framebuffer_info, None)
                .map_err(|e| engine_err!(SOURCE, "Failed to create framebuffer: {:?}", e))?
        };

        let entry = Framebuffer::new(framebuffer, textures, desc.width, desc.height, self.ctx.device.clone());
        Ok(resources.framebuffers.insert(entry))
    }

    fn destroy_framebuffer(&mut self, framebuffer: FramebufferKey) {
        if let Ok(mut resources) = self.ctx.resources() {
            resources.framebuffers.remove(framebuffer);
        }
    }

    // ===== INFO =====

    fn capabilities(&self) -> RendererCapabilities {
        self.ctx.capabilities
    }

    fn stats(&self) -> DeviceStats {
        let mut stats = DeviceStats { submits: self.submits, ..DeviceStats::default() };
        if let Ok(resources) = self.ctx.resources() {
            stats.live_textures = resources.textures.len() as u32;
            stats.live_buffers = resources.buffers.len() as u32;
            stats.live_render_passes = resources.render_passes.len() as u32;
            stats.live_framebuffers = resources.framebuffers.len() as u32;
            stats.gpu_memory_used = resources.textures.values().map(Texture::memory_size).sum::<u64>()
                + resources.buffers.values().map(Buffer::memory_size).sum::<u64>();
        }
        stats
    }
}

impl Drop for VulkanGraphicsDevice {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.device_wait_idle().ok();

            // 1. Presentation objects
            let swapchain_keys: Vec<SwapchainKey> = self.swapchains.keys().collect();
            for key in swapchain_keys {
                self.destroy_swapchain(key);
            }
            for (_, fence) in self.fences.drain() {
                self.ctx.device.destroy_fence(fence, None);
            }
            for (_, semaphore) in self.semaphores.drain() {
                self.ctx.device.destroy_semaphore(semaphore, None);
            }

            // 2. Table entries free their allocations while the allocator is alive
            if let Ok(mut resources) = self.ctx.resources() {
                resources.clear();
            }
            ManuallyDrop::drop(&mut self.allocator);

            // 3. Surface before the instance; device and instance go with the last context reference
            self.surface.loader.destroy_surface(self.surface.surface, None);
        }
    }
}
