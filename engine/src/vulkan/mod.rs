use command_buffer::VulkanCommandBuffers;
use device::VulkanDevice;
use frame::{Frame, FrameScheduler, PresentQueue};
use framebuffer::VulkanFramebuffers;
use instance::VulkanInstance;
use log::*;
use pipeline::VulkanPipeline;
use render_pass::VulkanRenderPass;
use std::path::Path;
use surface::VulkanSurface;
use swapchain::VulkanSwapchain;
use sync::SyncPool;
use vulkanalia::{
    loader::{LibloadingLoader, LIBRARY},
    vk, Entry,
};
use winit::window::Window;

use crate::error::RenderError;

mod command_buffer;
mod constants;
mod device;
mod frame;
mod framebuffer;
mod image;
mod instance;
mod pipeline;
mod render_pass;
mod shader;
mod surface;
mod swapchain;
mod sync;

/// Every Vulkan object the triangle needs, in creation order. `destroy`
/// releases them in the reverse order.
#[derive(Debug)]
pub struct VulkanRenderer {
    _entry: Entry,
    instance: VulkanInstance,
    surface: VulkanSurface,
    pub device: VulkanDevice,
    swapchain: VulkanSwapchain,
    render_pass: VulkanRenderPass,
    pipeline: VulkanPipeline,
    framebuffers: VulkanFramebuffers,
    command_buffers: VulkanCommandBuffers,
    sync: SyncPool,
    scheduler: FrameScheduler,
}

impl VulkanRenderer {
    pub unsafe fn new(window: &Window, spirv_path: &Path) -> Result<VulkanRenderer, RenderError> {
        let loader = LibloadingLoader::new(LIBRARY).map_err(|e| RenderError::Loader(e.to_string()))?;
        let entry = Entry::new(loader).map_err(|b| RenderError::Loader(b.to_string()))?;

        let instance = VulkanInstance::new(
            &entry,
            vulkanalia::window::get_required_instance_extensions(window),
        )?;
        let surface = VulkanSurface::new(&instance, window)?;
        let device = VulkanDevice::new(&instance, &surface)?;

        let size = window.inner_size();
        let window_extent = vk::Extent2D {
            width: size.width,
            height: size.height,
        };
        let swapchain = VulkanSwapchain::new(&instance, &device, &surface, window_extent)?;

        let render_pass = VulkanRenderPass::new(&device, swapchain.format)?;
        let pipeline = VulkanPipeline::new(&device, &render_pass, swapchain.extent, spirv_path)?;
        let framebuffers = VulkanFramebuffers::new(&device, &render_pass, &swapchain)?;
        let command_buffers = VulkanCommandBuffers::new(
            &device,
            &[device.graphics_family],
            &framebuffers.framebuffers,
            render_pass.vk_render_pass,
            swapchain.extent,
            pipeline.vk_pipeline,
        )?;
        let sync = SyncPool::new(&device, framebuffers.len())?;

        debug_assert_eq!(swapchain.images.len(), swapchain.image_views.len());
        debug_assert_eq!(swapchain.len(), framebuffers.len());
        debug_assert_eq!(framebuffers.len(), command_buffers.graphics().len());
        debug_assert_eq!(framebuffers.len(), sync.len());

        info!(
            "Renderer ready: {} images, {} frames in flight.",
            swapchain.len(),
            sync.len()
        );

        Ok(VulkanRenderer {
            _entry: entry,
            instance,
            surface,
            device,
            swapchain,
            render_pass,
            pipeline,
            framebuffers,
            command_buffers,
            sync,
            scheduler: FrameScheduler::new(),
        })
    }

    pub unsafe fn render(&mut self) -> Result<Frame, RenderError> {
        let queue = PresentQueue {
            device: &self.device,
            swapchain: &self.swapchain,
        };

        self.scheduler
            .render_frame(&queue, &self.sync, self.command_buffers.graphics())
    }

    pub unsafe fn destroy(&mut self) {
        if let Err(e) = self.device.wait_idle() {
            error!("Device did not go idle before teardown: {}", e);
        }

        self.sync.destroy(&self.device);
        self.command_buffers.destroy(&self.device);
        self.framebuffers.destroy(&self.device);
        self.pipeline.destroy(&self.device);
        self.render_pass.destroy(&self.device);
        self.swapchain.destroy(&self.device);
        self.device.destroy();
        self.surface.destroy(&self.instance);
        self.instance.destroy();

        debug!("Destroyed all Vulkan objects.");
    }
}
