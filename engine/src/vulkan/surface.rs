use vulkanalia::vk::{self, KhrSurfaceExtension};
use vulkanalia::window as vk_window;
use winit::window::Window;

use super::instance::VulkanInstance;
use crate::error::{Creating, RenderError};

/// The window's presentable surface. The window owns the native drawable;
/// the instance owns this handle and it must go before the instance does.
#[derive(Debug)]
pub struct VulkanSurface {
    pub vk_surface: vk::SurfaceKHR,
}

impl VulkanSurface {
    pub unsafe fn new(instance: &VulkanInstance, window: &Window) -> Result<Self, RenderError> {
        let vk_surface = vk_window::create_surface(&instance.vk_instance, window, window)
            .creating("window surface")?;

        Ok(Self { vk_surface })
    }

    pub unsafe fn destroy(&mut self, instance: &VulkanInstance) {
        instance
            .vk_instance
            .destroy_surface_khr(self.vk_surface, None);
    }
}
