use anyhow::{Context, Result};
use std::path::Path;
use winit::window::Window;

use crate::vulkan::VulkanRenderer;

#[derive(Debug)]
pub struct Renderer {
    pub vk_renderer: VulkanRenderer,
}

impl Renderer {
    /// Builds every Vulkan object for `window`, loading shaders from `spirv_path`.
    pub unsafe fn create(window: &Window, spirv_path: &Path) -> Result<Self> {
        let vk_renderer =
            VulkanRenderer::new(window, spirv_path).context("Vulkan initialization failed")?;

        Ok(Self { vk_renderer })
    }

    /// Renders one frame.
    pub unsafe fn render(&mut self) -> Result<()> {
        self.vk_renderer.render().context("Frame failed")?;
        Ok(())
    }

    /// Waits for the device and tears everything down.
    pub unsafe fn destroy(&mut self) {
        self.vk_renderer.destroy();
    }
}
