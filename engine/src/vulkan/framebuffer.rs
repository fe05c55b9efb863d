use super::{device::VulkanDevice, render_pass::VulkanRenderPass, swapchain::VulkanSwapchain};
use crate::error::{Creating, RenderError};
use vulkanalia::vk::{self, DeviceV1_0, HasBuilder};

/// One framebuffer per swapchain image view, living exactly as long as the
/// swapchain.
#[derive(Debug)]
pub struct VulkanFramebuffers {
    pub framebuffers: Vec<vk::Framebuffer>,
}

impl VulkanFramebuffers {
    pub unsafe fn new(
        device: &VulkanDevice,
        render_pass: &VulkanRenderPass,
        swapchain: &VulkanSwapchain,
    ) -> Result<Self, RenderError> {
        let framebuffers = swapchain
            .image_views
            .iter()
            .map(|i| {
                let attachments = &[*i];
                let create_info = vk::FramebufferCreateInfo::builder()
                    .render_pass(render_pass.vk_render_pass)
                    .attachments(attachments)
                    .width(swapchain.extent.width)
                    .height(swapchain.extent.height)
                    .layers(1);

                device
                    .vk_device
                    .create_framebuffer(&create_info, None)
                    .creating("framebuffer")
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { framebuffers })
    }

    pub fn len(&self) -> usize {
        self.framebuffers.len()
    }

    pub unsafe fn destroy(&mut self, device: &VulkanDevice) {
        self.framebuffers
            .iter()
            .for_each(|f| device.vk_device.destroy_framebuffer(*f, None));
    }
}
