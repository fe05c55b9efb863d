use vulkanalia::vk::{self, DeviceV1_0, HasBuilder};

use super::device::VulkanDevice;
use crate::error::{Creating, RenderError};

/// One cleared color attachment, one subpass, no depth.
#[derive(Debug)]
pub struct VulkanRenderPass {
    pub vk_render_pass: vk::RenderPass,
}

impl VulkanRenderPass {
    pub unsafe fn new(device: &VulkanDevice, format: vk::Format) -> Result<Self, RenderError> {
        let attachments = &[color_attachment(format)];

        let color_attachment_ref = vk::AttachmentReference::builder()
            .attachment(0)
            .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);

        let color_attachments = &[color_attachment_ref];
        let subpass = vk::SubpassDescription::builder()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(color_attachments);

        let subpasses = &[subpass];
        let dependencies = &[presentation_dependency()];
        let info = vk::RenderPassCreateInfo::builder()
            .attachments(attachments)
            .subpasses(subpasses)
            .dependencies(dependencies);

        let vk_render_pass = device
            .vk_device
            .create_render_pass(&info, None)
            .creating("render pass")?;

        Ok(Self { vk_render_pass })
    }

    pub unsafe fn destroy(&mut self, device: &VulkanDevice) {
        device
            .vk_device
            .destroy_render_pass(self.vk_render_pass, None);
    }
}

/// Cleared on load, stored on end, handed to the presentation engine.
pub fn color_attachment(format: vk::Format) -> vk::AttachmentDescription {
    vk::AttachmentDescription::builder()
        .format(format)
        .samples(vk::SampleCountFlags::_1)
        .load_op(vk::AttachmentLoadOp::CLEAR)
        .store_op(vk::AttachmentStoreOp::STORE)
        .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
        .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
        .initial_layout(vk::ImageLayout::UNDEFINED)
        .final_layout(vk::ImageLayout::PRESENT_SRC_KHR)
        .build()
}

/// Keeps this frame's clear behind the previous presentation read of the
/// same image. Both sides sit at color-attachment output, where the
/// image-acquired semaphore wait also lands.
pub fn presentation_dependency() -> vk::SubpassDependency {
    vk::SubpassDependency::builder()
        .src_subpass(vk::SUBPASS_EXTERNAL)
        .dst_subpass(0)
        .src_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
        .src_access_mask(vk::AccessFlags::empty())
        .dst_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
        .dst_access_mask(
            vk::AccessFlags::COLOR_ATTACHMENT_READ | vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
        )
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachment_clears_stores_and_ends_presentable() {
        let attachment = color_attachment(vk::Format::B8G8R8A8_SRGB);

        assert_eq!(attachment.format, vk::Format::B8G8R8A8_SRGB);
        assert_eq!(attachment.samples, vk::SampleCountFlags::_1);
        assert_eq!(attachment.load_op, vk::AttachmentLoadOp::CLEAR);
        assert_eq!(attachment.store_op, vk::AttachmentStoreOp::STORE);
        assert_eq!(attachment.initial_layout, vk::ImageLayout::UNDEFINED);
        assert_eq!(attachment.final_layout, vk::ImageLayout::PRESENT_SRC_KHR);
    }

    #[test]
    fn dependency_orders_color_output_stages() {
        let dependency = presentation_dependency();

        assert_eq!(dependency.dst_subpass, 0);
        assert_eq!(
            dependency.src_stage_mask,
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
        );
        assert_eq!(
            dependency.dst_stage_mask,
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
        );
        assert!(dependency.src_access_mask.is_empty());
        assert_eq!(
            dependency.dst_access_mask,
            vk::AccessFlags::COLOR_ATTACHMENT_READ | vk::AccessFlags::COLOR_ATTACHMENT_WRITE
        );
    }
}
