use vulkanalia::vk::{self, DeviceV1_0, HasBuilder};

use super::device::VulkanDevice;
use crate::error::{Creating, RenderError};

/// A 2-D, identity-swizzled view of the single mip and layer of `image`.
pub unsafe fn create_color_view(
    device: &VulkanDevice,
    image: vk::Image,
    format: vk::Format,
) -> Result<vk::ImageView, RenderError> {
    let components = vk::ComponentMapping::builder()
        .r(vk::ComponentSwizzle::IDENTITY)
        .g(vk::ComponentSwizzle::IDENTITY)
        .b(vk::ComponentSwizzle::IDENTITY)
        .a(vk::ComponentSwizzle::IDENTITY);

    let subresource_range = color_subresource_range();

    let info = vk::ImageViewCreateInfo::builder()
        .image(image)
        .view_type(vk::ImageViewType::_2D)
        .format(format)
        .components(components)
        .subresource_range(subresource_range);

    device
        .vk_device
        .create_image_view(&info, None)
        .creating("swapchain image view")
}

pub fn color_subresource_range() -> vk::ImageSubresourceRange {
    vk::ImageSubresourceRange::builder()
        .aspect_mask(vk::ImageAspectFlags::COLOR)
        .base_mip_level(0)
        .level_count(1)
        .base_array_layer(0)
        .layer_count(1)
        .build()
}
