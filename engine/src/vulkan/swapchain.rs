use log::*;
use vulkanalia::vk::{self, DeviceV1_0, Handle, HasBuilder, KhrSurfaceExtension, KhrSwapchainExtension};

use super::{
    constants, device::VulkanDevice, image, instance::VulkanInstance, surface::VulkanSurface,
};
use crate::error::{Creating, RenderError};

#[derive(Debug)]
pub struct VulkanSwapchain {
    pub vk_swapchain: vk::SwapchainKHR,
    pub format: vk::Format,
    pub color_space: vk::ColorSpaceKHR,
    pub present_mode: vk::PresentModeKHR,
    pub extent: vk::Extent2D,
    pub images: Vec<vk::Image>,
    pub image_views: Vec<vk::ImageView>,
}

impl VulkanSwapchain {
    /// Creates the chain of presentable images for `surface` and one view per
    /// image. `window_extent` is only used when the platform leaves the
    /// extent to the application.
    pub unsafe fn new(
        instance: &VulkanInstance,
        device: &VulkanDevice,
        surface: &VulkanSurface,
        window_extent: vk::Extent2D,
    ) -> Result<VulkanSwapchain, RenderError> {
        let formats = instance
            .vk_instance
            .get_physical_device_surface_formats_khr(device.physical_device, surface.vk_surface)?;
        let surface_format = select_surface_format(&formats)?;

        let capabilities = instance
            .vk_instance
            .get_physical_device_surface_capabilities_khr(
                device.physical_device,
                surface.vk_surface,
            )?;

        let image_count = image_count(&capabilities);
        let extent = swapchain_extent(&capabilities, window_extent);
        let present_mode = vk::PresentModeKHR::FIFO;

        let queue_family_indices = &[device.graphics_family];
        let info = vk::SwapchainCreateInfoKHR::builder()
            .surface(surface.vk_surface)
            .min_image_count(image_count)
            .image_format(surface_format.format)
            .image_color_space(surface_format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .queue_family_indices(queue_family_indices)
            .pre_transform(capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .clipped(true)
            .old_swapchain(vk::SwapchainKHR::null());

        let vk_swapchain = device
            .vk_device
            .create_swapchain_khr(&info, None)
            .creating("swapchain")?;

        let images = device.vk_device.get_swapchain_images_khr(vk_swapchain)?;

        let image_views = images
            .iter()
            .map(|i| image::create_color_view(device, *i, surface_format.format))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            "Created swapchain: {} images, {}x{}, {:?}.",
            images.len(),
            extent.width,
            extent.height,
            surface_format.format
        );

        Ok(VulkanSwapchain {
            vk_swapchain,
            format: surface_format.format,
            color_space: surface_format.color_space,
            present_mode,
            extent,
            images,
            image_views,
        })
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub unsafe fn destroy(&mut self, device: &VulkanDevice) {
        self.image_views
            .iter()
            .for_each(|v| device.vk_device.destroy_image_view(*v, None));
        device
            .vk_device
            .destroy_swapchain_khr(self.vk_swapchain, None);
    }
}

/// Only 32-bit BGRA sRGB with the non-linear sRGB color space is accepted.
pub fn select_surface_format(
    formats: &[vk::SurfaceFormatKHR],
) -> Result<vk::SurfaceFormatKHR, RenderError> {
    if formats.is_empty() {
        return Err(RenderError::NoFormat);
    }

    formats
        .iter()
        .copied()
        .find(|f| {
            f.format == constants::SURFACE_FORMAT && f.color_space == constants::SURFACE_COLOR_SPACE
        })
        .ok_or(RenderError::UnsupportedFormat)
}

pub fn image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    capabilities
        .min_image_count
        .max(constants::MIN_SWAPCHAIN_IMAGES)
}

/// The reported current extent, unless the platform marks it as undefined.
pub fn swapchain_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    window_extent: vk::Extent2D,
) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }

    vk::Extent2D::builder()
        .width(window_extent.width.clamp(
            capabilities.min_image_extent.width,
            capabilities.max_image_extent.width,
        ))
        .height(window_extent.height.clamp(
            capabilities.min_image_extent.height,
            capabilities.max_image_extent.height,
        ))
        .build()
}
