use log::*;
use std::collections::HashSet;
use vulkanalia::{
    vk::{self, DeviceV1_0, HasBuilder, InstanceV1_0, KhrSurfaceExtension},
    Device,
};

use super::{constants, instance::VulkanInstance, surface::VulkanSurface};
use crate::error::{Creating, RenderError};

/// One entry of the adapter's queue-family layout.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct QueueFamily {
    pub index: u32,
    pub queue_count: u32,
    pub flags: vk::QueueFlags,
}

#[derive(Debug)]
pub struct VulkanDevice {
    pub vk_device: Device,
    pub physical_device: vk::PhysicalDevice,
    pub queue_families: Vec<QueueFamily>,
    /// Indexed by `[family][queue]`.
    queues: Vec<Vec<vk::Queue>>,
    pub graphics_family: u32,
    pub graphics_queue: vk::Queue,
}

impl VulkanDevice {
    /// First enumerated adapter wins; there is no ranking.
    unsafe fn pick_physical_device(
        instance: &VulkanInstance,
    ) -> Result<vk::PhysicalDevice, RenderError> {
        let physical_device = instance
            .vk_instance
            .enumerate_physical_devices()?
            .into_iter()
            .next()
            .ok_or(RenderError::NoAdapter)?;

        let properties = instance
            .vk_instance
            .get_physical_device_properties(physical_device);
        info!("Selected physical device (`{}`).", properties.device_name);

        Ok(physical_device)
    }

    pub unsafe fn new(
        instance: &VulkanInstance,
        surface: &VulkanSurface,
    ) -> Result<VulkanDevice, RenderError> {
        let physical_device = VulkanDevice::pick_physical_device(instance)?;

        let queue_families = instance
            .vk_instance
            .get_physical_device_queue_family_properties(physical_device)
            .iter()
            .enumerate()
            .map(|(i, p)| QueueFamily {
                index: i as u32,
                queue_count: p.queue_count,
                flags: p.queue_flags,
            })
            .collect::<Vec<_>>();

        info!("Queue family count: {}", queue_families.len());
        for family in &queue_families {
            info!(
                "- Queue family {}, queue count: {} ({:?})",
                family.index, family.queue_count, family.flags
            );
        }

        let presentable = queue_families
            .iter()
            .map(|f| {
                instance.vk_instance.get_physical_device_surface_support_khr(
                    physical_device,
                    f.index,
                    surface.vk_surface,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        let graphics_family = select_graphics_family(&queue_families, &presentable)
            .ok_or(RenderError::NoGraphicsQueue)?;

        let priorities = queue_priorities(&queue_families);
        let queue_infos = queue_families
            .iter()
            .zip(&priorities)
            .filter(|(f, _)| f.queue_count > 0)
            .map(|(f, p)| {
                vk::DeviceQueueCreateInfo::builder()
                    .queue_family_index(f.index)
                    .queue_priorities(p)
            })
            .collect::<Vec<_>>();

        let layers = if instance.validation_enabled() {
            vec![constants::VALIDATION_LAYER.as_ptr()]
        } else {
            vec![]
        };

        let available_extensions = instance
            .vk_instance
            .enumerate_device_extension_properties(physical_device, None)?
            .iter()
            .map(|e| e.extension_name)
            .collect::<HashSet<_>>();

        let mut extensions = vec![vk::KHR_SWAPCHAIN_EXTENSION.name.as_ptr()];

        // Portability drivers reject device creation unless the subset is enabled.
        if available_extensions.contains(&vk::KHR_PORTABILITY_SUBSET_EXTENSION.name) {
            info!("Enabling device extension for portability subset.");
            extensions.push(vk::KHR_PORTABILITY_SUBSET_EXTENSION.name.as_ptr());
        }

        let features = vk::PhysicalDeviceFeatures::builder();

        let info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(&queue_infos)
            .enabled_layer_names(&layers)
            .enabled_extension_names(&extensions)
            .enabled_features(&features);

        let device = instance
            .vk_instance
            .create_device(physical_device, &info, None)
            .creating("logical device")?;

        let queues = queue_families
            .iter()
            .map(|f| {
                (0..f.queue_count)
                    .map(|i| device.get_device_queue(f.index, i))
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();

        let graphics_queue = queues
            .get(graphics_family as usize)
            .and_then(|q| q.first())
            .copied()
            .ok_or(RenderError::NoGraphicsQueue)?;

        debug!("Using queue family {} for graphics and presentation.", graphics_family);

        Ok(VulkanDevice {
            vk_device: device,
            physical_device,
            queue_families,
            queues,
            graphics_family,
            graphics_queue,
        })
    }

    pub fn queue(&self, family: u32, index: u32) -> Option<vk::Queue> {
        self.queues
            .get(family as usize)
            .and_then(|q| q.get(index as usize))
            .copied()
    }

    pub unsafe fn wait_idle(&self) -> Result<(), RenderError> {
        self.vk_device.device_wait_idle()?;
        Ok(())
    }

    pub unsafe fn destroy(&mut self) {
        self.vk_device.destroy_device(None);
    }
}

/// The first family that can both draw and present to the surface.
pub fn select_graphics_family(families: &[QueueFamily], presentable: &[bool]) -> Option<u32> {
    families
        .iter()
        .zip(presentable)
        .find(|(f, present)| {
            **present && f.queue_count > 0 && f.flags.contains(vk::QueueFlags::GRAPHICS)
        })
        .map(|(f, _)| f.index)
}

/// One equal priority per queue, for every queue of every family.
pub fn queue_priorities(families: &[QueueFamily]) -> Vec<Vec<f32>> {
    families
        .iter()
        .map(|f| vec![constants::QUEUE_PRIORITY; f.queue_count as usize])
        .collect()
}
