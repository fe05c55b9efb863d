use vulkanalia::vk::{self, DeviceV1_0, HasBuilder};

use super::device::VulkanDevice;
use crate::error::{Creating, RenderError};

/// Creates the primitives a sync pool is made of.
pub trait SyncAllocator {
    unsafe fn create_semaphore(&self) -> Result<vk::Semaphore, RenderError>;
    unsafe fn create_fence(&self, signaled: bool) -> Result<vk::Fence, RenderError>;
}

impl SyncAllocator for VulkanDevice {
    unsafe fn create_semaphore(&self) -> Result<vk::Semaphore, RenderError> {
        let info = vk::SemaphoreCreateInfo::builder();
        self.vk_device
            .create_semaphore(&info, None)
            .creating("semaphore")
    }

    unsafe fn create_fence(&self, signaled: bool) -> Result<vk::Fence, RenderError> {
        let flags = if signaled {
            vk::FenceCreateFlags::SIGNALED
        } else {
            vk::FenceCreateFlags::empty()
        };
        let info = vk::FenceCreateInfo::builder().flags(flags);
        self.vk_device.create_fence(&info, None).creating("fence")
    }
}

/// The signals guarding one frame in flight.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FrameSync {
    /// Device-side: the acquired image may be rendered to.
    pub image_acquired: vk::Semaphore,
    /// Device-side: rendering finished, the image may be presented.
    pub render_finished: vk::Semaphore,
    /// Host-visible: the slot's last submission completed. Created signaled
    /// so the first wait on each slot returns immediately.
    pub frame_complete: vk::Fence,
}

#[derive(Debug)]
pub struct SyncPool {
    slots: Vec<FrameSync>,
}

impl SyncPool {
    /// One slot per framebuffer.
    pub unsafe fn new<A: SyncAllocator>(allocator: &A, size: usize) -> Result<Self, RenderError> {
        let slots = (0..size)
            .map(|_| {
                Ok(FrameSync {
                    image_acquired: allocator.create_semaphore()?,
                    render_finished: allocator.create_semaphore()?,
                    frame_complete: allocator.create_fence(true)?,
                })
            })
            .collect::<Result<Vec<_>, RenderError>>()?;

        Ok(Self { slots })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, index: usize) -> &FrameSync {
        &self.slots[index]
    }

    pub unsafe fn destroy(&mut self, device: &VulkanDevice) {
        for slot in &self.slots {
            device.vk_device.destroy_fence(slot.frame_complete, None);
            device
                .vk_device
                .destroy_semaphore(slot.render_finished, None);
            device.vk_device.destroy_semaphore(slot.image_acquired, None);
        }
    }
}
