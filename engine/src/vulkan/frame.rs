//! The per-frame submit/present protocol.
//!
//! Each call waits on one sync slot's fence, acquires an image, submits that
//! image's pre-recorded command buffer and presents it. Acquire, draw and
//! present are ordered on the device by the slot's two semaphores; the fence
//! wait is the only point where the host blocks, which bounds the frames in
//! flight to the pool size.

use log::*;
use vulkanalia::vk::{self, DeviceV1_0, Handle, HasBuilder, KhrSwapchainExtension};

use super::{device::VulkanDevice, swapchain::VulkanSwapchain, sync::SyncPool};
use crate::error::RenderError;

/// An image handed out by the swapchain.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Acquired {
    pub image_index: u32,
    pub suboptimal: bool,
}

/// The queue operations one frame needs.
pub trait FrameQueue {
    /// Blocks until `fence` is signaled, then resets it.
    unsafe fn wait_and_reset(&self, fence: vk::Fence) -> Result<(), RenderError>;

    unsafe fn acquire_next_image(&self, signal: vk::Semaphore) -> Result<Acquired, RenderError>;

    unsafe fn submit(
        &self,
        command_buffer: vk::CommandBuffer,
        wait: vk::Semaphore,
        signal: vk::Semaphore,
        fence: vk::Fence,
    ) -> Result<(), RenderError>;

    /// Returns whether the swapchain reported itself suboptimal.
    unsafe fn present(&self, image_index: u32, wait: vk::Semaphore) -> Result<bool, RenderError>;
}

/// The graphics queue presenting to one swapchain.
pub struct PresentQueue<'a> {
    pub device: &'a VulkanDevice,
    pub swapchain: &'a VulkanSwapchain,
}

impl FrameQueue for PresentQueue<'_> {
    unsafe fn wait_and_reset(&self, fence: vk::Fence) -> Result<(), RenderError> {
        self.device
            .vk_device
            .wait_for_fences(&[fence], true, u64::MAX)?;
        self.device.vk_device.reset_fences(&[fence])?;
        Ok(())
    }

    unsafe fn acquire_next_image(&self, signal: vk::Semaphore) -> Result<Acquired, RenderError> {
        let result = self.device.vk_device.acquire_next_image_khr(
            self.swapchain.vk_swapchain,
            u64::MAX,
            signal,
            vk::Fence::null(),
        );

        match result {
            Ok((image_index, code)) => Ok(Acquired {
                image_index,
                suboptimal: code == vk::SuccessCode::SUBOPTIMAL_KHR,
            }),
            Err(vk::ErrorCode::OUT_OF_DATE_KHR) => Err(RenderError::SwapchainOutOfDate),
            Err(e) => Err(e.into()),
        }
    }

    unsafe fn submit(
        &self,
        command_buffer: vk::CommandBuffer,
        wait: vk::Semaphore,
        signal: vk::Semaphore,
        fence: vk::Fence,
    ) -> Result<(), RenderError> {
        let wait_semaphores = &[wait];
        // Only color output has to wait for the image; earlier stages run ahead.
        let wait_stages = &[vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = &[command_buffer];
        let signal_semaphores = &[signal];
        let submit_info = vk::SubmitInfo::builder()
            .wait_semaphores(wait_semaphores)
            .wait_dst_stage_mask(wait_stages)
            .command_buffers(command_buffers)
            .signal_semaphores(signal_semaphores);

        self.device
            .vk_device
            .queue_submit(self.device.graphics_queue, &[submit_info], fence)?;
        Ok(())
    }

    unsafe fn present(&self, image_index: u32, wait: vk::Semaphore) -> Result<bool, RenderError> {
        let wait_semaphores = &[wait];
        let swapchains = &[self.swapchain.vk_swapchain];
        let image_indices = &[image_index];
        let present_info = vk::PresentInfoKHR::builder()
            .wait_semaphores(wait_semaphores)
            .swapchains(swapchains)
            .image_indices(image_indices);

        match self
            .device
            .vk_device
            .queue_present_khr(self.device.graphics_queue, &present_info)
        {
            Ok(code) => Ok(code == vk::SuccessCode::SUBOPTIMAL_KHR),
            Err(vk::ErrorCode::OUT_OF_DATE_KHR) => Err(RenderError::SwapchainOutOfDate),
            Err(e) => Err(e.into()),
        }
    }
}

/// Which slot and image a frame used.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub slot: usize,
    pub image_index: u32,
}

#[derive(Debug, Default)]
pub struct FrameScheduler {
    slot: usize,
    warned_suboptimal: bool,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// The sync slot the next frame will use.
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Runs one frame. `command_buffers` is indexed by swapchain image and is
    /// submitted as recorded; nothing is re-recorded here.
    pub unsafe fn render_frame<Q: FrameQueue>(
        &mut self,
        queue: &Q,
        sync: &SyncPool,
        command_buffers: &[vk::CommandBuffer],
    ) -> Result<Frame, RenderError> {
        let slot = self.slot;
        let signals = sync.slot(slot);

        queue.wait_and_reset(signals.frame_complete)?;

        let acquired = queue.acquire_next_image(signals.image_acquired)?;
        let command_buffer = command_buffers
            .get(acquired.image_index as usize)
            .copied()
            .ok_or(RenderError::UnknownImage(acquired.image_index))?;

        queue.submit(
            command_buffer,
            signals.image_acquired,
            signals.render_finished,
            signals.frame_complete,
        )?;

        let suboptimal = queue.present(acquired.image_index, signals.render_finished)?;
        if (acquired.suboptimal || suboptimal) && !self.warned_suboptimal {
            warn!("Swapchain is suboptimal for the surface; continuing with the fixed-size chain.");
            self.warned_suboptimal = true;
        }

        self.slot = (slot + 1) % sync.len();

        trace!("Frame used slot {} and image {}.", slot, acquired.image_index);

        Ok(Frame {
            slot,
            image_index: acquired.image_index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vulkan::sync::tests::FakeAllocator;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    #[derive(Clone, Debug, PartialEq)]
    enum Call {
        WaitAndReset(vk::Fence),
        Acquire(vk::Semaphore),
        Submit {
            command_buffer: vk::CommandBuffer,
            wait: vk::Semaphore,
            signal: vk::Semaphore,
            fence: vk::Fence,
        },
        Present {
            image_index: u32,
            wait: vk::Semaphore,
        },
    }

    /// Plays back the image indices a platform would hand out and logs every
    /// queue operation.
    struct ScriptedQueue {
        images: RefCell<VecDeque<Result<Acquired, vk::ErrorCode>>>,
        present_results: RefCell<VecDeque<Result<bool, vk::ErrorCode>>>,
        calls: RefCell<Vec<Call>>,
    }

    impl ScriptedQueue {
        fn new(images: &[u32]) -> Self {
            Self {
                images: RefCell::new(
                    images
                        .iter()
                        .map(|i| {
                            Ok(Acquired {
                                image_index: *i,
                                suboptimal: false,
                            })
                        })
                        .collect(),
                ),
                present_results: RefCell::new(VecDeque::new()),
                calls: RefCell::new(Vec::new()),
            }
        }

        fn submits(&self) -> Vec<vk::CommandBuffer> {
            self.calls
                .borrow()
                .iter()
                .filter_map(|c| match c {
                    Call::Submit { command_buffer, .. } => Some(*command_buffer),
                    _ => None,
                })
                .collect()
        }
    }

    impl FrameQueue for ScriptedQueue {
        unsafe fn wait_and_reset(&self, fence: vk::Fence) -> Result<(), RenderError> {
            self.calls.borrow_mut().push(Call::WaitAndReset(fence));
            Ok(())
        }

        unsafe fn acquire_next_image(
            &self,
            signal: vk::Semaphore,
        ) -> Result<Acquired, RenderError> {
            self.calls.borrow_mut().push(Call::Acquire(signal));
            match self.images.borrow_mut().pop_front() {
                Some(Ok(acquired)) => Ok(acquired),
                Some(Err(vk::ErrorCode::OUT_OF_DATE_KHR)) => Err(RenderError::SwapchainOutOfDate),
                Some(Err(e)) => Err(e.into()),
                None => panic!("acquire called more often than scripted"),
            }
        }

        unsafe fn submit(
            &self,
            command_buffer: vk::CommandBuffer,
            wait: vk::Semaphore,
            signal: vk::Semaphore,
            fence: vk::Fence,
        ) -> Result<(), RenderError> {
            self.calls.borrow_mut().push(Call::Submit {
                command_buffer,
                wait,
                signal,
                fence,
            });
            Ok(())
        }

        unsafe fn present(
            &self,
            image_index: u32,
            wait: vk::Semaphore,
        ) -> Result<bool, RenderError> {
            self.calls
                .borrow_mut()
                .push(Call::Present { image_index, wait });
            match self.present_results.borrow_mut().pop_front() {
                None | Some(Ok(false)) => Ok(false),
                Some(Ok(true)) => Ok(true),
                Some(Err(vk::ErrorCode::OUT_OF_DATE_KHR)) => Err(RenderError::SwapchainOutOfDate),
                Some(Err(e)) => Err(e.into()),
            }
        }
    }

    fn pool(size: usize) -> SyncPool {
        unsafe { SyncPool::new(&FakeAllocator::default(), size) }.unwrap()
    }

    fn buffers(count: usize) -> Vec<vk::CommandBuffer> {
        (100..100 + count)
            .map(vk::CommandBuffer::from_raw)
            .collect()
    }

    #[test]
    fn two_image_chain_cycles_slots_zero_one_zero() {
        let sync = pool(2);
        let command_buffers = buffers(2);
        let queue = ScriptedQueue::new(&[0, 1, 0]);
        let mut scheduler = FrameScheduler::new();

        let slots = (0..3)
            .map(|_| unsafe { scheduler.render_frame(&queue, &sync, &command_buffers) })
            .map(|frame| frame.unwrap().slot)
            .collect::<Vec<_>>();

        assert_eq!(slots, vec![0, 1, 0]);
        assert_eq!(scheduler.slot(), 1);
    }

    #[test]
    fn protocol_order_within_one_frame() {
        let sync = pool(2);
        let command_buffers = buffers(2);
        let queue = ScriptedQueue::new(&[1]);
        let mut scheduler = FrameScheduler::new();

        unsafe { scheduler.render_frame(&queue, &sync, &command_buffers) }.unwrap();

        let signals = sync.slot(0);
        assert_eq!(
            *queue.calls.borrow(),
            vec![
                Call::WaitAndReset(signals.frame_complete),
                Call::Acquire(signals.image_acquired),
                Call::Submit {
                    command_buffer: command_buffers[1],
                    wait: signals.image_acquired,
                    signal: signals.render_finished,
                    fence: signals.frame_complete,
                },
                Call::Present {
                    image_index: 1,
                    wait: signals.render_finished,
                },
            ]
        );
    }

    #[test]
    fn image_index_selects_buffer_independent_of_slot() {
        let sync = pool(3);
        let command_buffers = buffers(3);
        let queue = ScriptedQueue::new(&[2, 0, 0, 1, 2, 2]);
        let mut scheduler = FrameScheduler::new();

        let frames = (0..6)
            .map(|_| unsafe { scheduler.render_frame(&queue, &sync, &command_buffers) }.unwrap())
            .collect::<Vec<_>>();

        assert_eq!(
            frames.iter().map(|f| f.slot).collect::<Vec<_>>(),
            vec![0, 1, 2, 0, 1, 2]
        );
        assert_eq!(
            queue.submits(),
            vec![
                command_buffers[2],
                command_buffers[0],
                command_buffers[0],
                command_buffers[1],
                command_buffers[2],
                command_buffers[2],
            ]
        );
    }

    #[test]
    fn repeated_frames_replay_the_same_buffer_per_image() {
        let sync = pool(2);
        let command_buffers = buffers(2);
        let before = command_buffers.clone();
        let queue = ScriptedQueue::new(&[0; 8]);
        let mut scheduler = FrameScheduler::new();

        for _ in 0..8 {
            unsafe { scheduler.render_frame(&queue, &sync, &command_buffers) }.unwrap();
        }

        assert_eq!(command_buffers, before);
        assert!(queue.submits().iter().all(|b| *b == command_buffers[0]));
    }

    #[test]
    fn out_of_date_swapchain_is_fatal() {
        let sync = pool(2);
        let command_buffers = buffers(2);
        let queue = ScriptedQueue::new(&[]);
        queue
            .images
            .borrow_mut()
            .push_back(Err(vk::ErrorCode::OUT_OF_DATE_KHR));
        let mut scheduler = FrameScheduler::new();

        let result = unsafe { scheduler.render_frame(&queue, &sync, &command_buffers) };

        assert!(matches!(result, Err(RenderError::SwapchainOutOfDate)));
        assert!(queue.submits().is_empty());
        assert_eq!(scheduler.slot(), 0);
    }

    #[test]
    fn out_of_date_on_present_is_fatal() {
        let sync = pool(2);
        let command_buffers = buffers(2);
        let queue = ScriptedQueue::new(&[0]);
        queue
            .present_results
            .borrow_mut()
            .push_back(Err(vk::ErrorCode::OUT_OF_DATE_KHR));
        let mut scheduler = FrameScheduler::new();

        let result = unsafe { scheduler.render_frame(&queue, &sync, &command_buffers) };

        assert!(matches!(result, Err(RenderError::SwapchainOutOfDate)));
    }

    #[test]
    fn suboptimal_presentation_keeps_rendering() {
        let sync = pool(2);
        let command_buffers = buffers(2);
        let queue = ScriptedQueue::new(&[0, 1]);
        queue.present_results.borrow_mut().push_back(Ok(true));
        let mut scheduler = FrameScheduler::new();

        unsafe { scheduler.render_frame(&queue, &sync, &command_buffers) }.unwrap();
        let second = unsafe { scheduler.render_frame(&queue, &sync, &command_buffers) }.unwrap();

        assert_eq!(second, Frame { slot: 1, image_index: 1 });
    }

    #[test]
    fn image_without_command_buffer_is_an_error() {
        let sync = pool(2);
        let command_buffers = buffers(2);
        let queue = ScriptedQueue::new(&[5]);
        let mut scheduler = FrameScheduler::new();

        let result = unsafe { scheduler.render_frame(&queue, &sync, &command_buffers) };

        assert!(matches!(result, Err(RenderError::UnknownImage(5))));
    }
}
