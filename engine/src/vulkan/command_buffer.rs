use log::*;
use vulkanalia::vk::{self, DeviceV1_0, HasBuilder};

use super::{constants, device::VulkanDevice};
use crate::error::{Creating, RenderError};

/// A command of the static draw script recorded into every buffer.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Command {
    BeginRenderPass {
        render_pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
        extent: vk::Extent2D,
        clear_color: [f32; 4],
    },
    BindPipeline(vk::Pipeline),
    Draw {
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    },
    EndRenderPass,
}

/// Where a command script gets recorded.
pub trait CommandSink {
    /// Records `commands` into `buffer` between begin and end, marking the
    /// buffer for simultaneous use so it can be resubmitted every frame.
    unsafe fn record(
        &self,
        buffer: vk::CommandBuffer,
        commands: &[Command],
    ) -> Result<(), RenderError>;
}

/// The whole frame: clear `framebuffer` to opaque black and draw one
/// triangle with no vertex or index buffers.
pub fn triangle_script(
    render_pass: vk::RenderPass,
    framebuffer: vk::Framebuffer,
    extent: vk::Extent2D,
    pipeline: vk::Pipeline,
) -> [Command; 4] {
    [
        Command::BeginRenderPass {
            render_pass,
            framebuffer,
            extent,
            clear_color: constants::CLEAR_COLOR,
        },
        Command::BindPipeline(pipeline),
        Command::Draw {
            vertex_count: constants::TRIANGLE_VERTEX_COUNT,
            instance_count: 1,
            first_vertex: 0,
            first_instance: 0,
        },
        Command::EndRenderPass,
    ]
}

/// Records one buffer per framebuffer, pairing them by index.
pub unsafe fn record_static<S: CommandSink>(
    sink: &S,
    buffers: &[vk::CommandBuffer],
    framebuffers: &[vk::Framebuffer],
    render_pass: vk::RenderPass,
    extent: vk::Extent2D,
    pipeline: vk::Pipeline,
) -> Result<(), RenderError> {
    for (buffer, framebuffer) in buffers.iter().zip(framebuffers) {
        sink.record(
            *buffer,
            &triangle_script(render_pass, *framebuffer, extent, pipeline),
        )?;
    }
    Ok(())
}

impl CommandSink for VulkanDevice {
    unsafe fn record(
        &self,
        buffer: vk::CommandBuffer,
        commands: &[Command],
    ) -> Result<(), RenderError> {
        let info =
            vk::CommandBufferBeginInfo::builder().flags(vk::CommandBufferUsageFlags::SIMULTANEOUS_USE);
        self.vk_device.begin_command_buffer(buffer, &info)?;

        for command in commands {
            match *command {
                Command::BeginRenderPass {
                    render_pass,
                    framebuffer,
                    extent,
                    clear_color,
                } => {
                    let render_area = vk::Rect2D::builder()
                        .offset(vk::Offset2D::default())
                        .extent(extent);

                    let color_clear_value = vk::ClearValue {
                        color: vk::ClearColorValue {
                            float32: clear_color,
                        },
                    };

                    let clear_values = &[color_clear_value];
                    let info = vk::RenderPassBeginInfo::builder()
                        .render_pass(render_pass)
                        .framebuffer(framebuffer)
                        .render_area(render_area)
                        .clear_values(clear_values);

                    self.vk_device
                        .cmd_begin_render_pass(buffer, &info, vk::SubpassContents::INLINE);
                }
                Command::BindPipeline(pipeline) => {
                    self.vk_device
                        .cmd_bind_pipeline(buffer, vk::PipelineBindPoint::GRAPHICS, pipeline);
                }
                Command::Draw {
                    vertex_count,
                    instance_count,
                    first_vertex,
                    first_instance,
                } => {
                    self.vk_device.cmd_draw(
                        buffer,
                        vertex_count,
                        instance_count,
                        first_vertex,
                        first_instance,
                    );
                }
                Command::EndRenderPass => self.vk_device.cmd_end_render_pass(buffer),
            }
        }

        self.vk_device.end_command_buffer(buffer)?;
        Ok(())
    }
}

/// Command pools, one per queue family in use, and the pre-recorded primary
/// buffers allocated from them, indexed `[family][framebuffer]`.
#[derive(Debug)]
pub struct VulkanCommandBuffers {
    pools: Vec<vk::CommandPool>,
    buffers: Vec<Vec<vk::CommandBuffer>>,
}

impl VulkanCommandBuffers {
    pub unsafe fn new(
        device: &VulkanDevice,
        families_in_use: &[u32],
        framebuffers: &[vk::Framebuffer],
        render_pass: vk::RenderPass,
        extent: vk::Extent2D,
        pipeline: vk::Pipeline,
    ) -> Result<Self, RenderError> {
        let pools = families_in_use
            .iter()
            .map(|family| {
                let info = vk::CommandPoolCreateInfo::builder()
                    .flags(vk::CommandPoolCreateFlags::empty())
                    .queue_family_index(*family);

                device
                    .vk_device
                    .create_command_pool(&info, None)
                    .creating("command pool")
            })
            .collect::<Result<Vec<_>, _>>()?;

        let buffers = pools
            .iter()
            .map(|pool| {
                let allocate_info = vk::CommandBufferAllocateInfo::builder()
                    .command_pool(*pool)
                    .level(vk::CommandBufferLevel::PRIMARY)
                    .command_buffer_count(framebuffers.len() as u32);

                device
                    .vk_device
                    .allocate_command_buffers(&allocate_info)
                    .creating("command buffers")
            })
            .collect::<Result<Vec<_>, _>>()?;

        for family_buffers in &buffers {
            record_static(
                device,
                family_buffers,
                framebuffers,
                render_pass,
                extent,
                pipeline,
            )?;
        }

        debug!(
            "Recorded {} command buffers for {} queue families.",
            framebuffers.len(),
            families_in_use.len()
        );

        Ok(Self { pools, buffers })
    }

    /// Buffers of the graphics family, indexed by swapchain image.
    pub fn graphics(&self) -> &[vk::CommandBuffer] {
        self.buffers
            .first()
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Freeing the pools frees every buffer allocated from them.
    pub unsafe fn destroy(&mut self, device: &VulkanDevice) {
        self.pools
            .iter()
            .for_each(|p| device.vk_device.destroy_command_pool(*p, None));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use vulkanalia::vk::Handle;

    /// Remembers every script handed to it, keyed by buffer.
    #[derive(Default)]
    struct RecordingSink {
        recorded: RefCell<Vec<(vk::CommandBuffer, Vec<Command>)>>,
    }

    impl CommandSink for RecordingSink {
        unsafe fn record(
            &self,
            buffer: vk::CommandBuffer,
            commands: &[Command],
        ) -> Result<(), RenderError> {
            self.recorded
                .borrow_mut()
                .push((buffer, commands.to_vec()));
            Ok(())
        }
    }

    fn extent() -> vk::Extent2D {
        vk::Extent2D {
            width: 800,
            height: 600,
        }
    }

    #[test]
    fn script_clears_binds_and_draws_one_triangle() {
        let render_pass = vk::RenderPass::from_raw(1);
        let framebuffer = vk::Framebuffer::from_raw(2);
        let pipeline = vk::Pipeline::from_raw(3);

        let script = triangle_script(render_pass, framebuffer, extent(), pipeline);

        assert_eq!(
            script[0],
            Command::BeginRenderPass {
                render_pass,
                framebuffer,
                extent: extent(),
                clear_color: [0.0, 0.0, 0.0, 1.0],
            }
        );
        assert_eq!(script[1], Command::BindPipeline(pipeline));
        assert_eq!(
            script[2],
            Command::Draw {
                vertex_count: 3,
                instance_count: 1,
                first_vertex: 0,
                first_instance: 0,
            }
        );
        assert_eq!(script[3], Command::EndRenderPass);
    }

    #[test]
    fn one_buffer_recorded_per_framebuffer() {
        let sink = RecordingSink::default();
        let buffers = (10..13)
            .map(vk::CommandBuffer::from_raw)
            .collect::<Vec<_>>();
        let framebuffers = (20..23)
            .map(vk::Framebuffer::from_raw)
            .collect::<Vec<_>>();

        unsafe {
            record_static(
                &sink,
                &buffers,
                &framebuffers,
                vk::RenderPass::from_raw(1),
                extent(),
                vk::Pipeline::from_raw(3),
            )
            .unwrap();
        }

        let recorded = sink.recorded.borrow();
        assert_eq!(recorded.len(), framebuffers.len());
        for ((buffer, commands), (expected_buffer, framebuffer)) in
            recorded.iter().zip(buffers.iter().zip(&framebuffers))
        {
            assert_eq!(buffer, expected_buffer);
            assert!(matches!(
                commands[0],
                Command::BeginRenderPass { framebuffer: f, .. } if f == *framebuffer
            ));
        }
    }
}
