use log::*;
use std::path::Path;
use vulkanalia::vk::{self, DeviceV1_0, Handle, HasBuilder};

use super::render_pass::VulkanRenderPass;
use super::shader::{self, ShaderBinaries};
use super::{constants, device::VulkanDevice};
use crate::error::{Creating, RenderError};

/// The fixed triangle pipeline. Geometry comes from the vertex shader, so
/// there is no vertex input, and viewport and scissor are baked in.
#[derive(Debug)]
pub struct VulkanPipeline {
    pub vk_pipeline: vk::Pipeline,
    pub layout: vk::PipelineLayout,
}

impl VulkanPipeline {
    pub unsafe fn new(
        device: &VulkanDevice,
        render_pass: &VulkanRenderPass,
        extent: vk::Extent2D,
        spirv_path: &Path,
    ) -> Result<VulkanPipeline, RenderError> {
        let binaries = ShaderBinaries::load(spirv_path)?;

        let vertex_shader_module = shader::create_shader_module(
            device,
            &binaries.vertex,
            constants::VERTEX_SHADER_FILE,
        )?;
        let fragment_shader_module = shader::create_shader_module(
            device,
            &binaries.fragment,
            constants::FRAGMENT_SHADER_FILE,
        )?;

        let vert_stage = vk::PipelineShaderStageCreateInfo::builder()
            .stage(vk::ShaderStageFlags::VERTEX)
            .module(vertex_shader_module)
            .name(constants::SHADER_ENTRY_POINT);

        let frag_stage = vk::PipelineShaderStageCreateInfo::builder()
            .stage(vk::ShaderStageFlags::FRAGMENT)
            .module(fragment_shader_module)
            .name(constants::SHADER_ENTRY_POINT);

        let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::builder();
        let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::builder()
            .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
            .primitive_restart_enable(false);

        let viewports = &[fixed_viewport(extent)];
        let scissors = &[fixed_scissor(extent)];
        let viewport_state = vk::PipelineViewportStateCreateInfo::builder()
            .viewports(viewports)
            .scissors(scissors);

        let rasterization_state = rasterization_state();

        // multisampling
        let multisample_state = vk::PipelineMultisampleStateCreateInfo::builder()
            .sample_shading_enable(false)
            .rasterization_samples(vk::SampleCountFlags::_1);

        // color blending: straight replace
        let attachments = &[replace_blend_attachment()];
        let color_blend_state = vk::PipelineColorBlendStateCreateInfo::builder()
            .logic_op_enable(false)
            .logic_op(vk::LogicOp::COPY)
            .attachments(attachments)
            .blend_constants([0.0, 0.0, 0.0, 0.0]);

        // layout: no descriptor sets, no push constants
        let layout_info = vk::PipelineLayoutCreateInfo::builder();
        let layout = device
            .vk_device
            .create_pipeline_layout(&layout_info, None)
            .creating("pipeline layout")?;

        let stages = &[vert_stage, frag_stage];
        let info = vk::GraphicsPipelineCreateInfo::builder()
            .stages(stages)
            .vertex_input_state(&vertex_input_state)
            .input_assembly_state(&input_assembly_state)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization_state)
            .multisample_state(&multisample_state)
            .color_blend_state(&color_blend_state)
            .layout(layout)
            .render_pass(render_pass.vk_render_pass)
            .subpass(0);

        let vk_pipeline = device
            .vk_device
            .create_graphics_pipelines(vk::PipelineCache::null(), &[info], None)
            .creating("graphics pipeline")?
            .0[0];

        // destroy shader modules
        device
            .vk_device
            .destroy_shader_module(vertex_shader_module, None);
        device
            .vk_device
            .destroy_shader_module(fragment_shader_module, None);

        debug!("Created graphics pipeline for {}x{}.", extent.width, extent.height);

        Ok(VulkanPipeline {
            vk_pipeline,
            layout,
        })
    }

    pub unsafe fn destroy(&mut self, device: &VulkanDevice) {
        device.vk_device.destroy_pipeline(self.vk_pipeline, None);
        device
            .vk_device
            .destroy_pipeline_layout(self.layout, None);
    }
}

pub fn fixed_viewport(extent: vk::Extent2D) -> vk::Viewport {
    vk::Viewport::builder()
        .x(0.0)
        .y(0.0)
        .width(extent.width as f32)
        .height(extent.height as f32)
        .min_depth(0.0)
        .max_depth(1.0)
        .build()
}

pub fn fixed_scissor(extent: vk::Extent2D) -> vk::Rect2D {
    vk::Rect2D::builder()
        .offset(vk::Offset2D { x: 0, y: 0 })
        .extent(extent)
        .build()
}

/// Filled polygons, back faces culled, clockwise winding faces front.
pub fn rasterization_state() -> vk::PipelineRasterizationStateCreateInfo {
    vk::PipelineRasterizationStateCreateInfo::builder()
        .depth_clamp_enable(false)
        .rasterizer_discard_enable(false)
        .polygon_mode(vk::PolygonMode::FILL)
        .line_width(1.0)
        .cull_mode(vk::CullModeFlags::BACK)
        .front_face(vk::FrontFace::CLOCKWISE)
        .depth_bias_enable(false)
        .build()
}

pub fn replace_blend_attachment() -> vk::PipelineColorBlendAttachmentState {
    vk::PipelineColorBlendAttachmentState::builder()
        .color_write_mask(vk::ColorComponentFlags::all())
        .blend_enable(false)
        .src_color_blend_factor(vk::BlendFactor::ONE)
        .dst_color_blend_factor(vk::BlendFactor::ZERO)
        .color_blend_op(vk::BlendOp::ADD)
        .src_alpha_blend_factor(vk::BlendFactor::ONE)
        .dst_alpha_blend_factor(vk::BlendFactor::ZERO)
        .alpha_blend_op(vk::BlendOp::ADD)
        .build()
}
