use log::*;
use std::fs;
use std::path::{Path, PathBuf};
use vulkanalia::bytecode::Bytecode;
use vulkanalia::vk::{self, DeviceV1_0, HasBuilder};

use super::{constants, device::VulkanDevice};
use crate::error::{Creating, RenderError, ShaderError};

/// Raw SPIR-V for the two pipeline stages.
#[derive(Clone, Debug)]
pub struct ShaderBinaries {
    pub vertex: Vec<u8>,
    pub fragment: Vec<u8>,
}

impl ShaderBinaries {
    /// Reads `triangle.vert` and `triangle.frag` from `dir`. The contents are
    /// not inspected beyond being readable.
    pub fn load(dir: &Path) -> Result<Self, ShaderError> {
        Ok(Self {
            vertex: read_spirv(&dir.join(constants::VERTEX_SHADER_FILE))?,
            fragment: read_spirv(&dir.join(constants::FRAGMENT_SHADER_FILE))?,
        })
    }
}

fn read_spirv(path: &Path) -> Result<Vec<u8>, ShaderError> {
    let bytes = fs::read(path).map_err(|source| ShaderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Read {} bytes of spirv from {}", bytes.len(), path.display());
    Ok(bytes)
}

pub unsafe fn create_shader_module(
    device: &VulkanDevice,
    bytecode: &[u8],
    origin: &str,
) -> Result<vk::ShaderModule, RenderError> {
    let bytecode = Bytecode::new(bytecode).map_err(|e| ShaderError::Bytecode {
        path: PathBuf::from(origin),
        message: format!("{:?}", e),
    })?;
    let info = vk::ShaderModuleCreateInfo::builder()
        .code_size(bytecode.code_size())
        .code(bytecode.code());

    device
        .vk_device
        .create_shader_module(&info, None)
        .creating("shader module")
}
