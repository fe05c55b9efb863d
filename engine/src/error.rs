use std::path::PathBuf;

use thiserror::Error;
use vulkanalia::vk;

/// Failures raised while building or driving the Vulkan object graph.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to load the Vulkan library: {0}")]
    Loader(String),

    #[error("No Vulkan adapter found.")]
    NoAdapter,

    #[error("No queue family supports both graphics and presentation to the surface.")]
    NoGraphicsQueue,

    #[error("Adapter advertises no surface formats.")]
    NoFormat,

    #[error("Adapter does not offer B8G8R8A8_SRGB with the SRGB_NONLINEAR color space.")]
    UnsupportedFormat,

    #[error("Failed to create {what}: {code}")]
    CreateFailed {
        what: &'static str,
        code: vk::ErrorCode,
    },

    #[error("Swapchain is out of date and the window is fixed-size; it is not rebuilt.")]
    SwapchainOutOfDate,

    #[error("Swapchain returned image index {0}, which has no recorded command buffer.")]
    UnknownImage(u32),

    #[error(transparent)]
    Shader(#[from] ShaderError),

    #[error("Vulkan call failed: {0}")]
    Vulkan(#[from] vk::ErrorCode),
}

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("failed to read spirv file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("spirv file {path} is not usable bytecode: {message}")]
    Bytecode { path: PathBuf, message: String },
}

/// Tags a failing creation call with the object it was building.
pub(crate) trait Creating<T> {
    fn creating(self, what: &'static str) -> Result<T, RenderError>;
}

impl<T> Creating<T> for Result<T, vk::ErrorCode> {
    fn creating(self, what: &'static str) -> Result<T, RenderError> {
        self.map_err(|code| RenderError::CreateFailed { what, code })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creating_names_the_object() {
        let result: Result<(), vk::ErrorCode> = Err(vk::ErrorCode::OUT_OF_DEVICE_MEMORY);
        let err = result.creating("swapchain").unwrap_err();

        assert!(matches!(
            err,
            RenderError::CreateFailed { what: "swapchain", code } if code == vk::ErrorCode::OUT_OF_DEVICE_MEMORY
        ));
        assert!(err.to_string().starts_with("Failed to create swapchain"));
    }
}
