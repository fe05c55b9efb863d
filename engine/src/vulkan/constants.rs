use vulkanalia::vk;

pub const VALIDATION_ENABLED: bool = cfg!(debug_assertions);
pub const VALIDATION_LAYER: vk::ExtensionName =
    vk::ExtensionName::from_bytes(b"VK_LAYER_KHRONOS_validation");

/// Every queue of every family is requested at this priority.
pub const QUEUE_PRIORITY: f32 = 0.5;

pub const SURFACE_FORMAT: vk::Format = vk::Format::B8G8R8A8_SRGB;
pub const SURFACE_COLOR_SPACE: vk::ColorSpaceKHR = vk::ColorSpaceKHR::SRGB_NONLINEAR;
pub const MIN_SWAPCHAIN_IMAGES: u32 = 2;

pub const VERTEX_SHADER_FILE: &str = "triangle.vert";
pub const FRAGMENT_SHADER_FILE: &str = "triangle.frag";
pub const SHADER_ENTRY_POINT: &[u8] = b"main\0";

pub const TRIANGLE_VERTEX_COUNT: u32 = 3;
pub const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];
